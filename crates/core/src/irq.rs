// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::line::LineId;
use crate::signal::Level;
use crate::slot::EventSlot;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Proof of execution in interrupt context.
///
/// Only the chip's dispatch path can mint one. Every API reachable through a
/// borrowed `IrqContext` is non-blocking: handlers cannot sleep, and they
/// have no way to acquire anything that would make them.
#[derive(Debug)]
pub struct IrqContext {
    _private: (),
}

impl IrqContext {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Live view of one claimed line's level. Reads go to the line state on
/// demand; nothing is cached.
#[derive(Debug, Clone)]
pub struct LineProbe {
    level: Arc<AtomicBool>,
}

impl LineProbe {
    pub(crate) fn new(level: Arc<AtomicBool>) -> Self {
        Self { level }
    }

    pub fn level(&self) -> Level {
        self.level.load(Ordering::Acquire).into()
    }
}

/// One handler per claimed line, invoked in interrupt context on every
/// qualifying edge.
///
/// The contract has no error path: if anything about signaling goes wrong
/// the event is silently dropped and the next edge re-signals.
#[derive(Debug)]
pub struct EdgeHandler {
    line: LineId,
    probe: LineProbe,
    slot: Arc<EventSlot>,
}

impl EdgeHandler {
    pub fn new(line: LineId, probe: LineProbe, slot: Arc<EventSlot>) -> Self {
        Self { line, probe, slot }
    }

    pub fn line(&self) -> LineId {
        self.line
    }

    /// Service one edge: sample the line level, stamp the shared slot with
    /// this line's identity, and wake any sleeping reader.
    pub fn handle(&self, cx: &IrqContext) {
        let level = self.probe.level();
        if bool::from(level) {
            debug!("button {} released", self.line);
        } else {
            debug!("button {} pressed", self.line);
        }

        self.slot.raise(cx, self.line);
    }
}

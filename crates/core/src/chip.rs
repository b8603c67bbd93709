// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::irq::{EdgeHandler, IrqContext, LineProbe};
use crate::line::{LineConfig, LineId};
use crate::signal::Level;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, info};

#[derive(Debug, thiserror::Error)]
pub enum ClaimError {
    #[error("line offset {offset} out of range for chip '{chip}'")]
    OffsetOutOfRange { chip: String, offset: u32 },
    #[error("line offset {offset} already claimed as '{label}'")]
    AlreadyClaimed { offset: u32, label: String },
}

#[derive(Debug)]
struct LineClaim {
    label: String,
    config: LineConfig,
    handler: EdgeHandler,
    last_fire: Option<Instant>,
}

#[derive(Debug, Default)]
struct SimLine {
    // Lines idle high (pull-up wiring); pressing pulls them low.
    level: Arc<AtomicBool>,
    claim: Mutex<Option<LineClaim>>,
}

/// Simulated GPIO chip: a bank of binary lines with edge-triggered
/// notification.
///
/// Driving a level change on a claimed line filters the transition against
/// the claim's trigger edge, suppresses re-triggers inside the debounce
/// window, and dispatches the claim's handler in interrupt context. Each
/// line dispatches under its own lock: distinct lines fire concurrently,
/// while a single line's edges are serialized.
#[derive(Debug)]
pub struct SimChip {
    name: String,
    lines: Vec<SimLine>,
}

impl SimChip {
    pub fn new(name: &str, line_count: u32) -> Self {
        let lines = (0..line_count)
            .map(|_| SimLine {
                level: Arc::new(AtomicBool::new(true)),
                claim: Mutex::new(None),
            })
            .collect();
        Self {
            name: name.to_string(),
            lines,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn line_count(&self) -> u32 {
        self.lines.len() as u32
    }

    fn line(&self, offset: u32) -> Result<&SimLine, ClaimError> {
        self.lines
            .get(offset as usize)
            .ok_or_else(|| ClaimError::OffsetOutOfRange {
                chip: self.name.clone(),
                offset,
            })
    }

    /// On-demand level view for a line, for wiring up an [`EdgeHandler`].
    pub fn line_probe(&self, offset: u32) -> Result<LineProbe, ClaimError> {
        Ok(LineProbe::new(Arc::clone(&self.line(offset)?.level)))
    }

    /// Claim a line for edge notification. Fails if the offset is out of
    /// range or the line is already claimed; the claim holds until the
    /// returned handle is dropped.
    pub fn claim(
        self: &Arc<Self>,
        offset: u32,
        label: &str,
        config: LineConfig,
        handler: EdgeHandler,
    ) -> Result<ClaimedLine, ClaimError> {
        let line_id = handler.line();
        let line = self.line(offset)?;
        let mut claim = line.claim.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(existing) = claim.as_ref() {
            return Err(ClaimError::AlreadyClaimed {
                offset,
                label: existing.label.clone(),
            });
        }
        *claim = Some(LineClaim {
            label: label.to_string(),
            config,
            handler,
            last_fire: None,
        });
        info!(
            "chip '{}': claimed line {} as '{}' ({:?} trigger, {:?} debounce)",
            self.name, offset, label, config.trigger, config.debounce
        );
        Ok(ClaimedLine {
            chip: Arc::clone(self),
            offset,
            line: line_id,
        })
    }

    fn release(&self, offset: u32) {
        if let Ok(line) = self.line(offset) {
            let mut claim = line.claim.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(released) = claim.take() {
                info!(
                    "chip '{}': released line {} ('{}')",
                    self.name, offset, released.label
                );
            }
        }
    }

    /// Current logical level of a line.
    pub fn level(&self, offset: u32) -> Result<Level, ClaimError> {
        Ok(self.line(offset)?.level.load(Ordering::Acquire).into())
    }

    /// Drive a line to `level`, dispatching the claimed handler when the
    /// transition qualifies. May be called from any thread; this is the
    /// simulated hardware edge.
    pub fn drive(&self, offset: u32, level: Level) -> Result<(), ClaimError> {
        let line = self.line(offset)?;
        let prev: Level = line.level.swap(level.into(), Ordering::AcqRel).into();
        if prev == level {
            return Ok(());
        }

        let mut claim = line.claim.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(claim) = claim.as_mut() else {
            return Ok(());
        };
        if !claim.config.trigger.matches(prev, level) {
            return Ok(());
        }

        let now = Instant::now();
        if let Some(last) = claim.last_fire {
            if now.duration_since(last) < claim.config.debounce {
                debug!(
                    "chip '{}': edge on line {} suppressed inside debounce window",
                    self.name, offset
                );
                return Ok(());
            }
        }
        claim.last_fire = Some(now);

        let cx = IrqContext::new();
        claim.handler.handle(&cx);
        Ok(())
    }

    /// Momentary active-low press: drive the line low, then back high. With
    /// the default falling trigger this fires exactly one edge.
    pub fn pulse(&self, offset: u32) -> Result<(), ClaimError> {
        self.drive(offset, Level::Low)?;
        self.drive(offset, Level::High)
    }
}

/// RAII handle to a claimed line. Dropping it deregisters the handler and
/// releases the line.
#[derive(Debug)]
pub struct ClaimedLine {
    chip: Arc<SimChip>,
    offset: u32,
    line: LineId,
}

impl ClaimedLine {
    pub fn offset(&self) -> u32 {
        self.offset
    }

    pub fn line_id(&self) -> LineId {
        self.line
    }
}

impl Drop for ClaimedLine {
    fn drop(&mut self) {
        self.chip.release(self.offset);
    }
}

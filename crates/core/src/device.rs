// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::bank::{ButtonBank, ProbeError};
use crate::chip::SimChip;
use crate::line::LineId;
use crate::slot::{EventSlot, PollWaker};
use gpiopad_config::PadManifest;
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    #[error("destination buffer holds no room for the event byte")]
    InvalidBuffer,
    #[error("failed to transfer event byte to caller: {0}")]
    Fault(#[source] io::Error),
}

/// Whether a read with no pending event sleeps or returns immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadMode {
    Blocking,
    NonBlocking,
}

bitflags::bitflags! {
    /// Readiness bits reported by poll. Only readability is meaningful for
    /// this subsystem.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PollFlags: u8 {
        const READABLE = 1 << 0;
    }
}

/// The subsystem entry point: owns the event slot and the claimed lines.
///
/// Constructed once by [`ButtonDevice::bring_up`]; handlers and handles
/// share the one slot by reference, never through ambient globals.
#[derive(Debug)]
pub struct ButtonDevice {
    name: String,
    slot: Arc<EventSlot>,
    bank: ButtonBank,
}

impl ButtonDevice {
    /// Bring the subsystem up against `chip` per `manifest`, all-or-nothing.
    pub fn bring_up(chip: &Arc<SimChip>, manifest: &PadManifest) -> Result<Self, ProbeError> {
        let slot = Arc::new(EventSlot::new());
        let bank = ButtonBank::probe(chip, manifest, &slot)?;
        info!(
            "button device '{}' ready ({} lines)",
            manifest.name,
            bank.len()
        );
        Ok(Self {
            name: manifest.name.clone(),
            slot,
            bank,
        })
    }

    /// Open a handle onto the notification stream. Always succeeds and
    /// establishes no per-open state.
    pub fn open(&self, mode: ReadMode) -> ButtonHandle {
        debug!("device '{}' opened ({:?})", self.name, mode);
        ButtonHandle {
            slot: Arc::clone(&self.slot),
            mode,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> &Arc<EventSlot> {
        &self.slot
    }

    /// Diagnostic dump of the device state.
    pub fn snapshot(&self) -> serde_json::Value {
        serde_json::json!({
            "name": self.name,
            "lines": self.bank.len(),
            "slot": self.slot.snapshot(),
        })
    }
}

/// One consumer handle onto the event stream.
///
/// The underlying slot is device-wide state: more than one concurrently
/// reading handle is unsupported and the delivery split between such readers
/// is undefined. Dropping a handle does not wake an in-flight blocking read
/// on another handle; a blocking read with no incoming edges never returns.
#[derive(Debug)]
pub struct ButtonHandle {
    slot: Arc<EventSlot>,
    mode: ReadMode,
}

impl ButtonHandle {
    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    fn next_event(&self) -> Option<LineId> {
        if self.mode == ReadMode::Blocking {
            self.slot.wait_ready();
        }
        // Re-check after the wake: a wake with the flag already drained
        // yields a zero-length read, not an error.
        self.slot.try_consume()
    }

    /// Read one event byte (ASCII digit '1'..'5') into `buf`.
    ///
    /// Returns `Ok(1)` on delivery and `Ok(0)` when not ready in
    /// non-blocking mode (or on a spurious wake). `buf` must hold at least
    /// one byte.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        if buf.is_empty() {
            return Err(DeviceError::InvalidBuffer);
        }
        match self.next_event() {
            Some(line) => {
                buf[0] = line.to_ascii();
                Ok(1)
            }
            None => Ok(0),
        }
    }

    /// Like [`ButtonHandle::read`] but delivering through a fallible sink.
    ///
    /// A sink failure surfaces as [`DeviceError::Fault`] with the event
    /// already consumed; it is not re-deliverable.
    pub fn read_into<W: io::Write>(&mut self, sink: &mut W) -> Result<usize, DeviceError> {
        match self.next_event() {
            Some(line) => {
                sink.write_all(&[line.to_ascii()]).map_err(|source| {
                    error!("event byte transfer failed: {}", source);
                    DeviceError::Fault(source)
                })?;
                Ok(1)
            }
            None => Ok(0),
        }
    }

    /// Non-consuming readiness query. Registers `table`'s waker with the
    /// slot so a later [`PollTable::wait_timeout`] is woken by the next
    /// edge.
    pub fn poll(&self, table: Option<&mut PollTable>) -> PollFlags {
        if let Some(table) = table {
            table.attach(&self.slot);
        }
        if self.slot.is_ready() {
            PollFlags::READABLE
        } else {
            PollFlags::empty()
        }
    }
}

impl io::Read for ButtonHandle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        ButtonHandle::read(self, buf).map_err(|e| match e {
            DeviceError::InvalidBuffer => io::Error::new(io::ErrorKind::InvalidInput, e),
            DeviceError::Fault(source) => source,
        })
    }
}

impl Drop for ButtonHandle {
    fn drop(&mut self) {
        debug!("button handle closed");
    }
}

/// Collects waiter registrations from poll calls so one caller can block on
/// several sources at once.
#[derive(Debug, Default)]
pub struct PollTable {
    waker: Arc<PollWaker>,
    slots: Vec<Arc<EventSlot>>,
}

impl PollTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn attach(&mut self, slot: &Arc<EventSlot>) {
        slot.attach_poller(&self.waker);
        if !self.slots.iter().any(|s| Arc::ptr_eq(s, slot)) {
            self.slots.push(Arc::clone(slot));
        }
    }

    /// True once any attached source is readable, false when `timeout`
    /// elapses first.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            if self.slots.iter().any(|s| s.is_ready()) {
                return true;
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return false;
            };
            self.waker.wait_timeout(remaining);
        }
    }
}

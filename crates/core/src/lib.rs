// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

//! Event core for the GpioPad five-button notification subsystem.
//!
//! Five edge-triggered input lines feed one single-slot mailbox
//! ([`EventSlot`]); a reader drains it as a byte stream through a
//! [`ButtonHandle`], either blocking until an edge arrives or polling for
//! readiness. Edge handlers run in interrupt context ([`IrqContext`]) and
//! never sleep; a new edge overwrites an unread one (coalescing).

pub mod bank;
pub mod chip;
pub mod device;
pub mod irq;
pub mod line;
pub mod signal;
pub mod slot;
pub mod wait;

pub use bank::{ButtonBank, ProbeError};
pub use chip::{ClaimError, ClaimedLine, SimChip};
pub use device::{ButtonDevice, ButtonHandle, DeviceError, PollFlags, PollTable, ReadMode};
pub use irq::{EdgeHandler, IrqContext, LineProbe};
pub use line::{LineConfig, LineId, LineIdError, DEFAULT_DEBOUNCE, LINE_COUNT};
pub use signal::{Edge, Level};
pub use slot::EventSlot;

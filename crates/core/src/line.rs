// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::signal::Edge;
use std::fmt;
use std::time::Duration;

/// Number of physical button lines the pad multiplexes.
pub const LINE_COUNT: usize = 5;

/// Settle time applied per line unless the manifest overrides it.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Identity of one physical button line, domain 1..=5.
///
/// The identity doubles as the wire encoding of an event: one ASCII digit
/// b'1'..b'5' per consumed event. What a digit means to the application
/// (UP, LEFT, ...) is external policy carried in the pad manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub struct LineId(u8);

#[derive(Debug, thiserror::Error)]
#[error("line id {0} outside supported domain 1..=5")]
pub struct LineIdError(pub u8);

impl LineId {
    pub const ALL: [LineId; LINE_COUNT] =
        [LineId(1), LineId(2), LineId(3), LineId(4), LineId(5)];

    pub fn new(raw: u8) -> Result<Self, LineIdError> {
        if (1..=LINE_COUNT as u8).contains(&raw) {
            Ok(Self(raw))
        } else {
            Err(LineIdError(raw))
        }
    }

    pub fn get(self) -> u8 {
        self.0
    }

    /// Zero-based index, for per-line bookkeeping arrays.
    pub fn index(self) -> usize {
        (self.0 - 1) as usize
    }

    /// Event byte delivered to the reader.
    pub fn to_ascii(self) -> u8 {
        b'0' + self.0
    }
}

impl TryFrom<u8> for LineId {
    type Error = LineIdError;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        Self::new(raw)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Per-line notification configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineConfig {
    /// Transition kind that raises an event.
    pub trigger: Edge,
    /// Minimum time after a qualifying edge during which further
    /// transitions on the same line are ignored.
    pub debounce: Duration,
}

impl Default for LineConfig {
    fn default() -> Self {
        Self {
            trigger: Edge::Falling,
            debounce: DEFAULT_DEBOUNCE,
        }
    }
}

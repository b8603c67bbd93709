// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

/// Represents a digital signal level on an input line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    /// The idle state: button lines are pulled up and rest high.
    #[default]
    High,
}

impl From<bool> for Level {
    fn from(b: bool) -> Self {
        if b {
            Level::High
        } else {
            Level::Low
        }
    }
}

impl From<Level> for bool {
    fn from(level: Level) -> Self {
        match level {
            Level::High => true,
            Level::Low => false,
        }
    }
}

/// Kind of logical-level transition that qualifies for notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    /// High-to-low transition. The default: pressing a pulled-up button
    /// drags its line low.
    #[default]
    Falling,
    Rising,
    Both,
}

impl Edge {
    /// Whether a `from` -> `to` transition qualifies for this trigger.
    pub fn matches(self, from: Level, to: Level) -> bool {
        match self {
            Edge::Falling => from == Level::High && to == Level::Low,
            Edge::Rising => from == Level::Low && to == Level::High,
            Edge::Both => from != to,
        }
    }
}

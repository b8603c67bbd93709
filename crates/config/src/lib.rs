// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::Path;

/// Default schema version for YAML manifests
fn default_schema_version() -> String {
    "1.0".to_string()
}

fn default_chip_name() -> String {
    "sim0".to_string()
}

fn default_debounce_ms() -> u64 {
    200
}

/// Transition kind that raises an event on a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriggerEdge {
    #[default]
    Falling,
    Rising,
    Both,
}

/// Application-level meaning of a line. The core never interprets this; it
/// exists for consumers that decode the event byte stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyRole {
    Up,
    Left,
    Right,
    Down,
    Enter,
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyRole::Up => "UP",
            KeyRole::Left => "LEFT",
            KeyRole::Right => "RIGHT",
            KeyRole::Down => "DOWN",
            KeyRole::Enter => "ENTER",
        };
        f.write_str(name)
    }
}

/// One physical button binding: which chip line carries which identity.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LineBinding {
    /// Line identity, 1..=5.
    pub id: u8,
    /// Chip-relative line offset.
    pub offset: u32,
    /// Human-readable name, e.g. "button23".
    pub label: String,
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    #[serde(default)]
    pub trigger: TriggerEdge,
    #[serde(default)]
    pub key: Option<KeyRole>,
}

/// Top-level pad manifest: a named five-button pad on one chip.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PadManifest {
    #[serde(default = "default_schema_version")]
    pub schema_version: String,
    pub name: String,
    #[serde(default = "default_chip_name")]
    pub chip: String,
    pub lines: Vec<LineBinding>,
}

impl PadManifest {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read pad manifest {:?}", path))?;
        let manifest = Self::from_yaml(&content)
            .with_context(|| format!("Failed to parse pad manifest {:?}", path))?;
        tracing::debug!("loaded pad manifest '{}' from {:?}", manifest.name, path);
        Ok(manifest)
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).context("Failed to parse pad manifest YAML")
    }

    /// Structural checks beyond what serde enforces: exactly five bindings,
    /// each identity 1..=5 exactly once, no two bindings on one offset.
    pub fn validate(&self) -> Result<()> {
        if self.lines.len() != 5 {
            bail!(
                "pad manifest '{}' must bind exactly 5 lines, found {}",
                self.name,
                self.lines.len()
            );
        }

        let mut ids = HashSet::new();
        let mut offsets = HashSet::new();
        for binding in &self.lines {
            if !(1..=5).contains(&binding.id) {
                bail!(
                    "binding '{}' uses line id {} outside 1..=5",
                    binding.label,
                    binding.id
                );
            }
            if !ids.insert(binding.id) {
                bail!("line id {} bound more than once", binding.id);
            }
            if !offsets.insert(binding.offset) {
                bail!("chip offset {} bound more than once", binding.offset);
            }
        }
        Ok(())
    }

    /// Key role bound to a line identity, if the manifest names one.
    pub fn key_for(&self, id: u8) -> Option<KeyRole> {
        self.lines
            .iter()
            .find(|binding| binding.id == id)
            .and_then(|binding| binding.key)
    }

    /// Built-in manifest mirroring the reference five-button board.
    pub fn default_pad() -> Self {
        let bindings = [
            (1, 23, "button23", KeyRole::Up),
            (2, 44, "button44", KeyRole::Left),
            (3, 45, "button45", KeyRole::Right),
            (4, 68, "button68", KeyRole::Down),
            (5, 69, "button69", KeyRole::Enter),
        ];
        Self {
            schema_version: default_schema_version(),
            name: "snake-pad".to_string(),
            chip: default_chip_name(),
            lines: bindings
                .into_iter()
                .map(|(id, offset, label, key)| LineBinding {
                    id,
                    offset,
                    label: label.to_string(),
                    debounce_ms: default_debounce_ms(),
                    trigger: TriggerEdge::Falling,
                    key: Some(key),
                })
                .collect(),
        }
    }
}

// GpioPad - GPIO Keypad Event Core
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::chip::{ClaimError, ClaimedLine, SimChip};
use crate::irq::EdgeHandler;
use crate::line::{LineConfig, LineId, LineIdError};
use crate::signal::Edge;
use crate::slot::EventSlot;
use gpiopad_config::{PadManifest, TriggerEdge};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("invalid line id in binding '{label}': {source}")]
    InvalidLine {
        label: String,
        #[source]
        source: LineIdError,
    },
    #[error("failed to claim line for binding '{label}': {source}")]
    Claim {
        label: String,
        #[source]
        source: ClaimError,
    },
}

fn trigger_edge(trigger: TriggerEdge) -> Edge {
    match trigger {
        TriggerEdge::Falling => Edge::Falling,
        TriggerEdge::Rising => Edge::Rising,
        TriggerEdge::Both => Edge::Both,
    }
}

/// The set of claimed input lines behind one button device.
///
/// Bring-up is all-or-nothing: if any binding fails to claim, every line
/// claimed so far is released before the error is reported. The claims (and
/// their edge handlers) live for the bank's lifetime, independent of
/// consumer open/close cycles.
#[derive(Debug)]
pub struct ButtonBank {
    lines: Vec<ClaimedLine>,
}

impl ButtonBank {
    pub fn probe(
        chip: &Arc<SimChip>,
        manifest: &PadManifest,
        slot: &Arc<EventSlot>,
    ) -> Result<Self, ProbeError> {
        let mut claimed = Vec::with_capacity(manifest.lines.len());
        for binding in &manifest.lines {
            let line = LineId::new(binding.id).map_err(|source| {
                error!("binding '{}' carries a bad line id: {}", binding.label, source);
                ProbeError::InvalidLine {
                    label: binding.label.clone(),
                    source,
                }
            })?;

            let config = LineConfig {
                trigger: trigger_edge(binding.trigger),
                debounce: Duration::from_millis(binding.debounce_ms),
            };

            let result = chip
                .line_probe(binding.offset)
                .and_then(|probe| {
                    let handler = EdgeHandler::new(line, probe, Arc::clone(slot));
                    chip.claim(binding.offset, &binding.label, config, handler)
                });
            match result {
                Ok(claim) => claimed.push(claim),
                Err(source) => {
                    // `claimed` drops here, releasing every earlier line
                    // before the failure is reported.
                    error!("failed to claim line '{}': {}", binding.label, source);
                    return Err(ProbeError::Claim {
                        label: binding.label.clone(),
                        source,
                    });
                }
            }
        }
        info!(
            "claimed {} input lines on chip '{}'",
            claimed.len(),
            chip.name()
        );
        Ok(Self { lines: claimed })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn lines(&self) -> &[ClaimedLine] {
        &self.lines
    }
}

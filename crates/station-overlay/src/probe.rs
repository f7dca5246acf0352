// Copyright 2025 Chris Custine
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Probe state machine.
//!
//! The probe is either idle, following the cursor, or showing a fixed
//! point. [`ProbeMode`] makes those three exclusive: fixing a probe always
//! stops cursor tracking, and the last fixed probe survives until it is
//! replaced by another fix.
//!
//! ```text
//! Inactive --toggle--> Active --toggle--> Inactive   (no fixed probe on record)
//! Fixed    --toggle--> Active --toggle--> Fixed      (fixed probe on record)
//! any      --fix-----> Fixed
//! ```

use log::debug;

use crate::model::Position;

/// Probe radius used when the configured field is empty or invalid.
pub const DEFAULT_PROBE_RADIUS_M: u32 = 150;

/// A probe fixed at a point with its own radius.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedProbe {
    pub position: Position,
    pub radius_m: u32,
}

/// Current probe mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProbeMode {
    /// Not tracking and nothing fixed.
    Inactive,
    /// Following the cursor; `cursor` is `None` until the first move event.
    Active { cursor: Option<Position> },
    /// Not tracking; the last fixed probe is displayed.
    Fixed,
}

/// The single cursor-following marker, allocated once and moved in place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FloatingMarker {
    pub position: Position,
    pub visible: bool,
}

/// Read-only view of the probe for presentation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProbeState {
    pub active: bool,
    pub floating_position: Option<Position>,
    pub fixed: Option<FixedProbe>,
}

/// Result of a fix action.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixOutcome {
    pub probe: FixedProbe,
    /// True when the fix ended live tracking.
    pub tracking_stopped: bool,
}

/// Owns the probe mode, the floating marker and the fixed probe record.
#[derive(Debug)]
pub struct ProbeMachine {
    mode: ProbeMode,
    fixed: Option<FixedProbe>,
    floating: FloatingMarker,
    default_radius_m: u32,
}

impl ProbeMachine {
    /// Create an inactive probe whose hidden marker rests at `origin`.
    #[must_use]
    pub fn new(origin: Position, default_radius_m: u32) -> Self {
        Self {
            mode: ProbeMode::Inactive,
            fixed: None,
            floating: FloatingMarker {
                position: origin,
                visible: false,
            },
            default_radius_m: if default_radius_m > 0 {
                default_radius_m
            } else {
                DEFAULT_PROBE_RADIUS_M
            },
        }
    }

    #[must_use]
    pub fn mode(&self) -> ProbeMode {
        self.mode
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        matches!(self.mode, ProbeMode::Active { .. })
    }

    #[must_use]
    pub fn fixed(&self) -> Option<FixedProbe> {
        self.fixed
    }

    #[must_use]
    pub fn floating_marker(&self) -> FloatingMarker {
        self.floating
    }

    #[must_use]
    pub fn default_radius_m(&self) -> u32 {
        self.default_radius_m
    }

    #[must_use]
    pub fn state(&self) -> ProbeState {
        let floating_position = match self.mode {
            ProbeMode::Active { cursor } => cursor,
            ProbeMode::Inactive | ProbeMode::Fixed => None,
        };

        ProbeState {
            active: self.is_active(),
            floating_position,
            fixed: self.fixed,
        }
    }

    /// Start or stop live tracking.
    ///
    /// The floating marker only shows while tracking and no fixed probe
    /// exists. Stopping returns to [`ProbeMode::Fixed`] when a fixed probe
    /// is on record, otherwise to [`ProbeMode::Inactive`].
    pub fn toggle(&mut self) -> ProbeMode {
        self.mode = match self.mode {
            ProbeMode::Inactive | ProbeMode::Fixed => {
                self.floating.visible = self.fixed.is_none();
                ProbeMode::Active { cursor: None }
            }
            ProbeMode::Active { .. } => {
                self.floating.visible = false;
                if self.fixed.is_some() {
                    ProbeMode::Fixed
                } else {
                    ProbeMode::Inactive
                }
            }
        };

        debug!("Probe toggled to {:?}", self.mode);
        self.mode
    }

    /// Track a cursor move; returns false when the probe is not tracking.
    pub fn on_cursor_move(&mut self, position: Position) -> bool {
        match &mut self.mode {
            ProbeMode::Active { cursor } => {
                *cursor = Some(position);
                self.floating.position = position;
                true
            }
            ProbeMode::Inactive | ProbeMode::Fixed => false,
        }
    }

    /// Fix the probe at `position`, replacing any earlier fixed probe.
    ///
    /// A missing or zero radius uses the configured default. Allowed in any
    /// mode; when tracking it stops exactly as [`ProbeMachine::toggle`] would.
    pub fn fix(&mut self, position: Position, radius_m: Option<u32>) -> FixOutcome {
        let radius_m = radius_m
            .filter(|r| *r > 0)
            .unwrap_or(self.default_radius_m);
        let probe = FixedProbe { position, radius_m };

        let tracking_stopped = self.is_active();
        self.fixed = Some(probe);
        self.floating.visible = false;
        self.mode = ProbeMode::Fixed;

        debug!("Probe fixed at {position} with radius {radius_m} m");
        FixOutcome {
            probe,
            tracking_stopped,
        }
    }
}

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

//! Info panel projection.
//!
//! Turns station and probe state into the four text fields shown in the
//! side panel. All coordinates use fixed six-decimal precision.

use crate::model::{GeofenceSpec, Position, StationRecord};
use crate::probe::{FixOutcome, ProbeState};

/// Probe readout while tracking but before the first cursor move.
pub const PROBE_WAITING: &str = "waiting for cursor...";

/// Probe readout when tracking is off and nothing is fixed.
pub const PROBE_DEACTIVATED: &str = "probe off";

/// Station name shown before anything has been drawn.
pub const NO_STATION: &str = "-";

/// Format a coordinate with exactly six decimal places.
#[must_use]
pub fn format_coord(value: f64) -> String {
    format!("{value:.6}")
}

/// One-line summary of the three radii drawn around a station.
#[must_use]
pub fn radius_summary(station: &StationRecord, geofence: GeofenceSpec) -> String {
    format!(
        "API: {} m | Entry: {} m | Exit: {} m",
        station.api_radius_m, geofence.entry_radius_m, geofence.exit_radius_m
    )
}

/// Probe latitude/longitude fields for a probe state.
#[must_use]
pub fn probe_fields(state: &ProbeState) -> (String, String) {
    let shown = if state.active {
        match state.floating_position {
            Some(position) => Some(position),
            None => return (PROBE_WAITING.to_string(), PROBE_WAITING.to_string()),
        }
    } else {
        state.fixed.map(|fixed| fixed.position)
    };

    match shown {
        Some(position) => (
            format_coord(position.latitude()),
            format_coord(position.longitude()),
        ),
        None => (
            PROBE_DEACTIVATED.to_string(),
            PROBE_DEACTIVATED.to_string(),
        ),
    }
}

/// Operator notice after a probe has been fixed.
#[must_use]
pub fn fix_notice(outcome: &FixOutcome) -> String {
    let position = outcome.probe.position;
    let mut notice = format!(
        "Probe fixed at {}, {} with a {} m radius.",
        format_coord(position.latitude()),
        format_coord(position.longitude()),
        outcome.probe.radius_m
    );
    if outcome.tracking_stopped {
        notice.push_str(" Probe tracking deactivated.");
    }
    notice
}

/// Text content of the info panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelText {
    pub name: String,
    pub radius_summary: String,
    pub probe_lat: String,
    pub probe_lng: String,
}

impl PanelText {
    /// Empty station fields with the probe readout at `center`.
    #[must_use]
    pub fn initial(center: Position) -> Self {
        Self {
            name: NO_STATION.to_string(),
            radius_summary: String::new(),
            probe_lat: format_coord(center.latitude()),
            probe_lng: format_coord(center.longitude()),
        }
    }

    pub fn show_station(&mut self, station: &StationRecord, geofence: GeofenceSpec) {
        self.name.clone_from(&station.name);
        self.radius_summary = radius_summary(station, geofence);
    }

    pub fn show_probe(&mut self, state: &ProbeState) {
        let (lat, lng) = probe_fields(state);
        self.probe_lat = lat;
        self.probe_lng = lng;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::FixedProbe;

    fn pos(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon).unwrap()
    }

    #[test]
    fn test_format_coord_six_decimals() {
        for value in [0.0, -3.75, 1.0 / 3.0, -38.123_456_789, 179.999_999_9, 1e-9, 12345.0] {
            let text = format_coord(value);
            let decimals = text.split('.').nth(1).unwrap();
            assert_eq!(decimals.len(), 6, "{text}");
        }
        assert_eq!(format_coord(-3.76), "-3.760000");
    }

    #[test]
    fn test_radius_summary() {
        let station = StationRecord::manual(pos(-3.75, -38.52));
        let text = radius_summary(&station, GeofenceSpec::new(100, 200).unwrap());
        assert_eq!(text, "API: 0 m | Entry: 100 m | Exit: 200 m");
    }

    #[test]
    fn test_probe_fields_waiting_then_live() {
        let mut state = ProbeState {
            active: true,
            floating_position: None,
            fixed: None,
        };
        assert_eq!(probe_fields(&state).0, PROBE_WAITING);

        state.floating_position = Some(pos(-3.76, -38.53));
        assert_eq!(
            probe_fields(&state),
            ("-3.760000".to_string(), "-38.530000".to_string())
        );
    }

    #[test]
    fn test_probe_fields_inactive() {
        let mut state = ProbeState {
            active: false,
            floating_position: None,
            fixed: None,
        };
        assert_eq!(probe_fields(&state).1, PROBE_DEACTIVATED);

        state.fixed = Some(FixedProbe {
            position: pos(1.5, 2.5),
            radius_m: 75,
        });
        assert_eq!(
            probe_fields(&state),
            ("1.500000".to_string(), "2.500000".to_string())
        );
    }

    #[test]
    fn test_fix_notice_mentions_deactivation() {
        let outcome = FixOutcome {
            probe: FixedProbe {
                position: pos(-3.76, -38.53),
                radius_m: 75,
            },
            tracking_stopped: true,
        };
        assert_eq!(
            fix_notice(&outcome),
            "Probe fixed at -3.760000, -38.530000 with a 75 m radius. Probe tracking deactivated."
        );
    }

    #[test]
    fn test_show_station_updates_name_and_summary() {
        let mut panel = PanelText::initial(pos(-3.7678, -38.5365));
        assert_eq!(panel.probe_lat, "-3.767800");

        let station = StationRecord::manual(pos(-3.75, -38.52));
        panel.show_station(&station, GeofenceSpec::default());
        assert_eq!(panel.name, station.name);
        assert!(panel.radius_summary.contains("Entry: 100 m"));
    }
}

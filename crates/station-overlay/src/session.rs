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

//! Session context tying the core components together.
//!
//! A [`Session`] owns the overlay registry, the probe machine and the panel
//! text, and mirrors every change onto its [`RenderSurface`]. It handles one
//! event at a time; the only suspending operation is a station lookup, which
//! is split into [`Session::begin_lookup`] and [`Session::complete_lookup`]
//! so the resolver can run off the event loop. Each lookup gets a ticket and
//! only the newest ticket may draw.

use log::{debug, info};

use crate::error::OverlayError;
use crate::model::{parse_coordinate, GeofenceSpec, OverlayKind, Position, StationRecord};
use crate::panel::PanelText;
use crate::probe::{FixOutcome, ProbeMachine, ProbeMode, DEFAULT_PROBE_RADIUS_M};
use crate::registry::{OverlayGroupHandle, OverlayRegistry};
use crate::resolver::{StationResolver, StationSource};
use crate::surface::RenderSurface;

/// Zoom level used when focusing a freshly drawn station.
pub const DEFAULT_FOCUS_ZOOM: u8 = 16;

/// Session tuning.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Initial map center; also seeds the probe readout.
    pub initial_center: Position,
    /// Zoom applied when a station is drawn.
    pub focus_zoom: u8,
    /// Probe radius when the probe radius field is unset or invalid.
    pub default_probe_radius_m: u32,
}

impl SessionConfig {
    #[must_use]
    pub fn new(initial_center: Position) -> Self {
        Self {
            initial_center,
            focus_zoom: DEFAULT_FOCUS_ZOOM,
            default_probe_radius_m: DEFAULT_PROBE_RADIUS_M,
        }
    }
}

/// Claim on the right to draw the result of one station lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupTicket {
    seq: u64,
    number: String,
}

impl LookupTicket {
    /// The trimmed station number this ticket was issued for.
    #[must_use]
    pub fn number(&self) -> &str {
        &self.number
    }
}

/// What happened to a completed lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum LookupOutcome {
    /// The station was drawn as the current lookup group.
    Drawn {
        handle: OverlayGroupHandle,
        station: StationRecord,
    },
    /// A newer lookup was issued meanwhile; this result was dropped.
    Superseded,
}

/// Explicit owner of all station/probe state for one map.
#[derive(Debug)]
pub struct Session<R> {
    surface: R,
    registry: OverlayRegistry,
    probe: ProbeMachine,
    panel: PanelText,
    focus_zoom: u8,
    issued_lookups: u64,
}

impl<R: RenderSurface> Session<R> {
    /// Create a session and push the initial marker and panel state to `surface`.
    pub fn new(mut surface: R, config: SessionConfig) -> Self {
        let probe = ProbeMachine::new(config.initial_center, config.default_probe_radius_m);
        let panel = PanelText::initial(config.initial_center);

        surface.update_floating_marker(probe.floating_marker());
        surface.update_panel_text(&panel);

        Self {
            surface,
            registry: OverlayRegistry::new(),
            probe,
            panel,
            focus_zoom: config.focus_zoom,
            issued_lookups: 0,
        }
    }

    #[must_use]
    pub fn surface(&self) -> &R {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut R {
        &mut self.surface
    }

    #[must_use]
    pub fn registry(&self) -> &OverlayRegistry {
        &self.registry
    }

    #[must_use]
    pub fn probe(&self) -> &ProbeMachine {
        &self.probe
    }

    #[must_use]
    pub fn panel(&self) -> &PanelText {
        &self.panel
    }

    /// Validate a station number and issue a ticket for its lookup.
    pub fn begin_lookup(&mut self, number: &str) -> Result<LookupTicket, OverlayError> {
        let number = number.trim();
        if number.is_empty() {
            return Err(OverlayError::InvalidInput(
                "enter a station number".to_string(),
            ));
        }

        self.issued_lookups += 1;
        Ok(LookupTicket {
            seq: self.issued_lookups,
            number: number.to_string(),
        })
    }

    /// Apply a resolver result for `ticket`.
    ///
    /// Results for superseded tickets are dropped, errors included.
    /// `geofence` is read at completion time, not when the lookup started.
    pub fn complete_lookup(
        &mut self,
        ticket: &LookupTicket,
        result: Result<StationRecord, OverlayError>,
        geofence: GeofenceSpec,
    ) -> Result<LookupOutcome, OverlayError> {
        if ticket.seq < self.issued_lookups {
            debug!(
                "Dropping lookup for station {} (ticket {}, newest {})",
                ticket.number, ticket.seq, self.issued_lookups
            );
            return Ok(LookupOutcome::Superseded);
        }

        let station = result?;
        info!(
            "Drawing station {} '{}' at {} ({})",
            station.id,
            station.name,
            station.position,
            station.origin.as_str()
        );
        let handle = self.draw(OverlayKind::Lookup, &station, geofence);
        Ok(LookupOutcome::Drawn { handle, station })
    }

    /// Resolve and draw a station in one step.
    pub async fn lookup<S: StationSource>(
        &mut self,
        resolver: &StationResolver<S>,
        number: &str,
        geofence: GeofenceSpec,
    ) -> Result<LookupOutcome, OverlayError> {
        let ticket = self.begin_lookup(number)?;
        let result = resolver.resolve(ticket.number()).await;
        self.complete_lookup(&ticket, result, geofence)
    }

    /// Draw a manually entered coordinate as the current manual group.
    pub fn submit_manual(
        &mut self,
        latitude: &str,
        longitude: &str,
        geofence: GeofenceSpec,
    ) -> Result<OverlayGroupHandle, OverlayError> {
        let (Some(lat), Some(lon)) = (parse_coordinate(latitude), parse_coordinate(longitude))
        else {
            return Err(OverlayError::InvalidInput(
                "enter a valid latitude and longitude".to_string(),
            ));
        };

        let station = StationRecord::manual(Position::new(lat, lon)?);
        Ok(self.draw(OverlayKind::Manual, &station, geofence))
    }

    fn draw(
        &mut self,
        kind: OverlayKind,
        station: &StationRecord,
        geofence: GeofenceSpec,
    ) -> OverlayGroupHandle {
        let handle = self.registry.replace(kind, station, geofence);
        self.publish_group(kind);
        self.surface.focus_view(handle.focus, self.focus_zoom);

        self.panel.show_station(station, geofence);
        self.surface.update_panel_text(&self.panel);
        handle
    }

    fn publish_group(&mut self, kind: OverlayKind) {
        self.surface.remove_overlay_group(kind);
        if let Some(group) = self.registry.group(kind) {
            self.surface.render_overlay_group(group);
        }
    }

    /// Start or stop live probe tracking.
    pub fn toggle_probe(&mut self) -> ProbeMode {
        let mode = self.probe.toggle();
        self.surface
            .update_floating_marker(self.probe.floating_marker());
        self.refresh_probe_panel();
        mode
    }

    /// Feed a cursor move; only the floating marker and readout change.
    pub fn cursor_moved(&mut self, position: Position) -> bool {
        if !self.probe.on_cursor_move(position) {
            return false;
        }
        self.surface
            .update_floating_marker(self.probe.floating_marker());
        self.refresh_probe_panel();
        true
    }

    /// Fix the probe at `position`; see [`ProbeMachine::fix`].
    pub fn fix_probe(&mut self, position: Position, radius_m: Option<u32>) -> FixOutcome {
        let outcome = self.probe.fix(position, radius_m);
        self.registry
            .replace_probe(outcome.probe.position, outcome.probe.radius_m);
        self.publish_group(OverlayKind::ProbeFixed);
        self.surface
            .update_floating_marker(self.probe.floating_marker());
        self.refresh_probe_panel();

        info!(
            "Probe fixed at {} with radius {} m",
            outcome.probe.position, outcome.probe.radius_m
        );
        outcome
    }

    fn refresh_probe_panel(&mut self) {
        self.panel.show_probe(&self.probe.state());
        self.surface.update_panel_text(&self.panel);
    }
}

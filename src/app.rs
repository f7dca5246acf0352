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

use log::{info, warn};
use station_overlay::{
    fix_notice, parse_radius, GeofenceSpec, LookupOutcome, OverlayError, Session,
    StationOrigin, StationResolver,
};

use crate::config::AppConfig;
use crate::lookup::{Backend, LookupWorker};
use crate::map::{draw_map, MapInteraction, TileManager};
use crate::scene::{MapScene, ViewState};
use crate::ui::{AlertBanner, ControlPanel, PanelAction, PanelStatus};

pub type AppError = Box<dyn std::error::Error + Send + Sync>;

pub struct StationApp {
    session: Session<MapScene>,
    worker: LookupWorker,
    tiles: TileManager,
    control: ControlPanel,
    alerts: AlertBanner,
    geofence_defaults: GeofenceSpec,
    last_origin: Option<StationOrigin>,
    last_resolved_at: Option<chrono::DateTime<chrono::Utc>>,
}

impl std::fmt::Debug for StationApp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StationApp")
            .field("session", &self.session)
            .field("last_origin", &self.last_origin)
            .finish_non_exhaustive()
    }
}

impl StationApp {
    pub fn new(
        ctx: &egui::Context,
        config: &AppConfig,
        offline: bool,
        initial_station: Option<String>,
    ) -> Result<Self, AppError> {
        let session_config = config.session_config();
        let view = ViewState::new(session_config.initial_center, config.initial_zoom);
        let session = Session::new(MapScene::new(view), session_config);

        let backend = Backend::from_config(config, offline)?;
        let worker = LookupWorker::new(StationResolver::new(backend, config.resolver_config()))?;

        let geofence_defaults = config.geofence_defaults();
        let control = ControlPanel::new(geofence_defaults, config.default_probe_radius_m);

        let mut app = Self {
            session,
            worker,
            tiles: TileManager::new()?,
            control,
            alerts: AlertBanner::default(),
            geofence_defaults,
            last_origin: None,
            last_resolved_at: None,
        };

        if let Some(number) = initial_station {
            info!("Looking up station {number} from the command line");
            app.control.station_number.clone_from(&number);
            app.start_lookup(&number, ctx);
        }

        Ok(app)
    }

    fn start_lookup(&mut self, number: &str, ctx: &egui::Context) {
        match self.session.begin_lookup(number) {
            Ok(ticket) => self.worker.submit(ticket, ctx),
            Err(e) => self.alerts.error(&e),
        }
    }

    fn apply_completed_lookups(&mut self) {
        for completion in self.worker.drain() {
            let geofence = self.control.geofence(self.geofence_defaults);
            match self
                .session
                .complete_lookup(&completion.ticket, completion.result, geofence)
            {
                Ok(LookupOutcome::Drawn { station, .. }) => {
                    self.last_origin = Some(station.origin);
                    self.last_resolved_at = Some(station.resolved_at);
                }
                Ok(LookupOutcome::Superseded) => {}
                Err(e) => self.report(&e),
            }
        }
    }

    fn handle_action(&mut self, action: PanelAction, ctx: &egui::Context) {
        match action {
            PanelAction::Search(number) => self.start_lookup(&number, ctx),
            PanelAction::UseManual => {
                let geofence = self.control.geofence(self.geofence_defaults);
                match self.session.submit_manual(
                    &self.control.latitude,
                    &self.control.longitude,
                    geofence,
                ) {
                    Ok(_) => {
                        self.last_origin = Some(StationOrigin::Manual);
                        self.last_resolved_at = Some(chrono::Utc::now());
                    }
                    Err(e) => self.report(&e),
                }
            }
            PanelAction::ToggleProbe => {
                let mode = self.session.toggle_probe();
                info!("Probe mode is now {mode:?}");
            }
        }
    }

    fn handle_map(&mut self, interaction: MapInteraction) {
        if let Some(position) = interaction.hover {
            self.session.cursor_moved(position);
        }
        if let Some(position) = interaction.secondary_click {
            let radius = parse_radius(&self.control.probe_radius);
            let outcome = self.session.fix_probe(position, radius);
            self.alerts.notice(fix_notice(&outcome));
        }
    }

    fn report(&mut self, error: &OverlayError) {
        if error.is_user_facing() {
            self.alerts.error(error);
        } else {
            warn!("Station lookup failed: {error}");
        }
    }

    fn panel_status(&self) -> PanelStatus {
        PanelStatus {
            probe_active: self.session.probe().is_active(),
            lookup_pending: self.worker.is_busy(),
            last_origin: self.last_origin,
            last_resolved_at: self.last_resolved_at,
        }
    }
}

impl eframe::App for StationApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.apply_completed_lookups();

        // Map takes full width
        let interaction = egui::CentralPanel::default()
            .frame(egui::Frame::NONE)
            .show(ctx, |ui| draw_map(ui, self.session.surface_mut(), &self.tiles))
            .inner;

        let status = self.panel_status();
        let actions = self
            .control
            .render(ctx, self.session.surface().panel(), status);

        self.handle_map(interaction);

        for action in actions {
            self.handle_action(action, ctx);
        }

        self.alerts.render(ctx);

        if self.worker.is_busy() {
            ctx.request_repaint_after(std::time::Duration::from_millis(100));
        }
    }
}

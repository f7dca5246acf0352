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

use chrono::{DateTime, Local, Utc};
use egui::{Color32, RichText};
use station_overlay::{GeofenceSpec, PanelText, StationOrigin};

const HEADER_COLOR: Color32 = Color32::from_rgb(100, 180, 220);
const LABEL_COLOR: Color32 = Color32::from_rgb(150, 160, 170);

/// What the operator asked for this frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelAction {
    Search(String),
    UseManual,
    ToggleProbe,
}

/// Read-only facts the panel shows next to the session's text fields
#[derive(Debug, Clone, Copy, Default)]
pub struct PanelStatus {
    pub probe_active: bool,
    pub lookup_pending: bool,
    pub last_origin: Option<StationOrigin>,
    pub last_resolved_at: Option<DateTime<Utc>>,
}

/// Floating window with the station search, manual entry and probe controls
#[derive(Debug)]
pub struct ControlPanel {
    pub station_number: String,
    pub latitude: String,
    pub longitude: String,
    pub entry_radius: String,
    pub exit_radius: String,
    pub probe_radius: String,
}

impl ControlPanel {
    pub fn new(geofence: GeofenceSpec, probe_radius_m: u32) -> Self {
        Self {
            station_number: String::new(),
            latitude: String::new(),
            longitude: String::new(),
            entry_radius: geofence.entry_radius_m.to_string(),
            exit_radius: geofence.exit_radius_m.to_string(),
            probe_radius: probe_radius_m.to_string(),
        }
    }

    /// Geofence from the radius fields, read fresh on every draw
    pub fn geofence(&self, defaults: GeofenceSpec) -> GeofenceSpec {
        GeofenceSpec::from_inputs(&self.entry_radius, &self.exit_radius, defaults)
    }

    pub fn render(
        &mut self,
        ctx: &egui::Context,
        text: Option<&PanelText>,
        status: PanelStatus,
    ) -> Vec<PanelAction> {
        let mut actions = Vec::new();

        egui::Window::new("Station Radius")
            .anchor(egui::Align2::RIGHT_TOP, egui::vec2(-10.0, 10.0))
            .default_width(300.0)
            .resizable(false)
            .collapsible(true)
            .frame(egui::Frame::window(&ctx.style())
                .fill(Color32::from_rgba_unmultiplied(25, 30, 35, 230))
                .stroke(egui::Stroke::new(1.0, Color32::from_rgb(60, 80, 100)))
                .corner_radius(6.0))
            .show(ctx, |ui| {
                self.render_search_section(ui, status, &mut actions);
                ui.add_space(6.0);
                self.render_manual_section(ui, &mut actions);
                ui.add_space(6.0);
                self.render_geofence_section(ui);
                ui.add_space(6.0);
                self.render_probe_section(ui, status, &mut actions);
                ui.add_space(6.0);
                Self::render_info_section(ui, text, status);
            });

        actions
    }

    fn section_header(ui: &mut egui::Ui, title: &str) {
        ui.label(RichText::new(title).color(HEADER_COLOR).size(12.0).strong());
        ui.separator();
    }

    fn render_search_section(
        &mut self,
        ui: &mut egui::Ui,
        status: PanelStatus,
        actions: &mut Vec<PanelAction>,
    ) {
        Self::section_header(ui, "◈ STATION");

        ui.horizontal(|ui| {
            let response = ui.add(
                egui::TextEdit::singleline(&mut self.station_number)
                    .hint_text("Station number")
                    .desired_width(150.0),
            );
            let submitted =
                response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

            if ui.button("Search").clicked() || submitted {
                actions.push(PanelAction::Search(self.station_number.clone()));
            }
            if status.lookup_pending {
                ui.spinner();
            }
        });
    }

    fn render_manual_section(&mut self, ui: &mut egui::Ui, actions: &mut Vec<PanelAction>) {
        Self::section_header(ui, "◈ MANUAL COORDINATE");

        egui::Grid::new("manual_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label(RichText::new("Latitude").color(LABEL_COLOR));
                ui.add(egui::TextEdit::singleline(&mut self.latitude).desired_width(150.0));
                ui.end_row();

                ui.label(RichText::new("Longitude").color(LABEL_COLOR));
                ui.add(egui::TextEdit::singleline(&mut self.longitude).desired_width(150.0));
                ui.end_row();
            });

        if ui.button("Show coordinate").clicked() {
            actions.push(PanelAction::UseManual);
        }
    }

    fn render_geofence_section(&mut self, ui: &mut egui::Ui) {
        Self::section_header(ui, "◈ GEOFENCE (m)");

        egui::Grid::new("geofence_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label(RichText::new("Entry").color(LABEL_COLOR));
                ui.add(egui::TextEdit::singleline(&mut self.entry_radius).desired_width(80.0));
                ui.end_row();

                ui.label(RichText::new("Exit").color(LABEL_COLOR));
                ui.add(egui::TextEdit::singleline(&mut self.exit_radius).desired_width(80.0));
                ui.end_row();
            });
    }

    fn render_probe_section(
        &mut self,
        ui: &mut egui::Ui,
        status: PanelStatus,
        actions: &mut Vec<PanelAction>,
    ) {
        Self::section_header(ui, "◈ PROBE");

        ui.horizontal(|ui| {
            ui.label(RichText::new("Radius").color(LABEL_COLOR));
            ui.add(egui::TextEdit::singleline(&mut self.probe_radius).desired_width(80.0));

            let label = if status.probe_active { "Stop probe" } else { "Start probe" };
            if ui.button(label).clicked() {
                actions.push(PanelAction::ToggleProbe);
            }
        });
    }

    fn render_info_section(ui: &mut egui::Ui, text: Option<&PanelText>, status: PanelStatus) {
        Self::section_header(ui, "◈ INFO");

        let Some(text) = text else {
            return;
        };

        egui::Grid::new("info_grid")
            .num_columns(2)
            .spacing([8.0, 4.0])
            .show(ui, |ui| {
                ui.label(RichText::new("Name").color(LABEL_COLOR));
                ui.label(&text.name);
                ui.end_row();

                ui.label(RichText::new("Radii").color(LABEL_COLOR));
                ui.label(&text.radius_summary);
                ui.end_row();

                if let Some(origin) = status.last_origin {
                    ui.label(RichText::new("Source").color(LABEL_COLOR));
                    ui.label(origin.as_str());
                    ui.end_row();
                }

                if let Some(resolved_at) = status.last_resolved_at {
                    ui.label(RichText::new("Resolved").color(LABEL_COLOR));
                    ui.label(resolved_at.with_timezone(&Local).format("%H:%M:%S").to_string());
                    ui.end_row();
                }

                ui.label(RichText::new("Probe lat").color(LABEL_COLOR));
                ui.label(RichText::new(&text.probe_lat).monospace());
                ui.end_row();

                ui.label(RichText::new("Probe lng").color(LABEL_COLOR));
                ui.label(RichText::new(&text.probe_lng).monospace());
                ui.end_row();
            });
    }
}

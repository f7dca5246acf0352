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

use std::time::{Duration, Instant};

use egui::{Color32, RichText};
use station_overlay::OverlayError;

const NOTICE_TTL: Duration = Duration::from_secs(6);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Notice,
    Error,
}

#[derive(Debug, Clone)]
pub struct Alert {
    pub level: AlertLevel,
    pub message: String,
    raised_at: Instant,
}

impl Alert {
    /// Notices fade out on their own; errors stay until dismissed
    fn expired(&self, now: Instant) -> bool {
        self.level == AlertLevel::Notice && now.duration_since(self.raised_at) > NOTICE_TTL
    }
}

/// Single-slot alert banner; a new alert replaces the current one
#[derive(Debug, Default)]
pub struct AlertBanner {
    current: Option<Alert>,
}

impl AlertBanner {
    pub fn notice(&mut self, message: impl Into<String>) {
        self.raise(AlertLevel::Notice, message.into());
    }

    pub fn error(&mut self, error: &OverlayError) {
        let message = match error {
            OverlayError::NotFound(number) => {
                format!("Station {number} was not found and no simulated data exists for it.")
            }
            other => other.to_string(),
        };
        self.raise(AlertLevel::Error, message);
    }

    fn raise(&mut self, level: AlertLevel, message: String) {
        self.current = Some(Alert {
            level,
            message,
            raised_at: Instant::now(),
        });
    }

    pub fn current(&self) -> Option<&Alert> {
        self.current.as_ref()
    }

    pub fn dismiss(&mut self) {
        self.current = None;
    }

    pub fn render(&mut self, ctx: &egui::Context) {
        if self.current.as_ref().is_some_and(|alert| alert.expired(Instant::now())) {
            self.current = None;
        }
        let Some(alert) = &self.current else {
            return;
        };

        let (fill, icon) = match alert.level {
            AlertLevel::Notice => (Color32::from_rgba_unmultiplied(30, 90, 60, 230), "ℹ"),
            AlertLevel::Error => (Color32::from_rgba_unmultiplied(160, 40, 40, 235), "⚠"),
        };
        let message = alert.message.clone();
        let mut dismissed = false;

        egui::Window::new("alert")
            .title_bar(false)
            .anchor(egui::Align2::CENTER_TOP, egui::vec2(0.0, 60.0))
            .resizable(false)
            .frame(egui::Frame::window(&ctx.style())
                .fill(fill)
                .stroke(egui::Stroke::new(1.0, Color32::from_rgb(60, 80, 100)))
                .corner_radius(6.0))
            .show(ctx, |ui| {
                ui.horizontal(|ui| {
                    ui.label(RichText::new(format!("{icon} {message}")).color(Color32::WHITE));
                    if ui.small_button("✕").on_hover_text("Dismiss").clicked() {
                        dismissed = true;
                    }
                });
            });

        if dismissed {
            self.dismiss();
        } else {
            ctx.request_repaint_after(Duration::from_millis(500));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_alert_replaces_previous() {
        let mut banner = AlertBanner::default();
        banner.notice("first");
        banner.error(&OverlayError::NotFound("12".to_string()));

        let alert = banner.current().unwrap();
        assert_eq!(alert.level, AlertLevel::Error);
        assert!(alert.message.contains("12"));
    }

    #[test]
    fn test_only_notices_expire() {
        let mut banner = AlertBanner::default();
        banner.notice("fixed");
        let later = Instant::now() + NOTICE_TTL + Duration::from_secs(1);
        assert!(banner.current().unwrap().expired(later));

        banner.error(&OverlayError::InvalidInput("bad".to_string()));
        assert!(!banner.current().unwrap().expired(later));
    }

    #[test]
    fn test_dismiss_clears() {
        let mut banner = AlertBanner::default();
        banner.notice("x");
        banner.dismiss();
        assert!(banner.current().is_none());
    }
}

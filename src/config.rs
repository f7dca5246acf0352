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

//! Application configuration management.
//!
//! Settings are stored in TOML via `confy`. Every field has a serde default
//! so older or hand-edited files keep loading as new settings appear.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use station_overlay::model::{DEFAULT_ENTRY_RADIUS_M, DEFAULT_EXIT_RADIUS_M};
use station_overlay::probe::DEFAULT_PROBE_RADIUS_M;
use station_overlay::resolver::http::DEFAULT_STATION_API_URL;
use station_overlay::resolver::DEFAULT_API_RADIUS_M;
use station_overlay::session::DEFAULT_FOCUS_ZOOM;
use station_overlay::{
    GeofenceSpec, HttpSourceConfig, Position, ResolverConfig, SessionConfig, SimulationMode,
};

const APP_NAME: &str = "station-radius";
const CONFIG_NAME: &str = "config";

/// Environment variable overriding the station service URL.
pub const STATION_API_URL_ENV: &str = "STATION_API_URL";

/// Application configuration stored in TOML format
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AppConfig {
    /// Configuration schema version for migrations
    #[serde(default = "default_config_version")]
    pub config_version: u32,

    /// Station service base URL; the station number is appended
    #[serde(default = "default_station_api_url")]
    pub station_api_url: String,

    /// Station service request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Skip the station service and always use simulated stations
    #[serde(default)]
    pub offline: bool,

    /// Simulated fallback data: "table" or "synthetic"
    #[serde(default)]
    pub simulation_mode: SimulationMode,

    /// Service radius when the station service reports none
    #[serde(default = "default_api_radius_m")]
    pub default_api_radius_m: u32,

    /// Entry radius used when the form field is empty or invalid
    #[serde(default = "default_entry_radius_m")]
    pub default_entry_radius_m: u32,

    /// Exit radius used when the form field is empty or invalid
    #[serde(default = "default_exit_radius_m")]
    pub default_exit_radius_m: u32,

    /// Probe radius used when the form field is empty or invalid
    #[serde(default = "default_probe_radius_m")]
    pub default_probe_radius_m: u32,

    /// Initial map center latitude
    #[serde(default = "default_initial_latitude")]
    pub initial_latitude: f64,

    /// Initial map center longitude
    #[serde(default = "default_initial_longitude")]
    pub initial_longitude: f64,

    /// Initial map zoom level
    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: f32,

    /// Zoom level applied when a station is drawn
    #[serde(default = "default_focus_zoom")]
    pub focus_zoom: u8,
}

// Default value functions for serde
fn default_config_version() -> u32 {
    1
}

fn default_station_api_url() -> String {
    DEFAULT_STATION_API_URL.to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

fn default_api_radius_m() -> u32 {
    DEFAULT_API_RADIUS_M
}

fn default_entry_radius_m() -> u32 {
    DEFAULT_ENTRY_RADIUS_M
}

fn default_exit_radius_m() -> u32 {
    DEFAULT_EXIT_RADIUS_M
}

fn default_probe_radius_m() -> u32 {
    DEFAULT_PROBE_RADIUS_M
}

fn default_initial_latitude() -> f64 {
    -3.7678
}

fn default_initial_longitude() -> f64 {
    -38.5365
}

fn default_initial_zoom() -> f32 {
    12.0
}

fn default_focus_zoom() -> u8 {
    DEFAULT_FOCUS_ZOOM
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_version: default_config_version(),
            station_api_url: default_station_api_url(),
            request_timeout_secs: default_request_timeout_secs(),
            offline: false,
            simulation_mode: SimulationMode::default(),
            default_api_radius_m: default_api_radius_m(),
            default_entry_radius_m: default_entry_radius_m(),
            default_exit_radius_m: default_exit_radius_m(),
            default_probe_radius_m: default_probe_radius_m(),
            initial_latitude: default_initial_latitude(),
            initial_longitude: default_initial_longitude(),
            initial_zoom: default_initial_zoom(),
            focus_zoom: default_focus_zoom(),
        }
    }
}

impl AppConfig {
    /// Load configuration from disk, writing defaults on first run
    pub fn load() -> Result<Self, confy::ConfyError> {
        confy::load(APP_NAME, CONFIG_NAME)
    }

    /// Get the config file path for display to user
    pub fn get_config_path() -> Result<std::path::PathBuf, confy::ConfyError> {
        confy::get_configuration_file_path(APP_NAME, CONFIG_NAME)
    }

    /// Station service URL, environment variable first
    pub fn resolve_station_api_url(&self) -> String {
        Self::pick_station_api_url(std::env::var(STATION_API_URL_ENV).ok(), &self.station_api_url)
    }

    fn pick_station_api_url(env_value: Option<String>, configured: &str) -> String {
        env_value
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| configured.to_string())
    }

    /// Initial map center, falling back to the default when the file holds nonsense
    pub fn initial_center(&self) -> Position {
        Position::new(self.initial_latitude, self.initial_longitude).unwrap_or_else(|e| {
            log::warn!("Ignoring configured initial center: {e}");
            Position::from_surface(default_initial_latitude(), default_initial_longitude())
        })
    }

    pub fn geofence_defaults(&self) -> GeofenceSpec {
        GeofenceSpec::new(self.default_entry_radius_m, self.default_exit_radius_m)
            .unwrap_or_default()
    }

    pub fn resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            default_api_radius_m: self.default_api_radius_m,
            simulation: self.simulation_mode,
        }
    }

    pub fn http_source_config(&self) -> HttpSourceConfig {
        HttpSourceConfig {
            base_url: self.resolve_station_api_url(),
            timeout: Duration::from_secs(self.request_timeout_secs.max(1)),
        }
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            initial_center: self.initial_center(),
            focus_zoom: self.focus_zoom,
            default_probe_radius_m: self.default_probe_radius_m,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_radii_and_zoom() {
        let config = AppConfig::default();
        assert_eq!(config.default_entry_radius_m, 100);
        assert_eq!(config.default_exit_radius_m, 200);
        assert_eq!(config.default_probe_radius_m, 150);
        assert_eq!(config.focus_zoom, 16);
        assert!(!config.offline);
        assert_eq!(config.simulation_mode, SimulationMode::Table);
    }

    #[test]
    fn test_env_url_takes_precedence() {
        assert_eq!(
            AppConfig::pick_station_api_url(Some("http://example.test/api".to_string()), "http://cfg"),
            "http://example.test/api"
        );
        assert_eq!(
            AppConfig::pick_station_api_url(Some("  ".to_string()), "http://cfg"),
            "http://cfg"
        );
        assert_eq!(AppConfig::pick_station_api_url(None, "http://cfg"), "http://cfg");
    }

    #[test]
    fn test_invalid_center_falls_back() {
        let config = AppConfig {
            initial_latitude: 123.0,
            ..AppConfig::default()
        };
        let center = config.initial_center();
        assert!((center.latitude() - default_initial_latitude()).abs() < 1e-9);
    }

    #[test]
    fn test_zero_default_radius_keeps_builtin_geofence() {
        let config = AppConfig {
            default_exit_radius_m: 0,
            ..AppConfig::default()
        };
        assert_eq!(config.geofence_defaults(), GeofenceSpec::default());
    }
}

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

//! Station resolution with graceful degradation to simulated data.
//!
//! [`StationResolver`] asks a [`StationSource`] for the station first. Any
//! failure on that path (transport error, bad status, unreadable payload,
//! missing or zero coordinates) is logged and replaced by the deterministic
//! [`SimulatedStations`] data. Only when the simulation has nothing for the
//! requested number does the caller see [`OverlayError::NotFound`].

pub mod http;
pub mod payload;

use std::future::Future;

use chrono::Utc;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::OverlayError;
use crate::model::{Position, StationOrigin, StationRecord};

pub use http::{HttpSourceConfig, HttpStationSource};
pub use payload::{parse_station_payload, PayloadError, RawStation};

/// Default service radius when the payload carries none.
pub const DEFAULT_API_RADIUS_M: u32 = 100;

/// Base coordinate perturbed by the synthetic simulation.
pub const SYNTHETIC_BASE: (f64, f64) = (-3.7678, -38.5365);

/// Degrees added per unit of `number mod 10` in the synthetic simulation.
const SYNTHETIC_STEP_DEGREES: f64 = 0.001;

/// Fixed simulated stations: (number, name, latitude, longitude, radius).
const SIMULATED_TABLE: &[(&str, &str, f64, f64, u32)] = &[
    ("1", "Posto Simulado 1 (GIST)", -3.7650, -38.5350, 100),
    ("2", "Posto Simulado 2 (GIST)", -3.7500, -38.5200, 80),
    ("3", "Posto Simulado 3 (GIST)", -3.7780, -38.5450, 120),
];

/// Remote source of station payloads.
pub trait StationSource {
    /// Fetch the raw station fields for `number`.
    fn fetch(&self, number: &str) -> impl Future<Output = Result<RawStation, OverlayError>> + Send;
}

/// Source that is never reachable; every lookup uses simulated data.
#[derive(Debug, Clone, Copy, Default)]
pub struct OfflineSource;

impl StationSource for OfflineSource {
    async fn fetch(&self, _number: &str) -> Result<RawStation, OverlayError> {
        Err(OverlayError::RemoteUnavailable("offline mode".to_string()))
    }
}

/// How simulated fallback records are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SimulationMode {
    /// A small fixed table of known stations; unknown numbers are not found.
    #[default]
    Table,
    /// Any numeric station maps to a point near [`SYNTHETIC_BASE`].
    Synthetic,
}

/// Deterministic fallback station data.
#[derive(Debug, Clone, Copy)]
pub struct SimulatedStations {
    mode: SimulationMode,
}

impl SimulatedStations {
    #[must_use]
    pub fn new(mode: SimulationMode) -> Self {
        Self { mode }
    }

    #[must_use]
    pub fn mode(&self) -> SimulationMode {
        self.mode
    }

    /// Simulated fields for `number`, if this mode knows it.
    #[must_use]
    pub fn lookup(&self, number: &str) -> Option<RawStation> {
        match self.mode {
            SimulationMode::Table => SIMULATED_TABLE
                .iter()
                .find(|(id, ..)| *id == number)
                .map(|(_, name, lat, lon, radius)| RawStation {
                    latitude: Some(*lat),
                    longitude: Some(*lon),
                    name: Some((*name).to_string()),
                    radius_m: Some(*radius),
                }),
            SimulationMode::Synthetic => {
                let n: u64 = number.parse().ok()?;
                #[allow(clippy::cast_precision_loss, reason = "value is below 10")]
                let offset = (n % 10) as f64 * SYNTHETIC_STEP_DEGREES;
                Some(RawStation {
                    latitude: Some(SYNTHETIC_BASE.0 + offset),
                    longitude: Some(SYNTHETIC_BASE.1 + offset),
                    name: Some(format!("Posto {n} (Simulado)")),
                    radius_m: None,
                })
            }
        }
    }
}

/// Resolver tuning.
#[derive(Debug, Clone, Copy)]
pub struct ResolverConfig {
    /// Service radius used when a payload has none.
    pub default_api_radius_m: u32,
    /// Fallback data mode.
    pub simulation: SimulationMode,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_api_radius_m: DEFAULT_API_RADIUS_M,
            simulation: SimulationMode::default(),
        }
    }
}

/// Resolves station numbers to [`StationRecord`]s.
#[derive(Debug)]
pub struct StationResolver<S> {
    source: S,
    simulated: SimulatedStations,
    default_api_radius_m: u32,
}

impl<S: StationSource> StationResolver<S> {
    #[must_use]
    pub fn new(source: S, config: ResolverConfig) -> Self {
        Self {
            source,
            simulated: SimulatedStations::new(config.simulation),
            default_api_radius_m: config.default_api_radius_m,
        }
    }

    /// Resolve `number`, falling back to simulated data on any remote failure.
    pub async fn resolve(&self, number: &str) -> Result<StationRecord, OverlayError> {
        let number = number.trim();
        if number.is_empty() {
            return Err(OverlayError::InvalidInput(
                "station number is empty".to_string(),
            ));
        }

        let remote = self
            .source
            .fetch(number)
            .await
            .and_then(Self::usable_remote);

        let (raw, origin) = match remote {
            Ok(raw) => {
                debug!("Station {number} resolved by remote source");
                (raw, StationOrigin::Remote)
            }
            Err(e) => {
                warn!("Station service failed for {number}, using simulated data: {e}");
                let Some(raw) = self.simulated.lookup(number) else {
                    info!(
                        "No simulated station {number} ({:?} mode)",
                        self.simulated.mode()
                    );
                    return Err(OverlayError::NotFound(number.to_string()));
                };
                (raw, StationOrigin::Simulated)
            }
        };

        self.build_record(number, raw, origin)
    }

    /// Remote coordinates that are absent, non-finite or exactly zero count as a failure.
    fn usable_remote(raw: RawStation) -> Result<RawStation, OverlayError> {
        let present = |v: Option<f64>| v.is_some_and(|v| v.is_finite() && v != 0.0);
        if present(raw.latitude) && present(raw.longitude) {
            Ok(raw)
        } else {
            Err(OverlayError::RemoteUnavailable(format!(
                "payload without usable coordinates (lat {:?}, lng {:?})",
                raw.latitude, raw.longitude
            )))
        }
    }

    fn build_record(
        &self,
        number: &str,
        raw: RawStation,
        origin: StationOrigin,
    ) -> Result<StationRecord, OverlayError> {
        let latitude = raw.latitude.unwrap_or(f64::NAN);
        let longitude = raw.longitude.unwrap_or(f64::NAN);

        let position = Position::new(latitude, longitude)?;
        if position.is_origin() {
            return Err(OverlayError::InvalidCoordinates {
                latitude,
                longitude,
            });
        }

        Ok(StationRecord {
            id: number.to_string(),
            name: raw.name.unwrap_or_else(|| format!("Posto {number}")),
            position,
            api_radius_m: raw.radius_m.unwrap_or(self.default_api_radius_m),
            origin,
            resolved_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedSource(RawStation);

    impl StationSource for FixedSource {
        async fn fetch(&self, _number: &str) -> Result<RawStation, OverlayError> {
            Ok(self.0.clone())
        }
    }

    fn resolver(mode: SimulationMode) -> StationResolver<OfflineSource> {
        StationResolver::new(
            OfflineSource,
            ResolverConfig {
                simulation: mode,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_empty_number_is_invalid_input() {
        let result = resolver(SimulationMode::Table).resolve("   ").await;
        assert!(matches!(result, Err(OverlayError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_offline_uses_simulated_table() {
        let record = resolver(SimulationMode::Table).resolve("1").await.unwrap();
        assert_eq!(record.id, "1");
        assert_eq!(record.name, "Posto Simulado 1 (GIST)");
        assert!((record.position.latitude() - (-3.7650)).abs() < 1e-9);
        assert!((record.position.longitude() - (-38.5350)).abs() < 1e-9);
        assert_eq!(record.api_radius_m, 100);
        assert_eq!(record.origin, StationOrigin::Simulated);
    }

    #[tokio::test]
    async fn test_fallback_is_deterministic() {
        let resolver = resolver(SimulationMode::Table);
        let first = resolver.resolve("2").await.unwrap();
        let second = resolver.resolve("2").await.unwrap();
        assert_eq!(first.name, second.name);
        assert_eq!(first.position, second.position);
        assert_eq!(first.api_radius_m, second.api_radius_m);
    }

    #[tokio::test]
    async fn test_unknown_station_not_found() {
        let result = resolver(SimulationMode::Table).resolve("999").await;
        assert_eq!(result, Err(OverlayError::NotFound("999".to_string())));
    }

    #[tokio::test]
    async fn test_synthetic_mode_perturbs_base() {
        let record = resolver(SimulationMode::Synthetic).resolve("23").await.unwrap();
        assert!((record.position.latitude() - (SYNTHETIC_BASE.0 + 0.003)).abs() < 1e-9);
        assert!((record.position.longitude() - (SYNTHETIC_BASE.1 + 0.003)).abs() < 1e-9);
        assert!(record.name.contains("Simulado"));
        assert_eq!(record.api_radius_m, DEFAULT_API_RADIUS_M);
    }

    #[tokio::test]
    async fn test_synthetic_mode_rejects_non_numeric() {
        let result = resolver(SimulationMode::Synthetic).resolve("abc").await;
        assert!(matches!(result, Err(OverlayError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_remote_record_with_defaults() {
        let resolver = StationResolver::new(
            FixedSource(RawStation {
                latitude: Some(-3.7),
                longitude: Some(-38.5),
                name: None,
                radius_m: None,
            }),
            ResolverConfig::default(),
        );
        let record = resolver.resolve("42").await.unwrap();
        assert_eq!(record.name, "Posto 42");
        assert_eq!(record.api_radius_m, DEFAULT_API_RADIUS_M);
        assert_eq!(record.origin, StationOrigin::Remote);
    }

    #[tokio::test]
    async fn test_zero_remote_coordinates_fall_back() {
        let resolver = StationResolver::new(
            FixedSource(RawStation {
                latitude: Some(0.0),
                longitude: Some(-38.5),
                name: Some("Broken".to_string()),
                radius_m: Some(10),
            }),
            ResolverConfig::default(),
        );
        let record = resolver.resolve("3").await.unwrap();
        assert_eq!(record.origin, StationOrigin::Simulated);
        assert_eq!(record.name, "Posto Simulado 3 (GIST)");
    }

    #[tokio::test]
    async fn test_out_of_range_remote_coordinates_are_invalid() {
        let resolver = StationResolver::new(
            FixedSource(RawStation {
                latitude: Some(123.0),
                longitude: Some(-38.5),
                name: None,
                radius_m: None,
            }),
            ResolverConfig::default(),
        );
        let result = resolver.resolve("1").await;
        assert!(matches!(result, Err(OverlayError::InvalidCoordinates { .. })));
    }
}

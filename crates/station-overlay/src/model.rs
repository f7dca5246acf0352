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

//! Coordinate and radius value types.
//!
//! Everything in here is a plain value: positions, station records and
//! geofence radii are created once and superseded, never edited in place.
//! The lenient field parsers accept the same inputs an operator can type
//! into the form fields (leading numeric prefix, surrounding whitespace).

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::OverlayError;

/// Display name used for manually entered coordinates.
pub const MANUAL_STATION_NAME: &str = "Coordenada Manual (Validadores)";

/// Identifier assigned to manually entered coordinates.
pub const MANUAL_STATION_ID: &str = "manual";

/// Default entry radius in meters when the field is empty or invalid.
pub const DEFAULT_ENTRY_RADIUS_M: u32 = 100;

/// Default exit radius in meters when the field is empty or invalid.
pub const DEFAULT_EXIT_RADIUS_M: u32 = 200;

/// A validated geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Position {
    latitude: f64,
    longitude: f64,
}

impl Position {
    /// Create a position, rejecting non-finite or out-of-range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, OverlayError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);

        if valid {
            Ok(Self { latitude, longitude })
        } else {
            Err(OverlayError::InvalidCoordinates { latitude, longitude })
        }
    }

    /// Build a position from a rendering-surface coordinate.
    ///
    /// Latitude is clamped to the poles and longitude wrapped into
    /// `-180..=180`, since a panned map happily reports values past the
    /// antimeridian. Non-finite input collapses to the origin.
    #[must_use]
    pub fn from_surface(latitude: f64, longitude: f64) -> Self {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Self { latitude: 0.0, longitude: 0.0 };
        }

        let mut lon = (longitude + 180.0).rem_euclid(360.0) - 180.0;
        if lon == -180.0 && longitude > 0.0 {
            lon = 180.0;
        }

        Self {
            latitude: latitude.clamp(-90.0, 90.0),
            longitude: lon,
        }
    }

    #[must_use]
    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    #[must_use]
    pub fn longitude(&self) -> f64 {
        self.longitude
    }

    /// True when both axes are exactly zero, which the station service uses
    /// to mean "no coordinates".
    #[must_use]
    pub fn is_origin(&self) -> bool {
        self.latitude == 0.0 && self.longitude == 0.0
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Where a station record came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StationOrigin {
    /// Resolved by the remote station service.
    Remote,
    /// Taken from the simulated fallback data.
    Simulated,
    /// Typed in by the operator.
    Manual,
}

impl StationOrigin {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            StationOrigin::Remote => "remote",
            StationOrigin::Simulated => "simulated",
            StationOrigin::Manual => "manual",
        }
    }
}

/// A resolved station or a manually entered point.
#[derive(Debug, Clone, PartialEq)]
pub struct StationRecord {
    /// Station number, or [`MANUAL_STATION_ID`] for manual entries.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Station position.
    pub position: Position,
    /// Service ("API") radius in meters; zero for manual entries.
    pub api_radius_m: u32,
    /// Source of this record.
    pub origin: StationOrigin,
    /// When this record was produced.
    pub resolved_at: DateTime<Utc>,
}

impl StationRecord {
    /// Record for a manually entered coordinate.
    #[must_use]
    pub fn manual(position: Position) -> Self {
        Self {
            id: MANUAL_STATION_ID.to_string(),
            name: MANUAL_STATION_NAME.to_string(),
            position,
            api_radius_m: 0,
            origin: StationOrigin::Manual,
            resolved_at: Utc::now(),
        }
    }
}

/// Operator-configured entry/exit radii, read fresh for every draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeofenceSpec {
    pub entry_radius_m: u32,
    pub exit_radius_m: u32,
}

impl GeofenceSpec {
    /// Create a geofence; both radii must be positive.
    pub fn new(entry_radius_m: u32, exit_radius_m: u32) -> Result<Self, OverlayError> {
        if entry_radius_m == 0 || exit_radius_m == 0 {
            return Err(OverlayError::InvalidInput(format!(
                "geofence radii must be positive (entry {entry_radius_m} m, exit {exit_radius_m} m)"
            )));
        }
        Ok(Self {
            entry_radius_m,
            exit_radius_m,
        })
    }

    /// Build a geofence from raw form fields.
    ///
    /// Each field that is empty, unparseable or zero falls back to the
    /// matching radius in `defaults`.
    #[must_use]
    pub fn from_inputs(entry: &str, exit: &str, defaults: GeofenceSpec) -> Self {
        Self {
            entry_radius_m: parse_radius(entry).unwrap_or(defaults.entry_radius_m),
            exit_radius_m: parse_radius(exit).unwrap_or(defaults.exit_radius_m),
        }
    }
}

impl Default for GeofenceSpec {
    fn default() -> Self {
        Self {
            entry_radius_m: DEFAULT_ENTRY_RADIUS_M,
            exit_radius_m: DEFAULT_EXIT_RADIUS_M,
        }
    }
}

/// Category tag deciding which rendered group a draw replaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverlayKind {
    /// Station resolved by number.
    Lookup,
    /// Manually entered coordinate.
    Manual,
    /// Fixed probe marker and radius.
    ProbeFixed,
}

impl OverlayKind {
    pub const ALL: [OverlayKind; 3] = [
        OverlayKind::Lookup,
        OverlayKind::Manual,
        OverlayKind::ProbeFixed,
    ];

    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            OverlayKind::Lookup => "lookup",
            OverlayKind::Manual => "manual",
            OverlayKind::ProbeFixed => "probe-fixed",
        }
    }
}

impl fmt::Display for OverlayKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse the leading decimal number of a field, like a form's `parseFloat`.
///
/// Returns `None` for empty input, no numeric prefix, or a non-finite value.
#[must_use]
pub fn parse_coordinate(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    let end = float_prefix_len(trimmed.as_bytes());
    if end == 0 {
        return None;
    }

    trimmed[..end]
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Length of the longest `[+-]digits[.digits][e[+-]digits]` prefix, or 0
/// when the mantissa has no digit.
fn float_prefix_len(bytes: &[u8]) -> usize {
    let digits_from = |start: usize| {
        bytes[start..]
            .iter()
            .take_while(|b| b.is_ascii_digit())
            .count()
    };

    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));
    let int_digits = digits_from(end);
    end += int_digits;

    let mut frac_digits = 0;
    if bytes.get(end) == Some(&b'.') {
        frac_digits = digits_from(end + 1);
        end += 1 + frac_digits;
    }
    if int_digits + frac_digits == 0 {
        return 0;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let sign = usize::from(matches!(bytes.get(end + 1), Some(b'+' | b'-')));
        let exp_digits = digits_from(end + 1 + sign);
        if exp_digits > 0 {
            end += 1 + sign + exp_digits;
        }
    }
    end
}

/// Parse the leading integer of a radius field, like a form's `parseInt`.
///
/// Only strictly positive radii are returned.
#[must_use]
pub fn parse_radius(input: &str) -> Option<u32> {
    let trimmed = input.trim();
    let unsigned = trimmed.strip_prefix('+').unwrap_or(trimmed);

    let digits: String = unsigned.chars().take_while(char::is_ascii_digit).collect();
    if digits.is_empty() {
        return None;
    }

    digits.parse::<u32>().ok().filter(|radius| *radius > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_rejects_out_of_range() {
        assert!(Position::new(-3.75, -38.52).is_ok());
        assert!(Position::new(91.0, 0.0).is_err());
        assert!(Position::new(0.0, -180.5).is_err());
        assert!(Position::new(f64::NAN, 1.0).is_err());
        assert!(Position::new(1.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_position_from_surface_wraps_longitude() {
        let pos = Position::from_surface(95.0, 190.0);
        assert!((pos.latitude() - 90.0).abs() < 1e-9);
        assert!((pos.longitude() - (-170.0)).abs() < 1e-9);

        let pos = Position::from_surface(-3.76, -38.53);
        assert!((pos.latitude() - (-3.76)).abs() < 1e-9);
        assert!((pos.longitude() - (-38.53)).abs() < 1e-9);
    }

    #[test]
    fn test_position_display_uses_six_decimals() {
        let pos = Position::new(-3.75, -38.52).unwrap();
        assert_eq!(pos.to_string(), "-3.750000, -38.520000");
    }

    #[test]
    fn test_parse_coordinate_accepts_numeric_prefix() {
        assert_eq!(parse_coordinate(" -3.75 "), Some(-3.75));
        assert_eq!(parse_coordinate("-38.52abc"), Some(-38.52));
        assert_eq!(parse_coordinate("1e2"), Some(100.0));
        assert_eq!(parse_coordinate("12."), Some(12.0));
    }

    #[test]
    fn test_parse_coordinate_rejects_garbage() {
        assert_eq!(parse_coordinate(""), None);
        assert_eq!(parse_coordinate("   "), None);
        assert_eq!(parse_coordinate("abc"), None);
        assert_eq!(parse_coordinate("inf"), None);
        assert_eq!(parse_coordinate("NaN"), None);
        assert_eq!(parse_coordinate("-"), None);
        assert_eq!(parse_coordinate("."), None);
    }

    #[test]
    fn test_parse_coordinate_exponent_needs_digits() {
        assert_eq!(parse_coordinate("2e"), Some(2.0));
        assert_eq!(parse_coordinate("2e-x"), Some(2.0));
        assert_eq!(parse_coordinate(".5e1"), Some(5.0));
        assert_eq!(parse_coordinate("-3.5-1"), Some(-3.5));
    }

    #[test]
    fn test_parse_coordinate_long_input_is_linear() {
        let started = std::time::Instant::now();
        assert_eq!(parse_coordinate(&"-".repeat(100_000)), None);
        assert_eq!(parse_coordinate(&".".repeat(100_000)), None);
        let digits = format!("1{}", "0".repeat(100_000));
        assert_eq!(parse_coordinate(&digits), None);
        assert!(started.elapsed() < std::time::Duration::from_secs(1));
    }

    #[test]
    fn test_parse_radius_truncates_like_parse_int() {
        assert_eq!(parse_radius("150"), Some(150));
        assert_eq!(parse_radius(" 75m"), Some(75));
        assert_eq!(parse_radius("12.9"), Some(12));
        assert_eq!(parse_radius("0"), None);
        assert_eq!(parse_radius("-5"), None);
        assert_eq!(parse_radius(""), None);
    }

    #[test]
    fn test_geofence_from_inputs_defaults_invalid_fields() {
        let geofence = GeofenceSpec::from_inputs("", "abc", GeofenceSpec::default());
        assert_eq!(geofence, GeofenceSpec::default());

        let geofence = GeofenceSpec::from_inputs("120", "0", GeofenceSpec::default());
        assert_eq!(geofence.entry_radius_m, 120);
        assert_eq!(geofence.exit_radius_m, DEFAULT_EXIT_RADIUS_M);
    }

    #[test]
    fn test_geofence_new_requires_positive_radii() {
        assert!(GeofenceSpec::new(100, 200).is_ok());
        assert!(GeofenceSpec::new(0, 200).is_err());
    }

    #[test]
    fn test_manual_record_has_no_api_radius() {
        let record = StationRecord::manual(Position::new(-3.75, -38.52).unwrap());
        assert_eq!(record.api_radius_m, 0);
        assert_eq!(record.name, MANUAL_STATION_NAME);
        assert_eq!(record.origin, StationOrigin::Manual);
    }
}

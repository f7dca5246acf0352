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

//! Error taxonomy for station resolution and overlay drawing.

use thiserror::Error;

/// Errors surfaced by the station/probe core.
///
/// Only [`OverlayError::RemoteUnavailable`] is recovered internally: the
/// resolver logs it and falls back to simulated data. Every other variant
/// aborts the triggering operation without changing any state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum OverlayError {
    /// A required field was empty or could not be parsed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Latitude/longitude failed numeric validation.
    #[error("invalid coordinates: latitude {latitude}, longitude {longitude}")]
    InvalidCoordinates { latitude: f64, longitude: f64 },

    /// Neither the remote source nor the simulated data knows this station.
    #[error("station {0} not found")]
    NotFound(String),

    /// Network or protocol failure while talking to the remote source.
    #[error("remote station service unavailable: {0}")]
    RemoteUnavailable(String),
}

impl OverlayError {
    /// Whether this error should be shown to the operator as an alert.
    #[must_use]
    pub fn is_user_facing(&self) -> bool {
        !matches!(self, Self::RemoteUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_unavailable_is_not_user_facing() {
        assert!(!OverlayError::RemoteUnavailable("timeout".to_string()).is_user_facing());
        assert!(OverlayError::NotFound("999".to_string()).is_user_facing());
        assert!(OverlayError::InvalidInput("empty".to_string()).is_user_facing());
    }

    #[test]
    fn test_not_found_names_station() {
        let msg = OverlayError::NotFound("999".to_string()).to_string();
        assert_eq!(msg, "station 999 not found");
    }
}

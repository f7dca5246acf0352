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

//! Station lookup, overlay bookkeeping and probe state for geofence radius maps.
//!
//! This crate holds everything about a station radius map that is not
//! drawing. It decides *what* is on the map and *when* it is replaced, and
//! leaves the pixels to a [`RenderSurface`] implementation:
//!
//! - **Model**: positions, station records, geofence radii and overlay kinds
//! - **Resolver**: station lookup against the remote service with a
//!   deterministic simulated fallback
//! - **Registry**: at most one overlay group per kind, replaced wholesale
//! - **Probe**: cursor tracking, fixing and the floating marker
//! - **Panel**: text projection of the above
//! - **Session**: the context object that owns all of it
//!
//! # Example
//!
//! ```
//! use station_overlay::{
//!     GeofenceSpec, OfflineSource, Position, ResolverConfig, Session, SessionConfig,
//!     StationResolver,
//! };
//! # use station_overlay::{FloatingMarker, OverlayGroup, OverlayKind, PanelText, RenderSurface};
//! # #[derive(Debug, Default)]
//! # struct NullSurface;
//! # impl RenderSurface for NullSurface {
//! #     fn render_overlay_group(&mut self, _: &OverlayGroup) {}
//! #     fn remove_overlay_group(&mut self, _: OverlayKind) {}
//! #     fn update_floating_marker(&mut self, _: FloatingMarker) {}
//! #     fn focus_view(&mut self, _: Position, _: u8) {}
//! #     fn update_panel_text(&mut self, _: &PanelText) {}
//! # }
//!
//! # async fn example() {
//! let center = Position::new(-3.7678, -38.5365).unwrap();
//! let mut session = Session::new(NullSurface, SessionConfig::new(center));
//! let resolver = StationResolver::new(OfflineSource, ResolverConfig::default());
//!
//! session.lookup(&resolver, "1", GeofenceSpec::default()).await.unwrap();
//! session.submit_manual("-3.75", "-38.52", GeofenceSpec::default()).unwrap();
//! assert_eq!(session.registry().len(), 2);
//! # }
//! ```

pub mod error;
pub mod model;
pub mod panel;
pub mod probe;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod surface;

pub use error::OverlayError;
pub use model::{
    parse_coordinate, parse_radius, GeofenceSpec, OverlayKind, Position, StationOrigin,
    StationRecord,
};
pub use panel::{fix_notice, format_coord, PanelText};
pub use probe::{FixOutcome, FixedProbe, FloatingMarker, ProbeMachine, ProbeMode, ProbeState};
pub use registry::{
    GroupId, MarkerSpec, MarkerStyle, OverlayGroup, OverlayGroupHandle, OverlayRegistry,
    RingRole, RingSpec,
};
pub use resolver::{
    HttpSourceConfig, HttpStationSource, OfflineSource, RawStation, ResolverConfig,
    SimulatedStations, SimulationMode, StationResolver, StationSource,
};
pub use session::{LookupOutcome, LookupTicket, Session, SessionConfig};
pub use surface::RenderSurface;

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

//! Per-kind overlay bookkeeping.
//!
//! The registry maps each [`OverlayKind`] to the one group currently drawn
//! for it. Replacing a kind is a single map write; the previous group for
//! that kind is disposed and groups of other kinds are never touched.

use std::collections::HashMap;

use log::debug;

use crate::model::{GeofenceSpec, OverlayKind, Position, StationRecord};
use crate::panel::format_coord;

/// Monotonic identifier of a rendered group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(u64);

impl GroupId {
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// Visual style of a position marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerStyle {
    /// Standard station pin.
    Station,
    /// Pin used for a fixed probe.
    ProbePin,
}

/// A position marker with its popup label.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: Position,
    pub label: String,
    pub style: MarkerStyle,
}

/// Semantic role of a radius ring; the surface picks colours from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RingRole {
    /// Service radius reported by the station service.
    Api,
    /// Geofence entry radius.
    Entry,
    /// Geofence exit radius.
    Exit,
    /// Fixed probe radius.
    Probe,
}

/// A circle of `radius_m` meters around `center`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingSpec {
    pub role: RingRole,
    pub center: Position,
    pub radius_m: u32,
}

/// Everything drawn for one overlay kind.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayGroup {
    pub id: GroupId,
    pub kind: OverlayKind,
    pub marker: MarkerSpec,
    pub rings: Vec<RingSpec>,
}

impl OverlayGroup {
    /// Radius of the ring with `role`, if the group has one.
    #[must_use]
    pub fn ring_radius(&self, role: RingRole) -> Option<u32> {
        self.rings
            .iter()
            .find(|ring| ring.role == role)
            .map(|ring| ring.radius_m)
    }
}

/// Returned by a replace; lets the caller focus the view on the new group.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OverlayGroupHandle {
    pub id: GroupId,
    pub kind: OverlayKind,
    pub focus: Position,
}

/// Owner of all live overlay groups, at most one per kind.
#[derive(Debug, Default)]
pub struct OverlayRegistry {
    groups: HashMap<OverlayKind, OverlayGroup>,
    next_id: u64,
}

impl OverlayRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the group for `kind` with a marker and rings for `station`.
    ///
    /// The API ring is only added for [`OverlayKind::Lookup`] stations with a
    /// positive service radius; entry and exit rings are always added.
    pub fn replace(
        &mut self,
        kind: OverlayKind,
        station: &StationRecord,
        geofence: GeofenceSpec,
    ) -> OverlayGroupHandle {
        let center = station.position;
        let mut rings = Vec::with_capacity(3);

        if kind == OverlayKind::Lookup && station.api_radius_m > 0 {
            rings.push(RingSpec {
                role: RingRole::Api,
                center,
                radius_m: station.api_radius_m,
            });
        }
        rings.push(RingSpec {
            role: RingRole::Entry,
            center,
            radius_m: geofence.entry_radius_m,
        });
        rings.push(RingSpec {
            role: RingRole::Exit,
            center,
            radius_m: geofence.exit_radius_m,
        });

        let marker = MarkerSpec {
            position: center,
            label: station.name.clone(),
            style: MarkerStyle::Station,
        };

        self.install(kind, marker, rings)
    }

    /// Replace the fixed-probe group with a pin and a single probe ring.
    pub fn replace_probe(&mut self, position: Position, radius_m: u32) -> OverlayGroupHandle {
        let marker = MarkerSpec {
            position,
            label: format!(
                "Fixed probe: {}, {} | Radius: {radius_m} m",
                format_coord(position.latitude()),
                format_coord(position.longitude())
            ),
            style: MarkerStyle::ProbePin,
        };
        let rings = vec![RingSpec {
            role: RingRole::Probe,
            center: position,
            radius_m,
        }];

        self.install(OverlayKind::ProbeFixed, marker, rings)
    }

    fn install(
        &mut self,
        kind: OverlayKind,
        marker: MarkerSpec,
        rings: Vec<RingSpec>,
    ) -> OverlayGroupHandle {
        self.next_id += 1;
        let id = GroupId(self.next_id);
        let focus = marker.position;

        let group = OverlayGroup {
            id,
            kind,
            marker,
            rings,
        };

        if let Some(previous) = self.groups.insert(kind, group) {
            debug!("Disposed {kind} group {} for group {}", previous.id.get(), id.get());
        }

        OverlayGroupHandle { id, kind, focus }
    }

    /// Remove the group for `kind`; removing an absent kind is a no-op.
    pub fn remove(&mut self, kind: OverlayKind) -> Option<OverlayGroup> {
        self.groups.remove(&kind)
    }

    /// The live group for `kind`.
    #[must_use]
    pub fn group(&self, kind: OverlayKind) -> Option<&OverlayGroup> {
        self.groups.get(&kind)
    }

    /// All live groups in [`OverlayKind::ALL`] order.
    pub fn groups(&self) -> impl Iterator<Item = &OverlayGroup> {
        OverlayKind::ALL
            .into_iter()
            .filter_map(move |kind| self.groups.get(&kind))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

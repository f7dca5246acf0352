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

//! Retained map scene fed by the overlay session.

use std::collections::HashMap;

use station_overlay::{
    FloatingMarker, OverlayGroup, OverlayKind, PanelText, Position, RenderSurface,
};

use crate::map::tiles::{MAX_ZOOM, MIN_ZOOM};

/// Camera over the base map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub center_lat: f64,
    pub center_lon: f64,
    /// Float for smoother pinch-zoom
    pub zoom: f32,
}

impl ViewState {
    pub fn new(center: Position, zoom: f32) -> Self {
        Self {
            center_lat: center.latitude(),
            center_lon: center.longitude(),
            zoom: zoom.clamp(MIN_ZOOM, MAX_ZOOM),
        }
    }

    /// Zoom level used for tile fetching
    pub fn tile_zoom(&self) -> u8 {
        self.zoom.round().clamp(MIN_ZOOM, MAX_ZOOM) as u8
    }
}

/// Everything the map view paints, updated only through [`RenderSurface`].
#[derive(Debug)]
pub struct MapScene {
    groups: HashMap<OverlayKind, OverlayGroup>,
    floating: Option<FloatingMarker>,
    panel: Option<PanelText>,
    pub view: ViewState,
}

impl MapScene {
    pub fn new(view: ViewState) -> Self {
        Self {
            groups: HashMap::new(),
            floating: None,
            panel: None,
            view,
        }
    }

    /// Groups in stable paint order, lookup first and probe last
    pub fn groups(&self) -> impl Iterator<Item = &OverlayGroup> {
        OverlayKind::ALL
            .into_iter()
            .filter_map(move |kind| self.groups.get(&kind))
    }

    pub fn floating_marker(&self) -> Option<FloatingMarker> {
        self.floating.filter(|marker| marker.visible)
    }

    pub fn panel(&self) -> Option<&PanelText> {
        self.panel.as_ref()
    }
}

impl RenderSurface for MapScene {
    fn render_overlay_group(&mut self, group: &OverlayGroup) {
        self.groups.insert(group.kind, group.clone());
    }

    fn remove_overlay_group(&mut self, kind: OverlayKind) {
        self.groups.remove(&kind);
    }

    fn update_floating_marker(&mut self, marker: FloatingMarker) {
        self.floating = Some(marker);
    }

    fn focus_view(&mut self, position: Position, zoom: u8) {
        self.view = ViewState::new(position, f32::from(zoom));
    }

    fn update_panel_text(&mut self, panel: &PanelText) {
        self.panel = Some(panel.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use station_overlay::{GeofenceSpec, Session, SessionConfig};

    fn pos(lat: f64, lon: f64) -> Position {
        Position::new(lat, lon).unwrap()
    }

    fn session() -> Session<MapScene> {
        let center = pos(-3.7319, -38.5267);
        Session::new(
            MapScene::new(ViewState::new(center, 12.0)),
            SessionConfig::new(center),
        )
    }

    #[test]
    fn test_scene_seeded_with_hidden_marker_and_panel() {
        let session = session();
        let scene = session.surface();
        assert!(scene.floating_marker().is_none());
        assert_eq!(scene.panel().map(|p| p.probe_lat.as_str()), Some("-3.731900"));
        assert_eq!(scene.groups().count(), 0);
    }

    #[test]
    fn test_manual_submit_focuses_view() {
        let mut session = session();
        session
            .submit_manual("-3.70", "-38.50", GeofenceSpec::default())
            .unwrap();

        let scene = session.surface();
        assert_eq!(scene.view.zoom, 16.0);
        assert!((scene.view.center_lat - -3.70).abs() < 1e-9);
        assert_eq!(scene.groups().count(), 1);
    }

    #[test]
    fn test_groups_paint_probe_last() {
        let mut session = session();
        session.fix_probe(pos(-3.72, -38.52), Some(50));
        session
            .submit_manual("-3.70", "-38.50", GeofenceSpec::default())
            .unwrap();

        let kinds: Vec<_> = session.surface().groups().map(|g| g.kind).collect();
        assert_eq!(kinds, vec![OverlayKind::Manual, OverlayKind::ProbeFixed]);
    }

    #[test]
    fn test_floating_marker_follows_active_probe() {
        let mut session = session();
        session.toggle_probe();
        session.cursor_moved(pos(-3.74, -38.53));

        let marker = session.surface().floating_marker().unwrap();
        assert_eq!(marker.position, pos(-3.74, -38.53));

        session.toggle_probe();
        assert!(session.surface().floating_marker().is_none());
    }

    #[test]
    fn test_tile_zoom_is_clamped() {
        let view = ViewState::new(pos(0.0, 0.0), 42.0);
        assert_eq!(view.tile_zoom(), 19);
    }
}

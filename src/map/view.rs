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

//! Map painting and pointer handling.

use egui::{Align2, Color32, FontId, Pos2, Rect, Stroke};
use station_overlay::{MarkerStyle, OverlayGroup, Position, RingRole};

use super::tiles::{TileManager, WebMercator, MAX_ZOOM, MIN_ZOOM, TILE_SIZE};
use crate::scene::{MapScene, ViewState};

const MAP_BACKGROUND: Color32 = Color32::from_rgb(200, 220, 240);
const LABEL_BACKGROUND: Color32 = Color32::from_rgba_premultiplied(0, 0, 0, 180);
const STATION_PIN: Color32 = Color32::from_rgb(40, 110, 220);
const PROBE_PIN: Color32 = Color32::from_rgb(128, 0, 255);
const FLOATING_MARKER: Color32 = Color32::from_rgb(128, 0, 255);

/// Stroke colour of a radius ring
pub fn ring_color(role: RingRole) -> Color32 {
    match role {
        RingRole::Api => Color32::from_rgb(51, 136, 255),
        RingRole::Entry => Color32::from_rgb(220, 50, 50),
        RingRole::Exit => Color32::from_rgb(255, 140, 0),
        RingRole::Probe => Color32::from_rgb(128, 0, 255),
    }
}

/// Pointer events the map produced this frame, already in geographic terms
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct MapInteraction {
    pub hover: Option<Position>,
    pub secondary_click: Option<Position>,
}

/// Screen mapping for one frame of a [`ViewState`] painted into `rect`
#[derive(Debug, Clone, Copy)]
pub struct MapProjection {
    rect: Rect,
    tile_zoom: u8,
    center_x: f64,
    center_y: f64,
    /// On-screen size of one tile in pixels
    tile_px: f64,
}

impl MapProjection {
    pub fn new(view: &ViewState, rect: Rect) -> Self {
        let tile_zoom = view.tile_zoom();
        let scale = 2_f64.powf(f64::from(view.zoom) - f64::from(tile_zoom));
        Self {
            rect,
            tile_zoom,
            center_x: WebMercator::lon_to_x(view.center_lon, tile_zoom),
            center_y: WebMercator::lat_to_y(view.center_lat, tile_zoom),
            tile_px: f64::from(TILE_SIZE) * scale,
        }
    }

    pub fn to_screen(&self, position: Position) -> Pos2 {
        let x = WebMercator::lon_to_x(position.longitude(), self.tile_zoom);
        let y = WebMercator::lat_to_y(position.latitude(), self.tile_zoom);
        let center = self.rect.center();
        egui::pos2(
            center.x + ((x - self.center_x) * self.tile_px) as f32,
            center.y + ((y - self.center_y) * self.tile_px) as f32,
        )
    }

    pub fn to_geo(&self, pos: Pos2) -> Position {
        let center = self.rect.center();
        let x = self.center_x + f64::from(pos.x - center.x) / self.tile_px;
        let y = self.center_y + f64::from(pos.y - center.y) / self.tile_px;
        Position::from_surface(
            WebMercator::tile_to_lat(y, self.tile_zoom),
            WebMercator::tile_to_lon(x, self.tile_zoom),
        )
    }

    /// Screen radius of a ring of `radius_m` meters around `center`
    pub fn meters_to_pixels(&self, center: Position, radius_m: u32) -> f32 {
        let meters_per_tile_px = WebMercator::meters_per_pixel(center.latitude(), self.tile_zoom);
        let scale = self.tile_px / f64::from(TILE_SIZE);
        (f64::from(radius_m) / meters_per_tile_px * scale) as f32
    }
}

/// Paint the base map and every scene layer, and apply pan and zoom gestures
pub fn draw_map(ui: &mut egui::Ui, scene: &mut MapScene, tiles: &TileManager) -> MapInteraction {
    let (response, painter) = ui.allocate_painter(
        egui::vec2(ui.available_width(), ui.available_height()),
        egui::Sense::click_and_drag(),
    );
    let rect = response.rect;

    painter.rect_filled(rect, 0.0, MAP_BACKGROUND);

    // Pinch-zoom and scroll-zoom share one delta
    let hovered = response.hovered();
    let zoom_delta = ui.ctx().input(|i| i.zoom_delta());
    let scroll = if hovered { ui.ctx().input(|i| i.smooth_scroll_delta.y) } else { 0.0 };
    if hovered && ((zoom_delta - 1.0).abs() > 0.001 || scroll.abs() > 0.0) {
        let change = zoom_delta.log2() + scroll / 200.0;
        scene.view.zoom = (scene.view.zoom + change).clamp(MIN_ZOOM, MAX_ZOOM);
    }

    if response.dragged() {
        let projection = MapProjection::new(&scene.view, rect);
        let new_center = projection.to_geo(rect.center() - response.drag_delta());
        scene.view.center_lat = new_center.latitude().clamp(-85.0, 85.0);
        scene.view.center_lon = new_center.longitude();
    }

    let projection = MapProjection::new(&scene.view, rect);
    let tiles_rendered = draw_tiles(ui, &painter, tiles, &scene.view, &projection);

    for group in scene.groups() {
        draw_rings(&painter, &projection, group);
    }
    for group in scene.groups() {
        draw_marker(&painter, &projection, rect, group);
    }

    if let Some(marker) = scene.floating_marker() {
        draw_floating_marker(&painter, projection.to_screen(marker.position));
    }

    painter.text(
        rect.left_top() + egui::vec2(10.0, 10.0),
        Align2::LEFT_TOP,
        "Drag to pan | Scroll or pinch to zoom | Right-click to fix the probe",
        FontId::proportional(12.0),
        Color32::BLACK,
    );

    // Attribution (required by the OSM tile policy)
    painter.text(
        rect.right_bottom() + egui::vec2(-10.0, -10.0),
        Align2::RIGHT_BOTTOM,
        "© OpenStreetMap contributors",
        FontId::proportional(10.0),
        Color32::from_black_alpha(180),
    );

    if let Some(status) = tile_status(tiles, tiles_rendered) {
        draw_status_bubble(&painter, rect, &status, status.starts_with("Failed"));
    }

    let hover = response
        .hover_pos()
        .filter(|pos| rect.contains(*pos))
        .map(|pos| projection.to_geo(pos));
    let secondary_click = if response.secondary_clicked() {
        response.interact_pointer_pos().map(|pos| projection.to_geo(pos))
    } else {
        None
    };

    MapInteraction {
        hover,
        secondary_click,
    }
}

fn draw_tiles(
    ui: &egui::Ui,
    painter: &egui::Painter,
    tiles: &TileManager,
    view: &ViewState,
    projection: &MapProjection,
) -> usize {
    let rect = projection.rect;
    let center = rect.center();
    let scale = (projection.tile_px / f64::from(TILE_SIZE)) as f32;
    let tile_size = TILE_SIZE as f32 * scale;

    let visible = TileManager::get_visible_tiles(
        view.center_lat,
        view.center_lon,
        projection.tile_zoom,
        rect.width() / scale,
        rect.height() / scale,
    );

    let mut rendered = 0;
    for (coord, offset_x, offset_y) in visible {
        if let Some(texture) = tiles.get_tile(coord, ui.ctx()) {
            let tile_rect = Rect::from_min_size(
                egui::pos2(center.x + offset_x * scale, center.y + offset_y * scale),
                egui::vec2(tile_size, tile_size),
            );
            painter.image(
                texture.id(),
                tile_rect,
                Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                Color32::WHITE,
            );
            rendered += 1;
        }
    }
    rendered
}

fn tile_status(tiles: &TileManager, rendered: usize) -> Option<String> {
    let errors = tiles.get_error_count();
    if errors > 0 {
        Some(format!("Failed to load {errors} tiles"))
    } else if tiles.has_loading_tiles() || rendered == 0 {
        Some("Loading map tiles...".to_string())
    } else {
        None
    }
}

fn draw_rings(painter: &egui::Painter, projection: &MapProjection, group: &OverlayGroup) {
    // Widest ring first so inner rings stay visible
    let mut rings = group.rings.clone();
    rings.sort_by(|a, b| b.radius_m.cmp(&a.radius_m));

    for ring in rings {
        let center = projection.to_screen(ring.center);
        let radius = projection.meters_to_pixels(ring.center, ring.radius_m);
        let color = ring_color(ring.role);

        painter.circle_filled(center, radius, color.gamma_multiply(0.12));
        painter.circle_stroke(center, radius, Stroke::new(2.0, color));
    }
}

fn draw_marker(painter: &egui::Painter, projection: &MapProjection, rect: Rect, group: &OverlayGroup) {
    let pos = projection.to_screen(group.marker.position);
    if !rect.contains(pos) {
        return;
    }

    let color = match group.marker.style {
        MarkerStyle::Station => STATION_PIN,
        MarkerStyle::ProbePin => PROBE_PIN,
    };
    painter.circle_filled(pos, 7.0, color);
    painter.circle_stroke(pos, 7.0, Stroke::new(2.0, Color32::WHITE));

    draw_label(painter, pos + egui::vec2(12.0, -10.0), &group.marker.label);
}

fn draw_label(painter: &egui::Painter, text_pos: Pos2, text: &str) {
    let font = FontId::proportional(11.0);
    let galley = painter.layout_no_wrap(text.to_string(), font.clone(), Color32::WHITE);

    let padding = egui::vec2(3.0, 2.0);
    let box_rect = Rect::from_min_size(
        text_pos - egui::vec2(padding.x, galley.size().y / 2.0 + padding.y),
        galley.size() + padding * 2.0,
    );
    painter.rect_filled(box_rect, 2.0, LABEL_BACKGROUND);
    painter.text(text_pos, Align2::LEFT_CENTER, text, font, Color32::WHITE);
}

fn draw_floating_marker(painter: &egui::Painter, pos: Pos2) {
    let stroke = Stroke::new(2.0, FLOATING_MARKER);
    painter.circle_stroke(pos, 6.0, stroke);

    let crosshair_size = 12.0;
    painter.line_segment(
        [pos + egui::vec2(-crosshair_size, 0.0), pos + egui::vec2(crosshair_size, 0.0)],
        stroke,
    );
    painter.line_segment(
        [pos + egui::vec2(0.0, -crosshair_size), pos + egui::vec2(0.0, crosshair_size)],
        stroke,
    );
}

fn draw_status_bubble(painter: &egui::Painter, rect: Rect, message: &str, is_error: bool) {
    let bg_color = if is_error {
        Color32::from_rgb(220, 50, 50)
    } else {
        Color32::from_rgb(255, 200, 100)
    };

    let bubble_pos = rect.center_top() + egui::vec2(0.0, 20.0);
    let galley = painter.layout_no_wrap(
        message.to_string(),
        FontId::proportional(12.0),
        Color32::WHITE,
    );
    let padding = egui::vec2(12.0, 6.0);
    let bubble_rect = Rect::from_center_size(bubble_pos, galley.size() + padding * 2.0);

    painter.rect_filled(bubble_rect, 5.0, bg_color);
    painter.text(
        bubble_pos,
        Align2::CENTER_CENTER,
        message,
        FontId::proportional(12.0),
        Color32::WHITE,
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn projection(zoom: f32) -> MapProjection {
        let center = Position::new(-3.7319, -38.5267).unwrap();
        let rect = Rect::from_min_size(egui::pos2(0.0, 0.0), egui::vec2(800.0, 600.0));
        MapProjection::new(&ViewState::new(center, zoom), rect)
    }

    #[test]
    fn test_view_center_maps_to_rect_center() {
        let projection = projection(12.0);
        let center = Position::new(-3.7319, -38.5267).unwrap();
        let pos = projection.to_screen(center);
        assert!((pos.x - 400.0).abs() < 0.01);
        assert!((pos.y - 300.0).abs() < 0.01);
    }

    #[test]
    fn test_screen_geo_round_trip() {
        let projection = projection(15.4);
        let geo = projection.to_geo(egui::pos2(123.0, 456.0));
        let back = projection.to_screen(geo);
        assert!((back.x - 123.0).abs() < 0.05);
        assert!((back.y - 456.0).abs() < 0.05);
    }

    #[test]
    fn test_ring_radius_doubles_per_zoom_level() {
        let center = Position::new(-3.7319, -38.5267).unwrap();
        let at_15 = projection(15.0).meters_to_pixels(center, 100);
        let at_16 = projection(16.0).meters_to_pixels(center, 100);
        assert!((at_16 / at_15 - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_ring_colours_by_role() {
        assert_ne!(ring_color(RingRole::Entry), ring_color(RingRole::Exit));
        assert_eq!(ring_color(RingRole::Probe), PROBE_PIN);
    }
}

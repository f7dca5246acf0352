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

//! Base-map tiles and Web Mercator math.
//!
//! Tiles come from the OpenStreetMap tile servers, are cached on disk under a
//! SHA-256 of their URL, and are decoded into egui textures on background
//! threads.

use egui::{ColorImage, TextureHandle};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::{Duration, SystemTime};

pub const TILE_SIZE: u32 = 256;
pub const MIN_ZOOM: f32 = 3.0;
pub const MAX_ZOOM: f32 = 19.0;

const CACHE_DURATION_DAYS: u64 = 7;

/// Ground resolution at the equator for zoom 0, in meters per pixel.
const EQUATOR_METERS_PER_PIXEL: f64 = 156_543.033_92;

/// Web Mercator projection utilities
#[derive(Debug)]
pub struct WebMercator;

impl WebMercator {
    /// Convert latitude to tile-space Y at `zoom`
    pub fn lat_to_y(lat: f64, zoom: u8) -> f64 {
        let lat_rad = lat.clamp(-85.051_128, 85.051_128).to_radians();
        let n = 2_f64.powi(i32::from(zoom));
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / std::f64::consts::PI) / 2.0;
        y * n
    }

    /// Convert longitude to tile-space X at `zoom`
    pub fn lon_to_x(lon: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        ((lon + 180.0) / 360.0) * n
    }

    /// Convert tile-space Y back to latitude
    pub fn tile_to_lat(y: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        let lat_rad = ((std::f64::consts::PI * (1.0 - 2.0 * y / n)).sinh()).atan();
        lat_rad.to_degrees()
    }

    /// Convert tile-space X back to longitude
    pub fn tile_to_lon(x: f64, zoom: u8) -> f64 {
        let n = 2_f64.powi(i32::from(zoom));
        x / n * 360.0 - 180.0
    }

    /// Meters covered by one screen pixel at `lat` and `zoom`
    pub fn meters_per_pixel(lat: f64, zoom: u8) -> f64 {
        EQUATOR_METERS_PER_PIXEL * lat.to_radians().cos() / 2_f64.powi(i32::from(zoom))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: u32,
    pub y: u32,
    pub zoom: u8,
}

impl TileCoord {
    pub fn new(x: u32, y: u32, zoom: u8) -> Self {
        Self { x, y, zoom }
    }

    /// Tile URL on the OpenStreetMap tile servers
    pub fn url(&self) -> String {
        format!(
            "https://tile.openstreetmap.org/{}/{}/{}.png",
            self.zoom, self.x, self.y
        )
    }

    /// Cache filename based on hash of URL
    fn cache_filename(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.url().as_bytes());
        format!("{:x}.png", hasher.finalize())
    }
}

enum TileState {
    Loading,
    Loaded(TextureHandle),
    Failed,
}

pub struct TileManager {
    cache_dir: PathBuf,
    client: reqwest::blocking::Client,
    tiles: Arc<Mutex<HashMap<TileCoord, TileState>>>,
    queued: Arc<Mutex<HashSet<TileCoord>>>,
}

impl std::fmt::Debug for TileManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TileManager")
            .field("cache_dir", &self.cache_dir)
            .finish_non_exhaustive()
    }
}

impl TileManager {
    pub fn new() -> Result<Self, reqwest::Error> {
        let cache_dir = Self::get_cache_dir();

        if let Err(e) = fs::create_dir_all(&cache_dir) {
            warn!("Failed to create tile cache directory {}: {e}", cache_dir.display());
        }

        Self::cleanup_old_tiles(&cache_dir);

        // The OSM tile usage policy requires an identifying user agent.
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("station-radius/", env!("CARGO_PKG_VERSION")))
            .timeout(Duration::from_secs(15))
            .build()?;

        Ok(Self {
            cache_dir,
            client,
            tiles: Arc::new(Mutex::new(HashMap::new())),
            queued: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    fn get_cache_dir() -> PathBuf {
        let mut path = dirs::cache_dir().unwrap_or_else(|| PathBuf::from(".cache"));
        path.push("station-radius");
        path.push("tiles");
        path
    }

    fn cleanup_old_tiles(cache_dir: &Path) {
        let now = SystemTime::now();
        let max_age = Duration::from_secs(CACHE_DURATION_DAYS * 24 * 60 * 60);

        let Ok(entries) = fs::read_dir(cache_dir) else {
            return;
        };

        let mut removed = 0;
        for entry in entries.flatten() {
            let expired = entry
                .metadata()
                .and_then(|m| m.modified())
                .ok()
                .and_then(|modified| now.duration_since(modified).ok())
                .is_some_and(|age| age > max_age);

            if expired && fs::remove_file(entry.path()).is_ok() {
                removed += 1;
            }
        }

        if removed > 0 {
            info!("Removed {removed} expired tiles from cache");
        }
    }

    /// Get tile from memory or disk cache, or queue it for download
    pub fn get_tile(&self, coord: TileCoord, ctx: &egui::Context) -> Option<TextureHandle> {
        let mut tiles = self.tiles.lock().unwrap();

        match tiles.get(&coord) {
            Some(TileState::Loaded(texture)) => Some(texture.clone()),
            Some(TileState::Loading | TileState::Failed) => None,
            None => {
                let cache_path = self.cache_dir.join(coord.cache_filename());

                if cache_path.exists() {
                    match fs::read(&cache_path)
                        .map_err(|e| e.to_string())
                        .and_then(|bytes| decode_tile(&bytes, coord, ctx))
                    {
                        Ok(texture) => {
                            tiles.insert(coord, TileState::Loaded(texture.clone()));
                            return Some(texture);
                        }
                        Err(e) => warn!("Failed to load cached tile {}: {e}", cache_path.display()),
                    }
                }

                tiles.insert(coord, TileState::Loading);
                drop(tiles);
                self.queue_download(coord, ctx.clone());
                None
            }
        }
    }

    fn queue_download(&self, coord: TileCoord, ctx: egui::Context) {
        if !self.queued.lock().unwrap().insert(coord) {
            return;
        }

        let tiles = Arc::clone(&self.tiles);
        let queued = Arc::clone(&self.queued);
        let cache_dir = self.cache_dir.clone();
        let client = self.client.clone();

        std::thread::spawn(move || {
            let state = match Self::download_tile(&client, coord, &cache_dir, &ctx) {
                Ok(texture) => TileState::Loaded(texture),
                Err(e) => {
                    warn!("Failed to load tile {}: {e}", coord.url());
                    TileState::Failed
                }
            };

            tiles.lock().unwrap().insert(coord, state);
            queued.lock().unwrap().remove(&coord);
            ctx.request_repaint();
        });
    }

    fn download_tile(
        client: &reqwest::blocking::Client,
        coord: TileCoord,
        cache_dir: &Path,
        ctx: &egui::Context,
    ) -> Result<TextureHandle, String> {
        let url = coord.url();
        debug!("Downloading tile: {url}");

        let response = client.get(&url).send().map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status()));
        }
        let bytes = response.bytes().map_err(|e| e.to_string())?;

        let cache_path = cache_dir.join(coord.cache_filename());
        if let Err(e) = fs::write(&cache_path, &bytes) {
            warn!("Failed to save tile to cache: {e}");
        }

        decode_tile(&bytes, coord, ctx)
    }

    /// Tiles covering a viewport, with pixel offsets of their top-left corner from the viewport center
    pub fn get_visible_tiles(
        center_lat: f64,
        center_lon: f64,
        zoom: u8,
        viewport_width: f32,
        viewport_height: f32,
    ) -> Vec<(TileCoord, f32, f32)> {
        let mut tiles = Vec::new();

        let center_tile_x = WebMercator::lon_to_x(center_lon, zoom);
        let center_tile_y = WebMercator::lat_to_y(center_lat, zoom);

        let tiles_wide = (viewport_width / TILE_SIZE as f32).ceil() as i32 + 2;
        let tiles_high = (viewport_height / TILE_SIZE as f32).ceil() as i32 + 2;

        let start_x = center_tile_x.floor() as i32 - tiles_wide / 2;
        let start_y = center_tile_y.floor() as i32 - tiles_high / 2;

        let max_tile = 2_i32.pow(u32::from(zoom));

        for dy in 0..tiles_high {
            for dx in 0..tiles_wide {
                let tile_x = start_x + dx;
                let tile_y = start_y + dy;

                // Longitude wraps, latitude does not
                let wrapped_x = tile_x.rem_euclid(max_tile);
                if tile_y < 0 || tile_y >= max_tile {
                    continue;
                }

                let coord = TileCoord::new(wrapped_x as u32, tile_y as u32, zoom);
                let offset_x = (f64::from(tile_x) - center_tile_x) * f64::from(TILE_SIZE);
                let offset_y = (f64::from(tile_y) - center_tile_y) * f64::from(TILE_SIZE);

                tiles.push((coord, offset_x as f32, offset_y as f32));
            }
        }

        tiles
    }

    pub fn has_loading_tiles(&self) -> bool {
        let tiles = self.tiles.lock().unwrap();
        tiles.values().any(|state| matches!(state, TileState::Loading))
    }

    pub fn get_error_count(&self) -> usize {
        let tiles = self.tiles.lock().unwrap();
        tiles.values().filter(|state| matches!(state, TileState::Failed)).count()
    }
}

fn decode_tile(bytes: &[u8], coord: TileCoord, ctx: &egui::Context) -> Result<TextureHandle, String> {
    let img = image::load_from_memory(bytes).map_err(|e| e.to_string())?;
    let rgba = img.to_rgba8();
    let size = [rgba.width() as usize, rgba.height() as usize];

    let color_image = ColorImage::from_rgba_unmultiplied(size, &rgba.into_raw());

    Ok(ctx.load_texture(
        format!("tile_{}_{}/{}", coord.zoom, coord.x, coord.y),
        color_image,
        egui::TextureOptions::default(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_round_trip_near_fortaleza() {
        let zoom = 12;
        let x = WebMercator::lon_to_x(-38.5365, zoom);
        let y = WebMercator::lat_to_y(-3.7678, zoom);
        assert!((WebMercator::tile_to_lon(x, zoom) - (-38.5365)).abs() < 1e-9);
        assert!((WebMercator::tile_to_lat(y, zoom) - (-3.7678)).abs() < 1e-9);
    }

    #[test]
    fn test_meters_per_pixel_halves_per_zoom() {
        let z10 = WebMercator::meters_per_pixel(0.0, 10);
        let z11 = WebMercator::meters_per_pixel(0.0, 11);
        assert!((z10 / z11 - 2.0).abs() < 1e-9);
        assert!((WebMercator::meters_per_pixel(0.0, 0) - EQUATOR_METERS_PER_PIXEL).abs() < 1e-6);
    }

    #[test]
    fn test_tile_url_and_cache_name() {
        let coord = TileCoord::new(1519, 2073, 12);
        assert_eq!(coord.url(), "https://tile.openstreetmap.org/12/1519/2073.png");
        assert_eq!(coord.cache_filename().len(), 64 + 4);
    }

    #[test]
    fn test_visible_tiles_skip_out_of_range_rows() {
        let tiles = TileManager::get_visible_tiles(85.0, 0.0, 2, 800.0, 600.0);
        assert!(!tiles.is_empty());
        assert!(tiles.iter().all(|(coord, _, _)| coord.y < 4 && coord.x < 4));
    }
}

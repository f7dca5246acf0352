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

//! Outbound interface to whatever draws the map.

use crate::model::{OverlayKind, Position};
use crate::panel::PanelText;
use crate::probe::FloatingMarker;
use crate::registry::OverlayGroup;

/// Rendering surface driven by a [`Session`](crate::session::Session).
///
/// The core decides what is drawn and when it is replaced; implementors
/// only mirror those decisions onto the screen.
pub trait RenderSurface {
    /// Draw `group`, tagged with its kind.
    fn render_overlay_group(&mut self, group: &OverlayGroup);

    /// Remove whatever is drawn for `kind`; absent kinds are ignored.
    fn remove_overlay_group(&mut self, kind: OverlayKind);

    /// Move or show/hide the cursor-following marker.
    fn update_floating_marker(&mut self, marker: FloatingMarker);

    /// Center the view on `position` at `zoom`.
    fn focus_view(&mut self, position: Position, zoom: u8);

    /// Replace the info panel text.
    fn update_panel_text(&mut self, panel: &PanelText);
}

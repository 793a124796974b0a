//! Sichtbarkeit von Punkten und Widgets auf der aktuellen Schicht.

use glam::DVec3;

use super::Representation;
use crate::core::MarkupsNode;
use crate::view::{View, ViewKind};

impl Representation {
    /// Liegt `world` in der Schicht-Toleranz und innerhalb des Viewports?
    ///
    /// 3D-Ansichten haben keine Schicht; dort gilt jede Position als darstellbar.
    pub fn is_world_displayable_on_slice(&self, view: &View, world: DVec3) -> bool {
        if view.kind() == ViewKind::View3D {
            return true;
        }
        if !view.is_within_slice(world) {
            return false;
        }
        let display = view.world_to_display(world);
        view.is_display_in_viewport(display.truncate())
    }

    /// Ist Punkt `n` auf der aktuellen Schicht sichtbar?
    pub fn is_point_displayable_on_slice(&self, node: &MarkupsNode, view: &View, n: usize) -> bool {
        match node.nth_position_world(n) {
            Some(world) => self.is_world_displayable_on_slice(view, world),
            None => false,
        }
    }

    /// Ist der Schwerpunkt auf der aktuellen Schicht sichtbar?
    pub fn is_centroid_displayable_on_slice(&self, node: &MarkupsNode, view: &View) -> bool {
        node.closed_loop()
            && node.len() > 2
            && self.is_world_displayable_on_slice(view, node.centroid())
    }

    /// Darf das Widget in dieser Ansicht dargestellt werden?
    ///
    /// 2D: alle Punkte innerhalb der Schicht-Toleranz und mindestens ein Punkt
    /// im Viewport.
    pub fn is_widget_displayable_on_slice(&self, node: &MarkupsNode, view: &View) -> bool {
        if !node.is_displayable_in_view(view.id()) {
            return false;
        }
        if view.kind() == ViewKind::View3D {
            return true;
        }
        if node.is_empty() {
            return false;
        }
        let positions = node.positions_world();
        let all_on_slice = positions.iter().all(|&world| view.is_within_slice(world));
        let any_in_viewport = positions
            .iter()
            .any(|&world| view.is_display_in_viewport(view.world_to_display(world).truncate()));
        all_on_slice && any_in_viewport
    }
}

//! Punkte hinzufügen, verschieben und löschen.
//!
//! Jede Operation klammert ihre Node-Mutationen in `start_modify`/`end_modify`,
//! damit Beobachter genau eine Benachrichtigung pro Schritt erhalten.

use glam::{DVec2, DVec3};

use super::{ActiveComponent, Representation};
use crate::core::MarkupsNode;
use crate::view::{display_positions_changed, world_positions_changed, View, ViewKind};

impl Representation {
    /// Weltposition unter `display`.
    ///
    /// 3D: Oberflächen-Treffer, sonst in der Display-Tiefe von `reference`
    /// (bzw. der Fokal-Ebene). 2D: auf der Schicht-Ebene.
    pub fn world_position_for_display(
        &self,
        view: &View,
        display: DVec2,
        reference: Option<DVec3>,
    ) -> DVec3 {
        match view.kind() {
            ViewKind::View3D => view.pick_surface(display).unwrap_or_else(|| {
                let depth = reference
                    .map(|r| view.world_to_display(r).z)
                    .unwrap_or_else(|| view.focal_depth());
                view.display_to_world_at_depth(display.extend(depth))
            }),
            ViewKind::Slice2D => view.display_to_world_at_depth(display.extend(0.0)),
        }
    }

    /// Hängt einen Punkt an `world` an.
    pub fn add_node_at_world_position(
        &mut self,
        node: &mut MarkupsNode,
        world: DVec3,
    ) -> Option<usize> {
        if node.locked() {
            log::debug!("Node '{}' gesperrt, kein Punkt hinzugefügt", node.id());
            return None;
        }
        node.start_modify();
        let index = node.add_control_point(world);
        self.update_lines(node, index);
        node.end_modify();
        Some(index)
    }

    /// Hängt einen Punkt unter der Display-Position an; Ausrichtung folgt der Ansicht.
    pub fn add_node_at_display_position(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        display: DVec2,
    ) -> Option<usize> {
        if node.locked() {
            log::debug!("Node '{}' gesperrt, kein Punkt hinzugefügt", node.id());
            return None;
        }
        let (display, _) = view.restrict_display_to_viewport(display, self.options.viewport_margin);
        let world = self.world_position_for_display(view, display, None);

        node.start_modify();
        let index = node.add_control_point(world);
        node.set_nth_orientation_matrix(index, view.view_orientation());
        self.update_lines(node, index);
        node.end_modify();
        Some(index)
    }

    /// Fügt einen Punkt auf der bestehenden Kurve unter dem Cursor ein.
    pub fn add_node_on_widget(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        display: DVec2,
    ) -> Option<usize> {
        if node.locked() {
            return None;
        }
        let (world, index) = self.find_closest_point_on_widget(node, view, display)?;

        node.start_modify();
        if !node.insert_control_point(index, world) {
            node.end_modify();
            return None;
        }
        node.set_nth_orientation_matrix(index, view.view_orientation());
        self.shift_active_after_insert(index);
        self.update_lines(node, index);
        node.end_modify();
        log::debug!("Punkt {} auf Kurve eingefügt (Node '{}')", index, node.id());
        Some(index)
    }

    fn shift_active_after_insert(&mut self, inserted: usize) {
        self.active = match self.active {
            ActiveComponent::ControlPoint(i) if i >= inserted => ActiveComponent::ControlPoint(i + 1),
            ActiveComponent::Line(i) if i >= inserted => ActiveComponent::Line(i + 1),
            other => other,
        };
    }

    /// Setzt die Weltposition von Punkt `n`. Gesperrte Punkte bleiben unverändert.
    pub fn set_nth_node_world_position(
        &mut self,
        node: &mut MarkupsNode,
        n: usize,
        world: DVec3,
    ) -> bool {
        let Some(point) = node.point(n) else {
            log::warn!("set_nth_node_world_position: Index {} ungültig", n);
            return false;
        };
        if node.locked() || point.locked {
            log::debug!("Punkt {} gesperrt (Node '{}')", n, node.id());
            return false;
        }
        let current = node.local_to_world(point.position);
        if !world_positions_changed(current, world) {
            return true;
        }
        node.start_modify();
        node.set_nth_position_world(n, world);
        self.update_lines(node, n);
        node.end_modify();
        true
    }

    /// Setzt Punkt `n` unter die Display-Position (Tiefe des Punkts bleibt in 3D erhalten).
    pub fn set_nth_node_display_position(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        n: usize,
        display: DVec2,
    ) -> bool {
        let Some(current) = node.nth_position_world(n) else {
            log::warn!("set_nth_node_display_position: Index {} ungültig", n);
            return false;
        };
        let current_display = view.world_to_display(current);
        let changed = display_positions_changed(
            current_display,
            display.extend(current_display.z),
            self.options.display_change_threshold_px,
            view.is_lightbox(),
        );
        if !changed {
            return !node.locked() && node.point(n).is_some_and(|p| !p.locked);
        }
        let world = self.world_position_for_display(view, display, Some(current));
        self.set_nth_node_world_position(node, n, world)
    }

    /// Entfernt Punkt `n`.
    pub fn delete_nth_node(&mut self, node: &mut MarkupsNode, n: usize) -> bool {
        if node.locked() {
            log::debug!("Node '{}' gesperrt, Punkt {} bleibt", node.id(), n);
            return false;
        }
        if n >= node.len() {
            log::warn!("delete_nth_node: Index {} ungültig", n);
            return false;
        }

        node.start_modify();
        node.remove_control_point(n);
        if !node.is_empty() {
            let closed = node.closed_loop();
            let neighbour = match n.checked_sub(1) {
                Some(previous) => previous,
                None if closed => node.len() - 1,
                None => 0,
            };
            self.update_lines(node, neighbour);
        } else {
            self.mark_changed();
        }
        self.revalidate_active_after_removal(node, n);
        node.end_modify();
        true
    }

    /// Entfernt den aktiven Kontrollpunkt.
    pub fn delete_active_node(&mut self, node: &mut MarkupsNode) -> bool {
        match self.active.control_point() {
            Some(index) => self.delete_nth_node(node, index),
            None => false,
        }
    }

    /// Entfernt den letzten Punkt.
    pub fn delete_last_node(&mut self, node: &mut MarkupsNode) -> bool {
        match node.len() {
            0 => false,
            len => self.delete_nth_node(node, len - 1),
        }
    }

    /// Entfernt alle Punkte.
    pub fn clear_all_nodes(&mut self, node: &mut MarkupsNode) -> bool {
        if node.locked() {
            return false;
        }
        node.remove_all_control_points();
        self.active = ActiveComponent::None;
        self.mark_changed();
        true
    }

    /// Öffnet oder schließt die Kurve. Gibt `true` zurück, wenn sich etwas änderte.
    pub fn set_closed_loop(&mut self, node: &mut MarkupsNode, closed: bool) -> bool {
        if node.closed_loop() == closed {
            return false;
        }
        node.start_modify();
        node.set_closed_loop(closed);
        if !node.is_empty() {
            // Endpunkt-Tangenten ändern sich an beiden Enden
            self.update_lines(node, node.len() - 1);
            self.update_lines(node, 0);
        }
        if self.active == ActiveComponent::Centroid && !closed {
            self.active = ActiveComponent::None;
        }
        node.end_modify();
        true
    }
}

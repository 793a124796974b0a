//! Verschieben einzelner Punkte sowie Verschieben, Skalieren und Rotieren
//! der gesamten Punktmenge. Gesperrte Punkte bleiben immer unverändert.

use glam::{DMat3, DQuat, DVec2, DVec3};

use super::Representation;
use crate::core::MarkupsNode;
use crate::view::View;

impl Representation {
    /// Bezugspunkt für Skalierung und Rotation (Schwerpunkt aller Punkte).
    pub fn transformation_reference_point(&self, node: &MarkupsNode) -> Option<DVec3> {
        Self::compute_centroid(node)
    }

    /// Verschiebt Punkt `n` unter die Display-Position.
    ///
    /// `display` enthält bereits den Versatz vom Drag-Beginn. Die Position wird
    /// in den Viewport geklemmt und auf die aktive Achse eingeschränkt.
    pub fn translate_node(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        n: usize,
        display: DVec2,
    ) -> bool {
        let Some(point) = node.point(n) else {
            log::warn!("translate_node: Index {} ungültig", n);
            return false;
        };
        if node.locked() || point.locked {
            return false;
        }
        let current = node.local_to_world(point.position);
        let (display, _) = view.restrict_display_to_viewport(display, self.options.viewport_margin);
        let target = self.world_position_for_display(view, display, Some(current));
        let target = current + self.axis_restriction.apply(target - current);
        self.set_nth_node_world_position(node, n, target)
    }

    /// Verschiebt alle ungesperrten Punkte um `translation` (Welt).
    pub fn translate_widget(&mut self, node: &mut MarkupsNode, translation: DVec3) -> bool {
        if node.locked() {
            return false;
        }
        let delta = self.axis_restriction.apply(translation);
        if delta == DVec3::ZERO {
            return false;
        }
        self.transform_unlocked(node, |world| world + delta, None)
    }

    /// Skaliert alle ungesperrten Punkte relativ zu `reference`.
    ///
    /// Faktor `sqrt(|current − ref|² / |last − ref|²)`; übersprungen, wenn der
    /// Ausgangsabstand unter `scale_epsilon` liegt.
    pub fn scale_widget(
        &mut self,
        node: &mut MarkupsNode,
        reference: DVec3,
        last_world: DVec3,
        current_world: DVec3,
    ) -> bool {
        if node.locked() {
            return false;
        }
        let last2 = last_world.distance_squared(reference);
        let epsilon = self.options.scale_epsilon;
        if last2 < epsilon * epsilon {
            log::debug!("scale_widget: Ausgangsabstand zu klein, Schritt übersprungen");
            return false;
        }
        let factor = (current_world.distance_squared(reference) / last2).sqrt();
        self.transform_unlocked(node, |world| reference + (world - reference) * factor, None)
    }

    /// Rotiert alle ungesperrten Punkte um `reference`.
    ///
    /// Achse ist die Normale der Bildebene; der Winkel ergibt sich aus den in
    /// die Bildebene projizierten Cursor-Vektoren, das Vorzeichen aus ihrem
    /// Kreuzprodukt.
    pub fn rotate_widget(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        reference: DVec3,
        last_world: DVec3,
        current_world: DVec3,
    ) -> bool {
        if node.locked() {
            return false;
        }
        let axis = view.view_plane_normal();
        if axis == DVec3::ZERO {
            log::warn!("rotate_widget: Ansicht ohne gültige Bildebene");
            return false;
        }
        let in_plane = |v: DVec3| v - axis * v.dot(axis);
        let v1 = in_plane(last_world - reference);
        let v2 = in_plane(current_world - reference);
        let epsilon = self.options.scale_epsilon;
        if v1.length() < epsilon || v2.length() < epsilon {
            return false;
        }
        let mut angle = v1.angle_between(v2);
        if v1.cross(v2).dot(axis) < 0.0 {
            angle = -angle;
        }
        if angle == 0.0 {
            return false;
        }
        let rotation = DQuat::from_axis_angle(axis, angle);
        self.transform_unlocked(
            node,
            |world| reference + rotation * (world - reference),
            Some(rotation),
        )
    }

    /// Wendet `map` auf alle ungesperrten Weltpositionen an (eine Änderungs-Klammer).
    fn transform_unlocked(
        &mut self,
        node: &mut MarkupsNode,
        map: impl Fn(DVec3) -> DVec3,
        rotation: Option<DQuat>,
    ) -> bool {
        let targets: Vec<(usize, DVec3, DQuat)> = node
            .control_points()
            .iter()
            .enumerate()
            .filter(|(_, point)| !point.locked)
            .map(|(index, point)| {
                let world = node.local_to_world(point.position);
                (index, map(world), point.orientation)
            })
            .collect();
        if targets.is_empty() {
            return false;
        }

        node.start_modify();
        for (index, world, orientation) in targets {
            node.set_nth_position_world(index, world);
            if let Some(rotation) = rotation {
                node.set_nth_orientation_matrix(index, DMat3::from_quat(rotation * orientation));
            }
        }
        self.update_all_lines(node);
        self.update_centroid(node);
        node.end_modify();
        true
    }
}

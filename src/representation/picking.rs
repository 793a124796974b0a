//! Hit-Tests: Schwerpunkt, Kontrollpunkte, Liniensegmente und der nächste
//! Punkt auf der Kurve unter dem Cursor.

use glam::{DVec2, DVec3};

use super::lines::polyline;
use super::{ActiveComponent, Interaction, Representation};
use crate::core::MarkupsNode;
use crate::view::{View, ViewKind};

/// Quadrierter Abstand von `p` zur Strecke `a → b`.
///
/// `None` für entartete Strecken oder wenn das Lot außerhalb von `[0,1]` fällt.
fn distance2_to_segment(p: DVec3, a: DVec3, b: DVec3) -> Option<f64> {
    let ab = b - a;
    let length2 = ab.length_squared();
    if length2 < f64::EPSILON {
        return None;
    }
    let t = (p - a).dot(ab) / length2;
    if !(0.0..=1.0).contains(&t) {
        return None;
    }
    Some(p.distance_squared(a + ab * t))
}

impl Representation {
    /// Prüft, welche Komponente unter dem Cursor liegt.
    ///
    /// Reihenfolge: Schwerpunkt, sichtbare Kontrollpunkte über den Locator
    /// (nächster gewinnt), dann Liniensegmente, falls kein Kontrollpunkt
    /// getroffen wurde.
    pub fn can_interact(
        &mut self,
        node: &MarkupsNode,
        view: &View,
        display: DVec2,
        world: DVec3,
    ) -> Interaction {
        if node.locked() || node.is_empty() || !node.is_displayable_in_view(view.id()) {
            return Interaction::NONE;
        }
        let tolerance = self.pixel_tolerance(view);
        let tolerance2 = tolerance * tolerance;
        let mut best = Interaction::NONE;

        if self.is_centroid_displayable_on_slice(node, view) {
            let centroid = view.world_to_display(node.centroid()).truncate();
            let distance2 = centroid.distance_squared(display);
            if distance2 < tolerance2 {
                best = Interaction {
                    component: ActiveComponent::Centroid,
                    distance2,
                };
            }
        }

        if let Some((index, distance2)) = self.locate_control_point(node, view, display, tolerance) {
            if distance2 < best.distance2 {
                best = Interaction {
                    component: ActiveComponent::ControlPoint(index),
                    distance2,
                };
            }
        }

        if best.component.control_point().is_none() {
            if let Some(line) = self.can_interact_with_line(node, view, display, world) {
                if line.distance2 < best.distance2 {
                    best = line;
                }
            }
        }
        best
    }

    /// Nächster Kontrollpunkt innerhalb von `tolerance` Pixeln und sein
    /// quadrierter Display-Abstand.
    ///
    /// Der Locator liefert Kandidaten nach Abstand sortiert; in 2D muss der
    /// Punkt zusätzlich im Viewport liegen.
    fn locate_control_point(
        &mut self,
        node: &MarkupsNode,
        view: &View,
        display: DVec2,
        tolerance: f64,
    ) -> Option<(usize, f64)> {
        self.locator.ensure_built(node, view);
        self.locator
            .within_radius(display, tolerance)
            .into_iter()
            .find_map(|hit| {
                let world = node.nth_position_world(hit.index)?;
                if view.kind() == ViewKind::Slice2D
                    && !self.is_world_displayable_on_slice(view, world)
                {
                    return None;
                }
                let distance2 = view.world_to_display(world).truncate().distance_squared(display);
                (distance2 < tolerance * tolerance).then_some((hit.index, distance2))
            })
    }

    /// Linien-Test: 2D im Display gegen die Pixel-Toleranz, 3D in Weltkoordinaten
    /// gegen `control_point_size²`.
    pub fn can_interact_with_line(
        &self,
        node: &MarkupsNode,
        view: &View,
        display: DVec2,
        world: DVec3,
    ) -> Option<Interaction> {
        if !node.kind().has_lines() || node.len() < 2 {
            return None;
        }
        let vertices = polyline(node);
        let mut best: Option<Interaction> = None;

        match view.kind() {
            ViewKind::Slice2D => {
                let tolerance = self.pixel_tolerance(view);
                let tolerance2 = tolerance * tolerance;
                for pair in vertices.windows(2) {
                    let a_world = node.local_to_world(pair[0].local);
                    let b_world = node.local_to_world(pair[1].local);
                    if !view.is_within_slice(a_world) || !view.is_within_slice(b_world) {
                        continue;
                    }
                    let a = view.world_to_display(a_world).truncate().extend(0.0);
                    let b = view.world_to_display(b_world).truncate().extend(0.0);
                    let Some(distance2) = distance2_to_segment(display.extend(0.0), a, b) else {
                        continue;
                    };
                    if distance2 < tolerance2 && best.map_or(true, |hit| distance2 < hit.distance2) {
                        best = Some(Interaction {
                            component: ActiveComponent::Line(pair[0].owner),
                            distance2,
                        });
                    }
                }
            }
            ViewKind::View3D => {
                let size = self.options.control_point_size;
                let tolerance2 = size * size;
                for pair in vertices.windows(2) {
                    let a = node.local_to_world(pair[0].local);
                    let b = node.local_to_world(pair[1].local);
                    let Some(distance2) = distance2_to_segment(world, a, b) else {
                        continue;
                    };
                    if distance2 < tolerance2 && best.map_or(true, |hit| distance2 < hit.distance2) {
                        best = Some(Interaction {
                            component: ActiveComponent::Line(pair[0].owner),
                            distance2,
                        });
                    }
                }
            }
        }
        best
    }

    /// Markiert die Komponente unter dem Cursor als aktiv.
    ///
    /// Schwerpunkt vor Kontrollpunkten; Kontrollpunkte über den Locator.
    pub fn activate_node(
        &mut self,
        node: &MarkupsNode,
        view: &View,
        display: DVec2,
    ) -> ActiveComponent {
        let tolerance = self.pixel_tolerance(view);
        let mut component = ActiveComponent::None;

        if !node.locked() && self.is_centroid_displayable_on_slice(node, view) {
            let centroid = view.world_to_display(node.centroid()).truncate();
            if centroid.distance(display) < tolerance {
                component = ActiveComponent::Centroid;
            }
        }
        if component == ActiveComponent::None && !node.locked() {
            if let Some((index, _)) = self.locate_control_point(node, view, display, tolerance) {
                component = ActiveComponent::ControlPoint(index);
            }
        }
        self.set_active_component(node, component);
        self.active
    }

    /// Nächster Punkt auf der Kurve unter `display` und der Einfüge-Index dafür.
    ///
    /// Der Sichtstrahl durch `display` wird gegen jedes Teilsegment der Polylinie
    /// (Kontroll- und Zwischenpunkte) getestet; die Toleranz entspricht der
    /// Pixel-Toleranz auf der Fokal-Ebene.
    pub fn find_closest_point_on_widget(
        &self,
        node: &MarkupsNode,
        view: &View,
        display: DVec2,
    ) -> Option<(DVec3, usize)> {
        if node.len() < 2 || !node.kind().has_lines() {
            return None;
        }
        let (ray_start, ray_end) = view.pick_ray(display);
        let ray = ray_end - ray_start;
        let ray_length2 = ray.length_squared();
        if ray_length2 < f64::EPSILON {
            log::warn!("find_closest_point_on_widget: Sichtstrahl entartet");
            return None;
        }
        let tolerance2 = view.world_tolerance_squared(self.pixel_tolerance(view));

        let vertices = polyline(node);
        let mut best: Option<(f64, DVec3, usize)> = None;
        for pair in vertices.windows(2) {
            let a = node.local_to_world(pair[0].local);
            let b = node.local_to_world(pair[1].local);
            let segment = b - a;
            let segment_length2 = segment.length_squared();
            if segment_length2 < f64::EPSILON {
                continue;
            }

            // Nächste Punkte zwischen Strecke (s ∈ [0,1]) und Gerade (t frei)
            let r = a - ray_start;
            let d1d2 = segment.dot(ray);
            let c = segment.dot(r);
            let f = ray.dot(r);
            let denominator = segment_length2 * ray_length2 - d1d2 * d1d2;
            let s = if denominator > f64::EPSILON {
                ((d1d2 * f - c * ray_length2) / denominator).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let t = (d1d2 * s + f) / ray_length2;
            let on_segment = a + segment * s;
            let on_ray = ray_start + ray * t;
            let distance2 = on_segment.distance_squared(on_ray);

            if distance2 < tolerance2 && best.map_or(true, |(d, _, _)| distance2 < d) {
                best = Some((distance2, on_segment, pair[0].owner + 1));
            }
        }
        best.map(|(_, world, index)| (world, index))
    }
}

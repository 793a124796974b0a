//! Zwischenpunkte, Schwerpunkt und der Aufbau der abgeleiteten Geometrie.

use glam::DVec3;

use super::{LabelPlacement, Representation, RepresentationGeometry};
use crate::core::MarkupsNode;
use crate::view::{world_positions_changed, View, ViewKind};

/// Stützpunkt der Polylinie mit dem Kontrollpunkt, dessen Segment dort beginnt.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct PolylineVertex {
    pub local: DVec3,
    pub owner: usize,
}

/// Polylinie über Kontrollpunkte und Zwischenpunkte (lokales Koordinatensystem).
///
/// Doppelte Stützpunkte (lineare Interpolation kopiert die Endpunkte) werden
/// zusammengefasst. Geschlossene Kurven enden wieder bei Punkt 0.
pub(crate) fn polyline(node: &MarkupsNode) -> Vec<PolylineVertex> {
    let points = node.control_points();
    let mut vertices: Vec<PolylineVertex> = Vec::with_capacity(points.len() * 2);

    for (index, point) in points.iter().enumerate() {
        match vertices.last_mut() {
            Some(last) if !world_positions_changed(last.local, point.position) => {
                last.owner = index;
            }
            _ => vertices.push(PolylineVertex {
                local: point.position,
                owner: index,
            }),
        }
        for &sample in &point.intermediate_positions {
            let duplicate = vertices
                .last()
                .is_some_and(|last| !world_positions_changed(last.local, sample));
            if !duplicate {
                vertices.push(PolylineVertex {
                    local: sample,
                    owner: index,
                });
            }
        }
    }

    if node.closed_loop() && points.len() > 1 {
        let first = points[0].position;
        let duplicate = vertices
            .last()
            .is_some_and(|last| !world_positions_changed(last.local, first));
        if !duplicate {
            vertices.push(PolylineVertex {
                local: first,
                owner: 0,
            });
        }
    }
    vertices
}

impl Representation {
    /// Berechnet die Zwischenpunkte des Segments `idx1 → idx2` neu.
    pub fn update_line(&mut self, node: &mut MarkupsNode, idx1: usize, idx2: usize) -> bool {
        let closed = node.closed_loop();
        let points = node.control_points_mut();
        let Some(point) = points.get_mut(idx1) else {
            log::warn!("update_line: Index {} ungültig", idx1);
            return false;
        };
        point.clear_intermediate_positions();
        self.interpolator
            .interpolate_line(points, closed, idx1, idx2)
    }

    /// Berechnet alle Segmente neu, die von einer Änderung an `index` betroffen sind.
    pub fn update_lines(&mut self, node: &mut MarkupsNode, index: usize) {
        let count = node.len();
        let pairs = self.interpolator.span(index, node.closed_loop(), count);
        for (idx1, idx2) in pairs {
            self.update_line(node, idx1, idx2);
        }
        self.clear_open_tail(node);
        self.mark_changed();
    }

    /// Berechnet sämtliche Segmente neu.
    pub fn update_all_lines(&mut self, node: &mut MarkupsNode) {
        let count = node.len();
        for index in 1..count {
            self.update_line(node, index - 1, index);
        }
        if node.closed_loop() && count > 1 {
            self.update_line(node, count - 1, 0);
        }
        self.clear_open_tail(node);
        self.mark_changed();
        log::debug!("Linien neu berechnet: {} Punkte (Node '{}')", count, node.id());
    }

    /// Offene Kurve: der letzte Punkt hat kein Folgesegment.
    fn clear_open_tail(&self, node: &mut MarkupsNode) {
        if node.closed_loop() {
            return;
        }
        if let Some(last) = node.control_points_mut().last_mut() {
            last.clear_intermediate_positions();
        }
    }

    /// Aktualisiert Linien und Locator.
    ///
    /// Die Interpolation hängt nicht von der Ansicht ab: sie läuft nur, wenn
    /// erzwungen oder noch nie gelaufen. Eine geänderte Ansicht baut allein den
    /// Locator neu. Gibt `true` zurück, wenn etwas neu berechnet wurde.
    pub fn update_widget(&mut self, node: &mut MarkupsNode, view: &View, force: bool) -> bool {
        let interpolate = force || !self.lines_built;
        if !interpolate && self.display_revision == Some(view.revision()) {
            return false;
        }
        if interpolate {
            self.update_all_lines(node);
            self.lines_built = true;
        }
        self.display_revision = Some(view.revision());
        self.locator.ensure_built(node, view);
        true
    }

    /// Mittelwert aller Weltpositionen.
    pub fn compute_centroid(node: &MarkupsNode) -> Option<DVec3> {
        if node.is_empty() {
            return None;
        }
        let sum: DVec3 = node.positions_world().into_iter().sum();
        Some(sum / node.len() as f64)
    }

    /// Berechnet den Schwerpunkt und legt ihn am Node ab.
    pub fn update_centroid(&mut self, node: &mut MarkupsNode) -> Option<DVec3> {
        let centroid = Self::compute_centroid(node)?;
        node.set_centroid_position(centroid);
        Some(centroid)
    }

    /// Leitet alle Display-Artefakte aus dem aktuellen Node-Zustand ab.
    ///
    /// Mehrfache Aufrufe ohne Änderung liefern identische Geometrie.
    pub fn build_representation(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
    ) -> &RepresentationGeometry {
        self.update_widget(node, view, false);
        self.locator.ensure_built(node, view);
        let centroid = self.update_centroid(node);

        let mapper = view.mapper();
        let point_display: Vec<DVec3> = node
            .positions_world()
            .into_iter()
            .map(|world| mapper.world_to_display(world))
            .collect();

        let displayable = node.is_displayable_in_view(view.id());
        let visible_points: Vec<usize> = (0..node.len())
            .filter(|&index| {
                displayable
                    && node.point(index).is_some_and(|p| p.visible)
                    && self.is_point_displayable_on_slice(node, view, index)
            })
            .collect();

        let label_positions = visible_points
            .iter()
            .filter_map(|&index| {
                let point = node.point(index)?;
                if point.label.is_empty() {
                    return None;
                }
                Some(LabelPlacement {
                    index,
                    text: point.label.clone(),
                    display: point_display[index],
                })
            })
            .collect();

        let line_world = if node.kind().has_lines() {
            polyline(node)
                .into_iter()
                .map(|vertex| node.local_to_world(vertex.local))
                .collect()
        } else {
            Vec::new()
        };

        let centroid = centroid.filter(|_| node.closed_loop() && node.len() > 2);
        let centroid = match view.kind() {
            ViewKind::View3D => centroid,
            ViewKind::Slice2D => centroid.filter(|c| self.is_world_displayable_on_slice(view, *c)),
        };

        self.geometry = RepresentationGeometry {
            line_world,
            point_display,
            label_positions,
            centroid,
            visible_points,
        };
        &self.geometry
    }
}

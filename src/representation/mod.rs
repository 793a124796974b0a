//! Repräsentation eines Markups-Nodes in einer Ansicht.
//!
//! Hält den abgeleiteten Interaktions-Zustand (aktive Komponente,
//! Achsen-Einschränkung, Punkt-Locator) und treibt den `LineInterpolator`
//! nach jeder Punkt-Änderung an. Die Kontrollpunkte selbst gehören dem
//! `MarkupsNode`; alle Methoden erhalten ihn als transiente Referenz.
//!
//! Aufgeteilt in:
//! - `editing` — Punkte hinzufügen, verschieben, löschen
//! - `lines` — Zwischenpunkte, Schwerpunkt, `build_representation`
//! - `picking` — `can_interact`, Aktivierung, Punkt auf der Kurve
//! - `visibility` — Schicht- und Viewport-Sichtbarkeit (2D)
//! - `transform` — Verschieben, Skalieren, Rotieren der Punktmenge

mod editing;
mod lines;
mod picking;
mod transform;
mod visibility;

use glam::DVec3;

use crate::core::MarkupsNode;
use crate::interpolation::{InterpolatorKind, LineInterpolator};
use crate::locator::PointLocator;
use crate::shared::MarkupsOptions;
use crate::view::View;

// ── Typen ────────────────────────────────────────────────────────

/// Komponente, die aktuell für Interaktion markiert ist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveComponent {
    #[default]
    None,
    /// Kontrollpunkt mit Index
    ControlPoint(usize),
    /// Liniensegment, benannt nach seinem Start-Kontrollpunkt
    Line(usize),
    /// Schwerpunkt einer geschlossenen Kurve
    Centroid,
}

impl ActiveComponent {
    /// Index des aktiven Kontrollpunkts, falls einer aktiv ist.
    pub fn control_point(self) -> Option<usize> {
        match self {
            ActiveComponent::ControlPoint(index) => Some(index),
            _ => None,
        }
    }
}

/// Ergebnis eines Hit-Tests.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interaction {
    pub component: ActiveComponent,
    /// Quadrierter Abstand (Display-Pixel bzw. Welt beim 3D-Linientest)
    pub distance2: f64,
}

impl Interaction {
    /// Kein Treffer.
    pub const NONE: Interaction = Interaction {
        component: ActiveComponent::None,
        distance2: f64::MAX,
    };

    /// Gibt `true` zurück, wenn eine Komponente getroffen wurde.
    pub fn is_hit(&self) -> bool {
        self.component != ActiveComponent::None
    }
}

/// Einschränkung von Verschiebungen auf eine Weltachse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AxisRestriction {
    #[default]
    None,
    X,
    Y,
    Z,
}

impl AxisRestriction {
    /// Projiziert `delta` auf die erlaubte Achse.
    pub fn apply(self, delta: DVec3) -> DVec3 {
        match self {
            AxisRestriction::None => delta,
            AxisRestriction::X => DVec3::new(delta.x, 0.0, 0.0),
            AxisRestriction::Y => DVec3::new(0.0, delta.y, 0.0),
            AxisRestriction::Z => DVec3::new(0.0, 0.0, delta.z),
        }
    }

    /// Umschalten: gleiche Achse hebt die Einschränkung auf.
    pub fn toggled(self, axis: AxisRestriction) -> AxisRestriction {
        if self == axis {
            AxisRestriction::None
        } else {
            axis
        }
    }
}

/// Label eines sichtbaren Punkts.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub index: usize,
    pub text: String,
    /// Display-Position des Labels
    pub display: DVec3,
}

/// Abgeleitete Geometrie eines Render-Durchlaufs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RepresentationGeometry {
    /// Polylinie in Weltkoordinaten (inkl. Zwischenpunkte, geschlossen mit Punkt 0)
    pub line_world: Vec<DVec3>,
    /// Display-Position je Kontrollpunkt (Index-gleich zum Node)
    pub point_display: Vec<DVec3>,
    /// Labels der sichtbaren Punkte
    pub label_positions: Vec<LabelPlacement>,
    /// Schwerpunkt, sofern die Kurve geschlossen ist
    pub centroid: Option<DVec3>,
    /// Indizes der in dieser Ansicht darstellbaren Punkte
    pub visible_points: Vec<usize>,
}

/// Interaktions- und Geometrie-Zustand eines Nodes in einer Ansicht.
#[derive(Debug)]
pub struct Representation {
    interpolator: Box<dyn LineInterpolator>,
    locator: PointLocator,
    active: ActiveComponent,
    axis_restriction: AxisRestriction,
    options: MarkupsOptions,
    geometry: RepresentationGeometry,
    /// Wurden die Zwischenpunkte mindestens einmal vollständig berechnet?
    lines_built: bool,
    display_revision: Option<u64>,
    need_to_render: bool,
}

impl Representation {
    /// Erstellt eine Repräsentation mit der gegebenen Interpolations-Strategie.
    pub fn new(kind: InterpolatorKind, options: MarkupsOptions) -> Self {
        Self {
            interpolator: kind.create(&options),
            locator: PointLocator::new(),
            active: ActiveComponent::None,
            axis_restriction: AxisRestriction::None,
            options,
            geometry: RepresentationGeometry::default(),
            lines_built: false,
            display_revision: None,
            need_to_render: true,
        }
    }

    /// Wählt die Interpolation passend zur Markups-Art.
    pub fn for_node(node: &MarkupsNode, options: MarkupsOptions) -> Self {
        let kind = if node.kind().is_smooth() {
            InterpolatorKind::Bezier
        } else {
            InterpolatorKind::Linear
        };
        Self::new(kind, options)
    }

    /// Aktive Interpolations-Strategie.
    pub fn interpolator(&self) -> &dyn LineInterpolator {
        self.interpolator.as_ref()
    }

    /// Tauscht die Interpolation aus und berechnet alle Linien neu.
    pub fn set_interpolator(&mut self, node: &mut MarkupsNode, kind: InterpolatorKind) {
        self.interpolator = kind.create(&self.options);
        self.update_all_lines(node);
    }

    /// Aktuelle Optionen.
    pub fn options(&self) -> &MarkupsOptions {
        &self.options
    }

    /// Aktive Komponente.
    pub fn active_component(&self) -> ActiveComponent {
        self.active
    }

    /// Setzt die aktive Komponente; ungültige Indizes werden verworfen.
    pub fn set_active_component(&mut self, node: &MarkupsNode, component: ActiveComponent) {
        let valid = match component {
            ActiveComponent::None => true,
            ActiveComponent::ControlPoint(index) | ActiveComponent::Line(index) => {
                index < node.len()
            }
            ActiveComponent::Centroid => node.closed_loop() && node.len() > 2,
        };
        if !valid {
            log::warn!(
                "Aktive Komponente {:?} ungültig bei {} Punkten",
                component,
                node.len()
            );
        }
        let next = if valid { component } else { ActiveComponent::None };
        if next != self.active {
            self.active = next;
            self.need_to_render = true;
        }
    }

    /// Aktuelle Achsen-Einschränkung.
    pub fn axis_restriction(&self) -> AxisRestriction {
        self.axis_restriction
    }

    /// Schaltet die Achsen-Einschränkung um.
    pub fn toggle_axis_restriction(&mut self, axis: AxisRestriction) -> AxisRestriction {
        self.axis_restriction = self.axis_restriction.toggled(axis);
        log::debug!("Achsen-Einschränkung: {:?}", self.axis_restriction);
        self.axis_restriction
    }

    /// Setzt die Achsen-Einschränkung direkt.
    pub fn set_axis_restriction(&mut self, axis: AxisRestriction) {
        self.axis_restriction = axis;
    }

    /// Zuletzt gebaute Geometrie.
    pub fn geometry(&self) -> &RepresentationGeometry {
        &self.geometry
    }

    /// Punkt-Locator (lesend).
    pub fn locator(&self) -> &PointLocator {
        &self.locator
    }

    /// Liest und löscht das Render-Flag.
    pub fn take_need_to_render(&mut self) -> bool {
        std::mem::take(&mut self.need_to_render)
    }

    /// Muss neu gezeichnet werden?
    pub fn need_to_render(&self) -> bool {
        self.need_to_render
    }

    /// Pixel pro Welteinheit der Ansicht.
    pub fn view_scale_factor(&self, view: &View) -> f64 {
        view.view_scale_factor()
    }

    /// Pick-Radius in Display-Pixeln.
    pub fn pixel_tolerance(&self, view: &View) -> f64 {
        self.options.pick_radius() * self.view_scale_factor(view)
    }

    fn mark_changed(&mut self) {
        self.locator.invalidate();
        self.need_to_render = true;
    }

    /// Korrigiert die aktive Komponente nach dem Entfernen von Punkt `removed`.
    fn revalidate_active_after_removal(&mut self, node: &MarkupsNode, removed: usize) {
        self.active = match self.active {
            ActiveComponent::ControlPoint(i) if i == removed => ActiveComponent::None,
            ActiveComponent::ControlPoint(i) if i > removed => ActiveComponent::ControlPoint(i - 1),
            ActiveComponent::Line(i) if i == removed => ActiveComponent::None,
            ActiveComponent::Line(i) if i > removed => ActiveComponent::Line(i - 1),
            ActiveComponent::Centroid if !(node.closed_loop() && node.len() > 2) => {
                ActiveComponent::None
            }
            other => other,
        };
        // Index kann durch externe Änderungen trotzdem außer Reichweite liegen
        if let ActiveComponent::ControlPoint(i) | ActiveComponent::Line(i) = self.active {
            if i >= node.len() {
                self.active = ActiveComponent::None;
            }
        }
    }
}

#[cfg(test)]
mod tests;

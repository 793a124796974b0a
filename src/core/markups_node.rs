//! In-Memory-Markups-Node: geordnete Kontrollpunkte plus Sperr-, Transform- und
//! Darstellungs-Zustand.
//!
//! Der Node ist alleiniger Besitzer der Punktliste. Widgets und
//! Repräsentationen lesen und schreiben ausschließlich über die Methoden
//! hier; jede Mutation erzeugt eine synchrone Benachrichtigung an die
//! angemeldeten `NodeObserver`. Zwischen `start_modify()` und `end_modify()`
//! werden Benachrichtigungen gesammelt und beim äußersten `end_modify()`
//! gebündelt ausgeliefert.

use std::collections::BTreeSet;
use std::rc::Rc;

use glam::{DMat3, DMat4, DVec3};

use super::control_point::ControlPoint;
use super::history::{NodeHistory, NodeSnapshot};
use super::observer::{NodeEvent, NodeObserver, ObserverRegistration, ObserverRegistry};

// ── Typen ────────────────────────────────────────────────────────

/// Art des Markups; bestimmt Punkt-Anzahl und Interpolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MarkupsKind {
    /// Lose Punktliste ohne Verbindungslinien
    PointList,
    /// Strecke aus genau zwei Punkten
    Line,
    /// Winkel aus genau drei Punkten
    Angle,
    /// Offene, geglättete Kurve
    #[default]
    Curve,
    /// Geschlossene, geglättete Kurve
    ClosedCurve,
}

impl MarkupsKind {
    /// Anzahl Punkte, nach der die Platzierung automatisch endet.
    pub fn required_points(self) -> Option<usize> {
        match self {
            MarkupsKind::Line => Some(2),
            MarkupsKind::Angle => Some(3),
            MarkupsKind::PointList | MarkupsKind::Curve | MarkupsKind::ClosedCurve => None,
        }
    }

    /// Ob Segmente mit der Bézier-Interpolation geglättet werden.
    pub fn is_smooth(self) -> bool {
        matches!(self, MarkupsKind::Curve | MarkupsKind::ClosedCurve)
    }

    /// Ob Punkte überhaupt durch Linien verbunden werden.
    pub fn has_lines(self) -> bool {
        !matches!(self, MarkupsKind::PointList)
    }
}

/// Darstellungs-Eigenschaften eines Nodes für eine Gruppe von Ansichten.
#[derive(Debug, Clone, PartialEq)]
pub struct DisplayNode {
    /// Eindeutige ID des Display-Nodes
    pub id: String,
    /// Gesamt-Sichtbarkeit
    pub visible: bool,
    /// Glyph-Skalierung der Punkt-Handles
    pub glyph_scale: f64,
    /// Skalierung der Labels
    pub text_scale: f64,
    /// Farbe (RGB)
    pub color: [f32; 3],
    /// Deckkraft 0..1
    pub opacity: f64,
    /// Ansichten, in denen der Node erscheint (leer = alle)
    pub view_node_ids: Vec<String>,
}

impl DisplayNode {
    /// Erstellt einen Display-Node mit Standardwerten.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            visible: true,
            glyph_scale: 1.0,
            text_scale: 1.0,
            color: [0.4, 1.0, 1.0],
            opacity: 1.0,
            view_node_ids: Vec::new(),
        }
    }

    /// Prüft, ob der Node in der Ansicht `view_id` dargestellt werden darf.
    pub fn is_displayable_in_view(&self, view_id: &str) -> bool {
        self.visible
            && (self.view_node_ids.is_empty() || self.view_node_ids.iter().any(|v| v == view_id))
    }
}

/// Markups-Node mit geordneter, lückenloser Kontrollpunkt-Liste.
pub struct MarkupsNode {
    id: String,
    /// Anzeigename
    pub name: String,
    kind: MarkupsKind,
    points: Vec<ControlPoint>,
    closed_loop: bool,
    locked: bool,
    display_nodes: Vec<DisplayNode>,
    to_world: DMat4,
    from_world: DMat4,
    centroid: DVec3,
    modified_time: u64,
    modify_depth: usize,
    pending_structural: Vec<NodeEvent>,
    pending_modified: BTreeSet<usize>,
    history: NodeHistory,
    observers: ObserverRegistry,
}

impl std::fmt::Debug for MarkupsNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkupsNode")
            .field("id", &self.id)
            .field("kind", &self.kind)
            .field("points", &self.points.len())
            .field("closed_loop", &self.closed_loop)
            .field("locked", &self.locked)
            .finish()
    }
}

impl MarkupsNode {
    /// Erstellt einen leeren Node mit einem Standard-Display-Node.
    pub fn new(id: impl Into<String>, kind: MarkupsKind) -> Self {
        let id = id.into();
        let display = DisplayNode::new(format!("{id}-display"));
        Self {
            name: id.clone(),
            id,
            kind,
            points: Vec::new(),
            closed_loop: kind == MarkupsKind::ClosedCurve,
            locked: false,
            display_nodes: vec![display],
            to_world: DMat4::IDENTITY,
            from_world: DMat4::IDENTITY,
            centroid: DVec3::ZERO,
            modified_time: 0,
            modify_depth: 0,
            pending_structural: Vec::new(),
            pending_modified: BTreeSet::new(),
            history: NodeHistory::default(),
            observers: ObserverRegistry::default(),
        }
    }

    // ── Lesen ────────────────────────────────────────────────────

    /// ID des Nodes.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Art des Markups.
    pub fn kind(&self) -> MarkupsKind {
        self.kind
    }

    /// Anzahl der Kontrollpunkte.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Gibt `true` zurück, wenn keine Kontrollpunkte existieren.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Alle Kontrollpunkte in Kurven-Reihenfolge.
    pub fn control_points(&self) -> &[ControlPoint] {
        &self.points
    }

    /// Veränderbarer Zugriff für abgeleitete Daten (Zwischenpunkte).
    ///
    /// Erzeugt keine Benachrichtigung; Positionen und Flags nur über die
    /// `set_nth_*`-Methoden ändern.
    pub fn control_points_mut(&mut self) -> &mut [ControlPoint] {
        &mut self.points
    }

    /// Kontrollpunkt an `n`.
    pub fn point(&self, n: usize) -> Option<&ControlPoint> {
        self.points.get(n)
    }

    /// Lokale Position des Punkts `n`.
    pub fn nth_position_local(&self, n: usize) -> Option<DVec3> {
        self.points.get(n).map(|p| p.position)
    }

    /// Weltposition des Punkts `n`.
    pub fn nth_position_world(&self, n: usize) -> Option<DVec3> {
        self.nth_position_local(n).map(|p| self.local_to_world(p))
    }

    /// Alle Weltpositionen in Kurven-Reihenfolge.
    pub fn positions_world(&self) -> Vec<DVec3> {
        self.points
            .iter()
            .map(|p| self.local_to_world(p.position))
            .collect()
    }

    /// Wendet die Parent-Transformation an.
    pub fn local_to_world(&self, local: DVec3) -> DVec3 {
        self.to_world.transform_point3(local)
    }

    /// Inverse Parent-Transformation.
    pub fn world_to_local(&self, world: DVec3) -> DVec3 {
        self.from_world.transform_point3(world)
    }

    /// Geschlossene Kurve?
    pub fn closed_loop(&self) -> bool {
        self.closed_loop
    }

    /// Node-weite Sperre.
    pub fn locked(&self) -> bool {
        self.locked
    }

    /// Ist mindestens ein Punkt gesperrt?
    pub fn is_any_point_locked(&self) -> bool {
        self.points.iter().any(|p| p.locked)
    }

    /// Parent-Transformation (lokal → Welt).
    pub fn to_world(&self) -> DMat4 {
        self.to_world
    }

    /// Zuletzt gesetzter Schwerpunkt (Welt).
    pub fn centroid(&self) -> DVec3 {
        self.centroid
    }

    /// Zähler, der bei jeder Mutation steigt.
    pub fn modified_time(&self) -> u64 {
        self.modified_time
    }

    /// Alle Display-Nodes.
    pub fn display_nodes(&self) -> &[DisplayNode] {
        &self.display_nodes
    }

    /// Erster Display-Node (Standard-Darstellung).
    pub fn display_node(&self) -> Option<&DisplayNode> {
        self.display_nodes.first()
    }

    /// Darf der Node in der Ansicht `view_id` erscheinen?
    pub fn is_displayable_in_view(&self, view_id: &str) -> bool {
        self.display_nodes
            .iter()
            .any(|d| d.is_displayable_in_view(view_id))
    }

    // ── Beobachter ───────────────────────────────────────────────

    /// Meldet einen Beobachter an; Abmeldung beim Drop des Handles.
    pub fn add_observer(&self, observer: Rc<dyn NodeObserver>) -> ObserverRegistration {
        self.observers.register(observer)
    }

    /// Beginnt eine Änderungs-Klammer (verschachtelbar).
    pub fn start_modify(&mut self) {
        self.modify_depth += 1;
    }

    /// Beendet eine Änderungs-Klammer.
    ///
    /// Gibt `true` zurück, wenn dies die äußerste Klammer war und gesammelte
    /// Benachrichtigungen ausgeliefert wurden.
    pub fn end_modify(&mut self) -> bool {
        if self.modify_depth == 0 {
            log::warn!("end_modify ohne start_modify auf Node '{}'", self.id);
            return false;
        }
        self.modify_depth -= 1;
        if self.modify_depth > 0 {
            return false;
        }

        let structural = std::mem::take(&mut self.pending_structural);
        let modified = std::mem::take(&mut self.pending_modified);
        for event in &structural {
            self.observers.notify(event);
        }
        let indices: Vec<usize> = modified
            .into_iter()
            .filter(|&i| i < self.points.len())
            .collect();
        if !indices.is_empty() {
            self.observers.notify(&NodeEvent::PointsModified(indices));
        }
        true
    }

    fn emit(&mut self, event: NodeEvent) {
        self.modified_time += 1;
        if self.modify_depth > 0 {
            match event {
                NodeEvent::PointsModified(indices) => self.pending_modified.extend(indices),
                other => self.pending_structural.push(other),
            }
            return;
        }
        self.observers.notify(&event);
    }

    // ── Kontrollpunkte ───────────────────────────────────────────

    /// Hängt einen Punkt an `world` an und gibt seinen Index zurück.
    pub fn add_control_point(&mut self, world: DVec3) -> usize {
        let local = self.world_to_local(world);
        self.points.push(ControlPoint::new(local));
        let index = self.points.len() - 1;
        self.emit(NodeEvent::PointAdded(index));
        index
    }

    /// Fügt einen Punkt an `index` ein (`index == len` hängt an).
    pub fn insert_control_point(&mut self, index: usize, world: DVec3) -> bool {
        if index > self.points.len() {
            log::warn!(
                "insert_control_point: Index {} außerhalb von 0..={}",
                index,
                self.points.len()
            );
            return false;
        }
        let local = self.world_to_local(world);
        self.points.insert(index, ControlPoint::new(local));
        self.emit(NodeEvent::PointAdded(index));
        true
    }

    /// Entfernt Punkt `n`.
    pub fn remove_control_point(&mut self, n: usize) -> bool {
        if n >= self.points.len() {
            log::warn!("remove_control_point: Index {} ungültig", n);
            return false;
        }
        self.points.remove(n);
        self.emit(NodeEvent::PointRemoved(n));
        true
    }

    /// Entfernt den letzten Punkt.
    pub fn remove_last_control_point(&mut self) -> bool {
        match self.points.len() {
            0 => false,
            len => self.remove_control_point(len - 1),
        }
    }

    /// Entfernt alle Punkte.
    pub fn remove_all_control_points(&mut self) {
        if self.points.is_empty() {
            return;
        }
        self.points.clear();
        self.emit(NodeEvent::AllPointsRemoved);
    }

    /// Setzt die Weltposition von Punkt `n` (programmatisch, ohne Sperr-Prüfung).
    pub fn set_nth_position_world(&mut self, n: usize, world: DVec3) -> bool {
        let local = self.world_to_local(world);
        self.set_nth_position_local(n, local)
    }

    /// Setzt die lokale Position von Punkt `n`.
    pub fn set_nth_position_local(&mut self, n: usize, local: DVec3) -> bool {
        let Some(point) = self.points.get_mut(n) else {
            log::warn!("set_nth_position: Index {} ungültig", n);
            return false;
        };
        point.position = local;
        self.emit(NodeEvent::PointsModified(vec![n]));
        true
    }

    /// Setzt die Orientierung von Punkt `n` aus einer 3×3-Matrix.
    pub fn set_nth_orientation_matrix(&mut self, n: usize, matrix: DMat3) -> bool {
        self.modify_point(n, |p| p.set_orientation_matrix(matrix))
    }

    /// Setzt das Label von Punkt `n`.
    pub fn set_nth_label(&mut self, n: usize, label: impl Into<String>) -> bool {
        let label = label.into();
        self.modify_point(n, |p| p.label = label)
    }

    /// Setzt die Sichtbarkeit von Punkt `n`.
    pub fn set_nth_visible(&mut self, n: usize, visible: bool) -> bool {
        self.modify_point(n, |p| p.visible = visible)
    }

    /// Setzt die Selektion von Punkt `n`.
    pub fn set_nth_selected(&mut self, n: usize, selected: bool) -> bool {
        self.modify_point(n, |p| p.selected = selected)
    }

    /// Setzt die Sperre von Punkt `n`.
    pub fn set_nth_locked(&mut self, n: usize, locked: bool) -> bool {
        self.modify_point(n, |p| p.locked = locked)
    }

    fn modify_point(&mut self, n: usize, apply: impl FnOnce(&mut ControlPoint)) -> bool {
        let Some(point) = self.points.get_mut(n) else {
            log::warn!("Kontrollpunkt {} existiert nicht (Node '{}')", n, self.id);
            return false;
        };
        apply(point);
        self.emit(NodeEvent::PointsModified(vec![n]));
        true
    }

    // ── Node-Zustand ─────────────────────────────────────────────

    /// Öffnet oder schließt die Kurve.
    pub fn set_closed_loop(&mut self, closed: bool) {
        if self.closed_loop == closed {
            return;
        }
        self.closed_loop = closed;
        let all: Vec<usize> = (0..self.points.len()).collect();
        self.emit(NodeEvent::PointsModified(all));
    }

    /// Setzt die Node-weite Sperre.
    pub fn set_locked(&mut self, locked: bool) {
        if self.locked == locked {
            return;
        }
        self.locked = locked;
        self.emit(NodeEvent::LockModified);
    }

    /// Setzt die Parent-Transformation. Nicht invertierbare Matrizen werden abgelehnt.
    pub fn set_to_world(&mut self, to_world: DMat4) -> bool {
        let det = to_world.determinant();
        if !det.is_finite() || det.abs() < f64::EPSILON {
            log::warn!("set_to_world: Transformation nicht invertierbar (det={})", det);
            return false;
        }
        self.to_world = to_world;
        self.from_world = to_world.inverse();
        self.emit(NodeEvent::TransformModified);
        true
    }

    /// Speichert den von der Repräsentation berechneten Schwerpunkt.
    pub fn set_centroid_position(&mut self, world: DVec3) {
        self.centroid = world;
    }

    /// Fügt einen weiteren Display-Node hinzu.
    pub fn add_display_node(&mut self, display: DisplayNode) {
        self.display_nodes.push(display);
        self.emit(NodeEvent::DisplayModified);
    }

    /// Ändert einen Display-Node per Closure.
    pub fn modify_display_node(&mut self, id: &str, apply: impl FnOnce(&mut DisplayNode)) -> bool {
        let Some(display) = self.display_nodes.iter_mut().find(|d| d.id == id) else {
            log::warn!("Display-Node '{}' nicht gefunden", id);
            return false;
        };
        apply(display);
        self.emit(NodeEvent::DisplayModified);
        true
    }

    // ── Undo/Redo ────────────────────────────────────────────────

    fn snapshot(&self) -> NodeSnapshot {
        NodeSnapshot {
            points: self.points.clone(),
            closed_loop: self.closed_loop,
            locked: self.locked,
        }
    }

    /// Sichert den aktuellen Zustand vor einer destruktiven Änderung.
    pub fn save_state_for_undo(&mut self) {
        let snap = self.snapshot();
        self.history.record_snapshot(snap);
    }

    /// Stellt den letzten gesicherten Zustand wieder her.
    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.pop_undo_with_current(current) {
            Some(prev) => {
                self.restore(prev);
                true
            }
            None => false,
        }
    }

    /// Wiederholt einen rückgängig gemachten Zustand.
    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.pop_redo_with_current(current) {
            Some(next) => {
                self.restore(next);
                true
            }
            None => false,
        }
    }

    fn restore(&mut self, snap: NodeSnapshot) {
        self.start_modify();
        self.remove_all_control_points();
        self.points = snap.points;
        for index in 0..self.points.len() {
            self.emit(NodeEvent::PointAdded(index));
        }
        self.set_closed_loop(snap.closed_loop);
        self.set_locked(snap.locked);
        self.end_modify();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    #[derive(Default)]
    struct Recorder {
        events: RefCell<Vec<NodeEvent>>,
    }

    impl NodeObserver for Recorder {
        fn on_point_added(&self, index: usize) {
            self.events.borrow_mut().push(NodeEvent::PointAdded(index));
        }

        fn on_point_removed(&self, index: usize) {
            self.events.borrow_mut().push(NodeEvent::PointRemoved(index));
        }

        fn on_points_modified(&self, indices: &[usize]) {
            self.events
                .borrow_mut()
                .push(NodeEvent::PointsModified(indices.to_vec()));
        }

        fn on_all_points_removed(&self) {
            self.events.borrow_mut().push(NodeEvent::AllPointsRemoved);
        }
    }

    fn node_with_points(count: usize) -> MarkupsNode {
        let mut node = MarkupsNode::new("C", MarkupsKind::Curve);
        for i in 0..count {
            node.add_control_point(DVec3::new(i as f64, 0.0, 0.0));
        }
        node
    }

    #[test]
    fn modify_bracket_coalesces_notifications() {
        let mut node = node_with_points(3);
        let recorder = Rc::new(Recorder::default());
        let _handle = node.add_observer(recorder.clone());

        node.start_modify();
        for i in 0..3 {
            node.set_nth_position_world(i, DVec3::new(i as f64, 1.0, 0.0));
        }
        assert!(recorder.events.borrow().is_empty());
        node.end_modify();

        assert_eq!(
            *recorder.events.borrow(),
            vec![NodeEvent::PointsModified(vec![0, 1, 2])]
        );
    }

    #[test]
    fn nested_brackets_flush_once() {
        let mut node = node_with_points(2);
        let recorder = Rc::new(Recorder::default());
        let _handle = node.add_observer(recorder.clone());

        node.start_modify();
        node.start_modify();
        node.set_nth_label(0, "A");
        assert!(!node.end_modify());
        assert!(recorder.events.borrow().is_empty());
        assert!(node.end_modify());
        assert_eq!(recorder.events.borrow().len(), 1);
    }

    #[test]
    fn out_of_range_mutations_fail_without_events() {
        let mut node = node_with_points(2);
        let recorder = Rc::new(Recorder::default());
        let _handle = node.add_observer(recorder.clone());

        assert!(!node.set_nth_position_world(5, DVec3::ONE));
        assert!(!node.remove_control_point(2));
        assert!(!node.insert_control_point(4, DVec3::ONE));
        assert!(recorder.events.borrow().is_empty());
    }

    #[test]
    fn parent_transform_maps_world_to_local() {
        let mut node = MarkupsNode::new("L", MarkupsKind::Line);
        assert!(node.set_to_world(DMat4::from_translation(DVec3::new(10.0, 0.0, 0.0))));
        node.add_control_point(DVec3::new(11.0, 2.0, 3.0));

        assert_eq!(node.nth_position_local(0), Some(DVec3::new(1.0, 2.0, 3.0)));
        assert_eq!(node.nth_position_world(0), Some(DVec3::new(11.0, 2.0, 3.0)));
        assert!(!node.set_to_world(DMat4::ZERO));
    }

    #[test]
    fn undo_restores_deleted_point() {
        let mut node = node_with_points(3);
        node.save_state_for_undo();
        node.remove_control_point(1);
        assert_eq!(node.len(), 2);

        assert!(node.undo());
        assert_eq!(node.len(), 3);
        assert_eq!(node.nth_position_world(1), Some(DVec3::new(1.0, 0.0, 0.0)));

        assert!(node.redo());
        assert_eq!(node.len(), 2);
    }

    #[test]
    fn display_node_view_filter() {
        let mut node = MarkupsNode::new("P", MarkupsKind::PointList);
        assert!(node.is_displayable_in_view("Red"));
        let display_id = node.display_nodes()[0].id.clone();
        node.modify_display_node(&display_id, |d| d.view_node_ids = vec!["Red".into()]);
        assert!(node.is_displayable_in_view("Red"));
        assert!(!node.is_displayable_in_view("Yellow"));
    }

    #[test]
    fn closed_curve_kind_starts_closed() {
        assert!(MarkupsNode::new("CC", MarkupsKind::ClosedCurve).closed_loop());
        assert!(!MarkupsNode::new("C", MarkupsKind::Curve).closed_loop());
        assert_eq!(MarkupsKind::Angle.required_points(), Some(3));
    }
}

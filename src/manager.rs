//! Verwaltung der Widgets aller Markups-Nodes einer Ansicht.
//!
//! Der `DisplayableManager` erzeugt pro darstellbarem Node ein `Widget`,
//! verteilt Eingabe-Ereignisse an das nächstgelegene Widget und gleicht
//! Node- und Widget-Zustand in beide Richtungen ab. Jedes Widget meldet
//! einen `WidgetSync`-Beobachter am Node an; solange das Widget selbst
//! schreibt, ignoriert dieser die Benachrichtigungen.

use std::cell::Cell;
use std::rc::Rc;

use crate::core::{MarkupsNode, NodeObserver, ObserverRegistration};
use crate::representation::RepresentationGeometry;
use crate::shared::MarkupsOptions;
use crate::view::View;
use crate::widget::{InteractionEvent, InteractionEventKind, Widget, WidgetNotification};

// ── Beobachter ───────────────────────────────────────────────────

/// Merkt sich Node-Änderungen, die nicht vom eigenen Widget stammen.
#[derive(Debug, Default)]
pub struct WidgetSync {
    updating: Cell<bool>,
    dirty: Cell<bool>,
    display_dirty: Cell<bool>,
    received: Cell<u64>,
}

impl WidgetSync {
    /// Läuft gerade ein Abgleich (Benachrichtigungen werden ignoriert)?
    pub fn is_updating(&self) -> bool {
        self.updating.get()
    }

    /// Liegen unverarbeitete Änderungen vor?
    pub fn is_dirty(&self) -> bool {
        self.dirty.get()
    }

    /// Haben sich Darstellungs-Eigenschaften geändert?
    pub fn is_display_dirty(&self) -> bool {
        self.display_dirty.get()
    }

    /// Anzahl angenommener Benachrichtigungen.
    pub fn received(&self) -> u64 {
        self.received.get()
    }

    fn clear(&self) {
        self.dirty.set(false);
        self.display_dirty.set(false);
    }

    fn mark(&self, display: bool) {
        if self.updating.get() {
            return;
        }
        self.received.set(self.received.get() + 1);
        self.dirty.set(true);
        if display {
            self.display_dirty.set(true);
        }
    }

    fn guard(&self) -> UpdatingGuard<'_> {
        self.updating.set(true);
        UpdatingGuard(self)
    }
}

/// Setzt `updating` beim Drop zurück.
struct UpdatingGuard<'a>(&'a WidgetSync);

impl Drop for UpdatingGuard<'_> {
    fn drop(&mut self) {
        self.0.updating.set(false);
    }
}

impl NodeObserver for WidgetSync {
    fn on_point_added(&self, _index: usize) {
        self.mark(false);
    }

    fn on_point_removed(&self, _index: usize) {
        self.mark(false);
    }

    fn on_points_modified(&self, _indices: &[usize]) {
        self.mark(false);
    }

    fn on_display_properties_changed(&self) {
        self.mark(true);
    }

    fn on_lock_changed(&self) {
        self.mark(false);
    }

    fn on_transform_changed(&self) {
        self.mark(false);
    }

    fn on_all_points_removed(&self) {
        self.mark(false);
    }
}

// ── Manager ──────────────────────────────────────────────────────

#[derive(Debug)]
struct WidgetEntry {
    node_id: String,
    display_node_id: String,
    widget: Widget,
    sync: Rc<WidgetSync>,
    _registration: ObserverRegistration,
}

/// Widgets aller Markups-Nodes einer Ansicht.
#[derive(Debug)]
pub struct DisplayableManager {
    view: View,
    options: MarkupsOptions,
    entries: Vec<WidgetEntry>,
    notifications: Vec<(String, WidgetNotification)>,
}

impl DisplayableManager {
    pub fn new(view: View, options: MarkupsOptions) -> Self {
        Self {
            view,
            options,
            entries: Vec::new(),
            notifications: Vec::new(),
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    /// Kamera/Schicht ändern (`View::update_camera`, `View::update_slice`).
    pub fn view_mut(&mut self) -> &mut View {
        &mut self.view
    }

    /// Ersetzt die Ansicht; Widgets rechnen beim nächsten Abgleich neu.
    pub fn set_view(&mut self, view: View) {
        log::debug!("Ansicht '{}' → '{}'", self.view.id(), view.id());
        self.view = view;
    }

    pub fn options(&self) -> &MarkupsOptions {
        &self.options
    }

    /// Anzahl verwalteter Widgets.
    pub fn widget_count(&self) -> usize {
        self.entries.len()
    }

    // ── Lebenszyklus ─────────────────────────────────────────────

    /// Erstellt ein Widget für den Node (ohne es zu registrieren).
    pub fn create_widget(&self, node: &MarkupsNode) -> Option<Widget> {
        if node.display_nodes().is_empty() {
            log::warn!("Node '{}' ohne Display-Node, kein Widget", node.id());
            return None;
        }
        Some(Widget::new(node, self.options.clone()))
    }

    /// Registriert ein erstelltes Widget und meldet den Beobachter am Node an.
    pub fn on_widget_created(&mut self, widget: Widget, node: &MarkupsNode) -> bool {
        if widget.node_id() != node.id() {
            log::warn!(
                "Widget für '{}' passt nicht zu Node '{}'",
                widget.node_id(),
                node.id()
            );
            return false;
        }
        if self.entries.iter().any(|e| e.node_id == node.id()) {
            log::warn!("Node '{}' hat bereits ein Widget", node.id());
            return false;
        }
        let display_node_id = node
            .display_nodes()
            .iter()
            .find(|d| d.is_displayable_in_view(self.view.id()))
            .or_else(|| node.display_nodes().first())
            .map(|d| d.id.clone())
            .unwrap_or_default();

        let sync = Rc::new(WidgetSync::default());
        let registration = node.add_observer(Rc::clone(&sync) as Rc<dyn NodeObserver>);
        self.entries.push(WidgetEntry {
            node_id: node.id().to_string(),
            display_node_id,
            widget,
            sync,
            _registration: registration,
        });
        log::debug!("Widget für Node '{}' registriert", node.id());
        true
    }

    /// Legt ein Widget an, wenn ein Display-Node des Nodes in dieser Ansicht sichtbar ist.
    pub fn add_node(&mut self, node: &mut MarkupsNode) -> bool {
        let view_id = self.view.id();
        if !node
            .display_nodes()
            .iter()
            .any(|d| d.is_displayable_in_view(view_id))
        {
            log::debug!("Node '{}' in Ansicht '{}' nicht darstellbar", node.id(), view_id);
            return false;
        }
        let Some(widget) = self.create_widget(node) else {
            return false;
        };
        if !self.on_widget_created(widget, node) {
            return false;
        }
        self.propagate_mrml_to_widget(node)
    }

    /// Entfernt das Widget; der Beobachter wird dabei abgemeldet.
    pub fn remove_node(&mut self, node_id: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.node_id != node_id);
        before != self.entries.len()
    }

    fn entry_index(&self, node: &MarkupsNode) -> Option<usize> {
        self.entries.iter().position(|entry| {
            entry.node_id == node.id()
                && node
                    .display_nodes()
                    .iter()
                    .any(|display| display.id == entry.display_node_id)
        })
    }

    /// Widget des Nodes; berücksichtigt alle Display-Nodes des Nodes.
    pub fn widget(&self, node: &MarkupsNode) -> Option<&Widget> {
        self.entry_index(node).map(|i| &self.entries[i].widget)
    }

    pub fn widget_mut(&mut self, node: &MarkupsNode) -> Option<&mut Widget> {
        let index = self.entry_index(node)?;
        Some(&mut self.entries[index].widget)
    }

    /// Beobachter-Zustand des Widgets eines Nodes.
    pub fn sync_state(&self, node: &MarkupsNode) -> Option<&WidgetSync> {
        self.entry_index(node).map(|i| self.entries[i].sync.as_ref())
    }

    // ── Abgleich ─────────────────────────────────────────────────

    /// Node → Widget: Linien, Locator und aktive Komponente neu ableiten.
    pub fn propagate_mrml_to_widget(&mut self, node: &mut MarkupsNode) -> bool {
        let Some(index) = self.entry_index(node) else {
            return false;
        };
        let entry = &mut self.entries[index];
        let _guard = entry.sync.guard();
        entry.widget.sync_from_node(node, &self.view);
        entry.sync.clear();
        true
    }

    /// Widget → Node: Schwerpunkt zurückschreiben.
    pub fn propagate_widget_to_mrml(&mut self, node: &mut MarkupsNode) -> bool {
        let Some(index) = self.entry_index(node) else {
            return false;
        };
        let entry = &mut self.entries[index];
        let _guard = entry.sync.guard();
        entry
            .widget
            .representation_mut()
            .update_centroid(node)
            .is_some()
    }

    /// Gleicht alle Widgets ab, deren Node sich extern geändert hat.
    pub fn update_from_nodes(&mut self, nodes: &mut [MarkupsNode]) -> usize {
        let mut updated = 0;
        for node in nodes.iter_mut() {
            let dirty = self
                .entry_index(node)
                .is_some_and(|i| self.entries[i].sync.is_dirty());
            if dirty && self.propagate_mrml_to_widget(node) {
                updated += 1;
            }
        }
        updated
    }

    /// Leitet die Geometrie des Widgets für den nächsten Render-Durchlauf ab.
    pub fn build_representation(&mut self, node: &mut MarkupsNode) -> Option<RepresentationGeometry> {
        let index = self.entry_index(node)?;
        let entry = &mut self.entries[index];
        let _guard = entry.sync.guard();
        Some(
            entry
                .widget
                .representation_mut()
                .build_representation(node, &self.view)
                .clone(),
        )
    }

    /// Darf das Widget des Nodes in dieser Ansicht dargestellt werden?
    pub fn is_widget_displayable_on_slice(&self, node: &MarkupsNode) -> bool {
        self.widget(node).is_some_and(|widget| {
            widget
                .representation()
                .is_widget_displayable_on_slice(node, &self.view)
        })
    }

    // ── Ereignisse ───────────────────────────────────────────────

    /// Verteilt ein Eingabe-Ereignis.
    ///
    /// Das Widget mit dem kleinsten Abstand erhält das Ereignis, alle anderen
    /// verlieren ihre Hover-Markierung. `Leave` geht an alle Widgets. Gibt
    /// `true` zurück, wenn ein Widget das Ereignis konsumiert hat.
    pub fn process_interaction_event(
        &mut self,
        nodes: &mut [MarkupsNode],
        event: &InteractionEvent,
    ) -> bool {
        if event.kind == InteractionEventKind::Leave {
            let mut consumed = false;
            for node in nodes.iter_mut() {
                consumed |= self.dispatch(node, event);
            }
            return consumed;
        }

        let mut best: Option<(usize, f64)> = None;
        for (node_index, node) in nodes.iter().enumerate() {
            let Some(entry_index) = self.entry_index(node) else {
                continue;
            };
            let candidate = self.entries[entry_index]
                .widget
                .can_process_interaction_event(node, &self.view, event);
            if let Some(distance2) = candidate {
                if best.map_or(true, |(_, d)| distance2 < d) {
                    best = Some((node_index, distance2));
                }
            }
        }

        for (node_index, node) in nodes.iter().enumerate() {
            if best.is_some_and(|(winner, _)| winner == node_index) {
                continue;
            }
            if let Some(entry_index) = self.entry_index(node) {
                self.entries[entry_index].widget.clear_hover(node);
            }
        }

        match best {
            Some((node_index, _)) => self.dispatch(&mut nodes[node_index], event),
            None => false,
        }
    }

    fn dispatch(&mut self, node: &mut MarkupsNode, event: &InteractionEvent) -> bool {
        let Some(index) = self.entry_index(node) else {
            return false;
        };
        let entry = &mut self.entries[index];
        let result = {
            let _guard = entry.sync.guard();
            entry.widget.process_event(node, &self.view, event)
        };
        for notification in result.notifications {
            log::debug!("Node '{}': {:?}", entry.node_id, notification);
            self.notifications.push((entry.node_id.clone(), notification));
        }
        result.consumed
    }

    /// Gesammelte Widget-Benachrichtigungen seit dem letzten Aufruf.
    pub fn take_notifications(&mut self) -> Vec<(String, WidgetNotification)> {
        std::mem::take(&mut self.notifications)
    }
}

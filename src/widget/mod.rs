//! Interaktions-Zustandsautomat eines Markups-Widgets.
//!
//! Ein `Widget` übersetzt Eingabe-Ereignisse über den `EventTranslator` in
//! `WidgetEvent`s und setzt sie je nach `WidgetState` in Operationen der
//! `Representation` um. Der Node wird pro Aufruf geliehen; das Widget hält
//! nur seine ID.
//!
//! Aufgeteilt in:
//! - `event` — Maus-, Tastatur- und Fokus-Ereignisse
//! - `translator` — Zuordnung Ereignis → `WidgetEvent`
//! - `handlers` — Reaktion je `WidgetEvent` und Zustand

pub mod event;
mod handlers;
pub mod translator;

pub use event::{InteractionEvent, InteractionEventKind, Key, Modifiers, MouseButton};
pub use translator::{EventTranslator, WidgetEvent};

use glam::{DVec2, DVec3};

use crate::core::MarkupsNode;
use crate::representation::Representation;
use crate::shared::MarkupsOptions;
use crate::view::View;

// ── Typen ────────────────────────────────────────────────────────

/// Zustand des Widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WidgetState {
    /// Keine Komponente unter dem Cursor
    #[default]
    Idle,
    /// Punkte werden platziert
    Define,
    /// Cursor über einer Komponente
    OnWidget,
    /// Einzelner Punkt wird gezogen
    TranslateControlPoint,
    /// Alle Punkte werden verschoben
    Translate,
    /// Alle Punkte werden gedreht
    Rotate,
    /// Alle Punkte werden skaliert
    Scale,
}

impl WidgetState {
    /// Ruhezustände, in denen keine Operation läuft.
    pub fn is_rest(self) -> bool {
        matches!(self, WidgetState::Idle | WidgetState::OnWidget)
    }

    /// Laufende Drag-Operationen.
    pub fn is_transform(self) -> bool {
        matches!(
            self,
            WidgetState::TranslateControlPoint
                | WidgetState::Translate
                | WidgetState::Rotate
                | WidgetState::Scale
        )
    }
}

/// Rückmeldung an den Aufrufer (Manager / Anwendung).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetNotification {
    StartInteraction,
    EndInteraction,
    PointPlaced(usize),
    PointInserted(usize),
    PointDeleted(usize),
    Reset,
}

/// Ergebnis der Ereignis-Verarbeitung.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventResult {
    /// `false`: das Ereignis darf an andere Widgets oder die Kamera weitergereicht werden
    pub consumed: bool,
    pub notifications: Vec<WidgetNotification>,
}

impl EventResult {
    pub fn consumed() -> Self {
        Self {
            consumed: true,
            notifications: Vec::new(),
        }
    }

    pub fn ignored() -> Self {
        Self::default()
    }

    pub fn from_bool(consumed: bool) -> Self {
        Self {
            consumed,
            notifications: Vec::new(),
        }
    }

    /// Hängt eine Benachrichtigung an (Builder).
    pub fn with(mut self, notification: WidgetNotification) -> Self {
        self.notifications.push(notification);
        self
    }
}

/// Widget eines Markups-Nodes in einer Ansicht.
#[derive(Debug)]
pub struct Widget {
    node_id: String,
    representation: Representation,
    state: WidgetState,
    options: MarkupsOptions,
    translator: EventTranslator,
    /// Index des dem Cursor folgenden, noch nicht bestätigten Punkts
    preview_index: Option<usize>,
    /// Display-Versatz Punkt − Cursor beim Greifen eines Punkts
    start_event_offset: DVec2,
    last_event_world: Option<DVec3>,
    /// Bezugspunkt für Rotation und Skalierung
    reference: DVec3,
    /// Während der Platzierung gesperrte Punkte
    placed_locked: Vec<usize>,
}

impl Widget {
    /// Erstellt ein Widget mit passender Interpolation für den Node.
    pub fn new(node: &MarkupsNode, options: MarkupsOptions) -> Self {
        Self {
            node_id: node.id().to_string(),
            representation: Representation::for_node(node, options.clone()),
            state: WidgetState::Idle,
            options,
            translator: EventTranslator::default(),
            preview_index: None,
            start_event_offset: DVec2::ZERO,
            last_event_world: None,
            reference: DVec3::ZERO,
            placed_locked: Vec::new(),
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn state(&self) -> WidgetState {
        self.state
    }

    pub fn representation(&self) -> &Representation {
        &self.representation
    }

    pub fn representation_mut(&mut self) -> &mut Representation {
        &mut self.representation
    }

    pub fn options(&self) -> &MarkupsOptions {
        &self.options
    }

    pub fn translator(&self) -> &EventTranslator {
        &self.translator
    }

    /// Übersetzungstabelle zum Umbelegen der Eingaben.
    pub fn translator_mut(&mut self) -> &mut EventTranslator {
        &mut self.translator
    }

    /// Index des Vorschau-Punkts, falls einer existiert.
    pub fn preview_index(&self) -> Option<usize> {
        self.preview_index
    }

    /// Bestätigte Punkte (ohne Vorschau-Punkt).
    pub fn placed_count(&self, node: &MarkupsNode) -> usize {
        node.len()
            .saturating_sub(usize::from(self.valid_preview(node).is_some()))
    }

    /// Vorschau-Index, sofern er noch auf einen Punkt des Nodes zeigt.
    fn valid_preview(&self, node: &MarkupsNode) -> Option<usize> {
        self.preview_index.filter(|&index| index < node.len())
    }

    fn owns(&self, node: &MarkupsNode) -> bool {
        if node.id() != self.node_id {
            log::warn!(
                "Widget für '{}' erhielt Node '{}'",
                self.node_id,
                node.id()
            );
            return false;
        }
        true
    }

    // ── Platzierung ──────────────────────────────────────────────

    /// Startet die Platzierung weiterer Punkte.
    pub fn start_placement(&mut self, node: &MarkupsNode) -> bool {
        if !self.owns(node) || node.locked() {
            return false;
        }
        if let Some(required) = node.kind().required_points() {
            if node.len() >= required {
                log::debug!("Node '{}' hat bereits {} Punkte", node.id(), required);
                return false;
            }
        }
        self.set_state(WidgetState::Define);
        true
    }

    /// Beendet die Platzierung: Vorschau-Punkt entfernen, Platzierungs-Sperren lösen.
    pub fn finish_placement(&mut self, node: &mut MarkupsNode) -> bool {
        if self.state != WidgetState::Define || !self.owns(node) {
            return false;
        }
        self.remove_preview(node);
        self.release_placement_locks(node);
        self.set_state(WidgetState::Idle);
        true
    }

    /// Schließt eine offene Kurve mit mindestens zwei Punkten und beendet die Platzierung.
    pub fn close_loop(&mut self, node: &mut MarkupsNode) -> bool {
        if !self.owns(node) || node.closed_loop() || self.placed_count(node) < 2 {
            return false;
        }
        if self.state == WidgetState::Define {
            self.finish_placement(node);
        }
        let closed = self.representation.set_closed_loop(node, true);
        self.representation.update_centroid(node);
        closed
    }

    fn remove_preview(&mut self, node: &mut MarkupsNode) {
        if let Some(index) = self.preview_index.take() {
            if index < node.len() {
                self.representation.delete_nth_node(node, index);
            }
        }
    }

    fn release_placement_locks(&mut self, node: &mut MarkupsNode) {
        if self.placed_locked.is_empty() {
            return;
        }
        node.start_modify();
        for index in self.placed_locked.drain(..) {
            node.set_nth_locked(index, false);
        }
        node.end_modify();
    }

    // ── Ereignisse ───────────────────────────────────────────────

    /// Verarbeitet ein Eingabe-Ereignis.
    pub fn process_event(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> EventResult {
        if !self.owns(node) {
            return EventResult::ignored();
        }
        let Some(widget_event) = self.translator.translate(event) else {
            return EventResult::ignored();
        };
        match widget_event {
            WidgetEvent::MouseMove => self.on_mouse_move(node, view, event),
            WidgetEvent::Select => self.on_select(node, view, event),
            WidgetEvent::Translate => self.on_translate_start(node, view, event),
            WidgetEvent::Rotate => self.on_transform_start(node, view, event, WidgetState::Rotate),
            WidgetEvent::Scale => self.on_transform_start(node, view, event, WidgetState::Scale),
            WidgetEvent::ControlPointInsert => self.on_control_point_insert(node, view, event),
            WidgetEvent::EndInteraction => self.on_end_interaction(node),
            WidgetEvent::Delete => self.on_delete(node, view, event),
            WidgetEvent::Reset => self.on_reset(node),
            WidgetEvent::ToggleAxis(axis) => self.on_toggle_axis(axis),
            WidgetEvent::Leave => self.on_leave(node),
        }
    }

    /// Kann das Widget das Ereignis verarbeiten? Liefert den quadrierten
    /// Display-Abstand zur Komponente (kleiner gewinnt).
    ///
    /// Laufende Platzierung oder Drag-Operationen beanspruchen jedes
    /// übersetzbare Ereignis mit Abstand 0.
    pub fn can_process_interaction_event(
        &mut self,
        node: &MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> Option<f64> {
        if node.id() != self.node_id {
            return None;
        }
        let widget_event = self.translator.translate(event)?;
        if widget_event == WidgetEvent::Leave {
            return None;
        }
        if self.state == WidgetState::Define || self.state.is_transform() {
            return Some(0.0);
        }
        if widget_event == WidgetEvent::EndInteraction {
            return None;
        }
        if !self.representation.is_widget_displayable_on_slice(node, view) {
            return None;
        }

        let display = event.display_position;
        if widget_event == WidgetEvent::ControlPointInsert {
            let (world, _) = self
                .representation
                .find_closest_point_on_widget(node, view, display)?;
            return Some(view.world_to_display(world).truncate().distance_squared(display));
        }
        let world = self.event_world_position(view, event, None);
        let interaction = self.representation.can_interact(node, view, display, world);
        interaction.is_hit().then_some(interaction.distance2)
    }

    /// Hover-Markierung aufheben (ein anderes Widget liegt näher).
    pub fn clear_hover(&mut self, node: &MarkupsNode) {
        if self.state == WidgetState::OnWidget {
            self.representation
                .set_active_component(node, crate::representation::ActiveComponent::None);
            self.set_state(WidgetState::Idle);
        }
    }

    /// Übernimmt extern geänderten Node-Zustand.
    pub fn sync_from_node(&mut self, node: &mut MarkupsNode, view: &View) {
        if !self.owns(node) {
            return;
        }
        if self.preview_index.is_some_and(|index| index >= node.len()) {
            self.preview_index = None;
        }
        self.placed_locked.retain(|&index| index < node.len());
        let active = self.representation.active_component();
        self.representation.set_active_component(node, active);
        self.representation.update_widget(node, view, true);
        self.representation.update_centroid(node);
    }

    fn set_state(&mut self, state: WidgetState) {
        if self.state != state {
            log::debug!("Widget '{}': {:?} → {:?}", self.node_id, self.state, state);
            self.state = state;
        }
    }

    /// Weltposition eines Ereignisses: vorgegeben oder aus der Display-Position.
    fn event_world_position(
        &self,
        view: &View,
        event: &InteractionEvent,
        reference: Option<DVec3>,
    ) -> DVec3 {
        event.world_position.unwrap_or_else(|| {
            self.representation
                .world_position_for_display(view, event.display_position, reference)
        })
    }
}

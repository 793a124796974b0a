//! Reaktionen des Widgets auf übersetzte Ereignisse.
//!
//! Jeder Handler prüft seine Vorbedingungen und gibt bei Verletzung ein
//! nicht konsumiertes `EventResult` zurück, ohne den Node zu verändern.

use glam::DVec3;

use super::{EventResult, InteractionEvent, Widget, WidgetNotification, WidgetState};
use crate::core::MarkupsNode;
use crate::representation::{ActiveComponent, AxisRestriction, Interaction};
use crate::view::View;

impl Widget {
    // ── Mausbewegung ─────────────────────────────────────────────

    pub(super) fn on_mouse_move(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> EventResult {
        match self.state {
            WidgetState::Define => self.update_preview(node, view, event),
            WidgetState::Idle | WidgetState::OnWidget => self.update_hover(node, view, event),
            WidgetState::TranslateControlPoint => {
                let Some(index) = self.representation.active_component().control_point() else {
                    return EventResult::ignored();
                };
                let target = event.display_position + self.start_event_offset;
                self.representation.translate_node(node, view, index, target);
                EventResult::consumed()
            }
            WidgetState::Translate => {
                let world = self.event_world_position(view, event, self.last_event_world);
                if let Some(last) = self.last_event_world {
                    self.representation.translate_widget(node, world - last);
                }
                self.last_event_world = Some(world);
                EventResult::consumed()
            }
            WidgetState::Rotate => {
                let world = self.event_world_position(view, event, Some(self.reference));
                if let Some(last) = self.last_event_world {
                    self.representation
                        .rotate_widget(node, view, self.reference, last, world);
                }
                self.last_event_world = Some(world);
                EventResult::consumed()
            }
            WidgetState::Scale => {
                let world = self.event_world_position(view, event, Some(self.reference));
                if let Some(last) = self.last_event_world {
                    self.representation
                        .scale_widget(node, self.reference, last, world);
                }
                self.last_event_world = Some(world);
                EventResult::consumed()
            }
        }
    }

    fn update_hover(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> EventResult {
        let interaction = if self.representation.is_widget_displayable_on_slice(node, view) {
            let world = self.event_world_position(view, event, None);
            self.representation
                .can_interact(node, view, event.display_position, world)
        } else {
            Interaction::NONE
        };
        self.representation
            .set_active_component(node, interaction.component);
        if interaction.is_hit() {
            self.set_state(WidgetState::OnWidget);
            EventResult::consumed()
        } else {
            self.set_state(WidgetState::Idle);
            EventResult::ignored()
        }
    }

    /// Vorschau-Punkt anlegen bzw. unter den Cursor setzen.
    fn update_preview(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> EventResult {
        if !self.options.follow_cursor || node.locked() {
            return EventResult::ignored();
        }
        match self.preview_index {
            Some(index) if index < node.len() => {
                let world = self.placement_world(view, event);
                self.representation
                    .set_nth_node_world_position(node, index, world);
            }
            _ => {
                self.preview_index = self.add_point(node, view, event);
            }
        }
        EventResult::from_bool(self.preview_index.is_some())
    }

    /// Platzierungs-Position: vorgegebene Weltposition oder Cursor im Viewport.
    fn placement_world(&self, view: &View, event: &InteractionEvent) -> DVec3 {
        if let Some(world) = event.world_position {
            return world;
        }
        let (display, _) =
            view.restrict_display_to_viewport(event.display_position, self.options.viewport_margin);
        self.representation
            .world_position_for_display(view, display, None)
    }

    fn add_point(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> Option<usize> {
        let world = self.placement_world(view, event);
        node.start_modify();
        let index = self.representation.add_node_at_world_position(node, world);
        if let Some(index) = index {
            node.set_nth_orientation_matrix(index, view.view_orientation());
        }
        node.end_modify();
        index
    }

    // ── Tasten-Drücke ────────────────────────────────────────────

    pub(super) fn on_select(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> EventResult {
        match self.state {
            WidgetState::Define => self.place_point(node, view, event),
            WidgetState::OnWidget => match self.representation.active_component() {
                ActiveComponent::ControlPoint(index) => {
                    self.start_control_point_drag(node, view, event, index)
                }
                ActiveComponent::Line(_) | ActiveComponent::Centroid => {
                    self.start_widget_translate(node, view, event)
                }
                ActiveComponent::None => EventResult::ignored(),
            },
            state if state.is_transform() => EventResult::consumed(),
            _ => EventResult::ignored(),
        }
    }

    /// Bestätigt den Vorschau-Punkt oder setzt einen neuen Punkt.
    fn place_point(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> EventResult {
        if node.locked() {
            return EventResult::ignored();
        }
        let index = match self.preview_index.take() {
            Some(index) if index < node.len() => {
                let world = self.placement_world(view, event);
                self.representation
                    .set_nth_node_world_position(node, index, world);
                index
            }
            _ => match self.add_point(node, view, event) {
                Some(index) => index,
                None => return EventResult::ignored(),
            },
        };
        if self.options.lock_while_placing {
            node.set_nth_locked(index, true);
            self.placed_locked.push(index);
        }
        log::debug!("Punkt {} platziert (Node '{}')", index, node.id());

        let result = EventResult::consumed().with(WidgetNotification::PointPlaced(index));
        if let Some(required) = node.kind().required_points() {
            if node.len() >= required {
                self.finish_placement(node);
            }
        }
        result
    }

    fn start_control_point_drag(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
        index: usize,
    ) -> EventResult {
        let Some(point) = node.point(index) else {
            return EventResult::ignored();
        };
        if node.locked() || point.locked {
            log::debug!("Punkt {} gesperrt, kein Drag", index);
            return EventResult::ignored();
        }
        let world = node.local_to_world(point.position);
        self.start_event_offset = view.world_to_display(world).truncate() - event.display_position;
        self.last_event_world = Some(world);
        node.save_state_for_undo();
        self.set_state(WidgetState::TranslateControlPoint);
        EventResult::consumed().with(WidgetNotification::StartInteraction)
    }

    fn start_widget_translate(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> EventResult {
        if node.locked() || node.is_any_point_locked() {
            log::debug!("Node '{}' enthält gesperrte Punkte, kein Verschieben", node.id());
            return EventResult::ignored();
        }
        self.begin_transform(node, view, event, WidgetState::Translate)
    }

    pub(super) fn on_translate_start(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> EventResult {
        if self.state != WidgetState::OnWidget
            || self.representation.active_component() == ActiveComponent::None
        {
            return EventResult::ignored();
        }
        self.start_widget_translate(node, view, event)
    }

    pub(super) fn on_transform_start(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
        state: WidgetState,
    ) -> EventResult {
        if self.state != WidgetState::OnWidget
            || self.representation.active_component() == ActiveComponent::None
            || node.locked()
        {
            return EventResult::ignored();
        }
        self.begin_transform(node, view, event, state)
    }

    fn begin_transform(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
        state: WidgetState,
    ) -> EventResult {
        let Some(reference) = self.representation.transformation_reference_point(node) else {
            return EventResult::ignored();
        };
        self.reference = reference;
        self.last_event_world = Some(self.event_world_position(view, event, Some(reference)));
        node.save_state_for_undo();
        self.set_state(state);
        EventResult::consumed().with(WidgetNotification::StartInteraction)
    }

    /// Fügt einen Punkt auf der Kurve ein und beginnt ihn zu ziehen.
    pub(super) fn on_control_point_insert(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> EventResult {
        if !self.state.is_rest() || node.locked() {
            return EventResult::ignored();
        }
        let display = event.display_position;
        if self
            .representation
            .find_closest_point_on_widget(node, view, display)
            .is_none()
        {
            return EventResult::ignored();
        }
        node.save_state_for_undo();
        let Some(index) = self.representation.add_node_on_widget(node, view, display) else {
            return EventResult::ignored();
        };
        self.representation
            .set_active_component(node, ActiveComponent::ControlPoint(index));

        let world = node.nth_position_world(index).unwrap_or_default();
        self.start_event_offset = view.world_to_display(world).truncate() - display;
        self.last_event_world = Some(world);
        self.set_state(WidgetState::TranslateControlPoint);
        EventResult::consumed()
            .with(WidgetNotification::PointInserted(index))
            .with(WidgetNotification::StartInteraction)
    }

    pub(super) fn on_end_interaction(&mut self, node: &mut MarkupsNode) -> EventResult {
        if !self.state.is_transform() {
            return EventResult::ignored();
        }
        self.last_event_world = None;
        self.representation.update_centroid(node);
        self.set_state(WidgetState::OnWidget);
        EventResult::consumed().with(WidgetNotification::EndInteraction)
    }

    // ── Tastatur ─────────────────────────────────────────────────

    pub(super) fn on_delete(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> EventResult {
        match self.state {
            WidgetState::Define => self.delete_while_placing(node),
            WidgetState::OnWidget => self.delete_active(node, view, event),
            _ => EventResult::ignored(),
        }
    }

    /// Entfernt den zuletzt bestätigten Punkt; der Vorschau-Punkt bleibt.
    fn delete_while_placing(&mut self, node: &mut MarkupsNode) -> EventResult {
        self.preview_index = self.valid_preview(node);
        let target = match self.preview_index {
            Some(preview) => preview.checked_sub(1),
            None => node.len().checked_sub(1),
        };
        let Some(target) = target else {
            return EventResult::ignored();
        };
        node.save_state_for_undo();
        if !self.representation.delete_nth_node(node, target) {
            return EventResult::ignored();
        }
        if let Some(preview) = self.preview_index.as_mut() {
            *preview -= 1;
        }
        self.placed_locked.retain(|&index| index != target);
        for index in &mut self.placed_locked {
            if *index > target {
                *index -= 1;
            }
        }
        EventResult::consumed().with(WidgetNotification::PointDeleted(target))
    }

    /// Entfernt den Kontrollpunkt unter dem Cursor.
    fn delete_active(
        &mut self,
        node: &mut MarkupsNode,
        view: &View,
        event: &InteractionEvent,
    ) -> EventResult {
        let active = self
            .representation
            .activate_node(node, view, event.display_position);
        let Some(index) = active.control_point() else {
            return EventResult::ignored();
        };
        if node.locked() || node.point(index).map_or(true, |p| p.locked) {
            return EventResult::ignored();
        }
        node.save_state_for_undo();
        if !self.representation.delete_nth_node(node, index) {
            return EventResult::ignored();
        }
        self.representation.update_centroid(node);
        if node.is_empty() {
            self.set_state(WidgetState::Define);
        } else {
            self.set_state(WidgetState::Idle);
        }
        EventResult::consumed().with(WidgetNotification::PointDeleted(index))
    }

    pub(super) fn on_reset(&mut self, node: &mut MarkupsNode) -> EventResult {
        if node.locked() {
            return EventResult::ignored();
        }
        node.save_state_for_undo();
        if !self.representation.clear_all_nodes(node) {
            return EventResult::ignored();
        }
        self.preview_index = None;
        self.placed_locked.clear();
        self.last_event_world = None;
        self.set_state(WidgetState::Define);
        EventResult::consumed().with(WidgetNotification::Reset)
    }

    pub(super) fn on_toggle_axis(&mut self, axis: AxisRestriction) -> EventResult {
        if self.state != WidgetState::OnWidget && !self.state.is_transform() {
            return EventResult::ignored();
        }
        self.representation.toggle_axis_restriction(axis);
        EventResult::consumed()
    }

    // ── Fokus ────────────────────────────────────────────────────

    /// Bricht Vorschau und laufende Operationen ab und geht nach `Idle`.
    pub(super) fn on_leave(&mut self, node: &mut MarkupsNode) -> EventResult {
        let was_transform = self.state.is_transform();
        let changed = self.preview_index.is_some() || self.state != WidgetState::Idle;

        self.remove_preview(node);
        self.release_placement_locks(node);
        self.representation
            .set_active_component(node, ActiveComponent::None);
        self.last_event_world = None;
        self.set_state(WidgetState::Idle);

        let result = EventResult::from_bool(changed);
        if was_transform {
            result.with(WidgetNotification::EndInteraction)
        } else {
            result
        }
    }
}

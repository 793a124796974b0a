//! Mapping von Eingabe-Ereignissen auf Widget-Ereignisse.

use std::collections::HashMap;

use super::event::{InteractionEvent, InteractionEventKind, Key, Modifiers, MouseButton};
use crate::representation::AxisRestriction;

/// Vom Widget verstandene, abstrakte Ereignisse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetEvent {
    /// Cursor bewegt (Hover, Vorschau-Punkt, laufende Transformation)
    MouseMove,
    /// Punkt platzieren bzw. Komponente greifen
    Select,
    /// Alle Punkte verschieben
    Translate,
    /// Alle Punkte um den Bezugspunkt drehen
    Rotate,
    /// Alle Punkte relativ zum Bezugspunkt skalieren
    Scale,
    /// Punkt auf der Kurve einfügen
    ControlPointInsert,
    /// Laufende Interaktion abschließen
    EndInteraction,
    /// Vorschau-Punkt bzw. aktiven Punkt löschen
    Delete,
    /// Alle Punkte löschen
    Reset,
    /// Achsen-Einschränkung umschalten
    ToggleAxis(AxisRestriction),
    /// Cursor hat die Ansicht verlassen
    Leave,
}

/// Übersetzungstabelle `(Ereignis-Art, Modifier) → WidgetEvent`.
#[derive(Debug, Clone)]
pub struct EventTranslator {
    translations: HashMap<(InteractionEventKind, Modifiers), WidgetEvent>,
}

impl Default for EventTranslator {
    fn default() -> Self {
        use InteractionEventKind::{ButtonPress, ButtonRelease, KeyPress, Leave, MouseMove};

        let mut translator = Self::empty();
        translator.set_translation(MouseMove, Modifiers::NONE, WidgetEvent::MouseMove);
        translator.set_translation(Leave, Modifiers::NONE, WidgetEvent::Leave);

        translator.set_translation(ButtonPress(MouseButton::Left), Modifiers::NONE, WidgetEvent::Select);
        translator.set_translation(
            ButtonPress(MouseButton::Middle),
            Modifiers::NONE,
            WidgetEvent::Translate,
        );
        translator.set_translation(ButtonPress(MouseButton::Left), Modifiers::ALT, WidgetEvent::Rotate);
        translator.set_translation(ButtonPress(MouseButton::Right), Modifiers::ALT, WidgetEvent::Scale);
        translator.set_translation(
            ButtonPress(MouseButton::Left),
            Modifiers::CTRL,
            WidgetEvent::ControlPointInsert,
        );

        for button in [MouseButton::Left, MouseButton::Middle, MouseButton::Right] {
            translator.set_translation(
                ButtonRelease(button),
                Modifiers::NONE,
                WidgetEvent::EndInteraction,
            );
        }

        for key in [Key::Delete, Key::BackSpace] {
            translator.set_translation(KeyPress(key), Modifiers::NONE, WidgetEvent::Delete);
            translator.set_translation(KeyPress(key), Modifiers::SHIFT, WidgetEvent::Reset);
        }

        for (c, axis) in [
            ('x', AxisRestriction::X),
            ('y', AxisRestriction::Y),
            ('z', AxisRestriction::Z),
        ] {
            translator.set_translation(
                KeyPress(Key::Char(c)),
                Modifiers::NONE,
                WidgetEvent::ToggleAxis(axis),
            );
        }
        translator
    }
}

impl EventTranslator {
    /// Tabelle ohne Einträge.
    pub fn empty() -> Self {
        Self {
            translations: HashMap::new(),
        }
    }

    /// Setzt oder überschreibt eine Zuordnung.
    pub fn set_translation(
        &mut self,
        kind: InteractionEventKind,
        modifiers: Modifiers,
        event: WidgetEvent,
    ) {
        self.translations
            .insert((Self::normalize(kind), modifiers), event);
    }

    /// Entfernt eine Zuordnung; gibt das bisherige Ziel zurück.
    pub fn remove_translation(
        &mut self,
        kind: InteractionEventKind,
        modifiers: Modifiers,
    ) -> Option<WidgetEvent> {
        self.translations.remove(&(Self::normalize(kind), modifiers))
    }

    /// Übersetzt ein Eingabe-Ereignis.
    ///
    /// Mausbewegung, Loslassen und `Leave` gelten unabhängig von den Modifiern;
    /// ohne exakten Eintrag wird dort auf die Zuordnung ohne Modifier
    /// zurückgegriffen.
    pub fn translate(&self, event: &InteractionEvent) -> Option<WidgetEvent> {
        let kind = Self::normalize(event.kind);
        if let Some(found) = self.translations.get(&(kind, event.modifiers)) {
            return Some(*found);
        }
        let ignores_modifiers = matches!(
            kind,
            InteractionEventKind::MouseMove
                | InteractionEventKind::ButtonRelease(_)
                | InteractionEventKind::Leave
        );
        if ignores_modifiers && !event.modifiers.is_empty() {
            return self.translations.get(&(kind, Modifiers::NONE)).copied();
        }
        None
    }

    fn normalize(kind: InteractionEventKind) -> InteractionEventKind {
        match kind {
            InteractionEventKind::KeyPress(key) => InteractionEventKind::KeyPress(key.normalized()),
            other => other,
        }
    }
}

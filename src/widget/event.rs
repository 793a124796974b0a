//! Eingabe-Ereignisse aus der Ansicht (Maus, Tastatur, Fokus).

use glam::{DVec2, DVec3};

/// Maustaste.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
}

/// Gedrückte Modifier-Tasten.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
    };
    pub const ALT: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: true,
    };

    /// Gibt `true` zurück, wenn kein Modifier gedrückt ist.
    pub fn is_empty(self) -> bool {
        self == Self::NONE
    }
}

/// Taste eines KeyPress-Ereignisses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Delete,
    BackSpace,
    /// Zeichen-Taste (Kleinbuchstaben, siehe `Key::normalized`)
    Char(char),
}

impl Key {
    /// Zeichen-Tasten werden unabhängig von Shift als Kleinbuchstabe verglichen.
    pub fn normalized(self) -> Key {
        match self {
            Key::Char(c) => Key::Char(c.to_ascii_lowercase()),
            other => other,
        }
    }
}

/// Art eines Eingabe-Ereignisses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InteractionEventKind {
    MouseMove,
    ButtonPress(MouseButton),
    ButtonRelease(MouseButton),
    KeyPress(Key),
    /// Cursor verlässt die Ansicht bzw. Fokus-Verlust
    Leave,
}

/// Ein Eingabe-Ereignis mit Display-Position und optionaler Weltposition.
///
/// `world_position` wird gesetzt, wenn die Ansicht bereits einen Treffer
/// (z. B. auf einer Oberfläche) kennt; sonst rechnet das Widget selbst um.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionEvent {
    pub kind: InteractionEventKind,
    pub display_position: DVec2,
    pub modifiers: Modifiers,
    pub world_position: Option<DVec3>,
}

impl InteractionEvent {
    /// Erstellt ein Ereignis ohne Modifier und Weltposition.
    pub fn new(kind: InteractionEventKind, display_position: DVec2) -> Self {
        Self {
            kind,
            display_position,
            modifiers: Modifiers::NONE,
            world_position: None,
        }
    }

    pub fn mouse_move(display: DVec2) -> Self {
        Self::new(InteractionEventKind::MouseMove, display)
    }

    pub fn press(button: MouseButton, display: DVec2) -> Self {
        Self::new(InteractionEventKind::ButtonPress(button), display)
    }

    pub fn release(button: MouseButton, display: DVec2) -> Self {
        Self::new(InteractionEventKind::ButtonRelease(button), display)
    }

    /// Tastendruck an der letzten bekannten Cursor-Position.
    pub fn key(key: Key, display: DVec2) -> Self {
        Self::new(InteractionEventKind::KeyPress(key), display)
    }

    pub fn leave() -> Self {
        Self::new(InteractionEventKind::Leave, DVec2::ZERO)
    }

    /// Setzt die Modifier (Builder).
    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Setzt eine vorab bestimmte Weltposition (Builder).
    pub fn with_world(mut self, world: DVec3) -> Self {
        self.world_position = Some(world);
        self
    }
}

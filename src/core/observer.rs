//! Synchrone Änderungs-Benachrichtigungen eines Markups-Nodes.
//!
//! Beobachter werden über `ObserverRegistry::register` angemeldet und erhalten
//! ein `ObserverRegistration`-Handle. Wird das Handle gedroppt, ist der
//! Beobachter automatisch abgemeldet.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Callback-Schnittstelle für Node-Änderungen.
///
/// Alle Methoden sind No-ops per Default; Implementierungen überschreiben
/// nur, was sie interessiert. Aufrufe erfolgen synchron während der Mutation,
/// der Node selbst ist dabei noch ausgeliehen.
pub trait NodeObserver {
    /// Ein Kontrollpunkt wurde an `index` eingefügt.
    fn on_point_added(&self, _index: usize) {}

    /// Der Kontrollpunkt an `index` wurde entfernt.
    fn on_point_removed(&self, _index: usize) {}

    /// Position, Orientierung, Label oder Flags der Punkte haben sich geändert.
    fn on_points_modified(&self, _indices: &[usize]) {}

    /// Darstellungs-Eigenschaften (Farbe, Glyph, Sichtbarkeit) wurden geändert.
    fn on_display_properties_changed(&self) {}

    /// Sperr-Zustand des Nodes hat sich geändert.
    fn on_lock_changed(&self) {}

    /// Parent-Transformation hat sich geändert.
    fn on_transform_changed(&self) {}

    /// Alle Kontrollpunkte wurden entfernt.
    fn on_all_points_removed(&self) {}
}

/// Einzelnes Ereignis, wie es an Beobachter verteilt wird.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeEvent {
    PointAdded(usize),
    PointRemoved(usize),
    PointsModified(Vec<usize>),
    DisplayModified,
    LockModified,
    TransformModified,
    AllPointsRemoved,
}

impl NodeEvent {
    fn dispatch(&self, observer: &dyn NodeObserver) {
        match self {
            NodeEvent::PointAdded(index) => observer.on_point_added(*index),
            NodeEvent::PointRemoved(index) => observer.on_point_removed(*index),
            NodeEvent::PointsModified(indices) => observer.on_points_modified(indices),
            NodeEvent::DisplayModified => observer.on_display_properties_changed(),
            NodeEvent::LockModified => observer.on_lock_changed(),
            NodeEvent::TransformModified => observer.on_transform_changed(),
            NodeEvent::AllPointsRemoved => observer.on_all_points_removed(),
        }
    }
}

#[derive(Default)]
struct RegistryInner {
    next_id: u64,
    observers: Vec<(u64, Rc<dyn NodeObserver>)>,
}

/// Liste angemeldeter Beobachter eines Nodes.
#[derive(Default)]
pub struct ObserverRegistry {
    inner: Rc<RefCell<RegistryInner>>,
}

impl std::fmt::Debug for ObserverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistry")
            .field("observers", &self.len())
            .finish()
    }
}

impl ObserverRegistry {
    /// Meldet einen Beobachter an.
    pub fn register(&self, observer: Rc<dyn NodeObserver>) -> ObserverRegistration {
        let mut inner = self.inner.borrow_mut();
        let id = inner.next_id;
        inner.next_id += 1;
        inner.observers.push((id, observer));
        ObserverRegistration {
            id,
            registry: Rc::downgrade(&self.inner),
        }
    }

    /// Anzahl angemeldeter Beobachter.
    pub fn len(&self) -> usize {
        self.inner.borrow().observers.len()
    }

    /// Gibt `true` zurück, wenn niemand zuhört.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Verteilt ein Ereignis an alle Beobachter.
    ///
    /// Die Liste wird vorher kopiert, damit Beobachter sich während des
    /// Callbacks an- oder abmelden dürfen.
    pub fn notify(&self, event: &NodeEvent) {
        let observers: Vec<Rc<dyn NodeObserver>> = self
            .inner
            .borrow()
            .observers
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            event.dispatch(observer.as_ref());
        }
    }
}

/// RAII-Handle einer Beobachter-Anmeldung.
#[must_use = "Beobachter wird beim Drop des Handles sofort abgemeldet"]
pub struct ObserverRegistration {
    id: u64,
    registry: Weak<RefCell<RegistryInner>>,
}

impl std::fmt::Debug for ObserverRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObserverRegistration")
            .field("id", &self.id)
            .finish()
    }
}

impl ObserverRegistration {
    /// Prüft, ob der Node (bzw. seine Registry) noch existiert.
    pub fn is_active(&self) -> bool {
        self.registry
            .upgrade()
            .is_some_and(|inner| inner.borrow().observers.iter().any(|(id, _)| *id == self.id))
    }
}

impl Drop for ObserverRegistration {
    fn drop(&mut self) {
        if let Some(inner) = self.registry.upgrade() {
            inner
                .borrow_mut()
                .observers
                .retain(|(id, _)| *id != self.id);
        }
    }
}

//! Core-Domänentypen: Kontrollpunkte, Markups-Node, Beobachter, Undo-Verlauf.

pub mod control_point;
pub mod history;
pub mod markups_node;
pub mod observer;

pub use control_point::{orientation_from_matrix, ControlPoint};
pub use history::{NodeHistory, NodeSnapshot};
pub use markups_node::{DisplayNode, MarkupsKind, MarkupsNode};
pub use observer::{NodeEvent, NodeObserver, ObserverRegistration, ObserverRegistry};

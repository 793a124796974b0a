//! Undo/Redo-Verlauf eines Markups-Nodes per Snapshot.

use super::control_point::ControlPoint;

/// Standard-Tiefe des Verlaufs.
pub const DEFAULT_HISTORY_DEPTH: usize = 64;

/// Snapshot reduziert auf die für Undo/Redo relevanten Teile eines Nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeSnapshot {
    /// Kontrollpunkte inklusive Flags (Zwischenpunkte werden neu berechnet)
    pub points: Vec<ControlPoint>,
    /// Geschlossene Kurve
    pub closed_loop: bool,
    /// Node-Sperre
    pub locked: bool,
}

/// Einfacher Undo/Redo-Manager mit Snapshotting.
#[derive(Debug, Clone)]
pub struct NodeHistory {
    undo_stack: Vec<NodeSnapshot>,
    redo_stack: Vec<NodeSnapshot>,
    max_depth: usize,
}

impl Default for NodeHistory {
    fn default() -> Self {
        Self::new_with_capacity(DEFAULT_HISTORY_DEPTH)
    }
}

impl NodeHistory {
    /// Erstellt einen neuen History-Manager mit maximaler Tiefe.
    pub fn new_with_capacity(max_depth: usize) -> Self {
        Self {
            undo_stack: Vec::with_capacity(max_depth),
            redo_stack: Vec::with_capacity(max_depth),
            max_depth: max_depth.max(1),
        }
    }

    /// Nimmt einen Snapshot auf und verwirft den Redo-Stack.
    pub fn record_snapshot(&mut self, snap: NodeSnapshot) {
        if self.undo_stack.len() >= self.max_depth {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(snap);
        self.redo_stack.clear();
    }

    /// Prüft ob Undo möglich ist.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Prüft ob Redo möglich ist.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Holt den letzten Undo-Snapshot und legt `current` auf den Redo-Stack.
    pub fn pop_undo_with_current(&mut self, current: NodeSnapshot) -> Option<NodeSnapshot> {
        let prev = self.undo_stack.pop()?;
        if self.redo_stack.len() >= self.max_depth {
            self.redo_stack.remove(0);
        }
        self.redo_stack.push(current);
        Some(prev)
    }

    /// Holt den letzten Redo-Snapshot und legt `current` auf den Undo-Stack.
    pub fn pop_redo_with_current(&mut self, current: NodeSnapshot) -> Option<NodeSnapshot> {
        let next = self.redo_stack.pop()?;
        if self.undo_stack.len() >= self.max_depth {
            self.undo_stack.remove(0);
        }
        self.undo_stack.push(current);
        Some(next)
    }
}

//! Punkt-Locator (KD-Tree) über die Display-Positionen der Kontrollpunkte.
//!
//! Der Index wird lazy aufgebaut und verworfen, sobald sich der Node oder die
//! Projektion der Ansicht ändert.

use std::collections::HashMap;

use glam::DVec2;
use kiddo::{KdTree, SquaredEuclidean};

use crate::core::MarkupsNode;
use crate::view::View;

/// Treffer einer Locator-Abfrage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocatorMatch {
    /// Index des Kontrollpunkts im Node
    pub index: usize,
    /// Abstand in Pixeln
    pub distance: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct BuildKey {
    node_id: String,
    node_modified: u64,
    view_revision: u64,
}

/// KD-Tree über die sichtbaren Punkte eines Nodes in einer Ansicht.
#[derive(Debug, Clone)]
pub struct PointLocator {
    tree: KdTree<f64, 2>,
    /// Punkt-Indizes je Baumeintrag (gleiche Display-Position)
    buckets: Vec<Vec<usize>>,
    indexed: usize,
    built_for: Option<BuildKey>,
}

impl Default for PointLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl PointLocator {
    /// Erstellt einen leeren, ungebauten Locator.
    pub fn new() -> Self {
        Self {
            tree: (&Vec::<[f64; 2]>::new()).into(),
            buckets: Vec::new(),
            indexed: 0,
            built_for: None,
        }
    }

    /// Erzwingt einen Neuaufbau bei der nächsten Abfrage.
    pub fn invalidate(&mut self) {
        self.built_for = None;
    }

    /// Revision der Ansicht, für die der Index zuletzt gebaut wurde.
    pub fn built_view_revision(&self) -> Option<u64> {
        self.built_for.as_ref().map(|k| k.view_revision)
    }

    /// Muss der Index für `node` in `view` neu gebaut werden?
    pub fn is_stale(&self, node: &MarkupsNode, view: &View) -> bool {
        match &self.built_for {
            Some(key) => {
                key.node_id != node.id()
                    || key.node_modified != node.modified_time()
                    || key.view_revision != view.revision()
            }
            None => true,
        }
    }

    /// Baut den Index bei Bedarf neu. Gibt `true` zurück, wenn gebaut wurde.
    pub fn ensure_built(&mut self, node: &MarkupsNode, view: &View) -> bool {
        if !self.is_stale(node, view) {
            return false;
        }
        self.rebuild(node, view);
        true
    }

    /// Baut den Index aus allen sichtbaren Punkten innerhalb der Schicht-Toleranz.
    ///
    /// Punkte mit identischer Display-Position teilen sich einen Baumeintrag;
    /// Positionen außerhalb des endlichen Bereichs werden übersprungen.
    pub fn rebuild(&mut self, node: &MarkupsNode, view: &View) {
        let mapper = view.mapper();
        let mut buckets: Vec<Vec<usize>> = Vec::new();
        let mut entries: Vec<[f64; 2]> = Vec::with_capacity(node.len());
        let mut slots: HashMap<[u64; 2], usize> = HashMap::with_capacity(node.len());
        let mut indexed = 0;

        for (index, point) in node.control_points().iter().enumerate() {
            if !point.visible {
                continue;
            }
            let world = node.local_to_world(point.position);
            if !view.is_within_slice(world) {
                continue;
            }
            let display = mapper.world_to_display(world).truncate();
            if !display.is_finite() {
                continue;
            }
            // -0.0 und 0.0 gelten im Baum als gleich
            let key = [(display.x + 0.0).to_bits(), (display.y + 0.0).to_bits()];
            let slot = *slots.entry(key).or_insert_with(|| {
                entries.push([display.x, display.y]);
                buckets.push(Vec::new());
                buckets.len() - 1
            });
            buckets[slot].push(index);
            indexed += 1;
        }

        self.tree = (&entries).into();
        self.buckets = buckets;
        self.indexed = indexed;
        self.built_for = Some(BuildKey {
            node_id: node.id().to_string(),
            node_modified: node.modified_time(),
            view_revision: view.revision(),
        });
        log::debug!(
            "PointLocator: {} Punkte an {} Positionen indexiert (Node '{}', View '{}')",
            self.indexed,
            self.buckets.len(),
            node.id(),
            view.id()
        );
    }

    /// Anzahl indexierter Punkte.
    pub fn len(&self) -> usize {
        self.indexed
    }

    /// Gibt `true` zurück, wenn keine Punkte indexiert sind.
    pub fn is_empty(&self) -> bool {
        self.indexed == 0
    }

    /// Nächster Punkt innerhalb von `radius` Pixeln um `display`.
    pub fn find_nearest_within(&self, display: DVec2, radius: f64) -> Option<LocatorMatch> {
        if self.is_empty() || radius.is_sign_negative() {
            return None;
        }
        let result = self
            .tree
            .nearest_one::<SquaredEuclidean>(&[display.x, display.y]);
        if result.distance > radius * radius {
            return None;
        }
        let index = *self.buckets.get(result.item as usize)?.first()?;
        Some(LocatorMatch {
            index,
            distance: result.distance.sqrt(),
        })
    }

    /// Alle Punkte innerhalb von `radius` Pixeln, nach Abstand sortiert.
    pub fn within_radius(&self, display: DVec2, radius: f64) -> Vec<LocatorMatch> {
        if self.is_empty() || radius.is_sign_negative() {
            return Vec::new();
        }
        let mut matches = self
            .tree
            .within::<SquaredEuclidean>(&[display.x, display.y], radius * radius)
            .into_iter()
            .flat_map(|entry| {
                let distance = entry.distance.sqrt();
                self.buckets
                    .get(entry.item as usize)
                    .into_iter()
                    .flatten()
                    .map(move |&index| LocatorMatch { index, distance })
            })
            .collect::<Vec<_>>();

        matches.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.index.cmp(&b.index)));
        matches
    }
}

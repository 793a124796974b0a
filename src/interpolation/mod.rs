//! Austauschbare Linien-Interpolation zwischen benachbarten Kontrollpunkten.
//!
//! Jede Strategie implementiert den `LineInterpolator`-Trait und schreibt ihre
//! Stützpunkte in `ControlPoint::intermediate_positions` des ersten Punkts
//! eines Segments. Welche Segmente nach einer Punkt-Änderung neu berechnet
//! werden müssen, liefert `LineInterpolator::span`.
//!
//! Aufgeteilt in:
//! - `linear` — Endpunkt-Kopien, keine Unterteilung
//! - `bezier` — kubische Bézier-Approximation mit adaptiver Unterteilung

pub mod bezier;
pub mod linear;

pub use bezier::{BezierInterpolator, BezierSegment};
pub use linear::LinearInterpolator;

use crate::core::ControlPoint;
use crate::shared::MarkupsOptions;

/// Schnittstelle aller Linien-Interpolatoren.
pub trait LineInterpolator: std::fmt::Debug {
    /// Art des Interpolators (für Logging und Konfiguration)
    fn kind(&self) -> InterpolatorKind;

    /// Füllt die Zwischenpunkte des Segments `idx1 → idx2`.
    ///
    /// `idx2` ist der Nachfolger von `idx1` (bei geschlossener Kurve ggf. 0).
    /// Bestehende Zwischenpunkte werden nicht gelöscht, das übernimmt der
    /// Aufrufer. Gibt `false` bei ungültigen Indizes zurück.
    fn interpolate_line(
        &self,
        points: &mut [ControlPoint],
        closed_loop: bool,
        idx1: usize,
        idx2: usize,
    ) -> bool;

    /// Segment-Paare, die von einer Änderung an `node_index` betroffen sind.
    fn span(&self, node_index: usize, closed_loop: bool, count: usize) -> Vec<(usize, usize)> {
        span_pairs(node_index as isize - 1, 3, closed_loop, count)
    }
}

/// Verfügbare Interpolations-Strategien.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolatorKind {
    /// Gerade Verbindung
    #[default]
    Linear,
    /// Geglättete kubische Bézier-Kurve
    Bezier,
}

impl InterpolatorKind {
    /// Erstellt die passende Strategie mit den Grenzwerten aus `options`.
    pub fn create(self, options: &MarkupsOptions) -> Box<dyn LineInterpolator> {
        match self {
            InterpolatorKind::Linear => Box::new(LinearInterpolator),
            InterpolatorKind::Bezier => Box::new(BezierInterpolator::new(
                options.maximum_curve_error,
                options.maximum_curve_line_segments,
            )),
        }
    }
}

/// Erzeugt `pairs` aufeinanderfolgende Index-Paare ab `(start, start + 1)`.
///
/// Bei geschlossener Kurve wird jeder Index einmal um `count` verschoben;
/// Paare mit Indizes außerhalb von `0..count` entfallen.
pub(crate) fn span_pairs(
    start: isize,
    pairs: usize,
    closed_loop: bool,
    count: usize,
) -> Vec<(usize, usize)> {
    let n = count as isize;
    let wrap = |mut index: isize| {
        if closed_loop {
            if index < 0 {
                index += n;
            } else if index >= n {
                index -= n;
            }
        }
        index
    };

    (0..pairs as isize)
        .filter_map(|offset| {
            let first = wrap(start + offset);
            let second = wrap(start + offset + 1);
            let valid = |i: isize| i >= 0 && i < n;
            (valid(first) && valid(second)).then_some((first as usize, second as usize))
        })
        .collect()
}

/// Prüft die gemeinsamen Vorbedingungen eines Segments.
pub(crate) fn segment_is_valid(points: &[ControlPoint], idx1: usize, idx2: usize) -> bool {
    if points.len() < 2 || idx1 >= points.len() || idx2 >= points.len() {
        log::warn!(
            "Interpolation: Segment ({}, {}) ungültig bei {} Punkten",
            idx1,
            idx2,
            points.len()
        );
        return false;
    }
    true
}

//! Kubische Bézier-Interpolation mit adaptiver de-Casteljau-Unterteilung.
//!
//! Die Steuerpunkte eines Segments werden aus den Knoten-Tangenten abgeleitet:
//! `P2 = P1 + 0.333·d·s1`, `P3 = P4 − 0.333·d·s2` mit `d = |P1P4|`.
//! Die Unterteilung läuft iterativ über eine Arbeitsliste, deren Tiefe durch
//! `maximum_curve_line_segments` begrenzt ist.

use glam::DVec3;

use super::{span_pairs, segment_is_valid, InterpolatorKind, LineInterpolator};
use crate::core::ControlPoint;
use crate::shared::{MAXIMUM_CURVE_ERROR, MAXIMUM_CURVE_LINE_SEGMENTS};

/// Anteil der Sehnenlänge, mit dem die Tangenten die inneren Steuerpunkte setzen.
const HANDLE_FRACTION: f64 = 0.333;

/// Ein Eintrag der Unterteilungs-Arbeitsliste.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierSegment {
    /// Unterteilungstiefe (0 = Ausgangssegment)
    pub level: u32,
    pub p1: DVec3,
    pub p2: DVec3,
    pub p3: DVec3,
    pub p4: DVec3,
}

impl BezierSegment {
    /// Direkte Distanz `|P1P4|`.
    pub fn chord_length(&self) -> f64 {
        self.p1.distance(self.p4)
    }

    /// Länge des Kontrollpolygons `|P1P2| + |P2P3| + |P3P4|`.
    pub fn polygon_length(&self) -> f64 {
        self.p1.distance(self.p2) + self.p2.distance(self.p3) + self.p3.distance(self.p4)
    }

    /// Teilt das Segment bei t = 0.5 in (linke Hälfte, rechte Hälfte).
    pub fn split(&self) -> (BezierSegment, BezierSegment) {
        let p12 = self.p1.midpoint(self.p2);
        let p23 = self.p2.midpoint(self.p3);
        let p34 = self.p3.midpoint(self.p4);
        let p123 = p12.midpoint(p23);
        let p234 = p23.midpoint(p34);
        let p1234 = p123.midpoint(p234);
        let level = self.level + 1;
        (
            BezierSegment {
                level,
                p1: self.p1,
                p2: p12,
                p3: p123,
                p4: p1234,
            },
            BezierSegment {
                level,
                p1: p1234,
                p2: p234,
                p3: p34,
                p4: self.p4,
            },
        )
    }
}

/// Bézier-Strategie mit konfigurierbarem Fehler- und Segment-Limit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BezierInterpolator {
    /// Abbruch, sobald `(Polygon − Sehne) / Sehne` darunter liegt
    pub maximum_curve_error: f64,
    /// Obergrenze der Liniensegmente pro Kurvenabschnitt
    pub maximum_curve_line_segments: usize,
}

impl Default for BezierInterpolator {
    fn default() -> Self {
        Self::new(MAXIMUM_CURVE_ERROR, MAXIMUM_CURVE_LINE_SEGMENTS)
    }
}

impl BezierInterpolator {
    /// Erstellt einen Interpolator mit den gegebenen Grenzwerten.
    pub fn new(maximum_curve_error: f64, maximum_curve_line_segments: usize) -> Self {
        Self {
            maximum_curve_error,
            maximum_curve_line_segments,
        }
    }

    /// Maximale Unterteilungstiefe: größte Tiefe mit `3 · 2^tiefe <= Limit`.
    ///
    /// Liefert 0 für Limits unter 6; dann erzeugt die Interpolation keine Punkte.
    pub fn max_recursion(&self) -> u32 {
        let mut depth = 0;
        let mut segments = 3usize;
        while 2 * segments < self.maximum_curve_line_segments {
            segments *= 2;
            depth += 1;
        }
        depth
    }

    /// Normierte Tangente an Knoten `n`.
    ///
    /// Offene Kurve: am Anfang Richtung 0→1, am Ende Richtung (n−1)→n.
    /// Sonst Richtung Vorgänger→Nachfolger (mit Umlauf). Fallen beide Nachbarn
    /// zusammen, ist die Tangente der Nullvektor.
    pub fn node_slope(points: &[ControlPoint], closed_loop: bool, n: usize) -> Option<DVec3> {
        let count = points.len();
        if n >= count || count < 2 {
            return None;
        }
        let (from, to) = if n == 0 && !closed_loop {
            (0, 1)
        } else if n == count - 1 && !closed_loop {
            (count - 2, count - 1)
        } else {
            ((n + count - 1) % count, (n + 1) % count)
        };
        Some((points[to].position - points[from].position).normalize_or_zero())
    }

    /// Unterteilt `initial` und ruft `on_leaf` für jedes akzeptierte Segment auf.
    ///
    /// Der zweite Parameter ist `true` für das letzte Segment der Kurve.
    pub fn subdivide(&self, initial: BezierSegment, mut on_leaf: impl FnMut(&BezierSegment, bool)) {
        let max_recursion = self.max_recursion();
        let mut worklist: Vec<BezierSegment> = Vec::with_capacity(max_recursion as usize + 1);
        worklist.push(initial);

        while let Some(top) = worklist.last_mut() {
            let segment = *top;
            let chord = segment.chord_length();
            let accepted = segment.level >= max_recursion
                || chord == 0.0
                || (segment.polygon_length() - chord) / chord < self.maximum_curve_error;

            if accepted {
                let is_last = worklist.len() == 1;
                on_leaf(&segment, is_last);
                worklist.pop();
            } else {
                let (left, right) = segment.split();
                *top = right;
                worklist.push(left);
            }
        }
    }
}

impl LineInterpolator for BezierInterpolator {
    fn kind(&self) -> InterpolatorKind {
        InterpolatorKind::Bezier
    }

    fn interpolate_line(
        &self,
        points: &mut [ControlPoint],
        closed_loop: bool,
        idx1: usize,
        idx2: usize,
    ) -> bool {
        if !segment_is_valid(points, idx1, idx2) {
            return false;
        }
        if self.max_recursion() == 0 {
            return true;
        }

        let slope1 = Self::node_slope(points, closed_loop, idx1).unwrap_or(DVec3::X);
        let slope2 = Self::node_slope(points, closed_loop, idx2).unwrap_or(DVec3::X);
        let p1 = points[idx1].position;
        let p4 = points[idx2].position;
        let distance = p1.distance(p4);
        let initial = BezierSegment {
            level: 0,
            p1,
            p2: p1 + HANDLE_FRACTION * distance * slope1,
            p3: p4 - HANDLE_FRACTION * distance * slope2,
            p4,
        };

        let mut samples = Vec::new();
        self.subdivide(initial, |leaf, is_last| {
            samples.push(leaf.p2);
            samples.push(leaf.p3);
            if !is_last {
                samples.push(leaf.p4);
            }
        });
        points[idx1].intermediate_positions.extend(samples);
        true
    }

    fn span(&self, node_index: usize, closed_loop: bool, count: usize) -> Vec<(usize, usize)> {
        span_pairs(node_index as isize - 2, 4, closed_loop, count)
    }
}

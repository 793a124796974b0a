//! Lineare Interpolation: das Segment bleibt eine gerade Strecke.

use super::{segment_is_valid, InterpolatorKind, LineInterpolator};
use crate::core::ControlPoint;

/// Markiert ein Segment als aufgelöst, indem beide Endpunkte in die
/// Zwischenpunkt-Liste des ersten Punkts kopiert werden.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearInterpolator;

impl LineInterpolator for LinearInterpolator {
    fn kind(&self) -> InterpolatorKind {
        InterpolatorKind::Linear
    }

    fn interpolate_line(
        &self,
        points: &mut [ControlPoint],
        _closed_loop: bool,
        idx1: usize,
        idx2: usize,
    ) -> bool {
        if !segment_is_valid(points, idx1, idx2) {
            return false;
        }
        let start = points[idx1].position;
        let end = points[idx2].position;
        let target = &mut points[idx1].intermediate_positions;
        target.push(start);
        target.push(end);
        true
    }
}

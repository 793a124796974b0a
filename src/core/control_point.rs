//! Einzelner Kontrollpunkt eines Markups.

use glam::{DMat3, DQuat, DVec3};
use serde::{Deserialize, Serialize};

/// Vom Benutzer platzierter Ankerpunkt einer Kurve.
///
/// Alle Positionen liegen im lokalen Koordinatensystem des Nodes
/// (vor Anwendung der Parent-Transformation).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPoint {
    /// Position im lokalen Koordinatensystem
    pub position: DVec3,
    /// Orientierung des Punkt-Frames (Einheitsquaternion)
    pub orientation: DQuat,
    /// Interpolierte Zwischenpunkte bis zum Nachfolger
    pub intermediate_positions: Vec<DVec3>,
    /// Sichtbarkeit (steuert Picking und Darstellung)
    pub visible: bool,
    /// Selektionsmarkierung
    pub selected: bool,
    /// Gesperrt: interaktive Verschiebung nicht erlaubt
    pub locked: bool,
    /// Anzeigetext neben dem Punkt
    pub label: String,
}

impl ControlPoint {
    /// Erstellt einen sichtbaren, nicht gesperrten Punkt an `position`.
    pub fn new(position: DVec3) -> Self {
        Self {
            position,
            orientation: DQuat::IDENTITY,
            intermediate_positions: Vec::new(),
            visible: true,
            selected: false,
            locked: false,
            label: String::new(),
        }
    }

    /// Setzt die Orientierung aus einer 3×3-Rotationsmatrix.
    ///
    /// Nicht-orthonormale Matrizen (z.B. aus gescherten Transforms) werden
    /// vorher per Gram-Schmidt orthonormalisiert.
    pub fn set_orientation_matrix(&mut self, matrix: DMat3) {
        self.orientation = orientation_from_matrix(matrix);
    }

    /// Gibt die Orientierung als 3×3-Matrix zurück.
    pub fn orientation_matrix(&self) -> DMat3 {
        DMat3::from_quat(self.orientation)
    }

    /// Entfernt alle Zwischenpunkte.
    pub fn clear_intermediate_positions(&mut self) {
        self.intermediate_positions.clear();
    }
}

/// Wandelt eine (ggf. leicht verzerrte) Orientierungsmatrix in ein Einheitsquaternion.
pub fn orientation_from_matrix(matrix: DMat3) -> DQuat {
    let x = matrix.x_axis.normalize_or_zero();
    let y = (matrix.y_axis - x * x.dot(matrix.y_axis)).normalize_or_zero();
    if x == DVec3::ZERO || y == DVec3::ZERO {
        return DQuat::IDENTITY;
    }
    let z = x.cross(y);
    // Linkshändige Eingabe: Y spiegeln, damit Z zur Eingabe passt
    let frame = if z.dot(matrix.z_axis) < 0.0 {
        DMat3::from_cols(x, -y, -z)
    } else {
        DMat3::from_cols(x, y, z)
    };
    DQuat::from_mat3(&frame).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn identity_matrix_gives_identity_quaternion() {
        let q = orientation_from_matrix(DMat3::IDENTITY);
        assert_relative_eq!(q.w, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn rotation_matrix_roundtrips() {
        let rot = DMat3::from_rotation_z(0.7);
        let mut point = ControlPoint::new(DVec3::ZERO);
        point.set_orientation_matrix(rot);
        let back = point.orientation_matrix();
        assert_relative_eq!(back.x_axis.x, rot.x_axis.x, epsilon = 1e-9);
        assert_relative_eq!(back.x_axis.y, rot.x_axis.y, epsilon = 1e-9);
        assert_relative_eq!(back.y_axis.x, rot.y_axis.x, epsilon = 1e-9);
    }

    #[test]
    fn scaled_matrix_is_normalized() {
        let q = orientation_from_matrix(DMat3::from_diagonal(DVec3::new(2.0, 3.0, 4.0)));
        assert_relative_eq!(q.length(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(q.w, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_matrix_falls_back_to_identity() {
        let q = orientation_from_matrix(DMat3::ZERO);
        assert_eq!(q, DQuat::IDENTITY);
    }
}

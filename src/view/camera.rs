//! Perspektivische 3D-Kamera.

use glam::{DMat4, DVec3};

/// Kamera einer 3D-Ansicht (rechtshändig, OpenGL-Tiefenbereich).
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    /// Augpunkt in Welt-Koordinaten
    pub position: DVec3,
    /// Blickziel; seine Tiefe definiert die Fokal-Ebene
    pub focal_point: DVec3,
    /// Oben-Richtung der Ansicht
    pub view_up: DVec3,
    /// Vertikaler Öffnungswinkel in Grad
    pub view_angle_deg: f64,
    /// Near/Far-Clipping in Welteinheiten
    pub clipping_range: [f64; 2],
}

impl Camera {
    /// Standard-Öffnungswinkel in Grad.
    pub const DEFAULT_VIEW_ANGLE: f64 = 30.0;
    /// Standard-Clipping (near, far).
    pub const DEFAULT_CLIPPING_RANGE: [f64; 2] = [0.1, 10_000.0];

    /// Erstellt eine Kamera mit Standard-Öffnungswinkel und Clipping.
    pub fn new(position: DVec3, focal_point: DVec3, view_up: DVec3) -> Self {
        Self {
            position,
            focal_point,
            view_up,
            view_angle_deg: Self::DEFAULT_VIEW_ANGLE,
            clipping_range: Self::DEFAULT_CLIPPING_RANGE,
        }
    }

    /// Kamera auf der +Z-Achse im Abstand `distance`, Blick auf `target`.
    pub fn looking_at(target: DVec3, distance: f64) -> Self {
        Self::new(target + DVec3::Z * distance, target, DVec3::Y)
    }

    /// Abstand Augpunkt → Fokalpunkt.
    pub fn distance(&self) -> f64 {
        self.position.distance(self.focal_point)
    }

    /// Blickrichtung (Augpunkt → Fokalpunkt), normiert.
    pub fn direction_of_projection(&self) -> DVec3 {
        (self.focal_point - self.position).normalize_or_zero()
    }

    /// Normale der Bildebene (zeigt zur Kamera).
    pub fn view_plane_normal(&self) -> DVec3 {
        -self.direction_of_projection()
    }

    /// Welt → Kamera.
    pub fn view_matrix(&self) -> DMat4 {
        DMat4::look_at_rh(self.position, self.focal_point, self.view_up)
    }

    /// Kamera → Clip-Space (NDC-Tiefe −1..1).
    pub fn projection_matrix(&self, aspect: f64) -> DMat4 {
        let [near, far] = self.clipping_range;
        DMat4::perspective_rh_gl(self.view_angle_deg.to_radians(), aspect, near, far)
    }

    /// Zusammengesetzte Welt → NDC-Matrix.
    pub fn composite_matrix(&self, aspect: f64) -> DMat4 {
        self.projection_matrix(aspect) * self.view_matrix()
    }

    /// Verschiebt Augpunkt und Fokalpunkt gemeinsam.
    pub fn pan(&mut self, delta: DVec3) {
        self.position += delta;
        self.focal_point += delta;
    }

    /// Verändert den Abstand zum Fokalpunkt (`factor > 1` zoomt heran).
    pub fn dolly(&mut self, factor: f64) {
        if factor <= 0.0 {
            return;
        }
        let offset = self.position - self.focal_point;
        self.position = self.focal_point + offset / factor;
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::looking_at(DVec3::ZERO, 500.0)
    }
}

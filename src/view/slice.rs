//! 2D-Schichtansicht mit optionalem Lightbox-Raster.
//!
//! `xy_to_ras` bildet Kachel-lokale Pixelkoordinaten `(x, y, k)` auf
//! Weltkoordinaten ab. `k` zählt Schichten; im Lightbox-Modus ist `k` der
//! Kachel-Index (links nach rechts, oben nach unten).

use glam::{DMat4, DVec3, Vec4Swizzles};

/// Raster der Lightbox-Kacheln.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightboxLayout {
    pub rows: u32,
    pub columns: u32,
}

impl Default for LightboxLayout {
    fn default() -> Self {
        Self {
            rows: 1,
            columns: 1,
        }
    }
}

impl LightboxLayout {
    /// Erstellt ein Raster; 0 wird auf 1 angehoben.
    pub fn new(rows: u32, columns: u32) -> Self {
        Self {
            rows: rows.max(1),
            columns: columns.max(1),
        }
    }

    /// Mehr als eine Kachel?
    pub fn is_active(&self) -> bool {
        self.tile_count() > 1
    }

    /// Gesamtzahl der Kacheln.
    pub fn tile_count(&self) -> u32 {
        self.rows.max(1) * self.columns.max(1)
    }
}

/// Geometrie einer Schichtansicht.
#[derive(Debug, Clone, PartialEq)]
pub struct SliceView {
    xy_to_ras: DMat4,
    ras_to_xy: DMat4,
    /// Anzahl gleichzeitig dargestellter Schichten (Slab-Dicke)
    pub slice_count: u32,
    /// Lightbox-Raster (1×1 = normaler Modus)
    pub lightbox: LightboxLayout,
}

impl SliceView {
    /// Erstellt eine Schichtansicht; `None` wenn `xy_to_ras` nicht invertierbar ist.
    pub fn from_xy_to_ras(xy_to_ras: DMat4) -> Option<Self> {
        let det = xy_to_ras.determinant();
        if !det.is_finite() || det.abs() < f64::EPSILON {
            log::warn!("SliceView: XY→RAS nicht invertierbar (det={})", det);
            return None;
        }
        Some(Self {
            xy_to_ras,
            ras_to_xy: xy_to_ras.inverse(),
            slice_count: 1,
            lightbox: LightboxLayout::default(),
        })
    }

    /// Axiale Schicht: Pixel `(0,0)` liegt bei `origin`, `k` läuft entlang +Z.
    pub fn axial(origin: DVec3, pixel_spacing: f64, slice_spacing: f64) -> Self {
        let xy_to_ras = DMat4::from_translation(origin)
            * DMat4::from_scale(DVec3::new(pixel_spacing, pixel_spacing, slice_spacing));
        Self {
            xy_to_ras,
            ras_to_xy: xy_to_ras.inverse(),
            slice_count: 1,
            lightbox: LightboxLayout::default(),
        }
    }

    /// Setzt das Lightbox-Raster (Builder).
    pub fn with_lightbox(mut self, layout: LightboxLayout) -> Self {
        self.lightbox = layout;
        self
    }

    /// XY → RAS-Matrix.
    pub fn xy_to_ras(&self) -> DMat4 {
        self.xy_to_ras
    }

    /// RAS → XY-Matrix.
    pub fn ras_to_xy(&self) -> DMat4 {
        self.ras_to_xy
    }

    /// Weltposition → Kachel-lokale XY-Koordinaten.
    pub fn world_to_xy(&self, world: DVec3) -> DVec3 {
        self.ras_to_xy.transform_point3(world)
    }

    /// Kachel-lokale XY-Koordinaten → Weltposition.
    pub fn xy_to_world(&self, xy: DVec3) -> DVec3 {
        self.xy_to_ras.transform_point3(xy)
    }

    /// Normale der Schichtebene.
    pub fn normal(&self) -> DVec3 {
        self.xy_to_ras.z_axis.xyz().normalize_or_zero()
    }

    /// Ursprung der Schicht 0 in Weltkoordinaten.
    pub fn plane_origin(&self) -> DVec3 {
        self.xy_to_ras.w_axis.xyz()
    }

    /// Welteinheiten pro Pixel entlang der X-Achse.
    pub fn pixel_spacing(&self) -> f64 {
        self.xy_to_ras.x_axis.xyz().length()
    }

    /// Lightbox-Kachel, in die `world` fällt (ungerundeter Schichtindex gerundet).
    pub fn lightbox_index(&self, world: DVec3) -> i64 {
        self.world_to_xy(world).z.round() as i64
    }
}

//! Vorberechnete Welt ↔ Display-Abbildung einer Ansicht.
//!
//! Display-Koordinaten: Pixel mit Ursprung unten links, `z` ist in 3D die
//! normierte Tiefe 0..1 und in 2D der Abstand zur eigenen Schicht in
//! Schichteinheiten.

use glam::{DMat4, DVec2, DVec3};

use super::slice::LightboxLayout;

/// Momentaufnahme der Projektion; günstig zu kopieren.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DisplayMapper {
    /// Perspektivische 3D-Projektion
    Perspective {
        composite: DMat4,
        inverse: DMat4,
        size: DVec2,
    },
    /// Schichtansicht, ggf. als Lightbox-Raster
    Slice {
        xy_to_ras: DMat4,
        ras_to_xy: DMat4,
        tile: DVec2,
        layout: LightboxLayout,
    },
}

impl DisplayMapper {
    /// Welt → Display.
    pub fn world_to_display(&self, world: DVec3) -> DVec3 {
        match *self {
            DisplayMapper::Perspective {
                composite, size, ..
            } => {
                let ndc = composite.project_point3(world);
                DVec3::new(
                    (ndc.x + 1.0) * 0.5 * size.x,
                    (ndc.y + 1.0) * 0.5 * size.y,
                    (ndc.z + 1.0) * 0.5,
                )
            }
            DisplayMapper::Slice {
                ras_to_xy,
                tile,
                layout,
                ..
            } => {
                let xy = ras_to_xy.transform_point3(world);
                if !layout.is_active() {
                    return xy;
                }
                let index = xy.z.round() as i64;
                let columns = layout.columns as i64;
                let rows = layout.rows as i64;
                let column = index.rem_euclid(columns);
                let row = index.div_euclid(columns);
                DVec3::new(
                    xy.x + column as f64 * tile.x,
                    xy.y + (rows - 1 - row) as f64 * tile.y,
                    xy.z - index as f64,
                )
            }
        }
    }

    /// Display (mit Tiefe) → Welt.
    pub fn display_to_world(&self, display: DVec3) -> DVec3 {
        match *self {
            DisplayMapper::Perspective { inverse, size, .. } => {
                let ndc = DVec3::new(
                    2.0 * display.x / size.x - 1.0,
                    2.0 * display.y / size.y - 1.0,
                    2.0 * display.z - 1.0,
                );
                inverse.project_point3(ndc)
            }
            DisplayMapper::Slice {
                xy_to_ras,
                tile,
                layout,
                ..
            } => {
                if !layout.is_active() {
                    return xy_to_ras.transform_point3(display);
                }
                let max_column = layout.columns as i64 - 1;
                let max_row = layout.rows as i64 - 1;
                let column = ((display.x / tile.x).floor() as i64).clamp(0, max_column);
                let row_from_bottom = ((display.y / tile.y).floor() as i64).clamp(0, max_row);
                let row = max_row - row_from_bottom;
                let index = row * layout.columns as i64 + column;
                let xy = DVec3::new(
                    display.x - column as f64 * tile.x,
                    display.y - row_from_bottom as f64 * tile.y,
                    index as f64 + display.z,
                );
                xy_to_ras.transform_point3(xy)
            }
        }
    }
}

//! Ansichten und Koordinaten-Umrechnung Welt ↔ Display ↔ Viewport.
//!
//! Eine `View` ist entweder eine 2D-Schichtansicht oder eine perspektivische
//! 3D-Ansicht. Jede Änderung an Kamera, Schicht oder Viewport erhöht die
//! `revision`, damit abgeleitete Caches (Punkt-Locator, Linien) erkennen,
//! dass sie neu aufgebaut werden müssen.

pub mod camera;
pub mod mapper;
pub mod slice;

pub use camera::Camera;
pub use mapper::DisplayMapper;
pub use slice::{LightboxLayout, SliceView};

use std::sync::atomic::{AtomicU64, Ordering};

use glam::{DMat3, DVec2, DVec3};

static NEXT_REVISION: AtomicU64 = AtomicU64::new(1);

fn next_revision() -> u64 {
    NEXT_REVISION.fetch_add(1, Ordering::Relaxed)
}

// ── Typen ────────────────────────────────────────────────────────

/// Art der Ansicht.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewKind {
    Slice2D,
    View3D,
}

/// Pixelgröße der Ansicht.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Erstellt einen Viewport; Kantenlängen unter 1 px werden auf 1 angehoben.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width: width.max(1.0),
            height: height.max(1.0),
        }
    }

    /// Größe als Vektor.
    pub fn size(&self) -> DVec2 {
        DVec2::new(self.width, self.height)
    }

    /// Seitenverhältnis Breite/Höhe.
    pub fn aspect(&self) -> f64 {
        self.width / self.height
    }

    /// Diagonale in Pixeln.
    pub fn diagonal(&self) -> f64 {
        self.size().length()
    }
}

/// Projektion einer Ansicht.
#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Slice(SliceView),
    Perspective(Camera),
}

/// Liefert Oberflächen-Treffer für `display_to_world` in 3D-Ansichten.
pub trait SurfacePicker {
    /// Weltposition der sichtbaren Oberfläche unter `display`, falls vorhanden.
    fn pick(&self, display: DVec2) -> Option<DVec3>;
}

/// Eine Ansicht mit Projektion, Viewport und optionalem Oberflächen-Picker.
pub struct View {
    id: String,
    projection: Projection,
    viewport: Viewport,
    revision: u64,
    mapper: DisplayMapper,
    picker: Option<Box<dyn SurfacePicker>>,
}

impl std::fmt::Debug for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("View")
            .field("id", &self.id)
            .field("projection", &self.projection)
            .field("viewport", &self.viewport)
            .field("revision", &self.revision)
            .field("picker", &self.picker.is_some())
            .finish()
    }
}

// ── Vergleich ────────────────────────────────────────────────────

/// Haben sich zwei Display-Positionen merklich verändert?
///
/// XY-Abstand über `threshold_px`, im Lightbox-Modus zusätzlich ein
/// Tiefen-Sprung über eine Schicht.
pub fn display_positions_changed(a: DVec3, b: DVec3, threshold_px: f64, lightbox: bool) -> bool {
    if a.truncate().distance(b.truncate()) > threshold_px {
        return true;
    }
    lightbox && (a.z - b.z).abs() > 1.0
}

/// Haben sich zwei Weltpositionen verändert?
pub fn world_positions_changed(a: DVec3, b: DVec3) -> bool {
    a.distance(b) > f64::EPSILON
}

// ── View ─────────────────────────────────────────────────────────

impl View {
    fn with_projection(id: impl Into<String>, projection: Projection, viewport: Viewport) -> Self {
        let mapper = Self::build_mapper(&projection, viewport);
        Self {
            id: id.into(),
            projection,
            viewport,
            revision: next_revision(),
            mapper,
            picker: None,
        }
    }

    /// Erstellt eine perspektivische 3D-Ansicht.
    pub fn new_3d(id: impl Into<String>, camera: Camera, viewport: Viewport) -> Self {
        Self::with_projection(id, Projection::Perspective(camera), viewport)
    }

    /// Erstellt eine 2D-Schichtansicht.
    pub fn new_slice(id: impl Into<String>, slice: SliceView, viewport: Viewport) -> Self {
        Self::with_projection(id, Projection::Slice(slice), viewport)
    }

    fn build_mapper(projection: &Projection, viewport: Viewport) -> DisplayMapper {
        match projection {
            Projection::Perspective(camera) => {
                let composite = camera.composite_matrix(viewport.aspect());
                DisplayMapper::Perspective {
                    composite,
                    inverse: composite.inverse(),
                    size: viewport.size(),
                }
            }
            Projection::Slice(slice) => {
                let layout = slice.lightbox;
                DisplayMapper::Slice {
                    xy_to_ras: slice.xy_to_ras(),
                    ras_to_xy: slice.ras_to_xy(),
                    tile: DVec2::new(
                        viewport.width / layout.columns.max(1) as f64,
                        viewport.height / layout.rows.max(1) as f64,
                    ),
                    layout,
                }
            }
        }
    }

    fn touch(&mut self) {
        self.mapper = Self::build_mapper(&self.projection, self.viewport);
        self.revision = next_revision();
    }

    /// ID der Ansicht.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// 2D oder 3D.
    pub fn kind(&self) -> ViewKind {
        match self.projection {
            Projection::Slice(_) => ViewKind::Slice2D,
            Projection::Perspective(_) => ViewKind::View3D,
        }
    }

    /// Aktuelle Projektion.
    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    /// Kamera einer 3D-Ansicht.
    pub fn camera(&self) -> Option<&Camera> {
        match &self.projection {
            Projection::Perspective(camera) => Some(camera),
            Projection::Slice(_) => None,
        }
    }

    /// Schicht-Geometrie einer 2D-Ansicht.
    pub fn slice(&self) -> Option<&SliceView> {
        match &self.projection {
            Projection::Slice(slice) => Some(slice),
            Projection::Perspective(_) => None,
        }
    }

    /// Viewport in Pixeln.
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Revision; steigt bei jeder Änderung der Projektion.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Vorberechnete Abbildung für Massen-Umrechnungen.
    pub fn mapper(&self) -> DisplayMapper {
        self.mapper
    }

    /// Lightbox-Modus aktiv?
    pub fn is_lightbox(&self) -> bool {
        self.slice().is_some_and(|s| s.lightbox.is_active())
    }

    /// Ändert die Kamera einer 3D-Ansicht über eine Closure.
    pub fn update_camera(&mut self, apply: impl FnOnce(&mut Camera)) -> bool {
        let Projection::Perspective(camera) = &mut self.projection else {
            log::warn!("View '{}': keine 3D-Ansicht, Kamera unverändert", self.id);
            return false;
        };
        apply(camera);
        self.touch();
        true
    }

    /// Ändert die Schicht-Geometrie einer 2D-Ansicht über eine Closure.
    pub fn update_slice(&mut self, apply: impl FnOnce(&mut SliceView)) -> bool {
        let Projection::Slice(slice) = &mut self.projection else {
            log::warn!("View '{}': keine Schichtansicht, Schicht unverändert", self.id);
            return false;
        };
        apply(slice);
        self.touch();
        true
    }

    /// Setzt die Viewport-Größe.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
        self.touch();
    }

    /// Setzt oder entfernt den Oberflächen-Picker.
    pub fn set_surface_picker(&mut self, picker: Option<Box<dyn SurfacePicker>>) {
        self.picker = picker;
    }

    // ── Umrechnung ───────────────────────────────────────────────

    /// Welt → Display.
    pub fn world_to_display(&self, world: DVec3) -> DVec3 {
        self.mapper.world_to_display(world)
    }

    /// Display mit expliziter Tiefe → Welt.
    pub fn display_to_world_at_depth(&self, display: DVec3) -> DVec3 {
        self.mapper.display_to_world(display)
    }

    /// Display-Tiefe des Fokalpunkts (2D: Schicht-Ebene).
    pub fn focal_depth(&self) -> f64 {
        match &self.projection {
            Projection::Perspective(camera) => self.world_to_display(camera.focal_point).z,
            Projection::Slice(_) => 0.0,
        }
    }

    /// Oberflächen-Treffer unter `display` (nur 3D mit Picker).
    pub fn pick_surface(&self, display: DVec2) -> Option<DVec3> {
        if self.kind() != ViewKind::View3D {
            return None;
        }
        self.picker.as_ref().and_then(|p| p.pick(display))
    }

    /// Display → Welt: Oberflächen-Treffer, sonst Fokal-Ebene.
    pub fn display_to_world(&self, display: DVec2) -> DVec3 {
        self.pick_surface(display).unwrap_or_else(|| {
            self.display_to_world_at_depth(display.extend(self.focal_depth()))
        })
    }

    /// Zwei Weltpunkte auf dem Sichtstrahl durch `display` (Tiefe 0 und 1).
    pub fn pick_ray(&self, display: DVec2) -> (DVec3, DVec3) {
        (
            self.display_to_world_at_depth(display.extend(0.0)),
            self.display_to_world_at_depth(display.extend(1.0)),
        )
    }

    /// Display → normierte Viewport-Koordinaten.
    pub fn display_to_viewport(&self, display: DVec2) -> DVec2 {
        display / self.viewport.size()
    }

    /// Normierte Viewport-Koordinaten → Display.
    pub fn viewport_to_display(&self, normalized: DVec2) -> DVec2 {
        normalized * self.viewport.size()
    }

    /// Liegt `display` echt innerhalb des Viewports?
    pub fn is_display_in_viewport(&self, display: DVec2) -> bool {
        let n = self.display_to_viewport(display);
        n.x > 0.0 && n.x < 1.0 && n.y > 0.0 && n.y < 1.0
    }

    /// Klemmt `display` in den Viewport (Rand `margin`, normiert).
    ///
    /// Gibt die geklemmte Position und `true` zurück, falls geklemmt wurde.
    pub fn restrict_display_to_viewport(&self, display: DVec2, margin: f64) -> (DVec2, bool) {
        let normalized = self.display_to_viewport(display);
        let margin = margin.clamp(0.0, 0.5);
        let clamped = normalized.clamp(DVec2::splat(margin), DVec2::splat(1.0 - margin));
        if clamped == normalized {
            return (display, false);
        }
        (self.viewport_to_display(clamped), true)
    }

    /// Liegt `world` innerhalb der Schicht-Toleranz? 3D-Ansichten: immer.
    pub fn is_within_slice(&self, world: DVec3) -> bool {
        let Projection::Slice(slice) = &self.projection else {
            return true;
        };
        let display = self.world_to_display(world);
        if slice.lightbox.is_active() {
            let index = slice.lightbox_index(world);
            index >= 0
                && index < slice.lightbox.tile_count() as i64
                && display.z >= -0.5
                && display.z < 0.5
        } else {
            display.z >= -0.5 && display.z < 0.5 + (slice.slice_count.max(1) - 1) as f64
        }
    }

    /// Pixel pro Welteinheit.
    pub fn view_scale_factor(&self) -> f64 {
        match &self.projection {
            Projection::Slice(slice) => {
                let spacing = slice.pixel_spacing();
                if spacing > f64::EPSILON {
                    1.0 / spacing
                } else {
                    1.0
                }
            }
            Projection::Perspective(_) => {
                let DisplayMapper::Perspective {
                    composite, inverse, ..
                } = self.mapper
                else {
                    return 1.0;
                };
                let depth = self
                    .camera()
                    .map(|c| composite.project_point3(c.focal_point).z)
                    .unwrap_or(0.0);
                let lower = inverse.project_point3(DVec3::new(-1.0, -1.0, depth));
                let upper = inverse.project_point3(DVec3::new(1.0, 1.0, depth));
                let world_diagonal = lower.distance(upper);
                if world_diagonal > f64::EPSILON {
                    self.viewport.diagonal() / world_diagonal
                } else {
                    1.0
                }
            }
        }
    }

    /// Quadrierter Welt-Abstand, den `pixels` auf der Fokal-Ebene überspannen.
    pub fn world_tolerance_squared(&self, pixels: f64) -> f64 {
        let center = self.viewport.size() * 0.5;
        let depth = self.focal_depth();
        let a = self.display_to_world_at_depth(center.extend(depth));
        let b = self.display_to_world_at_depth((center + DVec2::new(pixels, 0.0)).extend(depth));
        a.distance_squared(b)
    }

    /// Normale der Bildebene (3D: zur Kamera, 2D: Schicht-Normale).
    pub fn view_plane_normal(&self) -> DVec3 {
        match &self.projection {
            Projection::Perspective(camera) => camera.view_plane_normal(),
            Projection::Slice(slice) => slice.normal(),
        }
    }

    /// Ausrichtung der Bildebene als Matrix (Spalten: rechts, oben, Normale).
    pub fn view_orientation(&self) -> DMat3 {
        match &self.projection {
            Projection::Perspective(camera) => {
                let normal = camera.view_plane_normal();
                let right = camera.view_up.cross(normal).normalize_or_zero();
                let up = normal.cross(right);
                DMat3::from_cols(right, up, normal)
            }
            Projection::Slice(slice) => {
                let m = slice.xy_to_ras();
                DMat3::from_cols(
                    m.x_axis.truncate().normalize_or_zero(),
                    m.y_axis.truncate().normalize_or_zero(),
                    slice.normal(),
                )
            }
        }
    }
}

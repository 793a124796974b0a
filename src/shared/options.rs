//! Zentrale Konfiguration für Markups-Widgets.
//!
//! `MarkupsOptions` enthält alle zur Laufzeit änderbaren Werte.
//! Die `const`-Werte bleiben als Fallback/Default erhalten.

use serde::{Deserialize, Serialize};

// ── Kontrollpunkte ──────────────────────────────────────────────────

/// Standard-Größe eines Kontrollpunkt-Handles in Welteinheiten.
pub const CONTROL_POINT_SIZE: f64 = 3.0;
/// Relativer Zuschlag auf die Handle-Größe für das Picking (0.4 = +40 %).
pub const PICK_TOLERANCE: f64 = 0.4;

// ── Kurveninterpolation ─────────────────────────────────────────────

/// Maximaler relativer Fehler (Polygonzug vs. Sehne) einer Bézier-Teilkurve.
pub const MAXIMUM_CURVE_ERROR: f64 = 0.005;
/// Obergrenze der Liniensegmente zwischen zwei Kontrollpunkten.
pub const MAXIMUM_CURVE_LINE_SEGMENTS: usize = 100;

// ── Koordinaten ─────────────────────────────────────────────────────

/// Ab dieser Display-Distanz (Pixel) gilt eine Position als verändert.
pub const DISPLAY_CHANGE_THRESHOLD_PX: f64 = 1.0;
/// Randabstand im normalisierten Viewport beim Einschränken von Drag-Positionen.
pub const VIEWPORT_MARGIN: f64 = 0.001;
/// Unterhalb dieser Distanz werden Skalierung und Rotation übersprungen.
pub const SCALE_EPSILON: f64 = 1e-7;

// ── Laufzeit-Optionen (serialisierbar) ─────────────────────────────

/// Alle zur Laufzeit änderbaren Widget-Optionen.
/// Wird als `markups-editor.toml` neben der Binary gespeichert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkupsOptions {
    // ── Picking ─────────────────────────────────────────────────
    /// Handle-Größe in Welteinheiten
    pub control_point_size: f64,
    /// Pick-Zuschlag relativ zur Handle-Größe
    pub tolerance: f64,

    // ── Interpolation ───────────────────────────────────────────
    /// Abbruchkriterium der Bézier-Unterteilung
    pub maximum_curve_error: f64,
    /// Segment-Obergrenze pro Kurvenabschnitt
    pub maximum_curve_line_segments: usize,

    // ── Platzierung ─────────────────────────────────────────────
    /// Vorschau-Punkt folgt beim Platzieren dem Mauszeiger
    pub follow_cursor: bool,
    /// Neu platzierte Punkte bis zum Ende der Platzierung sperren
    pub lock_while_placing: bool,

    // ── Koordinaten ─────────────────────────────────────────────
    /// Pixel-Schwelle für "Position hat sich geändert"
    pub display_change_threshold_px: f64,
    /// Randabstand im normalisierten Viewport
    pub viewport_margin: f64,
    /// Mindestdistanz für Skalierung/Rotation
    pub scale_epsilon: f64,
}

impl Default for MarkupsOptions {
    fn default() -> Self {
        Self {
            control_point_size: CONTROL_POINT_SIZE,
            tolerance: PICK_TOLERANCE,
            maximum_curve_error: MAXIMUM_CURVE_ERROR,
            maximum_curve_line_segments: MAXIMUM_CURVE_LINE_SEGMENTS,
            follow_cursor: true,
            lock_while_placing: false,
            display_change_threshold_px: DISPLAY_CHANGE_THRESHOLD_PX,
            viewport_margin: VIEWPORT_MARGIN,
            scale_epsilon: SCALE_EPSILON,
        }
    }
}

impl MarkupsOptions {
    /// Lädt Optionen aus einer TOML-Datei. Bei Fehler: Standardwerte.
    pub fn load_from_file(path: &std::path::Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(opts) => {
                    log::info!("Optionen geladen aus: {}", path.display());
                    opts
                }
                Err(e) => {
                    log::warn!("Optionen-Datei fehlerhaft, verwende Standardwerte: {}", e);
                    Self::default()
                }
            },
            Err(_) => {
                log::info!("Keine Optionen-Datei gefunden, verwende Standardwerte");
                Self::default()
            }
        }
    }

    /// Speichert Optionen als TOML-Datei.
    pub fn save_to_file(&self, path: &std::path::Path) -> anyhow::Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        log::info!("Optionen gespeichert nach: {}", path.display());
        Ok(())
    }

    /// Ermittelt den Pfad zur Optionen-Datei neben der Binary.
    pub fn config_path() -> std::path::PathBuf {
        std::env::current_exe()
            .unwrap_or_else(|_| std::path::PathBuf::from("markups-editor"))
            .parent()
            .unwrap_or_else(|| std::path::Path::new("."))
            .join("markups-editor.toml")
    }

    /// Basis-Pick-Radius ohne Zoom-Skalierung: `size · (1 + tolerance)`.
    pub fn pick_radius(&self) -> f64 {
        self.control_point_size * (1.0 + self.tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_constants() {
        let opts = MarkupsOptions::default();
        assert_eq!(opts.maximum_curve_line_segments, 100);
        assert!((opts.maximum_curve_error - 0.005).abs() < f64::EPSILON);
        assert!((opts.pick_radius() - 4.2).abs() < 1e-12);
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let opts: MarkupsOptions =
            toml::from_str("tolerance = 1.0\nfollow_cursor = false\n").expect("TOML gültig");
        assert!(!opts.follow_cursor);
        assert!((opts.tolerance - 1.0).abs() < f64::EPSILON);
        assert_eq!(opts.maximum_curve_line_segments, MAXIMUM_CURVE_LINE_SEGMENTS);
    }

    #[test]
    fn toml_roundtrip_preserves_values() {
        let mut opts = MarkupsOptions::default();
        opts.lock_while_placing = true;
        opts.control_point_size = 1.5;
        let text = toml::to_string_pretty(&opts).expect("Serialisierung");
        let back: MarkupsOptions = toml::from_str(&text).expect("Deserialisierung");
        assert_eq!(back, opts);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let path = std::path::Path::new("/nonexistent/markups-editor.toml");
        assert_eq!(MarkupsOptions::load_from_file(path), MarkupsOptions::default());
    }
}

//! Geteilte Konfiguration für alle Schichten (Interpolation, Repräsentation, Widget).

pub mod options;

pub use options::MarkupsOptions;
pub use options::{
    CONTROL_POINT_SIZE, MAXIMUM_CURVE_ERROR, MAXIMUM_CURVE_LINE_SEGMENTS, PICK_TOLERANCE,
    SCALE_EPSILON, VIEWPORT_MARGIN,
};

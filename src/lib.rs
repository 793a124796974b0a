//! Markups-Editor Library.
//! Kontrollpunkt-Editing und Kurveninterpolation für interaktive Markups-Widgets
//! in 2D-Schichtansichten und 3D-Ansichten.

pub mod core;
pub mod interpolation;
pub mod locator;
pub mod manager;
pub mod representation;
pub mod shared;
pub mod view;
pub mod widget;

pub use core::{
    ControlPoint, DisplayNode, MarkupsKind, MarkupsNode, NodeEvent, NodeObserver,
    ObserverRegistration,
};
pub use interpolation::{BezierInterpolator, InterpolatorKind, LineInterpolator, LinearInterpolator};
pub use locator::{LocatorMatch, PointLocator};
pub use manager::{DisplayableManager, WidgetSync};
pub use representation::{
    ActiveComponent, AxisRestriction, Interaction, Representation, RepresentationGeometry,
};
pub use shared::MarkupsOptions;
pub use view::{Camera, LightboxLayout, SliceView, SurfacePicker, View, ViewKind, Viewport};
pub use widget::{
    EventResult, EventTranslator, InteractionEvent, InteractionEventKind, Key, Modifiers,
    MouseButton, Widget, WidgetEvent, WidgetNotification, WidgetState,
};

pub mod geometry;
pub mod hierarchy;
pub mod id;
pub mod model;

pub use geometry::{OverlapPolicy, Viewport, fully_contains, normalize_rect, overlaps};
pub use id::ElementId;
pub use model::*;

// Re-export kurbo geometry so downstream crates share one Rect/Point type
pub use kurbo::{Point, Rect};

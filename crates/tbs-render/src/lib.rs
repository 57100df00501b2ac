pub mod hit;
pub mod paint;

pub use hit::{TouchTarget, classify};
pub use paint::{PaintOp, Painter, RecordingPainter, paint_changes};

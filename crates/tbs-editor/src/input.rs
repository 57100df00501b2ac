//! Touch input abstraction.
//!
//! The binding layer normalizes host touch events into [`TouchEvent`]s.
//! Positions are surface pixels relative to the editor surface; the target
//! is what the touch started on (touch events stay bound to their start
//! element for the whole gesture).

use smallvec::SmallVec;
use tbs_core::Point;

pub use tbs_render::TouchTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchPhase {
    Start,
    Move,
    End,
    Cancel,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TouchEvent {
    pub phase: TouchPhase,
    /// Host timestamp in milliseconds (monotonic).
    pub time_ms: u64,
    /// Active touch points. For `Start` and `End`, index 0 is the changed touch.
    pub touches: SmallVec<[Point; 2]>,
    pub target: TouchTarget,
}

impl TouchEvent {
    pub fn start(time_ms: u64, x: f64, y: f64, target: TouchTarget) -> Self {
        Self::single(TouchPhase::Start, time_ms, x, y, target)
    }

    pub fn moved(time_ms: u64, x: f64, y: f64) -> Self {
        Self::single(TouchPhase::Move, time_ms, x, y, TouchTarget::Other)
    }

    pub fn end(time_ms: u64, x: f64, y: f64) -> Self {
        Self::single(TouchPhase::End, time_ms, x, y, TouchTarget::Other)
    }

    pub fn cancel(time_ms: u64) -> Self {
        Self {
            phase: TouchPhase::Cancel,
            time_ms,
            touches: SmallVec::new(),
            target: TouchTarget::Other,
        }
    }

    /// Two-finger move: `primary` drags the far corner, `secondary` repositions the anchor.
    pub fn moved_pair(time_ms: u64, primary: Point, secondary: Point) -> Self {
        let mut touches = SmallVec::new();
        touches.push(primary);
        touches.push(secondary);
        Self {
            phase: TouchPhase::Move,
            time_ms,
            touches,
            target: TouchTarget::Other,
        }
    }

    fn single(phase: TouchPhase, time_ms: u64, x: f64, y: f64, target: TouchTarget) -> Self {
        let mut touches = SmallVec::new();
        touches.push(Point::new(x, y));
        Self {
            phase,
            time_ms,
            touches,
            target,
        }
    }

    /// Position of the primary touch.
    pub fn position(&self) -> Option<Point> {
        self.touches.first().copied()
    }
}

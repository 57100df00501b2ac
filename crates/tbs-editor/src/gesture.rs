//! Touch gesture state machine for batch selection.
//!
//! Touch screens have no held modifier key, so a quick double tap stands in
//! for it: the second tap arms multi-select, and what happens next depends
//! on what the touch started on.
//!
//! ```text
//! Idle ──double tap──▶ Armed ──background / frame interior──▶ Dragging ──release──▶ Idle
//!                        │
//!                        ├──block / frame / selected element──▶ PendingToggle ──release──▶ Idle
//!                        └──locked editor, other surface ─────────────────────(release)──▶ Idle
//! ```
//!
//! A release after at most `click_move_limit` moves is a tap: it toggles the
//! element the gesture started on. Anything longer is a drag: the last
//! rectangle is recomputed (the debouncer is flushed) and the rectangle is
//! torn down.

use crate::config::BatchSelectConfig;
use crate::debounce::Debouncer;
use crate::input::{TouchEvent, TouchPhase, TouchTarget};
use crate::rect_select::{self, ElementCache};
use crate::selection::{SelectionListener, SelectionSnapshot, SelectionStore};
use tbs_core::hierarchy::containing_frame;
use tbs_core::{ElementId, Mark, Point, Rect, Workspace, normalize_rect};
use tbs_render::paint::{Painter, RecordingPainter, paint_changes};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    /// Double tap recognized but inert until release (locked editor or a
    /// surface where selection does not start).
    Armed,
    /// A selection rectangle is being drawn.
    Dragging,
    /// Touch started on an element; tap vs. drag is decided on release.
    PendingToggle,
}

// ─── Double-tap detection ────────────────────────────────────────────────

/// Last tap time and position, for double-tap arming.
#[derive(Debug, Clone)]
pub struct TapTracker {
    last: Option<(u64, Point)>,
    window_ms: u64,
    tolerance: f64,
}

impl TapTracker {
    pub fn new(window_ms: u64, tolerance: f64) -> Self {
        Self {
            last: None,
            window_ms,
            tolerance,
        }
    }

    /// Register a tap. Returns `true` when it completes a double tap, in
    /// which case the tracker forgets both taps so a third tap starts over.
    pub fn register(&mut self, time_ms: u64, pos: Point) -> bool {
        let is_double = self.last.is_some_and(|(t, p)| {
            time_ms.saturating_sub(t) < self.window_ms
                && (pos.x - p.x).abs() < self.tolerance
                && (pos.y - p.y).abs() < self.tolerance
        });
        if is_double {
            self.last = None;
        } else {
            self.last = Some((time_ms, pos));
        }
        is_double
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

// ─── Session ─────────────────────────────────────────────────────────────

/// Per-gesture state. Reset between gestures so no cached element outlives
/// the gesture that captured it.
#[derive(Debug, Clone)]
struct GestureSession {
    phase: GesturePhase,
    target: TouchTarget,
    moves: u32,
    /// Rectangle anchor, surface pixels.
    anchor: Option<Point>,
    /// Drawn rectangle, surface pixels.
    rect: Option<Rect>,
    cache: ElementCache,
}

impl Default for GestureSession {
    fn default() -> Self {
        Self {
            phase: GesturePhase::Idle,
            target: TouchTarget::Other,
            moves: 0,
            anchor: None,
            rect: None,
            cache: ElementCache::default(),
        }
    }
}

impl GestureSession {
    fn reset(&mut self) {
        *self = Self::default();
    }
}

// ─── Engine ──────────────────────────────────────────────────────────────

/// Touch batch-select engine.
///
/// The editor scene is passed into every call; the engine only keeps the
/// selection, its annotations, and the current gesture.
pub struct BatchSelect<P: Painter = RecordingPainter> {
    config: BatchSelectConfig,
    store: SelectionStore,
    taps: TapTracker,
    session: GestureSession,
    /// Surface rectangles waiting for the inactivity delay.
    recompute: Debouncer<Rect>,
    painter: P,
}

impl Default for BatchSelect<RecordingPainter> {
    fn default() -> Self {
        Self::new(BatchSelectConfig::default(), RecordingPainter::default())
    }
}

impl<P: Painter> BatchSelect<P> {
    pub fn new(config: BatchSelectConfig, painter: P) -> Self {
        Self {
            taps: TapTracker::new(config.double_tap_window_ms, config.double_tap_tolerance),
            recompute: Debouncer::new(config.debounce_ms),
            store: SelectionStore::new(),
            session: GestureSession::default(),
            config,
            painter,
        }
    }

    /// Install the callback that receives every snapshot.
    pub fn on_selection_changed(&mut self, listener: SelectionListener) {
        self.store.set_listener(listener);
    }

    pub fn config(&self) -> &BatchSelectConfig {
        &self.config
    }

    pub fn snapshot(&self) -> &SelectionSnapshot {
        self.store.snapshot()
    }

    pub fn store(&self) -> &SelectionStore {
        &self.store
    }

    pub fn painter(&self) -> &P {
        &self.painter
    }

    pub fn phase(&self) -> GesturePhase {
        self.session.phase
    }

    /// Moves counted since the gesture was armed.
    pub fn move_count(&self) -> u32 {
        self.session.moves
    }

    /// The selection rectangle being drawn, in surface pixels.
    pub fn rect(&self) -> Option<Rect> {
        self.session.rect
    }

    /// When the next debounced recompute is due, for hosts driving [`tick`](Self::tick).
    pub fn next_deadline(&self) -> Option<u64> {
        self.recompute.deadline()
    }

    /// Handle one touch event. Returns `true` when the selection or the
    /// drawn rectangle changed.
    pub fn handle(&mut self, ws: &(impl Workspace + ?Sized), event: &TouchEvent) -> bool {
        if !self.config.enabled {
            return false;
        }
        let fired = self.tick(ws, event.time_ms);
        let changed = match event.phase {
            TouchPhase::Start => self.touch_start(ws, event),
            TouchPhase::Move => self.touch_move(ws, event),
            TouchPhase::End => self.touch_end(ws),
            TouchPhase::Cancel => self.touch_cancel(),
        };
        fired || changed
    }

    /// Run the debounced recompute if its quiet period has elapsed.
    pub fn tick(&mut self, ws: &(impl Workspace + ?Sized), now_ms: u64) -> bool {
        match self.recompute.poll(now_ms) {
            Some(rect) => {
                self.apply_rect(ws, rect);
                true
            }
            None => false,
        }
    }

    /// Drop the whole selection, including any rectangle still waiting for
    /// its recompute. With `is_deleting` annotations are not painted back:
    /// the elements are about to be destroyed.
    pub fn clear_all(&mut self, ws: &(impl Workspace + ?Sized), is_deleting: bool) {
        self.recompute.cancel();
        if is_deleting {
            self.session.cache = ElementCache::default();
        }
        self.store.clear_all(is_deleting);
        self.paint(ws);
    }

    // ─── Touch phases ────────────────────────────────────────────────────

    fn touch_start(&mut self, ws: &(impl Workspace + ?Sized), event: &TouchEvent) -> bool {
        // Extra fingers during a gesture do not restart it.
        if self.session.phase != GesturePhase::Idle {
            return false;
        }
        let Some(pos) = event.position() else {
            return false;
        };
        if !self.taps.register(event.time_ms, pos) {
            return false;
        }

        self.session.reset();
        self.session.phase = GesturePhase::Armed;
        self.session.target = event.target;
        log::debug!("batch select armed on {:?}", event.target);

        if ws.is_locked() {
            return false;
        }

        match event.target {
            TouchTarget::Menu => {
                self.session.reset();
                false
            }
            target if self.is_selected_target(ws, target) => {
                self.session.phase = GesturePhase::PendingToggle;
                false
            }
            TouchTarget::Background => {
                self.clear_all(ws, false);
                self.start_rect(ws, pos);
                true
            }
            // Starting inside a frame may still turn out to be a tap on it.
            TouchTarget::FrameInterior(_) => {
                self.start_rect(ws, pos);
                true
            }
            TouchTarget::Block(_) | TouchTarget::Frame(_) | TouchTarget::FrameHighlight(_) => {
                self.session.phase = GesturePhase::PendingToggle;
                false
            }
            TouchTarget::Other => {
                self.clear_all(ws, false);
                true
            }
        }
    }

    fn touch_move(&mut self, ws: &(impl Workspace + ?Sized), event: &TouchEvent) -> bool {
        if self.session.phase == GesturePhase::Idle || ws.is_locked() {
            return false;
        }
        self.session.moves += 1;
        if self.session.phase != GesturePhase::Dragging {
            return false;
        }
        let Some(corner) = event.position() else {
            return false;
        };
        // A second finger repositions the anchor.
        if let Some(second) = event.touches.get(1) {
            self.session.anchor = Some(*second);
        }
        let anchor = self.session.anchor.unwrap_or(corner);
        let rect = normalize_rect(anchor, corner);
        self.session.rect = Some(rect);
        self.recompute.push(rect, event.time_ms);
        true
    }

    fn touch_end(&mut self, ws: &(impl Workspace + ?Sized)) -> bool {
        let phase = self.session.phase;
        if phase == GesturePhase::Idle {
            return false;
        }
        let had_rect = self.session.rect.is_some();
        if ws.is_locked() {
            self.recompute.cancel();
            self.session.reset();
            return had_rect;
        }

        let is_click = self.session.moves <= self.config.click_move_limit;
        let target = self.session.target;
        let changed = if is_click && phase != GesturePhase::Armed && target.element().is_some() {
            self.recompute.cancel();
            self.toggle(ws, target) || had_rect
        } else {
            // Real drag: the final rectangle must always be applied.
            if let Some(rect) = self.recompute.flush() {
                self.apply_rect(ws, rect);
            }
            had_rect
        };

        log::debug!(
            "batch select released: {} after {} moves",
            if is_click { "tap" } else { "drag" },
            self.session.moves
        );
        self.session.reset();
        changed
    }

    fn touch_cancel(&mut self) -> bool {
        let had_rect = self.session.rect.is_some();
        self.recompute.cancel();
        self.session.reset();
        had_rect
    }

    // ─── Selection work ──────────────────────────────────────────────────

    fn start_rect(&mut self, ws: &(impl Workspace + ?Sized), pos: Point) {
        self.session.cache = ElementCache::capture(ws);
        self.session.anchor = Some(pos);
        self.session.rect = Some(Rect::from_points(pos, pos));
        self.session.phase = GesturePhase::Dragging;
    }

    fn apply_rect(&mut self, ws: &(impl Workspace + ?Sized), surface: Rect) {
        let canvas = ws.viewport().to_canvas_rect(surface);
        let result = rect_select::compute(ws, &self.session.cache, canvas, &self.config.overlap);
        self.store.replace(result);
        self.paint(ws);
    }

    /// Whether a touch starts on something already selected or highlighted.
    fn is_selected_target(&self, ws: &(impl Workspace + ?Sized), target: TouchTarget) -> bool {
        let snapshot = self.store.snapshot();
        match target {
            TouchTarget::Block(id) => {
                self.store.is_boxed(id)
                    || containing_frame(ws, id).is_some_and(|f| snapshot.contains_frame(f))
            }
            TouchTarget::Frame(id) | TouchTarget::FrameInterior(id) => snapshot.contains_frame(id),
            TouchTarget::FrameHighlight(_) => true,
            _ => false,
        }
    }

    fn toggle(&mut self, ws: &(impl Workspace + ?Sized), target: TouchTarget) -> bool {
        let changed = match target {
            TouchTarget::Block(id) => self.toggle_block(ws, id),
            TouchTarget::Frame(id)
            | TouchTarget::FrameInterior(id)
            | TouchTarget::FrameHighlight(id) => {
                if self.store.snapshot().contains_frame(id) {
                    self.store.unselect_frame(ws, id, true)
                } else {
                    self.store.select_frame(ws, id)
                }
            }
            _ => false,
        };
        self.paint(ws);
        changed
    }

    fn toggle_block(&mut self, ws: &(impl Workspace + ?Sized), id: ElementId) -> bool {
        if self.store.mark_of(id) == Some(Mark::Selected) {
            return self.store.unselect_block(ws, id);
        }
        match containing_frame(ws, id) {
            Some(frame) if self.store.snapshot().contains_frame(frame) => {
                self.store.dissolve_frame(ws, frame, id)
            }
            _ => self.store.select_block(ws, id),
        }
    }

    fn paint(&mut self, ws: &(impl Workspace + ?Sized)) {
        let changes = self.store.take_changes();
        paint_changes(ws, &changes, &mut self.painter);
    }
}

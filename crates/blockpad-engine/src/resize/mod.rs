//! # Block resize controller
//!
//! Pointer-drag resizing of embeddable blocks. Each block independently
//! runs an **Idle → Dragging → Idle** state machine:
//!
//! - pointer-down on a resize affordance opens a session, recording the
//!   start pointer position, the rendered start dimensions, and which axis
//!   the grabbed affordance controls;
//! - every pointer-move recomputes `start + delta`, clamps it to the
//!   configured bounds, and commits the result into the owning block's
//!   payload synchronously — a save performed mid-drag sees the latest
//!   intermediate size;
//! - pointer-up or pointer-cancel (including the cursor leaving the
//!   window) closes the session.
//!
//! Width-only and height-only drags hold the aspect ratio captured at drag
//! start; both-axis drags clamp each axis independently. Out-of-bounds
//! deltas are clamped silently, never reported.
//!
//! Sessions own their pointer listeners as guards, so cancelling a session
//! (block deletion, editor teardown) detaches them deterministically.

use log::debug;

use blockpad_config::ResizeBounds;

use crate::events::{EventKind, ListenerGuard, ListenerRegistry};
use crate::model::{BlockId, BlockPayload, Document};

/// Which axis the grabbed affordance controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisMode {
    Width,
    Height,
    Both,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerPoint {
    pub x: f64,
    pub y: f64,
}

impl PointerPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// One in-progress drag. Dropping the session releases its listeners.
#[derive(Debug)]
struct ResizeSession {
    block: BlockId,
    mode: AxisMode,
    start: PointerPoint,
    start_width: f64,
    start_height: f64,
    _pointer_move: ListenerGuard,
    _pointer_up: ListenerGuard,
}

/// How a payload variant responds to a drag.
enum ResizeRule {
    /// Clamp both axes to bounds; single-axis drags keep the start ratio.
    Bounded(ResizeBounds),
    /// Height only, with a floor and no ceiling (drawing canvases span the
    /// host width).
    HeightOnly { min: f64 },
}

#[derive(Debug)]
pub struct ResizeController {
    bounds: ResizeBounds,
    drawing_min_height: f64,
    sessions: Vec<ResizeSession>,
    listeners: ListenerRegistry,
}

impl ResizeController {
    pub fn new(bounds: ResizeBounds, drawing_min_height: f64, listeners: ListenerRegistry) -> Self {
        Self {
            bounds,
            drawing_min_height,
            sessions: Vec::new(),
            listeners,
        }
    }

    fn rule_for(&self, payload: &BlockPayload) -> Option<ResizeRule> {
        match payload {
            BlockPayload::Image(_) => Some(ResizeRule::Bounded(self.bounds)),
            BlockPayload::Drawing(_) => Some(ResizeRule::HeightOnly {
                min: self.drawing_min_height,
            }),
            _ => None,
        }
    }

    /// Idle → Dragging. `measured` is the block's rendered size at
    /// pointer-down (the payload may not carry explicit dimensions yet).
    /// Returns false for unknown or non-resizable blocks. A second
    /// pointer-down on an already-dragging block replaces its session.
    pub fn begin(
        &mut self,
        doc: &Document,
        block: BlockId,
        mode: AxisMode,
        at: PointerPoint,
        measured: (f64, f64),
    ) -> bool {
        let Some(target) = doc.block(block) else {
            return false;
        };
        if self.rule_for(&target.payload).is_none() {
            return false;
        }

        // Last-write-wins on the same block; other blocks' sessions are
        // untouched.
        self.sessions.retain(|s| s.block != block);

        let (start_width, start_height) = measured;
        debug!("resize begin block={block} mode={mode:?} start={start_width}x{start_height}");
        self.sessions.push(ResizeSession {
            block,
            mode,
            start: at,
            start_width,
            start_height,
            _pointer_move: self.listeners.register(EventKind::PointerMove),
            _pointer_up: self.listeners.register(EventKind::PointerUp),
        });
        true
    }

    /// Pointer-move during a drag. Computes the clamped size and commits it
    /// into the block payload. Returns the committed `(width, height)`, or
    /// `None` when the block has no active session.
    pub fn update(
        &mut self,
        doc: &mut Document,
        block: BlockId,
        at: PointerPoint,
    ) -> Option<(f64, f64)> {
        let session = self.sessions.iter().find(|s| s.block == block)?;
        let rule = self.rule_for(&doc.block(block)?.payload)?;

        let delta_x = at.x - session.start.x;
        let delta_y = at.y - session.start.y;

        let (width, height) = match rule {
            ResizeRule::Bounded(bounds) => {
                compute_bounded(session, bounds, delta_x, delta_y)
            }
            ResizeRule::HeightOnly { min } => (
                session.start_width,
                (session.start_height + delta_y).max(min),
            ),
        };

        let target = doc.block_mut(block)?;
        if !target.payload.apply_size(width, height) {
            return None;
        }
        doc.touch();
        Some((width, height))
    }

    /// Dragging → Idle on pointer-up or pointer-cancel. Dropping the
    /// session releases its pointer listeners.
    pub fn end(&mut self, block: BlockId) {
        let before = self.sessions.len();
        self.sessions.retain(|s| s.block != block);
        if self.sessions.len() != before {
            debug!("resize end block={block}");
        }
    }

    /// Teardown path: cancel every session (editor destroy).
    pub fn cancel_all(&mut self) {
        self.sessions.clear();
    }

    pub fn is_dragging(&self, block: BlockId) -> bool {
        self.sessions.iter().any(|s| s.block == block)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

fn compute_bounded(
    session: &ResizeSession,
    bounds: ResizeBounds,
    delta_x: f64,
    delta_y: f64,
) -> (f64, f64) {
    match session.mode {
        AxisMode::Width => {
            let width = (session.start_width + delta_x).clamp(bounds.min_width, bounds.max_width);
            // Ratio fixed at drag start; the derived axis is not re-clamped
            // or the ratio would drift.
            let ratio = session.start_height / session.start_width;
            (width, width * ratio)
        }
        AxisMode::Height => {
            let height =
                (session.start_height + delta_y).clamp(bounds.min_height, bounds.max_height);
            let ratio = session.start_width / session.start_height;
            (height * ratio, height)
        }
        AxisMode::Both => (
            (session.start_width + delta_x).clamp(bounds.min_width, bounds.max_width),
            (session.start_height + delta_y).clamp(bounds.min_height, bounds.max_height),
        ),
    }
}

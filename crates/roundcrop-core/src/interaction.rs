//! Pointer and wheel handling for the crop viewport.
//!
//! The controller is a two-state machine:
//!
//! ```text
//!            pointer down                pointer move (same id)
//!   Idle ───────────────────▶ Dragging ◀────────────────────┐
//!    ▲                          │  └────────────────────────┘
//!    └──────────────────────────┘
//!        pointer up / cancel (same id)
//! ```
//!
//! Wheel events are valid in either state and are the only way zoom changes
//! through input. Pan is a screen-space translation and is never clamped, so
//! a user can drag the image far enough to reveal background.
//!
//! [`transition`] is a pure function of its inputs; [`Controller`] just holds
//! the current [`PointerState`] between events.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::geometry::TransformState;

/// Inclusive zoom range and per-tick wheel step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomBounds {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl Default for ZoomBounds {
    fn default() -> Self {
        Self {
            min: 1.0,
            max: 3.0,
            step: 0.05,
        }
    }
}

impl ZoomBounds {
    pub fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    /// Clamp a zoom value into the range.
    #[inline]
    pub fn clamp(&self, zoom: f64) -> f64 {
        zoom.clamp(self.min, self.max)
    }

    /// Set the zoom directly (e.g. from a slider), clamped into the range.
    ///
    /// Non-finite values leave the zoom unchanged.
    pub fn set_zoom(&self, transform: &mut TransformState, zoom: f64) {
        if zoom.is_finite() {
            transform.zoom = self.clamp(zoom);
        }
    }

    /// Apply one wheel tick. Scrolling down (positive delta) zooms out.
    pub fn apply_wheel(&self, transform: &mut TransformState, delta_y: f64) {
        let direction = if delta_y > 0.0 {
            -1.0
        } else if delta_y < 0.0 {
            1.0
        } else {
            return;
        };
        transform.zoom = self.clamp(transform.zoom + direction * self.step);
    }
}

/// Input events forwarded by the host.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum InteractionEvent {
    PointerDown { id: i32, x: f64, y: f64 },
    PointerMove { id: i32, x: f64, y: f64 },
    PointerUp { id: i32 },
    PointerCancel { id: i32 },
    Wheel { delta_y: f64 },
}

/// Drag state of the viewport.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PointerState {
    #[default]
    Idle,
    Dragging {
        /// Pointer that started the drag; other pointers are ignored.
        pointer_id: i32,
        /// Last recorded pointer position, in viewport pixels.
        last_x: f64,
        last_y: f64,
    },
}

impl PointerState {
    pub fn is_dragging(&self) -> bool {
        matches!(self, PointerState::Dragging { .. })
    }
}

/// What the host should do with pointer capture after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    None,
    /// Route further events for this pointer to the viewport even when the
    /// pointer leaves its bounds.
    CapturePointer(i32),
    ReleasePointer(i32),
}

/// Compute the next pointer state, updating `transform` in place.
pub fn transition(
    state: PointerState,
    transform: &mut TransformState,
    event: InteractionEvent,
    bounds: &ZoomBounds,
) -> (PointerState, Effect) {
    match (state, event) {
        // A non-finite coordinate would poison the pan for the whole session
        (
            state,
            InteractionEvent::PointerDown { x, y, .. } | InteractionEvent::PointerMove { x, y, .. },
        ) if !x.is_finite() || !y.is_finite() => (state, Effect::None),

        (PointerState::Idle, InteractionEvent::PointerDown { id, x, y }) => (
            PointerState::Dragging {
                pointer_id: id,
                last_x: x,
                last_y: y,
            },
            Effect::CapturePointer(id),
        ),

        (
            PointerState::Dragging {
                pointer_id,
                last_x,
                last_y,
            },
            InteractionEvent::PointerMove { id, x, y },
        ) if id == pointer_id => {
            transform.pan.x += x - last_x;
            transform.pan.y += y - last_y;
            (
                PointerState::Dragging {
                    pointer_id,
                    last_x: x,
                    last_y: y,
                },
                Effect::None,
            )
        }

        (
            PointerState::Dragging { pointer_id, .. },
            InteractionEvent::PointerUp { id } | InteractionEvent::PointerCancel { id },
        ) if id == pointer_id => (PointerState::Idle, Effect::ReleasePointer(id)),

        (state, InteractionEvent::Wheel { delta_y }) => {
            bounds.apply_wheel(transform, delta_y);
            (state, Effect::None)
        }

        // Moves while idle, a second pointer going down, or events from a
        // pointer other than the dragging one.
        (state, _) => (state, Effect::None),
    }
}

/// Holds the pointer state between events.
#[derive(Debug, Clone, Default)]
pub struct Controller {
    state: PointerState,
    bounds: ZoomBounds,
}

impl Controller {
    pub fn new(bounds: ZoomBounds) -> Self {
        Self {
            state: PointerState::Idle,
            bounds,
        }
    }

    pub fn state(&self) -> PointerState {
        self.state
    }

    pub fn bounds(&self) -> &ZoomBounds {
        &self.bounds
    }

    /// Feed one event through the state machine.
    pub fn handle(&mut self, transform: &mut TransformState, event: InteractionEvent) -> Effect {
        let (next, effect) = transition(self.state, transform, event, &self.bounds);
        if next != self.state || effect != Effect::None {
            debug!(?event, from = ?self.state, to = ?next, ?effect, "Pointer transition");
        }
        self.state = next;
        effect
    }

    /// Drop any drag in progress.
    pub fn reset(&mut self) {
        self.state = PointerState::Idle;
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================

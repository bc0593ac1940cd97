use crate::config::NavigatorConfig;
use crate::error::{NavigationError, Result};
use droste_protocol::{Frame, Placement};
use droste_store::{load_ordered, FrameStore};
use serde::Serialize;
use std::time::Instant;

/// Viewer cursor and scroll state. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NavigationState {
    /// Active frame, `-1` while the viewer is closed
    pub cursor_index: isize,
    pub scroll_accumulator: f64,
    pub switch_locked: bool,
}

impl NavigationState {
    pub const CLOSED: Self = Self {
        cursor_index: -1,
        scroll_accumulator: 0.0,
        switch_locked: false,
    };

    pub fn active_index(&self) -> Option<usize> {
        usize::try_from(self.cursor_index).ok()
    }
}

impl Default for NavigationState {
    fn default() -> Self {
        Self::CLOSED
    }
}

/// Scale applied to the active frame, anchored at a point given in percent
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Zoom {
    pub scale: f64,
    pub origin_x: f64,
    pub origin_y: f64,
}

impl Zoom {
    pub const IDENTITY: Self = Self {
        scale: 1.0,
        origin_x: 50.0,
        origin_y: 50.0,
    };

    fn around(placement: &Placement, scale: f64) -> Self {
        Self {
            scale,
            origin_x: placement.center_x,
            origin_y: placement.center_y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Deeper into the chain (negative delta)
    Next,
    Previous,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    Locked,
    Closed,
    NoPlacement,
    NonFinite,
}

/// What one wheel event did
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WheelOutcome {
    Ignored { reason: IgnoreReason },
    Zoomed { zoom: Zoom },
    Switched { from: usize, to: usize, direction: Direction },

    /// Threshold crossed with no neighbor frame; accumulator reset, no lock
    Edge { direction: Direction },
}

/// Turns wheel deltas into zoom and frame switches over the persisted frames.
///
/// ```text
/// NEUTRAL <-> ZOOMING --threshold--> LOCKED --cooldown--> NEUTRAL
/// ```
///
/// Time is passed in by the caller so the cooldown is deterministic.
pub struct TimelineNavigator {
    config: NavigatorConfig,
    frames: Vec<Frame>,
    state: NavigationState,
    zoom: Zoom,
    locked_until: Option<Instant>,
}

impl TimelineNavigator {
    pub fn new(frames: Vec<Frame>, config: NavigatorConfig) -> Self {
        Self {
            config,
            frames,
            state: NavigationState::CLOSED,
            zoom: Zoom::IDENTITY,
            locked_until: None,
        }
    }

    pub fn state(&self) -> NavigationState {
        self.state
    }

    pub fn zoom(&self) -> Zoom {
        self.zoom
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn current(&self) -> Option<&Frame> {
        self.state.active_index().and_then(|index| self.frames.get(index))
    }

    /// Back to the initial state: viewer closed, nothing accumulated, unlocked.
    pub fn reset(&mut self) {
        self.state = NavigationState::CLOSED;
        self.zoom = Zoom::IDENTITY;
        self.locked_until = None;
    }

    /// Replace the frame sequence with a newer snapshot. An emptied sequence
    /// (new search) resets navigation.
    pub fn sync_frames(&mut self, frames: Vec<Frame>) {
        self.frames = frames;
        let stale = self
            .state
            .active_index()
            .is_some_and(|index| index >= self.frames.len());
        if self.frames.is_empty() || stale {
            self.reset();
        }
    }

    /// Re-read the persisted frames.
    pub async fn refresh(&mut self, store: &dyn FrameStore) -> Result<usize> {
        let frames = load_ordered(store).await?;
        self.sync_frames(frames);
        Ok(self.frames.len())
    }

    /// Show `index` directly (timeline click).
    pub fn open(&mut self, index: usize) -> Result<&Frame> {
        let count = self.frames.len();
        if index >= count {
            return Err(NavigationError::FrameOutOfRange { index, count });
        }
        self.state = NavigationState {
            cursor_index: cursor(index),
            scroll_accumulator: 0.0,
            switch_locked: false,
        };
        self.zoom = Zoom::IDENTITY;
        self.locked_until = None;
        Ok(&self.frames[index])
    }

    pub fn close(&mut self) {
        self.state.cursor_index = -1;
        self.state.scroll_accumulator = 0.0;
        self.zoom = Zoom::IDENTITY;
    }

    /// Release the switch lock once the cooldown has elapsed. Returns whether
    /// the navigator is unlocked.
    pub fn tick(&mut self, now: Instant) -> bool {
        if let Some(until) = self.locked_until {
            if now >= until {
                self.locked_until = None;
                self.state.switch_locked = false;
                log::trace!("Switch lock released");
            }
        }
        !self.state.switch_locked
    }

    pub fn on_wheel(&mut self, delta: f64, now: Instant) -> WheelOutcome {
        if !self.tick(now) {
            return WheelOutcome::Ignored {
                reason: IgnoreReason::Locked,
            };
        }
        let Some(frame) = self.current() else {
            return WheelOutcome::Ignored {
                reason: IgnoreReason::Closed,
            };
        };
        let Some(placement) = frame.placement.clone() else {
            return WheelOutcome::Ignored {
                reason: IgnoreReason::NoPlacement,
            };
        };

        if !delta.is_finite() {
            return WheelOutcome::Ignored {
                reason: IgnoreReason::NonFinite,
            };
        }

        self.state.scroll_accumulator += delta;
        let accumulated = self.state.scroll_accumulator;
        let threshold = self.config.switch_threshold;

        if accumulated < -threshold {
            self.switch(Direction::Next, now)
        } else if accumulated > threshold {
            self.switch(Direction::Previous, now)
        } else {
            let scale = 1.0 + accumulated.max(0.0) * self.config.zoom_gain;
            self.zoom = Zoom::around(&placement, scale);
            WheelOutcome::Zoomed { zoom: self.zoom }
        }
    }

    fn switch(&mut self, direction: Direction, now: Instant) -> WheelOutcome {
        self.state.scroll_accumulator = 0.0;
        self.zoom = Zoom::IDENTITY;

        let Some(from) = self.state.active_index() else {
            return WheelOutcome::Edge { direction };
        };
        let target = match direction {
            Direction::Next => Some(from + 1).filter(|next| *next < self.frames.len()),
            Direction::Previous => from.checked_sub(1),
        };
        let Some(to) = target else {
            log::debug!("No frame {direction:?} of {from}");
            return WheelOutcome::Edge { direction };
        };

        self.state.cursor_index = cursor(to);
        self.state.switch_locked = true;
        self.locked_until = Some(now + self.config.cooldown());
        log::debug!("Switched frame {from} -> {to}");
        WheelOutcome::Switched { from, to, direction }
    }
}

fn cursor(index: usize) -> isize {
    isize::try_from(index).unwrap_or(isize::MAX)
}

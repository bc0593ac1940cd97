//! # Droste Timeline
//!
//! Interactive navigation over persisted frames: wheel deltas accumulate into
//! a zoom around the active frame's placement and, past a threshold, switch
//! to the neighboring frame behind a short cooldown lock.

mod config;
mod error;
mod navigator;

pub use config::NavigatorConfig;
pub use error::{NavigationError, Result};
pub use navigator::{
    Direction, IgnoreReason, NavigationState, TimelineNavigator, WheelOutcome, Zoom,
};

//! # Droste Chain
//!
//! Turns a walked node sequence into a persisted chain of composite frames.
//!
//! ## Per-frame steps
//!
//! ```text
//! RESOLVE_SOURCE ─┬─> SEED (node 0) ─────────────────────────────┐
//!   (skip node    └─> COMPOSITE ──ok──> EXTRACT_PLACEMENT ──┐     │
//!    on failure)        │                                   v     v
//!                       └──failure (degraded frame)──────> PERSIST ──> ADVANCE
//! ```
//!
//! Remote calls run strictly one at a time. Each frame's composite input is
//! the previous frame's generated image, or its source image when that frame
//! was not generated.

mod config;
mod error;
mod images;
mod models;
mod orchestrator;
mod prompts;
mod session;

pub use config::{ModelConfig, ANALYSIS_MODEL, COMPOSITION_MODEL, DEFAULT_ENDPOINT};
pub use error::{ChainError, ImageError, ModelError, Result};
pub use images::{guess_image_mime, HttpImageResolver, ImagePayload, ImageResolver};
pub use models::{
    AnalysisInput, AnalysisModel, AnalysisRequest, CompositionInput, CompositionModel,
    CompositionRequest, ReplicateClient,
};
pub use orchestrator::{ChainEvent, ChainOrchestrator};
pub use prompts::{NESTING_PROMPT, PLACEMENT_PROMPT};
pub use session::{Pipeline, RunGuard, SearchContext};

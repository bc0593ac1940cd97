//! # Droste Protocol
//!
//! Shared data model for the Droste chain: the visited [`GraphNode`]s, the
//! [`Placement`] recovered from the analysis model and the persisted [`Frame`]
//! timeline.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

pub const FRAME_SCHEMA_VERSION: u32 = 1;

/// Base URL used to link a frame back to its article.
pub const ARTICLE_URL_PREFIX: &str = "https://en.wikipedia.org/?curid=";

/// A visited topic and the single image chosen to represent it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GraphNode {
    /// Page id in the link graph
    pub id: u64,

    /// Canonical page title
    pub title: String,

    /// Media title of the representative image (e.g. "File:Example.jpg")
    pub candidate_image_ref: String,
}

impl GraphNode {
    pub fn new(id: u64, title: impl Into<String>, candidate_image_ref: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            candidate_image_ref: candidate_image_ref.into(),
        }
    }

    #[must_use]
    pub fn article_url(&self) -> String {
        format!("{ARTICLE_URL_PREFIX}{}", self.id)
    }
}

/// Percentage-based bounding box describing where an inserted image landed.
///
/// All positional fields are percentages of the frame dimensions in `[0, 100]`,
/// `confidence` is in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placement {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub center_x: f64,
    pub center_y: f64,
    #[serde(default)]
    pub description: String,
    pub confidence: f64,
}

impl Placement {
    /// Named percentage fields, in declaration order.
    #[must_use]
    pub fn percentages(&self) -> [(&'static str, f64); 6] {
        [
            ("x", self.x),
            ("y", self.y),
            ("width", self.width),
            ("height", self.height),
            ("centerX", self.center_x),
            ("centerY", self.center_y),
        ]
    }
}

/// Composite canvas requested from the composition model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 2048,
            height: 2048,
        }
    }
}

/// How a frame came to be. Drives the frame invariants: only a composited
/// outcome carries a generated image or a placement.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    /// First frame of a chain, never composited
    Seed,

    /// Composition failed; the frame falls back to its source image
    Degraded { prior_input_ref: String },

    /// Composition succeeded
    Composited {
        prior_input_ref: String,
        generated_image_ref: String,
        placement: Option<Placement>,
    },
}

/// One persisted step of the composited chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    /// 0-based position in the chain
    pub index: usize,

    /// Title of the originating node
    pub title: String,

    #[serde(default)]
    pub article_id: u64,

    #[serde(default)]
    pub article_url: String,

    /// Image fed into this step
    pub source_image_ref: String,

    /// Previous frame's image used as composite input (none for the seed)
    #[serde(default)]
    pub prior_input_ref: Option<String>,

    /// Composite result, only when composition succeeded
    #[serde(default)]
    pub generated_image_ref: Option<String>,

    #[serde(default)]
    pub placement: Option<Placement>,

    /// Unix milliseconds, monotonic with `index`
    pub created_at_ms: u64,

    pub is_generated: bool,

    pub width: u32,
    pub height: u32,
}

impl Frame {
    pub fn from_outcome(
        index: usize,
        node: &GraphNode,
        outcome: FrameOutcome,
        created_at_ms: u64,
        canvas: Canvas,
    ) -> Self {
        let (prior_input_ref, generated_image_ref, placement) = match outcome {
            FrameOutcome::Seed => (None, None, None),
            FrameOutcome::Degraded { prior_input_ref } => (Some(prior_input_ref), None, None),
            FrameOutcome::Composited {
                prior_input_ref,
                generated_image_ref,
                placement,
            } => (Some(prior_input_ref), Some(generated_image_ref), placement),
        };

        Self {
            index,
            title: node.title.clone(),
            article_id: node.id,
            article_url: node.article_url(),
            source_image_ref: node.candidate_image_ref.clone(),
            prior_input_ref,
            is_generated: generated_image_ref.is_some(),
            generated_image_ref,
            placement,
            created_at_ms,
            width: canvas.width,
            height: canvas.height,
        }
    }

    /// Image the next step composites into: the generated result when present,
    /// otherwise the source image.
    #[must_use]
    pub fn composite_input_ref(&self) -> &str {
        self.generated_image_ref
            .as_deref()
            .unwrap_or(&self.source_image_ref)
    }

    /// Image shown when the frame is displayed.
    #[must_use]
    pub fn display_ref(&self) -> &str {
        self.composite_input_ref()
    }
}

/// Restore chain order for frames loaded from an unordered store.
pub fn sort_frames(frames: &mut [Frame]) {
    frames.sort_by_key(|frame| (frame.created_at_ms, frame.index));
}

pub fn serialize_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(Into::into)
}

pub fn serialize_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(Into::into)
}

pub fn unix_ms_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}

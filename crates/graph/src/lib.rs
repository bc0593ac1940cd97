//! # Droste Graph
//!
//! Walks a link graph backwards from a seed topic and picks one representative
//! image per visited page.
//!
//! ## Architecture
//!
//! ```text
//! seed title
//!     │
//!     ├──> LinkSource (MediaWiki action API)
//!     │      ├─ resolve title -> page
//!     │      ├─ "what links here" -> candidates
//!     │      └─ page media -> media titles
//!     │
//!     ├──> GraphWalker
//!     │      ├─ one candidate per hop (first or seeded random)
//!     │      ├─ visited pages deduplicated by id (configurable)
//!     │      └─ raster image filter + pick
//!     │
//!     └──> Vec<GraphNode> (seed first) + LinkGraph trail (petgraph)
//! ```

mod error;
mod graph;
mod source;
mod types;
mod walker;
mod wiki;

pub use error::{GraphError, Result};
pub use source::{is_raster_image, LinkSource, RASTER_EXTENSIONS};
pub use types::{LinkEdge, LinkGraph, Topic, TrailLink};
pub use walker::{CandidatePick, FailedHop, GraphWalker, SkippedTopic, WalkConfig, WalkReport};
pub use wiki::{MediaWikiSource, DEFAULT_API_URL};

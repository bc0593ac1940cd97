use crate::error::{ChainError, Result};
use crate::orchestrator::ChainOrchestrator;
use droste_graph::{FailedHop, GraphWalker, SkippedTopic, TrailLink};
use droste_protocol::{Frame, GraphNode};
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Ties a chain run to the search that started it. A run whose search has
/// been superseded stops before its next write.
///
/// Store writes of every run sharing a pipeline are serialized through one
/// gate; the generation check and the write happen under the same lock.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    epoch: Arc<AtomicU64>,
    generation: Option<u64>,
    writes: Arc<Mutex<()>>,
}

impl RunGuard {
    /// A guard that never goes stale
    pub fn unguarded() -> Self {
        Self::default()
    }

    pub fn is_current(&self) -> bool {
        self.generation
            .map_or(true, |generation| self.epoch.load(Ordering::SeqCst) == generation)
    }

    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.writes.lock().await
    }
}

/// Everything one search produced
#[derive(Debug, Clone, Serialize)]
pub struct SearchContext {
    pub seed: String,
    pub nodes: Vec<GraphNode>,
    pub trail: Vec<TrailLink>,
    pub skipped: Vec<SkippedTopic>,
    pub failed_hops: Vec<FailedHop>,
    pub frames: Vec<Frame>,
}

/// Search entry point: clear previous results, walk, then run the chain.
pub struct Pipeline {
    walker: GraphWalker,
    orchestrator: ChainOrchestrator,
    epoch: Arc<AtomicU64>,
    writes: Arc<Mutex<()>>,
}

impl Pipeline {
    pub fn new(walker: GraphWalker, orchestrator: ChainOrchestrator) -> Self {
        Self {
            walker,
            orchestrator,
            epoch: Arc::new(AtomicU64::new(0)),
            writes: Arc::new(Mutex::new(())),
        }
    }

    /// Start a new search generation, invalidating guards of earlier ones
    pub fn begin(&self) -> RunGuard {
        let generation = self.epoch.fetch_add(1, Ordering::SeqCst) + 1;
        RunGuard {
            epoch: Arc::clone(&self.epoch),
            generation: Some(generation),
            writes: Arc::clone(&self.writes),
        }
    }

    pub async fn search(&self, seed: &str, max_depth: usize) -> Result<SearchContext> {
        let guard = self.begin();
        {
            // An older run may be mid-append; clear only once it has landed.
            let _writes = guard.lock_writes().await;
            self.orchestrator
                .store()
                .clear()
                .await
                .map_err(ChainError::Clear)?;
        }

        let report = self.walker.walk_report(seed, max_depth).await;
        let frames = if report.nodes.is_empty() {
            log::warn!("No nodes found for '{seed}'");
            Vec::new()
        } else {
            log::info!("Walked {} nodes from '{seed}'", report.nodes.len());
            self.orchestrator.run_guarded(&report.nodes, &guard).await?
        };

        Ok(SearchContext {
            seed: seed.to_string(),
            trail: report.trail.links(),
            nodes: report.nodes,
            skipped: report.skipped,
            failed_hops: report.failed_hops,
            frames,
        })
    }
}

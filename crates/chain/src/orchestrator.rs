use crate::config::ModelConfig;
use crate::error::{ChainError, ImageError, ModelError, Result};
use crate::images::{ImagePayload, ImageResolver};
use crate::models::{AnalysisModel, AnalysisRequest, CompositionModel, CompositionRequest};
use crate::session::RunGuard;
use droste_protocol::{unix_ms_now, Frame, FrameOutcome, GraphNode, Placement};
use droste_store::FrameStore;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Transient per-step status, for progress display
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ChainEvent {
    NodeStarted {
        ordinal: usize,
        total: usize,
        title: String,
    },
    SourceSkipped {
        ordinal: usize,
        title: String,
        reason: String,
    },
    CompositeDegraded {
        index: usize,
        title: String,
        reason: String,
    },
    PlacementMissing {
        index: usize,
        title: String,
    },
    FramePersisted {
        index: usize,
        title: String,
        is_generated: bool,
        has_placement: bool,
    },
}

/// The image the next composite nests, with its payload when already fetched
#[derive(Debug, Clone)]
struct PriorInput {
    reference: String,
    payload: Option<ImagePayload>,
}

/// Per-frame processing steps. Each node walks these in order; failures
/// short-circuit to `Persist` with a degraded outcome, or skip the node.
enum FrameStep {
    ResolveSource,
    Seed {
        source: ImagePayload,
    },
    Composite {
        source: ImagePayload,
        prior: PriorInput,
    },
    ExtractPlacement {
        prior_input_ref: String,
        prior_payload: ImagePayload,
        generated_image_ref: String,
    },
    Persist {
        outcome: FrameOutcome,
        next_payload: Option<ImagePayload>,
    },
    Advance {
        frame: Frame,
        next_payload: Option<ImagePayload>,
    },
}

#[derive(Default)]
struct RunState {
    frames: Vec<Frame>,
    prior: Option<PriorInput>,
    last_created_ms: Option<u64>,
}

/// Drives the sequential composite chain over a walked node sequence.
///
/// Exactly one remote call is in flight at a time and frames are persisted in
/// index order. Composition and analysis failures degrade a frame, they never
/// end the run.
pub struct ChainOrchestrator {
    images: Arc<dyn ImageResolver>,
    composer: Arc<dyn CompositionModel>,
    analyzer: Arc<dyn AnalysisModel>,
    store: Arc<dyn FrameStore>,
    config: ModelConfig,
    events: Option<UnboundedSender<ChainEvent>>,
}

impl ChainOrchestrator {
    pub fn new(
        images: Arc<dyn ImageResolver>,
        composer: Arc<dyn CompositionModel>,
        analyzer: Arc<dyn AnalysisModel>,
        store: Arc<dyn FrameStore>,
        config: ModelConfig,
    ) -> Self {
        Self {
            images,
            composer,
            analyzer,
            store,
            config,
            events: None,
        }
    }

    pub fn with_events(mut self, events: UnboundedSender<ChainEvent>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn store(&self) -> &Arc<dyn FrameStore> {
        &self.store
    }

    pub async fn run(&self, nodes: &[GraphNode]) -> Result<Vec<Frame>> {
        self.run_guarded(nodes, &RunGuard::unguarded()).await
    }

    /// Run the chain, stopping before the next write once `guard` is stale.
    pub async fn run_guarded(&self, nodes: &[GraphNode], guard: &RunGuard) -> Result<Vec<Frame>> {
        let mut state = RunState::default();
        for (ordinal, node) in nodes.iter().enumerate() {
            if !guard.is_current() {
                return Err(ChainError::Superseded {
                    persisted: state.frames.len(),
                });
            }
            self.emit(ChainEvent::NodeStarted {
                ordinal,
                total: nodes.len(),
                title: node.title.clone(),
            });
            self.process_node(ordinal, node, &mut state, guard).await?;
        }
        log::info!("Chain finished with {} frames", state.frames.len());
        Ok(state.frames)
    }

    async fn process_node(
        &self,
        ordinal: usize,
        node: &GraphNode,
        state: &mut RunState,
        guard: &RunGuard,
    ) -> Result<()> {
        let mut step = FrameStep::ResolveSource;
        loop {
            step = match step {
                FrameStep::ResolveSource => match self.resolve(&node.candidate_image_ref).await {
                    Ok(source) => match state.prior.clone() {
                        None => FrameStep::Seed { source },
                        Some(prior) => FrameStep::Composite { source, prior },
                    },
                    Err(err) if ordinal == 0 => {
                        return Err(ChainError::SeedUnavailable {
                            title: node.title.clone(),
                            reason: err.to_string(),
                        });
                    }
                    Err(err) => {
                        log::warn!("Skipping '{}': source image unavailable: {err}", node.title);
                        self.emit(ChainEvent::SourceSkipped {
                            ordinal,
                            title: node.title.clone(),
                            reason: err.to_string(),
                        });
                        return Ok(());
                    }
                },

                FrameStep::Seed { source } => FrameStep::Persist {
                    outcome: FrameOutcome::Seed,
                    next_payload: Some(source),
                },

                FrameStep::Composite { source, prior } => {
                    let prior_payload = match prior.payload {
                        Some(payload) => Ok(payload),
                        None => self.resolve(&prior.reference).await.map_err(|err| err.to_string()),
                    };
                    let attempt = match prior_payload {
                        Ok(prior_payload) => {
                            let request = CompositionRequest::nesting(&self.config, &prior_payload, &source);
                            self.timed_model(self.composer.composite(&request))
                                .await
                                .map(|generated| (prior_payload, generated))
                                .map_err(|err| err.to_string())
                        }
                        Err(reason) => Err(format!("prior image unavailable: {reason}")),
                    };

                    match attempt {
                        Ok((prior_payload, generated_image_ref)) => FrameStep::ExtractPlacement {
                            prior_input_ref: prior.reference,
                            prior_payload,
                            generated_image_ref,
                        },
                        Err(reason) => {
                            let index = state.frames.len();
                            log::warn!("Composite failed for frame {index} ('{}'): {reason}", node.title);
                            self.emit(ChainEvent::CompositeDegraded {
                                index,
                                title: node.title.clone(),
                                reason,
                            });
                            FrameStep::Persist {
                                outcome: FrameOutcome::Degraded {
                                    prior_input_ref: prior.reference,
                                },
                                next_payload: Some(source),
                            }
                        }
                    }
                }

                FrameStep::ExtractPlacement {
                    prior_input_ref,
                    prior_payload,
                    generated_image_ref,
                } => {
                    let (placement, composite_payload) =
                        self.locate(&prior_payload, &generated_image_ref).await;
                    if placement.is_none() {
                        self.emit(ChainEvent::PlacementMissing {
                            index: state.frames.len(),
                            title: node.title.clone(),
                        });
                    }
                    FrameStep::Persist {
                        outcome: FrameOutcome::Composited {
                            prior_input_ref,
                            generated_image_ref,
                            placement,
                        },
                        next_payload: composite_payload,
                    }
                }

                FrameStep::Persist {
                    outcome,
                    next_payload,
                } => {
                    let writes = guard.lock_writes().await;
                    if !guard.is_current() {
                        return Err(ChainError::Superseded {
                            persisted: state.frames.len(),
                        });
                    }
                    let index = state.frames.len();
                    let created_at_ms = next_created_at(state.last_created_ms, unix_ms_now());
                    let frame = Frame::from_outcome(index, node, outcome, created_at_ms, self.config.canvas());
                    self.store
                        .append(&frame)
                        .await
                        .map_err(|source| ChainError::Persistence { index, source })?;
                    drop(writes);
                    state.last_created_ms = Some(created_at_ms);
                    FrameStep::Advance { frame, next_payload }
                }

                FrameStep::Advance { frame, next_payload } => {
                    log::info!(
                        "Frame {} '{}' persisted (generated: {}, placement: {})",
                        frame.index,
                        frame.title,
                        frame.is_generated,
                        frame.placement.is_some()
                    );
                    self.emit(ChainEvent::FramePersisted {
                        index: frame.index,
                        title: frame.title.clone(),
                        is_generated: frame.is_generated,
                        has_placement: frame.placement.is_some(),
                    });
                    state.prior = Some(PriorInput {
                        reference: frame.composite_input_ref().to_string(),
                        payload: next_payload,
                    });
                    state.frames.push(frame);
                    return Ok(());
                }
            };
        }
    }

    /// Ask the analysis model where the prior image landed. Any failure yields
    /// no placement; the downloaded composite is returned for reuse.
    async fn locate(
        &self,
        prior: &ImagePayload,
        generated_image_ref: &str,
    ) -> (Option<Placement>, Option<ImagePayload>) {
        let composite = match self.resolve(generated_image_ref).await {
            Ok(payload) => payload,
            Err(err) => {
                log::warn!("Composite {generated_image_ref} could not be fetched for analysis: {err}");
                return (None, None);
            }
        };

        let request = AnalysisRequest::placement(&self.config, prior, &composite);
        let placement = match self.timed_model(self.analyzer.analyze(&request)).await {
            Ok(text) => {
                let placement = droste_placement::extract(&text);
                if placement.is_none() {
                    log::warn!("Analysis output held no usable placement");
                }
                placement
            }
            Err(err) => {
                log::warn!("Placement analysis failed: {err}");
                None
            }
        };
        (placement, Some(composite))
    }

    async fn resolve(&self, reference: &str) -> std::result::Result<ImagePayload, ImageError> {
        let budget = self.config.call_timeout();
        tokio::time::timeout(budget, self.images.resolve(reference))
            .await
            .unwrap_or_else(|_| Err(ImageError::Timeout(millis(budget))))
    }

    async fn timed_model<T>(
        &self,
        call: impl Future<Output = std::result::Result<T, ModelError>>,
    ) -> std::result::Result<T, ModelError> {
        let budget = self.config.call_timeout();
        tokio::time::timeout(budget, call)
            .await
            .unwrap_or_else(|_| Err(ModelError::Timeout(millis(budget))))
    }

    fn emit(&self, event: ChainEvent) {
        if let Some(events) = &self.events {
            let _ = events.send(event);
        }
    }
}

/// Creation timestamps strictly increase with frame index, even when the
/// wall clock stalls or steps back.
fn next_created_at(previous: Option<u64>, now: u64) -> u64 {
    match previous {
        Some(previous) => now.max(previous.saturating_add(1)),
        None => now,
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

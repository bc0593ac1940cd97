use crate::error::GraphError;
use crate::source::{is_raster_image, LinkSource};
use crate::types::{LinkEdge, LinkGraph, Topic};
use droste_protocol::GraphNode;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// How one candidate is chosen among several
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidatePick {
    /// Always the first candidate in source order
    #[default]
    First,

    /// Uniform pick from the walker's (optionally seeded) RNG
    Random,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WalkConfig {
    /// Number of "links here" hops after the seed
    pub max_depth: usize,

    /// Candidates requested per hop
    pub links_per_hop: usize,

    pub link_pick: CandidatePick,

    pub image_pick: CandidatePick,

    /// Fixed seed for reproducible random picks
    pub rng_seed: Option<u64>,

    /// Follow relations back onto already visited pages
    pub allow_revisits: bool,
}

impl Default for WalkConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            links_per_hop: 10,
            link_pick: CandidatePick::First,
            image_pick: CandidatePick::Random,
            rng_seed: None,
            allow_revisits: false,
        }
    }
}

/// A page that did not make it into the walk output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedTopic {
    pub title: String,
    pub reason: String,
}

/// A "links here" request that failed; the walk retried from the same page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailedHop {
    pub hop: usize,
    pub from: String,
    pub reason: String,
}

/// Full result of one walk
pub struct WalkReport {
    /// Seed first, then one node per hop that had a usable image
    pub nodes: Vec<GraphNode>,

    /// Every page visited and the relations followed
    pub trail: LinkGraph,

    pub skipped: Vec<SkippedTopic>,

    pub failed_hops: Vec<FailedHop>,
}

/// Follows "what links here" relations from a seed topic and picks one
/// representative image per visited page.
pub struct GraphWalker {
    source: Arc<dyn LinkSource>,
    config: WalkConfig,
}

impl GraphWalker {
    pub fn new(source: Arc<dyn LinkSource>, config: WalkConfig) -> Self {
        Self { source, config }
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Ordered node sequence for `seed_title`; empty only when the seed cannot be resolved
    pub async fn walk(&self, seed_title: &str, max_depth: usize) -> Vec<GraphNode> {
        self.walk_report(seed_title, max_depth).await.nodes
    }

    pub async fn walk_report(&self, seed_title: &str, max_depth: usize) -> WalkReport {
        let mut rng = match self.config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut trail = LinkGraph::new();
        let mut skipped = Vec::new();
        let mut failed_hops = Vec::new();

        let seed = match self.source.resolve(seed_title).await {
            Ok(Some(topic)) => topic,
            Ok(None) => {
                log::warn!("Seed topic '{seed_title}' does not exist");
                return WalkReport {
                    nodes: Vec::new(),
                    trail,
                    skipped,
                    failed_hops: Vec::new(),
                };
            }
            Err(err) => {
                log::warn!("Seed topic '{seed_title}' could not be resolved: {err}");
                return WalkReport {
                    nodes: Vec::new(),
                    trail,
                    skipped,
                    failed_hops: Vec::new(),
                };
            }
        };

        let mut frontier = trail.add_topic(seed.clone());
        let mut visited = vec![seed];

        for hop in 0..max_depth {
            let Some(current) = trail.get_node(frontier).cloned() else {
                break;
            };

            let candidates = match self
                .source
                .links_here(&current, self.config.links_per_hop)
                .await
            {
                Ok(candidates) => candidates,
                Err(err) => {
                    log::warn!("Hop {hop}: links to '{}' unavailable: {err}", current.title);
                    failed_hops.push(FailedHop {
                        hop,
                        from: current.title.clone(),
                        reason: err.to_string(),
                    });
                    continue;
                }
            };

            let fresh: Vec<&Topic> = candidates
                .iter()
                .filter(|topic| self.config.allow_revisits || !trail.contains(topic.id))
                .collect();

            let Some(next) = pick(&fresh, self.config.link_pick, &mut rng).map(|t| (*t).clone())
            else {
                log::debug!("Hop {hop}: no unvisited page links to '{}'", current.title);
                break;
            };

            log::debug!("Hop {hop}: '{}' links to '{}'", next.title, current.title);
            let linker = trail.add_topic(next.clone());
            trail.add_link(linker, frontier, LinkEdge { hop });
            frontier = linker;
            visited.push(next);
        }

        let mut nodes = Vec::with_capacity(visited.len());
        for topic in visited {
            match self.representative_image(&topic, &mut rng).await {
                Ok(media_title) => {
                    nodes.push(GraphNode::new(topic.id, topic.title, media_title));
                }
                Err(err) => {
                    log::warn!("Dropping '{}': {err}", topic.title);
                    skipped.push(SkippedTopic {
                        title: topic.title,
                        reason: err.to_string(),
                    });
                }
            }
        }

        WalkReport {
            nodes,
            trail,
            skipped,
            failed_hops,
        }
    }

    async fn representative_image(
        &self,
        topic: &Topic,
        rng: &mut StdRng,
    ) -> Result<String, GraphError> {
        let media = self.source.media(topic).await?;
        let raster: Vec<&String> = media.iter().filter(|title| is_raster_image(title)).collect();
        pick(&raster, self.config.image_pick, rng)
            .map(|title| (*title).clone())
            .ok_or_else(|| GraphError::media_not_found(&topic.title))
    }
}

fn pick<'a, T>(items: &'a [T], strategy: CandidatePick, rng: &mut StdRng) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    match strategy {
        CandidatePick::First => items.first(),
        CandidatePick::Random => items.get(rng.gen_range(0..items.len())),
    }
}

use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Page in the link graph (before an image is chosen for it)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Topic {
    /// Page id
    pub id: u64,

    /// Canonical title
    pub title: String,
}

impl Topic {
    pub fn new(id: u64, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
        }
    }
}

/// Edge in the walk trail: `source` links to `target`, discovered on `hop`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkEdge {
    pub hop: usize,
}

/// Serializable view of one trail edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailLink {
    pub from: String,
    pub to: String,
    pub hop: usize,
}

/// Pages visited by one walk, with the "links here" relations that were followed
pub struct LinkGraph {
    /// Directed graph (linking page -> linked page)
    pub graph: DiGraph<Topic, LinkEdge>,

    /// Page id -> NodeIndex mapping for fast lookup
    pub id_index: HashMap<u64, NodeIndex>,
}

impl LinkGraph {
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            id_index: HashMap::new(),
        }
    }

    /// Add topic to graph, returning the existing node when the id was already seen
    pub fn add_topic(&mut self, topic: Topic) -> NodeIndex {
        if let Some(&idx) = self.id_index.get(&topic.id) {
            return idx;
        }
        let id = topic.id;
        let idx = self.graph.add_node(topic);
        self.id_index.insert(id, idx);
        idx
    }

    /// Record that `linker` links to `linked`
    pub fn add_link(&mut self, linker: NodeIndex, linked: NodeIndex, edge: LinkEdge) {
        self.graph.add_edge(linker, linked, edge);
    }

    pub fn contains(&self, id: u64) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn get_node(&self, idx: NodeIndex) -> Option<&Topic> {
        self.graph.node_weight(idx)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }
}

impl Default for LinkGraph {
    fn default() -> Self {
        Self::new()
    }
}

use crate::types::{LinkGraph, TrailLink};
use petgraph::algo::is_cyclic_directed;
use petgraph::visit::EdgeRef;

impl LinkGraph {
    /// True when the followed relations loop back onto an already visited page
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Trail edges ordered by hop
    pub fn links(&self) -> Vec<TrailLink> {
        let mut links: Vec<TrailLink> = self
            .graph
            .edge_references()
            .filter_map(|edge| {
                let from = self.get_node(edge.source())?;
                let to = self.get_node(edge.target())?;
                Some(TrailLink {
                    from: from.title.clone(),
                    to: to.title.clone(),
                    hop: edge.weight().hop,
                })
            })
            .collect();
        links.sort_by_key(|link| link.hop);
        links
    }
}

#[cfg(test)]
mod tests {
    use crate::types::{LinkEdge, LinkGraph, Topic};
    use pretty_assertions::assert_eq;

    #[test]
    fn add_topic_deduplicates_by_id() {
        let mut graph = LinkGraph::new();
        let a = graph.add_topic(Topic::new(1, "Cat"));
        let again = graph.add_topic(Topic::new(1, "Cat (redirect)"));
        assert_eq!(a, again);
        assert_eq!(graph.node_count(), 1);
    }

    #[test]
    fn links_follow_hop_order_and_detect_cycles() {
        let mut graph = LinkGraph::new();
        let cat = graph.add_topic(Topic::new(1, "Cat"));
        let pet = graph.add_topic(Topic::new(2, "Pet"));
        graph.add_link(pet, cat, LinkEdge { hop: 0 });
        assert!(!graph.has_cycle());

        graph.add_link(cat, pet, LinkEdge { hop: 1 });
        assert!(graph.has_cycle());

        let hops: Vec<(String, String)> = graph
            .links()
            .into_iter()
            .map(|link| (link.from, link.to))
            .collect();
        assert_eq!(
            hops,
            vec![
                ("Pet".to_string(), "Cat".to_string()),
                ("Cat".to_string(), "Pet".to_string())
            ]
        );
    }
}

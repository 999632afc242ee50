use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use eframe::egui::{Vec2, vec2};
use tracing::warn;

use super::Graph;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResolveReport {
    pub duplicate_ids: usize,
    pub dangling_links: usize,
    pub self_links: usize,
    pub duplicate_links: usize,
}

impl ResolveReport {
    pub fn dropped(&self) -> usize {
        self.duplicate_ids + self.dangling_links + self.self_links + self.duplicate_links
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedNode {
    pub id: Arc<str>,
    pub is_external: bool,
    pub degree: u32,
    pub hint: Option<Vec2>,
    pub fixed: Option<Vec2>,
}

/// A graph whose links are index pairs into `nodes`, with every invalid
/// entry removed. The renderer and the layout worker share one, so node
/// indices agree between them.
#[derive(Clone, Debug, Default)]
pub struct ResolvedGraph {
    pub nodes: Vec<ResolvedNode>,
    pub links: Vec<(usize, usize)>,
    pub report: ResolveReport,
}

impl ResolvedGraph {
    pub fn from_graph(graph: &Graph) -> Self {
        let mut report = ResolveReport::default();
        let mut nodes = Vec::with_capacity(graph.nodes.len());
        let mut given_degrees = Vec::with_capacity(graph.nodes.len());
        let mut index_by_id: HashMap<Arc<str>, usize> = HashMap::with_capacity(graph.nodes.len());

        for node in &graph.nodes {
            if index_by_id.contains_key(node.id.as_str()) {
                report.duplicate_ids += 1;
                continue;
            }

            let id: Arc<str> = Arc::from(node.id.as_str());
            index_by_id.insert(Arc::clone(&id), nodes.len());
            given_degrees.push(node.degree);
            nodes.push(ResolvedNode {
                id,
                is_external: node.is_external,
                degree: 0,
                hint: node.x.zip(node.y).map(|(x, y)| vec2(x, y)),
                fixed: node.fx.zip(node.fy).map(|(x, y)| vec2(x, y)),
            });
        }

        let mut seen = HashSet::with_capacity(graph.links.len());
        let mut links = Vec::with_capacity(graph.links.len());
        for link in &graph.links {
            let (Some(&source), Some(&target)) = (
                index_by_id.get(link.source.id()),
                index_by_id.get(link.target.id()),
            ) else {
                report.dangling_links += 1;
                continue;
            };

            if source == target {
                report.self_links += 1;
                continue;
            }

            if !seen.insert((source, target)) {
                report.duplicate_links += 1;
                continue;
            }

            links.push((source, target));
        }

        let mut derived = vec![0u32; nodes.len()];
        for &(source, target) in &links {
            derived[source] += 1;
            derived[target] += 1;
        }
        for ((node, given), derived) in nodes.iter_mut().zip(given_degrees).zip(derived) {
            // Fractional degrees round; negative ones fall back to the count.
            node.degree = given
                .filter(|degree| degree.is_finite() && *degree >= 0.0)
                .map_or(derived, |degree| degree.round() as u32);
        }

        if report.dropped() > 0 {
            warn!(
                duplicate_ids = report.duplicate_ids,
                dangling_links = report.dangling_links,
                self_links = report.self_links,
                duplicate_links = report.duplicate_links,
                "dropped malformed graph entries"
            );
        }

        Self {
            nodes,
            links,
            report,
        }
    }

    pub fn max_degree(&self) -> u32 {
        self.nodes.iter().map(|node| node.degree).max().unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{Link, Node};

    fn graph(nodes: &[&str], links: &[(&str, &str)]) -> Graph {
        Graph {
            nodes: nodes.iter().map(|id| Node::internal(*id)).collect(),
            links: links
                .iter()
                .map(|(source, target)| Link::new(source, target))
                .collect(),
        }
    }

    #[test]
    fn drops_links_with_missing_endpoints() {
        let resolved = graph(&["a", "b"], &[("a", "b"), ("a", "ghost"), ("ghost", "b")]).resolve();

        assert_eq!(resolved.links, vec![(0, 1)]);
        assert_eq!(resolved.report.dangling_links, 2);
    }

    #[test]
    fn first_duplicate_id_wins() {
        let mut input = graph(&["a", "b"], &[("a", "b")]);
        input.nodes.push(Node::external("a"));
        let resolved = input.resolve();

        assert_eq!(resolved.nodes.len(), 2);
        assert!(!resolved.nodes[0].is_external);
        assert_eq!(resolved.report.duplicate_ids, 1);
        assert_eq!(resolved.links, vec![(0, 1)]);
    }

    #[test]
    fn drops_self_and_repeated_links_but_keeps_reverse_direction() {
        let resolved =
            graph(&["a", "b"], &[("a", "a"), ("a", "b"), ("a", "b"), ("b", "a")]).resolve();

        assert_eq!(resolved.links, vec![(0, 1), (1, 0)]);
        assert_eq!(resolved.report.self_links, 1);
        assert_eq!(resolved.report.duplicate_links, 1);
        assert_eq!(resolved.report.dropped(), 2);
    }

    #[test]
    fn derives_degree_only_when_absent() {
        let mut input = graph(&["a", "b", "c"], &[("a", "b"), ("b", "c"), ("b", "zzz")]);
        input.nodes[2].degree = Some(9.0);
        let resolved = input.resolve();

        assert_eq!(resolved.nodes[0].degree, 1);
        assert_eq!(resolved.nodes[1].degree, 2);
        assert_eq!(resolved.nodes[2].degree, 9);
        assert_eq!(resolved.max_degree(), 9);
    }

    #[test]
    fn odd_numeric_degrees_are_recovered_per_node() {
        let raw = r#"{
            "nodes": [
                { "id": "a", "degree": 2.5 },
                { "id": "b", "degree": -1 },
                { "id": "c" }
            ],
            "links": [{ "source": "a", "target": "b" }]
        }"#;
        let resolved = Graph::from_json_str(raw).unwrap().resolve();

        assert_eq!(resolved.nodes[0].degree, 3);
        assert_eq!(resolved.nodes[1].degree, 1);
        assert_eq!(resolved.nodes[2].degree, 0);
    }

    #[test]
    fn keeps_layout_hints_and_pins() {
        let mut input = graph(&["a", "b"], &[]);
        input.nodes[0].x = Some(4.0);
        input.nodes[0].y = Some(-2.0);
        input.nodes[1].fx = Some(1.0);
        let resolved = input.resolve();

        assert_eq!(resolved.nodes[0].hint, Some(vec2(4.0, -2.0)));
        assert_eq!(resolved.nodes[1].fixed, None);
        assert_eq!(resolved.nodes[1].id.as_ref(), "b");
    }
}

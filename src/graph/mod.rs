mod load;
mod resolve;

use serde::{Deserialize, Serialize};

pub use load::load_graph;
pub use resolve::{ResolveReport, ResolvedGraph};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub is_external: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f32>,
    /// Pinned position override. Both coordinates must be present to pin.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fy: Option<f32>,
}

#[cfg(test)]
impl Node {
    pub fn internal(id: impl Into<String>) -> Self {
        Self::with_kind(id, false)
    }

    pub fn external(id: impl Into<String>) -> Self {
        Self::with_kind(id, true)
    }

    fn with_kind(id: impl Into<String>, is_external: bool) -> Self {
        Self {
            id: id.into(),
            is_external,
            degree: None,
            x: None,
            y: None,
            fx: None,
            fy: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkEnd {
    Id(String),
    Node { id: String },
}

impl LinkEnd {
    pub fn id(&self) -> &str {
        match self {
            Self::Id(id) | Self::Node { id } => id,
        }
    }
}

#[cfg(test)]
impl From<&str> for LinkEnd {
    fn from(id: &str) -> Self {
        Self::Id(id.to_owned())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub source: LinkEnd,
    pub target: LinkEnd,
}

#[cfg(test)]
impl Link {
    pub fn new(source: &str, target: &str) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Graph {
    pub fn from_json_str(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str(raw)
    }

    pub fn resolve(&self) -> ResolvedGraph {
        ResolvedGraph::from_graph(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_extraction_output() {
        let raw = r#"{
            "nodes": [
                { "id": "start.md", "isExternal": false },
                { "id": "https://example.org", "isExternal": true, "degree": 3 }
            ],
            "links": [{ "source": "start.md", "target": "https://example.org" }]
        }"#;

        let graph = Graph::from_json_str(raw).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert!(!graph.nodes[0].is_external);
        assert!(graph.nodes[1].is_external);
        assert_eq!(graph.nodes[1].degree, Some(3.0));
        assert_eq!(graph.links[0].target.id(), "https://example.org");
    }

    #[test]
    fn accepts_node_references_as_link_ends() {
        let raw = r#"{
            "nodes": [{ "id": "a.md" }, { "id": "b.md" }],
            "links": [{ "source": { "id": "a.md", "x": 3.0 }, "target": "b.md" }]
        }"#;

        let graph = Graph::from_json_str(raw).unwrap();
        assert_eq!(graph.links[0].source.id(), "a.md");
        assert_eq!(graph.links[0].target.id(), "b.md");
        assert!(!graph.nodes[0].is_external);
    }

    #[test]
    fn missing_sections_default_to_empty() {
        let graph = Graph::from_json_str("{}").unwrap();
        assert!(graph.nodes.is_empty());
        assert!(graph.links.is_empty());
    }
}

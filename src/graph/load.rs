use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use super::Graph;

pub fn load_graph(path: &Path) -> Result<Graph> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read graph file {}", path.display()))?;
    let graph = Graph::from_json_str(&raw)
        .with_context(|| format!("invalid graph JSON in {}", path.display()))?;

    info!(
        path = %path.display(),
        nodes = graph.nodes.len(),
        links = graph.links.len(),
        "loaded link graph"
    );
    Ok(graph)
}

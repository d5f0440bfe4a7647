use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use eframe::egui::Vec2;
use serde::Deserialize;

/// Affine placement of a node glyph, written exclusively by the layout engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
    pub translate: Vec2,
    pub scale: f32,
}

impl Default for Placement {
    fn default() -> Self {
        Self {
            translate: Vec2::ZERO,
            scale: 1.0,
        }
    }
}

/// One topology entity (host, container, process, ...) rendered as a glyph.
///
/// Everything except `id` may change between renders. The view-state flags and
/// the transform are never part of the snapshot; they are recomputed each frame
/// from the selection store and the layout engine.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub sub_label: String,
    pub shape: String,
    #[serde(default)]
    pub stack: bool,
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub pseudo: bool,
    #[serde(skip)]
    pub highlighted: bool,
    #[serde(skip)]
    pub blurred: bool,
    #[serde(skip)]
    pub focused: bool,
    #[serde(skip)]
    pub transform: Placement,
}

#[derive(Deserialize)]
struct Snapshot {
    nodes: Vec<Node>,
}

/// The current node collection, keyed by node id.
#[derive(Clone, Debug, Default)]
pub struct Topology {
    nodes: Vec<Node>,
    index_by_id: HashMap<String, usize>,
}

impl Topology {
    pub fn from_nodes(nodes: Vec<Node>) -> Result<Self> {
        let mut index_by_id = HashMap::with_capacity(nodes.len());
        for (index, node) in nodes.iter().enumerate() {
            if node.id.is_empty() {
                return Err(anyhow!("topology snapshot contains a node with an empty id"));
            }
            if index_by_id.insert(node.id.clone(), index).is_some() {
                return Err(anyhow!("duplicate node id {:?} in topology snapshot", node.id));
            }
        }

        Ok(Self { nodes, index_by_id })
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read topology snapshot {}", path.display()))?;
        let snapshot: Snapshot = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse topology snapshot {}", path.display()))?;

        Self::from_nodes(snapshot.nodes)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index_by_id.contains_key(id)
    }

    pub fn get(&self, id: &str) -> Option<&Node> {
        self.index_by_id.get(id).map(|&index| &self.nodes[index])
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_defaults_for_optional_fields() {
        let topology = Topology::from_nodes(
            serde_json::from_str::<Snapshot>(
                r#"{"nodes": [{"id": "n1", "label": "nginx", "shape": "hexagon"}]}"#,
            )
            .unwrap()
            .nodes,
        )
        .unwrap();

        let node = topology.get("n1").unwrap();
        assert_eq!(node.label, "nginx");
        assert_eq!(node.sub_label, "");
        assert!(!node.stack);
        assert!(node.rank.is_none());
        assert!(!node.pseudo);
        assert!(!node.focused);
        assert_eq!(node.transform, Placement::default());
    }

    #[test]
    fn snapshot_reads_camel_case_sub_label() {
        let snapshot: Snapshot = serde_json::from_str(
            r#"{"nodes": [{"id": "n1", "label": "db", "subLabel": "pg:16", "shape": "circle", "stack": true}]}"#,
        )
        .unwrap();

        assert_eq!(snapshot.nodes[0].sub_label, "pg:16");
        assert!(snapshot.nodes[0].stack);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let node = Node {
            id: "n1".to_owned(),
            label: String::new(),
            sub_label: String::new(),
            shape: "circle".to_owned(),
            stack: false,
            rank: None,
            pseudo: false,
            highlighted: false,
            blurred: false,
            focused: false,
            transform: Placement::default(),
        };

        let error = Topology::from_nodes(vec![node.clone(), node]).unwrap_err();
        assert!(error.to_string().contains("duplicate node id"));
    }
}

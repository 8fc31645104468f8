//! Public layout records handed to renderers.

use crate::config::NodeStyle;
use crate::geom::{BoundingBox, Point};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Parent id -> preferred order of its children.
pub type SuggestedNodeOrder = IndexMap<String, Vec<String>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LayoutUpdatePattern {
    /// Only elements added since the last pass are laid out.
    Scratch,
    /// Apply individual add/remove deltas. Not supported by the bundled managers.
    Incremental,
    /// The caller re-adds the whole model each pass; anything not re-added is pruned.
    IncrementalDiff,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PortSide {
    Top,
    Right,
    Bottom,
    Left,
}

impl PortSide {
    pub const ALL: [PortSide; 4] = [PortSide::Top, PortSide::Right, PortSide::Bottom, PortSide::Left];

    pub fn slot_count(self) -> usize {
        match self {
            PortSide::Top | PortSide::Bottom => 3,
            PortSide::Right | PortSide::Left => 2,
        }
    }

    pub(crate) fn index(self) -> usize {
        match self {
            PortSide::Top => 0,
            PortSide::Right => 1,
            PortSide::Bottom => 2,
            PortSide::Left => 3,
        }
    }
}

/// Attachment slot of an edge end on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EdgePort {
    #[default]
    Center,
    Top1,
    Top2,
    Top3,
    Right1,
    Right2,
    Bottom1,
    Bottom2,
    Bottom3,
    Left1,
    Left2,
}

impl EdgePort {
    pub const ALL: [EdgePort; 11] = [
        EdgePort::Center,
        EdgePort::Top1,
        EdgePort::Top2,
        EdgePort::Top3,
        EdgePort::Right1,
        EdgePort::Right2,
        EdgePort::Bottom1,
        EdgePort::Bottom2,
        EdgePort::Bottom3,
        EdgePort::Left1,
        EdgePort::Left2,
    ];

    /// Port at `slot` (zero-based) on `side`; slots past the side's capacity wrap around.
    pub fn on_side(side: PortSide, slot: usize) -> Self {
        let slot = slot % side.slot_count();
        match (side, slot) {
            (PortSide::Top, 0) => EdgePort::Top1,
            (PortSide::Top, 1) => EdgePort::Top2,
            (PortSide::Top, _) => EdgePort::Top3,
            (PortSide::Right, 0) => EdgePort::Right1,
            (PortSide::Right, _) => EdgePort::Right2,
            (PortSide::Bottom, 0) => EdgePort::Bottom1,
            (PortSide::Bottom, 1) => EdgePort::Bottom2,
            (PortSide::Bottom, _) => EdgePort::Bottom3,
            (PortSide::Left, 0) => EdgePort::Left1,
            (PortSide::Left, _) => EdgePort::Left2,
        }
    }

    /// Side and zero-based slot, `None` for `Center`.
    pub fn side_slot(self) -> Option<(PortSide, usize)> {
        Some(match self {
            EdgePort::Center => return None,
            EdgePort::Top1 => (PortSide::Top, 0),
            EdgePort::Top2 => (PortSide::Top, 1),
            EdgePort::Top3 => (PortSide::Top, 2),
            EdgePort::Right1 => (PortSide::Right, 0),
            EdgePort::Right2 => (PortSide::Right, 1),
            EdgePort::Bottom1 => (PortSide::Bottom, 0),
            EdgePort::Bottom2 => (PortSide::Bottom, 1),
            EdgePort::Bottom3 => (PortSide::Bottom, 2),
            EdgePort::Left1 => (PortSide::Left, 0),
            EdgePort::Left2 => (PortSide::Left, 1),
        })
    }

    pub(crate) fn index(self) -> usize {
        EdgePort::ALL.iter().position(|p| *p == self).unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub root_id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub is_expanded: bool,
    pub is_visible: bool,
    pub num_children: usize,
    pub node_style: NodeStyle,
    pub is_added_since_last_layout: bool,
}

impl LayoutNode {
    pub fn bounds(&self) -> BoundingBox {
        BoundingBox::new(self.x, self.y, self.width, self.height)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutEdge {
    pub id: String,
    pub source: String,
    pub destination: String,
    #[serde(default)]
    pub resource_id: Option<String>,
    pub segments: Vec<Point>,
    pub source_edge_port: EdgePort,
    pub target_edge_port: EdgePort,
    pub is_visible: bool,
    pub is_added_since_last_layout: bool,
}

impl LayoutEdge {
    pub fn is_self_edge(&self) -> bool {
        self.source == self.destination
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutGraph {
    pub bb: BoundingBox,
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<LayoutEdge>,
}

impl LayoutGraph {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn edge(&self, id: &str) -> Option<&LayoutEdge> {
        self.edges.iter().find(|e| e.id == id)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_wrap_per_side() {
        assert_eq!(EdgePort::on_side(PortSide::Right, 2), EdgePort::Right1);
        assert_eq!(EdgePort::on_side(PortSide::Top, 2), EdgePort::Top3);
        assert_eq!(EdgePort::Bottom2.side_slot(), Some((PortSide::Bottom, 1)));
        assert_eq!(EdgePort::Center.side_slot(), None);
        assert_eq!(EdgePort::Left2.index(), 10);
    }

    #[test]
    fn graph_serializes_with_camel_case_fields() {
        let graph = LayoutGraph {
            bb: BoundingBox::new(0.0, 0.0, 10.0, 10.0),
            nodes: Vec::new(),
            edges: vec![LayoutEdge {
                id: "a->b".to_string(),
                source: "a".to_string(),
                destination: "b".to_string(),
                resource_id: None,
                segments: vec![Point::new(0.0, 0.0)],
                source_edge_port: EdgePort::Right1,
                target_edge_port: EdgePort::Left1,
                is_visible: true,
                is_added_since_last_layout: false,
            }],
        };
        let json = graph.to_json().unwrap();
        assert!(json.contains("\"sourceEdgePort\": \"Right1\""));
        assert!(json.contains("\"isAddedSinceLastLayout\": false"));
    }
}

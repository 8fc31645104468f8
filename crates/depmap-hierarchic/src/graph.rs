//! The algorithm-side graph representation.
//!
//! Nodes carry a top-left position and a size; edges carry a polyline. Nesting lives in the
//! group-membership map, spacing in the halo (around any node) and inset (inside a group) maps.

use depmap_graph::{Graph, OrderedStringMap};

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Insets {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Insets {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// Node side an edge end attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Side {
    #[default]
    Center,
    Top,
    Right,
    Bottom,
    Left,
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct NodeBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeBox {
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct EdgePath {
    pub points: Vec<Point>,
    pub source_side: Side,
    pub target_side: Side,
}

#[derive(Debug, Clone, Default)]
pub struct HierarchicGraph {
    graph: Graph<NodeBox, EdgePath>,
    groups: OrderedStringMap<String>,
    halos: OrderedStringMap<Insets>,
    insets: OrderedStringMap<Insets>,
}

impl HierarchicGraph {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_node(&mut self, id: impl Into<String>, width: f64, height: f64) -> &mut NodeBox {
        let node = self.graph.node_entry(id, NodeBox::default);
        node.width = width;
        node.height = height;
        node
    }

    pub fn create_edge(
        &mut self,
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> &mut EdgePath {
        let path = self.graph.edge_entry(id, source, target, EdgePath::default);
        path.points.clear();
        path
    }

    /// Removes the node together with its group membership, halo, insets and incident edges.
    /// Members of a removed group become top-level.
    pub fn remove_node(&mut self, id: &str) -> Option<NodeBox> {
        let node = self.graph.remove_node(id)?;
        self.graph
            .retain_edges(|e| e.source != id && e.destination != id);
        self.groups.remove(id);
        self.groups.retain(|_, group| group.as_str() != id);
        self.halos.remove(id);
        self.insets.remove(id);
        Some(node)
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<EdgePath> {
        self.graph.remove_edge(id).map(|e| e.label)
    }

    pub fn set_group(&mut self, member: impl Into<String>, group: impl Into<String>) {
        self.groups.insert(member, group.into());
    }

    pub fn group_of(&self, member: &str) -> Option<&str> {
        self.groups.get(member).map(String::as_str)
    }

    /// Direct members of `group` in node insertion order.
    pub fn members(&self, group: &str) -> Vec<&str> {
        self.graph
            .nodes()
            .map(|(id, _)| id)
            .filter(|id| self.group_of(id) == Some(group))
            .collect()
    }

    /// Nodes that belong to no group, in insertion order.
    pub fn top_level_nodes(&self) -> Vec<&str> {
        self.graph
            .nodes()
            .map(|(id, _)| id)
            .filter(|id| self.group_of(id).is_none())
            .collect()
    }

    pub fn is_group(&self, id: &str) -> bool {
        self.groups.values().any(|g| g == id)
    }

    pub fn set_halo(&mut self, id: impl Into<String>, halo: Insets) {
        self.halos.insert(id, halo);
    }

    pub fn halo(&self, id: &str) -> Insets {
        self.halos.get(id).copied().unwrap_or_default()
    }

    pub fn set_insets(&mut self, group: impl Into<String>, insets: Insets) {
        self.insets.insert(group, insets);
    }

    pub fn insets(&self, group: &str) -> Insets {
        self.insets.get(group).copied().unwrap_or_default()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.graph.has_node(id)
    }

    pub fn node(&self, id: &str) -> Option<&NodeBox> {
        self.graph.node(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut NodeBox> {
        self.graph.node_mut(id)
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.graph.node_ids()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge(&self, id: &str) -> Option<&EdgePath> {
        self.graph.edge(id).map(|e| &e.label)
    }

    pub fn edge_mut(&mut self, id: &str) -> Option<&mut EdgePath> {
        self.graph.edge_mut(id).map(|e| &mut e.label)
    }

    pub fn edge_endpoints(&self, id: &str) -> Option<(&str, &str)> {
        self.graph
            .edge(id)
            .map(|e| (e.source.as_str(), e.destination.as_str()))
    }

    pub fn edge_ids(&self) -> Vec<String> {
        self.graph.edge_ids()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Chain of groups enclosing `id`, innermost first. Stops early on a membership cycle.
    pub fn ancestors(&self, id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let mut cur = id;
        while let Some(group) = self.group_of(cur) {
            if group == id || out.contains(&group) {
                break;
            }
            out.push(group);
            cur = group;
        }
        out
    }

    /// Shifts `id` and, recursively, all its members.
    pub fn translate_subtree(&mut self, id: &str, dx: f64, dy: f64) {
        let mut stack = vec![id.to_string()];
        let mut seen: Vec<String> = Vec::new();
        while let Some(cur) = stack.pop() {
            if seen.contains(&cur) {
                continue;
            }
            if let Some(n) = self.graph.node_mut(&cur) {
                n.x += dx;
                n.y += dy;
            }
            stack.extend(self.members(&cur).into_iter().map(str::to_string));
            seen.push(cur);
        }
    }
}

//! Graph storage for the simple layouter.

use crate::config::{LayoutConfig, NodeStyle};
use crate::geom::Point;
use crate::manager::edge_id;
use crate::model::{EdgePort, LayoutEdge};
use crate::node::{NodeHierarchy, ShLayoutNode};
use depmap_graph::{EdgeEntry, Graph};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ShLayoutEdge {
    pub resource_id: Option<String>,
    pub segments: Vec<Point>,
    pub source_edge_port: EdgePort,
    pub target_edge_port: EdgePort,
    pub is_visible: bool,
    pub is_added_since_last_layout: bool,
}

pub fn to_layout_edge(entry: &EdgeEntry<ShLayoutEdge>) -> LayoutEdge {
    layout_edge(&entry.id, &entry.source, &entry.destination, &entry.label)
}

fn layout_edge(id: &str, source: &str, destination: &str, e: &ShLayoutEdge) -> LayoutEdge {
    LayoutEdge {
        id: id.to_string(),
        source: source.to_string(),
        destination: destination.to_string(),
        resource_id: e.resource_id.clone(),
        segments: e.segments.clone(),
        source_edge_port: e.source_edge_port,
        target_edge_port: e.target_edge_port,
        is_visible: e.is_visible,
        is_added_since_last_layout: e.is_added_since_last_layout,
    }
}

#[derive(Debug, Clone, Default)]
pub struct ShLayoutGraph {
    graph: Graph<ShLayoutNode, ShLayoutEdge>,
}

impl ShLayoutGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts a node. An existing node keeps its geometry, connections and children. Without an
    /// explicit style, a node still on a default style follows expand/collapse to the matching
    /// default.
    pub fn add_node(
        &mut self,
        id: &str,
        parent_id: Option<&str>,
        root_id: &str,
        expanded: bool,
        style: Option<NodeStyle>,
        config: &LayoutConfig,
    ) -> &ShLayoutNode {
        let registry = &config.styles;
        let parent_id = parent_id.filter(|p| *p != id);
        match parent_id {
            Some(parent) => self.graph.set_parent(id, parent),
            None => self.graph.clear_parent(id),
        };

        let hierarchy = NodeHierarchy {
            parent_id: parent_id.map(str::to_string),
            root_id: root_id.to_string(),
            expanded,
        };
        let is_new = !self.graph.has_node(id);
        let node = self.graph.node_entry(id, || {
            let style = style
                .clone()
                .unwrap_or_else(|| registry.default_style(expanded));
            ShLayoutNode::new(hierarchy.clone(), style)
        });
        let was_expanded = node.hierarchy.expanded;
        node.hierarchy = hierarchy;
        node.is_added_since_last_layout = true;
        if is_new {
            return node;
        }
        match style {
            Some(style) if style != node.style => node.reset_size(style, config),
            Some(_) => {}
            None => {
                let on_default = node.style.name == registry.default_name(was_expanded);
                if was_expanded != expanded && on_default {
                    node.reset_size(registry.default_style(expanded), config);
                }
            }
        }
        node
    }

    pub fn remove_node(&mut self, id: &str) -> Option<ShLayoutNode> {
        self.graph.remove_node(id)
    }

    /// Upserts the edge `source->destination`. Connection counts move only when the edge is new.
    pub fn add_edge(
        &mut self,
        source: &str,
        destination: &str,
        resource_id: Option<&str>,
    ) -> LayoutEdge {
        let id = edge_id(source, destination);
        if !self.graph.has_edge(&id) {
            if let Some(n) = self.graph.node_mut(source) {
                n.add_outgoing_connection();
            }
            if let Some(n) = self.graph.node_mut(destination) {
                n.add_incoming_connection();
            }
        }
        let edge = self.graph.edge_entry(id.clone(), source, destination, || ShLayoutEdge {
            is_visible: true,
            ..ShLayoutEdge::default()
        });
        edge.is_added_since_last_layout = true;
        if resource_id.is_some() {
            edge.resource_id = resource_id.map(str::to_string);
        }
        layout_edge(&id, source, destination, edge)
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<EdgeEntry<ShLayoutEdge>> {
        let entry = self.graph.remove_edge(id)?;
        self.uncount(&entry);
        Some(entry)
    }

    fn uncount(&mut self, entry: &EdgeEntry<ShLayoutEdge>) {
        if let Some(n) = self.graph.node_mut(&entry.source) {
            n.remove_outgoing_connection();
        }
        if let Some(n) = self.graph.node_mut(&entry.destination) {
            n.remove_incoming_connection();
        }
    }

    /// Recounts every node's connections from the edges whose endpoints both exist.
    pub fn refresh_connection_counts(&mut self) {
        let pairs: Vec<(String, String)> = self
            .graph
            .edges()
            .filter(|e| self.graph.has_node(&e.source) && self.graph.has_node(&e.destination))
            .map(|e| (e.source.clone(), e.destination.clone()))
            .collect();
        for (_, n) in self.graph.nodes_mut() {
            n.connections = Default::default();
        }
        for (source, destination) in pairs {
            if let Some(n) = self.graph.node_mut(&source) {
                n.add_outgoing_connection();
            }
            if let Some(n) = self.graph.node_mut(&destination) {
                n.add_incoming_connection();
            }
        }
    }

    /// Drops every node and edge not re-added since the last pass. Returns the pruned node ids
    /// and edge ids.
    pub fn filter_for_incremental_diff(&mut self) -> (Vec<String>, Vec<String>) {
        let nodes = self
            .graph
            .retain_nodes(|_, n| n.is_added_since_last_layout);
        let edges: Vec<EdgeEntry<ShLayoutEdge>> = self
            .graph
            .retain_edges(|e| e.label.is_added_since_last_layout);
        for e in &edges {
            self.uncount(e);
        }
        (nodes, edges.into_iter().map(|e| e.id).collect())
    }

    pub fn mark_all_stale(&mut self) {
        for (_, n) in self.graph.nodes_mut() {
            n.is_added_since_last_layout = false;
        }
        for e in self.graph.edges_mut() {
            e.label.is_added_since_last_layout = false;
        }
    }

    /// Every registered node whose parent chain up to a root is intact.
    pub fn is_anchored(&self, id: &str) -> bool {
        let mut cur = id;
        for _ in 0..=self.graph.node_count() {
            if !self.graph.has_node(cur) {
                return false;
            }
            match self.graph.parent(cur) {
                Some(p) => cur = p,
                None => return true,
            }
        }
        false
    }

    /// Visible iff every ancestor is expanded.
    pub fn is_visible(&self, id: &str) -> bool {
        self.ancestors(id).iter().all(|a| {
            self.graph
                .node(a)
                .is_some_and(|n| n.hierarchy.expanded)
        })
    }

    /// Parent chain of `id`, nearest first. Stops at a missing node or a cycle.
    pub fn ancestors(&self, id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let mut cur = id;
        while let Some(p) = self.graph.parent(cur) {
            if p == id || out.contains(&p) {
                break;
            }
            out.push(p);
            cur = p;
        }
        out
    }

    /// Top-most ancestor of `id`, or `id` itself.
    pub fn root_of<'a>(&'a self, id: &'a str) -> &'a str {
        self.ancestors(id).last().copied().unwrap_or(id)
    }

    /// `id` itself when visible, else its nearest visible ancestor.
    pub fn nearest_visible<'a>(&'a self, id: &'a str) -> &'a str {
        if self.is_visible(id) {
            return id;
        }
        self.ancestors(id)
            .into_iter()
            .find(|a| self.is_visible(a))
            .unwrap_or(id)
    }

    pub fn all_root_nodes(&self) -> Vec<&str> {
        self.graph.root_nodes()
    }

    pub fn neighbors(&self, id: &str) -> Vec<&str> {
        self.graph.neighbors(id)
    }

    pub fn children(&self, id: &str) -> &[String] {
        self.graph.children(id)
    }

    pub fn parent(&self, id: &str) -> Option<&str> {
        self.graph.parent(id)
    }

    pub fn node(&self, id: &str) -> Option<&ShLayoutNode> {
        self.graph.node(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut ShLayoutNode> {
        self.graph.node_mut(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &ShLayoutNode)> {
        self.graph.nodes()
    }

    pub fn node_ids(&self) -> Vec<String> {
        self.graph.node_ids()
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge(&self, id: &str) -> Option<&EdgeEntry<ShLayoutEdge>> {
        self.graph.edge(id)
    }

    pub fn edge_mut(&mut self, id: &str) -> Option<&mut EdgeEntry<ShLayoutEdge>> {
        self.graph.edge_mut(id)
    }

    pub fn edges(&self) -> impl Iterator<Item = &EdgeEntry<ShLayoutEdge>> {
        self.graph.edges()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn has_node(&self, id: &str) -> bool {
        self.graph.has_node(id)
    }

    pub fn clear(&mut self) {
        self.graph.clear();
    }
}

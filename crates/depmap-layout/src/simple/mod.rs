//! Layered layout for a single map.
//!
//! Root nodes are layered left to right by their (lifted) edges; each root is sized from its
//! children, which are arranged inside it by the style's content layout. A pass works on a
//! staged copy of the store and only replaces the committed store once it has finished.

mod layering;
mod routing;

pub use layering::assign_layers;

use crate::config::{LayoutConfig, NodeStyle};
use crate::content::ChildSlot;
use crate::geom::{BoundingBox, Point};
use crate::layer::Layer;
use crate::manager::LayoutManager;
use crate::model::{LayoutEdge, LayoutGraph, LayoutNode, LayoutUpdatePattern, SuggestedNodeOrder};
use crate::store::{ShLayoutGraph, to_layout_edge};
use crate::telemetry::{SharedTelemetry, TelemetryProperties, TelemetryProvider, default_telemetry};
use crate::{Error, Result};
use rustc_hash::{FxHashMap, FxHashSet};

const SOURCE: &str = "SimpleHierarchicalLayouter";

pub struct SimpleHierarchicalLayouter {
    config: LayoutConfig,
    graph: ShLayoutGraph,
    telemetry: SharedTelemetry,
}

impl Default for SimpleHierarchicalLayouter {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl std::fmt::Debug for SimpleHierarchicalLayouter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimpleHierarchicalLayouter")
            .field("config", &self.config)
            .field("graph", &self.graph)
            .finish_non_exhaustive()
    }
}

impl SimpleHierarchicalLayouter {
    pub fn new(config: LayoutConfig) -> Self {
        Self::with_telemetry(config, default_telemetry())
    }

    pub fn with_telemetry(config: LayoutConfig, telemetry: SharedTelemetry) -> Self {
        Self {
            config,
            graph: ShLayoutGraph::new(),
            telemetry,
        }
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    /// The committed store.
    pub fn graph(&self) -> &ShLayoutGraph {
        &self.graph
    }
}

impl LayoutManager for SimpleHierarchicalLayouter {
    fn add_node(
        &mut self,
        id: &str,
        parent_id: Option<&str>,
        root_id: &str,
        expanded: bool,
        style: Option<NodeStyle>,
    ) -> LayoutNode {
        self.graph
            .add_node(id, parent_id, root_id, expanded, style, &self.config)
            .to_layout_node(id)
    }

    fn add_edge(&mut self, source: &str, destination: &str, resource_id: Option<&str>) -> LayoutEdge {
        self.graph.add_edge(source, destination, resource_id)
    }

    fn remove_node(&mut self, id: &str) {
        self.graph.remove_node(id);
    }

    fn remove_edge(&mut self, id: &str) {
        self.graph.remove_edge(id);
    }

    fn do_layout(
        &mut self,
        pattern: LayoutUpdatePattern,
        suggested_node_order: Option<&SuggestedNodeOrder>,
    ) -> Result<LayoutGraph> {
        if !self.is_layout_type_supported(pattern) {
            return Err(Error::UnsupportedPattern { pattern });
        }

        let mut staged = self.graph.clone();
        if pattern == LayoutUpdatePattern::IncrementalDiff {
            let (nodes, edges) = staged.filter_for_incremental_diff();
            if !nodes.is_empty() || !edges.is_empty() {
                tracing::debug!(nodes = nodes.len(), edges = edges.len(), "pruned stale elements");
                let mut props = TelemetryProperties::new();
                props.insert("nodes".to_string(), nodes.len().into());
                props.insert("edges".to_string(), edges.len().into());
                self.telemetry.info(
                    "pruned stale elements",
                    SOURCE,
                    "filterGraphForIncrementalDiff",
                    Some(&props),
                );
            }
        }

        let layout = LayoutPass {
            graph: &mut staged,
            config: &self.config,
            suggested: suggested_node_order,
            telemetry: self.telemetry.as_ref(),
            scope: FxHashSet::default(),
            relative: FxHashMap::default(),
        }
        .run();

        self.graph = staged;
        Ok(layout)
    }

    fn clear_graph(&mut self) {
        self.graph.clear();
    }

    fn is_layout_type_supported(&self, pattern: LayoutUpdatePattern) -> bool {
        !matches!(pattern, LayoutUpdatePattern::Incremental)
    }

    fn node(&self, id: &str) -> Option<LayoutNode> {
        self.graph.node(id).map(|n| n.to_layout_node(id))
    }

    fn edge(&self, id: &str) -> Option<LayoutEdge> {
        self.graph.edge(id).map(to_layout_edge)
    }
}

struct LayoutPass<'a> {
    graph: &'a mut ShLayoutGraph,
    config: &'a LayoutConfig,
    suggested: Option<&'a SuggestedNodeOrder>,
    telemetry: &'a dyn TelemetryProvider,
    scope: FxHashSet<String>,
    /// Child positions relative to their parent's content origin.
    relative: FxHashMap<String, Point>,
}

impl LayoutPass<'_> {
    fn run(mut self) -> LayoutGraph {
        let order = self.compute_scope();
        self.graph.refresh_connection_counts();
        self.compute_visibility(&order);

        let roots: Vec<String> = self
            .graph
            .all_root_nodes()
            .into_iter()
            .filter(|id| self.scope.contains(*id))
            .map(str::to_string)
            .collect();
        for root in &roots {
            self.size_subtree(root);
        }

        let mut layers = layering::build_layers(self.graph, &roots, &self.scope, self.config);
        self.compute_nodes_layout(&mut layers);
        for root in &roots {
            self.place_children(root);
        }

        let edge_ids = routing::compute_edges_layout(
            self.graph,
            &self.scope,
            &layers,
            self.config,
            self.telemetry,
        );

        self.graph.mark_all_stale();

        let nodes: Vec<LayoutNode> = order
            .iter()
            .filter_map(|id| self.graph.node(id).map(|n| n.to_layout_node(id)))
            .collect();
        let edges: Vec<LayoutEdge> = edge_ids
            .iter()
            .filter_map(|id| self.graph.edge(id).map(to_layout_edge))
            .collect();
        let bb = BoundingBox::from_rects(nodes.iter().filter(|n| n.is_visible).map(|n| n.bounds()))
            .unwrap_or_default();
        tracing::debug!(
            nodes = nodes.len(),
            edges = edges.len(),
            layers = layers.len(),
            "simple layout pass finished"
        );
        LayoutGraph { bb, nodes, edges }
    }

    /// Nodes laid out this pass, in stored order: flagged nodes whose ancestors are all present
    /// and flagged. Orphans are reported and left out.
    fn compute_scope(&mut self) -> Vec<String> {
        let mut order = Vec::new();
        for (id, node) in self.graph.nodes() {
            if !node.is_added_since_last_layout {
                continue;
            }
            if !self.graph.is_anchored(id) {
                let parent = node.hierarchy.parent_id.as_deref().unwrap_or_default();
                self.telemetry.info(
                    "skipped node whose parent is missing",
                    SOURCE,
                    "doLayout",
                    Some(&crate::telemetry::props([("nodeId", id), ("parentId", parent)])),
                );
                continue;
            }
            let ancestors_flagged = self.graph.ancestors(id).iter().all(|a| {
                self.graph
                    .node(a)
                    .is_some_and(|n| n.is_added_since_last_layout)
            });
            if ancestors_flagged {
                order.push(id.to_string());
            }
        }
        self.scope = order.iter().cloned().collect();
        order
    }

    fn compute_visibility(&mut self, order: &[String]) {
        for id in order {
            let visible = self.graph.is_visible(id);
            if let Some(n) = self.graph.node_mut(id) {
                n.is_visible = visible;
            }
        }
    }

    /// Scoped children of `id`; ids named by the suggested order come first, in that order.
    fn scoped_children(&self, id: &str) -> Vec<String> {
        let mut children: Vec<String> = self
            .graph
            .children(id)
            .iter()
            .filter(|c| self.scope.contains(*c))
            .cloned()
            .collect();
        if let Some(preferred) = self.suggested.and_then(|s| s.get(id)) {
            let mut ordered: Vec<String> = preferred
                .iter()
                .filter(|c| children.contains(c))
                .fold(Vec::new(), |mut acc, c| {
                    if !acc.contains(c) {
                        acc.push(c.clone());
                    }
                    acc
                });
            children.retain(|c| !ordered.contains(c));
            ordered.append(&mut children);
            children = ordered;
        }
        children
    }

    /// Sizes `id` bottom-up. Expanded nodes are sized around their arranged children; collapsed
    /// nodes take their style's base size.
    fn size_subtree(&mut self, id: &str) {
        let children = self.scoped_children(id);
        for child in &children {
            self.size_subtree(child);
        }
        let Some(expanded) = self.graph.node(id).map(|n| n.hierarchy.expanded) else {
            return;
        };

        let mut slots: Vec<ChildSlot> = Vec::new();
        let mut links: Vec<(usize, usize)> = Vec::new();
        if expanded && !children.is_empty() {
            slots = children
                .iter()
                .filter_map(|c| {
                    let g = self.graph.node(c)?.geometry;
                    Some(ChildSlot::new(c.clone(), g.width, g.height))
                })
                .collect();
            links = self.sibling_links(id, &slots);
        }

        let config = self.config;
        if let Some(node) = self.graph.node_mut(id) {
            node.num_children = children.len();
            node.calculate_size(&mut slots, &links, config);
        }
        for slot in slots {
            self.relative.insert(slot.id, Point::new(slot.x, slot.y));
        }
    }

    /// Edges among the scoped descendants of `parent`, lifted onto its direct children.
    fn sibling_links(&self, parent: &str, slots: &[ChildSlot]) -> Vec<(usize, usize)> {
        let index: FxHashMap<&str, usize> = slots
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id.as_str(), i))
            .collect();
        let lift = |id: &str| -> Option<usize> {
            if let Some(&i) = index.get(id) {
                return Some(i);
            }
            self.graph
                .ancestors(id)
                .into_iter()
                .find_map(|a| index.get(a).copied())
        };
        self.graph
            .edges()
            .filter(|e| self.scope.contains(&e.source) && self.scope.contains(&e.destination))
            .filter(|e| {
                let a = self.graph.ancestors(&e.source);
                let b = self.graph.ancestors(&e.destination);
                a.contains(&parent) && b.contains(&parent)
            })
            .filter_map(|e| {
                let v = lift(&e.source)?;
                let w = lift(&e.destination)?;
                (v != w).then_some((v, w))
            })
            .collect()
    }

    /// Places layers left to right, each centered on the tallest one.
    fn compute_nodes_layout(&mut self, layers: &mut [Layer]) {
        for layer in layers.iter_mut() {
            layer.compute_layer_size();
        }
        let canvas_height = layers.iter().map(|l| l.layer_height).fold(0.0, f64::max);
        let mut running_x = 0.0;
        for layer in layers.iter_mut() {
            layer.compute_layer_coordinates(running_x, canvas_height);
            layer.compute_nodes_layout();
            for n in layer.nodes() {
                if let Some(node) = self.graph.node_mut(&n.id) {
                    node.set_position(n.x, n.y);
                }
            }
            running_x += layer.layer_width + self.config.minimum_layer_distance;
        }
    }

    /// Positions descendants from their parent's content origin. Children of a collapsed node
    /// sit at its top-left corner.
    fn place_children(&mut self, id: &str) {
        let Some(node) = self.graph.node(id) else {
            return;
        };
        let expanded = node.hierarchy.expanded;
        let origin = node.content_origin();
        let corner = Point::new(node.geometry.x, node.geometry.y);
        for child in self.scoped_children(id) {
            let pos = match self.relative.get(&child) {
                Some(rel) if expanded => Point::new(origin.x + rel.x, origin.y + rel.y),
                _ => corner,
            };
            if let Some(n) = self.graph.node_mut(&child) {
                n.set_position(pos.x, pos.y);
            }
            self.place_children(&child);
        }
    }
}

//! Layout of nested groups through a pluggable algorithm.
//!
//! The manager keeps its own node and edge records as the only source of truth. Every pass
//! translates the records in scope into a fresh [`HierarchicGraph`] (expanded parents become
//! groups, style margins become halos, paddings become insets), hands it to the configured
//! [`LayoutAlgorithm`] and copies positions and routes back. Nothing is mirrored between calls.

mod algorithm;
mod column;
mod recursive;
mod self_link;

pub use algorithm::{LayoutAlgorithm, LayoutGraphAccess};
pub use column::SimpleColumnLayouter;
pub use recursive::RecursiveHierarchicColumnLayouter;
pub use self_link::SelfLinkRouter;

use crate::config::{Insets, LayoutConfig, NodeStyle};
use crate::geom::{BoundingBox, Point};
use crate::manager::{LayoutManager, edge_id};
use crate::model::{
    EdgePort, LayoutEdge, LayoutGraph, LayoutNode, LayoutUpdatePattern, PortSide,
    SuggestedNodeOrder,
};
use crate::telemetry::{
    SharedTelemetry, TelemetryProperties, TelemetryProvider, default_telemetry, props,
};
use crate::{Error, Result};
use depmap_graph::OrderedStringMap;
use depmap_hierarchic::HierarchicGraph;
use rustc_hash::{FxHashMap, FxHashSet};

const SOURCE: &str = "HierarchicLayoutManager";

#[derive(Debug, Clone, Default)]
struct Model {
    nodes: OrderedStringMap<LayoutNode>,
    edges: OrderedStringMap<LayoutEdge>,
}

impl Model {
    /// Parent chain of `id`, nearest first. Stops at a missing parent or a cycle.
    fn ancestors(&self, id: &str) -> Vec<&str> {
        let mut out: Vec<&str> = Vec::new();
        let mut cur = self.nodes.get(id);
        while let Some(parent) = cur.and_then(|n| n.parent_id.as_deref()) {
            if parent == id || out.contains(&parent) {
                break;
            }
            out.push(parent);
            cur = self.nodes.get(parent);
        }
        out
    }

    fn is_anchored(&self, id: &str) -> bool {
        let mut cur = self.nodes.get(id);
        let mut steps = 0usize;
        while let Some(node) = cur {
            let Some(parent) = node.parent_id.as_deref() else {
                return true;
            };
            steps += 1;
            if steps > self.nodes.len() {
                return false;
            }
            cur = self.nodes.get(parent);
        }
        false
    }

    fn is_visible(&self, id: &str) -> bool {
        self.ancestors(id)
            .iter()
            .all(|a| self.nodes.get(a).is_some_and(|n| n.is_expanded))
    }

    fn nearest_visible<'a>(&'a self, id: &'a str) -> &'a str {
        if self.is_visible(id) {
            return id;
        }
        self.ancestors(id)
            .into_iter()
            .find(|a| self.is_visible(a))
            .unwrap_or(id)
    }

    fn prune_stale(&mut self) -> (usize, usize) {
        let (nodes, edges) = (self.nodes.len(), self.edges.len());
        self.nodes.retain(|_, n| n.is_added_since_last_layout);
        self.edges.retain(|_, e| e.is_added_since_last_layout);
        (nodes - self.nodes.len(), edges - self.edges.len())
    }

    fn mark_all_stale(&mut self) {
        for n in self.nodes.values_mut() {
            n.is_added_since_last_layout = false;
        }
        for e in self.edges.values_mut() {
            e.is_added_since_last_layout = false;
        }
    }
}

/// Lays out nested groups with a [`LayoutAlgorithm`] over a [`HierarchicGraph`].
///
/// Supports [`LayoutUpdatePattern::Scratch`] and [`LayoutUpdatePattern::IncrementalDiff`].
/// Algorithm failures are reported to telemetry and returned unchanged; the committed records
/// are left as they were before the call.
pub struct HierarchicLayoutManager<A = RecursiveHierarchicColumnLayouter> {
    config: LayoutConfig,
    algorithm: A,
    model: Model,
    telemetry: SharedTelemetry,
}

impl Default for HierarchicLayoutManager {
    fn default() -> Self {
        Self::new(LayoutConfig::default())
    }
}

impl<A: std::fmt::Debug> std::fmt::Debug for HierarchicLayoutManager<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchicLayoutManager")
            .field("config", &self.config)
            .field("algorithm", &self.algorithm)
            .field("nodes", &self.model.nodes.len())
            .field("edges", &self.model.edges.len())
            .finish_non_exhaustive()
    }
}

impl HierarchicLayoutManager {
    pub fn new(config: LayoutConfig) -> Self {
        let algorithm = RecursiveHierarchicColumnLayouter::new(&config);
        Self::with_algorithm(config, algorithm)
    }
}

impl<A: LayoutAlgorithm<HierarchicGraph>> HierarchicLayoutManager<A> {
    pub fn with_algorithm(config: LayoutConfig, algorithm: A) -> Self {
        Self {
            config,
            algorithm,
            model: Model::default(),
            telemetry: default_telemetry(),
        }
    }

    pub fn with_telemetry(mut self, telemetry: SharedTelemetry) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn config(&self) -> &LayoutConfig {
        &self.config
    }

    pub fn algorithm(&self) -> &A {
        &self.algorithm
    }

    /// Re-routes every edge over the committed node geometry. Nodes do not move and no element
    /// changes its added-since-last-layout flag.
    pub fn redo_edge_layout(&mut self) -> Result<LayoutGraph> {
        let mut staged = self.model.clone();
        let mut pass = Pass::new(&mut staged, None, self.telemetry.as_ref());
        let order = pass.anchored_nodes();
        let mut graph = pass.establish_node_hierarchy(&order, true);
        let routed = pass.lift_edges(&mut graph, false);

        if let Err(err) = self.algorithm.route_edges(&mut graph) {
            self.telemetry.error(&err, SOURCE, "redoEdgeLayout", None);
            return Err(err);
        }
        pass.update_edge_layouts(&graph, &routed);
        let layout = pass.output(&order);
        tracing::debug!(edges = routed.len(), "edges re-routed");

        self.model = staged;
        Ok(layout)
    }
}

impl<A: LayoutAlgorithm<HierarchicGraph>> LayoutManager for HierarchicLayoutManager<A> {
    fn add_node(
        &mut self,
        id: &str,
        parent_id: Option<&str>,
        root_id: &str,
        expanded: bool,
        style: Option<NodeStyle>,
    ) -> LayoutNode {
        let registry = &self.config.styles;
        let node = self.model.nodes.get_or_insert_with(id, || {
            let style = style
                .clone()
                .unwrap_or_else(|| registry.default_style(expanded));
            LayoutNode {
                id: id.to_string(),
                parent_id: None,
                root_id: root_id.to_string(),
                x: 0.0,
                y: 0.0,
                width: style.width,
                height: style.height,
                is_expanded: expanded,
                is_visible: true,
                num_children: 0,
                node_style: style,
                is_added_since_last_layout: true,
            }
        });

        let was_expanded = node.is_expanded;
        let next_style = match style {
            Some(style) => style,
            None if was_expanded != expanded
                && node.node_style.name == registry.default_name(was_expanded) =>
            {
                registry.default_style(expanded)
            }
            None => node.node_style.clone(),
        };
        if node.node_style != next_style {
            node.width = next_style.width;
            node.height = next_style.height;
            node.node_style = next_style;
        }
        node.parent_id = parent_id.filter(|p| *p != id).map(str::to_string);
        node.root_id = root_id.to_string();
        node.is_expanded = expanded;
        node.is_added_since_last_layout = true;
        node.clone()
    }

    fn add_edge(&mut self, source: &str, destination: &str, resource_id: Option<&str>) -> LayoutEdge {
        let id = edge_id(source, destination);
        let edge = self.model.edges.get_or_insert_with(id.clone(), || LayoutEdge {
            id: id.clone(),
            source: source.to_string(),
            destination: destination.to_string(),
            resource_id: None,
            segments: Vec::new(),
            source_edge_port: EdgePort::Center,
            target_edge_port: EdgePort::Center,
            is_visible: true,
            is_added_since_last_layout: true,
        });
        edge.source = source.to_string();
        edge.destination = destination.to_string();
        edge.is_added_since_last_layout = true;
        if resource_id.is_some() {
            edge.resource_id = resource_id.map(str::to_string);
        }
        edge.clone()
    }

    fn remove_node(&mut self, id: &str) {
        self.model.nodes.remove(id);
    }

    fn remove_edge(&mut self, id: &str) {
        self.model.edges.remove(id);
    }

    fn do_layout(
        &mut self,
        pattern: LayoutUpdatePattern,
        suggested_node_order: Option<&SuggestedNodeOrder>,
    ) -> Result<LayoutGraph> {
        if !self.is_layout_type_supported(pattern) {
            return Err(Error::UnsupportedPattern { pattern });
        }

        let mut staged = self.model.clone();
        if pattern == LayoutUpdatePattern::IncrementalDiff {
            let (nodes, edges) = staged.prune_stale();
            if nodes > 0 || edges > 0 {
                tracing::debug!(nodes, edges, "pruned stale elements");
                let mut props = TelemetryProperties::new();
                props.insert("nodes".to_string(), nodes.into());
                props.insert("edges".to_string(), edges.into());
                self.telemetry.info(
                    "pruned stale elements",
                    SOURCE,
                    "filterGraphForIncrementalDiff",
                    Some(&props),
                );
            }
        }

        let mut pass = Pass::new(&mut staged, suggested_node_order, self.telemetry.as_ref());
        let order = pass.compute_scope();
        pass.compute_visibility(&order);
        let mut graph = pass.establish_node_hierarchy(&order, false);
        let routed = pass.lift_edges(&mut graph, true);

        if let Err(err) = self.algorithm.apply_layout(&mut graph) {
            self.telemetry.error(&err, SOURCE, "applyLayout", None);
            return Err(err);
        }

        pass.update_node_layouts(&graph, &order);
        pass.update_edge_layouts(&graph, &routed);
        pass.translate_graph_to_origin(&order);
        pass.model.mark_all_stale();
        let layout = pass.output(&order);
        tracing::debug!(
            nodes = layout.nodes.len(),
            edges = layout.edges.len(),
            "hierarchic layout pass finished"
        );

        self.model = staged;
        Ok(layout)
    }

    fn clear_graph(&mut self) {
        self.model = Model::default();
    }

    fn is_layout_type_supported(&self, pattern: LayoutUpdatePattern) -> bool {
        !matches!(pattern, LayoutUpdatePattern::Incremental)
    }

    fn node(&self, id: &str) -> Option<LayoutNode> {
        self.model.nodes.get(id).cloned()
    }

    fn edge(&self, id: &str) -> Option<LayoutEdge> {
        self.model.edges.get(id).cloned()
    }
}

fn to_insets(i: &Insets) -> depmap_hierarchic::Insets {
    depmap_hierarchic::Insets {
        top: i.top,
        right: i.right,
        bottom: i.bottom,
        left: i.left,
    }
}

/// Space reserved inside a group: its padding, plus the header block the style's own box
/// occupies above the content.
fn group_insets(style: &NodeStyle) -> depmap_hierarchic::Insets {
    let p = &style.padding;
    depmap_hierarchic::Insets {
        top: p.top + style.height,
        right: p.right + style.width / 2.0,
        bottom: p.bottom,
        left: p.left + style.width / 2.0,
    }
}

struct Pass<'a> {
    model: &'a mut Model,
    suggested: Option<&'a SuggestedNodeOrder>,
    telemetry: &'a dyn TelemetryProvider,
    scope: FxHashSet<String>,
    /// Edges in scope, in stored order, whether routed or hidden.
    scoped_edges: Vec<String>,
}

impl<'a> Pass<'a> {
    fn new(
        model: &'a mut Model,
        suggested: Option<&'a SuggestedNodeOrder>,
        telemetry: &'a dyn TelemetryProvider,
    ) -> Self {
        Self {
            model,
            suggested,
            telemetry,
            scope: FxHashSet::default(),
            scoped_edges: Vec::new(),
        }
    }

    /// Flagged nodes whose ancestors are all present and flagged, in stored order.
    fn compute_scope(&mut self) -> Vec<String> {
        let mut order = Vec::new();
        for (id, node) in self.model.nodes.iter() {
            if !node.is_added_since_last_layout {
                continue;
            }
            if !self.model.is_anchored(id) {
                let parent = node.parent_id.as_deref().unwrap_or_default();
                self.telemetry.info(
                    "skipped node whose parent is missing",
                    SOURCE,
                    "establishNodeHierarchy",
                    Some(&props([("nodeId", id), ("parentId", parent)])),
                );
                continue;
            }
            let ancestors_flagged = self.model.ancestors(id).iter().all(|a| {
                self.model
                    .nodes
                    .get(a)
                    .is_some_and(|n| n.is_added_since_last_layout)
            });
            if ancestors_flagged {
                order.push(id.to_string());
            }
        }
        self.scope = order.iter().cloned().collect();
        order
    }

    /// Every node whose parent chain is intact, flagged or not.
    fn anchored_nodes(&mut self) -> Vec<String> {
        let order: Vec<String> = self
            .model
            .nodes
            .keys()
            .filter(|id| self.model.is_anchored(id))
            .map(str::to_string)
            .collect();
        self.scope = order.iter().cloned().collect();
        order
    }

    fn compute_visibility(&mut self, order: &[String]) {
        for id in order {
            let visible = self.model.is_visible(id);
            if let Some(n) = self.model.nodes.get_mut(id) {
                n.is_visible = visible;
            }
        }
    }

    /// Scoped children per parent; ids named by the suggested order come first, in that order.
    fn children(&self, order: &[String]) -> FxHashMap<String, Vec<String>> {
        let mut children: FxHashMap<String, Vec<String>> = FxHashMap::default();
        for id in order {
            if let Some(parent) = self.model.nodes.get(id).and_then(|n| n.parent_id.as_deref()) {
                children.entry(parent.to_string()).or_default().push(id.clone());
            }
        }
        let Some(suggested) = self.suggested else {
            return children;
        };
        for (parent, list) in children.iter_mut() {
            let Some(preferred) = suggested.get(parent) else {
                continue;
            };
            let mut ordered: Vec<String> = Vec::with_capacity(list.len());
            for c in preferred {
                if list.contains(c) && !ordered.contains(c) {
                    ordered.push(c.clone());
                }
            }
            list.retain(|c| !ordered.contains(c));
            ordered.append(list);
            *list = ordered;
        }
        children
    }

    /// Builds the algorithm graph from the scoped records: visible expanded parents with visible
    /// children become groups, every other visible node a leaf of its style's size. Hidden nodes
    /// are left out. With `keep_geometry` the stored boxes are copied in as well.
    fn establish_node_hierarchy(&mut self, order: &[String], keep_geometry: bool) -> HierarchicGraph {
        let children = self.children(order);
        let mut graph = HierarchicGraph::new();
        let roots: Vec<&String> = order
            .iter()
            .filter(|id| {
                self.model
                    .nodes
                    .get(id)
                    .is_some_and(|n| n.parent_id.is_none())
            })
            .collect();

        let mut stack: Vec<(String, Option<String>)> = roots
            .into_iter()
            .rev()
            .map(|id| (id.clone(), None))
            .collect();
        let mut num_children: Vec<(String, usize)> = Vec::new();
        while let Some((id, group)) = stack.pop() {
            let Some(node) = self.model.nodes.get(&id) else {
                continue;
            };
            let kids = children.get(&id).map(Vec::as_slice).unwrap_or_default();
            num_children.push((id.clone(), kids.len()));
            if !self.model.is_visible(&id) {
                for kid in kids.iter().rev() {
                    stack.push((kid.clone(), None));
                }
                continue;
            }

            let style = &node.node_style;
            let is_group = node.is_expanded && !kids.is_empty();
            let rect = node.bounds();
            let b = graph.create_node(id.clone(), style.width, style.height);
            if keep_geometry {
                b.x = rect.x;
                b.y = rect.y;
                b.width = rect.width;
                b.height = rect.height;
            }
            graph.set_halo(id.clone(), to_insets(&style.margin));
            if is_group {
                graph.set_insets(id.clone(), group_insets(style));
            }
            if let Some(group) = group {
                graph.set_group(id.clone(), group);
            }
            let member_of = is_group.then(|| id.clone());
            for kid in kids.iter().rev() {
                stack.push((kid.clone(), member_of.clone()));
            }
        }

        for (id, count) in num_children {
            if let Some(n) = self.model.nodes.get_mut(&id) {
                n.num_children = count;
            }
        }
        graph
    }

    /// Adds the scoped edges to `graph`, lifted onto the nearest visible endpoints. Edges that
    /// collapse onto a single node are hidden; edges naming an unknown node are reported and
    /// dropped. Returns the ids handed to the algorithm.
    fn lift_edges(&mut self, graph: &mut HierarchicGraph, only_added: bool) -> Vec<String> {
        let mut routed = Vec::new();
        let mut hidden = Vec::new();
        let mut scoped = Vec::new();
        for (id, e) in self.model.edges.iter() {
            if only_added && !e.is_added_since_last_layout {
                continue;
            }
            let known = |n: &str| self.model.nodes.contains_key(n);
            if !known(&e.source) || !known(&e.destination) {
                tracing::debug!(edge = id, "dropped dangling edge");
                self.telemetry.info(
                    "dropped edge referencing an unknown node",
                    SOURCE,
                    "establishNodeHierarchy",
                    Some(&props([
                        ("edgeId", id),
                        ("source", e.source.as_str()),
                        ("destination", e.destination.as_str()),
                    ])),
                );
                continue;
            }
            if !self.scope.contains(&e.source) || !self.scope.contains(&e.destination) {
                continue;
            }
            scoped.push(id.to_string());

            let source = self.model.nearest_visible(&e.source);
            let target = self.model.nearest_visible(&e.destination);
            let self_link = e.source == e.destination && self.model.is_visible(&e.source);
            if source == target && !self_link {
                hidden.push(id.to_string());
                continue;
            }
            graph.create_edge(id, source, target);
            routed.push(id.to_string());
        }

        for id in &hidden {
            if let Some(e) = self.model.edges.get_mut(id) {
                e.is_visible = false;
                e.segments.clear();
                e.source_edge_port = EdgePort::Center;
                e.target_edge_port = EdgePort::Center;
            }
        }
        self.scoped_edges = scoped;
        routed
    }

    /// Copies boxes back. A hidden node takes the corner of its nearest visible ancestor.
    fn update_node_layouts(&mut self, graph: &HierarchicGraph, order: &[String]) {
        let mut boxes: Vec<(String, BoundingBox)> = Vec::with_capacity(order.len());
        for id in order {
            if let Some(rect) = graph.node_rect(id) {
                boxes.push((id.clone(), rect));
                continue;
            }
            let anchor = self.model.nearest_visible(id);
            let Some(corner) = graph.node_rect(anchor) else {
                continue;
            };
            let Some(n) = self.model.nodes.get(id) else {
                continue;
            };
            boxes.push((
                id.clone(),
                BoundingBox::new(corner.x, corner.y, n.width, n.height),
            ));
        }
        for (id, rect) in boxes {
            if let Some(n) = self.model.nodes.get_mut(&id) {
                n.x = rect.x;
                n.y = rect.y;
                n.width = rect.width;
                n.height = rect.height;
            }
        }
    }

    /// Copies routes back. Self-links take their node's first two right slots; every other end
    /// gets the next slot on its side, in order of the opposite end's position along that side.
    fn update_edge_layouts(&mut self, graph: &HierarchicGraph, routed: &[String]) {
        struct Route<'r> {
            id: &'r str,
            source: String,
            target: String,
            points: Vec<Point>,
            sides: (Option<PortSide>, Option<PortSide>),
            ports: (EdgePort, EdgePort),
        }

        let mut routes: Vec<Route<'_>> = Vec::with_capacity(routed.len());
        for id in routed {
            let Some((source, target)) = graph.edge_endpoints(id) else {
                continue;
            };
            routes.push(Route {
                id,
                source: source.to_string(),
                target: target.to_string(),
                points: graph.edge_points(id),
                sides: graph.edge_sides(id),
                ports: (EdgePort::Center, EdgePort::Center),
            });
        }

        let mut next_slot: FxHashMap<(String, PortSide), usize> = FxHashMap::default();
        for r in routes.iter_mut().filter(|r| r.source == r.target) {
            let slot = next_slot.entry((r.source.clone(), PortSide::Right)).or_default();
            r.ports = (
                EdgePort::on_side(PortSide::Right, *slot),
                EdgePort::on_side(PortSide::Right, *slot + 1),
            );
            *slot += 2;
        }

        // (route index, is source end, side, position of the opposite end along the side)
        let mut ends: Vec<(usize, bool, PortSide, f64)> = Vec::new();
        for (i, r) in routes.iter().enumerate() {
            if r.source == r.target {
                continue;
            }
            let (Some(first), Some(last)) = (r.points.first(), r.points.last()) else {
                continue;
            };
            let along = |side: PortSide, p: &Point| match side {
                PortSide::Left | PortSide::Right => p.y,
                PortSide::Top | PortSide::Bottom => p.x,
            };
            if let Some(side) = r.sides.0 {
                ends.push((i, true, side, along(side, last)));
            }
            if let Some(side) = r.sides.1 {
                ends.push((i, false, side, along(side, first)));
            }
        }
        ends.sort_by(|a, b| a.3.total_cmp(&b.3).then(a.0.cmp(&b.0)));
        for (i, is_source, side, _) in ends {
            let r = &mut routes[i];
            let node = if is_source { &r.source } else { &r.target };
            let slot = next_slot.entry((node.clone(), side)).or_default();
            let port = EdgePort::on_side(side, *slot);
            *slot += 1;
            if is_source {
                r.ports.0 = port;
            } else {
                r.ports.1 = port;
            }
        }

        for r in routes {
            let Some(e) = self.model.edges.get_mut(r.id) else {
                continue;
            };
            e.is_visible = true;
            e.segments = r.points;
            e.source_edge_port = r.ports.0;
            e.target_edge_port = r.ports.1;
        }
    }

    /// Shifts the pass so the visible content starts at the origin.
    fn translate_graph_to_origin(&mut self, order: &[String]) {
        let visible = order
            .iter()
            .filter_map(|id| self.model.nodes.get(id))
            .filter(|n| n.is_visible)
            .map(LayoutNode::bounds);
        let Some(bb) = BoundingBox::from_rects(visible) else {
            return;
        };
        let (dx, dy) = (-bb.x, -bb.y);
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        for id in order {
            if let Some(n) = self.model.nodes.get_mut(id) {
                n.x += dx;
                n.y += dy;
            }
        }
        for id in &self.scoped_edges {
            if let Some(e) = self.model.edges.get_mut(id) {
                for p in &mut e.segments {
                    *p = Point::new(p.x + dx, p.y + dy);
                }
            }
        }
    }

    fn output(&self, order: &[String]) -> LayoutGraph {
        let nodes: Vec<LayoutNode> = order
            .iter()
            .filter_map(|id| self.model.nodes.get(id).cloned())
            .collect();
        let edges: Vec<LayoutEdge> = self
            .scoped_edges
            .iter()
            .filter_map(|id| self.model.edges.get(id).cloned())
            .collect();
        let bb = BoundingBox::from_rects(nodes.iter().filter(|n| n.is_visible).map(|n| n.bounds()))
            .unwrap_or_default();
        LayoutGraph { bb, nodes, edges }
    }
}

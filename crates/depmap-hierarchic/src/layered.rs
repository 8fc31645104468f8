//! Layered layout of a grouped graph.
//!
//! Each group is laid out bottom-up as its own scope: edges are lifted onto the scope's direct
//! members, cycles are broken, members are ranked by longest path and ordered by barycenter
//! sweeps, then ranks become columns from left to right. A group's size grows to fit its content
//! plus insets. Positions are made absolute top-down and every non-self edge is routed.

use crate::acyclic::longest_path_ranks;
use crate::graph::{HierarchicGraph, Point};
use crate::order::order_layers;
use crate::routing::route_edges;
use crate::{Error, Result};
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HierarchicOptions {
    /// Horizontal distance between adjacent columns.
    pub layer_spacing: f64,
    /// Vertical distance between nodes of the same column.
    pub node_spacing: f64,
    /// Distance between parallel edge lanes.
    pub edge_spacing: f64,
    pub order_sweeps: usize,
}

impl Default for HierarchicOptions {
    fn default() -> Self {
        Self {
            layer_spacing: 80.0,
            node_spacing: 30.0,
            edge_spacing: 12.0,
            order_sweeps: 4,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct HierarchicLayouter {
    pub options: HierarchicOptions,
}

impl HierarchicLayouter {
    pub fn new(options: HierarchicOptions) -> Self {
        Self { options }
    }

    pub fn apply_layout(&self, g: &mut HierarchicGraph) -> Result<()> {
        validate(g)?;

        let mut relative: FxHashMap<String, Point> = FxHashMap::default();
        self.layout_scope(g, None, &mut relative);

        let top: Vec<String> = g.top_level_nodes().into_iter().map(str::to_string).collect();
        for id in top {
            place_absolute(g, &id, Point::default(), &relative);
        }

        route_edges(g, &self.options);
        Ok(())
    }

    /// Re-routes edges against the current node positions without moving any node.
    pub fn route_edges(&self, g: &mut HierarchicGraph) {
        route_edges(g, &self.options);
    }

    /// Lays out the direct members of `scope` (top level when `None`) and returns the content
    /// extent. Member positions are stored relative to the scope's content origin.
    fn layout_scope(
        &self,
        g: &mut HierarchicGraph,
        scope: Option<&str>,
        relative: &mut FxHashMap<String, Point>,
    ) -> (f64, f64) {
        let members: Vec<String> = match scope {
            Some(group) => g.members(group),
            None => g.top_level_nodes(),
        }
        .into_iter()
        .map(str::to_string)
        .collect();
        if members.is_empty() {
            return (0.0, 0.0);
        }

        for m in &members {
            if g.is_group(m) {
                let (content_w, content_h) = self.layout_scope(g, Some(m), relative);
                let insets = g.insets(m);
                if let Some(n) = g.node_mut(m) {
                    n.width = n.width.max(content_w + insets.horizontal());
                    n.height = n.height.max(content_h + insets.vertical());
                }
            }
        }

        let index: FxHashMap<&str, usize> = members
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect();
        let mut edges: Vec<(usize, usize)> = Vec::new();
        for edge_id in g.edge_ids() {
            let Some((source, target)) = g.edge_endpoints(&edge_id) else {
                continue;
            };
            let (Some(v), Some(w)) = (lift(g, source, scope), lift(g, target, scope)) else {
                continue;
            };
            if let (Some(&vi), Some(&wi)) = (index.get(v), index.get(w)) {
                if vi != wi {
                    edges.push((vi, wi));
                }
            }
        }

        let ranks = longest_path_ranks(members.len(), &edges);
        let layer_count = ranks.iter().copied().max().unwrap_or(0) + 1;
        let mut layers: Vec<Vec<usize>> = vec![Vec::new(); layer_count];
        for (i, &r) in ranks.iter().enumerate() {
            layers[r].push(i);
        }
        order_layers(&mut layers, &edges, self.options.order_sweeps);

        // Footprint of a member is its box grown by its halo.
        let footprint = |g: &HierarchicGraph, id: &str| -> (f64, f64) {
            let halo = g.halo(id);
            let (w, h) = g.node(id).map(|n| (n.width, n.height)).unwrap_or_default();
            (w + halo.horizontal(), h + halo.vertical())
        };

        let mut columns: Vec<(f64, f64)> = Vec::with_capacity(layers.len());
        for layer in &layers {
            let mut width: f64 = 0.0;
            let mut height: f64 = 0.0;
            for &i in layer {
                let (fw, fh) = footprint(g, &members[i]);
                width = width.max(fw);
                height += fh;
            }
            height += self.options.node_spacing * layer.len().saturating_sub(1) as f64;
            columns.push((width, height));
        }
        let canvas_h = columns.iter().map(|c| c.1).fold(0.0, f64::max);

        let mut x = 0.0;
        for (layer, &(col_w, col_h)) in layers.iter().zip(&columns) {
            let mut y = (canvas_h - col_h) / 2.0;
            for &i in layer {
                let id = &members[i];
                let halo = g.halo(id);
                let (fw, fh) = footprint(g, id);
                relative.insert(
                    id.clone(),
                    Point::new(x + (col_w - fw) / 2.0 + halo.left, y + halo.top),
                );
                y += fh + self.options.node_spacing;
            }
            x += col_w + self.options.layer_spacing;
        }
        let content_w = (x - self.options.layer_spacing).max(0.0);

        tracing::debug!(
            scope = scope.unwrap_or("<root>"),
            members = members.len(),
            layers = layers.len(),
            "hierarchic scope laid out"
        );
        (content_w, canvas_h)
    }
}

fn place_absolute(
    g: &mut HierarchicGraph,
    id: &str,
    origin: Point,
    relative: &FxHashMap<String, Point>,
) {
    let rel = relative.get(id).copied().unwrap_or_default();
    let (x, y) = (origin.x + rel.x, origin.y + rel.y);
    if let Some(n) = g.node_mut(id) {
        n.x = x;
        n.y = y;
    }
    let insets = g.insets(id);
    let content = Point::new(x + insets.left, y + insets.top);
    let members: Vec<String> = g.members(id).into_iter().map(str::to_string).collect();
    for m in members {
        place_absolute(g, &m, content, relative);
    }
}

/// The member of `scope` that contains `id` (or is `id`).
fn lift<'a>(g: &'a HierarchicGraph, id: &'a str, scope: Option<&str>) -> Option<&'a str> {
    let mut cur = id;
    for _ in 0..=g.node_count() {
        if !g.has_node(cur) {
            return None;
        }
        let group = g.group_of(cur);
        if group == scope {
            return Some(cur);
        }
        cur = group?;
    }
    None
}

fn validate(g: &HierarchicGraph) -> Result<()> {
    for edge_id in g.edge_ids() {
        if let Some((source, target)) = g.edge_endpoints(&edge_id) {
            if !g.has_node(source) || !g.has_node(target) {
                return Err(Error::MissingEndpoint { edge_id });
            }
        }
    }
    for id in g.node_ids() {
        if let Some(group) = g.group_of(&id) {
            if !g.has_node(group) {
                return Err(Error::UnknownGroup {
                    member: id.clone(),
                    group: group.to_string(),
                });
            }
        }
        let mut cur = id.as_str();
        let mut steps = 0usize;
        while let Some(group) = g.group_of(cur) {
            steps += 1;
            if group == id || steps > g.node_count() {
                return Err(Error::CyclicGrouping { node: id.clone() });
            }
            cur = group;
        }
    }
    Ok(())
}

use super::algorithm::LayoutAlgorithm;
use super::column::SimpleColumnLayouter;
use super::self_link::SelfLinkRouter;
use crate::Result;
use crate::config::LayoutConfig;
use crate::geom::Point;
use depmap_hierarchic::{HierarchicGraph, HierarchicLayouter, HierarchicOptions, Insets};
use rustc_hash::FxHashMap;

/// Hierarchic layout with two refinements: groups whose members are unconnected leaves are
/// packed into columns and handed to the hierarchic pass as fixed boxes, and self-links are
/// routed through self-edge channels after everything else is placed.
#[derive(Debug, Clone)]
pub struct RecursiveHierarchicColumnLayouter {
    hierarchic: HierarchicLayouter,
    columns: SimpleColumnLayouter,
    self_links: SelfLinkRouter,
}

impl Default for RecursiveHierarchicColumnLayouter {
    fn default() -> Self {
        Self::new(&LayoutConfig::default())
    }
}

struct StashedMember {
    id: String,
    group: String,
    offset: Point,
    width: f64,
    height: f64,
    halo: Insets,
}

impl RecursiveHierarchicColumnLayouter {
    pub fn new(config: &LayoutConfig) -> Self {
        let options = HierarchicOptions {
            layer_spacing: config.minimum_layer_distance,
            node_spacing: config.node_to_node_distance,
            edge_spacing: config.distance_between_channels,
            ..HierarchicOptions::default()
        };
        Self {
            hierarchic: HierarchicLayouter::new(options),
            columns: SimpleColumnLayouter::new(config),
            self_links: SelfLinkRouter::new(config),
        }
    }

    /// Groups whose members are all leaves with no edges among them.
    fn column_groups(g: &HierarchicGraph) -> Vec<String> {
        let mut out = Vec::new();
        for id in g.node_ids() {
            let members = g.members(&id);
            if members.is_empty() || members.iter().any(|m| g.is_group(m)) {
                continue;
            }
            let linked = g.edge_ids().iter().any(|e| {
                g.edge_endpoints(e)
                    .is_some_and(|(s, t)| members.contains(&s) && members.contains(&t))
            });
            if !linked {
                out.push(id);
            }
        }
        out
    }

    fn stash_columns(&self, g: &mut HierarchicGraph) -> Vec<StashedMember> {
        let mut stash = Vec::new();
        for group in Self::column_groups(g) {
            let members: Vec<String> = g.members(&group).into_iter().map(str::to_string).collect();
            let footprints: Vec<(f64, f64)> = members
                .iter()
                .map(|m| {
                    let halo = g.halo(m);
                    let (w, h) = g.node(m).map(|n| (n.width, n.height)).unwrap_or_default();
                    (w + halo.horizontal(), h + halo.vertical())
                })
                .collect();
            let (positions, width, height) = self.columns.arrange(&footprints);

            let insets = g.insets(&group);
            if let Some(n) = g.node_mut(&group) {
                n.width = n.width.max(width + insets.horizontal());
                n.height = n.height.max(height + insets.vertical());
            }
            for (m, pos) in members.into_iter().zip(positions) {
                let halo = g.halo(&m);
                let (w, h) = g.node(&m).map(|n| (n.width, n.height)).unwrap_or_default();
                stash.push(StashedMember {
                    id: m,
                    group: group.clone(),
                    offset: Point::new(pos.x + halo.left, pos.y + halo.top),
                    width: w,
                    height: h,
                    halo,
                });
            }
        }
        stash
    }
}

impl LayoutAlgorithm<HierarchicGraph> for RecursiveHierarchicColumnLayouter {
    fn apply_layout(&self, g: &mut HierarchicGraph) -> Result<()> {
        let self_links: Vec<(String, String)> = g
            .edge_ids()
            .into_iter()
            .filter_map(|id| {
                let (s, t) = g.edge_endpoints(&id)?;
                (s == t).then(|| (id.clone(), s.to_string()))
            })
            .collect();
        for (id, _) in &self_links {
            g.remove_edge(id);
        }

        let stash = self.stash_columns(g);
        let member_group: FxHashMap<&str, &str> = stash
            .iter()
            .map(|m| (m.id.as_str(), m.group.as_str()))
            .collect();
        let stashed_edges: Vec<(String, String, String)> = g
            .edge_ids()
            .into_iter()
            .filter_map(|id| {
                let (s, t) = g.edge_endpoints(&id)?;
                (member_group.contains_key(s) || member_group.contains_key(t))
                    .then(|| (id.clone(), s.to_string(), t.to_string()))
            })
            .collect();
        for m in &stash {
            g.remove_node(&m.id);
        }
        for (id, s, t) in &stashed_edges {
            let s = member_group.get(s.as_str()).copied().unwrap_or(s.as_str());
            let t = member_group.get(t.as_str()).copied().unwrap_or(t.as_str());
            if s != t {
                g.create_edge(id.clone(), s, t);
            }
        }
        if !stash.is_empty() {
            tracing::debug!(members = stash.len(), "column groups packed");
        }

        self.hierarchic.apply_layout(g)?;

        for m in &stash {
            let Some(group) = g.node(&m.group).copied() else {
                continue;
            };
            let insets = g.insets(&m.group);
            let node = g.create_node(m.id.clone(), m.width, m.height);
            node.x = group.x + insets.left + m.offset.x;
            node.y = group.y + insets.top + m.offset.y;
            g.set_group(m.id.clone(), m.group.clone());
            g.set_halo(m.id.clone(), m.halo);
        }
        for (id, s, t) in stashed_edges {
            g.remove_edge(&id);
            g.create_edge(id, s, t);
        }
        self.hierarchic.route_edges(g);

        for (id, n) in self_links {
            g.create_edge(id, n.clone(), n);
        }
        self.self_links.route(g);
        Ok(())
    }

    fn route_edges(&self, g: &mut HierarchicGraph) -> Result<()> {
        self.hierarchic.route_edges(g);
        self.self_links.route(g);
        Ok(())
    }
}

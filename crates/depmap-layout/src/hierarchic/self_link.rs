use super::algorithm::LayoutGraphAccess;
use crate::config::LayoutConfig;
use crate::model::PortSide;
use crate::self_edges::SelfEdgeLayoutManager;

/// Routes self-links of any backend graph through self-edge channels.
#[derive(Debug, Clone)]
pub struct SelfLinkRouter {
    config: LayoutConfig,
}

impl SelfLinkRouter {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Routes every self-link whose node has a position. Returns the number of routed links.
    pub fn route<G: LayoutGraphAccess>(&self, graph: &mut G) -> usize {
        let mut channels = SelfEdgeLayoutManager::new(&self.config);
        for edge_id in graph.edge_ids() {
            let Some((source, target)) = graph.edge_endpoints(&edge_id) else {
                continue;
            };
            if source != target {
                continue;
            }
            if let Some(rect) = graph.node_rect(&source) {
                channels.add_self_edge(&source, rect, &edge_id);
            }
        }
        let routes = channels.layout();
        let routed = routes.len();
        for route in routes {
            graph.set_edge_route(
                &route.edge_id,
                route.segments,
                Some(PortSide::Right),
                Some(PortSide::Right),
            );
        }
        routed
    }
}

//! The seam between the layout manager and a layout backend.

use crate::Result;
use crate::geom::{BoundingBox, Point};
use crate::model::PortSide;
use depmap_hierarchic::{HierarchicGraph, Side};

/// What a layout algorithm may read and write on the graph it is handed. Sides are `None` for
/// an edge end attached at the node's center.
pub trait LayoutGraphAccess {
    fn node_ids(&self) -> Vec<String>;

    fn edge_ids(&self) -> Vec<String>;

    fn node_rect(&self, id: &str) -> Option<BoundingBox>;

    fn set_node_rect(&mut self, id: &str, rect: BoundingBox);

    fn edge_endpoints(&self, id: &str) -> Option<(String, String)>;

    fn edge_points(&self, id: &str) -> Vec<Point>;

    fn edge_sides(&self, id: &str) -> (Option<PortSide>, Option<PortSide>);

    fn set_edge_route(
        &mut self,
        id: &str,
        points: Vec<Point>,
        source_side: Option<PortSide>,
        target_side: Option<PortSide>,
    );

    fn group_members(&self, group: &str) -> Vec<String>;

    fn group_of(&self, id: &str) -> Option<String>;
}

pub trait LayoutAlgorithm<G: LayoutGraphAccess> {
    /// Positions and sizes every node and routes every edge.
    fn apply_layout(&self, graph: &mut G) -> Result<()>;

    /// Routes every edge over the current node positions.
    fn route_edges(&self, graph: &mut G) -> Result<()>;
}

fn side_to_port(side: Side) -> Option<PortSide> {
    match side {
        Side::Center => None,
        Side::Top => Some(PortSide::Top),
        Side::Right => Some(PortSide::Right),
        Side::Bottom => Some(PortSide::Bottom),
        Side::Left => Some(PortSide::Left),
    }
}

fn port_to_side(side: Option<PortSide>) -> Side {
    match side {
        None => Side::Center,
        Some(PortSide::Top) => Side::Top,
        Some(PortSide::Right) => Side::Right,
        Some(PortSide::Bottom) => Side::Bottom,
        Some(PortSide::Left) => Side::Left,
    }
}

impl LayoutGraphAccess for HierarchicGraph {
    fn node_ids(&self) -> Vec<String> {
        HierarchicGraph::node_ids(self)
    }

    fn edge_ids(&self) -> Vec<String> {
        HierarchicGraph::edge_ids(self)
    }

    fn node_rect(&self, id: &str) -> Option<BoundingBox> {
        self.node(id)
            .map(|n| BoundingBox::new(n.x, n.y, n.width, n.height))
    }

    fn set_node_rect(&mut self, id: &str, rect: BoundingBox) {
        if let Some(n) = self.node_mut(id) {
            n.x = rect.x;
            n.y = rect.y;
            n.width = rect.width;
            n.height = rect.height;
        }
    }

    fn edge_endpoints(&self, id: &str) -> Option<(String, String)> {
        HierarchicGraph::edge_endpoints(self, id).map(|(s, t)| (s.to_string(), t.to_string()))
    }

    fn edge_points(&self, id: &str) -> Vec<Point> {
        self.edge(id)
            .map(|e| e.points.iter().map(|p| Point::new(p.x, p.y)).collect())
            .unwrap_or_default()
    }

    fn edge_sides(&self, id: &str) -> (Option<PortSide>, Option<PortSide>) {
        self.edge(id)
            .map(|e| (side_to_port(e.source_side), side_to_port(e.target_side)))
            .unwrap_or_default()
    }

    fn set_edge_route(
        &mut self,
        id: &str,
        points: Vec<Point>,
        source_side: Option<PortSide>,
        target_side: Option<PortSide>,
    ) {
        if let Some(e) = self.edge_mut(id) {
            e.points = points
                .into_iter()
                .map(|p| depmap_hierarchic::Point::new(p.x, p.y))
                .collect();
            e.source_side = port_to_side(source_side);
            e.target_side = port_to_side(target_side);
        }
    }

    fn group_members(&self, group: &str) -> Vec<String> {
        self.members(group).into_iter().map(str::to_string).collect()
    }

    fn group_of(&self, id: &str) -> Option<String> {
        HierarchicGraph::group_of(self, id).map(str::to_string)
    }
}

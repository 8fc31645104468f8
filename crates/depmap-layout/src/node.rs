//! Per-node layout state.
//!
//! A node is composed of independent parts: geometry, hierarchy, style, connection counts and
//! the port cache. Sizing and port coordinates are derived from those parts on demand.

use crate::config::{LayoutConfig, NodeStyle};
use crate::content::{ChildSlot, layout_children};
use crate::geom::{BoundingBox, Point};
use crate::model::{EdgePort, LayoutNode, PortSide};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeHierarchy {
    pub parent_id: Option<String>,
    pub root_id: String,
    pub expanded: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConnectionCounts {
    pub incoming: usize,
    pub outgoing: usize,
}

impl ConnectionCounts {
    pub fn total(&self) -> usize {
        self.incoming + self.outgoing
    }
}

/// Round-robin slot cursors per side plus the resolved coordinate of every port.
#[derive(Debug, Clone, PartialEq, Default)]
struct PortCache {
    next: [usize; 4],
    used: [usize; 4],
    coordinates: [Point; 11],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShLayoutNode {
    pub geometry: BoundingBox,
    pub hierarchy: NodeHierarchy,
    pub style: NodeStyle,
    pub connections: ConnectionCounts,
    pub is_visible: bool,
    pub num_children: usize,
    pub is_added_since_last_layout: bool,
    ports: PortCache,
}

impl ShLayoutNode {
    pub fn new(hierarchy: NodeHierarchy, style: NodeStyle) -> Self {
        let geometry = BoundingBox::new(0.0, 0.0, style.width, style.height);
        let mut node = Self {
            geometry,
            hierarchy,
            style,
            connections: ConnectionCounts::default(),
            is_visible: true,
            num_children: 0,
            is_added_since_last_layout: true,
            ports: PortCache::default(),
        };
        node.calculate_edge_port_coordinates();
        node
    }

    /// Sizes the node from its style, or from its arranged children plus padding, margin and
    /// the style's base dimensions. `children` receive positions relative to
    /// [`ShLayoutNode::content_origin`].
    pub fn calculate_size(
        &mut self,
        children: &mut [ChildSlot],
        links: &[(usize, usize)],
        config: &LayoutConfig,
    ) {
        if children.is_empty() {
            self.geometry.width = self.style.width;
            self.geometry.height = self.style.height;
        } else {
            let (content_w, content_h) =
                self.calculate_child_nodes_coordinates(children, links, config);
            let style = &self.style;
            self.geometry.width =
                style.margin.horizontal() + style.padding.horizontal() + style.width + content_w;
            self.geometry.height =
                style.margin.vertical() + style.padding.vertical() + style.height + content_h;
        }
        self.calculate_edge_port_coordinates();
    }

    /// Replaces the style and falls back to its base size until the next sizing pass.
    pub fn reset_size(&mut self, style: NodeStyle, config: &LayoutConfig) {
        self.style = style;
        self.calculate_size(&mut [], &[], config);
    }

    pub fn calculate_child_nodes_coordinates(
        &self,
        children: &mut [ChildSlot],
        links: &[(usize, usize)],
        config: &LayoutConfig,
    ) -> (f64, f64) {
        layout_children(self.style.content_layout, children, links, config)
    }

    /// Absolute origin of the area children are arranged in.
    pub fn content_origin(&self) -> Point {
        let style = &self.style;
        Point::new(
            self.geometry.x + style.margin.left + style.padding.left + style.width / 2.0,
            self.geometry.y + style.margin.top + style.padding.top + style.height,
        )
    }

    pub fn set_position(&mut self, x: f64, y: f64) {
        self.geometry.x = x;
        self.geometry.y = y;
        self.calculate_edge_port_coordinates();
    }

    pub fn add_incoming_connection(&mut self) {
        self.connections.incoming += 1;
    }

    pub fn add_outgoing_connection(&mut self) {
        self.connections.outgoing += 1;
    }

    pub fn remove_incoming_connection(&mut self) {
        self.connections.incoming = self.connections.incoming.saturating_sub(1);
    }

    pub fn remove_outgoing_connection(&mut self) {
        self.connections.outgoing = self.connections.outgoing.saturating_sub(1);
    }

    pub fn reset_port_assignments(&mut self) {
        self.ports.next = [0; 4];
        self.ports.used = [0; 4];
    }

    /// Hands out the next slot on `side`. Once every slot is taken the cursor wraps and slots
    /// are shared, least recently assigned first.
    pub fn assign_port(&mut self, side: PortSide) -> EdgePort {
        let i = side.index();
        let port = EdgePort::on_side(side, self.ports.next[i]);
        self.ports.next[i] += 1;
        self.ports.used[i] = self.ports.next[i].min(side.slot_count());
        port
    }

    /// Ports currently in use; just `Center` for a node without connections.
    pub fn used_ports(&self) -> Vec<EdgePort> {
        if self.connections.total() == 0 {
            return vec![EdgePort::Center];
        }
        let mut out = Vec::new();
        for side in PortSide::ALL {
            for slot in 0..self.ports.used[side.index()] {
                out.push(EdgePort::on_side(side, slot));
            }
        }
        if out.is_empty() {
            out.push(EdgePort::Center);
        }
        out
    }

    /// Recomputes every port coordinate from the current geometry. Slots on a side are spread
    /// evenly over the number of slots in use there.
    pub fn calculate_edge_port_coordinates(&mut self) {
        let g = self.geometry;
        for port in EdgePort::ALL {
            let p = match port.side_slot() {
                None => g.center(),
                Some((side, slot)) => {
                    let used = self.ports.used[side.index()].max(slot + 1);
                    let f = (slot + 1) as f64 / (used + 1) as f64;
                    match side {
                        PortSide::Top => Point::new(g.x + g.width * f, g.y),
                        PortSide::Bottom => Point::new(g.x + g.width * f, g.bottom()),
                        PortSide::Left => Point::new(g.x, g.y + g.height * f),
                        PortSide::Right => Point::new(g.right(), g.y + g.height * f),
                    }
                }
            };
            self.ports.coordinates[port.index()] = p;
        }
    }

    pub fn port_coordinate(&self, port: EdgePort) -> Point {
        self.ports.coordinates[port.index()]
    }

    pub fn to_layout_node(&self, id: &str) -> LayoutNode {
        LayoutNode {
            id: id.to_string(),
            parent_id: self.hierarchy.parent_id.clone(),
            root_id: self.hierarchy.root_id.clone(),
            x: self.geometry.x,
            y: self.geometry.y,
            width: self.geometry.width,
            height: self.geometry.height,
            is_expanded: self.hierarchy.expanded,
            is_visible: self.is_visible,
            num_children: self.num_children,
            node_style: self.style.clone(),
            is_added_since_last_layout: self.is_added_since_last_layout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Insets;

    fn node(style: NodeStyle) -> ShLayoutNode {
        ShLayoutNode::new(
            NodeHierarchy {
                parent_id: None,
                root_id: "n".to_string(),
                expanded: true,
            },
            style,
        )
    }

    #[test]
    fn childless_size_is_idempotent() {
        let config = LayoutConfig::default();
        let mut n = node(NodeStyle::new("s", 80.0, 30.0).with_margin(Insets::uniform(5.0)));
        n.calculate_size(&mut [], &[], &config);
        let first = (n.geometry.width, n.geometry.height);
        n.calculate_size(&mut [], &[], &config);
        assert_eq!(first, (80.0, 30.0));
        assert_eq!((n.geometry.width, n.geometry.height), first);
    }

    #[test]
    fn parent_size_covers_children_padding_and_margin() {
        let config = LayoutConfig::default();
        let style = NodeStyle::new("s", 40.0, 20.0)
            .with_margin(Insets::uniform(5.0))
            .with_padding(Insets::uniform(3.0));
        let mut n = node(style);
        let mut children = vec![ChildSlot::new("a", 30.0, 10.0), ChildSlot::new("b", 20.0, 10.0)];
        n.calculate_size(&mut children, &[], &config);
        // List: 30 x (10 + 12 + 10).
        assert_eq!(n.geometry.width, 10.0 + 6.0 + 40.0 + 30.0);
        assert_eq!(n.geometry.height, 10.0 + 6.0 + 20.0 + 32.0);
        n.set_position(100.0, 0.0);
        assert_eq!(n.content_origin(), Point::new(100.0 + 8.0 + 20.0, 28.0));
    }

    #[test]
    fn ports_wrap_and_spread_over_used_slots() {
        let mut n = node(NodeStyle::new("s", 90.0, 60.0));
        n.add_outgoing_connection();
        assert_eq!(n.assign_port(PortSide::Right), EdgePort::Right1);
        n.calculate_edge_port_coordinates();
        assert_eq!(n.port_coordinate(EdgePort::Right1), Point::new(90.0, 30.0));

        assert_eq!(n.assign_port(PortSide::Right), EdgePort::Right2);
        assert_eq!(n.assign_port(PortSide::Right), EdgePort::Right1);
        n.calculate_edge_port_coordinates();
        assert_eq!(n.port_coordinate(EdgePort::Right1), Point::new(90.0, 20.0));
        assert_eq!(n.port_coordinate(EdgePort::Right2), Point::new(90.0, 40.0));
        assert_eq!(n.used_ports(), vec![EdgePort::Right1, EdgePort::Right2]);
    }

    #[test]
    fn unconnected_node_only_has_center() {
        let n = node(NodeStyle::new("s", 10.0, 10.0));
        assert_eq!(n.used_ports(), vec![EdgePort::Center]);
        assert_eq!(n.port_coordinate(EdgePort::Center), Point::new(5.0, 5.0));
    }

    #[test]
    fn connection_counts_saturate() {
        let mut n = node(NodeStyle::default());
        n.remove_incoming_connection();
        n.add_incoming_connection();
        n.add_outgoing_connection();
        n.remove_outgoing_connection();
        assert_eq!(n.connections, ConnectionCounts { incoming: 1, outgoing: 0 });
    }
}

//! Channels for self-edges.
//!
//! Every node with self-edges gets a channel: a vertical band from `minDistanceFromNodes` above
//! the node to the same distance below it, extending right of the node by one lane per
//! self-edge. Channels overlapping both vertically and horizontally are merged until none
//! overlap. A merged channel lays its lanes out right of its widest node, one
//! `distanceBetweenChannels` apart, so loops of neighbouring nodes never share a lane.

use crate::config::LayoutConfig;
use crate::geom::{BoundingBox, Point};

#[derive(Debug, Clone, PartialEq)]
pub struct SelfEdgeChannel {
    pub node_id: String,
    pub node: BoundingBox,
    pub edge_ids: Vec<String>,
    pub min_y: f64,
    pub max_y: f64,
    pub min_x: f64,
    pub max_x: f64,
}

impl SelfEdgeChannel {
    fn new(node_id: &str, node: BoundingBox, min_distance: f64) -> Self {
        Self {
            node_id: node_id.to_string(),
            node,
            edge_ids: Vec::new(),
            min_y: node.y - min_distance,
            max_y: node.bottom() + min_distance,
            min_x: node.x,
            max_x: node.right(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MergedSelfEdgeChannel {
    pub channels: Vec<SelfEdgeChannel>,
    pub min_y: f64,
    pub max_y: f64,
    pub min_x: f64,
    pub max_x: f64,
}

impl MergedSelfEdgeChannel {
    fn from_channel(channel: SelfEdgeChannel) -> Self {
        Self {
            min_y: channel.min_y,
            max_y: channel.max_y,
            min_x: channel.min_x,
            max_x: channel.max_x,
            channels: vec![channel],
        }
    }

    pub fn lane_count(&self) -> usize {
        self.channels.iter().map(|c| c.edge_ids.len()).sum()
    }

    /// Right edge of the widest node in the channel; lanes start right of it.
    pub fn anchor_x(&self) -> f64 {
        self.channels
            .iter()
            .map(|c| c.node.right())
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn contains_node(&self, node_id: &str) -> bool {
        self.channels.iter().any(|c| c.node_id == node_id)
    }

    fn overlaps(&self, other: &MergedSelfEdgeChannel) -> bool {
        self.min_y <= other.max_y
            && other.min_y <= self.max_y
            && self.min_x <= other.max_x
            && other.min_x <= self.max_x
    }

    fn refresh_extent(&mut self, min_distance: f64, lane_distance: f64) {
        let lanes = self.lane_count().max(1) as f64;
        self.min_y = self.channels.iter().map(|c| c.min_y).fold(f64::INFINITY, f64::min);
        self.max_y = self.channels.iter().map(|c| c.max_y).fold(f64::NEG_INFINITY, f64::max);
        self.min_x = self.channels.iter().map(|c| c.min_x).fold(f64::INFINITY, f64::min);
        self.max_x = self.anchor_x() + min_distance + lane_distance * lanes;
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SelfEdgeRoute {
    pub edge_id: String,
    pub node_id: String,
    pub lane_x: f64,
    pub segments: Vec<Point>,
}

#[derive(Debug, Clone)]
pub struct SelfEdgeLayoutManager {
    min_distance_from_nodes: f64,
    distance_between_channels: f64,
    channels: Vec<MergedSelfEdgeChannel>,
}

impl SelfEdgeLayoutManager {
    pub fn new(config: &LayoutConfig) -> Self {
        Self {
            min_distance_from_nodes: config.min_distance_from_nodes,
            distance_between_channels: config.distance_between_channels,
            channels: Vec::new(),
        }
    }

    pub fn channels(&self) -> &[MergedSelfEdgeChannel] {
        &self.channels
    }

    pub fn add_self_edge(&mut self, node_id: &str, node: BoundingBox, edge_id: &str) {
        let (min_distance, lane_distance) =
            (self.min_distance_from_nodes, self.distance_between_channels);
        let idx = match self.channels.iter().position(|m| m.contains_node(node_id)) {
            Some(idx) => idx,
            None => {
                let channel = SelfEdgeChannel::new(node_id, node, min_distance);
                self.channels.push(MergedSelfEdgeChannel::from_channel(channel));
                self.channels.len() - 1
            }
        };
        let merged = &mut self.channels[idx];
        if let Some(channel) = merged.channels.iter_mut().find(|c| c.node_id == node_id) {
            channel.edge_ids.push(edge_id.to_string());
        }
        merged.refresh_extent(min_distance, lane_distance);
    }

    /// Folds `channel` into `merge_base`.
    pub fn merge_self_edge_channels(
        &self,
        merge_base: &mut MergedSelfEdgeChannel,
        channel: MergedSelfEdgeChannel,
    ) {
        merge_base.channels.extend(channel.channels);
        merge_base.refresh_extent(self.min_distance_from_nodes, self.distance_between_channels);
    }

    /// Merges overlapping channels until no two overlap.
    pub fn merge_all(&mut self) {
        loop {
            let mut pair = None;
            'search: for i in 0..self.channels.len() {
                for j in i + 1..self.channels.len() {
                    if self.channels[i].overlaps(&self.channels[j]) {
                        pair = Some((i, j));
                        break 'search;
                    }
                }
            }
            let Some((i, j)) = pair else {
                return;
            };
            let absorbed = self.channels.remove(j);
            let mut base = self.channels.remove(i);
            self.merge_self_edge_channels(&mut base, absorbed);
            self.channels.insert(i, base);
        }
    }

    /// Merges channels and routes every self-edge as a loop leaving the node's upper right port
    /// and re-entering at the lower right port.
    pub fn layout(&mut self) -> Vec<SelfEdgeRoute> {
        self.merge_all();
        let mut routes = Vec::new();
        for merged in &self.channels {
            let anchor = merged.anchor_x();
            let mut lane = 0usize;
            for channel in &merged.channels {
                let node = channel.node;
                let exit = Point::new(node.right(), node.y + node.height / 3.0);
                let entry = Point::new(node.right(), node.y + node.height * 2.0 / 3.0);
                for edge_id in &channel.edge_ids {
                    let lane_x = anchor
                        + self.min_distance_from_nodes
                        + self.distance_between_channels * lane as f64;
                    routes.push(SelfEdgeRoute {
                        edge_id: edge_id.clone(),
                        node_id: channel.node_id.clone(),
                        lane_x,
                        segments: vec![
                            exit,
                            Point::new(lane_x, exit.y),
                            Point::new(lane_x, entry.y),
                            entry,
                        ],
                    });
                    lane += 1;
                }
            }
        }
        tracing::debug!(
            channels = self.channels.len(),
            loops = routes.len(),
            "self-edge channels laid out"
        );
        routes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loops_on_one_node_get_distinct_lanes() {
        let mut mgr = SelfEdgeLayoutManager::new(&LayoutConfig::default());
        let node = BoundingBox::new(0.0, 0.0, 90.0, 30.0);
        mgr.add_self_edge("a", node, "a->a");
        mgr.add_self_edge("a", node, "a->a#2");
        let routes = mgr.layout();

        assert_eq!(mgr.channels().len(), 1);
        assert_eq!(routes[0].lane_x, 100.0);
        assert_eq!(routes[1].lane_x, 112.0);
        assert_eq!(routes[0].segments[0], Point::new(90.0, 10.0));
        assert_eq!(routes[0].segments[3], Point::new(90.0, 20.0));
    }

    #[test]
    fn close_neighbours_share_a_merged_channel() {
        let mut mgr = SelfEdgeLayoutManager::new(&LayoutConfig::default());
        mgr.add_self_edge("a", BoundingBox::new(0.0, 0.0, 50.0, 30.0), "a->a");
        mgr.add_self_edge("b", BoundingBox::new(10.0, 45.0, 70.0, 30.0), "b->b");
        mgr.add_self_edge("c", BoundingBox::new(0.0, 400.0, 50.0, 30.0), "c->c");
        let routes = mgr.layout();

        let channels = mgr.channels();
        assert_eq!(channels.len(), 2);
        assert!(channels[0].contains_node("a") && channels[0].contains_node("b"));
        assert_eq!((channels[0].min_y, channels[0].max_y), (-10.0, 85.0));
        // Both lanes sit right of the wider node, one apart.
        assert_eq!(routes[0].lane_x, 90.0);
        assert_eq!(routes[1].lane_x, 102.0);
        assert_eq!(routes[2].lane_x, 60.0);
    }
}

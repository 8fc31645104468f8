//! One column of root nodes.
//!
//! Call order per pass: `compute_layer_size`, then `compute_layer_coordinates`, then
//! `compute_nodes_layout`.

#[derive(Debug, Clone, PartialEq)]
pub struct LayerNode {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    nodes: Vec<LayerNode>,
    node_to_node_distance: f64,
    pub outgoing_connection_count: usize,
    pub layer_x: f64,
    pub layer_y: f64,
    pub layer_width: f64,
    pub layer_height: f64,
}

impl Layer {
    pub fn new(node_to_node_distance: f64) -> Self {
        Self {
            nodes: Vec::new(),
            node_to_node_distance,
            outgoing_connection_count: 0,
            layer_x: 0.0,
            layer_y: 0.0,
            layer_width: 0.0,
            layer_height: 0.0,
        }
    }

    /// Appends a node; nodes keep the order they were added in.
    pub fn add_node(&mut self, id: impl Into<String>, width: f64, height: f64, outgoing: usize) {
        self.nodes.push(LayerNode {
            id: id.into(),
            x: 0.0,
            y: 0.0,
            width,
            height,
        });
        self.outgoing_connection_count += outgoing;
    }

    pub fn nodes(&self) -> &[LayerNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn compute_layer_size(&mut self) {
        self.layer_width = self.nodes.iter().map(|n| n.width).fold(0.0, f64::max);
        self.layer_height = self.nodes.iter().map(|n| n.height).sum::<f64>()
            + self.node_to_node_distance * self.nodes.len().saturating_sub(1) as f64;
    }

    pub fn compute_layer_coordinates(&mut self, layer_x: f64, canvas_height: f64) {
        self.layer_x = layer_x;
        self.layer_y = (canvas_height - self.layer_height) / 2.0;
    }

    pub fn compute_nodes_layout(&mut self) {
        let mut y = self.layer_y;
        for n in &mut self.nodes {
            n.x = self.layer_x + (self.layer_width - n.width) / 2.0;
            n.y = y;
            y += n.height + self.node_to_node_distance;
        }
    }

    pub fn right(&self) -> f64 {
        self.layer_x + self.layer_width
    }
}

//! Child arrangements inside a node's content area.
//!
//! Each strategy positions children relative to the content origin and returns the extent of
//! the arranged block; the top-left child footprint always starts at (0, 0).

use crate::config::{ContentLayout, LayoutConfig};
use depmap_hierarchic::acyclic::longest_path_ranks;
use std::f64::consts::PI;

#[derive(Debug, Clone, PartialEq)]
pub struct ChildSlot {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl ChildSlot {
    pub fn new(id: impl Into<String>, width: f64, height: f64) -> Self {
        Self {
            id: id.into(),
            x: 0.0,
            y: 0.0,
            width,
            height,
        }
    }
}

/// Arranges `children` and returns the (width, height) of their bounding box.
/// `links` are (from, to) index pairs among the children.
pub fn layout_children(
    kind: ContentLayout,
    children: &mut [ChildSlot],
    links: &[(usize, usize)],
    config: &LayoutConfig,
) -> (f64, f64) {
    if children.is_empty() {
        return (0.0, 0.0);
    }
    match kind {
        ContentLayout::List => list(children, config.child_spacing),
        ContentLayout::Ihl => ihl(children, links, config.child_spacing),
        ContentLayout::Ring => ring(children, config),
    }
}

fn list(children: &mut [ChildSlot], spacing: f64) -> (f64, f64) {
    let mut y = 0.0;
    let mut width: f64 = 0.0;
    for child in children.iter_mut() {
        child.x = 0.0;
        child.y = y;
        y += child.height + spacing;
        width = width.max(child.width);
    }
    (width, y - spacing)
}

fn ihl(children: &mut [ChildSlot], links: &[(usize, usize)], spacing: f64) -> (f64, f64) {
    let ranks = longest_path_ranks(children.len(), links);
    let columns = ranks.iter().copied().max().unwrap_or(0) + 1;

    let mut x = 0.0;
    let mut height: f64 = 0.0;
    for col in 0..columns {
        let mut y = 0.0;
        let mut col_width: f64 = 0.0;
        for (child, _) in children
            .iter_mut()
            .zip(&ranks)
            .filter(|(_, r)| **r == col)
        {
            child.x = x;
            child.y = y;
            y += child.height + spacing;
            col_width = col_width.max(child.width);
        }
        height = height.max(y - spacing);
        x += col_width + spacing;
    }
    (x - spacing, height)
}

fn ring(children: &mut [ChildSlot], config: &LayoutConfig) -> (f64, f64) {
    if let [only] = children {
        only.x = 0.0;
        only.y = 0.0;
        return (only.width, only.height);
    }

    let n = children.len() as f64;
    let largest = children
        .iter()
        .map(|c| c.width.max(c.height))
        .fold(0.0, f64::max);
    let radius = (n * (largest + config.child_spacing) / (2.0 * PI)).max(config.ring_min_radius);

    for (i, child) in children.iter_mut().enumerate() {
        let angle = -PI / 2.0 + 2.0 * PI * i as f64 / n;
        child.x = radius * angle.cos() - child.width / 2.0;
        child.y = radius * angle.sin() - child.height / 2.0;
    }

    let min_x = children.iter().map(|c| c.x).fold(f64::INFINITY, f64::min);
    let min_y = children.iter().map(|c| c.y).fold(f64::INFINITY, f64::min);
    let mut max_x: f64 = 0.0;
    let mut max_y: f64 = 0.0;
    for child in children.iter_mut() {
        child.x -= min_x;
        child.y -= min_y;
        max_x = max_x.max(child.x + child.width);
        max_y = max_y.max(child.y + child.height);
    }
    (max_x, max_y)
}

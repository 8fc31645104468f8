#![forbid(unsafe_code)]

//! Generic left-to-right hierarchical layout.
//!
//! The algorithm works on its own graph representation, [`HierarchicGraph`]: plain nodes and
//! edges, with nesting expressed through a group-membership map (member -> group) rather than a
//! parent pointer per node, plus per-node halos and per-group insets. [`HierarchicLayouter::apply_layout`]
//! assigns every node a top-left position and size and routes every non-self edge;
//! [`route_edges`] re-runs only the routing step over fixed node positions.

pub mod acyclic;
pub mod error;
pub mod graph;
pub mod layered;
pub mod order;
pub mod routing;

pub use error::{Error, Result};
pub use graph::{EdgePath, HierarchicGraph, Insets, NodeBox, Point, Side};
pub use layered::{HierarchicLayouter, HierarchicOptions};
pub use routing::route_edges;

#![forbid(unsafe_code)]

//! Incremental layout engine for dependency maps.
//!
//! Callers feed nodes and edges into a [`LayoutManager`] (`add_node`/`add_edge`, upsert
//! semantics), then call [`LayoutManager::do_layout`] with an update pattern. The result is a
//! [`LayoutGraph`]: final node boxes, edge polylines with port slots, and the bounding box of
//! everything visible.
//!
//! Two managers are provided:
//! - [`SimpleHierarchicalLayouter`]: root nodes in left-to-right layers, children sized and
//!   arranged inside their parents, orthogonal routing through gap lanes, self-edge channels.
//! - [`HierarchicLayoutManager`]: nested groups laid out by a pluggable [`LayoutAlgorithm`]
//!   (by default [`RecursiveHierarchicColumnLayouter`] over `depmap-hierarchic`).

pub mod config;
pub mod content;
pub mod error;
pub mod geom;
pub mod hierarchic;
pub mod layer;
pub mod manager;
pub mod model;
pub mod node;
pub mod self_edges;
pub mod simple;
pub mod store;
pub mod telemetry;

pub use config::{ContentLayout, Insets, LayoutConfig, NodeStyle, NodeStyleRegistry};
pub use error::{Error, Result};
pub use geom::{BoundingBox, Point};
pub use hierarchic::{
    HierarchicLayoutManager, LayoutAlgorithm, LayoutGraphAccess, RecursiveHierarchicColumnLayouter,
    SelfLinkRouter, SimpleColumnLayouter,
};
pub use layer::Layer;
pub use manager::{LayoutManager, edge_id};
pub use model::{
    EdgePort, LayoutEdge, LayoutGraph, LayoutNode, LayoutUpdatePattern, PortSide,
    SuggestedNodeOrder,
};
pub use node::ShLayoutNode;
pub use self_edges::{MergedSelfEdgeChannel, SelfEdgeChannel, SelfEdgeLayoutManager};
pub use simple::SimpleHierarchicalLayouter;
pub use store::ShLayoutGraph;
pub use telemetry::{NoopTelemetry, TelemetryProperties, TelemetryProvider, TracingTelemetry};

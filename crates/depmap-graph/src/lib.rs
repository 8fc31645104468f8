//! Graph storage for the depmap layout engine.
//!
//! `Graph` is the authoritative registry of nodes and edges for one layout universe. It keeps
//! forward and reverse adjacency lists in lockstep with the edge registry and tracks the
//! parent/child hierarchy. It never validates referential integrity: edges may name nodes that
//! do not exist (yet), and it is up to the layouter to drop such edges at layout time.

pub mod graph;
pub mod ordered_map;

pub use graph::{EdgeEntry, Graph};
pub use ordered_map::OrderedStringMap;

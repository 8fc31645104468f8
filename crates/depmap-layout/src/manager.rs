use crate::Result;
use crate::config::NodeStyle;
use crate::model::{LayoutEdge, LayoutGraph, LayoutNode, LayoutUpdatePattern, SuggestedNodeOrder};
use std::borrow::Cow;

/// Id under which an edge between `source` and `destination` is stored: `source->destination`,
/// with a `\` or `->` inside either endpoint written as `\\` or `\->`. Distinct pairs never share
/// an id.
pub fn edge_id(source: &str, destination: &str) -> String {
    format!("{}->{}", escape_endpoint(source), escape_endpoint(destination))
}

fn escape_endpoint(id: &str) -> Cow<'_, str> {
    if !id.contains('\\') && !id.contains("->") {
        return Cow::Borrowed(id);
    }
    Cow::Owned(id.replace('\\', "\\\\").replace("->", "\\->"))
}

/// Contract shared by the layout managers.
///
/// `add_node`/`add_edge` are upserts: repeating a call updates the stored element and marks it
/// added since the last layout, it never duplicates. Callers must check
/// [`LayoutManager::is_layout_type_supported`] before `do_layout`; an unsupported pattern yields
/// [`crate::Error::UnsupportedPattern`].
pub trait LayoutManager {
    fn add_node(
        &mut self,
        id: &str,
        parent_id: Option<&str>,
        root_id: &str,
        expanded: bool,
        style: Option<NodeStyle>,
    ) -> LayoutNode;

    fn add_edge(&mut self, source: &str, destination: &str, resource_id: Option<&str>)
    -> LayoutEdge;

    /// No-op for unknown ids. Incident edges are not removed.
    fn remove_node(&mut self, id: &str);

    fn remove_edge(&mut self, id: &str);

    fn do_layout(
        &mut self,
        pattern: LayoutUpdatePattern,
        suggested_node_order: Option<&SuggestedNodeOrder>,
    ) -> Result<LayoutGraph>;

    fn clear_graph(&mut self);

    fn is_layout_type_supported(&self, pattern: LayoutUpdatePattern) -> bool;

    fn node(&self, id: &str) -> Option<LayoutNode>;

    fn edge(&self, id: &str) -> Option<LayoutEdge>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_ids_join_with_an_arrow() {
        assert_eq!(edge_id("a", "b"), "a->b");
        assert_eq!(edge_id("svc-1", "db>2"), "svc-1->db>2");
    }

    #[test]
    fn arrows_inside_endpoints_do_not_collide() {
        assert_eq!(edge_id("a->b", "c"), "a\\->b->c");
        assert_eq!(edge_id("a", "b->c"), "a->b\\->c");
        assert_ne!(edge_id("a->b", "c"), edge_id("a", "b->c"));
        assert_ne!(edge_id("a\\", "b"), edge_id("a", "\\b"));
    }
}

use depmap_layout::{
    BoundingBox, EdgePort, Error, Insets, LayoutConfig, LayoutGraph, LayoutManager,
    LayoutUpdatePattern, NodeStyle, Point, PortSide, SimpleHierarchicalLayouter,
    SuggestedNodeOrder, TelemetryProperties, TelemetryProvider,
};
use std::sync::{Arc, Mutex};

#[derive(Debug, Default)]
struct Recorder {
    infos: Mutex<Vec<(String, String, String)>>,
    errors: Mutex<Vec<String>>,
}

impl TelemetryProvider for Recorder {
    fn info(&self, message: &str, source: &str, action: &str, _: Option<&TelemetryProperties>) {
        self.infos.lock().unwrap().push((
            message.to_string(),
            source.to_string(),
            action.to_string(),
        ));
    }

    fn error(
        &self,
        error: &dyn std::error::Error,
        _: &str,
        _: &str,
        _: Option<&TelemetryProperties>,
    ) {
        self.errors.lock().unwrap().push(error.to_string());
    }
}

fn root(layouter: &mut SimpleHierarchicalLayouter, id: &str) {
    layouter.add_node(id, None, id, true, None);
}

fn positions(graph: &LayoutGraph) -> Vec<(String, f64, f64)> {
    graph.nodes.iter().map(|n| (n.id.clone(), n.x, n.y)).collect()
}

/// Whether the axis-aligned segment `p`-`q` runs through the interior of `b`.
fn crosses(b: &BoundingBox, p: Point, q: Point) -> bool {
    let (x0, x1) = (p.x.min(q.x), p.x.max(q.x));
    let (y0, y1) = (p.y.min(q.y), p.y.max(q.y));
    x0 < b.right() && x1 > b.x && y0 < b.bottom() && y1 > b.y
}

fn side(port: EdgePort) -> Option<PortSide> {
    port.side_slot().map(|(side, _)| side)
}

#[test]
fn roots_are_layered_left_to_right() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    root(&mut layouter, "a");
    root(&mut layouter, "b");
    layouter.add_edge("a", "b", Some("res-1"));

    let graph = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    let a = graph.node("a").unwrap();
    let b = graph.node("b").unwrap();
    assert_eq!((a.x, a.y, a.width, a.height), (0.0, 0.0, 160.0, 40.0));
    // 160 wide layer plus the minimum layer distance.
    assert_eq!((b.x, b.y), (240.0, 0.0));

    let e = graph.edge("a->b").unwrap();
    assert!(e.is_visible);
    assert_eq!(e.resource_id.as_deref(), Some("res-1"));
    assert_eq!(e.source_edge_port, EdgePort::Right1);
    assert_eq!(e.target_edge_port, EdgePort::Left1);
    assert_eq!(e.segments, vec![Point::new(160.0, 20.0), Point::new(240.0, 20.0)]);
    assert_eq!(graph.bb, BoundingBox::new(0.0, 0.0, 400.0, 40.0));
}

#[test]
fn childless_size_is_stable_across_passes() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    let style = NodeStyle::new("svc", 100.0, 50.0).with_margin(Insets::uniform(8.0));
    layouter.add_node("a", None, "a", true, Some(style.clone()));
    let first = layouter
        .do_layout(LayoutUpdatePattern::IncrementalDiff, None)
        .unwrap();

    layouter.add_node("a", None, "a", true, Some(style));
    let second = layouter
        .do_layout(LayoutUpdatePattern::IncrementalDiff, None)
        .unwrap();

    let (a1, a2) = (first.node("a").unwrap(), second.node("a").unwrap());
    assert_eq!((a1.width, a1.height), (100.0, 50.0));
    assert_eq!((a1.width, a1.height), (a2.width, a2.height));
}

#[test]
fn no_op_diff_keeps_every_position() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    let push = |l: &mut SimpleHierarchicalLayouter| {
        for id in ["a", "b", "c", "d"] {
            root(l, id);
        }
        l.add_node("b1", Some("b"), "b", false, None);
        l.add_edge("a", "b", None);
        l.add_edge("a", "c", None);
        l.add_edge("c", "d", None);
        l.add_edge("d", "a", None);
    };

    push(&mut layouter);
    let first = layouter
        .do_layout(LayoutUpdatePattern::IncrementalDiff, None)
        .unwrap();
    push(&mut layouter);
    let second = layouter
        .do_layout(LayoutUpdatePattern::IncrementalDiff, None)
        .unwrap();

    assert_eq!(positions(&first), positions(&second));
    assert_eq!(first.edges, second.edges);
}

#[test]
fn self_edges_on_neighbouring_nodes_get_separate_lanes() {
    let config = LayoutConfig {
        node_to_node_distance: 10.0,
        ..LayoutConfig::default()
    };
    let mut layouter = SimpleHierarchicalLayouter::new(config);
    root(&mut layouter, "a");
    root(&mut layouter, "b");
    layouter.add_edge("a", "a", None);
    layouter.add_edge("b", "b", None);

    let graph = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    let lane = |id: &str| {
        let e = graph.edge(id).unwrap();
        assert_eq!(e.source_edge_port, EdgePort::Right1);
        assert_eq!(e.target_edge_port, EdgePort::Right2);
        e.segments.iter().map(|p| p.x).fold(f64::MIN, f64::max)
    };
    let (la, lb) = (lane("a->a"), lane("b->b"));
    assert!(la > 160.0 && lb > 160.0);
    assert_ne!(la, lb);
    assert_eq!((la - lb).abs(), 12.0);
}

#[test]
fn stale_nodes_are_pruned_by_diff() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    for id in ["A", "B", "C"] {
        root(&mut layouter, id);
    }
    layouter.add_edge("A", "B", None);
    layouter
        .do_layout(LayoutUpdatePattern::IncrementalDiff, None)
        .unwrap();

    root(&mut layouter, "A");
    root(&mut layouter, "C");
    let graph = layouter
        .do_layout(LayoutUpdatePattern::IncrementalDiff, None)
        .unwrap();

    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["A", "C"]);
    assert!(layouter.node("B").is_none());
    assert!(layouter.edge("A->B").is_none());
    assert!(graph.edges.is_empty());
}

#[test]
fn dangling_edges_are_dropped_and_reported() {
    let recorder = Arc::new(Recorder::default());
    let mut layouter =
        SimpleHierarchicalLayouter::with_telemetry(LayoutConfig::default(), recorder.clone());
    root(&mut layouter, "a");
    layouter.add_edge("X", "Y", None);

    let graph = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    assert_eq!(graph.nodes.len(), 1);
    assert!(graph.edge("X->Y").is_none());
    let infos = recorder.infos.lock().unwrap();
    assert!(
        infos
            .iter()
            .any(|(m, s, _)| m == "dropped edge referencing an unknown node"
                && s == "SimpleHierarchicalLayouter")
    );
    assert!(recorder.errors.lock().unwrap().is_empty());
}

#[test]
fn bounding_box_ignores_hidden_nodes() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    root(&mut layouter, "r");
    layouter.add_node("c", None, "c", false, None);
    let big = NodeStyle::new("big", 500.0, 500.0);
    layouter.add_node("h", Some("c"), "c", true, Some(big));
    layouter.add_edge("r", "c", None);

    let graph = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    let h = graph.node("h").unwrap();
    assert!(!h.is_visible);
    let visible =
        BoundingBox::from_rects(graph.nodes.iter().filter(|n| n.is_visible).map(|n| n.bounds()))
            .unwrap();
    assert_eq!(graph.bb, visible);
    assert!(!graph.bb.contains(&h.bounds()));
}

#[test]
fn expanded_parent_wraps_its_child() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    let style_a = NodeStyle::new("a", 100.0, 40.0).with_padding(Insets::uniform(10.0));
    let style_b = NodeStyle::new("b", 60.0, 30.0);
    layouter.add_node("m1", None, "m1", true, Some(style_a));
    layouter.add_node("p1", Some("m1"), "m1", false, Some(style_b));
    layouter.add_edge("m1", "p1", None);

    let graph = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    assert_eq!(graph.nodes.len(), 2);
    let m1 = graph.node("m1").unwrap();
    let p1 = graph.node("p1").unwrap();
    assert_eq!(p1.parent_id.as_deref(), Some("m1"));
    assert_eq!(m1.num_children, 1);
    assert!(m1.width >= 100.0 + 60.0 + 20.0);
    assert!(m1.height >= 40.0 + 30.0 + 20.0);
    assert!(m1.bounds().contains(&p1.bounds()));
    // Content starts below the header, half a header width in.
    assert_eq!((p1.x, p1.y), (60.0, 50.0));

    let e = graph.edge("m1->p1").unwrap();
    assert!(e.is_visible);
    assert!(!e.segments.is_empty());
    assert_ne!(e.source_edge_port, EdgePort::Center);
    assert_ne!(e.target_edge_port, EdgePort::Center);
    let (first, last) = (e.segments[0], e.segments[e.segments.len() - 1]);
    assert_eq!(first.x, m1.x);
    assert_eq!(last.x, p1.x);
}

#[test]
fn incremental_pattern_is_unsupported() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    assert!(!layouter.is_layout_type_supported(LayoutUpdatePattern::Incremental));
    assert!(layouter.is_layout_type_supported(LayoutUpdatePattern::Scratch));
    assert!(layouter.is_layout_type_supported(LayoutUpdatePattern::IncrementalDiff));

    root(&mut layouter, "a");
    let err = layouter
        .do_layout(LayoutUpdatePattern::Incremental, None)
        .unwrap_err();
    assert!(matches!(
        err,
        Error::UnsupportedPattern {
            pattern: LayoutUpdatePattern::Incremental
        }
    ));
    // Nothing was consumed: the node is still waiting for a layout.
    assert!(layouter.node("a").unwrap().is_added_since_last_layout);
}

#[test]
fn scratch_lays_out_only_new_elements() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    root(&mut layouter, "a");
    layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    root(&mut layouter, "b");
    let graph = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    let ids: Vec<&str> = graph.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["b"]);
    assert!(layouter.node("a").is_some());
    assert!(!layouter.node("b").unwrap().is_added_since_last_layout);
}

#[test]
fn suggested_order_reorders_children() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    root(&mut layouter, "m");
    for id in ["x", "y", "z"] {
        layouter.add_node(id, Some("m"), "m", false, None);
    }
    let mut order = SuggestedNodeOrder::new();
    order.insert(
        "m".to_string(),
        vec!["z".to_string(), "ghost".to_string(), "x".to_string()],
    );

    let graph = layouter
        .do_layout(LayoutUpdatePattern::Scratch, Some(&order))
        .unwrap();

    let y_of = |id: &str| graph.node(id).unwrap().y;
    assert!(y_of("z") < y_of("x"));
    assert!(y_of("x") < y_of("y"));
    assert_eq!(graph.node("m").unwrap().num_children, 3);
}

#[test]
fn edges_inside_a_collapsed_node_are_hidden() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    root(&mut layouter, "r");
    layouter.add_node("c", None, "c", false, None);
    layouter.add_node("h1", Some("c"), "c", true, None);
    layouter.add_node("h2", Some("c"), "c", true, None);
    layouter.add_edge("h1", "h2", None);
    layouter.add_edge("h1", "r", None);

    let graph = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    let inner = graph.edge("h1->h2").unwrap();
    assert!(!inner.is_visible);
    assert!(inner.segments.is_empty());
    assert_eq!(inner.source_edge_port, EdgePort::Center);

    let lifted = graph.edge("h1->r").unwrap();
    assert!(lifted.is_visible);
    assert!(!lifted.segments.is_empty());
    let c = graph.node("c").unwrap();
    assert_eq!(lifted.source_edge_port, EdgePort::Right1);
    assert_eq!(lifted.segments[0].x, c.bounds().right());
}

#[test]
fn clear_graph_forgets_everything() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    root(&mut layouter, "a");
    root(&mut layouter, "b");
    layouter.add_edge("a", "b", None);
    layouter.clear_graph();

    let graph = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();
    assert!(graph.nodes.is_empty());
    assert!(graph.edges.is_empty());
    assert_eq!(graph.bb, BoundingBox::default());
}

#[test]
fn upserts_do_not_duplicate() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    root(&mut layouter, "a");
    root(&mut layouter, "b");
    layouter.add_edge("a", "b", None);
    let again = layouter.add_edge("a", "b", Some("res"));
    assert_eq!(again.id, "a->b");
    assert_eq!(again.resource_id.as_deref(), Some("res"));

    let node = layouter.add_node("a", None, "a", false, None);
    assert_eq!(node.node_style.name, "collapsed");
    assert_eq!(layouter.graph().node_count(), 2);
    assert_eq!(layouter.graph().edge_count(), 1);
}

#[test]
fn re_added_parent_wraps_its_child_again() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    let push = |l: &mut SimpleHierarchicalLayouter| {
        l.add_node("m1", None, "m1", true, None);
        l.add_node("p1", Some("m1"), "m1", false, None);
    };
    push(&mut layouter);
    let first = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    layouter.remove_node("m1");
    push(&mut layouter);
    let second = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    let m1 = second.node("m1").unwrap();
    let p1 = second.node("p1").unwrap();
    assert_eq!(m1.num_children, 1);
    assert!(m1.bounds().contains(&p1.bounds()));
    assert_eq!(m1.bounds(), first.node("m1").unwrap().bounds());
    assert_eq!(p1.bounds(), first.node("p1").unwrap().bounds());
}

#[test]
fn parent_pruned_by_diff_gets_its_child_back() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    let push = |l: &mut SimpleHierarchicalLayouter, with_parent: bool| {
        if with_parent {
            l.add_node("m1", None, "m1", true, None);
        }
        l.add_node("p1", Some("m1"), "m1", false, None);
    };

    push(&mut layouter, true);
    let first = layouter
        .do_layout(LayoutUpdatePattern::IncrementalDiff, None)
        .unwrap();
    push(&mut layouter, false);
    let orphaned = layouter
        .do_layout(LayoutUpdatePattern::IncrementalDiff, None)
        .unwrap();
    assert!(orphaned.nodes.is_empty());
    assert!(layouter.node("m1").is_none());

    push(&mut layouter, true);
    let third = layouter
        .do_layout(LayoutUpdatePattern::IncrementalDiff, None)
        .unwrap();

    let m1 = third.node("m1").unwrap();
    let p1 = third.node("p1").unwrap();
    assert_eq!(m1.num_children, 1);
    assert!(m1.bounds().contains(&p1.bounds()));
    assert_eq!(m1.bounds(), first.node("m1").unwrap().bounds());
    assert_eq!(p1.bounds(), first.node("p1").unwrap().bounds());
}

#[test]
fn edges_whose_endpoints_contain_arrows_stay_distinct() {
    let mut layouter = SimpleHierarchicalLayouter::default();
    for id in ["a->b", "c", "a", "b->c"] {
        root(&mut layouter, id);
    }
    let first = layouter.add_edge("a->b", "c", None);
    let second = layouter.add_edge("a", "b->c", None);
    assert_ne!(first.id, second.id);
    assert_eq!(layouter.graph().edge_count(), 2);

    let graph = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    assert_eq!(graph.edges.len(), 2);
    let e = graph.edge(&first.id).unwrap();
    assert_eq!((e.source.as_str(), e.destination.as_str()), ("a->b", "c"));
    let e = graph.edge(&second.id).unwrap();
    assert_eq!((e.source.as_str(), e.destination.as_str()), ("a", "b->c"));
}

#[test]
fn long_edges_detour_around_the_layer_in_between() {
    let config = LayoutConfig::default();
    let offset = config.single_segment_edge_error_offset;
    let mut layouter = SimpleHierarchicalLayouter::new(config);
    root(&mut layouter, "a");
    let tall = NodeStyle::new("tall", 160.0, 400.0);
    layouter.add_node("b", None, "b", true, Some(tall));
    root(&mut layouter, "c");
    layouter.add_edge("a", "b", None);
    layouter.add_edge("b", "c", None);
    layouter.add_edge("a", "c", None);
    layouter.add_edge("c", "a", None);

    let graph = layouter.do_layout(LayoutUpdatePattern::Scratch, None).unwrap();

    let a = graph.node("a").unwrap().bounds();
    let b = graph.node("b").unwrap().bounds();
    let c = graph.node("c").unwrap().bounds();
    assert!(a.right() < b.x && b.right() < c.x);

    for (id, from, to) in [
        ("a->c", PortSide::Right, PortSide::Left),
        ("c->a", PortSide::Left, PortSide::Right),
    ] {
        let e = graph.edge(id).unwrap();
        assert!(e.is_visible);
        assert_eq!(side(e.source_edge_port), Some(from));
        assert_eq!(side(e.target_edge_port), Some(to));
        for w in e.segments.windows(2) {
            assert!(!crosses(&b, w[0], w[1]), "{id} runs through b at {w:?}");
        }
        let corridor = e
            .segments
            .windows(2)
            .find(|w| {
                w[0].y == w[1].y && w[0].x.min(w[1].x) < b.x && w[0].x.max(w[1].x) > b.right()
            })
            .map(|w| w[0].y)
            .unwrap();
        assert!(
            corridor == b.y - offset || corridor == b.bottom() + offset,
            "{id} corridor at {corridor}"
        );
    }
}

//! Edge routing for the simple layouter.
//!
//! Edges between different layers leave through the right (forward) or left (backward) side and
//! bend on lanes inside the gaps between layers. When layers lie in between, the horizontal run
//! is moved to a corridor clear of their nodes. Edges inside one root bracket around the
//! container or run straight between siblings. Self-edges are handed to the
//! [`SelfEdgeLayoutManager`].

use crate::config::LayoutConfig;
use crate::geom::{BoundingBox, Point, simplify_polyline};
use crate::layer::Layer;
use crate::model::{EdgePort, PortSide};
use crate::self_edges::SelfEdgeLayoutManager;
use crate::store::ShLayoutGraph;
use crate::telemetry::{TelemetryProvider, props};
use rustc_hash::{FxHashMap, FxHashSet};

const SOURCE: &str = "SimpleHierarchicalLayouter";

type Lane = (usize, usize);

#[derive(Debug, Clone)]
enum Plan {
    Hidden,
    SelfLoop,
    Forward {
        first: Lane,
        second: Option<(Lane, usize, usize)>,
    },
    Backward {
        first: Lane,
        second: Option<(Lane, usize, usize)>,
    },
    SameLayer {
        lane: Lane,
    },
    Local {
        sides: (PortSide, PortSide),
    },
    Contained {
        outer: String,
    },
}

#[derive(Debug, Clone)]
struct Planned {
    id: String,
    source: String,
    target: String,
    plan: Plan,
    source_port: EdgePort,
    target_port: EdgePort,
}

/// Lane requests per gap; gap `g` lies right of layer `g`.
struct GapLanes {
    requests: Vec<usize>,
}

impl GapLanes {
    fn request(&mut self, gap: usize) -> Lane {
        if gap >= self.requests.len() {
            self.requests.resize(gap + 1, 0);
        }
        let idx = self.requests[gap];
        self.requests[gap] += 1;
        (gap, idx)
    }

    fn x(&self, lane: Lane, layers: &[Layer], gap_width: f64) -> f64 {
        let (gap, idx) = lane;
        let Some(layer) = layers.get(gap) else {
            return 0.0;
        };
        let left = layer.right();
        let right = layers.get(gap + 1).map_or(left + gap_width, |next| next.layer_x);
        let requested = self.requests.get(gap).copied().unwrap_or(0);
        let total = requested.max(layer.outgoing_connection_count).max(1);
        left + (right - left) * (idx + 1) as f64 / (total + 1) as f64
    }
}

/// Routes every flagged edge whose endpoints are both in scope and returns the ids of the routed
/// edges in stored order. Edges naming unknown nodes are reported and skipped.
pub(crate) fn compute_edges_layout(
    graph: &mut ShLayoutGraph,
    scope: &FxHashSet<String>,
    layers: &[Layer],
    config: &LayoutConfig,
    telemetry: &dyn TelemetryProvider,
) -> Vec<String> {
    let layer_of: FxHashMap<&str, usize> = layers
        .iter()
        .enumerate()
        .flat_map(|(i, l)| l.nodes().iter().map(move |n| (n.id.as_str(), i)))
        .collect();

    let mut lanes = GapLanes {
        requests: vec![0; layers.len()],
    };
    let mut planned: Vec<Planned> = Vec::new();
    let mut dropped = 0usize;
    for entry in graph.edges() {
        if !entry.label.is_added_since_last_layout {
            continue;
        }
        let (src, dst) = (entry.source.as_str(), entry.destination.as_str());
        if !graph.has_node(src) || !graph.has_node(dst) {
            dropped += 1;
            telemetry.info(
                "dropped edge referencing an unknown node",
                SOURCE,
                "computeEdgesLayout",
                Some(&props([
                    ("edgeId", entry.id.as_str()),
                    ("source", src),
                    ("destination", dst),
                ])),
            );
            continue;
        }
        if !scope.contains(src) || !scope.contains(dst) {
            dropped += 1;
            continue;
        }

        let vs = graph.nearest_visible(src);
        let vd = graph.nearest_visible(dst);
        let plan = if src == dst {
            if vs == src { Plan::SelfLoop } else { Plan::Hidden }
        } else if vs == vd {
            Plan::Hidden
        } else if graph.ancestors(vd).contains(&vs) {
            Plan::Contained {
                outer: vs.to_string(),
            }
        } else if graph.ancestors(vs).contains(&vd) {
            Plan::Contained {
                outer: vd.to_string(),
            }
        } else {
            let rs = graph.root_of(vs);
            let rd = graph.root_of(vd);
            match (layer_of.get(rs).copied(), layer_of.get(rd).copied()) {
                _ if rs == rd => Plan::Local {
                    sides: local_sides(graph, vs, vd),
                },
                (Some(ls), Some(ld)) if ls < ld => Plan::Forward {
                    first: lanes.request(ls),
                    second: (ld > ls + 1).then(|| (lanes.request(ld - 1), ls + 1, ld)),
                },
                (Some(ls), Some(ld)) if ls > ld => Plan::Backward {
                    first: lanes.request(ls - 1),
                    second: (ls > ld + 1).then(|| (lanes.request(ld), ld + 1, ls)),
                },
                (Some(ls), Some(_)) => Plan::SameLayer {
                    lane: lanes.request(ls),
                },
                _ => Plan::Hidden,
            }
        };
        planned.push(Planned {
            id: entry.id.clone(),
            source: vs.to_string(),
            target: vd.to_string(),
            plan,
            source_port: EdgePort::Center,
            target_port: EdgePort::Center,
        });
    }
    if dropped > 0 {
        tracing::debug!(dropped, "edges dropped during edge layout");
    }

    assign_ports(graph, scope, &mut planned);

    let mut self_edges = SelfEdgeLayoutManager::new(config);
    for p in &planned {
        if let (Plan::SelfLoop, Some(node)) = (&p.plan, graph.node(&p.source)) {
            self_edges.add_self_edge(&p.source, node.geometry, &p.id);
        }
    }
    let loops: FxHashMap<String, Vec<Point>> = self_edges
        .layout()
        .into_iter()
        .map(|r| (r.edge_id, r.segments))
        .collect();

    let mut routed = Vec::with_capacity(planned.len());
    for p in planned {
        let segments = match &p.plan {
            Plan::Hidden => Vec::new(),
            Plan::SelfLoop => loops.get(&p.id).cloned().unwrap_or_default(),
            _ => {
                let (Some(s), Some(t)) = (graph.node(&p.source), graph.node(&p.target)) else {
                    continue;
                };
                let start = s.port_coordinate(p.source_port);
                let end = t.port_coordinate(p.target_port);
                polyline(graph, &p.plan, start, end, layers, &lanes, config)
            }
        };
        let visible = !matches!(p.plan, Plan::Hidden);
        if let Some(entry) = graph.edge_mut(&p.id) {
            let e = &mut entry.label;
            e.segments = simplify_polyline(segments);
            e.source_edge_port = if visible { p.source_port } else { EdgePort::Center };
            e.target_edge_port = if visible { p.target_port } else { EdgePort::Center };
            e.is_visible = visible;
        }
        routed.push(p.id);
    }
    routed
}

fn local_sides(graph: &ShLayoutGraph, s: &str, t: &str) -> (PortSide, PortSide) {
    let (Some(s), Some(t)) = (graph.node(s), graph.node(t)) else {
        return (PortSide::Right, PortSide::Right);
    };
    let (s, t) = (s.geometry, t.geometry);
    if t.x >= s.right() {
        (PortSide::Right, PortSide::Left)
    } else if t.right() <= s.x {
        (PortSide::Left, PortSide::Right)
    } else {
        (PortSide::Right, PortSide::Right)
    }
}

fn end_sides(plan: &Plan) -> Option<(PortSide, PortSide)> {
    match plan {
        Plan::Hidden | Plan::SelfLoop => None,
        Plan::Forward { .. } => Some((PortSide::Right, PortSide::Left)),
        Plan::Backward { .. } => Some((PortSide::Left, PortSide::Right)),
        Plan::SameLayer { .. } => Some((PortSide::Right, PortSide::Right)),
        Plan::Local { sides } => Some(*sides),
        Plan::Contained { .. } => Some((PortSide::Left, PortSide::Left)),
    }
}

/// Self-loops claim their node's right slots first. Every other edge end is then assigned per
/// node and side in order of the opposite end's position along that side.
fn assign_ports(graph: &mut ShLayoutGraph, scope: &FxHashSet<String>, planned: &mut [Planned]) {
    let order: FxHashMap<String, usize> = graph
        .node_ids()
        .into_iter()
        .enumerate()
        .map(|(i, id)| (id, i))
        .collect();
    for id in scope {
        if let Some(n) = graph.node_mut(id) {
            n.reset_port_assignments();
        }
    }

    for p in planned.iter_mut() {
        if matches!(p.plan, Plan::SelfLoop) {
            if let Some(n) = graph.node_mut(&p.source) {
                p.source_port = n.assign_port(PortSide::Right);
                p.target_port = n.assign_port(PortSide::Right);
            }
        }
    }

    // (node order, side, key, edge index, is source end)
    let mut ends: Vec<(usize, usize, f64, usize, bool)> = Vec::new();
    for (i, p) in planned.iter().enumerate() {
        let Some((source_side, target_side)) = end_sides(&p.plan) else {
            continue;
        };
        let (Some(s), Some(t)) = (graph.node(&p.source), graph.node(&p.target)) else {
            continue;
        };
        let key = |side: PortSide, other: &BoundingBox| match side {
            PortSide::Left | PortSide::Right => other.center().y,
            PortSide::Top | PortSide::Bottom => other.center().x,
        };
        let so = order.get(&p.source).copied().unwrap_or(usize::MAX);
        let to = order.get(&p.target).copied().unwrap_or(usize::MAX);
        ends.push((so, side_rank(source_side), key(source_side, &t.geometry), i, true));
        ends.push((to, side_rank(target_side), key(target_side, &s.geometry), i, false));
    }
    ends.sort_by(|a, b| (a.0, a.1).cmp(&(b.0, b.1)).then(a.2.total_cmp(&b.2)));

    for (_, _, _, i, is_source) in ends {
        let p = &mut planned[i];
        let Some((source_side, target_side)) = end_sides(&p.plan) else {
            continue;
        };
        let (node_id, side) = if is_source {
            (p.source.as_str(), source_side)
        } else {
            (p.target.as_str(), target_side)
        };
        let Some(n) = graph.node_mut(node_id) else {
            continue;
        };
        let port = n.assign_port(side);
        if is_source {
            p.source_port = port;
        } else {
            p.target_port = port;
        }
    }

    for id in scope {
        if let Some(n) = graph.node_mut(id) {
            n.calculate_edge_port_coordinates();
        }
    }
}

fn side_rank(side: PortSide) -> usize {
    match side {
        PortSide::Top => 0,
        PortSide::Right => 1,
        PortSide::Bottom => 2,
        PortSide::Left => 3,
    }
}

fn polyline(
    graph: &ShLayoutGraph,
    plan: &Plan,
    start: Point,
    end: Point,
    layers: &[Layer],
    lanes: &GapLanes,
    config: &LayoutConfig,
) -> Vec<Point> {
    let gap = config.minimum_layer_distance;
    match plan {
        Plan::Forward { first, second } | Plan::Backward { first, second } => {
            let x1 = lanes.x(*first, layers, gap);
            match second {
                None => vec![start, Point::new(x1, start.y), Point::new(x1, end.y), end],
                Some((lane, from, to)) => {
                    let x2 = lanes.x(*lane, layers, gap);
                    let obstacles = layers_between(graph, layers, *from, *to);
                    let y = corridor_y(&obstacles, start.y, end.y, x1, x2, config);
                    vec![
                        start,
                        Point::new(x1, start.y),
                        Point::new(x1, y),
                        Point::new(x2, y),
                        Point::new(x2, end.y),
                        end,
                    ]
                }
            }
        }
        Plan::SameLayer { lane } => {
            let x = lanes.x(*lane, layers, gap);
            vec![start, Point::new(x, start.y), Point::new(x, end.y), end]
        }
        Plan::Local { sides } => {
            let x = match sides {
                (PortSide::Right, PortSide::Right) => {
                    start.x.max(end.x) + config.edge_segment_length
                }
                _ => (start.x + end.x) / 2.0,
            };
            vec![start, Point::new(x, start.y), Point::new(x, end.y), end]
        }
        Plan::Contained { outer } => {
            let left = graph.node(outer).map_or(start.x.min(end.x), |n| n.geometry.x);
            let x = left - config.edge_segment_length;
            vec![start, Point::new(x, start.y), Point::new(x, end.y), end]
        }
        Plan::Hidden | Plan::SelfLoop => Vec::new(),
    }
}

/// Boxes of the roots in layers `from..to`.
fn layers_between(
    graph: &ShLayoutGraph,
    layers: &[Layer],
    from: usize,
    to: usize,
) -> Vec<BoundingBox> {
    layers
        .get(from..to)
        .unwrap_or_default()
        .iter()
        .flat_map(|l| l.nodes())
        .filter_map(|n| graph.node(&n.id).map(|node| node.geometry))
        .collect()
}

/// Height of a horizontal run from `x1` to `x2` that crosses none of `obstacles`, as close as
/// possible to both ends.
fn corridor_y(
    obstacles: &[BoundingBox],
    start_y: f64,
    end_y: f64,
    x1: f64,
    x2: f64,
    config: &LayoutConfig,
) -> f64 {
    let offset = config.single_segment_edge_error_offset;
    let clear = |y: f64| !obstacles.iter().any(|b| b.blocks_horizontal(y, x1, x2));
    let mut candidates = vec![start_y, end_y];
    for b in obstacles {
        candidates.push(b.y - offset);
        candidates.push(b.bottom() + offset);
    }
    let cost = |y: f64| (y - start_y).abs() + (y - end_y).abs();
    candidates
        .into_iter()
        .filter(|&y| clear(y))
        .min_by(|a, b| cost(*a).total_cmp(&cost(*b)))
        .unwrap_or_else(|| {
            obstacles.iter().map(|b| b.y).fold(start_y, f64::min) - offset
        })
}

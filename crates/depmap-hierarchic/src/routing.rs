//! Orthogonal edge routing over positioned boxes.
//!
//! Edges leave the right side of their source and enter the left side of their target when the
//! target lies to the right; leftward edges mirror that. Boxes whose horizontal extents overlap
//! (same column, or nested) are joined by a bracket to the right of both. Edges from one source
//! that share a gap get their own vertical lane. Self-edges are left to the caller.

use crate::graph::{HierarchicGraph, NodeBox, Point, Side};
use crate::layered::HierarchicOptions;
use rustc_hash::FxHashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Forward,
    Backward,
    Bracket,
}

fn direction(s: &NodeBox, t: &NodeBox) -> Direction {
    if t.x >= s.right() {
        Direction::Forward
    } else if t.right() <= s.x {
        Direction::Backward
    } else {
        Direction::Bracket
    }
}

pub fn route_edges(g: &mut HierarchicGraph, options: &HierarchicOptions) {
    let mut routed: Vec<(String, NodeBox, NodeBox, Direction)> = Vec::new();
    for edge_id in g.edge_ids() {
        let Some((source, target)) = g.edge_endpoints(&edge_id) else {
            continue;
        };
        if source == target {
            continue;
        }
        let (Some(s), Some(t)) = (g.node(source).copied(), g.node(target).copied()) else {
            continue;
        };
        routed.push((edge_id, s, t, direction(&s, &t)));
    }

    // Lane slots per (source box, direction), in edge order.
    let mut lane_totals: FxHashMap<(u64, u64, Direction), usize> = FxHashMap::default();
    let key = |b: &NodeBox, d: Direction| (b.x.to_bits(), b.y.to_bits(), d);
    for (_, s, _, d) in &routed {
        *lane_totals.entry(key(s, *d)).or_default() += 1;
    }
    let mut lane_next: FxHashMap<(u64, u64, Direction), usize> = FxHashMap::default();

    for (edge_id, s, t, d) in routed {
        let total = lane_totals.get(&key(&s, d)).copied().unwrap_or(1);
        let slot = lane_next.entry(key(&s, d)).or_default();
        let lane = *slot;
        *slot += 1;
        let fraction = (lane + 1) as f64 / (total + 1) as f64;

        let (sc, tc) = (s.center(), t.center());
        let (points, source_side, target_side) = match d {
            Direction::Forward => {
                let x = s.right() + (t.x - s.right()) * fraction;
                (
                    vec![
                        Point::new(s.right(), sc.y),
                        Point::new(x, sc.y),
                        Point::new(x, tc.y),
                        Point::new(t.x, tc.y),
                    ],
                    Side::Right,
                    Side::Left,
                )
            }
            Direction::Backward => {
                let x = s.x - (s.x - t.right()) * fraction;
                (
                    vec![
                        Point::new(s.x, sc.y),
                        Point::new(x, sc.y),
                        Point::new(x, tc.y),
                        Point::new(t.right(), tc.y),
                    ],
                    Side::Left,
                    Side::Right,
                )
            }
            Direction::Bracket => {
                let x = s.right().max(t.right()) + options.edge_spacing * (lane + 1) as f64;
                (
                    vec![
                        Point::new(s.right(), sc.y),
                        Point::new(x, sc.y),
                        Point::new(x, tc.y),
                        Point::new(t.right(), tc.y),
                    ],
                    Side::Right,
                    Side::Right,
                )
            }
        };

        if let Some(path) = g.edge_mut(&edge_id) {
            path.points = simplify(points);
            path.source_side = source_side;
            path.target_side = target_side;
        }
    }
}

/// Drops repeated points and interior points lying inside a straight axis-aligned run.
/// A run that doubles back keeps its turning point.
pub fn simplify(points: Vec<Point>) -> Vec<Point> {
    let between = |a: f64, b: f64, c: f64| (a <= b && b <= c) || (c <= b && b <= a);
    let mut out: Vec<Point> = Vec::with_capacity(points.len());
    for p in points {
        if out.last() == Some(&p) {
            continue;
        }
        if out.len() >= 2 {
            let a = out[out.len() - 2];
            let b = out[out.len() - 1];
            let vertical = a.x == b.x && b.x == p.x && between(a.y, b.y, p.y);
            let horizontal = a.y == b.y && b.y == p.y && between(a.x, b.x, p.x);
            if vertical || horizontal {
                out.pop();
            }
        }
        out.push(p);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplify_drops_collinear_points() {
        let pts = vec![
            Point::new(0.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(5.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 5.0),
        ];
        assert_eq!(
            simplify(pts),
            vec![Point::new(0.0, 0.0), Point::new(10.0, 0.0), Point::new(10.0, 5.0)]
        );
    }

    #[test]
    fn simplify_keeps_turning_points() {
        let pts = vec![
            Point::new(30.0, 10.0),
            Point::new(42.0, 10.0),
            Point::new(25.0, 10.0),
        ];
        assert_eq!(simplify(pts.clone()), pts);
    }
}

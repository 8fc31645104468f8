//! Barycenter ordering within ranks.
//!
//! Alternating down/up sweeps reorder each rank by the mean normalized position of its
//! neighbors in the already-fixed ranks; the ordering with the fewest adjacent-rank crossings
//! wins. Sorting is stable so ties keep insertion order.

pub fn order_layers(layers: &mut [Vec<usize>], edges: &[(usize, usize)], sweeps: usize) {
    if layers.len() < 2 || edges.is_empty() {
        return;
    }
    let node_count = layers.iter().map(|l| l.len()).sum::<usize>().max(
        edges
            .iter()
            .map(|&(v, w)| v.max(w) + 1)
            .max()
            .unwrap_or(0),
    );
    let mut layer_of = vec![usize::MAX; node_count];
    for (li, layer) in layers.iter().enumerate() {
        for &v in layer {
            if v < node_count {
                layer_of[v] = li;
            }
        }
    }

    let mut best: Vec<Vec<usize>> = layers.to_vec();
    let mut best_crossings = crossings(layers, edges, &layer_of);

    for sweep in 0..sweeps {
        let downward = sweep % 2 == 0;
        let indices: Vec<usize> = if downward {
            (1..layers.len()).collect()
        } else {
            (0..layers.len() - 1).rev().collect()
        };
        for li in indices {
            let positions = normalized_positions(layers, node_count);
            let mut keyed: Vec<(f64, usize)> = layers[li]
                .iter()
                .enumerate()
                .map(|(pos, &v)| {
                    let mut sum = 0.0;
                    let mut count = 0usize;
                    for &(a, b) in edges {
                        let other = if a == v { b } else if b == v { a } else { continue };
                        if other == v || other >= node_count {
                            continue;
                        }
                        let ol = layer_of[other];
                        let fixed = if downward { ol < li } else { ol > li && ol != usize::MAX };
                        if fixed {
                            sum += positions[other];
                            count += 1;
                        }
                    }
                    let own = if layers[li].len() > 1 {
                        pos as f64 / (layers[li].len() - 1) as f64
                    } else {
                        0.5
                    };
                    let key = if count == 0 { own } else { sum / count as f64 };
                    (key, v)
                })
                .collect();
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            layers[li] = keyed.into_iter().map(|(_, v)| v).collect();
        }

        let c = crossings(layers, edges, &layer_of);
        if c < best_crossings {
            best_crossings = c;
            best = layers.to_vec();
        }
    }

    layers.clone_from_slice(&best);
}

fn normalized_positions(layers: &[Vec<usize>], node_count: usize) -> Vec<f64> {
    let mut out = vec![0.0; node_count];
    for layer in layers {
        let denom = (layer.len().max(2) - 1) as f64;
        for (pos, &v) in layer.iter().enumerate() {
            if v < node_count {
                out[v] = if layer.len() > 1 { pos as f64 / denom } else { 0.5 };
            }
        }
    }
    out
}

/// Crossings between edges joining the same pair of adjacent ranks.
pub fn crossings(layers: &[Vec<usize>], edges: &[(usize, usize)], layer_of: &[usize]) -> usize {
    let mut pos = vec![0usize; layer_of.len()];
    for layer in layers {
        for (i, &v) in layer.iter().enumerate() {
            if v < pos.len() {
                pos[v] = i;
            }
        }
    }

    let mut spans: Vec<(usize, usize, usize)> = Vec::new();
    for &(a, b) in edges {
        if a >= layer_of.len() || b >= layer_of.len() {
            continue;
        }
        let (la, lb) = (layer_of[a], layer_of[b]);
        if la == usize::MAX || lb == usize::MAX {
            continue;
        }
        if la + 1 == lb {
            spans.push((la, pos[a], pos[b]));
        } else if lb + 1 == la {
            spans.push((lb, pos[b], pos[a]));
        }
    }

    let mut count = 0;
    for (i, &(l1, u1, v1)) in spans.iter().enumerate() {
        for &(l2, u2, v2) in &spans[i + 1..] {
            if l1 == l2 && ((u1 < u2 && v1 > v2) || (u1 > u2 && v1 < v2)) {
                count += 1;
            }
        }
    }
    count
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sweeps_remove_a_simple_crossing() {
        // 0 -> 3, 1 -> 2 cross when rank 1 is ordered [2, 3].
        let mut layers = vec![vec![0, 1], vec![2, 3]];
        let edges = [(0, 3), (1, 2)];
        order_layers(&mut layers, &edges, 4);
        assert_eq!(layers[0], vec![0, 1]);
        assert_eq!(layers[1], vec![3, 2]);
    }

    #[test]
    fn ordering_is_kept_without_edges() {
        let mut layers = vec![vec![0, 1], vec![2, 3]];
        order_layers(&mut layers, &[], 4);
        assert_eq!(layers, vec![vec![0, 1], vec![2, 3]]);
    }
}

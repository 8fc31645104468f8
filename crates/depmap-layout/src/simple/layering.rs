//! Layer assignment for root nodes.

use crate::config::LayoutConfig;
use crate::layer::Layer;
use crate::store::ShLayoutGraph;
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Longest-path layers over `edges` (index pairs). Nodes without incoming edges start at 0. When
/// a cycle blocks progress, the unvisited node with the fewest unresolved predecessors is
/// visited anyway; a node's layer is fixed on its first visit and never revisited.
pub fn assign_layers(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut indegree = vec![0usize; node_count];
    let mut successors: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for &(v, w) in edges {
        if v == w || v >= node_count || w >= node_count {
            continue;
        }
        successors[v].push(w);
        indegree[w] += 1;
    }

    let mut layer = vec![0usize; node_count];
    let mut visited = vec![false; node_count];
    let mut queue: VecDeque<usize> = (0..node_count).filter(|&v| indegree[v] == 0).collect();
    loop {
        while let Some(v) = queue.pop_front() {
            if visited[v] {
                continue;
            }
            visited[v] = true;
            for &w in &successors[v] {
                if visited[w] {
                    continue;
                }
                layer[w] = layer[w].max(layer[v] + 1);
                indegree[w] -= 1;
                if indegree[w] == 0 {
                    queue.push_back(w);
                }
            }
        }
        let forced = (0..node_count)
            .filter(|&v| !visited[v])
            .min_by_key(|&v| (indegree[v], v));
        match forced {
            Some(v) => queue.push_back(v),
            None => break,
        }
    }
    layer
}

/// Root-level edges: every edge between two scoped nodes, lifted to the roots containing them.
pub(crate) fn root_edges(
    graph: &ShLayoutGraph,
    roots: &[String],
    scope: &FxHashSet<String>,
) -> Vec<(usize, usize)> {
    let index: FxHashMap<&str, usize> = roots
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    graph
        .edges()
        .filter(|e| scope.contains(&e.source) && scope.contains(&e.destination))
        .filter_map(|e| {
            let v = *index.get(graph.root_of(&e.source))?;
            let w = *index.get(graph.root_of(&e.destination))?;
            (v != w).then_some((v, w))
        })
        .collect()
}

/// Buckets roots into layers. Within a layer, roots with more outgoing root-level edges come
/// first; ties keep their stored order.
pub(crate) fn build_layers(
    graph: &ShLayoutGraph,
    roots: &[String],
    scope: &FxHashSet<String>,
    config: &LayoutConfig,
) -> Vec<Layer> {
    if roots.is_empty() {
        return Vec::new();
    }
    let edges = root_edges(graph, roots, scope);
    let mut outgoing = vec![0usize; roots.len()];
    for &(v, _) in &edges {
        outgoing[v] += 1;
    }

    let assigned = assign_layers(roots.len(), &edges);
    let count = assigned.iter().copied().max().unwrap_or(0) + 1;
    let mut buckets: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (i, &l) in assigned.iter().enumerate() {
        buckets[l].push(i);
    }

    let mut layers = Vec::with_capacity(count);
    for mut bucket in buckets {
        bucket.sort_by(|a, b| outgoing[*b].cmp(&outgoing[*a]));
        let mut layer = Layer::new(config.node_to_node_distance);
        for i in bucket {
            let Some(node) = graph.node(&roots[i]) else {
                continue;
            };
            layer.add_node(
                roots[i].clone(),
                node.geometry.width,
                node.geometry.height,
                outgoing[i],
            );
        }
        layers.push(layer);
    }
    tracing::debug!(roots = roots.len(), layers = layers.len(), "roots layered");
    layers
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn successors_follow_their_deepest_predecessor() {
        assert_eq!(assign_layers(4, &[(0, 1), (1, 2), (0, 2)]), vec![0, 1, 2, 0]);
    }

    #[test]
    fn cycles_terminate() {
        // 0 -> 1 -> 2 -> 1, plus an isolated cycle 3 <-> 4.
        let layers = assign_layers(5, &[(0, 1), (1, 2), (2, 1), (3, 4), (4, 3)]);
        assert_eq!(layers[0], 0);
        assert_eq!(layers[1], 1);
        assert_eq!(layers[2], 2);
        assert_eq!((layers[3], layers[4]), (0, 1));
    }
}

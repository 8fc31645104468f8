//! Break cycles before ranking.
//!
//! Depth-first search over nodes in insertion order; an edge that closes onto the current DFS
//! stack is part of the feedback arc set and is treated as reversed while ranking. Self-loops
//! never constrain ranks and are skipped.

pub fn dfs_feedback_arcs(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let mut out_edges: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (idx, &(v, w)) in edges.iter().enumerate() {
        if v != w && v < node_count && w < node_count {
            out_edges[v].push(idx);
        }
    }

    fn dfs(
        v: usize,
        edges: &[(usize, usize)],
        out_edges: &[Vec<usize>],
        visited: &mut [bool],
        on_stack: &mut [bool],
        fas: &mut Vec<usize>,
    ) {
        if visited[v] {
            return;
        }
        visited[v] = true;
        on_stack[v] = true;
        for &idx in &out_edges[v] {
            let w = edges[idx].1;
            if on_stack[w] {
                fas.push(idx);
            } else {
                dfs(w, edges, out_edges, visited, on_stack, fas);
            }
        }
        on_stack[v] = false;
    }

    let mut visited = vec![false; node_count];
    let mut on_stack = vec![false; node_count];
    let mut fas: Vec<usize> = Vec::new();
    for v in 0..node_count {
        dfs(v, edges, &out_edges, &mut visited, &mut on_stack, &mut fas);
    }
    fas.sort_unstable();
    fas
}

/// Longest-path ranks over `edges` with the feedback arcs reversed.
pub fn longest_path_ranks(node_count: usize, edges: &[(usize, usize)]) -> Vec<usize> {
    let reversed = dfs_feedback_arcs(node_count, edges);
    let mut indegree = vec![0usize; node_count];
    let mut out: Vec<Vec<usize>> = vec![Vec::new(); node_count];
    for (idx, &(v, w)) in edges.iter().enumerate() {
        if v == w || v >= node_count || w >= node_count {
            continue;
        }
        let (v, w) = if reversed.binary_search(&idx).is_ok() {
            (w, v)
        } else {
            (v, w)
        };
        out[v].push(w);
        indegree[w] += 1;
    }

    // Deterministic Kahn order: initial nodes in insertion order.
    let mut queue: std::collections::VecDeque<usize> =
        (0..node_count).filter(|&v| indegree[v] == 0).collect();
    let mut rank = vec![0usize; node_count];
    while let Some(v) = queue.pop_front() {
        for &w in &out[v] {
            rank[w] = rank[w].max(rank[v] + 1);
            indegree[w] -= 1;
            if indegree[w] == 0 {
                queue.push_back(w);
            }
        }
    }
    rank
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acyclic_graph_has_no_feedback_arcs() {
        assert!(dfs_feedback_arcs(3, &[(0, 1), (1, 2), (0, 2)]).is_empty());
    }

    #[test]
    fn cycle_is_broken_at_the_back_edge() {
        assert_eq!(dfs_feedback_arcs(3, &[(0, 1), (1, 2), (2, 0)]), vec![2]);
        assert_eq!(longest_path_ranks(3, &[(0, 1), (1, 2), (2, 0)]), vec![0, 1, 2]);
    }

    #[test]
    fn ranks_follow_the_longest_path() {
        assert_eq!(
            longest_path_ranks(4, &[(0, 1), (1, 2), (0, 2), (3, 3)]),
            vec![0, 1, 2, 0]
        );
    }
}

use criterion::{BatchSize, BenchmarkId, Criterion, criterion_group, criterion_main};
use depmap_layout::{
    LayoutConfig, LayoutManager, LayoutUpdatePattern, NoopTelemetry, SimpleHierarchicalLayouter,
};
use std::hint::black_box;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone)]
struct MapSpec {
    /// (id, parent index)
    nodes: Vec<(String, Option<usize>)>,
    edges: Vec<(usize, usize)>,
}

impl MapSpec {
    fn build(&self) -> SimpleHierarchicalLayouter {
        let mut layouter =
            SimpleHierarchicalLayouter::with_telemetry(LayoutConfig::default(), Arc::new(NoopTelemetry));
        for (id, parent) in &self.nodes {
            let parent_id = parent.map(|p| self.nodes[p].0.as_str());
            let root_id = parent_id.unwrap_or(id.as_str());
            layouter.add_node(id, parent_id, root_id, true, None);
        }
        for &(from, to) in &self.edges {
            layouter.add_edge(&self.nodes[from].0, &self.nodes[to].0, None);
        }
        layouter
    }
}

/// `roots` maps with `children` members each; maps form a chain plus skip edges, and members of
/// neighbouring maps are linked.
fn build_map_spec(name: &str, roots: usize, children: usize) -> MapSpec {
    let mut nodes: Vec<(String, Option<usize>)> = Vec::new();
    let mut edges: Vec<(usize, usize)> = Vec::new();
    let mut root_index: Vec<usize> = Vec::with_capacity(roots);
    for r in 0..roots {
        let root = nodes.len();
        root_index.push(root);
        nodes.push((format!("{name}_m{r}"), None));
        for c in 0..children {
            nodes.push((format!("{name}_m{r}_p{c}"), Some(root)));
        }
    }

    for r in 0..roots {
        if r + 1 < roots {
            edges.push((root_index[r], root_index[r + 1]));
            edges.push((root_index[r] + 1, root_index[r + 1] + 1));
        }
        if r + 3 < roots {
            edges.push((root_index[r], root_index[r + 3]));
        }
        if r % 5 == 0 {
            edges.push((root_index[r], root_index[r]));
        }
    }

    MapSpec { nodes, edges }
}

fn bench_simple_layout(c: &mut Criterion) {
    let mut group = c.benchmark_group("simple_layout");
    group.measurement_time(Duration::from_secs(10));

    let cases = [
        ("map_10x4", 10usize, 4usize),
        ("map_50x6", 50usize, 6usize),
        ("map_200x8", 200usize, 8usize),
    ];

    for (name, roots, children) in cases {
        let spec = build_map_spec(name, roots, children);
        group.bench_with_input(BenchmarkId::new("do_layout::scratch", name), &spec, |b, spec| {
            b.iter_batched(
                || spec.build(),
                |mut layouter| {
                    let graph = layouter
                        .do_layout(black_box(LayoutUpdatePattern::Scratch), None)
                        .unwrap();
                    black_box(graph.nodes.len());
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

criterion_group!(benches, bench_simple_layout);
criterion_main!(benches);

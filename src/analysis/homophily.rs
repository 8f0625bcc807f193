use rustc_hash::FxHashMap;

use crate::core::graph::Graph;
use crate::core::ids::UserId;

/// Adjusted homophily of `graph` under `labels`:
/// `(h_edge - sum(p^2)) / (1 - sum(p^2))`, where `h_edge` is the share of
/// edges joining equal labels and `p` the degree share of each label.
/// Returns 0.0 when the value is undefined.
pub fn adjusted_homophily(graph: &Graph, labels: &[u32]) -> f64 {
    let edges = graph.edge_count();
    if edges == 0 {
        return 0.0;
    }

    let label = |u: UserId| labels.get(u as usize).copied();
    let mut same = 0usize;
    for u in 0..graph.node_count() as UserId {
        for e in graph.edges_from(u) {
            if label(u).is_some() && label(u) == label(e.dst) {
                same += 1;
            }
        }
    }
    let h_edge = same as f64 / edges as f64;

    let mut degree_by_label: FxHashMap<u32, usize> = FxHashMap::default();
    for u in 0..graph.node_count() as UserId {
        if let Some(l) = label(u) {
            *degree_by_label.entry(l).or_default() += graph.degree(u);
        }
    }
    let total_degree = (2 * edges) as f64;
    let expected = degree_by_label
        .values()
        .map(|d| {
            let p = *d as f64 / total_degree;
            p * p
        })
        .sum::<f64>();

    if (1.0 - expected).abs() < f64::EPSILON {
        return 0.0;
    }
    (h_edge - expected) / (1.0 - expected)
}

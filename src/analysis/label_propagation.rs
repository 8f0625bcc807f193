use std::mem::swap;

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::core::graph::Graph;
use crate::core::ids::UserId;

/// Most frequent label among `neighbors`; ties go to the smaller label.
fn dominant_label(
    labels: &[u32],
    neighbors: impl Iterator<Item = UserId>,
    tally: &mut Vec<(u32, usize)>,
) -> Option<u32> {
    tally.clear();
    for v in neighbors {
        let label = labels[v as usize];
        match tally.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => tally.push((label, 1)),
        }
    }
    tally
        .iter()
        .max_by(|a, b| a.1.cmp(&b.1).then(b.0.cmp(&a.0)))
        .map(|(label, _)| *label)
}

/// Synchronous label propagation over undirected neighbourhoods. Every user
/// starts with its own id as label; stops early once a round changes nothing.
pub fn label_propagation(graph: &Graph, max_iters: usize) -> Vec<u32> {
    let n = graph.node_count();
    let mut labels = (0..n as u32).collect::<Vec<_>>();
    let mut next_labels = labels.clone();
    let mut tally = Vec::with_capacity(8);

    for _ in 0..max_iters {
        let mut changed = false;
        for u in 0..n {
            let label = dominant_label(&labels, graph.neighbors(u as UserId), &mut tally)
                .unwrap_or(labels[u]);
            changed |= label != labels[u];
            next_labels[u] = label;
        }
        if !changed {
            break;
        }
        swap(&mut labels, &mut next_labels);
    }
    labels
}

pub fn community_count(labels: &[u32]) -> usize {
    labels.iter().collect::<FxHashSet<_>>().len()
}

/// `(label, size)` per community, largest first; equal sizes by label.
pub fn community_sizes(labels: &[u32]) -> Vec<(u32, usize)> {
    let mut sizes: FxHashMap<u32, usize> = FxHashMap::default();
    for label in labels {
        *sizes.entry(*label).or_default() += 1;
    }
    let mut sizes = sizes.into_iter().collect::<Vec<_>>();
    sizes.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    sizes
}

/// Newman modularity of `labels` over the undirected edges of `graph`:
/// the sum over communities of `l_c / m - (d_c / 2m)^2`. 0.0 without edges.
pub fn modularity(graph: &Graph, labels: &[u32]) -> f64 {
    let m = graph.edge_count();
    if m == 0 {
        return 0.0;
    }
    let mut inside: FxHashMap<u32, usize> = FxHashMap::default();
    let mut degree: FxHashMap<u32, usize> = FxHashMap::default();
    for u in 0..graph.node_count() as UserId {
        let label = labels[u as usize];
        *degree.entry(label).or_default() += graph.degree(u);
        for e in graph.edges_from(u) {
            if labels[e.dst as usize] == label {
                *inside.entry(label).or_default() += 1;
            }
        }
    }
    let m = m as f64;
    degree
        .iter()
        .map(|(label, d)| {
            let l = inside.get(label).copied().unwrap_or(0) as f64;
            let share = *d as f64 / (2.0 * m);
            l / m - share * share
        })
        .sum()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunitySummary {
    pub count: usize,
    pub modularity: f64,
    pub sizes: Vec<(u32, usize)>,
}

impl CommunitySummary {
    pub fn largest(&self) -> usize {
        self.sizes.first().map_or(0, |(_, size)| *size)
    }

    pub fn smallest(&self) -> usize {
        self.sizes.last().map_or(0, |(_, size)| *size)
    }

    pub fn average(&self) -> f64 {
        if self.sizes.is_empty() {
            return 0.0;
        }
        self.sizes.iter().map(|(_, size)| *size).sum::<usize>() as f64 / self.sizes.len() as f64
    }
}

pub fn summarize_communities(graph: &Graph, labels: &[u32]) -> CommunitySummary {
    CommunitySummary {
        count: community_count(labels),
        modularity: modularity(graph, labels),
        sizes: community_sizes(labels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::graph::GraphBuilder;
    use approx::assert_relative_eq;

    fn graph(n: usize, edges: &[(UserId, UserId)]) -> Graph {
        let mut gb = GraphBuilder::new(n);
        for (a, b) in edges {
            gb.add_edge(*a, *b, 1.0);
        }
        gb.freeze()
    }

    #[test]
    fn test_isolated_users_keep_their_ids() {
        let g = graph(3, &[]);
        assert_eq!(vec![0, 1, 2], label_propagation(&g, 10));
        assert_eq!(3, community_count(&label_propagation(&g, 10)));
    }

    #[test]
    fn test_star_adopts_smallest_leaf() {
        // the hub sees four distinct labels and takes the smallest, leaves
        // all see the hub
        let g = graph(5, &[(0, 1), (0, 2), (0, 3), (0, 4)]);
        assert_eq!(vec![1, 0, 0, 0, 0], label_propagation(&g, 1));
    }

    #[test]
    fn test_bridged_cliques_split() {
        let mut edges = vec![(3, 4)];
        for a in 0..4 {
            for b in a + 1..4 {
                edges.push((a, b));
                edges.push((a + 4, b + 4));
            }
        }
        let labels = label_propagation(&graph(8, &edges), 20);
        assert_eq!(vec![0, 0, 0, 0, 4, 4, 4, 4], labels);
        assert_eq!(2, community_count(&labels));
    }

    #[test]
    fn test_zero_iterations() {
        let g = graph(2, &[(0, 1)]);
        assert_eq!(vec![0, 1], label_propagation(&g, 0));
    }

    #[test]
    fn test_dominant_label_ties() {
        let labels = [5, 3, 5, 3, 9];
        let mut tally = vec![];
        assert_eq!(
            Some(3),
            dominant_label(&labels, [0, 1, 2, 3].into_iter(), &mut tally)
        );
        assert_eq!(
            Some(5),
            dominant_label(&labels, [0, 1, 2, 4].into_iter(), &mut tally)
        );
        assert_eq!(None, dominant_label(&labels, std::iter::empty(), &mut tally));
    }

    #[test]
    fn test_community_count() {
        assert_eq!(0, community_count(&[]));
        assert_eq!(2, community_count(&[4, 4, 1, 4, 1]));
    }

    #[test]
    fn test_community_sizes() {
        assert_eq!(vec![(4, 3), (1, 2)], community_sizes(&[4, 4, 1, 4, 1]));
        assert_eq!(vec![(2, 2), (7, 2), (5, 1)], community_sizes(&[7, 2, 7, 2, 5]));
        assert!(community_sizes(&[]).is_empty());
    }

    fn two_triangles() -> Graph {
        graph(6, &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5)])
    }

    #[test]
    fn test_modularity() {
        let g = two_triangles();
        assert_relative_eq!(0.5, modularity(&g, &[0, 0, 0, 3, 3, 3]));
        assert_relative_eq!(0.0, modularity(&g, &[1; 6]));
        assert_relative_eq!(-1.0 / 6.0, modularity(&g, &[0, 1, 2, 3, 4, 5]));
        assert_relative_eq!(0.0, modularity(&graph(3, &[]), &[0, 1, 2]));
    }

    #[test]
    fn test_summary_over_detected_labels() {
        let g = two_triangles();
        let summary = summarize_communities(&g, &label_propagation(&g, 20));
        assert_eq!(2, summary.count);
        assert_relative_eq!(0.5, summary.modularity);
        assert_eq!(vec![(0, 3), (3, 3)], summary.sizes);
        assert_eq!(3, summary.largest());
        assert_eq!(3, summary.smallest());
        assert_relative_eq!(3.0, summary.average());
    }
}

use serde::Serialize;

use crate::core::graph::Graph;
use crate::core::ids::UserId;

/// Union-find with path compression and union by size.
struct DisjointSet {
    parent: Vec<UserId>,
    size: Vec<usize>,
}

impl DisjointSet {
    fn new(len: usize) -> Self {
        Self {
            parent: (0..len as UserId).collect(),
            size: vec![1; len],
        }
    }

    fn find(&mut self, u: UserId) -> UserId {
        let mut root = u;
        while root != self.parent[root as usize] {
            root = self.parent[root as usize];
        }
        let mut v = u;
        while v != root {
            let next = self.parent[v as usize];
            self.parent[v as usize] = root;
            v = next;
        }
        root
    }

    fn union(&mut self, u: UserId, v: UserId) {
        let (ru, rv) = (self.find(u), self.find(v));
        if ru == rv {
            return;
        }
        let (big, small) = if self.size[ru as usize] >= self.size[rv as usize] {
            (ru, rv)
        } else {
            (rv, ru)
        };
        self.parent[small as usize] = big;
        self.size[big as usize] += self.size[small as usize];
    }
}

/// Component label per user, ignoring edge direction. Labels are dense and
/// numbered in order of each component's smallest user id.
pub fn connected_components(graph: &Graph) -> Vec<u32> {
    let n = graph.node_count();
    let mut dsu = DisjointSet::new(n);
    for u in 0..n as UserId {
        for e in graph.edges_from(u) {
            dsu.union(u, e.dst);
        }
    }

    let mut label_of_root: Vec<Option<u32>> = vec![None; n];
    let mut next = 0;
    (0..n as UserId)
        .map(|u| {
            let root = dsu.find(u) as usize;
            *label_of_root[root].get_or_insert_with(|| {
                next += 1;
                next - 1
            })
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ComponentSummary {
    pub count: usize,
    pub largest: usize,
}

pub fn component_sizes(labels: &[u32]) -> Vec<usize> {
    let mut sizes = vec![];
    for label in labels {
        let label = *label as usize;
        if sizes.len() <= label {
            sizes.resize(label + 1, 0);
        }
        sizes[label] += 1;
    }
    sizes
}

pub fn summarize_components(graph: &Graph) -> ComponentSummary {
    let sizes = component_sizes(&connected_components(graph));
    ComponentSummary {
        count: sizes.len(),
        largest: sizes.iter().copied().max().unwrap_or(0),
    }
}

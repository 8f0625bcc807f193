use std::cmp::Ordering;
use std::collections::BinaryHeap;

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::core::graph::Graph;
use crate::core::ids::UserId;

/// A pair of users that are not friends yet, with `u < v`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictedLink {
    pub u: UserId,
    pub v: UserId,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkPredictions {
    pub adamic_adar: Vec<PredictedLink>,
    pub jaccard: Vec<PredictedLink>,
    pub preferential_attachment: Vec<PredictedLink>,
}

// greater means weaker, so the heap top is the first link to evict
struct Ranked(PredictedLink);

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .0
            .score
            .total_cmp(&self.0.score)
            .then(self.0.u.cmp(&other.0.u))
            .then(self.0.v.cmp(&other.0.v))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

/// Keeps the `k` best links; highest score first, ties by ascending pair.
struct TopLinks {
    k: usize,
    heap: BinaryHeap<Ranked>,
}

impl TopLinks {
    fn new(k: usize) -> Self {
        Self {
            k,
            heap: BinaryHeap::with_capacity(k + 1),
        }
    }

    fn push(&mut self, u: UserId, v: UserId, score: f64) {
        self.heap.push(Ranked(PredictedLink { u, v, score }));
        if self.heap.len() > self.k {
            self.heap.pop();
        }
    }

    fn floor(&self) -> Option<f64> {
        if self.heap.len() < self.k {
            return None;
        }
        self.heap.peek().map(|r| r.0.score)
    }

    fn into_vec(self) -> Vec<PredictedLink> {
        self.heap.into_sorted_vec().into_iter().map(|r| r.0).collect()
    }
}

fn adjacency(graph: &Graph) -> Vec<Vec<UserId>> {
    (0..graph.node_count() as UserId)
        .map(|u| {
            let mut friends = graph.neighbors(u).filter(|v| *v != u).collect::<Vec<_>>();
            friends.sort_unstable();
            friends.dedup();
            friends
        })
        .collect()
}

fn adjacent(adj: &[Vec<UserId>], u: UserId, v: UserId) -> bool {
    adj[u as usize].binary_search(&v).is_ok()
}

/// Adamic-Adar and Jaccard rankings. Both are zero without a common friend,
/// so only pairs two hops apart are scored.
fn neighbourhood_scores(adj: &[Vec<UserId>], k: usize) -> (TopLinks, TopLinks) {
    let mut adamic_adar = TopLinks::new(k);
    let mut jaccard = TopLinks::new(k);
    let mut shared: FxHashMap<UserId, (usize, f64)> = FxHashMap::default();

    for u in 0..adj.len() as UserId {
        shared.clear();
        for &w in &adj[u as usize] {
            // w has both u and v as friends, so its degree is at least 2
            let weight = 1.0 / (adj[w as usize].len() as f64).ln();
            for &v in &adj[w as usize] {
                if v > u && !adjacent(adj, u, v) {
                    let entry = shared.entry(v).or_insert((0, 0.0));
                    entry.0 += 1;
                    entry.1 += weight;
                }
            }
        }
        for (&v, &(common, sum)) in &shared {
            let union = adj[u as usize].len() + adj[v as usize].len() - common;
            adamic_adar.push(u, v, sum);
            jaccard.push(u, v, common as f64 / union as f64);
        }
    }
    (adamic_adar, jaccard)
}

/// Degree products over every non-adjacent pair, scanned from the highest
/// degrees down and cut off once no remaining pair can enter the top `k`.
fn preferential_attachment(adj: &[Vec<UserId>], k: usize) -> TopLinks {
    let mut order = (0..adj.len())
        .filter(|u| !adj[*u].is_empty())
        .collect::<Vec<_>>();
    order.sort_by(|a, b| adj[*b].len().cmp(&adj[*a].len()).then(a.cmp(b)));
    let degree = |i: usize| adj[order[i]].len() as f64;

    let mut top = TopLinks::new(k);
    for i in 0..order.len() {
        if i + 1 < order.len()
            && top
                .floor()
                .is_some_and(|floor| degree(i) * degree(i + 1) < floor)
        {
            break;
        }
        for j in i + 1..order.len() {
            let score = degree(i) * degree(j);
            if top.floor().is_some_and(|floor| score < floor) {
                break;
            }
            let (u, v) = (order[i].min(order[j]) as UserId, order[i].max(order[j]) as UserId);
            if !adjacent(adj, u, v) {
                top.push(u, v, score);
            }
        }
    }
    top
}

pub fn predict_links(graph: &Graph, k: usize) -> LinkPredictions {
    if k == 0 {
        return LinkPredictions {
            adamic_adar: vec![],
            jaccard: vec![],
            preferential_attachment: vec![],
        };
    }
    let adj = adjacency(graph);
    let (adamic_adar, jaccard) = neighbourhood_scores(&adj, k);
    LinkPredictions {
        adamic_adar: adamic_adar.into_vec(),
        jaccard: jaccard.into_vec(),
        preferential_attachment: preferential_attachment(&adj, k).into_vec(),
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

    // a square 0-1-3-2 with a tail 3-4
    fn square_with_tail() -> Graph {
        graph(5, &[(0, 1), (0, 2), (3, 1), (2, 3), (4, 3)])
    }

    fn pairs(links: &[PredictedLink]) -> Vec<(UserId, UserId)> {
        links.iter().map(|l| (l.u, l.v)).collect()
    }

    #[test]
    fn test_adamic_adar() {
        let links = predict_links(&square_with_tail(), 10).adamic_adar;
        assert_eq!(vec![(0, 3), (1, 2), (1, 4), (2, 4)], pairs(&links));
        assert_relative_eq!(2.0 / 2f64.ln(), links[0].score);
        assert_relative_eq!(1.0 / 2f64.ln() + 1.0 / 3f64.ln(), links[1].score);
        assert_relative_eq!(1.0 / 3f64.ln(), links[2].score);
        assert_relative_eq!(links[2].score, links[3].score);
    }

    #[test]
    fn test_jaccard() {
        let links = predict_links(&square_with_tail(), 3).jaccard;
        assert_eq!(vec![(1, 2), (0, 3), (1, 4)], pairs(&links));
        assert_relative_eq!(1.0, links[0].score);
        assert_relative_eq!(2.0 / 3.0, links[1].score);
        assert_relative_eq!(0.5, links[2].score);
    }

    #[test]
    fn test_preferential_attachment_covers_distant_pairs() {
        let links = predict_links(&square_with_tail(), 3).preferential_attachment;
        // (0, 4) shares no friend but still ranks on degree product
        assert_eq!(vec![(0, 3), (1, 2), (0, 4)], pairs(&links));
        assert_eq!(vec![6.0, 4.0, 2.0], links.iter().map(|l| l.score).collect::<Vec<_>>());
    }

    #[test]
    fn test_preferential_attachment_cutoff_matches_full_scan() {
        // hub 0 with spokes 1..=11 chained in a path; 12-13-14 stand apart
        let mut edges = (1..12).map(|v| (0, v)).collect::<Vec<_>>();
        edges.extend((1..11).map(|v| (v, v + 1)));
        edges.extend([(12, 13), (13, 14)]);
        let g = graph(15, &edges);
        let adj = adjacency(&g);

        let mut all = vec![];
        for u in 0..15u32 {
            for v in u + 1..15 {
                if !adj[u as usize].is_empty() && !adj[v as usize].is_empty() && !adjacent(&adj, u, v) {
                    all.push(PredictedLink {
                        u,
                        v,
                        score: (adj[u as usize].len() * adj[v as usize].len()) as f64,
                    });
                }
            }
        }
        all.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.u.cmp(&b.u))
                .then(a.v.cmp(&b.v))
        });
        all.truncate(7);

        assert_eq!(all, predict_links(&g, 7).preferential_attachment);
    }

    #[test]
    fn test_complete_graph_has_nothing_to_predict() {
        let g = graph(4, &[(0, 1), (0, 2), (0, 3), (1, 2), (1, 3), (2, 3)]);
        let predictions = predict_links(&g, 5);
        assert!(predictions.adamic_adar.is_empty());
        assert!(predictions.jaccard.is_empty());
        assert!(predictions.preferential_attachment.is_empty());
    }

    #[test]
    fn test_zero_k() {
        let predictions = predict_links(&square_with_tail(), 0);
        assert!(predictions.adamic_adar.is_empty());
        assert!(predictions.preferential_attachment.is_empty());
    }

    #[test]
    fn test_existing_friends_never_suggested() {
        let g = square_with_tail();
        let adj = adjacency(&g);
        let predictions = predict_links(&g, 20);
        for link in predictions
            .adamic_adar
            .iter()
            .chain(&predictions.jaccard)
            .chain(&predictions.preferential_attachment)
        {
            assert!(link.u < link.v);
            assert!(!adjacent(&adj, link.u, link.v));
        }
    }
}

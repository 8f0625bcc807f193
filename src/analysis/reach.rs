use std::collections::VecDeque;

use crate::core::graph::Graph;
use crate::core::ids::UserId;

/// Number of distinct users within `hops` undirected hops of `source`,
/// counting `source` itself. Unknown sources reach nobody.
pub fn k_hop_reach(graph: &Graph, source: UserId, hops: usize) -> usize {
    let n = graph.node_count();
    if source as usize >= n {
        return 0;
    }
    let mut visited = vec![false; n];
    let mut queue = VecDeque::from([(source, 0)]);
    visited[source as usize] = true;
    let mut reached = 1;

    while let Some((u, depth)) = queue.pop_front() {
        if depth == hops {
            continue;
        }
        for v in graph.neighbors(u) {
            if !visited[v as usize] {
                visited[v as usize] = true;
                reached += 1;
                queue.push_back((v, depth + 1));
            }
        }
    }
    reached
}

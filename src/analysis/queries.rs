use std::cmp::Ordering;

use rustc_hash::FxHashSet;
use serde::Serialize;

use crate::analysis::social::SocialGraph;
use crate::core::ids::UserId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct UserCounts {
    pub followers: usize,
    pub following: usize,
    pub friends: usize,
}

pub fn user_counts(graph: &SocialGraph, user: UserId) -> UserCounts {
    UserCounts {
        followers: graph.follows().in_degree(user),
        following: graph.follows().out_degree(user),
        friends: graph.friends().degree(user),
    }
}

/// Ranks every user by `score`, highest first; equal scores keep ascending id
/// order.
fn top_k_by<T, F>(node_count: usize, k: usize, score: F) -> Vec<(UserId, T)>
where
    T: PartialOrd + Copy,
    F: Fn(UserId) -> T,
{
    let mut ranked = (0..node_count as UserId)
        .map(|u| (u, score(u)))
        .collect::<Vec<_>>();
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then(a.0.cmp(&b.0))
    });
    ranked.truncate(k);
    ranked
}

pub fn top_k_followers(graph: &SocialGraph, k: usize) -> Vec<(UserId, usize)> {
    top_k_by(graph.node_count(), k, |u| graph.follows().in_degree(u))
}

pub fn top_k_friend_degree(graph: &SocialGraph, k: usize) -> Vec<(UserId, usize)> {
    top_k_by(graph.node_count(), k, |u| graph.friends().degree(u))
}

/// Common friends of `a` and `b`, in ascending id order.
pub fn mutual_friends(graph: &SocialGraph, a: UserId, b: UserId) -> Vec<UserId> {
    let of_a = graph.friends().neighbors(a).collect::<FxHashSet<_>>();
    let mut mutual = graph
        .friends()
        .neighbors(b)
        .filter(|v| of_a.contains(v))
        .collect::<Vec<_>>();
    mutual.sort_unstable();
    mutual.dedup();
    mutual
}

/// Followers plus the summed weight of every interaction aimed at `user`.
pub fn influence_score(graph: &SocialGraph, user: UserId) -> f64 {
    graph.follows().in_degree(user) as f64 + graph.interaction_weight(user)
}

pub fn top_k_influence(graph: &SocialGraph, k: usize) -> Vec<(UserId, f64)> {
    top_k_by(graph.node_count(), k, |u| influence_score(graph, u))
}

use rustc_hash::FxHashSet;

use crate::config::Bounds;
use crate::core::ids::UserId;
use crate::core::model::Edge;
use crate::generate::GenerationContext;

const ATTEMPTS_PER_FOLLOW: u64 = 8;
const GLOBAL_BIAS: f64 = 0.4;
const COMMUNITY_BIAS: f64 = 0.8;

#[derive(Debug, Clone, PartialEq)]
pub struct FollowGraphSummary {
    pub requested: u64,
    pub accepted: u64,
    /// Users that followed fewer accounts than they drew.
    pub short_users: usize,
}

/// Directed follow graph: every user draws a follow count from `follows` and
/// gets `count * 8` attempts to reach it. Ordered pairs are deduplicated
/// independently of the friend graph.
pub fn build_follow_edges<F: FnMut(Edge)>(
    ctx: &mut GenerationContext,
    follows: Bounds,
    mut emit: F,
) -> FollowGraphSummary {
    let n = ctx.population.len();
    let mut seen: FxHashSet<(UserId, UserId)> = FxHashSet::default();
    let mut summary = FollowGraphSummary {
        requested: 0,
        accepted: 0,
        short_users: 0,
    };
    if n < 2 {
        return summary;
    }

    for u in 0..n as UserId {
        let target = ctx.rng.randint(follows.min as i64, follows.max as i64).max(0) as u64;
        summary.requested += target;
        let mut followed = 0;
        for _ in 0..target * ATTEMPTS_PER_FOLLOW {
            if followed >= target {
                break;
            }
            let r = ctx.rng.next_f64();
            let v = if r < GLOBAL_BIAS || r >= COMMUNITY_BIAS {
                ctx.rng.index(n) as UserId
            } else {
                match ctx.rng.choice(ctx.population.community_peers(u)) {
                    Some(v) => *v,
                    None => continue,
                }
            };
            let Ok(edge) = Edge::follow(u, v) else {
                continue;
            };
            if !seen.insert((u, v)) {
                continue;
            }
            followed += 1;
            emit(edge);
        }
        summary.accepted += followed;
        if followed < target {
            summary.short_users += 1;
        }
    }
    summary
}

use rustc_hash::FxHashSet;
use tracing::debug;

use crate::core::ids::{PairKey, UserId};
use crate::core::model::Edge;
use crate::generate::GenerationContext;
use crate::generate::degree::DegreePlan;
use crate::generate::selector::select_neighbor;

#[derive(Debug, Clone, PartialEq)]
pub struct FriendGraphSummary {
    pub budget: u64,
    pub accepted: u64,
    /// Users that ran out of attempts before reaching their target.
    pub saturated_users: usize,
    pub degrees: Vec<u32>,
}

/// Materializes deduplicated friend edges up to the plan's edge budget,
/// visiting users in id order. Each user may fail `target * retry_multiplier`
/// times before it is given up on.
pub fn build_friend_edges<F: FnMut(Edge)>(
    ctx: &mut GenerationContext,
    plan: &DegreePlan,
    retry_multiplier: u32,
    mut emit: F,
) -> FriendGraphSummary {
    let n = ctx.population.len();
    let budget = plan.edge_budget();
    let mut degrees = vec![0u32; n];
    let mut seen = FxHashSet::default();
    let mut accepted = 0u64;
    let mut saturated_users = 0;

    for u in 0..n as UserId {
        if accepted >= budget {
            break;
        }
        let target = plan.target(u);
        let max_failures = u64::from(target) * u64::from(retry_multiplier);
        let mut failures = 0u64;

        while degrees[u as usize] < target && accepted < budget {
            if failures >= max_failures {
                saturated_users += 1;
                debug!(user = u, degree = degrees[u as usize], target, "retry cap reached");
                break;
            }
            let Some(v) = select_neighbor(&mut ctx.rng, &ctx.population, u, &degrees) else {
                failures += 1;
                continue;
            };
            let Ok(edge) = Edge::friend(u, v) else {
                failures += 1;
                continue;
            };
            if !seen.insert(PairKey::new(u, v)) {
                failures += 1;
                continue;
            }
            degrees[u as usize] += 1;
            degrees[v as usize] += 1;
            accepted += 1;
            emit(edge);
        }
    }

    FriendGraphSummary {
        budget,
        accepted,
        saturated_users,
        degrees,
    }
}

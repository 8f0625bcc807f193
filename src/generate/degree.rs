use crate::config::Bounds;
use crate::core::ids::UserId;
use crate::core::rng::Lcg;

/// Planned friend-graph degree per user. The builder treats it as a goal, not
/// a guarantee.
#[derive(Debug, Clone, PartialEq)]
pub struct DegreePlan {
    edge_budget: u64,
    targets: Vec<u32>,
}

impl DegreePlan {
    #[cfg(test)]
    pub(crate) fn from_parts(edge_budget: u64, targets: Vec<u32>) -> Self {
        Self {
            edge_budget,
            targets,
        }
    }

    pub fn edge_budget(&self) -> u64 {
        self.edge_budget
    }

    pub fn stub_budget(&self) -> u64 {
        self.edge_budget * 2
    }

    pub fn target(&self, user: UserId) -> u32 {
        self.targets.get(user as usize).copied().unwrap_or(0)
    }

    pub fn targets(&self) -> &[u32] {
        &self.targets
    }

    pub fn total(&self) -> u64 {
        self.targets.iter().map(|t| u64::from(*t)).sum()
    }
}

pub fn plan_degrees(
    rng: &mut Lcg,
    population: usize,
    edges: Bounds,
    mean: i64,
    spread: i64,
) -> DegreePlan {
    let edge_budget = rng.randint(edges.min as i64, edges.max as i64).max(0) as u64;
    let stubs = edge_budget * 2;

    let base = (0..population)
        .map(|_| rng.randint(mean - spread, mean + spread).max(1) as u64)
        .collect::<Vec<_>>();
    let base_sum = base.iter().sum::<u64>();
    let scale = if base_sum == 0 {
        1.0
    } else {
        stubs as f64 / base_sum as f64
    };

    let mut targets = base
        .iter()
        .map(|b| ((*b as f64 * scale).floor() as u64).max(1))
        .collect::<Vec<_>>();
    rebalance(&mut targets, stubs);

    DegreePlan {
        edge_budget,
        targets: targets
            .into_iter()
            .map(|t| u32::try_from(t).unwrap_or(u32::MAX))
            .collect(),
    }
}

/// Moves the target sum onto `stubs`: shortfall is added one stub at a time
/// round-robin, surplus is taken round-robin from targets above 1.
fn rebalance(targets: &mut [u64], stubs: u64) {
    let len = targets.len();
    if len == 0 {
        return;
    }
    let mut total = targets.iter().sum::<u64>();

    let mut i = 0;
    while total < stubs {
        targets[i] += 1;
        total += 1;
        i = (i + 1) % len;
    }

    let mut i = 0;
    let mut untouched = 0;
    while total > stubs && untouched < len {
        if targets[i] > 1 {
            targets[i] -= 1;
            total -= 1;
            untouched = 0;
        } else {
            untouched += 1;
        }
        i = (i + 1) % len;
    }
}

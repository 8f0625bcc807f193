use chrono::{DateTime, Duration, Utc};

use crate::core::ids::UserId;
use crate::core::model::{Interaction, InteractionKind};
use crate::core::rng::Lcg;

pub struct InteractionConfig {
    pub count: u64,
    pub base_time: DateTime<Utc>,
    pub window_secs: i64,
}

/// Lazily draws `count` candidate interactions between uniformly chosen users.
/// Self-directed draws are discarded rather than retried, so fewer than
/// `count` items may come out.
pub fn generate<'a>(
    rng: &'a mut Lcg,
    population: usize,
    cfg: &InteractionConfig,
) -> impl Iterator<Item = Interaction> + 'a {
    let count = if population < 2 { 0 } else { cfg.count };
    let base_time = cfg.base_time;
    let window_secs = cfg.window_secs.max(0);

    (0..count).filter_map(move |_| {
        let actor = rng.index(population) as UserId;
        let target = rng.index(population) as UserId;
        if actor == target {
            return None;
        }
        let kind = *rng.choice(&InteractionKind::ALL)?;
        let created_at = base_time - Duration::seconds(rng.randint(0, window_secs));
        Interaction::new(actor, target, kind, created_at).ok()
    })
}

//! Locality-biased preferential neighbour choice for the friend graph.

use crate::core::ids::UserId;
use crate::core::rng::Lcg;
use crate::generate::partition::Population;

pub const CANDIDATES: usize = 6;
const COMMUNITY_BIAS: f64 = 0.75;
const CITY_BIAS: f64 = 0.90;

enum Pool<'a> {
    Members(&'a [UserId]),
    Everyone(usize),
}

impl Pool<'_> {
    /// Up to `k` distinct members other than `user`, in draw order.
    fn draw(&self, rng: &mut Lcg, user: UserId, k: usize) -> Vec<UserId> {
        match self {
            Pool::Members(members) => {
                let others = members
                    .iter()
                    .copied()
                    .filter(|m| *m != user)
                    .collect::<Vec<_>>();
                rng.sample(&others, k)
            }
            Pool::Everyone(n) => rng
                .sample_indices(n.saturating_sub(1), k)
                .into_iter()
                .map(|i| i as UserId)
                .map(|i| if i >= user { i + 1 } else { i })
                .collect(),
        }
    }
}

fn pick_pool<'a>(rng: &mut Lcg, population: &'a Population, user: UserId) -> Pool<'a> {
    let r = rng.next_f64();
    let community = population.community_peers(user);
    if r < COMMUNITY_BIAS && community.len() > 1 {
        return Pool::Members(community);
    }
    let city = population.city_peers(user);
    if r < CITY_BIAS && city.len() > 1 {
        return Pool::Members(city);
    }
    Pool::Everyone(population.len())
}

/// Returns `None` when the pool holds nobody but `user`.
pub fn select_neighbor(
    rng: &mut Lcg,
    population: &Population,
    user: UserId,
    degrees: &[u32],
) -> Option<UserId> {
    let pool = pick_pool(rng, population, user);
    let mut best: Option<(UserId, u32)> = None;
    for candidate in pool.draw(rng, user, CANDIDATES) {
        let degree = degrees.get(candidate as usize).copied().unwrap_or(0);
        match best {
            Some((_, best_degree)) if degree <= best_degree => {}
            _ => best = Some((candidate, degree)),
        }
    }
    best.map(|(candidate, _)| candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn population(layout: &[(u32, usize)]) -> Population {
        let mut p = Population::new(0, 0);
        for (community, city) in layout {
            p.add_user(*community, *city);
        }
        p
    }

    #[test]
    fn test_lone_user_has_no_neighbor() {
        let p = population(&[(0, 0)]);
        let mut rng = Lcg::new(1);
        for _ in 0..20 {
            assert_eq!(None, select_neighbor(&mut rng, &p, 0, &[0]));
        }
    }

    #[test]
    fn test_never_returns_self() {
        let p = population(&[(0, 0), (0, 0), (1, 1), (1, 0), (2, 2)]);
        let degrees = vec![0; 5];
        let mut rng = Lcg::new(2);
        for _ in 0..500 {
            for user in 0..5 {
                if let Some(v) = select_neighbor(&mut rng, &p, user, &degrees) {
                    assert_ne!(user, v);
                    assert!(v < 5);
                }
            }
        }
    }

    #[test]
    fn test_small_pool_prefers_highest_degree() {
        // pools never exceed the candidate count, so every draw sees everyone
        let p = population(&[(0, 0), (0, 0), (0, 0), (0, 0)]);
        let degrees = vec![0, 3, 9, 9];
        let mut rng = Lcg::new(3);
        for _ in 0..100 {
            let picked = select_neighbor(&mut rng, &p, 0, &degrees).unwrap();
            assert!(picked == 2 || picked == 3);
        }
        // with user 2 asking, 3 is the unique best
        for _ in 0..100 {
            assert_eq!(Some(3), select_neighbor(&mut rng, &p, 2, &degrees));
        }
    }

    #[test]
    fn test_ties_go_to_first_sampled() {
        // a pool no larger than the candidate count is drawn whole, in order
        let p = population(&[(0, 0), (0, 0), (0, 0)]);
        let mut rng = Lcg::new(4);
        for _ in 0..50 {
            assert_eq!(Some(1), select_neighbor(&mut rng, &p, 0, &[0, 0, 0]));
        }
    }

    #[test]
    fn test_best_peer_always_in_candidates() {
        // seven users share a community and a city: excluding the asker
        // leaves exactly six peers, so each draw sees all of them
        let p = population(&[(0, 0); 7]);
        let degrees = vec![0, 1, 1, 1, 1, 1, 9];
        let mut rng = Lcg::new(11);
        for _ in 0..700 {
            assert_eq!(Some(6), select_neighbor(&mut rng, &p, 0, &degrees));
        }
    }

    #[test]
    fn test_global_pool_skips_asker() {
        // singleton communities and cities force the global pool
        let layout = (0..8).map(|i| (i, i as usize)).collect::<Vec<_>>();
        let p = population(&layout);
        let degrees = vec![0; 8];
        let mut rng = Lcg::new(12);
        let mut seen = [false; 8];
        for _ in 0..500 {
            let v = select_neighbor(&mut rng, &p, 3, &degrees).unwrap();
            assert_ne!(3, v);
            seen[v as usize] = true;
        }
        assert_eq!(7, seen.iter().filter(|s| **s).count());
    }

    #[test]
    fn test_locality_bias() {
        // two communities of 20 in separate cities, plus a large outside world
        let mut layout = vec![];
        for i in 0..200u32 {
            let community = if i < 20 { 0 } else if i < 40 { 1 } else { 2 };
            layout.push((community, community as usize));
        }
        let p = population(&layout);
        let degrees = vec![0; 200];
        let mut rng = Lcg::new(5);
        let trials = 2000;
        let local = (0..trials)
            .filter_map(|_| select_neighbor(&mut rng, &p, 0, &degrees))
            .filter(|v| *v < 20)
            .count();
        // community + city draws cover ~90% of picks, the rest land globally
        assert!(local as f64 / trials as f64 > 0.8);
    }
}

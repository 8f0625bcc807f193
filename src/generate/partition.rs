use chrono::{DateTime, Utc};

use crate::config::Bounds;
use crate::core::ids::UserId;
use crate::core::model::User;
use crate::core::rng::Lcg;
use crate::generate::attributes::{self, CITIES};

/// Community and city membership, grown one user at a time.
#[derive(Debug, Clone, Default)]
pub struct Population {
    communities: Vec<Vec<UserId>>,
    cities: Vec<Vec<UserId>>,
    community_of: Vec<u32>,
    city_of: Vec<usize>,
}

impl Population {
    pub fn new(community_count: usize, city_count: usize) -> Self {
        Self {
            communities: vec![vec![]; community_count],
            cities: vec![vec![]; city_count],
            community_of: vec![],
            city_of: vec![],
        }
    }

    pub fn add_user(&mut self, community: u32, city: usize) -> UserId {
        let id = self.community_of.len() as UserId;
        let c = community as usize;
        if c >= self.communities.len() {
            self.communities.resize(c + 1, vec![]);
        }
        if city >= self.cities.len() {
            self.cities.resize(city + 1, vec![]);
        }
        self.communities[c].push(id);
        self.cities[city].push(id);
        self.community_of.push(community);
        self.city_of.push(city);
        id
    }

    pub fn len(&self) -> usize {
        self.community_of.len()
    }

    pub fn is_empty(&self) -> bool {
        self.community_of.is_empty()
    }

    pub fn community_count(&self) -> usize {
        self.communities.len()
    }

    pub fn community_of(&self, user: UserId) -> Option<u32> {
        self.community_of.get(user as usize).copied()
    }

    pub fn community_peers(&self, user: UserId) -> &[UserId] {
        self.community_of(user)
            .and_then(|c| self.communities.get(c as usize))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn city_peers(&self, user: UserId) -> &[UserId] {
        self.city_of
            .get(user as usize)
            .and_then(|c| self.cities.get(*c))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn community_sizes(&self) -> Vec<usize> {
        self.communities.iter().map(Vec::len).collect()
    }
}

/// Splits `population` into a random number of communities drawn from
/// `range`. Each community but the last takes a random share between half and
/// all of an even split of what remains; the last takes the remainder.
pub fn community_sizes(rng: &mut Lcg, population: usize, range: Bounds) -> Vec<usize> {
    if population == 0 {
        return vec![];
    }
    let drawn = rng.randint(range.min as i64, range.max as i64).max(1) as usize;
    let count = drawn.min(population);

    let mut sizes = Vec::with_capacity(count);
    let mut remaining = population;
    for i in 0..count - 1 {
        let left = count - i;
        let lo = (remaining / (2 * left)).max(1);
        let hi = (remaining / left).min(remaining - (left - 1)).max(lo);
        let size = rng.randint(lo as i64, hi as i64) as usize;
        sizes.push(size);
        remaining -= size;
    }
    sizes.push(remaining);
    sizes
}

pub struct PartitionSpec {
    pub users: usize,
    pub communities: Bounds,
    pub base_time: DateTime<Utc>,
    pub window_secs: i64,
}

/// Creates every user, community by community, handing each to `emit` as
/// soon as it exists. Membership indexes are maintained incrementally.
pub fn partition_users<F: FnMut(User)>(
    rng: &mut Lcg,
    spec: &PartitionSpec,
    mut emit: F,
) -> Population {
    let sizes = community_sizes(rng, spec.users, spec.communities);
    let mut population = Population::new(sizes.len(), CITIES.len());
    for (community, size) in sizes.into_iter().enumerate() {
        for _ in 0..size {
            let city = rng.index(CITIES.len());
            let id = population.add_user(community as u32, city);
            let profile = attributes::sample_profile(rng, city, spec.base_time, spec.window_secs);
            emit(User {
                id,
                community: community as u32,
                city: attributes::city_name(city).to_string(),
                profile,
            });
        }
    }
    population
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case(100, 5, 5)]
    #[case(10_000, 8, 20)]
    #[case(7, 7, 7)]
    #[case(3, 5, 9)]
    #[case(1, 1, 4)]
    fn test_sizes_sum_to_population(#[case] n: usize, #[case] cmin: u64, #[case] cmax: u64) {
        for seed in 0..20 {
            let mut rng = Lcg::new(seed);
            let sizes = community_sizes(&mut rng, n, Bounds::new(cmin, cmax));
            assert_eq!(n, sizes.iter().sum::<usize>());
            assert!(sizes.iter().all(|s| *s >= 1));
            assert!(sizes.len() as u64 <= cmax);
            assert!(sizes.len() as u64 >= cmin.min(n as u64));
        }
    }

    #[test]
    fn test_empty_population() {
        assert!(community_sizes(&mut Lcg::new(1), 0, Bounds::new(2, 4)).is_empty());
    }

    #[test]
    fn test_every_user_in_exactly_one_community() {
        let mut rng = Lcg::new(17);
        let spec = PartitionSpec {
            users: 250,
            communities: Bounds::new(4, 9),
            base_time: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            window_secs: 3600,
        };
        let mut users = vec![];
        let population = partition_users(&mut rng, &spec, |u| users.push(u));

        assert_eq!(250, population.len());
        assert_eq!(250, users.len());
        assert_eq!(250, population.community_sizes().iter().sum::<usize>());

        let mut seen = vec![0; 250];
        for c in 0..population.community_count() {
            let first = (0..250)
                .find(|u| population.community_of(*u) == Some(c as u32))
                .unwrap();
            for member in population.community_peers(first) {
                seen[*member as usize] += 1;
                assert_eq!(Some(c as u32), population.community_of(*member));
            }
        }
        assert!(seen.iter().all(|count| *count == 1));

        for (i, user) in users.iter().enumerate() {
            assert_eq!(i as UserId, user.id);
            assert_eq!(Some(user.community), population.community_of(user.id));
            assert!(population.city_peers(user.id).contains(&user.id));
        }
    }

    #[test]
    fn test_add_user_grows_indexes() {
        let mut population = Population::new(0, 0);
        assert!(population.is_empty());
        assert_eq!(0, population.add_user(2, 1));
        assert_eq!(1, population.add_user(2, 3));
        assert_eq!(&[0, 1], population.community_peers(1));
        assert_eq!(&[1], population.city_peers(1));
        assert!(population.community_peers(9).is_empty());
        assert_eq!(vec![0, 0, 2], population.community_sizes());
    }
}

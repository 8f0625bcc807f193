//! Generation parameters: defaults, optional JSON file, CLI overrides.

use std::fs;
use std::ops::RangeInclusive;
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::rng::DEFAULT_SEED;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("range `{name}` is inverted: {min} > {max}")]
    InvertedRange {
        name: &'static str,
        min: u64,
        max: u64,
    },
    #[error("`{name}` must be greater than zero")]
    Zero { name: &'static str },
    #[error("population of {users} users is too small, need at least {required}")]
    PopulationTooSmall { users: u32, required: u64 },
    #[error("edge budget {requested} exceeds the {possible} possible pairs among {users} users")]
    EdgeBudgetTooLarge {
        requested: u64,
        possible: u64,
        users: u32,
    },
    #[error("`follows.max` of {requested} exceeds the {possible} other users")]
    TooManyFollows { requested: u64, possible: u64 },
    #[error("degree range {mean} ± {spread} must stay within 0..={max_degree}")]
    DegreeOutOfRange {
        mean: i64,
        spread: i64,
        max_degree: i64,
    },
}

/// Inclusive `min..=max` bound as it appears in config files.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: u64,
    pub max: u64,
}

impl Bounds {
    pub const fn new(min: u64, max: u64) -> Self {
        Self { min, max }
    }

    pub const fn fixed(value: u64) -> Self {
        Self::new(value, value)
    }

    pub fn range(&self) -> RangeInclusive<u64> {
        self.min..=self.max
    }

    fn check(&self, name: &'static str) -> Result<(), ConfigError> {
        if self.min > self.max {
            return Err(ConfigError::InvertedRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    pub seed: u32,
    pub users: u32,
    pub communities: Bounds,
    pub friend_edges: Bounds,
    pub mean_degree: i64,
    pub degree_spread: i64,
    /// Failed attempts allowed per unit of target degree.
    pub retry_multiplier: u32,
    pub follows: Bounds,
    pub interactions: u64,
    pub batch_size: usize,
    pub base_time: DateTime<Utc>,
    pub time_window_secs: i64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            users: 10_000,
            communities: Bounds::new(8, 20),
            friend_edges: Bounds::new(40_000, 60_000),
            mean_degree: 10,
            degree_spread: 4,
            retry_multiplier: 12,
            follows: Bounds::new(5, 40),
            interactions: 50_000,
            batch_size: 5_000,
            base_time: Utc
                .with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
                .single()
                .unwrap_or(DateTime::<Utc>::UNIX_EPOCH),
            time_window_secs: 365 * 24 * 3600,
        }
    }
}

impl GeneratorConfig {
    pub fn from_json_file(path: &Path) -> anyhow::Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse config file {}", path.display()))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.communities.check("communities")?;
        self.friend_edges.check("friend_edges")?;
        self.follows.check("follows")?;
        if self.communities.min == 0 {
            return Err(ConfigError::Zero {
                name: "communities.min",
            });
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Zero { name: "batch_size" });
        }
        if self.retry_multiplier == 0 {
            return Err(ConfigError::Zero {
                name: "retry_multiplier",
            });
        }
        let required = self.communities.min.max(2);
        if u64::from(self.users) < required {
            return Err(ConfigError::PopulationTooSmall {
                users: self.users,
                required,
            });
        }
        let n = u64::from(self.users);
        let possible = n * (n - 1) / 2;
        if self.friend_edges.max > possible {
            return Err(ConfigError::EdgeBudgetTooLarge {
                requested: self.friend_edges.max,
                possible,
                users: self.users,
            });
        }
        if self.follows.max > n - 1 {
            return Err(ConfigError::TooManyFollows {
                requested: self.follows.max,
                possible: n - 1,
            });
        }
        let max_degree = i64::from(self.users) - 1;
        if self.mean_degree < 0
            || self.degree_spread < 0
            || self.mean_degree.saturating_add(self.degree_spread) > max_degree
        {
            return Err(ConfigError::DegreeOutOfRange {
                mean: self.mean_degree,
                spread: self.degree_spread,
                max_degree,
            });
        }
        Ok(())
    }
}

use std::collections::HashMap;
use std::fmt;

pub type UserId = u32;

/// Order-independent key of an unordered user pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PairKey {
    lo: UserId,
    hi: UserId,
}

impl PairKey {
    pub fn new(a: UserId, b: UserId) -> Self {
        if a <= b {
            Self { lo: a, hi: b }
        } else {
            Self { lo: b, hi: a }
        }
    }

    pub fn lo(&self) -> UserId {
        self.lo
    }

    pub fn hi(&self) -> UserId {
        self.hi
    }
}

impl fmt::Display for PairKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.lo, self.hi)
    }
}

/// Maps external (string) user ids onto dense `UserId`s in first-seen order.
pub struct UserRegistry {
    map: HashMap<String, UserId>,
    external: Vec<String>,
}

impl UserRegistry {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            external: vec![],
        }
    }

    pub fn get_or_insert(&mut self, external_id: &str) -> anyhow::Result<UserId> {
        if let Some(id) = self.map.get(external_id) {
            return Ok(*id);
        }
        let next = self.external.len();
        if next >= UserId::MAX as usize {
            anyhow::bail!("user count exceeds the limit of {}", UserId::MAX);
        }
        let id = next as UserId;
        self.map.insert(external_id.to_string(), id);
        self.external.push(external_id.to_string());
        Ok(id)
    }

    pub fn get(&self, external_id: &str) -> Option<UserId> {
        self.map.get(external_id).copied()
    }

    pub fn external_id(&self, id: UserId) -> Option<&str> {
        self.external.get(id as usize).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.external.len()
    }

    pub fn is_empty(&self) -> bool {
        self.external.is_empty()
    }
}

impl Default for UserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

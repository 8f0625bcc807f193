use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::ids::{PairKey, UserId};

pub const EDGE_WEIGHT: f64 = 1.0;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("edge endpoints must differ, got {0} -> {0}")]
    SelfLoop(UserId),
    #[error("interaction actor and target must differ, got {0}")]
    SelfInteraction(UserId),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub community: u32,
    pub city: String,
    #[serde(flatten)]
    pub profile: Profile,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub name: String,
    pub age: u8,
    pub gender: String,
    pub state: String,
    pub country: String,
    pub primary_lang: String,
    pub languages: Vec<String>,
    pub education: String,
    pub profession: String,
    pub interests: Vec<String>,
    pub purpose: String,
    pub third_party: bool,
    pub joined_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    Friend,
    Follow,
}

impl EdgeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EdgeKind::Friend => "friend",
            EdgeKind::Follow => "follow",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "friend" => Some(EdgeKind::Friend),
            "follow" => Some(EdgeKind::Follow),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    #[serde(rename = "type")]
    pub kind: EdgeKind,
    pub src: UserId,
    pub dst: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
    pub weight: f64,
}

impl Edge {
    /// Undirected friendship, stored with `src < dst` and its canonical pair key.
    pub fn friend(a: UserId, b: UserId) -> Result<Self, ModelError> {
        if a == b {
            return Err(ModelError::SelfLoop(a));
        }
        let key = PairKey::new(a, b);
        Ok(Self {
            kind: EdgeKind::Friend,
            src: key.lo(),
            dst: key.hi(),
            pair: Some(key.to_string()),
            weight: EDGE_WEIGHT,
        })
    }

    pub fn follow(src: UserId, dst: UserId) -> Result<Self, ModelError> {
        if src == dst {
            return Err(ModelError::SelfLoop(src));
        }
        Ok(Self {
            kind: EdgeKind::Follow,
            src,
            dst,
            pair: None,
            weight: EDGE_WEIGHT,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Like,
    Comment,
    Share,
    Message,
}

impl InteractionKind {
    pub const ALL: [InteractionKind; 4] = [
        InteractionKind::Like,
        InteractionKind::Comment,
        InteractionKind::Share,
        InteractionKind::Message,
    ];

    pub fn weight(&self) -> f64 {
        match self {
            InteractionKind::Like => 1.0,
            InteractionKind::Comment => 2.0,
            InteractionKind::Share => 3.0,
            InteractionKind::Message => 1.5,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Like => "like",
            InteractionKind::Comment => "comment",
            InteractionKind::Share => "share",
            InteractionKind::Message => "message",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == raw.trim())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub actor: UserId,
    pub target: UserId,
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

impl Interaction {
    pub fn new(
        actor: UserId,
        target: UserId,
        kind: InteractionKind,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ModelError> {
        if actor == target {
            return Err(ModelError::SelfInteraction(actor));
        }
        Ok(Self {
            actor,
            target,
            kind,
            weight: kind.weight(),
            created_at,
        })
    }
}

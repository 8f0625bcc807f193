//! CSV export of a generated store: `users.csv`, `edges.csv` and
//! `interactions.csv`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::ids::UserId;
use crate::core::model::{Edge, Interaction, User};
use crate::store::{Collection, DocumentStore, Filter};

pub const USERS_FILE: &str = "users.csv";
pub const EDGES_FILE: &str = "edges.csv";
pub const INTERACTIONS_FILE: &str = "interactions.csv";

#[derive(Debug, Serialize)]
struct EdgeRow<'a> {
    src: UserId,
    dst: UserId,
    #[serde(rename = "type")]
    kind: &'a str,
    weight: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct UserRow<'a> {
    id: UserId,
    name: &'a str,
    age: u8,
    gender: &'a str,
    city: &'a str,
    state: &'a str,
    country: &'a str,
    primary_lang: &'a str,
    languages: String,
    joined_at: DateTime<Utc>,
    education: &'a str,
    profession: &'a str,
    interests: String,
    purpose: &'a str,
    third_party: bool,
    community: u32,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InteractionRow {
    pub actor: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub weight: f64,
    pub created_at: DateTime<Utc>,
}

pub fn write_edges<'e, W: Write>(
    writer: W,
    edges: impl IntoIterator<Item = &'e Edge>,
) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;
    for edge in edges {
        csv_writer.serialize(EdgeRow {
            src: edge.src,
            dst: edge.dst,
            kind: edge.kind.as_str(),
            weight: edge.weight,
        })?;
        written += 1;
    }
    csv_writer.flush()?;
    Ok(written)
}

pub fn write_users<'u, W: Write>(
    writer: W,
    users: impl IntoIterator<Item = &'u User>,
) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;
    for user in users {
        let p = &user.profile;
        csv_writer.serialize(UserRow {
            id: user.id,
            name: &p.name,
            age: p.age,
            gender: &p.gender,
            city: &user.city,
            state: &p.state,
            country: &p.country,
            primary_lang: &p.primary_lang,
            languages: p.languages.join(","),
            joined_at: p.joined_at,
            education: &p.education,
            profession: &p.profession,
            interests: p.interests.join(","),
            purpose: &p.purpose,
            third_party: p.third_party,
            community: user.community,
        })?;
        written += 1;
    }
    csv_writer.flush()?;
    Ok(written)
}

pub fn write_interactions<'i, W: Write>(
    writer: W,
    interactions: impl IntoIterator<Item = &'i Interaction>,
) -> anyhow::Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    let mut written = 0;
    for interaction in interactions {
        csv_writer.serialize(InteractionRow {
            actor: interaction.actor.to_string(),
            target: interaction.target.to_string(),
            kind: interaction.kind.as_str().to_string(),
            weight: interaction.weight,
            created_at: interaction.created_at,
        })?;
        written += 1;
    }
    csv_writer.flush()?;
    Ok(written)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportStats {
    pub users: usize,
    pub edges: usize,
    pub interactions: usize,
}

fn load<T, S>(store: &S, collection: Collection) -> anyhow::Result<Vec<T>>
where
    T: for<'de> Deserialize<'de>,
    S: DocumentStore + ?Sized,
{
    store
        .find(collection, &Filter::all())
        .into_iter()
        .map(|doc| {
            serde_json::from_value(doc.clone())
                .with_context(|| format!("malformed document in `{}`", collection.name()))
        })
        .collect()
}

fn create(dir: &Path, name: &str) -> anyhow::Result<BufWriter<File>> {
    let path = dir.join(name);
    let file =
        File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

/// Writes every collection of `store` into `dir`, creating it if needed.
pub fn export_store<S: DocumentStore + ?Sized>(store: &S, dir: &Path) -> anyhow::Result<ExportStats> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    let users = load::<User, S>(store, Collection::Users)?;
    let edges = load::<Edge, S>(store, Collection::Edges)?;
    let interactions = load::<Interaction, S>(store, Collection::Interactions)?;

    let stats = ExportStats {
        users: write_users(create(dir, USERS_FILE)?, &users)?,
        edges: write_edges(create(dir, EDGES_FILE)?, &edges)?,
        interactions: write_interactions(create(dir, INTERACTIONS_FILE)?, &interactions)?,
    };
    info!(
        dir = %dir.display(),
        users = stats.users,
        edges = stats.edges,
        interactions = stats.interactions,
        "exported csv files"
    );
    Ok(stats)
}

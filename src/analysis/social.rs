use anyhow::Context;

use crate::core::graph::{Graph, GraphBuilder};
use crate::core::ids::UserId;
use crate::core::model::{Edge, EdgeKind, Interaction, User};
use crate::store::{Collection, DocumentStore, Filter};

/// Read-only snapshot of a generated network. Friend edges are stored once
/// per pair, so friend neighbourhoods are read with [`Graph::neighbors`].
pub struct SocialGraph {
    friends: Graph,
    follows: Graph,
    interaction_weight: Vec<f64>,
    communities: Option<Vec<u32>>,
}

impl SocialGraph {
    pub fn node_count(&self) -> usize {
        self.friends.node_count()
    }

    pub fn friends(&self) -> &Graph {
        &self.friends
    }

    pub fn follows(&self) -> &Graph {
        &self.follows
    }

    /// Sum of interaction weights targeting `user`.
    pub fn interaction_weight(&self, user: UserId) -> f64 {
        self.interaction_weight
            .get(user as usize)
            .copied()
            .unwrap_or(0.0)
    }

    /// Planted community labels, when the snapshot came with user records.
    pub fn communities(&self) -> Option<&[u32]> {
        self.communities.as_deref()
    }

    /// Loads every edge, interaction and user document of `store`.
    pub fn from_store<S: DocumentStore + ?Sized>(store: &S) -> anyhow::Result<Self> {
        let mut builder = SocialGraphBuilder::new(0);
        let all = Filter::all();

        for doc in store.find(Collection::Users, &all) {
            let user: User =
                serde_json::from_value(doc.clone()).context("malformed user document")?;
            builder.set_community(user.id, user.community);
        }

        for doc in store.find(Collection::Edges, &all) {
            let edge: Edge =
                serde_json::from_value(doc.clone()).context("malformed edge document")?;
            builder.add_edge(&edge);
        }
        for doc in store.find(Collection::Interactions, &all) {
            let interaction: Interaction = serde_json::from_value(doc.clone())
                .context("malformed interaction document")?;
            builder.add_interaction(&interaction);
        }
        Ok(builder.freeze())
    }
}

pub struct SocialGraphBuilder {
    node_count: usize,
    friends: GraphBuilder,
    follows: GraphBuilder,
    interaction_weight: Vec<f64>,
    communities: Option<Vec<Option<u32>>>,
}

impl SocialGraphBuilder {
    pub fn new(node_count: usize) -> Self {
        Self {
            node_count,
            friends: GraphBuilder::new(node_count),
            follows: GraphBuilder::new(node_count),
            interaction_weight: vec![0.0; node_count],
            communities: None,
        }
    }

    fn touch(&mut self, user: UserId) {
        self.node_count = self.node_count.max(user as usize + 1);
    }

    pub fn add_edge(&mut self, edge: &Edge) {
        self.touch(edge.src);
        self.touch(edge.dst);
        let weight = edge.weight as f32;
        match edge.kind {
            EdgeKind::Friend => self.friends.add_edge(edge.src, edge.dst, weight),
            EdgeKind::Follow => self.follows.add_edge(edge.src, edge.dst, weight),
        }
    }

    pub fn add_interaction(&mut self, interaction: &Interaction) {
        self.touch(interaction.actor);
        self.touch(interaction.target);
        let target = interaction.target as usize;
        if self.interaction_weight.len() <= target {
            self.interaction_weight.resize(target + 1, 0.0);
        }
        self.interaction_weight[target] += interaction.weight;
    }

    pub fn set_communities(&mut self, labels: Vec<u32>) {
        self.node_count = self.node_count.max(labels.len());
        self.communities = Some(labels.into_iter().map(Some).collect());
    }

    pub fn set_community(&mut self, user: UserId, label: u32) {
        self.touch(user);
        let labels = self.communities.get_or_insert_with(Vec::new);
        if labels.len() <= user as usize {
            labels.resize(user as usize + 1, None);
        }
        labels[user as usize] = Some(label);
    }

    pub fn freeze(mut self) -> SocialGraph {
        let n = self.node_count;
        self.friends.grow_to(n);
        self.follows.grow_to(n);
        self.interaction_weight.resize(n, 0.0);
        let communities = self.communities.map(|mut labels| {
            labels.resize(n, None);
            // users without a record get a label of their own
            let mut next_free = labels.iter().flatten().max().map_or(0, |max| max + 1);
            labels
                .into_iter()
                .map(|label| {
                    label.unwrap_or_else(|| {
                        next_free += 1;
                        next_free - 1
                    })
                })
                .collect()
        });
        SocialGraph {
            friends: self.friends.freeze(),
            follows: self.follows.freeze(),
            interaction_weight: self.interaction_weight,
            communities,
        }
    }
}

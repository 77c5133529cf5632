// src/kubeconfig/fragment.rs
use std::collections::BTreeMap;

use crate::types::{ClusterContext, Credential, Identity};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterEntry {
    pub server: String,
    pub certificate_authority_data: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct UserEntry {
    pub token: String,
}

impl std::fmt::Debug for UserEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserEntry").field("token", &"<redacted>").finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextEntry {
    pub cluster: String,
    pub user: String,
    pub namespace: String,
}

/// A kubeconfig with exactly one cluster, user and context.
///
/// Cluster and context are keyed by the names already used in the caller's
/// kubeconfig so that merging the two updates entries instead of adding
/// near-duplicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFragment {
    pub current_context: String,
    pub clusters: BTreeMap<String, ClusterEntry>,
    pub users: BTreeMap<String, UserEntry>,
    pub contexts: BTreeMap<String, ContextEntry>,
}

pub fn synthesize(
    identity: &Identity,
    credential: &Credential,
    cluster: &ClusterContext,
) -> ConfigFragment {
    let mut clusters = BTreeMap::new();
    clusters.insert(
        cluster.cluster_name.clone(),
        ClusterEntry {
            server: cluster.server_url.clone(),
            certificate_authority_data: credential.ca_certificate.clone(),
        },
    );

    let mut users = BTreeMap::new();
    users.insert(
        identity.name.clone(),
        UserEntry {
            token: credential.token.clone(),
        },
    );

    let mut contexts = BTreeMap::new();
    contexts.insert(
        cluster.context_name.clone(),
        ContextEntry {
            cluster: cluster.cluster_name.clone(),
            user: identity.name.clone(),
            namespace: identity.namespace.clone(),
        },
    );

    ConfigFragment {
        current_context: cluster.context_name.clone(),
        clusters,
        users,
        contexts,
    }
}

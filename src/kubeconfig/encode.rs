// src/kubeconfig/encode.rs
use base64::{engine::general_purpose, Engine as _};
use serde::Serialize;

use super::fragment::ConfigFragment;
use crate::error::{Error, Result};
use crate::types::OutputFormat;

// Fields are declared alphabetically so the output matches `kubectl config view`.
#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Config {
    #[serde(rename = "apiVersion")]
    api_version: &'static str,
    clusters: Vec<NamedCluster>,
    contexts: Vec<NamedContext>,
    current_context: String,
    kind: &'static str,
    preferences: Preferences,
    users: Vec<NamedUser>,
}

#[derive(Serialize)]
struct Preferences {}

#[derive(Serialize)]
struct NamedCluster {
    cluster: Cluster,
    name: String,
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct Cluster {
    #[serde(skip_serializing_if = "Option::is_none")]
    certificate_authority_data: Option<String>,
    server: String,
}

#[derive(Serialize)]
struct NamedContext {
    context: Context,
    name: String,
}

#[derive(Serialize)]
struct Context {
    cluster: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    namespace: String,
    user: String,
}

#[derive(Serialize)]
struct NamedUser {
    name: String,
    user: User,
}

#[derive(Serialize)]
struct User {
    token: String,
}

impl From<&ConfigFragment> for Config {
    fn from(fragment: &ConfigFragment) -> Self {
        Config {
            api_version: "v1",
            clusters: fragment
                .clusters
                .iter()
                .map(|(name, cluster)| NamedCluster {
                    cluster: Cluster {
                        certificate_authority_data: (!cluster.certificate_authority_data.is_empty())
                            .then(|| general_purpose::STANDARD.encode(&cluster.certificate_authority_data)),
                        server: cluster.server.clone(),
                    },
                    name: name.clone(),
                })
                .collect(),
            contexts: fragment
                .contexts
                .iter()
                .map(|(name, context)| NamedContext {
                    context: Context {
                        cluster: context.cluster.clone(),
                        namespace: context.namespace.clone(),
                        user: context.user.clone(),
                    },
                    name: name.clone(),
                })
                .collect(),
            current_context: fragment.current_context.clone(),
            kind: "Config",
            preferences: Preferences {},
            users: fragment
                .users
                .iter()
                .map(|(name, user)| NamedUser {
                    name: name.clone(),
                    user: User {
                        token: user.token.clone(),
                    },
                })
                .collect(),
        }
    }
}

impl OutputFormat {
    /// Encodes the fragment as a `v1` kubeconfig document.
    pub fn render(&self, fragment: &ConfigFragment) -> Result<String> {
        let config = Config::from(fragment);
        match self {
            OutputFormat::Yaml => serde_yaml::to_string(&config)
                .map_err(|e| Error::serialization(e.to_string())),
            OutputFormat::Json => serde_json::to_string_pretty(&config)
                .map(|mut json| {
                    json.push('\n');
                    json
                })
                .map_err(|e| Error::serialization(e.to_string())),
        }
    }
}

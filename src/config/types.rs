// config/types.rs
use base64::{engine::general_purpose, Engine as _};
use tracing::debug;
use url::Url;

use crate::error::{Error, Result};
use crate::types::ClusterContext;

pub const DEFAULT_NAMESPACE: &str = "default";

/// The parts of a kubeconfig this tool reads. Users are never needed: the
/// generated kubeconfig brings its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KubeConfig {
    pub current_context: Option<String>,
    pub clusters: Vec<ClusterConfig>,
    pub contexts: Vec<ContextConfig>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClusterConfig {
    pub name: String,
    pub server: String,
    pub certificate_authority_data: Option<String>,
    pub certificate_authority: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContextConfig {
    pub name: String,
    pub cluster: String,
    pub user: Option<String>,
    pub namespace: Option<String>,
}

impl KubeConfig {
    pub fn context(&self, name: &str) -> Option<&ContextConfig> {
        self.contexts.iter().find(|c| c.name == name)
    }

    pub fn cluster(&self, name: &str) -> Option<&ClusterConfig> {
        self.clusters.iter().find(|c| c.name == name)
    }

    /// Folds `other` in behind `self`: entries already present keep their
    /// values, which is how kubectl merges the files listed in `$KUBECONFIG`.
    pub fn merge(mut self, other: KubeConfig) -> Self {
        if self.current_context.as_deref().unwrap_or("").is_empty() {
            self.current_context = other.current_context;
        }
        for cluster in other.clusters {
            if self.cluster(&cluster.name).is_none() {
                self.clusters.push(cluster);
            }
        }
        for context in other.contexts {
            if self.context(&context.name).is_none() {
                self.contexts.push(context);
            }
        }
        self
    }
}

/// Everything the resolver needs from the caller's kubeconfig.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AmbientConfig {
    pub cluster: ClusterContext,
    pub namespace: String,
}

impl AmbientConfig {
    pub fn from_kubeconfig(
        config: &KubeConfig,
        context_override: Option<&str>,
        namespace_override: Option<&str>,
    ) -> Result<Self> {
        let context_name = match context_override.filter(|c| !c.is_empty()) {
            Some(name) => name.to_string(),
            None => config
                .current_context
                .clone()
                .filter(|c| !c.is_empty())
                .ok_or_else(|| Error::config("current-context is not set"))?,
        };

        let context = config
            .context(&context_name)
            .ok_or_else(|| Error::config(format!("context {:?} does not exist", context_name)))?;

        let cluster = config.cluster(&context.cluster).ok_or_else(|| {
            Error::config(format!(
                "cluster {:?} of context {:?} does not exist",
                context.cluster, context_name
            ))
        })?;

        Url::parse(&cluster.server).map_err(|e| {
            Error::config(format!(
                "cluster {:?} has an invalid server {:?}: {}",
                cluster.name, cluster.server, e
            ))
        })?;

        let existing_ca = match cluster.certificate_authority_data.as_deref() {
            Some(data) if !data.trim().is_empty() => general_purpose::STANDARD
                .decode(data.trim())
                .map_err(|e| {
                    Error::config(format!(
                        "cluster {:?} has invalid certificate-authority-data: {}",
                        cluster.name, e
                    ))
                })?,
            _ => Vec::new(),
        };

        if existing_ca.is_empty() {
            if let Some(path) = &cluster.certificate_authority {
                // Only embedded data is carried over; a file path would not
                // resolve on the machine the kubeconfig is handed to.
                debug!(cluster = %cluster.name, path = %path, "ignoring certificate-authority file");
            }
        }

        let namespace = namespace_override
            .filter(|n| !n.is_empty())
            .or(context.namespace.as_deref().filter(|n| !n.is_empty()))
            .unwrap_or(DEFAULT_NAMESPACE)
            .to_string();

        Ok(AmbientConfig {
            cluster: ClusterContext {
                context_name,
                cluster_name: cluster.name.clone(),
                server_url: cluster.server.clone(),
                existing_ca,
            },
            namespace,
        })
    }
}

// src/error.rs
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Every way resolving a serviceaccount kubeconfig can fail.
///
/// Nothing here is recovered from locally: the first error aborts the
/// invocation and no partial kubeconfig is printed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("exactly one SERVICEACCOUNT is required, got {0}")]
    InvalidArguments(usize),

    #[error("malformed token: {0}")]
    MalformedCredential(String),

    #[error("{kind} {namespace}/{name} not found")]
    NotFound {
        kind: &'static str,
        namespace: String,
        name: String,
    },

    #[error("{}", no_credential_message(.namespace, .name))]
    NoCredential { namespace: String, name: String },

    #[error("serviceaccount {namespace}/{name} has no secret of type \"kubernetes.io/service-account-token\"")]
    TypeMismatch { namespace: String, name: String },

    #[error("key '{key}' not found in {secret}")]
    MissingField { secret: String, key: &'static str },

    #[error("kubectl failed: {0}")]
    Transport(String),

    #[error("kubeconfig error: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedCredential(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn transport(msg: impl Into<String>) -> Self {
        Self::Transport(msg.into())
    }

    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

// Namespaces created on Kubernetes 1.24+ no longer get long-lived token
// secrets, so this is the failure operators run into most.
fn no_credential_message(namespace: &str, name: &str) -> String {
    format!(
        r#"serviceaccount {namespace}/{name} has no secrets.

In Kubernetes 1.24+, secret-based tokens are no longer auto-created
by default for new service accounts. Using bound tokens created by
"kubectl create token" to access the Kubernetes API is recommended instead:

    kubectl create token {name} --namespace {namespace} | kubectl view-serviceaccount-kubeconfig

Alternatively, you can attach a long-lived token to the service account;
see https://kubernetes.io/docs/reference/access-authn-authz/service-accounts-admin/#create-token
for more information."#
    )
}

// types.rs
use clap::{Parser, ValueEnum};
use std::collections::BTreeMap;

pub const SERVICE_ACCOUNT_TOKEN_TYPE: &str = "kubernetes.io/service-account-token";
pub const SERVICE_ACCOUNT_UID_ANNOTATION: &str = "kubernetes.io/service-account.uid";

const LONG_ABOUT: &str = "\
Show a kubeconfig setting for serviceaccount from bound token or secret-based token.

Note that in Kubernetes 1.24+, secret-based tokens are no longer auto-created
by default for new service accounts. Using bound tokens created by \"kubectl
create token\" command to access the Kubernetes API is recommended instead.";

const EXAMPLES: &str = "\
Examples:
  # Bound token for serviceaccount/myapp in the current namespace
  kubectl create token myapp | kubectl view-serviceaccount-kubeconfig

  # Bound token for a serviceaccount in another namespace
  kubectl create token myapp --namespace myns | kubectl view-serviceaccount-kubeconfig

  # Bound token with a custom expiration, printed as JSON
  kubectl create token myapp --duration 10m | kubectl view-serviceaccount-kubeconfig -o json

  # Secret-based token for serviceaccount/default in the current namespace
  kubectl view-serviceaccount-kubeconfig default

  # Secret-based token for serviceaccount/bot in namespace/kube-system
  kubectl view-serviceaccount-kubeconfig bot -n kube-system";

#[derive(Parser, Debug)]
#[command(
    name = "kubectl-view_serviceaccount_kubeconfig",
    author,
    version,
    about = "Show a kubeconfig setting for serviceaccount from bound token or secret-based token.",
    long_about = LONG_ABOUT,
    after_help = EXAMPLES
)]
pub struct Args {
    /// ServiceAccount to read a secret-based token for; a bound token is read
    /// from stdin when omitted
    #[arg(value_name = "SERVICEACCOUNT")]
    pub serviceaccount: Vec<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Yaml)]
    pub output: OutputFormat,

    /// Path to the kubeconfig file to use
    #[arg(long)]
    pub kubeconfig: Option<String>,

    /// The name of the kubeconfig context to use
    #[arg(long)]
    pub context: Option<String>,

    /// Namespace of the serviceaccount
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// kubectl binary used to read serviceaccounts and secrets
    #[arg(long, default_value = "kubectl")]
    pub kubectl: String,

    /// Enable debug logging
    #[arg(short, long)]
    pub debug: bool,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    pub log_file: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Yaml,
    Json,
}

/// A serviceaccount, identified by namespace and name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub namespace: String,
    pub name: String,
}

impl Identity {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.namespace, self.name)
    }
}

/// Token plus the CA bundle that goes with it. The CA is empty only when it
/// was taken from a kubeconfig cluster that carried no embedded CA data.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential {
    pub token: String,
    pub ca_certificate: Vec<u8>,
}

// Keep tokens out of debug logs.
impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"<redacted>")
            .field("ca_certificate", &format!("{} bytes", self.ca_certificate.len()))
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SecretType {
    ServiceAccountToken,
    Other(String),
}

impl SecretType {
    pub fn parse(value: &str) -> Self {
        if value == SERVICE_ACCOUNT_TOKEN_TYPE {
            SecretType::ServiceAccountToken
        } else {
            SecretType::Other(value.to_string())
        }
    }
}

/// A secret that may hold the serviceaccount's token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SecretCandidate {
    pub name: String,
    pub secret_type: SecretType,
    pub annotations: BTreeMap<String, String>,
    pub data: BTreeMap<String, Vec<u8>>,
}

impl SecretCandidate {
    /// UID of the serviceaccount this secret was issued for, if annotated.
    pub fn service_account_uid(&self) -> Option<&str> {
        self.annotations
            .get(SERVICE_ACCOUNT_UID_ANNOTATION)
            .map(String::as_str)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceAccountRecord {
    pub namespace: String,
    pub name: String,
    pub uid: String,
    /// Names of the secrets listed on the account, in order.
    pub secrets: Vec<String>,
}

/// Cluster and context the caller's kubeconfig currently points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClusterContext {
    pub context_name: String,
    pub cluster_name: String,
    pub server_url: String,
    pub existing_ca: Vec<u8>,
}

// src/discovery/kubectl.rs
use base64::{engine::general_purpose, Engine as _};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::process::Command;
use tracing::debug;

use super::ObjectStore;
use crate::error::{Error, Result};
use crate::types::{SecretCandidate, SecretType, ServiceAccountRecord};

/// [`ObjectStore`] backed by `kubectl get ... -o json`, so authentication and
/// cluster selection behave exactly like the caller's own kubectl.
pub struct KubectlStore {
    binary: String,
    kubeconfig: Option<String>,
    context: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ObjectMeta {
    name: String,
    #[serde(default)]
    namespace: String,
    #[serde(default)]
    uid: String,
    #[serde(default)]
    annotations: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ObjectReference {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct ServiceAccountObject {
    metadata: ObjectMeta,
    #[serde(default)]
    secrets: Vec<ObjectReference>,
}

#[derive(Debug, Deserialize)]
struct SecretObject {
    metadata: ObjectMeta,
    #[serde(rename = "type", default)]
    secret_type: String,
    #[serde(default)]
    data: BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct SecretList {
    #[serde(default)]
    items: Vec<SecretObject>,
}

impl KubectlStore {
    pub fn new(binary: String, kubeconfig: Option<String>, context: Option<String>) -> Self {
        Self {
            binary,
            kubeconfig,
            context,
        }
    }

    fn command_args(&self, args: &[&str]) -> Vec<String> {
        let mut full = Vec::new();
        if let Some(kubeconfig) = &self.kubeconfig {
            full.push(format!("--kubeconfig={}", kubeconfig));
        }
        if let Some(context) = &self.context {
            full.push(format!("--context={}", context));
        }
        full.extend(args.iter().map(|a| a.to_string()));
        full.push("--output=json".to_string());
        full
    }

    fn get(&self, kind: &'static str, namespace: &str, name: Option<&str>) -> Result<Vec<u8>> {
        let mut args = vec!["get", kind];
        if let Some(name) = name {
            args.push(name);
        }
        args.extend(["--namespace", namespace]);
        let args = self.command_args(&args);

        debug!(binary = %self.binary, args = ?args, "running kubectl");
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .map_err(|e| Error::transport(format!("failed to run {}: {}", self.binary, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_failure(kind, namespace, name, stderr.trim()));
        }

        Ok(output.stdout)
    }
}

impl ObjectStore for KubectlStore {
    fn get_service_account(&self, namespace: &str, name: &str) -> Result<ServiceAccountRecord> {
        let stdout = self.get("serviceaccount", namespace, Some(name))?;
        parse_service_account(&stdout)
    }

    fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretCandidate> {
        let stdout = self.get("secret", namespace, Some(name))?;
        let secret: SecretObject = serde_json::from_slice(&stdout)
            .map_err(|e| Error::serialization(format!("secret {}/{}: {}", namespace, name, e)))?;
        secret.into_candidate()
    }

    fn list_secrets(&self, namespace: &str) -> Result<Vec<SecretCandidate>> {
        let stdout = self.get("secrets", namespace, None)?;
        parse_secret_list(&stdout)
    }
}

fn classify_failure(kind: &'static str, namespace: &str, name: Option<&str>, stderr: &str) -> Error {
    match name {
        Some(name) if stderr.contains("(NotFound)") => Error::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        },
        _ => Error::transport(stderr.to_string()),
    }
}

fn parse_service_account(json: &[u8]) -> Result<ServiceAccountRecord> {
    let account: ServiceAccountObject = serde_json::from_slice(json)
        .map_err(|e| Error::serialization(format!("serviceaccount: {}", e)))?;

    Ok(ServiceAccountRecord {
        namespace: account.metadata.namespace,
        name: account.metadata.name,
        uid: account.metadata.uid,
        secrets: account
            .secrets
            .into_iter()
            .map(|r| r.name)
            .filter(|n| !n.is_empty())
            .collect(),
    })
}

fn parse_secret_list(json: &[u8]) -> Result<Vec<SecretCandidate>> {
    let list: SecretList = serde_json::from_slice(json)
        .map_err(|e| Error::serialization(format!("secret list: {}", e)))?;
    list.items.into_iter().map(SecretObject::into_candidate).collect()
}

impl SecretObject {
    fn into_candidate(self) -> Result<SecretCandidate> {
        let mut data = BTreeMap::new();
        for (key, value) in self.data {
            let bytes = general_purpose::STANDARD.decode(value.as_bytes()).map_err(|e| {
                Error::serialization(format!(
                    "secret {}: key {:?} is not valid base64: {}",
                    self.metadata.name, key, e
                ))
            })?;
            data.insert(key, bytes);
        }

        Ok(SecretCandidate {
            name: self.metadata.name,
            secret_type: SecretType::parse(&self.secret_type),
            annotations: self.metadata.annotations,
            data,
        })
    }
}

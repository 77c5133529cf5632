// config/loader.rs
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use yaml_rust::{Yaml, YamlLoader};

use super::types::{ClusterConfig, ContextConfig, KubeConfig};
use crate::error::{Error, Result};

pub const KUBECONFIG_ENV: &str = "KUBECONFIG";

/// Files to read, in precedence order: the explicit flag, then every entry of
/// `$KUBECONFIG`, then `~/.kube/config`.
pub fn kubeconfig_paths(explicit: Option<&str>, env_value: Option<&str>) -> Result<Vec<PathBuf>> {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return Ok(vec![PathBuf::from(shellexpand::tilde(path).as_ref())]);
    }

    if let Some(value) = env_value.filter(|v| !v.is_empty()) {
        let paths: Vec<PathBuf> = env::split_paths(value)
            .filter(|p| !p.as_os_str().is_empty())
            .collect();
        if !paths.is_empty() {
            return Ok(paths);
        }
    }

    let home = dirs::home_dir()
        .ok_or_else(|| Error::config("cannot locate home directory for ~/.kube/config"))?;
    Ok(vec![home.join(".kube").join("config")])
}

impl KubeConfig {
    /// Loads the caller's kubeconfig the way kubectl would find it.
    pub fn load(explicit: Option<&str>) -> Result<Self> {
        let env_value = env::var(KUBECONFIG_ENV).ok();
        let paths = kubeconfig_paths(explicit, env_value.as_deref())?;
        let strict = explicit.is_some() || paths.len() == 1;

        let mut merged: Option<KubeConfig> = None;
        for path in &paths {
            // Missing entries in a $KUBECONFIG list are skipped, as kubectl does.
            if !strict && !path.exists() {
                debug!(path = %path.display(), "skipping missing kubeconfig");
                continue;
            }
            let config = Self::load_from_file(path)?;
            merged = Some(match merged {
                Some(acc) => acc.merge(config),
                None => config,
            });
        }

        merged.ok_or_else(|| Error::config("no kubeconfig file found"))
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::config(format!("failed to read {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "loaded kubeconfig");
        Self::parse(&content)
            .map_err(|e| Error::config(format!("{}: {}", path.display(), e)))
    }

    pub fn parse(content: &str) -> std::result::Result<Self, String> {
        let docs = YamlLoader::load_from_str(content).map_err(|e| e.to_string())?;
        let Some(doc) = docs.first() else {
            return Ok(KubeConfig::default());
        };

        Ok(KubeConfig {
            current_context: doc["current-context"]
                .as_str()
                .filter(|s| !s.is_empty())
                .map(String::from),
            clusters: extract_clusters(doc),
            contexts: extract_contexts(doc),
        })
    }
}

fn extract_clusters(yaml: &Yaml) -> Vec<ClusterConfig> {
    yaml["clusters"]
        .as_vec()
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter_map(|cluster| {
            Some(ClusterConfig {
                name: cluster["name"].as_str()?.to_string(),
                server: cluster["cluster"]["server"].as_str()?.to_string(),
                certificate_authority_data: cluster["cluster"]["certificate-authority-data"]
                    .as_str()
                    .map(String::from),
                certificate_authority: cluster["cluster"]["certificate-authority"]
                    .as_str()
                    .map(String::from),
            })
        })
        .collect()
}

fn extract_contexts(yaml: &Yaml) -> Vec<ContextConfig> {
    yaml["contexts"]
        .as_vec()
        .map(Vec::as_slice)
        .unwrap_or_default()
        .iter()
        .filter_map(|context| {
            Some(ContextConfig {
                name: context["name"].as_str()?.to_string(),
                cluster: context["context"]["cluster"].as_str()?.to_string(),
                user: context["context"]["user"].as_str().map(String::from),
                namespace: context["context"]["namespace"].as_str().map(String::from),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const KIND: &str = r#"
apiVersion: v1
kind: Config
current-context: kind-kind
preferences: {}
clusters:
- name: kind-kind
  cluster:
    server: https://127.0.0.1:42615
    certificate-authority-data: Q0EtUEVN
contexts:
- name: kind-kind
  context:
    cluster: kind-kind
    user: kind-kind
    namespace: kube-system
users:
- name: kind-kind
  user:
    client-certificate-data: Y2VydA==
"#;

    const OTHER: &str = r#"
current-context: other
clusters:
- name: kind-kind
  cluster:
    server: https://shadowed:6443
- name: other
  cluster:
    server: https://other:6443
    certificate-authority: /etc/other/ca.crt
contexts:
- name: other
  context:
    cluster: other
    user: someone
"#;

    fn write_config(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_clusters_and_contexts() {
        let config = KubeConfig::parse(KIND).unwrap();

        assert_eq!(config.current_context.as_deref(), Some("kind-kind"));
        assert_eq!(
            config.clusters,
            vec![ClusterConfig {
                name: "kind-kind".to_string(),
                server: "https://127.0.0.1:42615".to_string(),
                certificate_authority_data: Some("Q0EtUEVN".to_string()),
                certificate_authority: None,
            }]
        );
        assert_eq!(config.contexts[0].namespace.as_deref(), Some("kube-system"));
        assert_eq!(config.contexts[0].user.as_deref(), Some("kind-kind"));
    }

    #[test]
    fn incomplete_entries_are_skipped() {
        let config = KubeConfig::parse(
            "clusters:\n- name: broken\n  cluster: {}\ncontexts:\n- context:\n    cluster: x\n",
        )
        .unwrap();
        assert!(config.clusters.is_empty());
        assert!(config.contexts.is_empty());
        assert!(config.current_context.is_none());
    }

    #[test]
    fn empty_document_is_empty_config() {
        assert_eq!(KubeConfig::parse("").unwrap(), KubeConfig::default());
    }

    #[test]
    fn invalid_yaml_is_reported() {
        assert!(KubeConfig::parse("clusters: [").is_err());
    }

    #[test]
    fn explicit_path_beats_environment() {
        let paths = kubeconfig_paths(Some("/tmp/a"), Some("/tmp/b:/tmp/c")).unwrap();
        assert_eq!(paths, vec![PathBuf::from("/tmp/a")]);
    }

    #[test]
    fn environment_lists_every_file() {
        let value = env::join_paths(["/tmp/b", "/tmp/c"]).unwrap();
        let paths = kubeconfig_paths(None, value.to_str()).unwrap();
        assert_eq!(paths, vec![PathBuf::from("/tmp/b"), PathBuf::from("/tmp/c")]);
    }

    #[test]
    fn falls_back_to_home_directory() {
        if dirs::home_dir().is_none() {
            return;
        }
        let paths = kubeconfig_paths(None, None).unwrap();
        assert!(paths[0].ends_with(".kube/config"));
    }

    #[test]
    fn load_from_file_reads_kubeconfig() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(dir.path(), "config", KIND);

        let config = KubeConfig::load_from_file(&path).unwrap();
        assert_eq!(config.current_context.as_deref(), Some("kind-kind"));
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent");

        let err = KubeConfig::load(path.to_str()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn merged_files_keep_first_definitions() {
        let dir = tempfile::tempdir().unwrap();
        let first = KubeConfig::load_from_file(&write_config(dir.path(), "a", KIND)).unwrap();
        let second = KubeConfig::load_from_file(&write_config(dir.path(), "b", OTHER)).unwrap();

        let merged = first.merge(second);

        assert_eq!(merged.current_context.as_deref(), Some("kind-kind"));
        assert_eq!(merged.cluster("kind-kind").unwrap().server, "https://127.0.0.1:42615");
        assert_eq!(
            merged.cluster("other").unwrap().certificate_authority.as_deref(),
            Some("/etc/other/ca.crt")
        );
        assert!(merged.context("other").is_some());
    }
}

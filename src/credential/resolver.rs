// src/credential/resolver.rs
use std::io::Read;

use tracing::{debug, info};

use super::claims::decode_claims_unverified;
use super::locator::CredentialLocator;
use crate::config::AmbientConfig;
use crate::discovery::ObjectStore;
use crate::error::{Error, Result};
use crate::kubeconfig::{synthesize, ConfigFragment};
use crate::types::{Credential, Identity};

/// Where the serviceaccount comes from. The two are mutually exclusive: a
/// named account is looked up in the cluster, a bound token is used as is.
#[derive(Clone, PartialEq, Eq)]
pub enum IdentitySource {
    ByName(String),
    ByCredential(String),
}

impl std::fmt::Debug for IdentitySource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ByName(name) => f.debug_tuple("ByName").field(name).finish(),
            Self::ByCredential(_) => f.debug_tuple("ByCredential").field(&"<redacted>").finish(),
        }
    }
}

impl IdentitySource {
    /// Picks the source from the positional arguments, reading a bound token
    /// from `input` only when no name, or an empty one, was given.
    pub fn from_invocation(names: &[String], input: &mut dyn Read) -> Result<Self> {
        match names {
            [] => Self::read_credential(input),
            [name] if name.is_empty() => Self::read_credential(input),
            [name] => Ok(IdentitySource::ByName(name.clone())),
            _ => Err(Error::InvalidArguments(names.len())),
        }
    }

    fn read_credential(input: &mut dyn Read) -> Result<Self> {
        let mut raw = Vec::new();
        input.read_to_end(&mut raw)?;
        let token = String::from_utf8(raw)
            .map_err(|_| Error::malformed("token read from stdin is not valid UTF-8"))?;
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::malformed(
                "no SERVICEACCOUNT given and no token on stdin",
            ));
        }
        Ok(IdentitySource::ByCredential(token.to_string()))
    }
}

/// An identity together with the credential that authenticates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub identity: Identity,
    pub credential: Credential,
}

pub fn resolve<S: ObjectStore + ?Sized>(
    source: IdentitySource,
    ambient: &AmbientConfig,
    store: &S,
) -> Result<Resolution> {
    match source {
        IdentitySource::ByName(name) => {
            let identity = Identity::new(ambient.namespace.clone(), name);
            debug!(serviceaccount = %identity, "resolving secret-based token");
            let credential = CredentialLocator::new(store).locate(&identity)?;
            Ok(Resolution {
                identity,
                credential,
            })
        }
        IdentitySource::ByCredential(token) => {
            let identity = decode_claims_unverified(&token)?;
            info!(serviceaccount = %identity, "using bound token (claims not verified)");
            Ok(Resolution {
                identity,
                credential: Credential {
                    token,
                    ca_certificate: ambient.cluster.existing_ca.clone(),
                },
            })
        }
    }
}

pub fn resolve_and_synthesize<S: ObjectStore + ?Sized>(
    source: IdentitySource,
    ambient: &AmbientConfig,
    store: &S,
) -> Result<ConfigFragment> {
    let resolution = resolve(source, ambient, store)?;
    Ok(synthesize(
        &resolution.identity,
        &resolution.credential,
        &ambient.cluster,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::claims::fixtures::bound_token;
    use crate::discovery::memory::{account, opaque_secret, token_secret, MemoryStore};
    use crate::types::ClusterContext;
    use std::io::{self, Cursor};

    const UID: &str = "d3b07384-d9a7-4b8e-9c2f-6a1f0e5b7c11";

    fn ambient() -> AmbientConfig {
        AmbientConfig {
            cluster: ClusterContext {
                context_name: "kind-kind".to_string(),
                cluster_name: "kind-kind".to_string(),
                server_url: "https://127.0.0.1:42615".to_string(),
                existing_ca: b"AMBIENT-CA".to_vec(),
            },
            namespace: "kube-system".to_string(),
        }
    }

    struct FailingReader;

    impl Read for FailingReader {
        fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
            panic!("input must not be read when a name is given")
        }
    }

    #[test]
    fn one_name_is_by_name_without_reading_input() {
        let source =
            IdentitySource::from_invocation(&["default".to_string()], &mut FailingReader).unwrap();
        assert_eq!(source, IdentitySource::ByName("default".to_string()));
    }

    #[test]
    fn empty_name_reads_token_from_input() {
        let token = bound_token("kube-system", "default");
        let mut input = Cursor::new(token.clone().into_bytes());

        let source = IdentitySource::from_invocation(&["".to_string()], &mut input).unwrap();

        assert_eq!(source, IdentitySource::ByCredential(token));
    }

    #[test]
    fn no_name_reads_trimmed_token_from_input() {
        let mut input = Cursor::new(b"header.payload.signature\n".to_vec());
        let source = IdentitySource::from_invocation(&[], &mut input).unwrap();
        assert_eq!(
            source,
            IdentitySource::ByCredential("header.payload.signature".to_string())
        );
    }

    #[test]
    fn empty_or_binary_input_is_malformed() {
        let err = IdentitySource::from_invocation(&[], &mut Cursor::new(b"  \n".to_vec())).unwrap_err();
        assert!(matches!(err, Error::MalformedCredential(_)));

        let err = IdentitySource::from_invocation(&[], &mut Cursor::new(vec![0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, Error::MalformedCredential(_)));
    }

    #[test]
    fn more_than_one_name_is_invalid() {
        let names = vec!["a".to_string(), "b".to_string()];
        let err = IdentitySource::from_invocation(&names, &mut FailingReader).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments(2)));
    }

    #[test]
    fn debug_hides_bound_token() {
        let source = IdentitySource::ByCredential("secret.token.value".to_string());
        assert!(!format!("{:?}", source).contains("secret.token.value"));
    }

    // Explicit name in the ambient namespace with one token secret.
    #[test]
    fn secret_based_token_end_to_end() {
        let store = MemoryStore::new()
            .with_account(account("kube-system", "default", UID, &["default-token"]))
            .with_secret(
                "kube-system",
                token_secret("default-token", b"abc", b"-----BEGIN CERTIFICATE-----"),
            );

        let fragment = resolve_and_synthesize(
            IdentitySource::ByName("default".to_string()),
            &ambient(),
            &store,
        )
        .unwrap();

        assert_eq!(fragment.users["default"].token, "abc");
        assert_eq!(
            fragment.clusters["kind-kind"].certificate_authority_data,
            b"-----BEGIN CERTIFICATE-----".to_vec()
        );
        assert_eq!(fragment.contexts["kind-kind"].namespace, "kube-system");
        assert_eq!(fragment.current_context, "kind-kind");
    }

    // Bound token on stdin: no store access, CA from the kubeconfig.
    #[test]
    fn bound_token_end_to_end() {
        let store = MemoryStore::new()
            .with_account(account("kube-system", "default", UID, &["default-token"]))
            .with_secret("kube-system", token_secret("default-token", b"abc", b"SECRET-CA"));
        let token = bound_token("kube-system", "default");
        let mut input = Cursor::new(format!("{}\n", token).into_bytes());

        let source = IdentitySource::from_invocation(&[], &mut input).unwrap();
        let fragment = resolve_and_synthesize(source, &ambient(), &store).unwrap();

        assert!(store.calls().is_empty());
        assert_eq!(fragment.users["default"].token, token);
        assert_eq!(
            fragment.clusters["kind-kind"].certificate_authority_data,
            b"AMBIENT-CA".to_vec()
        );
        assert_eq!(fragment.contexts["kind-kind"].namespace, "kube-system");
        assert_eq!(fragment.contexts["kind-kind"].user, "default");
    }

    #[test]
    fn bound_token_namespace_overrides_ambient_namespace() {
        let store = MemoryStore::new();
        let fragment = resolve_and_synthesize(
            IdentitySource::ByCredential(bound_token("apps", "bot")),
            &ambient(),
            &store,
        )
        .unwrap();

        assert_eq!(fragment.contexts["kind-kind"].namespace, "apps");
        assert!(fragment.users.contains_key("bot"));
    }

    // Explicit name with no references and no annotated secrets.
    #[test]
    fn account_without_secrets_fails_with_no_credential() {
        let store = MemoryStore::new()
            .with_account(account("kube-system", "default", UID, &[]))
            .with_secret("kube-system", opaque_secret("unrelated"));

        let err = resolve_and_synthesize(
            IdentitySource::ByName("default".to_string()),
            &ambient(),
            &store,
        )
        .unwrap_err();

        assert!(matches!(err, Error::NoCredential { .. }));
    }

    #[test]
    fn malformed_bound_token_is_propagated() {
        let store = MemoryStore::new();
        let err = resolve_and_synthesize(
            IdentitySource::ByCredential("this is invalid token".to_string()),
            &ambient(),
            &store,
        )
        .unwrap_err();

        assert!(matches!(err, Error::MalformedCredential(_)));
        assert!(store.calls().is_empty());
    }
}

// src/credential/locator.rs
use tracing::{debug, info};

use crate::discovery::ObjectStore;
use crate::error::{Error, Result};
use crate::types::{Credential, Identity, SecretType};

const TOKEN_KEY: &str = "token";
const CA_KEY: &str = "ca.crt";

/// Finds the long-lived token secret of a serviceaccount.
pub struct CredentialLocator<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: ObjectStore + ?Sized> CredentialLocator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    pub fn locate(&self, identity: &Identity) -> Result<Credential> {
        let candidates = self.candidates(identity)?;
        if candidates.is_empty() {
            return Err(Error::NoCredential {
                namespace: identity.namespace.clone(),
                name: identity.name.clone(),
            });
        }

        let mut selected = None;
        for name in &candidates {
            // A failed fetch aborts the walk; the remaining candidates are not tried.
            let secret = self.store.get_secret(&identity.namespace, name)?;
            if secret.secret_type == SecretType::ServiceAccountToken {
                selected = Some(secret);
                break;
            }
            debug!(secret = %name, secret_type = ?secret.secret_type, "skipping secret");
        }

        let secret = selected.ok_or_else(|| Error::TypeMismatch {
            namespace: identity.namespace.clone(),
            name: identity.name.clone(),
        })?;

        // Empty values count as absent.
        let token = secret
            .data
            .get(TOKEN_KEY)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| Error::MissingField {
                secret: secret.name.clone(),
                key: TOKEN_KEY,
            })?;
        let ca_certificate = secret
            .data
            .get(CA_KEY)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| Error::MissingField {
                secret: secret.name.clone(),
                key: CA_KEY,
            })?;

        info!(serviceaccount = %identity, secret = %secret.name, "using secret-based token");

        Ok(Credential {
            token: String::from_utf8_lossy(token).into_owned(),
            ca_certificate: ca_certificate.clone(),
        })
    }

    /// Secret names to try, in order. The account's own references win;
    /// without them the namespace is scanned for a secret annotated with the
    /// account's UID and the first match is used.
    fn candidates(&self, identity: &Identity) -> Result<Vec<String>> {
        let account = self
            .store
            .get_service_account(&identity.namespace, &identity.name)?;

        if !account.secrets.is_empty() {
            debug!(serviceaccount = %identity, secrets = ?account.secrets, "using referenced secrets");
            return Ok(account.secrets);
        }

        let secrets = self.store.list_secrets(&identity.namespace)?;
        let matched = secrets
            .into_iter()
            .find(|s| s.service_account_uid() == Some(account.uid.as_str()))
            .map(|s| s.name);

        debug!(serviceaccount = %identity, uid = %account.uid, secret = ?matched, "scanned annotated secrets");
        Ok(matched.into_iter().collect())
    }
}

// src/discovery/store.rs
use crate::error::Result;
use crate::types::{SecretCandidate, ServiceAccountRecord};

/// Read-only access to serviceaccounts and secrets in the cluster.
///
/// Calls are blocking and issued one at a time; implementations report a
/// missing object as [`Error::NotFound`](crate::error::Error::NotFound) and
/// any other failure as a transport error.
pub trait ObjectStore {
    fn get_service_account(&self, namespace: &str, name: &str) -> Result<ServiceAccountRecord>;

    fn get_secret(&self, namespace: &str, name: &str) -> Result<SecretCandidate>;

    fn list_secrets(&self, namespace: &str) -> Result<Vec<SecretCandidate>>;
}

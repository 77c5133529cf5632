// src/credential/claims.rs
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::types::Identity;

#[derive(Debug, Deserialize)]
struct Claims {
    #[serde(rename = "kubernetes.io")]
    kubernetes: Option<KubernetesClaims>,
}

#[derive(Debug, Deserialize)]
struct KubernetesClaims {
    namespace: Option<String>,
    serviceaccount: Option<NameClaim>,
}

#[derive(Debug, Deserialize)]
struct NameClaim {
    name: Option<String>,
}

/// Reads the serviceaccount a bound token claims to belong to.
///
/// The signature is NOT verified. The returned identity is whatever the
/// token says about itself and must only be used to label the generated
/// kubeconfig; the API server remains the one checking the token.
pub fn decode_claims_unverified(token: &str) -> Result<Identity> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 {
        return Err(Error::malformed(format!(
            "expected 3 dot-separated segments, got {}",
            segments.len()
        )));
    }

    let payload = URL_SAFE_NO_PAD
        .decode(segments[1].trim_end_matches('='))
        .map_err(|e| Error::malformed(format!("invalid payload encoding: {}", e)))?;

    let claims: Claims = serde_json::from_slice(&payload)
        .map_err(|e| Error::malformed(format!("invalid payload: {}", e)))?;

    let kubernetes = claims
        .kubernetes
        .ok_or_else(|| Error::malformed("missing \"kubernetes.io\" claim"))?;

    let namespace = kubernetes
        .namespace
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::malformed("missing \"kubernetes.io\".namespace claim"))?;

    let name = kubernetes
        .serviceaccount
        .and_then(|sa| sa.name)
        .filter(|n| !n.is_empty())
        .ok_or_else(|| Error::malformed("missing \"kubernetes.io\".serviceaccount.name claim"))?;

    Ok(Identity { namespace, name })
}

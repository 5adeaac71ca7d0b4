//! Factory: build a shared `Verifier` from `VerifierConfig`.
use std::sync::Arc;

use crate::config::{ConfigError, VerifierConfig};
use crate::services::auth::Verifier;

pub fn build_verifier(config: &VerifierConfig) -> Result<Arc<Verifier>, ConfigError> {
    let keys = config.load_keys()?;
    let verifier = Verifier::new(keys, config.policy())?;

    tracing::info!(
        issuer = %config.issuer,
        audience = %config.audience,
        kids = ?verifier.key_ids(),
        "ssd token verifier ready"
    );

    Ok(Arc::new(verifier))
}

/// Reload the key directory and rotate. The current keys stay installed on error.
pub fn reload_keys(verifier: &Verifier, config: &VerifierConfig) -> Result<usize, ConfigError> {
    let keys = config.load_keys()?;
    let count = keys.len();
    verifier.rotate_keys(keys)?;
    Ok(count)
}

/*
 * Responsibility
 * - Read verifier settings from the environment (issuer, audience, leeway, key directory)
 * - Load kid -> PEM mappings from a directory of `*.pem` files (file stem = kid)
 */
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use thiserror::Error;

use crate::error::KeyParseError;
use crate::services::auth::policy::{
    DEFAULT_AUDIENCE, DEFAULT_ISSUER, DEFAULT_LEEWAY, VerificationPolicy,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(&'static str),

    #[error("invalid configuration: {0}")]
    Invalid(&'static str),

    #[error("unable to read keys from {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Key(#[from] KeyParseError),
}

#[derive(Debug, Clone)]
pub struct VerifierConfig {
    pub issuer: String,
    pub audience: String,
    pub leeway: Duration,
    pub keys_dir: PathBuf,
}

impl VerifierConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let issuer = std::env::var("SSD_JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());
        let audience =
            std::env::var("SSD_JWT_AUDIENCE").unwrap_or_else(|_| DEFAULT_AUDIENCE.to_string());

        let leeway = match std::env::var("SSD_JWT_LEEWAY_SECONDS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .map_err(|_| ConfigError::Invalid("SSD_JWT_LEEWAY_SECONDS"))?,
            Err(_) => DEFAULT_LEEWAY,
        };

        let keys_dir = std::env::var("SSD_JWT_KEYS_DIR")
            .map(PathBuf::from)
            .map_err(|_| ConfigError::Missing("SSD_JWT_KEYS_DIR"))?;

        Ok(Self {
            issuer,
            audience,
            leeway,
            keys_dir,
        })
    }

    pub fn policy(&self) -> VerificationPolicy {
        VerificationPolicy::new(&self.issuer, &self.audience).with_leeway(self.leeway)
    }

    pub fn load_keys(&self) -> Result<HashMap<String, Vec<u8>>, ConfigError> {
        load_pem_keys_dir(&self.keys_dir)
    }
}

/// Read every `*.pem` file in `dir`. The file stem becomes the kid.
pub fn load_pem_keys_dir(dir: &Path) -> Result<HashMap<String, Vec<u8>>, ConfigError> {
    let io_err = |source: std::io::Error| ConfigError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut keys = HashMap::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("pem") {
            continue;
        }
        let Some(kid) = path.file_stem().and_then(|stem| stem.to_str()) else {
            continue;
        };

        let pem = std::fs::read(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        keys.insert(kid.to_string(), pem);
    }

    tracing::debug!(dir = %dir.display(), keys = keys.len(), "loaded pem keys");
    Ok(keys)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures_dir() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
    }

    #[test]
    fn loads_pem_files_by_stem() {
        let keys = load_pem_keys_dir(&fixtures_dir()).unwrap();

        assert!(keys.contains_key("k1_public"));
        assert!(keys.contains_key("k2_public_spki"));
        assert!(keys["k1_public"].starts_with(b"-----BEGIN RSA PUBLIC KEY-----"));
    }

    #[test]
    fn missing_directory_is_an_io_error() {
        let err = load_pem_keys_dir(&fixtures_dir().join("does-not-exist")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn policy_uses_configured_values() {
        let config = VerifierConfig {
            issuer: "issuer-a".to_string(),
            audience: "aud-a".to_string(),
            leeway: Duration::from_secs(30),
            keys_dir: fixtures_dir(),
        };

        let policy = config.policy();
        assert_eq!(policy.issuer(), "issuer-a");
        assert_eq!(policy.audience(), "aud-a");
        assert_eq!(policy.leeway(), Duration::from_secs(30));
    }
}

//! Verification keys by kid, with all-or-nothing rotation.
//!
//! The installed mapping sits behind an `Arc` that is swapped wholesale, so a
//! reader holds the lock only long enough to clone one key handle out of the
//! current snapshot. Signature checks never run under the lock.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use jsonwebtoken::DecodingKey;
use rsa::RsaPublicKey;
use rsa::pkcs1::DecodeRsaPublicKey;
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;

use crate::error::{KeyMaterialProblem, KeyNotFoundError, KeyParseError};

const PKCS1_PUBLIC_LABEL: &str = "-----BEGIN RSA PUBLIC KEY-----";
const SPKI_PUBLIC_LABEL: &str = "-----BEGIN PUBLIC KEY-----";

/// An RSA public key bound to one kid.
///
/// - Key material is intentionally not printable via Debug.
pub struct VerificationKey {
    kid: String,
    decoding_key: DecodingKey,
}

impl VerificationKey {
    /// Parse a PEM-encoded RSA public key (PKCS#1 `RSA PUBLIC KEY` or SPKI `PUBLIC KEY`).
    pub fn from_rsa_pem(kid: impl Into<String>, pem: &[u8]) -> Result<Self, KeyParseError> {
        let kid = kid.into();
        match decode_rsa_public_key(pem) {
            Ok(decoding_key) => Ok(Self { kid, decoding_key }),
            Err(source) => Err(KeyParseError { kid, source }),
        }
    }

    pub fn kid(&self) -> &str {
        &self.kid
    }

    pub(crate) fn decoding_key(&self) -> &DecodingKey {
        &self.decoding_key
    }
}

impl fmt::Debug for VerificationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VerificationKey")
            .field("kid", &self.kid)
            .finish_non_exhaustive()
    }
}

// `DecodingKey::from_rsa_pem` only checks the armor label and keeps the DER
// as-is, so the key is decoded here and handed over as (n, e).
fn decode_rsa_public_key(pem: &[u8]) -> Result<DecodingKey, KeyMaterialProblem> {
    let text = std::str::from_utf8(pem)
        .map_err(|_| KeyMaterialProblem::NotText)?
        .trim();

    let key = if text.starts_with(PKCS1_PUBLIC_LABEL) {
        RsaPublicKey::from_pkcs1_pem(text)?
    } else if text.starts_with(SPKI_PUBLIC_LABEL) {
        RsaPublicKey::from_public_key_pem(text)?
    } else {
        return Err(KeyMaterialProblem::UnsupportedLabel);
    };

    Ok(DecodingKey::from_rsa_raw_components(
        &key.n().to_bytes_be(),
        &key.e().to_bytes_be(),
    ))
}

type KeyMap = HashMap<String, Arc<VerificationKey>>;

/// Holds the active key set. Never partially mutated.
pub struct KeyStore {
    keys: RwLock<Arc<KeyMap>>,
}

impl KeyStore {
    pub fn empty() -> Self {
        Self {
            keys: RwLock::new(Arc::new(KeyMap::new())),
        }
    }

    /// Build a store from kid → PEM pairs. If the same kid appears twice the
    /// later entry wins.
    pub fn new<I, K, V>(pem_keys: I) -> Result<Self, KeyParseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<[u8]>,
    {
        let keys = parse_keys(pem_keys)?;
        Ok(Self {
            keys: RwLock::new(Arc::new(keys)),
        })
    }

    /// Replace the whole key set. On error the current set stays installed.
    pub fn rotate<I, K, V>(&self, pem_keys: I) -> Result<(), KeyParseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<[u8]>,
    {
        // Parse before taking the lock; the critical section is just the swap.
        let next = Arc::new(parse_keys(pem_keys)?);
        let count = next.len();
        let previous = {
            let mut guard = self.keys.write().unwrap_or_else(PoisonError::into_inner);
            std::mem::replace(&mut *guard, next)
        };
        drop(previous);

        tracing::debug!(keys = count, "verification keys rotated");
        Ok(())
    }

    pub fn lookup(&self, kid: &str) -> Result<Arc<VerificationKey>, KeyNotFoundError> {
        let snapshot = self.snapshot();
        snapshot.get(kid).cloned().ok_or_else(|| KeyNotFoundError {
            kid: kid.to_string(),
        })
    }

    /// Installed kids, sorted.
    pub fn key_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.snapshot().keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshot().is_empty()
    }

    // The map behind the Arc is immutable, so a poisoned lock still guards a
    // complete set.
    fn snapshot(&self) -> Arc<KeyMap> {
        Arc::clone(&self.keys.read().unwrap_or_else(PoisonError::into_inner))
    }
}

impl Default for KeyStore {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for KeyStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyStore")
            .field("kids", &self.key_ids())
            .finish()
    }
}

fn parse_keys<I, K, V>(pem_keys: I) -> Result<KeyMap, KeyParseError>
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: AsRef<[u8]>,
{
    let mut keys = KeyMap::new();
    for (kid, pem) in pem_keys {
        let key = VerificationKey::from_rsa_pem(kid, pem.as_ref())?;
        keys.insert(key.kid.clone(), Arc::new(key));
    }
    Ok(keys)
}

use std::str::FromStr;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, Validation, errors::ErrorKind};

use crate::error::{ClaimsProblem, KeyParseError, VerifyError};
use crate::services::auth::claims::Claims;
use crate::services::auth::header::TokenHeader;
use crate::services::auth::key_store::{KeyStore, VerificationKey};
use crate::services::auth::policy::VerificationPolicy;

/// PS256 token verifier backed by a rotatable RSA key set.
///
/// One instance is shared (behind `Arc`) by every request handler. Key
/// resolution holds the key store lock only for the lookup; signature and
/// claim checks run without any lock, so concurrent verifications do not
/// serialize.
pub struct Verifier {
    keys: KeyStore,
    policy: VerificationPolicy,
    validation: Validation,
}

impl std::fmt::Debug for Verifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Do not print key material
        f.debug_struct("Verifier")
            .field("keys", &self.keys)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl Verifier {
    /// Build a verifier from kid → PEM-encoded RSA public keys.
    pub fn new<I, K, V>(pem_keys: I, policy: VerificationPolicy) -> Result<Self, KeyParseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<[u8]>,
    {
        let keys = KeyStore::new(pem_keys)?;
        let validation = build_validation(&policy);

        Ok(Self {
            keys,
            policy,
            validation,
        })
    }

    /// Replace every installed key. All-or-nothing.
    pub fn rotate_keys<I, K, V>(&self, pem_keys: I) -> Result<(), KeyParseError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: AsRef<[u8]>,
    {
        self.keys.rotate(pem_keys)
    }

    pub fn key_ids(&self) -> Vec<String> {
        self.keys.key_ids()
    }

    pub fn policy(&self) -> &VerificationPolicy {
        &self.policy
    }

    /// Resolve the verification key named by the header's `kid`.
    pub fn key_for(&self, header: &TokenHeader) -> Result<Arc<VerificationKey>, VerifyError> {
        let kid = header.key_id().map_err(VerifyError::MissingKeyId)?;
        Ok(self.keys.lookup(kid)?)
    }

    /// Verify signature and claims, returning the parsed claims.
    pub fn verify(&self, token: &str) -> Result<Claims, VerifyError> {
        let header = TokenHeader::decode(token)?;
        let alg = self.check_algorithm(&header)?;
        let key = self.key_for(&header)?;
        // `decode` deserializes the typed JOSE header (typ, jwk, ...) before the
        // signature check. Fail that here so it reads as envelope damage.
        jsonwebtoken::decode_header(token).map_err(|e| VerifyError::malformed(e.to_string()))?;

        let data = jsonwebtoken::decode::<Claims>(token, key.decoding_key(), &self.validation)
            .map_err(|e| classify(e, alg))?;

        let mut claims = data.claims;
        self.check_issuer_and_audience(&claims)?;
        self.check_times(&claims)?;
        claims.kid = key.kid().to_string();

        tracing::debug!(kid = %claims.kid, sub = ?claims.sub, "ssd token verified");
        Ok(claims)
    }

    fn check_algorithm<'h>(&self, header: &'h TokenHeader) -> Result<&'h str, VerifyError> {
        let alg = header
            .algorithm()
            .ok_or_else(|| VerifyError::malformed("header has no usable `alg`"))?;

        match Algorithm::from_str(alg) {
            Ok(declared) if declared == self.policy.algorithm() => Ok(alg),
            _ => Err(VerifyError::AlgorithmMismatch {
                found: alg.to_string(),
            }),
        }
    }

    fn check_issuer_and_audience(&self, claims: &Claims) -> Result<(), VerifyError> {
        match claims.iss.as_deref() {
            None => return Err(VerifyError::ClaimsInvalid(ClaimsProblem::Missing("iss"))),
            Some(iss) if iss != self.policy.issuer() => {
                return Err(VerifyError::ClaimsInvalid(ClaimsProblem::WrongIssuer));
            }
            Some(_) => {}
        }

        match &claims.aud {
            None => Err(VerifyError::ClaimsInvalid(ClaimsProblem::Missing("aud"))),
            Some(aud) if aud.contains(self.policy.audience()) => Ok(()),
            Some(_) => Err(VerifyError::ClaimsInvalid(ClaimsProblem::WrongAudience)),
        }
    }

    // Leeway is applied the same way to every time-based claim.
    fn check_times(&self, claims: &Claims) -> Result<(), VerifyError> {
        let now = self.policy.now_timestamp();
        let leeway = self.policy.leeway_seconds();

        let exp = claims
            .exp
            .ok_or(VerifyError::ClaimsInvalid(ClaimsProblem::Missing("exp")))?;
        if now.saturating_sub(leeway) > exp {
            return Err(VerifyError::ClaimsInvalid(ClaimsProblem::Expired));
        }

        let iat = claims
            .iat
            .ok_or(VerifyError::ClaimsInvalid(ClaimsProblem::Missing("iat")))?;
        if iat > now.saturating_add(leeway) {
            return Err(VerifyError::ClaimsInvalid(ClaimsProblem::IssuedInFuture));
        }

        if let Some(nbf) = claims.nbf {
            if nbf > now.saturating_add(leeway) {
                return Err(VerifyError::ClaimsInvalid(ClaimsProblem::NotYetValid));
            }
        }

        Ok(())
    }
}

fn build_validation(policy: &VerificationPolicy) -> Validation {
    let mut validation = Validation::new(policy.algorithm());
    validation.set_issuer(&[policy.issuer()]);
    validation.set_audience(&[policy.audience()]);
    // `exp`/`iat`/`nbf` are checked in `check_times` against the policy clock.
    validation.set_required_spec_claims(&["iss", "aud"]);
    validation.validate_exp = false;
    validation.validate_nbf = false;
    validation
}

fn classify(err: jsonwebtoken::errors::Error, alg: &str) -> VerifyError {
    match err.kind() {
        ErrorKind::InvalidSignature => VerifyError::SignatureInvalid,
        ErrorKind::InvalidAlgorithm => VerifyError::AlgorithmMismatch {
            found: alg.to_string(),
        },
        ErrorKind::InvalidIssuer => VerifyError::ClaimsInvalid(ClaimsProblem::WrongIssuer),
        ErrorKind::InvalidAudience => VerifyError::ClaimsInvalid(ClaimsProblem::WrongAudience),
        ErrorKind::ExpiredSignature => VerifyError::ClaimsInvalid(ClaimsProblem::Expired),
        ErrorKind::ImmatureSignature => VerifyError::ClaimsInvalid(ClaimsProblem::NotYetValid),
        ErrorKind::MissingRequiredClaim(claim) => VerifyError::ClaimsInvalid(missing_claim(claim)),
        // The typed header was checked in `verify`, so a JSON failure here is the payload.
        ErrorKind::Json(_) => VerifyError::ClaimsInvalid(ClaimsProblem::Invalid(err.to_string())),
        _ => VerifyError::MalformedToken(err.to_string()),
    }
}

// Only `iss` and `aud` are required of jsonwebtoken.
fn missing_claim(claim: &str) -> ClaimsProblem {
    match claim {
        "iss" => ClaimsProblem::Missing("iss"),
        "aud" => ClaimsProblem::Missing("aud"),
        other => ClaimsProblem::Invalid(format!("missing required claim {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_claims_keep_their_names() {
        assert_eq!(missing_claim("iss"), ClaimsProblem::Missing("iss"));
        assert_eq!(missing_claim("aud"), ClaimsProblem::Missing("aud"));
    }

    #[test]
    fn other_missing_claims_are_reported_verbatim() {
        assert_eq!(
            missing_claim("sub"),
            ClaimsProblem::Invalid("missing required claim sub".to_string())
        );
    }
}

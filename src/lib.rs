//! # ssd-jwt-auth
//!
//! Verification of SSD bearer tokens (PS256 JWTs) for axum services.
//!
//! - `Verifier`: rotatable RSA key set + fixed policy (issuer, audience, PS256, leeway)
//! - `middleware::auth::apply`: rejects unauthenticated requests with 401 and
//!   publishes the verified claims and raw token to handlers
//! - `claims_from_context` / `token_from_context` (or the `VerifiedClaims` /
//!   `BearerToken` extractors) read them back
//!
//! ```ignore
//! let verifier = Arc::new(Verifier::new(pem_keys, VerificationPolicy::default())?);
//! let app = ssd_jwt_auth::middleware::auth::apply(routes(), verifier.clone());
//!
//! // later, when the issuer rolls its keys
//! verifier.rotate_keys(new_pem_keys)?;
//! ```

pub mod config;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod services;

pub use config::{ConfigError, VerifierConfig, load_pem_keys_dir};
pub use error::{
    AuthRejection, ClaimsProblem, KeyIdProblem, KeyMaterialProblem, KeyNotFoundError, KeyParseError,
    VerifyError,
};
pub use extractors::{BearerToken, VerifiedClaims, claims_from_context, token_from_context};
pub use services::auth::claims::{Audience, SsdClaims, TokenType};
pub use services::auth::{
    Claims, Clock, KeyStore, VerificationKey, VerificationPolicy, Verifier, build_verifier,
    reload_keys,
};

pub mod claims;
pub mod factory;
pub mod header;
pub mod key_store;
pub mod policy;
pub mod verifier;

pub use claims::Claims;
pub use factory::{build_verifier, reload_keys};
pub use key_store::{KeyStore, VerificationKey};
pub use policy::{Clock, VerificationPolicy};
pub use verifier::Verifier;

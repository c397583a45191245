pub mod claims;
pub mod error;
pub mod extractor;
pub mod factory;
pub mod gate;
pub mod key_set;
pub mod key_source;
pub mod permissions;
pub mod verifier;

#[cfg(test)]
pub mod testutil;

pub use claims::{Permission, TokenClaims};
pub use error::AuthError;
pub use factory::build_authorization_gate;
pub use gate::AuthorizationGate;

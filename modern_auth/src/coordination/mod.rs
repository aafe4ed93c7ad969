//! Glue between the ceremony verifier, the user repositories and grant issuance.

mod errors;
mod oauth2;
mod passkey;
mod service;
mod types;

pub use errors::CoordinationError;
pub use service::ModernAuth;
pub use types::{AssertionResponse, CeremonyResult, RegistrationResponse};

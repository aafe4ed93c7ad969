pub mod authenticator;
pub mod constants;
pub mod fixtures;

pub use authenticator::MockAuthenticator;
pub use fixtures::*;

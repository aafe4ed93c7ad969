mod errors;
mod memory;
mod repository;
mod sql;
mod types;

pub use errors::RepositoryError;
pub use memory::InMemoryRepository;
pub use repository::{ClientRepository, CredentialRepository, UserRepository};
pub use sql::SqlRepository;
pub use types::{Credential, Status, User};

mod authorization;
mod token;
mod token_handler;

pub use authorization::AuthorizationService;
pub use token::TokenService;
pub use token_handler::{RandomTokenHandler, TokenHandler};

/// Relying party used by every test service
pub const ORIGIN: &str = "https://login.example.com";
pub const RP_ID: &str = "login.example.com";

/// Seeded OAuth2 client
pub mod client {
    pub const ID: &str = "client1";
    pub const REDIRECT_URI: &str = "https://cb";
    pub const SECOND_REDIRECT_URI: &str = "https://app.example.com/callback";
    pub const SCOPES: [&str; 2] = ["openid", "profile"];
}

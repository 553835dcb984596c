//! Credential primitives: password hashing, signed access tokens and
//! API-key secrets.

pub mod api_key;
pub mod password;
pub mod token;

pub use api_key::{digest_secret, generate_secret};
pub use password::Passwords;
pub use token::{AccessToken, Claims, TokenService};

pub mod auth;
pub mod client;
pub mod token;

pub use auth::{OAuthConfig, TokenManager};
pub use client::SheetsClient;
pub use token::OAuthToken;

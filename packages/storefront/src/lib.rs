pub mod client;
pub mod config;
pub mod models;
pub mod repositories;
pub mod services;

pub use client::StorefrontClient;
pub use config::ClientConfig;
pub use models::user::{Role, UserId, UserProfile};
pub use services::errors::api_errors::{ErrorKind, NormalizedError};

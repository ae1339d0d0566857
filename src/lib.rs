// Portal Client - authenticated HTTP client with automatic token refresh

pub mod auth;
pub mod client;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod navigation;
pub mod pipeline;
pub mod store;

pub use client::{PortalHttpClient, PortalHttpClientBuilder};
pub use config::ClientConfig;
pub use descriptor::{Envelope, RequestDescriptor, RequestOptions};
pub use error::ApiError;
pub use navigation::{Location, Navigator, NoopNavigator, RecordingNavigator};
pub use store::{CredentialStore, MemoryStore, SqliteStore, TokenPair};

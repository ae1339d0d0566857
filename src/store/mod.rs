// Credential storage
// The store is the only mutable state shared between requests

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use serde::{Deserialize, Serialize};

/// Access plus refresh credential pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
    /// Short-lived bearer token authorizing API requests
    pub access_token: String,

    /// Longer-lived token exchanged for a new access token
    pub refresh_token: String,
}

impl TokenPair {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Key-value storage for the credential pair
///
/// Absence is a valid state and means requests go out anonymously. Token
/// values are bearer secrets; implementations must never log them.
pub trait CredentialStore: Send + Sync {
    /// Read the stored pair, `None` when either credential is missing
    fn load(&self) -> anyhow::Result<Option<TokenPair>>;

    /// Persist the pair, overwriting any previous one
    fn save(&self, pair: &TokenPair) -> anyhow::Result<()>;

    /// Delete both credentials
    fn clear(&self) -> anyhow::Result<()>;
}

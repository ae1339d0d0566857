use std::sync::RwLock;

use super::{CredentialStore, TokenPair};

/// Process-local credential store
///
/// The default store when none is injected, and the usual test double.
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Option<TokenPair>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding the given pair
    pub fn with_pair(pair: TokenPair) -> Self {
        Self {
            inner: RwLock::new(Some(pair)),
        }
    }
}

impl CredentialStore for MemoryStore {
    fn load(&self) -> anyhow::Result<Option<TokenPair>> {
        let guard = self
            .inner
            .read()
            .map_err(|_| anyhow::anyhow!("credential store lock poisoned"))?;
        Ok(guard.clone())
    }

    fn save(&self, pair: &TokenPair) -> anyhow::Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("credential store lock poisoned"))?;
        *guard = Some(pair.clone());
        Ok(())
    }

    fn clear(&self) -> anyhow::Result<()> {
        let mut guard = self
            .inner
            .write()
            .map_err(|_| anyhow::anyhow!("credential store lock poisoned"))?;
        *guard = None;
        Ok(())
    }
}

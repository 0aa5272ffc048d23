//! cardex persists collectible-card records in a Redis-style key-value
//! store. Every record is addressed by a composite identifier (release
//! number, catalog number, variant code, frame code) and every mutation
//! runs as one cached server-side script, so a record and its secondary
//! indexes (by catalog number, by origin set, by illustrator) change
//! atomically.
//!
//! Known limitation, preserved deliberately: index membership is additive
//! only. Re-saving a card under a new illustrator registers it in the new
//! illustrator's index without removing it from the old one.

pub mod card;
pub mod cards;
pub mod config;
pub mod error;
pub mod ident;
pub mod keys;
pub mod scripts;
pub mod store;

pub use card::Card;
pub use cards::{CardFinder, CardStore, SaveResult, WriteStatus};
pub use config::CardexConfig;
pub use error::CardexError;
pub use ident::CardId;
pub use scripts::ScriptRegistry;
pub use store::{MemoryStore, RedisStore, StoreConnection, StoreError, StoreReply};

use tracing::info;

/// Process-wide handle on the store. Owns the single connection and the
/// one [`ScriptRegistry`], which are passed explicitly to the per-call
/// components instead of living in global state.
pub struct Cardex {
    scripts: ScriptRegistry,
    store: Box<dyn StoreConnection>,
}

impl Cardex {
    /// Connects the Redis backend and loads the script catalog. A store
    /// that is down during loading is non-fatal: the registry stays empty
    /// until [`Cardex::reload_scripts`] succeeds.
    pub fn open(config: &CardexConfig) -> Result<Self, CardexError> {
        let store = RedisStore::connect(config)?;
        Ok(Self::with_store(config, Box::new(store)))
    }

    /// Wires any store backend, e.g. [`MemoryStore`] for tests and local
    /// development.
    pub fn with_store(config: &CardexConfig, store: Box<dyn StoreConnection>) -> Self {
        let scripts = ScriptRegistry::new(config.script_dir.clone());
        scripts.load_all(store.as_ref());
        info!(scripts = scripts.loaded().len(), "cardex instance ready");
        Self { scripts, store }
    }

    /// Record create/read/upsert operations.
    pub fn cards(&self) -> CardStore<'_> {
        CardStore::new(&self.scripts, self.store.as_ref())
    }

    /// Secondary-index lookups.
    pub fn finder(&self) -> CardFinder<'_> {
        CardFinder::new(&self.scripts, self.store.as_ref())
    }

    pub fn scripts(&self) -> &ScriptRegistry {
        &self.scripts
    }

    pub fn store(&self) -> &dyn StoreConnection {
        self.store.as_ref()
    }

    pub fn reload_scripts(&self) {
        self.scripts.load_all(self.store.as_ref());
    }

    pub fn ping(&self) -> Result<(), StoreError> {
        self.store.ping()
    }
}

//! Named server-side scripts: loading, content-handle caching, and
//! execution with single-shot recovery when the store forgets a script.

use crate::error::CardexError;
use crate::store::{StoreConnection, StoreError, StoreReply};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Logical names of the scripts the card store invokes. A script's name is
/// the base name of its source file.
pub mod names {
    pub const GET_CARD: &str = "get_card";
    pub const ADD_CARD: &str = "add_card";
    pub const UPDATE_CARD_PRICE: &str = "update_card_price";
    pub const FIND_CARDS_BY_POKEMON: &str = "find_cards_by_pokemon";
    pub const FIND_CARDS_BY_SET: &str = "find_cards_by_set";
    pub const FIND_CARDS_BY_ILLUSTRATOR: &str = "find_cards_by_illustrator";

    pub const REQUIRED: [&str; 6] = [
        GET_CARD,
        ADD_CARD,
        UPDATE_CARD_PRICE,
        FIND_CARDS_BY_POKEMON,
        FIND_CARDS_BY_SET,
        FIND_CARDS_BY_ILLUSTRATOR,
    ];
}

/// Owns the one name-to-handle map for the process. Constructed once and
/// passed explicitly to the components that execute scripts.
pub struct ScriptRegistry {
    dir: PathBuf,
    handles: RwLock<HashMap<String, String>>,
}

impl ScriptRegistry {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Registers every `.lua` source under the script directory and caches
    /// the handle the store returns, keyed by file stem.
    ///
    /// An unreachable store is non-fatal: the cache is left as it was. A
    /// single script's failure (unreadable file, store rejection) does not
    /// prevent loading the rest.
    pub fn load_all(&self, store: &dyn StoreConnection) {
        if let Err(err) = store.ping() {
            warn!(%err, "store not responding, skipping script loading");
            return;
        }
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                error!(dir = %self.dir.display(), %err, "cannot read script directory");
                return;
            }
        };
        let mut loaded = 0usize;
        for entry in entries.filter_map(Result::ok) {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("lua") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            let source = match fs::read_to_string(&path) {
                Ok(source) => source,
                Err(err) => {
                    error!(script = name, %err, "cannot read script source");
                    continue;
                }
            };
            match store.script_load(&source) {
                Ok(handle) => {
                    info!(script = name, handle = %handle, "loaded store script");
                    self.handles.write().insert(name.to_string(), handle);
                    loaded += 1;
                }
                Err(err) => {
                    error!(script = name, %err, "failed to register script with store");
                }
            }
        }
        info!(loaded, "script loading complete");
    }

    /// Names with a cached handle, sorted, for inspection.
    pub fn loaded(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handles.read().keys().cloned().collect();
        names.sort();
        names
    }

    pub fn handle_for(&self, name: &str) -> Result<String, CardexError> {
        self.handles
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| CardexError::ScriptNotRegistered {
                name: name.to_string(),
            })
    }

    /// Invokes a script through its cached handle.
    ///
    /// When the store reports the handle as unknown (it purged its script
    /// cache), all scripts are reloaded and the call retried exactly once;
    /// a second miss propagates. Every other failure propagates unchanged.
    pub fn execute(
        &self,
        store: &dyn StoreConnection,
        name: &str,
        keys: &[&str],
        args: &[&str],
    ) -> Result<StoreReply, CardexError> {
        let mut reloaded = false;
        loop {
            let handle = self.handle_for(name)?;
            match store.evalsha(&handle, keys, args) {
                Err(StoreError::UnknownScript) if !reloaded => {
                    warn!(script = name, "store dropped its script cache, reloading");
                    self.load_all(store);
                    reloaded = true;
                }
                other => return other.map_err(CardexError::from),
            }
        }
    }
}

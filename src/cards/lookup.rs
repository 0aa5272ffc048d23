//! Read-only finders over the secondary indexes. Each resolves a list of
//! identifiers, then hydrates every match through the record store.

use crate::card::Card;
use crate::cards::store::CardStore;
use crate::error::CardexError;
use crate::ident::CardId;
use crate::keys::normalize_illustrator;
use crate::scripts::{names, ScriptRegistry};
use crate::store::{StoreConnection, StoreReply};
use tracing::{debug, error, warn};

/// Stateless like [`CardStore`]; construct per call.
pub struct CardFinder<'a> {
    scripts: &'a ScriptRegistry,
    store: &'a dyn StoreConnection,
}

impl<'a> CardFinder<'a> {
    pub fn new(scripts: &'a ScriptRegistry, store: &'a dyn StoreConnection) -> Self {
        Self { scripts, store }
    }

    pub fn by_pokedex_number(&self, pokedex_number: &str) -> Result<Vec<Card>, CardexError> {
        let reply = self.scripts.execute(
            self.store,
            names::FIND_CARDS_BY_POKEMON,
            &[pokedex_number],
            &[],
        )?;
        self.hydrate(reply)
    }

    pub fn by_set_id(&self, set_id: &str) -> Result<Vec<Card>, CardexError> {
        let reply =
            self.scripts
                .execute(self.store, names::FIND_CARDS_BY_SET, &[set_id], &[])?;
        self.hydrate(reply)
    }

    /// Applies the same normalization the index writer uses before
    /// querying. An empty normalized name short-circuits to an empty
    /// result without touching the store.
    pub fn by_illustrator(&self, name: &str) -> Result<Vec<Card>, CardexError> {
        let normalized = normalize_illustrator(name);
        if normalized.is_empty() {
            warn!(input = name, "illustrator name normalizes to nothing");
            return Ok(Vec::new());
        }
        let reply = self.scripts.execute(
            self.store,
            names::FIND_CARDS_BY_ILLUSTRATOR,
            &[&normalized],
            &[],
        )?;
        self.hydrate(reply)
    }

    /// Index membership is best-effort: members that no longer parse or
    /// resolve to a record are dropped rather than failing the lookup.
    /// Store-level failures during hydration still propagate.
    fn hydrate(&self, reply: StoreReply) -> Result<Vec<Card>, CardexError> {
        let ids = match reply {
            StoreReply::Values(ids) => ids,
            StoreReply::Nil => Vec::new(),
            StoreReply::Text(_) => {
                error!("index lookup returned an unexpected scalar reply");
                Vec::new()
            }
        };
        let records = CardStore::new(self.scripts, self.store);
        let mut cards = Vec::with_capacity(ids.len());
        for raw in ids {
            let Some(id) = CardId::parse(&raw) else {
                warn!(identifier = %raw, "dropping malformed identifier from index result");
                continue;
            };
            match records.find(&id)? {
                Some(card) => cards.push(card),
                None => debug!(card = %id, "index member no longer resolves to a record"),
            }
        }
        Ok(cards)
    }
}

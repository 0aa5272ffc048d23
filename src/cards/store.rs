//! Single-record create, read, and upsert. Each operation is one atomic
//! script invocation, so the record body and its index memberships change
//! together from the caller's point of view.

use crate::card::Card;
use crate::error::CardexError;
use crate::ident::CardId;
use crate::scripts::{names, ScriptRegistry};
use crate::store::{StoreConnection, StoreReply};
use std::collections::BTreeMap;
use tracing::error;

const OK: &str = "OK";

/// Outcome of a mutation the store executed: either it acknowledged the
/// write, or it reported a rejection the caller can inspect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    Applied,
    Rejected(String),
}

impl WriteStatus {
    pub fn is_applied(&self) -> bool {
        matches!(self, WriteStatus::Applied)
    }

    pub fn rejection(&self) -> Option<&str> {
        match self {
            WriteStatus::Rejected(detail) => Some(detail),
            WriteStatus::Applied => None,
        }
    }
}

/// A saved-or-rejected card. The constructed card is returned either way,
/// so a caller can tell "constructed but unsaved" from "saved".
#[derive(Debug, Clone, PartialEq)]
pub struct SaveResult {
    pub card: Card,
    pub status: WriteStatus,
}

/// Stateless facade over the script registry and store connection; cheap
/// to construct per call.
pub struct CardStore<'a> {
    scripts: &'a ScriptRegistry,
    store: &'a dyn StoreConnection,
}

impl<'a> CardStore<'a> {
    pub fn new(scripts: &'a ScriptRegistry, store: &'a dyn StoreConnection) -> Self {
        Self { scripts, store }
    }

    /// `None` is a clean miss. A stored payload that cannot be decoded is
    /// logged and also surfaced as `None`.
    pub fn find(&self, id: &CardId) -> Result<Option<Card>, CardexError> {
        let raw_id = id.to_string();
        let reply = self
            .scripts
            .execute(self.store, names::GET_CARD, &[&raw_id], &[])?;
        match reply {
            StoreReply::Nil => Ok(None),
            StoreReply::Text(raw) => {
                match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                    Ok(fields) => Ok(Some(Card::from_payload(id.clone(), &fields))),
                    Err(err) => {
                        error!(card = %id, %err, "stored card payload is not decodable");
                        Ok(None)
                    }
                }
            }
            StoreReply::Values(_) => {
                error!(card = %id, "stored card payload has an unexpected shape");
                Ok(None)
            }
        }
    }

    /// Upserts a card. An explicit identifier wins; otherwise one is
    /// synthesized from the four component fields.
    pub fn create(&self, card: Card) -> Result<SaveResult, CardexError> {
        let id = match &card.id {
            Some(id) => id.clone(),
            None => card
                .derive_id()
                .ok_or(CardexError::MissingIdentifierComponents)?,
        };
        self.save(id, card)
    }

    /// Upserts under an explicit identifier. There is no separate update
    /// script: saving an existing identifier overwrites its payload, and
    /// index memberships are re-registered additively (stale memberships
    /// are never pruned; see the crate docs).
    pub fn update(&self, id: &CardId, card: Card) -> Result<SaveResult, CardexError> {
        self.save(id.clone(), card)
    }

    fn save(&self, id: CardId, mut card: Card) -> Result<SaveResult, CardexError> {
        card.id = Some(id.clone());
        card.backfill_from_id();
        let payload = serde_json::to_string(&card.to_payload())
            .map_err(|err| CardexError::Encode(err.to_string()))?;
        let raw_id = id.to_string();
        let reply = self
            .scripts
            .execute(self.store, names::ADD_CARD, &[&raw_id], &[&payload])?;
        let status = match &reply {
            StoreReply::Text(text) if text.as_str() == OK => WriteStatus::Applied,
            other => {
                let detail = other.summary();
                error!(card = %id, reply = %detail, "store rejected card save");
                WriteStatus::Rejected(format!("store rejected save: {detail}"))
            }
        };
        Ok(SaveResult { card, status })
    }

    /// Atomically updates the price and its timestamp through a dedicated
    /// script, and mirrors the new values onto the card on success. A card
    /// without an identifier is rejected without contacting the store.
    pub fn update_price(
        &self,
        card: &mut Card,
        price: f64,
        timestamp: i64,
    ) -> Result<WriteStatus, CardexError> {
        let Some(id) = card.id.clone() else {
            return Ok(WriteStatus::Rejected("card has no identifier".to_string()));
        };
        let raw_id = id.to_string();
        let price_arg = price.to_string();
        let timestamp_arg = timestamp.to_string();
        let reply = self.scripts.execute(
            self.store,
            names::UPDATE_CARD_PRICE,
            &[&raw_id],
            &[&price_arg, &timestamp_arg],
        )?;
        match &reply {
            StoreReply::Text(text) if text.as_str() == OK => {
                card.approximate_price_usd = Some(price);
                card.last_price_update_timestamp = Some(timestamp);
                Ok(WriteStatus::Applied)
            }
            other => {
                let detail = other.summary();
                error!(card = %id, reply = %detail, "store rejected price update");
                Ok(WriteStatus::Rejected(format!(
                    "store rejected price update: {detail}"
                )))
            }
        }
    }
}

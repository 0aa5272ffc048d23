use crate::ident::CardId;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One collectible-card record.
///
/// The store persists every field as text; the typed fields here are
/// re-interpreted on read and rendered back to text on write, so the store
/// only ever sees strings. Missing or unparsable stored values surface as
/// absent fields, never as errors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Card {
    /// Addressing key of the record. A card without an identifier cannot
    /// be persisted.
    pub id: Option<CardId>,
    pub pokemon_species_name: String,
    pub card_name: String,
    /// Zero-padded by convention, e.g. "025".
    pub national_pokedex_number: String,
    pub original_set_id: String,
    pub set_name: String,
    pub series_name: String,
    pub release_date: Option<NaiveDate>,
    pub card_number_in_set: String,
    pub rarity: String,
    pub card_type: String,
    /// Comma-separated type tags, e.g. "Grass, Psychic".
    pub pokemon_types: String,
    pub hp: Option<i64>,
    pub illustrator_name: String,
    pub image_url_small: String,
    pub image_url_large: String,
    pub approximate_price_usd: Option<f64>,
    pub last_price_update_timestamp: Option<i64>,
    pub notes: String,
    pub set_release_number: String,
    pub variant_code: String,
    pub frame_code: String,
}

impl Card {
    /// Renders every field to text for the upsert payload. The identifier
    /// is the addressed key, not a payload field, and is excluded.
    pub fn to_payload(&self) -> BTreeMap<String, String> {
        let mut fields = BTreeMap::new();
        fields.insert(
            "pokemon_species_name".to_string(),
            self.pokemon_species_name.clone(),
        );
        fields.insert("card_name".to_string(), self.card_name.clone());
        fields.insert(
            "national_pokedex_number".to_string(),
            self.national_pokedex_number.clone(),
        );
        fields.insert("original_set_id".to_string(), self.original_set_id.clone());
        fields.insert("set_name".to_string(), self.set_name.clone());
        fields.insert("series_name".to_string(), self.series_name.clone());
        fields.insert(
            "release_date".to_string(),
            self.release_date.map(|d| d.to_string()).unwrap_or_default(),
        );
        fields.insert(
            "card_number_in_set".to_string(),
            self.card_number_in_set.clone(),
        );
        fields.insert("rarity".to_string(), self.rarity.clone());
        fields.insert("card_type".to_string(), self.card_type.clone());
        fields.insert("pokemon_types".to_string(), self.pokemon_types.clone());
        fields.insert(
            "hp".to_string(),
            self.hp.map(|v| v.to_string()).unwrap_or_default(),
        );
        fields.insert(
            "illustrator_name".to_string(),
            self.illustrator_name.clone(),
        );
        fields.insert("image_url_small".to_string(), self.image_url_small.clone());
        fields.insert("image_url_large".to_string(), self.image_url_large.clone());
        fields.insert(
            "approximate_price_usd".to_string(),
            self.approximate_price_usd
                .map(|v| v.to_string())
                .unwrap_or_default(),
        );
        fields.insert(
            "last_price_update_timestamp".to_string(),
            self.last_price_update_timestamp
                .map(|v| v.to_string())
                .unwrap_or_default(),
        );
        fields.insert("notes".to_string(), self.notes.clone());
        fields.insert(
            "set_release_number".to_string(),
            self.set_release_number.clone(),
        );
        fields.insert("variant_code".to_string(), self.variant_code.clone());
        fields.insert("frame_code".to_string(), self.frame_code.clone());
        fields
    }

    /// Rebuilds a card from the stored text payload.
    pub fn from_payload(id: CardId, fields: &BTreeMap<String, String>) -> Self {
        let text = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self {
            id: Some(id),
            pokemon_species_name: text("pokemon_species_name"),
            card_name: text("card_name"),
            national_pokedex_number: text("national_pokedex_number"),
            original_set_id: text("original_set_id"),
            set_name: text("set_name"),
            series_name: text("series_name"),
            release_date: parse_date(fields.get("release_date")),
            card_number_in_set: text("card_number_in_set"),
            rarity: text("rarity"),
            card_type: text("card_type"),
            pokemon_types: text("pokemon_types"),
            hp: parse_i64(fields.get("hp")),
            illustrator_name: text("illustrator_name"),
            image_url_small: text("image_url_small"),
            image_url_large: text("image_url_large"),
            approximate_price_usd: parse_f64(fields.get("approximate_price_usd")),
            last_price_update_timestamp: parse_i64(fields.get("last_price_update_timestamp")),
            notes: text("notes"),
            set_release_number: text("set_release_number"),
            variant_code: text("variant_code"),
            frame_code: text("frame_code"),
        }
    }

    /// `Some` when all four identifier component fields are present.
    pub fn derive_id(&self) -> Option<CardId> {
        if self.set_release_number.is_empty()
            || self.national_pokedex_number.is_empty()
            || self.variant_code.is_empty()
            || self.frame_code.is_empty()
        {
            return None;
        }
        Some(CardId::new(
            self.set_release_number.clone(),
            self.national_pokedex_number.clone(),
            &self.variant_code,
            &self.frame_code,
        ))
    }

    /// Fills empty component fields from the identifier so the persisted
    /// payload and the addressed key never disagree.
    pub fn backfill_from_id(&mut self) {
        let Some(id) = self.id.clone() else {
            return;
        };
        if self.set_release_number.is_empty() {
            self.set_release_number = id.release_number().to_string();
        }
        if self.national_pokedex_number.is_empty() {
            self.national_pokedex_number = id.catalog_number().to_string();
        }
        if self.variant_code.is_empty() {
            self.variant_code = id.variant_code().to_string();
        }
        if self.frame_code.is_empty() {
            self.frame_code = id.frame_code().to_string();
        }
    }
}

fn parse_i64(raw: Option<&String>) -> Option<i64> {
    raw.and_then(|value| value.trim().parse().ok())
}

fn parse_f64(raw: Option<&String>) -> Option<f64> {
    raw.and_then(|value| value.trim().parse().ok())
}

fn parse_date(raw: Option<&String>) -> Option<NaiveDate> {
    raw.and_then(|value| value.trim().parse().ok())
}

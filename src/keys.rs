//! Store key naming and index-key derivation.

pub const CARD_KEY_PREFIX: &str = "card:";
pub const POKEMON_INDEX_PREFIX: &str = "idx:pokemon_cards:";
pub const SET_INDEX_PREFIX: &str = "idx:set_cards:";
pub const ILLUSTRATOR_INDEX_PREFIX: &str = "idx:illustrator_cards:";

pub fn card_key(id: &str) -> String {
    format!("{CARD_KEY_PREFIX}{id}")
}

pub fn pokemon_index_key(pokedex_number: &str) -> String {
    format!("{POKEMON_INDEX_PREFIX}{pokedex_number}")
}

pub fn set_index_key(set_id: &str) -> String {
    format!("{SET_INDEX_PREFIX}{set_id}")
}

pub fn illustrator_index_key(normalized_name: &str) -> String {
    format!("{ILLUSTRATOR_INDEX_PREFIX}{normalized_name}")
}

/// Lower-cases, collapses each whitespace run to a single `_`, and strips
/// everything outside `[a-z0-9_]`. Must stay in lockstep with the
/// normalization in `add_card.lua`. An empty result means the illustrator
/// index is skipped.
pub fn normalize_illustrator(name: &str) -> String {
    let lowered = name.to_lowercase();
    let mut out = String::with_capacity(lowered.len());
    let mut in_whitespace_run = false;
    for ch in lowered.chars() {
        if ch.is_whitespace() {
            if !in_whitespace_run {
                out.push('_');
                in_whitespace_run = true;
            }
            continue;
        }
        in_whitespace_run = false;
        if ch.is_ascii_alphanumeric() || ch == '_' {
            out.push(ch);
        }
    }
    out
}

//! In-process emulation of the store contract, for tests and local
//! development without a running store.
//!
//! Registered card scripts are interpreted natively against in-memory
//! hashes and sets; a script is matched by the name declared in its
//! leading `--` comment and its handle is the SHA-256 of the source, so
//! identical content always yields the same handle. Fault-injection knobs
//! cover the failure modes the script registry has to recover from.

use crate::keys;
use crate::store::{StoreConnection, StoreError, StoreReply};
use parking_lot::Mutex;
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScriptBehavior {
    GetCard,
    AddCard,
    UpdateCardPrice,
    FindByPokemon,
    FindBySet,
    FindByIllustrator,
}

fn behavior_for(source: &str) -> Option<ScriptBehavior> {
    let first = source.lines().next()?.trim();
    let name = first.strip_prefix("--")?.trim();
    let name = name.split([':', ' ']).next()?;
    match name {
        "get_card" => Some(ScriptBehavior::GetCard),
        "add_card" => Some(ScriptBehavior::AddCard),
        "update_card_price" => Some(ScriptBehavior::UpdateCardPrice),
        "find_cards_by_pokemon" => Some(ScriptBehavior::FindByPokemon),
        "find_cards_by_set" => Some(ScriptBehavior::FindBySet),
        "find_cards_by_illustrator" => Some(ScriptBehavior::FindByIllustrator),
        _ => None,
    }
}

#[derive(Default)]
struct MemoryState {
    strings: HashMap<String, String>,
    hashes: HashMap<String, BTreeMap<String, String>>,
    sets: HashMap<String, BTreeSet<String>>,
    scripts: HashMap<String, ScriptBehavior>,
    ping_fails: bool,
    scripts_poisoned: bool,
    rejected_source_marker: Option<String>,
    evalsha_calls: usize,
    script_loads: usize,
}

/// Cloning shares the underlying state, so a test can keep a handle on
/// the store after boxing a clone into an instance.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates the store forgetting every registered script, as after a
    /// restart or cache flush.
    pub fn flush_scripts(&self) {
        self.state.lock().scripts.clear();
    }

    /// While set, every script invocation reports an unknown handle even
    /// when the script is registered. Exercises the bounded retry.
    pub fn poison_scripts(&self, poisoned: bool) {
        self.state.lock().scripts_poisoned = poisoned;
    }

    pub fn fail_ping(&self, fail: bool) {
        self.state.lock().ping_fails = fail;
    }

    /// Registration of any source containing `marker` fails until cleared
    /// with `None`.
    pub fn reject_sources_containing(&self, marker: Option<&str>) {
        self.state.lock().rejected_source_marker = marker.map(str::to_string);
    }

    pub fn evalsha_calls(&self) -> usize {
        self.state.lock().evalsha_calls
    }

    pub fn script_loads(&self) -> usize {
        self.state.lock().script_loads
    }

    /// Members of an index set, for assertions on index maintenance.
    pub fn set_members(&self, key: &str) -> Vec<String> {
        self.state
            .lock()
            .sets
            .get(key)
            .map(|members| members.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Adds a raw member to a set, bypassing the scripts. Lets tests plant
    /// stale or malformed index entries.
    pub fn insert_set_member(&self, key: &str, member: &str) {
        self.state
            .lock()
            .sets
            .entry(key.to_string())
            .or_default()
            .insert(member.to_string());
    }
}

impl StoreConnection for MemoryStore {
    fn ping(&self) -> Result<(), StoreError> {
        if self.state.lock().ping_fails {
            return Err(StoreError::Unavailable("ping failed".to_string()));
        }
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.state.lock().strings.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.state
            .lock()
            .strings
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn script_load(&self, source: &str) -> Result<String, StoreError> {
        let mut state = self.state.lock();
        state.script_loads += 1;
        if let Some(marker) = &state.rejected_source_marker {
            if source.contains(marker.as_str()) {
                return Err(StoreError::Command("script rejected".to_string()));
            }
        }
        let behavior = behavior_for(source)
            .ok_or_else(|| StoreError::Command("unrecognized script source".to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(source.as_bytes());
        let handle = hex::encode(hasher.finalize());
        state.scripts.insert(handle.clone(), behavior);
        Ok(handle)
    }

    fn evalsha(
        &self,
        handle: &str,
        keys: &[&str],
        args: &[&str],
    ) -> Result<StoreReply, StoreError> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        state.evalsha_calls += 1;
        if state.scripts_poisoned {
            return Err(StoreError::UnknownScript);
        }
        let behavior = *state.scripts.get(handle).ok_or(StoreError::UnknownScript)?;
        match behavior {
            ScriptBehavior::GetCard => get_card(state, keys),
            ScriptBehavior::AddCard => add_card(state, keys, args),
            ScriptBehavior::UpdateCardPrice => update_card_price(state, keys, args),
            ScriptBehavior::FindByPokemon => find_members(state, keys, keys::POKEMON_INDEX_PREFIX),
            ScriptBehavior::FindBySet => find_members(state, keys, keys::SET_INDEX_PREFIX),
            ScriptBehavior::FindByIllustrator => {
                find_members(state, keys, keys::ILLUSTRATOR_INDEX_PREFIX)
            }
        }
    }
}

fn single_key<'a>(keys: &[&'a str]) -> Result<&'a str, StoreError> {
    match keys {
        [key] => Ok(key),
        _ => Err(StoreError::Protocol(format!(
            "expected exactly one key, got {}",
            keys.len()
        ))),
    }
}

fn get_card(state: &MemoryState, script_keys: &[&str]) -> Result<StoreReply, StoreError> {
    let id = single_key(script_keys)?;
    match state.hashes.get(&keys::card_key(id)) {
        Some(fields) => {
            let json = serde_json::to_string(fields)
                .map_err(|err| StoreError::Protocol(err.to_string()))?;
            Ok(StoreReply::Text(json))
        }
        None => Ok(StoreReply::Nil),
    }
}

// Mirrors add_card.lua: every payload field is written into the record
// hash and the identifier is registered in the three index sets. Index
// membership is additive; stale members are never removed here.
fn add_card(
    state: &mut MemoryState,
    script_keys: &[&str],
    args: &[&str],
) -> Result<StoreReply, StoreError> {
    let id = single_key(script_keys)?;
    let Some(payload) = args.first() else {
        return Err(StoreError::Protocol(
            "add_card expects a payload argument".to_string(),
        ));
    };
    let fields: BTreeMap<String, String> = match serde_json::from_str(payload) {
        Ok(fields) => fields,
        Err(_) => return Ok(StoreReply::Text("ERR_BAD_PAYLOAD".to_string())),
    };
    let record = state.hashes.entry(keys::card_key(id)).or_default();
    for (field, value) in &fields {
        record.insert(field.clone(), value.clone());
    }
    if let Some(dex) = fields
        .get("national_pokedex_number")
        .filter(|value| !value.is_empty())
    {
        state
            .sets
            .entry(keys::pokemon_index_key(dex))
            .or_default()
            .insert(id.to_string());
    }
    if let Some(set_id) = fields
        .get("original_set_id")
        .filter(|value| !value.is_empty())
    {
        state
            .sets
            .entry(keys::set_index_key(set_id))
            .or_default()
            .insert(id.to_string());
    }
    if let Some(illustrator) = fields.get("illustrator_name") {
        let normalized = keys::normalize_illustrator(illustrator);
        if !normalized.is_empty() {
            state
                .sets
                .entry(keys::illustrator_index_key(&normalized))
                .or_default()
                .insert(id.to_string());
        }
    }
    Ok(StoreReply::Text("OK".to_string()))
}

fn update_card_price(
    state: &mut MemoryState,
    script_keys: &[&str],
    args: &[&str],
) -> Result<StoreReply, StoreError> {
    let id = single_key(script_keys)?;
    let [price, timestamp] = args else {
        return Err(StoreError::Protocol(
            "update_card_price expects price and timestamp arguments".to_string(),
        ));
    };
    match state.hashes.get_mut(&keys::card_key(id)) {
        Some(record) => {
            record.insert("approximate_price_usd".to_string(), price.to_string());
            record.insert(
                "last_price_update_timestamp".to_string(),
                timestamp.to_string(),
            );
            Ok(StoreReply::Text("OK".to_string()))
        }
        None => Ok(StoreReply::Text("ERR_NOT_FOUND".to_string())),
    }
}

fn find_members(
    state: &MemoryState,
    script_keys: &[&str],
    prefix: &str,
) -> Result<StoreReply, StoreError> {
    let lookup = single_key(script_keys)?;
    let members = state
        .sets
        .get(&format!("{prefix}{lookup}"))
        .map(|members| members.iter().cloned().collect())
        .unwrap_or_default();
    Ok(StoreReply::Values(members))
}

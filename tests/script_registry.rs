use cardex::scripts::names;
use cardex::{
    Card, CardId, Cardex, CardexConfig, CardexError, MemoryStore, ScriptRegistry, StoreError,
};
use std::fs;
use std::path::{Path, PathBuf};

fn script_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("lua")
}

fn open_memory() -> (Cardex, MemoryStore) {
    let store = MemoryStore::new();
    let config = CardexConfig::default().with_script_dir(script_dir());
    let cardex = Cardex::with_store(&config, Box::new(store.clone()));
    (cardex, store)
}

fn pikachu() -> Card {
    Card {
        id: Some(CardId::new("1", "025", "N", "S")),
        card_name: "Pikachu Base Set".into(),
        national_pokedex_number: "025".into(),
        original_set_id: "base1".into(),
        illustrator_name: "Mitsuhiro Arita".into(),
        ..Card::default()
    }
}

#[test]
fn load_all_registers_the_whole_catalog() {
    let (cardex, _store) = open_memory();
    let mut expected: Vec<String> = names::REQUIRED.iter().map(|name| name.to_string()).collect();
    expected.sort();
    assert_eq!(cardex.scripts().loaded(), expected);
    for name in names::REQUIRED {
        cardex.scripts().handle_for(name).expect("handle cached");
    }
}

#[test]
fn unknown_script_name_is_a_registry_error() {
    let (cardex, _store) = open_memory();
    let err = cardex.scripts().handle_for("drop_card").expect_err("unknown");
    assert!(matches!(
        err,
        CardexError::ScriptNotRegistered { ref name } if name.as_str() == "drop_card"
    ));
}

#[test]
fn unreachable_store_leaves_the_registry_empty_without_failing() {
    let store = MemoryStore::new();
    store.fail_ping(true);
    let config = CardexConfig::default().with_script_dir(script_dir());
    let cardex = Cardex::with_store(&config, Box::new(store.clone()));
    assert!(cardex.scripts().loaded().is_empty());

    let id = CardId::parse("1-025-N-S").expect("identifier");
    let err = cardex.cards().find(&id).expect_err("no scripts");
    assert!(matches!(err, CardexError::ScriptNotRegistered { .. }));

    // the store comes back and an explicit reload recovers
    store.fail_ping(false);
    cardex.reload_scripts();
    assert_eq!(cardex.scripts().loaded().len(), names::REQUIRED.len());
}

#[test]
fn one_rejected_script_does_not_block_the_others() {
    let store = MemoryStore::new();
    store.reject_sources_containing(Some("-- add_card:"));
    let config = CardexConfig::default().with_script_dir(script_dir());
    let cardex = Cardex::with_store(&config, Box::new(store.clone()));

    let loaded = cardex.scripts().loaded();
    assert_eq!(loaded.len(), names::REQUIRED.len() - 1);
    assert!(!loaded.contains(&names::ADD_CARD.to_string()));

    let err = cardex.cards().create(pikachu()).expect_err("add_card missing");
    assert!(matches!(
        err,
        CardexError::ScriptNotRegistered { ref name } if name.as_str() == names::ADD_CARD
    ));

    // reads never needed the rejected script
    let id = CardId::parse("1-025-N-S").expect("identifier");
    assert_eq!(cardex.cards().find(&id).expect("find"), None);
}

#[test]
fn script_cache_flush_triggers_exactly_one_reload_and_retry() {
    let (cardex, store) = open_memory();
    cardex.cards().create(pikachu()).expect("create");

    store.flush_scripts();
    let loads_before = store.script_loads();
    let calls_before = store.evalsha_calls();

    let id = CardId::parse("1-025-N-S").expect("identifier");
    let found = cardex.cards().find(&id).expect("find").expect("healed");
    assert_eq!(found.card_name, "Pikachu Base Set");

    // one failed invocation, one reload pass, one successful retry
    assert_eq!(store.evalsha_calls() - calls_before, 2);
    assert_eq!(store.script_loads() - loads_before, names::REQUIRED.len());
}

#[test]
fn a_second_consecutive_miss_propagates() {
    let (cardex, store) = open_memory();
    cardex.cards().create(pikachu()).expect("create");

    store.poison_scripts(true);
    let loads_before = store.script_loads();
    let calls_before = store.evalsha_calls();

    let id = CardId::parse("1-025-N-S").expect("identifier");
    let err = cardex.cards().find(&id).expect_err("retry exhausted");
    assert!(matches!(
        err,
        CardexError::Store(StoreError::UnknownScript)
    ));

    // exactly one retry, exactly one reload pass
    assert_eq!(store.evalsha_calls() - calls_before, 2);
    assert_eq!(store.script_loads() - loads_before, names::REQUIRED.len());
}

#[test]
fn registry_loads_from_any_directory_and_ignores_non_scripts() {
    let dir = tempfile::tempdir().expect("tempdir");
    fs::write(
        dir.path().join("get_card.lua"),
        "-- get_card: fixture\nreturn false\n",
    )
    .expect("write script");
    fs::write(dir.path().join("notes.txt"), "not a script").expect("write note");

    let store = MemoryStore::new();
    let registry = ScriptRegistry::new(dir.path());
    registry.load_all(&store);

    assert_eq!(registry.loaded(), vec!["get_card".to_string()]);
    assert_eq!(store.script_loads(), 1);
}

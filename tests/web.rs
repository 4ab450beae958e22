//! Browser-only checks for the localStorage backend.
//! Run with `wasm-pack test --headless --firefox`.

#![cfg(target_arch = "wasm32")]

use guild_match::match_state::storage::{BrowserStorage, KeyValueStore};
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

#[wasm_bindgen_test]
fn local_storage_round_trip() {
    let mut store = BrowserStorage::local().expect("localStorage available");
    store.set("guildMatchTest", "{\"logs\":[]}").unwrap();
    assert_eq!(
        store.get("guildMatchTest").unwrap().as_deref(),
        Some("{\"logs\":[]}")
    );
    store.clear().unwrap();
    assert_eq!(store.get("guildMatchTest").unwrap(), None);
}

#[wasm_bindgen_test]
fn request_bridge_persists_to_local_storage() {
    let mut store = BrowserStorage::local().expect("localStorage available");
    store.clear().unwrap();

    let bundle = r#"{"members":{},"positions":{"tank":{"name":"Tank","position":1}},"guilds":{"guilds":[]},"guildsMeta":{}}"#;
    assert_eq!(guild_match::handle_request("POST", "/api/session/load", "", bundle), "ok");
    let saved = store.get("guildMatchData").unwrap().expect("snapshot saved");
    assert!(saved.contains("\"Tank\""));
    store.clear().unwrap();
}

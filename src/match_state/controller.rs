//! Session controller.
//!
//! Holds the live [`Session`] and its [`KeyValueStore`] in `thread_local!`
//! cells for the lifetime of the WASM instance. Route handlers reach the
//! session only through this module; every mutation goes through
//! [`with_session_mut`], which writes the snapshot back before returning.

use chrono::{NaiveDate, NaiveDateTime};
use std::cell::RefCell;

use crate::config::with_config;
use crate::error::MatchError;
use crate::match_state::clock;
use crate::match_state::reference::ReferenceData;
use crate::match_state::session::{Session, Snapshot};
use crate::match_state::storage::{default_store, KeyValueStore};

thread_local! {
    static SESSION: RefCell<Session> = RefCell::new(Session::default());
    static STORE: RefCell<Box<dyn KeyValueStore>> = RefCell::new(default_store());
}

/// Result of trying to resume a previous session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Startup {
    Restored,
    /// No usable snapshot; the bridge must post the reference bundle.
    NeedsReference,
}

impl Startup {
    pub fn as_str(self) -> &'static str {
        match self {
            Startup::Restored => "restored",
            Startup::NeedsReference => "needs-reference",
        }
    }
}

/// Read access to the session.
pub fn with_session<F, R>(f: F) -> R
where
    F: FnOnce(&Session) -> R,
{
    SESSION.with(|s| f(&s.borrow()))
}

/// Mutate the session, then persist the new snapshot.
pub fn with_session_mut<F, R>(f: F) -> R
where
    F: FnOnce(&mut Session) -> R,
{
    let result = SESSION.with(|s| f(&mut s.borrow_mut()));
    persist();
    result
}

fn store_get(key: &str) -> Result<Option<String>, MatchError> {
    STORE.with(|s| s.borrow().get(key))
}

fn store_set(key: &str, value: &str) {
    let result = STORE.with(|s| s.borrow_mut().set(key, value));
    if let Err(e) = result {
        log::error!("failed to write `{}`: {}", key, e);
    }
}

/// Write the current snapshot under the configured key.
pub fn persist() {
    let json = SESSION.with(|s| Snapshot::from(&*s.borrow()).to_json());
    match json {
        Ok(json) => {
            let key = with_config(|c| c.storage_keys.snapshot.clone());
            store_set(&key, &json);
        }
        Err(e) => log::error!("failed to serialize session: {}", e),
    }
}

/// Resume the stored session if there is a readable one. The startup dialog
/// is shown unless it was already dismissed today.
pub fn startup(today: NaiveDate) -> Startup {
    let keys = with_config(|c| c.storage_keys.clone());
    let saved = match store_get(&keys.snapshot) {
        Ok(saved) => saved,
        Err(e) => {
            log::error!("could not read saved session: {}", e);
            None
        }
    };
    let Some(json) = saved else {
        return Startup::NeedsReference;
    };

    let snapshot = match Snapshot::from_json(&json) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            log::warn!("discarding saved session: {}", e);
            return Startup::NeedsReference;
        }
    };

    let closed_on = store_get(&keys.dialog_closed)
        .ok()
        .flatten()
        .and_then(|d| clock::parse_date(&d));
    let mut session = Session::from(snapshot);
    session.show_dialog = closed_on != Some(today);
    SESSION.with(|s| *s.borrow_mut() = session);
    log::info!("restored saved session");
    Startup::Restored
}

/// Start over on freshly fetched reference data. A failed fetch leaves an
/// empty session behind and is reported to the caller.
pub fn load_reference(bundle_json: &str) -> Result<(), MatchError> {
    match ReferenceData::from_bundle_json(bundle_json) {
        Ok(reference) => {
            log::info!(
                "loaded {} members, {} positions, {} guilds",
                reference.members.len(),
                reference.positions.len(),
                reference.guilds.len()
            );
            with_session_mut(|s| *s = Session::new(reference));
            Ok(())
        }
        Err(e) => {
            log::error!("error loading data: {}", e);
            SESSION.with(|s| *s.borrow_mut() = Session::default());
            Err(e)
        }
    }
}

/// Pick both guilds. When that starts a new match the picks and today's
/// date are remembered so the startup dialog stays closed until tomorrow.
pub fn select_guilds(attacker_id: &str, defender_id: &str, now: NaiveDateTime) -> bool {
    let started = with_session_mut(|s| s.select_guilds(attacker_id, defender_id, now));
    if started {
        let keys = with_config(|c| c.storage_keys.clone());
        store_set(&keys.attacker_guild, attacker_id);
        store_set(&keys.defender_guild, defender_id);
        store_set(&keys.dialog_closed, &clock::format_date(now.date()));
    }
    started
}

/// Wipe storage and return to a first-run session.
pub fn reset_all() -> Startup {
    let result = STORE.with(|s| s.borrow_mut().clear());
    if let Err(e) = result {
        log::error!("failed to clear storage: {}", e);
    }
    SESSION.with(|s| *s.borrow_mut() = Session::default());
    log::info!("session reset");
    Startup::NeedsReference
}

/// Replace the session with an imported snapshot.
pub fn import_snapshot(json: &str) -> Result<(), MatchError> {
    let snapshot = Snapshot::from_json(json)?;
    with_session_mut(|s| *s = Session::from(snapshot));
    Ok(())
}

pub fn export_snapshot() -> Result<String, MatchError> {
    with_session(|s| Snapshot::from(s).to_json())
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::match_state::reference::fixtures;
    use crate::match_state::storage::MemoryStore;

    /// Fresh in-memory store and an empty session for the current thread.
    pub fn reset() {
        let store: Box<dyn KeyValueStore> = Box::new(MemoryStore::new());
        STORE.with(|s| *s.borrow_mut() = store);
        SESSION.with(|s| *s.borrow_mut() = Session::default());
    }

    /// Reset, then load the fixture reference data and pick g1 vs 7.
    pub fn reset_with_match(now: NaiveDateTime) {
        reset();
        with_session_mut(|s| *s = Session::new(fixtures::reference()));
        assert!(select_guilds("g1", "7", now));
    }

    pub fn stored(key: &str) -> Option<String> {
        store_get(key).unwrap()
    }

    pub fn put(key: &str, value: &str) {
        store_set(key, value);
    }
}

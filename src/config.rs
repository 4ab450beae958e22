//! Host-supplied configuration: where reference data lives and which storage
//! keys the session uses.
//!
//! JavaScript may call `configure(json)` before starting the session. Any
//! field left out of the JSON keeps its default.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;

use crate::error::MatchError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StorageKeys {
    /// Full session snapshot (JSON).
    pub snapshot: String,
    pub attacker_guild: String,
    pub defender_guild: String,
    /// `M/D/YYYY` date the startup dialog was last dismissed.
    pub dialog_closed: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            snapshot: "guildMatchData".to_string(),
            attacker_guild: "attackerGuild".to_string(),
            defender_guild: "defenderGuild".to_string(),
            dialog_closed: "dialogClosedDate".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Data directory of the game server whose guilds are tracked.
    pub server: String,
    /// Root of the static reference documents, relative to the page.
    pub data_root: String,
    pub storage_keys: StorageKeys,
    pub export_filename: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: "server_345".to_string(),
            data_root: "data".to_string(),
            storage_keys: StorageKeys::default(),
            export_filename: "guild_match_logs.csv".to_string(),
        }
    }
}

/// Relative paths of the four reference documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourcePaths {
    pub members: String,
    pub positions: String,
    pub guilds: String,
    pub guilds_meta: String,
}

impl Config {
    pub fn from_json(json: &str) -> Result<Self, MatchError> {
        serde_json::from_str(json).map_err(MatchError::Config)
    }

    pub fn source_paths(&self) -> SourcePaths {
        let root = self.data_root.trim_end_matches('/');
        SourcePaths {
            members: format!("{}/{}/members_meta.json", root, self.server),
            // Positions are shared across servers.
            positions: format!("{}/positions.json", root),
            guilds: format!("{}/{}/guilds.json", root, self.server),
            guilds_meta: format!("{}/{}/guilds_meta.json", root, self.server),
        }
    }
}

thread_local! {
    static CONFIG: RefCell<Config> = RefCell::new(Config::default());
}

/// Read access to the active configuration.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    CONFIG.with(|c| f(&c.borrow()))
}

/// Replace the active configuration.
pub fn set_config(config: Config) {
    CONFIG.with(|c| *c.borrow_mut() = config);
}

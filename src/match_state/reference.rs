//! Immutable reference data: members, positions, guild rosters and guild
//! metadata.
//!
//! The JavaScript bridge fetches the four documents listed by
//! `Config::source_paths` and posts them back as one bundle. Only the fields
//! this crate reads are typed; everything else on a member or guild record
//! is kept as raw JSON so it survives a persistence round trip.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::error::MatchError;
use crate::match_state::keyed::KeyedMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Member {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A combat role with a fixed number of interchangeable slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub name: String,
    /// Slot count. The field is called `position` in the source data.
    #[serde(rename = "position")]
    pub slots: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GuildInfo {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceData {
    #[serde(default)]
    pub members: KeyedMap<Member>,
    #[serde(default)]
    pub positions: KeyedMap<Position>,
    /// Guild id → metadata.
    #[serde(default)]
    pub guilds_info: KeyedMap<GuildInfo>,
    /// Guild id → roster member ids, in roster order.
    #[serde(default)]
    pub guilds: KeyedMap<Vec<String>>,
}

/// The four documents as posted by the bridge, or the fetch failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceBundle {
    #[serde(default)]
    pub members: Option<Value>,
    #[serde(default)]
    pub positions: Option<Value>,
    #[serde(default)]
    pub guilds: Option<Value>,
    #[serde(default)]
    pub guilds_meta: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GuildsDocument {
    #[serde(default)]
    guilds: Vec<RosterRecord>,
}

#[derive(Debug, Deserialize)]
struct RosterRecord {
    id: Value,
    #[serde(default)]
    members: Vec<Value>,
}

/// Ids show up as both JSON strings and numbers; both become map keys.
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_document<T>(document: &'static str, value: Value) -> Result<T, MatchError>
where
    T: serde::de::DeserializeOwned,
{
    serde_json::from_value(value).map_err(|source| MatchError::Reference { document, source })
}

fn required(document: &'static str, value: Option<Value>) -> Result<Value, MatchError> {
    value.ok_or_else(|| MatchError::ReferenceUnavailable(format!("missing {} document", document)))
}

impl ReferenceData {
    /// Build reference data from an already-fetched bundle. All four documents
    /// must be present; one failed fetch fails the whole load.
    pub fn from_bundle(bundle: ReferenceBundle) -> Result<Self, MatchError> {
        if let Some(err) = bundle.error {
            return Err(MatchError::ReferenceUnavailable(err));
        }
        let members = parse_document("members", required("members", bundle.members)?)?;
        let positions = parse_document("positions", required("positions", bundle.positions)?)?;
        let roster: GuildsDocument = parse_document("guilds", required("guilds", bundle.guilds)?)?;
        let guilds_info =
            parse_document("guildsMeta", required("guildsMeta", bundle.guilds_meta)?)?;

        Ok(Self {
            members,
            positions,
            guilds_info,
            guilds: roster_map(roster),
        })
    }

    /// Parse a bundle posted as JSON text.
    pub fn from_bundle_json(json: &str) -> Result<Self, MatchError> {
        let bundle: ReferenceBundle =
            serde_json::from_str(json).map_err(|source| MatchError::Reference {
                document: "bundle",
                source,
            })?;
        Self::from_bundle(bundle)
    }

    /// Display name of a member, `"Unknown"` when the id is not in the data.
    pub fn member_name(&self, member_id: &str) -> &str {
        match self.members.get(member_id) {
            Some(m) if !m.name.is_empty() => &m.name,
            _ => "Unknown",
        }
    }

    /// Id of the member shown under `name`, looked up in the guild's roster
    /// first and then across all members.
    pub fn find_member(&self, guild_id: &str, name: &str) -> Option<&str> {
        let named = |id: &&String| self.members.get(id).is_some_and(|m| m.name == name);
        self.roster(guild_id)
            .iter()
            .find(named)
            .or_else(|| self.members.iter().map(|(id, _)| id).find(named))
            .map(String::as_str)
    }

    pub fn guild_name(&self, guild_id: &str) -> Option<&str> {
        self.guilds_info
            .get(guild_id)
            .map(|g| g.name.as_str())
            .filter(|n| !n.is_empty())
    }

    /// Roster of a guild; empty for an unknown or unselected guild.
    pub fn roster(&self, guild_id: &str) -> &[String] {
        self.guilds.get(guild_id).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
            && self.positions.is_empty()
            && self.guilds.is_empty()
            && self.guilds_info.is_empty()
    }
}

fn roster_map(doc: GuildsDocument) -> KeyedMap<Vec<String>> {
    doc.guilds
        .into_iter()
        .filter_map(|g| {
            let id = id_string(&g.id)?;
            let members = g.members.iter().filter_map(id_string).collect();
            Some((id, members))
        })
        .collect()
}


#[cfg(test)]
mod tests {
    use super::fixtures;
    use super::*;

    #[test]
    fn guild_array_becomes_roster_map() {
        let data = fixtures::reference();
        assert_eq!(data.roster("g1"), ["m1".to_string(), "m2".to_string()]);
        assert_eq!(data.roster("7"), ["m3".to_string(), "m4".to_string()]);
        assert!(data.roster("missing").is_empty());
        assert!(data.roster("").is_empty());
    }

    #[test]
    fn names_resolve_with_unknown_fallback() {
        let data = fixtures::reference();
        assert_eq!(data.member_name("m1"), "Ayla");
        assert_eq!(data.member_name("nobody"), "Unknown");
        assert_eq!(data.guild_name("7"), Some("Sky Lancers"));
        assert_eq!(data.guild_name("g9"), None);
        assert_eq!(data.find_member("7", "Cato"), Some("m3"));
        assert_eq!(data.find_member("", "Bron"), Some("m2"));
        assert_eq!(data.find_member("g1", "Nobody"), None);
    }

    #[test]
    fn opaque_member_fields_are_kept() {
        let data = fixtures::reference();
        assert_eq!(data.members["m1"].extra["power"], 120);
        let json = serde_json::to_value(&data.members["m1"]).unwrap();
        assert_eq!(json["power"], 120);
        assert_eq!(json["name"], "Ayla");
    }

    #[test]
    fn positions_read_slot_count() {
        let data = fixtures::reference();
        assert_eq!(data.positions["healer"].slots, 2);
        assert_eq!(data.positions["tank"].name, "Tank");
    }

    #[test]
    fn positions_keep_browser_key_order() {
        let json = r#"{
            "members": {"m2": {"name": "Bron"}, "m1": {"name": "Ayla"}},
            "positions": {
                "1": {"name": "Front", "position": 1},
                "2": {"name": "Middle", "position": 1},
                "10": {"name": "Back", "position": 1},
                "scout": {"name": "Scout", "position": 1},
                "archer": {"name": "Archer", "position": 1}
            },
            "guilds": {"guilds": []},
            "guildsMeta": {}
        }"#;
        let data = ReferenceData::from_bundle_json(json).unwrap();
        let names: Vec<_> = data.positions.values().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Front", "Middle", "Back", "Scout", "Archer"]);

        let stored = serde_json::to_string(&data).unwrap();
        assert!(stored.starts_with(r#"{"members":{"m2":{"name":"Bron"},"m1":{"name":"Ayla"}}"#));
    }

    #[test]
    fn failed_fetch_is_reported() {
        let bundle = ReferenceBundle {
            error: Some("404 data/positions.json".to_string()),
            ..fixtures::bundle()
        };
        let err = ReferenceData::from_bundle(bundle).unwrap_err();
        assert!(matches!(err, MatchError::ReferenceUnavailable(_)));
    }

    #[test]
    fn missing_document_fails_whole_load() {
        let bundle = ReferenceBundle {
            guilds_meta: None,
            ..fixtures::bundle()
        };
        assert!(ReferenceData::from_bundle(bundle).is_err());
    }

    #[test]
    fn malformed_positions_names_the_document() {
        let json = r#"{"members":{},"positions":{"x":{"name":"X","position":"two"}},"guilds":{"guilds":[]},"guildsMeta":{}}"#;
        match ReferenceData::from_bundle_json(json) {
            Err(MatchError::Reference { document, .. }) => assert_eq!(document, "positions"),
            other => panic!("unexpected: {:?}", other),
        }
    }
}

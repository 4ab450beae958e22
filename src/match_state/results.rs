//! Battle result table: side → `"{position}-{slot}"` → outcome.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::match_state::side::{Outcome, ResultClass, Side};

pub type SideResults = BTreeMap<String, Outcome>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BattleResultTable {
    #[serde(default, deserialize_with = "known_outcomes")]
    pub attacker: SideResults,
    #[serde(default, deserialize_with = "known_outcomes")]
    pub defender: SideResults,
}

/// Older snapshots may hold the `remove` sentinel or other stray strings
/// where a slot was cleared; those read as "no result".
fn known_outcomes<'de, D>(deserializer: D) -> Result<SideResults, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|(key, value)| {
            let outcome = value.as_str().and_then(Outcome::from_stored)?;
            Some((key, outcome))
        })
        .collect())
}

/// Key of a slot within one side's results.
pub fn result_key(position: &str, slot: u32) -> String {
    format!("{}-{}", position, slot)
}

/// Win/loss tally for one side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub wins: u32,
    pub losses: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub attacker: Tally,
    pub defender: Tally,
}

impl BattleResultTable {
    pub fn side(&self, side: Side) -> &SideResults {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideResults {
        match side {
            Side::Attacker => &mut self.attacker,
            Side::Defender => &mut self.defender,
        }
    }

    pub fn get(&self, side: Side, position: &str, slot: u32) -> Option<Outcome> {
        self.side(side).get(&result_key(position, slot)).copied()
    }

    pub fn set(&mut self, side: Side, position: &str, slot: u32, outcome: Outcome) {
        self.side_mut(side).insert(result_key(position, slot), outcome);
    }

    pub fn remove(&mut self, side: Side, position: &str, slot: u32) -> Option<Outcome> {
        self.side_mut(side).remove(&result_key(position, slot))
    }

    pub fn classify(&self, side: Side, position: &str, slot: u32) -> ResultClass {
        self.get(side, position, slot).into()
    }

    /// Only the attacker's results are counted; the defender's score is the
    /// mirror image.
    pub fn summary(&self) -> MatchSummary {
        let attacker = self.attacker.values().fold(Tally::default(), |mut t, o| {
            match o {
                Outcome::Win => t.wins += 1,
                Outcome::Loss => t.losses += 1,
            }
            t
        });
        MatchSummary {
            attacker,
            defender: Tally {
                wins: attacker.losses,
                losses: attacker.wins,
            },
        }
    }
}

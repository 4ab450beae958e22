//! Assignment table: side → position name → slot number → member id.
//!
//! An empty string marks an unassigned slot. The table is reshaped against
//! the position schema after every restore and reset, because the schema may
//! have grown since the table was last written.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::match_state::reference::Position;
use crate::match_state::side::Side;

/// Position name → slot number → member id (`""` when empty).
pub type SideAssignments = BTreeMap<String, BTreeMap<u32, String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssignmentTable {
    #[serde(default)]
    pub attacker: SideAssignments,
    #[serde(default)]
    pub defender: SideAssignments,
}

impl AssignmentTable {
    pub fn side(&self, side: Side) -> &SideAssignments {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut SideAssignments {
        match side {
            Side::Attacker => &mut self.attacker,
            Side::Defender => &mut self.defender,
        }
    }

    /// Make sure every slot `1..=count` of every position exists on both
    /// sides. Existing values are never touched.
    pub fn ensure_shape<'a, I>(&mut self, positions: I)
    where
        I: IntoIterator<Item = &'a Position> + Clone,
    {
        for side in Side::BOTH {
            let table = self.side_mut(side);
            for position in positions.clone() {
                let slots = table.entry(position.name.clone()).or_default();
                for slot in 1..=position.slots {
                    slots.entry(slot).or_default();
                }
            }
        }
    }

    /// Member id in a slot, `None` when the slot is empty or unknown.
    pub fn occupant(&self, side: Side, position: &str, slot: u32) -> Option<&str> {
        self.side(side)
            .get(position)
            .and_then(|slots| slots.get(&slot))
            .map(String::as_str)
            .filter(|id| !id.is_empty())
    }

    pub fn is_occupied(&self, side: Side, position: &str, slot: u32) -> bool {
        self.occupant(side, position, slot).is_some()
    }

    /// Put a member in a slot, creating the slot if the table has not been
    /// shaped for it yet. Returns the previous occupant.
    pub fn assign(&mut self, side: Side, position: &str, slot: u32, member_id: &str) -> Option<String> {
        let previous = self
            .side_mut(side)
            .entry(position.to_string())
            .or_default()
            .insert(slot, member_id.to_string());
        previous.filter(|id| !id.is_empty())
    }

    /// Whether `member_id` sits in any slot other than the given one.
    pub fn is_occupied_elsewhere(
        &self,
        member_id: &str,
        side: Side,
        position: &str,
        slot: u32,
    ) -> bool {
        if member_id.is_empty() {
            return false;
        }
        self.slots().any(|(s, p, n, id)| {
            id == member_id && !(s == side && p == position && n == slot)
        })
    }

    /// Every (side, position, slot, member id) cell, empty ones included.
    pub fn slots(&self) -> impl Iterator<Item = (Side, &str, u32, &str)> {
        Side::BOTH.into_iter().flat_map(move |side| {
            self.side(side).iter().flat_map(move |(position, slots)| {
                slots
                    .iter()
                    .map(move |(slot, id)| (side, position.as_str(), *slot, id.as_str()))
            })
        })
    }
}

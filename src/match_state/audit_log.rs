//! Audit log of assignment and battle-result changes.
//!
//! The log is an ordered list, appended in causal order and exported as-is.
//! Each assignment or result entry carries a [`LogKey`] naming the thing it
//! describes. Within one calendar day there is at most one live entry per
//! assignment slot, and at most one battle-result entry per member: every
//! change first drops today's entries with the same identity, then appends
//! the replacement.
//!
//! "Today" is always derived from the entry's own timestamp, never from its
//! position in the list.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::match_state::clock;
use crate::match_state::side::{Outcome, Side};

pub const ASSIGN_ACTION: &str = "Assign Member";
pub const RESULT_ACTION_PREFIX: &str = "Battle Result";

/// Identity of the state an entry describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum LogKey {
    Assignment {
        side: Side,
        position: String,
        slot: u32,
    },
    BattleResult {
        side: Side,
        position: String,
        slot: u32,
        member: String,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub action: String,
    pub details: String,
    /// Absent on guild-selection entries, which are never reconciled.
    /// Snapshots written before keys existed get them back from
    /// [`AuditLog::restore_keys`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<LogKey>,
}

impl LogEntry {
    pub fn new(at: NaiveDateTime, action: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            timestamp: clock::format_timestamp(at),
            action: action.into(),
            details: details.into(),
            key: None,
        }
    }

    fn keyed(mut self, key: LogKey) -> Self {
        self.key = Some(key);
        self
    }

    pub fn date(&self) -> Option<NaiveDate> {
        clock::parse_date(&self.timestamp)
    }

    pub fn is_on(&self, day: NaiveDate) -> bool {
        self.date() == Some(day)
    }

    /// Rebuild the identity of a keyless entry from its details text.
    /// `member_id` maps a member's display name on a side back to its id.
    fn key_from_details<F>(&self, member_id: F) -> Option<LogKey>
    where
        F: Fn(Side, &str) -> Option<String>,
    {
        if self.action == ASSIGN_ACTION {
            // "{side} - Position: {position}, Slot: {slot}, Member: {name}"
            let (side, rest) = self.details.split_once(" - ")?;
            let rest = rest.strip_prefix("Position: ")?;
            let (position, rest) = rest.split_once(", Slot: ")?;
            let (slot, _) = rest.split_once(", Member: ")?;
            return Some(LogKey::Assignment {
                side: side.parse().ok()?,
                position: position.to_string(),
                slot: slot.parse().ok()?,
            });
        }
        if self.action.starts_with(RESULT_ACTION_PREFIX) {
            // "{side} - {name} ({position} Slot {slot}) marked as {outcome}"
            let (head, _) = self.details.rsplit_once(" marked as ")?;
            let (who, place) = head.strip_suffix(')')?.rsplit_once(" (")?;
            let (position, slot) = place.rsplit_once(" Slot ")?;
            let (side, name) = who.split_once(" - ")?;
            let side: Side = side.parse().ok()?;
            return Some(LogKey::BattleResult {
                side,
                position: position.to_string(),
                slot: slot.parse().ok()?,
                member: member_id(side, name)?,
            });
        }
        None
    }

    fn is_assignment_of(&self, side: Side, position: &str, slot: u32) -> bool {
        self.action == ASSIGN_ACTION
            && matches!(&self.key, Some(LogKey::Assignment { side: s, position: p, slot: n })
                if *s == side && p == position && *n == slot)
    }

    fn is_result_for_slot(&self, side: Side, position: &str, slot: u32) -> bool {
        self.action.starts_with(RESULT_ACTION_PREFIX)
            && matches!(&self.key, Some(LogKey::BattleResult { side: s, position: p, slot: n, .. })
                if *s == side && p == position && *n == slot)
    }

    fn is_result_for_member(&self, side: Side, member_id: &str) -> bool {
        self.action.starts_with(RESULT_ACTION_PREFIX)
            && matches!(&self.key, Some(LogKey::BattleResult { side: s, member, .. })
                if *s == side && member == member_id)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuditLog {
    entries: Vec<LogEntry>,
}

impl AuditLog {
    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Give keyless assignment and result entries their identity back so
    /// they take part in reconciliation again. Entries whose text does not
    /// parse, or whose member name no longer resolves, stay keyless.
    pub fn restore_keys<F>(&mut self, member_id: F) -> usize
    where
        F: Fn(Side, &str) -> Option<String>,
    {
        let mut restored = 0;
        for entry in self.entries.iter_mut().filter(|e| e.key.is_none()) {
            if let Some(key) = entry.key_from_details(&member_id) {
                entry.key = Some(key);
                restored += 1;
            }
        }
        restored
    }

    /// Drop every entry dated `today` that `matches`, then append `entry` if
    /// given. Returns how many entries were dropped.
    pub fn reconcile<F>(&mut self, today: NaiveDate, matches: F, entry: Option<LogEntry>) -> usize
    where
        F: Fn(&LogEntry) -> bool,
    {
        let before = self.entries.len();
        self.entries.retain(|e| !(e.is_on(today) && matches(e)));
        let removed = before - self.entries.len();
        if let Some(entry) = entry {
            self.entries.push(entry);
        }
        removed
    }

    /// Replace today's assignment entry for a slot. `member_name` is `None`
    /// when the slot was cleared, which leaves no entry for it today.
    pub fn log_assignment(
        &mut self,
        side: Side,
        position: &str,
        slot: u32,
        member_name: Option<&str>,
        now: NaiveDateTime,
    ) {
        let entry = member_name.map(|name| {
            LogEntry::new(
                now,
                ASSIGN_ACTION,
                format!(
                    "{} - Position: {}, Slot: {}, Member: {}",
                    side, position, slot, name
                ),
            )
            .keyed(LogKey::Assignment {
                side,
                position: position.to_string(),
                slot,
            })
        });
        let removed = self.reconcile(
            now.date(),
            |e| e.is_assignment_of(side, position, slot),
            entry,
        );
        log::debug!(
            "assignment log {} {} slot {}: replaced {} entries",
            side,
            position,
            slot,
            removed
        );
    }

    /// Drop today's result entries for a slot that has just been cleared.
    pub fn log_result_removal(&mut self, side: Side, position: &str, slot: u32, now: NaiveDateTime) {
        self.reconcile(now.date(), |e| e.is_result_for_slot(side, position, slot), None);
    }

    /// Replace today's result entry for a member.
    #[allow(clippy::too_many_arguments)]
    pub fn log_result(
        &mut self,
        side: Side,
        position: &str,
        slot: u32,
        member_id: &str,
        member_name: &str,
        outcome: Outcome,
        now: NaiveDateTime,
    ) {
        let entry = LogEntry::new(
            now,
            format!("{} - {}", RESULT_ACTION_PREFIX, outcome),
            format!(
                "{} - {} ({} Slot {}) marked as {}",
                side, member_name, position, slot, outcome
            ),
        )
        .keyed(LogKey::BattleResult {
            side,
            position: position.to_string(),
            slot,
            member: member_id.to_string(),
        });
        self.reconcile(
            now.date(),
            |e| e.is_result_for_member(side, member_id),
            Some(entry),
        );
    }

    /// Record a guild pick. Always appends.
    pub fn log_guild_selection(
        &mut self,
        action: &str,
        details: &str,
        guild_name: Option<&str>,
        now: NaiveDateTime,
    ) {
        self.entries.push(LogEntry::new(
            now,
            action,
            format!("{}: {}", details, guild_name.unwrap_or("Unknown")),
        ));
    }

    /// Quoted CSV of the whole log, or `None` when there is nothing to export.
    pub fn to_csv(&self) -> Result<Option<String>, MatchError> {
        if self.entries.is_empty() {
            return Ok(None);
        }
        let mut wtr = csv::WriterBuilder::new()
            .quote_style(csv::QuoteStyle::Always)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        wtr.write_record(["Timestamp", "Action", "Details"])
            .map_err(|e| MatchError::Export(e.to_string()))?;
        for entry in &self.entries {
            wtr.write_record([&entry.timestamp, &entry.action, &entry.details])
                .map_err(|e| MatchError::Export(e.to_string()))?;
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| MatchError::Export(e.error().to_string()))?;
        let mut text = String::from_utf8(bytes).map_err(|e| MatchError::Export(e.to_string()))?;
        // Rows are newline-separated, not newline-terminated.
        if text.ends_with('\n') {
            text.pop();
        }
        Ok(Some(text))
    }
}

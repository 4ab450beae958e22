//! The match session: one explicit state struct holding reference data, the
//! assignment and result tables, the audit log and the guild selection.
//!
//! Every mutating method is plain state manipulation. Persisting the result
//! is the controller's job (see `controller.rs`).

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::MatchError;
use crate::match_state::assignments::AssignmentTable;
use crate::match_state::audit_log::AuditLog;
use crate::match_state::keyed::KeyedMap;
use crate::match_state::reference::{GuildInfo, Member, Position, ReferenceData};
use crate::match_state::results::{BattleResultTable, MatchSummary};
use crate::match_state::side::{ResultClass, ResultMark, Side};

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub reference: ReferenceData,
    pub assignments: AssignmentTable,
    pub battle_results: BattleResultTable,
    pub logs: AuditLog,
    pub attacker_guild_id: String,
    pub defender_guild_id: String,
    pub show_dialog: bool,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            reference: ReferenceData::default(),
            assignments: AssignmentTable::default(),
            battle_results: BattleResultTable::default(),
            logs: AuditLog::default(),
            attacker_guild_id: String::new(),
            defender_guild_id: String::new(),
            show_dialog: true,
        }
    }
}

/// Persisted form of a [`Session`]. Field names match the storage format the
/// page has always written, so older saves still load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Snapshot {
    pub members: KeyedMap<Member>,
    pub positions: KeyedMap<Position>,
    pub guilds_info: KeyedMap<GuildInfo>,
    pub guilds: KeyedMap<Vec<String>>,
    pub assignments: AssignmentTable,
    pub logs: AuditLog,
    pub attacker_guild_id: String,
    pub defender_guild_id: String,
    pub battle_results: BattleResultTable,
    pub show_dialog: bool,
}

impl Snapshot {
    pub fn from_json(json: &str) -> Result<Self, MatchError> {
        serde_json::from_str(json).map_err(MatchError::Snapshot)
    }

    pub fn to_json(&self) -> Result<String, MatchError> {
        serde_json::to_string(self).map_err(MatchError::Snapshot)
    }
}

impl From<&Session> for Snapshot {
    fn from(session: &Session) -> Self {
        let reference = session.reference.clone();
        Self {
            members: reference.members,
            positions: reference.positions,
            guilds_info: reference.guilds_info,
            guilds: reference.guilds,
            assignments: session.assignments.clone(),
            logs: session.logs.clone(),
            attacker_guild_id: session.attacker_guild_id.clone(),
            defender_guild_id: session.defender_guild_id.clone(),
            battle_results: session.battle_results.clone(),
            show_dialog: session.show_dialog,
        }
    }
}

impl From<Snapshot> for Session {
    /// Rehydrate a session. The assignment table is reshaped against the
    /// restored positions, and log entries saved without identity keys get
    /// them back.
    fn from(snapshot: Snapshot) -> Self {
        let mut session = Self {
            reference: ReferenceData {
                members: snapshot.members,
                positions: snapshot.positions,
                guilds_info: snapshot.guilds_info,
                guilds: snapshot.guilds,
            },
            assignments: snapshot.assignments,
            battle_results: snapshot.battle_results,
            logs: snapshot.logs,
            attacker_guild_id: snapshot.attacker_guild_id,
            defender_guild_id: snapshot.defender_guild_id,
            show_dialog: snapshot.show_dialog,
        };
        session.ensure_shape();

        let reference = &session.reference;
        let attacker = session.attacker_guild_id.as_str();
        let defender = session.defender_guild_id.as_str();
        let restored = session.logs.restore_keys(|side, name| {
            let guild = match side {
                Side::Attacker => attacker,
                Side::Defender => defender,
            };
            reference.find_member(guild, name).map(str::to_string)
        });
        if restored > 0 {
            log::info!("restored identity keys on {} log entries", restored);
        }
        session
    }
}

impl Session {
    /// Fresh session over newly loaded reference data.
    pub fn new(reference: ReferenceData) -> Self {
        let mut session = Self {
            reference,
            ..Self::default()
        };
        session.reset_match();
        session
    }

    pub fn ensure_shape(&mut self) {
        self.assignments.ensure_shape(self.reference.positions.values());
    }

    /// Drop every assignment, result and log entry, then reshape.
    pub fn reset_match(&mut self) {
        self.assignments = AssignmentTable::default();
        self.battle_results = BattleResultTable::default();
        self.logs.clear();
        self.ensure_shape();
    }

    /// Apply a guild pick. Once both sides are chosen a new match starts and
    /// the picks open its log. Returns whether a match was started.
    pub fn select_guilds(&mut self, attacker_id: &str, defender_id: &str, now: NaiveDateTime) -> bool {
        self.attacker_guild_id = attacker_id.to_string();
        self.defender_guild_id = defender_id.to_string();
        if attacker_id.is_empty() || defender_id.is_empty() {
            return false;
        }

        self.reset_match();
        self.show_dialog = false;
        self.logs.log_guild_selection(
            "Select Attacker",
            "Attacker guild",
            self.reference.guild_name(attacker_id),
            now,
        );
        self.logs.log_guild_selection(
            "Select Defender",
            "Defender guild",
            self.reference.guild_name(defender_id),
            now,
        );
        log::info!("new match: {} vs {}", attacker_id, defender_id);
        true
    }

    pub fn close_dialog(&mut self) {
        self.show_dialog = false;
    }

    pub fn guild_id(&self, side: Side) -> &str {
        match side {
            Side::Attacker => &self.attacker_guild_id,
            Side::Defender => &self.defender_guild_id,
        }
    }

    /// Roster of the guild picked for a side.
    pub fn side_members(&self, side: Side) -> &[String] {
        self.reference.roster(self.guild_id(side))
    }

    pub fn attacker_members(&self) -> &[String] {
        self.side_members(Side::Attacker)
    }

    pub fn defender_members(&self) -> &[String] {
        self.side_members(Side::Defender)
    }

    pub fn member_name(&self, member_id: &str) -> &str {
        self.reference.member_name(member_id)
    }

    /// Put a member in a slot (an empty id clears it) and reconcile the log.
    /// Results are not touched.
    pub fn assign(&mut self, side: Side, position: &str, slot: u32, member_id: &str, now: NaiveDateTime) {
        self.assignments.assign(side, position, slot, member_id);
        let name = (!member_id.is_empty()).then(|| self.reference.member_name(member_id));
        self.logs.log_assignment(side, position, slot, name, now);
    }

    /// Empty a slot: its assignment entry for today goes away and any result
    /// recorded for it is removed.
    pub fn clear(&mut self, side: Side, position: &str, slot: u32, now: NaiveDateTime) {
        self.assign(side, position, slot, "", now);
        self.record_result("", ResultMark::Remove, side, position, slot, now);
    }

    pub fn is_member_assigned_elsewhere(
        &self,
        member_id: &str,
        side: Side,
        position: &str,
        slot: u32,
    ) -> bool {
        self.assignments
            .is_occupied_elsewhere(member_id, side, position, slot)
    }

    /// Record or remove a battle result. Returns whether anything changed.
    ///
    /// An attacker can only be graded against an occupied defender slot;
    /// otherwise the call is ignored.
    pub fn record_result(
        &mut self,
        member_id: &str,
        mark: ResultMark,
        side: Side,
        position: &str,
        slot: u32,
        now: NaiveDateTime,
    ) -> bool {
        let outcome = match mark {
            ResultMark::Remove if member_id.is_empty() => {
                self.battle_results.remove(side, position, slot);
                self.logs.log_result_removal(side, position, slot, now);
                return true;
            }
            // A removal aimed at a member is not a clear; nothing to record.
            ResultMark::Remove => return false,
            ResultMark::Outcome(outcome) => outcome,
        };

        if side == Side::Attacker && !self.assignments.is_occupied(Side::Defender, position, slot) {
            log::debug!(
                "ignoring attacker result for {} slot {}: defender slot is empty",
                position,
                slot
            );
            return false;
        }

        self.battle_results.set(side, position, slot, outcome);
        let name = self.reference.member_name(member_id).to_string();
        self.logs
            .log_result(side, position, slot, member_id, &name, outcome, now);
        true
    }

    pub fn classify(&self, side: Side, position: &str, slot: u32) -> ResultClass {
        self.battle_results.classify(side, position, slot)
    }

    pub fn compute_summary(&self) -> MatchSummary {
        self.battle_results.summary()
    }

    /// Positions in display order with their slot counts.
    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.reference.positions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_state::audit_log::ASSIGN_ACTION;
    use crate::match_state::reference::fixtures;
    use crate::match_state::side::Outcome;
    use chrono::NaiveDate;

    fn at(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn started() -> Session {
        let mut s = Session::new(fixtures::reference());
        assert!(s.select_guilds("g1", "7", at(8)));
        s
    }

    fn todays(s: &Session, prefix: &str) -> Vec<String> {
        s.logs
            .entries()
            .iter()
            .filter(|e| e.is_on(at(0).date()) && e.action.starts_with(prefix))
            .map(|e| e.details.clone())
            .collect()
    }

    #[test]
    fn new_session_is_shaped() {
        let s = Session::new(fixtures::reference());
        for side in Side::BOTH {
            assert_eq!(s.assignments.side(side)["Healer"].len(), 2);
            assert_eq!(s.assignments.side(side)["Tank"].len(), 1);
        }
        assert!(s.logs.is_empty());
    }

    #[test]
    fn selecting_one_guild_does_not_start() {
        let mut s = Session::new(fixtures::reference());
        assert!(!s.select_guilds("g1", "", at(8)));
        assert!(s.show_dialog);
        assert!(s.logs.is_empty());
        assert_eq!(s.attacker_members().len(), 2);
        assert!(s.defender_members().is_empty());
    }

    #[test]
    fn selecting_both_resets_and_logs_guilds() {
        let mut s = started();
        s.assign(Side::Attacker, "Healer", 1, "m1", at(9));
        assert!(s.select_guilds("7", "g1", at(10)));
        assert!(!s.show_dialog);
        assert!(!s.assignments.is_occupied(Side::Attacker, "Healer", 1));
        let details: Vec<&str> = s.logs.entries().iter().map(|e| e.details.as_str()).collect();
        assert_eq!(
            details,
            vec!["Attacker guild: Sky Lancers", "Defender guild: Iron Wolves"]
        );
    }

    #[test]
    fn healer_scenario_keeps_one_entry_with_latest_member() {
        let mut s = started();
        s.assign(Side::Attacker, "Healer", 1, "m1", at(9));
        s.assign(Side::Attacker, "Healer", 1, "m2", at(10));
        let entries = todays(&s, ASSIGN_ACTION);
        assert_eq!(
            entries,
            vec!["attacker - Position: Healer, Slot: 1, Member: Bron".to_string()]
        );
    }

    #[test]
    fn assign_then_clear_leaves_nothing_for_slot() {
        let mut s = started();
        s.assign(Side::Defender, "Tank", 1, "m3", at(9));
        assert!(s.record_result("m3", Outcome::Win.into(), Side::Defender, "Tank", 1, at(9)));
        s.clear(Side::Defender, "Tank", 1, at(10));

        assert!(todays(&s, ASSIGN_ACTION).is_empty());
        assert!(todays(&s, "Battle Result").is_empty());
        assert_eq!(s.battle_results.get(Side::Defender, "Tank", 1), None);
        assert_eq!(s.classify(Side::Defender, "Tank", 1), ResultClass::Unset);
    }

    #[test]
    fn defender_result_is_recorded_once_per_member() {
        let mut s = started();
        s.assign(Side::Defender, "Tank", 1, "m3", at(9));
        assert!(s.record_result("m3", Outcome::Win.into(), Side::Defender, "Tank", 1, at(9)));
        assert!(s.record_result("m3", Outcome::Loss.into(), Side::Defender, "Tank", 1, at(11)));

        let results = todays(&s, "Battle Result");
        assert_eq!(results, vec!["defender - Cato (Tank Slot 1) marked as Loss".to_string()]);
        assert_eq!(s.classify(Side::Defender, "Tank", 1), ResultClass::Loss);
    }

    #[test]
    fn attacker_result_needs_defender_opponent() {
        let mut s = started();
        s.assign(Side::Attacker, "Healer", 2, "m1", at(9));
        let before = s.clone();

        assert!(!s.record_result("m1", Outcome::Win.into(), Side::Attacker, "Healer", 2, at(10)));
        assert_eq!(s, before);

        s.assign(Side::Defender, "Healer", 2, "m4", at(10));
        assert!(s.record_result("m1", Outcome::Win.into(), Side::Attacker, "Healer", 2, at(11)));
        assert_eq!(s.compute_summary().attacker.wins, 1);
        assert_eq!(s.compute_summary().defender.losses, 1);
    }

    #[test]
    fn clearing_attacker_keeps_defender_result_log() {
        let mut s = started();
        s.assign(Side::Attacker, "Tank", 1, "m1", at(9));
        s.assign(Side::Defender, "Tank", 1, "m3", at(9));
        s.record_result("m1", Outcome::Win.into(), Side::Attacker, "Tank", 1, at(9));
        s.record_result("m3", Outcome::Loss.into(), Side::Defender, "Tank", 1, at(9));

        s.clear(Side::Attacker, "Tank", 1, at(10));
        assert_eq!(
            todays(&s, "Battle Result"),
            vec!["defender - Cato (Tank Slot 1) marked as Loss".to_string()]
        );
    }

    #[test]
    fn double_booking_is_reported_not_enforced() {
        let mut s = started();
        s.assign(Side::Attacker, "Healer", 1, "m1", at(9));
        assert!(s.is_member_assigned_elsewhere("m1", Side::Attacker, "Tank", 1));
        s.assign(Side::Attacker, "Tank", 1, "m1", at(9));
        assert_eq!(s.assignments.occupant(Side::Attacker, "Tank", 1), Some("m1"));
    }

    #[test]
    fn snapshot_round_trip_is_identical() {
        let mut s = started();
        s.assign(Side::Attacker, "Healer", 1, "m1", at(9));
        s.assign(Side::Defender, "Healer", 1, "m3", at(9));
        s.record_result("m1", Outcome::Loss.into(), Side::Attacker, "Healer", 1, at(10));

        let json = Snapshot::from(&s).to_json().unwrap();
        let restored = Session::from(Snapshot::from_json(&json).unwrap());
        assert_eq!(restored, s);
    }

    #[test]
    fn snapshot_uses_page_field_names() {
        let s = started();
        let value: serde_json::Value =
            serde_json::from_str(&Snapshot::from(&s).to_json().unwrap()).unwrap();
        for field in [
            "members",
            "positions",
            "guildsInfo",
            "guilds",
            "assignments",
            "logs",
            "attackerGuildId",
            "defenderGuildId",
            "battleResults",
            "showDialog",
        ] {
            assert!(value.get(field).is_some(), "missing {}", field);
        }
    }

    #[test]
    fn restore_repairs_shape() {
        let json = r#"{
            "positions": {"healer": {"name": "Healer", "position": 3}},
            "assignments": {"attacker": {"Healer": {"2": "m1"}}},
            "attackerGuildId": "g1"
        }"#;
        let s = Session::from(Snapshot::from_json(json).unwrap());
        assert_eq!(s.assignments.side(Side::Attacker)["Healer"].len(), 3);
        assert_eq!(s.assignments.occupant(Side::Attacker, "Healer", 2), Some("m1"));
        assert_eq!(s.assignments.side(Side::Defender)["Healer"].len(), 3);
        assert!(s.battle_results.attacker.is_empty());
    }

    #[test]
    fn entries_from_keyless_saves_still_reconcile() {
        let mut snapshot = Snapshot::from(&started());
        snapshot.logs = serde_json::from_str(
            r#"[{"timestamp":"10/19/2026, 9:00:00 AM","action":"Assign Member","details":"attacker - Position: Healer, Slot: 1, Member: Ayla"},
                {"timestamp":"10/19/2026, 9:05:00 AM","action":"Battle Result - Win","details":"defender - Cato (Tank Slot 1) marked as Win"}]"#,
        )
        .unwrap();
        let mut s = Session::from(Snapshot::from_json(&snapshot.to_json().unwrap()).unwrap());

        s.assign(Side::Attacker, "Healer", 1, "m2", at(10));
        assert_eq!(
            todays(&s, ASSIGN_ACTION),
            ["attacker - Position: Healer, Slot: 1, Member: Bron"]
        );

        s.assign(Side::Defender, "Tank", 1, "m3", at(10));
        s.record_result("m3", Outcome::Loss.into(), Side::Defender, "Tank", 1, at(11));
        assert_eq!(
            todays(&s, "Battle Result"),
            ["defender - Cato (Tank Slot 1) marked as Loss"]
        );
    }

    #[test]
    fn malformed_snapshot_is_an_error() {
        assert!(matches!(
            Snapshot::from_json("{not json"),
            Err(MatchError::Snapshot(_))
        ));
    }
}

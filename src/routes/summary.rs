//! `/api/summary` route: win/loss scoreboard.

use crate::match_state::controller::with_session;
use crate::match_state::side::Side;
use crate::routes::util::{escape_html, get_param, parse_query};

/// Handle GET /api/summary[?format=json]
pub fn handle_summary_get(query: &str) -> String {
    let params = parse_query(query);
    let summary = with_session(|s| s.compute_summary());
    if get_param(&params, "format") == Some("json") {
        return serde_json::to_string(&summary).unwrap_or_else(|_| "{}".to_string());
    }

    with_session(|s| {
        let mut html = String::with_capacity(512);
        html.push_str(r#"<div id="match-summary" class="grid grid-cols-2 gap-4 text-center">"#);
        for side in Side::BOTH {
            let tally = match side {
                Side::Attacker => summary.attacker,
                Side::Defender => summary.defender,
            };
            let guild = s.reference.guild_name(s.guild_id(side)).unwrap_or("Unknown");
            html.push_str(&format!(
                r#"<div class="rounded-lg border p-3"><p class="text-xs uppercase">{side}</p><p class="font-bold">{}</p><p class="text-2xl"><span class="text-emerald-600">{}</span> – <span class="text-kip-red">{}</span></p></div>"#,
                escape_html(guild),
                tally.wins,
                tally.losses
            ));
        }
        html.push_str("</div>");
        html
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_state::controller::{testing, with_session_mut};
    use crate::match_state::side::Outcome;
    use chrono::NaiveDate;

    fn at(h: u32) -> chrono::NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    #[test]
    fn summary_mirrors_scores() {
        testing::reset_with_match(at(8));
        with_session_mut(|s| {
            s.assign(Side::Defender, "Healer", 1, "m3", at(9));
            s.assign(Side::Defender, "Healer", 2, "m4", at(9));
            s.assign(Side::Attacker, "Healer", 1, "m1", at(9));
            s.assign(Side::Attacker, "Healer", 2, "m2", at(9));
            s.record_result("m1", Outcome::Win.into(), Side::Attacker, "Healer", 1, at(10));
            s.record_result("m2", Outcome::Loss.into(), Side::Attacker, "Healer", 2, at(10));
            s.record_result("m2", Outcome::Win.into(), Side::Attacker, "Healer", 2, at(11));
        });
        let json = handle_summary_get("?format=json");
        assert_eq!(
            json,
            r#"{"attacker":{"wins":2,"losses":0},"defender":{"wins":0,"losses":2}}"#
        );
        let html = handle_summary_get("");
        assert!(html.contains("Iron Wolves"));
        assert!(html.contains("Sky Lancers"));
    }
}

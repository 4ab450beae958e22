//! `/api/guilds` routes: attacker/defender guild selection.

use crate::match_state::controller::{self, with_session};
use crate::match_state::side::Side;
use crate::routes::util::{escape_html, get_param, now_param, parse_form_body};

// ── GET /api/guilds ────────────────────────────────────────────────

/// Handle GET /api/guilds
/// Returns the two guild pickers with the current selection.
pub fn handle_guilds_get(_query: &str) -> String {
    render_pickers()
}

// ── POST /api/guilds ───────────────────────────────────────────────

/// Handle POST /api/guilds
/// Body: attacker={guild id}&defender={guild id}
///
/// Once both are set a new match starts (board, results and log reset).
/// Returns the pickers, with a notice when a match was started.
pub fn handle_guilds_post(body: &str) -> String {
    let params = parse_form_body(body);
    let attacker = get_param(&params, "attacker").unwrap_or("");
    let defender = get_param(&params, "defender").unwrap_or("");
    let now = now_param(&params);

    let started = controller::select_guilds(attacker, defender, now);
    let mut html = render_pickers();
    if started {
        html.push_str(r#"<span class="text-emerald-600 text-sm" data-match-started="true">New match started.</span>"#);
    }
    html
}

/// Render both guild `<select>`s, sorted by guild name.
pub fn render_pickers() -> String {
    with_session(|s| {
        let mut guilds: Vec<(&str, &str)> = s
            .reference
            .guilds_info
            .iter()
            .map(|(id, info)| (id.as_str(), info.name.as_str()))
            .collect();
        guilds.sort_by(|a, b| a.1.cmp(b.1).then(a.0.cmp(b.0)));

        let mut html = String::with_capacity(1024);
        html.push_str(r#"<form id="guild-pickers" class="grid grid-cols-2 gap-2" hx-post="/api/guilds" hx-trigger="change" hx-target="this" hx-swap="outerHTML">"#);
        for side in Side::BOTH {
            let selected = s.guild_id(side);
            let label = match side {
                Side::Attacker => "Attacker",
                Side::Defender => "Defender",
            };
            html.push_str(&format!(
                r#"<label class="text-xs font-bold">{label}<select name="{side}" class="w-full border rounded px-2 py-1 text-sm">"#,
            ));
            html.push_str(r#"<option value="">Select guild</option>"#);
            for (id, name) in &guilds {
                html.push_str(&format!(
                    r#"<option value="{}"{}>{}</option>"#,
                    escape_html(id),
                    if *id == selected { " selected" } else { "" },
                    escape_html(name)
                ));
            }
            html.push_str("</select></label>");
        }
        html.push_str("</form>");
        html
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::match_state::controller::testing;
    use crate::match_state::reference::fixtures;
    use crate::match_state::session::Session;

    fn load_fixture() {
        testing::reset();
        crate::match_state::controller::with_session_mut(|s| {
            *s = Session::new(fixtures::reference())
        });
    }

    #[test]
    fn pickers_list_guild_names() {
        load_fixture();
        let html = handle_guilds_get("");
        assert!(html.contains("Iron Wolves"));
        assert!(html.contains("Sky Lancers"));
        assert!(html.contains(r#"name="attacker""#));
        assert!(html.contains(r#"name="defender""#));
    }

    #[test]
    fn one_guild_does_not_start_match() {
        load_fixture();
        let html = handle_guilds_post("attacker=g1&defender=");
        assert!(!html.contains("New match started"));
        assert!(html.contains(r#"<option value="g1" selected>"#));
    }

    #[test]
    fn both_guilds_start_match() {
        load_fixture();
        let html = handle_guilds_post("attacker=g1&defender=7&now=2026-10-19T09:00:00");
        assert!(html.contains("New match started"));
        assert_eq!(testing::stored("dialogClosedDate").as_deref(), Some("10/19/2026"));
        with_session(|s| {
            assert_eq!(s.logs.len(), 2);
            assert!(!s.show_dialog);
        });
    }
}

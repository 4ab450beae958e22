//! `/api/session/*` routes: startup, reference loading, persistence import and
//! export, reset, and the startup dialog.

use crate::config::with_config;
use crate::match_state::controller::{self, with_session, with_session_mut};
use crate::routes::guilds;
use crate::routes::util::{error_fragment, get_param, now_param, parse_form_body};

// ── POST /api/session/start ────────────────────────────────────────

/// Handle POST /api/session/start
/// Body (optional): now={YYYY-MM-DDTHH:MM:SS}
/// Returns `restored` or `needs-reference`. On `needs-reference` the bridge
/// fetches the documents from `/api/session/sources` and posts them to
/// `/api/session/load`.
pub fn handle_start_post(body: &str) -> String {
    let params = parse_form_body(body);
    let today = now_param(&params).date();
    controller::startup(today).as_str().to_string()
}

// ── GET /api/session/sources ───────────────────────────────────────

/// Handle GET /api/session/sources
/// Returns the reference document paths as JSON.
pub fn handle_sources_get(_query: &str) -> String {
    with_config(|c| serde_json::to_string(&c.source_paths()).unwrap_or_else(|_| "{}".to_string()))
}

// ── POST /api/session/load ─────────────────────────────────────────

/// Handle POST /api/session/load
/// Body: JSON `{members, positions, guilds, guildsMeta}` or `{error}`.
pub fn handle_load_post(body: &str) -> String {
    match controller::load_reference(body) {
        Ok(()) => "ok".to_string(),
        Err(e) => error_fragment(&e),
    }
}

// ── GET /api/session/state ─────────────────────────────────────────

/// Handle GET /api/session/state
/// Returns the full session snapshot as JSON.
pub fn handle_state_get(_query: &str) -> String {
    controller::export_snapshot().unwrap_or_else(|e| {
        log::error!("snapshot export failed: {}", e);
        "{}".to_string()
    })
}

// ── POST /api/session/import ───────────────────────────────────────

/// Handle POST /api/session/import
/// Body: snapshot JSON (as returned by GET /api/session/state).
pub fn handle_import_post(body: &str) -> String {
    match controller::import_snapshot(body.trim()) {
        Ok(()) => {
            r#"<span class="text-emerald-600">Match data imported successfully</span>"#.to_string()
        }
        Err(e) => error_fragment(&e),
    }
}

// ── POST /api/session/reset ────────────────────────────────────────

/// Handle POST /api/session/reset
/// Clears all storage. Returns `needs-reference`.
pub fn handle_reset_post(_body: &str) -> String {
    controller::reset_all().as_str().to_string()
}

// ── GET/POST /api/session/dialog ───────────────────────────────────

/// Handle GET /api/session/dialog
/// Returns the startup dialog (guild pickers) while it is open, else nothing.
pub fn handle_dialog_get(_query: &str) -> String {
    let open = with_session(|s| s.show_dialog);
    if open { render_dialog() } else { String::new() }
}

/// Handle POST /api/session/dialog
/// Body: action=close
pub fn handle_dialog_post(body: &str) -> String {
    let params = parse_form_body(body);
    if get_param(&params, "action") == Some("close") {
        with_session_mut(|s| s.close_dialog());
    }
    handle_dialog_get("")
}

fn render_dialog() -> String {
    let mut html = String::with_capacity(2048);
    html.push_str(
        r#"<div id="start-dialog" class="fixed inset-0 flex items-center justify-center bg-black/40">"#,
    );
    html.push_str(r#"<div class="bg-white rounded-lg shadow p-4 w-96">"#);
    html.push_str(r#"<p class="text-lg font-bold mb-2">Start a Match</p>"#);
    html.push_str(r#"<p class="text-sm text-slate-500 mb-3">Pick the attacking and defending guilds. Picking both starts a new match and clears today's board.</p>"#);
    html.push_str(&guilds::render_pickers());
    html.push_str(r##"<button class="mt-3 text-sm underline" hx-post="/api/session/dialog" hx-vals='{"action":"close"}' hx-target="#start-dialog" hx-swap="outerHTML">Continue current match</button>"##);
    html.push_str("</div></div>");
    html
}

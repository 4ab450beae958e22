//! Guild match tracker, running in the browser as WASM.
//!
//! Exports `handle_request(method, path, query, body)` for the page's
//! JavaScript bridge to call. Uses `matchit` for URL routing, the same router
//! engine that powers Axum.
//!
//! Startup sequence for the bridge:
//! 1. optionally `configure(json)` and `init_logging(verbose)`;
//! 2. `POST /api/session/start`; on `needs-reference`, fetch the four
//!    documents listed by `GET /api/session/sources` and post them to
//!    `/api/session/load`;
//! 3. render with the GET routes, mutate with the POST routes. State is
//!    saved to localStorage after every mutation.

use wasm_bindgen::prelude::*;

pub mod config;
pub mod error;
pub mod logging;
pub mod match_state;
pub mod routes;

pub use error::MatchError;

/// Process an HTTP-like request and return an HTML fragment (or JSON for the
/// state and summary endpoints).
///
/// # Arguments
/// * `method` — HTTP method ("GET" or "POST")
/// * `path`   — URL path (e.g., "/api/board")
/// * `query`  — Query string (e.g., "?side=attacker")
/// * `body`   — Request body (form data or JSON). Empty string for GET.
#[wasm_bindgen]
pub fn handle_request(method: &str, path: &str, query: &str, body: &str) -> String {
    let mut router = matchit::Router::new();

    router.insert("/api/session/start", "session_start").ok();
    router.insert("/api/session/sources", "session_sources").ok();
    router.insert("/api/session/load", "session_load").ok();
    router.insert("/api/session/state", "session_state").ok();
    router.insert("/api/session/import", "session_import").ok();
    router.insert("/api/session/reset", "session_reset").ok();
    router.insert("/api/session/dialog", "session_dialog").ok();

    router.insert("/api/guilds", "guilds").ok();

    router.insert("/api/board", "board").ok();
    router.insert("/api/board/assign", "board_assign").ok();
    router.insert("/api/board/clear", "board_clear").ok();
    router.insert("/api/board/result", "board_result").ok();
    router.insert("/api/board/available", "board_available").ok();

    router.insert("/api/summary", "summary").ok();
    router.insert("/api/logs", "logs").ok();
    router.insert("/api/logs/export", "logs_export").ok();

    match router.at(path) {
        Ok(matched) => match (*matched.value, method) {
            ("session_start", "POST") => routes::session::handle_start_post(body),
            ("session_sources", "GET") => routes::session::handle_sources_get(query),
            ("session_load", "POST") => routes::session::handle_load_post(body),
            ("session_state", "GET") => routes::session::handle_state_get(query),
            ("session_import", "POST") => routes::session::handle_import_post(body),
            ("session_reset", "POST") => routes::session::handle_reset_post(body),
            ("session_dialog", "GET") => routes::session::handle_dialog_get(query),
            ("session_dialog", "POST") => routes::session::handle_dialog_post(body),

            ("guilds", "GET") => routes::guilds::handle_guilds_get(query),
            ("guilds", "POST") => routes::guilds::handle_guilds_post(body),

            ("board", "GET") => routes::board::handle_board_get(query),
            ("board_assign", "POST") => routes::board::handle_assign_post(body),
            ("board_clear", "POST") => routes::board::handle_clear_post(body),
            ("board_result", "POST") => routes::board::handle_result_post(body),
            ("board_available", "GET") => routes::board::handle_available_get(query),

            ("summary", "GET") => routes::summary::handle_summary_get(query),
            ("logs", "GET") => routes::logs::handle_logs_get(query),
            ("logs_export", "GET") => routes::logs::handle_export_get(query),

            _ => method_not_allowed(),
        },
        Err(_) => not_found(),
    }
}

/// Apply host configuration (JSON, see [`config::Config`]). Returns `ok` or
/// an error fragment.
#[wasm_bindgen]
pub fn configure(json: &str) -> String {
    match config::Config::from_json(json) {
        Ok(c) => {
            config::set_config(c);
            "ok".to_string()
        }
        Err(e) => routes::util::error_fragment(&e),
    }
}

/// Route `log` output to the browser console.
#[wasm_bindgen]
pub fn init_logging(verbose: bool) {
    logging::init(verbose);
}

fn not_found() -> String {
    r#"<span class="text-kip-red">404 — route not found</span>"#.to_string()
}

fn method_not_allowed() -> String {
    r#"<span class="text-kip-red">405 — method not allowed</span>"#.to_string()
}

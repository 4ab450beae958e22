//! `/api/logs` routes: audit log table and CSV download.

use crate::config::with_config;
use crate::match_state::controller::with_session;
use crate::routes::util::{error_fragment, escape_html};

// ── GET /api/logs ──────────────────────────────────────────────────

/// Handle GET /api/logs
/// Returns the log as a table, oldest entry first.
pub fn handle_logs_get(_query: &str) -> String {
    with_session(|s| {
        if s.logs.is_empty() {
            return r#"<p class="text-sm text-slate-500">No log entries yet.</p>"#.to_string();
        }
        let mut html = String::with_capacity(256 + s.logs.len() * 160);
        html.push_str(r#"<table class="w-full text-sm"><thead><tr><th>Timestamp</th><th>Action</th><th>Details</th></tr></thead><tbody>"#);
        for entry in s.logs.entries() {
            html.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape_html(&entry.timestamp),
                escape_html(&entry.action),
                escape_html(&entry.details)
            ));
        }
        html.push_str("</tbody></table>");
        html
    })
}

// ── GET /api/logs/export ───────────────────────────────────────────

/// Handle GET /api/logs/export
/// Returns a <script> tag that downloads the log as CSV. With an empty log
/// nothing is returned and no file is produced.
pub fn handle_export_get(_query: &str) -> String {
    let csv = match with_session(|s| s.logs.to_csv()) {
        Ok(Some(csv)) => csv,
        Ok(None) => return String::new(),
        Err(e) => return error_fragment(&e),
    };
    let filename = with_config(|c| c.export_filename.clone());
    // JSON string literals are valid JS; `</` is broken up so the payload
    // cannot close the script element.
    let csv_literal = js_string(&csv);
    let name_literal = js_string(&filename);
    format!(
        r#"<script>
(function() {{
  var b = new Blob([{csv_literal}], {{type: 'text/csv;charset=utf-8;'}});
  var a = document.createElement('a');
  a.href = URL.createObjectURL(b);
  a.download = {name_literal};
  document.body.appendChild(a);
  a.click();
  document.body.removeChild(a);
  URL.revokeObjectURL(a.href);
}})();
</script>"#
    )
}

fn js_string(text: &str) -> String {
    serde_json::to_string(text)
        .unwrap_or_else(|_| "\"\"".to_string())
        .replace("</", "<\\/")
}

//! Shared request parsing and HTML helpers for route handlers.

use chrono::NaiveDateTime;

use crate::error::MatchError;
use crate::match_state::clock;
use crate::match_state::side::Side;

/// Parse a URL-encoded form body (`key=value&key2=value2`, as HTMX posts it).
pub fn parse_form_body(body: &str) -> Vec<(String, String)> {
    if body.is_empty() {
        return Vec::new();
    }
    body.split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| {
            let (key, val) = pair.split_once('=').unwrap_or((pair, ""));
            (percent_decode(key), percent_decode(val))
        })
        .collect()
}

/// Percent-decode a URL-encoded value. Decoded bytes are reassembled as
/// UTF-8, so multi-byte member names survive.
pub fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = bytes
                    .get(i + 1..i + 3)
                    .and_then(|h| std::str::from_utf8(h).ok())
                    .and_then(|h| u8::from_str_radix(h, 16).ok());
                match hex {
                    Some(val) => {
                        out.push(val);
                        i += 3;
                    }
                    None => {
                        out.push(b'%');
                        i += 1;
                    }
                }
            }
            b'+' => {
                out.push(b' ');
                i += 1;
            }
            b => {
                out.push(b);
                i += 1;
            }
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

/// Parse a query string into key-value pairs.
pub fn parse_query(query: &str) -> Vec<(String, String)> {
    let q = query.strip_prefix('?').unwrap_or(query);
    parse_form_body(q)
}

/// Get a value by key from a list of key-value pairs.
pub fn get_param<'a>(params: &'a [(String, String)], key: &str) -> Option<&'a str> {
    params
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

pub fn side_param(params: &[(String, String)]) -> Result<Side, MatchError> {
    get_param(params, "side").unwrap_or("").parse()
}

/// Slot numbers are 1-based.
pub fn slot_param(params: &[(String, String)]) -> Result<u32, MatchError> {
    let raw = get_param(params, "slot").unwrap_or("");
    match raw.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(MatchError::InvalidSlot(raw.to_string())),
    }
}

/// The request's `now` override, or the local clock.
pub fn now_param(params: &[(String, String)]) -> NaiveDateTime {
    get_param(params, "now")
        .and_then(clock::parse_now)
        .unwrap_or_else(clock::now)
}

/// Escape text for HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Error fragment in the page's red text style.
pub fn error_fragment(err: &MatchError) -> String {
    format!(
        r#"<span class="text-kip-red">{}</span>"#,
        escape_html(&err.to_string())
    )
}

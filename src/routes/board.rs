//! `/api/board/*` routes: slot assignments and battle results.
//!
//! Every mutating handler re-renders the whole board for the side it touched
//! so HTMX can swap it in one go.

use serde_json::json;

use crate::error::MatchError;
use crate::match_state::controller::{with_session, with_session_mut};
use crate::match_state::session::Session;
use crate::match_state::side::{ResultMark, Side};
use crate::routes::util::{
    error_fragment, escape_html, get_param, now_param, parse_form_body, parse_query, side_param,
    slot_param,
};

/// The slot coordinates every board request carries.
struct SlotRequest<'a> {
    side: Side,
    position: &'a str,
    slot: u32,
}

fn slot_request(params: &[(String, String)]) -> Result<SlotRequest<'_>, MatchError> {
    Ok(SlotRequest {
        side: side_param(params)?,
        position: get_param(params, "position").unwrap_or(""),
        slot: slot_param(params)?,
    })
}

// ── GET /api/board ─────────────────────────────────────────────────

/// Handle GET /api/board?side={attacker|defender}
pub fn handle_board_get(query: &str) -> String {
    let params = parse_query(query);
    match side_param(&params) {
        Ok(side) => with_session(|s| render_board(s, side, None)),
        Err(e) => error_fragment(&e),
    }
}

// ── POST /api/board/assign ─────────────────────────────────────────

/// Handle POST /api/board/assign
/// Body: side=&position=&slot=&member={member id, empty to clear}
///
/// A member already seated elsewhere is refused; the board comes back with a
/// notice instead.
pub fn handle_assign_post(body: &str) -> String {
    let params = parse_form_body(body);
    let req = match slot_request(&params) {
        Ok(r) => r,
        Err(e) => return error_fragment(&e),
    };
    let member = get_param(&params, "member").unwrap_or("");
    let now = now_param(&params);

    let taken = with_session(|s| {
        s.is_member_assigned_elsewhere(member, req.side, req.position, req.slot)
    });
    if taken {
        return with_session(|s| {
            let notice = format!(
                "{} is already assigned to another slot.",
                s.member_name(member)
            );
            render_board(s, req.side, Some(&notice))
        });
    }

    with_session_mut(|s| {
        if member.is_empty() {
            s.clear(req.side, req.position, req.slot, now);
        } else {
            s.assign(req.side, req.position, req.slot, member, now);
        }
    });
    with_session(|s| render_board(s, req.side, None))
}

// ── POST /api/board/clear ──────────────────────────────────────────

/// Handle POST /api/board/clear
/// Body: side=&position=&slot=
pub fn handle_clear_post(body: &str) -> String {
    let params = parse_form_body(body);
    let req = match slot_request(&params) {
        Ok(r) => r,
        Err(e) => return error_fragment(&e),
    };
    let now = now_param(&params);
    with_session_mut(|s| s.clear(req.side, req.position, req.slot, now));
    with_session(|s| render_board(s, req.side, None))
}

// ── POST /api/board/result ─────────────────────────────────────────

/// Handle POST /api/board/result
/// Body: side=&position=&slot=&result={Win|Loss|remove}[&member=]
///
/// `member` defaults to the slot's occupant.
pub fn handle_result_post(body: &str) -> String {
    let params = parse_form_body(body);
    let req = match slot_request(&params) {
        Ok(r) => r,
        Err(e) => return error_fragment(&e),
    };
    let mark: ResultMark = match get_param(&params, "result").unwrap_or("").parse() {
        Ok(m) => m,
        Err(e) => return error_fragment(&e),
    };
    let now = now_param(&params);

    let member = match (get_param(&params, "member"), mark) {
        (Some(m), _) => m.to_string(),
        (None, ResultMark::Remove) => String::new(),
        (None, ResultMark::Outcome(_)) => with_session(|s| {
            s.assignments
                .occupant(req.side, req.position, req.slot)
                .unwrap_or("")
                .to_string()
        }),
    };

    let recorded =
        with_session_mut(|s| s.record_result(&member, mark, req.side, req.position, req.slot, now));
    with_session(|s| {
        let notice = (!recorded).then_some("No opponent in the defender slot yet.");
        render_board(s, req.side, notice)
    })
}

// ── GET /api/board/available ───────────────────────────────────────

/// Handle GET /api/board/available?member=&side=&position=&slot=
/// Returns `true` when the member may take the slot.
pub fn handle_available_get(query: &str) -> String {
    let params = parse_query(query);
    let req = match slot_request(&params) {
        Ok(r) => r,
        Err(e) => return error_fragment(&e),
    };
    let member = get_param(&params, "member").unwrap_or("");
    let taken =
        with_session(|s| s.is_member_assigned_elsewhere(member, req.side, req.position, req.slot));
    (!taken).to_string()
}

// ── Rendering ──────────────────────────────────────────────────────

fn hx_vals(side: Side, position: &str, slot: u32, extra: Option<(&str, &str)>) -> String {
    let mut vals = json!({ "side": side.as_str(), "position": position, "slot": slot });
    if let Some((k, v)) = extra {
        vals[k] = json!(v);
    }
    escape_html(&vals.to_string())
}

/// Render the board for one side: every position, every slot, with member
/// pickers, the clear button and result buttons.
fn render_board(s: &Session, side: Side, notice: Option<&str>) -> String {
    let roster = s.side_members(side);
    let guild = s
        .reference
        .guild_name(s.guild_id(side))
        .unwrap_or("No guild selected");

    let mut html = String::with_capacity(4096);
    html.push_str(&format!(r#"<div id="board-{side}" class="p-2">"#));
    html.push_str(&format!(
        r#"<p class="text-lg font-bold mb-2 capitalize">{side} — {}</p>"#,
        escape_html(guild)
    ));
    if let Some(notice) = notice {
        html.push_str(&format!(
            r#"<p class="text-kip-red text-sm mb-2">{}</p>"#,
            escape_html(notice)
        ));
    }

    for position in s.positions() {
        html.push_str(r#"<div class="mb-3">"#);
        html.push_str(&format!(
            r#"<p class="font-bold text-sm">{}</p><div class="grid grid-cols-2 gap-2">"#,
            escape_html(&position.name)
        ));
        for slot in 1..=position.slots {
            render_slot(&mut html, s, side, &position.name, slot, roster);
        }
        html.push_str("</div></div>");
    }

    html.push_str("</div>");
    html
}

fn render_slot(html: &mut String, s: &Session, side: Side, position: &str, slot: u32, roster: &[String]) {
    let occupant = s.assignments.occupant(side, position, slot);
    let css = s.classify(side, position, slot).css();

    html.push_str(&format!(
        r#"<div class="border rounded p-2 {}" data-slot="{}-{}">"#,
        css,
        escape_html(position),
        slot
    ));
    html.push_str(&format!(r#"<span class="text-xs">Slot {}</span>"#, slot));

    html.push_str(&format!(
        r##"<select name="member" class="w-full border rounded text-sm" hx-post="/api/board/assign" hx-vals="{}" hx-target="#board-{}" hx-swap="outerHTML">"##,
        hx_vals(side, position, slot, None),
        side
    ));
    html.push_str(r#"<option value="">—</option>"#);
    for member in roster {
        let selected = occupant == Some(member.as_str());
        let elsewhere = s.is_member_assigned_elsewhere(member, side, position, slot);
        html.push_str(&format!(
            r#"<option value="{}"{}{}>{}</option>"#,
            escape_html(member),
            if selected { " selected" } else { "" },
            if elsewhere { " disabled" } else { "" },
            escape_html(s.member_name(member))
        ));
    }
    html.push_str("</select>");

    if occupant.is_some() {
        html.push_str(r#"<div class="flex gap-1 mt-1">"#);
        // Attackers can only be graded against a seated defender.
        let gradable = side == Side::Defender || s.assignments.is_occupied(Side::Defender, position, slot);
        for outcome in ["Win", "Loss"] {
            html.push_str(&format!(
                r##"<button class="text-xs px-2 py-1 rounded border"{} hx-post="/api/board/result" hx-vals="{}" hx-target="#board-{}" hx-swap="outerHTML">{}</button>"##,
                if gradable { "" } else { " disabled" },
                hx_vals(side, position, slot, Some(("result", outcome))),
                side,
                outcome
            ));
        }
        html.push_str(&format!(
            r##"<button class="text-xs px-2 py-1 rounded border text-kip-red" hx-post="/api/board/clear" hx-vals="{}" hx-target="#board-{}" hx-swap="outerHTML">Clear</button>"##,
            hx_vals(side, position, slot, None),
            side
        ));
        html.push_str("</div>");
    }

    html.push_str("</div>");
}

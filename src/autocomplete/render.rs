use serde::Serialize;

use super::{prefix_len, State};
use crate::utils::escape_html;

pub const LIST_CLASS: &str = "autocomplete-items";
pub const ACTIVE_CLASS: &str = "autocomplete-active";

/// One rendered row: the matched prefix (as spelled in the name) and the rest.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub name: String,
    pub matched: String,
    pub rest: String,
    pub active: bool,
}

pub fn suggestions(state: &State) -> Vec<Suggestion> {
    if !state.is_open() {
        return Vec::new();
    }
    state
        .candidates
        .iter()
        .enumerate()
        .map(|(i, name)| {
            let split = prefix_len(name, &state.value).unwrap_or(0);
            Suggestion {
                name: name.clone(),
                matched: name[..split].to_string(),
                rest: name[split..].to_string(),
                active: state.focused == Some(i),
            }
        })
        .collect()
}

pub fn list_id(input_id: &str) -> String {
    format!("{input_id}autocomplete-list")
}

/// The suggestion list element for `input_id`, or `None` while idle.
pub fn render_html(input_id: &str, state: &State) -> Option<String> {
    let rows = suggestions(state);
    if rows.is_empty() {
        return None;
    }
    let mut out = String::new();
    out.push_str(&format!(
        "<div id=\"{}\" class=\"{}\">",
        escape_html(&list_id(input_id)),
        LIST_CLASS
    ));
    for row in rows.iter() {
        if row.active {
            out.push_str(&format!("<div class=\"{}\">", ACTIVE_CLASS));
        } else {
            out.push_str("<div>");
        }
        out.push_str("<strong>");
        out.push_str(&escape_html(&row.matched));
        out.push_str("</strong>");
        out.push_str(&escape_html(&row.rest));
        out.push_str(&format!(
            "<input type=\"hidden\" value=\"{}\">",
            escape_html(&row.name)
        ));
        out.push_str("</div>");
    }
    out.push_str("</div>");
    Some(out)
}

use colored::Colorize;
use serde::Serialize;

use crate::autocomplete::Suggestion;
use crate::index::NameIndex;
use crate::utils::escape_html;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
    Html,
}

impl OutputFormat {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "text" | "txt" => Some(Self::Text),
            "json" => Some(Self::Json),
            "html" | "htm" => Some(Self::Html),
            _ => None,
        }
    }
}

pub fn infer_format_from_path(path: &str) -> Option<OutputFormat> {
    let lower = path.trim().to_lowercase();
    if lower.ends_with(".json") {
        return Some(OutputFormat::Json);
    }
    if lower.ends_with(".html") || lower.ends_with(".htm") {
        return Some(OutputFormat::Html);
    }
    if lower.ends_with(".txt") {
        return Some(OutputFormat::Text);
    }
    None
}

#[derive(Clone, Debug, Serialize)]
pub struct IndexRecord {
    pub name: String,
    pub target_url: String,
}

pub fn build_records(index: &NameIndex) -> Vec<IndexRecord> {
    index
        .entries()
        .map(|e| IndexRecord {
            name: e.name.clone(),
            target_url: e.target_url.clone(),
        })
        .collect()
}

pub fn render_index(index: &NameIndex, format: OutputFormat) -> Vec<u8> {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for e in index.entries() {
                out.push_str(&e.name);
                out.push('\t');
                out.push_str(&e.target_url);
                out.push('\n');
            }
            out.into_bytes()
        }
        OutputFormat::Json => {
            serde_json::to_vec_pretty(&build_records(index)).unwrap_or_else(|_| b"[]\n".to_vec())
        }
        OutputFormat::Html => {
            let mut out = String::from("<ul class=\"name-index\">\n");
            for e in index.entries() {
                out.push_str(&format!(
                    "  <li><a href=\"{}\">{}</a></li>\n",
                    escape_html(&e.target_url),
                    escape_html(&e.name)
                ));
            }
            out.push_str("</ul>\n");
            out.into_bytes()
        }
    }
}

pub fn render_suggestions(
    rows: &[Suggestion],
    html: Option<String>,
    format: OutputFormat,
) -> Vec<u8> {
    match format {
        OutputFormat::Text => {
            let mut out = String::new();
            for row in rows {
                out.push_str(&row.name);
                out.push('\n');
            }
            out.into_bytes()
        }
        OutputFormat::Json => {
            serde_json::to_vec_pretty(rows).unwrap_or_else(|_| b"[]\n".to_vec())
        }
        OutputFormat::Html => {
            let mut out = html.unwrap_or_default();
            out.push('\n');
            out.into_bytes()
        }
    }
}

/// Terminal line for one suggestion: matched prefix in bold, focused row marked.
pub fn format_suggestion_line(row: &Suggestion) -> String {
    let marker = if row.active { ">" } else { " " };
    let line = format!("{} {}{}", marker, row.matched.bold(), row.rest);
    if row.active {
        line.cyan().to_string()
    } else {
        line
    }
}

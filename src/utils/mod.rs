use reqwest::header::{HeaderName, HeaderValue};
use reqwest::Url;

pub fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Parses a single `Key: Value` header.
pub fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue), String> {
    let (key, value) = raw
        .split_once(':')
        .ok_or_else(|| "expected format 'Key: Value'".to_string())?;
    let key = key.trim();
    if key.is_empty() {
        return Err("header name is empty".to_string());
    }
    let name = HeaderName::from_bytes(key.as_bytes())
        .map_err(|_| format!("invalid header name '{key}'"))?;
    let value = HeaderValue::from_str(value.trim())
        .map_err(|_| format!("invalid value for header '{key}'"))?;
    Ok((name, value))
}

/// Joins a navigation target onto the site the index was loaded from.
///
/// Absolute targets pass through; anything unparseable is returned as given.
pub fn resolve_target(site: &Url, target: &str) -> String {
    match site.join(target.trim()) {
        Ok(url) => url.to_string(),
        Err(_) => target.to_string(),
    }
}

/// `https://host/api/v1/...?format=json` -> `https://host/`
pub fn site_root(url: &Url) -> Url {
    let mut root = url.clone();
    root.set_path("/");
    root.set_query(None);
    root.set_fragment(None);
    root
}

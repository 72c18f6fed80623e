use serde::Deserialize;

/// One page of a collection endpoint.
#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Page {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub next: Option<String>,
    #[serde(default)]
    pub results: Vec<Row>,
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Eq)]
pub struct Row {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub altname: Option<String>,
    #[serde(default, alias = "targetUrl")]
    pub frontend_url: Option<String>,
}

impl Row {
    /// The name exactly as the server sent it. Blank names count as missing.
    pub fn primary_name(&self) -> Option<&str> {
        self.name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    pub fn alternate_name(&self) -> Option<&str> {
        self.altname
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn target(&self) -> Option<&str> {
        self.frontend_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
    }
}

impl Page {
    /// The continuation link, with empty strings and a literal `"null"`
    /// treated as terminal.
    pub fn next_link(&self) -> Option<&str> {
        self.next
            .as_deref()
            .map(str::trim)
            .filter(|next| !next.is_empty() && *next != "null")
    }
}

pub mod types;

use async_trait::async_trait;
use reqwest::Url;
use thiserror::Error;

pub use types::{Page, Row};

pub const DEFAULT_COLLECTION_PATH: &str = "/api/v1/catalogue/astro_object/";

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected status {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("invalid page body from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid continuation link '{link}' on {url}")]
    InvalidLink { url: String, link: String },
}

/// Fetches single pages of a collection endpoint.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, url: &Url) -> Result<Page, ApiError>;
}

#[async_trait]
impl<T: PageSource + ?Sized> PageSource for std::sync::Arc<T> {
    async fn fetch_page(&self, url: &Url) -> Result<Page, ApiError> {
        (**self).fetch_page(url).await
    }
}

#[derive(Clone, Debug)]
pub struct HttpPageSource {
    client: reqwest::Client,
}

impl HttpPageSource {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl PageSource for HttpPageSource {
    async fn fetch_page(&self, url: &Url) -> Result<Page, ApiError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| ApiError::Request {
                url: url.to_string(),
                source: e,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| ApiError::Request {
            url: url.to_string(),
            source: e,
        })?;
        serde_json::from_str::<Page>(&body).map_err(|e| ApiError::Decode {
            url: url.to_string(),
            source: e,
        })
    }
}

/// Appends `format=json` unless the query already selects a format.
pub fn ensure_json_format(url: &Url) -> Url {
    if url.query_pairs().any(|(k, _)| k == "format") {
        return url.clone();
    }
    let mut out = url.clone();
    out.query_pairs_mut().append_pair("format", "json");
    out
}

/// Resolves a `next` link, absolute or relative, against the page it came from.
pub fn resolve_link(current: &Url, link: &str) -> Result<Url, ApiError> {
    current.join(link).map_err(|_| ApiError::InvalidLink {
        url: current.to_string(),
        link: link.to_string(),
    })
}

/// Builds the collection URL from a site base or a full collection URL.
///
/// A base without a path (or with `/` only) gets the default collection joined on.
pub fn collection_url(base: &str, collection_path: Option<&str>) -> Result<Url, ApiError> {
    let invalid = || ApiError::InvalidUrl {
        url: base.to_string(),
    };
    let parsed = Url::parse(base.trim()).map_err(|_| invalid())?;
    let url = match collection_path.map(str::trim).filter(|p| !p.is_empty()) {
        Some(path) => parsed.join(path).map_err(|_| invalid())?,
        None if parsed.path() == "/" => {
            parsed.join(DEFAULT_COLLECTION_PATH).map_err(|_| invalid())?
        }
        None => parsed,
    };
    Ok(ensure_json_format(&url))
}

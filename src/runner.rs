use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use reqwest::Url;
use thiserror::Error;
use tracing::debug;

use crate::api::{self, HttpPageSource};
use crate::index::cache::DEFAULT_CACHE_KEY;
use crate::index::{
    CachePort, FileCache, LoadReport, LoaderOptions, MemoryCache, NameIndex, NameIndexLoader,
};
use crate::utils;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CacheMode {
    Memory,
    Directory(String),
}

#[derive(Clone, Debug)]
pub struct Options {
    pub url: String,
    pub collection_path: Option<String>,
    pub cache: CacheMode,
    pub cache_key: String,
    pub timeout_seconds: usize,
    pub proxy: Option<String>,
    pub header: Option<String>,
    pub refresh: bool,
    pub max_pages: Option<usize>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            url: String::new(),
            collection_path: None,
            cache: CacheMode::Memory,
            cache_key: DEFAULT_CACHE_KEY.to_string(),
            timeout_seconds: 10,
            proxy: None,
            header: None,
            refresh: false,
            max_pages: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("no catalogue URL provided")]
    NoUrl,

    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    #[error("invalid header '{header}': {message}")]
    InvalidHeader { header: String, message: String },

    #[error("invalid max_pages {value}, expected positive integer")]
    InvalidMaxPages { value: usize },

    #[error("failed to build HTTP client: {source}")]
    HttpClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to setup proxy: {proxy}: {source}")]
    ProxySetup {
        proxy: String,
        #[source]
        source: reqwest::Error,
    },
}

pub struct Runner {
    options: Options,
    collection: Url,
    loader: NameIndexLoader<HttpPageSource, Arc<dyn CachePort>>,
}

impl Runner {
    pub fn new(options: Options) -> Result<Self, RunnerError> {
        if options.url.trim().is_empty() {
            return Err(RunnerError::NoUrl);
        }
        if options.max_pages == Some(0) {
            return Err(RunnerError::InvalidMaxPages { value: 0 });
        }
        let collection = api::collection_url(&options.url, options.collection_path.as_deref())
            .map_err(|_| RunnerError::InvalidUrl {
                url: options.url.clone(),
            })?;

        let client = build_client(
            options.proxy.as_deref(),
            options.header.as_deref(),
            options.timeout_seconds,
        )?;
        let cache = build_cache(&options.cache, &options.cache_key);
        debug!(collection = %collection, cache = ?options.cache, "runner configured");

        let loader = NameIndexLoader::new(HttpPageSource::new(client), cache, collection.clone())
            .with_options(LoaderOptions {
                refresh: options.refresh,
                max_pages: options.max_pages,
            });

        Ok(Self {
            options,
            collection,
            loader,
        })
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.loader = self.loader.with_progress(progress);
        self
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn collection(&self) -> &Url {
        &self.collection
    }

    /// Site root that relative navigation targets resolve against.
    pub fn site(&self) -> Url {
        utils::site_root(&self.collection)
    }

    pub async fn load(&self) -> LoadReport {
        self.loader.load().await
    }

    pub async fn load_index(&self) -> NameIndex {
        self.loader.load_index().await
    }
}

pub fn build_cache(mode: &CacheMode, key: &str) -> Arc<dyn CachePort> {
    match mode {
        CacheMode::Memory => Arc::new(MemoryCache::new()),
        CacheMode::Directory(dir) => Arc::new(FileCache::new(dir, key)),
    }
}

fn build_client(
    proxy: Option<&str>,
    header: Option<&str>,
    timeout_seconds: usize,
) -> Result<reqwest::Client, RunnerError> {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::USER_AGENT,
        reqwest::header::HeaderValue::from_static(concat!(
            "astrosearch/",
            env!("CARGO_PKG_VERSION")
        )),
    );
    if let Some(raw) = header.filter(|h| !h.trim().is_empty()) {
        let (name, value) =
            utils::parse_header(raw).map_err(|message| RunnerError::InvalidHeader {
                header: raw.to_string(),
                message,
            })?;
        headers.insert(name, value);
    }

    let timeout = Duration::from_secs(timeout_seconds.try_into().unwrap_or(10));
    let mut builder = reqwest::Client::builder()
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(10))
        .timeout(timeout);

    if let Some(proxy) = proxy.filter(|p| !p.trim().is_empty()) {
        let proxy = reqwest::Proxy::all(proxy).map_err(|e| RunnerError::ProxySetup {
            proxy: proxy.to_string(),
            source: e,
        })?;
        builder = builder.proxy(proxy);
    }

    builder
        .build()
        .map_err(|e| RunnerError::HttpClientBuild { source: e })
}

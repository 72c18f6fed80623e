use std::collections::HashSet;

use indicatif::ProgressBar;
use reqwest::Url;
use tracing::{debug, info, trace, warn};

use crate::api::{self, PageSource, Row};

use super::cache::{CachePort, CacheRecord};
use super::NameIndex;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoaderOptions {
    /// Skip the cache read and always walk the collection.
    pub refresh: bool,
    pub max_pages: Option<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IndexOrigin {
    /// Cached record whose entry count matched the remote count.
    CacheHit,
    /// No usable cached record; full traversal.
    Fetched,
    /// Cached record was stale or could not be validated; full traversal.
    Refreshed,
}

#[derive(Clone, Debug)]
pub struct LoadReport {
    pub index: NameIndex,
    pub origin: IndexOrigin,
    pub pages: usize,
    pub remote_count: Option<u64>,
    pub complete: bool,
}

impl LoadReport {
    pub fn from_cache(&self) -> bool {
        self.origin == IndexOrigin::CacheHit
    }
}

struct Traversal {
    index: NameIndex,
    pages: usize,
    remote_count: Option<u64>,
    complete: bool,
}

pub struct NameIndexLoader<S, C> {
    source: S,
    cache: C,
    collection: Url,
    options: LoaderOptions,
    progress: Option<ProgressBar>,
}

impl<S: PageSource, C: CachePort> NameIndexLoader<S, C> {
    pub fn new(source: S, cache: C, collection: Url) -> Self {
        Self {
            source,
            cache,
            collection: api::ensure_json_format(&collection),
            options: LoaderOptions::default(),
            progress: None,
        }
    }

    pub fn with_options(mut self, options: LoaderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_progress(mut self, progress: ProgressBar) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn collection(&self) -> &Url {
        &self.collection
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    pub async fn load_index(&self) -> NameIndex {
        self.load().await.index
    }

    /// Resolves the name index from the cache or the collection endpoint.
    ///
    /// Never fails: network and cache problems degrade to whatever index is
    /// available, and the report says how it was obtained.
    pub async fn load(&self) -> LoadReport {
        let cached = if self.options.refresh {
            debug!("cache read skipped (refresh requested)");
            None
        } else {
            self.read_cache()
        };

        let record = match cached {
            Some(record) => record,
            None => return self.fetch_and_store(IndexOrigin::Fetched).await,
        };

        match self.source.fetch_page(&self.collection).await {
            Ok(page) if record.is_fresh(page.count) => {
                info!(names = record.entry_count(), "using name index from cache");
                LoadReport {
                    index: record.index,
                    origin: IndexOrigin::CacheHit,
                    pages: 0,
                    remote_count: Some(page.count),
                    complete: true,
                }
            }
            Ok(page) => {
                info!(
                    cached = record.entry_count(),
                    expected = page.count,
                    "cached name index is stale, refetching"
                );
                self.fetch_and_store(IndexOrigin::Refreshed).await
            }
            Err(e) => {
                warn!(error = %e, "count check failed, refetching name index");
                self.fetch_and_store(IndexOrigin::Refreshed).await
            }
        }
    }

    fn read_cache(&self) -> Option<CacheRecord> {
        match self.cache.read() {
            Ok(Some(record)) => Some(record),
            Ok(None) => {
                debug!("no cached name index");
                None
            }
            Err(e) => {
                warn!(error = %e, "discarding unreadable cached name index");
                None
            }
        }
    }

    async fn fetch_and_store(&self, origin: IndexOrigin) -> LoadReport {
        let traversal = self.fetch_all().await;
        let record = CacheRecord::new(traversal.index);
        if let Err(e) = self.cache.write(&record) {
            warn!(error = %e, "failed to store name index");
        }
        LoadReport {
            index: record.index,
            origin,
            pages: traversal.pages,
            remote_count: traversal.remote_count,
            complete: traversal.complete,
        }
    }

    async fn fetch_all(&self) -> Traversal {
        let mut index = NameIndex::new();
        let mut pages = 0usize;
        let mut remote_count = None;
        let mut complete = true;
        let mut overwritten = 0usize;
        let mut visited: HashSet<String> = HashSet::new();
        let mut next = Some(self.collection.clone());

        while let Some(url) = next.take() {
            if self.options.max_pages.is_some_and(|max| pages >= max) {
                warn!(pages, "page limit reached, stopping traversal");
                complete = false;
                break;
            }
            if !visited.insert(url.to_string()) {
                warn!(url = %url, "next link revisits a page, stopping traversal");
                complete = false;
                break;
            }

            let page = match self.source.fetch_page(&url).await {
                Ok(page) => page,
                Err(e) => {
                    warn!(
                        error = %e,
                        names = index.len(),
                        "page fetch failed, keeping partial index"
                    );
                    complete = false;
                    break;
                }
            };
            pages += 1;
            remote_count = Some(page.count);
            overwritten += merge_rows(&mut index, &page.results);

            debug!(
                page = pages,
                names = index.len(),
                total = page.count,
                "fetched collection page"
            );
            if let Some(pb) = self.progress.as_ref() {
                pb.set_length(page.count);
                pb.set_position(index.len() as u64);
            }

            next = match page.next_link() {
                Some(link) => match api::resolve_link(&url, link) {
                    Ok(next_url) => Some(next_url),
                    Err(e) => {
                        warn!(error = %e, "stopping traversal");
                        complete = false;
                        None
                    }
                },
                None => None,
            };
        }

        if overwritten > 0 {
            warn!(
                overwritten,
                "duplicate names in collection, later entries replaced earlier ones"
            );
        }
        if let Some(count) = remote_count {
            if complete && index.len() as u64 != count {
                debug!(
                    names = index.len(),
                    count,
                    "index size differs from remote count, cache will not validate"
                );
            }
        }
        if let Some(pb) = self.progress.as_ref() {
            pb.finish_and_clear();
        }

        Traversal {
            index,
            pages,
            remote_count,
            complete,
        }
    }
}

/// Adds each row under its primary name. Returns the number of overwritten names.
pub fn merge_rows(index: &mut NameIndex, rows: &[Row]) -> usize {
    let mut overwritten = 0;
    for row in rows.iter() {
        let (name, target) = match (row.primary_name(), row.target()) {
            (Some(name), Some(target)) => (name, target),
            _ => {
                debug!(row = ?row, "skipping row without name or target");
                continue;
            }
        };
        if let Some(altname) = row.alternate_name() {
            trace!(name, altname, "alternate name not indexed");
        }
        if index.insert(name, target).is_some() {
            overwritten += 1;
        }
    }
    overwritten
}

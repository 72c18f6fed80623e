use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reqwest::Url;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::api::{ApiError, HttpPageSource, Page, PageSource, Row};
use crate::autocomplete::{AutocompleteController, Event, Key, RecordingNavigator};
use crate::index::{
    CachePort, CacheRecord, FileCache, IndexOrigin, LoaderOptions, MemoryCache, NameIndexLoader,
};

const FIRST: &str = "http://catalogue.test/api/v1/catalogue/astro_object/?format=json";
const SECOND: &str = "http://catalogue.test/api/v1/catalogue/astro_object/?format=json&page=2";
const THIRD: &str = "http://catalogue.test/api/v1/catalogue/astro_object/?format=json&page=3";

enum Reply {
    Page(Page),
    Fail(u16),
    /// Fails the first request, then serves the page.
    FailOnce(u16, Page),
}

#[derive(Default)]
struct FakeSource {
    replies: Mutex<HashMap<String, Reply>>,
    calls: Mutex<Vec<String>>,
}

impl FakeSource {
    fn with(&self, url: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(url.to_string(), reply);
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

#[async_trait]
impl PageSource for FakeSource {
    async fn fetch_page(&self, url: &Url) -> Result<Page, ApiError> {
        self.calls.lock().unwrap().push(url.to_string());
        let mut replies = self.replies.lock().unwrap();
        if let Some(Reply::FailOnce(status, page)) = replies.get(url.as_str()) {
            let status = *status;
            let page = page.clone();
            replies.insert(url.to_string(), Reply::Page(page));
            return Err(ApiError::Status {
                url: url.to_string(),
                status,
            });
        }
        match replies.get(url.as_str()) {
            Some(Reply::Page(page)) => Ok(page.clone()),
            Some(Reply::Fail(status)) | Some(Reply::FailOnce(status, _)) => {
                Err(ApiError::Status {
                    url: url.to_string(),
                    status: *status,
                })
            }
            None => Err(ApiError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

fn row(name: &str, target: &str) -> Row {
    Row {
        name: Some(name.to_string()),
        altname: None,
        frontend_url: Some(target.to_string()),
    }
}

fn page(count: u64, next: Option<&str>, rows: Vec<Row>) -> Reply {
    Reply::Page(Page {
        count,
        next: next.map(str::to_string),
        results: rows,
    })
}

/// Five objects across three pages, the second link relative.
fn three_page_source() -> Arc<FakeSource> {
    let source = Arc::new(FakeSource::default());
    source.with(
        FIRST,
        page(
            5,
            Some(SECOND),
            vec![row("NGC 104", "/a"), row("NGC 1049", "/b")],
        ),
    );
    source.with(
        SECOND,
        page(
            5,
            Some("?format=json&page=3"),
            vec![row("M13", "/catalogue/astro_object/m13"), row("M15", "/m15")],
        ),
    );
    source.with(THIRD, page(5, None, vec![row("Pal 5", "/pal5")]));
    source
}

fn loader<C: CachePort>(
    source: &Arc<FakeSource>,
    cache: C,
) -> NameIndexLoader<Arc<FakeSource>, C> {
    NameIndexLoader::new(source.clone(), cache, Url::parse(FIRST).unwrap())
}

#[tokio::test]
async fn full_fetch_walks_pages_in_order_and_matches_count() {
    let source = three_page_source();
    let report = loader(&source, MemoryCache::new()).load().await;

    assert_eq!(source.calls(), vec![FIRST, SECOND, THIRD]);
    assert_eq!(report.origin, IndexOrigin::Fetched);
    assert_eq!(report.pages, 3);
    assert!(report.complete);
    assert_eq!(report.remote_count, Some(5));
    assert_eq!(report.index.len() as u64, 5);
    assert_eq!(
        report.index.names().collect::<Vec<_>>(),
        vec!["NGC 104", "NGC 1049", "M13", "M15", "Pal 5"]
    );
}

#[tokio::test]
async fn second_load_with_unchanged_count_is_a_cache_hit() {
    let source = three_page_source();
    let cache = Arc::new(MemoryCache::new());
    let loader = loader(&source, cache.clone());

    let first = loader.load_index().await;
    source.reset_calls();
    let report = loader.load().await;

    assert_eq!(report.origin, IndexOrigin::CacheHit);
    assert_eq!(report.index, first);
    assert_eq!(report.pages, 0);
    assert_eq!(source.calls(), vec![FIRST]);
}

#[tokio::test]
async fn changed_count_triggers_refetch() {
    let source = three_page_source();
    let cache = Arc::new(MemoryCache::new());
    let loader = loader(&source, cache.clone());
    loader.load().await;

    source.with(
        THIRD,
        page(6, None, vec![row("Pal 5", "/pal5"), row("Pal 14", "/pal14")]),
    );
    source.with(
        FIRST,
        page(
            6,
            Some(SECOND),
            vec![row("NGC 104", "/a"), row("NGC 1049", "/b")],
        ),
    );
    source.reset_calls();

    let report = loader.load().await;
    assert_eq!(report.origin, IndexOrigin::Refreshed);
    assert_eq!(report.index.len(), 6);
    assert_eq!(source.calls(), vec![FIRST, FIRST, SECOND, THIRD]);
    assert_eq!(cache.read().unwrap().unwrap().entry_count(), 6);
}

#[tokio::test]
async fn failed_page_keeps_partial_index_and_stores_it() {
    let source = three_page_source();
    source.with(SECOND, Reply::Fail(502));
    let cache = Arc::new(MemoryCache::new());

    let report = loader(&source, cache.clone()).load().await;

    assert!(!report.complete);
    assert_eq!(report.pages, 1);
    assert_eq!(report.index.len(), 2);
    assert!((report.index.len() as u64) <= report.remote_count.unwrap());
    assert_eq!(source.calls(), vec![FIRST, SECOND]);
    assert_eq!(cache.read().unwrap().unwrap().entry_count(), 2);
}

#[tokio::test]
async fn partial_cache_is_refetched_on_next_load() {
    let source = three_page_source();
    source.with(SECOND, Reply::Fail(500));
    let cache = Arc::new(MemoryCache::new());
    let loader = loader(&source, cache.clone());
    loader.load().await;

    let fixed = three_page_source();
    source.with(SECOND, fixed.replies.lock().unwrap().remove(SECOND).unwrap());
    let report = loader.load().await;
    assert_eq!(report.origin, IndexOrigin::Refreshed);
    assert_eq!(report.index.len(), 5);
}

#[tokio::test]
async fn first_page_failure_yields_empty_index() {
    let source = Arc::new(FakeSource::default());
    source.with(FIRST, Reply::Fail(503));
    let report = loader(&source, MemoryCache::new()).load().await;
    assert!(report.index.is_empty());
    assert!(!report.complete);
    assert_eq!(report.remote_count, None);
}

#[tokio::test]
async fn corrupted_cache_is_treated_as_absent() {
    let source = three_page_source();
    let cache = Arc::new(MemoryCache::with_raw("[\"not\", \"a map\""));

    let report = loader(&source, cache.clone()).load().await;

    assert_eq!(report.origin, IndexOrigin::Fetched);
    assert_eq!(report.index.len(), 5);
    assert_eq!(cache.read().unwrap().unwrap().entry_count(), 5);
}

#[tokio::test]
async fn count_check_failure_refetches_instead_of_trusting_cache() {
    let source = three_page_source();
    let first = match source.replies.lock().unwrap().remove(FIRST).unwrap() {
        Reply::Page(page) => page,
        _ => unreachable!(),
    };
    source.with(FIRST, Reply::FailOnce(503, first));
    let cache = Arc::new(MemoryCache::new());
    cache
        .write(&CacheRecord::new([("M13", "/m13")].into_iter().collect()))
        .unwrap();

    let report = loader(&source, cache.clone()).load().await;

    assert_eq!(report.origin, IndexOrigin::Refreshed);
    assert!(report.complete);
    assert_eq!(report.index.len(), 5);
    assert_eq!(source.calls(), vec![FIRST, FIRST, SECOND, THIRD]);
    assert_eq!(cache.read().unwrap().unwrap().entry_count(), 5);
}

#[tokio::test]
async fn unverifiable_cache_is_never_served() {
    let source = Arc::new(FakeSource::default());
    source.with(FIRST, Reply::Fail(500));
    let cache = Arc::new(MemoryCache::new());
    cache
        .write(&CacheRecord::new([("M13", "/m13")].into_iter().collect()))
        .unwrap();

    let report = loader(&source, cache).load().await;

    assert_eq!(report.origin, IndexOrigin::Refreshed);
    assert!(!report.from_cache());
    assert!(!report.complete);
    assert!(report.index.is_empty());
}

#[tokio::test]
async fn refresh_option_skips_cache() {
    let source = three_page_source();
    let cache = Arc::new(MemoryCache::new());
    loader(&source, cache.clone()).load().await;
    source.reset_calls();

    let report = loader(&source, cache)
        .with_options(LoaderOptions {
            refresh: true,
            max_pages: None,
        })
        .load()
        .await;
    assert_eq!(report.origin, IndexOrigin::Fetched);
    assert_eq!(source.calls(), vec![FIRST, SECOND, THIRD]);
}

#[tokio::test]
async fn max_pages_bounds_traversal() {
    let source = three_page_source();
    let report = loader(&source, MemoryCache::new())
        .with_options(LoaderOptions {
            refresh: false,
            max_pages: Some(2),
        })
        .load()
        .await;
    assert_eq!(report.pages, 2);
    assert_eq!(report.index.len(), 4);
    assert!(!report.complete);
}

#[tokio::test]
async fn next_link_cycle_stops_traversal() {
    let source = Arc::new(FakeSource::default());
    source.with(FIRST, page(3, Some(SECOND), vec![row("M2", "/m2")]));
    source.with(SECOND, page(3, Some(FIRST), vec![row("M3", "/m3")]));

    let report = loader(&source, MemoryCache::new()).load().await;

    assert_eq!(source.calls(), vec![FIRST, SECOND]);
    assert_eq!(report.index.len(), 2);
    assert!(!report.complete);
}

#[tokio::test]
async fn rows_without_name_are_skipped_and_altnames_not_indexed() {
    let source = Arc::new(FakeSource::default());
    let mut tuc = row("NGC 104", "/a");
    tuc.altname = Some("47 Tuc".to_string());
    let nameless = Row {
        name: None,
        altname: Some("ghost".to_string()),
        frontend_url: Some("/ghost".to_string()),
    };
    let blank = row("   ", "/blank");
    let no_target = Row {
        name: Some("M4".to_string()),
        altname: None,
        frontend_url: None,
    };
    source.with(
        FIRST,
        page(4, None, vec![tuc, nameless, blank, no_target]),
    );

    let report = loader(&source, MemoryCache::new()).load().await;

    assert_eq!(report.index.names().collect::<Vec<_>>(), vec!["NGC 104"]);
    assert!(!report.index.contains("47 Tuc"));
}

#[tokio::test]
async fn names_are_indexed_as_received() {
    let source = Arc::new(FakeSource::default());
    source.with(
        FIRST,
        page(2, None, vec![row("M13", "/a"), row(" M13 ", "/b")]),
    );
    let cache = Arc::new(MemoryCache::new());
    let loader = loader(&source, cache);

    let report = loader.load().await;
    assert_eq!(report.index.names().collect::<Vec<_>>(), vec!["M13", " M13 "]);
    assert_eq!(report.index.get(" M13 "), Some("/b"));

    source.reset_calls();
    let report = loader.load().await;
    assert_eq!(report.origin, IndexOrigin::CacheHit);
    assert_eq!(source.calls(), vec![FIRST]);
}

#[tokio::test]
async fn duplicate_names_last_write_wins() {
    let source = Arc::new(FakeSource::default());
    source.with(FIRST, page(2, Some(SECOND), vec![row("Pal 1", "/first")]));
    source.with(SECOND, page(2, None, vec![row("Pal 1", "/second")]));

    let report = loader(&source, MemoryCache::new()).load().await;

    assert_eq!(report.index.len(), 1);
    assert_eq!(report.index.get("Pal 1"), Some("/second"));
}

#[tokio::test]
async fn file_cache_persists_between_loaders() {
    let dir = tempfile::tempdir().unwrap();
    let source = three_page_source();

    loader(&source, FileCache::new(dir.path(), "astroObjectNames"))
        .load()
        .await;
    source.reset_calls();

    let report = loader(&source, FileCache::new(dir.path(), "astroObjectNames"))
        .load()
        .await;
    assert_eq!(report.origin, IndexOrigin::CacheHit);
    assert_eq!(source.calls(), vec![FIRST]);

    std::fs::write(dir.path().join("astroObjectNames.json"), "garbage").unwrap();
    let report = loader(&source, FileCache::new(dir.path(), "astroObjectNames"))
        .load()
        .await;
    assert_eq!(report.origin, IndexOrigin::Fetched);
}

#[tokio::test]
async fn loaded_index_drives_autocomplete_selection() {
    let source = three_page_source();
    let index = loader(&source, MemoryCache::new()).load_index().await;
    let mut controller = AutocompleteController::attach("globalSearch", Arc::new(index));
    let mut navigator = RecordingNavigator::default();

    controller.dispatch(Event::Input("m1".to_string()), &mut navigator);
    assert_eq!(controller.state().candidates, vec!["M13", "M15"]);
    controller.dispatch(Event::Key(Key::ArrowDown), &mut navigator);
    controller.dispatch(Event::Key(Key::Enter), &mut navigator);

    assert_eq!(controller.state().value, "M13");
    assert!(!controller.state().is_open());
    assert_eq!(navigator.visited.len(), 1);
    assert_eq!(navigator.visited[0].target, "/catalogue/astro_object/m13");
}

/// Answers each connection with the `(status, body)` routed by request target.
async fn serve(listener: TcpListener, routes: HashMap<String, (u16, String)>) {
    while let Ok((mut stream, _)) = listener.accept().await {
        let mut head = Vec::new();
        let mut chunk = [0u8; 1024];
        while !head.windows(4).any(|w| w == b"\r\n\r\n") {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => head.extend_from_slice(&chunk[..n]),
            }
        }
        let head = String::from_utf8_lossy(&head);
        let target = head.split_whitespace().nth(1).unwrap_or("/").to_string();
        let (status, body) = routes
            .get(&target)
            .cloned()
            .unwrap_or((404, String::new()));
        let response = format!(
            "HTTP/1.1 {status} Stub\r\nContent-Type: application/json\r\n\
             Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let _ = stream.write_all(response.as_bytes()).await;
        let _ = stream.shutdown().await;
    }
}

const COLLECTION_PATH: &str = "/api/v1/catalogue/astro_object/?format=json";

async fn http_catalogue(routes: &[(&str, u16, &str)]) -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let routes = routes
        .iter()
        .map(|(path, status, body)| (path.to_string(), (*status, body.to_string())))
        .collect();
    tokio::spawn(serve(listener, routes));
    Url::parse(&format!("http://{addr}{COLLECTION_PATH}")).unwrap()
}

fn http_source() -> HttpPageSource {
    HttpPageSource::new(reqwest::Client::builder().no_proxy().build().unwrap())
}

#[tokio::test]
async fn http_source_decodes_collection_page() {
    let body = r#"{"count": 1, "next": null,
        "results": [{"name": "M13", "frontend_url": "/m13"}]}"#;
    let url = http_catalogue(&[(COLLECTION_PATH, 200, body)]).await;

    let page = http_source().fetch_page(&url).await.unwrap();

    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].primary_name(), Some("M13"));
    assert_eq!(page.next_link(), None);
}

#[tokio::test]
async fn http_source_reports_non_success_status() {
    let url = http_catalogue(&[(COLLECTION_PATH, 500, "oops")]).await;

    let err = http_source().fetch_page(&url).await.unwrap_err();

    assert!(matches!(err, ApiError::Status { status: 500, .. }), "{err}");
}

#[tokio::test]
async fn http_source_reports_undecodable_body() {
    let url = http_catalogue(&[(COLLECTION_PATH, 200, "<html>not json</html>")]).await;

    let err = http_source().fetch_page(&url).await.unwrap_err();

    assert!(matches!(err, ApiError::Decode { .. }), "{err}");
}

#[tokio::test]
async fn http_traversal_truncates_when_a_page_errors() {
    let first = r#"{"count": 3, "next": "?format=json&page=2",
        "results": [{"name": "NGC 104", "frontend_url": "/a"},
                    {"name": "M13", "frontend_url": "/m13"}]}"#;
    let url = http_catalogue(&[
        (COLLECTION_PATH, 200, first),
        ("/api/v1/catalogue/astro_object/?format=json&page=2", 500, ""),
    ])
    .await;
    let cache = Arc::new(MemoryCache::new());

    let report = NameIndexLoader::new(http_source(), cache.clone(), url)
        .load()
        .await;

    assert_eq!(report.origin, IndexOrigin::Fetched);
    assert!(!report.complete);
    assert_eq!(report.pages, 1);
    assert_eq!(report.remote_count, Some(3));
    assert_eq!(report.index.names().collect::<Vec<_>>(), vec!["NGC 104", "M13"]);
    assert_eq!(cache.read().unwrap().unwrap().entry_count(), 2);
}

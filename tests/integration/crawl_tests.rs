//! Integration tests for the crawler
//!
//! Most tests drive the coordinator with in-memory collaborators so every
//! fetch is deterministic. The last test runs the HTTP implementations
//! against a wiremock server end-to-end.

use async_trait::async_trait;
use site_mirror::config::Config;
use site_mirror::archive::WaybackClient;
use site_mirror::crawler::{
    build_http_client, BinaryFetcher, Collaborators, Coordinator, CrawlReport, CrawlStatus,
    DiscoveryError, FetchFailure, FetchedPage, HttpBinaryFetcher, HttpPageFetcher, PageFetcher,
    PageLinks, PageRequest, SitemapSource, SnapshotLookup,
};
use site_mirror::storage::{
    FileStateStore, PersistedState, StateStore, StorageError, StorageResult,
    ALREADY_DOWNLOADED_FILE, ERRORS_FILE, TO_DOWNLOAD_FILE,
};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOME: &str = "https://example.com";

/// A site served from memory
#[derive(Default)]
struct FakeSite {
    pages: HashMap<String, FetchedPage>,
    binaries: HashMap<String, Vec<u8>>,
    snapshots: HashMap<String, String>,
    robots_denied: HashSet<String>,

    /// Fetching this URL cancels the token and never completes
    hang_on: Option<(String, CancellationToken)>,

    requests: Mutex<Vec<(String, bool)>>,
}

impl FakeSite {
    fn page(mut self, url: &str, internal: &[&str], external: &[&str]) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                html: format!("<html><body>{}</body></html>", url),
                text: Some(format!("text of {}", url)),
                links: PageLinks {
                    internal: internal.iter().map(|s| s.to_string()).collect(),
                    external: external.iter().map(|s| s.to_string()).collect(),
                },
            },
        );
        self
    }

    fn binary(mut self, url: &str, bytes: &[u8]) -> Self {
        self.binaries.insert(url.to_string(), bytes.to_vec());
        self
    }

    fn snapshot(mut self, url: &str, snapshot: &str) -> Self {
        self.snapshots.insert(url.to_string(), snapshot.to_string());
        self
    }

    fn deny(mut self, url: &str) -> Self {
        self.robots_denied.insert(url.to_string());
        self
    }

    fn hang_on(mut self, url: &str, cancel: CancellationToken) -> Self {
        self.hang_on = Some((url.to_string(), cancel));
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|(url, _)| url.clone())
            .collect()
    }

    fn record(&self, url: &str, respect_robots: bool) {
        self.requests
            .lock()
            .unwrap()
            .push((url.to_string(), respect_robots));
    }

    async fn maybe_hang(&self, url: &str) {
        if let Some((hang_url, cancel)) = &self.hang_on {
            if hang_url == url {
                cancel.cancel();
                std::future::pending::<()>().await;
            }
        }
    }
}

#[async_trait]
impl PageFetcher for FakeSite {
    async fn fetch_page(&self, request: &PageRequest) -> Result<FetchedPage, FetchFailure> {
        self.record(&request.url, request.respect_robots);
        self.maybe_hang(&request.url).await;

        if request.respect_robots && self.robots_denied.contains(&request.url) {
            return Err(FetchFailure::RobotsDenied);
        }
        self.pages
            .get(&request.url)
            .cloned()
            .ok_or(FetchFailure::Http(404))
    }
}

#[async_trait]
impl BinaryFetcher for FakeSite {
    async fn fetch_binary(&self, url: &str) -> Result<Vec<u8>, FetchFailure> {
        self.record(url, false);
        self.maybe_hang(url).await;
        self.binaries.get(url).cloned().ok_or(FetchFailure::Http(404))
    }
}

#[async_trait]
impl SnapshotLookup for FakeSite {
    async fn lookup_snapshot(&self, url: &str, _date: Option<&str>) -> Option<String> {
        self.snapshots.get(url).cloned()
    }
}

/// Sitemap that cancels the crawl and never answers
struct StalledSitemap(CancellationToken);

#[async_trait]
impl SitemapSource for StalledSitemap {
    async fn discover_sitemap(&self, _start_url: &str) -> Result<Vec<String>, DiscoveryError> {
        self.0.cancel();
        std::future::pending::<Result<Vec<String>, DiscoveryError>>().await
    }
}

struct FixedSitemap(Vec<String>);

#[async_trait]
impl SitemapSource for FixedSitemap {
    async fn discover_sitemap(&self, _start_url: &str) -> Result<Vec<String>, DiscoveryError> {
        Ok(self.0.clone())
    }
}

#[derive(Default)]
struct StoreLog {
    saves: Vec<PersistedState>,
    save_calls: usize,
    output: Option<Vec<String>>,
}

/// In-memory store whose first save fails
#[derive(Clone, Default)]
struct FlakyStore(Arc<Mutex<StoreLog>>);

impl StateStore for FlakyStore {
    fn load(&self) -> StorageResult<PersistedState> {
        Ok(PersistedState::default())
    }

    fn save(&self, state: &PersistedState) -> StorageResult<()> {
        let mut log = self.0.lock().unwrap();
        log.save_calls += 1;
        if log.save_calls == 1 {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "disk full",
            )));
        }
        log.saves.push(state.clone());
        Ok(())
    }

    fn write_output_list(&self, visited: &[String]) -> StorageResult<()> {
        self.0.lock().unwrap().output = Some(visited.to_vec());
        Ok(())
    }
}

fn collaborators(site: Arc<FakeSite>) -> Collaborators {
    Collaborators {
        pages: site.clone(),
        binaries: site.clone(),
        snapshots: site,
        sitemap: None,
        archive_index: None,
    }
}

/// Temporary mirror, state and output locations for one test
struct Workspace {
    dir: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    fn config(&self) -> Config {
        let mut config = Config::default();
        config.crawler.delay_secs = 0.0;
        config.output.output_dir = self.dir.path().join("mirror");
        config.output.state_dir = self.dir.path().join("state");
        config.output.output_list = self.dir.path().join("links.txt");
        config
    }

    fn mirror(&self, relative: &str) -> PathBuf {
        self.dir.path().join("mirror").join(relative)
    }

    fn state_file(&self, name: &str) -> PathBuf {
        self.dir.path().join("state").join(name)
    }

    fn lines(&self, path: &Path) -> Vec<String> {
        std::fs::read_to_string(path)
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn write_state(&self, name: &str, urls: &[&str]) {
        std::fs::create_dir_all(self.dir.path().join("state")).unwrap();
        let mut content = urls.join("\n");
        content.push('\n');
        std::fs::write(self.state_file(name), content).unwrap();
    }

    async fn run(&self, config: &Config, site: Arc<FakeSite>, cancel: CancellationToken) -> CrawlReport {
        self.run_with(config, collaborators(site), cancel).await
    }

    async fn run_with(
        &self,
        config: &Config,
        collaborators: Collaborators,
        cancel: CancellationToken,
    ) -> CrawlReport {
        let store = FileStateStore::new(&config.output.state_dir, &config.output.output_list);
        let coordinator = Coordinator::new(config, HOME, collaborators, Box::new(store)).unwrap();
        coordinator.run(cancel).await.unwrap()
    }
}

#[tokio::test]
async fn test_crawl_follows_internal_links_and_stays_in_scope() {
    let ws = Workspace::new();
    let site = Arc::new(
        FakeSite::default()
            .page(HOME, &["https://example.com/a", "https://example.com/b"], &["https://other.org/x"])
            .page("https://example.com/a", &[HOME], &[])
            .page("https://example.com/b", &[], &[]),
    );

    let report = ws.run(&ws.config(), site.clone(), CancellationToken::new()).await;

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.visited, 3);
    assert_eq!(report.errors, 0);
    assert_eq!(report.pending, 0);
    assert_eq!(
        site.requested(),
        vec![HOME, "https://example.com/a", "https://example.com/b"]
    );

    assert!(ws.mirror("web/example_com/index.html").exists());
    assert!(ws.mirror("web/example_com/a/index.html").exists());
    assert!(ws.mirror("web/example_com/b/index.html").exists());
    assert!(!ws.mirror("web/other_org").exists());

    let listed = ws.lines(&ws.dir.path().join("links.txt"));
    assert_eq!(
        listed,
        vec![HOME, "https://example.com/a", "https://example.com/b"]
    );
    assert!(ws.lines(&ws.state_file(TO_DOWNLOAD_FILE)).is_empty());
    assert!(ws.lines(&ws.state_file(ERRORS_FILE)).is_empty());
    assert_eq!(ws.lines(&ws.state_file(ALREADY_DOWNLOADED_FILE)).len(), 3);
}

#[tokio::test]
async fn test_relative_links_are_resolved_against_the_page() {
    let ws = Workspace::new();
    let site = Arc::new(
        FakeSite::default()
            .page(HOME, &["/about", "docs/intro", "#top"], &["//other.org/x"])
            .page("https://example.com/about", &["../docs/intro"], &[])
            .page("https://example.com/docs/intro", &[], &[]),
    );

    let report = ws.run(&ws.config(), site.clone(), CancellationToken::new()).await;

    assert_eq!(report.visited, 3);
    assert_eq!(report.errors, 0);
    assert_eq!(
        site.requested(),
        vec![HOME, "https://example.com/about", "https://example.com/docs/intro"]
    );
    assert!(ws.mirror("web/example_com/docs/intro/index.html").exists());
}

#[tokio::test]
async fn test_failed_pdf_is_recovered_from_archive_at_original_path() {
    let ws = Workspace::new();
    let snapshot = "https://web.archive.org/web/20190601000000id_/https://example.com/doc.pdf";
    let site = Arc::new(
        FakeSite::default()
            .page(HOME, &["https://example.com/doc.pdf"], &[])
            .snapshot("https://example.com/doc.pdf", snapshot)
            .binary(snapshot, b"%PDF-archived"),
    );

    let mut config = ws.config();
    config.content.web = true;
    config.content.pdf = true;

    let report = ws.run(&config, site.clone(), CancellationToken::new()).await;

    assert_eq!(report.visited, 2);
    assert_eq!(report.errors, 0);
    assert_eq!(
        site.requested(),
        vec![HOME, "https://example.com/doc.pdf", snapshot]
    );
    let saved = std::fs::read(ws.mirror("pdf/example_com/doc.pdf")).unwrap();
    assert_eq!(saved, b"%PDF-archived");
}

#[tokio::test]
async fn test_url_failing_live_and_archived_is_recorded_as_error() {
    let ws = Workspace::new();
    let site = Arc::new(
        FakeSite::default()
            .page(HOME, &["https://example.com/missing", "https://example.com/gone"], &[])
            .snapshot(
                "https://example.com/gone",
                "https://web.archive.org/web/2019id_/https://example.com/gone",
            ),
    );

    let report = ws.run(&ws.config(), site, CancellationToken::new()).await;

    assert_eq!(report.visited, 1);
    assert_eq!(report.errors, 2);
    assert_eq!(
        ws.lines(&ws.state_file(ERRORS_FILE)),
        vec!["https://example.com/gone", "https://example.com/missing"]
    );
    assert!(!ws.mirror("web/example_com/missing/index.html").exists());
    assert!(!ws.mirror("web/example_com/gone/index.html").exists());
    assert_eq!(ws.lines(&ws.dir.path().join("links.txt")), vec![HOME]);
}

#[tokio::test]
async fn test_resume_processes_only_pending_urls() {
    let ws = Workspace::new();
    ws.write_state(
        TO_DOWNLOAD_FILE,
        &[
            "https://example.com/1",
            "https://example.com/2",
            "https://example.com/3",
            "https://example.com/4",
            "https://example.com/5",
        ],
    );
    ws.write_state(
        ALREADY_DOWNLOADED_FILE,
        &["https://example.com/2", "https://example.com/4"],
    );

    let mut site = FakeSite::default();
    for i in 1..=5 {
        site = site.page(&format!("https://example.com/{}", i), &[], &[]);
    }
    let site = Arc::new(site);

    let report = ws.run(&ws.config(), site.clone(), CancellationToken::new()).await;

    assert_eq!(report.processed, 3);
    assert_eq!(report.visited, 5);
    assert_eq!(
        site.requested(),
        vec![
            "https://example.com/1",
            "https://example.com/3",
            "https://example.com/5"
        ]
    );
}

#[tokio::test]
async fn test_disabled_content_is_marked_visited_without_fetching() {
    let ws = Workspace::new();
    let site = Arc::new(FakeSite::default().page(
        HOME,
        &["https://example.com/photo.JPG", "https://example.com/report.pdf"],
        &[],
    ));

    let report = ws.run(&ws.config(), site.clone(), CancellationToken::new()).await;

    assert_eq!(report.visited, 3);
    assert_eq!(site.requested(), vec![HOME]);
    assert!(!ws.mirror("media").exists());
    assert!(!ws.mirror("pdf").exists());
}

#[tokio::test]
async fn test_interrupted_crawl_resumes_without_reprocessing() {
    let ws = Workspace::new();
    let config = ws.config();
    let cancel = CancellationToken::new();

    let first = Arc::new(
        FakeSite::default()
            .page(HOME, &["https://example.com/a", "https://example.com/b"], &[])
            .hang_on("https://example.com/a", cancel.clone()),
    );
    let report = ws.run(&config, first.clone(), cancel).await;

    assert_eq!(report.status, CrawlStatus::Interrupted);
    assert_eq!(report.visited, 1);
    assert_eq!(report.pending, 2);
    assert_eq!(
        ws.lines(&ws.state_file(TO_DOWNLOAD_FILE)),
        vec!["https://example.com/a", "https://example.com/b"]
    );
    assert_eq!(ws.lines(&ws.state_file(ALREADY_DOWNLOADED_FILE)), vec![HOME]);
    assert_eq!(ws.lines(&ws.dir.path().join("links.txt")), vec![HOME]);

    let second = Arc::new(
        FakeSite::default()
            .page(HOME, &["https://example.com/a", "https://example.com/b"], &[])
            .page("https://example.com/a", &[], &[])
            .page("https://example.com/b", &[], &[]),
    );
    let report = ws.run(&config, second.clone(), CancellationToken::new()).await;

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.visited, 3);
    assert_eq!(
        second.requested(),
        vec!["https://example.com/a", "https://example.com/b"]
    );

    // A finished crawl started again has nothing left to do
    let third = Arc::new(FakeSite::default().page(HOME, &[], &[]));
    let report = ws.run(&config, third.clone(), CancellationToken::new()).await;
    assert_eq!(report.processed, 0);
    assert!(third.requested().is_empty());
    assert_eq!(ws.lines(&ws.dir.path().join("links.txt")).len(), 3);
}

#[tokio::test]
async fn test_cancelled_before_start_keeps_seeded_frontier() {
    let ws = Workspace::new();
    let cancel = CancellationToken::new();
    cancel.cancel();

    let site = Arc::new(FakeSite::default().page(HOME, &[], &[]));
    let report = ws.run(&ws.config(), site.clone(), cancel).await;

    assert_eq!(report.status, CrawlStatus::Interrupted);
    assert!(site.requested().is_empty());
}

#[tokio::test]
async fn test_interrupted_discovery_runs_again_on_resume() {
    let ws = Workspace::new();
    let config = ws.config();
    let cancel = CancellationToken::new();

    let site = Arc::new(FakeSite::default().page(HOME, &[], &[]));
    let mut stalled = collaborators(site.clone());
    stalled.sitemap = Some(Arc::new(StalledSitemap(cancel.clone())));

    let report = ws.run_with(&config, stalled, cancel).await;

    assert_eq!(report.status, CrawlStatus::Interrupted);
    assert_eq!(report.pending, 0);
    assert!(site.requested().is_empty());
    assert!(ws.lines(&ws.state_file(TO_DOWNLOAD_FILE)).is_empty());

    let site = Arc::new(
        FakeSite::default()
            .page(HOME, &[], &[])
            .page("https://example.com/from-sitemap", &[], &[]),
    );
    let mut resumed = collaborators(site.clone());
    resumed.sitemap = Some(Arc::new(FixedSitemap(vec![
        "https://example.com/from-sitemap".to_string(),
    ])));

    let report = ws.run_with(&config, resumed, CancellationToken::new()).await;

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.visited, 2);
    assert_eq!(
        site.requested(),
        vec![HOME, "https://example.com/from-sitemap"]
    );
}

#[tokio::test]
async fn test_failed_checkpoint_stops_crawl_but_still_finalizes() {
    let ws = Workspace::new();
    let mut config = ws.config();
    config.crawler.checkpoint_interval = 1;

    let site = Arc::new(
        FakeSite::default()
            .page(HOME, &["https://example.com/a", "https://example.com/b"], &[])
            .page("https://example.com/a", &[], &[])
            .page("https://example.com/b", &[], &[]),
    );
    let store = FlakyStore::default();
    let coordinator =
        Coordinator::new(&config, HOME, collaborators(site.clone()), Box::new(store.clone()))
            .unwrap();

    let result = coordinator.run(CancellationToken::new()).await;

    assert!(matches!(result, Err(StorageError::Io(_))));
    assert_eq!(site.requested(), vec![HOME]);

    let log = store.0.lock().unwrap();
    assert_eq!(log.save_calls, 2);
    let mut final_state = log.saves.last().unwrap().clone();
    final_state.frontier.sort();
    assert_eq!(final_state.visited, vec![HOME]);
    assert_eq!(
        final_state.frontier,
        vec!["https://example.com/a", "https://example.com/b"]
    );
    assert_eq!(log.output.as_deref(), Some(&[HOME.to_string()][..]));
}

#[tokio::test]
async fn test_text_sidecar_is_written() {
    let ws = Workspace::new();
    let site = Arc::new(FakeSite::default().page(HOME, &[], &[]));

    let mut config = ws.config();
    config.content.text = true;
    config.content.text_extension = ".md".to_string();

    ws.run(&config, site, CancellationToken::new()).await;

    let text = std::fs::read_to_string(ws.mirror("text/example_com/index.md")).unwrap();
    assert_eq!(text, "text of https://example.com");
    assert!(ws.mirror("web/example_com/index.html").exists());
}

#[tokio::test]
async fn test_archive_fallback_ignores_robots_and_links() {
    let ws = Workspace::new();
    let snapshot = "https://web.archive.org/web/2020id_/https://example.com/private";
    let site = Arc::new(
        FakeSite::default()
            .page(HOME, &["https://example.com/private"], &[])
            .page("https://example.com/private", &[], &[])
            .deny("https://example.com/private")
            .page(snapshot, &["https://example.com/only-in-archive"], &[]),
    );

    let mut config = ws.config();
    config.crawler.respect_robots = true;

    let report = ws.run(&config, site.clone(), CancellationToken::new()).await;

    assert_eq!(report.visited, 1);
    assert_eq!(report.errors, 1);

    // No snapshot was registered yet; try again with one
    let ws = Workspace::new();
    let site = Arc::new(
        FakeSite::default()
            .page(HOME, &["https://example.com/private"], &[])
            .deny("https://example.com/private")
            .snapshot("https://example.com/private", snapshot)
            .page(snapshot, &["https://example.com/only-in-archive"], &[]),
    );
    let report = ws.run(&config, site.clone(), CancellationToken::new()).await;

    assert_eq!(report.visited, 2);
    assert_eq!(report.errors, 0);
    let requests = site.requests.lock().unwrap().clone();
    assert_eq!(
        requests,
        vec![
            (HOME.to_string(), true),
            ("https://example.com/private".to_string(), true),
            (snapshot.to_string(), false),
        ]
    );
    let html = std::fs::read_to_string(ws.mirror("web/example_com/private/index.html")).unwrap();
    assert!(html.contains(snapshot));
}

#[tokio::test]
async fn test_http_collaborators_end_to_end() {
    let server = MockServer::start().await;
    let base = server.uri();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            r#"<html><body>
                <a href="/about">About</a>
                <a href="/doc.pdf">Report</a>
                <a href="https://elsewhere.invalid/page">Elsewhere</a>
                </body></html>"#,
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/about"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(r#"<html><body><a href="{}/">Home</a></body></html>"#, base),
            "text/html",
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/doc.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/wayback/available"))
        .respond_with(ResponseTemplate::new(200).set_body_string(format!(
            r#"{{"archived_snapshots": {{"closest": {{"available": true, "url": "{0}/web/20190601000000/{0}/doc.pdf"}}}}}}"#,
            base
        )))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path_regex(r"^/web/20190601000000id_/.*doc\.pdf$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.4 archived".to_vec()))
        .mount(&server)
        .await;

    let ws = Workspace::new();
    let mut config = ws.config();
    config.content.web = true;
    config.content.pdf = true;

    let client = build_http_client(&config.user_agent, Duration::from_secs(5)).unwrap();
    let wayback = Arc::new(WaybackClient::with_endpoints(
        client.clone(),
        format!("{}/cdx/search/cdx", base),
        format!("{}/wayback/available", base),
    ));
    let collaborators = Collaborators {
        pages: Arc::new(HttpPageFetcher::new(client.clone(), "SiteMirror")),
        binaries: Arc::new(HttpBinaryFetcher::new(client, Duration::from_secs(5))),
        snapshots: wayback,
        sitemap: None,
        archive_index: None,
    };
    let store = FileStateStore::new(&config.output.state_dir, &config.output.output_list);
    let coordinator = Coordinator::new(&config, &base, collaborators, Box::new(store)).unwrap();

    let report = coordinator.run(CancellationToken::new()).await.unwrap();

    assert_eq!(report.status, CrawlStatus::Completed);
    assert_eq!(report.visited, 3);
    assert_eq!(report.errors, 0);

    let host_dir = format!("127_0_0_1_{}", server.address().port());
    assert!(ws.mirror(&format!("web/{}/index.html", host_dir)).exists());
    assert!(ws.mirror(&format!("web/{}/about/index.html", host_dir)).exists());
    let pdf = std::fs::read(ws.mirror(&format!("pdf/{}/doc.pdf", host_dir))).unwrap();
    assert_eq!(pdf, b"%PDF-1.4 archived");

    let listed = ws.lines(&ws.dir.path().join("links.txt"));
    assert_eq!(
        listed,
        vec![base.clone(), format!("{}/about", base), format!("{}/doc.pdf", base)]
    );
}

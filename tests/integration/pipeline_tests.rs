//! End-to-end ingestion, search, deletion and rebuild over on-disk stores

use readengine::config::Config;
use readengine::engine::{open, Coordinator, QueryEngine, SqliteCoordinator};
use readengine::extract::ExtractOptions;
use readengine::fetch::{FetchError, Fetcher};
use readengine::index::{SearchIndex, SearchRequest, SqliteSearchIndex};
use readengine::storage::{DocumentStore, SqliteDocumentStore, StorageError};
use readengine::tokenizer::{DefaultTokenizer, Tokenizer};
use readengine::{Document, IngestState, ReadEngineError};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Barrier};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_config(store: &Path) -> Config {
    let mut config = Config::default();
    config.store.path = store.to_path_buf();
    config.fetch.user_agent = "ReadEngineTest/1.0".to_string();
    config
}

fn article(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{}</title></head><body>
        <nav><a href="/">Home</a> <a href="/about">About</a> menu</nav>
        <!-- tracking snippet: secretcomment -->
        <article><p>{}</p></article>
        <footer>copyright footer</footer>
        </body></html>"#,
        title, body
    )
}

async fn mount_page(server: &MockServer, route: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(html)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

async fn ingest(coordinator: &mut SqliteCoordinator, url: &str) -> i64 {
    coordinator
        .ingest_url(url, &CancellationToken::new())
        .await
        .expect("ingestion should succeed")
        .document
        .id
}

#[tokio::test]
async fn test_ingest_search_read_delete() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/rust",
        article("Rust ownership", "Ownership rules make memory safety possible without a garbage collector."),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let mut coordinator = open(&config).unwrap();

    let url = format!("{}/rust", mock_server.uri());
    let report = coordinator
        .ingest_url(&url, &CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.state, IngestState::Indexed);
    let document = coordinator.get(report.document.id).unwrap();
    assert_eq!(document.title, "Rust ownership");
    assert_eq!(document.source, url);
    assert!(document.content.contains("garbage collector"));
    assert!(!document.content.contains("menu"));
    assert!(!document.content.contains("secretcomment"));
    assert!(!document.content.contains("copyright"));

    let engine = QueryEngine::new(&config.search);
    let results = engine.search(coordinator.index(), "garbage collector", None).unwrap();
    assert_eq!(results.total, 1);
    assert_eq!(results.hits[0].id, document.id);
    let snippet = results.hits[0].snippet.as_deref().unwrap();
    assert!(snippet.contains("<mark>garbage</mark> <mark>collector</mark>"));

    assert_eq!(engine.search(coordinator.index(), "secretcomment", None).unwrap().total, 0);
    assert_eq!(engine.search(coordinator.index(), "haskell", None).unwrap().total, 0);

    let deleted = coordinator.delete(document.id).unwrap();
    assert!(deleted.index_removed);
    assert!(matches!(
        coordinator.get(document.id),
        Err(ReadEngineError::Storage(StorageError::NotFound(_)))
    ));
    assert_eq!(engine.search(coordinator.index(), "garbage", None).unwrap().total, 0);
}

#[tokio::test]
async fn test_rebuild_reproduces_sequential_index() {
    let mock_server = MockServer::start().await;
    let pages = [
        ("/a", "Tea", "Green tea leaves are steamed shortly after picking in spring."),
        ("/b", "Coffee", "Coffee beans are roasted; some people add green cardamom to them."),
        ("/c", "Cocoa", "Cocoa pods are fermented before the beans are dried and roasted."),
    ];
    for (route, title, body) in pages {
        mount_page(&mock_server, route, article(title, body)).await;
    }

    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    let mut coordinator = open(&config).unwrap();
    for (route, _, _) in pages {
        ingest(&mut coordinator, &format!("{}{}", mock_server.uri(), route)).await;
    }

    let engine = QueryEngine::new(&config.search);
    let queries = ["green", "roasted", "beans", "spring"];
    let before: Vec<_> = queries
        .iter()
        .map(|q| engine.search(coordinator.index(), q, None).unwrap())
        .collect();

    let report = coordinator.rebuild().unwrap();
    assert_eq!(report.scanned, 3);
    assert_eq!(report.indexed, 3);
    assert!(report.failed.is_empty());

    let stats = coordinator.stats().unwrap();
    assert_eq!(stats.documents, 3);
    assert_eq!(stats.indexed, 3);

    for (query, expected) in queries.iter().zip(&before) {
        let after = engine.search(coordinator.index(), query, None).unwrap();
        let ids = |r: &readengine::engine::QueryResults| r.hits.iter().map(|h| h.id).collect::<Vec<_>>();
        assert_eq!(after.total, expected.total, "total for {}", query);
        assert_eq!(ids(&after), ids(expected), "hits for {}", query);
    }
}

#[tokio::test]
async fn test_rebuild_recovers_lost_index() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/page",
        article("Recovery", "The index database can always be recreated from the store."),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let config = test_config(dir.path());
    {
        let mut coordinator = open(&config).unwrap();
        ingest(&mut coordinator, &format!("{}/page", mock_server.uri())).await;
    }

    // Lose the derived index entirely
    for suffix in ["", "-wal", "-shm"] {
        let file = dir.path().join(format!("index.db{}", suffix));
        if file.exists() {
            std::fs::remove_file(file).unwrap();
        }
    }

    let mut coordinator = open(&config).unwrap();
    assert_eq!(coordinator.stats().unwrap().indexed, 0);

    coordinator.rebuild().unwrap();
    let engine = QueryEngine::new(&config.search);
    assert_eq!(engine.search(coordinator.index(), "recreated", None).unwrap().total, 1);
}

#[tokio::test]
async fn test_failed_fetch_stores_nothing() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut coordinator = open(&test_config(dir.path())).unwrap();

    let err = coordinator
        .ingest_url(&format!("{}/broken", mock_server.uri()), &CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ReadEngineError::Fetch(FetchError::Status { status: 500, .. })
    ));
    assert_eq!(coordinator.stats().unwrap().documents, 0);
}

#[tokio::test]
async fn test_markup_mode_reverts_unverifiable_images() {
    let mock_server = MockServer::start().await;
    let html = r#"<html><head><title>Gallery</title></head><body><article>
        <p>A gallery page with two pictures and enough words to be selected.</p>
        <p><img src="/img/ok.png"><img src="img/missing.png"></p>
        </article></body></html>"#;
    mount_page(&mock_server, "/posts/gallery", html.to_string()).await;
    Mock::given(method("HEAD"))
        .and(path("/img/ok.png"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;
    Mock::given(method("HEAD"))
        .and(path("/posts/img/missing.png"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.extract.description_as_plain_text = false;
    let mut coordinator = open(&config).unwrap();

    let id = ingest(&mut coordinator, &format!("{}/posts/gallery", mock_server.uri())).await;
    let content = coordinator.get(id).unwrap().content;

    assert!(content.contains(&format!(r#"<img src="{}/img/ok.png">"#, mock_server.uri())));
    assert!(content.contains(r#"<img src="img/missing.png">"#));
    assert!(content.starts_with("<p>A gallery page"));
}

#[tokio::test]
async fn test_slow_image_check_keeps_original_reference() {
    let mock_server = MockServer::start().await;
    let html = r#"<html><head><title>Slow</title></head><body><article>
        <p>A page whose only picture is served by a very slow image host.</p>
        <p><img src="/img/slow.png"></p>
        </article></body></html>"#;
    mount_page(&mock_server, "/slow", html.to_string()).await;
    Mock::given(method("HEAD"))
        .and(path("/img/slow.png"))
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
        .mount(&mock_server)
        .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.extract.description_as_plain_text = false;
    config.extract.image_request_timeout_millis = 200;
    let mut coordinator = open(&config).unwrap();

    let started = std::time::Instant::now();
    let id = ingest(&mut coordinator, &format!("{}/slow", mock_server.uri())).await;
    assert!(started.elapsed() < Duration::from_secs(2));

    let content = coordinator.get(id).unwrap().content;
    assert!(content.contains(r#"<img src="/img/slow.png">"#), "{}", content);
    assert!(!content.contains(&mock_server.uri()));
}

#[tokio::test]
async fn test_markup_description_searches_visible_text() {
    let mock_server = MockServer::start().await;
    mount_page(
        &mock_server,
        "/linked",
        article(
            "Linked",
            r#"Start with <a href="/xyzzy.html">the first chapter</a> and read the rest in order."#,
        ),
    )
    .await;

    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.extract.description_as_plain_text = false;
    let mut coordinator = open(&config).unwrap();
    let id = ingest(&mut coordinator, &format!("{}/linked", mock_server.uri())).await;
    assert!(coordinator.get(id).unwrap().content.contains("href"));

    let engine = QueryEngine::new(&config.search);
    for markup_word in ["href", "xyzzy", "html"] {
        assert_eq!(
            engine.search(coordinator.index(), markup_word, None).unwrap().total,
            0,
            "{} should not match",
            markup_word
        );
    }

    let results = engine.search(coordinator.index(), "chapter", None).unwrap();
    assert_eq!(results.total, 1);
    let snippet = results.hits[0].snippet.as_deref().unwrap();
    assert!(snippet.contains("the first <mark>chapter</mark> and read"), "{}", snippet);
    assert!(!snippet.replace("<mark>", "").replace("</mark>", "").contains('<'), "{}", snippet);

    coordinator.rebuild().unwrap();
    assert_eq!(engine.search(coordinator.index(), "href", None).unwrap().total, 0);
}

/// Tokenizer that parks its first call after being armed until released
struct GatedTokenizer {
    inner: DefaultTokenizer,
    armed: AtomicBool,
    gate: Arc<Barrier>,
}

impl Tokenizer for GatedTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        if self.armed.swap(false, Ordering::SeqCst) {
            self.gate.wait();
            self.gate.wait();
        }
        self.inner.tokenize(text)
    }
}

#[test]
fn test_delete_from_other_handle_waits_for_rebuild() {
    let dir = TempDir::new().unwrap();
    let mut config = test_config(dir.path());
    config.store.lock_timeout_millis = 100;

    {
        let mut store = SqliteDocumentStore::new(&config.store.data_path()).unwrap();
        let mut index =
            SqliteSearchIndex::new(&config.store.index_path(), Arc::new(DefaultTokenizer::new())).unwrap();
        for doc in [
            Document::new(1, "keep", "Keep", "a document that stays"),
            Document::new(2, "victim", "Victim", "victimword appears only here"),
        ] {
            store.put(&doc).unwrap();
            index.index(&doc).unwrap();
        }
    }

    // Handle A rebuilds with a tokenizer that can be paused mid-rebuild
    let gate = Arc::new(Barrier::new(2));
    let tokenizer = Arc::new(GatedTokenizer {
        inner: DefaultTokenizer::new(),
        armed: AtomicBool::new(false),
        gate: Arc::clone(&gate),
    });
    let store = SqliteDocumentStore::new(&config.store.data_path()).unwrap();
    let index = SqliteSearchIndex::new(&config.store.index_path(), tokenizer.clone()).unwrap();
    let mut rebuilder = Coordinator::new(
        store,
        index,
        Fetcher::new(&config.fetch).unwrap(),
        ExtractOptions::from(&config.extract),
    );

    // Handle B stands for a second process working on the same directory
    let mut other = open(&config).unwrap();

    tokenizer.armed.store(true, Ordering::SeqCst);
    let rebuild = std::thread::spawn(move || rebuilder.rebuild());
    gate.wait();

    // The rebuild has scanned the store and is writing the new index
    let delete_during_rebuild = other.delete(2);
    let hits_during_rebuild = other
        .index()
        .search(&SearchRequest::new("victimword"))
        .unwrap()
        .total;

    gate.wait();
    let report = rebuild.join().unwrap().unwrap();

    assert!(matches!(
        delete_during_rebuild,
        Err(ReadEngineError::Storage(StorageError::Sqlite(_)))
    ));
    assert_eq!(hits_during_rebuild, 1);
    assert_eq!(report.scanned, 2);
    assert_eq!(report.indexed, 2);

    // Once the rebuild is done the delete goes through and sticks
    let deleted = other.delete(2).unwrap();
    assert!(deleted.index_removed);
    let stats = other.stats().unwrap();
    assert_eq!(stats.documents, 1);
    assert_eq!(stats.indexed, 1);
    assert_eq!(
        other.index().search(&SearchRequest::new("victimword")).unwrap().total,
        0
    );
}

#[tokio::test]
async fn test_ingest_local_file() {
    let dir = TempDir::new().unwrap();
    let file = dir.path().join("saved-page.html");
    std::fs::write(
        &file,
        "<html><body><div><p>A saved page without any title element, only body text.</p></div></body></html>",
    )
    .unwrap();

    let mut coordinator = open(&test_config(&dir.path().join("store"))).unwrap();
    let report = coordinator.ingest_file(&file).await.unwrap();

    assert_eq!(report.document.title, "saved-page");
    assert_eq!(report.document.source, file.display().to_string());
    assert_eq!(coordinator.index().doc_count().unwrap(), 1);
}

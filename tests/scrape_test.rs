//! End-to-end crawler tests against a local mock of the abstracts site

use isef_scout::config::Config;
use isef_scout::crawl::Crawler;
use isef_scout::storage::Store;
use isef_scout::{Progress, Project};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

fn project_page(title: &str) -> String {
    format!(
        r#"<html><body><div class="container">
<h2>{}</h2>
<p><strong>Category:</strong> Physics</p>
<p><strong>Year:</strong> 2021</p>
</div></body></html>"#,
        title
    )
}

fn test_config(server: &MockServer, dir: &TempDir) -> Config {
    let mut config = Config::default().without_delays();
    config.root = dir.path().to_path_buf();
    config.scrape.base_url = server.uri();
    config
}

async fn mount_project(server: &MockServer, id: u32, title: &str, hits: u64) {
    Mock::given(method("GET"))
        .and(path("/Home/FullAbstract"))
        .and(query_param("projectId", id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_string(project_page(title)))
        .expect(hits)
        .mount(server)
        .await;
}

/// What the store held on disk when a page was requested
#[derive(Debug, Clone, PartialEq)]
struct Snapshot {
    last_id: u32,
    ids: Vec<u32>,
}

/// Answers 404 and records the on-disk state at the time of the request
struct SnapshotResponder {
    store: Store,
    seen: Arc<Mutex<Option<Snapshot>>>,
}

impl Respond for SnapshotResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let snapshot = Snapshot {
            last_id: self.store.load_progress(0).unwrap().last_id,
            ids: stored_ids(&self.store),
        };
        *self.seen.lock().unwrap() = Some(snapshot);
        ResponseTemplate::new(404)
    }
}

async fn mount_snapshot(server: &MockServer, id: u32, store: &Store) -> Arc<Mutex<Option<Snapshot>>> {
    let seen = Arc::new(Mutex::new(None));
    Mock::given(method("GET"))
        .and(path("/Home/FullAbstract"))
        .and(query_param("projectId", id.to_string()))
        .respond_with(SnapshotResponder { store: store.clone(), seen: seen.clone() })
        .expect(1)
        .mount(server)
        .await;
    seen
}

fn stored_ids(store: &Store) -> Vec<u32> {
    let mut ids: Vec<u32> = store.load_projects().unwrap().iter().map(|p| p.id).collect();
    ids.sort();
    ids
}

#[tokio::test]
async fn test_parallel_scrape_stores_found_projects() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_project(&server, 2, "Magnetic levitation on a budget", 1).await;
    mount_project(&server, 4, "Muon detection with scintillators", 1).await;

    let config = test_config(&server, &dir);
    let store = Store::from_config(&config);
    let crawler = Crawler::new(&config).unwrap();

    let summary = crawler.scrape_parallel(1, 5, 3, 50).await.unwrap();
    assert_eq!(summary.attempted, 5);
    assert_eq!(summary.found, 2);
    assert_eq!(summary.total, 2);

    assert_eq!(stored_ids(&store), vec![2, 4]);
    assert_eq!(store.load_progress(0).unwrap().total_scraped, 2);
}

#[tokio::test]
async fn test_parallel_scrape_skips_stored_ids() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_project(&server, 2, "Already stored project", 0).await;
    mount_project(&server, 4, "Muon detection with scintillators", 1).await;

    let config = test_config(&server, &dir);
    let store = Store::from_config(&config);
    let mut existing = Project::new(2);
    existing.title = Some("Already stored project".to_string());
    store.save_projects(&[existing]).unwrap();

    let crawler = Crawler::new(&config).unwrap();
    let summary = crawler.scrape_parallel(1, 5, 2, 1).await.unwrap();

    assert_eq!(summary.attempted, 4);
    assert_eq!(summary.found, 1);
    assert_eq!(stored_ids(&store), vec![2, 4]);

    // Running the same range again finds nothing new and stores no duplicates
    let again = crawler.scrape_parallel(1, 5, 2, 1).await.unwrap();
    assert_eq!(again.found, 0);
    assert_eq!(stored_ids(&store), vec![2, 4]);
}

#[tokio::test]
async fn test_sequential_scrape_resumes_after_checkpoint() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_project(&server, 2, "Before the checkpoint", 0).await;
    mount_project(&server, 5, "Acoustic levitation of droplets", 1).await;

    let mut config = test_config(&server, &dir);
    config.scrape.initial_last_id = 0;
    let store = Store::from_config(&config);
    store.save_progress(&Progress::starting_at(3)).unwrap();

    let crawler = Crawler::new(&config).unwrap();
    let summary = crawler.scrape_range(1, 6).await.unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.found, 1);
    assert_eq!(stored_ids(&store), vec![5]);

    let progress = store.load_progress(0).unwrap();
    assert_eq!(progress.last_id, 6);
    assert_eq!(progress.total_scraped, 1);
}

#[tokio::test]
async fn test_error_pages_are_not_projects() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/Home/FullAbstract"))
        .and(query_param("projectId", "1"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Home/FullAbstract"))
        .and(query_param("projectId", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div class="container"><h2>Abstracts</h2><p>Project not found</p></div>"#,
        ))
        .mount(&server)
        .await;

    let config = test_config(&server, &dir);
    let crawler = Crawler::new(&config).unwrap();
    let summary = crawler.scrape_parallel(1, 3, 2, 10).await.unwrap();

    assert_eq!(summary.attempted, 3);
    assert_eq!(summary.found, 0);
    assert!(Store::from_config(&config).load_projects().unwrap().is_empty());
}

#[tokio::test]
async fn test_sequential_batches_checkpoint_mid_run() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_project(&server, 2, "Acoustic levitation of droplets", 1).await;
    mount_project(&server, 4, "Muon detection with scintillators", 1).await;

    let mut config = test_config(&server, &dir);
    config.scrape.initial_last_id = 0;
    config.scrape.batch_size = 1;
    let store = Store::from_config(&config);
    let seen = mount_snapshot(&server, 5, &store).await;

    let crawler = Crawler::new(&config).unwrap();
    let summary = crawler.scrape_range(1, 6).await.unwrap();
    assert_eq!(summary.found, 2);

    // Project 4 was flushed with its checkpoint before id 5 went out
    let mid_run = seen.lock().unwrap().clone();
    assert_eq!(mid_run, Some(Snapshot { last_id: 4, ids: vec![2, 4] }));

    let progress = store.load_progress(0).unwrap();
    assert_eq!(progress.last_id, 6);
    assert_eq!(progress.total_scraped, 2);
}

#[tokio::test]
async fn test_parallel_flush_lands_before_run_ends() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_project(&server, 1, "Magnetic levitation on a budget", 1).await;

    let config = test_config(&server, &dir);
    let store = Store::from_config(&config);
    let seen = mount_snapshot(&server, 3, &store).await;

    // One worker keeps the requests in id order
    let crawler = Crawler::new(&config).unwrap();
    let summary = crawler.scrape_parallel(1, 3, 1, 1).await.unwrap();
    assert_eq!(summary.found, 1);

    let mid_run = seen.lock().unwrap().clone().unwrap();
    assert_eq!(mid_run.ids, vec![1]);
    assert_eq!(stored_ids(&store), vec![1]);
}

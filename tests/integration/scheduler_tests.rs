//! Cadence loops, manual runs and non-reentrancy

use crate::common::{guru_page, source_entry, test_config, wishket_page};
use crate::ingest_tests::FailingCommit;
use gig_crawler::config::Cadence;
use gig_crawler::crawler::{Coordinator, StoreFactory, TriggerOutcome};
use gig_crawler::state::LoopState;
use gig_crawler::storage::{open_storage, SqliteStorage, Storage};
use gig_crawler::GigError;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn serve(server: &MockServer, at: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(at))
        .respond_with(response)
        .mount(server)
        .await;
}

fn html(body: String) -> ResponseTemplate {
    ResponseTemplate::new(200)
        .set_body_string(body)
        .insert_header("content-type", "text/html; charset=utf-8")
}

#[tokio::test]
async fn test_crawl_all_once_survives_failed_source() {
    let server = MockServer::start().await;
    serve(&server, "/d/jobs/", html(guru_page(&[1, 2]))).await;
    serve(&server, "/project/", ResponseTemplate::new(500)).await;
    serve(&server, "/jobs/", html(String::new())).await;

    let uri = server.uri();
    let config = test_config(
        vec![
            source_entry("wishket", &format!("{}/project/", uri), Cadence::Slow),
            source_entry("guru", &format!("{}/d/jobs/", uri), Cadence::Slow),
            source_entry("upwork", &format!("{}/jobs/", uri), Cadence::Fast),
        ],
        ":memory:",
    );
    let coordinator = Coordinator::new(&config).unwrap();
    let mut store = SqliteStorage::new_in_memory().unwrap();

    let report = coordinator.crawl_all_once(&mut store).await;
    assert_eq!(report.failed, 1);
    assert_eq!(report.crawled, 2);
    assert_eq!(report.inserted(), 2);
    assert_eq!(store.count_by_platform("guru").unwrap(), 2);

    let again = coordinator.crawl_all_once(&mut store).await;
    assert_eq!(again.inserted(), 0);
    assert_eq!(store.query_all().unwrap().len(), 2);
}

#[tokio::test]
async fn test_second_trigger_is_skipped_while_first_runs() {
    let server = MockServer::start().await;
    serve(
        &server,
        "/d/jobs/",
        html(guru_page(&[7])).set_delay(Duration::from_millis(400)),
    )
    .await;

    let config = test_config(
        vec![source_entry("guru", &format!("{}/d/jobs/", server.uri()), Cadence::Slow)],
        ":memory:",
    );
    let coordinator = Coordinator::new(&config).unwrap();
    let scheduler = coordinator.scheduler();
    let mut first_store = SqliteStorage::new_in_memory().unwrap();
    let mut second_store = SqliteStorage::new_in_memory().unwrap();

    let (first, second) = tokio::join!(
        scheduler.trigger("guru", &mut first_store),
        scheduler.trigger("guru", &mut second_store),
    );

    assert!(matches!(first.unwrap(), TriggerOutcome::Completed(r) if r.inserted == 1));
    assert!(matches!(second.unwrap(), TriggerOutcome::Skipped));
    assert!(second_store.query_all().unwrap().is_empty());

    // The flag is free again once the first run finished
    let third = scheduler.trigger("guru", &mut second_store).await.unwrap();
    assert!(matches!(third, TriggerOutcome::Completed(r) if r.inserted == 1));
}

#[tokio::test]
async fn test_trigger_surfaces_rolled_back_batch() {
    let server = MockServer::start().await;
    serve(&server, "/d/jobs/", html(guru_page(&[11, 12]))).await;

    let config = test_config(
        vec![source_entry("guru", &format!("{}/d/jobs/", server.uri()), Cadence::Slow)],
        ":memory:",
    );
    let coordinator = Coordinator::new(&config).unwrap();
    let mut store = FailingCommit {
        inner: SqliteStorage::new_in_memory().unwrap(),
    };

    let result = coordinator.scheduler().trigger("guru", &mut store).await;
    assert!(matches!(result, Err(GigError::Storage(_))));
    assert!(store.query_all().unwrap().is_empty());
}

#[tokio::test]
async fn test_probe_does_not_persist() {
    let server = MockServer::start().await;
    serve(&server, "/project/", html(wishket_page(&[5, 6]))).await;

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("probe.db");
    let config = test_config(
        vec![source_entry("wishket", &format!("{}/project/", server.uri()), Cadence::Slow)],
        db.to_str().unwrap(),
    );
    let coordinator = Coordinator::new(&config).unwrap();

    let candidates = coordinator.probe("wishket").await.unwrap();
    assert_eq!(candidates.len(), 2);
    assert!(candidates.iter().all(|c| c.currency == "KRW"));

    let store = open_storage(&db).unwrap();
    assert!(store.query_all().unwrap().is_empty());

    let unknown = coordinator.probe("fiverr").await;
    assert!(matches!(unknown, Err(GigError::UnknownSource(p)) if p == "fiverr"));
}

#[tokio::test]
async fn test_probe_surfaces_crawl_failure() {
    let server = MockServer::start().await;
    serve(&server, "/project/", ResponseTemplate::new(404)).await;

    let config = test_config(
        vec![source_entry("wishket", &format!("{}/project/", server.uri()), Cadence::Slow)],
        ":memory:",
    );
    let coordinator = Coordinator::new(&config).unwrap();
    assert!(matches!(
        coordinator.probe("wishket").await,
        Err(GigError::Crawl(_))
    ));
}

#[tokio::test]
async fn test_spawned_loops_ingest_into_shared_file() {
    let server = MockServer::start().await;
    serve(&server, "/d/jobs/", html(guru_page(&[31, 32]))).await;
    serve(&server, "/project/", html(wishket_page(&[41]))).await;

    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("loops.db");
    let uri = server.uri();
    let config = test_config(
        vec![
            source_entry("guru", &format!("{}/d/jobs/", uri), Cadence::Fast),
            source_entry("wishket", &format!("{}/project/", uri), Cadence::Slow),
        ],
        db.to_str().unwrap(),
    );
    let coordinator = Coordinator::new(&config).unwrap();
    drop(open_storage(&db).unwrap());

    let path = db.clone();
    let factory: StoreFactory = Arc::new(move || {
        open_storage(&path).map(|store| Box::new(store) as Box<dyn Storage>)
    });
    let handles = coordinator.start(factory);
    assert_eq!(handles.len(), 2);

    let reader = open_storage(&db).unwrap();
    let mut stored = 0;
    for _ in 0..100 {
        stored = reader.query_all().unwrap().len();
        if stored == 3 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    assert_eq!(stored, 3);

    let status = coordinator.scheduler().status().await;
    assert_eq!(status.len(), 2);
    assert!(status.iter().all(|s| s.state != LoopState::Idle || s.running.is_empty()));

    for handle in handles {
        handle.abort();
    }

    // Repeated cycles never duplicate rows
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(reader.query_all().unwrap().len(), 3);
}

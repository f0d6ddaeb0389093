mod common;

use common::*;
use fdsync::download::AttohttpcClient;
use fdsync::error::SyncError;
use fdsync::models::{Authentication, IndexFormat, VersionInfo};
use fdsync::sync::{CancellationToken, SyncOutcome, SyncState, Syncer};
use mockito::{Matcher, Server};
use std::io::Write;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn syncer(store: &Arc<MemoryStore>, observer: &Arc<RecordingObserver>) -> Syncer {
    Syncer::new(Arc::new(AttohttpcClient::new()), store.clone()).with_observer(observer.clone())
}

#[test]
fn test_first_sync_trusts_signer_and_commits_full_index() {
    let mut server = Server::new();
    let entry = serve(&mut server, "entry.jar", "first/entry.jar");
    let index = serve(&mut server, "index-v2.json", "first/index-v2.json");

    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let repo = repo(&server, "main");

    let report = syncer(&store, &observer).sync_repo(&repo).unwrap();

    entry.assert();
    index.assert();
    assert_eq!(
        report.outcome,
        SyncOutcome::Updated {
            timestamp: 100,
            packages: 1
        }
    );
    assert_eq!(report.fingerprint(), Some(&fingerprint_a()));
    assert_eq!(report.repo.version_info.timestamp, Some(100));
    assert_eq!(report.format(), IndexFormat::Current);

    let commits = store.commits();
    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].fingerprint, fingerprint_a());
    assert_eq!(commits[0].timestamp, 100);
    assert_eq!(commits[0].index, fixture_index("first/index-v2.json"));

    assert_eq!(
        observer.terminal(&repo),
        vec![SyncState::Completed(report.outcome.clone())]
    );
}

#[test]
fn test_pinned_sync_applies_diff() {
    let mut server = Server::new();
    let _entry = serve(&mut server, "entry.jar", "second/entry.jar");
    let diff = serve(&mut server, "diff/100.json", "second/diff/100.json");
    let full = serve(&mut server, "index-v2.json", "second/index-v2.json").expect(0);

    let repo = synced_at(repo(&server, "main"), 100).with_fingerprint(Some(fingerprint_a()));
    let store = Arc::new(MemoryStore::new().with_index(&repo, fixture_index("first/index-v2.json")));
    let observer = Arc::new(RecordingObserver::new());

    let report = syncer(&store, &observer).sync_repo(&repo).unwrap();

    diff.assert();
    full.assert();
    assert_eq!(
        report.outcome,
        SyncOutcome::Updated {
            timestamp: 200,
            packages: 2
        }
    );
    assert_eq!(
        store.index(&repo),
        Some(fixture_index("second/index-v2.json"))
    );
}

#[test]
fn test_missing_diff_falls_back_to_full_index() {
    let mut server = Server::new();
    let _entry = serve(&mut server, "entry.jar", "second/entry.jar");
    let _diff = serve_status(&mut server, "diff/100.json", 404);
    let full = serve(&mut server, "index-v2.json", "second/index-v2.json");

    let repo = synced_at(repo(&server, "main"), 100).with_fingerprint(Some(fingerprint_a()));
    let store = Arc::new(MemoryStore::new().with_index(&repo, fixture_index("first/index-v2.json")));
    let observer = Arc::new(RecordingObserver::new());

    syncer(&store, &observer).sync_repo(&repo).unwrap();

    full.assert();
    assert_eq!(
        store.index(&repo),
        Some(fixture_index("second/index-v2.json"))
    );
}

#[test]
fn test_missing_base_index_fetches_full_index() {
    let mut server = Server::new();
    let _entry = serve(&mut server, "entry.jar", "second/entry.jar");
    let diff = serve(&mut server, "diff/100.json", "second/diff/100.json").expect(0);
    let full = serve(&mut server, "index-v2.json", "second/index-v2.json");

    let repo = synced_at(repo(&server, "main"), 100).with_fingerprint(Some(fingerprint_a()));
    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());

    syncer(&store, &observer).sync_repo(&repo).unwrap();

    diff.assert();
    full.assert();
    assert_eq!(store.commits().len(), 1);
}

#[test]
fn test_same_timestamp_is_up_to_date() {
    let mut server = Server::new();
    let _entry = serve(&mut server, "entry.jar", "first/entry.jar");
    let index = serve(&mut server, "index-v2.json", "first/index-v2.json").expect(0);

    let repo = synced_at(repo(&server, "main"), 100).with_fingerprint(Some(fingerprint_a()));
    let store = Arc::new(MemoryStore::new().with_index(&repo, fixture_index("first/index-v2.json")));
    let observer = Arc::new(RecordingObserver::new());

    let report = syncer(&store, &observer).sync_repo(&repo).unwrap();

    index.assert();
    assert_eq!(report.outcome, SyncOutcome::UpToDate);
    assert!(store.commits().is_empty());
}

#[test]
fn test_older_index_is_rejected() {
    let mut server = Server::new();
    let _entry = serve(&mut server, "entry.jar", "first/entry.jar");

    let repo = synced_at(repo(&server, "main"), 200).with_fingerprint(Some(fingerprint_a()));
    let store = Arc::new(MemoryStore::new().with_index(&repo, fixture_index("second/index-v2.json")));
    let observer = Arc::new(RecordingObserver::new());

    let result = syncer(&store, &observer).sync_repo(&repo);

    assert!(matches!(result, Err(SyncError::ValidationError(_))));
    assert!(store.commits().is_empty());
    assert!(matches!(
        observer.terminal(&repo).as_slice(),
        [SyncState::Failed(_)]
    ));
}

#[test]
fn test_not_modified_container_ends_sync() {
    let mut server = Server::new();
    let entry = server
        .mock("GET", "/repo/entry.jar")
        .match_header("if-none-match", "\"v1\"")
        .with_status(304)
        .create();

    let repo = repo(&server, "main")
        .with_fingerprint(Some(fingerprint_a()))
        .with_version_info(VersionInfo {
            timestamp: Some(100),
            etag: Some("\"v1\"".to_string()),
            last_modified: Some("Mon, 01 Jan 2024 00:00:00 GMT".to_string()),
        });
    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());

    let report = syncer(&store, &observer).sync_repo(&repo).unwrap();

    entry.assert();
    assert_eq!(report.outcome, SyncOutcome::NotModified);
    assert_eq!(report.repo, repo);
    assert!(store.commits().is_empty());
}

#[test]
fn test_modification_date_is_sent_without_etag() {
    let mut server = Server::new();
    let entry = server
        .mock("GET", "/repo/entry.jar")
        .match_header("if-modified-since", "Mon, 01 Jan 2024 00:00:00 GMT")
        .match_header("if-none-match", Matcher::Missing)
        .with_status(304)
        .create();

    let repo = repo(&server, "main").with_version_info(VersionInfo {
        timestamp: Some(100),
        etag: None,
        last_modified: Some("Mon, 01 Jan 2024 00:00:00 GMT".to_string()),
    });
    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());

    let report = syncer(&store, &observer).sync_repo(&repo).unwrap();

    entry.assert();
    assert_eq!(report.outcome, SyncOutcome::NotModified);
}

#[test]
fn test_first_sync_is_unconditional_and_records_validators() {
    let mut server = Server::new();
    let body = fixture_bytes("first/entry.jar");
    let _entry = server
        .mock("GET", "/repo/entry.jar")
        .match_header("if-none-match", Matcher::Missing)
        .match_header("if-modified-since", Matcher::Missing)
        .with_status(200)
        .with_header("etag", "\"first\"")
        .with_header("last-modified", "Tue, 14 Nov 2023 22:13:20 GMT")
        .with_body(body)
        .create();
    let _index = serve(&mut server, "index-v2.json", "first/index-v2.json");

    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let report = syncer(&store, &observer)
        .sync_repo(&repo(&server, "main"))
        .unwrap();

    assert_eq!(report.repo.version_info.etag.as_deref(), Some("\"first\""));
    assert_eq!(
        report.repo.version_info.last_modified.as_deref(),
        Some("Tue, 14 Nov 2023 22:13:20 GMT")
    );
    assert_eq!(store.commits()[0].etag.as_deref(), Some("\"first\""));
}

#[test]
fn test_credentials_are_sent_with_every_request() {
    let mut server = Server::new();
    let auth = "Basic dXNlcjpzZWNyZXQ=";
    let entry = server
        .mock("GET", "/repo/entry.jar")
        .match_header("authorization", auth)
        .with_status(200)
        .with_body(fixture_bytes("first/entry.jar"))
        .create();
    let index = server
        .mock("GET", "/repo/index-v2.json")
        .match_header("authorization", auth)
        .with_status(200)
        .with_body(fixture_bytes("first/index-v2.json"))
        .create();

    let repo = repo(&server, "private")
        .with_authentication(Some(Authentication::new("user", "secret")));
    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());

    syncer(&store, &observer).sync_repo(&repo).unwrap();

    entry.assert();
    index.assert();
}

#[test]
fn test_index_checksum_mismatch_is_a_verification_failure() {
    let mut server = Server::new();
    let _entry = serve(&mut server, "entry.jar", "first/entry.jar");
    let _index = serve(&mut server, "index-v2.json", "second/index-v2.json");

    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let repo = repo(&server, "main");

    let result = syncer(&store, &observer).sync_repo(&repo);

    assert!(matches!(result, Err(SyncError::ChecksumMismatch { .. })));
    assert!(store.commits().is_empty());
    assert!(matches!(
        observer.terminal(&repo).as_slice(),
        [SyncState::VerificationFailed(_)]
    ));
}

#[test]
fn test_legacy_fallback_when_entry_is_missing() {
    let mut server = Server::new();
    let _entry = serve_status(&mut server, "entry.jar", 404);
    let legacy = serve(&mut server, "index-v1.jar", "legacy/index-v1.jar");

    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let repo = repo(&server, "old");

    let report = syncer(&store, &observer).sync_repo(&repo).unwrap();

    legacy.assert();
    assert_eq!(report.format(), IndexFormat::Legacy);
    assert_eq!(report.fingerprint(), Some(&fingerprint_a()));
    assert_eq!(
        report.outcome,
        SyncOutcome::Updated {
            timestamp: 1_700_000_000_000,
            packages: 2
        }
    );
    let stored = store.index(&repo).unwrap();
    assert_eq!(stored.repo.timestamp, 1_700_000_000_000);
    assert!(stored.packages.contains_key("org.legacy"));
}

#[test]
fn test_legacy_repo_never_asks_for_entry() {
    let mut server = Server::new();
    let entry = serve(&mut server, "entry.jar", "first/entry.jar").expect(0);
    let _legacy = serve(&mut server, "index-v1.jar", "legacy/index-v1.jar");

    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let repo = repo(&server, "old").with_format(IndexFormat::Legacy);

    let report = syncer(&store, &observer).sync_repo(&repo).unwrap();

    entry.assert();
    assert_eq!(report.format(), IndexFormat::Legacy);
}

#[test]
fn test_server_error_fails_without_fallback() {
    let mut server = Server::new();
    let _entry = serve_status(&mut server, "entry.jar", 500);
    let legacy = serve(&mut server, "index-v1.jar", "legacy/index-v1.jar").expect(0);

    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let repo = repo(&server, "main");

    let result = syncer(&store, &observer).sync_repo(&repo);

    legacy.assert();
    assert!(matches!(
        result,
        Err(SyncError::HttpStatus { status: 500, .. })
    ));
    assert!(matches!(
        observer.terminal(&repo).as_slice(),
        [SyncState::Failed(_)]
    ));
}

#[test]
fn test_cancelled_sync_makes_no_requests() {
    let mut server = Server::new();
    let entry = serve(&mut server, "entry.jar", "first/entry.jar").expect(0);

    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let token = CancellationToken::new();
    token.cancel();
    let repo = repo(&server, "main");

    let result = syncer(&store, &observer)
        .with_cancellation(token)
        .sync_repo(&repo);

    entry.assert();
    assert!(matches!(result, Err(SyncError::Cancelled)));
    assert!(store.commits().is_empty());
}

#[test]
fn test_progress_precedes_single_terminal_state() {
    let mut server = Server::new();
    let _entry = serve(&mut server, "entry.jar", "first/entry.jar");
    let _index = serve(&mut server, "index-v2.json", "first/index-v2.json");

    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let repo = repo(&server, "main");

    syncer(&store, &observer).sync_repo(&repo).unwrap();

    let states = observer.states(&repo);
    let (last, progress) = states.split_last().unwrap();
    assert!(matches!(last, SyncState::Completed(_)));
    assert!(!progress.is_empty());
    assert!(
        progress
            .iter()
            .all(|state| matches!(state, SyncState::DownloadProgress(p) if (0..=100).contains(p)))
    );
    assert!(progress.contains(&SyncState::DownloadProgress(100)));
}

#[test]
fn test_sync_all_reports_every_repository_in_order() {
    let mut server = Server::new();
    let _entry = serve(&mut server, "entry.jar", "first/entry.jar");
    let _index = serve(&mut server, "index-v2.json", "first/index-v2.json");

    let trusted = repo(&server, "trusted");
    let pinned_elsewhere = repo(&server, "pinned").with_fingerprint(Some(fingerprint_b()));
    let tofu = repo(&server, "tofu");

    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let results = syncer(&store, &observer)
        .with_concurrency(3)
        .sync_all(&[trusted.clone(), pinned_elsewhere.clone(), tofu.clone()]);

    let ids: Vec<_> = results.iter().map(|(id, _)| id.clone()).collect();
    assert_eq!(ids, vec![trusted.id.clone(), pinned_elsewhere.id.clone(), tofu.id.clone()]);
    assert!(results[0].1.is_ok());
    assert!(matches!(
        results[1].1,
        Err(SyncError::TrustViolation { .. })
    ));
    assert!(results[2].1.is_ok());

    assert_eq!(store.commits().len(), 2);
    for repo in [&trusted, &pinned_elsewhere, &tofu] {
        assert_eq!(observer.terminal(repo).len(), 1);
    }
}

#[test]
fn test_repositories_on_one_mirror_share_the_container_download() {
    let mut server = Server::new();
    let body = fixture_bytes("first/entry.jar");
    // Slow enough that the second repository joins the running transfer.
    let entry = server
        .mock("GET", "/repo/entry.jar")
        .with_status(200)
        .with_chunked_body(move |writer| {
            thread::sleep(Duration::from_millis(500));
            writer.write_all(&body)
        })
        .expect(1)
        .create();
    let index = serve(&mut server, "index-v2.json", "first/index-v2.json").expect_at_least(1);

    let first = repo(&server, "first");
    let second = repo(&server, "second");
    let store = Arc::new(MemoryStore::new());
    let observer = Arc::new(RecordingObserver::new());
    let results = syncer(&store, &observer)
        .with_concurrency(2)
        .sync_all(&[first.clone(), second.clone()]);

    entry.assert();
    index.assert();
    for (_, result) in &results {
        let report = result.as_ref().unwrap();
        assert_eq!(report.fingerprint(), Some(&fingerprint_a()));
    }

    let commits = store.commits();
    assert_eq!(commits.len(), 2);
    assert!(commits.iter().any(|commit| commit.repo_id == first.id));
    assert!(commits.iter().any(|commit| commit.repo_id == second.id));
    for repo in [&first, &second] {
        assert_eq!(observer.terminal(repo).len(), 1);
    }
}

//! End-to-end behavior of the watchlist cache against a mocked API.

use std::sync::Arc;
use std::time::Duration;

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use httpmock::MockServer;
use httpmock::prelude::*;
use serde_json::json;
use tempfile::TempDir;

use bytecast_client::{
    ACTIVE_WATCHLIST_KEY, AuthGateway, ClientError, ProfileStore, TokenStore, WatchlistCache,
};

fn fresh_jwt() -> String {
    let payload =
        URL_SAFE_NO_PAD.encode(json!({"exp": chrono::Utc::now().timestamp() + 600}).to_string());
    format!("header.{payload}.sig")
}

struct Harness {
    _dir: TempDir,
    store: Arc<ProfileStore>,
    cache: WatchlistCache,
}

fn harness(server: &MockServer) -> Harness {
    let dir = tempfile::tempdir().expect("tempdir");
    let store = Arc::new(ProfileStore::open(dir.path()).expect("open store"));
    let tokens = Arc::new(TokenStore::new(store.clone()));
    tokens.set_token(&fresh_jwt()).expect("seed token");
    let gateway = Arc::new(
        AuthGateway::new(server.base_url(), Duration::from_secs(5), tokens)
            .expect("build gateway"),
    );
    Harness {
        _dir: dir,
        store: store.clone(),
        cache: WatchlistCache::new(gateway, store),
    }
}

fn watchlist_json(id: u64, name: &str) -> serde_json::Value {
    json!({
        "id": id,
        "name": name,
        "description": "",
        "color": "#336699",
        "created_at": "2024-01-01T00:00:00Z",
        "updated_at": "2024-01-01T00:00:00Z",
    })
}

fn channel_json(id: u64, youtube_id: &str, title: &str) -> serde_json::Value {
    json!({
        "id": id,
        "youtube_id": youtube_id,
        "title": title,
        "thumbnail_url": "https://i.ytimg.com/an/thumb.jpg",
    })
}

#[tokio::test]
async fn hydrate_heals_a_dangling_persisted_active_id() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists");
            then.status(200).json_body(json!({
                "watchlists": [watchlist_json(1, "Tech"), watchlist_json(2, "Music")],
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists/1/channels");
            then.status(200)
                .json_body(json!({"channels": [channel_json(10, "UCten", "Ten")]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists/2/channels");
            then.status(200).json_body(json!({"channels": []}));
        })
        .await;

    let harness = harness(&server);
    harness
        .store
        .set(ACTIVE_WATCHLIST_KEY, "99")
        .expect("seed dangling id");

    let snapshot = harness.cache.hydrate().await.expect("hydrate");
    assert_eq!(snapshot.active_id, Some(1));
    assert_eq!(
        harness.store.get(ACTIVE_WATCHLIST_KEY).as_deref(),
        Some("1")
    );

    let settled = harness.cache.snapshot();
    assert_eq!(settled.channels.len(), 1);
    assert_eq!(settled.channels[0].youtube_id, "UCten");
    assert_eq!(settled.channel_counts.get(&1), Some(&1));
    assert_eq!(settled.channel_counts.get(&2), Some(&0));
}

#[tokio::test]
async fn hydrate_with_an_empty_collection_clears_the_selection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists");
            then.status(200).json_body(json!({"watchlists": []}));
        })
        .await;

    let harness = harness(&server);
    harness
        .store
        .set(ACTIVE_WATCHLIST_KEY, "7")
        .expect("seed stale id");

    let snapshot = harness.cache.hydrate().await.expect("hydrate");
    assert_eq!(snapshot.active_id, None);
    assert!(snapshot.watchlists.is_empty());
    assert_eq!(harness.store.get(ACTIVE_WATCHLIST_KEY), None);
}

#[tokio::test]
async fn failed_update_leaves_the_cache_untouched() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists");
            then.status(200).json_body(json!({
                "watchlists": [watchlist_json(1, "Tech"), watchlist_json(2, "Music")],
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/v1/watchlists/1");
            then.status(500).json_body(json!({"message": "update failed"}));
        })
        .await;

    let harness = harness(&server);
    harness
        .cache
        .refresh_watchlists()
        .await
        .expect("seed collection");
    let before = harness.cache.snapshot();

    let draft = bytecast_api_models::WatchlistDraft {
        name: "Renamed".to_string(),
        description: None,
        color: "#FF0000".to_string(),
    };
    let error = harness
        .cache
        .update_watchlist(1, &draft)
        .await
        .expect_err("update fails");
    assert!(matches!(error, ClientError::Api { status: 500, .. }));
    assert_eq!(harness.cache.snapshot(), before);
}

#[tokio::test]
async fn stale_channel_fetch_never_overwrites_a_newer_selection() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists");
            then.status(200).json_body(json!({
                "watchlists": [watchlist_json(1, "Slow"), watchlist_json(2, "Fast")],
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists/1/channels");
            then.status(200)
                .json_body(json!({"channels": [
                    channel_json(11, "UCslow-a", "Slow A"),
                    channel_json(12, "UCslow-b", "Slow B"),
                ]}))
                .delay(Duration::from_millis(150));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists/2/channels");
            then.status(200)
                .json_body(json!({"channels": [channel_json(21, "UCfast", "Fast")]}));
        })
        .await;

    let harness = harness(&server);
    let watchlists = harness
        .cache
        .refresh_watchlists()
        .await
        .expect("seed collection");
    let (slow, fast) = (&watchlists[0], &watchlists[1]);

    let (first, second) = tokio::join!(
        harness.cache.select_watchlist(Some(slow)),
        harness.cache.select_watchlist(Some(fast)),
    );
    first.expect("slow selection completes");
    second.expect("fast selection completes");

    let snapshot = harness.cache.snapshot();
    assert_eq!(snapshot.active_id, Some(2));
    assert_eq!(snapshot.channels.len(), 1);
    assert_eq!(snapshot.channels[0].youtube_id, "UCfast");
    // The stale fetch still contributed fresh count information.
    assert_eq!(snapshot.channel_counts.get(&1), Some(&2));
    assert_eq!(snapshot.channel_counts.get(&2), Some(&1));

    harness
        .cache
        .select_watchlist(None)
        .await
        .expect("deselect");
    let cleared = harness.cache.snapshot();
    assert_eq!(cleared.active_id, None);
    assert!(cleared.channels.is_empty());
}

#[tokio::test]
async fn deleting_the_last_watchlist_is_refused_before_the_network() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists");
            then.status(200)
                .json_body(json!({"watchlists": [watchlist_json(1, "Only")]}));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/v1/watchlists/1");
            then.status(204);
        })
        .await;

    let harness = harness(&server);
    harness
        .cache
        .refresh_watchlists()
        .await
        .expect("seed collection");

    let error = harness
        .cache
        .delete_watchlist(1)
        .await
        .expect_err("guarded");
    assert!(matches!(error, ClientError::LastWatchlist));
    assert_eq!(delete.calls_async().await, 0);
}

#[tokio::test]
async fn deleting_the_active_watchlist_clears_selection_and_persistence() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists");
            then.status(200).json_body(json!({
                "watchlists": [watchlist_json(1, "Tech"), watchlist_json(2, "Music")],
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists/2/channels");
            then.status(200).json_body(json!({"channels": []}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/v1/watchlists/2");
            then.status(204);
        })
        .await;

    let harness = harness(&server);
    let watchlists = harness
        .cache
        .refresh_watchlists()
        .await
        .expect("seed collection");
    harness
        .cache
        .select_watchlist(Some(&watchlists[1]))
        .await
        .expect("select");
    assert_eq!(
        harness.store.get(ACTIVE_WATCHLIST_KEY).as_deref(),
        Some("2")
    );

    harness.cache.delete_watchlist(2).await.expect("delete");
    let snapshot = harness.cache.snapshot();
    assert_eq!(snapshot.active_id, None);
    assert!(snapshot.channels.is_empty());
    assert_eq!(snapshot.watchlists.len(), 1);
    assert!(!snapshot.channel_counts.contains_key(&2));
    assert_eq!(harness.store.get(ACTIVE_WATCHLIST_KEY), None);
}

#[tokio::test]
async fn remove_channel_threads_record_and_external_ids() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists");
            then.status(200)
                .json_body(json!({"watchlists": [watchlist_json(1, "Tech")]}));
        })
        .await;
    let mut populated = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists/1/channels");
            then.status(200)
                .json_body(json!({"channels": [channel_json(42, "UCfoo", "Foo")]}));
        })
        .await;
    // The wire path carries the external id, not the record id.
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/v1/watchlists/1/channels/UCfoo");
            then.status(204);
        })
        .await;

    let harness = harness(&server);
    let watchlists = harness
        .cache
        .refresh_watchlists()
        .await
        .expect("seed collection");
    harness
        .cache
        .select_watchlist(Some(&watchlists[0]))
        .await
        .expect("select");

    let missing = harness
        .cache
        .remove_channel(7, 1)
        .await
        .expect_err("unknown record id");
    assert!(matches!(missing, ClientError::UnknownChannel { id: 7 }));
    assert_eq!(delete.calls_async().await, 0);

    populated.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists/1/channels");
            then.status(200).json_body(json!({"channels": []}));
        })
        .await;

    harness
        .cache
        .remove_channel(42, 1)
        .await
        .expect("remove by record id");
    delete.assert_async().await;
    let snapshot = harness.cache.snapshot();
    assert!(snapshot.channels.is_empty());
    assert_eq!(snapshot.channel_counts.get(&1), Some(&0));
}

#[tokio::test]
async fn add_channel_refetches_the_membership_list() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists");
            then.status(200)
                .json_body(json!({"watchlists": [watchlist_json(1, "Tech")]}));
        })
        .await;
    let mut empty = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists/1/channels");
            then.status(200).json_body(json!({"channels": []}));
        })
        .await;
    let add = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/watchlists/1/channels")
                .json_body(json!({"channel_id": "UCnew"}));
            then.status(201);
        })
        .await;

    let harness = harness(&server);
    let watchlists = harness
        .cache
        .refresh_watchlists()
        .await
        .expect("seed collection");
    harness
        .cache
        .select_watchlist(Some(&watchlists[0]))
        .await
        .expect("select");
    assert!(harness.cache.snapshot().channels.is_empty());

    empty.delete_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists/1/channels");
            then.status(200)
                .json_body(json!({"channels": [channel_json(5, "UCnew", "New")]}));
        })
        .await;

    harness.cache.add_channel(1, "UCnew").await.expect("add");
    add.assert_async().await;
    let snapshot = harness.cache.snapshot();
    assert_eq!(snapshot.channels.len(), 1);
    assert_eq!(snapshot.channel_counts.get(&1), Some(&1));
}

#[tokio::test]
async fn create_appends_without_activating() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists");
            then.status(200)
                .json_body(json!({"watchlists": [watchlist_json(1, "Tech")]}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/v1/watchlists")
                .json_body(json!({"name": "Music", "color": "#AA00AA"}));
            then.status(201).json_body(watchlist_json(3, "Music"));
        })
        .await;

    let harness = harness(&server);
    harness
        .cache
        .refresh_watchlists()
        .await
        .expect("seed collection");

    let draft = bytecast_api_models::WatchlistDraft {
        name: "Music".to_string(),
        description: None,
        color: "#AA00AA".to_string(),
    };
    let created = harness.cache.create_watchlist(&draft).await.expect("create");
    assert_eq!(created.id, 3);

    let snapshot = harness.cache.snapshot();
    assert_eq!(
        snapshot.watchlists.iter().map(|w| w.id).collect::<Vec<_>>(),
        vec![1, 3]
    );
    assert_eq!(snapshot.active_id, None);
    assert_eq!(snapshot.channel_counts.get(&3), Some(&0));
}

#[tokio::test]
async fn update_replaces_in_place_and_the_active_view_follows() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists");
            then.status(200).json_body(json!({
                "watchlists": [watchlist_json(1, "Tech"), watchlist_json(2, "Music")],
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/v1/watchlists/1/channels");
            then.status(200).json_body(json!({"channels": []}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/v1/watchlists/1");
            then.status(200).json_body(watchlist_json(1, "Deep Tech"));
        })
        .await;

    let harness = harness(&server);
    let watchlists = harness
        .cache
        .refresh_watchlists()
        .await
        .expect("seed collection");
    harness
        .cache
        .select_watchlist(Some(&watchlists[0]))
        .await
        .expect("select");

    let draft = bytecast_api_models::WatchlistDraft {
        name: "Deep Tech".to_string(),
        description: None,
        color: "#336699".to_string(),
    };
    harness
        .cache
        .update_watchlist(1, &draft)
        .await
        .expect("update");

    let snapshot = harness.cache.snapshot();
    assert_eq!(snapshot.watchlists[0].name, "Deep Tech");
    assert_eq!(snapshot.watchlists.len(), 2);
    assert_eq!(
        snapshot.active_watchlist().map(|w| w.name.as_str()),
        Some("Deep Tech")
    );
}

#[tokio::test]
async fn search_results_are_replaced_wholesale() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/search")
                .query_param("q", "rust");
            then.status(200).json_body(json!([
                channel_json(0, "UCrust-a", "Rust A"),
                channel_json(0, "UCrust-b", "Rust B"),
            ]));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/v1/search")
                .query_param("q", "go birding");
            then.status(200)
                .json_body(json!([channel_json(0, "UCbird", "Birds")]));
        })
        .await;

    let harness = harness(&server);
    let first = harness
        .cache
        .search_channels("rust")
        .await
        .expect("first search");
    assert_eq!(first.len(), 2);
    assert_eq!(harness.cache.snapshot().search_results.len(), 2);

    let second = harness
        .cache
        .search_channels("go birding")
        .await
        .expect("second search");
    assert_eq!(second.len(), 1);
    let snapshot = harness.cache.snapshot();
    assert_eq!(snapshot.search_results.len(), 1);
    assert_eq!(snapshot.search_results[0].youtube_id, "UCbird");
}

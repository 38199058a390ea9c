mod common;

use chrono::{Duration as ChronoDuration, Utc};
use common::{CountingStore, MemoryCache, ScriptedGenerator};
use shortlink::application::services::TagService;
use shortlink::domain::entities::LinkPatch;
use shortlink::error::ErrorKind;
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

const ALICE: &str = "alice";
const BOB: &str = "bob";

#[tokio::test]
async fn test_create_then_resolve() {
    let store = CountingStore::new();
    let service = common::link_service(&store, Some(MemoryCache::new()));

    let link = service
        .create_short_link(ALICE, "https://example.com", None, None)
        .await
        .unwrap();

    assert_eq!(link.shortcode.len(), 9);
    assert!(link.shortcode.chars().all(|c| c.is_ascii_alphanumeric()));
    assert!(link.is_active);
    assert!(link.expires_at.is_none());

    let url = service.resolve(&link.shortcode).await.unwrap();
    assert_eq!(url, "https://example.com");
}

#[tokio::test]
async fn test_create_does_not_touch_cache() {
    let store = CountingStore::new();
    let cache = MemoryCache::new();
    let service = common::link_service(&store, Some(cache.clone()));

    service
        .create_short_link(ALICE, "https://example.com", Some("fresh"), None)
        .await
        .unwrap();

    assert_eq!(cache.gets.load(Ordering::SeqCst), 0);
    assert_eq!(cache.sets.load(Ordering::SeqCst), 0);
    assert!(cache.entry("fresh").is_none());
}

#[tokio::test]
async fn test_invalid_url_has_no_side_effects() {
    let store = CountingStore::new();
    let service = common::link_service(&store, None);

    let err = service
        .create_short_link(ALICE, "", None, None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    assert_eq!(store.inserts(), 0);
    assert_eq!(store.inner.total_links(), 0);
}

#[tokio::test]
async fn test_second_resolve_is_served_from_cache() {
    let store = CountingStore::new();
    let cache = MemoryCache::new();
    let service = common::link_service(&store, Some(cache.clone()));

    let link = service
        .create_short_link(ALICE, "https://example.com/a", None, None)
        .await
        .unwrap();

    let first = service.resolve(&link.shortcode).await.unwrap();
    let lookups_after_first = store.redirect_lookups();
    let second = service.resolve(&link.shortcode).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.redirect_lookups(), lookups_after_first);

    let (cached, ttl) = cache.entry(&link.shortcode).unwrap();
    assert_eq!(cached, "https://example.com/a");
    assert_eq!(ttl, Duration::from_secs(24 * 60 * 60));
}

#[tokio::test]
async fn test_cache_outage_degrades_to_store() {
    let store = CountingStore::new();
    let cache = MemoryCache::new();
    let service = common::link_service(&store, Some(cache.clone()));

    let link = service
        .create_short_link(ALICE, "https://example.com", None, None)
        .await
        .unwrap();

    cache.set_failing(true);

    assert_eq!(
        service.resolve(&link.shortcode).await.unwrap(),
        "https://example.com"
    );
    assert_eq!(
        service.resolve(&link.shortcode).await.unwrap(),
        "https://example.com"
    );
    assert_eq!(store.redirect_lookups(), 2);
}

#[tokio::test]
async fn test_delete_frees_code_and_stops_redirects() {
    let store = CountingStore::new();
    let cache = MemoryCache::new();
    let service = common::link_service(&store, Some(cache.clone()));

    let link = service
        .create_short_link(ALICE, "https://example.com/old", Some("mycode"), None)
        .await
        .unwrap();

    // Warm the cache so deletion must evict it.
    service.resolve("mycode").await.unwrap();
    assert!(cache.entry("mycode").is_some());

    service.delete(ALICE, link.id).await.unwrap();
    assert!(cache.entry("mycode").is_none());

    let err = service.resolve("mycode").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let again = service.delete(ALICE, link.id).await.unwrap_err();
    assert_eq!(again.kind(), ErrorKind::NotFound);

    let reused = service
        .create_short_link(BOB, "https://example.com/new", Some("mycode"), None)
        .await
        .unwrap();
    assert_eq!(reused.shortcode, "mycode");
    assert_eq!(
        service.resolve("mycode").await.unwrap(),
        "https://example.com/new"
    );
}

#[tokio::test]
async fn test_custom_code_taken_by_live_link() {
    let store = CountingStore::new();
    let service = common::link_service(&store, None);

    service
        .create_short_link(ALICE, "https://example.com/1", Some("mycode"), None)
        .await
        .unwrap();

    let err = service
        .create_short_link(BOB, "https://example.com/2", Some("mycode"), None)
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CodeTaken);
    assert_eq!(store.inserts(), 2);
}

#[tokio::test]
async fn test_update_active_only_preserves_other_fields() {
    let store = CountingStore::new();
    let service = common::link_service(&store, None);

    let expires_at = Utc::now() + ChronoDuration::days(7);
    let link = service
        .create_short_link(ALICE, "https://example.com", Some("keepme"), Some(expires_at))
        .await
        .unwrap();

    service
        .update(
            ALICE,
            link.id,
            LinkPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let reread = service.get_link(ALICE, link.id).await.unwrap();
    assert!(!reread.is_active);
    assert_eq!(reread.shortcode, "keepme");
    assert_eq!(reread.expires_at, link.expires_at);
    assert!(reread.updated_at >= link.updated_at);
}

#[tokio::test]
async fn test_deactivated_link_stops_redirecting_immediately() {
    let store = CountingStore::new();
    let cache = MemoryCache::new();
    let service = common::link_service(&store, Some(cache.clone()));

    let link = service
        .create_short_link(ALICE, "https://example.com", Some("toggle"), None)
        .await
        .unwrap();
    service.resolve("toggle").await.unwrap();

    service
        .update(
            ALICE,
            link.id,
            LinkPatch {
                is_active: Some(false),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = service.resolve("toggle").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_rename_moves_redirect_to_new_code() {
    let store = CountingStore::new();
    let cache = MemoryCache::new();
    let service = common::link_service(&store, Some(cache.clone()));

    let link = service
        .create_short_link(ALICE, "https://example.com", Some("before"), None)
        .await
        .unwrap();
    service.resolve("before").await.unwrap();

    let renamed = service
        .update(
            ALICE,
            link.id,
            LinkPatch {
                shortcode: Some("after".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(renamed.shortcode, "after");
    assert_eq!(service.resolve("after").await.unwrap(), "https://example.com");
    assert_eq!(
        service.resolve("before").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
}

#[tokio::test]
async fn test_update_to_taken_code() {
    let store = CountingStore::new();
    let service = common::link_service(&store, None);

    service
        .create_short_link(BOB, "https://example.com/bob", Some("taken"), None)
        .await
        .unwrap();
    let link = service
        .create_short_link(ALICE, "https://example.com/alice", Some("mine"), None)
        .await
        .unwrap();

    let err = service
        .update(
            ALICE,
            link.id,
            LinkPatch {
                shortcode: Some("taken".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CodeTaken);
}

#[tokio::test]
async fn test_other_owner_sees_not_found() {
    let store = CountingStore::new();
    let service = common::link_service(&store, None);

    let link = service
        .create_short_link(ALICE, "https://example.com", None, None)
        .await
        .unwrap();

    assert_eq!(
        service.get_link(BOB, link.id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        service
            .update(
                BOB,
                link.id,
                LinkPatch {
                    is_active: Some(false),
                    ..Default::default()
                }
            )
            .await
            .unwrap_err()
            .kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        service.delete(BOB, link.id).await.unwrap_err().kind(),
        ErrorKind::NotFound
    );

    // Still live for its owner and for redirects.
    assert!(service.get_link(ALICE, link.id).await.is_ok());
    assert!(service.resolve(&link.shortcode).await.is_ok());
}

#[tokio::test]
async fn test_concurrent_creates_with_colliding_codes_both_succeed() {
    let store = CountingStore::new();

    let first = common::link_service(&store, None)
        .with_generator(ScriptedGenerator::new(&["collide01", "uniqueA01"]));
    let second = common::link_service(&store, None)
        .with_generator(ScriptedGenerator::new(&["collide01", "uniqueB01"]));

    let (a, b) = tokio::join!(
        first.create_short_link(ALICE, "https://example.com/a", None, None),
        second.create_short_link(BOB, "https://example.com/b", None, None),
    );
    let (a, b) = (a.unwrap(), b.unwrap());

    assert_ne!(a.shortcode, b.shortcode);
    let codes: HashSet<_> = [a.shortcode.as_str(), b.shortcode.as_str()].into();
    assert!(codes.contains("collide01"));
    assert_eq!(store.inserts(), 3);
    assert_eq!(store.inner.total_links(), 2);
}

#[tokio::test]
async fn test_resolve_racing_delete_leaves_no_cache_entry() {
    let store = CountingStore::new();
    let cache = MemoryCache::new();
    let service = Arc::new(common::link_service(&store, Some(cache.clone())));

    let link = service
        .create_short_link(ALICE, "https://example.com", Some("racy"), None)
        .await
        .unwrap();

    let (read_done, release) = store.hold_next_redirect_lookup();
    let in_flight = tokio::spawn({
        let service = service.clone();
        async move { service.resolve("racy").await }
    });

    read_done.await.unwrap();
    service.delete(ALICE, link.id).await.unwrap();
    release.send(()).unwrap();

    // The lookup read the row before the delete committed.
    assert_eq!(in_flight.await.unwrap().unwrap(), "https://example.com");

    assert!(cache.entry("racy").is_none());
    let err = service.resolve("racy").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_resolve_racing_rename_leaves_no_entry_for_old_code() {
    let store = CountingStore::new();
    let cache = MemoryCache::new();
    let service = Arc::new(common::link_service(&store, Some(cache.clone())));

    let link = service
        .create_short_link(ALICE, "https://example.com", Some("before"), None)
        .await
        .unwrap();

    let (read_done, release) = store.hold_next_redirect_lookup();
    let in_flight = tokio::spawn({
        let service = service.clone();
        async move { service.resolve("before").await }
    });

    read_done.await.unwrap();
    service
        .update(
            ALICE,
            link.id,
            LinkPatch {
                shortcode: Some("after".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    release.send(()).unwrap();
    in_flight.await.unwrap().unwrap();

    assert!(cache.entry("before").is_none());
    assert_eq!(
        service.resolve("before").await.unwrap_err().kind(),
        ErrorKind::NotFound
    );
    assert_eq!(service.resolve("after").await.unwrap(), "https://example.com");
}

#[tokio::test]
async fn test_many_concurrent_creates_get_distinct_codes() {
    let store = CountingStore::new();
    let service = Arc::new(common::link_service(&store, None));

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let service = service.clone();
            tokio::spawn(async move {
                service
                    .create_short_link(ALICE, &format!("https://example.com/{i}"), None, None)
                    .await
            })
        })
        .collect();

    let mut codes = HashSet::new();
    for handle in handles {
        let link = handle.await.unwrap().unwrap();
        assert!(codes.insert(link.shortcode));
    }
    assert_eq!(codes.len(), 50);
}

#[tokio::test]
async fn test_expiring_link_cache_ttl_is_clamped() {
    let store = CountingStore::new();
    let cache = MemoryCache::new();
    let service = common::link_service(&store, Some(cache.clone()));

    let expires_at = Utc::now() + ChronoDuration::minutes(10);
    service
        .create_short_link(ALICE, "https://example.com", Some("brief"), Some(expires_at))
        .await
        .unwrap();

    service.resolve("brief").await.unwrap();

    let (_, ttl) = cache.entry("brief").unwrap();
    assert!(ttl <= Duration::from_secs(600));
}

#[tokio::test]
async fn test_get_link_by_code_is_owner_scoped() {
    let store = CountingStore::new();
    let service = common::link_service(&store, None);

    let link = service
        .create_short_link(ALICE, "https://example.com", Some("bycode"), None)
        .await
        .unwrap();

    let found = service.get_link_by_code(ALICE, "bycode").await.unwrap();
    assert_eq!(found.id, link.id);

    let err = service.get_link_by_code(BOB, "bycode").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    service.delete(ALICE, link.id).await.unwrap();
    let err = service.get_link_by_code(ALICE, "bycode").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn test_tags_round_trip() {
    let store = CountingStore::new();
    let service = common::link_service(&store, None);
    let tags = TagService::new(Arc::new(store.inner.clone()));

    let link = service
        .create_short_link(ALICE, "https://example.com", None, None)
        .await
        .unwrap();
    let work = tags.create_tag(ALICE, "work").await.unwrap();
    let home = tags.create_tag(ALICE, "home").await.unwrap();
    let foreign = tags.create_tag(BOB, "work").await.unwrap();

    let tagged = service
        .add_tags(ALICE, link.id, &[work.id, home.id, foreign.id])
        .await
        .unwrap();
    let names: Vec<_> = tagged.tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["home", "work"]);

    // Idempotent.
    let again = service.add_tags(ALICE, link.id, &[work.id]).await.unwrap();
    assert_eq!(again.tags.len(), 2);

    let trimmed = service.remove_tags(ALICE, link.id, &[home.id]).await.unwrap();
    assert_eq!(trimmed.tags.len(), 1);
    assert_eq!(trimmed.tags[0].id, work.id);

    let unchanged = service.add_tags(ALICE, link.id, &[]).await.unwrap();
    assert_eq!(unchanged.tags.len(), 1);

    tags.delete_tag(ALICE, work.id).await.unwrap();
    let detached = service.get_link(ALICE, link.id).await.unwrap();
    assert!(detached.tags.is_empty());
}

#[tokio::test]
async fn test_list_links_pages_newest_first() {
    let store = CountingStore::new();
    let service = common::link_service(&store, None);

    for i in 0..5 {
        service
            .create_short_link(ALICE, &format!("https://example.com/{i}"), None, None)
            .await
            .unwrap();
    }
    service
        .create_short_link(BOB, "https://example.com/bob", None, None)
        .await
        .unwrap();

    let first = service.list_links(ALICE, 1, 2).await.unwrap();
    assert_eq!(first.total, 5);
    assert_eq!(first.links.len(), 2);
    assert!(first.links[0].created_at >= first.links[1].created_at);

    let last = service.list_links(ALICE, 3, 2).await.unwrap();
    assert_eq!(last.links.len(), 1);
}

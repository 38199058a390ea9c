#![allow(dead_code)]

use async_trait::async_trait;
use axum::http::HeaderName;
use axum_test::TestServer;
use shortlink::application::services::{LinkService, LinkServiceConfig, TagService};
use shortlink::domain::entities::{InsertOutcome, Link, LinkPatch, NewLink};
use shortlink::domain::repositories::{LinkRepository, TagRepository};
use shortlink::error::AppError;
use shortlink::infrastructure::cache::{CacheError, CacheResult, CacheService};
use shortlink::infrastructure::persistence::InMemoryStore;
use shortlink::routes::build_router;
use shortlink::state::AppState;
use shortlink::utils::code_generator::CodeGenerator;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::oneshot;
use uuid::Uuid;

pub const OWNER_HEADER: &str = "x-user-id";

/// In-memory cache that records how it is used and can be switched to fail.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, (String, Duration)>>,
    pub gets: AtomicUsize,
    pub sets: AtomicUsize,
    pub invalidations: AtomicUsize,
    failing: AtomicBool,
}

impl MemoryCache {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn entry(&self, code: &str) -> Option<(String, Duration)> {
        self.entries.lock().unwrap().get(code).cloned()
    }

    pub fn insert(&self, code: &str, url: &str) {
        self.entries
            .lock()
            .unwrap()
            .insert(code.to_string(), (url.to_string(), Duration::from_secs(60)));
    }

    fn check(&self) -> CacheResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            Err(CacheError::Connection("cache offline".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl CacheService for MemoryCache {
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>> {
        self.gets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.entry(short_code).map(|(url, _)| url))
    }

    async fn set_url(&self, short_code: &str, url: &str, ttl: Duration) -> CacheResult<()> {
        self.sets.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.entries
            .lock()
            .unwrap()
            .insert(short_code.to_string(), (url.to_string(), ttl));
        Ok(())
    }

    async fn invalidate(&self, short_code: &str) -> CacheResult<()> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        self.entries.lock().unwrap().remove(short_code);
        Ok(())
    }

    async fn health_check(&self) -> bool {
        !self.failing.load(Ordering::SeqCst)
    }
}

type Gate = (oneshot::Sender<()>, oneshot::Receiver<()>);

/// Wraps [`InMemoryStore`], counts store traffic and can pause a redirect lookup.
#[derive(Clone, Default)]
pub struct CountingStore {
    pub inner: InMemoryStore,
    redirect_lookups: Arc<AtomicUsize>,
    inserts: Arc<AtomicUsize>,
    gate: Arc<Mutex<Option<Gate>>>,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn redirect_lookups(&self) -> usize {
        self.redirect_lookups.load(Ordering::SeqCst)
    }

    pub fn inserts(&self) -> usize {
        self.inserts.load(Ordering::SeqCst)
    }

    /// Pauses the next redirect lookup after it has read the store.
    ///
    /// The returned receiver fires once the read is done; the lookup returns
    /// its (by then possibly stale) result when the sender is used or dropped.
    pub fn hold_next_redirect_lookup(&self) -> (oneshot::Receiver<()>, oneshot::Sender<()>) {
        let (read_tx, read_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel();
        *self.gate.lock().unwrap() = Some((read_tx, release_rx));
        (read_rx, release_tx)
    }
}

#[async_trait]
impl LinkRepository for CountingStore {
    async fn insert(&self, new_link: NewLink) -> Result<InsertOutcome, AppError> {
        self.inserts.fetch_add(1, Ordering::SeqCst);
        self.inner.insert(new_link).await
    }

    async fn find_by_id(&self, id: Uuid, owner_id: &str) -> Result<Option<Link>, AppError> {
        self.inner.find_by_id(id, owner_id).await
    }

    async fn find_by_code(&self, code: &str, owner_id: &str) -> Result<Option<Link>, AppError> {
        self.inner.find_by_code(code, owner_id).await
    }

    async fn find_for_redirect(&self, code: &str) -> Result<Option<Link>, AppError> {
        self.redirect_lookups.fetch_add(1, Ordering::SeqCst);
        let result = self.inner.find_for_redirect(code).await;

        let gate = self.gate.lock().unwrap().take();
        if let Some((read_done, release)) = gate {
            let _ = read_done.send(());
            let _ = release.await;
        }

        result
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, AppError> {
        LinkRepository::list_by_owner(&self.inner, owner_id, limit, offset).await
    }

    async fn count_by_owner(&self, owner_id: &str) -> Result<i64, AppError> {
        self.inner.count_by_owner(owner_id).await
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: &str,
        patch: LinkPatch,
    ) -> Result<Option<Link>, AppError> {
        self.inner.update(id, owner_id, patch).await
    }

    async fn soft_delete(&self, id: Uuid, owner_id: &str) -> Result<Option<Link>, AppError> {
        self.inner.soft_delete(id, owner_id).await
    }

    async fn add_tags(&self, id: Uuid, owner_id: &str, tag_ids: &[Uuid]) -> Result<(), AppError> {
        self.inner.add_tags(id, owner_id, tag_ids).await
    }

    async fn remove_tags(
        &self,
        id: Uuid,
        owner_id: &str,
        tag_ids: &[Uuid],
    ) -> Result<(), AppError> {
        self.inner.remove_tags(id, owner_id, tag_ids).await
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.inner.ping().await
    }
}

/// Replays a fixed sequence of codes, then fails.
pub struct ScriptedGenerator(Mutex<Vec<String>>);

impl ScriptedGenerator {
    pub fn new(codes: &[&str]) -> Arc<Self> {
        Arc::new(Self(Mutex::new(
            codes.iter().rev().map(|c| c.to_string()).collect(),
        )))
    }
}

impl CodeGenerator for ScriptedGenerator {
    fn generate(&self, _length: usize) -> Result<String, AppError> {
        self.0
            .lock()
            .unwrap()
            .pop()
            .ok_or_else(|| AppError::internal("generator script exhausted", serde_json::json!({})))
    }
}

/// Link service over a counting in-memory store and an optional cache.
pub fn link_service(
    store: &CountingStore,
    cache: Option<Arc<MemoryCache>>,
) -> LinkService<CountingStore> {
    let cache = cache.map(|c| c as Arc<dyn CacheService>);
    LinkService::new(Arc::new(store.clone()), cache, LinkServiceConfig::default())
}

/// Application state backed by the in-memory store.
pub fn create_test_state(store: &InMemoryStore, cache: Option<Arc<MemoryCache>>) -> AppState {
    let cache = cache.map(|c| c as Arc<dyn CacheService>);
    let link_repository: Arc<dyn LinkRepository> = Arc::new(store.clone());
    let tag_repository: Arc<dyn TagRepository> = Arc::new(store.clone());

    AppState::new(
        Arc::new(LinkService::new(
            link_repository,
            cache,
            LinkServiceConfig::default(),
        )),
        Arc::new(TagService::new(tag_repository)),
        HeaderName::from_static(OWNER_HEADER),
    )
}

/// Full application router over the in-memory store.
pub fn make_server(store: &InMemoryStore, cache: Option<Arc<MemoryCache>>) -> TestServer {
    let app = build_router(create_test_state(store, cache), Duration::from_secs(5));
    TestServer::new(app).unwrap()
}

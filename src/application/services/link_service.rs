//! Link creation, redirect resolution and owner-scoped mutation.
//!
//! The redirect path is cache-aside: the cache is consulted first, the store on a
//! miss, and the cache is populated afterwards. Every cache call is bounded by
//! [`LinkServiceConfig::cache_timeout`] and every cache failure degrades to a
//! store read. Writes never touch the cache except to evict stale entries.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::domain::entities::{InsertOutcome, Link, LinkPatch, NewLink};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::infrastructure::cache::{CacheError, CacheResult, CacheService};
use crate::utils::code_generator::{CodeGenerator, RandomCodeGenerator};
use crate::utils::validation::{
    is_reserved_code, validate_custom_code, validate_expiry, validate_url,
};

/// Upper bound for [`LinkService::list_links`] page sizes.
pub const MAX_PAGE_SIZE: u32 = 100;

/// Tunables of the link service.
#[derive(Debug, Clone)]
pub struct LinkServiceConfig {
    /// Length of generated shortcodes.
    pub code_length: usize,
    /// Insert attempts for generated codes before giving up.
    pub max_create_attempts: usize,
    /// Maximum accepted destination URL length.
    pub max_url_length: usize,
    /// TTL of cached redirect entries.
    pub cache_ttl: Duration,
    /// Bound on any single cache call.
    pub cache_timeout: Duration,
}

impl Default for LinkServiceConfig {
    fn default() -> Self {
        Self {
            code_length: 9,
            max_create_attempts: 3,
            max_url_length: 2048,
            cache_ttl: Duration::from_secs(24 * 60 * 60),
            cache_timeout: Duration::from_millis(250),
        }
    }
}

/// One page of an owner's links.
#[derive(Debug, Clone)]
pub struct LinkPage {
    pub links: Vec<Link>,
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
}

/// Service for creating, resolving and managing short links.
///
/// Holds no mutable state of its own: shortcode uniqueness is delegated to the
/// store and the cache is an optional accelerator.
pub struct LinkService<L: LinkRepository + ?Sized> {
    link_repository: Arc<L>,
    cache: Option<Arc<dyn CacheService>>,
    generator: Arc<dyn CodeGenerator>,
    config: LinkServiceConfig,
}

impl<L: LinkRepository + ?Sized> LinkService<L> {
    /// Creates a new link service using the OS random source for codes.
    ///
    /// Pass `None` as `cache` to run without caching.
    pub fn new(
        link_repository: Arc<L>,
        cache: Option<Arc<dyn CacheService>>,
        config: LinkServiceConfig,
    ) -> Self {
        Self {
            link_repository,
            cache,
            generator: Arc::new(RandomCodeGenerator),
            config,
        }
    }

    /// Replaces the code generator.
    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generator = generator;
        self
    }

    pub fn config(&self) -> &LinkServiceConfig {
        &self.config
    }

    /// Creates a short link for `owner_id`.
    ///
    /// # Code selection
    ///
    /// - With `custom_code`, exactly one insert is attempted.
    /// - Otherwise a random code is generated and the insert retried with a fresh
    ///   code on collision, up to `max_create_attempts` times. A generated code
    ///   that shadows a route counts as a collision.
    ///
    /// The cache is not touched; it is filled lazily by [`Self::resolve`].
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] if the URL, custom code or expiry is invalid.
    /// Returns [`AppError::CodeTaken`] if the custom code belongs to a live link.
    /// Returns [`AppError::Internal`] on store failures or exhausted retries.
    pub async fn create_short_link(
        &self,
        owner_id: &str,
        original_url: &str,
        custom_code: Option<&str>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Result<Link, AppError> {
        validate_owner(owner_id)?;
        validate_url(original_url, self.config.max_url_length)?;
        if let Some(expires_at) = expires_at {
            validate_expiry(expires_at, Utc::now())?;
        }

        let new_link = |shortcode: String| NewLink {
            shortcode,
            original_url: original_url.to_string(),
            owner_id: owner_id.to_string(),
            expires_at,
        };

        if let Some(code) = custom_code {
            validate_custom_code(code)?;

            return match self.link_repository.insert(new_link(code.to_string())).await? {
                InsertOutcome::Created(link) => Ok(link),
                InsertOutcome::CodeConflict => Err(AppError::code_taken(
                    "Short code is already taken",
                    json!({ "shortcode": code }),
                )),
            };
        }

        for attempt in 1..=self.config.max_create_attempts {
            let code = self.generator.generate(self.config.code_length)?;

            let outcome = if is_reserved_code(&code) {
                InsertOutcome::CodeConflict
            } else {
                self.link_repository.insert(new_link(code)).await?
            };

            match outcome {
                InsertOutcome::Created(link) => return Ok(link),
                InsertOutcome::CodeConflict => {
                    metrics::counter!("shortlink_code_collisions_total").increment(1);
                    debug!(attempt, "Generated short code collided, retrying");
                }
            }
        }

        // Logged once, by whoever reports the Internal error.
        Err(AppError::internal(
            "Failed to generate unique short code",
            json!({
                "attempts": self.config.max_create_attempts,
                "code_length": self.config.code_length,
            }),
        ))
    }

    /// Resolves a shortcode to its destination URL for a redirect.
    ///
    /// Inactive, expired, deleted and unknown codes are all reported the same way.
    ///
    /// After populating the cache the link is read again; if a delete,
    /// deactivation or rename landed in between, the fresh entry is evicted so
    /// it cannot outlive the mutation's own eviction.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if no live link has this code.
    /// Returns [`AppError::Internal`] on store failures. Cache failures never surface.
    pub async fn resolve(&self, code: &str) -> Result<String, AppError> {
        if let Some(cache) = &self.cache
            && let Some(url) = self.cache_get(cache.as_ref(), code).await
        {
            return Ok(url);
        }

        let now = Utc::now();
        let link = self
            .link_repository
            .find_for_redirect(code)
            .await?
            .filter(|link| link.is_live(now))
            .ok_or_else(|| {
                AppError::not_found("Short link not found", json!({ "shortcode": code }))
            })?;

        if let Some(cache) = &self.cache
            && let Some(ttl) = self.cache_ttl_for(&link, now)
            && self
                .cache_set(cache.as_ref(), code, &link.original_url, ttl)
                .await
        {
            self.confirm_cached(cache.as_ref(), code, &link).await;
        }

        Ok(link.original_url)
    }

    /// Returns one of the owner's live links by id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] for missing, deleted or foreign links.
    pub async fn get_link(&self, owner_id: &str, id: Uuid) -> Result<Link, AppError> {
        self.link_repository
            .find_by_id(id, owner_id)
            .await?
            .ok_or_else(|| link_not_found(id))
    }

    /// Returns one of the owner's live links by shortcode.
    pub async fn get_link_by_code(&self, owner_id: &str, code: &str) -> Result<Link, AppError> {
        self.link_repository
            .find_by_code(code, owner_id)
            .await?
            .ok_or_else(|| {
                AppError::not_found("Short link not found", json!({ "shortcode": code }))
            })
    }

    /// Lists the owner's live links, newest first.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] if `page` is 0 or `page_size` is outside
    /// `1..=100`.
    pub async fn list_links(
        &self,
        owner_id: &str,
        page: u32,
        page_size: u32,
    ) -> Result<LinkPage, AppError> {
        if page == 0 {
            return Err(AppError::invalid_input(
                "Page must be greater than 0",
                json!({ "page": page }),
            ));
        }
        if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
            return Err(AppError::invalid_input(
                format!("Page size must be between 1 and {MAX_PAGE_SIZE}"),
                json!({ "page_size": page_size }),
            ));
        }

        let limit = i64::from(page_size);
        let offset = i64::from(page - 1) * limit;

        let links = self
            .link_repository
            .list_by_owner(owner_id, limit, offset)
            .await?;
        let total = self.link_repository.count_by_owner(owner_id).await?;

        Ok(LinkPage {
            links,
            total,
            page,
            page_size,
        })
    }

    /// Partially updates one of the owner's links.
    ///
    /// Fields absent from `patch` are left untouched. An empty patch changes
    /// nothing and returns the current state.
    ///
    /// # Cache
    ///
    /// The entry under the link's resulting shortcode is evicted before returning.
    /// When the shortcode changes, the entry under the previous code is evicted
    /// too, since that code is free for another link to claim.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] for an invalid shortcode or non-future expiry.
    /// Returns [`AppError::NotFound`] for missing, deleted or foreign links.
    /// Returns [`AppError::CodeTaken`] if the new shortcode belongs to a live link.
    pub async fn update(
        &self,
        owner_id: &str,
        id: Uuid,
        patch: LinkPatch,
    ) -> Result<Link, AppError> {
        if let Some(code) = &patch.shortcode {
            validate_custom_code(code)?;
        }
        if let Some(Some(expires_at)) = patch.expires_at {
            validate_expiry(expires_at, Utc::now())?;
        }

        if patch.is_empty() {
            return self.get_link(owner_id, id).await;
        }

        let previous_code = match (&patch.shortcode, &self.cache) {
            (Some(_), Some(_)) => Some(self.get_link(owner_id, id).await?.shortcode),
            _ => None,
        };

        let link = self
            .link_repository
            .update(id, owner_id, patch)
            .await?
            .ok_or_else(|| link_not_found(id))?;

        if let Some(cache) = &self.cache {
            self.cache_invalidate(cache.as_ref(), &link.shortcode).await;
            if let Some(previous) = previous_code.filter(|c| *c != link.shortcode) {
                self.cache_invalidate(cache.as_ref(), &previous).await;
            }
        }

        Ok(link)
    }

    /// Soft-deletes one of the owner's links and evicts its cache entry.
    ///
    /// The shortcode becomes available for reuse.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if nothing was deleted (already deleted,
    /// wrong owner or nonexistent).
    pub async fn delete(&self, owner_id: &str, id: Uuid) -> Result<(), AppError> {
        let deleted = self
            .link_repository
            .soft_delete(id, owner_id)
            .await?
            .ok_or_else(|| link_not_found(id))?;

        if let Some(cache) = &self.cache {
            self.cache_invalidate(cache.as_ref(), &deleted.shortcode)
                .await;
        }

        Ok(())
    }

    /// Attaches the owner's tags to a link and returns the link with its full tag set.
    ///
    /// Idempotent. Tag ids the owner does not have are ignored.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link is missing, deleted or foreign.
    pub async fn add_tags(
        &self,
        owner_id: &str,
        id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<Link, AppError> {
        if !tag_ids.is_empty() {
            self.link_repository.add_tags(id, owner_id, tag_ids).await?;
        }

        self.get_link(owner_id, id).await
    }

    /// Detaches tags from a link and returns the link with its remaining tags.
    ///
    /// Idempotent.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the link is missing, deleted or foreign.
    pub async fn remove_tags(
        &self,
        owner_id: &str,
        id: Uuid,
        tag_ids: &[Uuid],
    ) -> Result<Link, AppError> {
        if !tag_ids.is_empty() {
            self.link_repository
                .remove_tags(id, owner_id, tag_ids)
                .await?;
        }

        self.get_link(owner_id, id).await
    }

    /// Checks that the link store is reachable.
    pub async fn check_store(&self) -> Result<(), AppError> {
        self.link_repository.ping().await
    }

    /// Checks that the cache answers within the configured timeout.
    ///
    /// Returns `None` when caching is disabled.
    pub async fn check_cache(&self) -> Option<bool> {
        let cache = self.cache.as_ref()?;
        let healthy = tokio::time::timeout(self.config.cache_timeout, cache.health_check())
            .await
            .unwrap_or(false);
        Some(healthy)
    }

    /// Cache TTL for a live link, never extending past its expiry.
    fn cache_ttl_for(&self, link: &Link, now: DateTime<Utc>) -> Option<Duration> {
        match link.expires_at {
            None => Some(self.config.cache_ttl),
            Some(expires_at) => {
                let remaining = (expires_at - now).to_std().ok()?;
                let ttl = remaining.min(self.config.cache_ttl);
                (ttl >= Duration::from_secs(1)).then_some(ttl)
            }
        }
    }

    /// Runs a cache call under the configured timeout.
    async fn bounded<T>(&self, call: impl Future<Output = CacheResult<T>>) -> CacheResult<T> {
        tokio::time::timeout(self.config.cache_timeout, call)
            .await
            .map_err(|_| CacheError::Timeout(self.config.cache_timeout))?
    }

    async fn cache_get(&self, cache: &dyn CacheService, code: &str) -> Option<String> {
        match self.bounded(cache.get_url(code)).await {
            Ok(Some(url)) => {
                metrics::counter!("shortlink_cache_hits_total").increment(1);
                debug!(shortcode = code, "Cache HIT");
                Some(url)
            }
            Ok(None) => {
                metrics::counter!("shortlink_cache_misses_total").increment(1);
                debug!(shortcode = code, "Cache MISS");
                None
            }
            Err(e) => {
                metrics::counter!("shortlink_cache_errors_total").increment(1);
                warn!(error = %e, shortcode = code, "Cache read failed, falling back to store");
                None
            }
        }
    }

    /// Populates the cache. Returns whether the entry may have been stored.
    async fn cache_set(
        &self,
        cache: &dyn CacheService,
        code: &str,
        url: &str,
        ttl: Duration,
    ) -> bool {
        match self.bounded(cache.set_url(code, url, ttl)).await {
            Ok(()) => true,
            // A timed-out write can still land after we stop waiting.
            Err(e @ CacheError::Timeout(_)) => {
                warn!(error = %e, shortcode = code, "Failed to populate cache");
                true
            }
            Err(e) => {
                warn!(error = %e, shortcode = code, "Failed to populate cache");
                false
            }
        }
    }

    /// Evicts a just-written entry unless the same link is still live under `code`.
    async fn confirm_cached(&self, cache: &dyn CacheService, code: &str, link: &Link) {
        let still_live = match self.link_repository.find_for_redirect(code).await {
            Ok(current) => {
                current.is_some_and(|current| current.id == link.id && current.is_live(Utc::now()))
            }
            Err(e) => {
                warn!(error = %e, shortcode = code, "Failed to re-check cached link");
                false
            }
        };

        if !still_live {
            debug!(shortcode = code, "Link changed while caching, evicting entry");
            self.cache_invalidate(cache, code).await;
        }
    }

    async fn cache_invalidate(&self, cache: &dyn CacheService, code: &str) {
        match self.bounded(cache.invalidate(code)).await {
            Ok(()) => debug!(shortcode = code, "Cache entry invalidated"),
            Err(e) => warn!(error = %e, shortcode = code, "Failed to invalidate cache"),
        }
    }
}

fn validate_owner(owner_id: &str) -> Result<(), AppError> {
    if owner_id.trim().is_empty() {
        return Err(AppError::invalid_input(
            "Owner must not be empty",
            json!({ "field": "owner" }),
        ));
    }
    Ok(())
}

fn link_not_found(id: Uuid) -> AppError {
    AppError::not_found("Short link not found", json!({ "id": id }))
}

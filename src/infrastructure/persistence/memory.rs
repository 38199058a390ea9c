//! In-process link and tag store.
//!
//! Mirrors the PostgreSQL schema rules: shortcodes are unique among live links
//! only, deletes are soft, and tag associations are owner-scoped. Useful for
//! running the service without a database and as a faithful test double.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

use crate::domain::entities::{InsertOutcome, Link, LinkPatch, NewLink, Tag};
use crate::domain::repositories::{LinkRepository, TagRepository};
use crate::error::AppError;

#[derive(Debug, Default)]
struct State {
    links: HashMap<Uuid, Link>,
    tags: HashMap<Uuid, Tag>,
    link_tags: BTreeSet<(Uuid, Uuid)>,
}

impl State {
    fn live_code_taken(&self, code: &str, except: Option<Uuid>) -> bool {
        self.links
            .values()
            .any(|l| l.deleted_at.is_none() && l.shortcode == code && Some(l.id) != except)
    }

    fn live_link(&self, id: Uuid, owner_id: &str) -> Option<&Link> {
        self.links
            .get(&id)
            .filter(|l| l.deleted_at.is_none() && l.owner_id == owner_id)
    }

    fn tags_of(&self, link_id: Uuid) -> Vec<Tag> {
        let mut tags: Vec<Tag> = self
            .link_tags
            .iter()
            .filter(|(l, _)| *l == link_id)
            .filter_map(|(_, tag_id)| self.tags.get(tag_id).cloned())
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        tags
    }

    fn with_tags(&self, link: &Link) -> Link {
        Link {
            tags: self.tags_of(link.id),
            ..link.clone()
        }
    }
}

/// Shared in-memory store. Clones share the same underlying data.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored links, soft-deleted ones included.
    pub fn total_links(&self) -> usize {
        self.state.lock().map(|s| s.links.len()).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, AppError> {
        self.state
            .lock()
            .map_err(|_| AppError::internal("In-memory store lock poisoned", json!({})))
    }
}

#[async_trait]
impl LinkRepository for InMemoryStore {
    async fn insert(&self, new_link: NewLink) -> Result<InsertOutcome, AppError> {
        let mut state = self.lock()?;

        if state.live_code_taken(&new_link.shortcode, None) {
            return Ok(InsertOutcome::CodeConflict);
        }

        let now = Utc::now();
        let link = Link {
            id: Uuid::new_v4(),
            shortcode: new_link.shortcode,
            original_url: new_link.original_url,
            owner_id: new_link.owner_id,
            is_active: true,
            expires_at: new_link.expires_at,
            created_at: now,
            updated_at: now,
            deleted_at: None,
            tags: Vec::new(),
        };
        state.links.insert(link.id, link.clone());

        Ok(InsertOutcome::Created(link))
    }

    async fn find_by_id(&self, id: Uuid, owner_id: &str) -> Result<Option<Link>, AppError> {
        let state = self.lock()?;
        Ok(state.live_link(id, owner_id).map(|l| state.with_tags(l)))
    }

    async fn find_by_code(&self, code: &str, owner_id: &str) -> Result<Option<Link>, AppError> {
        let state = self.lock()?;
        Ok(state
            .links
            .values()
            .find(|l| l.deleted_at.is_none() && l.shortcode == code && l.owner_id == owner_id)
            .map(|l| state.with_tags(l)))
    }

    async fn find_for_redirect(&self, code: &str) -> Result<Option<Link>, AppError> {
        let state = self.lock()?;
        Ok(state
            .links
            .values()
            .find(|l| l.deleted_at.is_none() && l.shortcode == code)
            .cloned())
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, AppError> {
        let state = self.lock()?;
        let mut links: Vec<&Link> = state
            .links
            .values()
            .filter(|l| l.deleted_at.is_none() && l.owner_id == owner_id)
            .collect();
        links.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));

        Ok(links
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(0))
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|l| state.with_tags(l))
            .collect())
    }

    async fn count_by_owner(&self, owner_id: &str) -> Result<i64, AppError> {
        let state = self.lock()?;
        let count = state
            .links
            .values()
            .filter(|l| l.deleted_at.is_none() && l.owner_id == owner_id)
            .count();
        Ok(count as i64)
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: &str,
        patch: LinkPatch,
    ) -> Result<Option<Link>, AppError> {
        let mut state = self.lock()?;

        if state.live_link(id, owner_id).is_none() {
            return Ok(None);
        }

        if let Some(code) = &patch.shortcode
            && state.live_code_taken(code, Some(id))
        {
            return Err(AppError::code_taken(
                "Short code is already taken",
                json!({ "shortcode": code }),
            ));
        }

        let Some(link) = state.links.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(code) = patch.shortcode {
            link.shortcode = code;
        }
        if let Some(is_active) = patch.is_active {
            link.is_active = is_active;
        }
        if let Some(expires_at) = patch.expires_at {
            link.expires_at = expires_at;
        }
        link.updated_at = Utc::now();

        let link = link.clone();
        Ok(Some(state.with_tags(&link)))
    }

    async fn soft_delete(&self, id: Uuid, owner_id: &str) -> Result<Option<Link>, AppError> {
        let mut state = self.lock()?;

        if state.live_link(id, owner_id).is_none() {
            return Ok(None);
        }

        let Some(link) = state.links.get_mut(&id) else {
            return Ok(None);
        };
        let now = Utc::now();
        link.deleted_at = Some(now);
        link.updated_at = now;

        Ok(Some(link.clone()))
    }

    async fn add_tags(&self, id: Uuid, owner_id: &str, tag_ids: &[Uuid]) -> Result<(), AppError> {
        let mut state = self.lock()?;

        if state.live_link(id, owner_id).is_none() {
            return Ok(());
        }

        let owned: Vec<Uuid> = tag_ids
            .iter()
            .copied()
            .filter(|tag_id| {
                state
                    .tags
                    .get(tag_id)
                    .is_some_and(|t| t.owner_id == owner_id)
            })
            .collect();
        for tag_id in owned {
            state.link_tags.insert((id, tag_id));
        }

        Ok(())
    }

    async fn remove_tags(
        &self,
        id: Uuid,
        owner_id: &str,
        tag_ids: &[Uuid],
    ) -> Result<(), AppError> {
        let mut state = self.lock()?;

        if state.live_link(id, owner_id).is_none() {
            return Ok(());
        }

        for tag_id in tag_ids {
            state.link_tags.remove(&(id, *tag_id));
        }

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.lock().map(|_| ())
    }
}

#[async_trait]
impl TagRepository for InMemoryStore {
    async fn get_or_create(&self, owner_id: &str, name: &str) -> Result<Tag, AppError> {
        let mut state = self.lock()?;

        if let Some(existing) = state
            .tags
            .values()
            .find(|t| t.owner_id == owner_id && t.name == name)
        {
            return Ok(existing.clone());
        }

        let tag = Tag {
            id: Uuid::new_v4(),
            owner_id: owner_id.to_string(),
            name: name.to_string(),
            created_at: Utc::now(),
        };
        state.tags.insert(tag.id, tag.clone());

        Ok(tag)
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Tag>, AppError> {
        let state = self.lock()?;
        let mut tags: Vec<Tag> = state
            .tags
            .values()
            .filter(|t| t.owner_id == owner_id)
            .cloned()
            .collect();
        tags.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(tags)
    }

    async fn delete(&self, id: Uuid, owner_id: &str) -> Result<bool, AppError> {
        let mut state = self.lock()?;

        if !state.tags.get(&id).is_some_and(|t| t.owner_id == owner_id) {
            return Ok(false);
        }

        state.tags.remove(&id);
        state.link_tags.retain(|(_, tag_id)| *tag_id != id);
        Ok(true)
    }
}

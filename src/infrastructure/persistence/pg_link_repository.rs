//! PostgreSQL implementation of link repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::{InsertOutcome, Link, LinkPatch, NewLink, Tag};
use crate::domain::repositories::LinkRepository;
use crate::error::AppError;
use crate::utils::db_error::is_unique_violation_on_shortcode;

macro_rules! link_columns {
    () => {
        "id, shortcode, original_url, owner_id, is_active, expires_at, created_at, updated_at, deleted_at"
    };
}

#[derive(sqlx::FromRow)]
struct LinkRow {
    id: Uuid,
    shortcode: String,
    original_url: String,
    owner_id: String,
    is_active: bool,
    expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    deleted_at: Option<DateTime<Utc>>,
}

impl LinkRow {
    fn into_link(self, tags: Vec<Tag>) -> Link {
        Link {
            id: self.id,
            shortcode: self.shortcode,
            original_url: self.original_url,
            owner_id: self.owner_id,
            is_active: self.is_active,
            expires_at: self.expires_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
            deleted_at: self.deleted_at,
            tags,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LinkTagRow {
    link_id: Uuid,
    id: Uuid,
    owner_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

/// PostgreSQL repository for links and their tag associations.
///
/// Shortcode uniqueness among live rows is enforced by the partial index
/// `links_shortcode_live_key`; soft-deleted rows release their code.
pub struct PgLinkRepository {
    pool: Arc<PgPool>,
}

impl PgLinkRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }

    /// Loads tags for a batch of links, grouped by link id.
    async fn load_tags(&self, link_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Tag>>, AppError> {
        if link_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows = sqlx::query_as::<_, LinkTagRow>(
            r#"
            SELECT lt.link_id, t.id, t.owner_id, t.name, t.created_at
            FROM link_tags lt
            JOIN tags t ON t.id = lt.tag_id
            WHERE lt.link_id = ANY($1)
            ORDER BY t.name
            "#,
        )
        .bind(link_ids)
        .fetch_all(self.pool.as_ref())
        .await?;

        let mut grouped: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for row in rows {
            grouped.entry(row.link_id).or_default().push(Tag {
                id: row.id,
                owner_id: row.owner_id,
                name: row.name,
                created_at: row.created_at,
            });
        }

        Ok(grouped)
    }

    async fn with_tags(&self, row: Option<LinkRow>) -> Result<Option<Link>, AppError> {
        let Some(row) = row else {
            return Ok(None);
        };

        let mut tags = self.load_tags(&[row.id]).await?;
        let link_tags = tags.remove(&row.id).unwrap_or_default();
        Ok(Some(row.into_link(link_tags)))
    }
}

#[async_trait]
impl LinkRepository for PgLinkRepository {
    async fn insert(&self, new_link: NewLink) -> Result<InsertOutcome, AppError> {
        let result = sqlx::query_as::<_, LinkRow>(concat!(
            r#"
            INSERT INTO links (id, shortcode, original_url, owner_id, expires_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (shortcode) WHERE deleted_at IS NULL DO NOTHING
            RETURNING "#,
            link_columns!()
        ))
        .bind(Uuid::new_v4())
        .bind(&new_link.shortcode)
        .bind(&new_link.original_url)
        .bind(&new_link.owner_id)
        .bind(new_link.expires_at)
        .fetch_optional(self.pool.as_ref())
        .await;

        match result {
            Ok(Some(row)) => Ok(InsertOutcome::Created(row.into_link(Vec::new()))),
            // No row returned: a live link already holds this code.
            Ok(None) => Ok(InsertOutcome::CodeConflict),
            Err(e) if is_unique_violation_on_shortcode(&e) => Ok(InsertOutcome::CodeConflict),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_by_id(&self, id: Uuid, owner_id: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(concat!(
            "SELECT ",
            link_columns!(),
            r#"
            FROM links
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL
            "#
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        self.with_tags(row).await
    }

    async fn find_by_code(&self, code: &str, owner_id: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(concat!(
            "SELECT ",
            link_columns!(),
            r#"
            FROM links
            WHERE shortcode = $1 AND owner_id = $2 AND deleted_at IS NULL
            "#
        ))
        .bind(code)
        .bind(owner_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        self.with_tags(row).await
    }

    async fn find_for_redirect(&self, code: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(concat!(
            "SELECT ",
            link_columns!(),
            r#"
            FROM links
            WHERE shortcode = $1 AND deleted_at IS NULL
            "#
        ))
        .bind(code)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|r| r.into_link(Vec::new())))
    }

    async fn list_by_owner(
        &self,
        owner_id: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Link>, AppError> {
        let rows = sqlx::query_as::<_, LinkRow>(concat!(
            "SELECT ",
            link_columns!(),
            r#"
            FROM links
            WHERE owner_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#
        ))
        .bind(owner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool.as_ref())
        .await?;

        let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
        let mut tags = self.load_tags(&ids).await?;

        Ok(rows
            .into_iter()
            .map(|r| {
                let link_tags = tags.remove(&r.id).unwrap_or_default();
                r.into_link(link_tags)
            })
            .collect())
    }

    async fn count_by_owner(&self, owner_id: &str) -> Result<i64, AppError> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM links WHERE owner_id = $1 AND deleted_at IS NULL",
        )
        .bind(owner_id)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(count)
    }

    async fn update(
        &self,
        id: Uuid,
        owner_id: &str,
        patch: LinkPatch,
    ) -> Result<Option<Link>, AppError> {
        let update_expiry = patch.expires_at.is_some();
        let new_expiry = patch.expires_at.flatten();

        let row = sqlx::query_as::<_, LinkRow>(concat!(
            r#"
            UPDATE links SET
                shortcode  = COALESCE($3::TEXT, shortcode),
                is_active  = COALESCE($4::BOOLEAN, is_active),
                expires_at = CASE WHEN $5 THEN $6::TIMESTAMPTZ ELSE expires_at END,
                updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL
            RETURNING "#,
            link_columns!()
        ))
        .bind(id)
        .bind(owner_id)
        .bind(patch.shortcode)
        .bind(patch.is_active)
        .bind(update_expiry)
        .bind(new_expiry)
        .fetch_optional(self.pool.as_ref())
        .await?;

        self.with_tags(row).await
    }

    async fn soft_delete(&self, id: Uuid, owner_id: &str) -> Result<Option<Link>, AppError> {
        let row = sqlx::query_as::<_, LinkRow>(concat!(
            r#"
            UPDATE links SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND owner_id = $2 AND deleted_at IS NULL
            RETURNING "#,
            link_columns!()
        ))
        .bind(id)
        .bind(owner_id)
        .fetch_optional(self.pool.as_ref())
        .await?;

        Ok(row.map(|r| r.into_link(Vec::new())))
    }

    async fn add_tags(&self, id: Uuid, owner_id: &str, tag_ids: &[Uuid]) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO link_tags (link_id, tag_id)
            SELECT l.id, t.id
            FROM links l
            JOIN tags t ON t.owner_id = l.owner_id
            WHERE l.id = $1
              AND l.owner_id = $2
              AND l.deleted_at IS NULL
              AND t.id = ANY($3)
            ON CONFLICT DO NOTHING
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(tag_ids)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn remove_tags(
        &self,
        id: Uuid,
        owner_id: &str,
        tag_ids: &[Uuid],
    ) -> Result<(), AppError> {
        sqlx::query(
            r#"
            DELETE FROM link_tags lt
            USING links l
            WHERE lt.link_id = l.id
              AND l.id = $1
              AND l.owner_id = $2
              AND l.deleted_at IS NULL
              AND lt.tag_id = ANY($3)
            "#,
        )
        .bind(id)
        .bind(owner_id)
        .bind(tag_ids)
        .execute(self.pool.as_ref())
        .await?;

        Ok(())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(self.pool.as_ref()).await?;
        Ok(())
    }
}

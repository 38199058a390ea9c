//! PostgreSQL implementation of tag repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::entities::Tag;
use crate::domain::repositories::TagRepository;
use crate::error::AppError;

#[derive(sqlx::FromRow)]
struct TagRow {
    id: Uuid,
    owner_id: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<TagRow> for Tag {
    fn from(row: TagRow) -> Self {
        Tag {
            id: row.id,
            owner_id: row.owner_id,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

/// PostgreSQL repository for owner-scoped tags.
pub struct PgTagRepository {
    pool: Arc<PgPool>,
}

impl PgTagRepository {
    /// Creates a new repository with a database connection pool.
    pub fn new(pool: Arc<PgPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TagRepository for PgTagRepository {
    async fn get_or_create(&self, owner_id: &str, name: &str) -> Result<Tag, AppError> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query_as::<_, TagRow>(
            r#"
            INSERT INTO tags (id, owner_id, name)
            VALUES ($1, $2, $3)
            ON CONFLICT ON CONSTRAINT tags_owner_name_key
                DO UPDATE SET name = EXCLUDED.name
            RETURNING id, owner_id, name, created_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(owner_id)
        .bind(name)
        .fetch_one(self.pool.as_ref())
        .await?;

        Ok(row.into())
    }

    async fn list_by_owner(&self, owner_id: &str) -> Result<Vec<Tag>, AppError> {
        let rows = sqlx::query_as::<_, TagRow>(
            r#"
            SELECT id, owner_id, name, created_at
            FROM tags
            WHERE owner_id = $1
            ORDER BY name
            "#,
        )
        .bind(owner_id)
        .fetch_all(self.pool.as_ref())
        .await?;

        Ok(rows.into_iter().map(Tag::from).collect())
    }

    async fn delete(&self, id: Uuid, owner_id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1 AND owner_id = $2")
            .bind(id)
            .bind(owner_id)
            .execute(self.pool.as_ref())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/**
 * Notebook Persistence
 *
 * The real-time core only needs two things from storage: read a notebook's
 * metadata/content, and atomically replace its content while advancing the
 * version by one. The compare-and-set is the single serialization point
 * between concurrent writers, so both implementations perform the version
 * check and the write as one indivisible step.
 *
 * # Implementations
 *
 * - [`InMemoryNotebookStore`] - process-local, used when no database is configured and in tests
 * - [`PgNotebookStore`] - PostgreSQL via sqlx, CAS is a single conditional `UPDATE`
 */

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::shared::{NotebookId, NotebookRecord, Permission};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Notebook {0} not found")]
    NotFound(NotebookId),

    /// A stored row could not be mapped back to a record
    #[error("Corrupt notebook row: {message}")]
    Corrupt { message: String },
}

/// Result of a compare-and-set attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CasOutcome {
    /// Write accepted; carries the record as stored after the write
    Applied(NotebookRecord),
    /// Another writer got there first; carries the current record
    VersionConflict(NotebookRecord),
}

#[async_trait]
pub trait NotebookStore: Send + Sync {
    async fn get_notebook(&self, id: NotebookId) -> Result<Option<NotebookRecord>, StoreError>;

    /// Replace title and/or content only if the stored version still equals
    /// `expected_version`, incrementing it by exactly one.
    async fn compare_and_set_version(
        &self,
        id: NotebookId,
        expected_version: i64,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<CasOutcome, StoreError>;

    async fn insert_notebook(&self, record: NotebookRecord) -> Result<(), StoreError>;
}

/// Process-local notebook store
#[derive(Debug, Default)]
pub struct InMemoryNotebookStore {
    notebooks: RwLock<HashMap<NotebookId, NotebookRecord>>,
}

impl InMemoryNotebookStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl NotebookStore for InMemoryNotebookStore {
    async fn get_notebook(&self, id: NotebookId) -> Result<Option<NotebookRecord>, StoreError> {
        Ok(self.notebooks.read().await.get(&id).cloned())
    }

    async fn compare_and_set_version(
        &self,
        id: NotebookId,
        expected_version: i64,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<CasOutcome, StoreError> {
        // check and write happen under one write guard
        let mut notebooks = self.notebooks.write().await;
        let notebook = notebooks.get_mut(&id).ok_or(StoreError::NotFound(id))?;

        if notebook.version != expected_version {
            return Ok(CasOutcome::VersionConflict(notebook.clone()));
        }

        if let Some(title) = title {
            notebook.title = title;
        }
        if let Some(content) = content {
            notebook.content = content;
        }
        notebook.version += 1;
        notebook.updated_at = Utc::now();

        Ok(CasOutcome::Applied(notebook.clone()))
    }

    async fn insert_notebook(&self, record: NotebookRecord) -> Result<(), StoreError> {
        self.notebooks.write().await.insert(record.id, record);
        Ok(())
    }
}

/// PostgreSQL-backed notebook store
#[derive(Debug, Clone)]
pub struct PgNotebookStore {
    pool: PgPool,
}

#[derive(sqlx::FromRow)]
struct NotebookRow {
    id: uuid::Uuid,
    title: String,
    content: String,
    version: i64,
    permissions: String,
    password_hash: Option<String>,
    owner_id: String,
    collaborator_ids: Vec<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<NotebookRow> for NotebookRecord {
    type Error = StoreError;

    fn try_from(row: NotebookRow) -> Result<Self, Self::Error> {
        let permissions = Permission::parse(&row.permissions).ok_or_else(|| StoreError::Corrupt {
            message: format!("unknown permission '{}' on {}", row.permissions, row.id),
        })?;

        Ok(NotebookRecord {
            id: row.id,
            title: row.title,
            content: row.content,
            version: row.version,
            permissions,
            password_hash: row.password_hash,
            owner_id: row.owner_id,
            collaborator_ids: row.collaborator_ids,
            updated_at: row.updated_at,
        })
    }
}

impl PgNotebookStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl NotebookStore for PgNotebookStore {
    async fn get_notebook(&self, id: NotebookId) -> Result<Option<NotebookRecord>, StoreError> {
        let row = sqlx::query_as::<_, NotebookRow>(
            r#"
            SELECT id, title, content, version, permissions, password_hash,
                   owner_id, collaborator_ids, updated_at
            FROM notebooks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(NotebookRecord::try_from).transpose()
    }

    async fn compare_and_set_version(
        &self,
        id: NotebookId,
        expected_version: i64,
        title: Option<String>,
        content: Option<String>,
    ) -> Result<CasOutcome, StoreError> {
        let updated = sqlx::query_as::<_, NotebookRow>(
            r#"
            UPDATE notebooks
            SET version = version + 1,
                title = COALESCE($3, title),
                content = COALESCE($4, content),
                updated_at = NOW()
            WHERE id = $1 AND version = $2
            RETURNING id, title, content, version, permissions, password_hash,
                      owner_id, collaborator_ids, updated_at
            "#,
        )
        .bind(id)
        .bind(expected_version)
        .bind(title)
        .bind(content)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(CasOutcome::Applied(row.try_into()?));
        }

        // zero rows: either the notebook is gone or the version moved on
        match self.get_notebook(id).await? {
            Some(current) => Ok(CasOutcome::VersionConflict(current)),
            None => Err(StoreError::NotFound(id)),
        }
    }

    async fn insert_notebook(&self, record: NotebookRecord) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO notebooks (id, title, content, version, permissions, password_hash,
                                   owner_id, collaborator_ids, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(record.id)
        .bind(&record.title)
        .bind(&record.content)
        .bind(record.version)
        .bind(record.permissions.as_str())
        .bind(&record.password_hash)
        .bind(&record.owner_id)
        .bind(&record.collaborator_ids)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

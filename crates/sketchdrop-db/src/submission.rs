use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sketchdrop_core::models::Submission;
use sqlx::{PgPool, Postgres};
use thiserror::Error;
use uuid::Uuid;

/// Advisory lock key serializing gallery-number assignment. Two concurrent
/// inserts must not read the same MAX(gallery_number); the transaction-scoped
/// lock makes the read-then-insert atomic, and the unique constraint on
/// `gallery_number` backs it up.
const GALLERY_NUMBER_LOCK: i64 = 0x5ce7c4;

/// Errors from the submission store. Any connectivity or query failure
/// collapses to `Unavailable`; the request pipeline treats it as non-fatal.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Submission store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Persistence seam for accepted submissions.
#[async_trait]
pub trait SubmissionStore: Send + Sync {
    /// Insert a gallery record with the next gallery number.
    async fn record(
        &self,
        id: Uuid,
        submitted_at: DateTime<Utc>,
        source_ip: &str,
    ) -> Result<Submission, StoreError>;
}

/// Repository for gallery submissions
#[derive(Clone)]
pub struct SubmissionRepository {
    pool: PgPool,
}

impl SubmissionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SubmissionStore for SubmissionRepository {
    #[tracing::instrument(skip(self), fields(db.table = "submissions", db.operation = "insert", db.record_id = %id))]
    async fn record(
        &self,
        id: Uuid,
        submitted_at: DateTime<Utc>,
        source_ip: &str,
    ) -> Result<Submission, StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock($1)")
            .bind(GALLERY_NUMBER_LOCK)
            .execute(&mut *tx)
            .await?;

        let submission = sqlx::query_as::<Postgres, Submission>(
            r#"
            INSERT INTO submissions (id, submitted_at, source_ip, gallery_number)
            VALUES ($1, $2, $3, (SELECT COALESCE(MAX(gallery_number), 0) + 1 FROM submissions))
            RETURNING id, submitted_at, source_ip, gallery_number
            "#,
        )
        .bind(id)
        .bind(submitted_at)
        .bind(source_ip)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            gallery_number = submission.gallery_number,
            "Submission recorded"
        );

        Ok(submission)
    }
}

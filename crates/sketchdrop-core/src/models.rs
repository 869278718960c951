//! Domain models.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// One accepted submission, as persisted in the gallery table.
///
/// `gallery_number` is the display ordering and is strictly increasing across
/// all submissions; `id` is an independent random token used as the stored
/// image filename so that filenames never collide even if the gallery
/// numbering were ever reset.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Submission {
    pub id: Uuid,
    pub submitted_at: DateTime<Utc>,
    pub source_ip: String,
    pub gallery_number: i64,
}

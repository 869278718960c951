//! The submission pipeline: rate check, decode, normalize, persist, save,
//! notify. Stages after decoding degrade the response instead of aborting it,
//! so a submission that reaches decoding always produces a 200 whose body
//! reports what worked and what did not.

use chrono::{Local, Utc};
use sketchdrop_db::SubmissionStore;
use sketchdrop_infra::{Notifier, SlidingWindowLimiter};
use sketchdrop_processing::{ImageNormalizer, PayloadDecoder};
use sketchdrop_storage::Storage;
use std::sync::Arc;
use uuid::Uuid;

pub const RATE_LIMITED_BODY: &str = "Receiving too many requests! Please wait a while.\n";
pub const INVALID_BODY: &str = "Invalid message body.\n";

const MODIFY_FAILED: &str = "Failed to modify image.\n";
const RECORD_FAILED: &str = "Failed to record submission in gallery.\n";
const SAVE_OK: &str = "Successfully saved image!\n";
const SAVE_FAILED: &str = "Failed to save image.\n";
const NOTIFY_OK: &str = "Successfully sent to discord!\n";
const NOTIFY_FAILED: &str = "Failed to send to discord.\n";

/// Terminal outcome of a submission attempt.
#[derive(Debug)]
pub enum SubmissionResponse {
    /// Dropped by the rate limiter before any processing.
    RateLimited,
    /// The body never decoded into an image.
    InvalidBody,
    /// The submission was processed; the body lists per-stage results.
    Completed(String),
}

/// Pipeline stages that report into the response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Normalize,
    Record,
    Save,
    Notify,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Succeeded,
    Failed,
}

/// Stage outcomes accumulated in pipeline order and rendered into the 200
/// body at the end. Normalize and Record stay silent on success; Save and
/// Notify always report.
#[derive(Debug, Default)]
struct OutcomeLog {
    outcomes: Vec<(Stage, Outcome)>,
}

impl OutcomeLog {
    fn record(&mut self, stage: Stage, outcome: Outcome) {
        self.outcomes.push((stage, outcome));
    }

    fn render(&self) -> String {
        self.outcomes
            .iter()
            .filter_map(|&(stage, outcome)| phrase(stage, outcome))
            .collect()
    }
}

fn phrase(stage: Stage, outcome: Outcome) -> Option<&'static str> {
    match (stage, outcome) {
        (Stage::Normalize, Outcome::Succeeded) => None,
        (Stage::Normalize, Outcome::Failed) => Some(MODIFY_FAILED),
        (Stage::Record, Outcome::Succeeded) => None,
        (Stage::Record, Outcome::Failed) => Some(RECORD_FAILED),
        (Stage::Save, Outcome::Succeeded) => Some(SAVE_OK),
        (Stage::Save, Outcome::Failed) => Some(SAVE_FAILED),
        (Stage::Notify, Outcome::Succeeded) => Some(NOTIFY_OK),
        (Stage::Notify, Outcome::Failed) => Some(NOTIFY_FAILED),
    }
}

/// Runs one submission through every stage in order.
///
/// Collaborators sit behind trait objects so tests can exercise failure
/// combinations without a database, a filesystem, or a webhook endpoint.
pub struct SubmissionPipeline {
    limiter: Arc<SlidingWindowLimiter>,
    decoder: PayloadDecoder,
    normalizer: ImageNormalizer,
    store: Arc<dyn SubmissionStore>,
    images: Arc<dyn Storage>,
    notifier: Arc<dyn Notifier>,
}

impl SubmissionPipeline {
    pub fn new(
        limiter: Arc<SlidingWindowLimiter>,
        decoder: PayloadDecoder,
        normalizer: ImageNormalizer,
        store: Arc<dyn SubmissionStore>,
        images: Arc<dyn Storage>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            limiter,
            decoder,
            normalizer,
            store,
            images,
            notifier,
        }
    }

    pub async fn handle(&self, body: &[u8], source_ip: &str) -> SubmissionResponse {
        if !self.limiter.admit().await {
            return SubmissionResponse::RateLimited;
        }

        let timestamp = Local::now();

        let img = match self.decoder.decode(body) {
            Ok(img) => img,
            Err(e) => {
                tracing::warn!(error = %e, source_ip, "Rejected submission body");
                return SubmissionResponse::InvalidBody;
            }
        };

        let mut log = OutcomeLog::default();

        // Normalization failure is not fatal: fall back to a plain encode of
        // the decoded image and keep going.
        let encoded = match self.normalizer.normalize(&img, timestamp) {
            Ok(bytes) => {
                log.record(Stage::Normalize, Outcome::Succeeded);
                Some(bytes)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to normalize image");
                log.record(Stage::Normalize, Outcome::Failed);
                match self.normalizer.encode_plain(&img) {
                    Ok(bytes) => Some(bytes),
                    Err(e) => {
                        tracing::error!(error = %e, "Failed to encode image");
                        None
                    }
                }
            }
        };

        // The id names the saved file, so it is generated here rather than by
        // the database: a file can still be written when the gallery insert
        // fails.
        let id = Uuid::new_v4();

        match self
            .store
            .record(id, timestamp.with_timezone(&Utc), source_ip)
            .await
        {
            Ok(submission) => {
                tracing::info!(
                    submission_id = %submission.id,
                    gallery_number = submission.gallery_number,
                    "Submission recorded in gallery"
                );
                log.record(Stage::Record, Outcome::Succeeded);
            }
            Err(e) => {
                tracing::error!(error = %e, submission_id = %id, "Failed to record submission");
                log.record(Stage::Record, Outcome::Failed);
            }
        }

        match &encoded {
            Some(bytes) => match self.images.upload(&format!("{id}.png"), bytes.clone()).await {
                Ok(key) => {
                    tracing::info!(key, "Submission image saved");
                    log.record(Stage::Save, Outcome::Succeeded);
                }
                Err(e) => {
                    tracing::error!(error = %e, submission_id = %id, "Failed to save image");
                    log.record(Stage::Save, Outcome::Failed);
                }
            },
            None => log.record(Stage::Save, Outcome::Failed),
        }

        match encoded {
            Some(bytes) => match self.notifier.notify(bytes, timestamp).await {
                Ok(status) if (200..300).contains(&status) => {
                    log.record(Stage::Notify, Outcome::Succeeded)
                }
                Ok(status) => {
                    tracing::warn!(status, "Webhook rejected submission");
                    log.record(Stage::Notify, Outcome::Failed);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Webhook delivery failed");
                    log.record(Stage::Notify, Outcome::Failed);
                }
            },
            None => log.record(Stage::Notify, Outcome::Failed),
        }

        SubmissionResponse::Completed(log.render())
    }
}

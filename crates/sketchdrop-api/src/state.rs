//! Application state

use crate::pipeline::SubmissionPipeline;
use anyhow::Result;
use sketchdrop_core::Config;
use sketchdrop_db::SubmissionRepository;
use sketchdrop_infra::{DiscordNotifier, SlidingWindowLimiter};
use sketchdrop_processing::{ImageNormalizer, PayloadDecoder};
use sketchdrop_storage::{LocalStorage, Storage};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;

/// Shared application state handed to every request handler.
pub struct AppState {
    pub config: Config,
    pub db_pool: PgPool,
    pub images: Arc<dyn Storage>,
    pub pipeline: SubmissionPipeline,
}

impl AppState {
    pub fn new(config: Config, db_pool: PgPool, storage: LocalStorage) -> Result<Self> {
        let limiter = Arc::new(SlidingWindowLimiter::new(
            config.rate_limit_max_requests,
            Duration::from_secs(config.rate_limit_period_secs),
        ));

        let notifier = DiscordNotifier::new(
            config.webhook_url.clone(),
            Duration::from_secs(config.webhook_timeout_secs),
        )?;

        let images: Arc<dyn Storage> = Arc::new(storage);

        let pipeline = SubmissionPipeline::new(
            limiter,
            PayloadDecoder::new(config.max_image_width, config.max_image_height),
            ImageNormalizer::new(),
            Arc::new(SubmissionRepository::new(db_pool.clone())),
            images.clone(),
            Arc::new(notifier),
        );

        Ok(Self {
            config,
            db_pool,
            images,
            pipeline,
        })
    }
}

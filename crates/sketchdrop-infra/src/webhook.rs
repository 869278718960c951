//! Best-effort webhook delivery to Discord.

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Webhook delivery errors. Only transport-level failures are errors; any
/// HTTP status the remote returns is reported as-is.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Webhook unreachable: {0}")]
    Unreachable(String),
}

/// Outbound notification seam for the request pipeline.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver the encoded image once, returning the remote status code.
    /// No retry, no backoff.
    async fn notify(&self, png: Vec<u8>, timestamp: DateTime<Local>) -> Result<u16, NotifyError>;
}

/// Sends accepted submissions to a Discord webhook as a multipart POST with
/// a `payload_json` part and a `file` part.
#[derive(Clone)]
pub struct DiscordNotifier {
    http_client: Client,
    webhook_url: String,
}

impl DiscordNotifier {
    pub fn new(webhook_url: String, timeout: Duration) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client for webhook delivery")?;

        Ok(Self {
            http_client,
            webhook_url,
        })
    }
}

#[async_trait]
impl Notifier for DiscordNotifier {
    #[tracing::instrument(skip(self, png), fields(png_bytes = png.len()))]
    async fn notify(&self, png: Vec<u8>, timestamp: DateTime<Local>) -> Result<u16, NotifyError> {
        let content = timestamp.format("%Y-%m-%d %H:%M:%S").to_string();
        let payload_json = serde_json::json!({ "content": content }).to_string();
        // Colons are unsafe in filenames on most targets.
        let filename = format!("{}.png", content.replace(':', "."));

        let form = Form::new()
            .part(
                "payload_json",
                Part::text(payload_json)
                    .mime_str("application/json")
                    .map_err(|e| NotifyError::Unreachable(e.to_string()))?,
            )
            .part(
                "file",
                Part::bytes(png)
                    .file_name(filename)
                    .mime_str("application/octet-stream")
                    .map_err(|e| NotifyError::Unreachable(e.to_string()))?,
            );

        let response = self
            .http_client
            .post(&self.webhook_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| NotifyError::Unreachable(e.to_string()))?;

        let status = response.status().as_u16();

        if (200..300).contains(&status) {
            tracing::info!(status, "Webhook delivered");
        } else {
            tracing::warn!(status, "Webhook returned non-2xx status");
        }

        Ok(status)
    }
}

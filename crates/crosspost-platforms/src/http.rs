//! Shared HTTP plumbing for the adapters
//!
//! Clients are built once per adapter and pooled across jobs; they hold no
//! per-job state. Metadata exchanges use a short-timeout client, bulk
//! transfers a long-timeout one.

use anyhow::Context;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crosspost_core::PublishError;

pub fn build_client(timeout: Duration) -> anyhow::Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .context("Failed to create HTTP client")
}

/// POST a JSON body with a bearer token, observing cancellation while the
/// request is in flight. Returns the status and the raw body text; the
/// caller owns status interpretation and decoding.
pub async fn bearer_json_post<B: Serialize>(
    client: &Client,
    url: &str,
    token: &str,
    body: &B,
    cancel: &CancellationToken,
) -> Result<(StatusCode, String), PublishError> {
    let request = client.post(url).bearer_auth(token).json(body).send();

    let response = tokio::select! {
        result = request => result.map_err(|e| PublishError::Transport(e.to_string()))?,
        _ = cancel.cancelled() => return Err(PublishError::Cancelled),
    };

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| PublishError::Transport(e.to_string()))?;
    Ok((status, text))
}

/// GET with a bearer token. Same contract as [`bearer_json_post`].
pub async fn bearer_get(
    client: &Client,
    url: &str,
    token: &str,
    cancel: &CancellationToken,
) -> Result<(StatusCode, String), PublishError> {
    let request = client.get(url).bearer_auth(token).send();

    let response = tokio::select! {
        result = request => result.map_err(|e| PublishError::Transport(e.to_string()))?,
        _ = cancel.cancelled() => return Err(PublishError::Cancelled),
    };

    let status = response.status();
    let text = response
        .text()
        .await
        .map_err(|e| PublishError::Transport(e.to_string()))?;
    Ok((status, text))
}

// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of evsched.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

use crate::errors::{GivEnergyError, GivEnergyResult};
use async_trait::async_trait;
use evsched_core::{ChargeCommand, Device, DeviceControl};
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.givenergy.cloud/v1";

#[derive(Debug, Deserialize)]
struct ChargerPage {
    #[serde(default)]
    data: Vec<Device>,
}

/// GivEnergy cloud REST client, EV charger endpoints only
#[derive(Clone)]
pub struct GivEnergyClient {
    base_url: String,
    api_key: String,
    client: Client,
    max_retries: u32,
    retry_delay: Duration,
}

impl std::fmt::Debug for GivEnergyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GivEnergyClient")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl GivEnergyClient {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> GivEnergyResult<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GivEnergyError::ConfigError("API key is empty".to_owned()));
        }

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| GivEnergyError::ConfigError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key,
            client,
            max_retries: 3,
            retry_delay: Duration::from_millis(500),
        })
    }

    /// List every EV charger on the account (first page)
    pub async fn list_chargers(&self) -> GivEnergyResult<Vec<Device>> {
        let url = format!("{}/ev-charger", self.base_url);
        debug!("🔍 [GIVENERGY] Listing chargers: {}", url);

        let response = self
            .retry_request(|| async {
                self.client
                    .get(&url)
                    .query(&[("page", "1")])
                    .bearer_auth(&self.api_key)
                    .send()
                    .await
            })
            .await?;

        match response.status() {
            status if status.is_success() => {
                let body = response.text().await?;
                let page: ChargerPage = serde_json::from_str(&body).map_err(|e| {
                    GivEnergyError::InvalidResponse(format!("{e}: {body}"))
                })?;
                info!("✅ [GIVENERGY] Found {} charger(s)", page.data.len());
                Ok(page.data)
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                error!("❌ [GIVENERGY] Authentication failed while listing chargers");
                Err(GivEnergyError::AuthenticationFailed)
            }
            status => {
                let message = response.text().await.unwrap_or_default();
                error!("❌ [GIVENERGY] Status {}: {}", status, message);
                Err(GivEnergyError::ApiError {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }

    /// Send a charge command and return the decoded response body.
    ///
    /// Sent exactly once; whether the charger accepted it is up to the caller
    /// to read from the body.
    pub async fn send_command(
        &self,
        uuid: &str,
        command: ChargeCommand,
    ) -> GivEnergyResult<Value> {
        let url = format!("{}/ev-charger/{}/commands/{}", self.base_url, uuid, command);
        info!("📞 [GIVENERGY] Sending {} to {}", command, uuid);
        debug!("   URL: {}", url);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        match status {
            status if status.is_success() => serde_json::from_str(&body)
                .map_err(|e| GivEnergyError::InvalidResponse(format!("{e}: {body}"))),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(GivEnergyError::AuthenticationFailed)
            }
            status => Err(GivEnergyError::ApiError {
                status: status.as_u16(),
                message: body,
            }),
        }
    }

    /// Retry a request with exponential backoff
    async fn retry_request<F, Fut>(&self, mut request_fn: F) -> GivEnergyResult<reqwest::Response>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<reqwest::Response, reqwest::Error>>,
    {
        let mut attempts = 0;
        let mut delay = self.retry_delay;

        loop {
            attempts += 1;
            match request_fn().await {
                Ok(response) => return Ok(response),
                Err(e) if attempts >= self.max_retries => {
                    error!("Request failed after {} attempts: {}", attempts, e);
                    return Err(GivEnergyError::HttpError(e));
                }
                Err(e) => {
                    warn!(
                        "Request failed (attempt {}/{}): {}. Retrying in {:?}",
                        attempts, self.max_retries, e, delay
                    );
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                }
            }
        }
    }

    /// Retry policy for charger listing. Commands are never retried.
    #[must_use]
    pub fn with_retry_config(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries.max(1);
        self.retry_delay = retry_delay;
        self
    }
}

#[async_trait]
impl DeviceControl for GivEnergyClient {
    async fn list_devices(&self) -> anyhow::Result<Vec<Device>> {
        Ok(self.list_chargers().await?)
    }

    async fn send_command(&self, device_id: &str, command: ChargeCommand) -> anyhow::Result<Value> {
        Ok(GivEnergyClient::send_command(self, device_id, command).await?)
    }
}

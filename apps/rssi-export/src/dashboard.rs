use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, ACCEPT, LINK, RETRY_AFTER};
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};
use url::Url;

use crate::api::{HistoryQuery, NetworkApi};
use crate::config::ExportConfig;
use crate::model::{AccessPoint, Client as WirelessClient, Network, Organization, SignalSample};

const USER_AGENT: &str = concat!("rssi-export/", env!("CARGO_PKG_VERSION"));
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// `NetworkApi` backed by the cloud controller's v1 REST API.
pub struct DashboardClient {
    http: Client,
    base_url: String,
    api_key: String,
    page_size: u32,
    max_attempts: u32,
    retry_delay: Duration,
}

impl DashboardClient {
    pub fn new(config: &ExportConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.http_timeout())
            .user_agent(USER_AGENT)
            .build()
            .context("failed to build HTTP client")?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            page_size: config.page_size.max(1),
            max_attempts: config.max_attempts.max(1),
            retry_delay: config.retry_delay(),
        })
    }

    fn endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url = Url::parse(&raw).with_context(|| format!("invalid API URL {raw}"))?;
        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }
        Ok(url)
    }

    fn paged_endpoint(&self, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let page_size = self.page_size.to_string();
        let mut params = vec![("perPage", page_size.as_str())];
        params.extend_from_slice(query);
        self.endpoint(path, &params)
    }

    fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay.saturating_mul(attempt)
    }

    async fn send_with_retry(&self, url: &Url) -> Result<Response> {
        let mut attempt = 0u32;
        loop {
            attempt += 1;
            let result = self
                .http
                .get(url.clone())
                .bearer_auth(&self.api_key)
                .header(ACCEPT, "application/json")
                .send()
                .await;

            match result {
                Ok(response) if is_retryable(response.status()) && attempt < self.max_attempts => {
                    let delay =
                        retry_after(response.headers()).unwrap_or_else(|| self.backoff(attempt));
                    warn!(
                        status = %response.status(),
                        path = url.path(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "controller API request not served; retrying"
                    );
                    sleep(delay).await;
                }
                Ok(response) => {
                    let status = response.status();
                    if !status.is_success() {
                        let body = response.text().await.unwrap_or_default();
                        bail!(
                            "GET {} returned {status} after {attempt} attempt(s): {}",
                            url.path(),
                            body.trim()
                        );
                    }
                    return Ok(response);
                }
                Err(err) if attempt < self.max_attempts => {
                    let delay = self.backoff(attempt);
                    warn!(
                        error = %err,
                        path = url.path(),
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "controller API request failed; retrying"
                    );
                    sleep(delay).await;
                }
                Err(err) => {
                    return Err(err).with_context(|| {
                        format!("GET {} failed after {attempt} attempt(s)", url.path())
                    });
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let response = self.send_with_retry(&url).await?;
        response
            .json()
            .await
            .with_context(|| format!("failed to decode response from {}", url.path()))
    }

    /// Follows `rel=next` links until the controller stops sending them.
    async fn get_all_pages<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(url);
        let mut pages = 0usize;
        while let Some(url) = next.take() {
            let response = self.send_with_retry(&url).await?;
            next = match next_page_link(response.headers()) {
                Some(link) => Some(
                    Url::parse(&link)
                        .with_context(|| format!("invalid pagination link {link}"))?,
                ),
                None => None,
            };
            let page: Vec<T> = response
                .json()
                .await
                .with_context(|| format!("failed to decode page from {}", url.path()))?;
            pages += 1;
            items.extend(page);
        }
        debug!(pages, items = items.len(), "collected paginated listing");
        Ok(items)
    }
}

#[async_trait]
impl NetworkApi for DashboardClient {
    async fn list_organizations(&self) -> Result<Vec<Organization>> {
        let url = self.endpoint("organizations", &[])?;
        self.get_json(url).await.context("failed to list organizations")
    }

    async fn list_networks(&self, org_id: &str) -> Result<Vec<Network>> {
        let url = self.paged_endpoint(&format!("organizations/{org_id}/networks"), &[])?;
        self.get_all_pages(url)
            .await
            .with_context(|| format!("failed to list networks of organization {org_id}"))
    }

    async fn list_wireless_devices(
        &self,
        org_id: &str,
        network_id: &str,
    ) -> Result<Vec<AccessPoint>> {
        let url = self.paged_endpoint(
            &format!("organizations/{org_id}/devices"),
            &[("networkIds[]", network_id), ("productTypes[]", "wireless")],
        )?;
        self.get_all_pages(url)
            .await
            .with_context(|| format!("failed to list wireless devices of network {network_id}"))
    }

    async fn list_device_clients(
        &self,
        serial: &str,
        timespan_seconds: u64,
    ) -> Result<Vec<WirelessClient>> {
        let timespan = timespan_seconds.to_string();
        let url = self.endpoint(
            &format!("devices/{serial}/clients"),
            &[("timespan", timespan.as_str())],
        )?;
        self.get_json(url)
            .await
            .with_context(|| format!("failed to list clients of device {serial}"))
    }

    async fn list_network_clients(
        &self,
        network_id: &str,
        timespan_seconds: u64,
    ) -> Result<Vec<WirelessClient>> {
        let timespan = timespan_seconds.to_string();
        let url = self.paged_endpoint(
            &format!("networks/{network_id}/clients"),
            &[
                ("timespan", timespan.as_str()),
                ("recentDeviceConnections[]", "Wireless"),
            ],
        )?;
        self.get_all_pages(url)
            .await
            .with_context(|| format!("failed to list clients of network {network_id}"))
    }

    async fn signal_quality_history(&self, query: HistoryQuery<'_>) -> Result<Vec<SignalSample>> {
        let timespan = query.window.timespan_seconds.to_string();
        let resolution = query.window.resolution_seconds.to_string();
        let mut params = vec![("clientId", query.client_id)];
        if let Some(serial) = query.ap_serial {
            params.push(("apSerial", serial));
        }
        params.push(("timespan", timespan.as_str()));
        params.push(("resolution", resolution.as_str()));
        let url = self.endpoint(
            &format!("networks/{}/wireless/signalQualityHistory", query.network_id),
            &params,
        )?;
        self.get_json(url).await.with_context(|| {
            format!(
                "failed to fetch signal quality history of client {} on {}",
                query.client_id,
                query.ap_serial.unwrap_or("any access point")
            )
        })
    }
}

fn is_retryable(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    let seconds = headers
        .get(RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()?;
    Some(Duration::from_secs(seconds).min(MAX_RETRY_AFTER))
}

/// Extracts the `rel=next` target from RFC 5988 `Link` headers.
pub(crate) fn next_page_link(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|entry| {
            let mut parts = entry.split(';');
            let target = parts.next()?.trim();
            let target = target.strip_prefix('<')?.strip_suffix('>')?;
            let is_next = parts.any(|param| {
                let param = param.trim();
                param
                    .strip_prefix("rel=")
                    .map(|rel| rel.trim_matches('"').eq_ignore_ascii_case("next"))
                    .unwrap_or(false)
            });
            is_next.then(|| target.to_string())
        })
}

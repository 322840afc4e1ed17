use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::HistoryWindow;
use crate::cli::Args;
use crate::mode::ReportMode;

pub const DEFAULT_BASE_URL: &str = "https://api.meraki.com/api/v1";
pub const DEFAULT_TIMESPAN_SECONDS: u64 = 86_400;
pub const DEFAULT_RESOLUTION_SECONDS: u64 = 300;
pub const DEFAULT_WEAK_SIGNAL_THRESHOLD_DBM: i64 = -75;
const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_MAX_ATTEMPTS: u32 = 3;
const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;
const DEFAULT_PAGE_SIZE: u32 = 1_000;
const DEFAULT_HISTORY_CONCURRENCY: usize = 4;

/// Everything one export run needs. Built once and passed down; nothing is
/// read from the environment after this point.
#[derive(Clone)]
pub struct ExportConfig {
    pub api_key: String,
    pub base_url: String,
    pub organization_name: String,
    pub network_name: String,
    pub mode: ReportMode,
    pub ssid: Option<String>,
    pub timespan_seconds: u64,
    pub resolution_seconds: u64,
    pub weak_signal_threshold_dbm: i64,
    pub http_timeout_seconds: u64,
    pub max_attempts: u32,
    pub retry_delay_ms: u64,
    pub page_size: u32,
    pub history_concurrency: usize,
    pub output_dir: PathBuf,
}

impl std::fmt::Debug for ExportConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("organization_name", &self.organization_name)
            .field("network_name", &self.network_name)
            .field("mode", &self.mode)
            .field("ssid", &self.ssid)
            .field("timespan_seconds", &self.timespan_seconds)
            .field("resolution_seconds", &self.resolution_seconds)
            .field("weak_signal_threshold_dbm", &self.weak_signal_threshold_dbm)
            .field("http_timeout_seconds", &self.http_timeout_seconds)
            .field("max_attempts", &self.max_attempts)
            .field("retry_delay_ms", &self.retry_delay_ms)
            .field("page_size", &self.page_size)
            .field("history_concurrency", &self.history_concurrency)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

impl ExportConfig {
    pub fn from_env(args: &Args) -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(args, |key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(args: &Args, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = EnvReader { lookup };

        let api_key = env
            .optional_string("API_KEY")
            .or_else(|| env.optional_string("MERAKI_API_KEY"))
            .context("API_KEY (or MERAKI_API_KEY) must be set to a dashboard API key")?;
        let organization_name = env
            .optional_string("ORG_NAME")
            .context("ORG_NAME must be set to the organization name")?;
        let network_name = env
            .optional_string("NET_NAME")
            .context("NET_NAME must be set to the network name")?;

        let ssid = args
            .ssid
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(|value| value.to_string())
            .or_else(|| env.optional_string("SSID"));
        if args.mode == ReportMode::Ssid && ssid.is_none() {
            anyhow::bail!("SSID must be set (or passed with --ssid) when running with --mode ssid");
        }

        let base_url = env
            .string("MERAKI_BASE_URL", DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            api_key,
            base_url,
            organization_name,
            network_name,
            mode: args.mode,
            ssid,
            timespan_seconds: env.u64("RSSI_TIMESPAN_SECONDS", DEFAULT_TIMESPAN_SECONDS),
            resolution_seconds: env.u64("RSSI_RESOLUTION_SECONDS", DEFAULT_RESOLUTION_SECONDS),
            weak_signal_threshold_dbm: env
                .i64("RSSI_THRESHOLD_DBM", DEFAULT_WEAK_SIGNAL_THRESHOLD_DBM),
            http_timeout_seconds: env
                .u64("RSSI_HTTP_TIMEOUT_SECONDS", DEFAULT_HTTP_TIMEOUT_SECONDS)
                .max(1),
            max_attempts: env.u32("RSSI_MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS).max(1),
            retry_delay_ms: env.u64("RSSI_RETRY_DELAY_MS", DEFAULT_RETRY_DELAY_MS),
            page_size: env.u32("RSSI_PAGE_SIZE", DEFAULT_PAGE_SIZE).max(1),
            history_concurrency: env
                .usize("RSSI_HISTORY_CONCURRENCY", DEFAULT_HISTORY_CONCURRENCY)
                .max(1),
            output_dir: args.output_dir.clone(),
        })
    }

    pub fn history_window(&self) -> HistoryWindow {
        HistoryWindow {
            timespan_seconds: self.timespan_seconds,
            resolution_seconds: self.resolution_seconds,
        }
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_seconds)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }
}

struct EnvReader<F> {
    lookup: F,
}

impl<F> EnvReader<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional_string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.optional_string(key)
            .unwrap_or_else(|| default.to_string())
    }

    fn u64(&self, key: &str, default: u64) -> u64 {
        self.optional_string(key)
            .and_then(|value| value.parse::<u64>().ok())
            .unwrap_or(default)
    }

    fn u32(&self, key: &str, default: u32) -> u32 {
        self.optional_string(key)
            .and_then(|value| value.parse::<u32>().ok())
            .unwrap_or(default)
    }

    fn i64(&self, key: &str, default: i64) -> i64 {
        self.optional_string(key)
            .and_then(|value| value.parse::<i64>().ok())
            .unwrap_or(default)
    }

    fn usize(&self, key: &str, default: usize) -> usize {
        self.optional_string(key)
            .and_then(|value| value.parse::<usize>().ok())
            .unwrap_or(default)
    }
}

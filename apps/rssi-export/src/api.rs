use anyhow::Result;
use async_trait::async_trait;

use crate::model::{AccessPoint, Client, Network, Organization, SignalSample};

/// Lookback and bucket width for client and signal history requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryWindow {
    pub timespan_seconds: u64,
    pub resolution_seconds: u64,
}

/// Signal quality history of one client. `ap_serial` narrows the history to
/// a single access point when known.
#[derive(Debug, Clone, Copy)]
pub struct HistoryQuery<'a> {
    pub network_id: &'a str,
    pub client_id: &'a str,
    pub ap_serial: Option<&'a str>,
    pub window: HistoryWindow,
}

/// Read-only view of the wireless controller's API.
///
/// List operations return fully paginated results.
#[async_trait]
pub trait NetworkApi: Send + Sync {
    async fn list_organizations(&self) -> Result<Vec<Organization>>;

    async fn list_networks(&self, org_id: &str) -> Result<Vec<Network>>;

    async fn list_wireless_devices(&self, org_id: &str, network_id: &str)
        -> Result<Vec<AccessPoint>>;

    async fn list_device_clients(&self, serial: &str, timespan_seconds: u64)
        -> Result<Vec<Client>>;

    async fn list_network_clients(
        &self,
        network_id: &str,
        timespan_seconds: u64,
    ) -> Result<Vec<Client>>;

    async fn signal_quality_history(&self, query: HistoryQuery<'_>) -> Result<Vec<SignalSample>>;
}

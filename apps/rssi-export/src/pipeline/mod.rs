//! Controller API → flat RSSI rows → report files.
//!
//! Stages run in order and each hands its owned output to the next:
//! resolve names, list access points, list and associate clients, flatten,
//! fetch signal history, expand into rows, export.

pub mod clients;
pub mod expand;
pub mod flatten;
pub mod history;
pub mod inventory;
pub mod resolve;


use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;

use crate::api::NetworkApi;
use crate::config::ExportConfig;
use crate::export::{self, OutputRow};
use crate::mode::ReportMode;

use self::expand::SampleFilter;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub organization_id: String,
    pub network_id: String,
    pub access_points: usize,
    pub clients: usize,
    pub clients_with_history: usize,
    pub rows: usize,
    pub files: Vec<PathBuf>,
}

/// Fetches, reshapes and exports one report as described by `config`.
pub async fn run<A>(api: &A, config: &ExportConfig) -> Result<RunSummary>
where
    A: NetworkApi + ?Sized,
{
    let collected = collect_rows(api, config).await?;
    let files = export::write_report(&collected.rows, config.mode, &config.output_dir)?;
    Ok(RunSummary {
        organization_id: collected.organization_id,
        network_id: collected.network_id,
        access_points: collected.access_points,
        clients: collected.clients,
        clients_with_history: collected.clients_with_history,
        rows: collected.rows.len(),
        files,
    })
}

pub struct CollectedRows {
    pub organization_id: String,
    pub network_id: String,
    pub access_points: usize,
    pub clients: usize,
    pub clients_with_history: usize,
    pub rows: Vec<OutputRow>,
}

/// Everything up to, but not including, writing files.
pub async fn collect_rows<A>(api: &A, config: &ExportConfig) -> Result<CollectedRows>
where
    A: NetworkApi + ?Sized,
{
    let organization = resolve::resolve_organization(api, &config.organization_name).await?;
    let network =
        resolve::resolve_network(api, &organization.id, &config.network_name).await?;

    let aps = inventory::fetch_access_points(api, &organization.id, &network.id).await?;
    let access_points = aps.len();

    let (groups, filter) = match config.mode {
        ReportMode::PerDevice => {
            let groups =
                clients::fetch_clients_per_device(api, aps, config.timespan_seconds).await?;
            (groups, SampleFilter::All)
        }
        ReportMode::Ssid => {
            let ssid = config
                .ssid
                .as_deref()
                .context("SSID mode requires a target SSID")?;
            let network_clients =
                clients::fetch_network_clients(api, &network.id, config.timespan_seconds).await?;
            let groups = clients::associate_by_ssid(aps, network_clients, ssid);
            let filter = SampleFilter::WeakSignal {
                threshold_dbm: config.weak_signal_threshold_dbm,
            };
            (groups, filter)
        }
    };

    let records = flatten::flatten_clients(&groups, config.mode)
        .context("failed to restructure client records")?;
    let clients = records.len();
    info!(clients, "restructured client records");

    let histories = history::fetch_signal_history(
        api,
        &network.id,
        records,
        config.history_window(),
        config.history_concurrency,
    )
    .await?;
    let clients_with_history = histories.len();

    let rows = expand::expand_rows(&histories, filter)
        .context("failed to expand signal history into rows")?;
    info!(rows = rows.len(), "expanded signal history");

    Ok(CollectedRows {
        organization_id: organization.id,
        network_id: network.id,
        access_points,
        clients,
        clients_with_history,
        rows,
    })
}

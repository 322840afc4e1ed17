use anyhow::Result;
use futures::stream::{self, StreamExt, TryStreamExt};
use tracing::{debug, info, warn};

use crate::api::{HistoryQuery, HistoryWindow, NetworkApi};
use crate::model::{ClientRecord, SignalSample};

#[derive(Debug, Clone, PartialEq)]
pub struct ClientHistory {
    pub record: ClientRecord,
    pub samples: Vec<SignalSample>,
}

/// Fetches signal quality history for every record, at most `concurrency`
/// requests in flight. Output keeps input order; records whose history is
/// empty are dropped.
pub async fn fetch_signal_history<A>(
    api: &A,
    network_id: &str,
    records: Vec<ClientRecord>,
    window: HistoryWindow,
    concurrency: usize,
) -> Result<Vec<ClientHistory>>
where
    A: NetworkApi + ?Sized,
{
    let requested = records.len();
    let fetched: Vec<ClientHistory> = stream::iter(records)
        .map(|record| async move {
            let samples = api
                .signal_quality_history(HistoryQuery {
                    network_id,
                    client_id: &record.client_id,
                    ap_serial: record.ap_serial.as_deref(),
                    window,
                })
                .await?;
            debug!(
                client_id = %record.client_id,
                samples = samples.len(),
                "fetched signal quality history"
            );
            Ok::<_, anyhow::Error>(ClientHistory { record, samples })
        })
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    let histories: Vec<ClientHistory> = fetched
        .into_iter()
        .filter(|history| !history.samples.is_empty())
        .collect();

    if histories.is_empty() {
        warn!(
            clients = requested,
            timespan_seconds = window.timespan_seconds,
            resolution_seconds = window.resolution_seconds,
            "no RSSI data was found; clients were likely idle during the timespan. \
             Consider widening the timespan while keeping the resolution in mind"
        );
    } else {
        info!(
            clients = histories.len(),
            dropped = requested - histories.len(),
            "RSSI data gathered"
        );
    }
    Ok(histories)
}

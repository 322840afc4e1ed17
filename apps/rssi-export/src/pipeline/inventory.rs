use anyhow::Result;
use tracing::info;

use crate::api::NetworkApi;
use crate::model::AccessPoint;

pub async fn fetch_access_points<A>(
    api: &A,
    org_id: &str,
    network_id: &str,
) -> Result<Vec<AccessPoint>>
where
    A: NetworkApi + ?Sized,
{
    let aps = api.list_wireless_devices(org_id, network_id).await?;
    if aps.is_empty() {
        info!(network_id, "network has no wireless access points");
    } else {
        info!(network_id, count = aps.len(), "fetched wireless access points");
    }
    Ok(aps)
}

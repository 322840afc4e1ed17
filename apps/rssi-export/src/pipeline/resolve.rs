use anyhow::Result;
use tracing::info;

use crate::api::NetworkApi;
use crate::error::ResolveError;
use crate::model::{Network, Organization};

pub async fn resolve_organization<A>(api: &A, name: &str) -> Result<Organization>
where
    A: NetworkApi + ?Sized,
{
    let organizations = api.list_organizations().await?;
    let organization = organizations
        .into_iter()
        .find(|org| org.name == name)
        .ok_or_else(|| ResolveError::OrganizationNotFound {
            name: name.to_string(),
        })?;
    info!(org_id = %organization.id, "resolved organization");
    Ok(organization)
}

pub async fn resolve_network<A>(api: &A, org_id: &str, name: &str) -> Result<Network>
where
    A: NetworkApi + ?Sized,
{
    let networks = api.list_networks(org_id).await?;
    let network = networks
        .into_iter()
        .find(|network| network.name == name)
        .ok_or_else(|| ResolveError::NetworkNotFound {
            name: name.to_string(),
            org_id: org_id.to_string(),
        })?;
    info!(network_id = %network.id, "resolved network");
    Ok(network)
}

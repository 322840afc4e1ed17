use anyhow::Result;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::api::NetworkApi;
use crate::model::{AccessPoint, Client};

/// An access point together with the clients it served in the window.
///
/// `ap` is `None` for SSID clients whose serving device is not in the
/// wireless inventory.
#[derive(Debug, Clone, PartialEq)]
pub struct ApClients {
    pub ap: Option<AccessPoint>,
    pub clients: Vec<Client>,
}

/// Asks every access point for its recent clients. Access points that served
/// nobody are left out of the result.
pub async fn fetch_clients_per_device<A>(
    api: &A,
    aps: Vec<AccessPoint>,
    timespan_seconds: u64,
) -> Result<Vec<ApClients>>
where
    A: NetworkApi + ?Sized,
{
    let mut groups = Vec::with_capacity(aps.len());
    for ap in aps {
        let clients = api.list_device_clients(&ap.serial, timespan_seconds).await?;
        debug!(serial = %ap.serial, clients = clients.len(), "fetched device clients");
        if clients.is_empty() {
            continue;
        }
        groups.push(ApClients {
            ap: Some(ap),
            clients,
        });
    }
    info!(
        access_points = groups.len(),
        clients = groups.iter().map(|group| group.clients.len()).sum::<usize>(),
        "collected clients per access point"
    );
    Ok(groups)
}

pub async fn fetch_network_clients<A>(
    api: &A,
    network_id: &str,
    timespan_seconds: u64,
) -> Result<Vec<Client>>
where
    A: NetworkApi + ?Sized,
{
    let clients = api.list_network_clients(network_id, timespan_seconds).await?;
    info!(network_id, clients = clients.len(), "fetched network clients");
    Ok(clients)
}

/// Keeps clients on `ssid` and files each under the access point whose serial
/// matches the client's serving device. Every access point appears in the
/// result, in input order, even when no client matched it. Clients whose
/// serving device is unknown follow in one trailing group without an AP.
pub fn associate_by_ssid(aps: Vec<AccessPoint>, clients: Vec<Client>, ssid: &str) -> Vec<ApClients> {
    let mut groups: Vec<ApClients> = aps
        .into_iter()
        .map(|ap| ApClients {
            ap: Some(ap),
            clients: Vec::new(),
        })
        .collect();
    let by_serial: HashMap<String, usize> = groups
        .iter()
        .enumerate()
        .filter_map(|(idx, group)| group.ap.as_ref().map(|ap| (ap.serial.clone(), idx)))
        .collect();

    let mut other_ssid = 0usize;
    let mut unassigned = Vec::new();
    for client in clients {
        if client.ssid.as_option().map(String::as_str) != Some(ssid) {
            other_ssid += 1;
            continue;
        }
        let slot = client
            .recent_device_serial
            .as_deref()
            .and_then(|serial| by_serial.get(serial));
        match slot {
            Some(&idx) => groups[idx].clients.push(client),
            None => unassigned.push(client),
        }
    }

    debug!(other_ssid, "filtered network clients");
    if !unassigned.is_empty() {
        warn!(
            ssid,
            clients = unassigned.len(),
            "clients on the SSID were served by devices outside the wireless inventory; \
             reporting them without AP details"
        );
        groups.push(ApClients {
            ap: None,
            clients: unassigned,
        });
    }
    info!(
        ssid,
        clients = groups.iter().map(|group| group.clients.len()).sum::<usize>(),
        "associated clients with access points"
    );
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Reported;

    fn ap(serial: &str) -> AccessPoint {
        AccessPoint {
            serial: serial.to_string(),
            name: Reported::Value(format!("AP {serial}")),
            mac: Reported::Null,
            lat: Reported::Missing,
            lng: Reported::Missing,
            address: Reported::Missing,
            tags: Reported::Value(vec!["floor-1".to_string()]),
        }
    }

    fn client(id: &str, ssid: Option<&str>, serial: Option<&str>) -> Client {
        Client {
            id: Reported::Value(id.to_string()),
            mac: Reported::Null,
            description: Reported::Null,
            dhcp_hostname: Reported::Missing,
            ssid: ssid.map(str::to_string).into(),
            recent_device_serial: serial.map(str::to_string),
        }
    }

    fn ids(group: &ApClients) -> Vec<&str> {
        group
            .clients
            .iter()
            .filter_map(|client| client.id.as_option().map(String::as_str))
            .collect()
    }

    fn serial(group: &ApClients) -> Option<&str> {
        group.ap.as_ref().map(|ap| ap.serial.as_str())
    }

    #[test]
    fn clients_land_under_their_serving_access_point() {
        let groups = associate_by_ssid(
            vec![ap("Q2XX-0001"), ap("Q2XX-0002")],
            vec![
                client("c1", Some("CorpWiFi"), Some("Q2XX-0002")),
                client("c2", Some("CorpWiFi"), Some("Q2XX-0001")),
                client("c3", Some("CorpWiFi"), Some("Q2XX-0002")),
            ],
            "CorpWiFi",
        );

        assert_eq!(groups.len(), 2);
        assert_eq!(serial(&groups[0]), Some("Q2XX-0001"));
        assert_eq!(ids(&groups[0]), vec!["c2"]);
        assert_eq!(ids(&groups[1]), vec!["c1", "c3"]);
    }

    #[test]
    fn ssid_must_match_exactly() {
        let groups = associate_by_ssid(
            vec![ap("Q2XX-0001")],
            vec![
                client("c1", Some("corpwifi"), Some("Q2XX-0001")),
                client("c2", Some("CorpWiFi "), Some("Q2XX-0001")),
                client("c3", None, Some("Q2XX-0001")),
                client("c4", Some("CorpWiFi"), Some("Q2XX-0001")),
            ],
            "CorpWiFi",
        );
        assert_eq!(ids(&groups[0]), vec!["c4"]);
    }

    #[test]
    fn unmatched_clients_follow_without_an_ap_and_empty_aps_are_kept() {
        let groups = associate_by_ssid(
            vec![ap("Q2XX-0001"), ap("Q2XX-0002")],
            vec![
                client("c1", Some("CorpWiFi"), Some("Q2XX-9999")),
                client("c2", Some("GuestWiFi"), Some("Q2XX-9999")),
                client("c3", Some("CorpWiFi"), None),
            ],
            "CorpWiFi",
        );

        assert_eq!(groups.len(), 3);
        assert_eq!(serial(&groups[0]), Some("Q2XX-0001"));
        assert_eq!(serial(&groups[1]), Some("Q2XX-0002"));
        assert!(groups[..2].iter().all(|group| group.clients.is_empty()));
        assert_eq!(serial(&groups[2]), None);
        assert_eq!(ids(&groups[2]), vec!["c1", "c3"]);
    }

    #[test]
    fn fully_matched_clients_add_no_trailing_group() {
        let groups = associate_by_ssid(
            vec![ap("Q2XX-0001")],
            vec![client("c1", Some("CorpWiFi"), Some("Q2XX-0001"))],
            "CorpWiFi",
        );
        assert_eq!(groups.len(), 1);
        assert!(groups[0].ap.is_some());
    }
}

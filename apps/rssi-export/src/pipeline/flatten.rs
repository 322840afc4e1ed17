use std::collections::HashMap;

use crate::error::RecordError;
use crate::mode::ReportMode;
use crate::model::{AccessPoint, Client, ClientRecord, RecordDetail};

use super::clients::ApClients;

const AP_RECORD: &str = "access point";
const CLIENT_RECORD: &str = "client";

/// Projects the access point → clients grouping into one record per client
/// id, in first-seen order. A later duplicate of a client id replaces the
/// earlier record in place. Clients grouped without an access point get
/// blank AP columns.
///
/// Fails on the first record missing an expected key; no partial set is
/// returned.
pub fn flatten_clients(
    groups: &[ApClients],
    mode: ReportMode,
) -> Result<Vec<ClientRecord>, RecordError> {
    let mut records: Vec<ClientRecord> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for group in groups {
        let ap = match &group.ap {
            Some(ap) => ApColumns::read(ap, mode)?,
            None => ApColumns::default(),
        };
        for client in &group.clients {
            let record = ap.join(client, mode)?;
            match positions.get(&record.client_id) {
                Some(&idx) => records[idx] = record,
                None => {
                    positions.insert(record.client_id.clone(), records.len());
                    records.push(record);
                }
            }
        }
    }

    Ok(records)
}

#[derive(Default)]
struct ApColumns {
    serial: Option<String>,
    name: Option<String>,
    mac: Option<String>,
    lat: Option<f64>,
    lng: Option<f64>,
    address: Option<String>,
    tags: String,
}

impl ApColumns {
    fn read(ap: &AccessPoint, mode: ReportMode) -> Result<Self, RecordError> {
        let serial = ap.serial.as_str();
        let name = ap.name.require(AP_RECORD, serial, "name")?;
        let mac = ap.mac.require(AP_RECORD, serial, "mac")?;

        let mut columns = Self {
            serial: Some(serial.to_string()),
            name,
            mac,
            lat: None,
            lng: None,
            address: None,
            tags: String::new(),
        };
        match mode {
            ReportMode::PerDevice => {
                columns.lat = ap.lat.require(AP_RECORD, serial, "lat")?;
                columns.lng = ap.lng.require(AP_RECORD, serial, "lng")?;
                columns.address = ap.address.require(AP_RECORD, serial, "address")?;
            }
            ReportMode::Ssid => {
                columns.tags = ap
                    .tags
                    .require(AP_RECORD, serial, "tags")?
                    .unwrap_or_default()
                    .join(",");
            }
        }
        Ok(columns)
    }

    fn join(&self, client: &Client, mode: ReportMode) -> Result<ClientRecord, RecordError> {
        let client_id = client
            .id
            .require(CLIENT_RECORD, "<unknown>", "id")?
            .ok_or_else(|| RecordError::missing(CLIENT_RECORD, "<unknown>", "id"))?;
        let client_mac = client.mac.require(CLIENT_RECORD, &client_id, "mac")?;
        let client_description = client
            .description
            .require(CLIENT_RECORD, &client_id, "description")?;

        let detail = match mode {
            ReportMode::PerDevice => RecordDetail::PerDevice {
                client_host_name: client
                    .dhcp_hostname
                    .require(CLIENT_RECORD, &client_id, "dhcpHostname")?,
                ap_lat: self.lat,
                ap_lng: self.lng,
                ap_address: self.address.clone(),
            },
            ReportMode::Ssid => RecordDetail::Ssid {
                ssid: client.ssid.require(CLIENT_RECORD, &client_id, "ssid")?,
                ap_tags: self.tags.clone(),
            },
        };

        Ok(ClientRecord {
            client_id,
            client_mac,
            client_description,
            ap_serial: self
                .serial
                .clone()
                .or_else(|| client.recent_device_serial.clone()),
            ap_name: self.name.clone(),
            ap_mac: self.mac.clone(),
            detail,
        })
    }
}

use serde::{Deserialize, Deserializer};

use crate::error::RecordError;

/// Presence of a key in a controller response.
///
/// The controller omits keys it does not know about and sends explicit nulls
/// for keys it knows are empty. Only the former is a malformed record.
#[derive(Debug, Clone, PartialEq)]
pub enum Reported<T> {
    Missing,
    Null,
    Value(T),
}

impl<T> Default for Reported<T> {
    fn default() -> Self {
        Self::Missing
    }
}

impl<'de, T> Deserialize<'de> for Reported<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Self::Value(value),
            None => Self::Null,
        })
    }
}

impl<T> Reported<T> {
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    pub fn as_option(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Missing | Self::Null => None,
        }
    }

    /// Returns the value (or `None` for an explicit null), failing when the
    /// key was absent from the record.
    pub fn require(
        &self,
        record: &'static str,
        id: &str,
        field: &'static str,
    ) -> Result<Option<T>, RecordError>
    where
        T: Clone,
    {
        match self {
            Self::Missing => Err(RecordError::missing(record, id, field)),
            Self::Null => Ok(None),
            Self::Value(value) => Ok(Some(value.clone())),
        }
    }
}

impl<T> From<Option<T>> for Reported<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(value) => Self::Value(value),
            None => Self::Null,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Organization {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessPoint {
    pub serial: String,
    #[serde(default)]
    pub name: Reported<String>,
    #[serde(default)]
    pub mac: Reported<String>,
    #[serde(default)]
    pub lat: Reported<f64>,
    #[serde(default)]
    pub lng: Reported<f64>,
    #[serde(default)]
    pub address: Reported<String>,
    #[serde(default)]
    pub tags: Reported<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    #[serde(default)]
    pub id: Reported<String>,
    #[serde(default)]
    pub mac: Reported<String>,
    #[serde(default)]
    pub description: Reported<String>,
    #[serde(default)]
    pub dhcp_hostname: Reported<String>,
    #[serde(default)]
    pub ssid: Reported<String>,
    #[serde(default)]
    pub recent_device_serial: Option<String>,
}

/// One resolution-sized bucket of a client's signal quality history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalSample {
    #[serde(default)]
    pub rssi: Option<i64>,
    #[serde(default)]
    pub snr: Reported<i64>,
    #[serde(default)]
    pub start_ts: Reported<String>,
    #[serde(default)]
    pub end_ts: Reported<String>,
}

/// One client joined with the access point that served it.
///
/// AP columns are `None` when the client's serving device is not part of the
/// wireless inventory; `ap_serial` then holds the serial the client reported.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientRecord {
    pub client_id: String,
    pub client_mac: Option<String>,
    pub client_description: Option<String>,
    pub ap_serial: Option<String>,
    pub ap_name: Option<String>,
    pub ap_mac: Option<String>,
    pub detail: RecordDetail,
}

/// Report-specific columns carried alongside the shared identification.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordDetail {
    PerDevice {
        client_host_name: Option<String>,
        ap_lat: Option<f64>,
        ap_lng: Option<f64>,
        ap_address: Option<String>,
    },
    Ssid {
        ssid: Option<String>,
        ap_tags: String,
    },
}

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(
        "organization {name:?} is not visible to this API key; check ORG_NAME against the organizations the key can access"
    )]
    OrganizationNotFound { name: String },
    #[error("network {name:?} was not found in organization {org_id}; check NET_NAME")]
    NetworkNotFound { name: String, org_id: String },
}

/// A record returned by the controller lacks a key the report depends on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("{record} {id} is missing expected field `{field}`")]
    MissingField {
        record: &'static str,
        id: String,
        field: &'static str,
    },
}

impl RecordError {
    pub fn missing(record: &'static str, id: impl Into<String>, field: &'static str) -> Self {
        Self::MissingField {
            record,
            id: id.into(),
            field,
        }
    }
}

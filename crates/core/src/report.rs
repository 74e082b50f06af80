//! CSP violation report types.
//!
//! Browsers POST a JSON envelope `{"csp-report": {...}}` with kebab-case
//! keys. [`CspReportPayload`] is that wire shape; [`CspReport`] is the
//! domain record, which pairs the decoded details with a server-assigned
//! receipt time.

use serde::{Deserialize, Deserializer, Serialize};

use crate::types::Timestamp;

/// The violation details as emitted by a browser's CSP violation event.
///
/// Absent keys and `null` values decode as empty strings so that a missing
/// required field surfaces as a validation rejection rather than a decode
/// failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct CspDetails {
    #[serde(deserialize_with = "null_as_default")]
    pub document_uri: String,
    #[serde(deserialize_with = "null_as_default")]
    pub referrer: String,
    #[serde(deserialize_with = "null_as_default")]
    pub blocked_uri: String,
    #[serde(deserialize_with = "null_as_default")]
    pub violated_directive: String,
    #[serde(deserialize_with = "null_as_default")]
    pub original_policy: String,
}

/// Request body of a CSP violation POST. Unknown keys are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CspReportPayload {
    #[serde(rename = "csp-report", default, deserialize_with = "null_as_default")]
    pub details: CspDetails,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl CspReportPayload {
    /// Decode a request body.
    pub fn from_slice(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

/// A received report. `report_time` is assigned by the server and there is
/// no way to construct one from client input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CspReport {
    pub details: CspDetails,
    report_time: Timestamp,
}

impl CspReport {
    /// Stamp decoded details with the instant they were received.
    pub fn received(details: CspDetails, report_time: Timestamp) -> Self {
        Self {
            details,
            report_time,
        }
    }

    pub fn report_time(&self) -> Timestamp {
        self.report_time
    }
}

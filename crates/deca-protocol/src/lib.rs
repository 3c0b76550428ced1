//! Wire types shared between the DECA server and the browser client.
//!
//! - `/all-members-json` payload ([`MembersPayload`])
//! - `postMessage` round trip with a hosting parent frame ([`FrameRequest`], [`FrameResponse`])

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Action name sent to the parent frame to ask for the iframe's visible top.
pub const GET_TOP_ACTION: &str = "get-top";

/// Message name the parent frame answers a [`GET_TOP_ACTION`] request with.
pub const GET_TOP_RESPONSE: &str = "get-top-response";

/// Response of `GET /all-members-json`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MembersPayload {
    pub members: Vec<MemberRecord>,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldInfo>,
}

/// One member row exactly as the server sent it.
///
/// Values are usually strings but may be `null` for blank spreadsheet cells.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MemberRecord(pub BTreeMap<String, Value>);

impl MemberRecord {
    /// Text of a field. `null` and missing fields read as `None`,
    /// numbers and booleans are stringified.
    pub fn text(&self, name: &str) -> Option<Cow<'_, str>> {
        match self.0.get(name)? {
            Value::Null => None,
            Value::String(text) => Some(Cow::Borrowed(text)),
            other => Some(Cow::Owned(other.to_string())),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(name, value)| (name.as_str(), value))
    }
}

/// Server-side field description. Keys of [`MembersPayload::fields`] are
/// logical field ids (`address_latlong`), `name` is the form/column name.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldInfo {
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub form_field: Option<bool>,
    #[serde(default)]
    pub mutable: Option<bool>,
    #[serde(default)]
    pub values: Option<Vec<String>>,
}

/// Outbound request to the hosting parent frame.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameRequest {
    pub action: String,
    #[serde(rename = "responseID")]
    pub response_id: String,
}

impl FrameRequest {
    pub fn get_top(response_id: impl Into<String>) -> Self {
        Self {
            action: GET_TOP_ACTION.to_owned(),
            response_id: response_id.into(),
        }
    }
}

/// Inbound message from the hosting parent frame.
///
/// Every field is optional because the window receives messages from
/// arbitrary senders; unrelated payloads must still deserialize so they can
/// be ignored.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameResponse {
    #[serde(rename = "responseID", default)]
    pub response_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub value: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn members_payload_parses_null_values() {
        let json = r#"{
            "members": [{"first_name": "Ann", "address_latlong": null, "paid": 1}],
            "fields": {"address_latlong": {"name": "address_latlong", "title": "Address LatLong"}}
        }"#;
        let payload: MembersPayload = serde_json::from_str(json).unwrap();
        let member = &payload.members[0];
        assert_eq!(member.text("first_name").as_deref(), Some("Ann"));
        assert_eq!(member.text("address_latlong"), None);
        assert_eq!(member.text("paid").as_deref(), Some("1"));
        assert_eq!(payload.fields["address_latlong"].name, "address_latlong");
    }

    #[test]
    fn frame_request_uses_response_id_key() {
        let json = serde_json::to_string(&FrameRequest::get_top("self-serve-join")).unwrap();
        assert_eq!(json, r#"{"action":"get-top","responseID":"self-serve-join"}"#);
    }

    #[test]
    fn frame_response_tolerates_foreign_payloads() {
        let response: FrameResponse = serde_json::from_str(r#"{"type":"resize","height":300}"#).unwrap();
        assert_eq!(response, FrameResponse::default());
    }
}

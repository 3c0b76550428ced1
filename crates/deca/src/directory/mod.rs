//! Read-only member directory behind the renew and map pages.
//!
//! The list is fetched once with a single GET and never mutated afterwards;
//! both pages render from the same [`MemberDirectory`].

pub mod filter;
pub mod map;
pub mod renew;

use std::collections::BTreeMap;
use std::rc::Rc;

use deca_protocol::{FieldInfo, MemberRecord, MembersPayload};

use crate::error::ClientError;
use crate::http::{HttpResponse, Transport};

/// Prefix of the blocking alert shown when the list can't be loaded.
pub const FETCH_FAILED_ALERT: &str = "Failed to load member list. Reload the page to try again.";

/// A coordinate pair as stored in the `"lat, lng"` address field.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Parse `"43.65, -79.38"`. Blank or non-numeric text yields `None`.
    pub fn parse(text: &str) -> Option<Self> {
        let (lat, lng) = text.split_once(',')?;
        let lat: f64 = lat.trim().parse().ok()?;
        let lng: f64 = lng.trim().parse().ok()?;
        (lat.is_finite() && lng.is_finite()).then_some(Self { lat, lng })
    }
}

#[derive(Clone, Debug, Default)]
pub struct MemberDirectory {
    members: Rc<[MemberRecord]>,
    fields: Rc<BTreeMap<String, FieldInfo>>,
}

impl MemberDirectory {
    pub fn from_payload(payload: MembersPayload) -> Self {
        Self {
            members: payload.members.into(),
            fields: Rc::new(payload.fields),
        }
    }

    pub fn members(&self) -> &[MemberRecord] {
        &self.members
    }

    pub fn get(&self, index: usize) -> Option<&MemberRecord> {
        self.members.get(index)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn fields(&self) -> &BTreeMap<String, FieldInfo> {
        &self.fields
    }

    /// Column name of a logical field id, falling back to `fallback` when
    /// the payload doesn't describe it.
    pub fn column<'a>(&'a self, id: &str, fallback: &'a str) -> &'a str {
        self.fields.get(id).map_or(fallback, |info| info.name.as_str())
    }

    /// Text searched by the live filter: the configured fields, space
    /// separated, blanks skipped.
    pub fn search_text(&self, index: usize, search_fields: &[String]) -> String {
        let Some(member) = self.get(index) else {
            return String::new();
        };
        search_fields
            .iter()
            .filter_map(|field| member.text(field))
            .filter(|text| !text.trim().is_empty())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// GET the member list. Any failure, including an unparseable body, is a
/// [`ClientError::Fetch`] carrying the raw status line and body.
pub async fn fetch_members(transport: &impl Transport, url: &str) -> Result<MemberDirectory, ClientError> {
    log::debug!("fetching member list from `{url}`");
    let response = match transport.get(url).await {
        Ok(response) => response,
        Err(error) => {
            log::warn!("member list request failed: {error}");
            HttpResponse::from_transport_error(&error)
        }
    };
    if !response.is_success() {
        return Err(fetch_error(response));
    }
    match serde_json::from_str::<MembersPayload>(&response.body) {
        Ok(payload) => {
            log::info!("loaded {} members", payload.members.len());
            Ok(MemberDirectory::from_payload(payload))
        }
        Err(error) => {
            log::warn!("member list is not valid JSON: {error}");
            Err(fetch_error(response))
        }
    }
}

fn fetch_error(response: HttpResponse) -> ClientError {
    ClientError::Fetch {
        status: response.status,
        status_text: response.status_text,
        body: response.body,
    }
}

/// Text of the blocking alert for a failed fetch.
pub fn fetch_failure_alert(error: &ClientError) -> String {
    format!("{FETCH_FAILED_ALERT}\n\n{error}")
}

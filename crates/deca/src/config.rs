//! Client configuration.
//!
//! One `ClientConfig` is built per page (see [`ClientConfig::from_json`]) and
//! handed to every component that needs a field name, URL or timing.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::form::validator::FieldRules;
use crate::frame::FrameTimeout;

/// Divider used to flatten multi-valued fields. Also used by the server
/// when it splits them again.
pub const MULTIVALUE_DIVIDER: &str = "; ";

/// Id of the optional `<script type="application/json">` holding overrides.
pub const CONFIG_ELEMENT_ID: &str = "deca-config";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub multivalue_divider: String,
    pub fields: FieldNames,
    pub endpoints: Endpoints,
    pub geolocation: GeolocationOptions,
    pub highlight: HighlightTimings,
    pub directory: DirectoryOptions,
    pub map: MapOptions,
    pub frame_timeout: FrameTimeout,
    /// Extra validation rules on top of the ones declared in markup.
    pub rules: Vec<FieldRules>,
    pub log_level: LogLevel,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            multivalue_divider: MULTIVALUE_DIVIDER.to_owned(),
            fields: FieldNames::default(),
            endpoints: Endpoints::default(),
            geolocation: GeolocationOptions::default(),
            highlight: HighlightTimings::default(),
            directory: DirectoryOptions::default(),
            map: MapOptions::default(),
            frame_timeout: FrameTimeout::Never,
            rules: Vec::new(),
            log_level: LogLevel::Info,
        }
    }
}

impl ClientConfig {
    /// Parse overrides; missing keys keep their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.check()?;
        Ok(config)
    }

    fn check(&self) -> Result<(), ConfigError> {
        if self.multivalue_divider.is_empty() {
            return Err(ConfigError::Invalid("multivalue_divider must not be empty".into()));
        }
        if !(0.0..=1.0).contains(&self.map.height_ratio) {
            return Err(ConfigError::Invalid(format!(
                "map.height_ratio {} is outside 0..=1",
                self.map.height_ratio
            )));
        }
        Ok(())
    }
}

/// Form and payload field names the client reads or injects.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldNames {
    pub geoposition: String,
    pub embedder: String,
    pub email: String,
    pub csrf_token: String,
    pub payment_method: String,
    /// Fallback column name of the "lat, lng" field when the payload's
    /// `fields` table doesn't describe it.
    pub address_latlong: String,
}

impl Default for FieldNames {
    fn default() -> Self {
        Self {
            geoposition: "geoposition".to_owned(),
            embedder: "_embedder".to_owned(),
            email: "email".to_owned(),
            csrf_token: "csrf_token".to_owned(),
            payment_method: "payment_method".to_owned(),
            address_latlong: "address_latlong".to_owned(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub all_members: String,
    pub token_sign_in: String,
    pub csrf_header: String,
    pub home: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            all_members: "/all-members-json".to_owned(),
            token_sign_in: "tokensignin".to_owned(),
            csrf_header: "X-CSRFToken".to_owned(),
            home: "/".to_owned(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeolocationOptions {
    pub high_accuracy: bool,
    pub timeout_ms: u32,
    pub maximum_age_ms: u32,
    /// Readings less accurate than this (metres) are discarded.
    pub max_accuracy_m: f64,
}

impl Default for GeolocationOptions {
    fn default() -> Self {
        Self {
            high_accuracy: true,
            timeout_ms: 30 * 1000,
            maximum_age_ms: 5 * 60 * 1000,
            max_accuracy_m: 1000.0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightTimings {
    pub fade_in_ms: u32,
    pub fade_out_ms: u32,
}

impl Default for HighlightTimings {
    fn default() -> Self {
        Self {
            fade_in_ms: 1000,
            fade_out_ms: 3000,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryOptions {
    /// Member fields concatenated into an item's searchable text.
    pub search_fields: Vec<String>,
    pub filter_debounce_ms: u32,
}

impl Default for DirectoryOptions {
    fn default() -> Self {
        Self {
            search_fields: ["first_name", "last_name", "email", "street_name", "family_names"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
            filter_debounce_ms: 0,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapOptions {
    pub center_lat: f64,
    pub center_lng: f64,
    pub zoom: u8,
    /// Map canvas height as a share of the window height.
    pub height_ratio: f64,
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            center_lat: 43.6874995,
            center_lng: -79.3153531,
            zoom: 15,
            height_ratio: 0.75,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn to_level_filter(self) -> log::LevelFilter {
        match self {
            Self::Off => log::LevelFilter::Off,
            Self::Error => log::LevelFilter::Error,
            Self::Warn => log::LevelFilter::Warn,
            Self::Info => log::LevelFilter::Info,
            Self::Debug => log::LevelFilter::Debug,
            Self::Trace => log::LevelFilter::Trace,
        }
    }
}

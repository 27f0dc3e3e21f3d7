//! Web-facing assets: URLs and the services answering on them

use super::{AssetVariant, ContentKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Url {
    /// The URL as observed
    #[serde(rename = "url")]
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scheme: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fragment: Option<String>,
}

impl Url {
    /// Create a URL, filling in its parts when `raw` parses as an absolute URL.
    ///
    /// The host is normalized by the parser (lowercased, IDNA); `raw` is kept
    /// exactly as observed and stays the identity of the asset.
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let parsed = match url::Url::parse(&raw) {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::debug!("Keeping unparsed URL {:?}: {}", raw, e);
                return Self { raw, ..Default::default() };
            }
        };

        Self {
            scheme: Some(parsed.scheme().to_string()),
            username: Some(parsed.username().to_string()).filter(|u| !u.is_empty()),
            password: parsed.password().map(str::to_string),
            host: parsed.host_str().map(str::to_string),
            port: parsed.port(),
            path: Some(parsed.path().to_string()).filter(|p| !p.is_empty()),
            options: parsed.query().map(str::to_string),
            fragment: parsed.fragment().map(str::to_string),
            raw,
        }
    }
}

impl AssetVariant for Url {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("url", &self.raw)
    }
}

/// A service answering on some endpoint, identified by a stable identifier
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Service {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banner_length: Option<usize>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, Vec<String>>,
}

impl AssetVariant for Service {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("identifier", &self.identifier)
    }
}

//! Contact details: phones, emails, postal locations and the records grouping them

use super::{AssetVariant, ContentKey};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Phone {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub phone_type: Option<String>,
    /// Number exactly as it was observed
    pub raw: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub e164: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_abbrev: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_code: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ext: Option<String>,
}

impl AssetVariant for Phone {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("raw", &self.raw)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct EmailAddress {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl EmailAddress {
    /// Create an email address, splitting out the user and domain parts
    pub fn new(address: impl Into<String>) -> Self {
        let address = address.into();
        let (username, domain) = match address.rsplit_once('@') {
            Some((user, domain)) => (Some(user.to_string()), Some(domain.to_lowercase())),
            None => (None, None),
        };

        Self {
            address,
            username,
            domain,
        }
    }
}

impl AssetVariant for EmailAddress {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("address", &self.address)
    }
}

/// A postal location
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub street_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub po_box: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub province: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
}

impl AssetVariant for Location {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("address", &self.address)
    }
}

/// Groups contact details found at one place (a page, a WHOIS record)
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactRecord {
    pub discovered_at: String,
}

impl ContactRecord {
    pub fn new(discovered_at: impl Into<String>) -> Self {
        Self {
            discovered_at: discovered_at.into(),
        }
    }
}

impl AssetVariant for ContactRecord {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("discovered_at", &self.discovered_at)
    }
}

//! Registration (WHOIS/RDAP) records for networks, AS numbers and domains

use super::{AssetVariant, Cidr, ContentKey, IpVersion};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Registration record of an autonomous system number
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AutnumRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    pub number: u32,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
}

impl AssetVariant for AutnumRecord {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("handle", &self.handle)
    }
}

/// Registration record of an IP network allocation
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct IpNetRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    pub cidr: Cidr,
    pub handle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_address: Option<IpAddr>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_address: Option<IpAddr>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub ip_type: Option<IpVersion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_handle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
}

impl AssetVariant for IpNetRecord {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("handle", &self.handle)
    }
}

/// Registration record of a domain name
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DomainRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub domain: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub punycode: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub whois_server: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,
    #[serde(default)]
    pub dnssec: bool,
}

impl AssetVariant for DomainRecord {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("domain", &self.domain)
    }
}

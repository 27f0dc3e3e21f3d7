//! Domain name assets

use super::{AssetVariant, ContentKey};
use serde::{Deserialize, Serialize};

/// A fully qualified domain name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Fqdn {
    pub name: String,
}

impl Fqdn {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl AssetVariant for Fqdn {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("name", &self.name)
    }
}

/// A named network endpoint (`host:port` over a protocol)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NetworkEndpoint {
    pub address: String,
    pub name: String,
    pub port: u16,
    pub protocol: String,
}

impl NetworkEndpoint {
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        port: u16,
        protocol: impl Into<String>,
    ) -> Self {
        Self {
            address: address.into(),
            name: name.into(),
            port,
            protocol: protocol.into(),
        }
    }
}

impl AssetVariant for NetworkEndpoint {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("address", &self.address)
    }
}

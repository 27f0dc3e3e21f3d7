//! Network layer assets: addresses, netblocks, autonomous systems

use super::{AssetVariant, ContentKey};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

/// IP version of an address or netblock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum IpVersion {
    #[default]
    #[serde(rename = "IPv4")]
    V4,
    #[serde(rename = "IPv6")]
    V6,
}

impl IpVersion {
    pub fn of(addr: &IpAddr) -> Self {
        match addr {
            IpAddr::V4(_) => IpVersion::V4,
            IpAddr::V6(_) => IpVersion::V6,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IpAddress {
    pub address: IpAddr,
    #[serde(rename = "type")]
    pub ip_type: IpVersion,
}

impl IpAddress {
    pub fn new(address: IpAddr) -> Self {
        Self {
            address,
            ip_type: IpVersion::of(&address),
        }
    }
}

impl AssetVariant for IpAddress {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("address", self.address.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AutonomousSystem {
    pub number: u32,
}

impl AutonomousSystem {
    pub fn new(number: u32) -> Self {
        Self { number }
    }
}

impl AssetVariant for AutonomousSystem {
    fn content_key(&self) -> ContentKey {
        ContentKey::integer("number", i64::from(self.number))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CidrError {
    #[error("missing prefix length in {0:?}")]
    MissingPrefix(String),
    #[error("invalid address in {0:?}")]
    Address(String),
    #[error("invalid prefix length in {0:?}")]
    PrefixLength(String),
}

/// An address prefix such as `192.0.2.0/24`.
///
/// Parsing validates the address and the prefix length; `Display` prints
/// the canonical form, so `2001:DB8:0::/32` and `2001:db8::/32` compare
/// and serialize the same.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Cidr {
    address: IpAddr,
    prefix_len: u8,
}

impl Cidr {
    pub fn new(address: IpAddr, prefix_len: u8) -> Option<Self> {
        let max = match address {
            IpAddr::V4(_) => 32,
            IpAddr::V6(_) => 128,
        };
        (prefix_len <= max).then_some(Self { address, prefix_len })
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }

    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    pub fn ip_version(&self) -> IpVersion {
        IpVersion::of(&self.address)
    }
}

impl Default for Cidr {
    fn default() -> Self {
        Self {
            address: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            prefix_len: 0,
        }
    }
}

impl FromStr for Cidr {
    type Err = CidrError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (address, prefix_len) = s
            .trim()
            .split_once('/')
            .ok_or_else(|| CidrError::MissingPrefix(s.to_string()))?;
        let address: IpAddr = address.parse().map_err(|_| CidrError::Address(s.to_string()))?;
        let prefix_len: u8 = prefix_len
            .parse()
            .map_err(|_| CidrError::PrefixLength(s.to_string()))?;
        Self::new(address, prefix_len).ok_or_else(|| CidrError::PrefixLength(s.to_string()))
    }
}

impl fmt::Display for Cidr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl Serialize for Cidr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Cidr {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A CIDR block of addresses
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Netblock {
    pub cidr: Cidr,
    #[serde(rename = "type")]
    pub ip_type: IpVersion,
}

impl Netblock {
    pub fn new(cidr: Cidr) -> Self {
        Self {
            cidr,
            ip_type: cidr.ip_version(),
        }
    }
}

impl AssetVariant for Netblock {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("cidr", self.cidr.to_string())
    }
}

/// An IP address and port pair
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SocketAddress {
    pub address: SocketAddr,
    pub ip_address: IpAddr,
    pub port: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
}

impl SocketAddress {
    pub fn new(address: SocketAddr) -> Self {
        Self {
            address,
            ip_address: address.ip(),
            port: address.port(),
            protocol: None,
        }
    }

    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = Some(protocol.into());
        self
    }
}

impl AssetVariant for SocketAddress {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("address", self.address.to_string())
    }
}

//! Asset model - the closed set of asset kinds
//!
//! Every asset kind is a plain serde struct implementing [`AssetVariant`].
//! The `asset_registry!` invocation at the bottom of this file is the single
//! registry mapping type tags to those structs; it generates:
//! - [`AssetType`]: the closed set of type tags
//! - [`Asset`]: the tagged union used to encode, decode and dedup values

pub mod certificate;
pub mod contact;
pub mod domain;
pub mod network;
pub mod org;
pub mod people;
pub mod registration;
pub mod source;
pub mod web;

pub use certificate::{Fingerprint, TlsCertificate};
pub use contact::{ContactRecord, EmailAddress, Location, Phone};
pub use domain::{Fqdn, NetworkEndpoint};
pub use network::{AutonomousSystem, Cidr, CidrError, IpAddress, IpVersion, Netblock, SocketAddress};
pub use org::Organization;
pub use people::Person;
pub use registration::{AutnumRecord, DomainRecord, IpNetRecord};
pub use source::Source;
pub use web::{Service, Url};

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Capability shared by every asset kind.
pub trait AssetVariant: Serialize + DeserializeOwned + Into<Asset> {
    /// The semantically identifying field of this value.
    ///
    /// Two values of the same kind with equal content keys are the same
    /// real-world asset.
    fn content_key(&self) -> ContentKey;
}

/// Value of a content key, typed the way it appears in the JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(untagged)]
pub enum KeyValue {
    Text(String),
    Integer(i64),
}

impl std::fmt::Display for KeyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            KeyValue::Text(s) => write!(f, "{}", s),
            KeyValue::Integer(n) => write!(f, "{}", n),
        }
    }
}

/// The identifying field of an asset value: payload field name plus value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentKey {
    pub field: &'static str,
    pub value: KeyValue,
}

impl ContentKey {
    pub fn text(field: &'static str, value: impl Into<String>) -> Self {
        Self {
            field,
            value: KeyValue::Text(value.into()),
        }
    }

    pub fn integer(field: &'static str, value: i64) -> Self {
        Self {
            field,
            value: KeyValue::Integer(value),
        }
    }

    /// JSON path of the field inside the encoded payload (`$.name`)
    pub fn json_path(&self) -> String {
        format!("$.{}", self.field)
    }
}

/// Equality predicate over stored records: same type, equal content key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentFilter {
    pub asset_type: AssetType,
    pub key: ContentKey,
}

impl std::fmt::Display for ContentFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{} = {}]", self.asset_type, self.key.field, self.key.value)
    }
}

macro_rules! asset_registry {
    ($($variant:ident($ty:ty) => $tag:literal),* $(,)?) => {
        /// Closed set of asset type tags.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum AssetType {
            $( $variant, )*
        }

        impl AssetType {
            /// Get the stored tag of the asset type
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( AssetType::$variant => $tag, )*
                }
            }

            /// Get all asset types
            pub fn all() -> &'static [AssetType] {
                &[ $( AssetType::$variant, )* ]
            }
        }

        impl FromStr for AssetType {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $( $tag => Ok(AssetType::$variant), )*
                    _ => Err(Error::UnknownAssetType(s.to_string())),
                }
            }
        }

        /// A typed asset value: one member of the closed variant set.
        #[derive(Debug, Clone, PartialEq)]
        pub enum Asset {
            $( $variant($ty), )*
        }

        impl Asset {
            pub fn asset_type(&self) -> AssetType {
                match self {
                    $( Asset::$variant(_) => AssetType::$variant, )*
                }
            }

            pub fn content_key(&self) -> ContentKey {
                match self {
                    $( Asset::$variant(v) => v.content_key(), )*
                }
            }

            /// Encode the value into its JSON payload
            pub fn encode(&self) -> Result<String> {
                let encoded = match self {
                    $( Asset::$variant(v) => serde_json::to_string(v), )*
                };
                encoded.map_err(|source| Error::Encode {
                    asset_type: self.asset_type(),
                    source,
                })
            }

            /// Decode a JSON payload stored under `asset_type`
            pub fn decode(asset_type: AssetType, content: &str) -> Result<Self> {
                let decoded = match asset_type {
                    $( AssetType::$variant => serde_json::from_str::<$ty>(content).map(Asset::$variant), )*
                };
                decoded.map_err(|source| Error::MalformedContent { asset_type, source })
            }
        }

        $(
            impl $ty {
                pub const ASSET_TYPE: AssetType = AssetType::$variant;
            }

            impl From<$ty> for Asset {
                fn from(value: $ty) -> Self {
                    Asset::$variant(value)
                }
            }
        )*
    };
}

asset_registry! {
    Fqdn(Fqdn) => "FQDN",
    NetworkEndpoint(NetworkEndpoint) => "NetworkEndpoint",
    IpAddress(IpAddress) => "IPAddress",
    AutonomousSystem(AutonomousSystem) => "AutonomousSystem",
    AutnumRecord(AutnumRecord) => "AutnumRecord",
    Netblock(Netblock) => "Netblock",
    IpNetRecord(IpNetRecord) => "IPNetRecord",
    SocketAddress(SocketAddress) => "SocketAddress",
    DomainRecord(DomainRecord) => "DomainRecord",
    Fingerprint(Fingerprint) => "Fingerprint",
    Organization(Organization) => "Organization",
    Person(Person) => "Person",
    Phone(Phone) => "Phone",
    EmailAddress(EmailAddress) => "EmailAddress",
    Location(Location) => "Location",
    ContactRecord(ContactRecord) => "ContactRecord",
    TlsCertificate(TlsCertificate) => "TLSCertificate",
    Url(Url) => "URL",
    Source(Source) => "Source",
    Service(Service) => "Service",
}

impl AssetType {
    /// Parse a tag case-insensitively (`fqdn`, `ipaddress`, ...)
    pub fn parse_loose(s: &str) -> Result<Self> {
        AssetType::all()
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownAssetType(s.to_string()))
    }
}

impl std::fmt::Display for AssetType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl Serialize for AssetType {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for AssetType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        tag.parse().map_err(serde::de::Error::custom)
    }
}

impl Asset {
    /// Equality predicate matching stored records of this same asset
    pub fn content_filter(&self) -> ContentFilter {
        ContentFilter {
            asset_type: self.asset_type(),
            key: self.content_key(),
        }
    }
}

impl std::fmt::Display for Asset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.asset_type(), self.content_key().value)
    }
}

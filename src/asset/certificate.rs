//! TLS certificates and fingerprints

use super::{AssetVariant, ContentKey};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An X.509 certificate observed during a TLS handshake
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TlsCertificate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    pub serial_number: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_common_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer_common_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_after: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_usage: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ext_key_usage: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_algorithm: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key_algorithm: Option<String>,
    #[serde(default)]
    pub is_ca: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crl_distribution_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_key_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub authority_key_id: Option<String>,
}

impl TlsCertificate {
    /// Check whether the certificate validity window covers `at`
    pub fn is_valid_at(&self, at: DateTime<Utc>) -> bool {
        self.not_before.is_none_or(|nb| nb <= at) && self.not_after.is_none_or(|na| at <= na)
    }
}

impl AssetVariant for TlsCertificate {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("serial_number", &self.serial_number)
    }
}

/// A digest identifying some other artifact (certificate, key, banner)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Fingerprint {
    pub value: String,
    #[serde(rename = "type")]
    pub fingerprint_type: String,
}

impl Fingerprint {
    pub fn new(fingerprint_type: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            fingerprint_type: fingerprint_type.into(),
        }
    }
}

impl AssetVariant for Fingerprint {
    fn content_key(&self) -> ContentKey {
        ContentKey::text("value", &self.value)
    }
}

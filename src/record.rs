//! Stored record types
//!
//! Both records share the same temporal bookkeeping:
//! - `created_at` is set once when the row is inserted
//! - `last_seen` starts equal to `created_at` and only moves forward

use crate::asset::{Asset, AssetType, ContentFilter};
use crate::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// An asset as stored: uniform row shape with an opaque JSON payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssetRecord {
    /// Backend-assigned identifier
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Type tag from the closed asset registry
    #[serde(rename = "type")]
    pub asset_type: String,
    /// JSON encoding of the typed value, schema determined by `asset_type`
    pub content: String,
}

impl AssetRecord {
    /// Parse the type tag alone
    pub fn asset_type(&self) -> Result<AssetType> {
        self.asset_type.parse()
    }

    /// Reconstruct the typed asset value.
    ///
    /// Fails with `UnknownAssetType` if the tag is outside the registry and
    /// `MalformedContent` if the payload does not decode under the tag.
    pub fn decode(&self) -> Result<Asset> {
        let asset_type = self.asset_type()?;
        Asset::decode(asset_type, &self.content)
    }

    /// Equality predicate that finds records of the same real-world asset
    pub fn content_filter(&self) -> Result<ContentFilter> {
        Ok(self.decode()?.content_filter())
    }
}

/// A directed, typed edge between two asset records.
///
/// The relation does not own its endpoints; it only references them by id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelationRecord {
    pub id: u64,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    /// Free-form relation label chosen by the caller
    #[serde(rename = "type")]
    pub relation_type: String,
    pub from_asset_id: u64,
    pub to_asset_id: u64,
}

impl RelationRecord {
    /// Check if this relation goes from `from` to `to`
    pub fn connects(&self, from: &AssetRecord, to: &AssetRecord) -> bool {
        self.from_asset_id == from.id && self.to_asset_id == to.id
    }

    pub fn is_self_loop(&self) -> bool {
        self.from_asset_id == self.to_asset_id
    }
}

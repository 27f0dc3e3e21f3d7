//! Repository contract - the operation set a storage backend must support
//!
//! Backends persist asset and relation records and answer the typed queries
//! below. Content-based lookups compare the content key of decoded values,
//! never the raw payload.

use crate::asset::{Asset, AssetType};
use crate::record::{AssetRecord, RelationRecord};
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

/// Lower bound on `last_seen`. `None` means no bound.
pub type Since = Option<DateTime<Utc>>;

/// One row of a raw query, keyed by column name
pub type RawRow = serde_json::Map<String, serde_json::Value>;

/// Normalize a since filter: the epoch or anything before it is no bound.
pub fn effective_since(since: Since) -> Since {
    since.filter(|t| t.timestamp_micros() > 0)
}

/// Operations every storage backend provides.
///
/// Implementations must be safe to share between threads. Every error
/// returned from the backend names the operation that failed.
pub trait Repository: Send + Sync {
    /// Name of the backend (`sqlite`, ...)
    fn db_type(&self) -> &str;

    /// Store an asset, or return the existing record for the same content key.
    ///
    /// The lookup and insert happen atomically; an existing record is
    /// returned unchanged (its `last_seen` is not bumped).
    fn create_asset(&self, asset: &Asset) -> Result<AssetRecord>;

    /// Remove an asset and every relation referencing it
    fn delete_asset(&self, id: u64) -> Result<()>;

    fn delete_relation(&self, id: u64) -> Result<()>;

    /// Move an asset's `last_seen` to now; never moves it backwards
    fn touch_asset_last_seen(&self, id: u64) -> Result<()>;

    fn touch_relation_last_seen(&self, id: u64) -> Result<()>;

    /// Create a directed relation. Both endpoints must exist.
    ///
    /// Repeated calls create repeated relations.
    fn link(&self, from: &AssetRecord, relation_type: &str, to: &AssetRecord) -> Result<RelationRecord>;

    /// Records of the same type whose content key equals the asset's
    fn find_asset_by_content(&self, asset: &Asset, since: Since) -> Result<Vec<AssetRecord>>;

    fn find_asset_by_id(&self, id: u64, since: Since) -> Result<AssetRecord>;

    fn find_asset_by_type(&self, asset_type: AssetType, since: Since) -> Result<Vec<AssetRecord>>;

    /// Records matching the content key of any of the constraints
    fn find_asset_by_scope(&self, constraints: &[Asset], since: Since) -> Result<Vec<AssetRecord>>;

    /// Relations pointing at `asset`; an empty `relation_types` matches all
    fn incoming_relations(
        &self,
        asset: &AssetRecord,
        since: Since,
        relation_types: &[&str],
    ) -> Result<Vec<RelationRecord>>;

    /// Relations leaving `asset`; an empty `relation_types` matches all
    fn outgoing_relations(
        &self,
        asset: &AssetRecord,
        since: Since,
        relation_types: &[&str],
    ) -> Result<Vec<RelationRecord>>;

    /// Run a backend-native query; the caller owns the result shape
    fn raw_query(&self, query: &str) -> Result<Vec<RawRow>>;

    /// Query the asset table with backend-native constraints appended
    fn asset_query(&self, constraints: &str) -> Result<Vec<AssetRecord>>;

    /// Query the relation table with backend-native constraints appended
    fn relation_query(&self, constraints: &str) -> Result<Vec<RelationRecord>>;

    fn stats(&self) -> Result<RepositoryStats>;
}

/// Record counts held by a repository
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct RepositoryStats {
    pub assets: usize,
    pub relations: usize,
    /// Asset count per type tag; tags outside the registry are kept as-is
    pub assets_by_type: BTreeMap<String, usize>,
}

impl std::fmt::Display for RepositoryStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Assets: {}", self.assets)?;
        writeln!(f, "  Relations: {}", self.relations)?;
        for (asset_type, count) in &self.assets_by_type {
            writeln!(f, "    {}: {}", asset_type, count)?;
        }
        Ok(())
    }
}

//! AssetDb - facade composing repository operations into workflows
//!
//! The facade owns a shared handle to a [`Repository`]; the backend is
//! released when the last handle is dropped.

use std::path::Path;
use std::sync::Arc;

use serde::de::DeserializeOwned;

use crate::asset::{Asset, AssetType};
use crate::config::AssetDbConfig;
use crate::record::{AssetRecord, RelationRecord};
use crate::repository::{RawRow, Repository, RepositoryStats, Since};
use crate::storage::{SqliteOptions, SqliteRepository};
use crate::{Error, Result};

/// The asset database service.
#[derive(Clone)]
pub struct AssetDb {
    repository: Arc<dyn Repository>,
}

impl AssetDb {
    /// Wrap an already opened repository
    pub fn new(repository: Arc<dyn Repository>) -> Self {
        Self { repository }
    }

    /// Open the SQLite backend described by `config`
    pub fn open(config: &AssetDbConfig) -> Result<Self> {
        let options = SqliteOptions::from(config);
        let repository = if config.is_in_memory() {
            SqliteRepository::open_in_memory_with(&options)?
        } else {
            SqliteRepository::open_with(Path::new(&config.database_path()), &options)?
        };
        Ok(Self::new(Arc::new(repository)))
    }

    /// Open a throwaway in-memory database
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Arc::new(SqliteRepository::open_in_memory()?)))
    }

    pub fn repository(&self) -> &Arc<dyn Repository> {
        &self.repository
    }

    /// Type of the underlying database
    pub fn db_type(&self) -> &str {
        self.repository.db_type()
    }

    /// Create (or find) the discovered asset and optionally link it from `source`.
    ///
    /// When `source` is `None` or `relation` is empty, the asset is returned
    /// without linking. Otherwise the relation `source -> asset` is created as
    /// well. The asset is committed before linking; if the link fails the
    /// error is [`Error::LinkFailed`], which carries the committed asset so
    /// the caller can retry the link alone.
    pub fn create(
        &self,
        source: Option<&AssetRecord>,
        relation: &str,
        discovered: impl Into<Asset>,
    ) -> Result<AssetRecord> {
        let asset = self.repository.create_asset(&discovered.into())?;

        let Some(source) = source else {
            return Ok(asset);
        };
        if relation.is_empty() {
            return Ok(asset);
        }

        match self.repository.link(source, relation, &asset) {
            Ok(_) => Ok(asset),
            Err(e) => {
                tracing::warn!("Asset {} committed but link from {} failed: {}", asset.id, source.id, e);
                Err(Error::LinkFailed {
                    asset: Box::new(asset),
                    source: Box::new(e),
                })
            }
        }
    }

    /// Update the asset's last seen time to now
    pub fn update_asset_last_seen(&self, id: u64) -> Result<()> {
        self.repository.touch_asset_last_seen(id)
    }

    pub fn update_relation_last_seen(&self, id: u64) -> Result<()> {
        self.repository.touch_relation_last_seen(id)
    }

    pub fn delete_asset(&self, id: u64) -> Result<()> {
        self.repository.delete_asset(id)
    }

    pub fn delete_relation(&self, id: u64) -> Result<()> {
        self.repository.delete_relation(id)
    }

    /// Find assets with the same content key, last seen at or after `since`
    pub fn find_by_content(&self, asset: &Asset, since: Since) -> Result<Vec<AssetRecord>> {
        self.repository.find_asset_by_content(asset, since)
    }

    pub fn find_by_id(&self, id: u64, since: Since) -> Result<AssetRecord> {
        self.repository.find_asset_by_id(id, since)
    }

    /// Find assets matching any of the scope constraints
    pub fn find_by_scope(&self, constraints: &[Asset], since: Since) -> Result<Vec<AssetRecord>> {
        self.repository.find_asset_by_scope(constraints, since)
    }

    pub fn find_by_type(&self, asset_type: AssetType, since: Since) -> Result<Vec<AssetRecord>> {
        self.repository.find_asset_by_type(asset_type, since)
    }

    /// Link two existing assets. Repeated calls create repeated relations.
    pub fn link(&self, source: &AssetRecord, relation: &str, destination: &AssetRecord) -> Result<RelationRecord> {
        self.repository.link(source, relation, destination)
    }

    pub fn incoming_relations(
        &self,
        asset: &AssetRecord,
        since: Since,
        relation_types: &[&str],
    ) -> Result<Vec<RelationRecord>> {
        self.repository.incoming_relations(asset, since, relation_types)
    }

    pub fn outgoing_relations(
        &self,
        asset: &AssetRecord,
        since: Since,
        relation_types: &[&str],
    ) -> Result<Vec<RelationRecord>> {
        self.repository.outgoing_relations(asset, since, relation_types)
    }

    /// Run a raw SQL query, returning rows as JSON objects
    pub fn raw_query(&self, query: &str) -> Result<Vec<RawRow>> {
        self.repository.raw_query(query)
    }

    /// Run a raw SQL query and deserialize each row into `T`
    pub fn raw_query_as<T: DeserializeOwned>(&self, query: &str) -> Result<Vec<T>> {
        self.raw_query(query)?
            .into_iter()
            .map(|row| {
                serde_json::from_value(serde_json::Value::Object(row))
                    .map_err(|source| Error::RowShape { source })
            })
            .collect()
    }

    /// Query the assets table: `SELECT ... FROM assets <constraints>`
    pub fn asset_query(&self, constraints: &str) -> Result<Vec<AssetRecord>> {
        self.repository.asset_query(constraints)
    }

    /// Query the relations table: `SELECT ... FROM relations <constraints>`
    pub fn relation_query(&self, constraints: &str) -> Result<Vec<RelationRecord>> {
        self.repository.relation_query(constraints)
    }

    pub fn stats(&self) -> Result<RepositoryStats> {
        self.repository.stats()
    }
}

//! # assetdb - Typed Asset Graph Store
//!
//! Persistence layer for security-relevant entities and the typed,
//! timestamped relations between them.
//!
//! assetdb provides:
//! - A closed set of asset kinds (domains, IPs, certificates, people, ...)
//!   stored behind one uniform row shape
//! - Content-key deduplication so the same real-world asset is stored once
//! - Directed relation records with incoming/outgoing traversal
//! - A backend-agnostic `Repository` contract with a SQLite implementation
//! - The `AssetDb` facade composing those operations into workflows

pub mod asset;
pub mod record;
pub mod repository;
pub mod storage;
pub mod assetdb;
pub mod config;
pub mod ui;

// Re-exports for convenient access
pub use asset::{Asset, AssetType, AssetVariant, ContentFilter, ContentKey, KeyValue};
pub use record::{AssetRecord, RelationRecord};
pub use repository::{RawRow, Repository, RepositoryStats, Since};
pub use storage::SqliteRepository;
pub use assetdb::AssetDb;

/// Result type alias for assetdb operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for assetdb operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The type tag is outside the closed variant set
    #[error("Unknown asset type: {0}")]
    UnknownAssetType(String),

    /// The payload could not be decoded for a known type
    #[error("Malformed {asset_type} content: {source}")]
    MalformedContent {
        asset_type: AssetType,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to encode {asset_type} content: {source}")]
    Encode {
        asset_type: AssetType,
        #[source]
        source: serde_json::Error,
    },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: u64 },

    #[error("Constraint violation in {operation}: {source}")]
    ConstraintViolation {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Storage error in {operation}: {source}")]
    Backend {
        operation: &'static str,
        #[source]
        source: rusqlite::Error,
    },

    /// The asset was committed but linking it to its source failed
    #[error("Asset {} created but link failed: {source}", .asset.id)]
    LinkFailed {
        asset: Box<AssetRecord>,
        #[source]
        source: Box<Error>,
    },

    /// A raw query row did not fit the requested result shape
    #[error("Query row does not match result type: {source}")]
    RowShape {
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid stored timestamp: {0}")]
    InvalidTimestamp(i64),
}

impl Error {
    /// Wrap a backend error with the logical operation that produced it.
    ///
    /// SQLite constraint failures surface as `ConstraintViolation`; everything
    /// else is passed through as `Backend`.
    pub fn backend(operation: &'static str) -> impl FnOnce(rusqlite::Error) -> Error {
        move |source| match source.sqlite_error_code() {
            Some(rusqlite::ErrorCode::ConstraintViolation) => {
                Error::ConstraintViolation { operation, source }
            }
            _ => Error::Backend { operation, source },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

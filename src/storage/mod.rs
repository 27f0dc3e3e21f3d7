//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - assets(id, created_at, last_seen, type, content)
//! - relations(id, created_at, last_seen, type, from_asset_id, to_asset_id)
//!
//! Timestamps are stored as integer microseconds since the Unix epoch and
//! content payloads as JSON text, queried through SQLite's JSON functions.

pub mod schema;
pub mod sqlite;

pub use sqlite::{SqliteOptions, SqliteRepository};

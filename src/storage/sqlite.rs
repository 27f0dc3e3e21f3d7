//! SQLite repository implementation

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use chrono::{DateTime, SubsecRound, Utc};
use rusqlite::types::{ToSqlOutput, Type, ValueRef};
use rusqlite::{params, params_from_iter, Connection, Row, ToSql, TransactionBehavior};

use super::schema::{self, ASSET_COLUMNS, RELATION_COLUMNS};
use crate::asset::{Asset, AssetType, ContentFilter, KeyValue};
use crate::record::{AssetRecord, RelationRecord};
use crate::repository::{effective_since, RawRow, Repository, RepositoryStats, Since};
use crate::{Error, Result};

type SqlParams = Vec<Box<dyn ToSql>>;

/// Connection settings for the SQLite backend.
///
/// Foreign keys are always enforced; relation cleanup on asset deletion
/// depends on them.
#[derive(Debug, Clone)]
pub struct SqliteOptions {
    /// How long a writer waits on a locked database before failing
    pub busy_timeout: Duration,
}

impl Default for SqliteOptions {
    fn default() -> Self {
        Self {
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

/// Helper to acquire the connection lock, recovering from poisoning
fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("SQLite connection mutex was poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

/// Current time at the precision timestamps are stored with
fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

impl ToSql for KeyValue {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            KeyValue::Text(s) => s.to_sql(),
            KeyValue::Integer(n) => n.to_sql(),
        }
    }
}

/// SQLite-backed asset repository.
///
/// The connection sits behind a mutex so one repository can be shared
/// between threads; writes that must be atomic run in immediate
/// transactions.
pub struct SqliteRepository {
    conn: Mutex<Connection>,
    db_path: Option<PathBuf>,
}

impl SqliteRepository {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, &SqliteOptions::default())
    }

    /// Open a database file with explicit connection settings
    pub fn open_with(path: &Path, options: &SqliteOptions) -> Result<Self> {
        tracing::info!("Opening asset database at {}", path.display());
        let conn = Connection::open(path).map_err(Error::backend("open"))?;
        if let Err(e) = conn.pragma_update(None, "journal_mode", "WAL") {
            tracing::debug!("Keeping default journal mode for {}: {}", path.display(), e);
        }
        let repo = Self {
            conn: Mutex::new(conn),
            db_path: Some(path.to_path_buf()),
        };
        repo.initialize(options)?;
        Ok(repo)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        Self::open_in_memory_with(&SqliteOptions::default())
    }

    pub fn open_in_memory_with(options: &SqliteOptions) -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(Error::backend("open"))?;
        let repo = Self {
            conn: Mutex::new(conn),
            db_path: None,
        };
        repo.initialize(options)?;
        Ok(repo)
    }

    /// Path of the database file (None for in-memory)
    pub fn db_path(&self) -> Option<&Path> {
        self.db_path.as_deref()
    }

    /// Apply connection settings and create the schema
    fn initialize(&self, options: &SqliteOptions) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        conn.pragma_update(None, "foreign_keys", true)
            .map_err(Error::backend("initialize"))?;
        conn.busy_timeout(options.busy_timeout)
            .map_err(Error::backend("initialize"))?;

        for stmt in schema::all_schema_statements() {
            conn.execute(stmt, []).map_err(Error::backend("initialize"))?;
        }
        Ok(())
    }

    // ========== Row Mapping ==========

    fn timestamp_at(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
        let micros: i64 = row.get(idx)?;
        DateTime::from_timestamp_micros(micros).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                Type::Integer,
                Box::new(Error::InvalidTimestamp(micros)),
            )
        })
    }

    fn row_to_asset(row: &Row) -> rusqlite::Result<AssetRecord> {
        Ok(AssetRecord {
            id: row.get::<_, i64>(0)? as u64,
            created_at: Self::timestamp_at(row, 1)?,
            last_seen: Self::timestamp_at(row, 2)?,
            asset_type: row.get(3)?,
            content: row.get(4)?,
        })
    }

    fn row_to_relation(row: &Row) -> rusqlite::Result<RelationRecord> {
        Ok(RelationRecord {
            id: row.get::<_, i64>(0)? as u64,
            created_at: Self::timestamp_at(row, 1)?,
            last_seen: Self::timestamp_at(row, 2)?,
            relation_type: row.get(3)?,
            from_asset_id: row.get::<_, i64>(4)? as u64,
            to_asset_id: row.get::<_, i64>(5)? as u64,
        })
    }

    fn value_to_json(value: ValueRef<'_>) -> serde_json::Value {
        match value {
            ValueRef::Null => serde_json::Value::Null,
            ValueRef::Integer(n) => n.into(),
            ValueRef::Real(f) => serde_json::Number::from_f64(f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            ValueRef::Text(t) => String::from_utf8_lossy(t).into_owned().into(),
            ValueRef::Blob(b) => b.iter().copied().collect::<Vec<u8>>().into(),
        }
    }

    // ========== Query Helpers ==========

    /// Builds the condition matching one content filter
    fn content_condition(filter: &ContentFilter, params: &mut SqlParams) -> String {
        params.push(Box::new(filter.asset_type.as_str()));
        params.push(Box::new(filter.key.json_path()));
        params.push(Box::new(filter.key.value.clone()));
        "(type = ? AND json_extract(content, ?) = ?)".to_string()
    }

    /// Appends the since filter on `last_seen` if one is in effect
    fn since_condition(since: Since, conditions: &mut Vec<String>, params: &mut SqlParams) {
        if let Some(since) = effective_since(since) {
            conditions.push("last_seen >= ?".to_string());
            params.push(Box::new(since.timestamp_micros()));
        }
    }

    fn where_clause(conditions: &[String]) -> String {
        if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        }
    }

    fn select_assets(
        conn: &Connection,
        operation: &'static str,
        sql: &str,
        params: &[Box<dyn ToSql>],
    ) -> Result<Vec<AssetRecord>> {
        let mut stmt = conn.prepare(sql).map_err(Error::backend(operation))?;
        let records = stmt
            .query_map(params_from_iter(params.iter()), Self::row_to_asset)
            .map_err(Error::backend(operation))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::backend(operation))?;
        Ok(records)
    }

    fn select_relations(
        conn: &Connection,
        operation: &'static str,
        sql: &str,
        params: &[Box<dyn ToSql>],
    ) -> Result<Vec<RelationRecord>> {
        let mut stmt = conn.prepare(sql).map_err(Error::backend(operation))?;
        let records = stmt
            .query_map(params_from_iter(params.iter()), Self::row_to_relation)
            .map_err(Error::backend(operation))?
            .collect::<rusqlite::Result<Vec<_>>>()
            .map_err(Error::backend(operation))?;
        Ok(records)
    }

    fn asset_exists(conn: &Connection, operation: &'static str, id: u64) -> Result<bool> {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM assets WHERE id = ?1)",
            [id as i64],
            |row| row.get(0),
        )
        .map_err(Error::backend(operation))
    }

    fn relations_for(
        &self,
        operation: &'static str,
        endpoint_column: &str,
        asset: &AssetRecord,
        since: Since,
        relation_types: &[&str],
    ) -> Result<Vec<RelationRecord>> {
        let mut conditions = vec![format!("{} = ?", endpoint_column)];
        let mut params: SqlParams = vec![Box::new(asset.id as i64)];

        if !relation_types.is_empty() {
            let placeholders = vec!["?"; relation_types.len()].join(", ");
            conditions.push(format!("type IN ({})", placeholders));
            params.extend(
                relation_types
                    .iter()
                    .map(|t| Box::new(t.to_string()) as Box<dyn ToSql>),
            );
        }
        Self::since_condition(since, &mut conditions, &mut params);

        let sql = format!(
            "SELECT {RELATION_COLUMNS} FROM relations {} ORDER BY id",
            Self::where_clause(&conditions)
        );
        let conn = acquire_lock(&self.conn);
        Self::select_relations(&conn, operation, &sql, &params)
    }

    fn count(conn: &Connection, sql: &str) -> Result<usize> {
        let count: i64 = conn
            .query_row(sql, [], |row| row.get(0))
            .map_err(Error::backend("stats"))?;
        Ok(count as usize)
    }
}

impl Repository for SqliteRepository {
    fn db_type(&self) -> &str {
        "sqlite"
    }

    // ========== Asset Operations ==========

    fn create_asset(&self, asset: &Asset) -> Result<AssetRecord> {
        const OP: &str = "create_asset";
        let filter = asset.content_filter();
        let content = asset.encode()?;

        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(Error::backend(OP))?;

        let mut params = SqlParams::new();
        let condition = Self::content_condition(&filter, &mut params);
        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets WHERE {condition} ORDER BY id LIMIT 1");
        if let Some(existing) = Self::select_assets(&tx, OP, &sql, &params)?.into_iter().next() {
            tx.commit().map_err(Error::backend(OP))?;
            tracing::debug!("Deduplicated {} as asset {}", filter, existing.id);
            return Ok(existing);
        }

        let now = now();
        tx.execute(
            "INSERT INTO assets (created_at, last_seen, type, content) VALUES (?1, ?1, ?2, ?3)",
            params![now.timestamp_micros(), filter.asset_type.as_str(), content],
        )
        .map_err(Error::backend(OP))?;
        let id = tx.last_insert_rowid() as u64;
        tx.commit().map_err(Error::backend(OP))?;

        tracing::debug!("Created asset {} for {}", id, filter);
        Ok(AssetRecord {
            id,
            created_at: now,
            last_seen: now,
            asset_type: filter.asset_type.as_str().to_string(),
            content,
        })
    }

    fn delete_asset(&self, id: u64) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        let deleted = conn
            .execute("DELETE FROM assets WHERE id = ?1", [id as i64])
            .map_err(Error::backend("delete_asset"))?;
        if deleted == 0 {
            return Err(Error::NotFound { entity: "asset", id });
        }
        tracing::debug!("Deleted asset {}", id);
        Ok(())
    }

    fn delete_relation(&self, id: u64) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        let deleted = conn
            .execute("DELETE FROM relations WHERE id = ?1", [id as i64])
            .map_err(Error::backend("delete_relation"))?;
        if deleted == 0 {
            return Err(Error::NotFound { entity: "relation", id });
        }
        tracing::debug!("Deleted relation {}", id);
        Ok(())
    }

    fn touch_asset_last_seen(&self, id: u64) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        let updated = conn
            .execute(
                "UPDATE assets SET last_seen = MAX(last_seen, ?1) WHERE id = ?2",
                params![now().timestamp_micros(), id as i64],
            )
            .map_err(Error::backend("touch_asset_last_seen"))?;
        if updated == 0 {
            return Err(Error::NotFound { entity: "asset", id });
        }
        Ok(())
    }

    fn touch_relation_last_seen(&self, id: u64) -> Result<()> {
        let conn = acquire_lock(&self.conn);
        let updated = conn
            .execute(
                "UPDATE relations SET last_seen = MAX(last_seen, ?1) WHERE id = ?2",
                params![now().timestamp_micros(), id as i64],
            )
            .map_err(Error::backend("touch_relation_last_seen"))?;
        if updated == 0 {
            return Err(Error::NotFound { entity: "relation", id });
        }
        Ok(())
    }

    // ========== Relation Operations ==========

    fn link(&self, from: &AssetRecord, relation_type: &str, to: &AssetRecord) -> Result<RelationRecord> {
        const OP: &str = "link";
        let mut conn = acquire_lock(&self.conn);
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(Error::backend(OP))?;

        for endpoint in [from, to] {
            if !Self::asset_exists(&tx, OP, endpoint.id)? {
                return Err(Error::NotFound { entity: "asset", id: endpoint.id });
            }
        }

        let now = now();
        tx.execute(
            "INSERT INTO relations (created_at, last_seen, type, from_asset_id, to_asset_id) VALUES (?1, ?1, ?2, ?3, ?4)",
            params![now.timestamp_micros(), relation_type, from.id as i64, to.id as i64],
        )
        .map_err(Error::backend(OP))?;
        let id = tx.last_insert_rowid() as u64;
        tx.commit().map_err(Error::backend(OP))?;

        tracing::debug!("Linked {} -[{}]-> {} as relation {}", from.id, relation_type, to.id, id);
        Ok(RelationRecord {
            id,
            created_at: now,
            last_seen: now,
            relation_type: relation_type.to_string(),
            from_asset_id: from.id,
            to_asset_id: to.id,
        })
    }

    fn incoming_relations(
        &self,
        asset: &AssetRecord,
        since: Since,
        relation_types: &[&str],
    ) -> Result<Vec<RelationRecord>> {
        self.relations_for("incoming_relations", "to_asset_id", asset, since, relation_types)
    }

    fn outgoing_relations(
        &self,
        asset: &AssetRecord,
        since: Since,
        relation_types: &[&str],
    ) -> Result<Vec<RelationRecord>> {
        self.relations_for("outgoing_relations", "from_asset_id", asset, since, relation_types)
    }

    // ========== Asset Queries ==========

    fn find_asset_by_content(&self, asset: &Asset, since: Since) -> Result<Vec<AssetRecord>> {
        let mut params = SqlParams::new();
        let mut conditions = vec![Self::content_condition(&asset.content_filter(), &mut params)];
        Self::since_condition(since, &mut conditions, &mut params);

        let sql = format!(
            "SELECT {ASSET_COLUMNS} FROM assets {} ORDER BY id",
            Self::where_clause(&conditions)
        );
        let conn = acquire_lock(&self.conn);
        Self::select_assets(&conn, "find_asset_by_content", &sql, &params)
    }

    fn find_asset_by_id(&self, id: u64, since: Since) -> Result<AssetRecord> {
        let mut conditions = vec!["id = ?".to_string()];
        let mut params: SqlParams = vec![Box::new(id as i64)];
        Self::since_condition(since, &mut conditions, &mut params);

        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets {}", Self::where_clause(&conditions));
        let conn = acquire_lock(&self.conn);
        Self::select_assets(&conn, "find_asset_by_id", &sql, &params)?
            .into_iter()
            .next()
            .ok_or(Error::NotFound { entity: "asset", id })
    }

    fn find_asset_by_type(&self, asset_type: AssetType, since: Since) -> Result<Vec<AssetRecord>> {
        let mut conditions = vec!["type = ?".to_string()];
        let mut params: SqlParams = vec![Box::new(asset_type.as_str())];
        Self::since_condition(since, &mut conditions, &mut params);

        let sql = format!(
            "SELECT {ASSET_COLUMNS} FROM assets {} ORDER BY id",
            Self::where_clause(&conditions)
        );
        let conn = acquire_lock(&self.conn);
        Self::select_assets(&conn, "find_asset_by_type", &sql, &params)
    }

    fn find_asset_by_scope(&self, constraints: &[Asset], since: Since) -> Result<Vec<AssetRecord>> {
        if constraints.is_empty() {
            return Ok(Vec::new());
        }

        let mut params = SqlParams::new();
        let any_of: Vec<String> = constraints
            .iter()
            .map(|c| Self::content_condition(&c.content_filter(), &mut params))
            .collect();
        let mut conditions = vec![format!("({})", any_of.join(" OR "))];
        Self::since_condition(since, &mut conditions, &mut params);

        let sql = format!(
            "SELECT {ASSET_COLUMNS} FROM assets {} ORDER BY id",
            Self::where_clause(&conditions)
        );
        let conn = acquire_lock(&self.conn);
        Self::select_assets(&conn, "find_asset_by_scope", &sql, &params)
    }

    // ========== Escape Hatches ==========

    fn raw_query(&self, query: &str) -> Result<Vec<RawRow>> {
        const OP: &str = "raw_query";
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn.prepare(query).map_err(Error::backend(OP))?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(str::to_string).collect();

        let mut rows = stmt.query([]).map_err(Error::backend(OP))?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().map_err(Error::backend(OP))? {
            let mut out = RawRow::new();
            for (idx, name) in columns.iter().enumerate() {
                let value = row.get_ref(idx).map_err(Error::backend(OP))?;
                out.insert(name.clone(), Self::value_to_json(value));
            }
            results.push(out);
        }
        Ok(results)
    }

    fn asset_query(&self, constraints: &str) -> Result<Vec<AssetRecord>> {
        let sql = format!("SELECT {ASSET_COLUMNS} FROM assets {constraints}");
        tracing::debug!("Asset query: {}", sql);
        let conn = acquire_lock(&self.conn);
        Self::select_assets(&conn, "asset_query", &sql, &[])
    }

    fn relation_query(&self, constraints: &str) -> Result<Vec<RelationRecord>> {
        let sql = format!("SELECT {RELATION_COLUMNS} FROM relations {constraints}");
        tracing::debug!("Relation query: {}", sql);
        let conn = acquire_lock(&self.conn);
        Self::select_relations(&conn, "relation_query", &sql, &[])
    }

    fn stats(&self) -> Result<RepositoryStats> {
        let conn = acquire_lock(&self.conn);
        let mut stmt = conn
            .prepare("SELECT type, COUNT(*) FROM assets GROUP BY type ORDER BY type")
            .map_err(Error::backend("stats"))?;
        let assets_by_type = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)? as usize)))
            .map_err(Error::backend("stats"))?
            .collect::<rusqlite::Result<_>>()
            .map_err(Error::backend("stats"))?;

        Ok(RepositoryStats {
            assets: Self::count(&conn, "SELECT COUNT(*) FROM assets")?,
            relations: Self::count(&conn, "SELECT COUNT(*) FROM relations")?,
            assets_by_type,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::asset::{AutonomousSystem, Fqdn, IpAddress, Netblock, Organization};
    use std::thread::sleep;

    fn fqdn(name: &str) -> Asset {
        Fqdn::new(name).into()
    }

    fn ip(addr: &str) -> Asset {
        IpAddress::new(addr.parse().unwrap()).into()
    }

    fn pause() {
        sleep(Duration::from_millis(3));
    }

    #[test]
    fn test_create_and_find_by_id() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        let created = repo.create_asset(&fqdn("example.com")).unwrap();
        assert_eq!(created.created_at, created.last_seen);

        let found = repo.find_asset_by_id(created.id, None).unwrap();
        assert_eq!(found, created);
        assert_eq!(found.decode().unwrap(), fqdn("example.com"));
    }

    #[test]
    fn test_create_dedups_on_content_key() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        let first = repo.create_asset(&fqdn("example.com")).unwrap();
        pause();
        let second = repo.create_asset(&fqdn("example.com")).unwrap();
        let other = repo.create_asset(&fqdn("other.com")).unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(first.last_seen, second.last_seen);
        assert_ne!(first.id, other.id);
        assert_eq!(repo.stats().unwrap().assets, 2);
    }

    #[test]
    fn test_dedup_is_per_type() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        let domain = repo.create_asset(&fqdn("Example")).unwrap();
        let org = repo.create_asset(&Organization::new("Example").into()).unwrap();
        assert_ne!(domain.id, org.id);
    }

    #[test]
    fn test_dedup_integer_content_key() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        let a = repo.create_asset(&AutonomousSystem::new(15133).into()).unwrap();
        let b = repo.create_asset(&AutonomousSystem::new(15133).into()).unwrap();
        let c = repo.create_asset(&AutonomousSystem::new(15169).into()).unwrap();
        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
    }

    #[test]
    fn test_dedup_uses_canonical_cidr() {
        let repo = SqliteRepository::open_in_memory().unwrap();

        let upper = repo.create_asset(&Netblock::new("2001:DB8::/32".parse().unwrap()).into()).unwrap();
        let lower = repo.create_asset(&Netblock::new("2001:db8::/32".parse().unwrap()).into()).unwrap();
        assert_eq!(upper.id, lower.id);
        assert_eq!(repo.stats().unwrap().assets, 1);
    }

    #[test]
    fn test_touch_is_monotonic() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let created = repo.create_asset(&fqdn("example.com")).unwrap();

        let mut previous = created.last_seen;
        for _ in 0..3 {
            pause();
            repo.touch_asset_last_seen(created.id).unwrap();
            let current = repo.find_asset_by_id(created.id, None).unwrap();
            assert!(current.last_seen >= previous);
            assert_eq!(current.created_at, created.created_at);
            previous = current.last_seen;
        }
        assert!(previous > created.last_seen);
    }

    #[test]
    fn test_touch_missing_asset() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let err = repo.touch_asset_last_seen(42).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "asset", id: 42 }));
    }

    #[test]
    fn test_delete_asset() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let created = repo.create_asset(&fqdn("example.com")).unwrap();

        repo.delete_asset(created.id).unwrap();
        assert!(repo.find_asset_by_id(created.id, None).unwrap_err().is_not_found());
        assert!(repo.delete_asset(created.id).unwrap_err().is_not_found());
    }

    #[test]
    fn test_delete_asset_cascades_relations() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let a = repo.create_asset(&fqdn("example.com")).unwrap();
        let b = repo.create_asset(&ip("93.184.216.34")).unwrap();
        repo.link(&a, "a_record", &b).unwrap();

        repo.delete_asset(b.id).unwrap();
        assert!(repo.outgoing_relations(&a, None, &[]).unwrap().is_empty());
        assert_eq!(repo.stats().unwrap().relations, 0);
    }

    #[test]
    fn test_link_requires_endpoints() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let a = repo.create_asset(&fqdn("example.com")).unwrap();
        let mut ghost = a.clone();
        ghost.id = 999;

        let err = repo.link(&a, "a_record", &ghost).unwrap_err();
        assert!(matches!(err, Error::NotFound { entity: "asset", id: 999 }));
        assert_eq!(repo.stats().unwrap().relations, 0);
    }

    #[test]
    fn test_link_is_additive_and_allows_self_loops() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let a = repo.create_asset(&fqdn("example.com")).unwrap();

        let first = repo.link(&a, "node", &a).unwrap();
        let second = repo.link(&a, "node", &a).unwrap();
        assert_ne!(first.id, second.id);
        assert!(first.is_self_loop());
        assert_eq!(repo.outgoing_relations(&a, None, &["node"]).unwrap().len(), 2);
    }

    #[test]
    fn test_relation_traversal() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let a = repo.create_asset(&fqdn("example.com")).unwrap();
        let b = repo.create_asset(&ip("93.184.216.34")).unwrap();
        let rel = repo.link(&a, "resolves_to", &b).unwrap();

        let outgoing = repo.outgoing_relations(&a, None, &[]).unwrap();
        assert_eq!(outgoing, vec![rel.clone()]);
        assert!(repo.incoming_relations(&a, None, &[]).unwrap().is_empty());

        let incoming = repo.incoming_relations(&b, None, &["resolves_to", "hosts"]).unwrap();
        assert_eq!(incoming.len(), 1);
        assert!(incoming[0].connects(&a, &b));
        assert!(repo.incoming_relations(&b, None, &["hosts"]).unwrap().is_empty());
    }

    #[test]
    fn test_relation_since_filter_and_touch() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let a = repo.create_asset(&fqdn("example.com")).unwrap();
        let b = repo.create_asset(&ip("93.184.216.34")).unwrap();
        let rel = repo.link(&a, "resolves_to", &b).unwrap();

        pause();
        let cutoff = now();
        assert!(repo.outgoing_relations(&a, Some(cutoff), &[]).unwrap().is_empty());

        pause();
        repo.touch_relation_last_seen(rel.id).unwrap();
        let touched = repo.outgoing_relations(&a, Some(cutoff), &[]).unwrap();
        assert_eq!(touched.len(), 1);
        assert!(touched[0].last_seen > rel.last_seen);
        assert_eq!(touched[0].created_at, rel.created_at);
    }

    #[test]
    fn test_find_by_content_and_since() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let created = repo.create_asset(&ip("93.184.216.34")).unwrap();
        repo.create_asset(&ip("192.0.2.1")).unwrap();

        let found = repo.find_asset_by_content(&ip("93.184.216.34"), None).unwrap();
        assert_eq!(found, vec![created.clone()]);

        pause();
        let cutoff = now();
        assert!(repo.find_asset_by_content(&ip("93.184.216.34"), Some(cutoff)).unwrap().is_empty());
        assert!(repo.find_asset_by_id(created.id, Some(cutoff)).unwrap_err().is_not_found());

        // The epoch means no lower bound
        let unbounded = repo
            .find_asset_by_content(&ip("93.184.216.34"), Some(DateTime::<Utc>::UNIX_EPOCH))
            .unwrap();
        assert_eq!(unbounded.len(), 1);
    }

    #[test]
    fn test_find_by_type() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.create_asset(&fqdn("a.example.com")).unwrap();
        pause();
        let cutoff = now();
        pause();
        let later = repo.create_asset(&fqdn("b.example.com")).unwrap();
        repo.create_asset(&ip("192.0.2.1")).unwrap();

        assert_eq!(repo.find_asset_by_type(AssetType::Fqdn, None).unwrap().len(), 2);
        assert_eq!(repo.find_asset_by_type(AssetType::Fqdn, Some(cutoff)).unwrap(), vec![later]);
        assert!(repo.find_asset_by_type(AssetType::Person, None).unwrap().is_empty());
    }

    #[test]
    fn test_find_by_scope_is_union() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let a = repo.create_asset(&fqdn("example.com")).unwrap();
        let b = repo.create_asset(&ip("93.184.216.34")).unwrap();
        repo.create_asset(&fqdn("other.com")).unwrap();

        let scope = vec![fqdn("example.com"), ip("93.184.216.34"), fqdn("example.com")];
        let found = repo.find_asset_by_scope(&scope, None).unwrap();
        assert_eq!(found, vec![a, b]);

        assert!(repo.find_asset_by_scope(&[], None).unwrap().is_empty());
    }

    #[test]
    fn test_asset_and_relation_query() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let a = repo.create_asset(&fqdn("example.com")).unwrap();
        let b = repo.create_asset(&ip("93.184.216.34")).unwrap();
        repo.link(&a, "resolves_to", &b).unwrap();

        let ips = repo.asset_query("WHERE type = 'IPAddress'").unwrap();
        assert_eq!(ips, vec![b.clone()]);

        let rels = repo.relation_query(&format!("WHERE to_asset_id = {}", b.id)).unwrap();
        assert_eq!(rels.len(), 1);
        assert_eq!(rels[0].relation_type, "resolves_to");

        assert!(matches!(
            repo.asset_query("WHERE no_such_column = 1").unwrap_err(),
            Error::Backend { operation: "asset_query", .. }
        ));
    }

    #[test]
    fn test_raw_query() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.create_asset(&fqdn("example.com")).unwrap();

        let rows = repo
            .raw_query("SELECT id, type, json_extract(content, '$.name') AS name FROM assets")
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["type"], "FQDN");
        assert_eq!(rows[0]["name"], "example.com");
        assert_eq!(rows[0]["id"], 1);
    }

    #[test]
    fn test_stats() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.create_asset(&fqdn("a.example.com")).unwrap();
        repo.create_asset(&fqdn("b.example.com")).unwrap();
        repo.create_asset(&ip("192.0.2.1")).unwrap();

        let stats = repo.stats().unwrap();
        assert_eq!(stats.assets, 3);
        assert_eq!(stats.assets_by_type["FQDN"], 2);
        assert_eq!(stats.assets_by_type["IPAddress"], 1);
        assert_eq!(repo.db_type(), "sqlite");
    }

    #[test]
    fn test_corrupt_tag_is_reported_on_decode() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        repo.raw_query(
            "INSERT INTO assets (created_at, last_seen, type, content) VALUES (0, 0, 'not-a-real-type', '{}') RETURNING id",
        )
        .unwrap();

        let records = repo.asset_query("WHERE type = 'not-a-real-type'").unwrap();
        assert_eq!(records.len(), 1);
        assert!(matches!(records[0].decode(), Err(Error::UnknownAssetType(_))));
    }

    #[test]
    fn test_foreign_keys_are_enforced() {
        let repo = SqliteRepository::open_in_memory_with(&SqliteOptions {
            busy_timeout: Duration::from_millis(100),
        })
        .unwrap();

        let rows = repo.raw_query("PRAGMA foreign_keys").unwrap();
        assert_eq!(rows[0]["foreign_keys"], 1);

        let err = repo
            .raw_query(
                "INSERT INTO relations (created_at, last_seen, type, from_asset_id, to_asset_id) VALUES (1, 1, 'a_record', 98, 99)",
            )
            .unwrap_err();
        assert!(matches!(err, Error::ConstraintViolation { operation: "raw_query", .. }));
        assert_eq!(repo.stats().unwrap().relations, 0);
    }

    #[test]
    fn test_out_of_range_timestamp_is_reported() {
        let repo = SqliteRepository::open_in_memory().unwrap();
        let created = repo.create_asset(&fqdn("example.com")).unwrap();
        repo.raw_query(&format!(
            "UPDATE assets SET last_seen = {} WHERE id = {}",
            i64::MAX,
            created.id
        ))
        .unwrap();

        let err = repo.find_asset_by_id(created.id, None).unwrap_err();
        let cause = match err {
            Error::Backend {
                operation: "find_asset_by_id",
                source: rusqlite::Error::FromSqlConversionFailure(2, Type::Integer, cause),
            } => cause,
            other => panic!("expected a conversion failure, got {other:?}"),
        };
        assert!(matches!(cause.downcast_ref::<Error>(), Some(Error::InvalidTimestamp(i64::MAX))));
    }
}

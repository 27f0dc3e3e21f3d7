//! Database schema definitions

/// SQL to create the assets table
pub const CREATE_ASSETS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS assets (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at INTEGER NOT NULL,
    last_seen INTEGER NOT NULL,
    type TEXT NOT NULL,
    content TEXT NOT NULL
)
"#;

/// SQL to create the relations table
/// Relations are removed together with either endpoint
pub const CREATE_RELATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS relations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    created_at INTEGER NOT NULL,
    last_seen INTEGER NOT NULL,
    type TEXT NOT NULL,
    from_asset_id INTEGER NOT NULL REFERENCES assets(id) ON DELETE CASCADE,
    to_asset_id INTEGER NOT NULL REFERENCES assets(id) ON DELETE CASCADE
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_assets_type ON assets(type)",
    "CREATE INDEX IF NOT EXISTS idx_assets_last_seen ON assets(last_seen)",
    "CREATE INDEX IF NOT EXISTS idx_relations_from ON relations(from_asset_id)",
    "CREATE INDEX IF NOT EXISTS idx_relations_to ON relations(to_asset_id)",
    "CREATE INDEX IF NOT EXISTS idx_relations_type ON relations(type)",
];

/// Column list used whenever asset rows are read
pub const ASSET_COLUMNS: &str = "id, created_at, last_seen, type, content";

/// Column list used whenever relation rows are read
pub const RELATION_COLUMNS: &str = "id, created_at, last_seen, type, from_asset_id, to_asset_id";

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_ASSETS_TABLE, CREATE_RELATIONS_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}

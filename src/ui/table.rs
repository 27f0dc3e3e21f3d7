use tabled::{settings::Style, Table, Tabled};

use crate::record::{AssetRecord, RelationRecord};
use crate::repository::RepositoryStats;

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Tabled)]
struct AssetRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "Type")]
    asset_type: String,
    #[tabled(rename = "Key")]
    key: String,
    #[tabled(rename = "Created")]
    created_at: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl From<&AssetRecord> for AssetRow {
    fn from(record: &AssetRecord) -> Self {
        // Corrupt rows are still listed, with the raw payload as their key
        let key = match record.decode() {
            Ok(asset) => asset.content_key().value.to_string(),
            Err(_) => record.content.clone(),
        };
        Self {
            id: record.id,
            asset_type: record.asset_type.clone(),
            key,
            created_at: record.created_at.format(TIME_FORMAT).to_string(),
            last_seen: record.last_seen.format(TIME_FORMAT).to_string(),
        }
    }
}

#[derive(Tabled)]
struct RelationRow {
    #[tabled(rename = "ID")]
    id: u64,
    #[tabled(rename = "From")]
    from: u64,
    #[tabled(rename = "Type")]
    relation_type: String,
    #[tabled(rename = "To")]
    to: u64,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl From<&RelationRecord> for RelationRow {
    fn from(record: &RelationRecord) -> Self {
        Self {
            id: record.id,
            from: record.from_asset_id,
            relation_type: record.relation_type.clone(),
            to: record.to_asset_id,
            last_seen: record.last_seen.format(TIME_FORMAT).to_string(),
        }
    }
}

#[derive(Tabled)]
struct StatRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
}

pub fn asset_table(records: &[AssetRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let rows: Vec<AssetRow> = records.iter().map(AssetRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn relation_table(records: &[RelationRecord]) -> String {
    if records.is_empty() {
        return String::new();
    }
    let rows: Vec<RelationRow> = records.iter().map(RelationRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn stats_table(stats: &RepositoryStats) -> String {
    let mut rows = vec![
        StatRow {
            metric: "Assets".to_string(),
            value: stats.assets.to_string(),
        },
        StatRow {
            metric: "Relations".to_string(),
            value: stats.relations.to_string(),
        },
    ];
    rows.extend(stats.assets_by_type.iter().map(|(asset_type, count)| StatRow {
        metric: format!("  {}", asset_type),
        value: count.to_string(),
    }));
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_asset_table_shows_content_key() {
        let now = Utc::now();
        let record = AssetRecord {
            id: 3,
            created_at: now,
            last_seen: now,
            asset_type: "FQDN".into(),
            content: r#"{"name":"example.com"}"#.into(),
        };

        let table = asset_table(&[record]);
        assert!(table.contains("example.com"));
        assert!(table.contains("FQDN"));
        assert!(asset_table(&[]).is_empty());
    }
}

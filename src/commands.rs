use std::path::{Path, PathBuf};

use anyhow::Context as _;
use chrono::{DateTime, Utc};
use owo_colors::OwoColorize;

use crate::{OutputMode, emit_success};
use assetdb::config::{default_config_path, ensure_db_dir, load_config, write_config, AssetDbConfig};
use assetdb::ui::{self, Icons};
use assetdb::{Asset, AssetDb, AssetType, RelationRecord, Since};

/// Settings shared by every subcommand
pub struct Context {
    pub output: OutputMode,
    pub database: Option<String>,
    pub config: Option<PathBuf>,
}

impl Context {
    fn load_config(&self) -> anyhow::Result<AssetDbConfig> {
        let config = load_config(self.config.as_deref())?.unwrap_or_default();
        Ok(config.with_database(self.database.clone()))
    }

    fn open(&self) -> anyhow::Result<AssetDb> {
        let config = self.load_config()?;
        let database = config.database_path();
        ensure_db_dir(Path::new(&database))?;

        tracing::debug!("Opening asset database at {}", database);
        let db = AssetDb::open(&config).with_context(|| format!("failed to open {}", database))?;
        Ok(db)
    }
}

fn parse_since(since: Option<&str>) -> anyhow::Result<Since> {
    since
        .map(|s| {
            DateTime::parse_from_rfc3339(s)
                .map(|t| t.with_timezone(&Utc))
                .with_context(|| format!("invalid --since timestamp: {}", s))
        })
        .transpose()
}

fn parse_asset(asset_type: &str, content: &str) -> anyhow::Result<Asset> {
    let asset_type = AssetType::parse_loose(asset_type)?;
    Ok(Asset::decode(asset_type, content)?)
}

pub fn run_init(ctx: &Context, force: bool) -> anyhow::Result<()> {
    let path = ctx.config.clone().unwrap_or_else(default_config_path);
    let config = AssetDbConfig {
        database: Some(ctx.load_config()?.database_path()),
        busy_timeout_ms: Some(5000),
    };
    write_config(&path, &config, force)?;

    if ctx.output.is_human() {
        ui::success(&format!("Wrote {}", path.display()));
        ui::info("database", &config.database_path());
    } else {
        emit_success(ctx.output, "init", serde_json::json!({
            "config": path.display().to_string(),
            "database": config.database_path(),
        }))?;
    }
    Ok(())
}

pub fn run_types(ctx: &Context) -> anyhow::Result<()> {
    let tags: Vec<&str> = AssetType::all().iter().map(AssetType::as_str).collect();
    if ctx.output.is_human() {
        ui::header(Icons::INFO, &format!("{} asset types", tags.len()));
        for tag in &tags {
            println!("  {}", tag.style(ui::theme().tag.clone()));
        }
    } else {
        emit_success(ctx.output, "types", tags)?;
    }
    Ok(())
}

pub fn run_create(
    ctx: &Context,
    asset_type: &str,
    content: &str,
    from: Option<u64>,
    relation: Option<&str>,
) -> anyhow::Result<()> {
    let asset = parse_asset(asset_type, content)?;
    let db = ctx.open()?;

    let source = from.map(|id| db.find_by_id(id, None)).transpose()?;
    let record = db.create(source.as_ref(), relation.unwrap_or_default(), asset)?;

    if ctx.output.is_human() {
        ui::header(Icons::NEW, &format!("Asset {}", record.id));
        println!("{}", ui::asset_table(std::slice::from_ref(&record)));
        if let (Some(source), Some(relation)) = (&source, relation.filter(|r| !r.is_empty())) {
            let label = relation.style(ui::theme().relation);
            ui::summary_row("linked:", &format!("{} -[{}]-> {}", source.id, label, record.id));
        }
    } else {
        emit_success(ctx.output, "create", &record)?;
    }
    Ok(())
}

pub fn run_link(ctx: &Context, from: u64, relation: &str, to: u64) -> anyhow::Result<()> {
    let db = ctx.open()?;
    let source = db.find_by_id(from, None)?;
    let destination = db.find_by_id(to, None)?;
    let record = db.link(&source, relation, &destination)?;

    if ctx.output.is_human() {
        ui::header(Icons::LINK, &format!("Relation {} ({})", record.id, relation.style(ui::theme().relation)));
        println!("{}", ui::relation_table(std::slice::from_ref(&record)));
    } else {
        emit_success(ctx.output, "link", &record)?;
    }
    Ok(())
}

pub fn run_touch(ctx: &Context, id: u64, relation: bool) -> anyhow::Result<()> {
    let db = ctx.open()?;
    let entity = if relation {
        db.update_relation_last_seen(id)?;
        "relation"
    } else {
        db.update_asset_last_seen(id)?;
        "asset"
    };

    if ctx.output.is_human() {
        ui::success(&format!("{} Touched {} {}", Icons::CLOCK, entity, id));
    } else {
        emit_success(ctx.output, "touch", serde_json::json!({ "entity": entity, "id": id }))?;
    }
    Ok(())
}

pub fn run_delete_asset(ctx: &Context, id: u64) -> anyhow::Result<()> {
    let db = ctx.open()?;
    db.delete_asset(id)?;

    if ctx.output.is_human() {
        ui::success(&format!("{} Deleted asset {} and its relations", Icons::DEL, id));
    } else {
        emit_success(ctx.output, "delete-asset", serde_json::json!({ "id": id }))?;
    }
    Ok(())
}

pub fn run_delete_relation(ctx: &Context, id: u64) -> anyhow::Result<()> {
    let db = ctx.open()?;
    db.delete_relation(id)?;

    if ctx.output.is_human() {
        ui::success(&format!("{} Deleted relation {}", Icons::DEL, id));
    } else {
        emit_success(ctx.output, "delete-relation", serde_json::json!({ "id": id }))?;
    }
    Ok(())
}

pub fn run_get(ctx: &Context, id: u64, since: Option<&str>) -> anyhow::Result<()> {
    let since = parse_since(since)?;
    let db = ctx.open()?;
    let record = db.find_by_id(id, since)?;

    if ctx.output.is_human() {
        ui::header(Icons::SEARCH, &format!("Asset {}", record.id));
        println!("{}", ui::asset_table(std::slice::from_ref(&record)));
        match record.decode() {
            Ok(asset) => {
                let content: serde_json::Value = serde_json::from_str(&record.content)?;
                ui::section(&asset.to_string());
                println!("{}", serde_json::to_string_pretty(&content)?);
            }
            Err(e) => ui::warn(&e.to_string()),
        }
    } else {
        emit_success(ctx.output, "get", &record)?;
    }
    Ok(())
}

pub fn run_find(
    ctx: &Context,
    asset_type: &str,
    content: Option<&str>,
    since: Option<&str>,
) -> anyhow::Result<()> {
    let since = parse_since(since)?;
    let db = ctx.open()?;

    let records = match content {
        Some(content) => db.find_by_content(&parse_asset(asset_type, content)?, since)?,
        None => db.find_by_type(AssetType::parse_loose(asset_type)?, since)?,
    };

    if ctx.output.is_human() {
        if records.is_empty() {
            println!("{} {}", Icons::EMPTY, ui::dim("No matching assets"));
        } else {
            ui::header(Icons::SEARCH, &format!("{} assets", records.len()));
            println!("{}", ui::asset_table(&records));
        }
    } else {
        emit_success(ctx.output, "find", &records)?;
    }
    Ok(())
}

pub fn run_relations(
    ctx: &Context,
    id: u64,
    incoming: bool,
    types: &[String],
    since: Option<&str>,
) -> anyhow::Result<()> {
    let since = parse_since(since)?;
    let db = ctx.open()?;
    let asset = db.find_by_id(id, None)?;

    let types: Vec<&str> = types.iter().map(String::as_str).collect();
    let relations: Vec<RelationRecord> = if incoming {
        db.incoming_relations(&asset, since, &types)?
    } else {
        db.outgoing_relations(&asset, since, &types)?
    };

    if ctx.output.is_human() {
        let (icon, direction) = if incoming { (Icons::LEFT, "incoming") } else { (Icons::RIGHT, "outgoing") };
        if relations.is_empty() {
            println!("{} {}", Icons::EMPTY, ui::dim(&format!("No {} relations for asset {}", direction, id)));
        } else {
            ui::header(icon, &format!("{} {} relations for asset {}", relations.len(), direction, id));
            println!("{}", ui::relation_table(&relations));
        }
    } else {
        emit_success(ctx.output, "relations", &relations)?;
    }
    Ok(())
}

pub fn run_query(ctx: &Context, constraints: &str, relations: bool) -> anyhow::Result<()> {
    let db = ctx.open()?;

    if relations {
        let records = db.relation_query(constraints)?;
        if ctx.output.is_human() {
            ui::header(Icons::LINK, &format!("{} relations", records.len()));
            println!("{}", ui::relation_table(&records));
        } else {
            emit_success(ctx.output, "query", &records)?;
        }
    } else {
        let records = db.asset_query(constraints)?;
        if ctx.output.is_human() {
            ui::header(Icons::SEARCH, &format!("{} assets", records.len()));
            println!("{}", ui::asset_table(&records));
        } else {
            emit_success(ctx.output, "query", &records)?;
        }
    }
    Ok(())
}

pub fn run_sql(ctx: &Context, query: &str) -> anyhow::Result<()> {
    let db = ctx.open()?;
    let rows = db.raw_query(query)?;

    if ctx.output.is_human() {
        ui::header(Icons::DATABASE, &format!("{} rows", rows.len()));
        for row in &rows {
            println!("{}", serde_json::to_string(row)?);
        }
    } else {
        emit_success(ctx.output, "sql", &rows)?;
    }
    Ok(())
}

pub fn run_stats(ctx: &Context) -> anyhow::Result<()> {
    let db = ctx.open()?;
    let stats = db.stats()?;

    if ctx.output.is_human() {
        ui::header(Icons::STATS, &format!("{} database", db.db_type()));
        println!("{}", ui::stats_table(&stats));
    } else {
        emit_success(ctx.output, "stats", &stats)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_since() {
        assert!(parse_since(None).unwrap().is_none());

        let since = parse_since(Some("2024-01-01T00:00:00+02:00")).unwrap().unwrap();
        assert_eq!(since.to_rfc3339(), "2023-12-31T22:00:00+00:00");

        assert!(parse_since(Some("yesterday")).is_err());
    }

    #[test]
    fn test_parse_asset() {
        let asset = parse_asset("fqdn", r#"{"name":"example.com"}"#).unwrap();
        assert_eq!(asset.asset_type(), AssetType::Fqdn);

        assert!(parse_asset("Spaceship", "{}").is_err());
        assert!(parse_asset("FQDN", "not json").is_err());
    }
}

use assetdb::asset::{AutonomousSystem, EmailAddress, Fqdn, IpAddress, Netblock};
use assetdb::config::{default_database_path_in, ensure_db_dir, load_config, AssetDbConfig};
use assetdb::{Asset, AssetDb, AssetType, Error};
use std::collections::BTreeSet;
use std::thread;

fn ip(addr: &str) -> IpAddress {
    IpAddress::new(addr.parse().unwrap())
}

#[test]
fn discovery_chain_is_traversable_both_ways() {
    let db = AssetDb::open_in_memory().unwrap();

    let domain = db.create(None, "", Fqdn::new("example.com")).unwrap();
    let address = db.create(Some(&domain), "a_record", ip("93.184.216.34")).unwrap();
    let netblock = db
        .create(Some(&address), "contains", Netblock::new("93.184.216.0/24".parse().unwrap()))
        .unwrap();
    let asn = db.create(Some(&netblock), "announced_by", AutonomousSystem::new(15133)).unwrap();

    let out = db.outgoing_relations(&domain, None, &[]).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].to_asset_id, address.id);

    let incoming = db.incoming_relations(&address, None, &["a_record"]).unwrap();
    assert_eq!(incoming.len(), 1);
    assert_eq!(incoming[0].from_asset_id, domain.id);

    // Walk the chain from the domain to the ASN
    let mut current = domain.clone();
    for _ in 0..3 {
        let next = db.outgoing_relations(&current, None, &[]).unwrap();
        assert_eq!(next.len(), 1);
        current = db.find_by_id(next[0].to_asset_id, None).unwrap();
    }
    assert_eq!(current, asn);
    assert_eq!(current.decode().unwrap(), Asset::from(AutonomousSystem::new(15133)));
}

#[test]
fn rediscovery_returns_the_same_record() {
    let db = AssetDb::open_in_memory().unwrap();

    let first = db.create(None, "", Fqdn::new("example.com")).unwrap();
    let second = db.create(None, "", Fqdn::new("example.com")).unwrap();
    assert_eq!(first.id, second.id);

    let found = db.find_by_content(&Fqdn::new("example.com").into(), None).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(db.stats().unwrap().assets, 1);
}

#[test]
fn scope_lookup_unions_constraints() {
    let db = AssetDb::open_in_memory().unwrap();

    let domain = db.create(None, "", Fqdn::new("example.com")).unwrap();
    let email = db.create(None, "", EmailAddress::new("admin@example.com")).unwrap();
    db.create(None, "", Fqdn::new("other.org")).unwrap();

    let scope: Vec<Asset> = vec![
        Fqdn::new("example.com").into(),
        EmailAddress::new("admin@example.com").into(),
        Fqdn::new("not-stored.net").into(),
    ];
    let ids: Vec<u64> = db.find_by_scope(&scope, None).unwrap().iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![domain.id, email.id]);

    assert!(db.find_by_scope(&[], None).unwrap().is_empty());
}

#[test]
fn deleting_an_asset_removes_its_edges() {
    let db = AssetDb::open_in_memory().unwrap();

    let domain = db.create(None, "", Fqdn::new("example.com")).unwrap();
    let address = db.create(Some(&domain), "a_record", ip("192.0.2.10")).unwrap();

    db.delete_asset(address.id).unwrap();

    assert!(db.outgoing_relations(&domain, None, &[]).unwrap().is_empty());
    assert!(db.find_by_id(address.id, None).unwrap_err().is_not_found());
    assert_eq!(db.stats().unwrap().relations, 0);
}

#[test]
fn file_backed_database_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = default_database_path_in(dir.path());
    ensure_db_dir(&path).unwrap();

    let config = AssetDbConfig {
        database: Some(path.display().to_string()),
        busy_timeout_ms: Some(1000),
    };

    let (domain_id, relation_id) = {
        let db = AssetDb::open(&config).unwrap();
        let domain = db.create(None, "", Fqdn::new("example.com")).unwrap();
        let address = db.create(Some(&domain), "a_record", ip("2001:db8::1")).unwrap();
        let rels = db.outgoing_relations(&domain, None, &[]).unwrap();
        assert_eq!(rels[0].to_asset_id, address.id);
        (domain.id, rels[0].id)
    };

    let db = AssetDb::open(&config).unwrap();
    let domain = db.find_by_id(domain_id, None).unwrap();
    assert_eq!(domain.asset_type().unwrap(), AssetType::Fqdn);

    let rels = db.outgoing_relations(&domain, None, &[]).unwrap();
    assert_eq!(rels.len(), 1);
    assert_eq!(rels[0].id, relation_id);

    let stats = db.stats().unwrap();
    assert_eq!(stats.assets_by_type.get("IPAddress"), Some(&1));
}

#[test]
fn link_failure_reports_the_committed_asset() {
    let db = AssetDb::open_in_memory().unwrap();

    let source = db.create(None, "", Fqdn::new("gone.example.com")).unwrap();
    db.delete_asset(source.id).unwrap();

    match db.create(Some(&source), "a_record", ip("198.51.100.7")) {
        Err(Error::LinkFailed { asset, source: cause }) => {
            assert!(cause.is_not_found());
            let retry = db.create(None, "", ip("198.51.100.7")).unwrap();
            assert_eq!(retry.id, asset.id);
        }
        other => panic!("expected LinkFailed, got {other:?}"),
    }
}

#[test]
fn concurrent_creates_on_one_file_dedup_to_one_record() {
    let dir = tempfile::tempdir().unwrap();
    let path = default_database_path_in(dir.path());
    ensure_db_dir(&path).unwrap();
    let config = AssetDbConfig {
        database: Some(path.display().to_string()),
        busy_timeout_ms: Some(10_000),
    };

    // Separate handles mean separate connections racing on the same file
    let handles = [AssetDb::open(&config).unwrap(), AssetDb::open(&config).unwrap()];

    let ids: BTreeSet<u64> = thread::scope(|scope| {
        let workers: Vec<_> = (0..4)
            .map(|worker| {
                let db = &handles[worker % handles.len()];
                scope.spawn(move || {
                    (0..25)
                        .map(|_| db.create(None, "", Fqdn::new("race.example.com")).unwrap().id)
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        workers.into_iter().flat_map(|w| w.join().unwrap()).collect()
    });

    assert_eq!(ids.len(), 1);
    assert_eq!(handles[0].stats().unwrap().assets, 1);
}

#[test]
fn deletion_cascades_even_with_foreign_keys_disabled_in_config() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("assetdb.toml");
    let db_path = dir.path().join("assets.db");
    std::fs::write(
        &config_path,
        format!("database = {:?}\nforeign_keys = false\n", db_path.display().to_string()),
    )
    .unwrap();

    let config = load_config(Some(&config_path)).unwrap().unwrap();
    let db = AssetDb::open(&config).unwrap();

    let a = db.create(None, "", Fqdn::new("example.com")).unwrap();
    let b = db.create(Some(&a), "a_record", ip("192.0.2.20")).unwrap();
    db.delete_asset(b.id).unwrap();

    assert!(db.outgoing_relations(&a, None, &[]).unwrap().is_empty());
    assert_eq!(db.stats().unwrap().relations, 0);
}

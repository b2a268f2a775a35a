use std::sync::Arc;

use certificate_runtime::{
    pipeline::CertificateRecord,
    storage::{CertificateFilter, CertificateStore, JsonKvStorage, JsonKvStorageConfig, KvStorage},
};
use chrono::NaiveDate;
use tempfile::TempDir;

fn kv_config(dir: &TempDir) -> JsonKvStorageConfig {
    JsonKvStorageConfig {
        working_dir: dir.path().into(),
        namespace: "certificates".to_string(),
        workspace: None,
    }
}

fn record(owner: &str, organization: &str, (y, m, d): (i32, u32, u32)) -> CertificateRecord {
    CertificateRecord {
        owner_name: owner.to_string(),
        date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
        expiry_date: None,
        organization: organization.to_string(),
        skills: vec!["Scrum Framework".to_string()],
    }
}

#[tokio::test]
async fn saved_certificate_is_echoed_and_persisted() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let kv = Arc::new(JsonKvStorage::new(kv_config(&dir)));
    kv.initialize().await?;
    let store = CertificateStore::new(kv.clone());

    let saved = store
        .save(record("Jane Doe", "Scrum Alliance", (2022, 6, 5)))
        .await?;
    assert!(!saved.id.is_empty());

    let echoed = serde_json::to_value(&saved)?;
    assert_eq!(echoed["_id"], saved.id.as_str());
    assert_eq!(echoed["owner_name"], "Jane Doe");
    assert_eq!(echoed["date"], "2022-06-05");
    assert!(echoed["expiry_date"].is_null());

    let on_disk: serde_json::Value = serde_json::from_slice(&std::fs::read(
        dir.path().join("kv_store_certificates.json"),
    )?)?;
    assert!(on_disk[saved.id.as_str()].get("create_time").is_some());

    let reopened = Arc::new(JsonKvStorage::new(kv_config(&dir)));
    reopened.initialize().await?;

    let listed = CertificateStore::new(reopened)
        .list(&CertificateFilter::default())
        .await?;
    assert_eq!(listed, vec![saved]);
    Ok(())
}

#[tokio::test]
async fn list_filters_by_organization_and_orders_newest_first() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let kv = Arc::new(JsonKvStorage::new(kv_config(&dir)));
    kv.initialize().await?;
    let store = CertificateStore::new(kv);

    store.save(record("A", "AWS", (2021, 1, 1))).await?;
    store.save(record("B", "AWS", (2023, 1, 1))).await?;
    store.save(record("C", "Unknown", (2022, 1, 1))).await?;

    let all = store.list(&CertificateFilter::default()).await?;
    let owners: Vec<&str> = all.iter().map(|c| c.record.owner_name.as_str()).collect();
    assert_eq!(owners, vec!["B", "C", "A"]);

    let aws = store
        .list(&CertificateFilter {
            organization: Some("AWS".into()),
        })
        .await?;
    assert_eq!(aws.len(), 2);
    assert!(aws.iter().all(|c| c.record.organization == "AWS"));
    Ok(())
}

#[tokio::test]
async fn unsynced_upserts_are_flushed_on_finalize() -> anyhow::Result<()> {
    let dir = TempDir::new()?;
    let kv = JsonKvStorage::new(kv_config(&dir));
    kv.initialize().await?;

    let mut records = std::collections::HashMap::new();
    records.insert("cert-1".to_string(), serde_json::json!({"owner_name": "Jane"}));
    records.insert("cert-2".to_string(), serde_json::json!({"owner_name": "John"}));
    kv.upsert(records).await?;
    kv.finalize().await?;

    let reopened = JsonKvStorage::new(kv_config(&dir));
    reopened.initialize().await?;
    let all = reopened.get_all().await?;
    assert_eq!(all.len(), 2);
    assert_eq!(all["cert-2"]["owner_name"], "John");
    assert_eq!(all["cert-2"]["_id"], "cert-2");
    Ok(())
}

use std::{collections::HashMap, sync::Arc};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::pipeline::CertificateRecord;

use super::KvStorage;

/// A persisted certificate: the record plus its store-assigned identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCertificate {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(flatten)]
    pub record: CertificateRecord,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CertificateFilter {
    pub organization: Option<String>,
}

impl CertificateFilter {
    fn matches(&self, certificate: &StoredCertificate) -> bool {
        self.organization
            .as_deref()
            .is_none_or(|org| certificate.record.organization == org)
    }
}

/// Insert-and-echo document store for certificate records.
#[derive(Clone)]
pub struct CertificateStore {
    storage: Arc<dyn KvStorage>,
}

impl CertificateStore {
    pub fn new(storage: Arc<dyn KvStorage>) -> Self {
        Self { storage }
    }

    pub async fn save(&self, record: CertificateRecord) -> Result<StoredCertificate> {
        let stored = StoredCertificate {
            id: Uuid::new_v4().to_string(),
            record,
        };

        let value = serde_json::to_value(&stored.record)
            .context("failed to serialize certificate record")?;
        let mut payload = HashMap::new();
        payload.insert(stored.id.clone(), value);

        self.storage.upsert(payload).await?;
        self.storage.sync_if_dirty().await?;

        info!(id = %stored.id, owner = %stored.record.owner_name, "certificate saved");
        Ok(stored)
    }

    /// Stored certificates matching `filter`, newest certification date first.
    pub async fn list(&self, filter: &CertificateFilter) -> Result<Vec<StoredCertificate>> {
        let mut certificates: Vec<StoredCertificate> = self
            .storage
            .get_all()
            .await?
            .into_iter()
            .filter_map(|(id, value)| match serde_json::from_value::<StoredCertificate>(value) {
                Ok(certificate) => Some(certificate),
                Err(err) => {
                    warn!(id = %id, error = %err, "skipping unreadable certificate record");
                    None
                }
            })
            .filter(|certificate| filter.matches(certificate))
            .collect();

        certificates.sort_by(|a, b| {
            b.record
                .date
                .cmp(&a.record.date)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(certificates)
    }
}

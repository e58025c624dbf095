//! Data sources the search aggregator reads from.

use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::search::records::{ActivityLog, ArchivedItem, InventoryItem};

/// Backend collaborator holding the clinic's records.
#[async_trait]
pub trait ClinicDataSource: Send + Sync {
    async fn inventory_items(&self) -> anyhow::Result<Vec<InventoryItem>>;
    async fn archived_items(&self) -> anyhow::Result<Vec<ArchivedItem>>;
    async fn activity_logs(&self) -> anyhow::Result<Vec<ActivityLog>>;
}

/// Full dataset, as loaded from a seed file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedData {
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub archives: Vec<ArchivedItem>,
    #[serde(default)]
    pub logs: Vec<ActivityLog>,
}

// == In-Memory Data Source ==
#[derive(Debug, Default)]
pub struct InMemoryDataSource {
    data: RwLock<SeedData>,
}

impl InMemoryDataSource {
    pub fn new(data: SeedData) -> Self {
        Self {
            data: RwLock::new(data),
        }
    }

    /// Loads a JSON seed file.
    pub async fn from_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("reading seed file {}", path.display()))?;
        let data: SeedData = serde_json::from_str(&raw)
            .with_context(|| format!("parsing seed file {}", path.display()))?;

        info!(
            inventory = data.inventory.len(),
            archives = data.archives.len(),
            logs = data.logs.len(),
            "seed data loaded"
        );
        Ok(Self::new(data))
    }

    /// Inserts or replaces an inventory item by id. Returns true on insert.
    pub async fn upsert_inventory_item(&self, item: InventoryItem) -> bool {
        let mut data = self.data.write().await;
        match data.inventory.iter_mut().find(|i| i.id == item.id) {
            Some(existing) => {
                *existing = item;
                false
            }
            None => {
                data.inventory.push(item);
                true
            }
        }
    }
}

#[async_trait]
impl ClinicDataSource for InMemoryDataSource {
    async fn inventory_items(&self) -> anyhow::Result<Vec<InventoryItem>> {
        Ok(self.data.read().await.inventory.clone())
    }

    async fn archived_items(&self) -> anyhow::Result<Vec<ArchivedItem>> {
        Ok(self.data.read().await.archives.clone())
    }

    async fn activity_logs(&self) -> anyhow::Result<Vec<ActivityLog>> {
        Ok(self.data.read().await.logs.clone())
    }
}

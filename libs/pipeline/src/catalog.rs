use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::NaiveTime;
use prodmon_api::{BoxFuture, MasterDataEntry, MasterDataLookup, MonitorError};
use serde::Deserialize;

use crate::error::PipelineError;

/// Fixed master-data set, keyed by product id. Built once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Catalog {
    entries: BTreeMap<i64, MasterDataEntry>,
}

#[derive(Deserialize)]
struct CatalogFile {
    products: Vec<MasterDataEntry>,
}

impl Default for Catalog {
    fn default() -> Self {
        let entry = |product_id, name: &str, hour| MasterDataEntry {
            product_id,
            product_name: name.to_string(),
            target_time: NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or_default(),
        };
        Self {
            entries: [entry(1, "Product A", 12), entry(2, "Product B", 16)]
                .into_iter()
                .map(|e| (e.product_id, e))
                .collect(),
        }
    }
}

impl Catalog {
    pub fn new(products: Vec<MasterDataEntry>) -> Result<Self, PipelineError> {
        let mut entries = BTreeMap::new();
        for p in products {
            if p.product_id < 1 {
                return Err(PipelineError::CatalogInvalid(format!(
                    "product_id must be >= 1, got {}",
                    p.product_id
                )));
            }
            let id = p.product_id;
            if entries.insert(id, p).is_some() {
                return Err(PipelineError::CatalogInvalid(format!("duplicate product_id {id}")));
            }
        }
        if entries.is_empty() {
            return Err(PipelineError::CatalogInvalid("no products".into()));
        }
        Ok(Self { entries })
    }

    /// Load `[[products]]` tables from a TOML file.
    pub fn load(path: &str) -> Result<Self, PipelineError> {
        let content = std::fs::read_to_string(path).map_err(|source| PipelineError::CatalogRead {
            path: path.to_string(),
            source,
        })?;
        let file: CatalogFile = toml::from_str(&content).map_err(|source| PipelineError::CatalogParse {
            path: path.to_string(),
            source,
        })?;
        Self::new(file.products)
    }

    pub fn get(&self, product_id: i64) -> Option<&MasterDataEntry> {
        self.entries.get(&product_id)
    }

    /// Entries in product id order.
    pub fn entries(&self) -> impl Iterator<Item = &MasterDataEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// In-process lookup over a [`Catalog`].
pub struct CatalogLookup {
    catalog: Arc<Catalog>,
}

impl CatalogLookup {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }
}

impl MasterDataLookup for CatalogLookup {
    fn get_target(&self, product_id: i64) -> BoxFuture<'_, Result<MasterDataEntry, MonitorError>> {
        let found = self.catalog.get(product_id).cloned();
        Box::pin(async move { found.ok_or(MonitorError::LookupNotFound(product_id)) })
    }
}

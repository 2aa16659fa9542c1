use std::future::Future;
use std::pin::Pin;

use serde::{Deserialize, Serialize};

use crate::error::MonitorError;
use crate::types::MasterDataEntry;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Row returned by a store query: loosely typed column values in
/// select order (numbers as floats, timestamps as strings).
pub type Row = Vec<serde_json::Value>;

// ════════════════════════════════════════════════════════════════
//  Store command protocol
// ════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreOperation {
    Exec,
    Query,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreMetadata {
    pub sql: String,
    /// JSON-encoded array of positional parameters (`$1`, `$2`, ...).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub params: String,
}

/// Generic exec/query command understood by the store binding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreCommand {
    pub operation: StoreOperation,
    pub metadata: StoreMetadata,
    #[serde(default)]
    pub data: serde_json::Map<String, serde_json::Value>,
}

impl StoreCommand {
    pub fn exec(sql: impl Into<String>, params: &[serde_json::Value]) -> Self {
        Self::new(StoreOperation::Exec, sql.into(), params)
    }

    pub fn query(sql: impl Into<String>, params: &[serde_json::Value]) -> Self {
        Self::new(StoreOperation::Query, sql.into(), params)
    }

    fn new(operation: StoreOperation, sql: String, params: &[serde_json::Value]) -> Self {
        let params = if params.is_empty() {
            String::new()
        } else {
            serde_json::Value::Array(params.to_vec()).to_string()
        };
        Self {
            operation,
            metadata: StoreMetadata { sql, params },
            data: serde_json::Map::new(),
        }
    }

    /// Decode `metadata.params` back into values.
    pub fn params(&self) -> Result<Vec<serde_json::Value>, MonitorError> {
        if self.metadata.params.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&self.metadata.params).map_err(|e| MonitorError::StoreRejected {
            status: 400,
            body: format!("params: {e}"),
        })
    }
}

// ════════════════════════════════════════════════════════════════
//  Collaborator traits
// ════════════════════════════════════════════════════════════════

/// Publish side of the at-least-once pub/sub channel.
///
/// Fire-and-forget: `Ok` means the transport accepted the message, nothing more.
pub trait Broker: Send + Sync {
    fn publish(&self, topic: &str, envelope: Vec<u8>) -> BoxFuture<'_, Result<(), MonitorError>>;
}

/// Durable relational store reached through exec/query commands.
///
/// Callers own SQL construction and row parsing.
pub trait StoreGateway: Send + Sync {
    fn exec(&self, command: StoreCommand) -> BoxFuture<'_, Result<(), MonitorError>>;

    fn query(&self, command: StoreCommand) -> BoxFuture<'_, Result<Vec<Row>, MonitorError>>;
}

/// Authoritative target-time lookup keyed by product id.
pub trait MasterDataLookup: Send + Sync {
    fn get_target(&self, product_id: i64) -> BoxFuture<'_, Result<MasterDataEntry, MonitorError>>;
}

/// Consumer of one delivered envelope. Invoked concurrently for
/// distinct deliveries.
pub trait EventHandler: Send + Sync {
    fn handle<'a>(&'a self, envelope: &'a [u8]) -> BoxFuture<'a, Result<(), MonitorError>>;
}

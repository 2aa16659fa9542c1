//! In-memory store binding speaking the exec/query command protocol.
//!
//! Rows come back the way the postgres binding returns them: integers
//! as JSON floats, timestamps as strings.

mod sql;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, NaiveDateTime};
use tokio::sync::RwLock;

use prodmon_api::{BoxFuture, MonitorError, Row, StoreCommand, StoreGateway, StoreOperation};

use sql::{Column, ColumnType, Expr, Statement};

struct Table {
    columns: Vec<Column>,
    rows: Vec<Row>,
    next_serial: i64,
}

impl Table {
    fn new(columns: Vec<Column>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
            next_serial: 1,
        }
    }

    fn insert(&mut self, columns: &[String], values: Vec<serde_json::Value>) -> Result<(), String> {
        for name in columns {
            if !self.columns.iter().any(|c| c.name == *name) {
                return Err(format!("column \"{name}\" does not exist"));
            }
        }
        let mut row = Vec::with_capacity(self.columns.len());
        for col in &self.columns {
            let value = match columns.iter().position(|c| *c == col.name) {
                Some(i) => coerce(col, values[i].clone())?,
                None if col.ty == ColumnType::Serial => {
                    let id = self.next_serial;
                    self.next_serial += 1;
                    serde_json::json!(id as f64)
                }
                None => serde_json::Value::Null,
            };
            row.push(value);
        }
        self.rows.push(row);
        Ok(())
    }

    fn select(&self, order_by: Option<&(String, bool)>, limit: Option<usize>) -> Result<Vec<Row>, String> {
        let mut rows = self.rows.clone();
        if let Some((col, desc)) = order_by {
            let idx = self
                .columns
                .iter()
                .position(|c| c.name == *col)
                .ok_or_else(|| format!("column \"{col}\" does not exist"))?;
            // Rows are already in insertion order; a stable sort keeps ties that way.
            if *desc {
                rows.sort_by(|a, b| compare(&b[idx], &a[idx]));
            } else {
                rows.sort_by(|a, b| compare(&a[idx], &b[idx]));
            }
        }
        if let Some(n) = limit {
            rows.truncate(n);
        }
        Ok(rows)
    }
}

fn coerce(col: &Column, value: serde_json::Value) -> Result<serde_json::Value, String> {
    let bad = |v: &serde_json::Value| format!("invalid input for column \"{}\": {v}", col.name);
    match col.ty {
        ColumnType::Serial | ColumnType::Int => {
            let n = match &value {
                serde_json::Value::Number(n) => n.as_f64(),
                serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                _ => None,
            };
            n.filter(|n| n.fract() == 0.0).map(|n| serde_json::json!(n)).ok_or_else(|| bad(&value))
        }
        ColumnType::Timestamp => match &value {
            serde_json::Value::String(s) if is_timestamp(s) => Ok(value),
            _ => Err(bad(&value)),
        },
        ColumnType::Text => Ok(value),
    }
}

fn is_timestamp(s: &str) -> bool {
    DateTime::parse_from_rfc3339(s).is_ok() || NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f").is_ok()
}

fn compare(a: &serde_json::Value, b: &serde_json::Value) -> std::cmp::Ordering {
    match (a, b) {
        (serde_json::Value::Number(x), serde_json::Value::Number(y)) => {
            x.as_f64().partial_cmp(&y.as_f64()).unwrap_or(std::cmp::Ordering::Equal)
        }
        (serde_json::Value::String(x), serde_json::Value::String(y)) => x.cmp(y),
        _ => std::cmp::Ordering::Equal,
    }
}

// ═══════════════════════════════════════════════════════════════
//  MemoryBinding
// ═══════════════════════════════════════════════════════════════

/// Store gateway backed by process memory. Safe for concurrent use.
#[derive(Default)]
pub struct MemoryBinding {
    tables: RwLock<HashMap<String, Table>>,
    unavailable: AtomicBool,
}

impl MemoryBinding {
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate an outage: every command fails with `StoreUnavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Row count of `table`, `None` if it was never created.
    pub async fn row_count(&self, table: &str) -> Option<usize> {
        self.tables.read().await.get(table).map(|t| t.rows.len())
    }

    async fn run(&self, command: &StoreCommand) -> Result<Vec<Row>, MonitorError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(MonitorError::StoreUnavailable("memory binding offline".into()));
        }
        let statement = sql::parse(&command.metadata.sql).map_err(rejected)?;
        let params = command.params()?;
        match statement {
            Statement::Create { table, if_not_exists, columns } => {
                let mut tables = self.tables.write().await;
                if tables.contains_key(&table) {
                    if if_not_exists {
                        return Ok(Vec::new());
                    }
                    return Err(rejected(format!("relation \"{table}\" already exists")));
                }
                tracing::debug!(table = %table, columns = columns.len(), "created table");
                tables.insert(table, Table::new(columns));
                Ok(Vec::new())
            }
            Statement::Insert { table, columns, values } => {
                if columns.len() != values.len() {
                    return Err(rejected("INSERT has more target columns than expressions"));
                }
                let values = values
                    .into_iter()
                    .map(|e| match e {
                        Expr::Param(n) => params
                            .get(n - 1)
                            .cloned()
                            .ok_or_else(|| format!("there is no parameter ${n}")),
                        Expr::Literal(v) => Ok(v),
                    })
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(rejected)?;
                let mut tables = self.tables.write().await;
                let t = tables.get_mut(&table).ok_or_else(|| missing(&table))?;
                t.insert(&columns, values).map_err(rejected)?;
                Ok(Vec::new())
            }
            Statement::Select { table, order_by, limit } => {
                let tables = self.tables.read().await;
                let t = tables.get(&table).ok_or_else(|| missing(&table))?;
                t.select(order_by.as_ref(), limit).map_err(rejected)
            }
        }
    }
}

fn rejected(body: impl Into<String>) -> MonitorError {
    MonitorError::StoreRejected {
        status: 400,
        body: body.into(),
    }
}

fn missing(table: &str) -> MonitorError {
    rejected(format!("relation \"{table}\" does not exist"))
}

impl StoreGateway for MemoryBinding {
    fn exec(&self, command: StoreCommand) -> BoxFuture<'_, Result<(), MonitorError>> {
        Box::pin(async move {
            if command.operation != StoreOperation::Exec {
                return Err(rejected("exec called with a query command"));
            }
            self.run(&command).await.map(|_| ())
        })
    }

    fn query(&self, command: StoreCommand) -> BoxFuture<'_, Result<Vec<Row>, MonitorError>> {
        Box::pin(async move {
            if command.operation != StoreOperation::Query {
                return Err(rejected("query called with an exec command"));
            }
            self.run(&command).await
        })
    }
}

use std::sync::Arc;

use chrono::SecondsFormat;
use prodmon_api::{
    BoxFuture, EnvelopeCodec, EventHandler, MonitorError, PersistedRecord, ProductionEvent, StoreCommand, StoreGateway,
};

use crate::rows;

/// Idempotent bootstrap of the append-only table.
pub const CREATE_PRODUCTS: &str = "CREATE TABLE IF NOT EXISTS products (
    id SERIAL PRIMARY KEY,
    product_id int,
    created_at TIMESTAMP
);";

const INSERT_PRODUCT: &str = "INSERT INTO products (product_id, created_at) VALUES ($1, $2);";

// ═══════════════════════════════════════════════════════════════
//  ProductRepository: SQL over the store gateway
// ═══════════════════════════════════════════════════════════════

pub struct ProductRepository {
    store: Arc<dyn StoreGateway>,
}

impl ProductRepository {
    pub fn new(store: Arc<dyn StoreGateway>) -> Self {
        Self { store }
    }

    pub async fn init_schema(&self) -> Result<(), MonitorError> {
        self.store.exec(StoreCommand::exec(CREATE_PRODUCTS, &[])).await
    }

    /// Append one record. No deduplication: a redelivered event is stored again.
    pub async fn insert(&self, event: &ProductionEvent) -> Result<(), MonitorError> {
        let params = [
            serde_json::json!(event.product_id),
            serde_json::json!(event.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)),
        ];
        self.store.exec(StoreCommand::exec(INSERT_PRODUCT, &params)).await
    }

    /// The `limit` most recently inserted records, newest (highest id) first.
    pub async fn recent(&self, limit: usize) -> Result<Vec<PersistedRecord>, MonitorError> {
        if limit == 0 {
            return Ok(Vec::new());
        }
        let sql = format!("SELECT * FROM products ORDER BY id DESC LIMIT {limit};");
        let result = self.store.query(StoreCommand::query(sql, &[])).await?;
        let mut records = result
            .iter()
            .map(|row| rows::persisted_record(row))
            .collect::<Result<Vec<_>, _>>()?;
        // Don't trust the store for ordering or limit.
        records.sort_by(|a, b| b.id.cmp(&a.id));
        records.truncate(limit);
        Ok(records)
    }
}

// ═══════════════════════════════════════════════════════════════
//  PersistenceConsumer
// ═══════════════════════════════════════════════════════════════

/// Decodes delivered envelopes and appends them to the store.
pub struct PersistenceConsumer {
    codec: EnvelopeCodec,
    repo: Arc<ProductRepository>,
}

impl PersistenceConsumer {
    pub fn new(codec: EnvelopeCodec, repo: Arc<ProductRepository>) -> Self {
        Self { codec, repo }
    }

    pub async fn store(&self, envelope: &[u8]) -> Result<ProductionEvent, MonitorError> {
        let event = self.codec.decode(envelope)?;
        self.repo.insert(&event).await?;
        tracing::info!(product_id = event.product_id, created_at = %event.created_at, "stored product event");
        Ok(event)
    }
}

impl EventHandler for PersistenceConsumer {
    fn handle<'a>(&'a self, envelope: &'a [u8]) -> BoxFuture<'a, Result<(), MonitorError>> {
        Box::pin(async move { self.store(envelope).await.map(|_| ()) })
    }
}

#[cfg(test)]
mod tests {
    use binding_memory::MemoryBinding;
    use chrono::{TimeZone, Utc};

    use super::*;

    fn event(product_id: i64, hour: u32) -> ProductionEvent {
        ProductionEvent {
            product_id,
            created_at: Utc.with_ymd_and_hms(2026, 10, 17, hour, 0, 0).unwrap(),
        }
    }

    async fn repo() -> (Arc<MemoryBinding>, Arc<ProductRepository>) {
        let binding = Arc::new(MemoryBinding::new());
        let repo = Arc::new(ProductRepository::new(binding.clone()));
        repo.init_schema().await.unwrap();
        (binding, repo)
    }

    #[tokio::test]
    async fn recent_is_newest_first_by_insertion_not_timestamp() {
        let (_, repo) = repo().await;
        repo.insert(&event(1, 20)).await.unwrap();
        repo.insert(&event(2, 3)).await.unwrap();
        repo.insert(&event(1, 20)).await.unwrap();

        let recent = repo.recent(10).await.unwrap();
        assert_eq!(recent.iter().map(|r| r.id).collect::<Vec<_>>(), vec![3, 2, 1]);
        assert_eq!(recent[1].created_at, event(2, 3).created_at);
    }

    #[tokio::test]
    async fn recent_never_exceeds_limit() {
        let (_, repo) = repo().await;
        for i in 0..15 {
            repo.insert(&event(1 + i % 2, (i % 24) as u32)).await.unwrap();
        }
        let recent = repo.recent(10).await.unwrap();
        assert_eq!(recent.len(), 10);
        assert!(recent.windows(2).all(|w| w[0].id >= w[1].id));
        assert_eq!(recent[0].id, 15);
        assert!(repo.recent(0).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn consumer_persists_decoded_event() {
        let (binding, repo) = repo().await;
        let codec = EnvelopeCodec::new("production");
        let consumer = PersistenceConsumer::new(codec.clone(), repo.clone());

        let bytes = codec.encode(&event(2, 9)).unwrap();
        consumer.handle(&bytes).await.unwrap();

        assert_eq!(binding.row_count("products").await, Some(1));
        let stored = &repo.recent(1).await.unwrap()[0];
        assert_eq!((stored.product_id, stored.created_at), (2, event(2, 9).created_at));
    }

    #[tokio::test]
    async fn redelivery_stores_duplicates() {
        let (binding, repo) = repo().await;
        let codec = EnvelopeCodec::new("production");
        let consumer = PersistenceConsumer::new(codec.clone(), repo);

        let bytes = codec.encode(&event(1, 11)).unwrap();
        consumer.handle(&bytes).await.unwrap();
        consumer.handle(&bytes).await.unwrap();

        assert_eq!(binding.row_count("products").await, Some(2));
    }

    #[tokio::test]
    async fn malformed_envelope_stores_nothing() {
        let (binding, repo) = repo().await;
        let consumer = PersistenceConsumer::new(EnvelopeCodec::new("production"), repo);

        let err = consumer.handle(b"{not an envelope").await.unwrap_err();
        assert!(matches!(err, MonitorError::MalformedEnvelope(_)));
        assert_eq!(binding.row_count("products").await, Some(0));
    }

    #[tokio::test]
    async fn store_outage_fails_the_delivery() {
        let (binding, repo) = repo().await;
        let codec = EnvelopeCodec::new("production");
        let consumer = PersistenceConsumer::new(codec.clone(), repo);
        binding.set_unavailable(true);

        let err = consumer.handle(&codec.encode(&event(1, 1)).unwrap()).await.unwrap_err();
        assert!(matches!(err, MonitorError::StoreUnavailable(_)));
    }
}

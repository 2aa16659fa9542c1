use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use prodmon_api::{Broker, Clock, EnvelopeCodec, MonitorError, ProductionEvent};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Sole source of [`ProductionEvent`]s.
pub struct Producer {
    broker: Arc<dyn Broker>,
    codec: EnvelopeCodec,
    clock: Arc<dyn Clock>,
    rng: StdRng,
    max_product_id: i64,
    topic: String,
}

impl Producer {
    /// `seed` fixes the sequence of product ids and timestamps.
    pub fn new(
        broker: Arc<dyn Broker>,
        codec: EnvelopeCodec,
        clock: Arc<dyn Clock>,
        topic: impl Into<String>,
        max_product_id: i64,
        seed: Option<u64>,
    ) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            broker,
            codec,
            clock,
            rng,
            max_product_id: max_product_id.max(1),
            topic: topic.into(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// Uniform product id in `1..=max_product_id`, uniform second of the clock's day.
    pub fn next_event(&mut self) -> ProductionEvent {
        let product_id = self.rng.gen_range(1..=self.max_product_id);
        let created_at = random_time_on(self.clock.today(), &mut self.rng);
        ProductionEvent { product_id, created_at }
    }

    /// Generate and publish one event.
    pub async fn tick(&mut self) -> Result<ProductionEvent, MonitorError> {
        let event = self.next_event();
        let envelope = self.codec.encode(&event)?;
        self.broker.publish(&self.topic, envelope).await?;
        tracing::info!(
            product_id = event.product_id,
            created_at = %event.created_at,
            topic = %self.topic,
            "published product"
        );
        Ok(event)
    }
}

fn random_time_on(day: NaiveDate, rng: &mut impl Rng) -> DateTime<Utc> {
    let secs = rng.gen_range(0..86_400u32);
    let time = NaiveTime::from_num_seconds_from_midnight_opt(secs, 0).unwrap_or(NaiveTime::MIN);
    day.and_time(time).and_utc()
}

/// Run the producer until `token` is cancelled. Publish failures are logged
/// and the loop moves on. Returns the number of events published.
pub fn spawn_producer(mut producer: Producer, interval: Duration, token: CancellationToken) -> JoinHandle<u64> {
    tokio::spawn(async move {
        let mut published = 0u64;
        tracing::info!(topic = %producer.topic(), interval_ms = interval.as_millis() as u64, "producer started");
        loop {
            match producer.tick().await {
                Ok(_) => published += 1,
                Err(e) => tracing::error!(error = %e, kind = %e.kind(), "publish failed"),
            }
            tokio::select! {
                _ = tokio::time::sleep(interval) => {}
                _ = token.cancelled() => break,
            }
        }
        tracing::info!(published, "producer stopped");
        published
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use chrono::TimeZone;
    use prodmon_api::{BoxFuture, FixedClock};

    use super::*;

    #[derive(Default)]
    struct Capture {
        sent: Mutex<Vec<(String, Vec<u8>)>>,
        fail: bool,
    }

    impl Broker for Capture {
        fn publish(&self, topic: &str, envelope: Vec<u8>) -> BoxFuture<'_, Result<(), MonitorError>> {
            let topic = topic.to_string();
            Box::pin(async move {
                if self.fail {
                    return Err(MonitorError::Transport("connection refused".into()));
                }
                self.sent.lock().unwrap().push((topic, envelope));
                Ok(())
            })
        }
    }

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock(Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()))
    }

    fn producer(broker: Arc<Capture>, seed: u64) -> Producer {
        Producer::new(broker, EnvelopeCodec::new("production"), clock(), "products", 2, Some(seed))
    }

    #[test]
    fn events_stay_within_range_and_day() {
        let mut p = producer(Arc::new(Capture::default()), 7);
        let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        let mut seen = [false; 2];
        for _ in 0..200 {
            let event = p.next_event();
            assert!((1..=2).contains(&event.product_id));
            assert_eq!(event.created_at.date_naive(), day);
            assert_eq!(event.created_at.timestamp_subsec_nanos(), 0);
            seen[(event.product_id - 1) as usize] = true;
        }
        assert_eq!(seen, [true, true]);
    }

    #[test]
    fn seed_makes_sequence_reproducible() {
        let mut a = producer(Arc::new(Capture::default()), 42);
        let mut b = producer(Arc::new(Capture::default()), 42);
        for _ in 0..10 {
            assert_eq!(a.next_event(), b.next_event());
        }
    }

    #[tokio::test]
    async fn tick_publishes_decodable_envelope() {
        let broker = Arc::new(Capture::default());
        let mut p = producer(broker.clone(), 1);
        let event = p.tick().await.unwrap();

        let sent = broker.sent.lock().unwrap();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "products");
        assert_eq!(EnvelopeCodec::new("x").decode(&sent[0].1).unwrap(), event);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_survives_publish_failures_and_stops_on_cancel() {
        let broker = Arc::new(Capture { fail: true, ..Default::default() });
        let token = CancellationToken::new();
        let handle = spawn_producer(producer(broker, 3), Duration::from_secs(5), token.clone());

        tokio::time::sleep(Duration::from_secs(12)).await;
        token.cancel();
        assert_eq!(handle.await.unwrap(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn loop_publishes_once_per_interval() {
        let broker = Arc::new(Capture::default());
        let token = CancellationToken::new();
        let handle = spawn_producer(producer(broker.clone(), 3), Duration::from_secs(5), token.clone());

        // Ticks at 0s, 5s and 10s.
        tokio::time::sleep(Duration::from_secs(12)).await;
        token.cancel();
        assert_eq!(handle.await.unwrap(), 3);
        assert_eq!(broker.sent.lock().unwrap().len(), 3);
    }
}

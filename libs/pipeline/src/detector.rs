use std::str::FromStr;
use std::sync::Arc;

use chrono::NaiveDate;
use prodmon_api::{
    BoxFuture, Clock, DelayVerdict, EnvelopeCodec, EventHandler, MasterDataEntry, MasterDataLookup, MonitorError,
    ProductionEvent,
};

/// Which calendar day a time-of-day target is placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AnchorPolicy {
    /// The monitor's current date when the event is checked.
    #[default]
    Today,
    /// The date of the event's own `created_at`.
    EventDate,
}

impl FromStr for AnchorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "today" => Ok(AnchorPolicy::Today),
            "event-date" | "event_date" => Ok(AnchorPolicy::EventDate),
            other => Err(format!("unknown anchor policy '{other}' (today | event-date)")),
        }
    }
}

impl std::fmt::Display for AnchorPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnchorPolicy::Today => f.write_str("today"),
            AnchorPolicy::EventDate => f.write_str("event-date"),
        }
    }
}

/// On time iff `target >= created_at`; equality counts as on time.
pub fn classify(event: &ProductionEvent, entry: &MasterDataEntry, anchor: NaiveDate) -> DelayVerdict {
    let target_time = entry.target_on(anchor);
    DelayVerdict {
        product_id: event.product_id,
        product_name: entry.product_name.clone(),
        created_at: event.created_at,
        target_time,
        on_time: target_time >= event.created_at,
    }
}

// ═══════════════════════════════════════════════════════════════
//  DelayDetector
// ═══════════════════════════════════════════════════════════════

pub struct DelayDetector {
    codec: EnvelopeCodec,
    lookup: Arc<dyn MasterDataLookup>,
    policy: AnchorPolicy,
    clock: Arc<dyn Clock>,
}

impl DelayDetector {
    pub fn new(
        codec: EnvelopeCodec,
        lookup: Arc<dyn MasterDataLookup>,
        policy: AnchorPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            codec,
            lookup,
            policy,
            clock,
        }
    }

    pub fn anchor_for(&self, event: &ProductionEvent) -> NaiveDate {
        match self.policy {
            AnchorPolicy::Today => self.clock.today(),
            AnchorPolicy::EventDate => event.created_at.date_naive(),
        }
    }

    /// Look up master data and classify. No verdict without an entry.
    pub async fn check(&self, event: &ProductionEvent) -> Result<DelayVerdict, MonitorError> {
        let entry = self.lookup.get_target(event.product_id).await?;
        let anchor = self.anchor_for(event);
        if anchor != event.created_at.date_naive() {
            // Comparison across days is meaningless; reported, not corrected.
            tracing::warn!(
                product_id = event.product_id,
                anchor = %anchor,
                event_date = %event.created_at.date_naive(),
                policy = %self.policy,
                "event and target anchor fall on different days"
            );
        }
        let verdict = classify(event, &entry, anchor);
        emit(&verdict);
        Ok(verdict)
    }

    pub async fn monitor(&self, envelope: &[u8]) -> Result<DelayVerdict, MonitorError> {
        let event = self.codec.decode(envelope)?;
        tracing::debug!(product_id = event.product_id, created_at = %event.created_at, "message received");
        self.check(&event).await
    }
}

fn emit(verdict: &DelayVerdict) {
    if verdict.on_time {
        tracing::info!(
            product_id = verdict.product_id,
            product = %verdict.product_name,
            created_at = %verdict.created_at,
            target_time = %verdict.target_time,
            on_time = true,
            "production is on time"
        );
    } else {
        tracing::warn!(
            product_id = verdict.product_id,
            product = %verdict.product_name,
            created_at = %verdict.created_at,
            target_time = %verdict.target_time,
            on_time = false,
            "delay detected"
        );
    }
}

impl EventHandler for DelayDetector {
    fn handle<'a>(&'a self, envelope: &'a [u8]) -> BoxFuture<'a, Result<(), MonitorError>> {
        Box::pin(async move { self.monitor(envelope).await.map(|_| ()) })
    }
}

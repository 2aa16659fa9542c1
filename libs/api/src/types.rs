use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;

// ════════════════════════════════════════════════════════════════
//  Events and records
// ════════════════════════════════════════════════════════════════

/// "Product created" event. Immutable once published.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionEvent {
    pub product_id: i64,
    pub created_at: DateTime<Utc>,
}

impl ProductionEvent {
    /// Parse an event body, enforcing `product_id >= 1`.
    pub fn from_json(value: serde_json::Value) -> Result<Self, MonitorError> {
        let event: ProductionEvent = serde_json::from_value(value)
            .map_err(|e| MonitorError::MalformedPayload(e.to_string()))?;
        if event.product_id < 1 {
            return Err(MonitorError::MalformedPayload(format!(
                "product_id must be >= 1, got {}",
                event.product_id
            )));
        }
        Ok(event)
    }
}

/// Row of the append-only `products` table. `id` follows insertion order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersistedRecord {
    pub id: i64,
    pub product_id: i64,
    pub created_at: DateTime<Utc>,
}

/// Authoritative target completion time of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasterDataEntry {
    pub product_id: i64,
    pub product_name: String,
    /// Time of day; the comparison supplies the calendar date.
    pub target_time: NaiveTime,
}

impl MasterDataEntry {
    /// Target as a full timestamp on `anchor`.
    pub fn target_on(&self, anchor: NaiveDate) -> DateTime<Utc> {
        anchor.and_time(self.target_time).and_utc()
    }
}

/// Master-data entry as served over HTTP, target anchored to a calendar day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogProduct {
    pub product_id: i64,
    pub product_name: String,
    pub product_target_time: DateTime<Utc>,
}

impl CatalogProduct {
    pub fn anchored(entry: &MasterDataEntry, anchor: NaiveDate) -> Self {
        Self {
            product_id: entry.product_id,
            product_name: entry.product_name.clone(),
            product_target_time: entry.target_on(anchor),
        }
    }

    /// Drop the anchor date, keeping the time of day.
    pub fn into_entry(self) -> MasterDataEntry {
        MasterDataEntry {
            product_id: self.product_id,
            product_name: self.product_name,
            target_time: self.product_target_time.time(),
        }
    }
}

/// Outcome of cross-checking one event against master data. Never stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DelayVerdict {
    pub product_id: i64,
    pub product_name: String,
    pub created_at: DateTime<Utc>,
    pub target_time: DateTime<Utc>,
    pub on_time: bool,
}

// ════════════════════════════════════════════════════════════════
//  Subscription declarations
// ════════════════════════════════════════════════════════════════

/// Declares that `route` receives messages of `topic` on broker `pubsubname`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub pubsubname: String,
    pub topic: String,
    pub route: String,
}

impl Subscription {
    pub fn new(pubsubname: impl Into<String>, topic: impl Into<String>, route: impl Into<String>) -> Self {
        Self {
            pubsubname: pubsubname.into(),
            topic: topic.into(),
            route: route.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn event_rejects_non_positive_product_id() {
        let err = ProductionEvent::from_json(serde_json::json!({
            "product_id": 0,
            "created_at": "2026-10-17T08:00:00Z"
        }))
        .unwrap_err();
        assert!(matches!(err, MonitorError::MalformedPayload(_)));
    }

    #[test]
    fn event_rejects_missing_field() {
        let err = ProductionEvent::from_json(serde_json::json!({ "product_id": 1 })).unwrap_err();
        assert!(matches!(err, MonitorError::MalformedPayload(_)));
    }

    #[test]
    fn event_accepts_offset_timestamps() {
        let event = ProductionEvent::from_json(serde_json::json!({
            "product_id": 2,
            "created_at": "2026-10-17T10:30:00+02:00"
        }))
        .unwrap();
        assert_eq!(event.created_at, Utc.with_ymd_and_hms(2026, 10, 17, 8, 30, 0).unwrap());
    }

    #[test]
    fn target_is_anchored_on_given_date() {
        let entry = MasterDataEntry {
            product_id: 1,
            product_name: "Product A".into(),
            target_time: NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        };
        let anchor = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
        assert_eq!(entry.target_on(anchor), Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap());
    }

    #[test]
    fn catalog_wire_format_round_trips_time_of_day() {
        let wire: CatalogProduct = serde_json::from_value(serde_json::json!({
            "product_id": 2,
            "product_name": "Product B",
            "product_target_time": "2026-10-17T18:00:00+02:00"
        }))
        .unwrap();
        let entry = wire.into_entry();
        assert_eq!(entry.target_time, NaiveTime::from_hms_opt(16, 0, 0).unwrap());
        assert_eq!(entry.product_name, "Product B");
    }
}

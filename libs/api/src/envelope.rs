use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MonitorError;
use crate::types::ProductionEvent;

pub const SPEC_VERSION: &str = "1.0";
pub const PRODUCT_CREATED: &str = "com.prodmon.product.created";
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Content type under which the sidecar forwards an envelope unchanged.
pub const CLOUDEVENTS_CONTENT_TYPE: &str = "application/cloudevents+json";

/// Structured-mode CloudEvents 1.0 envelope.
///
/// Extension attributes added in transit (`topic`, `pubsubname`,
/// `traceparent`, ...) are kept in `extensions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub specversion: String,
    pub id: String,
    pub source: String,
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datacontenttype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_base64: Option<String>,
    #[serde(flatten)]
    pub extensions: serde_json::Map<String, serde_json::Value>,
}

impl Envelope {
    /// Extract the JSON body regardless of how the producer embedded it.
    pub fn payload(&self) -> Result<serde_json::Value, MonitorError> {
        match (&self.data, &self.data_base64) {
            // JSON carried as a string (some publishers double-encode).
            (Some(serde_json::Value::String(s)), _) => serde_json::from_str(s)
                .map_err(|e| MonitorError::MalformedPayload(format!("data string: {e}"))),
            (Some(serde_json::Value::Null), None) | (None, None) => {
                Err(MonitorError::MalformedPayload("envelope carries no data".into()))
            }
            (Some(v), _) if !v.is_null() => Ok(v.clone()),
            (_, Some(b64)) => {
                let bytes = base64::engine::general_purpose::STANDARD
                    .decode(b64)
                    .map_err(|e| MonitorError::MalformedPayload(format!("data_base64: {e}")))?;
                serde_json::from_slice(&bytes)
                    .map_err(|e| MonitorError::MalformedPayload(format!("data_base64 body: {e}")))
            }
            _ => Err(MonitorError::MalformedPayload("envelope carries no data".into())),
        }
    }
}

/// Wraps/unwraps [`ProductionEvent`]s in envelopes.
#[derive(Debug, Clone)]
pub struct EnvelopeCodec {
    source: String,
    event_type: String,
}

impl EnvelopeCodec {
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            event_type: PRODUCT_CREATED.to_string(),
        }
    }

    /// Build the envelope for `event`, stamped with `now`.
    pub fn wrap(&self, event: &ProductionEvent, now: DateTime<Utc>) -> Result<Envelope, MonitorError> {
        let data = serde_json::to_value(event).map_err(|e| MonitorError::MalformedPayload(e.to_string()))?;
        Ok(Envelope {
            specversion: SPEC_VERSION.to_string(),
            id: uuid::Uuid::new_v4().to_string(),
            source: self.source.clone(),
            event_type: self.event_type.clone(),
            datacontenttype: Some(JSON_CONTENT_TYPE.to_string()),
            time: Some(now),
            data: Some(data),
            data_base64: None,
            extensions: serde_json::Map::new(),
        })
    }

    pub fn encode(&self, event: &ProductionEvent) -> Result<Vec<u8>, MonitorError> {
        let envelope = self.wrap(event, Utc::now())?;
        serde_json::to_vec(&envelope).map_err(|e| MonitorError::MalformedEnvelope(e.to_string()))
    }

    /// Parse envelope bytes. Events of any source or type are accepted;
    /// only the payload schema is enforced.
    pub fn decode(&self, bytes: &[u8]) -> Result<ProductionEvent, MonitorError> {
        decode_envelope(bytes).and_then(|env| ProductionEvent::from_json(env.payload()?))
    }
}

/// Parse a structured envelope. Only `specversion` "1.0" is accepted.
pub fn decode_envelope(bytes: &[u8]) -> Result<Envelope, MonitorError> {
    let envelope: Envelope =
        serde_json::from_slice(bytes).map_err(|e| MonitorError::MalformedEnvelope(e.to_string()))?;
    if envelope.specversion != SPEC_VERSION {
        return Err(MonitorError::MalformedEnvelope(format!(
            "unsupported specversion {:?}",
            envelope.specversion
        )));
    }
    if envelope.id.is_empty() {
        return Err(MonitorError::MalformedEnvelope("empty id".into()));
    }
    Ok(envelope)
}

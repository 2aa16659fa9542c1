use serde::Serialize;

/// Category of a pipeline error. Lets the dispatcher decide whether a
/// redelivery can help (skip, retry, fail fast).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input: the delivered bytes will never decode. Skip the message.
    Input,
    /// A downstream collaborator (store, catalog) answered with a failure.
    Downstream,
    /// Network-level failure talking to a collaborator. Transient.
    Transport,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Input => f.write_str("input"),
            ErrorKind::Downstream => f.write_str("downstream"),
            ErrorKind::Transport => f.write_str("transport"),
        }
    }
}

/// What the dispatcher should do with a delivered message.
///
/// Serialized in the sidecar's pub/sub response vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Disposition {
    Success,
    Retry,
    Drop,
}

/// Unified error for every collaborator boundary of the pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MonitorError {
    #[error("malformed envelope: {0}")]
    MalformedEnvelope(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("store rejected command (status {status}): {body}")]
    StoreRejected { status: u16, body: String },

    #[error("row decode: {0}")]
    RowDecode(String),

    #[error("product {0} not found in master data")]
    LookupNotFound(i64),

    #[error("master data unavailable: {0}")]
    LookupUnavailable(String),

    #[error("master data rejected lookup (status {status}): {body}")]
    LookupRejected { status: u16, body: String },

    #[error("transport: {0}")]
    Transport(String),
}

impl MonitorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MonitorError::MalformedEnvelope(_) | MonitorError::MalformedPayload(_) => ErrorKind::Input,
            MonitorError::StoreRejected { .. }
            | MonitorError::LookupRejected { .. }
            | MonitorError::RowDecode(_)
            | MonitorError::LookupNotFound(_) => ErrorKind::Downstream,
            MonitorError::StoreUnavailable(_)
            | MonitorError::LookupUnavailable(_)
            | MonitorError::Transport(_) => ErrorKind::Transport,
        }
    }

    /// Whether repeating the same call may succeed.
    pub fn is_transient(&self) -> bool {
        match self.kind() {
            ErrorKind::Transport => true,
            // 5xx is the collaborator failing, not the request.
            ErrorKind::Downstream => matches!(
                self,
                MonitorError::StoreRejected { status, .. } | MonitorError::LookupRejected { status, .. } if *status >= 500
            ),
            ErrorKind::Input => false,
        }
    }

    /// Disposition reported back to the dispatcher for a failed delivery.
    pub fn disposition(&self) -> Disposition {
        match self {
            MonitorError::RowDecode(_) | MonitorError::LookupNotFound(_) => Disposition::Drop,
            _ if self.kind() == ErrorKind::Input => Disposition::Drop,
            _ => Disposition::Retry,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum MonitoringError {
    #[error("sidecar client: {0}")]
    Client(String),

    #[error("{0}")]
    Server(String),
}

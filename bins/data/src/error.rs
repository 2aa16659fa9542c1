#[derive(Debug, thiserror::Error)]
pub enum DataError {
    #[error("sidecar client: {0}")]
    Client(String),

    #[error("schema bootstrap: {0}")]
    Schema(#[from] prodmon_api::MonitorError),

    #[error("{0}")]
    Server(String),
}

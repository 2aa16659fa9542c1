#[derive(Debug, thiserror::Error)]
pub enum ProductionError {
    #[error("config: {0}")]
    Config(String),

    #[error("sidecar client: {0}")]
    Client(String),

    #[error("signal: {0}")]
    Signal(#[from] std::io::Error),

    #[error("producer task: {0}")]
    Task(#[from] tokio::task::JoinError),
}

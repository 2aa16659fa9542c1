#[derive(Debug, thiserror::Error)]
pub enum ErpError {
    #[error("{0}")]
    Catalog(#[from] prodmon_pipeline::PipelineError),

    #[error("{0}")]
    Server(String),
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("catalog ({path}): {source}")]
    CatalogRead { path: String, source: std::io::Error },

    #[error("catalog ({path}): {source}")]
    CatalogParse { path: String, source: toml::de::Error },

    #[error("catalog: {0}")]
    CatalogInvalid(String),
}

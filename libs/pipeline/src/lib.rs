pub mod catalog;
pub mod detector;
pub mod error;
pub mod persistence;
pub mod producer;
pub mod rows;

pub use catalog::{Catalog, CatalogLookup};
pub use detector::{AnchorPolicy, DelayDetector, classify};
pub use error::PipelineError;
pub use persistence::{CREATE_PRODUCTS, PersistenceConsumer, ProductRepository};
pub use producer::{Producer, spawn_producer};

pub mod envelope;
pub mod error;
pub mod gateway;
pub mod types;
pub mod util;

pub use envelope::{Envelope, EnvelopeCodec};
pub use error::{Disposition, ErrorKind, MonitorError};
pub use gateway::{
    BoxFuture, Broker, EventHandler, MasterDataLookup, Row, StoreCommand, StoreGateway, StoreOperation,
};
pub use types::{CatalogProduct, DelayVerdict, MasterDataEntry, PersistedRecord, ProductionEvent, Subscription};
pub use util::{Clock, FixedClock, SystemClock};

pub mod binding;
pub mod broker;
pub mod client;
pub mod config;
pub mod lookup;
pub mod retry;

#[cfg(test)]
mod stub;

pub use binding::SidecarBinding;
pub use broker::SidecarBroker;
pub use client::SidecarClient;
pub use config::{BrokerArgs, SidecarArgs, SidecarConfig};
pub use lookup::SidecarLookup;
pub use retry::RetryPolicy;

pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::PermissionsConfig;

pub use core::{
    client::PermissionsServiceClient,
    correlation::CorrelationId,
    filters::{FilterChain, RequestFilter, StaticTokenProvider},
    journey::{Journey, JourneySeparators},
};
pub use utils::error::{PermissionsError, Result};

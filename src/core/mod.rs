pub mod client;
pub mod correlation;
pub mod filters;
pub mod journey;
pub mod response;

pub use crate::domain::model::{LicenceView, OgelRegistrationView, RegisterOgelResponse, RegisterParam};
pub use crate::domain::ports::{ConfigProvider, TokenProvider};
pub use crate::utils::error::Result;

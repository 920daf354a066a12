use crate::utils::error::Result;
use async_trait::async_trait;

/// Connection settings the permissions client is built from.
pub trait ConfigProvider: Send + Sync {
    fn address(&self) -> &str;
    fn timeout_millis(&self) -> u64;
}

/// Supplies the bearer token attached to every outbound request.
#[async_trait]
pub trait TokenProvider: Send + Sync {
    async fn token(&self) -> Result<String>;
}

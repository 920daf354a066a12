use crate::core::correlation::{CorrelationId, CORRELATION_ID_HEADER};
use crate::domain::ports::TokenProvider;
use crate::utils::error::{PermissionsError, Result};
use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, StatusCode};
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// 單一次對外呼叫的描述，所有 filter 共用
#[derive(Debug, Clone)]
pub struct Exchange {
    pub service: &'static str,
    pub operation: &'static str,
    pub method: Method,
    pub url: Url,
    pub correlation_id: String,
    pub started_at: Instant,
}

impl Exchange {
    pub fn new(service: &'static str, operation: &'static str, method: Method, url: Url) -> Self {
        Self {
            service,
            operation,
            method,
            url,
            correlation_id: CorrelationId::current_or_new(),
            started_at: Instant::now(),
        }
    }

    pub fn with_query(mut self, key: &str, value: &str) -> Self {
        self.url.query_pairs_mut().append_pair(key, value);
        self
    }
}

#[derive(Debug)]
pub enum Outcome<'a> {
    Completed(StatusCode),
    Failed(&'a PermissionsError),
}

#[async_trait]
pub trait RequestFilter: Send + Sync {
    fn name(&self) -> &'static str;

    async fn before_send(&self, request: RequestBuilder, exchange: &Exchange) -> Result<RequestBuilder> {
        let _ = exchange;
        Ok(request)
    }

    fn after_response(&self, exchange: &Exchange, outcome: &Outcome<'_>) {
        let _ = (exchange, outcome);
    }
}

/// Propagates the exchange's correlation id upstream.
pub struct CorrelationIdFilter;

#[async_trait]
impl RequestFilter for CorrelationIdFilter {
    fn name(&self) -> &'static str {
        "correlation-id"
    }

    async fn before_send(&self, request: RequestBuilder, exchange: &Exchange) -> Result<RequestBuilder> {
        Ok(request.header(CORRELATION_ID_HEADER, exchange.correlation_id.as_str()))
    }
}

/// Emits one structured event per request once its outcome is known.
pub struct ServiceClientLogger;

#[async_trait]
impl RequestFilter for ServiceClientLogger {
    fn name(&self) -> &'static str {
        "service-client-logger"
    }

    fn after_response(&self, exchange: &Exchange, outcome: &Outcome<'_>) {
        let elapsed_ms = exchange.started_at.elapsed().as_millis() as u64;
        match outcome {
            Outcome::Completed(status) => tracing::info!(
                service = exchange.service,
                operation = exchange.operation,
                method = %exchange.method,
                url = %exchange.url,
                correlation_id = %exchange.correlation_id,
                status = status.as_u16(),
                elapsed_ms,
                "✅ Service client request completed"
            ),
            Outcome::Failed(error) => tracing::warn!(
                service = exchange.service,
                operation = exchange.operation,
                method = %exchange.method,
                url = %exchange.url,
                correlation_id = %exchange.correlation_id,
                elapsed_ms,
                error = %error,
                "❌ Service client request failed"
            ),
        }
    }
}

/// Adds `Authorization: Bearer <token>` from the configured provider.
pub struct AuthTokenFilter {
    provider: Arc<dyn TokenProvider>,
}

impl AuthTokenFilter {
    pub fn new(provider: Arc<dyn TokenProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl RequestFilter for AuthTokenFilter {
    fn name(&self) -> &'static str {
        "auth-token"
    }

    async fn before_send(&self, request: RequestBuilder, _exchange: &Exchange) -> Result<RequestBuilder> {
        let token = self.provider.token().await?;
        Ok(request.bearer_auth(token))
    }
}

/// A token fixed at construction, typically read from configuration.
#[derive(Clone)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl std::fmt::Debug for StaticTokenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticTokenProvider")
            .field("token", &"***")
            .finish()
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn token(&self) -> Result<String> {
        if self.token.trim().is_empty() {
            return Err(PermissionsError::Auth {
                message: "no token configured".to_string(),
            });
        }
        Ok(self.token.clone())
    }
}

/// Ordered filters applied to every request.
#[derive(Clone)]
pub struct FilterChain {
    filters: Vec<Arc<dyn RequestFilter>>,
}

impl FilterChain {
    /// Correlation id, then logging, then auth.
    pub fn standard(token_provider: Arc<dyn TokenProvider>) -> Self {
        Self {
            filters: vec![
                Arc::new(CorrelationIdFilter),
                Arc::new(ServiceClientLogger),
                Arc::new(AuthTokenFilter::new(token_provider)),
            ],
        }
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    pub async fn before_send(&self, mut request: RequestBuilder, exchange: &Exchange) -> Result<RequestBuilder> {
        for filter in &self.filters {
            request = filter.before_send(request, exchange).await?;
        }
        Ok(request)
    }

    pub fn after_response(&self, exchange: &Exchange, outcome: &Outcome<'_>) {
        for filter in &self.filters {
            filter.after_response(exchange, outcome);
        }
    }
}

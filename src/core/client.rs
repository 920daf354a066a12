use crate::core::filters::{Exchange, FilterChain, Outcome};
use crate::core::response::{self, expect_single, transport_error};
use crate::domain::model::{LicenceView, OgelRegistrationView, RegisterOgelResponse, RegisterParam};
use crate::domain::ports::{ConfigProvider, TokenProvider};
use crate::utils::error::{PermissionsError, Result};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

pub const PERMISSIONS_SERVICE: &str = "permissions-service";

/// Client for the permissions service REST API.
#[derive(Clone)]
pub struct PermissionsServiceClient {
    address: Url,
    timeout_ms: u64,
    client: Client,
    filters: FilterChain,
}

impl PermissionsServiceClient {
    pub fn new<C: ConfigProvider>(config: &C, token_provider: Arc<dyn TokenProvider>) -> Result<Self> {
        Self::with_client(config, token_provider, Client::new())
    }

    pub fn with_client<C: ConfigProvider>(
        config: &C,
        token_provider: Arc<dyn TokenProvider>,
        client: Client,
    ) -> Result<Self> {
        crate::utils::validation::validate_url("permissions_service.address", config.address())?;
        crate::utils::validation::validate_positive_number(
            "permissions_service.timeout_millis",
            config.timeout_millis(),
            1,
        )?;

        let address = Url::parse(config.address()).map_err(|e| PermissionsError::InvalidConfigValueError {
            field: "permissions_service.address".to_string(),
            value: config.address().to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            address,
            timeout_ms: config.timeout_millis(),
            client,
            filters: FilterChain::standard(token_provider),
        })
    }

    pub fn address(&self) -> &Url {
        &self.address
    }

    pub fn filters(&self) -> &FilterChain {
        &self.filters
    }

    /// POST `/register-ogel?callbackUrl=...`, returns the request id.
    pub async fn register_ogel(&self, param: &RegisterParam, callback_url: &str) -> Result<String> {
        let url = self.endpoint(&["register-ogel"])?;
        let exchange = Exchange::new(PERMISSIONS_SERVICE, "registerOgel", Method::POST, url)
            .with_query("callbackUrl", callback_url);
        let request = self.request(&exchange).json(param);

        let response: RegisterOgelResponse = self.call(&exchange, request).await?;
        Ok(response.request_id)
    }

    pub async fn get_ogel_registrations(&self, user_id: &str) -> Result<Vec<OgelRegistrationView>> {
        let url = self.endpoint(&["ogel-registrations", "user", user_id])?;
        let exchange = Exchange::new(PERMISSIONS_SERVICE, "getOgelRegistrations", Method::GET, url);
        let request = self.request(&exchange);

        self.call(&exchange, request).await
    }

    pub async fn get_ogel_registration(
        &self,
        user_id: &str,
        registration_reference: &str,
    ) -> Result<OgelRegistrationView> {
        let url = self.endpoint(&["ogel-registrations", "user", user_id])?;
        let exchange = Exchange::new(PERMISSIONS_SERVICE, "getOgelRegistration", Method::GET, url)
            .with_query("registrationReference", registration_reference);
        let request = self.request(&exchange);

        let views: Vec<OgelRegistrationView> = self.call(&exchange, request).await?;
        expect_single(views, "ogelRegistrationView")
    }

    pub async fn get_licence(&self, user_id: &str, licence_reference: &str) -> Result<LicenceView> {
        let url = self.endpoint(&["licences", "user", user_id])?;
        let exchange = Exchange::new(PERMISSIONS_SERVICE, "getLicence", Method::GET, url)
            .with_query("licenceReference", licence_reference);
        let request = self.request(&exchange);

        let views: Vec<LicenceView> = self.call(&exchange, request).await?;
        expect_single(views, "licenceView")
    }

    pub async fn get_licences(&self, user_id: &str) -> Result<Vec<LicenceView>> {
        let url = self.endpoint(&["licences", "user", user_id])?;
        let exchange = Exchange::new(PERMISSIONS_SERVICE, "getLicences", Method::GET, url);
        let request = self.request(&exchange);

        self.call(&exchange, request).await
    }

    /// 在 base address 後面附加路徑片段，不修改 address 本身
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.address.clone();
        url.path_segments_mut()
            .map_err(|_| PermissionsError::ConfigError {
                message: format!("{} cannot be used as a base address", self.address),
            })?
            .pop_if_empty()
            .extend(segments);

        tracing::debug!("Built {} endpoint: {}", PERMISSIONS_SERVICE, url);
        Ok(url)
    }

    fn request(&self, exchange: &Exchange) -> RequestBuilder {
        self.client
            .request(exchange.method.clone(), exchange.url.clone())
            .timeout(Duration::from_millis(self.timeout_ms))
    }

    async fn call<T: DeserializeOwned>(&self, exchange: &Exchange, request: RequestBuilder) -> Result<T> {
        // filter 失敗時請求沒有送出，不產生 after_response 紀錄
        let request = self.filters.before_send(request, exchange).await?;
        let result = self.dispatch(exchange, request).await;

        let outcome = match &result {
            Ok((status, _)) => Outcome::Completed(*status),
            Err(e) => Outcome::Failed(e),
        };
        self.filters.after_response(exchange, &outcome);

        result.map(|(_, value)| value)
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        exchange: &Exchange,
        request: RequestBuilder,
    ) -> Result<(StatusCode, T)> {
        let response = request
            .send()
            .await
            .map_err(|e| transport_error(e, exchange.service, exchange.operation, self.timeout_ms))?;

        response::parse(response, exchange.service, exchange.operation, self.timeout_ms).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::filters::StaticTokenProvider;
    use httpmock::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tracing_subscriber::layer::{Context, SubscriberExt};
    use tracing_subscriber::Layer;

    /// 計算 filters 模組發出的事件數
    #[derive(Clone, Default)]
    struct FilterEvents(Arc<AtomicUsize>);

    impl<S: tracing::Subscriber> Layer<S> for FilterEvents {
        fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
            if event.metadata().target().ends_with("core::filters") {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }
    }

    impl FilterEvents {
        fn count(&self) -> usize {
            self.0.load(Ordering::SeqCst)
        }
    }

    struct MockConfig {
        address: String,
        timeout_millis: u64,
    }

    impl ConfigProvider for MockConfig {
        fn address(&self) -> &str {
            &self.address
        }

        fn timeout_millis(&self) -> u64 {
            self.timeout_millis
        }
    }

    fn client(address: &str) -> Result<PermissionsServiceClient> {
        client_with_token(address, "jwt")
    }

    fn client_with_token(address: &str, token: &str) -> Result<PermissionsServiceClient> {
        let config = MockConfig {
            address: address.to_string(),
            timeout_millis: 1000,
        };
        PermissionsServiceClient::new(&config, Arc::new(StaticTokenProvider::new(token)))
    }

    #[test]
    fn test_endpoint_appends_segments_without_mutating_address() {
        let client = client("http://localhost:8080/permissions/").unwrap();

        let url = client.endpoint(&["licences", "user", "user 1"]).unwrap();

        assert_eq!(url.as_str(), "http://localhost:8080/permissions/licences/user/user%201");
        assert_eq!(client.address().as_str(), "http://localhost:8080/permissions/");
    }

    #[test]
    fn test_rejects_invalid_configuration() {
        assert!(client("not a url").is_err());

        let config = MockConfig {
            address: "http://localhost".to_string(),
            timeout_millis: 0,
        };
        let result = PermissionsServiceClient::new(&config, Arc::new(StaticTokenProvider::new("jwt")));
        assert!(matches!(
            result,
            Err(PermissionsError::InvalidConfigValueError { .. })
        ));
    }

    #[tokio::test]
    async fn test_one_log_event_per_dispatched_request() {
        let events = FilterEvents::default();
        let subscriber = tracing_subscriber::registry().with(events.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/licences/user/u1");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;

        let client = client(&server.base_url()).unwrap();
        let licences = client.get_licences("u1").await.unwrap();

        assert!(licences.is_empty());
        mock.assert_hits_async(1).await;
        assert_eq!(events.count(), 1);
    }

    #[tokio::test]
    async fn test_blank_token_is_not_sent_or_logged() {
        let events = FilterEvents::default();
        let subscriber = tracing_subscriber::registry().with(events.clone());
        let _guard = tracing::subscriber::set_default(subscriber);

        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(GET).path("/licences/user/u1");
                then.status(200).json_body(serde_json::json!([]));
            })
            .await;

        let client = client_with_token(&server.base_url(), "  ").unwrap();
        let result = client.get_licences("u1").await;

        assert!(matches!(result, Err(PermissionsError::Auth { .. })));
        mock.assert_hits_async(0).await;
        assert_eq!(events.count(), 0);
    }
}

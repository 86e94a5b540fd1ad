use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use serde::de::DeserializeOwned;
use tokio::time::{sleep, Instant};

use crate::{
    config::{ServiceConfig, DEFAULT_ENV_PREFIX},
    decode::{decode_binary, decode_response},
    request::{assemble, validate_service_url},
    retry::{RetryDecision, RetryPolicy, RetryState},
    transport::send_once,
    Authenticator, CallContext, ClientOptions, ComplianceError, DetailedResponse,
    OperationDescriptor, OperationParams, RequestBody, Response, ResponseShape, Result,
};

/// Default public endpoint of the compliance service.
pub const DEFAULT_SERVICE_URL: &str = "https://us-south.compliance.cloud.ibm.com";

#[derive(Clone)]
/// HTTP client for the compliance API.
///
/// Configuration setters take `&mut self`; a client value cannot be
/// reconfigured while a call borrowed from it is in flight. Clones share the
/// connection pool but not configuration.
pub struct ComplianceClient {
    http: reqwest::Client,
    service_url: String,
    authenticator: Arc<dyn Authenticator>,
    options: ClientOptions,
    default_headers: HeaderMap,
}

impl fmt::Debug for ComplianceClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComplianceClient")
            .field("service_url", &self.service_url)
            .field(
                "authenticator",
                &self.authenticator.authentication_type(),
            )
            .field("options", &self.options)
            .finish()
    }
}

impl ComplianceClient {
    /// Creates a client for `service_url`.
    ///
    /// An empty URL is accepted here and reported when a call is made; a
    /// malformed one fails with [`ComplianceError::Config`].
    pub fn new(
        service_url: impl Into<String>,
        authenticator: impl Authenticator + 'static,
    ) -> Result<Self> {
        Self::with_shared_authenticator(service_url, Arc::new(authenticator))
    }

    /// Creates a client for [`DEFAULT_SERVICE_URL`].
    pub fn with_authenticator(authenticator: impl Authenticator + 'static) -> Result<Self> {
        Self::new(DEFAULT_SERVICE_URL, authenticator)
    }

    pub fn with_shared_authenticator(
        service_url: impl Into<String>,
        authenticator: Arc<dyn Authenticator>,
    ) -> Result<Self> {
        let service_url = service_url.into();
        validate_service_url(&service_url)?;
        authenticator.validate()?;

        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| ComplianceError::Config(format!("failed to build HTTP client: {err}")))?;

        Ok(Self {
            http,
            service_url,
            authenticator,
            options: ClientOptions::default(),
            default_headers: HeaderMap::new(),
        })
    }

    /// Creates a client from a resolved [`ServiceConfig`].
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let service_url = config
            .service_url
            .clone()
            .unwrap_or_else(|| DEFAULT_SERVICE_URL.to_owned());
        let mut client = Self::with_shared_authenticator(service_url, config.auth.authenticator()?)?;
        if let Some((max_retries, base_delay)) = config.retries {
            client.enable_retries(max_retries, base_delay);
        }
        Ok(client)
    }

    /// Creates a client from `COMPLIANCE_*` environment variables.
    ///
    /// See [`ServiceConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self> {
        Self::from_config(&ServiceConfig::from_env(DEFAULT_ENV_PREFIX)?)
    }

    /// Applies client options such as timeout and retry behavior.
    pub fn with_options(mut self, opts: ClientOptions) -> Self {
        self.options = opts;
        self
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    pub fn service_url(&self) -> &str {
        &self.service_url
    }

    pub fn set_service_url(&mut self, service_url: impl Into<String>) -> Result<()> {
        let service_url = service_url.into();
        validate_service_url(&service_url)?;
        self.service_url = service_url;
        Ok(())
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn set_authenticator(&mut self, authenticator: impl Authenticator + 'static) -> Result<()> {
        authenticator.validate()?;
        self.authenticator = Arc::new(authenticator);
        Ok(())
    }

    /// Headers sent on every request, below per-call custom headers.
    pub fn set_default_headers(&mut self, headers: HeaderMap) {
        self.default_headers = headers;
    }

    /// Enables retries of transient failures with linear backoff.
    ///
    /// `max_retries = 0` keeps a single attempt; a zero `base_delay` retries
    /// immediately.
    pub fn enable_retries(&mut self, max_retries: usize, base_delay: Duration) {
        self.options.max_retries = max_retries;
        self.options.retry_backoff_ms = u64::try_from(base_delay.as_millis()).unwrap_or(u64::MAX);
    }

    pub fn disable_retries(&mut self) {
        self.options.max_retries = 0;
    }

    /// Runs a JSON (or no-content) operation.
    ///
    /// Returns `Ok` with `result: None` for an empty success body.
    pub async fn invoke<T: DeserializeOwned>(
        &self,
        op: &OperationDescriptor,
        params: &OperationParams,
        body: RequestBody,
        ctx: &CallContext,
    ) -> Result<Response<T>> {
        if let ResponseShape::Binary(_) = op.response {
            return Err(ComplianceError::Validation(format!(
                "{} returns binary content; use invoke_binary",
                op.name
            )));
        }
        let shape = op.response;
        self.execute(op, params, &body, ctx, |response| {
            decode_response(shape, response)
        })
        .await
    }

    /// Runs an operation whose success body is passed through as raw bytes.
    pub async fn invoke_binary(
        &self,
        op: &OperationDescriptor,
        params: &OperationParams,
        body: RequestBody,
        ctx: &CallContext,
    ) -> Result<Response<Vec<u8>>> {
        self.execute(op, params, &body, ctx, decode_binary).await
    }

    async fn execute<T, F>(
        &self,
        op: &OperationDescriptor,
        params: &OperationParams,
        body: &RequestBody,
        ctx: &CallContext,
        decode: F,
    ) -> Result<Response<T>>
    where
        F: Fn(DetailedResponse) -> Result<Response<T>>,
    {
        let prepared = assemble(op, params, body, ctx, &self.default_headers)?;
        let request = prepared.into_descriptor(&self.service_url, ctx.get_deadline())?;
        let attempt_timeout = Duration::from_millis(self.options.timeout_ms);
        let mut retry = RetryState::new(RetryPolicy::from_options(&self.options), ctx.get_deadline());

        loop {
            #[cfg_attr(not(feature = "tracing"), allow(unused_variables))]
            let attempt = retry.begin_attempt();

            #[cfg(feature = "tracing")]
            tracing::debug!(
                operation = op.name,
                attempt,
                method = %request.method,
                url = %request.url,
                "sending request"
            );

            let outcome = match self.authenticator.authenticate(request.clone()) {
                Ok(authenticated) => send_once(&self.http, authenticated, attempt_timeout)
                    .await
                    .and_then(&decode),
                Err(err) => Err(err),
            };

            let err = match outcome {
                Ok(response) => return Ok(response),
                Err(err) => err,
            };

            match retry.after_failure(&err, Instant::now()) {
                RetryDecision::Retry { delay } => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(
                        operation = op.name,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "retrying request"
                    );

                    if !delay.is_zero() {
                        sleep(delay).await;
                    }
                }
                RetryDecision::Stop => {
                    #[cfg(feature = "tracing")]
                    tracing::debug!(operation = op.name, attempt, error = %err, "request failed");

                    return Err(err);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{ComplianceClient, DEFAULT_SERVICE_URL};
    use crate::{BasicAuthenticator, ComplianceError, NoAuthAuthenticator};

    #[test]
    fn debug_redacts_credentials() {
        let client = ComplianceClient::with_authenticator(
            BasicAuthenticator::new("user", "secret-password").expect("valid"),
        )
        .expect("must build");
        let debug = format!("{client:?}");
        assert!(debug.contains("basic"));
        assert!(!debug.contains("secret-password"));
        assert_eq!(client.service_url(), DEFAULT_SERVICE_URL);
    }

    #[test]
    fn malformed_service_url_is_rejected_at_construction() {
        let err = ComplianceClient::new("::not-a-url::", NoAuthAuthenticator::new())
            .expect_err("must fail");
        assert!(matches!(err, ComplianceError::Config(_)));
    }

    #[test]
    fn set_service_url_validates_and_keeps_previous_on_error() {
        let mut client = ComplianceClient::new("https://a.test", NoAuthAuthenticator::new())
            .expect("must build");
        assert!(client.set_service_url("ftp://b.test").is_err());
        assert_eq!(client.service_url(), "https://a.test");
        client.set_service_url("https://b.test").expect("valid url");
        assert_eq!(client.service_url(), "https://b.test");
    }

    #[test]
    fn retry_setters_update_options() {
        let mut client = ComplianceClient::new("https://a.test", NoAuthAuthenticator::new())
            .expect("must build");
        client.enable_retries(3, Duration::from_millis(15));
        assert_eq!(client.options().max_retries, 3);
        assert_eq!(client.options().retry_backoff_ms, 15);

        client.disable_retries();
        assert_eq!(client.options().max_retries, 0);
    }
}

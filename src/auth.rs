//! Credential attachment.
//!
//! The engine calls [`Authenticator::authenticate`] exactly once per attempt,
//! before the request is sent. A failure is terminal and never retried.

use std::fmt;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};

use crate::{ComplianceError, RequestDescriptor, Result};

pub const AUTHTYPE_NOAUTH: &str = "noAuth";
pub const AUTHTYPE_BASIC: &str = "basic";
pub const AUTHTYPE_BEARER_TOKEN: &str = "bearerToken";

/// Produces an outgoing credential and attaches it to a request.
pub trait Authenticator: fmt::Debug + Send + Sync {
    fn authentication_type(&self) -> &'static str;

    fn authenticate(&self, request: RequestDescriptor) -> Result<RequestDescriptor>;

    /// Re-checks the configuration. Constructors already validate.
    fn validate(&self) -> Result<()> {
        Ok(())
    }
}

/// Pass-through authenticator.
#[derive(Clone, Debug, Default)]
pub struct NoAuthAuthenticator;

impl NoAuthAuthenticator {
    pub fn new() -> Self {
        Self
    }
}

impl Authenticator for NoAuthAuthenticator {
    fn authentication_type(&self) -> &'static str {
        AUTHTYPE_NOAUTH
    }

    fn authenticate(&self, request: RequestDescriptor) -> Result<RequestDescriptor> {
        Ok(request)
    }
}

/// HTTP basic authentication.
#[derive(Clone, Debug)]
pub struct BasicAuthenticator {
    username: String,
    password: SecretString,
}

impl BasicAuthenticator {
    /// Fails with [`ComplianceError::Config`] for empty or malformed credentials.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let authenticator = Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        };
        authenticator.validate()?;
        Ok(authenticator)
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}

impl Authenticator for BasicAuthenticator {
    fn authentication_type(&self) -> &'static str {
        AUTHTYPE_BASIC
    }

    fn authenticate(&self, mut request: RequestDescriptor) -> Result<RequestDescriptor> {
        let credentials = format!("{}:{}", self.username, self.password.expose_secret());
        let value = sensitive_header(&format!("Basic {}", STANDARD.encode(credentials)))?;
        request.headers.insert(AUTHORIZATION, value);
        Ok(request)
    }

    fn validate(&self) -> Result<()> {
        check_credential("username", &self.username)?;
        check_credential("password", self.password.expose_secret())
    }
}

/// Static bearer token authentication.
#[derive(Clone, Debug)]
pub struct BearerTokenAuthenticator {
    token: SecretString,
}

impl BearerTokenAuthenticator {
    /// Accepts the token with or without a `Bearer ` prefix.
    pub fn new(token: impl AsRef<str>) -> Result<Self> {
        let authenticator = Self {
            token: SecretString::from(strip_bearer_prefix(token.as_ref()).to_owned()),
        };
        authenticator.validate()?;
        Ok(authenticator)
    }
}

impl Authenticator for BearerTokenAuthenticator {
    fn authentication_type(&self) -> &'static str {
        AUTHTYPE_BEARER_TOKEN
    }

    fn authenticate(&self, mut request: RequestDescriptor) -> Result<RequestDescriptor> {
        let value = sensitive_header(&format!("Bearer {}", self.token.expose_secret()))?;
        request.headers.insert(AUTHORIZATION, value);
        Ok(request)
    }

    fn validate(&self) -> Result<()> {
        check_credential("bearer token", self.token.expose_secret())
    }
}

fn check_credential(name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ComplianceError::Config(format!("{name} cannot be empty")));
    }
    // Values copied with surrounding braces or quotes are a common paste error.
    if value.starts_with(['{', '"']) || value.ends_with(['}', '"']) {
        return Err(ComplianceError::Config(format!(
            "{name} cannot start or end with curly brackets or quotes"
        )));
    }
    Ok(())
}

fn strip_bearer_prefix(token: &str) -> &str {
    let trimmed = token.trim();
    match (trimmed.get(..6), trimmed.get(6..)) {
        (Some(prefix), Some(rest))
            if prefix.eq_ignore_ascii_case("bearer")
                && (rest.is_empty() || rest.starts_with(char::is_whitespace)) =>
        {
            rest.trim_start()
        }
        _ => trimmed,
    }
}

fn sensitive_header(value: &str) -> Result<HeaderValue> {
    let mut value = HeaderValue::from_str(value).map_err(|err| ComplianceError::Auth {
        message: format!("credential is not a valid header value: {err}"),
        response: None,
    })?;
    value.set_sensitive(true);
    Ok(value)
}

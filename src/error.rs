use std::fmt;

use serde_json::Value as JsonValue;

use crate::DetailedResponse;

/// Error type returned by this crate.
///
/// Errors raised before a request was dispatched (validation, configuration,
/// authenticator rejection) carry no response metadata. Errors produced after
/// a response arrived keep it, see [`ComplianceError::response`].
#[derive(Debug, thiserror::Error)]
pub enum ComplianceError {
    /// Missing or empty required parameter, detected before any network call.
    #[error("validation error: {0}")]
    Validation(String),
    /// Bad service URL or credential construction.
    #[error("configuration error: {0}")]
    Config(String),
    /// The authenticator rejected the request, or the service answered 401/403.
    #[error("authentication error: {message}")]
    Auth {
        message: String,
        response: Option<Box<DetailedResponse>>,
    },
    /// Caller deadline or client timeout elapsed.
    #[error("timeout: {0}")]
    Timeout(String),
    /// Connection-level failure from `reqwest`.
    #[error("transport error: {0}")]
    Transport(reqwest::Error),
    /// 5xx response.
    #[error("server error {}: {problem}", .response.status_code)]
    Server {
        problem: Problem,
        response: Box<DetailedResponse>,
    },
    /// 4xx response other than 401/403.
    #[error("http error {}: {problem}", .response.status_code)]
    Client {
        problem: Problem,
        response: Box<DetailedResponse>,
    },
    /// Success status with a body that could not be decoded.
    #[error("decode error: {message}")]
    Decode {
        message: String,
        response: Box<DetailedResponse>,
    },
}

/// Pipeline stage that produced an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    Validation,
    Configuration,
    Authentication,
    Transport,
    Response,
}

impl ComplianceError {
    /// Response metadata, present whenever the service answered.
    pub fn response(&self) -> Option<&DetailedResponse> {
        match self {
            Self::Auth { response, .. } => response.as_deref(),
            Self::Server { response, .. }
            | Self::Client { response, .. }
            | Self::Decode { response, .. } => Some(response),
            Self::Validation(_) | Self::Config(_) | Self::Timeout(_) | Self::Transport(_) => None,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        self.response().map(|response| response.status_code)
    }

    /// Parsed error payload for non-2xx responses.
    pub fn problem(&self) -> Option<&Problem> {
        match self {
            Self::Server { problem, .. } | Self::Client { problem, .. } => Some(problem),
            _ => None,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            Self::Validation(_) => Stage::Validation,
            Self::Config(_) => Stage::Configuration,
            Self::Auth { response: None, .. } => Stage::Authentication,
            Self::Timeout(_) | Self::Transport(_) => Stage::Transport,
            Self::Auth { .. } | Self::Server { .. } | Self::Client { .. } | Self::Decode { .. } => {
                Stage::Response
            }
        }
    }

    /// Whether the request reached the transport layer.
    pub fn is_dispatched(&self) -> bool {
        matches!(self.stage(), Stage::Transport | Stage::Response)
    }

    /// Transient failures: timeouts, connection errors and 5xx responses.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout(_) | Self::Transport(_) | Self::Server { .. }
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout(_))
    }
}

/// Best-effort description of an error payload returned by the service.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Problem {
    pub message: String,
    pub code: Option<String>,
    pub trace: Option<String>,
}

impl Problem {
    /// Parses the response body, falling back to the status reason phrase.
    pub(crate) fn from_response(response: &DetailedResponse) -> Self {
        let parsed = serde_json::from_slice::<JsonValue>(&response.body).ok();
        let message = parsed
            .as_ref()
            .and_then(error_message)
            .unwrap_or_else(|| fallback_message(response));
        let code = parsed.as_ref().and_then(|body| {
            body.pointer("/errors/0/code")
                .and_then(JsonValue::as_str)
                .map(str::to_owned)
        });
        let trace = parsed.as_ref().and_then(|body| {
            body.get("trace")
                .and_then(JsonValue::as_str)
                .map(str::to_owned)
        });
        Self {
            message,
            code,
            trace,
        }
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)?;
        if let Some(code) = &self.code {
            write!(f, " [{code}]")?;
        }
        if let Some(trace) = &self.trace {
            write!(f, " (trace: {trace})")?;
        }
        Ok(())
    }
}

fn error_message(body: &JsonValue) -> Option<String> {
    ["/errors/0/message", "/error", "/message", "/errorMessage"]
        .iter()
        .find_map(|pointer| body.pointer(pointer).and_then(JsonValue::as_str))
        .filter(|message| !message.is_empty())
        .map(str::to_owned)
}

fn fallback_message(response: &DetailedResponse) -> String {
    reqwest::StatusCode::from_u16(response.status_code)
        .ok()
        .and_then(|status| status.canonical_reason())
        .unwrap_or("unknown error")
        .to_owned()
}

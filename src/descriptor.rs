use std::fmt;

/// HTTP methods used by the compliance API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Expected shape of a successful response body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResponseShape {
    /// JSON document decoded into a typed model.
    Json,
    /// Raw bytes passed through untouched, requested with the given `Accept` value.
    Binary(&'static str),
    /// No body is expected; any body is ignored.
    NoContent,
}

/// Static description of one API operation.
///
/// Defined once per endpoint as a `const`, see [`crate::operations`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OperationDescriptor {
    pub name: &'static str,
    pub method: HttpMethod,
    /// Path template with `{name}` placeholders, relative to the service URL.
    pub path: &'static str,
    /// Required path parameters, in template order.
    pub path_params: &'static [&'static str],
    /// Optional query parameters the operation accepts.
    pub query_params: &'static [&'static str],
    /// Optional header parameters the operation accepts.
    pub header_params: &'static [&'static str],
    /// Top-level body fields that must be present and non-empty.
    pub body_required: &'static [&'static str],
    pub response: ResponseShape,
}

impl OperationDescriptor {
    pub const fn new(name: &'static str, method: HttpMethod, path: &'static str) -> Self {
        Self {
            name,
            method,
            path,
            path_params: &[],
            query_params: &[],
            header_params: &[],
            body_required: &[],
            response: ResponseShape::Json,
        }
    }

    pub const fn path_params(self, path_params: &'static [&'static str]) -> Self {
        Self {
            path_params,
            ..self
        }
    }

    pub const fn query_params(self, query_params: &'static [&'static str]) -> Self {
        Self {
            query_params,
            ..self
        }
    }

    pub const fn header_params(self, header_params: &'static [&'static str]) -> Self {
        Self {
            header_params,
            ..self
        }
    }

    pub const fn body_required(self, body_required: &'static [&'static str]) -> Self {
        Self {
            body_required,
            ..self
        }
    }

    pub const fn response(self, response: ResponseShape) -> Self {
        Self { response, ..self }
    }

    pub fn has_body_response(&self) -> bool {
        !matches!(self.response, ResponseShape::NoContent)
    }

    pub fn accepts_query(&self, name: &str) -> bool {
        self.query_params.contains(&name)
    }

    pub fn accepts_header(&self, name: &str) -> bool {
        self.header_params
            .iter()
            .any(|declared| declared.eq_ignore_ascii_case(name))
    }
}

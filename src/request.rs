use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::Serialize;
use serde_json::Value as JsonValue;
use tokio::time::Instant;
use url::Url;

use crate::{
    path::resolve_path, CallContext, ComplianceError, HttpMethod, OperationDescriptor,
    OperationParams, ResponseShape, Result,
};

/// Correlation header sent on every request.
pub const TRANSACTION_ID_HEADER: &str = "Transaction-Id";

const JSON_MEDIA_TYPE: &str = "application/json";
const USER_AGENT: &str = concat!("compliance-http/", env!("CARGO_PKG_VERSION"));

/// Request payload, fully materialized before the first attempt.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(JsonValue),
}

impl RequestBody {
    /// Serializes a model into a JSON body.
    pub fn json<B: Serialize>(body: &B) -> Result<Self> {
        serde_json::to_value(body)
            .map(Self::Json)
            .map_err(|err| ComplianceError::Validation(format!("invalid request body: {err}")))
    }
}

/// Outgoing request, ready for the authenticator and the transport.
///
/// Retried attempts send clones of the same descriptor.
#[derive(Clone, Debug)]
pub struct RequestDescriptor {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
    pub deadline: Option<Instant>,
}

/// Validated request parts that still lack the service URL.
#[derive(Clone, Debug)]
pub(crate) struct PreparedRequest {
    method: HttpMethod,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

/// Builds the request parts for `op`. Performs no I/O.
///
/// Header precedence, lowest first: generated defaults, client default
/// headers, declared header parameters, caller custom headers, and finally an
/// explicit `Transaction-Id`.
pub(crate) fn assemble(
    op: &OperationDescriptor,
    params: &OperationParams,
    body: &RequestBody,
    ctx: &CallContext,
    default_headers: &HeaderMap,
) -> Result<PreparedRequest> {
    for name in op.path_params {
        if params.path_value(name).map_or(true, str::is_empty) {
            return Err(ComplianceError::Validation(format!(
                "{}: {name} must be provided and non-empty",
                op.name
            )));
        }
    }
    let path = resolve_path(op.path, &params.path)?;

    let body = encode_body(op, body)?;

    let mut query = Vec::with_capacity(params.query.len());
    for (name, value) in &params.query {
        if !op.accepts_query(name) {
            return Err(ComplianceError::Validation(format!(
                "{}: unknown query parameter '{name}'",
                op.name
            )));
        }
        if !value.is_empty() {
            query.push((name.clone(), value.clone()));
        }
    }

    let mut headers = HeaderMap::new();
    headers.insert(header::USER_AGENT, HeaderValue::from_static(USER_AGENT));
    match op.response {
        ResponseShape::Json => {
            headers.insert(header::ACCEPT, HeaderValue::from_static(JSON_MEDIA_TYPE));
        }
        ResponseShape::Binary(accept) => {
            headers.insert(header::ACCEPT, HeaderValue::from_static(accept));
        }
        ResponseShape::NoContent => {}
    }
    if body.is_some() {
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(JSON_MEDIA_TYPE));
    }
    for (name, value) in default_headers {
        headers.insert(name.clone(), value.clone());
    }

    for (name, value) in &params.headers {
        if !op.accepts_header(name) {
            return Err(ComplianceError::Validation(format!(
                "{}: unknown header parameter '{name}'",
                op.name
            )));
        }
        if !value.is_empty() {
            insert_header(&mut headers, name, value)?;
        }
    }
    for (name, value) in ctx.headers() {
        insert_header(&mut headers, name, value)?;
    }

    match ctx.get_transaction_id().filter(|id| !id.is_empty()) {
        Some(id) => insert_header(&mut headers, TRANSACTION_ID_HEADER, id)?,
        None if !headers.contains_key(TRANSACTION_ID_HEADER) => {
            let generated = uuid::Uuid::new_v4().to_string();
            insert_header(&mut headers, TRANSACTION_ID_HEADER, &generated)?;
        }
        None => {}
    }

    Ok(PreparedRequest {
        method: op.method,
        path,
        query,
        headers,
        body,
    })
}

impl PreparedRequest {
    /// Joins the request onto the service URL.
    pub(crate) fn into_descriptor(
        self,
        service_url: &str,
        deadline: Option<Instant>,
    ) -> Result<RequestDescriptor> {
        let base = service_url.trim().trim_end_matches('/');
        if base.is_empty() {
            return Err(ComplianceError::Config("service URL is not set".to_owned()));
        }

        let mut url = Url::parse(&format!("{base}{}", self.path)).map_err(|err| {
            ComplianceError::Config(format!("invalid service URL '{service_url}': {err}"))
        })?;
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&self.query);
        }

        Ok(RequestDescriptor {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
            deadline,
        })
    }
}

/// Checks a service URL without building a request.
pub(crate) fn validate_service_url(service_url: &str) -> Result<()> {
    let trimmed = service_url.trim();
    if trimmed.is_empty() {
        return Ok(());
    }
    let url = Url::parse(trimmed).map_err(|err| {
        ComplianceError::Config(format!("invalid service URL '{service_url}': {err}"))
    })?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ComplianceError::Config(format!(
            "unsupported service URL scheme '{other}'"
        ))),
    }
}

fn encode_body(op: &OperationDescriptor, body: &RequestBody) -> Result<Option<Vec<u8>>> {
    let value = match body {
        RequestBody::Empty if op.body_required.is_empty() => return Ok(None),
        RequestBody::Empty => {
            return Err(ComplianceError::Validation(format!(
                "{}: request body is required",
                op.name
            )))
        }
        RequestBody::Json(value) => value,
    };

    for field in op.body_required {
        let present = match value.get(field) {
            None | Some(JsonValue::Null) => false,
            Some(JsonValue::String(text)) => !text.is_empty(),
            Some(_) => true,
        };
        if !present {
            return Err(ComplianceError::Validation(format!(
                "{}: {field} must be provided and non-empty",
                op.name
            )));
        }
    }

    serde_json::to_vec(value)
        .map(Some)
        .map_err(|err| ComplianceError::Validation(format!("invalid request body: {err}")))
}

fn insert_header(headers: &mut HeaderMap, name: &str, value: &str) -> Result<()> {
    let name = HeaderName::from_bytes(name.as_bytes()).map_err(|err| {
        ComplianceError::Validation(format!("invalid header name '{name}': {err}"))
    })?;
    let value = HeaderValue::from_str(value).map_err(|err| {
        ComplianceError::Validation(format!("invalid value for header '{name}': {err}"))
    })?;
    headers.insert(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
    use serde_json::json;

    use super::{assemble, validate_service_url, RequestBody, TRANSACTION_ID_HEADER};
    use crate::{
        CallContext, ComplianceError, HttpMethod, OperationDescriptor, OperationParams,
        ResponseShape,
    };

    const GET_THING: OperationDescriptor = OperationDescriptor::new(
        "GetThing",
        HttpMethod::Get,
        "/instances/{instance_id}/v3/things/{thing_id}",
    )
    .path_params(&["instance_id", "thing_id"])
    .query_params(&["limit", "start"])
    .header_params(&["X-Request-Id"]);

    const CREATE_THING: OperationDescriptor = OperationDescriptor::new(
        "CreateThing",
        HttpMethod::Post,
        "/instances/{instance_id}/v3/things",
    )
    .path_params(&["instance_id"])
    .body_required(&["name", "controls"]);

    fn thing_params() -> OperationParams {
        OperationParams::new()
            .path("instance_id", "testString")
            .path("thing_id", "testString")
    }

    #[test]
    fn missing_path_parameter_names_the_field() {
        let params = OperationParams::new().path("instance_id", "x");
        let err = assemble(
            &GET_THING,
            &params,
            &RequestBody::Empty,
            &CallContext::new(),
            &HeaderMap::new(),
        )
        .expect_err("must fail");

        match err {
            ComplianceError::Validation(message) => assert!(message.contains("thing_id")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn empty_query_values_are_omitted() {
        let params = thing_params().query("limit", "10").query("start", "");
        let prepared = assemble(
            &GET_THING,
            &params,
            &RequestBody::Empty,
            &CallContext::new(),
            &HeaderMap::new(),
        )
        .expect("must assemble");
        let request = prepared
            .into_descriptor("https://example.test/", None)
            .expect("must build url");

        assert_eq!(
            request.url.as_str(),
            "https://example.test/instances/testString/v3/things/testString?limit=10"
        );
        assert!(request.body.is_none());
        assert_eq!(request.headers[ACCEPT], "application/json");
    }

    #[test]
    fn undeclared_query_parameter_is_rejected() {
        let params = thing_params().query("sort", "name");
        let err = assemble(
            &GET_THING,
            &params,
            &RequestBody::Empty,
            &CallContext::new(),
            &HeaderMap::new(),
        )
        .expect_err("must fail");
        assert!(matches!(err, ComplianceError::Validation(_)));
    }

    #[test]
    fn required_body_field_must_be_non_empty() {
        let params = OperationParams::new().path("instance_id", "x");
        let body = RequestBody::Json(json!({ "name": "", "controls": [] }));
        let err = assemble(
            &CREATE_THING,
            &params,
            &body,
            &CallContext::new(),
            &HeaderMap::new(),
        )
        .expect_err("must fail");

        match err {
            ComplianceError::Validation(message) => assert!(message.contains("name")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn missing_body_is_rejected_when_fields_are_required() {
        let params = OperationParams::new().path("instance_id", "x");
        let err = assemble(
            &CREATE_THING,
            &params,
            &RequestBody::Empty,
            &CallContext::new(),
            &HeaderMap::new(),
        )
        .expect_err("must fail");
        assert!(matches!(err, ComplianceError::Validation(_)));
    }

    #[test]
    fn json_body_sets_content_type() {
        let params = OperationParams::new().path("instance_id", "x");
        let body = RequestBody::Json(json!({ "name": "n", "controls": [] }));
        let prepared = assemble(
            &CREATE_THING,
            &params,
            &body,
            &CallContext::new(),
            &HeaderMap::new(),
        )
        .expect("must assemble");
        let request = prepared
            .into_descriptor("https://example.test", None)
            .expect("must build url");

        assert_eq!(request.headers[CONTENT_TYPE], "application/json");
        let sent: serde_json::Value =
            serde_json::from_slice(request.body.as_deref().expect("body")).expect("json");
        assert_eq!(sent["name"], "n");
    }

    #[test]
    fn header_precedence_prefers_explicit_transaction_id() {
        let mut defaults = HeaderMap::new();
        defaults.insert("x-team", HeaderValue::from_static("default"));
        let ctx = CallContext::new()
            .header("X-Team", "custom")
            .header("Accept", "application/vnd.custom+json")
            .header(TRANSACTION_ID_HEADER, "from-header")
            .transaction_id("explicit");

        let prepared = assemble(
            &GET_THING,
            &thing_params(),
            &RequestBody::Empty,
            &ctx,
            &defaults,
        )
        .expect("must assemble");
        let request = prepared
            .into_descriptor("https://example.test", None)
            .expect("must build url");

        assert_eq!(request.headers["x-team"], "custom");
        assert_eq!(request.headers[ACCEPT], "application/vnd.custom+json");
        assert_eq!(request.headers[TRANSACTION_ID_HEADER], "explicit");
    }

    #[test]
    fn declared_header_parameters_sit_between_defaults_and_custom_headers() {
        let mut defaults = HeaderMap::new();
        defaults.insert("x-request-id", HeaderValue::from_static("default"));
        let params = thing_params().header("x-request-id", "declared");

        let request = assemble(
            &GET_THING,
            &params,
            &RequestBody::Empty,
            &CallContext::new(),
            &defaults,
        )
        .expect("must assemble")
        .into_descriptor("https://example.test", None)
        .expect("must build url");
        assert_eq!(request.headers["x-request-id"], "declared");

        let ctx = CallContext::new().header("X-Request-Id", "custom");
        let request = assemble(&GET_THING, &params, &RequestBody::Empty, &ctx, &defaults)
            .expect("must assemble")
            .into_descriptor("https://example.test", None)
            .expect("must build url");
        assert_eq!(request.headers["x-request-id"], "custom");

        let err = assemble(
            &GET_THING,
            &thing_params().header("X-Undeclared", "v"),
            &RequestBody::Empty,
            &CallContext::new(),
            &HeaderMap::new(),
        )
        .expect_err("must fail");
        match err {
            ComplianceError::Validation(message) => assert!(message.contains("X-Undeclared")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn transaction_id_is_generated_when_absent() {
        let prepared = assemble(
            &GET_THING,
            &thing_params(),
            &RequestBody::Empty,
            &CallContext::new(),
            &HeaderMap::new(),
        )
        .expect("must assemble");
        let request = prepared
            .into_descriptor("https://example.test", None)
            .expect("must build url");

        let id = request.headers[TRANSACTION_ID_HEADER]
            .to_str()
            .expect("ascii");
        assert_eq!(id.len(), 36);
    }

    #[test]
    fn validation_runs_before_service_url_check() {
        let err = assemble(
            &GET_THING,
            &OperationParams::new(),
            &RequestBody::Empty,
            &CallContext::new(),
            &HeaderMap::new(),
        )
        .and_then(|prepared| prepared.into_descriptor("", None))
        .expect_err("must fail");
        assert!(matches!(err, ComplianceError::Validation(_)));
    }

    #[test]
    fn empty_service_url_is_a_config_error_at_call_time() {
        let prepared = assemble(
            &GET_THING,
            &thing_params(),
            &RequestBody::Empty,
            &CallContext::new(),
            &HeaderMap::new(),
        )
        .expect("must assemble");
        let err = prepared.into_descriptor("  ", None).expect_err("must fail");
        assert!(matches!(err, ComplianceError::Config(_)));
    }

    #[test]
    fn service_url_validation() {
        assert!(validate_service_url("").is_ok());
        assert!(validate_service_url("https://us-south.compliance.cloud.ibm.com").is_ok());
        assert!(matches!(
            validate_service_url("not a url"),
            Err(ComplianceError::Config(_))
        ));
        assert!(matches!(
            validate_service_url("ftp://example.test"),
            Err(ComplianceError::Config(_))
        ));
    }

    #[test]
    fn binary_operation_uses_declared_accept() {
        const DOWNLOAD: OperationDescriptor =
            OperationDescriptor::new("Download", HttpMethod::Get, "/reports/{id}")
                .path_params(&["id"])
                .response(ResponseShape::Binary("text/csv"));

        let prepared = assemble(
            &DOWNLOAD,
            &OperationParams::new().path("id", "r1"),
            &RequestBody::Empty,
            &CallContext::new(),
            &HeaderMap::new(),
        )
        .expect("must assemble");
        let request = prepared
            .into_descriptor("https://example.test", None)
            .expect("must build url");
        assert_eq!(request.headers[ACCEPT], "text/csv");
    }
}

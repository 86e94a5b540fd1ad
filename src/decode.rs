use serde::de::DeserializeOwned;

use crate::{ComplianceError, DetailedResponse, Problem, Response, ResponseShape, Result};

/// Decodes a response for a JSON or no-content operation.
pub(crate) fn decode_response<T: DeserializeOwned>(
    shape: ResponseShape,
    response: DetailedResponse,
) -> Result<Response<T>> {
    if !response.is_success() {
        return Err(status_error(response));
    }
    match shape {
        ResponseShape::NoContent => Ok(empty(response)),
        ResponseShape::Json | ResponseShape::Binary(_) => decode_json(response),
    }
}

/// Passes a success body through as raw bytes.
pub(crate) fn decode_binary(response: DetailedResponse) -> Result<Response<Vec<u8>>> {
    if !response.is_success() {
        return Err(status_error(response));
    }
    if response.body.is_empty() {
        return Ok(empty(response));
    }
    Ok(Response {
        result: Some(response.body.clone()),
        detailed: response,
    })
}

fn decode_json<T: DeserializeOwned>(response: DetailedResponse) -> Result<Response<T>> {
    if response.body.is_empty() {
        return Ok(empty(response));
    }

    if let Some(content_type) = response.content_type() {
        if !is_json_content_type(content_type) {
            let message = format!("expected a JSON response, got content type '{content_type}'");
            return Err(decode_error(message, response));
        }
    }

    match serde_json::from_slice::<T>(&response.body) {
        Ok(result) => Ok(Response {
            result: Some(result),
            detailed: response,
        }),
        Err(err) => {
            #[cfg(feature = "tracing")]
            tracing::debug!(status = response.status_code, "response body is not valid JSON: {}", err);

            let message = format!("invalid JSON response body: {err}");
            Err(decode_error(message, response))
        }
    }
}

/// Maps a non-2xx response to its error kind. A body that fails to parse
/// still yields an error for the status.
pub(crate) fn status_error(response: DetailedResponse) -> ComplianceError {
    let problem = Problem::from_response(&response);
    let response = Box::new(response);
    match response.status_code {
        401 | 403 => ComplianceError::Auth {
            message: problem.to_string(),
            response: Some(response),
        },
        500..=599 => ComplianceError::Server { problem, response },
        _ => ComplianceError::Client { problem, response },
    }
}

pub(crate) fn is_json_content_type(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type == "application/json" || media_type.ends_with("+json")
}

fn empty<T>(response: DetailedResponse) -> Response<T> {
    Response {
        result: None,
        detailed: response,
    }
}

fn decode_error(message: String, response: DetailedResponse) -> ComplianceError {
    ComplianceError::Decode {
        message,
        response: Box::new(response),
    }
}

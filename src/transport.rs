use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::header::HeaderMap;
use tokio::time::{timeout_at, Instant};

use crate::{ComplianceError, DetailedResponse, RequestDescriptor, Result};

/// Message carried by [`ComplianceError::Timeout`] when the caller deadline passes.
pub const DEADLINE_EXCEEDED: &str = "context deadline exceeded";

/// Sends one HTTP exchange and buffers the body.
///
/// When the request carries a deadline, the exchange is dropped once it
/// passes. Dropping the `reqwest` future closes the connection.
pub(crate) async fn send_once(
    http: &reqwest::Client,
    request: RequestDescriptor,
    attempt_timeout: Duration,
) -> Result<DetailedResponse> {
    let RequestDescriptor {
        method,
        url,
        headers,
        body,
        deadline,
    } = request;

    if deadline.is_some_and(|deadline| deadline <= Instant::now()) {
        return Err(ComplianceError::Timeout(DEADLINE_EXCEEDED.to_owned()));
    }

    let mut builder = http
        .request(method.into(), url)
        .headers(headers)
        .timeout(attempt_timeout);
    if let Some(body) = body {
        builder = builder.body(body);
    }

    let exchange = async move {
        let response = builder.send().await?;
        let status_code = response.status().as_u16();
        let headers = collect_headers(response.headers());
        let body = response.bytes().await?;
        Ok::<_, reqwest::Error>(DetailedResponse {
            status_code,
            headers,
            body: body.to_vec(),
        })
    };

    let outcome = match deadline {
        Some(deadline) => timeout_at(deadline, exchange)
            .await
            .map_err(|_| ComplianceError::Timeout(DEADLINE_EXCEEDED.to_owned()))?,
        None => exchange.await,
    };
    outcome.map_err(|err| map_reqwest_error(err, attempt_timeout))
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, String> {
    let mut collected = BTreeMap::<String, String>::new();
    for (name, value) in headers {
        let Ok(value) = value.to_str() else {
            continue;
        };
        collected
            .entry(name.as_str().to_owned())
            .and_modify(|existing| {
                existing.push_str(", ");
                existing.push_str(value);
            })
            .or_insert_with(|| value.to_owned());
    }
    collected
}

fn map_reqwest_error(err: reqwest::Error, attempt_timeout: Duration) -> ComplianceError {
    if err.is_timeout() {
        return ComplianceError::Timeout(format!(
            "client deadline exceeded after {} ms",
            attempt_timeout.as_millis()
        ));
    }
    ComplianceError::Transport(err)
}

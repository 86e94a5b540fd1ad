use std::collections::BTreeMap;

/// Raw response metadata: status, headers (lowercase names) and buffered body.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DetailedResponse {
    pub status_code: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl DetailedResponse {
    /// Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header("content-type")
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    /// Body as text, replacing invalid UTF-8.
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// Successful operation outcome.
///
/// `result` is `None` when the service answered 2xx with an empty body (or
/// the operation declares no response body). That is distinct from a decode
/// failure, which is always an error.
#[derive(Clone, Debug, PartialEq)]
pub struct Response<T> {
    pub result: Option<T>,
    pub detailed: DetailedResponse,
}

impl<T> Response<T> {
    pub fn status_code(&self) -> u16 {
        self.detailed.status_code
    }

    pub fn into_result(self) -> Option<T> {
        self.result
    }
}

/// Configures HTTP timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ClientOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of retries after the initial attempt. `0` disables retries.
    pub max_retries: usize,
    /// Base retry backoff in milliseconds (linear: `base * attempt`).
    pub retry_backoff_ms: u64,
    /// Optional cap on the total time spent across attempts.
    pub max_retry_elapsed_ms: Option<u64>,
    /// Re-attempt the call when a success response body fails to decode.
    pub retry_decode_errors: bool,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            max_retries: 0,
            retry_backoff_ms: 250,
            max_retry_elapsed_ms: None,
            retry_decode_errors: true,
        }
    }
}

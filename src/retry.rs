use std::time::Duration;

use tokio::time::Instant;

use crate::{ClientOptions, ComplianceError};

/// Retry configuration for one logical call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt. `0` makes the first failure terminal.
    pub max_retries: usize,
    /// Backoff unit; the delay before retry `n` is `base_delay * n`.
    pub base_delay: Duration,
    /// Cap on the time spent across all attempts.
    pub max_elapsed: Option<Duration>,
    /// Treat a malformed success body as retryable.
    pub retry_decode_errors: bool,
}

impl RetryPolicy {
    pub fn from_options(options: &ClientOptions) -> Self {
        Self {
            max_retries: options.max_retries,
            base_delay: Duration::from_millis(options.retry_backoff_ms),
            max_elapsed: options.max_retry_elapsed_ms.map(Duration::from_millis),
            retry_decode_errors: options.retry_decode_errors,
        }
    }

    /// Delay before the retry that follows attempt `attempt` (1-based).
    pub fn backoff(&self, attempt: usize) -> Duration {
        let factor = u32::try_from(attempt).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor)
    }

    /// Validation, configuration, authentication and 4xx failures are terminal.
    pub fn is_retryable(&self, err: &ComplianceError) -> bool {
        match err {
            ComplianceError::Decode { .. } => self.retry_decode_errors,
            other => other.is_retryable(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryDecision {
    Retry { delay: Duration },
    Stop,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum RetryPhase {
    Attempting,
    Exhausted,
}

/// Attempt bookkeeping for one logical call.
#[derive(Debug)]
pub(crate) struct RetryState {
    policy: RetryPolicy,
    attempts: usize,
    started: Instant,
    deadline: Option<Instant>,
    phase: RetryPhase,
}

impl RetryState {
    pub(crate) fn new(policy: RetryPolicy, deadline: Option<Instant>) -> Self {
        Self {
            policy,
            attempts: 0,
            started: Instant::now(),
            deadline,
            phase: RetryPhase::Attempting,
        }
    }

    /// Records the start of an attempt and returns its 1-based number.
    pub(crate) fn begin_attempt(&mut self) -> usize {
        self.attempts += 1;
        self.attempts
    }

    #[cfg(test)]
    pub(crate) fn phase(&self) -> RetryPhase {
        self.phase
    }

    /// Classifies a failed attempt.
    ///
    /// Stops when the error is terminal, the retry budget is spent, or the
    /// backoff would end past the deadline or the elapsed-time cap.
    pub(crate) fn after_failure(&mut self, err: &ComplianceError, now: Instant) -> RetryDecision {
        if self.phase == RetryPhase::Exhausted || !self.policy.is_retryable(err) {
            return self.exhaust();
        }
        if self.attempts > self.policy.max_retries {
            return self.exhaust();
        }

        let delay = self.policy.backoff(self.attempts);
        let Some(resume_at) = now.checked_add(delay) else {
            return self.exhaust();
        };
        if self.deadline.is_some_and(|deadline| resume_at >= deadline) {
            return self.exhaust();
        }
        if self
            .policy
            .max_elapsed
            .is_some_and(|cap| resume_at.saturating_duration_since(self.started) > cap)
        {
            return self.exhaust();
        }

        RetryDecision::Retry { delay }
    }

    fn exhaust(&mut self) -> RetryDecision {
        self.phase = RetryPhase::Exhausted;
        RetryDecision::Stop
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::time::Duration;

    use tokio::time::Instant;

    use super::{RetryDecision, RetryPhase, RetryPolicy, RetryState};
    use crate::{ComplianceError, DetailedResponse, Problem};

    fn policy(max_retries: usize, base_ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            base_delay: Duration::from_millis(base_ms),
            max_elapsed: None,
            retry_decode_errors: true,
        }
    }

    fn server_error() -> ComplianceError {
        ComplianceError::Server {
            problem: Problem::default(),
            response: Box::new(DetailedResponse {
                status_code: 503,
                headers: BTreeMap::new(),
                body: Vec::new(),
            }),
        }
    }

    fn decode_error() -> ComplianceError {
        ComplianceError::Decode {
            message: "bad json".to_owned(),
            response: Box::new(DetailedResponse::default()),
        }
    }

    #[test]
    fn zero_retries_stops_after_first_failure() {
        let mut state = RetryState::new(policy(0, 0), None);
        state.begin_attempt();
        assert_eq!(
            state.after_failure(&server_error(), Instant::now()),
            RetryDecision::Stop
        );
        assert_eq!(state.phase(), RetryPhase::Exhausted);
    }

    #[test]
    fn backoff_is_linear_in_attempt_number() {
        let mut state = RetryState::new(policy(3, 100), None);
        let now = Instant::now();

        state.begin_attempt();
        assert_eq!(
            state.after_failure(&server_error(), now),
            RetryDecision::Retry {
                delay: Duration::from_millis(100)
            }
        );
        state.begin_attempt();
        assert_eq!(
            state.after_failure(&server_error(), now),
            RetryDecision::Retry {
                delay: Duration::from_millis(200)
            }
        );
        state.begin_attempt();
        assert_eq!(
            state.after_failure(&server_error(), now),
            RetryDecision::Retry {
                delay: Duration::from_millis(300)
            }
        );
        state.begin_attempt();
        assert_eq!(state.after_failure(&server_error(), now), RetryDecision::Stop);
    }

    #[test]
    fn zero_base_delay_retries_immediately() {
        let mut state = RetryState::new(policy(2, 0), None);
        state.begin_attempt();
        assert_eq!(
            state.after_failure(&ComplianceError::Timeout("t".to_owned()), Instant::now()),
            RetryDecision::Retry {
                delay: Duration::ZERO
            }
        );
    }

    #[test]
    fn terminal_errors_are_never_retried() {
        let terminal = [
            ComplianceError::Validation("v".to_owned()),
            ComplianceError::Config("c".to_owned()),
            ComplianceError::Auth {
                message: "a".to_owned(),
                response: None,
            },
            ComplianceError::Client {
                problem: Problem::default(),
                response: Box::new(DetailedResponse {
                    status_code: 404,
                    ..DetailedResponse::default()
                }),
            },
        ];
        for err in terminal {
            let mut state = RetryState::new(policy(5, 0), None);
            state.begin_attempt();
            assert_eq!(
                state.after_failure(&err, Instant::now()),
                RetryDecision::Stop,
                "{err}"
            );
        }
    }

    #[test]
    fn decode_errors_follow_policy_flag() {
        let mut enabled = RetryState::new(policy(1, 0), None);
        enabled.begin_attempt();
        assert!(matches!(
            enabled.after_failure(&decode_error(), Instant::now()),
            RetryDecision::Retry { .. }
        ));

        let mut disabled = RetryState::new(
            RetryPolicy {
                retry_decode_errors: false,
                ..policy(1, 0)
            },
            None,
        );
        disabled.begin_attempt();
        assert_eq!(
            disabled.after_failure(&decode_error(), Instant::now()),
            RetryDecision::Stop
        );
    }

    #[test]
    fn backoff_never_sleeps_past_deadline() {
        let now = Instant::now();
        let mut state = RetryState::new(policy(3, 50), Some(now + Duration::from_millis(20)));
        state.begin_attempt();
        assert_eq!(state.after_failure(&server_error(), now), RetryDecision::Stop);
    }

    #[test]
    fn expired_deadline_stops_even_with_zero_backoff() {
        let now = Instant::now();
        let mut state = RetryState::new(policy(3, 0), Some(now));
        state.begin_attempt();
        assert_eq!(
            state.after_failure(&ComplianceError::Timeout("t".to_owned()), now),
            RetryDecision::Stop
        );
    }

    #[test]
    fn elapsed_cap_limits_retries() {
        let mut state = RetryState::new(
            RetryPolicy {
                max_elapsed: Some(Duration::from_millis(150)),
                ..policy(5, 100)
            },
            None,
        );
        let now = Instant::now();
        state.begin_attempt();
        assert!(matches!(
            state.after_failure(&server_error(), now),
            RetryDecision::Retry { .. }
        ));
        state.begin_attempt();
        assert_eq!(state.after_failure(&server_error(), now), RetryDecision::Stop);
    }

    #[test]
    fn policy_from_options() {
        let options = crate::ClientOptions {
            max_retries: 4,
            retry_backoff_ms: 10,
            ..crate::ClientOptions::default()
        };
        let policy = RetryPolicy::from_options(&options);
        assert_eq!(policy.max_retries, 4);
        assert_eq!(policy.backoff(3), Duration::from_millis(30));
    }
}

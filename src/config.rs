use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::{
    auth::{AUTHTYPE_BASIC, AUTHTYPE_BEARER_TOKEN, AUTHTYPE_NOAUTH},
    Authenticator, BasicAuthenticator, BearerTokenAuthenticator, ComplianceError,
    NoAuthAuthenticator, Result,
};

/// Environment prefix used by [`crate::ComplianceClient::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "COMPLIANCE";

/// Credentials resolved from configuration.
#[derive(Clone)]
pub enum AuthScheme {
    NoAuth,
    Basic { username: String, password: String },
    BearerToken { token: String },
}

impl fmt::Debug for AuthScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAuth => f.write_str("NoAuth"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::BearerToken { .. } => f
                .debug_struct("BearerToken")
                .field("token", &"<redacted>")
                .finish(),
        }
    }
}

impl AuthScheme {
    /// Builds the authenticator; credential checks happen here.
    pub fn authenticator(&self) -> Result<Arc<dyn Authenticator>> {
        Ok(match self {
            Self::NoAuth => Arc::new(NoAuthAuthenticator::new()),
            Self::Basic { username, password } => {
                Arc::new(BasicAuthenticator::new(username.clone(), password.clone())?)
            }
            Self::BearerToken { token } => Arc::new(BearerTokenAuthenticator::new(token)?),
        })
    }
}

/// Service URL, credentials and retry settings for one client.
#[derive(Clone, Debug)]
pub struct ServiceConfig {
    pub service_url: Option<String>,
    pub auth: AuthScheme,
    /// `(max_retries, base_delay)` when retries are enabled.
    pub retries: Option<(usize, Duration)>,
}

impl ServiceConfig {
    /// Reads the configuration from environment variables.
    ///
    /// Reads, for prefix `P`:
    /// - `P_URL`: service URL (optional)
    /// - `P_AUTH_TYPE`: `noauth`, `basic` or `bearertoken`
    /// - `P_USERNAME` / `P_PASSWORD`: basic credentials
    /// - `P_BEARER_TOKEN`: bearer token
    /// - `P_ENABLE_RETRIES`, `P_MAX_RETRIES`, `P_RETRY_INTERVAL_MS`
    pub fn from_env(prefix: &str) -> Result<Self> {
        Self::from_lookup(prefix, |key| std::env::var(key).ok())
    }

    /// Same as [`ServiceConfig::from_env`] with a custom key lookup.
    pub fn from_lookup<F>(prefix: &str, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |suffix: &str| {
            lookup(&format!("{prefix}_{suffix}"))
                .map(|value| value.trim().to_owned())
                .filter(|value| !value.is_empty())
        };
        let require = |suffix: &str| {
            get(suffix).ok_or_else(|| {
                ComplianceError::Config(format!("missing {prefix}_{suffix} environment variable"))
            })
        };

        let auth_type = require("AUTH_TYPE")?;
        let auth = if auth_type.eq_ignore_ascii_case(AUTHTYPE_NOAUTH) {
            AuthScheme::NoAuth
        } else if auth_type.eq_ignore_ascii_case(AUTHTYPE_BASIC) {
            AuthScheme::Basic {
                username: require("USERNAME")?,
                password: require("PASSWORD")?,
            }
        } else if auth_type.eq_ignore_ascii_case(AUTHTYPE_BEARER_TOKEN) {
            AuthScheme::BearerToken {
                token: require("BEARER_TOKEN")?,
            }
        } else {
            return Err(ComplianceError::Config(format!(
                "unrecognized authentication type '{auth_type}'"
            )));
        };

        let retries = match get("ENABLE_RETRIES") {
            Some(flag) if parse_flag(&flag)? => {
                let max_retries = get("MAX_RETRIES")
                    .map(|value| parse_number(prefix, "MAX_RETRIES", &value))
                    .transpose()?
                    .unwrap_or(DEFAULT_MAX_RETRIES);
                let interval_ms = get("RETRY_INTERVAL_MS")
                    .map(|value| parse_number(prefix, "RETRY_INTERVAL_MS", &value))
                    .transpose()?
                    .unwrap_or(0);
                Some((max_retries as usize, Duration::from_millis(interval_ms)))
            }
            _ => None,
        };

        Ok(Self {
            service_url: get("URL"),
            auth,
            retries,
        })
    }
}

const DEFAULT_MAX_RETRIES: u64 = 4;

fn parse_flag(value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(ComplianceError::Config(format!(
            "invalid boolean value '{other}'"
        ))),
    }
}

fn parse_number(prefix: &str, suffix: &str, value: &str) -> Result<u64> {
    value.parse::<u64>().map_err(|err| {
        ComplianceError::Config(format!("invalid {prefix}_{suffix} value '{value}': {err}"))
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{AuthScheme, ServiceConfig};
    use crate::ComplianceError;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn reads_basic_configuration() {
        let config = ServiceConfig::from_lookup(
            "SCC",
            lookup(&[
                ("SCC_URL", "https://scc.test"),
                ("SCC_AUTH_TYPE", "Basic"),
                ("SCC_USERNAME", "user"),
                ("SCC_PASSWORD", "pass"),
            ]),
        )
        .expect("must parse");

        assert_eq!(config.service_url.as_deref(), Some("https://scc.test"));
        assert!(matches!(config.auth, AuthScheme::Basic { .. }));
        assert!(config.retries.is_none());
        assert_eq!(
            config.auth.authenticator().expect("valid").authentication_type(),
            "basic"
        );
    }

    #[test]
    fn debug_redacts_credentials() {
        let config = ServiceConfig::from_lookup(
            "SCC",
            lookup(&[
                ("SCC_AUTH_TYPE", "basic"),
                ("SCC_USERNAME", "user"),
                ("SCC_PASSWORD", "hunter2-secret"),
            ]),
        )
        .expect("must parse");
        let debug = format!("{config:?}");
        assert!(debug.contains("user"));
        assert!(!debug.contains("hunter2-secret"));

        let bearer = AuthScheme::BearerToken {
            token: "token-value".to_owned(),
        };
        assert!(!format!("{bearer:?}").contains("token-value"));
    }

    #[test]
    fn unknown_auth_type_is_config_error() {
        let err = ServiceConfig::from_lookup("SCC", lookup(&[("SCC_AUTH_TYPE", "kerberos")]))
            .expect_err("must fail");
        assert!(matches!(err, ComplianceError::Config(_)));
    }

    #[test]
    fn missing_auth_type_is_config_error() {
        let err = ServiceConfig::from_lookup("SCC", lookup(&[])).expect_err("must fail");
        match err {
            ComplianceError::Config(message) => assert!(message.contains("SCC_AUTH_TYPE")),
            other => panic!("expected config error, got {other:?}"),
        }
    }

    #[test]
    fn missing_basic_password_is_config_error() {
        let err = ServiceConfig::from_lookup(
            "SCC",
            lookup(&[("SCC_AUTH_TYPE", "basic"), ("SCC_USERNAME", "user")]),
        )
        .expect_err("must fail");
        assert!(matches!(err, ComplianceError::Config(_)));
    }

    #[test]
    fn retry_settings_are_parsed() {
        let config = ServiceConfig::from_lookup(
            "SCC",
            lookup(&[
                ("SCC_AUTH_TYPE", "noauth"),
                ("SCC_ENABLE_RETRIES", "true"),
                ("SCC_MAX_RETRIES", "3"),
                ("SCC_RETRY_INTERVAL_MS", "20"),
            ]),
        )
        .expect("must parse");
        assert_eq!(config.retries, Some((3, Duration::from_millis(20))));
    }

    #[test]
    fn invalid_retry_count_is_config_error() {
        let err = ServiceConfig::from_lookup(
            "SCC",
            lookup(&[
                ("SCC_AUTH_TYPE", "noauth"),
                ("SCC_ENABLE_RETRIES", "true"),
                ("SCC_MAX_RETRIES", "many"),
            ]),
        )
        .expect_err("must fail");
        assert!(matches!(err, ComplianceError::Config(_)));
    }
}

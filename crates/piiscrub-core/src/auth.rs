//! Authentication gate
//!
//! HTTP Basic credentials are compared in constant time. The gate's shape
//! is fixed at startup from [`AuthConfig`].

use crate::config::AuthConfig;
use crate::error::AuthError;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use subtle::ConstantTimeEq;

/// Configured username/password pair
#[derive(Clone)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Compare both fields without short-circuiting
    fn matches(&self, username: &str, password: &str) -> bool {
        let user_ok = self.username.as_bytes().ct_eq(username.as_bytes());
        let pass_ok = self.password.as_bytes().ct_eq(password.as_bytes());
        bool::from(user_ok & pass_ok)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"***")
            .finish()
    }
}

/// Who made the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    Anonymous,
    User(String),
}

impl Identity {
    pub fn as_str(&self) -> &str {
        match self {
            Identity::Anonymous => "anonymous",
            Identity::User(name) => name,
        }
    }
}

#[derive(Debug, Clone)]
pub enum AuthGate {
    Disabled,
    Enabled { credentials: Option<Credentials> },
}

impl AuthGate {
    pub fn from_config(config: &AuthConfig) -> Self {
        if !config.enabled {
            return AuthGate::Disabled;
        }

        let credentials = match (&config.username, &config.password) {
            (Some(u), Some(p)) if !u.is_empty() && !p.is_empty() => {
                Some(Credentials::new(u.clone(), p.clone()))
            }
            _ => None,
        };

        AuthGate::Enabled { credentials }
    }

    pub fn is_enabled(&self) -> bool {
        matches!(self, AuthGate::Enabled { .. })
    }

    /// Check the presented `(username, password)` pair
    pub fn check(&self, presented: Option<(&str, &str)>) -> Result<Identity, AuthError> {
        let credentials = match self {
            AuthGate::Disabled => return Ok(Identity::Anonymous),
            AuthGate::Enabled { credentials } => credentials,
        };

        let Some((username, password)) = presented else {
            return Err(AuthError::MissingCredentials);
        };

        let Some(expected) = credentials else {
            return Err(AuthError::NotConfigured);
        };

        if expected.matches(username, password) {
            Ok(Identity::User(username.to_string()))
        } else {
            Err(AuthError::InvalidCredentials)
        }
    }
}

/// Parse an `Authorization: Basic ...` header value into `(username, password)`
pub fn parse_basic(header: &str) -> Option<(String, String)> {
    let (scheme, encoded) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("basic") {
        return None;
    }

    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

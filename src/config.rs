//! Session configuration

use std::time::Duration;

/// Configuration for the session middleware
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Secret key(s) for signing cookies.
    /// The first secret is used for signing new cookies.
    /// All secrets are tried when verifying signatures (for secret rotation).
    /// Empty by default: without a secret no cookie is accepted or issued.
    pub secrets: Vec<String>,

    /// Name of the session cookie (default: "_session_id")
    pub cookie_name: String,

    /// Cookie path (default: "/")
    pub cookie_path: String,

    /// Cookie domain (default: None - current domain only)
    pub cookie_domain: Option<String>,

    /// HttpOnly flag for cookie (default: true)
    pub cookie_http_only: bool,

    /// Secure flag for cookie (default: false)
    pub cookie_secure: bool,

    /// SameSite attribute for cookie
    pub cookie_same_site: SameSite,

    /// Cookie max age in seconds (default: None = browser-session cookie)
    pub max_age: Option<u64>,

    /// Write every session back after the request, modified or not (default: true).
    /// When false, only sessions touched by a handler are written.
    pub resave: bool,
}

/// SameSite cookie attribute
#[derive(Clone, Debug, PartialEq)]
pub enum SameSite {
    /// Strict - cookie only sent for same-site requests
    Strict,
    /// Lax - cookie sent for same-site requests and top-level navigations
    Lax,
    /// None - cookie sent for all requests (requires Secure)
    None,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secrets: Vec::new(),
            cookie_name: "_session_id".to_string(),
            cookie_path: "/".to_string(),
            cookie_domain: None,
            cookie_http_only: true,
            cookie_secure: false,
            cookie_same_site: SameSite::Lax,
            max_age: None,
            resave: true,
        }
    }
}

impl SessionConfig {
    /// Create a new session configuration with the given secret
    pub fn new<S: Into<String>>(secret: S) -> Self {
        Self {
            secrets: vec![secret.into()],
            ..Default::default()
        }
    }

    /// Create a new session configuration with multiple secrets for rotation
    pub fn with_secrets<I, S>(secrets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            secrets: secrets.into_iter().map(|s| s.into()).collect(),
            ..Default::default()
        }
    }

    /// Set the cookie name (default: "_session_id")
    pub fn with_cookie_name<S: Into<String>>(mut self, name: S) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Set the cookie path (default: "/")
    pub fn with_cookie_path<S: Into<String>>(mut self, path: S) -> Self {
        self.cookie_path = path.into();
        self
    }

    /// Set the cookie domain
    pub fn with_cookie_domain<S: Into<String>>(mut self, domain: S) -> Self {
        self.cookie_domain = Some(domain.into());
        self
    }

    /// Set the HttpOnly flag (default: true)
    pub fn with_http_only(mut self, http_only: bool) -> Self {
        self.cookie_http_only = http_only;
        self
    }

    /// Set the Secure flag (default: false)
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.cookie_secure = secure;
        self
    }

    /// Set the SameSite attribute (default: Lax)
    pub fn with_same_site(mut self, same_site: SameSite) -> Self {
        self.cookie_same_site = same_site;
        self
    }

    /// Set max age in seconds
    /// Pass None for session cookie (expires when browser closes)
    pub fn with_max_age(mut self, max_age: impl Into<Option<u64>>) -> Self {
        self.max_age = max_age.into();
        self
    }

    /// Set max age from Duration
    pub fn with_max_age_duration(mut self, duration: impl Into<Option<Duration>>) -> Self {
        self.max_age = duration.into().map(|d| d.as_secs());
        self
    }

    /// Set whether unmodified sessions are written back (default: true)
    pub fn with_resave(mut self, resave: bool) -> Self {
        self.resave = resave;
        self
    }

    /// Secret used to sign new cookies
    pub fn signing_secret(&self) -> Option<&str> {
        self.secrets.first().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let config = SessionConfig::with_secrets(["new", "old"])
            .with_cookie_name("sid")
            .with_max_age_duration(Duration::from_secs(3600))
            .with_same_site(SameSite::Strict)
            .with_resave(false);

        assert_eq!(config.signing_secret(), Some("new"));
        assert_eq!(config.secrets.len(), 2);
        assert_eq!(config.cookie_name, "sid");
        assert_eq!(config.max_age, Some(3600));
        assert_eq!(config.cookie_same_site, SameSite::Strict);
        assert!(!config.resave);
    }

    #[test]
    fn test_defaults() {
        let config = SessionConfig::new("secret");
        assert_eq!(config.cookie_name, "_session_id");
        assert_eq!(config.max_age, None);
        assert!(config.resave);
        assert!(config.cookie_http_only);
    }

    #[test]
    fn test_default_has_no_secret() {
        let config = SessionConfig::default();
        assert!(config.secrets.is_empty());
        assert_eq!(config.signing_secret(), None);
    }
}

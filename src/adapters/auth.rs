use crate::domain::{
    descriptor::AuthDescriptor,
    errors::{DomainError, Result},
};

pub const API_KEY_ENV: &str = "GRC_MCP_API_KEY";
pub const AUTH_DISABLED_ENV: &str = "GRC_MCP_AUTH_DISABLED";

/// Fails closed: without an API key every call is rejected unless auth was
/// explicitly disabled.
#[derive(Debug, Clone)]
pub struct BearerAuth {
    api_key: Option<String>,
    disabled: bool,
    token_header: String,
    token_prefix: String,
}

impl BearerAuth {
    pub fn new(api_key: Option<String>, descriptor: &AuthDescriptor) -> Self {
        Self {
            api_key: api_key.filter(|key| !key.trim().is_empty()),
            disabled: false,
            token_header: descriptor.configuration.token_header.clone(),
            token_prefix: descriptor.configuration.token_prefix.trim().to_string(),
        }
    }

    /// Lets every call through. Only for local development and tests.
    pub fn disabled(descriptor: &AuthDescriptor) -> Self {
        Self {
            disabled: true,
            ..Self::new(None, descriptor)
        }
    }

    pub fn from_env(descriptor: &AuthDescriptor) -> Self {
        if parse_disabled_flag(std::env::var(AUTH_DISABLED_ENV).ok().as_deref()) {
            return Self::disabled(descriptor);
        }
        Self::new(std::env::var(API_KEY_ENV).ok(), descriptor)
    }

    pub fn is_enabled(&self) -> bool {
        !self.disabled
    }

    pub fn has_key(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn token_header(&self) -> &str {
        &self.token_header
    }

    pub fn validate_token(&self, token: &str) -> bool {
        matches!(&self.api_key, Some(key) if !token.is_empty() && token == key)
    }

    pub fn authorize(&self, header_value: Option<&str>) -> Result<()> {
        if self.disabled {
            return Ok(());
        }
        if self.api_key.is_none() {
            return Err(DomainError::Unauthorized(format!(
                "no API key configured; set {}",
                API_KEY_ENV
            )));
        }

        let raw = header_value
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| {
                DomainError::Unauthorized(format!("missing '{}' credentials", self.token_header))
            })?;

        let token = if self.token_prefix.is_empty() {
            raw
        } else {
            raw.strip_prefix(self.token_prefix.as_str())
                .filter(|rest| rest.starts_with(char::is_whitespace))
                .map(str::trim)
                .ok_or_else(|| {
                    DomainError::Unauthorized(format!(
                        "'{}' must look like '{} <token>'",
                        self.token_header, self.token_prefix
                    ))
                })?
        };

        if self.validate_token(token) {
            Ok(())
        } else {
            Err(DomainError::Unauthorized("invalid token".into()))
        }
    }
}

fn parse_disabled_flag(raw: Option<&str>) -> bool {
    matches!(
        raw.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("1" | "true" | "yes")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::descriptor::AuthConfiguration;

    fn descriptor(prefix: &str) -> AuthDescriptor {
        AuthDescriptor {
            kind: "bearer".into(),
            description: "Bearer token authentication".into(),
            configuration: AuthConfiguration {
                token_header: "Authorization".into(),
                token_prefix: prefix.into(),
            },
        }
    }

    #[test]
    fn test_validate_token() {
        let auth = BearerAuth::new(Some("secret".into()), &descriptor("Bearer"));
        assert!(auth.validate_token("secret"));
        assert!(!auth.validate_token("wrong"));
        assert!(!auth.validate_token(""));
    }

    #[test]
    fn test_without_key_every_call_is_rejected() {
        let auth = BearerAuth::new(None, &descriptor("Bearer"));
        assert!(auth.is_enabled());
        assert!(!auth.has_key());
        assert!(!auth.validate_token("anything"));
        for header in [None, Some(""), Some("Bearer anything")] {
            assert!(
                matches!(auth.authorize(header), Err(DomainError::Unauthorized(_))),
                "{:?}",
                header
            );
        }

        let blank = BearerAuth::new(Some("  ".into()), &descriptor("Bearer"));
        assert!(!blank.has_key());
        assert!(blank.authorize(Some("Bearer   ")).is_err());
    }

    #[test]
    fn test_disabled_auth_lets_calls_through() {
        let auth = BearerAuth::disabled(&descriptor("Bearer"));
        assert!(!auth.is_enabled());
        assert!(auth.authorize(None).is_ok());
        assert!(auth.authorize(Some("Bearer whatever")).is_ok());
    }

    #[test]
    fn test_parse_disabled_flag() {
        for on in ["1", "true", "TRUE", " yes "] {
            assert!(parse_disabled_flag(Some(on)), "{}", on);
        }
        for off in ["", "0", "false", "no", "off"] {
            assert!(!parse_disabled_flag(Some(off)), "{}", off);
        }
        assert!(!parse_disabled_flag(None));
    }

    #[test]
    fn test_authorize_strips_prefix() {
        let auth = BearerAuth::new(Some("secret".into()), &descriptor("Bearer"));
        assert_eq!(auth.token_header(), "Authorization");
        assert!(auth.authorize(Some("Bearer secret")).is_ok());
        assert!(auth.authorize(Some("  Bearer   secret ")).is_ok());

        for bad in [None, Some(""), Some("secret"), Some("Bearersecret"), Some("Bearer nope")] {
            assert!(
                matches!(auth.authorize(bad), Err(DomainError::Unauthorized(_))),
                "{:?}",
                bad
            );
        }
    }

    #[test]
    fn test_authorize_without_prefix() {
        let auth = BearerAuth::new(Some("secret".into()), &descriptor(""));
        assert!(auth.authorize(Some("secret")).is_ok());
        assert!(auth.authorize(Some("Bearer secret")).is_err());
    }
}

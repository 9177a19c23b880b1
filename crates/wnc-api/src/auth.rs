use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::HeaderValue;
use secrecy::{ExposeSecret, SecretString};

use crate::error::Error;

/// Credentials presented to the controller's RESTCONF endpoint.
///
/// The controller authenticates every request independently; there is no
/// session. Token material is kept in [`SecretString`] and only exposed
/// when the `Authorization` header is built.
#[derive(Debug, Clone)]
pub enum Credentials {
    /// Pre-encoded `base64(username:password)` token, sent as
    /// `Authorization: Basic <token>`.
    Basic { token: SecretString },

    /// Opaque bearer token, sent as `Authorization: Bearer <token>`.
    Bearer { token: SecretString },

    /// No `Authorization` header (lab controllers, auth-injecting proxies).
    None,
}

impl Credentials {
    /// Encode a username/password pair into a Basic token.
    pub fn basic(username: &str, password: &SecretString) -> Self {
        let raw = format!("{username}:{}", password.expose_secret());
        Self::Basic {
            token: SecretString::from(STANDARD.encode(raw)),
        }
    }

    pub fn basic_token(token: impl Into<String>) -> Self {
        Self::Basic {
            token: SecretString::from(token.into()),
        }
    }

    pub fn bearer(token: impl Into<String>) -> Self {
        Self::Bearer {
            token: SecretString::from(token.into()),
        }
    }

    /// Rejects a Basic/Bearer credential whose token is blank.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        match self {
            Self::Basic { token } | Self::Bearer { token }
                if token.expose_secret().trim().is_empty() =>
            {
                Err(Error::empty("token"))
            }
            _ => Ok(()),
        }
    }

    /// Build the sensitive `Authorization` header value, if any.
    pub(crate) fn header_value(&self) -> Result<Option<HeaderValue>, Error> {
        let raw = match self {
            Self::Basic { token } => format!("Basic {}", token.expose_secret()),
            Self::Bearer { token } => format!("Bearer {}", token.expose_secret()),
            Self::None => return Ok(None),
        };
        let mut value =
            HeaderValue::from_str(&raw).map_err(|_| Error::validation("token", "<redacted>"))?;
        value.set_sensitive(true);
        Ok(Some(value))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn basic_encodes_user_and_password() {
        let creds = Credentials::basic("admin", &SecretString::from("secret".to_string()));
        let value = creds.header_value().unwrap().unwrap();
        assert_eq!(value.to_str().unwrap(), "Basic YWRtaW46c2VjcmV0");
        assert!(value.is_sensitive());
    }

    #[test]
    fn bearer_header() {
        let value = Credentials::bearer("abc").header_value().unwrap().unwrap();
        assert_eq!(value.to_str().unwrap(), "Bearer abc");
    }

    #[test]
    fn none_has_no_header() {
        assert!(Credentials::None.header_value().unwrap().is_none());
    }

    #[test]
    fn blank_token_is_rejected() {
        let err = Credentials::basic_token("   ").validate().unwrap_err();
        assert!(matches!(err, Error::EmptyParameter { ref parameter } if parameter == "token"));
    }

    #[test]
    fn token_is_redacted_in_debug() {
        let rendered = format!("{:?}", Credentials::bearer("top-secret"));
        assert!(!rendered.contains("top-secret"));
    }
}

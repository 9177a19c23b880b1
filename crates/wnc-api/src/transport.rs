// Client configuration and reqwest::Client construction.
//
// A `ClientConfig` is built once, validated, and then shared read-only by
// every request for the life of the process. All TLS, timeout, and
// header setup for the RESTCONF transport lives here.

use std::path::PathBuf;
use std::time::Duration;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue};
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::identifier::require_non_empty;

/// Media type for YANG-modeled JSON (RFC 8040).
pub const YANG_DATA_JSON: &str = "application/yang-data+json";

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// TLS verification mode.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsMode {
    /// Use the system certificate store.
    #[default]
    System,
    /// Use a custom CA certificate from the given PEM file.
    CustomCa(PathBuf),
    /// Accept any certificate (for self-signed controllers).
    DangerAcceptInvalid,
}

/// Immutable connection settings for one controller.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    controller: Url,
    credentials: Credentials,
    timeout: Duration,
    tls: TlsMode,
    user_agent: String,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Controller base URL, always ending in `/`.
    pub fn controller(&self) -> &Url {
        &self.controller
    }

    pub fn credentials(&self) -> &Credentials {
        &self.credentials
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn tls(&self) -> &TlsMode {
        &self.tls
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    /// Default headers sent on every RESTCONF request.
    fn default_headers(&self) -> Result<HeaderMap, Error> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(YANG_DATA_JSON));
        if let Some(auth) = self.credentials.header_value()? {
            headers.insert(AUTHORIZATION, auth);
        }
        Ok(headers)
    }

    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.as_str())
            .default_headers(self.default_headers()?);

        match &self.tls {
            TlsMode::System => {}
            TlsMode::CustomCa(path) => {
                let cert_pem = std::fs::read(path)
                    .map_err(|e| Error::Tls(format!("failed to read CA cert: {e}")))?;
                let cert = reqwest::Certificate::from_pem(&cert_pem)
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            TlsMode::DangerAcceptInvalid => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}

/// Validating builder for [`ClientConfig`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    controller: Option<String>,
    credentials: Credentials,
    timeout: Duration,
    tls: TlsMode,
    user_agent: String,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            controller: None,
            credentials: Credentials::None,
            timeout: DEFAULT_TIMEOUT,
            tls: TlsMode::default(),
            user_agent: concat!("wnc-api/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

impl ClientConfigBuilder {
    /// Controller base URL or bare host. A bare host is taken as `https://`.
    pub fn controller(mut self, controller: impl Into<String>) -> Self {
        self.controller = Some(controller.into());
        self
    }

    pub fn credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn tls(mut self, tls: TlsMode) -> Self {
        self.tls = tls;
        self
    }

    /// Shorthand for toggling certificate verification.
    pub fn insecure(self, insecure: bool) -> Self {
        if insecure {
            self.tls(TlsMode::DangerAcceptInvalid)
        } else {
            self.tls(TlsMode::System)
        }
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    pub fn build(self) -> Result<ClientConfig, Error> {
        let raw = require_non_empty("controller", self.controller.as_deref())?;
        let controller = normalize_controller(&raw)?;

        if self.timeout.is_zero() {
            return Err(Error::validation("timeout", format!("{:?}", self.timeout)));
        }
        self.credentials.validate()?;

        Ok(ClientConfig {
            controller,
            credentials: self.credentials,
            timeout: self.timeout,
            tls: self.tls,
            user_agent: self.user_agent,
        })
    }
}

/// Parse the controller URL, defaulting to `https://` and forcing a
/// trailing slash so RESTCONF roots join underneath any path prefix.
fn normalize_controller(raw: &str) -> Result<Url, Error> {
    let candidate = if raw.contains("://") {
        raw.to_owned()
    } else {
        format!("https://{raw}")
    };

    let mut url = Url::parse(&candidate).map_err(|_| Error::validation("controller", raw))?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(Error::validation("controller", raw));
    }

    let path = url.path().trim_end_matches('/').to_owned();
    url.set_path(&format!("{path}/"));
    url.set_query(None);
    url.set_fragment(None);
    Ok(url)
}

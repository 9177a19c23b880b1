//! Profile configuration for wnc clients.
//!
//! TOML profiles layered with environment overrides, credential
//! resolution (env + keyring + plaintext), and translation to
//! `wnc_api::ClientConfig`. Applications load a profile once at startup
//! and hand the resulting config to `wnc_api::RestconfClient`.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use wnc_api::{ClientConfig, Credentials, TlsMode};

const KEYRING_SERVICE: &str = "wnc";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no credentials configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("unknown profile '{profile}'")]
    UnknownProfile { profile: String },

    #[error("invalid client settings: {0}")]
    Client(#[from] wnc_api::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when none is named explicitly.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named controller profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Look up a profile by name, falling back to `default_profile`.
    pub fn profile<'a>(&'a self, name: Option<&'a str>) -> Result<(&'a str, &'a Profile), ConfigError> {
        let name = name
            .or(self.default_profile.as_deref())
            .unwrap_or("default");
        self.profiles
            .get(name)
            .map(|profile| (name, profile))
            .ok_or_else(|| ConfigError::UnknownProfile {
                profile: name.into(),
            })
    }

    /// Resolve a profile straight into a `ClientConfig`.
    pub fn client_config(&self, name: Option<&str>) -> Result<ClientConfig, ConfigError> {
        let (name, profile) = self.profile(name)?;
        profile_to_client_config(profile, name, &self.defaults)
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub insecure: bool,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            insecure: false,
        }
    }
}

fn default_timeout() -> u64 {
    60
}

/// How a stored token is presented to the controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Pre-encoded `base64(user:pass)`.
    #[default]
    Basic,
    Bearer,
}

/// A named controller profile.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Controller URL or host (e.g., "https://wnc1.example.net").
    pub controller: String,

    /// Token (plaintext — prefer keyring or env var).
    pub token: Option<String>,

    /// Environment variable name containing the token.
    pub token_env: Option<String>,

    #[serde(default)]
    pub token_kind: TokenKind,

    /// Username for Basic auth when no token is configured.
    pub username: Option<String>,

    /// Password (plaintext — prefer keyring or `WNC_PASSWORD`).
    pub password: Option<String>,

    /// Path to custom CA certificate.
    pub ca_cert: Option<PathBuf>,

    /// Override insecure TLS setting.
    pub insecure: Option<bool>,

    /// Override timeout (seconds).
    pub timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("net", "wnc", "wnc").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("wnc");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load Config from `path`, layered over defaults and under `WNC_*`
/// environment variables (`WNC_DEFAULTS__TIMEOUT=10`).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    debug!(path = %path.display(), "loading config");

    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WNC_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_secret(profile_name: &str, item: &str) -> Option<String> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &format!("{profile_name}/{item}")).ok()?;
    entry.get_password().ok()
}

/// Resolve a token from the credential chain: env var, keyring, plaintext.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    // 1. Profile's token_env → env var lookup
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    // 2. System keyring
    if let Some(secret) = keyring_secret(profile_name, "token") {
        return Some(SecretString::from(secret));
    }

    // 3. Plaintext in config
    profile.token.clone().map(SecretString::from)
}

/// Resolve a password for Basic auth: `WNC_PASSWORD`, keyring, plaintext.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Ok(pw) = std::env::var("WNC_PASSWORD") {
        return Some(SecretString::from(pw));
    }
    if let Some(pw) = keyring_secret(profile_name, "password") {
        return Some(SecretString::from(pw));
    }
    profile.password.clone().map(SecretString::from)
}

/// Resolve `Credentials` for a profile: a token if one is found, otherwise
/// username + password encoded as Basic.
pub fn resolve_credentials(
    profile: &Profile,
    profile_name: &str,
) -> Result<Credentials, ConfigError> {
    if let Some(token) = resolve_token(profile, profile_name) {
        return Ok(match profile.token_kind {
            TokenKind::Basic => Credentials::Basic { token },
            TokenKind::Bearer => Credentials::Bearer { token },
        });
    }

    if let Some(ref username) = profile.username {
        if let Some(password) = resolve_password(profile, profile_name) {
            return Ok(Credentials::basic(username, &password));
        }
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Build a `ClientConfig` from a profile and the global defaults.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    if profile.controller.trim().is_empty() {
        return Err(ConfigError::Validation {
            field: "controller".into(),
            reason: format!("profile '{profile_name}' has no controller"),
        });
    }

    let credentials = resolve_credentials(profile, profile_name)?;

    let tls = if profile.insecure.unwrap_or(defaults.insecure) {
        TlsMode::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsMode::CustomCa(ca_path.clone())
    } else {
        TlsMode::System
    };

    let timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));

    Ok(ClientConfig::builder()
        .controller(profile.controller.as_str())
        .credentials(credentials)
        .timeout(timeout)
        .tls(tls)
        .build()?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;
    use secrecy::ExposeSecret;

    use super::*;

    const SAMPLE: &str = r#"
default_profile = "lab"

[defaults]
timeout = 15

[profiles.lab]
controller = "wnc-lab.example.net"
token = "YWRtaW46c2VjcmV0"

[profiles.prod]
controller = "https://wnc1.example.net"
username = "ops"
password = "hunter2"
ca_cert = "/etc/wnc/ca.pem"
timeout = 90

[profiles.cloud]
controller = "https://gw.example.net/wnc"
token = "abc"
token_kind = "bearer"
insecure = true
"#;

    fn load_sample() -> Config {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, SAMPLE).unwrap();
        load_config_from(&path).unwrap()
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 60);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "default_profile = [unterminated").unwrap();
        assert!(matches!(load_config_from(&path), Err(ConfigError::Figment(_))));
    }

    #[test]
    fn default_profile_is_used() {
        let cfg = load_sample();
        let (name, profile) = cfg.profile(None).unwrap();
        assert_eq!(name, "lab");
        assert_eq!(profile.controller, "wnc-lab.example.net");
    }

    #[test]
    fn unknown_profile() {
        let cfg = load_sample();
        let err = cfg.profile(Some("nope")).unwrap_err();
        assert_eq!(err.to_string(), "unknown profile 'nope'");
    }

    #[test]
    fn token_profile_to_client_config() {
        let cfg = load_sample();
        let client = cfg.client_config(Some("lab")).unwrap();
        assert_eq!(client.controller().as_str(), "https://wnc-lab.example.net/");
        assert_eq!(client.timeout(), Duration::from_secs(15));
        assert_eq!(client.tls(), &TlsMode::System);
        match client.credentials() {
            Credentials::Basic { token } => assert_eq!(token.expose_secret(), "YWRtaW46c2VjcmV0"),
            other => panic!("expected Basic, got {other:?}"),
        }
    }

    #[test]
    fn username_password_profile() {
        let cfg = load_sample();
        let (name, profile) = cfg.profile(Some("prod")).unwrap();
        let client = profile_to_client_config(profile, name, &cfg.defaults).unwrap();
        assert_eq!(client.timeout(), Duration::from_secs(90));
        assert_eq!(
            client.tls(),
            &TlsMode::CustomCa(PathBuf::from("/etc/wnc/ca.pem"))
        );
        assert!(matches!(client.credentials(), Credentials::Basic { .. }));
    }

    #[test]
    fn bearer_and_insecure() {
        let cfg = load_sample();
        let client = cfg.client_config(Some("cloud")).unwrap();
        assert_eq!(client.tls(), &TlsMode::DangerAcceptInvalid);
        assert_eq!(client.controller().as_str(), "https://gw.example.net/wnc/");
        assert!(matches!(client.credentials(), Credentials::Bearer { .. }));
    }

    #[test]
    fn unset_token_env_falls_through_to_plaintext() {
        let profile = Profile {
            controller: "wnc".into(),
            token: Some("plain".into()),
            token_env: Some("WNC_TEST_TOKEN_THAT_IS_NEVER_SET".into()),
            ..Profile::default()
        };
        let token = resolve_token(&profile, "test-fallthrough").unwrap();
        assert_eq!(token.expose_secret(), "plain");
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn keyring_token_beats_plaintext() {
        let entry = keyring::Entry::new(KEYRING_SERVICE, "test-keyring/token").unwrap();
        if entry.set_password("from-keyring").is_err() {
            // No session keyring available (e.g. restricted sandbox).
            return;
        }

        let profile = Profile {
            controller: "wnc".into(),
            token: Some("plain".into()),
            ..Profile::default()
        };
        let token = resolve_token(&profile, "test-keyring");
        let _ = entry.delete_credential();

        assert_eq!(token.unwrap().expose_secret(), "from-keyring");
    }

    #[test]
    fn no_credentials() {
        let profile = Profile {
            controller: "wnc".into(),
            ..Profile::default()
        };
        let err = resolve_credentials(&profile, "bare").unwrap_err();
        assert_eq!(err.to_string(), "no credentials configured for profile 'bare'");
    }

    #[test]
    fn blank_controller_is_rejected() {
        let profile = Profile {
            controller: "  ".into(),
            token: Some("t".into()),
            ..Profile::default()
        };
        let err = profile_to_client_config(&profile, "blank", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn zero_timeout_surfaces_client_error() {
        let profile = Profile {
            controller: "wnc".into(),
            token: Some("t".into()),
            timeout: Some(0),
            ..Profile::default()
        };
        let err = profile_to_client_config(&profile, "zero", &Defaults::default()).unwrap_err();
        assert!(matches!(err, ConfigError::Client(wnc_api::Error::Validation { .. })));
    }

    #[test]
    fn save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "default".into(),
            Profile {
                controller: "wnc".into(),
                token_env: Some("WNC_TOKEN".into()),
                ..Profile::default()
            },
        );
        save_config_to(&cfg, &path).unwrap();

        let reloaded = load_config_from(&path).unwrap();
        let (_, profile) = reloaded.profile(None).unwrap();
        assert_eq!(profile.token_env.as_deref(), Some("WNC_TOKEN"));
        assert_eq!(profile.token_kind, TokenKind::Basic);
    }
}

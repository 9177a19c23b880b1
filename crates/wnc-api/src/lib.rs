// wnc-api: Async RESTCONF client core for Cisco Catalyst wireless LAN controllers

pub mod auth;
pub mod client;
pub mod context;
pub mod envelope;
pub mod error;
pub mod identifier;
pub mod path;
pub mod transport;

pub use auth::Credentials;
pub use client::RestconfClient;
pub use context::RequestContext;
pub use envelope::{Envelope, decode_envelope};
pub use error::{BoxError, Error, ErrorKind};
pub use identifier::{
    MacAddress, TagKind, is_valid_mac_address, is_valid_tag_name, normalize_mac_address,
    require_non_empty, validate_mac_address, validate_tag_name,
};
pub use path::{KeyValue, ResourceKind, ResourcePath, build_path};
pub use transport::{ClientConfig, ClientConfigBuilder, TlsMode};

pub use reqwest::Method;
pub use tokio_util::sync::CancellationToken;

// RESTCONF request executor.
//
// One call, one round trip: build the URL from a `ResourcePath`, send,
// race the exchange against the caller's context, classify the status,
// and unwrap the single-key envelope into the caller's type. No retries,
// no caching, no background tasks.

use std::sync::Arc;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::time::Instant;
use tracing::{debug, trace};
use url::Url;

use crate::context::RequestContext;
use crate::envelope::{Envelope, decode_envelope, decode_member};
use crate::error::Error;
use crate::path::{ResourceKind, ResourcePath};
use crate::transport::{ClientConfig, YANG_DATA_JSON};

const MESSAGE_PREVIEW: usize = 200;

// ── Error response shape (RFC 8040 §7.1) ────────────────────────────

#[derive(serde::Deserialize)]
struct ErrorResponse {
    #[serde(rename = "ietf-restconf:errors", alias = "errors")]
    errors: ErrorList,
}

#[derive(serde::Deserialize)]
struct ErrorList {
    #[serde(default)]
    error: Vec<ErrorEntry>,
}

#[derive(serde::Deserialize)]
struct ErrorEntry {
    #[serde(rename = "error-tag", default)]
    error_tag: Option<String>,
    #[serde(rename = "error-message", default)]
    error_message: Option<String>,
}

// ── Client ───────────────────────────────────────────────────────────

/// Async RESTCONF client for a single controller.
///
/// Cheap to clone; clones share the connection pool and the immutable
/// [`ClientConfig`]. Safe to use from many tasks at once: there is no
/// mutable state between calls, and concurrent calls are not serialized.
#[derive(Debug, Clone)]
pub struct RestconfClient {
    http: reqwest::Client,
    config: Arc<ClientConfig>,
}

impl RestconfClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build the transport from `config` (TLS, timeout, auth headers).
    pub fn new(config: ClientConfig) -> Result<Self, Error> {
        let http = config.build_client()?;
        Ok(Self::from_reqwest(config, http))
    }

    /// Wrap an existing `reqwest::Client`.
    ///
    /// The caller owns transport setup; `config` still supplies the
    /// controller URL and the timeout reported in [`Error::Timeout`].
    pub fn from_reqwest(config: ClientConfig, http: reqwest::Client) -> Self {
        Self {
            http,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Absolute URL for a resource: `{controller}/restconf/{data|operations}/{path}`.
    pub fn url_for(&self, path: &ResourcePath) -> Result<Url, Error> {
        let relative = format!("{}/{path}", path.kind().root());
        Ok(self.config.controller().join(&relative)?)
    }

    // ── Generic executor ─────────────────────────────────────────────

    /// Perform one exchange and decode the response envelope into `T`.
    ///
    /// `body` must already be enveloped (see [`Envelope`]).
    pub async fn execute<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &ResourcePath,
        body: Option<Value>,
    ) -> Result<T, Error> {
        let text = self.round_trip(ctx, method, path, body).await?;
        decode_envelope(&text, path)
    }

    /// Perform one exchange and discard any response body.
    pub async fn execute_void(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &ResourcePath,
        body: Option<Value>,
    ) -> Result<(), Error> {
        self.round_trip(ctx, method, path, body).await.map(drop)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub async fn get<T: DeserializeOwned>(
        &self,
        ctx: &RequestContext,
        path: &ResourcePath,
    ) -> Result<T, Error> {
        self.execute(ctx, Method::GET, path, None).await
    }

    /// Replace the resource with `payload`, wrapped under the node name.
    pub async fn put<B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &ResourcePath,
        payload: &B,
    ) -> Result<(), Error> {
        let body = Envelope::for_path(path, payload)?;
        self.execute_void(ctx, Method::PUT, path, Some(body)).await
    }

    /// Like [`put`](Self::put) for endpoints that echo the stored resource.
    ///
    /// Returns `None` when the controller accepts the write with an empty
    /// 2xx body.
    pub async fn put_with_response<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &ResourcePath,
        payload: &B,
    ) -> Result<Option<T>, Error> {
        let body = Envelope::for_path(path, payload)?;
        let text = self.round_trip(ctx, Method::PUT, path, Some(body)).await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        decode_envelope(&text, path).map(Some)
    }

    /// Create a resource with `payload`, wrapped under the node name.
    pub async fn post<B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &ResourcePath,
        payload: &B,
    ) -> Result<(), Error> {
        let body = Envelope::for_path(path, payload)?;
        self.execute_void(ctx, Method::POST, path, Some(body)).await
    }

    /// Merge `payload` into the resource.
    pub async fn patch<B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &ResourcePath,
        payload: &B,
    ) -> Result<(), Error> {
        let body = Envelope::for_path(path, payload)?;
        self.execute_void(ctx, Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, ctx: &RequestContext, path: &ResourcePath) -> Result<(), Error> {
        self.execute_void(ctx, Method::DELETE, path, None).await
    }

    // ── RPC operations ───────────────────────────────────────────────

    /// Invoke an RPC whose reply carries no output.
    pub async fn rpc<B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &ResourcePath,
        input: &B,
    ) -> Result<(), Error> {
        let body = Envelope::rpc_input(path, input)?;
        self.execute_void(ctx, Method::POST, path, Some(body)).await
    }

    /// Invoke an RPC and decode its `<module>:output` member.
    ///
    /// Returns `None` when the RPC completes with an empty 2xx body.
    pub async fn rpc_with_output<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        ctx: &RequestContext,
        path: &ResourcePath,
        input: &B,
    ) -> Result<Option<T>, Error> {
        let body = Envelope::rpc_input(path, input)?;
        let text = self.round_trip(ctx, Method::POST, path, Some(body)).await?;
        if text.trim().is_empty() {
            return Ok(None);
        }
        decode_member(&text, path, &Envelope::rpc_output_name(path)).map(Some)
    }

    // ── Exchange ─────────────────────────────────────────────────────

    /// Send one request and return the body of a 2xx response.
    async fn round_trip(
        &self,
        ctx: &RequestContext,
        method: Method,
        path: &ResourcePath,
        body: Option<Value>,
    ) -> Result<String, Error> {
        if ctx.is_cancelled() {
            return Err(Error::Cancelled);
        }
        if ctx.is_expired() {
            return Err(Error::DeadlineExceeded);
        }

        let url = self.url_for(path)?;
        debug!("{method} {url}");

        let mut request = self.http.request(method.clone(), url);
        if let Some(body) = body {
            request = request
                .header(CONTENT_TYPE, YANG_DATA_JSON)
                .body(serde_json::to_vec(&body)?);
        }

        let started = Instant::now();
        let exchange = async {
            let resp = request.send().await?;
            let status = resp.status();
            let text = resp.text().await?;
            Ok::<_, reqwest::Error>((status, text))
        };

        let (status, text) = tokio::select! {
            biased;
            () = ctx.cancelled() => {
                debug!(%method, %path, "request cancelled");
                return Err(Error::Cancelled);
            }
            () = ctx.expired() => {
                debug!(%method, %path, "request deadline exceeded");
                return Err(Error::Timeout { after: started.elapsed() });
            }
            result = exchange => result.map_err(|e| self.transport_error(e))?,
        };

        trace!(%status, elapsed = ?started.elapsed(), "response received");
        classify_status(&method, path, status, text)
    }

    fn transport_error(&self, err: reqwest::Error) -> Error {
        if err.is_timeout() {
            Error::Timeout {
                after: self.config.timeout(),
            }
        } else {
            Error::Transport(err)
        }
    }
}

// ── Status classification ────────────────────────────────────────────

/// Verb used in operation-failure messages.
fn action_for(method: &Method, kind: ResourceKind) -> &'static str {
    match (method.as_str(), kind) {
        ("POST", ResourceKind::Operation) => "invoke",
        ("GET", _) => "get",
        ("PUT", _) => "update",
        ("POST", _) => "create",
        ("PATCH", _) => "patch",
        ("DELETE", _) => "delete",
        _ => "request",
    }
}

/// Map a completed exchange onto success, not-found, or operation failure.
fn classify_status(
    method: &Method,
    path: &ResourcePath,
    status: StatusCode,
    body: String,
) -> Result<String, Error> {
    if status.is_success() {
        return Ok(body);
    }

    if status == StatusCode::NOT_FOUND {
        return Err(Error::ResourceNotFound {
            path: path.to_string(),
        });
    }

    let cause = if status == StatusCode::UNAUTHORIZED {
        Error::Unauthorized
    } else {
        Error::HttpStatus {
            status: status.as_u16(),
            message: error_message(status, &body),
        }
    };

    Err(Error::service_operation(
        action_for(method, path.kind()),
        "resource",
        path.to_string(),
        cause,
    ))
}

/// Best human-readable message from an error response body.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(parsed) = serde_json::from_str::<ErrorResponse>(body) {
        let first = parsed
            .errors
            .error
            .into_iter()
            .find_map(|e| e.error_message.or(e.error_tag));
        if let Some(message) = first {
            return message;
        }
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        return status
            .canonical_reason()
            .unwrap_or("unknown status")
            .to_owned();
    }

    let mut end = trimmed.len().min(MESSAGE_PREVIEW);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    trimmed[..end].to_owned()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::path::build_path;

    fn client() -> RestconfClient {
        let config = ClientConfig::builder()
            .controller("https://wnc.example.net")
            .build()
            .unwrap();
        RestconfClient::from_reqwest(config, reqwest::Client::new())
    }

    #[test]
    fn data_url() {
        let path = build_path(
            "Cisco-IOS-XE-wireless-ap-cfg:ap-cfg-data",
            Some("ap-tags/ap-tag"),
            &["aa:bb:cc:dd:ee:ff".into()],
        );
        assert_eq!(
            client().url_for(&path).unwrap().as_str(),
            "https://wnc.example.net/restconf/data/Cisco-IOS-XE-wireless-ap-cfg:ap-cfg-data/ap-tags/ap-tag=aa%3Abb%3Acc%3Add%3Aee%3Aff"
        );
    }

    #[test]
    fn operation_url() {
        let path = ResourcePath::operation("Cisco-IOS-XE-wireless-access-point-cmd-rpc:ap-reset");
        assert_eq!(
            client().url_for(&path).unwrap().as_str(),
            "https://wnc.example.net/restconf/operations/Cisco-IOS-XE-wireless-access-point-cmd-rpc:ap-reset"
        );
    }

    #[test]
    fn actions() {
        assert_eq!(action_for(&Method::GET, ResourceKind::Data), "get");
        assert_eq!(action_for(&Method::PUT, ResourceKind::Data), "update");
        assert_eq!(action_for(&Method::POST, ResourceKind::Data), "create");
        assert_eq!(action_for(&Method::POST, ResourceKind::Operation), "invoke");
        assert_eq!(action_for(&Method::DELETE, ResourceKind::Data), "delete");
    }

    #[test]
    fn restconf_error_message_is_preferred() {
        let body = r#"{"ietf-restconf:errors":{"error":[{"error-type":"application","error-tag":"invalid-value","error-message":"tag does not exist"}]}}"#;
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, body),
            "tag does not exist"
        );
    }

    #[test]
    fn error_tag_is_the_fallback() {
        let body = r#"{"ietf-restconf:errors":{"error":[{"error-tag":"access-denied"}]}}"#;
        assert_eq!(error_message(StatusCode::FORBIDDEN, body), "access-denied");
    }

    #[test]
    fn empty_body_uses_reason_phrase() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, ""),
            "Internal Server Error"
        );
    }

    #[test]
    fn raw_body_is_truncated() {
        let body = "x".repeat(500);
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, &body).len(), MESSAGE_PREVIEW);
    }

    #[test]
    fn success_passes_body_through() {
        let path = build_path("m:c", None, &[]);
        let body = classify_status(&Method::GET, &path, StatusCode::OK, "{}".into()).unwrap();
        assert_eq!(body, "{}");
    }

    #[test]
    fn server_error_is_wrapped() {
        let path = build_path("m:c", Some("l"), &[]);
        let err = classify_status(
            &Method::PUT,
            &path,
            StatusCode::INTERNAL_SERVER_ERROR,
            String::new(),
        )
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to update resource m:c/l: HTTP 500: Internal Server Error"
        );
        assert_eq!(err.status(), Some(500));
    }

    #[test]
    fn unauthorized_is_wrapped() {
        let path = build_path("m:c", None, &[]);
        let err =
            classify_status(&Method::GET, &path, StatusCode::UNAUTHORIZED, String::new()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to get resource m:c: authentication rejected by controller"
        );
    }

    #[test]
    fn not_found_is_not_wrapped() {
        let path = build_path("m:c", None, &[]);
        let err =
            classify_status(&Method::GET, &path, StatusCode::NOT_FOUND, String::new()).unwrap_err();
        assert!(matches!(err, Error::ResourceNotFound { .. }));
    }
}

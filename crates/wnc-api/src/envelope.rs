// ── Single-top-level-key JSON envelopes ──
//
// Every RESTCONF body, inbound or outbound, is an object with exactly one
// member named after the module-qualified node. Responses are unwrapped
// here; request payloads are wrapped here.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::Error;
use crate::path::ResourcePath;

const BODY_PREVIEW: usize = 200;

fn preview(body: &str) -> &str {
    let mut end = body.len().min(BODY_PREVIEW);
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

fn malformed(message: impl std::fmt::Display, body: &str) -> Error {
    Error::Decode {
        message: format!("{message} (body preview: {:?})", preview(body)),
        body: body.to_owned(),
    }
}

/// Decode a response body into `T` by unwrapping its single top-level key.
///
/// An empty body, `{}`, or a member whose value is `null` or `[]` means the
/// controller has nothing at `path`.
pub fn decode_envelope<T: DeserializeOwned>(body: &str, path: &ResourcePath) -> Result<T, Error> {
    decode_member(body, path, &path.node_name())
}

/// Same as [`decode_envelope`] with an explicit expected member name
/// (RPC replies are keyed `<module>:output`, not by the RPC name).
pub(crate) fn decode_member<T: DeserializeOwned>(
    body: &str,
    path: &ResourcePath,
    expected: &str,
) -> Result<T, Error> {
    if body.trim().is_empty() {
        return Err(not_found(path));
    }

    let value: Value = serde_json::from_str(body).map_err(|e| malformed(e, body))?;
    let Value::Object(map) = value else {
        return Err(malformed("expected a JSON object", body));
    };

    let mut members = map.into_iter();
    let Some((key, inner)) = members.next() else {
        return Err(not_found(path));
    };
    if members.next().is_some() {
        return Err(malformed("expected exactly one top-level key", body));
    }

    match &inner {
        Value::Null => return Err(not_found(path)),
        Value::Array(items) if items.is_empty() => return Err(not_found(path)),
        _ => {}
    }

    if key != expected {
        warn!(%key, %expected, "envelope key does not match requested node");
    }

    serde_json::from_value(inner).map_err(|e| malformed(e, body))
}

fn not_found(path: &ResourcePath) -> Error {
    Error::ResourceNotFound {
        path: path.to_string(),
    }
}

/// Builders for outbound request envelopes.
pub struct Envelope;

impl Envelope {
    /// `{"<node_name>": payload}`.
    pub fn wrap<B: Serialize + ?Sized>(node_name: &str, payload: &B) -> Result<Value, Error> {
        let mut map = Map::with_capacity(1);
        map.insert(node_name.to_owned(), serde_json::to_value(payload)?);
        Ok(Value::Object(map))
    }

    /// Write envelope for a data resource, keyed by the path's node name.
    pub fn for_path<B: Serialize + ?Sized>(path: &ResourcePath, payload: &B) -> Result<Value, Error> {
        Self::wrap(&path.node_name(), payload)
    }

    /// RPC input envelope: `{"<module>:input": payload}`.
    pub fn rpc_input<B: Serialize + ?Sized>(path: &ResourcePath, payload: &B) -> Result<Value, Error> {
        Self::wrap(&Self::qualified(path, "input"), payload)
    }

    /// Name of the RPC output member: `<module>:output`.
    pub fn rpc_output_name(path: &ResourcePath) -> String {
        Self::qualified(path, "output")
    }

    fn qualified(path: &ResourcePath, leaf: &str) -> String {
        match path.module() {
            Some(module) => format!("{module}:{leaf}"),
            None => leaf.to_owned(),
        }
    }
}

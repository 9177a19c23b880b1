// ── RESTCONF resource paths ──
//
// All list-key encoding happens here. Service code hands over raw key
// values and never escapes anything itself.

use std::fmt;

use crate::identifier::MacAddress;

/// Separator between the components of a composite list key.
const KEY_SEPARATOR: &str = ",";

/// Which RESTCONF root a path hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// Configuration/operational data under `/restconf/data/`.
    Data,
    /// RPC operations under `/restconf/operations/`.
    Operation,
}

impl ResourceKind {
    pub fn root(self) -> &'static str {
        match self {
            Self::Data => "restconf/data",
            Self::Operation => "restconf/operations",
        }
    }
}

/// A single scalar component of a YANG list key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum KeyValue {
    Text(String),
    Integer(i64),
    Unsigned(u64),
    Bool(bool),
}

impl KeyValue {
    /// Percent-encode this component. Only RFC 3986 unreserved characters
    /// pass through, so `:` becomes `%3A` and `,` becomes `%2C`.
    fn encoded(&self) -> String {
        match self {
            Self::Text(s) => urlencoding::encode(s).into_owned(),
            Self::Integer(n) => n.to_string(),
            Self::Unsigned(n) => n.to_string(),
            Self::Bool(b) => b.to_string(),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(s) => f.write_str(s),
            Self::Integer(n) => write!(f, "{n}"),
            Self::Unsigned(n) => write!(f, "{n}"),
            Self::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for KeyValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&String> for KeyValue {
    fn from(s: &String) -> Self {
        Self::Text(s.clone())
    }
}

impl From<&MacAddress> for KeyValue {
    fn from(mac: &MacAddress) -> Self {
        Self::Text(mac.as_str().to_owned())
    }
}

impl From<MacAddress> for KeyValue {
    fn from(mac: MacAddress) -> Self {
        Self::from(&mac)
    }
}

macro_rules! key_value_from_int {
    ($variant:ident: $($ty:ty),+) => {
        $(
            impl From<$ty> for KeyValue {
                fn from(n: $ty) -> Self {
                    Self::$variant(n.into())
                }
            }
        )+
    };
}

key_value_from_int!(Integer: i8, i16, i32, i64);
key_value_from_int!(Unsigned: u8, u16, u32, u64);

impl From<bool> for KeyValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// Canonical RESTCONF resource locator, relative to its root.
///
/// Built from a module-qualified container (`module:container-data`),
/// optional child segments, and an optional key predicate on the last
/// segment. The rendered string never contains an unescaped reserved
/// character inside a key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourcePath {
    kind: ResourceKind,
    segments: Vec<String>,
    keys: Vec<KeyValue>,
}

impl ResourcePath {
    /// A data-tree path rooted at a module-qualified container.
    pub fn data(container: impl Into<String>) -> Self {
        Self::rooted(ResourceKind::Data, container.into())
    }

    /// An RPC path (`module:rpc-name`) under the operations root.
    pub fn operation(rpc: impl Into<String>) -> Self {
        Self::rooted(ResourceKind::Operation, rpc.into())
    }

    fn rooted(kind: ResourceKind, head: String) -> Self {
        let segments = head
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect();
        Self {
            kind,
            segments,
            keys: Vec::new(),
        }
    }

    /// Append a child node (list or leaf). A key predicate already on the
    /// current last segment is frozen into that segment.
    pub fn child(mut self, name: impl AsRef<str>) -> Self {
        if !self.keys.is_empty() {
            let keyed = self.last_with_keys();
            if let Some(last) = self.segments.last_mut() {
                *last = keyed;
            }
            self.keys.clear();
        }
        self.segments.extend(
            name.as_ref()
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
        );
        self
    }

    /// Attach list-key values to the last segment, in YANG-declared order.
    pub fn keys<K>(mut self, keys: impl IntoIterator<Item = K>) -> Self
    where
        K: Into<KeyValue>,
    {
        self.keys.extend(keys.into_iter().map(Into::into));
        self
    }

    /// Attach a single list key to the last segment.
    pub fn key(self, key: impl Into<KeyValue>) -> Self {
        self.keys([key.into()])
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// The YANG module prefix of the first segment, if qualified.
    pub fn module(&self) -> Option<&str> {
        self.segments
            .first()
            .and_then(|s| s.split_once(':'))
            .map(|(module, _)| module)
    }

    /// Module-qualified name of the addressed node, as it appears as the
    /// top-level key of a response or write envelope.
    pub fn node_name(&self) -> String {
        let last = self
            .segments
            .last()
            .and_then(|s| s.split('=').next())
            .unwrap_or_default();
        if last.contains(':') {
            return last.to_owned();
        }
        match self.module() {
            Some(module) => format!("{module}:{last}"),
            None => last.to_owned(),
        }
    }

    fn last_with_keys(&self) -> String {
        let last = self.segments.last().cloned().unwrap_or_default();
        if self.keys.is_empty() {
            return last;
        }
        let joined = self
            .keys
            .iter()
            .map(KeyValue::encoded)
            .collect::<Vec<_>>()
            .join(KEY_SEPARATOR);
        format!("{last}={joined}")
    }

    /// The rendered path, relative to the RESTCONF root.
    pub fn as_string(&self) -> String {
        let mut parts: Vec<String> = self.segments.clone();
        if let Some(last) = parts.last_mut() {
            *last = self.last_with_keys();
        }
        parts.join("/")
    }
}

impl fmt::Display for ResourcePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// One-shot path composition.
///
/// - no sub-resource, no keys: `container`
/// - sub-resource, no keys: `container/sub`
/// - keys: `container/sub=k1,k2` (or `container=k1` without a sub-resource)
pub fn build_path(container: &str, sub_resource: Option<&str>, keys: &[KeyValue]) -> ResourcePath {
    let mut path = ResourcePath::data(container);
    if let Some(sub) = sub_resource {
        path = path.child(sub);
    }
    path.keys(keys.iter().cloned())
}

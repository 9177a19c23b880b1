// ── Identifier normalization ──
//
// MAC addresses and tag names are validated here before they are used as
// RESTCONF list keys or payload fields. Nothing in this module does I/O.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Error;

const MAC_PARAMETER: &str = "MAC address";

// ── MAC addresses ───────────────────────────────────────────────────

/// Parse one of the accepted MAC forms into its six octets.
///
/// Accepted: `aa:bb:cc:dd:ee:ff`, `aa-bb-cc-dd-ee-ff`, `aabb.ccdd.eeff`.
/// Case-insensitive; separators may not be mixed.
fn parse_octets(raw: &str) -> Option<[u8; 6]> {
    let raw = raw.trim();
    let groups: Vec<&str> = if raw.contains(':') {
        raw.split(':').collect()
    } else if raw.contains('-') {
        raw.split('-').collect()
    } else if raw.contains('.') {
        raw.split('.').collect()
    } else {
        return None;
    };

    let group_len = match groups.len() {
        6 => 2,
        3 if raw.contains('.') => 4,
        _ => return None,
    };

    let mut hex = String::with_capacity(12);
    for group in &groups {
        if group.len() != group_len || !group.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        hex.push_str(group);
    }

    let mut octets = [0u8; 6];
    for (i, octet) in octets.iter_mut().enumerate() {
        let pair = hex.get(i * 2..i * 2 + 2)?;
        *octet = u8::from_str_radix(pair, 16).ok()?;
    }
    Some(octets)
}

fn format_octets(octets: &[u8; 6]) -> String {
    octets
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(":")
}

/// Returns `true` if `raw` is a MAC address in one of the accepted forms.
pub fn is_valid_mac_address(raw: &str) -> bool {
    parse_octets(raw).is_some()
}

/// Fails with [`Error::Validation`] unless `raw` parses as six hex octets.
pub fn validate_mac_address(raw: &str) -> Result<(), Error> {
    if is_valid_mac_address(raw) {
        Ok(())
    } else {
        Err(Error::validation(MAC_PARAMETER, raw))
    }
}

/// Canonicalize a MAC address to lowercase, colon-separated form.
///
/// Idempotent: a canonical input is returned unchanged.
pub fn normalize_mac_address(raw: &str) -> Result<String, Error> {
    parse_octets(raw)
        .map(|octets| format_octets(&octets))
        .ok_or_else(|| Error::validation(MAC_PARAMETER, raw))
}

/// A validated MAC address in canonical form (`aa:bb:cc:dd:ee:ff`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct MacAddress(String);

impl MacAddress {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self, Error> {
        normalize_mac_address(raw.as_ref()).map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MacAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for MacAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for MacAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

// ── Tag names ───────────────────────────────────────────────────────

/// The tag families a wireless controller assigns to access points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagKind {
    Site,
    Policy,
    Rf,
}

impl TagKind {
    /// Parameter name used in validation errors.
    pub fn parameter(self) -> &'static str {
        match self {
            Self::Site => "site tag name",
            Self::Policy => "policy tag name",
            Self::Rf => "RF tag name",
        }
    }
}

/// Returns `true` if `name` is non-empty after trimming whitespace.
pub fn is_valid_tag_name(name: &str) -> bool {
    !name.trim().is_empty()
}

/// Validate a tag name and return it trimmed.
pub fn validate_tag_name(kind: TagKind, name: Option<&str>) -> Result<String, Error> {
    require_non_empty(kind.parameter(), name)
}

/// Generic required-and-non-blank check, returning the trimmed value.
pub fn require_non_empty(parameter: &str, value: Option<&str>) -> Result<String, Error> {
    let value = value.ok_or_else(|| Error::required(parameter))?;
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::empty(parameter));
    }
    Ok(trimmed.to_owned())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ACCEPTED: &[&str] = &[
        "aa:bb:cc:dd:ee:ff",
        "AA:BB:CC:DD:EE:FF",
        "AA-BB-CC-DD-EE-FF",
        "aabb.ccdd.eeff",
        "AaBb.CcDd.EeFf",
        "  00:11:22:33:44:55 ",
    ];

    #[test]
    fn normalizes_every_accepted_form() {
        for raw in ACCEPTED {
            let canonical = normalize_mac_address(raw).unwrap();
            assert_eq!(canonical.len(), 17, "{raw}");
            assert_eq!(canonical, canonical.to_lowercase(), "{raw}");
            assert_eq!(canonical.split(':').count(), 6, "{raw}");
        }
        assert_eq!(
            normalize_mac_address("AA-BB-CC-DD-EE-FF").unwrap(),
            "aa:bb:cc:dd:ee:ff"
        );
        assert_eq!(
            normalize_mac_address("aabb.ccdd.eeff").unwrap(),
            "aa:bb:cc:dd:ee:ff"
        );
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ACCEPTED {
            let once = normalize_mac_address(raw).unwrap();
            let twice = normalize_mac_address(&once).unwrap();
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn rejects_malformed_input() {
        for raw in [
            "invalid-mac",
            "",
            "gg:gg:gg:gg:gg:gg",
            "aa:bb:cc:dd:ee",
            "aa:bb:cc:dd:ee:ff:00",
            "aabbccddeeff",
            "aa:bb-cc:dd:ee:ff",
            "aab.bcc.dde.eff",
            "a:bb:cc:dd:ee:fff",
        ] {
            assert!(!is_valid_mac_address(raw), "{raw:?}");
            let err = validate_mac_address(raw).unwrap_err();
            assert!(err.is_validation());
        }
    }

    #[test]
    fn validation_error_names_the_input() {
        let err = normalize_mac_address("invalid-mac").unwrap_err();
        assert_eq!(err.to_string(), "invalid MAC address: invalid-mac");
    }

    #[test]
    fn mac_address_newtype() {
        let mac: MacAddress = "AA-BB-CC-DD-EE-FF".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
        assert!("zz".parse::<MacAddress>().is_err());
    }

    #[test]
    fn mac_address_serde_validates() {
        let mac: MacAddress = serde_json::from_str("\"AABB.CCDD.EEFF\"").unwrap();
        assert_eq!(mac.as_str(), "aa:bb:cc:dd:ee:ff");
        assert_eq!(serde_json::to_string(&mac).unwrap(), "\"aa:bb:cc:dd:ee:ff\"");
        assert!(serde_json::from_str::<MacAddress>("\"nope\"").is_err());
    }

    #[test]
    fn tag_names() {
        assert_eq!(
            validate_tag_name(TagKind::Site, Some("  default-site-tag ")).unwrap(),
            "default-site-tag"
        );
        assert!(matches!(
            validate_tag_name(TagKind::Policy, None),
            Err(Error::RequiredParameter { .. })
        ));
        let err = validate_tag_name(TagKind::Rf, Some(" \t")).unwrap_err();
        assert_eq!(err.to_string(), "RF tag name cannot be empty");
        assert!(is_valid_tag_name("x"));
        assert!(!is_valid_tag_name("   "));
    }
}

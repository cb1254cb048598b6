//! Property bundle decoding
//!
//! Apple metadata bundles (`Info.plist`) arrive either as XML or binary
//! property lists. Only top-level scalar values matter for identity, so a
//! bundle is flattened into a string map: strings are kept as-is, numbers
//! and booleans are stringified, containers and data blobs are ignored.
//!
//! [`parse_plist_dump`] reads the human-readable text printed by
//! `plutil -p` into the same shape.

use crate::error::{Error, Result};
use std::collections::HashMap;
use std::io::Cursor;

/// Display name
pub const DISPLAY_NAME: &str = "CFBundleDisplayName";
/// Localized display name
pub const DISPLAY_NAME_LOCALIZED: &str = "CFBundleDisplayNameLocalized";
/// Short bundle name
pub const BUNDLE_NAME: &str = "CFBundleName";
/// Executable name
pub const EXECUTABLE: &str = "CFBundleExecutable";
/// Bundle identifier
pub const IDENTIFIER: &str = "CFBundleIdentifier";
/// Marketing version
pub const SHORT_VERSION: &str = "CFBundleShortVersionString";
/// Build number
pub const BUNDLE_VERSION: &str = "CFBundleVersion";

/// Flat key → string view of a property list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PropertyBundle {
    values: HashMap<String, String>,
}

impl PropertyBundle {
    /// Decode an XML or binary property list
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let value = ::plist::Value::from_reader(Cursor::new(bytes))
            .map_err(|e| Error::parse("property list", e.to_string()))?;
        let dict = value
            .into_dictionary()
            .ok_or_else(|| Error::parse("property list", "top-level value is not a dictionary"))?;

        let values = dict
            .into_iter()
            .filter_map(|(key, value)| scalar_to_string(value).map(|v| (key, v)))
            .collect();
        Ok(Self { values })
    }

    /// Value for `key`, empty when absent
    pub fn get(&self, key: &str) -> &str {
        self.values.get(key).map(|v| v.trim()).unwrap_or("")
    }

    /// First key from `keys` whose value is non-empty, with that value
    pub fn first_of<'k>(&self, keys: &[&'k str]) -> Option<(&'k str, &str)> {
        keys.iter()
            .map(|k| (*k, self.get(k)))
            .find(|(_, v)| !v.is_empty())
    }

    /// Marketing version, else build number
    pub fn version(&self) -> &str {
        self.first_of(&[SHORT_VERSION, BUNDLE_VERSION])
            .map(|(_, v)| v)
            .unwrap_or("")
    }

    /// Number of scalar keys
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when no scalar keys were decoded
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn scalar_to_string(value: ::plist::Value) -> Option<String> {
    use ::plist::Value;
    match value {
        Value::String(s) => Some(s),
        Value::Boolean(b) => Some(b.to_string()),
        Value::Real(r) => Some(r.to_string()),
        Value::Integer(i) => i
            .as_signed()
            .map(|n| n.to_string())
            .or_else(|| i.as_unsigned().map(|n| n.to_string())),
        _ => None,
    }
}

/// Parse `plutil -p` output
///
/// Only depth-1 `"key" => value` lines are read. Quoted values lose their
/// quotes; nested arrays and dictionaries are skipped.
pub fn parse_plist_dump(text: &str) -> PropertyBundle {
    let mut values = HashMap::new();
    let mut depth: usize = 0;

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if line == "}" || line == "]" {
            depth = depth.saturating_sub(1);
            continue;
        }
        if line == "{" || line == "[" {
            depth += 1;
            continue;
        }

        let Some((key, value)) = line.split_once("=>") else {
            continue;
        };
        let value = value.trim();
        let opens = value == "{" || value == "[";

        if depth == 1 {
            let key = key.trim().trim_matches('"');
            if !key.is_empty() && !opens {
                values.insert(key.to_string(), unquote(value).to_string());
            }
        }
        if opens {
            depth += 1;
        }
    }

    PropertyBundle { values }
}

fn unquote(value: &str) -> &str {
    value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value)
}

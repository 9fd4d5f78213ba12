//! Data models
//!
//! Shared between menu-server and menu-client (via API).
//! Field names follow the camelCase JSON stored in `products.json`,
//! `events.json` and `navigationSettings.json`; fields this crate does not model are kept in `extra`
//! maps so that load/save never drops them.

pub mod category;
pub mod event;
pub mod menu;
pub mod product;
pub mod settings;
pub mod text;

// Re-exports
pub use category::*;
pub use event::*;
pub use menu::*;
pub use product::*;
pub use settings::*;
pub use text::*;

use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

/// Ids written by older tooling may be JSON numbers.
pub(crate) fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {}",
            other
        ))),
    }
}

/// `null` and missing both mean "empty list".
pub(crate) fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Shallow merge: every key of `patch` overwrites the same key of `target`.
pub(crate) fn merge_shallow(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        target.insert(key.clone(), value.clone());
    }
}

pub(crate) fn default_true() -> bool {
    true
}

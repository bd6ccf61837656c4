//! Serde support for PATCH fields that distinguish "absent" from `null`.
//!
//! Pair with `#[serde(default)]`: a missing key stays `None`, an explicit
//! `null` becomes `Some(None)`, and a value becomes `Some(Some(v))`.

use serde::{Deserialize, Deserializer};

/// Deserialize a present field, keeping `null` as `Some(None)`.
pub fn deserialize<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

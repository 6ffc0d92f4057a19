//! Normalization helpers shared by the ledger, goal and account code.
//!
//! Stored documents may have been written by other clients, so anything read back from the store
//! is decoded leniently while anything coming in from a request is validated strictly.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::constants::FALLBACK_DISPLAY_NAME;

/// Deserializes an integer field, mapping anything that is not a usable number to `0`.
///
/// Finite floats are truncated toward zero and numeric strings are parsed; `null`, booleans,
/// arrays, objects and non-numeric strings all become `0`. Combine with `#[serde(default)]` so a
/// missing field decodes the same way.
pub fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(int_or_zero(&value))
}

pub fn int_or_zero(value: &Value) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>()
                .ok()
                .or_else(|| {
                    s.parse::<f64>()
                        .ok()
                        .filter(|f| f.is_finite())
                        .map(|f| f.trunc() as i64)
                })
                .unwrap_or(0)
        }
        _ => 0,
    }
}

/// Trims free text, returning an owned copy.
pub fn trimmed(text: Option<&str>) -> String {
    text.map(str::trim).unwrap_or_default().to_owned()
}

/// Canonical form used for allow-list comparison.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Initial display name for a new account: the email's local part, or a placeholder.
pub fn display_name_from_email(email: Option<&str>) -> String {
    email
        .and_then(|e| e.trim().split('@').next())
        .map(str::trim)
        .filter(|local| !local.is_empty())
        .map(str::to_owned)
        .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_owned())
}

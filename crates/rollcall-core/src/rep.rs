//! Course-rep identity, scope, and access policy.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

use crate::error::StorageError;
use crate::storage::{keys, LocalStore, RepConfig};

/// Pseudo-identity used when the dashboard is open and no email was given.
pub const GUEST_EMAIL: &str = "guest@local";

/// The (faculty, department, level) triple restricting a rep's writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepScope {
    pub faculty: String,
    pub department: String,
    pub level: String,
}

impl RepScope {
    pub fn new(faculty: &str, department: &str, level: &str) -> Self {
        Self {
            faculty: faculty.to_string(),
            department: department.to_string(),
            level: level.to_string(),
        }
    }

    /// All three fields set; scoped operations require a complete scope.
    pub fn is_complete(&self) -> bool {
        !self.faculty.trim().is_empty()
            && !self.department.trim().is_empty()
            && !self.level.trim().is_empty()
    }

    /// Scope comparison: faculty and level exact, department trimmed and
    /// case-insensitive.
    pub fn matches(&self, faculty: &str, department: &str, level: &str) -> bool {
        self.faculty == faculty
            && self.level == level
            && self.department.trim().eq_ignore_ascii_case(department.trim())
    }

    /// Load the saved scope for a rep identity, if any.
    pub fn load(store: &LocalStore, email: &str) -> Option<Self> {
        store.get(&keys::rep_scope(email))
    }

    /// Persist this scope under the rep identity.
    pub fn save(&self, store: &LocalStore, email: &str) -> Result<(), StorageError> {
        store.put(&keys::rep_scope(email), self)
    }
}

/// Persisted rep session marker.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepSession {
    pub email: String,
    pub ts: DateTime<Utc>,
}

/// Rep access rejection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RepAccessError {
    #[error("an email address is required")]
    EmailRequired,

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),

    #[error("this email is not an authorized course representative")]
    NotAuthorized,

    #[error("invalid PIN")]
    InvalidPin,
}

/// Normalize a raw pin document: lowercase trimmed emails, scalar pins
/// coerced to trimmed strings, everything else dropped.
pub fn normalize_rep_pins(raw: &serde_json::Value) -> HashMap<String, String> {
    let mut out = HashMap::new();
    let Some(map) = raw.as_object() else {
        return out;
    };
    for (key, value) in map {
        let email = key.trim().to_lowercase();
        if email.is_empty() {
            continue;
        }
        let pin = match value {
            serde_json::Value::String(s) => s.trim().to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::Bool(b) => b.to_string(),
            _ => continue,
        };
        if !pin.is_empty() {
            out.insert(email, pin);
        }
    }
    out
}

/// Resolve a rep identity under the configured access policy.
///
/// With `auth_optional` (the default) any caller gets in; a missing email
/// maps to the guest pseudo-identity. Otherwise the email must look like an
/// email, be permitted by `allow_any_email` or have a pin entry, and the
/// PIN must match by plain equality. No authentication protocol beyond that.
pub fn verify_rep_access(
    email: Option<&str>,
    pin: Option<&str>,
    pins: &HashMap<String, String>,
    cfg: &RepConfig,
) -> Result<String, RepAccessError> {
    let email = email.map(|e| e.trim().to_lowercase()).filter(|e| !e.is_empty());

    if cfg.auth_optional {
        return Ok(email.unwrap_or_else(|| GUEST_EMAIL.to_string()));
    }

    let email = email.ok_or(RepAccessError::EmailRequired)?;
    if !looks_like_email(&email) {
        return Err(RepAccessError::InvalidEmail(email));
    }

    if !cfg.allow_any_email && !pins.contains_key(&email) {
        return Err(RepAccessError::NotAuthorized);
    }

    let expected = pins.get(&email);
    match (expected, pin.map(str::trim)) {
        (Some(expected), Some(given)) if !given.is_empty() && given == expected => Ok(email),
        _ => Err(RepAccessError::InvalidPin),
    }
}

fn looks_like_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !local.contains(char::is_whitespace)
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !domain.contains(char::is_whitespace)
}

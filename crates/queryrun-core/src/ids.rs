//! Newtype wrapper for the request identity.
//!
//! A `RequestId` doubles as the `metadata.name` of the remote resource, so it
//! has to be a valid DNS-1123 subdomain name.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;

/// Maximum length of a resource name accepted by the control plane.
const MAX_NAME_LEN: usize = 253;

/// Unique identifier for a query request and its remote resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(String);

impl RequestId {
    /// Create a new RequestId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Create a RequestId, rejecting names the control plane would refuse.
    pub fn parse(id: impl Into<String>) -> Result<Self, CoreError> {
        let id = id.into();
        validate_name(&id)?;
        Ok(Self(id))
    }

    /// Generate a new RequestId from the submission timestamp.
    ///
    /// The short uuid suffix keeps two submissions in the same second apart.
    pub fn generate(prefix: &str) -> Self {
        let suffix = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}-{}-{}",
            prefix,
            Utc::now().timestamp(),
            &suffix[..8]
        ))
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RequestId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RequestId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

fn validate_name(id: &str) -> Result<(), CoreError> {
    let invalid = |reason: &str| CoreError::InvalidRequestId {
        id: id.to_string(),
        reason: reason.to_string(),
    };

    if id.is_empty() {
        return Err(invalid("must not be empty"));
    }
    if id.len() > MAX_NAME_LEN {
        return Err(invalid("longer than 253 characters"));
    }
    if !id
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.')
    {
        return Err(invalid(
            "only lowercase letters, digits, '-' and '.' are allowed",
        ));
    }
    let starts_ok = id.starts_with(|c: char| c.is_ascii_alphanumeric());
    let ends_ok = id.ends_with(|c: char| c.is_ascii_alphanumeric());
    if !starts_ok || !ends_ok {
        return Err(invalid("must start and end with a letter or digit"));
    }
    Ok(())
}

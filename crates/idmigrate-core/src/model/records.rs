//! Opaque source records
//!
//! The source service owns the shape of its documents. The only field this
//! crate reads is the organization `id`, which scopes membership fetches and
//! names per-organization snapshot files.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::MigrateError;

macro_rules! opaque_record {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Value);

        impl $name {
            /// Wrap a raw document
            pub fn new(value: Value) -> Self {
                Self(value)
            }

            /// Borrow the raw document
            pub fn as_value(&self) -> &Value {
                &self.0
            }

            /// Unwrap the raw document
            pub fn into_value(self) -> Value {
                self.0
            }
        }

        impl From<Value> for $name {
            fn from(value: Value) -> Self {
                Self(value)
            }
        }
    };
}

opaque_record!(
    /// A user account as returned by the source service
    UserRecord
);

opaque_record!(
    /// An organization as returned by the source service
    OrganizationRecord
);

opaque_record!(
    /// One organization membership as returned by the source service
    MembershipRecord
);

impl OrganizationRecord {
    /// Extract the organization's stable identifier
    ///
    /// # Errors
    ///
    /// `MigrateError::InvalidOrganizationId` when the `id` field is absent,
    /// not a string, or cannot be used as a file name.
    pub fn id(&self) -> Result<OrganizationId, MigrateError> {
        match self.0.get("id") {
            Some(Value::String(id)) => OrganizationId::parse(id),
            Some(other) => Err(MigrateError::InvalidOrganizationId {
                reason: format!("expected string id, found {}", json_type(other)),
            }),
            None => Err(MigrateError::InvalidOrganizationId {
                reason: "organization record has no id field".to_string(),
            }),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Validated organization identifier
///
/// Safe to use as a single path component and as a single process argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct OrganizationId(String);

impl OrganizationId {
    /// Validate a raw identifier
    ///
    /// # Errors
    ///
    /// Rejects empty ids, `.`/`..`, path separators and control characters.
    pub fn parse(raw: &str) -> Result<Self, MigrateError> {
        let reason = if raw.is_empty() {
            Some("id is empty")
        } else if raw == "." || raw == ".." {
            Some("id is a relative path component")
        } else if raw.contains('/') || raw.contains('\\') {
            Some("id contains a path separator")
        } else if raw.chars().any(char::is_control) {
            Some("id contains control characters")
        } else {
            None
        };

        match reason {
            Some(reason) => Err(MigrateError::InvalidOrganizationId {
                reason: format!("{} ({:?})", reason, raw),
            }),
            None => Ok(Self(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

//! Secret keys and the cross-environment guard
//!
//! Both services issue keys whose text reveals the environment they belong
//! to. A run is only allowed when source and destination agree, so test data
//! is never pushed into a production tenant (or the reverse).

use idmigrate_core_types::Sensitive;
use serde::Deserialize;

use crate::errors::MigrateError;

/// Substring that marks a test-mode key
pub const TEST_KEY_MARKER: &str = "test_";

/// Test vs. production designation inferred from a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvironmentClass {
    Test,
    Production,
}

impl EnvironmentClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnvironmentClass::Test => "test",
            EnvironmentClass::Production => "production",
        }
    }
}

impl std::fmt::Display for EnvironmentClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A service secret key, redacted in every rendering
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub struct SecretKey(Sensitive<String>);

impl SecretKey {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(Sensitive::new(raw.into()))
    }

    /// Raw key text, for the HTTP header or the child process argv only
    pub fn expose(&self) -> &str {
        self.0.expose()
    }

    pub fn environment_class(&self) -> EnvironmentClass {
        if self.expose().contains(TEST_KEY_MARKER) {
            EnvironmentClass::Test
        } else {
            EnvironmentClass::Production
        }
    }

    pub fn is_empty(&self) -> bool {
        self.expose().trim().is_empty()
    }
}

impl From<String> for SecretKey {
    fn from(raw: String) -> Self {
        Self::new(raw)
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "SecretKey({:?})", self.0)
    }
}

/// Source and destination keys for one run
#[derive(Debug, Clone)]
pub struct Credentials {
    pub source: SecretKey,
    pub destination: SecretKey,
}

impl Credentials {
    /// Build a pair from optional keys, as they come out of configuration
    ///
    /// # Errors
    ///
    /// `MigrateError::MissingCredential` naming the first absent or blank key.
    pub fn from_parts(
        source: Option<SecretKey>,
        destination: Option<SecretKey>,
    ) -> Result<Self, MigrateError> {
        let source = source.filter(|k| !k.is_empty()).ok_or_else(|| {
            MigrateError::MissingCredential {
                name: "source secret key (CLERK_SECRET_KEY)".to_string(),
            }
        })?;
        let destination = destination.filter(|k| !k.is_empty()).ok_or_else(|| {
            MigrateError::MissingCredential {
                name: "destination secret key (WORKOS_SECRET_KEY)".to_string(),
            }
        })?;
        Ok(Self {
            source,
            destination,
        })
    }

    /// Require both keys to belong to the same environment class
    ///
    /// # Errors
    ///
    /// `MigrateError::EnvironmentMismatch` when exactly one key is a test key.
    pub fn validate(&self) -> Result<EnvironmentClass, MigrateError> {
        let source_class = self.source.environment_class();
        let destination_class = self.destination.environment_class();
        if source_class != destination_class {
            return Err(MigrateError::EnvironmentMismatch {
                source_class: source_class.to_string(),
                destination_class: destination_class.to_string(),
            });
        }
        Ok(source_class)
    }
}

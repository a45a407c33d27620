//! Sensitive data marker for automatic redaction
//!
//! Secret keys for both identity services travel through config, the
//! source client and the procedure argv. `Sensitive<T>` keeps them out of
//! every `Debug`/`Display` rendering on the way.

use std::fmt;

/// Placeholder printed in place of a sensitive value
pub const REDACTED: &str = "***REDACTED***";

/// Wrapper for sensitive data that redacts itself in Debug and Display
///
/// # Example
///
/// ```
/// use idmigrate_core_types::Sensitive;
///
/// let key = Sensitive::new("sk_test_abc");
/// assert_eq!(format!("{:?}", key), "***REDACTED***");
/// assert_eq!(format!("{}", key), "***REDACTED***");
///
/// // Access the actual value when needed
/// assert_eq!(key.expose(), &"sk_test_abc");
/// ```
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
    /// Wrap a sensitive value
    pub fn new(value: T) -> Self {
        Self(value)
    }

    /// Expose the underlying sensitive value
    ///
    /// Only call this at the point the secret leaves the process
    /// (an HTTP header, a child process argument).
    pub fn expose(&self) -> &T {
        &self.0
    }

    /// Consume the wrapper and return the inner value
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> fmt::Debug for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T> fmt::Display for Sensitive<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(REDACTED)
    }
}

impl<T: Clone> Clone for Sensitive<T> {
    fn clone(&self) -> Self {
        Self(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sensitive_debug_redaction() {
        let secret = Sensitive::new("sk_live_123");
        let debug_str = format!("{:?}", secret);
        assert_eq!(debug_str, REDACTED);
        assert!(!debug_str.contains("sk_live_123"));
    }

    #[test]
    fn test_sensitive_display_redaction() {
        let secret = Sensitive::new("sk_test_456");
        let display_str = format!("{}", secret);
        assert_eq!(display_str, REDACTED);
        assert!(!display_str.contains("sk_test"));
    }

    #[test]
    fn test_sensitive_expose_and_into_inner() {
        let secret = Sensitive::new(String::from("key"));
        assert_eq!(secret.expose(), "key");
        assert_eq!(secret.into_inner(), "key");
    }

    #[test]
    fn test_sensitive_inside_struct() {
        #[derive(Debug)]
        #[allow(dead_code)]
        struct Credentials {
            label: String,
            key: Sensitive<String>,
        }

        let creds = Credentials {
            label: "source".to_string(),
            key: Sensitive::new("sk_test_abc".to_string()),
        };

        let debug_str = format!("{:?}", creds);
        assert!(debug_str.contains("source"));
        assert!(debug_str.contains(REDACTED));
        assert!(!debug_str.contains("sk_test_abc"));
    }
}

//! Newtype IDs for type-safe identifiers.
//!
//! Slots, variants and pool items all live in the same key space, so mixing
//! them up is an easy mistake to make. Each ID type carries its own prefix
//! when generated.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate newtype ID structs.
macro_rules! define_id {
    ($name:ident, $prefix:literal) => {
        /// A unique identifier.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Prefix used by [`Self::generate`].
            pub const PREFIX: &'static str = $prefix;

            /// Create a new ID from a string.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Generate a new unique ID.
            ///
            /// Generated IDs sort in creation order.
            pub fn generate() -> Self {
                Self(generate_id($prefix))
            }

            /// Get the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner string.
            pub fn into_inner(self) -> String {
                self.0
            }

            /// True when the ID is empty or whitespace.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(SlotId, "slot");
define_id!(VariantId, "var");
define_id!(PoolId, "pool");
define_id!(RunId, "run");
define_id!(RequestId, "req");

/// Millisecond timestamp (fixed-width hex) followed by random URL-safe bytes.
fn generate_id(prefix: &str) -> String {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use rand::Rng;
    use std::time::{SystemTime, UNIX_EPOCH};

    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);

    let bytes: [u8; 6] = rand::thread_rng().gen();
    format!("{}-{:012x}{}", prefix, millis, URL_SAFE_NO_PAD.encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_creation() {
        let id = VariantId::new("var-123");
        assert_eq!(id.as_str(), "var-123");
    }

    #[test]
    fn test_id_generation() {
        let id1 = VariantId::generate();
        let id2 = VariantId::generate();
        assert_ne!(id1, id2);
        assert!(id1.as_str().starts_with("var-"));
    }

    #[test]
    fn test_generated_ids_sort_by_creation() {
        let first = PoolId::generate();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = PoolId::generate();
        assert!(first < second);
    }

    #[test]
    fn test_id_serializes_as_plain_string() {
        let id = SlotId::new("slot-1");
        assert_eq!(serde_json::to_string(&id).unwrap(), r#""slot-1""#);
    }

    #[test]
    fn test_blank_id() {
        assert!(VariantId::new("  ").is_blank());
        assert!(!VariantId::new("v").is_blank());
    }
}

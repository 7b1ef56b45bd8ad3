//! Newtype identifiers for products and anonymous sessions.
//!
//! Product identifiers reach the client in several shapes: strings or
//! numbers, under `_id` or `id`, depending on which catalog endpoint produced
//! the record. [`canonical_id`] is the one place where those shapes collapse
//! into a [`ProductId`]; nothing compares identifiers before that.

use serde_json::Value;

/// Macro to define a string-backed identifier wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - `as_str()`, `into_inner()`, `Display`, `AsRef<str>`
/// - `From<String>` and `From<&str>` implementations
///
/// # Example
///
/// ```rust
/// # use campus_market_core::define_id;
/// define_id!(ListingId);
/// define_id!(SellerId);
///
/// let listing = ListingId::from("abc");
/// let seller = SellerId::from("abc");
///
/// // These are different types, so this won't compile:
/// // let _: ListingId = seller;
/// assert_eq!(listing.as_str(), seller.as_str());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Borrow the identifier text.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Take the identifier text.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(SessionId);

impl From<i64> for ProductId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for ProductId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for ProductId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl From<&ProductId> for ProductId {
    fn from(id: &ProductId) -> Self {
        id.clone()
    }
}

impl ProductId {
    /// Whether the identifier carries no text.
    ///
    /// Empty identifiers never match a cart line.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl SessionId {
    /// Generate a fresh random session identifier (UUID v4).
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

/// Canonicalize a raw JSON identifier into a [`ProductId`].
///
/// Strings are taken as-is and numbers use their shortest decimal text, so
/// `5`, `5.0` and `"5"` all become `"5"`. Empty strings and every other JSON
/// type have no identity and yield `None`.
#[must_use]
pub fn canonical_id(raw: &Value) -> Option<ProductId> {
    match raw {
        Value::String(s) if !s.is_empty() => Some(ProductId(s.clone())),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(ProductId::from(i))
            } else if let Some(u) = n.as_u64() {
                Some(ProductId::from(u))
            } else {
                n.as_f64().map(|f| ProductId(f.to_string()))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn test_numeric_and_string_ids_are_equal() {
        assert_eq!(ProductId::from(5_i64), ProductId::from("5"));
        assert_eq!(canonical_id(&json!(5)), canonical_id(&json!("5")));
        assert_eq!(canonical_id(&json!(5.0)), Some(ProductId::from("5")));
    }

    #[test]
    fn test_fractional_number_keeps_fraction() {
        assert_eq!(canonical_id(&json!(1.5)), Some(ProductId::from("1.5")));
    }

    #[test]
    fn test_unusable_ids() {
        assert_eq!(canonical_id(&json!("")), None);
        assert_eq!(canonical_id(&Value::Null), None);
        assert_eq!(canonical_id(&json!(true)), None);
        assert_eq!(canonical_id(&json!({"oid": "abc"})), None);
    }

    #[test]
    fn test_object_id_strings_pass_through() {
        let id = canonical_id(&json!("64f1c2a9e4b0a1b2c3d4e5f6"));
        assert_eq!(id.as_ref().map(ProductId::as_str), Some("64f1c2a9e4b0a1b2c3d4e5f6"));
    }

    #[test]
    fn test_session_ids_are_unique() {
        let a = SessionId::generate();
        let b = SessionId::generate();
        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 36);
    }

    #[test]
    fn test_display_is_raw_text() {
        assert_eq!(ProductId::from("abc").to_string(), "abc");
    }
}

//! Domain macros.
//!
//! `define_id!` generates a strong-typed wrapper around a `String`. Unlike
//! the random-UUID identifiers common elsewhere in this family of crates,
//! task and host identifiers here are minted by an external tool (the host
//! agent runtime) or derived deterministically (the host's hostname) — the
//! wrapper exists for type safety, not for identity generation.

/// Defines a strong-typed identifier newtype wrapping an owned `String`.
#[macro_export]
macro_rules! define_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            PartialOrd,
            Ord,
            Hash,
            derive_more::Display,
            derive_more::From,
            derive_more::Into,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap an existing identifier string.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the underlying string.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

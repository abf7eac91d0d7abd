//! Newtype refs for type-safe entity references.
//!
//! Use the `define_ref!` macro to create type-safe wrappers around the
//! opaque string identifiers the Cart and Catalog APIs hand out. The
//! wrappers prevent accidentally mixing refs from different entity types.

/// Macro to define a type-safe ref wrapper around an opaque string id.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_str()`
/// - `From<String>`, `From<&str>`, and `Display` implementations
///
/// # Example
///
/// ```rust
/// # use zella_core::define_ref;
/// define_ref!(SkuRef);
/// define_ref!(WarehouseRef);
///
/// let sku = SkuRef::new("sku-1");
/// let warehouse = WarehouseRef::new("wh-1");
///
/// // These are different types, so this won't compile:
/// // let _: SkuRef = warehouse;
/// ```
#[macro_export]
macro_rules! define_ref {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new ref from anything string-like.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Get the underlying string value.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity refs
define_ref!(ProductRef);
define_ref!(UserId);

//! Newtype IDs for type-safe entity references.
//!
//! Use the `define_id!` macro to create type-safe ID wrappers that prevent
//! accidentally passing a vehicle ID where a booking ID is expected.

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i64` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`, `Ord`
/// - Conversion methods: `new()`, `as_i64()`
/// - `From<i64>`, `Into<i64>` and `FromStr` implementations
///
/// # Example
///
/// ```rust
/// # use garage_core::define_id;
/// define_id!(WorkshopId);
/// define_id!(BayId);
///
/// let workshop = WorkshopId::new(1);
/// let bay = BayId::new(1);
///
/// // These are different types, so this won't compile:
/// // let _: WorkshopId = bay;
/// assert_eq!(workshop.as_i64(), bay.as_i64());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i64);

        impl $name {
            /// Create a new ID from an i64 value.
            #[must_use]
            pub const fn new(id: i64) -> Self {
                Self(id)
            }

            /// Get the underlying i64 value.
            #[must_use]
            pub const fn as_i64(&self) -> i64 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = ::core::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().trim_start_matches('#').parse::<i64>().map(Self)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(UserId);
define_id!(CustomerId);
define_id!(VehicleId);
define_id!(ServiceId);
define_id!(BookingId);
define_id!(InvoiceId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_id_display_and_parse() {
        let id = BookingId::new(42);
        assert_eq!(id.to_string(), "42");
        assert_eq!("42".parse::<BookingId>().unwrap(), id);
        // The dashboards print IDs as "#42"
        assert_eq!("#42".parse::<BookingId>().unwrap(), id);
        assert!("abc".parse::<BookingId>().is_err());
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let id = InvoiceId::new(7);
        assert_eq!(serde_json::to_string(&id).unwrap(), "7");
        let parsed: InvoiceId = serde_json::from_str("7").unwrap();
        assert_eq!(parsed, id);
    }
}

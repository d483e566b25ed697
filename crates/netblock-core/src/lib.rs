//! Core types for netblock
//!
//! This crate provides the address-level building blocks:
//! - [`Address`] - IPv4/IPv6 address value type
//! - [`IpVersion`] / [`AddressFamily`] - per-family constants and masks
//! - [`FormatMode`] - textual output styles
//! - [`Magnitude`] - arbitrary-precision unsigned integer for 128-bit math
//! - [`NetblockError`] - error types
//!
//! ```
//! use netblock_core::{Address, FormatMode};
//!
//! let addr = Address::parse("::ffff:141.44.23.50")?;
//! assert_eq!(addr.as_ipv4()?, Address::parse("141.44.23.50")?);
//! assert_eq!(addr.format(FormatMode::Compact), "::ffff:8d2c:1732");
//! # Ok::<(), netblock_core::NetblockError>(())
//! ```

use thiserror::Error;

mod address;
mod format;
pub mod magnitude;
mod parse;
pub mod version;

pub use address::{Address, BitwiseOp};
pub use format::FormatMode;
pub use magnitude::Magnitude;
pub use version::{AddressFamily, IpVersion, Ipv4, Ipv6};

/// Error types for netblock operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NetblockError {
    /// Unparsable address or CIDR string, or unusable factory input
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Binary operation between an IPv4 and an IPv6 value
    #[error("Incompatible types: {left} and {right}")]
    TypeMismatch { left: IpVersion, right: IpVersion },

    /// Prefix length outside the version's bit width
    #[error("Out of range: {0}")]
    OutOfRange(String),

    /// Unknown bitwise operator or missing operand
    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),
}

/// Result type alias for netblock operations
pub type Result<T> = std::result::Result<T, NetblockError>;

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;
    use std::cmp::Ordering;

    #[test]
    fn test_error_display() {
        let err = NetblockError::InvalidFormat("'cake' is not a valid IPv4 address".to_string());
        assert_eq!(
            format!("{}", err),
            "Invalid format: 'cake' is not a valid IPv4 address"
        );

        let err = NetblockError::TypeMismatch {
            left: IpVersion::V4,
            right: IpVersion::V6,
        };
        assert_eq!(format!("{}", err), "Incompatible types: IPv4 and IPv6");
    }

    #[test]
    fn test_result_type() {
        fn returns_result() -> Result<Address> {
            Address::parse("10.0.0.1")
        }

        assert_eq!(returns_result().unwrap(), Address::from_u32(0x0A000001));
    }

    quickcheck! {
        fn prop_v4_compact_round_trip(raw: u32) -> bool {
            let addr = Address::from_u32(raw);
            let text = addr.format(FormatMode::Compact);
            Address::parse(&text) == Ok(addr)
        }

        fn prop_v6_compact_round_trip(raw: u128) -> bool {
            let addr = Address::from_u128(raw);
            let text = addr.format(FormatMode::Compact);
            Address::parse(&text) == Ok(addr)
                && Address::parse(&text).map(|a| a.format(FormatMode::Compact)) == Ok(text)
        }

        fn prop_v6_full_round_trip(raw: u128) -> bool {
            let addr = Address::from_u128(raw);
            Address::parse(&addr.format(FormatMode::Full)) == Ok(addr)
                && Address::parse(&addr.format(FormatMode::Abbreviated)) == Ok(addr)
        }

        fn prop_ordering_matches_numeric(a: u128, b: u128) -> bool {
            let (x, y) = (Address::from_u128(a), Address::from_u128(b));
            x.compare_to(&y) == Ok(a.cmp(&b))
        }

        fn prop_ordering_antisymmetric(a: u32, b: u32) -> bool {
            let (x, y) = (Address::from_u32(a), Address::from_u32(b));
            x.compare_to(&y).map(Ordering::reverse) == y.compare_to(&x)
        }

        fn prop_bitwise_identities_v4(raw: u32) -> bool {
            let a = Address::from_u32(raw);
            a.bitwise_and(&a) == Ok(a)
                && a.bitwise_or(&a) == Ok(a)
                && a.bitwise_xor(&a) == Ok(Address::from_u32(0))
                && !!a == a
        }

        fn prop_bitwise_identities_v6(raw: u128) -> bool {
            let a = Address::from_u128(raw);
            a.bitwise_and(&a) == Ok(a)
                && a.bitwise_or(&a) == Ok(a)
                && a.bitwise_xor(&a) == Ok(Address::from_u128(0))
                && !!a == a
        }

        fn prop_add_then_subtract(raw: u128, n: u64) -> bool {
            let a = Address::from_u128(raw);
            a.add(n).subtract(n) == a
        }

        fn prop_v4_add_matches_wrapping(raw: u32, n: u32) -> bool {
            Address::from_u32(raw).add(n) == Address::from_u32(raw.wrapping_add(n))
                && Address::from_u32(raw).subtract(n) == Address::from_u32(raw.wrapping_sub(n))
        }
    }
}

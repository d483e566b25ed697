//! The [`Address`] value type

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::ops::Not;
use std::str::FromStr;

use crate::format::format_address;
use crate::parse::{parse_ipv4, parse_ipv6};
use crate::{FormatMode, IpVersion, Magnitude, NetblockError, Result};

/// Leading twelve bytes of an IPv4-mapped IPv6 address
const MAPPED_PREFIX: [u8; 12] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0xFF, 0xFF];

/// An IPv4 or IPv6 address
///
/// Ordering derived on the enum puts every IPv4 address before every IPv6
/// address and is meant for collections; [`Address::compare_to`] is the
/// version-checked comparison.
///
/// # Examples
///
/// ```
/// use netblock_core::{Address, FormatMode};
///
/// let addr = Address::parse("2001:630:d0::")?;
/// assert_eq!(addr.format(FormatMode::Full), "2001:0630:00d0:0000:0000:0000:0000:0000");
/// assert_eq!(addr.format(FormatMode::Compact), "2001:630:d0::");
/// # Ok::<(), netblock_core::NetblockError>(())
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Address {
    /// IPv4 address in network byte order
    V4([u8; 4]),
    /// IPv6 address in network byte order
    V6([u8; 16]),
}

/// Bitwise operator tag accepted by [`Address::bitwise`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BitwiseOp {
    And,
    Or,
    Xor,
    Not,
}

impl FromStr for BitwiseOp {
    type Err = NetblockError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "&" => Ok(BitwiseOp::And),
            "|" => Ok(BitwiseOp::Or),
            "^" => Ok(BitwiseOp::Xor),
            "~" => Ok(BitwiseOp::Not),
            other => Err(NetblockError::UnsupportedOperation(format!(
                "unknown operation type '{}'",
                other
            ))),
        }
    }
}

impl Address {
    /// Parse a dotted-quad or colon-hex string
    pub fn parse(input: &str) -> Result<Self> {
        match IpVersion::sniff(input) {
            Some(IpVersion::V4) => parse_ipv4(input).map(Address::V4),
            Some(IpVersion::V6) => parse_ipv6(input).map(Address::V6),
            None => Err(NetblockError::InvalidFormat(format!(
                "unable to guess IP address type from '{}'",
                input
            ))),
        }
    }

    /// IPv4 address from its 32-bit integer value
    pub fn from_u32(value: u32) -> Self {
        Address::V4(value.to_be_bytes())
    }

    /// IPv6 address from its 128-bit integer value
    pub fn from_u128(value: u128) -> Self {
        Address::V6(value.to_be_bytes())
    }

    /// IPv6 address from an arbitrary-precision integer
    pub fn from_magnitude(value: &Magnitude) -> Result<Self> {
        Self::from_magnitude_for(IpVersion::V6, value)
    }

    /// Address of the given version from an arbitrary-precision integer
    pub fn from_magnitude_for(version: IpVersion, value: &Magnitude) -> Result<Self> {
        let bytes = value.to_be_bytes(version.byte_len()).ok_or_else(|| {
            NetblockError::InvalidFormat(format!("{} is out of range for {}", value, version))
        })?;
        Self::from_bytes(&bytes)
    }

    /// Address from 4 or 16 network-order bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if let Ok(v4) = <[u8; 4]>::try_from(bytes) {
            Ok(Address::V4(v4))
        } else if let Ok(v6) = <[u8; 16]>::try_from(bytes) {
            Ok(Address::V6(v6))
        } else {
            Err(NetblockError::InvalidFormat(format!(
                "expected 4 or 16 bytes, got {}",
                bytes.len()
            )))
        }
    }

    /// Version tag
    pub fn version(&self) -> IpVersion {
        match self {
            Address::V4(_) => IpVersion::V4,
            Address::V6(_) => IpVersion::V6,
        }
    }

    /// Network-order bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Address::V4(bytes) => bytes,
            Address::V6(bytes) => bytes,
        }
    }

    /// Unsigned integer value
    pub fn to_magnitude(&self) -> Magnitude {
        Magnitude::from_be_bytes(self.as_bytes())
    }

    fn bit_width(&self) -> u32 {
        self.version().bit_width() as u32
    }

    /// Same version, value taken modulo `2^bit_width`
    fn with_value(&self, value: &Magnitude) -> Address {
        let bytes = value.to_be_bytes_truncated(self.version().byte_len());
        let mut out = *self;
        match &mut out {
            Address::V4(b) => b.copy_from_slice(&bytes),
            Address::V6(b) => b.copy_from_slice(&bytes),
        }
        out
    }

    /// Fail with `TypeMismatch` unless both addresses share a version
    pub fn ensure_same_version(&self, other: &Address) -> Result<()> {
        if self.version() != other.version() {
            return Err(NetblockError::TypeMismatch {
                left: self.version(),
                right: other.version(),
            });
        }
        Ok(())
    }

    /// Apply a bitwise operator; `other` is required for every operator but `Not`
    pub fn bitwise(&self, op: BitwiseOp, other: Option<&Address>) -> Result<Address> {
        let f: fn(u8, u8) -> u8 = match op {
            BitwiseOp::And => |a, b| a & b,
            BitwiseOp::Or => |a, b| a | b,
            BitwiseOp::Xor => |a, b| a ^ b,
            BitwiseOp::Not => return Ok(self.bitwise_not()),
        };
        let other = other.ok_or_else(|| {
            NetblockError::UnsupportedOperation(format!("{:?} needs a second operand", op))
        })?;
        match (self, other) {
            (Address::V4(a), Address::V4(b)) => Ok(Address::V4(zip_bytes(a, b, f))),
            (Address::V6(a), Address::V6(b)) => Ok(Address::V6(zip_bytes(a, b, f))),
            _ => Err(NetblockError::TypeMismatch {
                left: self.version(),
                right: other.version(),
            }),
        }
    }

    /// `self & other`
    pub fn bitwise_and(&self, other: &Address) -> Result<Address> {
        self.bitwise(BitwiseOp::And, Some(other))
    }

    /// `self | other`
    pub fn bitwise_or(&self, other: &Address) -> Result<Address> {
        self.bitwise(BitwiseOp::Or, Some(other))
    }

    /// `self ^ other`
    pub fn bitwise_xor(&self, other: &Address) -> Result<Address> {
        self.bitwise(BitwiseOp::Xor, Some(other))
    }

    /// `!self`
    pub fn bitwise_not(&self) -> Address {
        match self {
            Address::V4(a) => Address::V4(a.map(|b| !b)),
            Address::V6(a) => Address::V6(a.map(|b| !b)),
        }
    }

    /// Keep the top `prefix_len` bits and clear the rest (`self & mask`)
    pub fn truncate_to_prefix(&self, prefix_len: u8) -> Address {
        let mask = self.version().prefix_mask(prefix_len);
        self.masked_with(&mask, |a, m| a & m)
    }

    /// Keep the top `prefix_len` bits and set the rest (`self | !mask`)
    pub fn fill_host_bits(&self, prefix_len: u8) -> Address {
        let mask = self.version().prefix_mask(prefix_len);
        self.masked_with(&mask, |a, m| a | !m)
    }

    fn masked_with(&self, mask: &Address, f: fn(u8, u8) -> u8) -> Address {
        match (self, mask) {
            (Address::V4(a), Address::V4(m)) => Address::V4(zip_bytes(a, m, f)),
            (Address::V6(a), Address::V6(m)) => Address::V6(zip_bytes(a, m, f)),
            _ => *self,
        }
    }

    /// Add `n`, wrapping around the top of the address space
    pub fn add(&self, n: impl Into<Magnitude>) -> Address {
        let sum = &self.to_magnitude() + &n.into();
        self.with_value(&sum)
    }

    /// Subtract `n`, wrapping around below zero
    pub fn subtract(&self, n: impl Into<Magnitude>) -> Address {
        let bits = self.bit_width();
        let lifted = &self.to_magnitude() + &Magnitude::pow2(bits);
        // lifted >= 2^bits > n mod 2^bits, so the subtraction cannot underflow
        let diff = lifted
            .checked_sub(&n.into().truncated(bits))
            .unwrap_or_default();
        self.with_value(&diff)
    }

    /// Add `n`, or `None` past the last address
    pub fn checked_add(&self, n: impl Into<Magnitude>) -> Option<Address> {
        let sum = &self.to_magnitude() + &n.into();
        (sum.bits() <= self.bit_width()).then(|| self.with_value(&sum))
    }

    /// Subtract `n`, or `None` below the first address
    pub fn checked_sub(&self, n: impl Into<Magnitude>) -> Option<Address> {
        self.to_magnitude()
            .checked_sub(&n.into())
            .map(|diff| self.with_value(&diff))
    }

    /// Unsigned numeric comparison; fails across versions
    pub fn compare_to(&self, other: &Address) -> Result<Ordering> {
        self.ensure_same_version(other)?;
        Ok(self.as_bytes().cmp(other.as_bytes()))
    }

    /// Byte at `index`, counting from the end when negative (`-1` is the last)
    pub fn octet(&self, index: isize) -> Option<u8> {
        let bytes = self.as_bytes();
        let pos = if index >= 0 {
            index as usize
        } else {
            bytes.len().checked_sub(index.unsigned_abs())?
        };
        bytes.get(pos).copied()
    }

    /// Render in the given style
    pub fn format(&self, mode: FormatMode) -> String {
        format_address(self, mode)
    }

    /// Check for the `::ffff:a.b.c.d` pattern
    pub fn is_mapped_ipv4(&self) -> bool {
        match self {
            Address::V4(_) => false,
            Address::V6(bytes) => bytes[..12] == MAPPED_PREFIX,
        }
    }

    /// IPv4 form: identity for IPv4, the embedded address for mapped IPv6
    pub fn as_ipv4(&self) -> Result<Address> {
        match self {
            Address::V4(_) => Ok(*self),
            Address::V6(bytes) if self.is_mapped_ipv4() => {
                Ok(Address::V4([bytes[12], bytes[13], bytes[14], bytes[15]]))
            }
            Address::V6(_) => Err(NetblockError::InvalidFormat(format!(
                "{} is not an IPv4 address encoded in an IPv6 address",
                self
            ))),
        }
    }

    /// IPv6 form: `::ffff:`-mapped for IPv4, identity for IPv6
    pub fn as_ipv6(&self) -> Address {
        match self {
            Address::V4(v4) => {
                let mut bytes = [0u8; 16];
                bytes[..12].copy_from_slice(&MAPPED_PREFIX);
                bytes[12..].copy_from_slice(v4);
                Address::V6(bytes)
            }
            Address::V6(_) => *self,
        }
    }

    /// Convert to the other version
    pub fn as_other_version(&self) -> Result<Address> {
        match self {
            Address::V4(_) => Ok(self.as_ipv6()),
            Address::V6(_) => self.as_ipv4(),
        }
    }
}

fn zip_bytes<const N: usize>(a: &[u8; N], b: &[u8; N], f: fn(u8, u8) -> u8) -> [u8; N] {
    let mut out = *a;
    for (x, y) in out.iter_mut().zip(b) {
        *x = f(*x, *y);
    }
    out
}

impl Not for Address {
    type Output = Address;

    fn not(self) -> Address {
        self.bitwise_not()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mode = match self {
            Address::V4(_) => FormatMode::Compact,
            Address::V6(_) => FormatMode::MayMappedCompact,
        };
        f.pad(&self.format(mode))
    }
}

impl FromStr for Address {
    type Err = NetblockError;

    fn from_str(s: &str) -> Result<Self> {
        Address::parse(s)
    }
}

impl From<u32> for Address {
    fn from(value: u32) -> Self {
        Address::from_u32(value)
    }
}

impl TryFrom<&Magnitude> for Address {
    type Error = NetblockError;

    fn try_from(value: &Magnitude) -> Result<Self> {
        Address::from_magnitude(value)
    }
}

impl From<Ipv4Addr> for Address {
    fn from(addr: Ipv4Addr) -> Self {
        Address::V4(addr.octets())
    }
}

impl From<Ipv6Addr> for Address {
    fn from(addr: Ipv6Addr) -> Self {
        Address::V6(addr.octets())
    }
}

impl From<IpAddr> for Address {
    fn from(addr: IpAddr) -> Self {
        match addr {
            IpAddr::V4(v4) => v4.into(),
            IpAddr::V6(v6) => v6.into(),
        }
    }
}

impl From<Address> for IpAddr {
    fn from(addr: Address) -> Self {
        match addr {
            Address::V4(bytes) => IpAddr::V4(Ipv4Addr::from(bytes)),
            Address::V6(bytes) => IpAddr::V6(Ipv6Addr::from(bytes)),
        }
    }
}

impl Serialize for Address {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Address::parse(&s).map_err(de::Error::custom)
    }
}

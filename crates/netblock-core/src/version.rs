//! IP protocol versions and their per-family constants

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Address, NetblockError, Result};

/// IP protocol version tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum IpVersion {
    /// 32-bit addresses
    V4,
    /// 128-bit addresses
    V6,
}

impl IpVersion {
    /// Address width in bits, which is also the largest valid prefix length
    pub const fn bit_width(self) -> u8 {
        match self {
            IpVersion::V4 => Ipv4::MAX_PREFIX,
            IpVersion::V6 => Ipv6::MAX_PREFIX,
        }
    }

    /// Address width in bytes
    pub const fn byte_len(self) -> usize {
        match self {
            IpVersion::V4 => Ipv4::BYTES,
            IpVersion::V6 => Ipv6::BYTES,
        }
    }

    /// Subnet mask with the top `prefix_len` bits set
    ///
    /// Fails with `OutOfRange` when `prefix_len` exceeds the bit width.
    pub fn subnet_mask(self, prefix_len: u8) -> Result<Address> {
        self.check_prefix(prefix_len)?;
        Ok(self.prefix_mask(prefix_len))
    }

    /// Subnet mask for an already validated prefix length
    ///
    /// Lengths past the bit width saturate to the all-ones mask.
    pub fn prefix_mask(self, prefix_len: u8) -> Address {
        match self {
            IpVersion::V4 => Ipv4::prefix_mask(prefix_len),
            IpVersion::V6 => Ipv6::prefix_mask(prefix_len),
        }
    }

    /// The all-ones mask of this version
    pub fn global_netmask(self) -> Address {
        match self {
            IpVersion::V4 => Ipv4::global_netmask(),
            IpVersion::V6 => Ipv6::global_netmask(),
        }
    }

    /// Guess the version of a textual address.
    ///
    /// Colon-hex wins over dotted-quad so that `::ffff:1.2.3.4` is IPv6.
    pub fn sniff(input: &str) -> Option<IpVersion> {
        if input.contains(':') {
            Some(IpVersion::V6)
        } else if input.contains('.') {
            Some(IpVersion::V4)
        } else {
            None
        }
    }

    /// Validate a prefix length against this version's width
    pub fn check_prefix(self, prefix_len: u8) -> Result<()> {
        if prefix_len > self.bit_width() {
            return Err(NetblockError::OutOfRange(format!(
                "prefix length {} exceeds {} for {}",
                prefix_len,
                self.bit_width(),
                self
            )));
        }
        Ok(())
    }
}

impl fmt::Display for IpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IpVersion::V4 => write!(f, "IPv4"),
            IpVersion::V6 => write!(f, "IPv6"),
        }
    }
}

/// Behaviour that differs between the two address families
///
/// Implemented once per family by [`Ipv4`] and [`Ipv6`]; [`IpVersion`]
/// dispatches to them.
pub trait AddressFamily {
    /// Version tag of this family
    const VERSION: IpVersion;
    /// Bit width / largest prefix length
    const MAX_PREFIX: u8;
    /// Byte width
    const BYTES: usize;

    /// Subnet mask with the top `prefix_len` bits set, saturating at
    /// [`Self::MAX_PREFIX`]
    fn prefix_mask(prefix_len: u8) -> Address;

    /// The all-ones mask
    fn global_netmask() -> Address;
}

/// IPv4 family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv4;

/// IPv6 family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ipv6;

impl AddressFamily for Ipv4 {
    const VERSION: IpVersion = IpVersion::V4;
    const MAX_PREFIX: u8 = 32;
    const BYTES: usize = 4;

    fn prefix_mask(prefix_len: u8) -> Address {
        let prefix_len = prefix_len.min(Self::MAX_PREFIX);
        let mask = if prefix_len == 0 {
            0
        } else {
            u32::MAX << (Self::MAX_PREFIX - prefix_len)
        };
        Address::V4(mask.to_be_bytes())
    }

    fn global_netmask() -> Address {
        Address::V4([0xFF; 4])
    }
}

impl AddressFamily for Ipv6 {
    const VERSION: IpVersion = IpVersion::V6;
    const MAX_PREFIX: u8 = 128;
    const BYTES: usize = 16;

    fn prefix_mask(prefix_len: u8) -> Address {
        let prefix_len = prefix_len.min(Self::MAX_PREFIX);
        let mut bytes = [0u8; 16];
        for (i, word) in bytes.chunks_exact_mut(4).enumerate() {
            // shifting a u32 by 32 overflows, so a fully clear word is special-cased
            let shift = (32 * (i as i32 + 1) - prefix_len as i32).clamp(0, 32);
            let mask = if shift == 32 { 0 } else { u32::MAX << shift };
            word.copy_from_slice(&mask.to_be_bytes());
        }
        Address::V6(bytes)
    }

    fn global_netmask() -> Address {
        Address::V6([0xFF; 16])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bit_widths() {
        assert_eq!(IpVersion::V4.bit_width(), 32);
        assert_eq!(IpVersion::V6.bit_width(), 128);
        assert_eq!(IpVersion::V4.byte_len(), 4);
        assert_eq!(IpVersion::V6.byte_len(), 16);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(IpVersion::sniff("10.0.0.1"), Some(IpVersion::V4));
        assert_eq!(IpVersion::sniff("::1"), Some(IpVersion::V6));
        assert_eq!(IpVersion::sniff("::ffff:10.0.0.1"), Some(IpVersion::V6));
        assert_eq!(IpVersion::sniff("cake"), None);
    }

    #[test]
    fn test_ipv4_masks() {
        assert_eq!(Ipv4::prefix_mask(0), Address::V4([0, 0, 0, 0]));
        assert_eq!(Ipv4::prefix_mask(24), Address::V4([255, 255, 255, 0]));
        assert_eq!(Ipv4::prefix_mask(20), Address::V4([255, 255, 240, 0]));
        assert_eq!(Ipv4::prefix_mask(32), Ipv4::global_netmask());
        assert_eq!(Ipv4::prefix_mask(40), Ipv4::global_netmask());
        assert!(IpVersion::V4.subnet_mask(33).is_err());
        assert_eq!(IpVersion::V4.subnet_mask(8).unwrap(), Address::V4([255, 0, 0, 0]));
    }

    #[test]
    fn test_ipv6_masks() {
        assert_eq!(Ipv6::prefix_mask(0), Address::V6([0; 16]));
        assert_eq!(Ipv6::prefix_mask(128), Ipv6::global_netmask());
        assert_eq!(Ipv6::prefix_mask(36).to_string(), "ffff:ffff:f000::");
        assert_eq!(Ipv6::prefix_mask(64).to_string(), "ffff:ffff:ffff:ffff::");
        assert_eq!(Ipv6::prefix_mask(127).to_string(), "ffff:ffff:ffff:ffff:ffff:ffff:ffff:fffe");
        assert!(IpVersion::V6.subnet_mask(129).is_err());
    }

    #[test]
    fn test_check_prefix_error() {
        let err = IpVersion::V4.check_prefix(40).unwrap_err();
        assert!(matches!(err, NetblockError::OutOfRange(_)));
    }
}

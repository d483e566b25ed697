//! CIDR blocks and block-set algebra
//!
//! Provides utilities for working with CIDR network blocks:
//! - Parse CIDR notation (e.g., "192.168.0.0/24", "2001:db8::/32")
//! - Derive mask, first and last address, address count
//! - Containment and overlap tests between blocks and addresses
//! - Split, merge and exclude collections of blocks
//! - Iterate every address of a block
//!
//! # Examples
//!
//! ```
//! use netblock_cidr::{Address, NetworkAddress};
//!
//! let block = NetworkAddress::parse("192.168.1.10/24")?;
//! assert_eq!(block.network_start(), Address::parse("192.168.1.0")?);
//! assert_eq!(block.network_end(), Address::parse("192.168.1.255")?);
//! assert_eq!(block.address_count().to_string(), "256");
//! assert!(block.contains_address(&Address::parse("192.168.1.1")?)?);
//! # Ok::<(), netblock_cidr::NetblockError>(())
//! ```

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

mod blocks;
mod iter;

pub use iter::AddressIter;
pub use netblock_core::{Address, FormatMode, IpVersion, Magnitude, NetblockError, Result};

/// An address paired with a prefix length
///
/// The stored address need not be the network identifier: `192.168.1.10/24`
/// keeps `192.168.1.10` and derives `192.168.1.0` on demand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NetworkAddress {
    address: Address,
    prefix_len: u8,
}

impl NetworkAddress {
    /// Create a block from an address and prefix length
    ///
    /// # Arguments
    ///
    /// * `address` - Any address inside the block
    /// * `prefix_len` - Prefix length (0-32 for IPv4, 0-128 for IPv6)
    pub fn new(address: Address, prefix_len: u8) -> Result<Self> {
        address.version().check_prefix(prefix_len)?;
        Ok(Self {
            address,
            prefix_len,
        })
    }

    /// Single-address block (`/32` or `/128`)
    pub fn host(address: Address) -> Self {
        Self {
            address,
            prefix_len: address.version().bit_width(),
        }
    }

    /// Parse CIDR notation
    ///
    /// A missing `/prefix` means a host block.
    ///
    /// # Examples
    ///
    /// ```
    /// use netblock_cidr::NetworkAddress;
    ///
    /// let block = NetworkAddress::parse("10.0.0.0/8").unwrap();
    /// assert_eq!(block.prefix_len(), 8);
    /// assert_eq!(NetworkAddress::parse("::1").unwrap().prefix_len(), 128);
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        Self::parse_with_prefix(input, None)
    }

    /// Parse an address or CIDR string with an optional explicit prefix
    ///
    /// An explicit `prefix_len` overrides one embedded in `input`.
    pub fn parse_with_prefix(input: &str, prefix_len: Option<u8>) -> Result<Self> {
        let (address, embedded) = match input.split_once('/') {
            Some((address, suffix)) => (address, Some(suffix)),
            None => (input, None),
        };
        let address = Address::parse(address)?;
        let prefix_len = match (prefix_len, embedded) {
            (Some(prefix_len), _) => prefix_len,
            (None, Some(suffix)) => parse_prefix(suffix, address.version())?,
            (None, None) => address.version().bit_width(),
        };
        Self::new(address, prefix_len)
    }

    /// Same address under a different prefix length
    pub fn with_prefix(&self, prefix_len: u8) -> Result<Self> {
        Self::new(self.address, prefix_len)
    }

    /// The stored address
    pub fn address(&self) -> Address {
        self.address
    }

    /// Prefix length
    pub fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// IP version of the block
    pub fn version(&self) -> IpVersion {
        self.address.version()
    }

    /// Mask with the top `prefix_len` bits set
    pub fn subnet_mask(&self) -> Address {
        self.version().prefix_mask(self.prefix_len)
    }

    /// First address of the block (`address & mask`)
    pub fn network_start(&self) -> Address {
        self.address.truncate_to_prefix(self.prefix_len)
    }

    /// Last address of the block (`address | !mask`)
    pub fn network_end(&self) -> Address {
        self.address.fill_host_bits(self.prefix_len)
    }

    /// IPv4 broadcast address; IPv6 has none
    pub fn broadcast(&self) -> Option<Address> {
        match self.version() {
            IpVersion::V4 => Some(self.network_end()),
            IpVersion::V6 => None,
        }
    }

    /// Number of addresses, `2^(bit_width - prefix_len)`
    pub fn address_count(&self) -> Magnitude {
        Magnitude::pow2((self.version().bit_width() - self.prefix_len) as u32)
    }

    /// Address at `offset` inside the block
    ///
    /// Non-negative offsets count up from the network start, negative ones
    /// count down from the network end; `from_start` overrides the choice of
    /// anchor. Offsets that leave the block wrap like [`Address::add`].
    /// Distances of 2^127 or more need [`NetworkAddress::address_at`].
    pub fn address_in_network(&self, offset: i128, from_start: Option<bool>) -> Address {
        let positive = offset >= 0;
        let distance = Magnitude::from(offset.unsigned_abs());
        match from_start.unwrap_or(positive) {
            true if positive => self.address_at(distance, true),
            true => self.network_start().subtract(distance),
            false => self.address_at(distance, false),
        }
    }

    /// Address `distance` steps up from the network start, or down from the
    /// network end when `from_start` is false
    ///
    /// Takes any width of distance, so the whole of `::/0` is reachable.
    pub fn address_at(&self, distance: impl Into<Magnitude>, from_start: bool) -> Address {
        if from_start {
            self.network_start().add(distance)
        } else {
            self.network_end().subtract(distance)
        }
    }

    /// Check whether `ip` lies inside the block
    pub fn contains_address(&self, ip: &Address) -> Result<bool> {
        self.address.ensure_same_version(ip)?;
        Ok(self.network_start() <= *ip && *ip <= self.network_end())
    }

    /// Check whether `other` lies entirely inside this block
    pub fn encloses_subnet(&self, other: &NetworkAddress) -> Result<bool> {
        self.address.ensure_same_version(&other.address)?;
        if self.prefix_len > other.prefix_len {
            return Ok(false);
        }
        self.shares_subnet_space(other)
    }

    /// Check whether the two blocks overlap at all
    pub fn shares_subnet_space(&self, other: &NetworkAddress) -> Result<bool> {
        self.address.ensure_same_version(&other.address)?;
        let (coarse, fine) = if self.prefix_len > other.prefix_len {
            (other, self)
        } else {
            (self, other)
        };
        Ok(coarse.network_start() <= fine.network_start()
            && coarse.network_end() >= fine.network_end())
    }

    /// Check whether the stored address is the block's first address
    pub fn is_network_identifier(&self) -> bool {
        self.address == self.network_start()
    }

    /// Same block with the address replaced by the network start
    pub fn network_identifier(&self) -> NetworkAddress {
        Self {
            address: self.network_start(),
            prefix_len: self.prefix_len,
        }
    }

    /// The block one bit shorter that contains this one; `None` at `/0`
    pub fn parent(&self) -> Option<NetworkAddress> {
        let prefix_len = self.prefix_len.checked_sub(1)?;
        Some(Self {
            address: self.address.truncate_to_prefix(prefix_len),
            prefix_len,
        })
    }

    /// Compare by address, then prefix length; fails across versions
    pub fn compare_to(&self, other: &NetworkAddress) -> Result<Ordering> {
        Ok(self
            .address
            .compare_to(&other.address)?
            .then(self.prefix_len.cmp(&other.prefix_len)))
    }

    /// Classful size label of an IPv4 block, e.g. `"4 C"` for a `/22`
    pub fn network_class(&self) -> Option<String> {
        if self.version() != IpVersion::V4 {
            return None;
        }
        let p = self.prefix_len as u32;
        let label = if p > 24 {
            format!("1/{} C", 1u64 << (p - 24))
        } else if p > 16 {
            format!("{} C", 1u64 << (24 - p))
        } else if p > 8 {
            format!("{} B", 1u64 << (16 - p))
        } else {
            format!("{} A", 1u64 << (8 - p))
        };
        Some(label)
    }

    /// Lazily enumerate every address from network start to network end
    ///
    /// Each call returns an independent cursor.
    pub fn iter(&self) -> AddressIter {
        AddressIter::new(self.network_start(), self.network_end())
    }
}

/// Parse the decimal suffix after `/`
fn parse_prefix(suffix: &str, version: IpVersion) -> Result<u8> {
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return Err(NetblockError::InvalidFormat(format!(
            "malformed CIDR suffix '{}'",
            suffix
        )));
    }
    suffix
        .parse::<u8>()
        .ok()
        .filter(|&p| p <= version.bit_width())
        .ok_or_else(|| {
            NetblockError::OutOfRange(format!(
                "prefix length {} exceeds {} for {}",
                suffix,
                version.bit_width(),
                version
            ))
        })
}

impl<'a> IntoIterator for &'a NetworkAddress {
    type Item = Address;
    type IntoIter = AddressIter;

    fn into_iter(self) -> AddressIter {
        self.iter()
    }
}

impl fmt::Display for NetworkAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.address, self.prefix_len)
    }
}

impl FromStr for NetworkAddress {
    type Err = NetblockError;

    fn from_str(s: &str) -> Result<Self> {
        NetworkAddress::parse(s)
    }
}

impl From<Address> for NetworkAddress {
    fn from(address: Address) -> Self {
        NetworkAddress::host(address)
    }
}

impl Serialize for NetworkAddress {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NetworkAddress {
    fn deserialize<D>(deserializer: D) -> std::result::Result<NetworkAddress, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NetworkAddress::parse(&s).map_err(de::Error::custom)
    }
}

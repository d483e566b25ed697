//! Arbitrary-precision unsigned integers
//!
//! IPv6 addresses are 128 bits wide and the size of a `/0` block is `2^128`,
//! which does not fit any native integer. [`Magnitude`] stores the value as
//! little-endian 32-bit limbs and provides just the arithmetic the address
//! types need: addition, checked subtraction, shifts, truncation to a bit
//! width and decimal conversion.

use std::cmp::Ordering;
use std::fmt;
use std::ops::{Add, Shl, Shr};
use std::str::FromStr;

use crate::{NetblockError, Result};

/// Unsigned integer of unbounded width
///
/// # Examples
///
/// ```
/// use netblock_core::Magnitude;
///
/// let count = Magnitude::pow2(128);
/// assert_eq!(count.to_string(), "340282366920938463463374607431768211456");
/// assert_eq!(count.bits(), 129);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Magnitude {
    /// Least significant limb first, never with trailing zero limbs.
    limbs: Vec<u32>,
}

impl Magnitude {
    /// The value zero
    pub fn zero() -> Self {
        Self::default()
    }

    /// The value one
    pub fn one() -> Self {
        Self::from(1u32)
    }

    /// `2^exp`
    pub fn pow2(exp: u32) -> Self {
        Self::one() << exp
    }

    fn normalized(mut limbs: Vec<u32>) -> Self {
        while limbs.last() == Some(&0) {
            limbs.pop();
        }
        Self { limbs }
    }

    /// Check whether the value is zero
    pub fn is_zero(&self) -> bool {
        self.limbs.is_empty()
    }

    /// Number of significant bits (0 for zero)
    pub fn bits(&self) -> u32 {
        match self.limbs.last() {
            Some(top) => (self.limbs.len() as u32 - 1) * 32 + (32 - top.leading_zeros()),
            None => 0,
        }
    }

    /// Build from big-endian bytes of any length
    pub fn from_be_bytes(bytes: &[u8]) -> Self {
        let limbs = bytes
            .rchunks(4)
            .map(|chunk| chunk.iter().fold(0u32, |acc, &b| (acc << 8) | b as u32))
            .collect();
        Self::normalized(limbs)
    }

    /// Big-endian bytes, left-padded to `len`
    ///
    /// Returns `None` when the value needs more than `len` bytes.
    pub fn to_be_bytes(&self, len: usize) -> Option<Vec<u8>> {
        if self.bits() as usize > len * 8 {
            return None;
        }
        Some(self.to_be_bytes_truncated(len))
    }

    /// The low `len` bytes in big-endian order; higher bytes are dropped.
    pub fn to_be_bytes_truncated(&self, len: usize) -> Vec<u8> {
        let mut out = vec![0u8; len];
        for (i, limb) in self.limbs.iter().enumerate() {
            for (j, byte) in limb.to_le_bytes().iter().enumerate() {
                let pos = i * 4 + j;
                if pos < len {
                    out[len - 1 - pos] = *byte;
                }
            }
        }
        out
    }

    /// Keep only the low `bits` bits (reduction modulo `2^bits`)
    pub fn truncated(&self, bits: u32) -> Self {
        let full = (bits / 32) as usize;
        let rem = bits % 32;
        let keep = full + usize::from(rem > 0);
        let mut limbs: Vec<u32> = self.limbs.iter().take(keep).copied().collect();
        if rem > 0 {
            if let Some(top) = limbs.get_mut(full) {
                *top &= (1u32 << rem) - 1;
            }
        }
        Self::normalized(limbs)
    }

    /// `self - other`, or `None` if the result would be negative
    pub fn checked_sub(&self, other: &Magnitude) -> Option<Magnitude> {
        if self < other {
            return None;
        }
        let mut out = Vec::with_capacity(self.limbs.len());
        let mut borrow = 0i64;
        for (i, &limb) in self.limbs.iter().enumerate() {
            let rhs = other.limbs.get(i).copied().unwrap_or(0) as i64;
            let mut diff = limb as i64 - rhs - borrow;
            if diff < 0 {
                diff += 1 << 32;
                borrow = 1;
            } else {
                borrow = 0;
            }
            out.push(diff as u32);
        }
        Some(Self::normalized(out))
    }

    /// Convert to `u128` if it fits
    pub fn to_u128(&self) -> Option<u128> {
        if self.limbs.len() > 4 {
            return None;
        }
        Some(
            self.limbs
                .iter()
                .rev()
                .fold(0u128, |acc, &limb| (acc << 32) | limb as u128),
        )
    }

    fn mul_small_add(&mut self, mul: u32, add: u32) {
        let mut carry = add as u64;
        for limb in self.limbs.iter_mut() {
            let product = *limb as u64 * mul as u64 + carry;
            *limb = product as u32;
            carry = product >> 32;
        }
        if carry > 0 {
            self.limbs.push(carry as u32);
        }
    }

    fn div_small(&mut self, div: u32) -> u32 {
        let mut rem = 0u64;
        for limb in self.limbs.iter_mut().rev() {
            let cur = (rem << 32) | *limb as u64;
            *limb = (cur / div as u64) as u32;
            rem = cur % div as u64;
        }
        while self.limbs.last() == Some(&0) {
            self.limbs.pop();
        }
        rem as u32
    }
}

impl From<u32> for Magnitude {
    fn from(value: u32) -> Self {
        Self::normalized(vec![value])
    }
}

impl From<u64> for Magnitude {
    fn from(value: u64) -> Self {
        Self::normalized(vec![value as u32, (value >> 32) as u32])
    }
}

impl From<u128> for Magnitude {
    fn from(value: u128) -> Self {
        Self::normalized((0..4).map(|i| (value >> (i * 32)) as u32).collect())
    }
}

impl Ord for Magnitude {
    fn cmp(&self, other: &Self) -> Ordering {
        self.limbs
            .len()
            .cmp(&other.limbs.len())
            .then_with(|| self.limbs.iter().rev().cmp(other.limbs.iter().rev()))
    }
}

impl PartialOrd for Magnitude {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Add<&Magnitude> for &Magnitude {
    type Output = Magnitude;

    fn add(self, other: &Magnitude) -> Magnitude {
        let (long, short) = if self.limbs.len() >= other.limbs.len() {
            (&self.limbs, &other.limbs)
        } else {
            (&other.limbs, &self.limbs)
        };

        let mut out = Vec::with_capacity(long.len() + 1);
        let mut carry = 0u64;
        for (i, &limb) in long.iter().enumerate() {
            let sum = limb as u64 + short.get(i).copied().unwrap_or(0) as u64 + carry;
            out.push(sum as u32);
            carry = sum >> 32;
        }
        if carry > 0 {
            out.push(carry as u32);
        }
        Magnitude::normalized(out)
    }
}

impl Add for Magnitude {
    type Output = Magnitude;

    fn add(self, other: Magnitude) -> Magnitude {
        &self + &other
    }
}

impl Shl<u32> for Magnitude {
    type Output = Magnitude;

    fn shl(self, bits: u32) -> Magnitude {
        if self.is_zero() {
            return self;
        }
        let bit_shift = bits % 32;
        let mut out = vec![0u32; (bits / 32) as usize];
        if bit_shift == 0 {
            out.extend_from_slice(&self.limbs);
        } else {
            let mut carry = 0u32;
            for &limb in &self.limbs {
                out.push((limb << bit_shift) | carry);
                carry = limb >> (32 - bit_shift);
            }
            if carry != 0 {
                out.push(carry);
            }
        }
        Magnitude::normalized(out)
    }
}

impl Shr<u32> for Magnitude {
    type Output = Magnitude;

    fn shr(self, bits: u32) -> Magnitude {
        let limb_shift = (bits / 32) as usize;
        if limb_shift >= self.limbs.len() {
            return Magnitude::zero();
        }
        let bit_shift = bits % 32;
        let src = &self.limbs[limb_shift..];
        let out = if bit_shift == 0 {
            src.to_vec()
        } else {
            (0..src.len())
                .map(|i| {
                    let high = src.get(i + 1).copied().unwrap_or(0);
                    (src[i] >> bit_shift) | (high << (32 - bit_shift))
                })
                .collect()
        };
        Magnitude::normalized(out)
    }
}

impl FromStr for Magnitude {
    type Err = NetblockError;

    /// Parse a non-negative decimal integer
    fn from_str(s: &str) -> Result<Self> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(NetblockError::InvalidFormat(format!(
                "'{}' is not a non-negative decimal integer",
                s
            )));
        }
        let mut value = Magnitude::zero();
        for digit in s.bytes() {
            value.mul_small_add(10, (digit - b'0') as u32);
        }
        Ok(Magnitude::normalized(value.limbs))
    }
}

impl fmt::Display for Magnitude {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_zero() {
            return f.pad("0");
        }
        const CHUNK: u32 = 1_000_000_000;
        let mut rest = self.clone();
        let mut chunks = Vec::new();
        while !rest.is_zero() {
            chunks.push(rest.div_small(CHUNK));
        }
        let mut out = String::with_capacity(chunks.len() * 9);
        let mut iter = chunks.iter().rev();
        if let Some(first) = iter.next() {
            out.push_str(&first.to_string());
        }
        for chunk in iter {
            out.push_str(&format!("{:09}", chunk));
        }
        f.pad(&out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero() {
        let zero = Magnitude::zero();
        assert!(zero.is_zero());
        assert_eq!(zero.bits(), 0);
        assert_eq!(zero.to_string(), "0");
        assert_eq!(Magnitude::from(0u32), zero);
    }

    #[test]
    fn test_add_with_carry() {
        let a = Magnitude::from(u32::MAX as u64);
        let b = Magnitude::one();
        assert_eq!(&a + &b, Magnitude::from(1u64 << 32));

        let max = Magnitude::from(u128::MAX);
        assert_eq!((&max + &Magnitude::one()), Magnitude::pow2(128));
    }

    #[test]
    fn test_checked_sub() {
        let a = Magnitude::from(1u64 << 32);
        let b = Magnitude::one();
        assert_eq!(a.checked_sub(&b), Some(Magnitude::from(u32::MAX)));
        assert_eq!(b.checked_sub(&a), None);
        assert_eq!(a.checked_sub(&a), Some(Magnitude::zero()));
    }

    #[test]
    fn test_shifts() {
        assert_eq!(Magnitude::one() << 40, Magnitude::from(1u64 << 40));
        assert_eq!(Magnitude::from(0xFF00u32) >> 8, Magnitude::from(0xFFu32));
        assert_eq!(Magnitude::pow2(100) >> 100, Magnitude::one());
        assert_eq!(Magnitude::one() >> 1, Magnitude::zero());
        assert_eq!(Magnitude::from(0x8000_0001u32) << 1, Magnitude::from(0x1_0000_0002u64));
    }

    #[test]
    fn test_be_bytes() {
        let m = Magnitude::from_be_bytes(&[0xC0, 0xA8, 0x01, 0x0A]);
        assert_eq!(m, Magnitude::from(0xC0A8010Au32));
        assert_eq!(m.to_be_bytes(4), Some(vec![0xC0, 0xA8, 0x01, 0x0A]));
        assert_eq!(m.to_be_bytes(6), Some(vec![0, 0, 0xC0, 0xA8, 0x01, 0x0A]));
        assert_eq!(m.to_be_bytes(3), None);
        assert_eq!(m.to_be_bytes_truncated(2), vec![0x01, 0x0A]);
    }

    #[test]
    fn test_truncated() {
        let m = Magnitude::from(0x1_FFFF_FFFFu64);
        assert_eq!(m.truncated(32), Magnitude::from(u32::MAX));
        assert_eq!(m.truncated(4), Magnitude::from(0xFu32));
        assert_eq!(Magnitude::pow2(128).truncated(128), Magnitude::zero());
    }

    #[test]
    fn test_decimal_round_trip() {
        let text = "340282366920938463463374607431768211455";
        let m: Magnitude = text.parse().unwrap();
        assert_eq!(m, Magnitude::from(u128::MAX));
        assert_eq!(m.to_string(), text);
        assert_eq!("1000000000".parse::<Magnitude>().unwrap().to_string(), "1000000000");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("".parse::<Magnitude>().is_err());
        assert!("-1".parse::<Magnitude>().is_err());
        assert!("12a".parse::<Magnitude>().is_err());
    }

    #[test]
    fn test_ordering() {
        assert!(Magnitude::from(5u32) < Magnitude::from(6u32));
        assert!(Magnitude::pow2(64) > Magnitude::from(u64::MAX));
        assert_eq!(Magnitude::from(7u64).cmp(&Magnitude::from(7u32)), Ordering::Equal);
    }

    #[test]
    fn test_to_u128() {
        assert_eq!(Magnitude::from(42u32).to_u128(), Some(42));
        assert_eq!(Magnitude::from(u128::MAX).to_u128(), Some(u128::MAX));
        assert_eq!(Magnitude::pow2(128).to_u128(), None);
    }
}

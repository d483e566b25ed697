//! Textual rendering of addresses

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::{Address, Magnitude};

/// Output style for [`Address::format`]
///
/// IPv4 addresses render every mode: `Abbreviated` and `MayMappedCompact`
/// give the plain dotted quad, and `MappedIpv4` gives the mapped IPv6 form,
/// the same text as `addr.as_ipv6().format(FormatMode::MappedIpv4)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FormatMode {
    /// Every octet or hextet zero-padded to fixed width
    Full,
    /// Dotted-quad without padding, or colon-hex with the longest zero run
    /// replaced by `::`
    #[default]
    Compact,
    /// Colon-hex with leading zeros stripped but no `::`; dotted quad for IPv4
    Abbreviated,
    /// `::ffff:a.b.c.d` for IPv4 and IPv4-mapped addresses, compact otherwise
    MappedIpv4,
    /// Same as [`FormatMode::MappedIpv4`]; kept as the display default for IPv6
    MayMappedCompact,
    /// Unsigned decimal integer
    Integer,
}

pub(crate) fn format_address(address: &Address, mode: FormatMode) -> String {
    match address {
        Address::V4(bytes) => format_v4(bytes, mode),
        Address::V6(bytes) => format_v6(bytes, mode),
    }
}

fn format_v4(bytes: &[u8; 4], mode: FormatMode) -> String {
    let [a, b, c, d] = *bytes;
    match mode {
        FormatMode::Full => format!("{:03}.{:03}.{:03}.{:03}", a, b, c, d),
        FormatMode::Compact | FormatMode::Abbreviated | FormatMode::MayMappedCompact => {
            format!("{}.{}.{}.{}", a, b, c, d)
        }
        FormatMode::MappedIpv4 => format_address(&Address::V4(*bytes).as_ipv6(), mode),
        FormatMode::Integer => u32::from_be_bytes(*bytes).to_string(),
    }
}

fn format_v6(bytes: &[u8; 16], mode: FormatMode) -> String {
    let groups = hextets(bytes);
    match mode {
        FormatMode::Full => join(&groups, |out, g| write!(out, "{:04x}", g)),
        FormatMode::Abbreviated => join(&groups, |out, g| write!(out, "{:x}", g)),
        FormatMode::Compact => compact(&groups),
        FormatMode::MappedIpv4 | FormatMode::MayMappedCompact => {
            if Address::V6(*bytes).is_mapped_ipv4() {
                format!(
                    "::ffff:{}.{}.{}.{}",
                    bytes[12], bytes[13], bytes[14], bytes[15]
                )
            } else {
                compact(&groups)
            }
        }
        FormatMode::Integer => Magnitude::from_be_bytes(bytes).to_string(),
    }
}

fn hextets(bytes: &[u8; 16]) -> [u16; 8] {
    let mut groups = [0u16; 8];
    for (group, pair) in groups.iter_mut().zip(bytes.chunks_exact(2)) {
        *group = u16::from_be_bytes([pair[0], pair[1]]);
    }
    groups
}

fn join<F>(groups: &[u16], mut write_group: F) -> String
where
    F: FnMut(&mut String, u16) -> std::fmt::Result,
{
    let mut out = String::with_capacity(groups.len() * 5);
    for (i, &group) in groups.iter().enumerate() {
        if i > 0 {
            out.push(':');
        }
        // writing into a String cannot fail
        let _ = write_group(&mut out, group);
    }
    out
}

/// Replace the longest run of zero groups with `::`.
///
/// Runs of a single zero group are compressed too.
fn compact(groups: &[u16; 8]) -> String {
    let hex = |out: &mut String, g: u16| write!(out, "{:x}", g);
    match longest_zero_run(groups) {
        Some((start, len)) => format!(
            "{}::{}",
            join(&groups[..start], hex),
            join(&groups[start + len..], hex)
        ),
        None => join(groups, hex),
    }
}

/// `(start, len)` of the longest zero run; the first one wins a tie.
fn longest_zero_run(groups: &[u16; 8]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    let mut run_start = None;
    for (i, &group) in groups.iter().enumerate() {
        if group != 0 {
            run_start = None;
            continue;
        }
        let start = *run_start.get_or_insert(i);
        let len = i + 1 - start;
        if best.map_or(true, |(_, best_len)| len > best_len) {
            best = Some((start, len));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn v6(s: &str) -> Address {
        Address::parse(s).unwrap()
    }

    #[test]
    fn test_v4_modes() {
        let addr = Address::parse("192.168.1.10").unwrap();
        assert_eq!(addr.format(FormatMode::Full), "192.168.001.010");
        assert_eq!(addr.format(FormatMode::Compact), "192.168.1.10");
        assert_eq!(addr.format(FormatMode::Integer), "3232235786");
        assert_eq!(addr.format(FormatMode::MappedIpv4), "::ffff:192.168.1.10");
    }

    #[test]
    fn test_v4_ipv6_only_modes() {
        let addr = Address::parse("10.0.0.1").unwrap();
        assert_eq!(addr.format(FormatMode::Abbreviated), "10.0.0.1");
        assert_eq!(addr.format(FormatMode::MayMappedCompact), "10.0.0.1");
        assert_eq!(
            addr.format(FormatMode::MappedIpv4),
            addr.as_ipv6().format(FormatMode::MappedIpv4)
        );
    }

    #[test]
    fn test_v6_modes() {
        let cases = [
            (
                "::1",
                "::1",
                "0:0:0:0:0:0:0:1",
                "0000:0000:0000:0000:0000:0000:0000:0001",
            ),
            (
                "fe80::226:bbff:fe14:7372",
                "fe80::226:bbff:fe14:7372",
                "fe80:0:0:0:226:bbff:fe14:7372",
                "fe80:0000:0000:0000:0226:bbff:fe14:7372",
            ),
            (
                "::ffff:127:0:0:1",
                "::ffff:127:0:0:1",
                "0:0:0:ffff:127:0:0:1",
                "0000:0000:0000:ffff:0127:0000:0000:0001",
            ),
        ];
        for (input, compact, abbreviated, full) in cases {
            let addr = v6(input);
            assert_eq!(addr.format(FormatMode::Compact), compact);
            assert_eq!(addr.format(FormatMode::Abbreviated), abbreviated);
            assert_eq!(addr.format(FormatMode::Full), full);
        }
    }

    #[test]
    fn test_compact_edge_runs() {
        assert_eq!(v6("::").format(FormatMode::Compact), "::");
        assert_eq!(v6("2001:630:d0::").format(FormatMode::Compact), "2001:630:d0::");
        assert_eq!(v6("1:0:2:3:4:5:6:7").format(FormatMode::Compact), "1::2:3:4:5:6:7");
        // equal runs: the first one is compressed
        assert_eq!(v6("1:0:0:2:0:0:3:4").format(FormatMode::Compact), "1::2:0:0:3:4");
        assert_eq!(v6("1:0:2:0:0:3:4:5").format(FormatMode::Compact), "1:0:2::3:4:5");
        assert_eq!(
            v6("1:2:3:4:5:6:7:8").format(FormatMode::Compact),
            "1:2:3:4:5:6:7:8"
        );
    }

    #[test]
    fn test_mapped_modes() {
        let mapped = v6("::ffff:141.44.23.50");
        assert_eq!(mapped.format(FormatMode::MappedIpv4), "::ffff:141.44.23.50");
        assert_eq!(mapped.format(FormatMode::MayMappedCompact), "::ffff:141.44.23.50");
        assert_eq!(mapped.format(FormatMode::Compact), "::ffff:8d2c:1732");

        let plain = v6("2001:db8::1");
        assert_eq!(plain.format(FormatMode::MappedIpv4), "2001:db8::1");
        assert_eq!(plain.format(FormatMode::MayMappedCompact), "2001:db8::1");
    }

    #[test]
    fn test_v6_integer() {
        assert_eq!(v6("::1").format(FormatMode::Integer), "1");
        assert_eq!(
            v6("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff").format(FormatMode::Integer),
            u128::MAX.to_string()
        );
    }
}

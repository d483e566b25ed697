//! Textual address parsers
//!
//! Dotted-quad octets may carry leading zeros so that the zero-padded
//! [`FormatMode::Full`](crate::FormatMode::Full) output parses back.
//! Colon-hex input accepts a single `::`, which stands for as many zero
//! groups as needed to reach eight, and an embedded dotted-quad tail.

use crate::{NetblockError, Result};

/// Parse a dotted-quad IPv4 address
pub(crate) fn parse_ipv4(input: &str) -> Result<[u8; 4]> {
    octets(input).ok_or_else(|| {
        NetblockError::InvalidFormat(format!("'{}' is not a valid IPv4 address", input))
    })
}

fn octets(input: &str) -> Option<[u8; 4]> {
    let mut out = [0u8; 4];
    let mut parts = input.split('.');
    for slot in out.iter_mut() {
        let part = parts.next()?;
        if part.is_empty() || part.len() > 3 || !part.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        *slot = part.parse().ok()?;
    }
    if parts.next().is_some() {
        return None;
    }
    Some(out)
}

/// Parse a colon-hex IPv6 address
pub(crate) fn parse_ipv6(input: &str) -> Result<[u8; 16]> {
    hextets(input)
        .map(|groups| {
            let mut out = [0u8; 16];
            for (chunk, group) in out.chunks_exact_mut(2).zip(groups.iter()) {
                chunk.copy_from_slice(&group.to_be_bytes());
            }
            out
        })
        .ok_or_else(|| {
            NetblockError::InvalidFormat(format!("'{}' is not a valid IPv6 address", input))
        })
}

fn hextets(input: &str) -> Option<[u16; 8]> {
    let mut out = [0u16; 8];
    match input.find("::") {
        Some(pos) => {
            let (head, tail) = (&input[..pos], &input[pos + 2..]);
            if tail.contains("::") {
                return None;
            }
            let head = groups(head, false)?;
            let tail = groups(tail, true)?;
            if head.len() + tail.len() > 7 {
                return None;
            }
            out[..head.len()].copy_from_slice(&head);
            out[8 - tail.len()..].copy_from_slice(&tail);
        }
        None => {
            let all = groups(input, true)?;
            if all.len() != 8 {
                return None;
            }
            out.copy_from_slice(&all);
        }
    }
    Some(out)
}

/// Groups of one side of a `::`; `allow_ipv4` permits a dotted-quad last group.
fn groups(part: &str, allow_ipv4: bool) -> Option<Vec<u16>> {
    if part.is_empty() {
        return Some(Vec::new());
    }
    let pieces: Vec<&str> = part.split(':').collect();
    let mut out = Vec::with_capacity(pieces.len() + 1);
    for (i, piece) in pieces.iter().enumerate() {
        let last = i + 1 == pieces.len();
        if last && allow_ipv4 && piece.contains('.') {
            let [a, b, c, d] = octets(piece)?;
            out.push(u16::from_be_bytes([a, b]));
            out.push(u16::from_be_bytes([c, d]));
        } else {
            if piece.is_empty() || piece.len() > 4 || !piece.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            out.push(u16::from_str_radix(piece, 16).ok()?);
        }
    }
    Some(out)
}

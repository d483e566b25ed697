//! Address enumeration over a block

use std::iter::FusedIterator;

use netblock_core::Address;

/// Iterator over every address of a block, in ascending order
///
/// Created by [`NetworkAddress::iter`](crate::NetworkAddress::iter). Each
/// iterator owns its cursor, so iterating the same block twice (nested or one
/// after the other) never interferes.
///
/// Note: a `/8` holds 16 million addresses and an IPv6 `/64` far more than
/// can ever be visited. Prefer containment tests for large blocks.
#[derive(Debug, Clone)]
pub struct AddressIter {
    next: Option<Address>,
    end: Address,
}

impl AddressIter {
    pub(crate) fn new(start: Address, end: Address) -> Self {
        Self {
            next: Some(start),
            end,
        }
    }
}

impl Iterator for AddressIter {
    type Item = Address;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = if current >= self.end {
            None
        } else {
            current.checked_add(1u32)
        };
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let Some(current) = self.next else {
            return (0, Some(0));
        };
        let remaining = self
            .end
            .to_magnitude()
            .checked_sub(&current.to_magnitude())
            .and_then(|span| span.to_u128())
            .and_then(|span| span.checked_add(1))
            .and_then(|count| usize::try_from(count).ok());
        match remaining {
            Some(count) => (count, Some(count)),
            None => (usize::MAX, None),
        }
    }
}

impl FusedIterator for AddressIter {}

#[cfg(test)]
mod tests {
    use crate::NetworkAddress;
    use netblock_core::Address;

    fn net(s: &str) -> NetworkAddress {
        NetworkAddress::parse(s).unwrap()
    }

    #[test]
    fn test_iterator_small() {
        let ips: Vec<Address> = net("192.168.1.0/30").iter().collect();
        assert_eq!(ips.len(), 4);
        assert_eq!(ips[0].to_string(), "192.168.1.0");
        assert_eq!(ips[3].to_string(), "192.168.1.3");
    }

    #[test]
    fn test_iterator_starts_at_network_start() {
        let ips: Vec<String> = net("10.0.0.6/31").iter().map(|a| a.to_string()).collect();
        assert_eq!(ips, vec!["10.0.0.6", "10.0.0.7"]);
    }

    #[test]
    fn test_iterator_top_of_address_space() {
        let ips: Vec<Address> = net("255.255.255.254/31").iter().collect();
        assert_eq!(ips.len(), 2);

        let ips: Vec<Address> = net("ffff:ffff:ffff:ffff:ffff:ffff:ffff:ffff/128").iter().collect();
        assert_eq!(ips.len(), 1);
    }

    #[test]
    fn test_nested_iteration() {
        let block = net("::/126");
        let mut pairs = 0;
        for outer in &block {
            for inner in &block {
                assert_eq!(inner.version(), outer.version());
                pairs += 1;
            }
        }
        assert_eq!(pairs, 16);
    }

    #[test]
    fn test_restartable() {
        let block = net("10.0.0.0/29");
        let first: Vec<Address> = block.iter().collect();
        let second: Vec<Address> = block.iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 8);
    }

    #[test]
    fn test_size_hint() {
        let mut iter = net("10.0.0.0/29").iter();
        assert_eq!(iter.size_hint(), (8, Some(8)));
        iter.next();
        assert_eq!(iter.size_hint(), (7, Some(7)));
        assert_eq!(iter.by_ref().count(), 7);
        assert_eq!(iter.size_hint(), (0, Some(0)));
        assert_eq!(iter.next(), None);

        assert_eq!(net("::/0").iter().size_hint(), (usize::MAX, None));
    }
}

use netblock_cidr::{Address, FormatMode, NetworkAddress};
use quickcheck::quickcheck;

fn net(s: &str) -> NetworkAddress {
    NetworkAddress::parse(s).expect("valid CIDR")
}

#[test]
fn test_host_block_ranges() {
    let block = net("192.168.1.10/24");
    assert_eq!(block.network_start(), Address::parse("192.168.1.0").unwrap());
    assert_eq!(block.network_end(), Address::parse("192.168.1.255").unwrap());
    assert_eq!(block.address_count().to_string(), "256");
    assert_eq!(block.iter().count(), 256);
}

#[test]
fn test_merge_two_hosts() {
    let merged = NetworkAddress::merge(&[net("0.0.0.0/32"), net("0.0.0.1/32")]);
    assert_eq!(merged, vec![net("0.0.0.0/31")]);
}

#[test]
fn test_exclude_lower_half() {
    let free = net("192.168.0.0/24")
        .excluding(&[net("192.168.0.0/25")])
        .expect("same version");
    assert_eq!(free, vec![net("192.168.0.128/25")]);
}

#[test]
fn test_v6_compact_round_trip() {
    let addr = Address::parse("2001:630:d0::").unwrap();
    let full = addr.format(FormatMode::Full);
    assert_eq!(full, "2001:0630:00d0:0000:0000:0000:0000:0000");
    let back = Address::parse(&full).unwrap();
    assert_eq!(back.format(FormatMode::Compact), "2001:630:d0::");
}

#[test]
fn test_mapped_v4_conversion() {
    let mapped = Address::parse("::ffff:141.44.23.50").unwrap();
    assert_eq!(mapped.as_ipv4().unwrap(), Address::parse("141.44.23.50").unwrap());
}

#[test]
fn test_free_space_then_merge_restores_block() {
    let block = net("10.20.0.0/16");
    let used = [net("10.20.3.0/24"), net("10.20.128.0/20"), net("10.20.255.255/32")];
    let mut pieces = block.excluding(&used).unwrap();
    pieces.extend_from_slice(&used);
    assert_eq!(NetworkAddress::merge(&pieces), vec![block]);
}

#[test]
fn test_free_space_is_disjoint_from_used() {
    let block = net("2001:db8::/48");
    let used = [net("2001:db8:0:1::/64"), net("2001:db8:0:ff00::/56")];
    let free = block.excluding(&used).unwrap();
    assert!(!free.is_empty());
    for piece in &free {
        assert!(block.encloses_subnet(piece).unwrap());
        for u in &used {
            assert!(!piece.shares_subnet_space(u).unwrap(), "{piece} overlaps {u}");
        }
    }
}

#[test]
fn test_split_every_piece_enclosed() {
    let block = net("172.16.0.0/12");
    let pieces = block.split(4).unwrap();
    assert_eq!(pieces.len(), 16);
    assert!(pieces.iter().all(|p| block.encloses_subnet(p).unwrap()));
    assert!(pieces.windows(2).all(|w| w[0] < w[1]));
}

quickcheck! {
    fn prop_split_then_merge_v4(raw: u32, prefix: u8, times: u8) -> bool {
        let prefix = prefix % 25;
        let times = times % 7;
        let block = NetworkAddress::new(Address::from_u32(raw), prefix).unwrap();
        let pieces = block.split(times).unwrap();
        pieces.len() == 1usize << times
            && NetworkAddress::merge(&pieces) == vec![block.network_identifier()]
    }

    fn prop_split_then_merge_v6(raw: u128, prefix: u8, times: u8) -> bool {
        let prefix = prefix % 121;
        let times = times % 7;
        let block = NetworkAddress::new(Address::from_u128(raw), prefix).unwrap();
        NetworkAddress::merge(&block.split(times).unwrap()) == vec![block.network_identifier()]
    }

    fn prop_excluding_identities(raw: u32, prefix: u8) -> bool {
        let block = NetworkAddress::new(Address::from_u32(raw), prefix % 33).unwrap();
        block.excluding(&[]).unwrap() == vec![block]
            && block.excluding(&[block]).unwrap().is_empty()
    }

    fn prop_block_contains_its_range(raw: u32, prefix: u8) -> bool {
        let block = NetworkAddress::new(Address::from_u32(raw), prefix % 33).unwrap();
        block.contains_address(&block.address()).unwrap()
            && block.contains_address(&block.network_start()).unwrap()
            && block.contains_address(&block.network_end()).unwrap()
    }
}

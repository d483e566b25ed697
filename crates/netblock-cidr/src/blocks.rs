//! Block-set algorithms: split, exclude, merge
//!
//! All of them work on power-of-two aligned ranges, treating a collection of
//! blocks as nodes of a binary trie over the address bits.

use std::collections::{BTreeMap, BTreeSet, VecDeque};

use tracing::{debug, trace};

use crate::{IpVersion, Magnitude, NetblockError, NetworkAddress, Result};

impl NetworkAddress {
    /// Split into `2^times` equal blocks of prefix `prefix_len + times`
    ///
    /// Blocks are returned in ascending order, starting at the network start.
    ///
    /// # Examples
    ///
    /// ```
    /// use netblock_cidr::NetworkAddress;
    ///
    /// let halves = NetworkAddress::parse("10.0.0.0/24")?.split(1)?;
    /// assert_eq!(halves[0].to_string(), "10.0.0.0/25");
    /// assert_eq!(halves[1].to_string(), "10.0.0.128/25");
    /// # Ok::<(), netblock_cidr::NetblockError>(())
    /// ```
    pub fn split(&self, times: u8) -> Result<Vec<NetworkAddress>> {
        let width = self.version().bit_width();
        let new_prefix = self.prefix_len() as u32 + times as u32;
        if new_prefix > width as u32 {
            return Err(NetblockError::OutOfRange(format!(
                "cannot split {} {} times beyond /{}",
                self, times, width
            )));
        }
        let too_many = || {
            NetblockError::OutOfRange(format!("splitting {} {} times yields too many blocks", self, times))
        };
        let count = 1usize.checked_shl(times as u32).ok_or_else(too_many)?;

        let new_prefix = new_prefix as u8;
        let step = Magnitude::pow2(width as u32 - new_prefix as u32);
        let mut out = Vec::new();
        out.try_reserve_exact(count).map_err(|_| too_many())?;
        let mut pos = self.network_start();
        for i in 0..count {
            out.push(NetworkAddress::new(pos, new_prefix)?);
            if i + 1 < count {
                pos = pos.add(step.clone());
            }
        }

        debug!(block = %self, times, blocks = out.len(), "split block");
        Ok(out)
    }

    /// The smallest set of aligned blocks covering this block minus `used`
    ///
    /// Candidates that partially overlap an excluded block are bisected
    /// until each half either clears the excluded block or falls inside it.
    ///
    /// # Examples
    ///
    /// ```
    /// use netblock_cidr::NetworkAddress;
    ///
    /// let block = NetworkAddress::parse("192.168.0.0/24")?;
    /// let used = [NetworkAddress::parse("192.168.0.0/25")?];
    /// let free = block.excluding(&used)?;
    /// assert_eq!(free, vec![NetworkAddress::parse("192.168.0.128/25")?]);
    /// # Ok::<(), netblock_cidr::NetblockError>(())
    /// ```
    pub fn excluding(&self, used: &[NetworkAddress]) -> Result<Vec<NetworkAddress>> {
        let mut candidates = vec![*self];
        for exclude in used {
            let mut pending: VecDeque<NetworkAddress> = candidates.drain(..).collect();
            while let Some(candidate) = pending.pop_front() {
                if !candidate.shares_subnet_space(exclude)? {
                    candidates.push(candidate);
                } else if candidate.prefix_len() < exclude.prefix_len() {
                    trace!(%candidate, %exclude, "bisecting candidate");
                    for half in candidate.split(1)?.into_iter().rev() {
                        pending.push_front(half);
                    }
                } else {
                    trace!(%candidate, %exclude, "candidate excluded");
                }
            }
            if candidates.is_empty() {
                break;
            }
        }

        debug!(
            block = %self,
            excluded = used.len(),
            remaining = candidates.len(),
            "computed free space"
        );
        Ok(candidates)
    }

    /// Collapse a collection into its minimal equivalent set of blocks
    ///
    /// Inputs are normalized to network identifiers and deduplicated. Two
    /// blocks merge only when they are siblings under the same parent, so
    /// adjacent but misaligned blocks (e.g. `10.0.0.1/32` and `10.0.0.2/32`)
    /// stay separate. IPv4 and IPv6 blocks are merged independently. The
    /// result is sorted by address.
    ///
    /// # Examples
    ///
    /// ```
    /// use netblock_cidr::NetworkAddress;
    ///
    /// let blocks = [
    ///     NetworkAddress::parse("0.0.0.0/32")?,
    ///     NetworkAddress::parse("0.0.0.1/32")?,
    /// ];
    /// assert_eq!(NetworkAddress::merge(&blocks), vec![NetworkAddress::parse("0.0.0.0/31")?]);
    /// # Ok::<(), netblock_cidr::NetblockError>(())
    /// ```
    pub fn merge(blocks: &[NetworkAddress]) -> Vec<NetworkAddress> {
        let mut buckets: BTreeMap<(IpVersion, u8), BTreeSet<NetworkAddress>> = BTreeMap::new();
        for block in blocks {
            let id = block.network_identifier();
            buckets
                .entry((id.version(), id.prefix_len()))
                .or_default()
                .insert(id);
        }

        let mut out = Vec::new();
        // Most specific bucket first; parents always land in a bucket visited later.
        while let Some(((version, _), bucket)) = buckets.pop_last() {
            let sorted: Vec<NetworkAddress> = bucket.into_iter().collect();
            let mut i = 0;
            while i < sorted.len() {
                let block = sorted[i];
                let parent = block.parent();
                match sorted.get(i + 1) {
                    Some(next) if parent.is_some() && next.parent() == parent => {
                        if let Some(parent) = parent {
                            trace!(%block, %next, %parent, "merging siblings");
                            buckets
                                .entry((version, parent.prefix_len()))
                                .or_default()
                                .insert(parent);
                        }
                        i += 2;
                    }
                    _ => {
                        out.push(block);
                        i += 1;
                    }
                }
            }
        }

        out.sort();
        debug!(input = blocks.len(), output = out.len(), "merged blocks");
        out
    }

    /// Find a block of `prefix_len` inside the most specific block that can hold it
    ///
    /// Returns `(found, within)`: a block already of the requested size is
    /// returned as both; otherwise the first `/prefix_len` of the most
    /// specific block coarser than it, paired with that block. `None` when
    /// every block is finer than `prefix_len`.
    pub fn block_in_smallest(
        blocks: &[NetworkAddress],
        prefix_len: u8,
    ) -> Result<Option<(NetworkAddress, NetworkAddress)>> {
        let mut smallest: Option<&NetworkAddress> = None;
        for block in blocks {
            if block.prefix_len() == prefix_len {
                return Ok(Some((*block, *block)));
            }
            if block.prefix_len() > prefix_len {
                continue;
            }
            if smallest.map_or(true, |s| block.prefix_len() > s.prefix_len()) {
                smallest = Some(block);
            }
        }

        match smallest {
            Some(within) => {
                let found = NetworkAddress::new(within.network_start(), prefix_len)?;
                Ok(Some((found, *within)))
            }
            None => Ok(None),
        }
    }
}

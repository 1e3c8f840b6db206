//! Deterministic assignment of reward-earning addresses to epoch partitions.
//!
//! Rewards for an epoch are paid out over several blocks; each address is
//! assigned to exactly one partition by a keyed hash of its bytes. The
//! mapping must be identical on every node for a given `(seed, partitions)`
//! pair, and unbiased across partitions.

use {
    crate::{address::Address, hash::Hash},
    siphasher::sip::SipHasher13,
    std::hash::Hasher,
};

#[derive(Debug, Clone)]
pub struct EpochRewardsHasher {
    hasher: SipHasher13,
    partitions: usize,
}

impl EpochRewardsHasher {
    /// Use SipHash-1-3 keyed on the first half of `seed` for calculating
    /// epoch reward partitions.
    ///
    /// The rewards data is not attacker-controlled, so the faster
    /// short-round SipHash variant is sufficient.
    pub fn new(partitions: usize, seed: &Hash) -> Self {
        let mut key = [0u8; 16];
        key.copy_from_slice(&seed.as_ref()[..16]);
        Self {
            hasher: SipHasher13::new_with_key(&key),
            partitions,
        }
    }

    /// Return the partition index `address` belongs to.
    ///
    /// The same hasher instance may serve any number of lookups, from any
    /// number of threads.
    pub fn hash_address_to_partition(&self, address: &Address) -> usize {
        let mut hasher = self.hasher.clone();
        hasher.write(address.as_ref());
        let hash64 = hasher.finish();

        hash_to_partition(hash64, self.partitions)
    }
}

/// Compute the partition index by mapping the 64-bit hash onto partitions
/// with a widening multiply, rather than a remainder. This spreads the
/// digest space into contiguous, ordered ranges: partition `i` covers
/// hashes in `[i * 2^64 / partitions, (i + 1) * 2^64 / partitions)`, so no
/// partition's range differs in size by more than one, and there is no
/// modulo bias.
pub(crate) fn hash_to_partition(hash: u64, partitions: usize) -> usize {
    ((partitions as u128)
        .saturating_mul(u128::from(hash))
        .saturating_div(u128::from(u64::MAX).saturating_add(1))) as usize
}

#[cfg(test)]
mod tests {
    #![allow(clippy::arithmetic_side_effects)]
    use {super::*, std::ops::RangeInclusive};

    #[test]
    fn test_get_equal_partition_range() {
        // show how 2 equal partition ranges are 0..=(max/2), (max/2+1)..=max
        // the inclusive max is always min(, max) when div of equal buckets
        let range = get_equal_partition_range(0, 2);
        assert_eq!(*range.start(), 0);
        assert_eq!(*range.end(), u64::MAX / 2);

        let range = get_equal_partition_range(1, 2);
        assert_eq!(*range.start(), u64::MAX / 2 + 1);
        assert_eq!(*range.end(), u64::MAX);
    }

    #[test]
    fn test_hash_to_partitions() {
        let partitions = 16;
        assert_eq!(hash_to_partition(0, partitions), 0);
        assert_eq!(hash_to_partition(u64::MAX / 16, partitions), 0);
        assert_eq!(hash_to_partition(u64::MAX / 16 + 1, partitions), 1);
        assert_eq!(hash_to_partition(u64::MAX / 8, partitions), 1);
        assert_eq!(hash_to_partition(u64::MAX / 8 + 1, partitions), 2);
        assert_eq!(hash_to_partition(u64::MAX - 1, partitions), partitions - 1);
        assert_eq!(hash_to_partition(u64::MAX, partitions), partitions - 1);
    }

    fn test_partitions(partition: usize, partitions: usize) {
        let partition = partition.min(partitions.saturating_sub(1));
        let range = get_equal_partition_range(partition, partitions);
        // beginning and end of this partition
        assert_eq!(hash_to_partition(*range.start(), partitions), partition);
        assert_eq!(hash_to_partition(*range.end(), partitions), partition);
        if partition < partitions - 1 {
            // first index in next partition
            assert_eq!(
                hash_to_partition(*range.end() + 1, partitions),
                partition + 1
            );
        } else {
            assert_eq!(*range.end(), u64::MAX);
        }
        if partition > 0 {
            // last index in previous partition
            assert_eq!(
                hash_to_partition(*range.start() - 1, partitions),
                partition - 1
            );
        } else {
            assert_eq!(*range.start(), 0);
        }
    }

    #[test]
    fn test_hash_to_partitions_equal_ranges() {
        for partitions in [2, 4, 8, 16, 4096] {
            assert_eq!(hash_to_partition(0, partitions), 0);
            for partition in [0, 1, 2, partitions - 1] {
                test_partitions(partition, partitions);
            }

            let range = get_equal_partition_range(0, partitions);
            for partition in 1..partitions {
                let this_range = get_equal_partition_range(partition, partitions);
                // contiguous ranges of the same or one-different length
                assert_eq!(
                    *this_range.start(),
                    get_equal_partition_range(partition - 1, partitions).end() + 1
                );
                assert!(
                    (this_range.end() - this_range.start())
                        .abs_diff(range.end() - range.start())
                        <= 1
                );
            }
        }
    }

    #[test]
    fn test_partition_ranges_contiguous_for_uneven_counts() {
        // When the digest space does not divide evenly, ranges stay
        // contiguous with no gaps and differ in width by at most one.
        let space = u128::from(u64::MAX) + 1;
        for partitions in [3usize, 5, 7, 100, 4095] {
            let base_width = space / partitions as u128;
            let boundary = |i: u128| -> u128 {
                // first hash belonging to partition i
                (i * space + partitions as u128 - 1) / partitions as u128
            };
            let mut widths = Vec::with_capacity(partitions);
            for i in 0..partitions as u128 {
                let start = boundary(i);
                let end_exclusive = if i == partitions as u128 - 1 {
                    space
                } else {
                    boundary(i + 1)
                };
                widths.push(end_exclusive - start);
                assert_eq!(hash_to_partition(start as u64, partitions), i as usize);
                assert_eq!(
                    hash_to_partition((end_exclusive - 1) as u64, partitions),
                    i as usize
                );
                if i > 0 {
                    assert_eq!(
                        hash_to_partition((start - 1) as u64, partitions),
                        i as usize - 1
                    );
                }
            }
            assert!(widths
                .iter()
                .all(|width| *width == base_width || *width == base_width + 1));
            assert_eq!(widths.iter().sum::<u128>(), space);
        }
    }

    #[test]
    fn test_hash_to_partitions_always_in_range() {
        for partitions in [1, 2, 3, 5, 16, 314] {
            for hash in [0, 1, u64::MAX / 7, u64::MAX / 2, u64::MAX - 1, u64::MAX] {
                assert!(hash_to_partition(hash, partitions) < partitions);
            }
        }
    }

    /// return the range of partition indexes (replicates the production
    /// mapping in reverse)
    fn get_equal_partition_range(partition: usize, partitions: usize) -> RangeInclusive<u64> {
        let max_inclusive = u128::from(u64::MAX);
        let width = (max_inclusive + 1) / partitions as u128;
        let start = width * partition as u128;
        let end = if partition == partitions - 1 {
            max_inclusive
        } else {
            start + width - 1
        };
        RangeInclusive::new(start as u64, end as u64)
    }

    #[test]
    fn test_hasher_is_deterministic_and_reusable() {
        let seed = Hash::new_unique();
        let partitions = 10;
        let hasher = EpochRewardsHasher::new(partitions, &seed);

        let address = Address::new_unique();
        let first = hasher.hash_address_to_partition(&address);
        let second = hasher.hash_address_to_partition(&address);
        assert_eq!(first, second);
        assert!(first < partitions);

        let same_inputs = EpochRewardsHasher::new(partitions, &seed);
        assert_eq!(same_inputs.hash_address_to_partition(&address), first);
    }

    #[test]
    fn test_different_seeds_usually_differ() {
        // Not guaranteed per address, but over a batch of addresses two
        // seeds must not produce identical assignments.
        let partitions = 64;
        let hasher_a = EpochRewardsHasher::new(partitions, &Hash::new_unique());
        let hasher_b = EpochRewardsHasher::new(partitions, &Hash::new_unique());

        let addresses: Vec<_> = (0..128).map(|_| Address::new_unique()).collect();
        let assignments_a: Vec<_> = addresses
            .iter()
            .map(|address| hasher_a.hash_address_to_partition(address))
            .collect();
        let assignments_b: Vec<_> = addresses
            .iter()
            .map(|address| hasher_b.hash_address_to_partition(address))
            .collect();
        assert_ne!(assignments_a, assignments_b);
    }
}

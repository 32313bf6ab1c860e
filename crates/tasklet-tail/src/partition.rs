//! Deterministic, coordination-free partitioning of files across sibling processors.
//!
//! Every sibling watches the same directory and independently decides whether a given
//! file "belongs" to it by hashing the file's base name. As long as the hash function
//! is pinned (FNV-1a here, not the platform's default `HashMap` hasher, which is
//! randomized per-process), siblings agree without talking to each other.

const FNV_OFFSET_BASIS: u64 = 0xcbf29ce484222325;
const FNV_PRIME: u64 = 0x100000001b3;

/// FNV-1a over the UTF-8 bytes of `s`.
pub fn fnv1a_hash(s: &str) -> u64 {
    let mut hash = FNV_OFFSET_BASIS;
    for byte in s.as_bytes() {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

/// Whether the file named `file_name` is owned by sibling `id` out of `parallelism`
/// total siblings.
pub fn belongs_to(file_name: &str, parallelism: u32, id: u32) -> bool {
    debug_assert!(id < parallelism);
    (fnv1a_hash(file_name) % u64::from(parallelism)) == u64::from(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn fnv1a_is_stable() {
        // FNV-1a of the empty string is the offset basis.
        assert_eq!(fnv1a_hash(""), FNV_OFFSET_BASIS);
        assert_eq!(fnv1a_hash("a"), fnv1a_hash("a"));
        assert_ne!(fnv1a_hash("a"), fnv1a_hash("b"));
    }

    #[test]
    fn every_file_belongs_to_exactly_one_sibling() {
        let parallelism = 4;
        let names: Vec<String> = (0..200).map(|i| format!("shard-{i}.log")).collect();

        for name in &names {
            let owners: Vec<u32> = (0..parallelism)
                .filter(|&id| belongs_to(name, parallelism, id))
                .collect();
            assert_eq!(owners.len(), 1, "{name} should have exactly one owner");
        }
    }

    #[test]
    fn partitioning_is_reasonably_balanced() {
        let parallelism = 4;
        let mut counts = vec![0usize; parallelism as usize];
        for i in 0..4000 {
            let name = format!("file-{i}.log");
            for id in 0..parallelism {
                if belongs_to(&name, parallelism, id) {
                    counts[id as usize] += 1;
                }
            }
        }
        let total: usize = counts.iter().sum();
        assert_eq!(total, 4000);
        for count in counts {
            assert!(count > 500, "partition skewed: {count}");
        }
    }

    #[test]
    fn single_sibling_owns_every_file() {
        let names = ["a.log", "b.log", "c.log"];
        let owned: HashSet<_> = names
            .iter()
            .filter(|n| belongs_to(n, 1, 0))
            .collect();
        assert_eq!(owned.len(), names.len());
    }
}

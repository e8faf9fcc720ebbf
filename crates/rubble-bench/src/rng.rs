//! Stateless hashing for reproducible scene layouts and contact scripts.

use rubble_core::types::Contact;

/// Hash of (seed, tick, index). Same inputs always give the same value.
pub fn bench_hash(seed: u32, tick: u32, index: u32) -> u32 {
    let mut state = seed
        .wrapping_mul(0x9E3779B9)
        .wrapping_add(tick.wrapping_mul(0x517CC1B7))
        .wrapping_add(index.wrapping_mul(0x2545F491));

    state = state ^ (state >> 16);
    state = state.wrapping_mul(0x45D9F3B);
    state = state ^ (state >> 16);
    state = state.wrapping_mul(0x45D9F3B);
    state = state ^ (state >> 16);

    state
}

/// Map a hash to [0, 1).
pub fn hash_to_float(hash: u32) -> f32 {
    (hash >> 8) as f32 / 16_777_216.0 // 2^24
}

/// `count` contacts for one tick, spread over `block_count` shapes.
pub fn scripted_contacts(seed: u32, tick: u32, block_count: u32, count: u32) -> Vec<Contact> {
    if block_count == 0 {
        return Vec::new();
    }
    (0..count)
        .map(|i| {
            let h = bench_hash(seed, tick, i);
            let impact = 1.0 + hash_to_float(bench_hash(seed ^ 0xA5A5_A5A5, tick, i)) * 9.0;
            Contact::new(h % block_count, impact)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_deterministic() {
        assert_eq!(bench_hash(1, 2, 3), bench_hash(1, 2, 3));
        assert_ne!(bench_hash(1, 2, 3), bench_hash(1, 2, 4));
    }

    #[test]
    fn test_hash_to_float_range() {
        for i in 0..1000 {
            let f = hash_to_float(bench_hash(7, 0, i));
            assert!((0.0..1.0).contains(&f));
        }
    }

    #[test]
    fn test_contacts_stay_in_range() {
        let contacts = scripted_contacts(3, 17, 40, 500);
        assert_eq!(contacts.len(), 500);
        assert!(contacts.iter().all(|c| c.shape_index < 40));
        assert!(contacts.iter().all(|c| (1.0..10.0).contains(&c.impact)));
        assert_eq!(contacts, scripted_contacts(3, 17, 40, 500));
    }

    #[test]
    fn test_no_contacts_for_empty_cluster() {
        assert!(scripted_contacts(0, 0, 0, 10).is_empty());
    }
}

//! Random key sampling for analysis reports.

use framelog::RecordKey;
use rand::Rng;

/// Draws `count` keys uniformly from `first..=last`, with repetition.
///
/// Returns nothing if the range is empty.
pub fn sample_keys<R: Rng>(
    rng: &mut R,
    first: RecordKey,
    last: RecordKey,
    count: usize,
) -> Vec<RecordKey> {
    if last < first {
        return Vec::new();
    }
    (0..count)
        .map(|_| RecordKey::new(rng.gen_range(first.as_i32()..=last.as_i32())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    #[test]
    fn samples_stay_in_range() {
        let mut rng = SmallRng::seed_from_u64(42);
        let keys = sample_keys(&mut rng, RecordKey::new(1), RecordKey::new(10), 500);

        assert_eq!(keys.len(), 500);
        assert!(keys.iter().all(|k| (1..=10).contains(&k.as_i32())));
    }

    #[test]
    fn same_seed_same_samples() {
        let a = sample_keys(
            &mut SmallRng::seed_from_u64(7),
            RecordKey::new(1),
            RecordKey::new(10_002),
            20,
        );
        let b = sample_keys(
            &mut SmallRng::seed_from_u64(7),
            RecordKey::new(1),
            RecordKey::new(10_002),
            20,
        );
        assert_eq!(a, b);
    }

    #[test]
    fn empty_range_yields_nothing() {
        let mut rng = SmallRng::seed_from_u64(0);
        assert!(sample_keys(&mut rng, RecordKey::new(5), RecordKey::new(4), 3).is_empty());
    }

    #[test]
    fn single_key_range() {
        let mut rng = SmallRng::seed_from_u64(0);
        let keys = sample_keys(&mut rng, RecordKey::new(3), RecordKey::new(3), 4);
        assert_eq!(keys, vec![RecordKey::new(3); 4]);
    }
}

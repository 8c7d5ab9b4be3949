// ============================================================
// Layer 4 - Train/Validation Splitter
// ============================================================
// Shuffles samples with a seeded RNG and splits off the
// validation fraction. The corpus arrives grouped by label, so
// an unshuffled tail split would validate on a single class.
//
// The same seed and input always give the same split.

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Shuffles `samples` and returns (train, validation), where
/// validation holds `round(len * validation_fraction)` items.
pub fn split_train_val<T>(mut samples: Vec<T>, validation_fraction: f64, seed: u64) -> (Vec<T>, Vec<T>) {
    let mut rng = StdRng::seed_from_u64(seed);
    samples.shuffle(&mut rng);

    let total    = samples.len();
    let val_size = ((total as f64) * validation_fraction.clamp(0.0, 1.0)).round() as usize;
    let split_at = total - val_size.min(total);

    let val = samples.split_off(split_at);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        samples.len(),
        val.len(),
        (samples.len() * 100) / total.max(1),
        (val.len()     * 100) / total.max(1),
    );

    (samples, val)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_correct_split_sizes() {
        let items: Vec<usize> = (0..100).collect();
        let (train, val)      = split_train_val(items, 0.2, 7);
        assert_eq!(train.len(), 80);
        assert_eq!(val.len(),   20);
    }

    #[test]
    fn test_all_items_preserved() {
        let items: Vec<usize> = (0..50).collect();
        let (train, val)      = split_train_val(items, 0.3, 7);
        let mut all: Vec<_>   = train.into_iter().chain(val).collect();
        all.sort();
        assert_eq!(all, (0..50).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = split_train_val((0..30).collect::<Vec<u32>>(), 0.2, 42);
        let b = split_train_val((0..30).collect::<Vec<u32>>(), 0.2, 42);
        assert_eq!(a, b);
    }

    #[test]
    fn test_empty_and_zero_fraction() {
        let (train, val) = split_train_val(Vec::<usize>::new(), 0.2, 1);
        assert!(train.is_empty() && val.is_empty());

        let (train, val) = split_train_val((0..10).collect::<Vec<usize>>(), 0.0, 1);
        assert_eq!(train.len(), 10);
        assert!(val.is_empty());
    }
}

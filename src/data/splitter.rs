// ============================================================
// Layer 4 — Stratified Train/Validation Splitter
// ============================================================
// Splits labelled rows into two sets:
//   - Training set:   used to update model weights
//   - Validation set: scored once per epoch, never trained on
//
// The split is stratified: every label contributes the same
// fraction of its rows to validation, so a rare class in the
// training data is also present when validating. Each label
// always keeps at least one training row.
//
//   rows ──group by label──▶ { "0": [...], "1": [...] }
//        ──shuffle each────▶ seeded Fisher-Yates
//        ──cut each group──▶ min(round(n * fraction), n - 1) → validation
//        ──shuffle result──▶ labels interleaved again
//
// The RNG is seeded, so the same rows and seed always give the
// same split.
//
// Reference: Rust Book §8 (Vectors, Hash Maps)
//            rand crate documentation

use std::collections::BTreeMap;

use rand::{rngs::StdRng, seq::SliceRandom, SeedableRng};

/// Default share of rows held out for validation.
pub const DEFAULT_VALID_FRACTION: f64 = 0.1;
/// Default seed shared by the splitter and the data loaders.
pub const DEFAULT_SEED: u64 = 42;

/// Split `items` into (train, validation), stratified on `label_of`.
///
/// # Arguments
/// * `items`          - All rows (consumed)
/// * `label_of`       - Extracts the stratification key of a row
/// * `valid_fraction` - Share held out per label, clamped to [0, 1]
/// * `seed`           - RNG seed
pub fn stratified_split<T, K, F>(
    items:          Vec<T>,
    label_of:       F,
    valid_fraction: f64,
    seed:           u64,
) -> (Vec<T>, Vec<T>)
where
    K: Ord,
    F: Fn(&T) -> K,
{
    let fraction = valid_fraction.clamp(0.0, 1.0);
    let total    = items.len();
    let mut rng  = StdRng::seed_from_u64(seed);

    // BTreeMap keeps group iteration order independent of hashing
    let mut groups: BTreeMap<K, Vec<T>> = BTreeMap::new();
    for item in items {
        groups.entry(label_of(&item)).or_default().push(item);
    }

    let mut train = Vec::with_capacity(total);
    let mut valid = Vec::new();
    for (_, mut group) in groups {
        group.shuffle(&mut rng);
        let n_valid = ((group.len() as f64) * fraction).round() as usize;
        let n_valid = n_valid.min(group.len().saturating_sub(1));
        let rest    = group.split_off(n_valid);
        valid.extend(group);
        train.extend(rest);
    }

    train.shuffle(&mut rng);
    valid.shuffle(&mut rng);

    tracing::debug!(
        "Dataset split: {} training, {} validation ({}% / {}%)",
        train.len(),
        valid.len(),
        (train.len() * 100) / total.max(1),
        (valid.len() * 100) / total.max(1),
    );

    (train, valid)
}

// ─── Unit Tests ───────────────────────────────────────────────────────────────
#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<(usize, &'static str)> {
        (0..100)
            .map(|i| (i, if i % 4 == 0 { "1" } else { "0" }))
            .collect()
    }

    #[test]
    fn test_split_sizes_per_label() {
        let (train, valid) = stratified_split(rows(), |r| r.1, 0.1, DEFAULT_SEED);
        assert_eq!(train.len() + valid.len(), 100);
        // 25 positives → 3 held out (2.5 rounds up), 75 negatives → 8 held out
        assert_eq!(valid.iter().filter(|r| r.1 == "1").count(), 3);
        assert_eq!(valid.iter().filter(|r| r.1 == "0").count(), 8);
    }

    #[test]
    fn test_split_is_disjoint_and_complete() {
        let (train, valid) = stratified_split(rows(), |r| r.1, 0.2, 7);
        let mut ids: Vec<usize> = train.iter().chain(valid.iter()).map(|r| r.0).collect();
        ids.sort_unstable();
        assert_eq!(ids, (0..100).collect::<Vec<_>>());
    }

    #[test]
    fn test_same_seed_same_split() {
        let a = stratified_split(rows(), |r| r.1, 0.1, 42);
        let b = stratified_split(rows(), |r| r.1, 0.1, 42);
        assert_eq!(a, b);
        let c = stratified_split(rows(), |r| r.1, 0.1, 43);
        assert_ne!(a.1, c.1);
    }

    #[test]
    fn test_empty_dataset() {
        let items: Vec<(usize, &str)> = Vec::new();
        let (train, valid) = stratified_split(items, |r| r.1, 0.1, 1);
        assert!(train.is_empty());
        assert!(valid.is_empty());
    }

    #[test]
    fn test_every_label_keeps_a_training_row() {
        let mut items = rows();
        items.push((100, "irony"));
        items.push((101, "satire"));
        items.push((102, "satire"));

        let (train, valid) = stratified_split(items, |r| r.1, 0.5, DEFAULT_SEED);
        for label in ["0", "1", "irony", "satire"] {
            assert!(train.iter().any(|r| r.1 == label), "no training row for {label}");
        }
        assert!(!valid.iter().any(|r| r.1 == "irony"));
        assert_eq!(valid.iter().filter(|r| r.1 == "satire").count(), 1);

        let (train, valid) = stratified_split(rows(), |r| r.1, 1.0, DEFAULT_SEED);
        assert_eq!((train.len(), valid.len()), (2, 98));
    }

    #[test]
    fn test_zero_fraction_keeps_everything_for_training() {
        let (train, valid) = stratified_split(rows(), |r| r.1, 0.0, 1);
        assert_eq!(train.len(), 100);
        assert!(valid.is_empty());
    }
}

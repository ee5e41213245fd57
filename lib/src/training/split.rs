// lib/src/training/split.rs
use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices of a train/test split.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Split {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Seeded stratified split. Each class contributes `round(n * test_fraction)`
/// rows to the test side, capped so that at least one row of every class
/// stays in training. Indices come back sorted.
pub fn stratified_split(targets: &[u32], test_fraction: f64, seed: u64) -> Split {
    let mut by_class: BTreeMap<u32, Vec<usize>> = BTreeMap::new();
    for (i, t) in targets.iter().enumerate() {
        by_class.entry(*t).or_default().push(i);
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let mut train = Vec::with_capacity(targets.len());
    let mut test = Vec::new();
    for (_, mut members) in by_class {
        members.shuffle(&mut rng);
        let wanted = (members.len() as f64 * test_fraction).round() as usize;
        let n_test = wanted.min(members.len().saturating_sub(1));
        test.extend_from_slice(&members[..n_test]);
        train.extend_from_slice(&members[n_test..]);
    }
    train.sort_unstable();
    test.sort_unstable();
    Split { train, test }
}

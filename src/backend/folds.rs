//! Fold assignment for k-fold cross-validation

use crate::backend::classes::group_classes;
use rand::seq::SliceRandom;
use rand::Rng;

/// Sample order plus fold boundaries
///
/// Fold `f` holds `perm[start[f]..start[f + 1]]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Folds {
    pub perm: Vec<usize>,
    pub start: Vec<usize>,
}

impl Folds {
    /// Held-out samples of fold `f`
    pub fn test(&self, f: usize) -> &[usize] {
        &self.perm[self.start[f]..self.start[f + 1]]
    }

    /// Training samples of fold `f`, in fold order
    pub fn train(&self, f: usize) -> Vec<usize> {
        self.perm[..self.start[f]]
            .iter()
            .chain(&self.perm[self.start[f + 1]..])
            .copied()
            .collect()
    }
}

/// Shuffled folds of near-equal size
pub fn plain_folds<R: Rng>(l: usize, nr_fold: usize, rng: &mut R) -> Folds {
    let mut perm: Vec<usize> = (0..l).collect();
    perm.shuffle(rng);
    let start = (0..=nr_fold).map(|f| f * l / nr_fold).collect();
    Folds { perm, start }
}

/// Folds keeping each class's share roughly equal across folds
pub fn stratified_folds<R: Rng>(labels: &[f64], nr_fold: usize, rng: &mut R) -> Folds {
    let groups = group_classes(labels);
    let mut index = groups.perm.clone();
    for c in 0..groups.nr_class() {
        let begin = groups.starts()[c];
        index[begin..begin + groups.counts()[c]].shuffle(rng);
    }

    let mut perm = Vec::with_capacity(labels.len());
    let mut start = Vec::with_capacity(nr_fold + 1);
    for f in 0..nr_fold {
        start.push(perm.len());
        for c in 0..groups.nr_class() {
            let base = groups.starts()[c];
            let n = groups.counts()[c];
            let begin = base + f * n / nr_fold;
            let end = base + (f + 1) * n / nr_fold;
            perm.extend_from_slice(&index[begin..end]);
        }
    }
    start.push(perm.len());

    Folds { perm, start }
}

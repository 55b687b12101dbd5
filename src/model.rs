//! Trained SVM model

use crate::core::{Parameter, SvmType};
use crate::kernel;
use serde::{Deserialize, Serialize};

/// Result of a training run
///
/// For classification with `k` classes the model holds `k(k-1)/2`
/// one-vs-one decision functions. Support vectors are grouped by class and
/// `sv_coef[j-1]` / `sv_coef[i]` hold the coefficients of the support
/// vectors of class `i` / `j` in the (i, j) classifier. One-class SVM and
/// regression have a single decision function and no labels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvmModel {
    /// Parameters used for training (gamma already resolved)
    pub param: Parameter,
    /// Number of classes (2 for one-class SVM and regression)
    pub nr_class: usize,
    /// Class ids in training order, classification only
    pub labels: Vec<i32>,
    /// Support vectors per class, classification only
    pub n_sv: Vec<usize>,
    /// Offsets of the decision functions
    pub rho: Vec<f64>,
    /// `nr_class - 1` rows of coefficients, one entry per support vector
    pub sv_coef: Vec<Vec<f64>>,
    pub support_vectors: Vec<Vec<f64>>,
    /// 1-based positions of the support vectors in the training set
    pub sv_indices: Vec<usize>,
}

impl SvmModel {
    /// Total number of support vectors
    pub fn total_sv(&self) -> usize {
        self.support_vectors.len()
    }

    /// Raw decision values: one per classifier pair, or a single value
    pub fn decision_values(&self, x: &[f64]) -> Vec<f64> {
        let kernel = kernel::from_parameter(&self.param);
        let kvalue: Vec<f64> = self
            .support_vectors
            .iter()
            .map(|sv| kernel.compute(x, sv))
            .collect();

        if !self.param.svm_type.is_classification() {
            let coef = self.sv_coef.first().map(Vec::as_slice).unwrap_or(&[]);
            let sum: f64 = coef.iter().zip(&kvalue).map(|(c, k)| c * k).sum();
            let rho = self.rho.first().copied().unwrap_or(0.0);
            return vec![sum - rho];
        }

        let start = self.class_starts();
        let k = self.nr_class;
        let mut values = Vec::with_capacity(k * k.saturating_sub(1) / 2);
        let mut p = 0;
        for i in 0..k {
            for j in (i + 1)..k {
                let si = start[i];
                let sj = start[j];
                let ci = self.n_sv[i];
                let cj = self.n_sv[j];

                let coef1 = &self.sv_coef[j - 1];
                let coef2 = &self.sv_coef[i];
                let sum: f64 = (si..si + ci).map(|t| coef1[t] * kvalue[t]).sum::<f64>()
                    + (sj..sj + cj).map(|t| coef2[t] * kvalue[t]).sum::<f64>();
                values.push(sum - self.rho[p]);
                p += 1;
            }
        }
        values
    }

    /// Predict the label (classification), +1/-1 (one-class) or the target value
    pub fn predict(&self, x: &[f64]) -> f64 {
        let values = self.decision_values(x);

        match self.param.svm_type {
            SvmType::EpsilonSvr | SvmType::NuSvr => values[0],
            SvmType::OneClass => {
                if values[0] > 0.0 {
                    1.0
                } else {
                    -1.0
                }
            }
            SvmType::CSvc | SvmType::NuSvc => {
                let k = self.nr_class;
                let mut votes = vec![0usize; k];
                let mut p = 0;
                for i in 0..k {
                    for j in (i + 1)..k {
                        if values[p] > 0.0 {
                            votes[i] += 1;
                        } else {
                            votes[j] += 1;
                        }
                        p += 1;
                    }
                }

                // ties go to the class seen first
                let mut winner = 0;
                for (i, &v) in votes.iter().enumerate().skip(1) {
                    if v > votes[winner] {
                        winner = i;
                    }
                }
                self.labels.get(winner).copied().unwrap_or(0) as f64
            }
        }
    }

    fn class_starts(&self) -> Vec<usize> {
        self.n_sv
            .iter()
            .scan(0, |acc, &n| {
                let start = *acc;
                *acc += n;
                Some(start)
            })
            .collect()
    }
}

//! Q matrices of the SVM dual problems
//!
//! Every formulation minimises `0.5 a'Qa + p'a`; they differ only in how Q
//! is derived from the kernel:
//! - classification: Q_ij = y_i y_j K(x_i, x_j)
//! - one-class: Q_ij = K(x_i, x_j)
//! - regression: a 2l x 2l matrix built from the l x l kernel with signs

use crate::cache::{Column, KernelCache};
use crate::core::{Parameter, Problem};
use crate::kernel::{self, Kernel};

/// Column access to a dual problem's Q matrix
pub trait QMatrix {
    /// Column `i` of Q
    fn column(&mut self, i: usize) -> Column;

    /// The diagonal Q_ii
    fn diagonal(&self) -> &[f64];

    /// Kernel column cache backing this matrix
    fn cache(&self) -> &KernelCache;

    /// Order of the matrix
    fn len(&self) -> usize {
        self.diagonal().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Q for C-SVC and nu-SVC
pub struct SvcQ<'a> {
    rows: &'a [Vec<f64>],
    y: Vec<f64>,
    kernel: Box<dyn Kernel>,
    cache: KernelCache,
    diagonal: Vec<f64>,
}

impl<'a> SvcQ<'a> {
    /// `y` holds +1/-1 targets parallel to the problem rows
    pub fn new(problem: &'a Problem, param: &Parameter, y: &[f64]) -> Self {
        let rows = problem.features();
        let kernel = kernel::from_parameter(param);
        let diagonal = rows.iter().map(|x| kernel.compute(x, x)).collect();
        Self {
            rows,
            y: y.to_vec(),
            kernel,
            cache: KernelCache::with_megabytes(param.cache_size, rows.len()),
            diagonal,
        }
    }
}

impl QMatrix for SvcQ<'_> {
    fn column(&mut self, i: usize) -> Column {
        let rows = self.rows;
        let y = &self.y;
        let kernel = &self.kernel;
        self.cache.get_or_compute(i, || {
            (0..rows.len())
                .map(|j| y[i] * y[j] * kernel.compute(&rows[i], &rows[j]))
                .collect()
        })
    }

    fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    fn cache(&self) -> &KernelCache {
        &self.cache
    }
}

/// Q for one-class SVM
pub struct OneClassQ<'a> {
    rows: &'a [Vec<f64>],
    kernel: Box<dyn Kernel>,
    cache: KernelCache,
    diagonal: Vec<f64>,
}

impl<'a> OneClassQ<'a> {
    pub fn new(problem: &'a Problem, param: &Parameter) -> Self {
        let rows = problem.features();
        let kernel = kernel::from_parameter(param);
        let diagonal = rows.iter().map(|x| kernel.compute(x, x)).collect();
        Self {
            rows,
            kernel,
            cache: KernelCache::with_megabytes(param.cache_size, rows.len()),
            diagonal,
        }
    }
}

impl QMatrix for OneClassQ<'_> {
    fn column(&mut self, i: usize) -> Column {
        let rows = self.rows;
        let kernel = &self.kernel;
        self.cache.get_or_compute(i, || {
            (0..rows.len())
                .map(|j| kernel.compute(&rows[i], &rows[j]))
                .collect()
        })
    }

    fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    fn cache(&self) -> &KernelCache {
        &self.cache
    }
}

/// Q for epsilon-SVR and nu-SVR
///
/// Index `k < l` stands for alpha_k, index `k + l` for alpha*_k. Only the
/// l x l kernel columns are cached; the signed 2l columns are derived.
pub struct SvrQ<'a> {
    rows: &'a [Vec<f64>],
    kernel: Box<dyn Kernel>,
    cache: KernelCache,
    sign: Vec<f64>,
    index: Vec<usize>,
    diagonal: Vec<f64>,
}

impl<'a> SvrQ<'a> {
    pub fn new(problem: &'a Problem, param: &Parameter) -> Self {
        let rows = problem.features();
        let l = rows.len();
        let kernel = kernel::from_parameter(param);

        let sign = (0..2 * l).map(|k| if k < l { 1.0 } else { -1.0 }).collect();
        let index: Vec<usize> = (0..2 * l).map(|k| k % l.max(1)).collect();
        let diagonal = index
            .iter()
            .map(|&k| kernel.compute(&rows[k], &rows[k]))
            .collect();

        Self {
            rows,
            kernel,
            cache: KernelCache::with_megabytes(param.cache_size, l),
            sign,
            index,
            diagonal,
        }
    }
}

impl QMatrix for SvrQ<'_> {
    fn column(&mut self, i: usize) -> Column {
        let rows = self.rows;
        let kernel = &self.kernel;
        let real = self.index[i];
        let data = self.cache.get_or_compute(real, || {
            (0..rows.len())
                .map(|j| kernel.compute(&rows[real], &rows[j]))
                .collect()
        });

        let si = self.sign[i];
        self.index
            .iter()
            .zip(&self.sign)
            .map(|(&j, &sj)| si * sj * data[j])
            .collect::<Vec<f64>>()
            .into()
    }

    fn diagonal(&self) -> &[f64] {
        &self.diagonal
    }

    fn cache(&self) -> &KernelCache {
        &self.cache
    }
}

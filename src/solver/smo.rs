//! Sequential Minimal Optimization (SMO) solver implementation
//!
//! Solves
//!
//! ```text
//! min 0.5 a'Qa + p'a
//! s.t. y'a = delta, 0 <= a_i <= C_i
//! ```
//!
//! by repeatedly optimizing a pair of variables chosen with second-order
//! working set selection. The nu variant restricts each pair to one sign
//! class and computes two offsets, which nu-SVC and nu-SVR need.

use crate::cache::Column;
use crate::core::OutputSink;
use crate::solver::qmatrix::QMatrix;

/// Curvature used when the kernel is not positive definite along a pair
const TAU: f64 = 1e-12;

/// Which working set rule and offset computation to use
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverVariant {
    Standard,
    Nu,
}

/// Summary of one solver run
#[derive(Debug, Clone, Default)]
pub struct SolutionInfo {
    /// Final objective value
    pub obj: f64,
    /// Offset of the decision function (b = -rho)
    pub rho: f64,
    pub upper_bound_p: f64,
    pub upper_bound_n: f64,
    /// Scaling offset, nu variant only
    pub r: f64,
    pub iterations: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AlphaStatus {
    LowerBound,
    UpperBound,
    Free,
}

/// SMO solver for the SVM dual problem
#[derive(Debug, Clone)]
pub struct SMOSolver {
    variant: SolverVariant,
    eps: f64,
    max_iterations: Option<usize>,
}

impl SMOSolver {
    /// Create a solver stopping once the maximal violation drops below `eps`
    pub fn new(variant: SolverVariant, eps: f64) -> Self {
        Self {
            variant,
            eps,
            max_iterations: None,
        }
    }

    /// Cap the number of iterations (default: max(10^7, 100 l))
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    /// Solve the dual problem starting from a feasible `alpha`
    ///
    /// `y` holds +1/-1 per variable, `cp`/`cn` are the upper bounds for the
    /// positive and negative variables. Returns the optimal alpha.
    #[allow(clippy::too_many_arguments)]
    pub fn solve<Q: QMatrix + ?Sized>(
        &self,
        q: &mut Q,
        p: &[f64],
        y: &[f64],
        alpha: Vec<f64>,
        cp: f64,
        cn: f64,
        sink: &OutputSink,
    ) -> (Vec<f64>, SolutionInfo) {
        let l = q.len();
        let mut ws = Workspace {
            qd: q.diagonal().to_vec(),
            q,
            y,
            p,
            status: Vec::with_capacity(l),
            gradient: p.to_vec(),
            alpha,
            cp,
            cn,
        };
        ws.status = (0..l).map(|i| ws.status_of(i)).collect();

        for i in 0..l {
            if ws.status[i] != AlphaStatus::LowerBound {
                let q_i = ws.q.column(i);
                let alpha_i = ws.alpha[i];
                for (g, q_ij) in ws.gradient.iter_mut().zip(q_i.iter()) {
                    *g += alpha_i * q_ij;
                }
            }
        }

        let max_iterations = self
            .max_iterations
            .unwrap_or_else(|| 100usize.saturating_mul(l).max(10_000_000));
        let mut counter = l.clamp(1, 1000);
        let mut iterations = 0;

        while iterations < max_iterations {
            counter -= 1;
            if counter == 0 {
                counter = l.clamp(1, 1000);
                sink.emit(".");
            }

            let pair = match self.variant {
                SolverVariant::Standard => ws.select_working_set(self.eps),
                SolverVariant::Nu => ws.select_working_set_nu(self.eps),
            };
            let Some((i, j)) = pair else {
                break;
            };

            iterations += 1;
            ws.update_pair(i, j);
        }

        if iterations >= max_iterations {
            sink.emit("\nWARNING: reaching max number of iterations\n");
        }

        let mut info = SolutionInfo {
            iterations,
            upper_bound_p: cp,
            upper_bound_n: cn,
            ..SolutionInfo::default()
        };
        match self.variant {
            SolverVariant::Standard => info.rho = ws.calculate_rho(),
            SolverVariant::Nu => {
                let (rho, r) = ws.calculate_rho_nu();
                info.rho = rho;
                info.r = r;
            }
        }

        let v: f64 = (0..l)
            .map(|i| ws.alpha[i] * (ws.gradient[i] + ws.p[i]))
            .sum();
        info.obj = v / 2.0;

        sink.emit(&format!("\noptimization finished, #iter = {iterations}\n"));

        (ws.alpha, info)
    }
}

struct Workspace<'a, Q: QMatrix + ?Sized> {
    q: &'a mut Q,
    qd: Vec<f64>,
    y: &'a [f64],
    p: &'a [f64],
    alpha: Vec<f64>,
    status: Vec<AlphaStatus>,
    gradient: Vec<f64>,
    cp: f64,
    cn: f64,
}

impl<Q: QMatrix + ?Sized> Workspace<'_, Q> {
    fn bound(&self, i: usize) -> f64 {
        if self.y[i] > 0.0 {
            self.cp
        } else {
            self.cn
        }
    }

    fn status_of(&self, i: usize) -> AlphaStatus {
        if self.alpha[i] >= self.bound(i) {
            AlphaStatus::UpperBound
        } else if self.alpha[i] <= 0.0 {
            AlphaStatus::LowerBound
        } else {
            AlphaStatus::Free
        }
    }

    fn is_upper(&self, i: usize) -> bool {
        self.status[i] == AlphaStatus::UpperBound
    }

    fn is_lower(&self, i: usize) -> bool {
        self.status[i] == AlphaStatus::LowerBound
    }

    /// Second-order decrease of the objective for moving along (i, j)
    fn objective_decrease(&self, grad_diff: f64, quad_coef: f64) -> f64 {
        if quad_coef > 0.0 {
            -(grad_diff * grad_diff) / quad_coef
        } else {
            -(grad_diff * grad_diff) / TAU
        }
    }

    /// Maximal violating pair with second-order choice of j.
    /// `None` once the gap falls below `eps`.
    fn select_working_set(&mut self, eps: f64) -> Option<(usize, usize)> {
        let l = self.alpha.len();
        let mut gmax = f64::NEG_INFINITY;
        let mut gmax2 = f64::NEG_INFINITY;
        let mut gmax_idx = None;
        let mut gmin_idx = None;
        let mut obj_diff_min = f64::INFINITY;

        for t in 0..l {
            if self.y[t] > 0.0 {
                if !self.is_upper(t) && -self.gradient[t] >= gmax {
                    gmax = -self.gradient[t];
                    gmax_idx = Some(t);
                }
            } else if !self.is_lower(t) && self.gradient[t] >= gmax {
                gmax = self.gradient[t];
                gmax_idx = Some(t);
            }
        }

        let i = gmax_idx;
        let q_i: Option<Column> = i.map(|i| self.q.column(i));

        for j in 0..l {
            let (grad_diff, candidate) = if self.y[j] > 0.0 {
                if self.is_lower(j) {
                    continue;
                }
                gmax2 = gmax2.max(self.gradient[j]);
                (gmax + self.gradient[j], -1.0)
            } else {
                if self.is_upper(j) {
                    continue;
                }
                gmax2 = gmax2.max(-self.gradient[j]);
                (gmax - self.gradient[j], 1.0)
            };

            if grad_diff > 0.0 {
                if let (Some(i), Some(q_i)) = (i, q_i.as_ref()) {
                    // y_j = +1 -> -2 y_i Q_ij, y_j = -1 -> +2 y_i Q_ij
                    let quad_coef =
                        self.qd[i] + self.qd[j] + candidate * 2.0 * self.y[i] * q_i[j];
                    let obj_diff = self.objective_decrease(grad_diff, quad_coef);
                    if obj_diff <= obj_diff_min {
                        gmin_idx = Some(j);
                        obj_diff_min = obj_diff;
                    }
                }
            }
        }

        if gmax + gmax2 < eps {
            return None;
        }
        match (i, gmin_idx) {
            (Some(i), Some(j)) => Some((i, j)),
            _ => None,
        }
    }

    /// Working set selection restricted to pairs of equal sign
    fn select_working_set_nu(&mut self, eps: f64) -> Option<(usize, usize)> {
        let l = self.alpha.len();
        let mut gmaxp = f64::NEG_INFINITY;
        let mut gmaxp2 = f64::NEG_INFINITY;
        let mut gmaxp_idx = None;
        let mut gmaxn = f64::NEG_INFINITY;
        let mut gmaxn2 = f64::NEG_INFINITY;
        let mut gmaxn_idx = None;
        let mut gmin_idx = None;
        let mut obj_diff_min = f64::INFINITY;

        for t in 0..l {
            if self.y[t] > 0.0 {
                if !self.is_upper(t) && -self.gradient[t] >= gmaxp {
                    gmaxp = -self.gradient[t];
                    gmaxp_idx = Some(t);
                }
            } else if !self.is_lower(t) && self.gradient[t] >= gmaxn {
                gmaxn = self.gradient[t];
                gmaxn_idx = Some(t);
            }
        }

        let q_ip: Option<Column> = gmaxp_idx.map(|i| self.q.column(i));
        let q_in: Option<Column> = gmaxn_idx.map(|i| self.q.column(i));

        for j in 0..l {
            let (grad_diff, anchor, q_anchor) = if self.y[j] > 0.0 {
                if self.is_lower(j) {
                    continue;
                }
                gmaxp2 = gmaxp2.max(self.gradient[j]);
                (gmaxp + self.gradient[j], gmaxp_idx, q_ip.as_ref())
            } else {
                if self.is_upper(j) {
                    continue;
                }
                gmaxn2 = gmaxn2.max(-self.gradient[j]);
                (gmaxn - self.gradient[j], gmaxn_idx, q_in.as_ref())
            };

            if grad_diff > 0.0 {
                if let (Some(a), Some(q_a)) = (anchor, q_anchor) {
                    let quad_coef = self.qd[a] + self.qd[j] - 2.0 * q_a[j];
                    let obj_diff = self.objective_decrease(grad_diff, quad_coef);
                    if obj_diff <= obj_diff_min {
                        gmin_idx = Some(j);
                        obj_diff_min = obj_diff;
                    }
                }
            }
        }

        if (gmaxp + gmaxp2).max(gmaxn + gmaxn2) < eps {
            return None;
        }
        let j = gmin_idx?;
        let i = if self.y[j] > 0.0 {
            gmaxp_idx?
        } else {
            gmaxn_idx?
        };
        Some((i, j))
    }

    /// Analytically optimize alpha_i and alpha_j and update the gradient
    fn update_pair(&mut self, i: usize, j: usize) {
        let q_i = self.q.column(i);
        let q_j = self.q.column(j);

        let c_i = self.bound(i);
        let c_j = self.bound(j);
        let old_alpha_i = self.alpha[i];
        let old_alpha_j = self.alpha[j];
        let (mut a_i, mut a_j) = (old_alpha_i, old_alpha_j);

        if self.y[i] != self.y[j] {
            let mut quad_coef = self.qd[i] + self.qd[j] + 2.0 * q_i[j];
            if quad_coef <= 0.0 {
                quad_coef = TAU;
            }
            let delta = (-self.gradient[i] - self.gradient[j]) / quad_coef;
            let diff = a_i - a_j;
            a_i += delta;
            a_j += delta;

            if diff > 0.0 {
                if a_j < 0.0 {
                    a_j = 0.0;
                    a_i = diff;
                }
            } else if a_i < 0.0 {
                a_i = 0.0;
                a_j = -diff;
            }
            if diff > c_i - c_j {
                if a_i > c_i {
                    a_i = c_i;
                    a_j = c_i - diff;
                }
            } else if a_j > c_j {
                a_j = c_j;
                a_i = c_j + diff;
            }
        } else {
            let mut quad_coef = self.qd[i] + self.qd[j] - 2.0 * q_i[j];
            if quad_coef <= 0.0 {
                quad_coef = TAU;
            }
            let delta = (self.gradient[i] - self.gradient[j]) / quad_coef;
            let sum = a_i + a_j;
            a_i -= delta;
            a_j += delta;

            if sum > c_i {
                if a_i > c_i {
                    a_i = c_i;
                    a_j = sum - c_i;
                }
            } else if a_j < 0.0 {
                a_j = 0.0;
                a_i = sum;
            }
            if sum > c_j {
                if a_j > c_j {
                    a_j = c_j;
                    a_i = sum - c_j;
                }
            } else if a_i < 0.0 {
                a_i = 0.0;
                a_j = sum;
            }
        }

        self.alpha[i] = a_i;
        self.alpha[j] = a_j;

        let delta_i = a_i - old_alpha_i;
        let delta_j = a_j - old_alpha_j;
        for (k, g) in self.gradient.iter_mut().enumerate() {
            *g += q_i[k] * delta_i + q_j[k] * delta_j;
        }

        self.status[i] = self.status_of(i);
        self.status[j] = self.status_of(j);
    }

    fn calculate_rho(&self) -> f64 {
        let mut nr_free = 0;
        let mut sum_free = 0.0;
        let mut ub = f64::INFINITY;
        let mut lb = f64::NEG_INFINITY;

        for i in 0..self.alpha.len() {
            let y_g = self.y[i] * self.gradient[i];
            let positive = self.y[i] > 0.0;
            match self.status[i] {
                AlphaStatus::UpperBound if positive => lb = lb.max(y_g),
                AlphaStatus::UpperBound => ub = ub.min(y_g),
                AlphaStatus::LowerBound if positive => ub = ub.min(y_g),
                AlphaStatus::LowerBound => lb = lb.max(y_g),
                AlphaStatus::Free => {
                    nr_free += 1;
                    sum_free += y_g;
                }
            }
        }

        if nr_free > 0 {
            sum_free / nr_free as f64
        } else {
            (ub + lb) / 2.0
        }
    }

    /// Returns (rho, r)
    fn calculate_rho_nu(&self) -> (f64, f64) {
        let mut positive = OffsetBounds::default();
        let mut negative = OffsetBounds::default();

        for i in 0..self.alpha.len() {
            let bounds = if self.y[i] > 0.0 {
                &mut positive
            } else {
                &mut negative
            };
            bounds.add(self.status[i], self.gradient[i]);
        }

        let r1 = positive.offset();
        let r2 = negative.offset();
        ((r1 - r2) / 2.0, (r1 + r2) / 2.0)
    }
}

struct OffsetBounds {
    nr_free: usize,
    sum_free: f64,
    ub: f64,
    lb: f64,
}

impl Default for OffsetBounds {
    fn default() -> Self {
        Self {
            nr_free: 0,
            sum_free: 0.0,
            ub: f64::INFINITY,
            lb: f64::NEG_INFINITY,
        }
    }
}

impl OffsetBounds {
    fn add(&mut self, status: AlphaStatus, gradient: f64) {
        match status {
            AlphaStatus::UpperBound => self.lb = self.lb.max(gradient),
            AlphaStatus::LowerBound => self.ub = self.ub.min(gradient),
            AlphaStatus::Free => {
                self.nr_free += 1;
                self.sum_free += gradient;
            }
        }
    }

    fn offset(&self) -> f64 {
        if self.nr_free > 0 {
            self.sum_free / self.nr_free as f64
        } else {
            (self.ub + self.lb) / 2.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{KernelType, Parameter, Problem};
    use crate::solver::qmatrix::SvcQ;
    use approx::assert_abs_diff_eq;

    fn linear() -> Parameter {
        Parameter {
            kernel_type: KernelType::Linear,
            ..Parameter::default()
        }
    }

    #[test]
    fn test_two_point_problem() {
        // x = +1 (y=+1), x = -1 (y=-1): optimum alpha = 0.5 each, rho = 0
        let problem = Problem::new(vec![1.0, -1.0], vec![vec![1.0], vec![-1.0]]);
        let y = [1.0, -1.0];
        let mut q = SvcQ::new(&problem, &linear(), &y);
        let solver = SMOSolver::new(SolverVariant::Standard, 1e-3);

        let (alpha, info) =
            solver.solve(&mut q, &[-1.0, -1.0], &y, vec![0.0; 2], 1.0, 1.0, &OutputSink::Silent);

        assert_abs_diff_eq!(alpha[0], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(alpha[1], 0.5, epsilon = 1e-9);
        assert_abs_diff_eq!(info.rho, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(info.obj, -0.5, epsilon = 1e-9);
        assert!(info.iterations >= 1);
    }

    #[test]
    fn test_bounded_by_c() {
        let problem = Problem::new(vec![1.0, -1.0], vec![vec![1.0], vec![-1.0]]);
        let y = [1.0, -1.0];
        let mut q = SvcQ::new(&problem, &linear(), &y);
        let solver = SMOSolver::new(SolverVariant::Standard, 1e-3);

        let (alpha, info) =
            solver.solve(&mut q, &[-1.0, -1.0], &y, vec![0.0; 2], 0.1, 0.1, &OutputSink::Silent);

        assert_abs_diff_eq!(alpha[0], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(alpha[1], 0.1, epsilon = 1e-12);
        assert_eq!(info.upper_bound_p, 0.1);
    }

    #[test]
    fn test_equality_constraint_preserved() {
        let problem = Problem::new(
            vec![1.0, 1.0, -1.0, -1.0],
            vec![vec![2.0, 1.0], vec![1.5, 2.0], vec![-1.0, -1.5], vec![-2.0, -0.5]],
        );
        let y = [1.0, 1.0, -1.0, -1.0];
        let mut q = SvcQ::new(&problem, &linear(), &y);
        let solver = SMOSolver::new(SolverVariant::Standard, 1e-5);

        let (alpha, _) =
            solver.solve(&mut q, &[-1.0; 4], &y, vec![0.0; 4], 10.0, 10.0, &OutputSink::Silent);

        let balance: f64 = alpha.iter().zip(&y).map(|(a, y)| a * y).sum();
        assert_abs_diff_eq!(balance, 0.0, epsilon = 1e-9);
        assert!(alpha.iter().all(|&a| (0.0..=10.0).contains(&a)));
    }

    #[test]
    fn test_iteration_cap_warns() {
        let problem = Problem::new(
            vec![1.0, 1.0, -1.0, -1.0],
            vec![vec![1.0, 1.0], vec![1.0, -1.0], vec![-1.0, 1.0], vec![-1.0, -1.0]],
        );
        let y = [1.0, -1.0, -1.0, 1.0];
        let mut q = SvcQ::new(&problem, &linear(), &y);
        let solver = SMOSolver::new(SolverVariant::Standard, 1e-9).with_max_iterations(1);

        let captured = std::rc::Rc::new(std::cell::RefCell::new(String::new()));
        let target = std::rc::Rc::clone(&captured);
        let sink = OutputSink::Custom(Box::new(move |m| target.borrow_mut().push_str(m)));

        let (_, info) = solver.solve(&mut q, &[-1.0; 4], &y, vec![0.0; 4], 1.0, 1.0, &sink);
        assert_eq!(info.iterations, 1);
        assert!(captured.borrow().contains("reaching max number of iterations"));
        assert!(captured.borrow().contains("#iter = 1"));
    }
}

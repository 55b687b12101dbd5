//! Dual formulations of the supported SVM types
//!
//! Each `solve_*` function sets up the linear term, targets and starting
//! point of its dual problem, runs [`SMOSolver`] and maps the optimal alpha
//! back to signed coefficients over the training samples.

use crate::core::{OutputSink, Parameter, Problem, SvmType};
use crate::solver::qmatrix::{OneClassQ, QMatrix, SvcQ, SvrQ};
use crate::solver::smo::{SMOSolver, SolutionInfo, SolverVariant};
use log::debug;

/// Coefficients and offset of one trained decision function
#[derive(Debug, Clone)]
pub struct DecisionFunction {
    /// Signed coefficient per training sample (zero for non-support vectors)
    pub alpha: Vec<f64>,
    pub rho: f64,
}

impl DecisionFunction {
    /// Indices of the samples with a nonzero coefficient
    pub fn support_indices(&self) -> impl Iterator<Item = usize> + '_ {
        self.alpha
            .iter()
            .enumerate()
            .filter(|(_, a)| a.abs() > 0.0)
            .map(|(i, _)| i)
    }
}

fn log_cache_stats<Q: QMatrix>(q: &Q) {
    let stats = q.cache().stats();
    debug!(
        "Kernel cache: hit rate {:.2}, {} hits, {} misses, {}/{} columns",
        q.cache().hit_rate(),
        stats.hits,
        stats.misses,
        stats.size,
        stats.capacity
    );
}

fn signs(problem: &Problem) -> Vec<f64> {
    problem
        .labels()
        .iter()
        .map(|&y| if y > 0.0 { 1.0 } else { -1.0 })
        .collect()
}

/// C-SVC on a problem labelled +1/-1
pub fn solve_c_svc(
    problem: &Problem,
    param: &Parameter,
    cp: f64,
    cn: f64,
    sink: &OutputSink,
) -> (Vec<f64>, SolutionInfo) {
    let l = problem.len();
    let y = signs(problem);
    let minus_ones = vec![-1.0; l];

    let mut q = SvcQ::new(problem, param, &y);
    let (mut alpha, info) = SMOSolver::new(SolverVariant::Standard, param.eps).solve(
        &mut q,
        &minus_ones,
        &y,
        vec![0.0; l],
        cp,
        cn,
        sink,
    );
    log_cache_stats(&q);

    if cp == cn && l > 0 {
        let sum_alpha: f64 = alpha.iter().sum();
        sink.emit(&format!("nu = {:.6}\n", sum_alpha / (cp * l as f64)));
    }

    for (a, yi) in alpha.iter_mut().zip(&y) {
        *a *= yi;
    }
    (alpha, info)
}

/// nu-SVC on a problem labelled +1/-1
pub fn solve_nu_svc(
    problem: &Problem,
    param: &Parameter,
    sink: &OutputSink,
) -> (Vec<f64>, SolutionInfo) {
    let l = problem.len();
    let y = signs(problem);

    let mut sum_pos = param.nu * l as f64 / 2.0;
    let mut sum_neg = param.nu * l as f64 / 2.0;
    let start = y
        .iter()
        .map(|&yi| {
            let budget = if yi > 0.0 { &mut sum_pos } else { &mut sum_neg };
            let a = budget.min(1.0);
            *budget -= a;
            a
        })
        .collect();

    let zeros = vec![0.0; l];
    let mut q = SvcQ::new(problem, param, &y);
    let (mut alpha, mut info) = SMOSolver::new(SolverVariant::Nu, param.eps)
        .solve(&mut q, &zeros, &y, start, 1.0, 1.0, sink);
    log_cache_stats(&q);

    let r = info.r;
    sink.emit(&format!("C = {:.6}\n", 1.0 / r));

    for (a, yi) in alpha.iter_mut().zip(&y) {
        *a *= yi / r;
    }
    info.rho /= r;
    info.obj /= r * r;
    info.upper_bound_p = 1.0 / r;
    info.upper_bound_n = 1.0 / r;

    (alpha, info)
}

/// One-class SVM: the first floor(nu l) alphas start at their bound
pub fn solve_one_class(
    problem: &Problem,
    param: &Parameter,
    sink: &OutputSink,
) -> (Vec<f64>, SolutionInfo) {
    let l = problem.len();
    let total = param.nu * l as f64;
    let n = total as usize;

    let start = (0..l)
        .map(|i| match i.cmp(&n) {
            std::cmp::Ordering::Less => 1.0,
            std::cmp::Ordering::Equal => total - n as f64,
            std::cmp::Ordering::Greater => 0.0,
        })
        .collect();

    let zeros = vec![0.0; l];
    let ones = vec![1.0; l];
    let mut q = OneClassQ::new(problem, param);
    let solution = SMOSolver::new(SolverVariant::Standard, param.eps)
        .solve(&mut q, &zeros, &ones, start, 1.0, 1.0, sink);
    log_cache_stats(&q);
    solution
}

/// Targets +1 for the alpha half and -1 for the alpha* half
fn svr_targets(l: usize) -> Vec<f64> {
    (0..2 * l).map(|k| if k < l { 1.0 } else { -1.0 }).collect()
}

fn fold_svr_alpha(alpha2: &[f64], l: usize) -> Vec<f64> {
    (0..l).map(|i| alpha2[i] - alpha2[i + l]).collect()
}

/// epsilon-SVR
pub fn solve_epsilon_svr(
    problem: &Problem,
    param: &Parameter,
    sink: &OutputSink,
) -> (Vec<f64>, SolutionInfo) {
    let l = problem.len();
    let labels = problem.labels();

    let linear_term: Vec<f64> = labels
        .iter()
        .map(|y| param.p - y)
        .chain(labels.iter().map(|y| param.p + y))
        .collect();
    let y2 = svr_targets(l);

    let mut q = SvrQ::new(problem, param);
    let (alpha2, info) = SMOSolver::new(SolverVariant::Standard, param.eps).solve(
        &mut q,
        &linear_term,
        &y2,
        vec![0.0; 2 * l],
        param.c,
        param.c,
        sink,
    );
    log_cache_stats(&q);

    let alpha = fold_svr_alpha(&alpha2, l);
    if l > 0 {
        let sum_alpha: f64 = alpha.iter().map(|a| a.abs()).sum();
        sink.emit(&format!("nu = {:.6}\n", sum_alpha / (param.c * l as f64)));
    }
    (alpha, info)
}

/// nu-SVR
pub fn solve_nu_svr(
    problem: &Problem,
    param: &Parameter,
    sink: &OutputSink,
) -> (Vec<f64>, SolutionInfo) {
    let l = problem.len();
    let labels = problem.labels();
    let c = param.c;

    let mut sum = c * param.nu * l as f64 / 2.0;
    let mut half = Vec::with_capacity(l);
    for _ in 0..l {
        let a = sum.min(c);
        half.push(a);
        sum -= a;
    }
    let start: Vec<f64> = half.iter().chain(half.iter()).copied().collect();

    let linear_term: Vec<f64> = labels
        .iter()
        .map(|y| -y)
        .chain(labels.iter().copied())
        .collect();
    let y2 = svr_targets(l);

    let mut q = SvrQ::new(problem, param);
    let (alpha2, info) = SMOSolver::new(SolverVariant::Nu, param.eps)
        .solve(&mut q, &linear_term, &y2, start, c, c, sink);
    log_cache_stats(&q);

    sink.emit(&format!("epsilon = {:.6}\n", -info.r));
    (fold_svr_alpha(&alpha2, l), info)
}

/// Train a single decision function
///
/// For classification the problem must be labelled +1/-1; `cp` and `cn`
/// are the (weighted) costs of the two classes.
pub fn train_one(
    problem: &Problem,
    param: &Parameter,
    cp: f64,
    cn: f64,
    sink: &OutputSink,
) -> DecisionFunction {
    let (alpha, info) = match param.svm_type {
        SvmType::CSvc => solve_c_svc(problem, param, cp, cn, sink),
        SvmType::NuSvc => solve_nu_svc(problem, param, sink),
        SvmType::OneClass => solve_one_class(problem, param, sink),
        SvmType::EpsilonSvr => solve_epsilon_svr(problem, param, sink),
        SvmType::NuSvr => solve_nu_svr(problem, param, sink),
    };

    sink.emit(&format!("obj = {:.6}, rho = {:.6}\n", info.obj, info.rho));

    let mut n_sv = 0;
    let mut n_bsv = 0;
    for (a, &y) in alpha.iter().zip(problem.labels()) {
        if a.abs() > 0.0 {
            n_sv += 1;
            let bound = if y > 0.0 {
                info.upper_bound_p
            } else {
                info.upper_bound_n
            };
            if a.abs() >= bound {
                n_bsv += 1;
            }
        }
    }
    sink.emit(&format!("nSV = {n_sv}, nBSV = {n_bsv}\n"));

    DecisionFunction {
        alpha,
        rho: info.rho,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::KernelType;
    use approx::assert_abs_diff_eq;

    fn linear(svm_type: SvmType) -> Parameter {
        Parameter {
            svm_type,
            kernel_type: KernelType::Linear,
            ..Parameter::default()
        }
    }

    fn separable() -> Problem {
        Problem::new(
            vec![1.0, 1.0, -1.0, -1.0],
            vec![vec![2.0, 2.0], vec![3.0, 1.0], vec![-2.0, -1.0], vec![-1.0, -3.0]],
        )
    }

    fn decision(problem: &Problem, f: &DecisionFunction, x: &[f64]) -> f64 {
        problem
            .features()
            .iter()
            .zip(&f.alpha)
            .map(|(sv, a)| a * crate::kernel::dot(sv, x))
            .sum::<f64>()
            - f.rho
    }

    #[test]
    fn test_c_svc_separates() {
        let problem = separable();
        let f = train_one(&problem, &linear(SvmType::CSvc), 1.0, 1.0, &OutputSink::Silent);

        for (x, &y) in problem.features().iter().zip(problem.labels()) {
            assert!(decision(&problem, &f, x) * y > 0.0);
        }
        let balance: f64 = f.alpha.iter().sum();
        assert_abs_diff_eq!(balance, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_nu_svc_separates() {
        let problem = separable();
        let param = Parameter {
            nu: 0.5,
            ..linear(SvmType::NuSvc)
        };
        let f = train_one(&problem, &param, 1.0, 1.0, &OutputSink::Silent);

        for (x, &y) in problem.features().iter().zip(problem.labels()) {
            assert!(decision(&problem, &f, x) * y > 0.0);
        }
    }

    #[test]
    fn test_one_class_alpha_sum() {
        let problem = Problem::new(
            vec![1.0; 4],
            vec![vec![1.0, 1.0], vec![1.2, 0.9], vec![0.8, 1.1], vec![1.0, 1.3]],
        );
        let param = Parameter {
            nu: 0.5,
            gamma: 0.5,
            ..Parameter::default()
        };
        let param = Parameter {
            svm_type: SvmType::OneClass,
            ..param
        };
        let f = train_one(&problem, &param, 1.0, 1.0, &OutputSink::Silent);

        // sum of alpha stays nu * l
        let total: f64 = f.alpha.iter().sum();
        assert_abs_diff_eq!(total, 2.0, epsilon = 1e-9);
        assert!(f.alpha.iter().all(|&a| (0.0..=1.0 + 1e-12).contains(&a)));
    }

    #[test]
    fn test_epsilon_svr_fits_line() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let problem = Problem::new(
            xs.iter().map(|x| 2.0 * x + 1.0).collect(),
            xs.iter().map(|&x| vec![x]).collect(),
        );
        let param = Parameter {
            c: 100.0,
            p: 0.01,
            eps: 1e-5,
            ..linear(SvmType::EpsilonSvr)
        };
        let f = train_one(&problem, &param, param.c, param.c, &OutputSink::Silent);

        for (x, &y) in problem.features().iter().zip(problem.labels()) {
            assert!((decision(&problem, &f, x) - y).abs() < 0.05);
        }
    }

    #[test]
    fn test_nu_svr_coefficients_balance() {
        let xs = [0.0, 1.0, 2.0, 3.0];
        let problem = Problem::new(
            xs.iter().map(|x| x * 0.5).collect(),
            xs.iter().map(|&x| vec![x]).collect(),
        );
        let param = Parameter {
            nu: 0.5,
            ..linear(SvmType::NuSvr)
        };
        let f = train_one(&problem, &param, param.c, param.c, &OutputSink::Silent);

        let balance: f64 = f.alpha.iter().sum();
        assert_abs_diff_eq!(balance, 0.0, epsilon = 1e-9);
        assert!(f.alpha.iter().all(|a| a.abs() <= param.c + 1e-12));
    }

    #[test]
    fn test_train_one_reports_counts() {
        let captured = std::rc::Rc::new(std::cell::RefCell::new(String::new()));
        let target = std::rc::Rc::clone(&captured);
        let sink = OutputSink::Custom(Box::new(move |m| target.borrow_mut().push_str(m)));

        train_one(&separable(), &linear(SvmType::CSvc), 1.0, 1.0, &sink);

        let text = captured.borrow();
        assert!(text.contains("optimization finished"));
        assert!(text.contains("obj = "));
        assert!(text.contains("nSV = "));
    }

    #[test]
    fn test_support_indices() {
        let f = DecisionFunction {
            alpha: vec![0.0, 0.5, -0.5, 0.0],
            rho: 0.0,
        };
        assert_eq!(f.support_indices().collect::<Vec<_>>(), vec![1, 2]);
    }
}

//! Parameter/problem compatibility checks

use crate::backend::classes::group_classes;
use crate::core::{KernelType, Parameter, Problem, SvmType};

/// Returns the first incompatibility found, or `None`
pub fn check_parameter(problem: &Problem, param: &Parameter) -> Option<String> {
    if param.kernel_type.uses_gamma() && param.gamma < 0.0 {
        return Some("gamma < 0".to_string());
    }
    if param.kernel_type == KernelType::Polynomial && param.degree < 0 {
        return Some("degree of polynomial kernel < 0".to_string());
    }
    if param.cache_size <= 0.0 {
        return Some("cache_size <= 0".to_string());
    }
    if param.eps <= 0.0 {
        return Some("eps <= 0".to_string());
    }

    let svm_type = param.svm_type;
    if matches!(svm_type, SvmType::CSvc | SvmType::EpsilonSvr | SvmType::NuSvr) && param.c <= 0.0 {
        return Some("C <= 0".to_string());
    }
    if matches!(svm_type, SvmType::NuSvc | SvmType::OneClass | SvmType::NuSvr)
        && (param.nu <= 0.0 || param.nu > 1.0)
    {
        return Some("nu <= 0 or nu > 1".to_string());
    }
    if svm_type == SvmType::EpsilonSvr && param.p < 0.0 {
        return Some("p < 0".to_string());
    }
    if param.probability && svm_type == SvmType::OneClass {
        return Some("one-class SVM probability output not supported yet".to_string());
    }

    if problem.is_empty() {
        return Some("no training data".to_string());
    }

    if svm_type == SvmType::NuSvc && !nu_is_feasible(problem, param.nu) {
        return Some("specified nu is infeasible".to_string());
    }

    if param.kernel_type == KernelType::Precomputed {
        let l = problem.len() as f64;
        let out_of_range = problem.features().iter().any(|row| {
            let serial = row.first().copied().unwrap_or(0.0);
            serial.fract() != 0.0 || serial < 1.0 || serial > l
        });
        if out_of_range {
            return Some("Wrong input format: sample_serial_number out of range".to_string());
        }
    }

    None
}

/// nu-SVC needs nu (n_i + n_j) / 2 <= min(n_i, n_j) for every class pair
fn nu_is_feasible(problem: &Problem, nu: f64) -> bool {
    let groups = group_classes(problem.labels());
    let counts = groups.counts();

    for (i, &n1) in counts.iter().enumerate() {
        for &n2 in &counts[i + 1..] {
            if nu * (n1 + n2) as f64 / 2.0 > n1.min(n2) as f64 {
                return false;
            }
        }
    }
    true
}

//! In-crate implementation of the solver boundary
//!
//! [`SmoBackend`] trains with the decomposition solver in [`crate::solver`],
//! one-vs-one for multi-class problems, and persists models as JSON.

pub mod check;
pub mod classes;
pub mod folds;

pub use self::check::check_parameter;
pub use self::classes::{group_classes, ClassGroups};
pub use self::folds::{plain_folds, stratified_folds, Folds};

use crate::core::{OutputSink, Parameter, Problem, Result, SolverBackend, SVMError};
use crate::model::SvmModel;
use crate::persistence;
use crate::solver::{train_one, DecisionFunction};
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::path::Path;

/// Seed used for fold shuffling unless overridden
pub const DEFAULT_SEED: u64 = 0;

/// SMO-based solver backend
#[derive(Debug)]
pub struct SmoBackend {
    sink: OutputSink,
    seed: u64,
}

impl Default for SmoBackend {
    fn default() -> Self {
        Self {
            sink: OutputSink::Stdout,
            seed: DEFAULT_SEED,
        }
    }
}

impl SmoBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different seed for cross-validation fold shuffling
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn train_single(&self, problem: &Problem, param: &Parameter) -> SvmModel {
        let f = train_one(problem, param, param.c, param.c, &self.sink);
        let sv: Vec<usize> = f.support_indices().collect();

        SvmModel {
            param: param.clone(),
            nr_class: 2,
            labels: Vec::new(),
            n_sv: Vec::new(),
            rho: vec![f.rho],
            sv_coef: vec![sv.iter().map(|&i| f.alpha[i]).collect()],
            support_vectors: sv.iter().map(|&i| problem.row(i).to_vec()).collect(),
            sv_indices: sv.iter().map(|&i| i + 1).collect(),
        }
    }

    /// C for every class after applying the class weights
    fn weighted_costs(&self, groups: &ClassGroups, param: &Parameter) -> Vec<f64> {
        let mut costs = vec![param.c; groups.nr_class()];
        for w in &param.weights {
            match groups.labels.iter().position(|&label| label == w.label) {
                Some(c) => costs[c] *= w.weight,
                None => warn!("Class label {} specified in weight is not found", w.label),
            }
        }
        costs
    }

    fn train_classifier(&self, problem: &Problem, param: &Parameter) -> SvmModel {
        let groups = group_classes(problem.labels());
        let nr_class = groups.nr_class();
        if nr_class == 1 {
            warn!("Training data in only one class");
        }
        debug!("Training {} classes: {:?}", nr_class, groups.labels);

        let costs = self.weighted_costs(&groups, param);
        let starts = groups.starts();
        let counts = groups.counts();

        // nonzero[k] refers to the k-th sample in grouped order
        let mut nonzero = vec![false; problem.len()];
        let mut functions: Vec<DecisionFunction> =
            Vec::with_capacity(nr_class * nr_class.saturating_sub(1) / 2);

        for i in 0..nr_class {
            for j in (i + 1)..nr_class {
                let members: Vec<usize> = groups
                    .members(i)
                    .iter()
                    .chain(groups.members(j))
                    .copied()
                    .collect();
                let ci = counts[i];
                let labels = (0..members.len())
                    .map(|k| if k < ci { 1.0 } else { -1.0 })
                    .collect();
                let features = members.iter().map(|&k| problem.row(k).to_vec()).collect();
                let sub = Problem::new(labels, features);

                let f = train_one(&sub, param, costs[i], costs[j], &self.sink);
                for (k, a) in f.alpha.iter().enumerate() {
                    if a.abs() > 0.0 {
                        let grouped = if k < ci {
                            starts[i] + k
                        } else {
                            starts[j] + k - ci
                        };
                        nonzero[grouped] = true;
                    }
                }
                functions.push(f);
            }
        }

        let n_sv: Vec<usize> = (0..nr_class)
            .map(|c| {
                nonzero[starts[c]..starts[c] + counts[c]]
                    .iter()
                    .filter(|&&nz| nz)
                    .count()
            })
            .collect();
        let total_sv: usize = n_sv.iter().sum();
        self.sink.emit(&format!("Total nSV = {total_sv}\n"));

        let sv_positions: Vec<usize> = (0..problem.len()).filter(|&k| nonzero[k]).collect();
        let support_vectors = sv_positions
            .iter()
            .map(|&k| problem.row(groups.perm[k]).to_vec())
            .collect();
        let sv_indices = sv_positions.iter().map(|&k| groups.perm[k] + 1).collect();

        let nz_start: Vec<usize> = n_sv
            .iter()
            .scan(0, |acc, &n| {
                let s = *acc;
                *acc += n;
                Some(s)
            })
            .collect();

        let mut sv_coef = vec![vec![0.0; total_sv]; nr_class.saturating_sub(1)];
        let mut p = 0;
        for i in 0..nr_class {
            for j in (i + 1)..nr_class {
                let f = &functions[p];
                let ci = counts[i];

                let mut q = nz_start[i];
                for k in 0..ci {
                    if nonzero[starts[i] + k] {
                        sv_coef[j - 1][q] = f.alpha[k];
                        q += 1;
                    }
                }
                let mut q = nz_start[j];
                for k in 0..counts[j] {
                    if nonzero[starts[j] + k] {
                        sv_coef[i][q] = f.alpha[ci + k];
                        q += 1;
                    }
                }
                p += 1;
            }
        }

        SvmModel {
            param: param.clone(),
            nr_class,
            labels: groups.labels.clone(),
            n_sv,
            rho: functions.iter().map(|f| f.rho).collect(),
            sv_coef,
            support_vectors,
            sv_indices,
        }
    }
}

impl SolverBackend for SmoBackend {
    type Model = SvmModel;

    fn check_parameter(&self, problem: &Problem, param: &Parameter) -> Option<String> {
        check_parameter(problem, param)
    }

    fn train(&self, problem: &Problem, param: &Parameter) -> Result<SvmModel> {
        if problem.is_empty() {
            return Err(SVMError::EmptyDataset);
        }

        let model = if param.svm_type.is_classification() {
            self.train_classifier(problem, param)
        } else {
            self.train_single(problem, param)
        };
        info!(
            "Trained model with {} support vectors",
            model.total_sv()
        );
        Ok(model)
    }

    fn cross_validate(
        &self,
        problem: &Problem,
        param: &Parameter,
        nr_fold: usize,
    ) -> Result<Vec<f64>> {
        let l = problem.len();
        if l == 0 {
            return Err(SVMError::EmptyDataset);
        }
        if nr_fold < 2 {
            return Err(SVMError::InvalidParameter(format!(
                "n-fold cross validation: n must >= 2 (got {nr_fold})"
            )));
        }

        let mut nr_fold = nr_fold;
        if nr_fold > l {
            warn!(
                "# folds > # data. Will use # folds = # data instead \
                 (i.e., leave-one-out cross validation)"
            );
            nr_fold = l;
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);
        let folds = if param.svm_type.is_classification() && nr_fold < l {
            stratified_folds(problem.labels(), nr_fold, &mut rng)
        } else {
            plain_folds(l, nr_fold, &mut rng)
        };

        let mut predictions = vec![0.0; l];
        for f in 0..nr_fold {
            debug!("Cross validation fold {}/{}", f + 1, nr_fold);
            let model = self.train(&problem.subset(&folds.train(f)), param)?;
            for &i in folds.test(f) {
                predictions[i] = model.predict(problem.row(i));
            }
        }
        Ok(predictions)
    }

    fn save_model(&self, path: &Path, model: &SvmModel) -> Result<()> {
        persistence::save_model(path, model)
    }

    fn set_output_sink(&mut self, sink: OutputSink) {
        self.sink = sink;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ClassWeight, KernelType, SvmType};
    use approx::assert_abs_diff_eq;

    fn quiet() -> SmoBackend {
        let mut backend = SmoBackend::new();
        backend.set_output_sink(OutputSink::Silent);
        backend
    }

    fn linear(svm_type: SvmType) -> Parameter {
        Parameter {
            svm_type,
            kernel_type: KernelType::Linear,
            ..Parameter::default()
        }
    }

    fn three_blobs() -> Problem {
        let mut labels = Vec::new();
        let mut features = Vec::new();
        for (label, cx, cy) in [(1.0, 0.0, 0.0), (2.0, 6.0, 0.0), (3.0, 0.0, 6.0)] {
            for (dx, dy) in [(0.0, 0.0), (0.5, 0.2), (-0.3, 0.4), (0.2, -0.5)] {
                labels.push(label);
                features.push(vec![cx + dx, cy + dy]);
            }
        }
        Problem::new(labels, features)
    }

    #[test]
    fn test_binary_model_layout() {
        let problem = Problem::new(
            vec![-1.0, 1.0, -1.0, 1.0],
            vec![vec![-2.0], vec![2.0], vec![-3.0], vec![3.0]],
        );
        let model = quiet().train(&problem, &linear(SvmType::CSvc)).unwrap();

        // +1 is moved to the front
        assert_eq!(model.labels, vec![1, -1]);
        assert_eq!(model.nr_class, 2);
        assert_eq!(model.rho.len(), 1);
        assert_eq!(model.sv_coef.len(), 1);
        assert_eq!(model.sv_coef[0].len(), model.total_sv());
        assert_eq!(model.n_sv.iter().sum::<usize>(), model.total_sv());
        assert!(model.sv_indices.iter().all(|&i| (1..=4).contains(&i)));

        assert_eq!(model.predict(&[5.0]), 1.0);
        assert_eq!(model.predict(&[-5.0]), -1.0);
    }

    #[test]
    fn test_multiclass_training() {
        let problem = three_blobs();
        let param = Parameter {
            gamma: 0.5,
            c: 10.0,
            ..Parameter::default()
        };
        let model = quiet().train(&problem, &param).unwrap();

        assert_eq!(model.labels, vec![1, 2, 3]);
        assert_eq!(model.rho.len(), 3);
        assert_eq!(model.sv_coef.len(), 2);
        for (x, &y) in problem.features().iter().zip(problem.labels()) {
            assert_eq!(model.predict(x), y);
        }
    }

    #[test]
    fn test_regression_model() {
        let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
        let problem = Problem::new(
            xs.iter().map(|x| 3.0 * x - 1.0).collect(),
            xs.iter().map(|&x| vec![x]).collect(),
        );
        let param = Parameter {
            c: 100.0,
            p: 0.01,
            ..linear(SvmType::EpsilonSvr)
        };
        let model = quiet().train(&problem, &param).unwrap();

        assert!(model.labels.is_empty());
        assert_abs_diff_eq!(model.predict(&[2.5]), 6.5, epsilon = 0.1);
    }

    #[test]
    fn test_unknown_weight_label_is_ignored() {
        let groups = group_classes(&[1.0, -1.0]);
        let param = Parameter {
            c: 2.0,
            weights: vec![
                ClassWeight { label: -1, weight: 3.0 },
                ClassWeight { label: 9, weight: 5.0 },
            ],
            ..Parameter::default()
        };
        assert_eq!(quiet().weighted_costs(&groups, &param), vec![2.0, 6.0]);
    }

    #[test]
    fn test_cross_validation_predicts_every_sample() {
        let problem = three_blobs();
        let param = Parameter {
            gamma: 0.5,
            c: 10.0,
            ..Parameter::default()
        };
        let predictions = quiet().cross_validate(&problem, &param, 4).unwrap();

        assert_eq!(predictions.len(), problem.len());
        let correct = predictions
            .iter()
            .zip(problem.labels())
            .filter(|(p, y)| p == y)
            .count();
        assert_eq!(correct, problem.len());
    }

    #[test]
    fn test_cross_validation_is_reproducible() {
        let problem = three_blobs();
        let param = Parameter::default().with_default_gamma(problem.len());

        let a = quiet().with_seed(3).cross_validate(&problem, &param, 3).unwrap();
        let b = quiet().with_seed(3).cross_validate(&problem, &param, 3).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_too_many_folds_is_leave_one_out() {
        let problem = Problem::new(
            vec![1.0, 1.0, -1.0, -1.0],
            vec![vec![1.0], vec![2.0], vec![-1.0], vec![-2.0]],
        );
        let predictions = quiet()
            .cross_validate(&problem, &linear(SvmType::CSvc), 10)
            .unwrap();
        assert_eq!(predictions, vec![1.0, 1.0, -1.0, -1.0]);
    }

    #[test]
    fn test_empty_problem_errors() {
        let err = quiet().train(&Problem::default(), &Parameter::default()).unwrap_err();
        assert!(matches!(err, SVMError::EmptyDataset));
    }

    #[test]
    fn test_solver_output_goes_to_sink() {
        let captured = std::rc::Rc::new(std::cell::RefCell::new(String::new()));
        let target = std::rc::Rc::clone(&captured);
        let mut backend = SmoBackend::new();
        backend.set_output_sink(OutputSink::Custom(Box::new(move |m| {
            target.borrow_mut().push_str(m)
        })));

        let problem = Problem::new(vec![1.0, -1.0], vec![vec![1.0], vec![-1.0]]);
        backend.train(&problem, &linear(SvmType::CSvc)).unwrap();

        assert!(captured.borrow().contains("Total nSV = 2"));
    }
}

//! Training orchestrator
//!
//! Sequences configure -> load -> validate -> (cross-validate | train+save).
//! Every phase completes before the next begins and the first error ends
//! the run in [`PipelineState::Failed`].

use crate::config::TrainingOptions;
use crate::core::{OutputSink, Result, SVMError, SolverBackend};
use crate::data::DelimitedReader;
use crate::evaluation::{self, CrossValidationReport};
use log::{debug, info};
use std::path::PathBuf;

/// Phase reached by a [`TrainingPipeline`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    Configured,
    Loaded,
    Validated,
    CrossValidated,
    TrainedAndSaved,
    Done,
    Failed,
}

/// What a successful run produced
#[derive(Debug, Clone, PartialEq)]
pub enum PipelineOutcome {
    CrossValidated(CrossValidationReport),
    Saved { path: PathBuf },
}

/// Single training run over one dataset
pub struct TrainingPipeline<B: SolverBackend> {
    options: TrainingOptions,
    backend: B,
    reader: DelimitedReader,
    state: PipelineState,
}

impl<B: SolverBackend> TrainingPipeline<B> {
    /// Start from parsed options; the pipeline is `Configured`
    pub fn new(options: TrainingOptions, backend: B) -> Self {
        Self {
            options,
            backend,
            reader: DelimitedReader::default(),
            state: PipelineState::Configured,
        }
    }

    /// Field separator of the training set file (default TAB)
    pub fn with_separator(mut self, separator: &str) -> Self {
        self.reader = DelimitedReader::new(separator);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Run every remaining phase
    pub fn run(&mut self) -> Result<PipelineOutcome> {
        match self.execute() {
            Ok(outcome) => {
                self.transition(PipelineState::Done);
                Ok(outcome)
            }
            Err(e) => {
                self.transition(PipelineState::Failed);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: PipelineState) {
        debug!("Pipeline state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn execute(&mut self) -> Result<PipelineOutcome> {
        if self.state != PipelineState::Configured {
            return Err(SVMError::InvalidParameter(format!(
                "pipeline already ran (state {:?})",
                self.state
            )));
        }

        if self.options.quiet {
            self.backend.set_output_sink(OutputSink::Silent);
        }

        let input = &self.options.input_path;
        let problem = self.reader.from_file(input)?;
        info!("Loaded {} samples from {}", problem.len(), input.display());

        let param = self.options.param.clone().with_default_gamma(problem.len());
        if self.options.param.gamma == 0.0 {
            info!("Using default gamma = {}", param.gamma);
        }
        self.transition(PipelineState::Loaded);

        if let Some(message) = self.backend.check_parameter(&problem, &param) {
            return Err(SVMError::InvalidParameter(message));
        }
        self.transition(PipelineState::Validated);

        match self.options.nr_fold {
            Some(nr_fold) => {
                let report = evaluation::cross_validate(&self.backend, &problem, &param, nr_fold)?;
                self.transition(PipelineState::CrossValidated);
                Ok(PipelineOutcome::CrossValidated(report))
            }
            None => {
                let model = self.backend.train(&problem, &param)?;
                let path = self.options.model_path.clone();
                self.backend.save_model(&path, &model)?;
                info!("Model saved to {}", path.display());
                self.transition(PipelineState::TrainedAndSaved);
                Ok(PipelineOutcome::Saved { path })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Parameter, Problem};
    use std::cell::RefCell;
    use std::io::Write;
    use std::path::Path;
    use tempfile::NamedTempFile;

    /// Backend that records every call and predicts the label back
    #[derive(Default)]
    struct RecordingBackend {
        calls: RefCell<Vec<String>>,
        reject: Option<String>,
        seen_gamma: RefCell<Option<f64>>,
        quiet: bool,
    }

    impl RecordingBackend {
        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }

        fn record(&self, call: &str) {
            self.calls.borrow_mut().push(call.to_string());
        }
    }

    impl SolverBackend for RecordingBackend {
        type Model = usize;

        fn check_parameter(&self, _problem: &Problem, param: &Parameter) -> Option<String> {
            self.record("check");
            *self.seen_gamma.borrow_mut() = Some(param.gamma);
            self.reject.clone()
        }

        fn train(&self, problem: &Problem, _param: &Parameter) -> Result<usize> {
            self.record("train");
            Ok(problem.len())
        }

        fn cross_validate(
            &self,
            problem: &Problem,
            _param: &Parameter,
            nr_fold: usize,
        ) -> Result<Vec<f64>> {
            self.record(&format!("cv{nr_fold}"));
            Ok(problem.labels().to_vec())
        }

        fn save_model(&self, path: &Path, model: &usize) -> Result<()> {
            self.record("save");
            std::fs::write(path, model.to_string())?;
            Ok(())
        }

        fn set_output_sink(&mut self, sink: OutputSink) {
            self.quiet = matches!(sink, OutputSink::Silent);
            self.record("sink");
        }
    }

    fn dataset() -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "1.0\t2.0\t1").expect("write failed");
        writeln!(file, "0.5\t1.5\t-1").expect("write failed");
        writeln!(file, "3.0\t0.0\t1").expect("write failed");
        writeln!(file, "2.0\t2.0\t-1").expect("write failed");
        file
    }

    fn options(args: &[&str]) -> TrainingOptions {
        TrainingOptions::from_args(args).expect("valid options")
    }

    #[test]
    fn test_train_and_save_branch() {
        let data = dataset();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let model_path = dir.path().join("out.model");
        let input = data.path().to_string_lossy().to_string();
        let output = model_path.to_string_lossy().to_string();

        let mut pipeline = TrainingPipeline::new(
            options(&[input.as_str(), output.as_str()]),
            RecordingBackend::default(),
        );
        let outcome = pipeline.run().unwrap();

        assert_eq!(outcome, PipelineOutcome::Saved { path: model_path.clone() });
        assert_eq!(pipeline.state(), PipelineState::Done);
        assert_eq!(pipeline.backend().calls(), vec!["check", "train", "save"]);
        assert_eq!(std::fs::read_to_string(model_path).unwrap(), "4");
        // gamma resolved from the sample count before validation
        assert_eq!(*pipeline.backend().seen_gamma.borrow(), Some(0.25));
    }

    #[test]
    fn test_cross_validation_branch() {
        let data = dataset();
        let input = data.path().to_string_lossy().to_string();

        let mut pipeline = TrainingPipeline::new(
            options(&["-v", "3", "-q", input.as_str()]),
            RecordingBackend::default(),
        );
        let outcome = pipeline.run().unwrap();

        match outcome {
            PipelineOutcome::CrossValidated(CrossValidationReport::Classification {
                accuracy,
                ..
            }) => {
                assert_eq!(accuracy, 100.0)
            }
            other => panic!("unexpected outcome {other:?}"),
        }
        assert_eq!(pipeline.backend().calls(), vec!["sink", "check", "cv3"]);
        assert!(pipeline.backend().quiet);
    }

    #[test]
    fn test_explicit_gamma_is_kept() {
        let data = dataset();
        let input = data.path().to_string_lossy().to_string();

        let mut pipeline = TrainingPipeline::new(
            options(&["-g", "2", "-v", "2", input.as_str()]),
            RecordingBackend::default(),
        );
        pipeline.run().unwrap();
        assert_eq!(*pipeline.backend().seen_gamma.borrow(), Some(2.0));
    }

    #[test]
    fn test_validation_failure_stops_before_training() {
        let data = dataset();
        let input = data.path().to_string_lossy().to_string();
        let backend = RecordingBackend {
            reject: Some("C <= 0".to_string()),
            ..RecordingBackend::default()
        };

        let mut pipeline = TrainingPipeline::new(options(&[input.as_str()]), backend);
        let err = pipeline.run().unwrap_err();

        assert!(matches!(err, SVMError::InvalidParameter(ref m) if m == "C <= 0"));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert_eq!(pipeline.backend().calls(), vec!["check"]);
    }

    #[test]
    fn test_missing_file_fails_before_validation() {
        let mut pipeline = TrainingPipeline::new(
            options(&["/nonexistent/dir/train.txt"]),
            RecordingBackend::default(),
        );
        let err = pipeline.run().unwrap_err();

        assert!(matches!(err, SVMError::IoError(_)));
        assert_eq!(pipeline.state(), PipelineState::Failed);
        assert!(pipeline.backend().calls().is_empty());
    }

    #[test]
    fn test_custom_separator() {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        writeln!(file, "1.0,2.0,3.5").expect("write failed");
        writeln!(file, "2.0,1.0,4.5").expect("write failed");
        let input = file.path().to_string_lossy().to_string();

        let mut pipeline = TrainingPipeline::new(
            options(&["-s", "3", "-v", "2", input.as_str()]),
            RecordingBackend::default(),
        )
        .with_separator(",");
        let outcome = pipeline.run().unwrap();

        assert!(matches!(
            outcome,
            PipelineOutcome::CrossValidated(CrossValidationReport::Regression {
                mean_squared_error,
                ..
            }) if mean_squared_error == 0.0
        ));
    }

    #[test]
    fn test_pipeline_runs_once() {
        let data = dataset();
        let input = data.path().to_string_lossy().to_string();

        let mut pipeline = TrainingPipeline::new(
            options(&["-v", "2", input.as_str()]),
            RecordingBackend::default(),
        );
        pipeline.run().unwrap();
        assert!(pipeline.run().is_err());
    }
}

//! Training options from libsvm-style command-line tokens
//!
//! Parsing happens in two phases. [`parse_options`] turns the leading
//! `-x value` tokens into an ordered list of [`TrainOption`] effects and
//! fails without touching any [`Parameter`]. Only a fully valid sequence is
//! then folded onto [`Parameter::default`].
//!
//! ```rust
//! use svm_train::config::TrainingOptions;
//!
//! let args: Vec<String> = ["-c", "10", "-w1", "2", "data/train.txt"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! let options = TrainingOptions::from_args(&args).unwrap();
//! assert_eq!(options.param.c, 10.0);
//! assert_eq!(options.model_path.to_str(), Some("train.txt.model"));
//! ```

pub mod usage;

use crate::core::{ClassWeight, ConfigError, KernelType, Parameter, SvmType};
use log::warn;
use std::path::PathBuf;

pub use self::usage::{print_usage, USAGE};

/// Suffix appended to the input file name to form the default model path
pub const MODEL_SUFFIX: &str = ".model";

/// One recognised command-line option and the value it carries
#[derive(Debug, Clone, PartialEq)]
pub enum TrainOption {
    SvmType(SvmType),
    KernelType(KernelType),
    Degree(i32),
    Gamma(f64),
    Coef0(f64),
    Nu(f64),
    CacheSize(f64),
    Cost(f64),
    Tolerance(f64),
    LossEpsilon(f64),
    Shrinking(bool),
    Probability(bool),
    /// `-q`: suppress solver output
    Quiet,
    /// `-v n`: n-fold cross-validation
    CrossValidation(usize),
    /// `-w<label> weight`
    Weight(ClassWeight),
}

impl TrainOption {
    /// Apply this option to a parameter set, producing the updated set
    ///
    /// `Quiet` and `CrossValidation` are orchestration directives and leave
    /// the parameter set unchanged.
    pub fn apply(&self, param: Parameter) -> Parameter {
        match *self {
            TrainOption::SvmType(svm_type) => Parameter { svm_type, ..param },
            TrainOption::KernelType(kernel_type) => Parameter {
                kernel_type,
                ..param
            },
            TrainOption::Degree(degree) => Parameter { degree, ..param },
            TrainOption::Gamma(gamma) => Parameter { gamma, ..param },
            TrainOption::Coef0(coef0) => Parameter { coef0, ..param },
            TrainOption::Nu(nu) => Parameter { nu, ..param },
            TrainOption::CacheSize(cache_size) => Parameter { cache_size, ..param },
            TrainOption::Cost(c) => Parameter { c, ..param },
            TrainOption::Tolerance(eps) => Parameter { eps, ..param },
            TrainOption::LossEpsilon(p) => Parameter { p, ..param },
            TrainOption::Shrinking(shrinking) => Parameter { shrinking, ..param },
            TrainOption::Probability(probability) => Parameter {
                probability,
                ..param
            },
            TrainOption::Weight(entry) => {
                let mut weights = param.weights;
                weights.push(entry);
                Parameter { weights, ..param }
            }
            TrainOption::Quiet | TrainOption::CrossValidation(_) => param,
        }
    }
}

/// Everything the training pipeline needs from the command line
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingOptions {
    pub param: Parameter,
    /// Suppress the solver's diagnostic output
    pub quiet: bool,
    /// Fold count when cross-validation was requested
    pub nr_fold: Option<usize>,
    pub input_path: PathBuf,
    pub model_path: PathBuf,
}

impl TrainingOptions {
    /// Parse `[options] training_set_file [model_file]`
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, ConfigError> {
        let (options, rest) = parse_options(args)?;

        let input = rest.first().ok_or(ConfigError::MissingInputFile)?.as_ref();
        let model_path = match rest.get(1) {
            Some(explicit) => PathBuf::from(explicit.as_ref()),
            None => PathBuf::from(default_model_path(input)),
        };
        if rest.len() > 2 {
            warn!("Ignoring {} extra argument(s) after model file", rest.len() - 2);
        }

        let param = options
            .iter()
            .fold(Parameter::default(), |param, option| option.apply(param));
        let quiet = options.iter().any(|o| matches!(o, TrainOption::Quiet));
        let nr_fold = options.iter().rev().find_map(|o| match o {
            TrainOption::CrossValidation(n) => Some(*n),
            _ => None,
        });

        Ok(Self {
            param,
            quiet,
            nr_fold,
            input_path: PathBuf::from(input),
            model_path,
        })
    }
}

/// Split leading option tokens from positional arguments
///
/// Returns the parsed options in command-line order and the remaining
/// (positional) tokens. Nothing is applied here, so an error leaves no
/// partially configured state behind.
pub fn parse_options<S: AsRef<str>>(args: &[S]) -> Result<(Vec<TrainOption>, &[S]), ConfigError> {
    let mut options = Vec::new();
    let mut i = 0;

    while i < args.len() {
        let flag = args[i].as_ref();
        if !flag.starts_with('-') {
            break;
        }

        let letter = flag
            .chars()
            .nth(1)
            .ok_or_else(|| ConfigError::UnknownOption(flag.to_string()))?;

        if letter == 'q' {
            options.push(TrainOption::Quiet);
            i += 1;
            continue;
        }

        let value = args
            .get(i + 1)
            .map(|v| v.as_ref())
            .ok_or_else(|| ConfigError::MissingValue(flag.to_string()))?;

        let option = match letter {
            's' => TrainOption::SvmType(SvmType::from_code(parse_int(flag, value)?)?),
            't' => TrainOption::KernelType(KernelType::from_code(parse_int(flag, value)?)?),
            'd' => TrainOption::Degree(parse_int(flag, value)?),
            'g' => TrainOption::Gamma(parse_float(flag, value)?),
            'r' => TrainOption::Coef0(parse_float(flag, value)?),
            'n' => TrainOption::Nu(parse_float(flag, value)?),
            'm' => TrainOption::CacheSize(parse_float(flag, value)?),
            'c' => TrainOption::Cost(parse_float(flag, value)?),
            'e' => TrainOption::Tolerance(parse_float(flag, value)?),
            'p' => TrainOption::LossEpsilon(parse_float(flag, value)?),
            'h' => TrainOption::Shrinking(parse_flag(flag, value)?),
            'b' => TrainOption::Probability(parse_flag(flag, value)?),
            'v' => {
                let n = parse_int(flag, value)?;
                if n < 2 {
                    return Err(ConfigError::FoldCount(i64::from(n)));
                }
                TrainOption::CrossValidation(n as usize)
            }
            'w' => {
                // the class id lives in the flag itself: -w<label>
                let label_text = flag.get(2..).unwrap_or("");
                TrainOption::Weight(ClassWeight {
                    label: parse_int(flag, label_text)?,
                    weight: parse_float(flag, value)?,
                })
            }
            _ => return Err(ConfigError::UnknownOption(flag.to_string())),
        };

        options.push(option);
        i += 2;
    }

    Ok((options, &args[i..]))
}

/// Model path used when none is given: last path segment plus ".model"
pub fn default_model_path(input: &str) -> String {
    let file_name = input.rsplit('/').next().unwrap_or(input);
    format!("{file_name}{MODEL_SUFFIX}")
}

fn parse_int(option: &str, value: &str) -> Result<i32, ConfigError> {
    value
        .trim()
        .parse::<i32>()
        .map_err(|_| ConfigError::InvalidNumber {
            option: option.to_string(),
            value: value.to_string(),
        })
}

fn parse_float(option: &str, value: &str) -> Result<f64, ConfigError> {
    let parsed = value
        .trim()
        .parse::<f64>()
        .map_err(|_| ConfigError::InvalidNumber {
            option: option.to_string(),
            value: value.to_string(),
        })?;
    if parsed.is_finite() {
        Ok(parsed)
    } else {
        Err(ConfigError::NonFinite(value.to_string()))
    }
}

fn parse_flag(option: &str, value: &str) -> Result<bool, ConfigError> {
    match parse_int(option, value)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(ConfigError::InvalidFlag {
            option: option.to_string(),
            value: other,
        }),
    }
}

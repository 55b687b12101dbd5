//! svm-train command line interface
//!
//! `svm-train [--verbose] [--debug] [--separator SEP] [options] training_set_file [model_file]`
//!
//! The libsvm-style options (`-s`, `-t`, `-c`, `-w<label>`, `-v`, ...) are
//! passed through untouched to [`TrainingOptions::from_args`].

use clap::{ArgAction, Parser};
use env_logger::Env;
use log::{debug, info};
use std::process;
use svm_train::config::print_usage;
use svm_train::data::DEFAULT_SEPARATOR;
use svm_train::{
    PipelineOutcome, Result, SVMError, SmoBackend, TrainingOptions, TrainingPipeline,
};

#[derive(Parser)]
#[command(name = "svm-train")]
#[command(about = "Train a Support Vector Machine or run k-fold cross validation")]
#[command(version = env!("CARGO_PKG_VERSION"))]
// -h is the shrinking option
#[command(disable_help_flag = true, disable_version_flag = true)]
struct Cli {
    /// Enable verbose output
    #[arg(long)]
    verbose: bool,

    /// Enable debug output
    #[arg(long)]
    debug: bool,

    /// Field separator of the training set file
    #[arg(long, default_value = DEFAULT_SEPARATOR)]
    separator: String,

    /// Print help
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,

    /// Training options followed by training_set_file [model_file]
    #[arg(trailing_var_arg = true, allow_hyphen_values = true, value_name = "ARGS")]
    args: Vec<String>,
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    env_logger::Builder::from_env(Env::default().default_filter_or(log_level)).init();

    if let Err(e) = run(cli) {
        report(&e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let options = TrainingOptions::from_args(&cli.args)?;
    info!(
        "Training set {}, model file {}",
        options.input_path.display(),
        options.model_path.display()
    );

    let mut pipeline =
        TrainingPipeline::new(options, SmoBackend::new()).with_separator(&cli.separator);
    match pipeline.run()? {
        PipelineOutcome::CrossValidated(report) => print!("{report}"),
        PipelineOutcome::Saved { path } => info!("Model written to {}", path.display()),
    }
    Ok(())
}

/// Prints a fatal error to stderr exactly once.
fn report(e: &SVMError) {
    debug!("Fatal: {e:?}");
    match e {
        SVMError::Config(config) => {
            eprintln!("{config}");
            if config.shows_usage() {
                print_usage();
            }
        }
        SVMError::InvalidParameter(message) => eprintln!("ERROR: {message}"),
        other => eprintln!("{other}"),
    }
}

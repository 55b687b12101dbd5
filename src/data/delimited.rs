//! Delimited text dataset loader
//!
//! One sample per line. Fields are split on a separator (TAB by default);
//! every field but the last is a feature value and the last is the label:
//!
//! ```text
//! 0.5	1.2	0.8	1
//! 0.3	2.1	-1
//! ```
//!
//! Rows are not required to share a length.

use crate::core::{Problem, ProblemBuilder, Result, SVMError};
use log::debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Default field separator
pub const DEFAULT_SEPARATOR: &str = "\t";

/// Reader for separator-delimited datasets
#[derive(Debug, Clone)]
pub struct DelimitedReader {
    separator: String,
}

impl Default for DelimitedReader {
    fn default() -> Self {
        Self::new(DEFAULT_SEPARATOR)
    }
}

impl DelimitedReader {
    /// Create a reader splitting fields on `separator`
    ///
    /// An empty separator falls back to the default.
    pub fn new(separator: &str) -> Self {
        let separator = if separator.is_empty() {
            DEFAULT_SEPARATOR
        } else {
            separator
        };
        Self {
            separator: separator.to_string(),
        }
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Load a dataset from a file
    pub fn from_file<P: AsRef<Path>>(&self, path: P) -> Result<Problem> {
        let file = File::open(path).map_err(SVMError::IoError)?;
        let reader = BufReader::with_capacity(512 * 1024, file);
        self.from_reader(reader)
    }

    /// Load a dataset from a reader (for testing and flexibility)
    pub fn from_reader<R: BufRead>(&self, reader: R) -> Result<Problem> {
        let mut builder = ProblemBuilder::new();

        for (line_num, line) in reader.lines().enumerate() {
            let line = line.map_err(SVMError::IoError)?;
            let line = line.trim_end_matches(['\r', '\n']);

            if line.trim().is_empty() {
                continue;
            }

            let (row, label) = self.parse_line(line).map_err(|e| {
                SVMError::ParseError(format!("Error parsing line {}: {}", line_num + 1, e))
            })?;
            builder.push(row, label);
        }

        debug!("Read {} samples", builder.len());
        Ok(builder.finish())
    }

    /// Parse one line into (features, label)
    fn parse_line(&self, line: &str) -> std::result::Result<(Vec<f64>, f64), String> {
        let mut fields: Vec<&str> = line.split(self.separator.as_str()).collect();
        // trailing separators do not introduce empty fields
        while fields.len() > 1 && fields.last().is_some_and(|f| f.trim().is_empty()) {
            fields.pop();
        }

        let (label_field, feature_fields) = fields
            .split_last()
            .ok_or_else(|| "line has no fields".to_string())?;

        let row = feature_fields
            .iter()
            .enumerate()
            .map(|(idx, field)| {
                parse_value(field).map_err(|e| format!("feature {}: {}", idx + 1, e))
            })
            .collect::<std::result::Result<Vec<f64>, String>>()?;
        let label = parse_value(label_field).map_err(|e| format!("label: {e}"))?;

        Ok((row, label))
    }
}

/// Parse a finite floating value
fn parse_value(field: &str) -> std::result::Result<f64, String> {
    let value = field
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("invalid number '{field}'"))?;
    if value.is_finite() {
        Ok(value)
    } else {
        Err("NaN or Infinity in input".to_string())
    }
}

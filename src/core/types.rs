//! Core type definitions for the training dataset

/// Training dataset: one label and one dense feature row per sample
///
/// Rows may differ in length; each input line is split independently.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Problem {
    labels: Vec<f64>,
    features: Vec<Vec<f64>>,
}

impl Problem {
    /// Build a problem from parallel label and feature vectors
    ///
    /// # Panics
    /// Panics if the two vectors differ in length
    pub fn new(labels: Vec<f64>, features: Vec<Vec<f64>>) -> Self {
        assert_eq!(
            labels.len(),
            features.len(),
            "Labels and feature rows must have same length"
        );
        Self { labels, features }
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Label (class id or regression target) of every sample
    pub fn labels(&self) -> &[f64] {
        &self.labels
    }

    pub fn label(&self, i: usize) -> f64 {
        self.labels[i]
    }

    /// All feature rows
    pub fn features(&self) -> &[Vec<f64>] {
        &self.features
    }

    pub fn row(&self, i: usize) -> &[f64] {
        &self.features[i]
    }

    /// Length of the longest feature row
    pub fn max_row_len(&self) -> usize {
        self.features.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Subset of the samples at `indices`, in that order
    pub fn subset(&self, indices: &[usize]) -> Problem {
        Problem {
            labels: indices.iter().map(|&i| self.labels[i]).collect(),
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
        }
    }
}

/// Append-only accumulator used while streaming a dataset
#[derive(Debug, Default)]
pub struct ProblemBuilder {
    labels: Vec<f64>,
    features: Vec<Vec<f64>>,
}

impl ProblemBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one sample
    pub fn push(&mut self, row: Vec<f64>, label: f64) {
        self.features.push(row);
        self.labels.push(label);
    }

    /// Samples appended so far
    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Freeze the accumulated samples; the size is fixed from here on
    pub fn finish(self) -> Problem {
        Problem {
            labels: self.labels,
            features: self.features,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_appends_in_order() {
        let mut builder = ProblemBuilder::new();
        assert!(builder.is_empty());
        builder.push(vec![1.0, 2.0], 1.0);
        builder.push(vec![3.0], -1.0);
        assert_eq!(builder.len(), 2);

        let problem = builder.finish();
        assert_eq!(problem.len(), 2);
        assert_eq!(problem.labels(), &[1.0, -1.0]);
        assert_eq!(problem.row(0), &[1.0, 2.0]);
        assert_eq!(problem.row(1), &[3.0]);
        assert_eq!(problem.max_row_len(), 2);
    }

    #[test]
    fn test_subset() {
        let problem = Problem::new(
            vec![1.0, 2.0, 3.0],
            vec![vec![1.0], vec![2.0], vec![3.0]],
        );
        let sub = problem.subset(&[2, 0]);
        assert_eq!(sub.labels(), &[3.0, 1.0]);
        assert_eq!(sub.row(0), &[3.0]);
    }

    #[test]
    fn test_empty_problem() {
        let problem = Problem::default();
        assert!(problem.is_empty());
        assert_eq!(problem.max_row_len(), 0);
    }

    #[test]
    #[should_panic(expected = "Labels and feature rows must have same length")]
    fn test_problem_length_mismatch() {
        Problem::new(vec![1.0], vec![]);
    }
}

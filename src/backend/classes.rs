//! Grouping of training samples by class label

/// Samples grouped by class, classes in order of first appearance
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassGroups {
    /// Class ids
    pub labels: Vec<i32>,
    /// Sample indices, grouped so that class `c` occupies
    /// `perm[start[c]..start[c] + count[c]]`
    pub perm: Vec<usize>,
    start: Vec<usize>,
    count: Vec<usize>,
}

impl ClassGroups {
    pub fn nr_class(&self) -> usize {
        self.labels.len()
    }

    pub fn counts(&self) -> &[usize] {
        &self.count
    }

    pub fn starts(&self) -> &[usize] {
        &self.start
    }

    /// Sample indices of class `c`
    pub fn members(&self, c: usize) -> &[usize] {
        &self.perm[self.start[c]..self.start[c] + self.count[c]]
    }
}

/// Group sample indices by (integer) class label
///
/// A two-class problem labelled -1/+1 with -1 seen first is reordered so
/// that +1 comes first.
pub fn group_classes(labels: &[f64]) -> ClassGroups {
    let mut classes: Vec<i32> = Vec::new();
    let mut members: Vec<Vec<usize>> = Vec::new();

    for (i, &y) in labels.iter().enumerate() {
        let label = y as i32;
        match classes.iter().position(|&c| c == label) {
            Some(c) => members[c].push(i),
            None => {
                classes.push(label);
                members.push(vec![i]);
            }
        }
    }

    if classes == [-1, 1] {
        classes.swap(0, 1);
        members.swap(0, 1);
    }

    let count: Vec<usize> = members.iter().map(Vec::len).collect();
    let start = count
        .iter()
        .scan(0, |acc, &n| {
            let s = *acc;
            *acc += n;
            Some(s)
        })
        .collect();

    ClassGroups {
        labels: classes,
        perm: members.into_iter().flatten().collect(),
        start,
        count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_appearance_order() {
        let groups = group_classes(&[3.0, 1.0, 3.0, 2.0, 1.0]);
        assert_eq!(groups.labels, vec![3, 1, 2]);
        assert_eq!(groups.counts(), &[2, 2, 1]);
        assert_eq!(groups.starts(), &[0, 2, 4]);
        assert_eq!(groups.perm, vec![0, 2, 1, 4, 3]);
        assert_eq!(groups.members(1), &[1, 4]);
    }

    #[test]
    fn test_binary_minus_one_first_is_swapped() {
        let groups = group_classes(&[-1.0, 1.0, -1.0]);
        assert_eq!(groups.labels, vec![1, -1]);
        assert_eq!(groups.members(0), &[1]);
        assert_eq!(groups.members(1), &[0, 2]);
    }

    #[test]
    fn test_labels_truncated_to_integers() {
        let groups = group_classes(&[1.7, 1.2, 2.0]);
        assert_eq!(groups.labels, vec![1, 2]);
        assert_eq!(groups.nr_class(), 2);
    }
}

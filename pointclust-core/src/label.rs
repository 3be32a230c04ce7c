//! Cluster labels

/// Cluster label assigned to a point.
///
/// Non-negative values identify a cluster, [`NOISE`] marks an unclustered point.
pub type Label = i32;

/// Reserved label for points that belong to no cluster
pub const NOISE: Label = -1;

/// Returns true if `label` is the reserved noise label
#[inline]
pub fn is_noise(label: Label) -> bool {
    label == NOISE
}

/// Count the distinct non-negative labels in a label array
pub fn cluster_count(labels: &[Label]) -> usize {
    let mut seen: Vec<Label> = labels.iter().copied().filter(|&l| l >= 0).collect();
    seen.sort_unstable();
    seen.dedup();
    seen.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_count_ignores_noise() {
        assert_eq!(cluster_count(&[0, 0, 1, NOISE, 2, 1]), 3);
        assert_eq!(cluster_count(&[NOISE, NOISE]), 0);
        assert_eq!(cluster_count(&[]), 0);
    }

    #[test]
    fn test_is_noise() {
        assert!(is_noise(NOISE));
        assert!(!is_noise(0));
    }
}

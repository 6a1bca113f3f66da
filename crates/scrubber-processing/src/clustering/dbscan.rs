//! Density-based spatial clustering (DBSCAN).
//!
//! Points are rows of equal-length `f64` vectors. Two points are neighbors
//! when their Euclidean distance is at most `epsilon`; every point is its own
//! neighbor. A point with at least `min_samples` neighbors is a core point.
//! Clusters grow from core points in input order; a border point joins the
//! first cluster that reaches it. Points reached by no cluster are noise.

use std::collections::VecDeque;

/// Cluster assignment of a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClusterLabel {
    /// Not density-reachable from any core point
    Noise,
    /// Member of the cluster with this id (ids start at 0)
    Cluster(usize),
}

impl ClusterLabel {
    pub fn is_noise(&self) -> bool {
        matches!(self, Self::Noise)
    }
}

/// Errors raised before clustering starts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ClusteringError {
    #[error("no points to cluster")]
    EmptyInput,

    #[error("point {row} has {found} dimensions, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("non-finite value in point {row}, dimension {column}")]
    NonFiniteValue { row: usize, column: usize },

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

/// DBSCAN clusterer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dbscan {
    epsilon: f64,
    min_samples: usize,
}

impl Dbscan {
    /// Create a clusterer.
    ///
    /// `epsilon` must be finite and positive, `min_samples` at least 1.
    pub fn new(epsilon: f64, min_samples: usize) -> Result<Self, ClusteringError> {
        if !epsilon.is_finite() || epsilon <= 0.0 {
            return Err(ClusteringError::InvalidParameters(format!(
                "epsilon must be finite and positive, got {}",
                epsilon
            )));
        }
        if min_samples == 0 {
            return Err(ClusteringError::InvalidParameters(
                "min_samples must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            epsilon,
            min_samples,
        })
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }

    pub fn min_samples(&self) -> usize {
        self.min_samples
    }

    /// Label every point.
    ///
    /// The returned vector has one label per input point, in input order.
    pub fn fit(&self, points: &[Vec<f64>]) -> Result<Vec<ClusterLabel>, ClusteringError> {
        Self::check_points(points)?;

        let neighborhoods: Vec<Vec<usize>> = (0..points.len())
            .map(|idx| self.region_query(points, idx))
            .collect();
        let is_core: Vec<bool> = neighborhoods
            .iter()
            .map(|neighbors| neighbors.len() >= self.min_samples)
            .collect();

        let mut labels = vec![ClusterLabel::Noise; points.len()];
        let mut assigned = vec![false; points.len()];
        let mut next_cluster = 0;

        for seed in 0..points.len() {
            if assigned[seed] || !is_core[seed] {
                continue;
            }

            let cluster = ClusterLabel::Cluster(next_cluster);
            next_cluster += 1;

            let mut queue = VecDeque::from([seed]);
            assigned[seed] = true;
            labels[seed] = cluster;

            while let Some(point) = queue.pop_front() {
                // border points are claimed but never expand the cluster
                if !is_core[point] {
                    continue;
                }
                for &neighbor in &neighborhoods[point] {
                    if !assigned[neighbor] {
                        assigned[neighbor] = true;
                        labels[neighbor] = cluster;
                        queue.push_back(neighbor);
                    }
                }
            }
        }

        Ok(labels)
    }

    /// Indices of all points within epsilon of `points[idx]`, itself included.
    fn region_query(&self, points: &[Vec<f64>], idx: usize) -> Vec<usize> {
        let eps_squared = self.epsilon * self.epsilon;
        points
            .iter()
            .enumerate()
            .filter(|(_, other)| squared_distance(&points[idx], other) <= eps_squared)
            .map(|(other_idx, _)| other_idx)
            .collect()
    }

    fn check_points(points: &[Vec<f64>]) -> Result<(), ClusteringError> {
        let Some(first) = points.first() else {
            return Err(ClusteringError::EmptyInput);
        };
        let expected = first.len();

        for (row, point) in points.iter().enumerate() {
            if point.len() != expected {
                return Err(ClusteringError::DimensionMismatch {
                    row,
                    expected,
                    found: point.len(),
                });
            }
            if let Some(column) = point.iter().position(|v| !v.is_finite()) {
                return Err(ClusteringError::NonFiniteValue { row, column });
            }
        }
        Ok(())
    }
}

/// Squared Euclidean distance between two points of equal dimension.
fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn points(values: &[f64]) -> Vec<Vec<f64>> {
        values.iter().map(|v| vec![*v]).collect()
    }

    #[test]
    fn test_new_rejects_bad_parameters() {
        assert!(Dbscan::new(0.0, 5).is_err());
        assert!(Dbscan::new(f64::NAN, 5).is_err());
        assert!(Dbscan::new(0.5, 0).is_err());
        assert!(Dbscan::new(0.5, 1).is_ok());
    }

    #[test]
    fn test_dense_group_and_isolated_point() {
        let dbscan = Dbscan::new(0.5, 5).unwrap();
        let labels = dbscan
            .fit(&points(&[1.0, 1.0, 1.0, 1.0, 1.0, 100.0]))
            .unwrap();

        assert!(labels[..5].iter().all(|l| *l == ClusterLabel::Cluster(0)));
        assert!(labels[5].is_noise());
    }

    #[test]
    fn test_point_counts_as_its_own_neighbor() {
        // Every point is a core point of its own singleton cluster
        let dbscan = Dbscan::new(0.5, 1).unwrap();
        let labels = dbscan.fit(&points(&[0.0, 10.0, 20.0])).unwrap();
        assert_eq!(
            labels,
            vec![
                ClusterLabel::Cluster(0),
                ClusterLabel::Cluster(1),
                ClusterLabel::Cluster(2)
            ]
        );
    }

    #[test]
    fn test_distance_equal_to_epsilon_is_a_neighbor() {
        let dbscan = Dbscan::new(1.0, 2).unwrap();
        let labels = dbscan.fit(&points(&[0.0, 1.0])).unwrap();
        assert!(labels.iter().all(|l| !l.is_noise()));
    }

    #[test]
    fn test_border_point_joins_cluster() {
        // 0.0 .. 0.4 form a core chain; 0.8 is only reachable from 0.4
        let dbscan = Dbscan::new(0.45, 3).unwrap();
        let labels = dbscan.fit(&points(&[0.0, 0.2, 0.4, 0.8])).unwrap();

        assert_eq!(labels[3], ClusterLabel::Cluster(0));
        // 0.8 is a border point, so it does not pull 1.3 into the cluster
        let far = dbscan.fit(&points(&[0.0, 0.2, 0.4, 0.8, 1.3])).unwrap();
        assert_eq!(far[3], ClusterLabel::Cluster(0));
        assert!(far[4].is_noise());
    }

    #[test]
    fn test_two_clusters() {
        let dbscan = Dbscan::new(0.5, 2).unwrap();
        let data = vec![
            vec![0.0, 0.0],
            vec![0.1, 0.1],
            vec![5.0, 5.0],
            vec![5.1, 5.0],
            vec![9.0, -9.0],
        ];
        let labels = dbscan.fit(&data).unwrap();
        assert_eq!(labels[0], ClusterLabel::Cluster(0));
        assert_eq!(labels[1], ClusterLabel::Cluster(0));
        assert_eq!(labels[2], ClusterLabel::Cluster(1));
        assert_eq!(labels[3], ClusterLabel::Cluster(1));
        assert!(labels[4].is_noise());
    }

    #[test]
    fn test_input_validation() {
        let dbscan = Dbscan::new(0.5, 2).unwrap();
        assert_eq!(dbscan.fit(&[]).unwrap_err(), ClusteringError::EmptyInput);
        assert_eq!(
            dbscan.fit(&[vec![1.0], vec![f64::INFINITY]]).unwrap_err(),
            ClusteringError::NonFiniteValue { row: 1, column: 0 }
        );
        assert!(matches!(
            dbscan.fit(&[vec![1.0], vec![1.0, 2.0]]),
            Err(ClusteringError::DimensionMismatch { row: 1, .. })
        ));
    }
}

//! Clustering algorithms used for anomaly flagging.

mod dbscan;

pub use dbscan::{ClusterLabel, ClusteringError, Dbscan};

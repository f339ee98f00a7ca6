//! Hierarchical clustering and optimal leaf ordering.

mod leaf_order;
mod linkage;

pub use leaf_order::{optimal_leaf_order, path_length};
pub use linkage::{linkage, pairwise_distances, Dendrogram, Linkage, Merge};

use crate::error::Result;
use nalgebra::DMatrix;

/// Order the rows of `data` so similar rows sit next to each other.
///
/// Clusters rows by euclidean distance with the given linkage and returns
/// the optimal leaf order of the resulting tree.
pub fn cluster_order(data: &DMatrix<f64>, method: Linkage) -> Result<Vec<usize>> {
    let distances = pairwise_distances(data);
    let tree = linkage(&distances, method)?;
    let order = optimal_leaf_order(&tree, &distances)?;
    tracing::debug!(
        n = data.nrows(),
        method = %method,
        path = path_length(&order, &distances),
        "optimal leaf order"
    );
    Ok(order)
}

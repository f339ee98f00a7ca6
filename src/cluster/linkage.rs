//! Agglomerative hierarchical clustering.
//!
//! Naive O(n³) agglomeration over a dense distance matrix with
//! Lance-Williams updates. Cluster ids follow the usual convention: leaves
//! are `0..n`, the cluster formed by merge `k` is `n + k`.

use crate::error::{IobioError, Result};
use nalgebra::DMatrix;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Linkage method for merging clusters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Linkage {
    /// Minimum distance between members.
    Single,
    /// Maximum distance between members.
    Complete,
    /// Size-weighted mean distance between members (UPGMA).
    Average,
    /// Unweighted mean of the two merged clusters' distances (WPGMA).
    Weighted,
    /// Minimum increase in within-cluster variance.
    Ward,
}

impl Linkage {
    /// Distance from the union of `i` and `j` to `k`.
    fn update(self, d_ik: f64, d_jk: f64, d_ij: f64, n_i: usize, n_j: usize, n_k: usize) -> f64 {
        match self {
            Linkage::Single => d_ik.min(d_jk),
            Linkage::Complete => d_ik.max(d_jk),
            Linkage::Average => {
                (n_i as f64 * d_ik + n_j as f64 * d_jk) / (n_i + n_j) as f64
            }
            Linkage::Weighted => 0.5 * (d_ik + d_jk),
            Linkage::Ward => {
                let (n_i, n_j, n_k) = (n_i as f64, n_j as f64, n_k as f64);
                let t = n_i + n_j + n_k;
                (((n_i + n_k) * d_ik * d_ik + (n_j + n_k) * d_jk * d_jk - n_k * d_ij * d_ij) / t)
                    .max(0.0)
                    .sqrt()
            }
        }
    }
}

impl fmt::Display for Linkage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Linkage::Single => "single",
            Linkage::Complete => "complete",
            Linkage::Average => "average",
            Linkage::Weighted => "weighted",
            Linkage::Ward => "ward",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for Linkage {
    type Err = IobioError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "single" => Ok(Linkage::Single),
            "complete" => Ok(Linkage::Complete),
            "average" => Ok(Linkage::Average),
            "weighted" => Ok(Linkage::Weighted),
            "ward" => Ok(Linkage::Ward),
            other => Err(IobioError::InvalidParameter(format!(
                "Unknown linkage method '{}'",
                other
            ))),
        }
    }
}

/// One agglomeration step.
#[derive(Debug, Clone, PartialEq)]
pub struct Merge {
    /// Smaller of the two merged cluster ids.
    pub left: usize,
    /// Larger of the two merged cluster ids.
    pub right: usize,
    /// Linkage distance at which they merged.
    pub distance: f64,
    /// Number of leaves in the new cluster.
    pub size: usize,
}

/// Result of hierarchical clustering: `n_leaves - 1` merges.
#[derive(Debug, Clone, PartialEq)]
pub struct Dendrogram {
    merges: Vec<Merge>,
    n_leaves: usize,
}

impl Dendrogram {
    /// Merges in agglomeration order.
    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    /// Number of leaves.
    pub fn n_leaves(&self) -> usize {
        self.n_leaves
    }

    /// Children of an internal node, `None` for a leaf.
    pub fn children(&self, node: usize) -> Option<(usize, usize)> {
        node.checked_sub(self.n_leaves)
            .and_then(|k| self.merges.get(k))
            .map(|m| (m.left, m.right))
    }

    /// Root node id.
    pub fn root(&self) -> usize {
        self.n_leaves + self.merges.len() - 1
    }

    /// Leaves left to right, each merge listing its left child first.
    pub fn leaves(&self) -> Vec<usize> {
        let mut order = Vec::with_capacity(self.n_leaves);
        let mut stack = vec![self.root()];
        while let Some(node) = stack.pop() {
            match self.children(node) {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => order.push(node),
            }
        }
        order
    }
}

/// Euclidean distances between the rows of `data`.
pub fn pairwise_distances(data: &DMatrix<f64>) -> DMatrix<f64> {
    let n = data.nrows();
    let mut dist = DMatrix::zeros(n, n);
    for i in 0..n {
        for j in (i + 1)..n {
            let d = (data.row(i) - data.row(j)).norm();
            dist[(i, j)] = d;
            dist[(j, i)] = d;
        }
    }
    dist
}

/// Cluster observations given their pairwise distance matrix.
///
/// At each step the closest pair of active clusters merges; ties go to the
/// pair found first in row-major order, so the result is deterministic.
pub fn linkage(distances: &DMatrix<f64>, method: Linkage) -> Result<Dendrogram> {
    let n = distances.nrows();
    if distances.ncols() != n {
        return Err(IobioError::DimensionMismatch {
            expected: n,
            actual: distances.ncols(),
        });
    }
    if n == 0 {
        return Err(IobioError::EmptyData("Nothing to cluster".to_string()));
    }
    if distances.iter().any(|d| !d.is_finite()) {
        return Err(IobioError::InvalidParameter(
            "Distance matrix must contain only finite values".to_string(),
        ));
    }

    let mut dist = distances.clone();
    let mut active = vec![true; n];
    let mut ids: Vec<usize> = (0..n).collect();
    let mut sizes = vec![1usize; n];
    let mut merges = Vec::with_capacity(n.saturating_sub(1));

    for step in 0..n.saturating_sub(1) {
        let mut best: Option<(f64, usize, usize)> = None;
        for i in (0..n).filter(|&i| active[i]) {
            for j in ((i + 1)..n).filter(|&j| active[j]) {
                let d = dist[(i, j)];
                if best.map_or(true, |(b, _, _)| d < b) {
                    best = Some((d, i, j));
                }
            }
        }
        let Some((d_ij, i, j)) = best else {
            break;
        };

        for k in (0..n).filter(|&k| active[k] && k != i && k != j) {
            let d = method.update(dist[(i, k)], dist[(j, k)], d_ij, sizes[i], sizes[j], sizes[k]);
            dist[(i, k)] = d;
            dist[(k, i)] = d;
        }

        merges.push(Merge {
            left: ids[i].min(ids[j]),
            right: ids[i].max(ids[j]),
            distance: d_ij,
            size: sizes[i] + sizes[j],
        });
        sizes[i] += sizes[j];
        ids[i] = n + step;
        active[j] = false;
    }

    Ok(Dendrogram { merges, n_leaves: n })
}

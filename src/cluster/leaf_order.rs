//! Optimal leaf ordering of a dendrogram.
//!
//! Flips the children of internal nodes so that the sum of distances
//! between adjacent leaves is minimal, without changing the tree.
//!
//! # Reference
//!
//! Bar-Joseph Z, Gifford DK, Jaakkola TS. Fast optimal leaf ordering for
//! hierarchical clustering. Bioinformatics 17, S22-S29 (2001).

use super::linkage::Dendrogram;
use crate::error::{IobioError, Result};
use nalgebra::DMatrix;

/// Leaf order minimizing the summed distance between neighbours.
///
/// `cost[(u, w)]` holds the best cost of ordering the subtree rooted at the
/// lowest common ancestor of `u` and `w` with `u` first and `w` last. Every
/// leaf pair has exactly one such ancestor, so one n × n matrix covers the
/// whole tree. Ties keep the first candidate found.
pub fn optimal_leaf_order(tree: &Dendrogram, distances: &DMatrix<f64>) -> Result<Vec<usize>> {
    let n = tree.n_leaves();
    if distances.nrows() != n || distances.ncols() != n {
        return Err(IobioError::DimensionMismatch {
            expected: n,
            actual: distances.nrows(),
        });
    }
    if n <= 2 {
        return Ok(tree.leaves());
    }

    let mut leaves: Vec<Vec<usize>> = (0..n).map(|i| vec![i]).collect();
    for merge in tree.merges() {
        let mut joined = leaves[merge.left].clone();
        joined.extend_from_slice(&leaves[merge.right]);
        leaves.push(joined);
    }

    let mut cost = DMatrix::from_element(n, n, f64::INFINITY);
    for u in 0..n {
        cost[(u, u)] = 0.0;
    }
    // inner ends (m, k) of the best ordering from u to w
    let mut join = vec![(0usize, 0usize); n * n];
    let mut best_cost = vec![f64::INFINITY; n];
    let mut best_inner = vec![0usize; n];

    for merge in tree.merges() {
        for (a, b) in [(merge.left, merge.right), (merge.right, merge.left)] {
            let b_ends = ends(tree, &leaves, b);
            for (u, u_partners) in ends(tree, &leaves, a) {
                // cheapest way to leave subtree `a` from u and step onto k
                for &k in &leaves[b] {
                    best_cost[k] = f64::INFINITY;
                    for &m in u_partners {
                        let c = cost[(u, m)] + distances[(m, k)];
                        if c < best_cost[k] {
                            best_cost[k] = c;
                            best_inner[k] = m;
                        }
                    }
                }
                for (w, w_partners) in &b_ends {
                    let mut best = f64::INFINITY;
                    let mut choice = (u, *w);
                    for &k in *w_partners {
                        let c = best_cost[k] + cost[(k, *w)];
                        if c < best {
                            best = c;
                            choice = (best_inner[k], k);
                        }
                    }
                    cost[(u, *w)] = best;
                    join[u * n + *w] = choice;
                }
            }
        }
    }

    let root = tree.root();
    let mut start = (0usize, 0usize);
    let mut best = f64::INFINITY;
    for (u, partners) in ends(tree, &leaves, root) {
        for &w in partners {
            if cost[(u, w)] < best {
                best = cost[(u, w)];
                start = (u, w);
            }
        }
    }

    let mut order = Vec::with_capacity(n);
    let mut stack = vec![(root, start.0, start.1)];
    while let Some((node, u, w)) = stack.pop() {
        match tree.children(node) {
            None => order.push(u),
            Some((left, right)) => {
                let (m, k) = join[u * n + w];
                let (first, second) = if leaves[left].contains(&u) {
                    (left, right)
                } else {
                    (right, left)
                };
                stack.push((second, k, w));
                stack.push((first, u, m));
            }
        }
    }

    Ok(order)
}

/// Possible first leaves of an ordering of `node`, each with the leaves
/// that can then sit at the other end.
fn ends<'a>(tree: &Dendrogram, leaves: &'a [Vec<usize>], node: usize) -> Vec<(usize, &'a [usize])> {
    match tree.children(node) {
        None => vec![(node, &leaves[node][..])],
        Some((left, right)) => leaves[left]
            .iter()
            .map(|&u| (u, &leaves[right][..]))
            .chain(leaves[right].iter().map(|&u| (u, &leaves[left][..])))
            .collect(),
    }
}

/// Summed distance between neighbouring leaves of an ordering.
pub fn path_length(order: &[usize], distances: &DMatrix<f64>) -> f64 {
    order
        .windows(2)
        .map(|pair| distances[(pair[0], pair[1])])
        .sum()
}

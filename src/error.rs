//! Errors raised by network construction, the mde solver and the knn builder.
//!
//! Invalid inputs abort an operation before it mutates any state. A [NetError::NotFinite]
//! is different : it reports a diverging solver and the positions it leaves behind
//! must not be trusted, reinitialize before continuing.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NetError {
    #[error("invalid network : {nb_nodes} nodes, at least 2 required")]
    TooFewNodes { nb_nodes: usize },

    #[error("invalid network : empty edge list")]
    EmptyEdgeList,

    #[error("node {node} out of range, the network has {nb_nodes} nodes")]
    NodeOutOfRange { node: usize, nb_nodes: usize },

    #[error("got {nb_values} values for {nb_nodes} nodes")]
    BadValuesLength { nb_values: usize, nb_nodes: usize },

    #[error("embedding dimension must be at least 1")]
    ZeroDimension,

    #[error("adjacency matrix is not square : ({nb_rows}, {nb_cols})")]
    NotSquare { nb_rows: usize, nb_cols: usize },

    #[error("adjacency matrix is not symmetric at ({row}, {col})")]
    NotSymmetric { row: usize, col: usize },

    #[error("adjacency matrix has a non null diagonal term at node {node}")]
    NonNullDiagonal { node: usize },

    #[error("number of steps must be at least 1")]
    InvalidStepCount,

    #[error("negative sampling fraction must be in (0,1], got {fraction}")]
    InvalidSamplingFraction { fraction: f64 },

    #[error("knn : k = {k} invalid for {nb_points} points, need 1 <= k < nb_points")]
    InvalidK { k: usize, nb_points: usize },

    #[error("positions are not initialized, call random_init first")]
    NotPositioned,

    #[error("positions shape ({nb_rows}, {nb_cols}) does not match network ({nb_nodes}, {dim})")]
    BadPositionsShape {
        nb_rows: usize,
        nb_cols: usize,
        nb_nodes: usize,
        dim: usize,
    },

    #[error("non finite coordinate detected at node {node}")]
    NotFinite { node: usize },

    #[error("no link between nodes {node1} and {node2}")]
    NoSuchEdge { node1: usize, node2: usize },

    #[error("invalid target distance {target} for link ({node1}, {node2}), must be positive")]
    InvalidTarget {
        node1: usize,
        node2: usize,
        target: f64,
    },
}

impl NetError {
    /// true for errors after which the engine state can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(self, NetError::NotFinite { .. })
    }
} // end of impl NetError

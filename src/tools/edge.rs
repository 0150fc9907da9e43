//! just an edge
//!
//! A plain (node1, node2, value) triple. Network construction reads a row as
//! one undirected link, the diagnostic outputs use it as one ordered row.

use num_traits::Float;
use sprs::TriMatI;

/// an edge between node1 and node2 carrying a distance
#[derive(Copy, Clone, Debug)]
pub struct Edge<F>(pub usize, pub usize, pub F);

/// gathers the triplets of a sprs triplet matrix into an edge list
pub fn trimat_to_edges<F>(trimat: &TriMatI<F, usize>) -> Vec<Edge<F>>
where
    F: Float,
{
    let mut edges = Vec::<Edge<F>>::with_capacity(trimat.nnz());
    let mut triplet_iter = trimat.triplet_iter();
    while let Some((value, (row, col))) = triplet_iter.next() {
        edges.push(Edge(row, col, *value));
    }
    edges
} // end of trimat_to_edges

/// packs an edge list into a sprs triplet matrix of shape (nb_nodes, nb_nodes).
/// Endpoints must be below nb_nodes.
pub fn edges_to_trimat<F>(edges: &[Edge<F>], nb_nodes: usize) -> TriMatI<F, usize>
where
    F: Float,
{
    let mut rows = Vec::<usize>::with_capacity(edges.len());
    let mut cols = Vec::<usize>::with_capacity(edges.len());
    let mut values = Vec::<F>::with_capacity(edges.len());
    for edge in edges {
        rows.push(edge.0);
        cols.push(edge.1);
        values.push(edge.2);
    }
    TriMatI::<F, usize>::from_triplets((nb_nodes, nb_nodes), rows, cols, values)
} // end of edges_to_trimat

//========================================================================

#[cfg(test)]
mod tests {

    use super::*;

    #[allow(unused)]
    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_trimat_roundtrip() {
        log_init_test();
        let edges = vec![Edge(0, 1, 0.8f64), Edge(1, 2, 0.5), Edge(2, 3, 1.5)];
        let trimat = edges_to_trimat(&edges, 4);
        assert_eq!(trimat.nnz(), 3);
        assert_eq!(trimat.rows(), 4);
        let back = trimat_to_edges(&trimat);
        assert_eq!(back.len(), edges.len());
        for (got, expected) in back.iter().zip(edges.iter()) {
            assert_eq!(got.0, expected.0);
            assert_eq!(got.1, expected.1);
            assert_eq!(got.2, expected.2);
        }
    } // end of test_trimat_roundtrip
} // end of mod tests

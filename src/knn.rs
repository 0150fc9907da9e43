//! Exhaustive k nearest neighbours construction over a set of points.
//!
//! For each point the k nearest other points are kept in a small candidate
//! buffer, seeded by probing the rows following the query in index order and
//! then refined by a full scan. Points sharing the position of the query are
//! admitted only when fewer than k distinct positions exist around it, with a
//! null distance.
//!
//! The result is an edge list usable by [crate::network::Network::from_edges],
//! each point linked to its k nearest neighbours with the distances as targets.
//! Null distance links coming from admitted duplicates are then skipped at
//! network construction.

use cpu_time::ProcessTime;
use std::time::SystemTime;

use ndarray::Array2;
use num_traits::Float;

use crate::error::NetError;
use crate::tools::dist::euclidean_distance;
use crate::tools::edge::Edge;
use crate::tools::topk::CandidateBuffer;

/// builds the k nearest neighbours of every point, point i described by row i
/// of the array. k must be at least 1 and strictly less than the number of points.
///
/// For each query the k links come out ordered from the kth nearest down to the
/// nearest. A query never appears among its own neighbours.
pub fn knn_build<F>(points: &Array2<F>, k: usize) -> Result<Vec<Edge<F>>, NetError>
where
    F: Float,
{
    let nb_points = points.dim().0;
    if k == 0 || k >= nb_points {
        return Err(NetError::InvalidK { k, nb_points });
    }
    log::info!(
        "knn construction : {} points, dimension {}, k = {}",
        nb_points,
        points.dim().1,
        k
    );
    let cpu_start = ProcessTime::now();
    let sys_start = SystemTime::now();
    //
    let mut edges = Vec::<Edge<F>>::with_capacity(nb_points * k);
    let mut buffer = CandidateBuffer::<F>::new(k);
    for query in 0..nb_points {
        buffer.clear();
        let probes_visited = seed_buffer(points, query, &mut buffer);
        let query_row = points.row(query);
        let query_pos = query_row.as_slice().unwrap();
        for other in 0..nb_points {
            if other == query {
                continue;
            }
            // ring offset of other behind the query. Rows consumed by the
            // seeding probes are already in the buffer, revisiting them would
            // reinsert an equal distance candidate under another slot
            let offset = (other + nb_points - query - 1) % nb_points;
            if offset < probes_visited {
                continue;
            }
            let other_row = points.row(other);
            let dist = euclidean_distance(query_pos, other_row.as_slice().unwrap());
            if dist == F::zero() {
                log::trace!("points {} and {} at the same position, skipped", query, other);
                continue;
            }
            buffer.offer(dist, other);
        }
        // worst to nearest
        for slot in 0..k {
            let index = buffer.get_index(slot);
            assert!(index != query);
            edges.push(Edge(query, index, buffer.get_distance(slot)));
        }
    }
    let sys_t: f64 = sys_start.elapsed().unwrap().as_millis() as f64 / 1000.;
    log::info!(
        " knn construction sys time(s) {:.2e} cpu time(s) {:.2e}",
        sys_t,
        cpu_start.elapsed().as_secs()
    );
    Ok(edges)
} // end of knn_build

// fills the buffer with the first k rows following the query in index order,
// skipping rows sharing the position of the query. Returns the number of ring
// offsets consumed, the full scan must not revisit them.
fn seed_buffer<F>(points: &Array2<F>, query: usize, buffer: &mut CandidateBuffer<F>) -> usize
where
    F: Float,
{
    let nb_points = points.dim().0;
    let query_row = points.row(query);
    let query_pos = query_row.as_slice().unwrap();
    let mut visited = 0;
    while !buffer.is_full() && visited < nb_points - 1 {
        let candidate = (query + visited + 1) % nb_points;
        let candidate_row = points.row(candidate);
        let dist = euclidean_distance(query_pos, candidate_row.as_slice().unwrap());
        if dist > F::zero() {
            buffer.seed(dist, candidate);
        }
        visited += 1;
    }
    if !buffer.is_full() {
        // fewer than k distinct positions around the query, admit the rows
        // sharing its position. k < nb_points guarantees the buffer gets full
        let mut offset = 0;
        while !buffer.is_full() && offset < nb_points - 1 {
            let candidate = (query + offset + 1) % nb_points;
            let candidate_row = points.row(candidate);
            let dist = euclidean_distance(query_pos, candidate_row.as_slice().unwrap());
            if dist == F::zero() {
                log::debug!(
                    "point {} fills its neighbourhood with point {} at the same position",
                    query,
                    candidate
                );
                buffer.seed(dist, candidate);
            }
            offset += 1;
        }
        visited = nb_points - 1;
    }
    visited
} // end of seed_buffer

//========================================================================

#[cfg(test)]
mod tests {

    //    cargo test knn::tests::test_name -- --nocapture
    //    RUST_LOG=netmde::knn=TRACE cargo test test_knn_gaussian_cloud_against_brute_force -- --nocapture

    use super::*;
    use ndarray::arr2;
    use rand::Rng;
    use rand_distr::StandardNormal;
    use rand_xoshiro::rand_core::SeedableRng;
    use rand_xoshiro::Xoshiro256PlusPlus;

    use crate::network::Network;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn check_edges(edges: &[Edge<f64>], expected: &[(usize, usize, f64)]) {
        assert_eq!(edges.len(), expected.len());
        for (edge, expected) in edges.iter().zip(expected.iter()) {
            assert_eq!((edge.0, edge.1, edge.2), *expected);
        }
    }

    #[test]
    fn test_knn_on_a_line() {
        log_init_test();
        let points = arr2(&[[0.0f64], [1.], [2.], [3.], [4.]]);
        let edges = knn_build(&points, 2).unwrap();
        let expected = [
            (0, 2, 2.),
            (0, 1, 1.),
            (1, 0, 1.),
            (1, 2, 1.),
            (2, 1, 1.),
            (2, 3, 1.),
            (3, 2, 1.),
            (3, 4, 1.),
            (4, 2, 2.),
            (4, 3, 1.),
        ];
        check_edges(&edges, &expected);
    } // end of test_knn_on_a_line

    #[test]
    fn test_knn_with_duplicated_positions() {
        log_init_test();
        // points 0 and 1 share a position, they must never be linked together
        // and must get the same neighbourhood
        let points = arr2(&[[0.0f64], [0.], [1.], [2.]]);
        let edges = knn_build(&points, 2).unwrap();
        let expected = [
            (0, 3, 2.),
            (0, 2, 1.),
            (1, 3, 2.),
            (1, 2, 1.),
            (2, 0, 1.),
            (2, 3, 1.),
            (3, 0, 2.),
            (3, 2, 1.),
        ];
        check_edges(&edges, &expected);
    } // end of test_knn_with_duplicated_positions

    #[test]
    fn test_knn_admits_duplicates_when_short_of_positions() {
        log_init_test();
        // only 2 distinct positions for k = 2, duplicates of the query come in
        // with a null distance
        let points = arr2(&[[0.0f64], [0.], [0.], [5.]]);
        let edges = knn_build(&points, 2).unwrap();
        let expected = [
            (0, 3, 5.),
            (0, 1, 0.),
            (1, 3, 5.),
            (1, 2, 0.),
            (2, 3, 5.),
            (2, 0, 0.),
            (3, 1, 5.),
            (3, 0, 5.),
        ];
        check_edges(&edges, &expected);
    } // end of test_knn_admits_duplicates_when_short_of_positions

    #[test]
    fn test_knn_gaussian_cloud_against_brute_force() {
        log_init_test();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(29);
        let nb_points = 40;
        let k = 5;
        let mut points = Array2::<f64>::zeros((nb_points, 3));
        for mut row in points.rows_mut() {
            for coord in row.iter_mut() {
                *coord = rng.sample(StandardNormal);
            }
        }
        let edges = knn_build(&points, k).unwrap();
        assert_eq!(edges.len(), nb_points * k);
        for query in 0..nb_points {
            let mut brute: Vec<(f64, usize)> = (0..nb_points)
                .filter(|&other| other != query)
                .map(|other| {
                    (
                        euclidean_distance(
                            points.row(query).as_slice().unwrap(),
                            points.row(other).as_slice().unwrap(),
                        ),
                        other,
                    )
                })
                .collect();
            brute.sort_by(|a, b| a.partial_cmp(b).unwrap());
            let got = &edges[query * k..(query + 1) * k];
            let mut got_sorted: Vec<(f64, usize)> =
                got.iter().map(|edge| (edge.2, edge.1)).collect();
            got_sorted.sort_by(|a, b| a.partial_cmp(b).unwrap());
            for slot in 0..k {
                assert_eq!(got[slot].0, query);
                assert!(got[slot].1 != query);
                assert_eq!(got_sorted[slot], brute[slot]);
            }
            // emitted from the kth nearest down to the nearest
            for slot in 1..k {
                assert!(got[slot - 1].2 >= got[slot].2);
            }
        }
    } // end of test_knn_gaussian_cloud_against_brute_force

    #[test]
    fn test_knn_invalid_k() {
        log_init_test();
        let points = arr2(&[[0.0f64], [1.], [2.], [3.], [4.]]);
        assert!(matches!(
            knn_build(&points, 0),
            Err(NetError::InvalidK { k: 0, .. })
        ));
        assert!(matches!(
            knn_build(&points, 5),
            Err(NetError::InvalidK { k: 5, .. })
        ));
    } // end of test_knn_invalid_k

    #[test]
    fn test_knn_edges_feed_a_network() {
        log_init_test();
        let points = arr2(&[[0.0f64], [1.], [2.], [3.], [4.]]);
        let edges = knn_build(&points, 2).unwrap();
        // mutual pairs appear twice in the list, the network keeps them once
        let net = Network::<f64>::from_edges(&edges, &[0.; 5], 2).unwrap();
        assert_eq!(net.get_nb_nodes(), 5);
        assert_eq!(net.get_nb_edges(), 12);
        assert_eq!(net.get_node(2).degree(), 4);
    } // end of test_knn_edges_feed_a_network
} // end of mod tests

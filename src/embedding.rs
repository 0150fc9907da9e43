//! Describes the Embedded vectors.
//!
//! Embedded vectors are described by an Array2\<F\> with one row per node, F a
//! floating point type f32 or f64.
//!
//! The mde embedding is symetric : the distance from node1 to node2 is the
//! distance from node2 to node1.

use indexmap::IndexSet;
use ndarray::{Array2, ArrayView1};

/// to represent the distance in embedded space between 2 vectors
type Distance<F> = fn(&[F], &[F]) -> f64;

/// The Embedded trait. It defines the interface satisfied by embedded data.
/// The embedded data are stored in an Array2 and embedded nodes are identified
/// by their rank.
/// F is the type contained in embedded vectors
pub trait EmbeddedT<F> {
    /// returns true if Embedded is symetric
    fn is_symetric(&self) -> bool;
    /// get dimension of vectors of the Embedded
    fn get_dimension(&self) -> usize;
    /// get distance in embedded space between node1 and node2, identified by their rank
    fn get_noderank_distance(&self, node_rank1: usize, node_rank2: usize) -> f64;
    /// the trait provides a function distance between embedded items
    fn get_vec_distance(&self, from: &[F], to: &[F]) -> f64;
    /// get number of nodes
    fn get_nb_nodes(&self) -> usize;
    /// get embedding of node of rank node_rank
    fn get_embedded_node(&self, node_rank: usize) -> ArrayView1<F>;
    /// Returns the distance function (a pointer to) used for computing distances in the embedding.
    fn get_distance(&self) -> fn(&[F], &[F]) -> f64;
} // end of trait

/// represents symetric Embedded data without information on the node indexation
/// To get also the node indexation information use the [Embedding] structure
pub struct Embedded<F> {
    /// array (n,d) with n number of data, d dimension of Embedded
    data: Array2<F>,
    /// distance between vectors in embedded space. helps to implement trait [EmbeddedT\<F\>]
    distance: fn(&[F], &[F]) -> f64,
} // end of Embedded

impl<F> Embedded<F> {
    // fills embedded vectors with the appropriate distance function
    pub(crate) fn new(arr: Array2<F>, distance: Distance<F>) -> Self {
        Embedded {
            data: arr,
            distance: distance,
        }
    }

    /// get representation of nodes as vectors
    pub fn get_embedded(&self) -> &Array2<F> {
        &self.data
    }

    /// get reference to distance function
    pub fn get_distance_ref(&self) -> &fn(&[F], &[F]) -> f64 {
        &self.distance
    }

    /// get embedding of node of rank node_rank
    pub fn get_embedded_node(&self, node_rank: usize) -> ArrayView1<F> {
        self.data.row(node_rank)
    }
} // end of impl Embedded

impl<F> EmbeddedT<F> for Embedded<F> {
    fn is_symetric(&self) -> bool {
        return true;
    }

    /// get dimension of Embedded. (row size of Array)
    fn get_dimension(&self) -> usize {
        self.data.dim().1
    }

    /// computes the distance in embedded space between 2 vectors
    /// dimensions must be equal to Embedded dimension
    fn get_vec_distance(&self, data1: &[F], data2: &[F]) -> f64 {
        assert_eq!(data1.len(), self.get_dimension());
        (self.distance)(data1, data2)
    }

    /// get distance between nodes identified by their rank
    fn get_noderank_distance(&self, node1: usize, node2: usize) -> f64 {
        (self.distance)(
            self.data.row(node1).as_slice().unwrap(),
            self.data.row(node2).as_slice().unwrap(),
        )
    }

    /// return number of nodes
    fn get_nb_nodes(&self) -> usize {
        self.data.dim().0
    }

    /// get embedding of node of rank node_rank
    fn get_embedded_node(&self, node_rank: usize) -> ArrayView1<F> {
        self.data.row(node_rank)
    }

    /// get distance function
    fn get_distance(&self) -> fn(&[F], &[F]) -> f64 {
        self.distance.clone()
    }
} // end impl EmbeddedT<F>

//====================================================================================

/// The trait EmbedderT is something whose method embed has as output something satisfying the trait EmbeddedT\<F\>.
/// F is the type contained in embedded vectors, mostly f64 or f32.
pub trait EmbedderT<F> {
    type Output: EmbeddedT<F>;
    ///
    fn embed(&mut self) -> Result<Self::Output, anyhow::Error>;
} // end of trait EmbedderT<F>

//==============================================================================

/// The structure collecting the result of the embedding process
///
/// - F : the embedded vectors contain values of type F (f32 or f64)
///
/// - NodeId is the type representing nodes in the datafile. It must implement
///     Hash and Eq to be indexed.
///
/// - nodeindexation : an IndexSet storing node identifiers and associating each to a rank in the Array representing embedded nodes.
///                      given a node id we get its rank in Array using IndexSet::get_index_of,
///                      given a rank we get the original node id by using IndexSet::get_index.
pub struct Embedding<F, NodeId: std::hash::Hash + std::cmp::Eq, EmbeddedData: EmbeddedT<F>> {
    /// association of a node id to a rank
    nodeindexation: IndexSet<NodeId>,
    ///
    embedded: EmbeddedData,
    ///
    mark: std::marker::PhantomData<F>,
} // end of Embedding

impl<NodeId, EmbeddedData, F> Embedding<F, NodeId, EmbeddedData>
where
    EmbeddedData: EmbeddedT<F>,
    NodeId: std::hash::Hash + std::cmp::Eq,
{
    /// Creates an embedding of a network given a structure implementing an embedder
    pub fn new(
        nodeindexation: IndexSet<NodeId>,
        embedder: &mut dyn EmbedderT<F, Output = EmbeddedData>,
    ) -> Result<Self, anyhow::Error> {
        let embedded_res = embedder.embed();
        if embedded_res.is_err() {
            log::error!("embedding failed");
            return Err(embedded_res.err().unwrap());
        } else {
            return Ok(Embedding {
                nodeindexation,
                embedded: embedded_res.unwrap(),
                mark: std::marker::PhantomData,
            });
        }
    } // end of new

    /// to retrieve the indexation
    pub fn get_node_indexation(&self) -> &IndexSet<NodeId> {
        return &self.nodeindexation;
    } // end of get_node_indexation

    /// retrieves the embedded data
    pub fn get_embedded_data(&self) -> &EmbeddedData {
        return &self.embedded;
    } // end of get_embedded_data

    /// get distance between nodes, given their original node id
    pub fn get_node_distance(&self, node1: NodeId, node2: NodeId) -> f64 {
        let rank1 = self.nodeindexation.get_index_of(&node1).unwrap();
        let rank2 = self.nodeindexation.get_index_of(&node2).unwrap();
        self.embedded.get_noderank_distance(rank1, rank2)
    } // end of get_node_distance

    /// get rank of a node id
    pub fn get_node_rank(&self, node_id: NodeId) -> Option<usize> {
        self.nodeindexation.get_index_of(&node_id)
    }

    /// get node id given its rank in the indexation (and matrix representation)
    pub fn get_node_id(&self, rank: usize) -> Option<&NodeId> {
        self.nodeindexation.get_index(rank)
    }
} // end of impl Embedding

//==============================================================================

#[cfg(test)]
mod tests {

    use super::*;

    use crate::embedder::{MdeEmbedder, MdeParams};
    use crate::network::Network;

    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_embedding_with_labeled_nodes() {
        log_init_test();
        let edges = vec![("a", "b", 1.0f64), ("b", "c", 1.0), ("c", "a", 1.0)];
        let (net, nodeindexation) = Network::<f64>::from_labeled_edges(&edges, 2).unwrap();
        let params = MdeParams::new(0.1, 0., 500);
        let mut embedder = MdeEmbedder::new(net, params);
        embedder.set_seed(7);
        let embedding = Embedding::new(nodeindexation, &mut embedder).unwrap();
        assert!(embedding.get_embedded_data().is_symetric());
        assert_eq!(embedding.get_embedded_data().get_nb_nodes(), 3);
        assert_eq!(embedding.get_embedded_data().get_dimension(), 2);
        assert_eq!(embedding.get_node_rank("b"), Some(1));
        assert_eq!(embedding.get_node_id(2), Some(&"c"));
        // a triangle with unit targets is realizable in dimension 2
        let dist = embedding.get_node_distance("a", "b");
        assert!((dist - 1.).abs() < 0.05, "dist : {:.3e}", dist);
    } // end of test_embedding_with_labeled_nodes
} // end of mod tests

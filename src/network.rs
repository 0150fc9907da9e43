//! A network of valued nodes with target distances on its links.
//!
//! Nodes carry dense labels in 0..nb_nodes, a scalar value, their adjacency as
//! parallel arrays of neighbour label and target distance, and their position in
//! the embedding space. The adjacency is symmetric : inserting an undirected link
//! writes both directions with the same target distance, so the edge count below
//! is a count of directed half links, twice the number of undirected links.
//!
//! Rows violating the adjacency invariants (non positive distance, self loop,
//! duplicate link) are skipped with a warning, they never abort a construction.

use indexmap::IndexSet;
use ndarray::Array2;
use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Uniform};
use rand_xoshiro::Xoshiro256PlusPlus;
use sprs::TriMatI;

use crate::error::NetError;
use crate::tools::dist::{all_finite, euclidean_distance};
use crate::tools::edge::{trimat_to_edges, Edge};

/// A node of the network.
/// The neighbour and target arrays are parallel : the link to neighbours[rank]
/// has target distance targets[rank]. The position is empty until the first
/// initialization by the solver.
#[derive(Debug, Clone)]
pub struct Node<F> {
    /// dense label, also the index of the node in the network
    label: usize,
    /// scalar value carried by the node. The solver does not use it
    value: F,
    /// labels of the neighbours
    neighbours: Vec<usize>,
    /// target distance to each neighbour
    targets: Vec<F>,
    /// position in the embedding space
    position: Vec<F>,
} // end of struct Node

impl<F> Node<F>
where
    F: Float,
{
    pub(crate) fn new(label: usize, value: F) -> Self {
        Node {
            label,
            value,
            neighbours: Vec::new(),
            targets: Vec::new(),
            position: Vec::new(),
        }
    }

    ///
    pub fn get_label(&self) -> usize {
        self.label
    }

    ///
    pub fn get_value(&self) -> F {
        self.value
    }

    /// number of neighbours
    pub fn degree(&self) -> usize {
        self.neighbours.len()
    }

    ///
    pub fn get_neighbours(&self) -> &[usize] {
        &self.neighbours
    }

    /// target distances, parallel to [Self::get_neighbours]
    pub fn get_targets(&self) -> &[F] {
        &self.targets
    }

    ///
    pub fn get_position(&self) -> &[F] {
        &self.position
    }

    /// rank of a neighbour in the adjacency arrays, None if the nodes are not linked
    pub fn neighbour_rank(&self, neighbour: usize) -> Option<usize> {
        for (rank, &label) in self.neighbours.iter().enumerate() {
            if label == neighbour {
                return Some(rank);
            }
        }
        return None;
    } // end of neighbour_rank

    // amortized growth, the adjacency is never preallocated to nb_nodes
    pub(crate) fn add_neighbour(&mut self, neighbour: usize, target: F) {
        self.neighbours.push(neighbour);
        self.targets.push(target);
    }

    pub(crate) fn set_target_at(&mut self, rank: usize, target: F) {
        self.targets[rank] = target;
    }

    pub(crate) fn set_position(&mut self, position: Vec<F>) {
        self.position = position;
    }

    pub(crate) fn position_mut(&mut self) -> &mut [F] {
        &mut self.position
    }
} // end of impl Node

//========================================================================

/// The network : nodes, their links and the embedding dimension.
#[derive(Debug, Clone)]
pub struct Network<F> {
    /// nodes indexed by label
    nodes: Vec<Node<F>>,
    /// number of directed half links really inserted
    nb_edges: usize,
    /// dimension of the embedding space, fixed at construction
    dim: usize,
} // end of struct Network

impl<F> Network<F>
where
    F: Float + FromPrimitive,
{
    /// builds the network from an edge list, one row per undirected link, and one
    /// value per node. The node count is the length of the values slice.
    /// Rows naming an unknown node are rejected before anything is built, rows
    /// violating the adjacency invariants are skipped with a warning.
    pub fn from_edges(edges: &[Edge<F>], values: &[F], dim: usize) -> Result<Self, NetError> {
        if values.len() < 2 {
            return Err(NetError::TooFewNodes {
                nb_nodes: values.len(),
            });
        }
        if edges.is_empty() {
            return Err(NetError::EmptyEdgeList);
        }
        if dim == 0 {
            return Err(NetError::ZeroDimension);
        }
        let nb_nodes = values.len();
        for edge in edges {
            if edge.0 >= nb_nodes {
                return Err(NetError::NodeOutOfRange {
                    node: edge.0,
                    nb_nodes,
                });
            }
            if edge.1 >= nb_nodes {
                return Err(NetError::NodeOutOfRange {
                    node: edge.1,
                    nb_nodes,
                });
            }
        }
        let nodes = (0..nb_nodes)
            .map(|label| Node::new(label, values[label]))
            .collect();
        let mut net = Network {
            nodes,
            nb_edges: 0,
            dim,
        };
        for edge in edges {
            net.insert_edge(edge.0, edge.1, edge.2);
        }
        log::info!(
            "network built : {} nodes, {} links, density = {:.1}%",
            net.get_nb_nodes(),
            net.nb_edges / 2,
            100. * net.nb_edges as f64 / (nb_nodes * (nb_nodes - 1)) as f64
        );
        Ok(net)
    } // end of from_edges

    /// builds the network from a sprs triplet matrix, one triplet per undirected link
    pub fn from_trimat(
        trimat: &TriMatI<F, usize>,
        values: &[F],
        dim: usize,
    ) -> Result<Self, NetError> {
        if trimat.rows() != trimat.cols() {
            return Err(NetError::NotSquare {
                nb_rows: trimat.rows(),
                nb_cols: trimat.cols(),
            });
        }
        if values.len() != trimat.rows() {
            return Err(NetError::BadValuesLength {
                nb_values: values.len(),
                nb_nodes: trimat.rows(),
            });
        }
        let edges = trimat_to_edges(trimat);
        Network::from_edges(&edges, values, dim)
    } // end of from_trimat

    /// builds the network from a full adjacency matrix.
    /// The matrix must be square, symmetric and with a null diagonal. A null term
    /// means no link, any other term is the target distance of the link.
    pub fn from_adjacency(mat: &Array2<F>, values: &[F], dim: usize) -> Result<Self, NetError> {
        let (nb_rows, nb_cols) = mat.dim();
        if nb_rows != nb_cols {
            return Err(NetError::NotSquare { nb_rows, nb_cols });
        }
        // exact comparison, the matrix must be built symmetric not recomputed symmetric
        for i in 0..nb_rows {
            if mat[[i, i]] != F::zero() {
                return Err(NetError::NonNullDiagonal { node: i });
            }
            for j in (i + 1)..nb_cols {
                if mat[[i, j]] != mat[[j, i]] {
                    return Err(NetError::NotSymmetric { row: i, col: j });
                }
            }
        }
        let mut edges = Vec::<Edge<F>>::new();
        for i in 0..nb_rows {
            for j in (i + 1)..nb_cols {
                if mat[[i, j]] != F::zero() {
                    edges.push(Edge(i, j, mat[[i, j]]));
                }
            }
        }
        if edges.is_empty() {
            return Err(NetError::EmptyEdgeList);
        }
        Network::from_edges(&edges, values, dim)
    } // end of from_adjacency

    /// builds a network from links between arbitrarily labeled nodes.
    /// Ranks follow the order of first appearance in the edge list. Node values
    /// are set to zero, use [Self::set_values] afterwards if needed.
    /// Returns the network and the indexation from label to rank.
    pub fn from_labeled_edges<NodeId>(
        edges: &[(NodeId, NodeId, F)],
        dim: usize,
    ) -> Result<(Self, IndexSet<NodeId>), NetError>
    where
        NodeId: std::hash::Hash + std::cmp::Eq + Clone,
    {
        let mut nodeindexation = IndexSet::<NodeId>::with_capacity(edges.len());
        let mut ranked = Vec::<Edge<F>>::with_capacity(edges.len());
        for (node1, node2, target) in edges {
            let (rank1, _) = nodeindexation.insert_full(node1.clone());
            let (rank2, _) = nodeindexation.insert_full(node2.clone());
            ranked.push(Edge(rank1, rank2, *target));
        }
        let values = vec![F::zero(); nodeindexation.len()];
        let net = Network::from_edges(&ranked, &values, dim)?;
        Ok((net, nodeindexation))
    } // end of from_labeled_edges

    /// random network generation.
    /// A symmetrized uniform matrix is drawn, a link is kept where its term falls
    /// strictly below connection_probability, with the term scaled by max_dist as
    /// target distance. Node values are uniform draws in \[0,1).
    /// Fails with an empty edge list when no draw fell below the threshold.
    pub fn random(
        nb_nodes: usize,
        connection_probability: f64,
        max_dist: f64,
        dim: usize,
        rng: &mut Xoshiro256PlusPlus,
    ) -> Result<Self, NetError> {
        let uniform = Uniform::<f64>::new(0., 1.);
        let mut edges = Vec::<Edge<F>>::new();
        for i in 0..nb_nodes {
            for j in (i + 1)..nb_nodes {
                // the mean of two uniform draws, a triangle distribution on [0,1)
                let m = 0.5 * (uniform.sample(rng) + uniform.sample(rng));
                if m < connection_probability {
                    edges.push(Edge(i, j, F::from_f64(m * max_dist).unwrap()));
                }
            }
        }
        let values: Vec<F> = (0..nb_nodes)
            .map(|_| F::from_f64(uniform.sample(rng)).unwrap())
            .collect();
        Network::from_edges(&edges, &values, dim)
    } // end of random

    // inserts both directions of an undirected link, skipping rows violating the
    // adjacency invariants. Returns true if the link was inserted.
    fn insert_edge(&mut self, node1: usize, node2: usize, target: F) -> bool {
        if target <= F::zero() {
            log::warn!(
                "link ({}, {}) skipped, distance must be positive : {:.3e}",
                node1,
                node2,
                target.to_f64().unwrap()
            );
            return false;
        }
        if node1 == node2 {
            log::warn!("link ({}, {}) skipped, self loops are not allowed", node1, node2);
            return false;
        }
        if self.nodes[node1].neighbour_rank(node2).is_some() {
            log::warn!(
                "link ({}, {}) skipped, duplicate of an existing link",
                node1,
                node2
            );
            return false;
        }
        self.nodes[node1].add_neighbour(node2, target);
        self.nodes[node2].add_neighbour(node1, target);
        self.nb_edges += 2;
        return true;
    } // end of insert_edge

    ///
    pub fn get_nb_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// number of directed half links, twice the number of undirected links
    pub fn get_nb_edges(&self) -> usize {
        self.nb_edges
    }

    /// dimension of the embedding space
    pub fn get_dimension(&self) -> usize {
        self.dim
    }

    ///
    pub fn get_node(&self, label: usize) -> &Node<F> {
        &self.nodes[label]
    }

    pub(crate) fn get_node_mut(&mut self, label: usize) -> &mut Node<F> {
        &mut self.nodes[label]
    }

    ///
    pub fn get_values(&self) -> Vec<F> {
        self.nodes.iter().map(|node| node.value).collect()
    }

    /// one value per node
    pub fn set_values(&mut self, values: &[F]) -> Result<(), NetError> {
        if values.len() != self.nodes.len() {
            return Err(NetError::BadValuesLength {
                nb_values: values.len(),
                nb_nodes: self.nodes.len(),
            });
        }
        for (node, value) in self.nodes.iter_mut().zip(values.iter()) {
            node.value = *value;
        }
        Ok(())
    } // end of set_values

    /// true when the undirected link (node1, node2) is present
    pub fn is_linked(&self, node1: usize, node2: usize) -> bool {
        self.get_target(node1, node2).is_some()
    }

    /// stored target distance of the link (node1, node2), None if the nodes are not linked
    pub fn get_target(&self, node1: usize, node2: usize) -> Option<F> {
        if node1 >= self.nodes.len() {
            return None;
        }
        self.nodes[node1]
            .neighbour_rank(node2)
            .map(|rank| self.nodes[node1].targets[rank])
    } // end of get_target

    /// overwrites the target distance of links already present, in both directions.
    /// The whole batch is validated first : on error nothing has been modified.
    pub fn set_targets(&mut self, edges: &[Edge<F>]) -> Result<(), NetError> {
        let nb_nodes = self.nodes.len();
        for edge in edges {
            if edge.0 >= nb_nodes {
                return Err(NetError::NodeOutOfRange {
                    node: edge.0,
                    nb_nodes,
                });
            }
            if edge.1 >= nb_nodes {
                return Err(NetError::NodeOutOfRange {
                    node: edge.1,
                    nb_nodes,
                });
            }
            if self.nodes[edge.0].neighbour_rank(edge.1).is_none() {
                return Err(NetError::NoSuchEdge {
                    node1: edge.0,
                    node2: edge.1,
                });
            }
            if edge.2 <= F::zero() {
                return Err(NetError::InvalidTarget {
                    node1: edge.0,
                    node2: edge.1,
                    target: edge.2.to_f64().unwrap(),
                });
            }
        }
        for edge in edges {
            // both directions exist, the adjacency is symmetric
            let rank1 = self.nodes[edge.0].neighbour_rank(edge.1).unwrap();
            self.nodes[edge.0].set_target_at(rank1, edge.2);
            let rank2 = self.nodes[edge.1].neighbour_rank(edge.0).unwrap();
            self.nodes[edge.1].set_target_at(rank2, edge.2);
        }
        Ok(())
    } // end of set_targets

    /// true when every node has a position of the network dimension
    pub fn is_positioned(&self) -> bool {
        self.nodes.iter().all(|node| node.position.len() == self.dim)
    }

    /// scans every coordinate of every node, reports the first corrupted node
    pub fn check_finite(&self) -> Result<(), NetError> {
        for node in &self.nodes {
            if !all_finite(&node.position) {
                log::error!("non finite coordinate at node {}", node.label);
                return Err(NetError::NotFinite { node: node.label });
            }
        }
        Ok(())
    } // end of check_finite

    /// per link relative distortion squashed through tanh, in \[-1, 1\].
    /// Negative means the link is shorter in the embedding than its target,
    /// positive longer. One entry per undirected link, with node1 < node2.
    pub fn get_edge_activations(&self) -> Result<Vec<Edge<F>>, NetError> {
        if !self.is_positioned() {
            return Err(NetError::NotPositioned);
        }
        let mut activations = Vec::<Edge<F>>::with_capacity(self.nb_edges / 2);
        for node in &self.nodes {
            for (rank, &neighbour) in node.neighbours.iter().enumerate() {
                if neighbour > node.label {
                    let actual = euclidean_distance(
                        node.get_position(),
                        self.nodes[neighbour].get_position(),
                    );
                    let target = node.targets[rank];
                    activations.push(Edge(
                        node.label,
                        neighbour,
                        ((actual - target) / target).tanh(),
                    ));
                }
            }
        }
        Ok(activations)
    } // end of get_edge_activations
} // end of impl Network

//========================================================================

// end of mod tests

//! Implementation of the mde embedder.
//!
//! The embedder iteratively moves node positions so that the distance between two
//! linked nodes converges to the target distance carried by their link, with an
//! optional repulsion from sampled non neighbours to spread the unlinked part of
//! the network.
//!
//! The expected workflow is [MdeEmbedder::random_init] followed by one or more
//! calls to [MdeEmbedder::step], or just [MdeEmbedder::compute_embedded] which
//! chains both with the parameters given at creation.

use anyhow::anyhow;

use cpu_time::ProcessTime;
use std::time::SystemTime;

use ndarray::Array2;
use num_traits::{Float, FromPrimitive};
use rand::distributions::{Distribution, Uniform};
use rand::Rng;
use rand_xoshiro::rand_core::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::embedding::{Embedded, EmbedderT};
use crate::error::NetError;
use crate::network::Network;
use crate::tools::dist::{all_finite, euclidean_distance, euclidean_distance_f64};
use crate::tools::edge::Edge;

/// default fraction of the nodes sampled for repulsion, for each node at each iteration
const NEGATIVE_SAMPLING_FRACTION: f64 = 0.1;

/// Iteration parameters of the embedder.
#[derive(Debug, Copy, Clone)]
pub struct MdeParams {
    /// attraction step size
    pub eps: f64,
    /// repulsion step size. A null value disables negative sampling
    pub neg_eps: f64,
    /// number of iterations over the whole network
    pub nb_steps: usize,
} // end of MdeParams

impl MdeParams {
    #[cfg_attr(doc, katexit::katexit)]
    ///
    /// One attraction update of node $v$ toward its neighbour $u$ with target distance $t$ moves $v$ in place :
    /// $$ pos(v) \mathrel{+}= \epsilon \cdot \frac{1 - t/d(u,v)}{degree(v)} \cdot (pos(u) - pos(v)) $$
    /// A repulsion update from a sampled non neighbour $w$ pushes each coordinate of $v$ away :
    /// $$ pos(v) \mathrel{+}= \frac{\epsilon_{neg}}{d(v,w)^{2}} \cdot (pos(v) - pos(w)) $$
    /// Both step sizes must be chosen small with respect to the target distances.
    /// Successive calls to [MdeEmbedder::step] with decreasing eps give an annealing effect.
    pub fn new(eps: f64, neg_eps: f64, nb_steps: usize) -> Self {
        MdeParams {
            eps,
            neg_eps,
            nb_steps,
        }
    }

    //
    pub fn get_eps(&self) -> f64 {
        self.eps
    }

    //
    pub fn get_neg_eps(&self) -> f64 {
        self.neg_eps
    }

    //
    pub fn get_nb_steps(&self) -> usize {
        self.nb_steps
    }
} // end of MdeParams

//========================================================================

/// The mde embedder. It owns the network and the random generator used for
/// position initialization and negative sampling.
pub struct MdeEmbedder<F> {
    /// the network to embed
    net: Network<F>,
    /// iteration parameters used by [Self::compute_embedded]
    params: MdeParams,
    /// fraction of the nodes sampled for repulsion, in \]0., 1.\]
    negative_sampling_fraction: f64,
    /// seed of the generator, None means entropy seeding
    seed: Option<u64>,
    ///
    rng: Xoshiro256PlusPlus,
} // end of struct MdeEmbedder

impl<F> MdeEmbedder<F>
where
    F: Float + FromPrimitive,
{
    pub fn new(net: Network<F>, params: MdeParams) -> Self {
        MdeEmbedder {
            net,
            params,
            negative_sampling_fraction: NEGATIVE_SAMPLING_FRACTION,
            seed: None,
            rng: Xoshiro256PlusPlus::from_entropy(),
        }
    }

    /// access to the embedded network
    pub fn get_net(&self) -> &Network<F> {
        &self.net
    }

    //
    pub fn get_params(&self) -> &MdeParams {
        &self.params
    }

    //
    pub fn get_negative_sampling_fraction(&self) -> f64 {
        self.negative_sampling_fraction
    }

    /// swaps the embedded network, returning the previous one.
    /// The new network keeps the positions it carries, nothing is reinitialized.
    pub fn replace_net(&mut self, net: Network<F>) -> Network<F> {
        std::mem::replace(&mut self.net, net)
    }

    /// fixes the seed of the random generator to get reproducible runs.
    /// The generator is reseeded at each [Self::random_init] call, so two
    /// initializations from the same seed give the same positions and the
    /// same negative sampling stream.
    pub fn set_seed(&mut self, seed: u64) {
        self.seed = Some(seed);
        self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    }

    /// the fraction of the nodes sampled for repulsion, for each node at each iteration.
    /// Must be in \]0., 1.\]
    pub fn set_negative_sampling_fraction(&mut self, fraction: f64) -> Result<(), NetError> {
        if !(fraction > 0. && fraction <= 1.) {
            return Err(NetError::InvalidSamplingFraction { fraction });
        }
        self.negative_sampling_fraction = fraction;
        Ok(())
    }

    /// draws every coordinate of every node uniformly in \[0., 1.)
    pub fn random_init(&mut self) {
        if let Some(seed) = self.seed {
            self.rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        }
        let dim = self.net.get_dimension();
        let uniform = Uniform::<f64>::new(0., 1.);
        for node in 0..self.net.get_nb_nodes() {
            let position: Vec<F> = (0..dim)
                .map(|_| F::from_f64(uniform.sample(&mut self.rng)).unwrap())
                .collect();
            self.net.get_node_mut(node).set_position(position);
        }
        log::debug!(
            "random initialization of {} positions in dimension {}",
            self.net.get_nb_nodes(),
            dim
        );
    } // end of random_init

    /// runs nb_steps iterations over the whole network.
    /// Positions must have been initialized before, by [Self::random_init] or
    /// [Self::set_positions]. A non finite coordinate, preexisting or produced
    /// by an update, aborts with [NetError::NotFinite].
    pub fn step(&mut self, params: &MdeParams) -> Result<(), NetError> {
        if params.nb_steps == 0 {
            return Err(NetError::InvalidStepCount);
        }
        if !self.net.is_positioned() {
            return Err(NetError::NotPositioned);
        }
        self.net.check_finite()?;
        //
        let nb_nodes = self.net.get_nb_nodes();
        let nb_negative = (self.negative_sampling_fraction * nb_nodes as f64).round() as usize;
        log::info!(
            "mde iterations : nb_steps {}, eps {:.3e}, neg_eps {:.3e}, negative samples per node {}",
            params.nb_steps,
            params.eps,
            params.neg_eps,
            nb_negative
        );
        let cpu_start = ProcessTime::now();
        let sys_start = SystemTime::now();
        // scratch for a neighbour position, avoids reallocating inside the loops
        let mut other_pos: Vec<F> = vec![F::zero(); self.net.get_dimension()];
        for _ in 0..params.nb_steps {
            for node in 0..nb_nodes {
                self.attract_to_neighbours(node, params.eps, &mut other_pos)?;
                if params.neg_eps != 0. {
                    for _ in 0..nb_negative {
                        self.repel_from_random_non_neighbour(node, params.neg_eps, &mut other_pos)?;
                    }
                }
            }
        }
        let sys_t: f64 = sys_start.elapsed().unwrap().as_millis() as f64 / 1000.;
        log::info!(
            " mde iterations sys time(s) {:.2e} cpu time(s) {:.2e}",
            sys_t,
            cpu_start.elapsed().as_secs()
        );
        Ok(())
    } // end of step

    // one attraction pass of a node toward each of its neighbours.
    // The position moves in place, so the update for a neighbour later in the
    // pass sees the position already moved by the preceding ones.
    fn attract_to_neighbours(
        &mut self,
        node: usize,
        eps: f64,
        other_pos: &mut [F],
    ) -> Result<(), NetError> {
        let degree = self.net.get_node(node).degree();
        if degree == 0 {
            return Ok(());
        }
        let eps_f = F::from_f64(eps).unwrap();
        let degree_f = F::from_usize(degree).unwrap();
        for rank in 0..degree {
            let neighbour = self.net.get_node(node).get_neighbours()[rank];
            let target = self.net.get_node(node).get_targets()[rank];
            other_pos.copy_from_slice(self.net.get_node(neighbour).get_position());
            let actual = euclidean_distance(self.net.get_node(node).get_position(), other_pos);
            if actual == F::zero() {
                log::warn!(
                    "nodes {} and {} at the same position, attraction update skipped",
                    node,
                    neighbour
                );
                continue;
            }
            let factor = eps_f * (F::one() - target / actual) / degree_f;
            let position = self.net.get_node_mut(node).position_mut();
            for (coord, &other) in position.iter_mut().zip(other_pos.iter()) {
                *coord = *coord + factor * (other - *coord);
            }
            if !all_finite(position) {
                log::error!(
                    "non finite coordinate at node {} after attraction to {}",
                    node,
                    neighbour
                );
                return Err(NetError::NotFinite { node });
            }
        }
        Ok(())
    } // end of attract_to_neighbours

    // repels a node from one randomly drawn non neighbour.
    // The draw is bounded by nb_nodes attempts, on a dense network a valid
    // candidate may not come out and the update is just skipped.
    fn repel_from_random_non_neighbour(
        &mut self,
        node: usize,
        neg_eps: f64,
        other_pos: &mut [F],
    ) -> Result<(), NetError> {
        let nb_nodes = self.net.get_nb_nodes();
        let mut nb_draws = 0;
        let other = loop {
            if nb_draws >= nb_nodes {
                log::debug!(
                    "no non neighbour found for node {} after {} draws",
                    node,
                    nb_draws
                );
                return Ok(());
            }
            let candidate = self.rng.gen_range(0..nb_nodes);
            nb_draws += 1;
            if candidate != node && self.net.get_node(node).neighbour_rank(candidate).is_none() {
                break candidate;
            }
        };
        other_pos.copy_from_slice(self.net.get_node(other).get_position());
        let dist = euclidean_distance(self.net.get_node(node).get_position(), other_pos);
        // a null distance gives an infinite coefficient, caught just below
        let coeff = F::from_f64(neg_eps).unwrap() / (dist * dist);
        let position = self.net.get_node_mut(node).position_mut();
        for (coord, &other_coord) in position.iter_mut().zip(other_pos.iter()) {
            *coord = *coord + coeff * (*coord - other_coord);
        }
        if !all_finite(position) {
            log::error!(
                "non finite coordinate at node {} after repulsion from {}",
                node,
                other
            );
            return Err(NetError::NotFinite { node });
        }
        Ok(())
    } // end of repel_from_random_non_neighbour

    /// sets all the positions from an array with one row per node.
    /// Fails if the shape does not match the network or a coordinate is not
    /// finite, in which case nothing has been modified.
    pub fn set_positions(&mut self, positions: &Array2<F>) -> Result<(), NetError> {
        let (nb_rows, nb_cols) = positions.dim();
        if nb_rows != self.net.get_nb_nodes() || nb_cols != self.net.get_dimension() {
            return Err(NetError::BadPositionsShape {
                nb_rows,
                nb_cols,
                nb_nodes: self.net.get_nb_nodes(),
                dim: self.net.get_dimension(),
            });
        }
        for (node, row) in positions.rows().into_iter().enumerate() {
            if row.iter().any(|coord| !coord.is_finite()) {
                return Err(NetError::NotFinite { node });
            }
        }
        for (node, row) in positions.rows().into_iter().enumerate() {
            self.net.get_node_mut(node).set_position(row.to_vec());
        }
        Ok(())
    } // end of set_positions

    /// returns the current positions as an array with one row per node.
    /// Fails if the network is not positioned or a coordinate is not finite.
    pub fn get_positions(&self) -> Result<Array2<F>, NetError> {
        if !self.net.is_positioned() {
            return Err(NetError::NotPositioned);
        }
        self.net.check_finite()?;
        let nb_nodes = self.net.get_nb_nodes();
        let dim = self.net.get_dimension();
        let mut positions = Array2::<F>::zeros((nb_nodes, dim));
        for (node, mut row) in positions.rows_mut().into_iter().enumerate() {
            for (coord, &value) in row.iter_mut().zip(self.net.get_node(node).get_position()) {
                *coord = value;
            }
        }
        Ok(positions)
    } // end of get_positions

    /// mean squared deviation between actual and target distances, summed over
    /// the directed half links and divided by the number of nodes
    pub fn get_distortion(&self) -> Result<f64, NetError> {
        if !self.net.is_positioned() {
            return Err(NetError::NotPositioned);
        }
        let mut distortion = 0.;
        for node in 0..self.net.get_nb_nodes() {
            let node_ref = self.net.get_node(node);
            for (rank, &neighbour) in node_ref.get_neighbours().iter().enumerate() {
                let actual = euclidean_distance_f64(
                    node_ref.get_position(),
                    self.net.get_node(neighbour).get_position(),
                );
                let target = node_ref.get_targets()[rank].to_f64().unwrap();
                distortion += (actual - target) * (actual - target);
            }
        }
        Ok(distortion / self.net.get_nb_nodes() as f64)
    } // end of get_distortion

    /// full symmetric matrix of the pairwise distances between node positions
    pub fn get_distance_matrix(&self) -> Result<Array2<F>, NetError> {
        if !self.net.is_positioned() {
            return Err(NetError::NotPositioned);
        }
        let nb_nodes = self.net.get_nb_nodes();
        let mut distances = Array2::<F>::zeros((nb_nodes, nb_nodes));
        for i in 0..nb_nodes {
            for j in i..nb_nodes {
                let dist = euclidean_distance(
                    self.net.get_node(i).get_position(),
                    self.net.get_node(j).get_position(),
                );
                distances[[i, j]] = dist;
                distances[[j, i]] = dist;
            }
        }
        Ok(distances)
    } // end of get_distance_matrix

    /// pairwise distances between node positions as a list of triplets, over
    /// all the ordered pairs, diagonal included
    pub fn get_distance_list(&self) -> Result<Vec<Edge<F>>, NetError> {
        if !self.net.is_positioned() {
            return Err(NetError::NotPositioned);
        }
        let nb_nodes = self.net.get_nb_nodes();
        let mut distances = Vec::<Edge<F>>::with_capacity(nb_nodes * nb_nodes);
        for i in 0..nb_nodes {
            for j in 0..nb_nodes {
                distances.push(Edge(
                    i,
                    j,
                    euclidean_distance(
                        self.net.get_node(i).get_position(),
                        self.net.get_node(j).get_position(),
                    ),
                ));
            }
        }
        Ok(distances)
    } // end of get_distance_list

    /// see [Network::get_edge_activations]
    pub fn get_edge_activations(&self) -> Result<Vec<Edge<F>>, NetError> {
        self.net.get_edge_activations()
    }

    /// overwrites the target distance of links already present, see [Network::set_targets]
    pub fn retarget(&mut self, edges: &[Edge<F>]) -> Result<(), NetError> {
        self.net.set_targets(edges)
    }

    /// runs the full embedding : random initialization if the network is not
    /// yet positioned, then the iterations with the parameters given at creation
    pub fn compute_embedded(&mut self) -> Result<Embedded<F>, NetError> {
        if !self.net.is_positioned() {
            self.random_init();
        }
        let params = self.params;
        self.step(&params)?;
        let positions = self.get_positions()?;
        Ok(Embedded::new(positions, euclidean_distance_f64::<F>))
    } // end of compute_embedded
} // end of impl MdeEmbedder

impl<F> EmbedderT<F> for MdeEmbedder<F>
where
    F: Float + FromPrimitive,
{
    type Output = Embedded<F>;
    ///
    fn embed(&mut self) -> Result<Embedded<F>, anyhow::Error> {
        let res = self.compute_embedded();
        match res {
            Ok(embedded) => {
                return Ok(embedded);
            }
            Err(err) => {
                log::error!("mde embedding failed : {}", err);
                return Err(anyhow!(err));
            }
        }
    } // end of embed
} // end of impl EmbedderT

//========================================================================

// end of mod tests

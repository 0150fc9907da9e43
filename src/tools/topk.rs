//! Maintenance of the k best (smallest distance) candidates seen so far.
//!
//! The buffer keeps (distance, index) pairs sorted by decreasing distance :
//! slot 0 holds the worst candidate still kept, slot k-1 the nearest one.
//! Insertions shift the intermediate slots toward slot 0 with a bounded loop
//! and evict the previous worst.

use num_traits::Float;

/// A fixed capacity buffer of (distance, index) candidate pairs sorted by
/// decreasing distance. The knn builder uses one instance per query point.
pub struct CandidateBuffer<F> {
    /// distances in decreasing order. distances[0] is the worst candidate kept
    distances: Vec<F>,
    /// index of the candidate stored in each slot, parallel to distances
    indexes: Vec<usize>,
    /// number of slots when full
    capacity: usize,
} // end of struct CandidateBuffer

impl<F> CandidateBuffer<F>
where
    F: Float,
{
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0);
        CandidateBuffer {
            distances: Vec::with_capacity(capacity),
            indexes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// empties the buffer keeping its capacity. Called between two query points.
    pub fn clear(&mut self) {
        self.distances.clear();
        self.indexes.clear();
    }

    ///
    pub fn is_full(&self) -> bool {
        self.distances.len() == self.capacity
    }

    /// worst (largest) distance still kept. Only meaningful on a full buffer.
    pub fn get_worst(&self) -> F {
        self.distances[0]
    }

    ///
    pub fn get_distance(&self, slot: usize) -> F {
        self.distances[slot]
    }

    ///
    pub fn get_index(&self, slot: usize) -> usize {
        self.indexes[slot]
    }

    /// sorted insertion during the filling phase, the buffer grows by one slot.
    /// An equal distance candidate goes above the ones already kept, so an
    /// earlier candidate stays nearer the good end and survives evictions longer.
    pub fn seed(&mut self, distance: F, index: usize) {
        debug_assert!(!self.is_full());
        let slot = self.distances.partition_point(|&d| d > distance);
        self.distances.insert(slot, distance);
        self.indexes.insert(slot, index);
    } // end of seed

    /// insertion during the scan phase, on a full buffer.
    /// A candidate enters only with a distance strictly smaller than the current
    /// worst. It lands at the deepest slot whose distance still exceeds its own
    /// and must not carry the index already stored there. The slots above the
    /// landing point shift toward slot 0, the previous worst is evicted.
    /// Returns true if the candidate was inserted.
    pub fn offer(&mut self, distance: F, index: usize) -> bool {
        debug_assert!(self.is_full());
        if !(distance < self.distances[0]) {
            return false;
        }
        let mut slot = 0;
        let mut probe = 1;
        while probe < self.capacity && self.distances[probe] > distance {
            slot = probe;
            probe += 1;
        }
        if self.indexes[slot] == index {
            return false;
        }
        for s in 0..slot {
            self.distances[s] = self.distances[s + 1];
            self.indexes[s] = self.indexes[s + 1];
        }
        self.distances[slot] = distance;
        self.indexes[slot] = index;
        return true;
    } // end of offer
} // end of impl CandidateBuffer

//========================================================================

#[cfg(test)]
mod tests {

    use super::*;

    #[allow(unused)]
    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_seed_keeps_decreasing_order() {
        log_init_test();
        let mut buffer = CandidateBuffer::<f64>::new(4);
        buffer.seed(2., 12);
        buffer.seed(8., 5);
        assert!(!buffer.is_full());
        buffer.seed(1., 7);
        buffer.seed(6., 9);
        assert!(buffer.is_full());
        let distances: Vec<f64> = (0..4).map(|s| buffer.get_distance(s)).collect();
        let indexes: Vec<usize> = (0..4).map(|s| buffer.get_index(s)).collect();
        assert_eq!(distances, vec![8., 6., 2., 1.]);
        assert_eq!(indexes, vec![5, 9, 12, 7]);
        assert_eq!(buffer.get_worst(), 8.);
    } // end of test_seed_keeps_decreasing_order

    #[test]
    fn test_seed_tie_first_found_stays_deepest() {
        log_init_test();
        let mut buffer = CandidateBuffer::<f64>::new(3);
        buffer.seed(1., 10);
        buffer.seed(1., 11);
        buffer.seed(5., 12);
        let indexes: Vec<usize> = (0..3).map(|s| buffer.get_index(s)).collect();
        // the candidate seeded first keeps the slot nearest the good end
        assert_eq!(indexes, vec![12, 11, 10]);
    } // end of test_seed_tie_first_found_stays_deepest

    #[test]
    fn test_offer_strict_insertion_and_shift() {
        log_init_test();
        let mut buffer = CandidateBuffer::<f64>::new(4);
        buffer.seed(8., 5);
        buffer.seed(6., 9);
        buffer.seed(2., 12);
        buffer.seed(1., 7);
        // equal to the worst kept distance : rejected
        assert!(!buffer.offer(8., 33));
        // enters between 6 and 2, evicting the worst
        assert!(buffer.offer(5., 33));
        let distances: Vec<f64> = (0..4).map(|s| buffer.get_distance(s)).collect();
        let indexes: Vec<usize> = (0..4).map(|s| buffer.get_index(s)).collect();
        assert_eq!(distances, vec![6., 5., 2., 1.]);
        assert_eq!(indexes, vec![9, 33, 12, 7]);
        // a new best lands at the deepest slot
        assert!(buffer.offer(0.5, 44));
        let distances: Vec<f64> = (0..4).map(|s| buffer.get_distance(s)).collect();
        let indexes: Vec<usize> = (0..4).map(|s| buffer.get_index(s)).collect();
        assert_eq!(distances, vec![5., 2., 1., 0.5]);
        assert_eq!(indexes, vec![33, 12, 7, 44]);
    } // end of test_offer_strict_insertion_and_shift

    #[test]
    fn test_offer_slot_occupant_guard() {
        log_init_test();
        let mut buffer = CandidateBuffer::<f64>::new(2);
        buffer.seed(2., 4);
        buffer.seed(1., 6);
        // candidate lands at slot 0 where index 4 already sits : rejected
        assert!(!buffer.offer(1.5, 4));
        assert_eq!(buffer.get_worst(), 2.);
        // another index at the same distance enters
        assert!(buffer.offer(1.5, 8));
        let indexes: Vec<usize> = (0..2).map(|s| buffer.get_index(s)).collect();
        assert_eq!(indexes, vec![8, 6]);
        // equal to a kept distance : the incumbent keeps the deeper slot
        assert!(buffer.offer(1., 9));
        let distances: Vec<f64> = (0..2).map(|s| buffer.get_distance(s)).collect();
        let indexes: Vec<usize> = (0..2).map(|s| buffer.get_index(s)).collect();
        assert_eq!(distances, vec![1., 1.]);
        assert_eq!(indexes, vec![9, 6]);
    } // end of test_offer_slot_occupant_guard
} // end of mod tests

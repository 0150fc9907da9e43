//! Euclidean distance and finiteness checks on position slices.
//!

use num_traits::Float;

/// euclidean distance between two position vectors of the same dimension
pub fn euclidean_distance<F>(v1: &[F], v2: &[F]) -> F
where
    F: Float,
{
    assert_eq!(v1.len(), v2.len());
    let mut sum2 = F::zero();
    for d in 0..v1.len() {
        let delta = v1[d] - v2[d];
        sum2 = sum2 + delta * delta;
    }
    sum2.sqrt()
} // end of euclidean_distance

/// same as [euclidean_distance] but returning f64, to be used as the distance
/// function stored in an [crate::embedding::Embedded]
pub fn euclidean_distance_f64<F>(v1: &[F], v2: &[F]) -> f64
where
    F: Float,
{
    euclidean_distance(v1, v2).to_f64().unwrap()
} // end of euclidean_distance_f64

/// true if no coordinate is NaN or infinite.
/// The solver checks positions after each update, a non finite coordinate means divergence.
pub fn all_finite<F>(v: &[F]) -> bool
where
    F: Float,
{
    for x in v {
        if !x.is_finite() {
            return false;
        }
    }
    return true;
} // end of all_finite

//========================================================================

#[cfg(test)]
mod tests {

    use super::*;

    #[allow(unused)]
    fn log_init_test() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn test_euclidean_distance() {
        log_init_test();
        let v1 = [0.0f64, 0.];
        let v2 = [3.0f64, 4.];
        assert_eq!(euclidean_distance(&v1, &v2), 5.);
        assert_eq!(euclidean_distance(&v1, &v1), 0.);
        // f32 instantiation
        let w1 = [1.0f32, 1.];
        let w2 = [1.0f32, 2.];
        assert_eq!(euclidean_distance(&w1, &w2), 1.0f32);
        assert_eq!(euclidean_distance_f64(&w1, &w2), 1.);
    } // end of test_euclidean_distance

    #[test]
    fn test_all_finite() {
        log_init_test();
        assert!(all_finite(&[0.0f64, 1., -5.]));
        assert!(!all_finite(&[0.0f64, f64::NAN]));
        assert!(!all_finite(&[f64::INFINITY, 1.]));
        assert!(!all_finite(&[f32::NEG_INFINITY]));
    } // end of test_all_finite
} // end of mod tests

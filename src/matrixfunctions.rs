use crate::error::{Result, VocabularyError};

use ndarray::prelude::*;
use ndarray::{Data, IxDyn, Slice};
use ndarray_rand::RandomExt;
use ndarray_rand::rand_distr::{StandardNormal, Uniform};
use rand::Rng;


// columns shorter than this are redrawn during orthogonalization
const MIN_COLUMN_NORM: f64 = 1e-8;


/// Generates a weight matrix from the standard normal distribution,
/// optionally multiplied by `scale`.
pub fn random_weight<R: Rng + ?Sized>(shape: (usize, usize), scale: Option<f64>, rng: &mut R) -> Array2<f64> {
    let result: Array2<f64> = Array::random_using(shape, StandardNormal, rng);
    match scale {
        Some(scale) => result * scale,
        None => result
    }
}

/// Generates an `in_size` x `out_size` weight matrix. A square matrix is
/// orthogonal and ignores `scale`; otherwise this is [`random_weight`].
pub fn orthogonal_weight<R: Rng + ?Sized>(in_size: usize, out_size: usize, scale: Option<f64>, rng: &mut R) -> Array2<f64> {

    if in_size != out_size {
        return random_weight((in_size, out_size), scale, rng);
    }

    // modified Gram-Schmidt over the columns of a normal matrix
    let mut result: Array2<f64> = random_weight((in_size, out_size), None, rng);
    for j in 0..out_size {
        loop {
            for k in 0..j {
                let projection = result.column(j).dot(&result.column(k));
                let basis = result.column(k).to_owned();
                result.column_mut(j).scaled_add(-projection, &basis);
            }
            let norm = result.column(j).dot(&result.column(j)).sqrt();
            if norm > MIN_COLUMN_NORM {
                result.column_mut(j).mapv_inplace(|x| x / norm);
                break
            }
            let redraw: Array1<f64> = Array::random_using(in_size, StandardNormal, rng);
            result.column_mut(j).assign(&redraw);
        }
    }
    result
}

/// Random integers in `[0, high)`, used as debugging values for integer
/// parameters.
pub fn test_value_int<R: Rng + ?Sized>(shape: &[usize], high: i64, rng: &mut R) -> Result<ArrayD<i64>> {
    if high <= 0 {
        return Err(VocabularyError::InvalidArgument(format!("test value range [0, {}) is empty", high)));
    }
    Ok(Array::random_using(IxDyn(shape), Uniform::new(0, high), rng))
}

/// Random floats in `[0, high)`, used as debugging values for real-valued
/// parameters.
pub fn test_value_float<R: Rng + ?Sized>(shape: &[usize], high: f64, rng: &mut R) -> ArrayD<f64> {
    let result: ArrayD<f64> = Array::random_using(IxDyn(shape), Uniform::new(0.0, 1.0), rng);
    result * high
}

/// Random booleans, used as debugging values for mask parameters.
pub fn test_value_bool<R: Rng + ?Sized>(shape: &[usize], rng: &mut R) -> ArrayD<bool> {
    let bits: ArrayD<u8> = Array::random_using(IxDyn(shape), Uniform::new(0u8, 2), rng);
    bits.mapv(|bit| bit == 1)
}

/// Returns block `index` (or the blocks `index..=end_index`) of width `size`
/// from the last axis of a concatenation of 2 or 3 dimensional matrices.
pub fn get_submatrix<A, S, D>(matrices: &ArrayBase<S, D>, index: usize, size: usize, end_index: Option<usize>) -> Result<Array<A, D>>
where
    A: Clone,
    S: Data<Elem = A>,
    D: Dimension {

        let ndim = matrices.ndim();
        if ndim != 2 && ndim != 3 {
            return Err(VocabularyError::InvalidArgument(
                format!("get_submatrix() requires a 2 or 3 dimensional matrix, got {} dimensions", ndim)));
        }

        let end_index = end_index.unwrap_or(index);
        let start = index * size;
        let end = (end_index + 1) * size;
        let last_axis = Axis(ndim - 1);
        if end_index < index || end > matrices.len_of(last_axis) {
            return Err(VocabularyError::InvalidArgument(
                format!("submatrix {}..{} is out of bounds for size {}", start, end, matrices.len_of(last_axis))));
        }

        Ok(matrices.slice_axis(last_axis, Slice::from(start..end)).to_owned())
}


#[cfg(test)]
mod tests {

    use super::*;
    use ndarray::array;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn random_weight_shape_and_scale() {
        let mut rng = StdRng::seed_from_u64(0);
        let unscaled = random_weight((4, 3), None, &mut rng);
        assert_eq!(unscaled.dim(), (4, 3));

        let mut rng = StdRng::seed_from_u64(0);
        let scaled = random_weight((4, 3), Some(0.01), &mut rng);
        for (a, b) in unscaled.iter().zip(scaled.iter()) {
            assert!((a * 0.01 - b).abs() < 1e-12);
        }
    }

    #[test]
    fn square_orthogonal_weight_is_orthogonal() {
        let mut rng = StdRng::seed_from_u64(11);
        let w = orthogonal_weight(6, 6, Some(5.0), &mut rng);
        let product = w.t().dot(&w);
        for i in 0..6 {
            for j in 0..6 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((product[[i, j]] - expected).abs() < 1e-9, "{} {} {}", i, j, product[[i, j]]);
            }
        }
    }

    #[test]
    fn rectangular_orthogonal_weight_is_random() {
        let mut rng = StdRng::seed_from_u64(2);
        let w = orthogonal_weight(3, 5, None, &mut rng);
        assert_eq!(w.dim(), (3, 5));
    }

    #[test]
    fn test_values_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(5);
        let ints = test_value_int(&[4, 16], 10, &mut rng).unwrap();
        assert_eq!(ints.shape(), &[4, 16]);
        assert!(ints.iter().all(|x| (0..10).contains(x)));
        assert!(test_value_int(&[2], 0, &mut rng).is_err());

        let floats = test_value_float(&[1, 8], 2.0, &mut rng);
        assert!(floats.iter().all(|x| *x >= 0.0 && *x < 2.0));

        let mask = test_value_bool(&[64], &mut rng);
        assert_eq!(mask.len(), 64);
        assert!(mask.iter().any(|x| *x));
        assert!(mask.iter().any(|x| !*x));
    }

    #[test]
    fn submatrix_of_2d_and_3d() {
        let matrix = Array::from_shape_fn((2, 6), |(i, j)| (i * 10 + j) as f64);
        let second = get_submatrix(&matrix, 1, 2, None).unwrap();
        assert_eq!(second, array![[2.0, 3.0], [12.0, 13.0]]);

        let tail = get_submatrix(&matrix, 1, 2, Some(2)).unwrap();
        assert_eq!(tail.dim(), (2, 4));

        let cube = Array::from_shape_fn((2, 3, 9), |(_, _, k)| k as i64);
        let third = get_submatrix(&cube, 2, 3, None).unwrap();
        assert_eq!(third.dim(), (2, 3, 3));
        assert_eq!(third[[1, 2, 0]], 6);
    }

    #[test]
    fn submatrix_errors() {
        let vector = Array1::<f64>::zeros(6);
        assert!(get_submatrix(&vector, 0, 2, None).is_err());

        let matrix = Array2::<f64>::zeros((2, 6));
        assert!(get_submatrix(&matrix, 3, 2, None).is_err());
    }

}

//! Principal component reduction of a set's band stack.
//!
//! Every band is flattened and z-scored, the band-by-band covariance is
//! eigen-decomposed, and the standardized pixels are projected onto the
//! eigenvectors in order of decreasing eigenvalue. The leading components are
//! min-max stretched to 0-255 for storage.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{s, Array1, Array2, ArrayView1, Axis};
use rayon::prelude::*;
use tracing::debug;

use crate::consts::{EPSILON, PARALLEL_PIXEL_THRESHOLD, PCA_COMPONENTS, PCA_MIN_BANDS};
use crate::error::{MedusaError, Result};
use crate::frame::BandStack;

/// Result of reducing one band stack.
#[derive(Clone, Debug)]
pub struct PcaOutput {
    /// The leading components at the input resolution, highest variance first.
    pub components: Vec<Array2<u8>>,
    /// All eigenvalues, descending.
    pub eigenvalues: Array1<f64>,
    /// Eigenvectors as columns, ordered like `eigenvalues`.
    pub eigenvectors: Array2<f64>,
    /// Covariance between the standardized bands.
    pub covariance: Array2<f64>,
}

/// Reduce a stack of at least [`PCA_MIN_BANDS`] single-channel images to its
/// first [`PCA_COMPONENTS`] principal component images.
pub fn reduce(stack: &BandStack) -> Result<PcaOutput> {
    if stack.len() < PCA_MIN_BANDS {
        return Err(MedusaError::InsufficientBands {
            required: PCA_MIN_BANDS,
            available: stack.len(),
        });
    }

    let (h, w) = stack.layers()[0].1.dim();
    for (_, plane) in stack.layers() {
        let (ph, pw) = plane.dim();
        if (ph, pw) != (h, w) {
            return Err(MedusaError::ResolutionMismatch {
                width: w,
                height: h,
                got_width: pw,
                got_height: ph,
            });
        }
    }

    let samples = standardized_matrix(stack)?;
    let covariance = covariance(&samples);
    let (values, vectors) = symmetric_eigen(&covariance);
    let (eigenvalues, eigenvectors) = sort_descending(values, vectors);

    let projected = samples.dot(&eigenvectors.slice(s![.., ..PCA_COMPONENTS]));
    let components = projected
        .axis_iter(Axis(1))
        .map(|column| normalize_min_max(column, (h, w)))
        .collect();

    debug!(
        bands = stack.len(),
        pixels = samples.nrows(),
        leading_eigenvalue = eigenvalues[0],
        "PCA complete"
    );

    Ok(PcaOutput {
        components,
        eigenvalues,
        eigenvectors,
        covariance,
    })
}

/// Flatten a plane row-major and scale it to zero mean, unit (population)
/// standard deviation.
pub fn standardize(plane: &Array2<u8>, label: &str) -> Result<Array1<f64>> {
    let values: Array1<f64> = plane.iter().map(|&v| v as f64).collect();
    let n = values.len() as f64;
    let mean = values.sum() / n;
    let variance = values.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
    let std = variance.sqrt();

    // Also rejects NaN from an empty plane.
    if !(std > EPSILON) {
        return Err(MedusaError::DegenerateBand {
            label: label.to_string(),
        });
    }
    Ok(values.mapv(|v| (v - mean) / std))
}

/// Samples x bands matrix of standardized planes.
fn standardized_matrix(stack: &BandStack) -> Result<Array2<f64>> {
    let layers = stack.layers();
    let pixels = layers[0].1.len();

    let columns: Vec<Array1<f64>> = if pixels >= PARALLEL_PIXEL_THRESHOLD {
        layers
            .par_iter()
            .map(|(label, plane)| standardize(plane, label))
            .collect::<Result<_>>()?
    } else {
        layers
            .iter()
            .map(|(label, plane)| standardize(plane, label))
            .collect::<Result<_>>()?
    };

    let mut samples = Array2::<f64>::zeros((pixels, layers.len()));
    for (mut dst, src) in samples.axis_iter_mut(Axis(1)).zip(&columns) {
        dst.assign(src);
    }
    Ok(samples)
}

/// Sample covariance (n - 1 denominator) between the columns of `samples`.
pub fn covariance(samples: &Array2<f64>) -> Array2<f64> {
    let n = samples.nrows();
    let mean = samples
        .mean_axis(Axis(0))
        .unwrap_or_else(|| Array1::zeros(samples.ncols()));
    let centered = samples - &mean;
    let denom = n.saturating_sub(1).max(1) as f64;
    centered.t().dot(&centered) / denom
}

/// Eigen-decomposition of a real symmetric matrix.
///
/// Returns the eigenvalues (unordered) and the matching unit eigenvectors as
/// columns.
pub fn symmetric_eigen(matrix: &Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = matrix.nrows();
    let dense = DMatrix::from_fn(n, n, |i, j| matrix[[i, j]]);
    let eigen = SymmetricEigen::new(dense);

    let values = Array1::from_iter(eigen.eigenvalues.iter().copied());
    let vectors = Array2::from_shape_fn((n, n), |(i, j)| eigen.eigenvectors[(i, j)]);
    (values, vectors)
}

/// Reorder eigenpairs by decreasing eigenvalue; equal values keep their
/// original column order.
pub fn sort_descending(values: Array1<f64>, vectors: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));
    let sorted_values: Array1<f64> = order.iter().map(|&i| values[i]).collect();
    let sorted_vectors = vectors.select(Axis(1), &order);
    (sorted_values, sorted_vectors)
}

/// Linear min-max stretch to 0-255, reshaped to `shape`. A constant input
/// maps to all zeros.
pub fn normalize_min_max(values: ArrayView1<f64>, shape: (usize, usize)) -> Array2<u8> {
    let (min, max) = values
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| (lo.min(v), hi.max(v)));
    let range = max - min;
    let data: Vec<u8> = values
        .iter()
        .map(|&v| {
            if range > EPSILON {
                ((v - min) / range * 255.0).round().clamp(0.0, 255.0) as u8
            } else {
                0
            }
        })
        .collect();
    Array2::from_shape_vec(shape, data).expect("component length matches image size")
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn eigen_of_diagonal_matrix() {
        let m = array![[3.0, 0.0], [0.0, 1.0]];
        let (values, _) = symmetric_eigen(&m);
        let (values, _) = sort_descending(values, Array2::eye(2));
        assert!((values[0] - 3.0).abs() < 1e-10);
        assert!((values[1] - 1.0).abs() < 1e-10);
    }

    #[test]
    fn eigen_of_2x2_symmetric() {
        let m = array![[2.0, 1.0], [1.0, 2.0]];
        let (values, vectors) = symmetric_eigen(&m);
        let (values, vectors) = sort_descending(values, vectors);
        assert!((values[0] - 3.0).abs() < 1e-10);
        assert!((values[1] - 1.0).abs() < 1e-10);
        let v0 = vectors.column(0);
        assert!((v0[0].abs() - v0[1].abs()).abs() < 1e-10);
    }

    #[test]
    fn eigenpairs_satisfy_definition() {
        let m = array![
            [4.0, 1.0, 0.5, 0.0],
            [1.0, 3.0, 0.2, 0.1],
            [0.5, 0.2, 2.0, 0.3],
            [0.0, 0.1, 0.3, 1.0]
        ];
        let (values, vectors) = symmetric_eigen(&m);
        for k in 0..4 {
            let v = vectors.column(k);
            let residual = m.dot(&v) - &v * values[k];
            assert!(residual.iter().all(|r| r.abs() < 1e-10));
            assert!((v.dot(&v) - 1.0).abs() < 1e-10);
        }
        assert!((values.sum() - 10.0).abs() < 1e-10);
    }

    #[test]
    fn ties_keep_column_order() {
        let values = array![1.0, 2.0, 2.0, 0.5];
        let vectors = Array2::<f64>::eye(4);
        let (sorted, vecs) = sort_descending(values, vectors);
        assert_eq!(sorted.to_vec(), vec![2.0, 2.0, 1.0, 0.5]);
        assert_eq!(vecs[[1, 0]], 1.0);
        assert_eq!(vecs[[2, 1]], 1.0);
    }

    #[test]
    fn constant_component_normalizes_to_zero() {
        let values = Array1::from_elem(6, 4.2);
        let out = normalize_min_max(values.view(), (2, 3));
        assert!(out.iter().all(|&v| v == 0));
    }

    #[test]
    fn normalization_spans_full_range() {
        let values = array![-1.0, 0.0, 1.0, 3.0];
        let out = normalize_min_max(values.view(), (2, 2));
        assert_eq!(out[[0, 0]], 0);
        assert_eq!(out[[1, 1]], 255);
        assert_eq!(out[[0, 1]], 64);
    }
}

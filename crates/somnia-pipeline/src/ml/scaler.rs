//! Feature standardization
//!
//! Affine per-column rescaling to zero mean and unit variance, fit on the
//! training matrix and applied identically to the test matrix.

use ndarray::{Array1, Array2, Axis};

use crate::error::{MlError, MlResult};

/// Per-column standardizer.
#[derive(Clone, Debug)]
pub struct StandardScaler {
    mean: Array1<f64>,
    scale: Array1<f64>,
}

impl StandardScaler {
    /// Fit column means and scales on a training matrix.
    ///
    /// Zero-variance columns get unit scale so they pass through centered
    /// instead of dividing by zero.
    ///
    /// # Errors
    ///
    /// [`MlError::EmptyTrainingSet`] if the matrix has no rows.
    pub fn fit(matrix: &Array2<f64>) -> MlResult<Self> {
        if matrix.nrows() == 0 {
            return Err(MlError::EmptyTrainingSet);
        }

        let n = matrix.nrows() as f64;
        let mean = matrix.sum_axis(Axis(0)) / n;

        let mut scale = Array1::zeros(matrix.ncols());
        for (j, column) in matrix.columns().into_iter().enumerate() {
            let var = column.iter().map(|v| (v - mean[j]).powi(2)).sum::<f64>() / n;
            let sd = var.sqrt();
            scale[j] = if sd > 0.0 { sd } else { 1.0 };
        }

        Ok(Self { mean, scale })
    }

    /// Standardize a matrix with the fitted parameters.
    ///
    /// # Errors
    ///
    /// [`MlError::ColumnMismatch`] if the column count differs from the
    /// fitted matrix.
    pub fn transform(&self, matrix: &Array2<f64>) -> MlResult<Array2<f64>> {
        if matrix.ncols() != self.mean.len() {
            return Err(MlError::ColumnMismatch {
                fitted: self.mean.len(),
                got: matrix.ncols(),
            });
        }

        let mut out = matrix.clone();
        for mut row in out.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = (*value - self.mean[j]) / self.scale[j];
            }
        }
        Ok(out)
    }

    /// Fit on a training matrix and transform it in one call.
    ///
    /// # Errors
    ///
    /// Same as [`StandardScaler::fit`].
    pub fn fit_transform(matrix: &Array2<f64>) -> MlResult<(Self, Array2<f64>)> {
        let scaler = Self::fit(matrix)?;
        let transformed = scaler.transform(matrix)?;
        Ok((scaler, transformed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use somnia_core::SignalStats;

    #[test]
    fn fitted_columns_standardize_to_zero_mean_unit_variance() {
        let matrix = array![
            [1.0, 10.0, -5.0],
            [2.0, 20.0, 0.0],
            [3.0, 35.0, 5.0],
            [4.0, 55.0, 10.0],
        ];
        let (_, standardized) = StandardScaler::fit_transform(&matrix).unwrap();

        for column in standardized.columns() {
            let values: Vec<f64> = column.to_vec();
            let stats = SignalStats::from_samples(&values);
            assert!(stats.mean.abs() < 1e-6, "column mean {}", stats.mean);
            assert!(
                (stats.variance - 1.0).abs() < 1e-6,
                "column variance {}",
                stats.variance
            );
        }
    }

    #[test]
    fn test_matrix_uses_training_parameters() {
        let train = array![[0.0], [10.0]];
        let test = array![[5.0], [15.0]];

        let scaler = StandardScaler::fit(&train).unwrap();
        let out = scaler.transform(&test).unwrap();

        // train mean 5, sd 5: 5 -> 0, 15 -> 2.
        assert!((out[[0, 0]] - 0.0).abs() < 1e-12);
        assert!((out[[1, 0]] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn constant_column_passes_through_centered() {
        let matrix = array![[3.0, 1.0], [3.0, 2.0], [3.0, 3.0]];
        let (_, standardized) = StandardScaler::fit_transform(&matrix).unwrap();
        for i in 0..3 {
            assert_eq!(standardized[[i, 0]], 0.0);
        }
    }

    #[test]
    fn empty_matrix_is_rejected() {
        let matrix = Array2::<f64>::zeros((0, 4));
        assert!(matches!(
            StandardScaler::fit(&matrix),
            Err(MlError::EmptyTrainingSet)
        ));
    }

    #[test]
    fn column_mismatch_is_rejected() {
        let scaler = StandardScaler::fit(&array![[1.0, 2.0], [3.0, 4.0]]).unwrap();
        let err = scaler.transform(&array![[1.0], [2.0]]).unwrap_err();
        assert!(matches!(err, MlError::ColumnMismatch { fitted: 2, got: 1 }));
    }
}

//! Per-column standardisation fitted on one batch.

use crate::features::FEATURE_COUNT;

#[derive(Debug, Clone, PartialEq)]
pub struct FeatureScaler {
    mean: [f64; FEATURE_COUNT],
    scale: [f64; FEATURE_COUNT],
}

impl FeatureScaler {
    /// Fit mean and population standard deviation per column.
    /// Zero-variance columns keep a scale of 1 so they map to 0.
    pub fn fit(rows: &[[f64; FEATURE_COUNT]]) -> Self {
        let n = rows.len().max(1) as f64;
        let mut mean = [0.0; FEATURE_COUNT];
        for row in rows {
            for (m, x) in mean.iter_mut().zip(row) {
                *m += x;
            }
        }
        for m in &mut mean {
            *m /= n;
        }

        let mut scale = [0.0; FEATURE_COUNT];
        for row in rows {
            for col in 0..FEATURE_COUNT {
                let d = row[col] - mean[col];
                scale[col] += d * d;
            }
        }
        for s in &mut scale {
            *s = (*s / n).sqrt();
            if *s == 0.0 || !s.is_finite() {
                *s = 1.0;
            }
        }
        Self { mean, scale }
    }

    pub fn transform(&self, row: &[f64; FEATURE_COUNT]) -> [f64; FEATURE_COUNT] {
        let mut out = [0.0; FEATURE_COUNT];
        for col in 0..FEATURE_COUNT {
            out[col] = (row[col] - self.mean[col]) / self.scale[col];
        }
        out
    }

    pub fn transform_all(&self, rows: &[[f64; FEATURE_COUNT]]) -> Vec<[f64; FEATURE_COUNT]> {
        rows.iter().map(|r| self.transform(r)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_columns_have_zero_mean_unit_variance() {
        let rows = vec![
            [1.0, 10.0, 3.0, 0.0, 5.0],
            [2.0, 20.0, 3.0, 0.0, 7.0],
            [3.0, 30.0, 3.0, 0.0, 9.0],
        ];
        let scaler = FeatureScaler::fit(&rows);
        let scaled = scaler.transform_all(&rows);
        for col in [0, 1, 4] {
            let mean: f64 = scaled.iter().map(|r| r[col]).sum::<f64>() / 3.0;
            let var: f64 = scaled.iter().map(|r| (r[col] - mean).powi(2)).sum::<f64>() / 3.0;
            assert!(mean.abs() < 1e-12);
            assert!((var - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn constant_column_maps_to_zero() {
        let rows = vec![[5.0; FEATURE_COUNT], [5.0; FEATURE_COUNT]];
        let scaler = FeatureScaler::fit(&rows);
        assert_eq!(scaler.transform(&rows[0]), [0.0; FEATURE_COUNT]);
    }
}

use serde::{Deserialize, Serialize};

use super::{check_feature_count, Predictor, PredictorError};

/// Ordinary linear regression: `intercept + Σ coefficients[i] * x[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    #[serde(default)]
    pub intercept: f64,
    pub coefficients: Vec<f64>,
}

impl Predictor for LinearModel {
    fn predict(&self, features: &[f64]) -> Result<f64, PredictorError> {
        check_feature_count(self.coefficients.len(), features)?;
        let y = self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>();
        Ok(y)
    }

    fn n_features(&self) -> Option<usize> {
        Some(self.coefficients.len())
    }
}

//! Model layer: per-drug predictors, their gene lists, and the registry that
//! pairs them at startup.
//!
//! ```text
//!  models_dir/*.json      gene_sets.json
//!        │                      │
//!        ▼                      ▼
//!   ┌──────────┐          ┌───────────┐
//!   │ ModelSpec │          │ GeneSets  │
//!   └──────────┘          └───────────┘
//!        │                      │
//!        └──────────┬───────────┘
//!                   ▼
//!             ┌──────────┐
//!             │ Registry  │  drug → (GeneSet, Box<dyn Predictor>)
//!             └──────────┘
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod gene_sets;
pub mod linear;
pub mod registry;
pub mod tree;

pub use gene_sets::{GeneSet, GeneSets};
pub use linear::LinearModel;
pub use registry::{DrugModel, Registry, RegistryError};
pub use tree::TreeEnsemble;

// ---------------------------------------------------------------------------
// Predictor – anything that turns a feature vector into an IC50 estimate
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictorError {
    #[error("expected {expected} features, got {got}")]
    FeatureCount { expected: usize, got: usize },
    #[error("prediction is not a finite number ({0})")]
    NonFinite(f64),
    #[error("invalid model: {0}")]
    InvalidModel(String),
}

/// A pre-trained regression model for one drug.
///
/// `features` are ordered like the drug's [`GeneSet`].
pub trait Predictor: Send + Sync {
    fn predict(&self, features: &[f64]) -> Result<f64, PredictorError>;

    /// Number of features the model was trained on, when it knows.
    fn n_features(&self) -> Option<usize> {
        None
    }
}

impl<F> Predictor for F
where
    F: Fn(&[f64]) -> f64 + Send + Sync,
{
    fn predict(&self, features: &[f64]) -> Result<f64, PredictorError> {
        Ok(self(features))
    }
}

pub(crate) fn check_feature_count(expected: usize, features: &[f64]) -> Result<(), PredictorError> {
    if features.len() != expected {
        return Err(PredictorError::FeatureCount {
            expected,
            got: features.len(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// ModelSpec – the on-disk model format
// ---------------------------------------------------------------------------

/// Serialized model file, tagged by `"kind"`:
///
/// ```json
/// { "kind": "linear", "intercept": 2.1, "coefficients": [0.4, -1.2] }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelSpec {
    Linear(LinearModel),
    TreeEnsemble(TreeEnsemble),
}

impl ModelSpec {
    /// Validate the structure and hand back a ready predictor.
    pub fn into_predictor(self) -> Result<Box<dyn Predictor>, PredictorError> {
        match self {
            ModelSpec::Linear(m) => Ok(Box::new(m)),
            ModelSpec::TreeEnsemble(m) => {
                m.validate()?;
                Ok(Box::new(m))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_predictors() {
        let sum = |x: &[f64]| x.iter().sum::<f64>();
        assert_eq!(sum.predict(&[1.0, 2.0]).unwrap(), 3.0);
        assert_eq!(Predictor::n_features(&sum), None);
    }

    #[test]
    fn model_spec_is_tagged_by_kind() {
        let spec: ModelSpec = serde_json::from_str(
            r#"{"kind": "linear", "intercept": 1.0, "coefficients": [2.0, 0.5]}"#,
        )
        .unwrap();
        let predictor = spec.into_predictor().unwrap();
        assert_eq!(predictor.n_features(), Some(2));
        assert_eq!(predictor.predict(&[1.0, 2.0]).unwrap(), 4.0);
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = serde_json::from_str::<ModelSpec>(r#"{"kind": "svm"}"#);
        assert!(err.is_err());
    }
}

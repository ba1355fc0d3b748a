use serde::{Deserialize, Serialize};

use super::{check_feature_count, Predictor, PredictorError};

// ---------------------------------------------------------------------------
// Regression tree ensemble (random forest / gradient boosting export)
// ---------------------------------------------------------------------------

/// One node of a flattened regression tree. Node `0` is the root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    /// `x[feature] <= threshold` continues at `left`, otherwise at `right`.
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf { value: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    pub nodes: Vec<Node>,
}

impl Tree {
    fn evaluate(&self, features: &[f64]) -> Result<f64, PredictorError> {
        let mut idx = 0;
        // A validated tree reaches a leaf in at most `nodes.len()` steps.
        for _ in 0..self.nodes.len() {
            match self.nodes.get(idx) {
                Some(Node::Leaf { value }) => return Ok(*value),
                Some(Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                }) => {
                    let x = features.get(*feature).copied().ok_or_else(|| {
                        PredictorError::InvalidModel(format!("feature {feature} out of range"))
                    })?;
                    idx = if x <= *threshold { *left } else { *right };
                }
                None => {
                    return Err(PredictorError::InvalidModel(format!(
                        "node {idx} out of range"
                    )))
                }
            }
        }
        Err(PredictorError::InvalidModel("tree contains a cycle".into()))
    }

    fn validate(&self, n_features: Option<usize>) -> Result<(), PredictorError> {
        if self.nodes.is_empty() {
            return Err(PredictorError::InvalidModel("empty tree".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let Node::Split {
                feature,
                left,
                right,
                ..
            } = node
            {
                // Children always point forward, which also rules out cycles.
                for child in [left, right] {
                    if *child <= i || *child >= self.nodes.len() {
                        return Err(PredictorError::InvalidModel(format!(
                            "node {i} has invalid child {child}"
                        )));
                    }
                }
                if let Some(n) = n_features {
                    if *feature >= n {
                        return Err(PredictorError::InvalidModel(format!(
                            "node {i} splits on feature {feature}, model has {n}"
                        )));
                    }
                }
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    /// Random forest: average of the trees.
    #[default]
    Mean,
    /// Boosting: sum of the trees.
    Sum,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreeEnsemble {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_features: Option<usize>,
    #[serde(default)]
    pub base_score: f64,
    #[serde(default)]
    pub aggregation: Aggregation,
    pub trees: Vec<Tree>,
}

impl TreeEnsemble {
    /// Check node references before the model is used for predictions.
    pub fn validate(&self) -> Result<(), PredictorError> {
        if self.trees.is_empty() {
            return Err(PredictorError::InvalidModel("ensemble has no trees".into()));
        }
        self.trees
            .iter()
            .try_for_each(|tree| tree.validate(self.n_features))
    }
}

impl Predictor for TreeEnsemble {
    fn predict(&self, features: &[f64]) -> Result<f64, PredictorError> {
        if let Some(n) = self.n_features {
            check_feature_count(n, features)?;
        }
        let mut total = 0.0;
        for tree in &self.trees {
            total += tree.evaluate(features)?;
        }
        let combined = match self.aggregation {
            Aggregation::Mean => total / self.trees.len().max(1) as f64,
            Aggregation::Sum => total,
        };
        Ok(self.base_score + combined)
    }

    fn n_features(&self) -> Option<usize> {
        self.n_features
    }
}

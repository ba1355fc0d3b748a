//! Drug ranking: predict an IC50 per drug and order drugs from most to least
//! sensitive (lowest predicted IC50 first).

use std::cmp::Ordering;
use std::sync::Arc;

use arrow::array::{Float64Array, StringArray, UInt64Array};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use thiserror::Error;

use crate::data::profile::Profile;
use crate::model::{PredictorError, Registry};

#[derive(Debug, Clone, PartialEq, Error)]
#[error("prediction for {drug} failed: {source}")]
pub struct RankError {
    pub drug: String,
    #[source]
    pub source: PredictorError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RankOptions {
    /// How many drugs to keep.
    pub top_n: usize,
    /// How many trailing genes of each gene set to report.
    pub important_genes: usize,
}

impl Default for RankOptions {
    fn default() -> Self {
        Self {
            top_n: 10,
            important_genes: 10,
        }
    }
}

impl From<&crate::config::AppConfig> for RankOptions {
    fn from(config: &crate::config::AppConfig) -> Self {
        Self {
            top_n: config.top_n,
            important_genes: config.important_genes,
        }
    }
}

/// One row of the ranking table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedDrug {
    /// 1-based position.
    pub rank: usize,
    pub drug: String,
    /// Predicted IC50; lower means more sensitive.
    pub ic50: f64,
    /// The drug's most important genes, joined with `", "`.
    pub important_genes: String,
    /// Genes of this drug's set that were absent or missing in the profile
    /// and fed to the model as `0.0`.
    pub missing_genes: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Ranking {
    pub entries: Vec<RankedDrug>,
}

impl Ranking {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries whose prediction used at least one zero-filled gene.
    pub fn zero_filled(&self) -> impl Iterator<Item = &RankedDrug> {
        self.entries.iter().filter(|e| e.missing_genes > 0)
    }

    /// Columnar form for tabular output.
    pub fn to_record_batch(&self) -> Result<RecordBatch, ArrowError> {
        let schema = Arc::new(Schema::new(vec![
            Field::new("Rank", DataType::UInt64, false),
            Field::new("Drug Name", DataType::Utf8, false),
            Field::new("IC50", DataType::Float64, false),
            Field::new("Ten Most Important Genes", DataType::Utf8, false),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(UInt64Array::from_iter_values(
                    self.entries.iter().map(|e| e.rank as u64),
                )),
                Arc::new(StringArray::from_iter_values(
                    self.entries.iter().map(|e| e.drug.as_str()),
                )),
                Arc::new(Float64Array::from_iter_values(
                    self.entries.iter().map(|e| e.ic50),
                )),
                Arc::new(StringArray::from_iter_values(
                    self.entries.iter().map(|e| e.important_genes.as_str()),
                )),
            ],
        )
    }
}

/// Rank every drug in `registry` for `profile`.
///
/// Each drug's gene set is looked up in the profile; genes that are absent
/// or missing are fed to the model as `0.0`. Drugs are sorted by predicted
/// IC50 ascending with ties kept in registry order, and the first
/// `options.top_n` are returned.
pub fn rank(
    profile: &Profile,
    registry: &Registry,
    options: &RankOptions,
) -> Result<Ranking, RankError> {
    let mut scored = Vec::with_capacity(registry.len());

    for model in registry.iter() {
        let reindexed = profile.reindex(model.genes.genes());
        let missing_genes = reindexed.iter().filter(|v| v.is_none()).count();
        let features: Vec<f64> = reindexed.into_iter().map(|v| v.unwrap_or(0.0)).collect();

        let ic50 = model
            .predictor()
            .predict(&features)
            .and_then(|y| {
                if y.is_finite() {
                    Ok(y)
                } else {
                    Err(PredictorError::NonFinite(y))
                }
            })
            .map_err(|source| RankError {
                drug: model.drug.clone(),
                source,
            })?;

        log::debug!(
            "{}: IC50 {ic50:.4} ({missing_genes}/{} genes zero-filled)",
            model.drug,
            model.genes.len()
        );

        scored.push(RankedDrug {
            rank: 0,
            drug: model.drug.clone(),
            ic50,
            important_genes: model.genes.important(options.important_genes).join(", "),
            missing_genes,
        });
    }

    let zero_filled = scored.iter().filter(|d| d.missing_genes > 0).count();
    if zero_filled > 0 {
        log::warn!(
            "{zero_filled} of {} drugs were predicted with zero-filled genes",
            scored.len()
        );
    }

    // `sort_by` is stable: equal IC50s keep registry order. Values are
    // finite here, and `partial_cmp` treats -0.0 and 0.0 as equal.
    scored.sort_by(|a, b| a.ic50.partial_cmp(&b.ic50).unwrap_or(Ordering::Equal));
    scored.truncate(options.top_n);
    for (i, entry) in scored.iter_mut().enumerate() {
        entry.rank = i + 1;
    }

    Ok(Ranking { entries: scored })
}

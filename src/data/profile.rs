use std::collections::HashMap;

use super::loader::ParseError;

// ---------------------------------------------------------------------------
// Profile – one patient's expression values indexed by gene identifier
// ---------------------------------------------------------------------------

/// A single-sample gene expression profile.
///
/// Rows keep the order in which they were read so the UI can show the
/// profile as uploaded. Values are `None` where the source cell was empty or
/// carried a missing marker.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Profile {
    genes: Vec<String>,
    values: Vec<Option<f64>>,
    index: HashMap<String, usize>,
}

impl Profile {
    /// Build a profile from `(gene, value)` rows.
    ///
    /// Fails on a repeated gene identifier: reindexing by gene would be
    /// ambiguous.
    pub fn from_rows<I, S>(rows: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = (S, Option<f64>)>,
        S: Into<String>,
    {
        let mut profile = Profile::default();
        for (gene, value) in rows {
            profile.push(gene.into(), value)?;
        }
        Ok(profile)
    }

    pub(crate) fn push(&mut self, gene: String, value: Option<f64>) -> Result<(), ParseError> {
        if self.index.contains_key(&gene) {
            return Err(ParseError::DuplicateGene(gene));
        }
        self.index.insert(gene.clone(), self.genes.len());
        self.genes.push(gene);
        self.values.push(value);
        Ok(())
    }

    /// Expression value for `gene`; `None` when absent or missing.
    pub fn get(&self, gene: &str) -> Option<f64> {
        self.index.get(gene).and_then(|&i| self.values[i])
    }

    /// Look up each of `genes` in order. Genes without a row, or whose value
    /// is missing, come back as `None`.
    pub fn reindex<S: AsRef<str>>(&self, genes: &[S]) -> Vec<Option<f64>> {
        genes.iter().map(|g| self.get(g.as_ref())).collect()
    }

    /// The `i`-th `(gene, value)` row in upload order.
    pub fn row(&self, i: usize) -> Option<(&str, Option<f64>)> {
        Some((self.genes.get(i)?.as_str(), *self.values.get(i)?))
    }

    /// Number of rows whose value is missing.
    pub fn missing_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_none()).count()
    }

    pub fn len(&self) -> usize {
        self.genes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genes.is_empty()
    }
}

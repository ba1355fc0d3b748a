use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// GeneSet – the ordered features of one drug's model
// ---------------------------------------------------------------------------

/// Gene identifiers in the column order the drug's model was trained on.
/// The tail of the list holds the genes reported as most important.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneSet(Vec<String>);

impl GeneSet {
    pub fn new<I, S>(genes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        GeneSet(genes.into_iter().map(Into::into).collect())
    }

    pub fn genes(&self) -> &[String] {
        &self.0
    }

    /// The last `k` genes (all of them when the set is shorter).
    pub fn important(&self, k: usize) -> &[String] {
        &self.0[self.0.len().saturating_sub(k)..]
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

// ---------------------------------------------------------------------------
// GeneSets – the drug → gene list table
// ---------------------------------------------------------------------------

/// Gene-selection table loaded from a JSON object `{ "drug": ["gene", ...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeneSets(BTreeMap<String, GeneSet>);

impl GeneSets {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading gene sets {}", path.display()))?;
        let sets: GeneSets = serde_json::from_str(&text)
            .with_context(|| format!("parsing gene sets {}", path.display()))?;
        log::info!("Loaded gene sets for {} drugs from {}", sets.len(), path.display());
        Ok(sets)
    }

    pub fn insert(&mut self, drug: impl Into<String>, genes: GeneSet) {
        self.0.insert(drug.into(), genes);
    }

    pub fn get(&self, drug: &str) -> Option<&GeneSet> {
        self.0.get(drug)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn important_is_the_tail() {
        let set = GeneSet::new(["a", "b", "c", "d"]);
        assert_eq!(set.important(2), &["c", "d"]);
        assert_eq!(set.important(10).len(), 4);
        assert!(set.important(0).is_empty());
    }

    #[test]
    fn load_table_from_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genes.json");
        std::fs::write(&path, r#"{"DrugA": ["g1", "g2"], "DrugB": ["g1", "g3"]}"#).unwrap();

        let sets = GeneSets::load(&path).unwrap();
        assert_eq!(sets.len(), 2);
        assert_eq!(sets.get("DrugB").unwrap().genes(), &["g1", "g3"]);
        assert!(sets.get("DrugC").is_none());
    }

    #[test]
    fn malformed_table_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("genes.json");
        std::fs::write(&path, r#"{"DrugA": "g1"}"#).unwrap();

        let err = GeneSets::load(&path).unwrap_err();
        assert!(format!("{err:#}").contains("genes.json"));
    }
}

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use thiserror::Error;

use super::{GeneSet, GeneSets, ModelSpec, Predictor};
use crate::config::AppConfig;

// ---------------------------------------------------------------------------
// Errors raised while assembling the registry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("model file '{0}' has no entry in model_names")]
    UnmappedModel(String),
    #[error("model_names lists '{0}' but no such file is in the models directory")]
    MissingModelFile(String),
    #[error("drug '{0}' is mapped to more than one model file")]
    DuplicateDrug(String),
    #[error("no gene set for drug '{0}'")]
    MissingGeneSet(String),
    #[error("model for '{drug}' expects {expected} features but its gene set has {genes}")]
    FeatureMismatch {
        drug: String,
        expected: usize,
        genes: usize,
    },
    #[error("no models found in {0}")]
    Empty(String),
}

// ---------------------------------------------------------------------------
// DrugModel / Registry
// ---------------------------------------------------------------------------

/// A drug's predictor together with the genes it reads.
pub struct DrugModel {
    pub drug: String,
    pub genes: GeneSet,
    predictor: Box<dyn Predictor>,
}

impl DrugModel {
    pub fn predictor(&self) -> &dyn Predictor {
        self.predictor.as_ref()
    }
}

impl fmt::Debug for DrugModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DrugModel")
            .field("drug", &self.drug)
            .field("genes", &self.genes.len())
            .field("n_features", &self.predictor.n_features())
            .finish()
    }
}

/// The loaded models, in a fixed iteration order. Immutable once built.
#[derive(Debug, Default)]
pub struct Registry {
    drugs: Vec<DrugModel>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a drug. Iteration order is insertion order.
    pub fn with_drug(
        mut self,
        drug: impl Into<String>,
        genes: GeneSet,
        predictor: impl Predictor + 'static,
    ) -> Self {
        self.drugs.push(DrugModel {
            drug: drug.into(),
            genes,
            predictor: Box::new(predictor),
        });
        self
    }

    /// Build the registry described by `config`.
    ///
    /// Every non-hidden regular file in the models directory must be named
    /// in `model_names`, and every name there must have a file. Files are
    /// taken in file-name order.
    pub fn load(config: &AppConfig) -> Result<Self> {
        let gene_sets = GeneSets::load(&config.gene_sets_path())?;
        let models_dir = config.models_dir();
        let files = model_files(&models_dir)?;

        let mut drugs = Vec::with_capacity(files.len());
        let mut seen_drugs = BTreeSet::new();
        for file_name in &files {
            let drug = config
                .model_names
                .get(file_name)
                .ok_or_else(|| RegistryError::UnmappedModel(file_name.clone()))?;
            if !seen_drugs.insert(drug.clone()) {
                return Err(RegistryError::DuplicateDrug(drug.clone()).into());
            }
            let genes = gene_sets
                .get(drug)
                .cloned()
                .ok_or_else(|| RegistryError::MissingGeneSet(drug.clone()))?;

            let path = models_dir.join(file_name);
            let predictor = load_predictor(&path)?;
            if let Some(expected) = predictor.n_features() {
                if expected != genes.len() {
                    return Err(RegistryError::FeatureMismatch {
                        drug: drug.clone(),
                        expected,
                        genes: genes.len(),
                    }
                    .into());
                }
            }
            log::debug!("Loaded model for {drug} from {}", path.display());
            drugs.push(DrugModel {
                drug: drug.clone(),
                genes,
                predictor,
            });
        }

        let on_disk: BTreeSet<&String> = files.iter().collect();
        if let Some(missing) = config.model_names.keys().find(|k| !on_disk.contains(k)) {
            return Err(RegistryError::MissingModelFile(missing.clone()).into());
        }
        if drugs.is_empty() {
            return Err(RegistryError::Empty(models_dir.display().to_string()).into());
        }

        log::info!("Loaded {} drug models from {}", drugs.len(), models_dir.display());
        Ok(Registry { drugs })
    }

    pub fn iter(&self) -> impl Iterator<Item = &DrugModel> {
        self.drugs.iter()
    }

    /// Drug names in iteration order.
    pub fn drug_names(&self) -> Vec<&str> {
        self.drugs.iter().map(|d| d.drug.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.drugs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drugs.is_empty()
    }
}

/// Names of the non-hidden regular files in `dir`, sorted.
fn model_files(dir: &Path) -> Result<Vec<String>> {
    let entries =
        std::fs::read_dir(dir).with_context(|| format!("reading models dir {}", dir.display()))?;

    let mut names = BTreeSet::new();
    for entry in entries {
        let entry = entry.with_context(|| format!("listing {}", dir.display()))?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }
        names.insert(name);
    }
    Ok(names.into_iter().collect())
}

fn load_predictor(path: &Path) -> Result<Box<dyn Predictor>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading model {}", path.display()))?;
    let spec: ModelSpec = serde_json::from_str(&text)
        .with_context(|| format!("parsing model {}", path.display()))?;
    spec.into_predictor()
        .with_context(|| format!("validating model {}", path.display()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::*;

    struct Fixture {
        dir: tempfile::TempDir,
        config: AppConfig,
    }

    fn fixture() -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let models = dir.path().join("models");
        std::fs::create_dir(&models).unwrap();
        std::fs::write(
            dir.path().join("gene_sets.json"),
            r#"{"DrugA": ["g1", "g2"], "DrugB": ["g1", "g3"], "DrugC": ["g4"]}"#,
        )
        .unwrap();
        std::fs::write(
            models.join("b_model.json"),
            r#"{"kind": "linear", "intercept": 0.0, "coefficients": [1.0, 1.0]}"#,
        )
        .unwrap();
        std::fs::write(
            models.join("a_model.json"),
            r#"{"kind": "linear", "intercept": 1.0, "coefficients": [1.0, 1.0]}"#,
        )
        .unwrap();

        let config = AppConfig {
            models_dir: PathBuf::from("models"),
            gene_sets: PathBuf::from("gene_sets.json"),
            model_names: BTreeMap::from([
                ("a_model.json".to_string(), "DrugA".to_string()),
                ("b_model.json".to_string(), "DrugB".to_string()),
            ]),
            examples: BTreeMap::new(),
            top_n: 10,
            important_genes: 10,
            base_dir: dir.path().to_path_buf(),
        };
        Fixture { dir, config }
    }

    fn registry_error(err: anyhow::Error) -> RegistryError {
        err.downcast_ref::<RegistryError>()
            .cloned()
            .unwrap_or_else(|| panic!("not a registry error: {err:#}"))
    }

    #[test]
    fn loads_in_file_name_order() {
        let fx = fixture();
        std::fs::write(fx.dir.path().join("models/.DS_Store"), "junk").unwrap();
        std::fs::create_dir(fx.dir.path().join("models/archive")).unwrap();

        let registry = Registry::load(&fx.config).unwrap();
        assert_eq!(registry.drug_names(), vec!["DrugA", "DrugB"]);
        let a = registry.iter().next().unwrap();
        assert_eq!(a.genes.genes(), &["g1", "g2"]);
        assert_eq!(a.predictor().predict(&[1.0, 2.0]).unwrap(), 4.0);
    }

    #[test]
    fn unmapped_file_is_rejected() {
        let fx = fixture();
        std::fs::write(
            fx.dir.path().join("models/c_model.json"),
            r#"{"kind": "linear", "coefficients": [1.0]}"#,
        )
        .unwrap();
        let err = Registry::load(&fx.config).unwrap_err();
        assert_eq!(
            registry_error(err),
            RegistryError::UnmappedModel("c_model.json".into())
        );
    }

    #[test]
    fn mapping_without_file_is_rejected() {
        let mut fx = fixture();
        fx.config
            .model_names
            .insert("z_model.json".into(), "DrugC".into());
        let err = Registry::load(&fx.config).unwrap_err();
        assert_eq!(
            registry_error(err),
            RegistryError::MissingModelFile("z_model.json".into())
        );
    }

    #[test]
    fn two_files_for_one_drug_are_rejected() {
        let mut fx = fixture();
        fx.config
            .model_names
            .insert("b_model.json".into(), "DrugA".into());
        let err = Registry::load(&fx.config).unwrap_err();
        assert_eq!(
            registry_error(err),
            RegistryError::DuplicateDrug("DrugA".into())
        );
    }

    #[test]
    fn drug_without_gene_set_is_rejected() {
        let mut fx = fixture();
        fx.config
            .model_names
            .insert("b_model.json".into(), "DrugX".into());
        let err = Registry::load(&fx.config).unwrap_err();
        assert_eq!(
            registry_error(err),
            RegistryError::MissingGeneSet("DrugX".into())
        );
    }

    #[test]
    fn coefficient_count_must_match_gene_set() {
        let mut fx = fixture();
        fx.config
            .model_names
            .insert("b_model.json".into(), "DrugC".into());
        let err = Registry::load(&fx.config).unwrap_err();
        assert_eq!(
            registry_error(err),
            RegistryError::FeatureMismatch {
                drug: "DrugC".into(),
                expected: 2,
                genes: 1,
            }
        );
    }

    #[test]
    fn empty_models_dir_is_rejected() {
        let fx = fixture();
        std::fs::remove_file(fx.dir.path().join("models/a_model.json")).unwrap();
        std::fs::remove_file(fx.dir.path().join("models/b_model.json")).unwrap();
        let mut config = fx.config.clone();
        config.model_names.clear();
        let err = Registry::load(&config).unwrap_err();
        assert!(matches!(registry_error(err), RegistryError::Empty(_)));
    }

    #[test]
    fn malformed_model_names_the_file() {
        let fx = fixture();
        std::fs::write(fx.dir.path().join("models/a_model.json"), "{not json").unwrap();
        let err = Registry::load(&fx.config).unwrap_err();
        assert!(format!("{err:#}").contains("a_model.json"));
    }

    #[test]
    fn builder_keeps_insertion_order() {
        let registry = Registry::new()
            .with_drug("Z", GeneSet::new(["g1"]), |x: &[f64]| x[0])
            .with_drug("A", GeneSet::new(["g1"]), |x: &[f64]| -x[0]);
        assert_eq!(registry.drug_names(), vec!["Z", "A"]);
        assert_eq!(registry.len(), 2);
    }
}

use std::path::{Path, PathBuf};

use thiserror::Error;

use super::loader::{load_file, ParseError};
use super::profile::Profile;
use crate::config::AppConfig;

#[derive(Debug, Error)]
pub enum PatientError {
    #[error("no example patient named '{0}'")]
    Unknown(String),
    #[error("loading example '{label}' from {path}: {source}")]
    Load {
        label: String,
        path: PathBuf,
        #[source]
        source: ParseError,
    },
}

/// The bundled example patients offered in the UI, in label order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PatientCatalog {
    entries: Vec<(String, PathBuf)>,
}

impl PatientCatalog {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            entries: config
                .example_paths()
                .map(|(label, path)| (label.to_string(), path))
                .collect(),
        }
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(label, _)| label.as_str())
    }

    pub fn path(&self, label: &str) -> Option<&Path> {
        self.entries
            .iter()
            .find(|(l, _)| l == label)
            .map(|(_, p)| p.as_path())
    }

    pub fn load(&self, label: &str) -> Result<Profile, PatientError> {
        let path = self
            .path(label)
            .ok_or_else(|| PatientError::Unknown(label.to_string()))?;
        load_file(path).map_err(|source| PatientError::Load {
            label: label.to_string(),
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;

    fn catalog(dir: &Path) -> PatientCatalog {
        let config = AppConfig {
            models_dir: PathBuf::from("models"),
            gene_sets: PathBuf::from("gene_sets.json"),
            model_names: BTreeMap::new(),
            examples: BTreeMap::from([
                ("patient2".to_string(), PathBuf::from("p2.csv")),
                ("patient1".to_string(), PathBuf::from("p1.csv")),
            ]),
            top_n: 10,
            important_genes: 10,
            base_dir: dir.to_path_buf(),
        };
        PatientCatalog::from_config(&config)
    }

    #[test]
    fn labels_are_sorted_and_load_csv() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("p1.csv"), "TP53,1.0\nKRAS,2.0\n").unwrap();
        let catalog = catalog(dir.path());

        assert_eq!(catalog.labels().collect::<Vec<_>>(), vec!["patient1", "patient2"]);
        let profile = catalog.load("patient1").unwrap();
        assert_eq!(profile.get("KRAS"), Some(2.0));
    }

    #[test]
    fn unknown_label_and_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = catalog(dir.path());
        assert!(matches!(catalog.load("patient9"), Err(PatientError::Unknown(_))));
        assert!(matches!(
            catalog.load("patient2"),
            Err(PatientError::Load {
                source: ParseError::Io(_),
                ..
            })
        ));
    }
}

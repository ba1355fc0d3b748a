//! Application configuration, read once at startup from a JSON file.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CONFIG_PATH: &str = "mecan.json";

/// Everything the app needs to build its registry and example catalog.
///
/// ```json
/// {
///   "models_dir": "data/models",
///   "gene_sets": "data/gene_sets.json",
///   "model_names": { "model_cisplatin.json": "Cisplatin" },
///   "examples": { "patient1": "data/examples/patient1.csv" },
///   "top_n": 10,
///   "important_genes": 10
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Directory scanned for model files.
    pub models_dir: PathBuf,
    /// JSON table of drug → ordered gene identifiers.
    pub gene_sets: PathBuf,
    /// Model file name → drug name.
    #[serde(default)]
    pub model_names: BTreeMap<String, String>,
    /// Example patient label → profile file.
    #[serde(default)]
    pub examples: BTreeMap<String, PathBuf>,
    /// How many drugs the ranking keeps.
    #[serde(default = "default_top_n")]
    pub top_n: usize,
    /// How many trailing genes of each gene set are shown as most important.
    #[serde(default = "default_important_genes")]
    pub important_genes: usize,
    /// Directory of the config file; relative paths are resolved against it.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

fn default_top_n() -> usize {
    10
}

fn default_important_genes() -> usize {
    10
}

impl AppConfig {
    /// Read and validate the configuration at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let mut config: AppConfig = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        config.validate()?;
        log::info!(
            "Loaded config {} ({} model names, {} examples)",
            path.display(),
            config.model_names.len(),
            config.examples.len()
        );
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.top_n == 0 {
            bail!("top_n must be at least 1");
        }
        if self.important_genes == 0 {
            bail!("important_genes must be at least 1");
        }
        Ok(())
    }

    /// Resolve a configured path against the config file's directory.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn models_dir(&self) -> PathBuf {
        self.resolve(&self.models_dir)
    }

    pub fn gene_sets_path(&self) -> PathBuf {
        self.resolve(&self.gene_sets)
    }

    /// Example labels with their resolved profile paths, in label order.
    pub fn example_paths(&self) -> impl Iterator<Item = (&str, PathBuf)> + '_ {
        self.examples
            .iter()
            .map(|(label, path)| (label.as_str(), self.resolve(path)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_and_relative_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mecan.json");
        std::fs::write(
            &path,
            r#"{
                "models_dir": "data/models",
                "gene_sets": "/opt/mecan/gene_sets.json",
                "examples": { "patient1": "data/examples/patient1.csv" }
            }"#,
        )
        .unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.top_n, 10);
        assert_eq!(config.important_genes, 10);
        assert!(config.model_names.is_empty());
        assert_eq!(config.models_dir(), dir.path().join("data/models"));
        assert_eq!(
            config.gene_sets_path(),
            PathBuf::from("/opt/mecan/gene_sets.json")
        );
        let examples: Vec<_> = config.example_paths().collect();
        assert_eq!(
            examples,
            vec![("patient1", dir.path().join("data/examples/patient1.csv"))]
        );
    }

    #[test]
    fn zero_top_n_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mecan.json");
        std::fs::write(
            &path,
            r#"{"models_dir": "m", "gene_sets": "g.json", "top_n": 0}"#,
        )
        .unwrap();
        let err = AppConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("top_n"));
    }

    #[test]
    fn missing_file_names_the_path() {
        let err = AppConfig::load(Path::new("/nonexistent/mecan.json")).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/mecan.json"));
    }
}

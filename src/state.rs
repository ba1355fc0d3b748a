use std::path::Path;

use anyhow::Result;

use crate::config::AppConfig;
use crate::data::loader;
use crate::data::patients::PatientCatalog;
use crate::data::profile::Profile;
use crate::model::Registry;
use crate::rank::{rank, RankOptions, Ranking};

/// Shown instead of a table when an upload cannot be decoded.
pub const PARSE_ERROR_MESSAGE: &str = "There was an error processing this file.";

// ---------------------------------------------------------------------------
// Read-only resources built once at startup
// ---------------------------------------------------------------------------

/// Models, example patients and ranking options shared by every request.
#[derive(Debug)]
pub struct Resources {
    pub registry: Registry,
    pub catalog: PatientCatalog,
    pub options: RankOptions,
}

impl Resources {
    pub fn load(config: &AppConfig) -> Result<Self> {
        Ok(Self {
            registry: Registry::load(config)?,
            catalog: PatientCatalog::from_config(config),
            options: RankOptions::from(config),
        })
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// Where the profile currently on screen came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ProfileSource {
    Upload {
        file_name: String,
        /// Local last-modified time, when the file system reports one.
        modified: Option<String>,
    },
    Example(String),
}

/// One uploaded file or example patient and what came of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileView {
    pub source: ProfileSource,

    /// The decoded profile, shown as uploaded.
    pub profile: Option<Profile>,

    /// Ranked drugs for this profile.
    pub ranking: Option<Ranking>,

    /// Status / error message shown in place of the ranking.
    pub status_message: Option<String>,
}

impl ProfileView {
    /// Read an uploaded file from disk and rank it.
    pub fn from_path(path: &Path, resources: &Resources) -> Self {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let modified = std::fs::metadata(path)
            .and_then(|m| m.modified())
            .ok()
            .map(format_timestamp);

        match std::fs::read(path) {
            Ok(bytes) => Self::from_bytes(&bytes, &file_name, modified, resources),
            Err(e) => {
                log::error!("Failed to read {}: {e}", path.display());
                Self::failed(ProfileSource::Upload { file_name, modified })
            }
        }
    }

    /// Decode uploaded bytes and rank them. A decode failure replaces the
    /// table with [`PARSE_ERROR_MESSAGE`].
    pub fn from_bytes(
        bytes: &[u8],
        file_name: &str,
        modified: Option<String>,
        resources: &Resources,
    ) -> Self {
        let source = ProfileSource::Upload {
            file_name: file_name.to_string(),
            modified,
        };
        match loader::normalize(bytes, file_name) {
            Ok(profile) => {
                log::info!("Loaded {file_name}: {} genes", profile.len());
                Self::ranked(profile, source, resources)
            }
            Err(e) => {
                log::error!("Failed to load {file_name}: {e}");
                Self::failed(source)
            }
        }
    }

    /// Load a bundled example patient and rank it.
    pub fn from_example(label: &str, resources: &Resources) -> Self {
        let source = ProfileSource::Example(label.to_string());
        match resources.catalog.load(label) {
            Ok(profile) => Self::ranked(profile, source, resources),
            Err(e) => {
                log::error!("{e}");
                Self::failed(source)
            }
        }
    }

    fn ranked(profile: Profile, source: ProfileSource, resources: &Resources) -> Self {
        match rank(&profile, &resources.registry, &resources.options) {
            Ok(ranking) => Self {
                source,
                profile: Some(profile),
                ranking: Some(ranking),
                status_message: None,
            },
            Err(e) => {
                log::error!("{e}");
                Self {
                    source,
                    profile: Some(profile),
                    ranking: None,
                    status_message: Some(format!("Prediction failed: {e}")),
                }
            }
        }
    }

    fn failed(source: ProfileSource) -> Self {
        Self {
            source,
            profile: None,
            ranking: None,
            status_message: Some(PARSE_ERROR_MESSAGE.to_string()),
        }
    }

    /// Display name of the file or example.
    pub fn title(&self) -> &str {
        match &self.source {
            ProfileSource::Upload { file_name, .. } => file_name,
            ProfileSource::Example(label) => label,
        }
    }

    /// Number of genes in the profile, zero when it could not be decoded.
    pub fn gene_count(&self) -> usize {
        self.profile.as_ref().map_or(0, Profile::len)
    }

    /// Data-quality note when some predictions used zero-filled genes.
    pub fn zero_fill_note(&self) -> Option<String> {
        let ranking = self.ranking.as_ref()?;
        let affected = ranking.zero_filled().count();
        (affected > 0).then(|| {
            format!(
                "{affected} of {} ranked drugs were predicted with genes missing from this \
                 profile; those genes were set to 0.",
                ranking.len()
            )
        })
    }
}

fn format_timestamp(t: std::time::SystemTime) -> String {
    chrono::DateTime::<chrono::Local>::from(t)
        .format("%Y-%m-%d %H:%M:%S")
        .to_string()
}

/// The full UI state, independent of rendering.
#[derive(Debug, Default)]
pub struct AppState {
    /// One entry per file of the last upload, or the chosen example.
    pub results: Vec<ProfileView>,

    /// Example chosen in the dropdown, if the results came from one.
    pub selected_example: Option<String>,
}

impl AppState {
    /// Replace the results with one entry per uploaded file, in upload order.
    pub fn show_uploads(&mut self, results: Vec<ProfileView>) {
        self.selected_example = None;
        self.results = results;
    }

    /// Read and rank every file in `paths`.
    pub fn open_files<P: AsRef<Path>>(&mut self, paths: &[P], resources: &Resources) {
        let results = paths
            .iter()
            .map(|p| ProfileView::from_path(p.as_ref(), resources))
            .collect();
        self.show_uploads(results);
    }

    pub fn open_file(&mut self, path: &Path, resources: &Resources) {
        self.open_files(&[path], resources);
    }

    pub fn open_bytes(
        &mut self,
        bytes: &[u8],
        file_name: &str,
        modified: Option<String>,
        resources: &Resources,
    ) {
        let view = ProfileView::from_bytes(bytes, file_name, modified, resources);
        self.show_uploads(vec![view]);
    }

    pub fn select_example(&mut self, label: &str, resources: &Resources) {
        self.selected_example = Some(label.to_string());
        self.results = vec![ProfileView::from_example(label, resources)];
    }

    /// Number of results that show an error instead of a ranking.
    pub fn failures(&self) -> usize {
        self.results.iter().filter(|r| r.ranking.is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    use super::*;
    use crate::model::GeneSet;

    fn sum(x: &[f64]) -> f64 {
        x.iter().sum()
    }

    fn resources(catalog: PatientCatalog) -> Resources {
        Resources {
            registry: Registry::new()
                .with_drug("DrugA", GeneSet::new(["g1", "g2"]), sum)
                .with_drug("DrugB", GeneSet::new(["g1", "g3"]), sum),
            catalog,
            options: RankOptions::default(),
        }
    }

    fn catalog_config(dir: &Path) -> AppConfig {
        AppConfig {
            models_dir: PathBuf::from("models"),
            gene_sets: PathBuf::from("gene_sets.json"),
            model_names: BTreeMap::new(),
            examples: BTreeMap::from([("patient1".to_string(), PathBuf::from("patient1.csv"))]),
            top_n: 10,
            important_genes: 10,
            base_dir: dir.to_path_buf(),
        }
    }

    #[test]
    fn upload_is_ranked_and_kept() {
        let res = resources(PatientCatalog::default());
        let mut state = AppState::default();
        state.open_bytes(b"g1,1.0\ng2,2.0\n", "me.csv", None, &res);

        assert_eq!(state.results.len(), 1);
        let view = &state.results[0];
        assert_eq!(view.title(), "me.csv");
        assert_eq!(view.ranking.as_ref().unwrap().entries[0].drug, "DrugB");
        assert_eq!(view.gene_count(), 2);
        assert_eq!(view.profile.as_ref().unwrap().row(1), Some(("g2", Some(2.0))));
        assert_eq!(view.status_message, None);
        assert!(view.zero_fill_note().unwrap().starts_with("1 of 2"));
    }

    #[test]
    fn unreadable_upload_shows_message_instead_of_table() {
        let res = resources(PatientCatalog::default());
        let mut state = AppState::default();
        state.open_bytes(b"g1,1.0\n", "me.csv", None, &res);
        assert!(state.results[0].ranking.is_some());

        state.open_bytes(&[0xff, 0xfe, 0x00, 0x81], "data.csv", None, &res);
        let view = &state.results[0];
        assert!(view.ranking.is_none());
        assert!(view.profile.is_none());
        assert_eq!(view.status_message.as_deref(), Some(PARSE_ERROR_MESSAGE));
        assert_eq!(
            view.source,
            ProfileSource::Upload {
                file_name: "data.csv".into(),
                modified: None,
            }
        );
        assert_eq!(state.failures(), 1);
    }

    #[test]
    fn several_uploads_each_get_a_result() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("a.csv");
        let bad = dir.path().join("b.csv");
        let other = dir.path().join("c.tsv");
        std::fs::write(&good, "g1,1.0\ng2,2.0\n").unwrap();
        std::fs::write(&bad, [0xffu8, 0xfe, 0x00]).unwrap();
        std::fs::write(&other, "g3\t-4\n").unwrap();

        let res = resources(PatientCatalog::default());
        let mut state = AppState::default();
        state.selected_example = Some("patient1".into());
        state.open_files(&[&good, &bad, &other], &res);

        let titles: Vec<_> = state.results.iter().map(ProfileView::title).collect();
        assert_eq!(titles, vec!["a.csv", "b.csv", "c.tsv"]);
        assert!(state.results[0].ranking.is_some());
        assert_eq!(
            state.results[1].status_message.as_deref(),
            Some(PARSE_ERROR_MESSAGE)
        );
        assert_eq!(
            state.results[2].ranking.as_ref().unwrap().entries[0].drug,
            "DrugB"
        );
        assert_eq!(state.failures(), 1);
        assert_eq!(state.selected_example, None);
    }

    #[test]
    fn example_selection_and_file_open() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("patient1.csv"), "g1,0.5\ng2,0.5\ng3,4\n").unwrap();
        let res = resources(PatientCatalog::from_config(&catalog_config(dir.path())));
        let mut state = AppState::default();

        state.select_example("patient1", &res);
        assert_eq!(state.selected_example.as_deref(), Some("patient1"));
        let view = &state.results[0];
        assert_eq!(view.ranking.as_ref().unwrap().entries[0].drug, "DrugA");
        assert_eq!(view.zero_fill_note(), None);

        state.open_file(&dir.path().join("patient1.csv"), &res);
        assert_eq!(state.selected_example, None);
        match &state.results[0].source {
            ProfileSource::Upload { file_name, modified } => {
                assert_eq!(file_name, "patient1.csv");
                assert!(modified.is_some());
            }
            other => panic!("unexpected source {other:?}"),
        }
    }

    #[test]
    fn missing_example_file_shows_message() {
        let dir = tempfile::tempdir().unwrap();
        let res = resources(PatientCatalog::from_config(&catalog_config(dir.path())));
        let mut state = AppState::default();
        state.select_example("patient1", &res);
        assert_eq!(state.results.len(), 1);
        assert!(state.results[0].ranking.is_none());
        assert_eq!(
            state.results[0].status_message.as_deref(),
            Some(PARSE_ERROR_MESSAGE)
        );
    }

    #[test]
    fn unreadable_path_is_reported_per_file() {
        let dir = tempfile::tempdir().unwrap();
        let res = resources(PatientCatalog::default());
        let mut state = AppState::default();
        state.open_file(&dir.path().join("gone.csv"), &res);
        assert_eq!(state.results[0].title(), "gone.csv");
        assert_eq!(
            state.results[0].status_message.as_deref(),
            Some(PARSE_ERROR_MESSAGE)
        );
    }
}

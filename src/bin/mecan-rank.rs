//! Rank drugs for one profile without the UI.

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use arrow::util::pretty::pretty_format_batches;
use clap::{Parser, ValueEnum};
use mecan::config::{AppConfig, DEFAULT_CONFIG_PATH};
use mecan::data::loader;
use mecan::data::patients::PatientError;
use mecan::data::profile::Profile;
use mecan::rank::rank;
use mecan::state::{Resources, PARSE_ERROR_MESSAGE};

/// Rank chemotherapy drugs by predicted IC50 for a gene expression profile
#[derive(Parser, Debug)]
#[command(name = "mecan-rank")]
#[command(version)]
struct Args {
    /// Configuration file (models, gene sets, example patients)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Profile to rank (CSV, TSV, XLS/XLSX, Parquet or JSON)
    #[arg(required_unless_present = "example", conflicts_with = "example")]
    profile: Option<PathBuf>,

    /// Rank a bundled example patient instead, e.g. `patient1`
    #[arg(short, long)]
    example: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    format: Format,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Json,
}

/// Decode the requested profile. Undecodable files, uploaded or bundled,
/// report [`PARSE_ERROR_MESSAGE`].
fn load_profile(
    path: Option<&Path>,
    example: Option<&str>,
    resources: &Resources,
) -> Result<Profile> {
    match (path, example) {
        (Some(path), _) => match loader::load_file(path) {
            Ok(profile) => Ok(profile),
            Err(e) => {
                log::error!("{}: {e}", path.display());
                bail!("{PARSE_ERROR_MESSAGE} ({e})");
            }
        },
        (None, Some(label)) => match resources.catalog.load(label) {
            Ok(profile) => Ok(profile),
            Err(e @ PatientError::Load { .. }) => {
                log::error!("{e}");
                bail!("{PARSE_ERROR_MESSAGE} ({e})");
            }
            Err(e) => Err(e.into()),
        },
        (None, None) => bail!("either a profile path or --example is required"),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    let config = AppConfig::load(&args.config)?;
    let resources = Resources::load(&config)?;

    let profile = load_profile(args.profile.as_deref(), args.example.as_deref(), &resources)?;
    let ranking = rank(&profile, &resources.registry, &resources.options)?;

    match args.format {
        Format::Json => println!("{}", serde_json::to_string_pretty(&ranking)?),
        Format::Table => {
            let batch = ranking.to_record_batch()?;
            println!("{}", pretty_format_batches(&[batch])?);
            let zero_filled = ranking.zero_filled().count();
            if zero_filled > 0 {
                eprintln!(
                    "note: {zero_filled} of {} drugs used genes missing from the profile (set to 0)",
                    ranking.len()
                );
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use mecan::data::patients::PatientCatalog;
    use mecan::model::Registry;
    use mecan::rank::RankOptions;

    use super::*;

    fn resources(dir: &Path) -> Resources {
        let config = AppConfig {
            models_dir: PathBuf::from("models"),
            gene_sets: PathBuf::from("gene_sets.json"),
            model_names: BTreeMap::new(),
            examples: BTreeMap::from([
                ("patient1".to_string(), PathBuf::from("patient1.csv")),
                ("broken".to_string(), PathBuf::from("broken.csv")),
            ]),
            top_n: 10,
            important_genes: 10,
            base_dir: dir.to_path_buf(),
        };
        Resources {
            registry: Registry::new(),
            catalog: PatientCatalog::from_config(&config),
            options: RankOptions::default(),
        }
    }

    #[test]
    fn undecodable_example_reports_parse_message() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("broken.csv"), [0xffu8, 0xfe, 0x00]).unwrap();
        let res = resources(dir.path());

        let err = load_profile(None, Some("broken"), &res).unwrap_err();
        assert!(err.to_string().starts_with(PARSE_ERROR_MESSAGE));
    }

    #[test]
    fn undecodable_path_reports_parse_message() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.csv");
        std::fs::write(&path, "g1,1\ng2,high\n").unwrap();
        let res = resources(dir.path());

        let err = load_profile(Some(path.as_path()), None, &res).unwrap_err();
        assert!(err.to_string().starts_with(PARSE_ERROR_MESSAGE));
    }

    #[test]
    fn unknown_example_is_not_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let res = resources(dir.path());

        let err = load_profile(None, Some("patient9"), &res).unwrap_err();
        assert!(err.to_string().contains("patient9"));
        assert!(!err.to_string().starts_with(PARSE_ERROR_MESSAGE));
    }

    #[test]
    fn example_is_loaded_by_label() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("patient1.csv"), "TP53,0.5\n").unwrap();
        let res = resources(dir.path());

        let profile = load_profile(None, Some("patient1"), &res).unwrap();
        assert_eq!(profile.get("TP53"), Some(0.5));
    }
}

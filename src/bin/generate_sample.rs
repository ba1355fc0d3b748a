//! Write a small, reproducible demo data set: config, gene sets, one model
//! per drug and three example patients.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Parser;
use mecan::config::AppConfig;
use mecan::model::tree::{Aggregation, Node, Tree};
use mecan::model::{GeneSet, GeneSets, LinearModel, ModelSpec, TreeEnsemble};

const GENES: &[&str] = &[
    "TP53", "BRCA1", "BRCA2", "EGFR", "KRAS", "MYC", "PTEN", "PIK3CA", "ERBB2", "CDKN2A",
    "RB1", "ATM", "ABCB1", "ABCC1", "ABCG2", "TOP1", "TOP2A", "TUBB3", "ERCC1", "XRCC1",
    "MGMT", "DPYD", "TYMS", "RRM1", "DCK", "GSTP1", "MLH1", "MSH2", "BCL2", "BAX",
    "CASP3", "MDM2", "CCND1", "CDK4", "MKI67", "VEGFA", "HIF1A", "SLC29A1", "CES2", "UGT1A1",
];

const DRUGS: &[&str] = &[
    "Cisplatin", "Carboplatin", "Oxaliplatin", "Paclitaxel", "Docetaxel", "Doxorubicin",
    "Etoposide", "Gemcitabine", "Fluorouracil", "Methotrexate", "Vinorelbine", "Irinotecan",
    "Temozolomide", "Topotecan",
];

const GENES_PER_DRUG: usize = 20;

/// Write a demo MeCan data set
#[derive(Parser, Debug)]
#[command(name = "generate_sample")]
struct Args {
    /// Output directory
    #[arg(default_value = ".")]
    out: PathBuf,
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_u64() % n as u64) as usize
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }

    /// `k` distinct genes in random order.
    fn pick_genes(&mut self, k: usize) -> Vec<String> {
        let mut pool: Vec<&str> = GENES.to_vec();
        for i in (1..pool.len()).rev() {
            let j = self.below(i + 1);
            pool.swap(i, j);
        }
        pool.into_iter().take(k).map(str::to_string).collect()
    }
}

fn linear_model(rng: &mut SimpleRng, n: usize) -> ModelSpec {
    ModelSpec::Linear(LinearModel {
        intercept: rng.gauss(3.0, 1.0),
        coefficients: (0..n).map(|_| rng.gauss(0.0, 0.4)).collect(),
    })
}

/// Depth-two trees averaged like a random forest.
fn forest_model(rng: &mut SimpleRng, n: usize, n_trees: usize) -> ModelSpec {
    let trees = (0..n_trees)
        .map(|_| {
            let split = |left, right, rng: &mut SimpleRng| Node::Split {
                feature: rng.below(n),
                threshold: rng.gauss(0.0, 0.5),
                left,
                right,
            };
            let root = split(1, 2, rng);
            let low = split(3, 4, rng);
            let high = split(5, 6, rng);
            let mut nodes = vec![root, low, high];
            nodes.extend((0..4).map(|_| Node::Leaf {
                value: rng.gauss(0.0, 1.5),
            }));
            Tree { nodes }
        })
        .collect();

    ModelSpec::TreeEnsemble(TreeEnsemble {
        n_features: Some(n),
        base_score: rng.gauss(3.0, 1.0),
        aggregation: Aggregation::Mean,
        trees,
    })
}

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let text = serde_json::to_string_pretty(value)?;
    std::fs::write(path, text).with_context(|| format!("writing {}", path.display()))
}

fn write_patient(path: &Path, rng: &mut SimpleRng, shift: f64, dropped: &[&str]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;
    for (i, gene) in GENES.iter().enumerate() {
        if dropped.contains(gene) {
            continue;
        }
        // Every ninth gene of a shifted patient is left unmeasured.
        let value = if shift != 0.0 && i % 9 == 8 {
            "NA".to_string()
        } else {
            format!("{:.4}", rng.gauss(shift, 1.0))
        };
        writer.write_record([*gene, value.as_str()])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut rng = SimpleRng::new(42);

    let data_dir = args.out.join("data");
    let models_dir = data_dir.join("models");
    let examples_dir = data_dir.join("examples");
    std::fs::create_dir_all(&models_dir)?;
    std::fs::create_dir_all(&examples_dir)?;

    let mut gene_sets = GeneSets::default();
    let mut model_names = BTreeMap::new();
    for (i, drug) in DRUGS.iter().enumerate() {
        let genes = rng.pick_genes(GENES_PER_DRUG);
        let spec = if i % 2 == 0 {
            linear_model(&mut rng, genes.len())
        } else {
            forest_model(&mut rng, genes.len(), 8)
        };
        let file_name = format!("model_{}.json", drug.to_ascii_lowercase());
        write_json(&models_dir.join(&file_name), &spec)?;
        model_names.insert(file_name, drug.to_string());
        gene_sets.insert(*drug, GeneSet::new(genes));
    }
    write_json(&data_dir.join("gene_sets.json"), &gene_sets)?;

    let patients: [(&str, f64, &[&str]); 3] = [
        ("patient1", 0.0, &[]),
        ("patient2", 0.8, &[]),
        ("patient3", -0.5, &["ABCB1", "ERCC1", "TYMS"]),
    ];
    let mut examples = BTreeMap::new();
    for (label, shift, dropped) in patients {
        let rel = PathBuf::from("data/examples").join(format!("{label}.csv"));
        write_patient(&args.out.join(&rel), &mut rng, shift, dropped)?;
        examples.insert(label.to_string(), rel);
    }

    let config = AppConfig {
        models_dir: PathBuf::from("data/models"),
        gene_sets: PathBuf::from("data/gene_sets.json"),
        model_names,
        examples,
        top_n: 10,
        important_genes: 10,
        base_dir: PathBuf::new(),
    };
    let config_path = args.out.join("mecan.json");
    write_json(&config_path, &config)?;

    println!(
        "Wrote {} drug models, {} example patients and {}",
        DRUGS.len(),
        config.examples.len(),
        config_path.display()
    );
    Ok(())
}

/// Data layer: patient profiles, decoding, and the bundled example patients.
///
/// Architecture:
/// ```text
///  .csv / .tsv / .xls / .xlsx / .parquet / .json
///        │
///        ▼
///   ┌──────────┐
///   │  loader   │  decode bytes → Profile
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ Profile   │  gene id → expression value (or missing)
///   └──────────┘
///        │
///        ▼
///   ┌──────────┐
///   │ reindex   │  per-drug gene list → feature vector
///   └──────────┘
/// ```

pub mod loader;
pub mod patients;
pub mod profile;

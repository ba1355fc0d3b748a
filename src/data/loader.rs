use std::fmt;
use std::io::{Cursor, Read, Seek};
use std::path::Path;

use arrow::array::{Array, ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type};
use calamine::{DataType as XlCell, Reader, Xls, Xlsx};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::de::{Deserialize, Deserializer, MapAccess, Visitor};
use serde_json::Value as JsonValue;
use thiserror::Error;

use super::profile::Profile;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why an uploaded profile could not be decoded.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unsupported file type: '{0}'")]
    UnsupportedFormat(String),
    #[error("file is not UTF-8 text: {0}")]
    Encoding(#[from] std::str::Utf8Error),
    #[error("CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("Excel: {0}")]
    Excel(String),
    #[error("Parquet: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),
    #[error("Arrow: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Layout(String),
    #[error("row {row}: '{value}' is not a number")]
    InvalidValue { row: usize, value: String },
    #[error("row {row}: value without a gene identifier")]
    MissingGeneId { row: usize },
    #[error("duplicate gene identifier '{0}'")]
    DuplicateGene(String),
    #[error("profile contains no genes")]
    Empty,
    #[error("reading file: {0}")]
    Io(#[from] std::io::Error),
}

// ---------------------------------------------------------------------------
// Public entry-points
// ---------------------------------------------------------------------------

/// Decode an uploaded profile. The format is picked from the extension of
/// `filename`.
///
/// Supported formats:
/// * `.csv` / `.tsv` – no header; gene identifier, then value
/// * `.xls` / `.xlsx` – first worksheet, same row layout as CSV
/// * `.parquet`      – first column gene identifier, second column value
/// * `.json`         – `{ "TP53": 1.25, "BRCA1": null, ... }`
pub fn normalize(bytes: &[u8], filename: &str) -> Result<Profile, ParseError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let profile = match ext.as_str() {
        "csv" => load_delimited(bytes, b',')?,
        "tsv" => load_delimited(bytes, b'\t')?,
        "xlsx" | "xlsm" => load_excel(Xlsx::new(Cursor::new(bytes)).map_err(excel_err)?)?,
        "xls" => load_excel(Xls::new(Cursor::new(bytes)).map_err(excel_err)?)?,
        "parquet" | "pq" => load_parquet(bytes)?,
        "json" => load_json(bytes)?,
        other => return Err(ParseError::UnsupportedFormat(other.to_string())),
    };

    if profile.is_empty() {
        return Err(ParseError::Empty);
    }
    log::debug!(
        "Decoded {filename}: {} genes, {} missing values",
        profile.len(),
        profile.missing_count()
    );
    Ok(profile)
}

/// Read a profile from disk, using the file name as the format hint.
pub fn load_file(path: &Path) -> Result<Profile, ParseError> {
    let bytes = std::fs::read(path)?;
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    normalize(&bytes, &name)
}

// ---------------------------------------------------------------------------
// Row assembly shared by every format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Cell {
    Text(String),
    Number(f64),
    Empty,
}

impl Cell {
    fn is_blank(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            Cell::Number(_) => false,
        }
    }
}

const MISSING_MARKERS: &[&str] = &["na", "n/a", "nan", "null"];

enum Value {
    Present(f64),
    Missing,
    NotNumeric(String),
}

fn parse_value(cell: &Cell) -> Value {
    match cell {
        Cell::Empty => Value::Missing,
        Cell::Number(v) if v.is_nan() => Value::Missing,
        Cell::Number(v) => Value::Present(*v),
        Cell::Text(s) => {
            let s = s.trim();
            if s.is_empty() || MISSING_MARKERS.contains(&s.to_ascii_lowercase().as_str()) {
                Value::Missing
            } else {
                match s.parse::<f64>() {
                    Ok(v) => Value::Present(v),
                    Err(_) => Value::NotNumeric(s.to_string()),
                }
            }
        }
    }
}

/// Gene identifiers stored as numbers (Entrez IDs in spreadsheets) are
/// written without a fractional part.
fn gene_id(cell: &Cell) -> Option<String> {
    match cell {
        Cell::Empty => None,
        Cell::Text(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Cell::Number(v) if v.fract() == 0.0 && v.abs() < 1e15 => Some(format!("{}", *v as i64)),
        Cell::Number(v) => Some(v.to_string()),
    }
}

/// Turn raw rows into a profile. Row numbers in errors are 1-based.
///
/// The first non-blank row may be a header: if its value cell is text that
/// is neither a number nor a missing marker, it is skipped.
fn collect_rows<I>(rows: I) -> Result<Profile, ParseError>
where
    I: IntoIterator<Item = Result<Vec<Cell>, ParseError>>,
{
    let mut profile = Profile::default();
    let mut seen_row = false;
    let mut warned_extra = false;

    for (i, row) in rows.into_iter().enumerate() {
        let row_no = i + 1;
        let cells = row?;
        if cells.iter().all(Cell::is_blank) {
            continue;
        }

        if !warned_extra && cells.iter().skip(2).any(|c| !c.is_blank()) {
            log::warn!("Profile has more than two columns; only the first value column is used");
            warned_extra = true;
        }

        let gene = cells.first().and_then(gene_id);
        let value = match cells.get(1).map(parse_value).unwrap_or(Value::Missing) {
            Value::Present(v) => Some(v),
            Value::Missing => None,
            Value::NotNumeric(text) if !seen_row => {
                log::warn!("Skipping header row ({text:?} is not a number)");
                seen_row = true;
                continue;
            }
            Value::NotNumeric(text) => {
                return Err(ParseError::InvalidValue {
                    row: row_no,
                    value: text,
                })
            }
        };
        seen_row = true;

        match gene {
            Some(gene) => profile.push(gene, value)?,
            None if value.is_some() => return Err(ParseError::MissingGeneId { row: row_no }),
            None => continue,
        }
    }

    Ok(profile)
}

// ---------------------------------------------------------------------------
// CSV / TSV loader
// ---------------------------------------------------------------------------

fn load_delimited(bytes: &[u8], delimiter: u8) -> Result<Profile, ParseError> {
    let text = std::str::from_utf8(bytes)?;
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let rows = reader.records().map(|record| -> Result<Vec<Cell>, ParseError> {
        let record = record?;
        Ok(record
            .iter()
            .map(|field| {
                if field.trim().is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(field.to_string())
                }
            })
            .collect())
    });
    collect_rows(rows)
}

// ---------------------------------------------------------------------------
// Excel loader
// ---------------------------------------------------------------------------

fn excel_err(e: impl std::fmt::Display) -> ParseError {
    ParseError::Excel(e.to_string())
}

fn excel_cell(cell: &XlCell) -> Cell {
    match cell {
        XlCell::Empty | XlCell::Error(_) => Cell::Empty,
        XlCell::Float(v) => Cell::Number(*v),
        XlCell::Int(i) => Cell::Number(*i as f64),
        XlCell::String(s) => Cell::Text(s.clone()),
        XlCell::Bool(b) => Cell::Text(b.to_string()),
        other => Cell::Text(other.to_string()),
    }
}

fn load_excel<R, RS>(mut workbook: R) -> Result<Profile, ParseError>
where
    R: Reader<RS>,
    RS: Read + Seek,
    R::Error: std::fmt::Display,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| ParseError::Excel("workbook has no worksheets".into()))?
        .map_err(excel_err)?;

    let rows: Vec<Result<Vec<Cell>, ParseError>> = range
        .rows()
        .map(|row| Ok(row.iter().map(excel_cell).collect()))
        .collect();
    collect_rows(rows)
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Expected schema: column 0 gene identifier (string or integer), column 1
/// numeric value. Further columns are ignored. Works with files written by
/// both **Pandas** (`df.to_parquet()`) and **Polars** (`df.write_parquet()`)
/// as long as the gene index is written as a regular column.
fn load_parquet(bytes: &[u8]) -> Result<Profile, ParseError> {
    let data = bytes::Bytes::copy_from_slice(bytes);
    let reader = ParquetRecordBatchReaderBuilder::try_new(data)?.build()?;

    let mut rows: Vec<Result<Vec<Cell>, ParseError>> = Vec::new();
    for batch in reader {
        let batch = batch?;
        if batch.num_columns() < 2 {
            return Err(ParseError::Layout(format!(
                "Parquet profile needs a gene and a value column, found {}",
                batch.num_columns()
            )));
        }
        if batch.num_columns() > 2 {
            log::warn!("Parquet profile has {} columns; using the first two", batch.num_columns());
        }

        let genes = gene_cells(batch.column(0))?;
        let values = cast(batch.column(1), &DataType::Float64).map_err(|e| {
            ParseError::Layout(format!(
                "Parquet value column is {}, not numeric ({e})",
                batch.column(1).data_type()
            ))
        })?;
        let values = values.as_primitive::<Float64Type>();

        for (row, gene) in genes.into_iter().enumerate() {
            let value = if values.is_null(row) {
                Cell::Empty
            } else {
                Cell::Number(values.value(row))
            };
            rows.push(Ok(vec![gene, value]));
        }
    }
    collect_rows(rows)
}

/// Numeric gene columns stay numbers so [`gene_id`] formats them the same
/// way as spreadsheet cells.
fn gene_cells(column: &ArrayRef) -> Result<Vec<Cell>, ParseError> {
    if column.data_type().is_numeric() {
        let ids = cast(column, &DataType::Float64)?;
        let ids = ids.as_primitive::<Float64Type>();
        Ok((0..ids.len())
            .map(|i| {
                if ids.is_null(i) {
                    Cell::Empty
                } else {
                    Cell::Number(ids.value(i))
                }
            })
            .collect())
    } else {
        let ids = cast(column, &DataType::Utf8)?;
        let ids = ids.as_string::<i32>();
        Ok((0..ids.len())
            .map(|i| {
                if ids.is_null(i) {
                    Cell::Empty
                } else {
                    Cell::Text(ids.value(i).to_string())
                }
            })
            .collect())
    }
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Object members in document order, repeated keys included.
struct JsonEntries(Vec<(String, JsonValue)>);

impl<'de> Deserialize<'de> for JsonEntries {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct EntriesVisitor;

        impl<'de> Visitor<'de> for EntriesVisitor {
            type Value = JsonEntries;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping gene identifiers to values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<JsonEntries, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<String, JsonValue>()? {
                    entries.push(entry);
                }
                Ok(JsonEntries(entries))
            }
        }

        deserializer.deserialize_map(EntriesVisitor)
    }
}

/// Expected JSON: a single object mapping gene identifier to a number, a
/// numeric string or `null`.
fn load_json(bytes: &[u8]) -> Result<Profile, ParseError> {
    let JsonEntries(entries) = serde_json::from_slice(bytes)?;

    let mut profile = Profile::default();
    for (i, (gene, val)) in entries.into_iter().enumerate() {
        let cell = match val {
            JsonValue::Null => Cell::Empty,
            JsonValue::Number(n) => n.as_f64().map(Cell::Number).unwrap_or(Cell::Empty),
            JsonValue::String(s) => Cell::Text(s),
            other => Cell::Text(other.to_string()),
        };
        let value = match parse_value(&cell) {
            Value::Present(v) => Some(v),
            Value::Missing => None,
            Value::NotNumeric(text) => {
                return Err(ParseError::InvalidValue {
                    row: i + 1,
                    value: text,
                })
            }
        };
        profile.push(gene, value)?;
    }
    Ok(profile)
}

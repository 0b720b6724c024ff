//! Dataset persistence
//!
//! Loading and saving are plain blocking calls behind [`DatasetStore`]; the
//! interpreter never looks at the bytes on disk.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::debug;

use crate::error::{Error, Result};
use crate::runtime::{Dataset, Value};

/// On-disk dataset format of a library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    /// One JSON document per dataset
    #[default]
    Json,
    /// One CSV file per dataset, header row first
    Csv,
}

impl Engine {
    /// Engine by LIBNAME name (case-insensitive)
    pub fn from_name(name: &str) -> Option<Engine> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(Engine::Json),
            "csv" => Some(Engine::Csv),
            _ => None,
        }
    }

    /// File extension used for datasets of this engine
    pub fn extension(&self) -> &'static str {
        match self {
            Engine::Json => "json",
            Engine::Csv => "csv",
        }
    }

    /// Codec implementing this engine
    pub fn store(&self) -> Box<dyn DatasetStore> {
        match self {
            Engine::Json => Box::new(JsonStore),
            Engine::Csv => Box::new(CsvStore),
        }
    }
}

/// Load/save boundary for one on-disk format
pub trait DatasetStore {
    /// Engine name used in diagnostics
    fn engine(&self) -> &'static str;

    /// Reads a dataset; its name is taken from the file stem
    fn load(&self, path: &Path) -> Result<Dataset>;

    /// Writes a dataset, replacing any existing file
    fn save(&self, dataset: &Dataset, path: &Path) -> Result<()>;
}

/// JSON engine (serde_json)
pub struct JsonStore;

impl DatasetStore for JsonStore {
    fn engine(&self) -> &'static str {
        "json"
    }

    fn load(&self, path: &Path) -> Result<Dataset> {
        let text = fs::read_to_string(path).map_err(|e| Error::io(path, &e))?;
        let mut dataset: Dataset =
            serde_json::from_str(&text).map_err(|e| Error::codec(self.engine(), e))?;
        if dataset.name.is_empty() {
            dataset.name = file_stem(path);
        }
        debug!(path = %path.display(), rows = dataset.len(), "loaded dataset");
        Ok(dataset)
    }

    fn save(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let text =
            serde_json::to_string_pretty(dataset).map_err(|e| Error::codec(self.engine(), e))?;
        fs::write(path, text).map_err(|e| Error::io(path, &e))?;
        debug!(path = %path.display(), rows = dataset.len(), "saved dataset");
        Ok(())
    }
}

/// CSV engine (csv crate)
///
/// Character columns are marked with a `$` suffix on their header name and
/// numeric missing is written as `.`. Unmarked columns of files written
/// elsewhere are numeric when every non-blank cell parses as a number or is
/// `.`, otherwise character.
pub struct CsvStore;

impl DatasetStore for CsvStore {
    fn engine(&self) -> &'static str {
        "csv"
    }

    fn load(&self, path: &Path) -> Result<Dataset> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_path(path)
            .map_err(|e| csv_error(path, e))?;

        let mut headers = Vec::new();
        let mut marked = Vec::new();
        for header in reader.headers().map_err(|e| csv_error(path, e))?.iter() {
            let header = header.trim();
            match header.strip_suffix(CHARACTER_MARK) {
                Some(name) => {
                    headers.push(name.trim_end().to_string());
                    marked.push(true);
                }
                None => {
                    headers.push(header.to_string());
                    marked.push(false);
                }
            }
        }

        let mut cells: Vec<Vec<String>> = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| csv_error(path, e))?;
            cells.push(record.iter().map(|c| c.to_string()).collect());
        }

        let numeric: Vec<bool> = (0..headers.len())
            .map(|col| {
                !marked[col]
                    && cells.iter().all(|row| {
                        let cell = row.get(col).map(|c| c.trim()).unwrap_or("");
                        cell.is_empty() || cell == "." || cell.parse::<f64>().is_ok()
                    })
            })
            .collect();

        let mut dataset = Dataset::with_columns(file_stem(path), headers.clone());
        for row in cells {
            let values = headers
                .iter()
                .enumerate()
                .map(|(col, name)| {
                    let cell = row.get(col).map(String::as_str).unwrap_or("");
                    let value = if numeric[col] {
                        cell.trim().parse::<f64>().map(Value::Numeric).unwrap_or_else(|_| Value::missing())
                    } else {
                        Value::Character(cell.to_string())
                    };
                    (name.clone(), value)
                })
                .collect();
            dataset.push_row(values);
        }

        debug!(path = %path.display(), rows = dataset.len(), "loaded dataset");
        Ok(dataset)
    }

    fn save(&self, dataset: &Dataset, path: &Path) -> Result<()> {
        let mut writer = csv::Writer::from_path(path).map_err(|e| csv_error(path, e))?;
        let character: Vec<bool> = dataset
            .columns()
            .iter()
            .map(|column| is_character_column(dataset, column))
            .collect();
        let header: Vec<String> = dataset
            .columns()
            .iter()
            .zip(&character)
            .map(|(column, &is_char)| {
                if is_char {
                    format!("{}{}", column, CHARACTER_MARK)
                } else {
                    column.clone()
                }
            })
            .collect();
        writer
            .write_record(&header)
            .map_err(|e| csv_error(path, e))?;
        for i in 0..dataset.len() {
            let record: Vec<String> = dataset
                .ordered_row(i)
                .iter()
                .zip(&character)
                .map(|(value, &is_char)| match value {
                    Value::Numeric(n) if n.is_nan() && is_char => String::new(),
                    Value::Numeric(n) if n.is_nan() => ".".to_string(),
                    // shortest text that parses back to the same number
                    Value::Numeric(n) => n.to_string(),
                    Value::Character(text) => text.clone(),
                })
                .collect();
            writer.write_record(&record).map_err(|e| csv_error(path, e))?;
        }
        writer.flush().map_err(|e| Error::io(path, &e))?;
        debug!(path = %path.display(), rows = dataset.len(), "saved dataset");
        Ok(())
    }
}

/// Header suffix marking a character column
const CHARACTER_MARK: char = '$';

/// A column holding any character value is stored as character
fn is_character_column(dataset: &Dataset, column: &str) -> bool {
    (0..dataset.len()).any(|i| matches!(dataset.get(i, column), Some(Value::Character(_))))
}

fn csv_error(path: &Path, err: csv::Error) -> Error {
    match err.kind() {
        csv::ErrorKind::Io(io) => Error::io(path, io),
        _ => Error::codec("csv", err),
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_names() {
        assert_eq!(Engine::from_name("CSV"), Some(Engine::Csv));
        assert_eq!(Engine::from_name("json"), Some(Engine::Json));
        assert_eq!(Engine::from_name("v9"), None);
        assert_eq!(Engine::Csv.extension(), "csv");
    }

    #[test]
    fn test_csv_type_inference() {
        let dir = std::env::temp_dir().join(format!("saslite-csv-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("people.csv");
        fs::write(&path, "name,age\nann,30\nbob,.\n").unwrap();

        let ds = CsvStore.load(&path).unwrap();
        assert_eq!(ds.name, "people");
        assert_eq!(ds.columns(), &["name", "age"]);
        assert_eq!(ds.value(0, "name"), Value::from("ann"));
        assert_eq!(ds.value(0, "age"), Value::Numeric(30.0));
        assert!(ds.value(1, "age").is_missing());

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_csv_marks_character_columns() {
        let dir = std::env::temp_dir().join(format!("saslite-csv-mark-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("zips.csv");

        let mut ds = Dataset::new("zips");
        ds.push_row(vec![
            ("zip".into(), Value::from("02134")),
            ("note".into(), Value::from("")),
            ("n".into(), Value::Numeric(0.1)),
        ]);
        CsvStore.save(&ds, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "zip$,note$,n\n02134,,0.1\n");

        let back = CsvStore.load(&path).unwrap();
        assert_eq!(back.columns(), &["zip", "note", "n"]);
        assert!(matches!(back.get(0, "zip"), Some(Value::Character(s)) if s == "02134"));
        assert!(matches!(back.get(0, "note"), Some(Value::Character(s)) if s.is_empty()));
        assert!(matches!(back.get(0, "n"), Some(Value::Numeric(n)) if *n == 0.1));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = JsonStore
            .load(Path::new("/definitely/not/here.json"))
            .unwrap_err();
        assert!(matches!(err, Error::Io { .. }));
    }
}

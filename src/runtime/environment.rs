use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::parser::DatasetRef;
use crate::runtime::storage::Engine;
use crate::runtime::{Dataset, Value};

lazy_static! {
    /// Librefs: a letter or underscore, then up to seven more word characters
    static ref LIBREF: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]{0,7}$").unwrap();
}

/// Name of the implicit temporary library
pub const WORK: &str = "WORK";

/// How a library may be used
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    /// Datasets are read and written on disk
    ReadWrite,
    /// Datasets can only be read
    ReadOnly,
    /// In-memory only, discarded at exit
    Temporary,
}

/// One assigned libref
#[derive(Debug, Clone)]
pub struct Library {
    /// Libref (uppercase)
    pub name: String,
    /// Directory holding the datasets; `None` for WORK
    pub path: Option<PathBuf>,
    /// On-disk format
    pub engine: Engine,
    /// Access mode
    pub access: AccessMode,
    /// Datasets loaded or written in this session (uppercase name keys)
    datasets: HashMap<String, Dataset>,
}

impl Library {
    fn temporary(name: &str) -> Self {
        Library {
            name: name.to_ascii_uppercase(),
            path: None,
            engine: Engine::default(),
            access: AccessMode::Temporary,
            datasets: HashMap::new(),
        }
    }

    /// File backing a dataset of this library
    pub fn dataset_path(&self, name: &str) -> Option<PathBuf> {
        self.path.as_ref().map(|dir| {
            dir.join(format!(
                "{}.{}",
                name.to_ascii_lowercase(),
                self.engine.extension()
            ))
        })
    }

    fn load(&self, name: &str) -> Result<Option<Dataset>> {
        if let Some(ds) = self.datasets.get(&name.to_ascii_uppercase()) {
            return Ok(Some(ds.clone()));
        }
        match self.dataset_path(name) {
            Some(path) if path.exists() => {
                let mut ds = self.engine.store().load(&path)?;
                ds.name = name.to_string();
                Ok(Some(ds))
            }
            _ => Ok(None),
        }
    }
}

/// Session state shared by all steps: libraries, options, title, global
/// and macro variables
#[derive(Debug, Clone)]
pub struct Environment {
    libraries: HashMap<String, Library>,
    options: HashMap<String, String>,
    title: Option<String>,
    variables: HashMap<String, Value>,
    macro_variables: HashMap<String, String>,
    last_dataset: Option<DatasetRef>,
}

impl Environment {
    /// Creates an environment with only the WORK library
    pub fn new() -> Self {
        let mut libraries = HashMap::new();
        libraries.insert(WORK.to_string(), Library::temporary(WORK));
        Environment {
            libraries,
            options: HashMap::new(),
            title: None,
            variables: HashMap::new(),
            macro_variables: HashMap::new(),
            last_dataset: None,
        }
    }

    // ------------------------------------------------------------------
    // Libraries
    // ------------------------------------------------------------------

    /// Assigns a libref to a directory
    pub fn set_libref(
        &mut self,
        name: &str,
        path: impl AsRef<Path>,
        engine: Engine,
        access: AccessMode,
    ) -> Result<()> {
        if !LIBREF.is_match(name) {
            return Err(Error::ConfigError(format!("Invalid libref {}", name)));
        }
        let key = name.to_ascii_uppercase();
        if key == WORK {
            return Err(Error::ConfigError("WORK cannot be reassigned".to_string()));
        }
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(Error::LibraryPathNotFound {
                path: path.display().to_string(),
            });
        }

        info!(
            "NOTE: Libref {} was successfully assigned: engine {}, path {}",
            key,
            engine.extension().to_ascii_uppercase(),
            path.display()
        );
        self.libraries.insert(
            key.clone(),
            Library {
                name: key,
                path: Some(path.to_path_buf()),
                engine,
                access,
                datasets: HashMap::new(),
            },
        );
        Ok(())
    }

    /// Library by libref; `None` means WORK
    pub fn library(&self, libref: Option<&str>) -> Result<&Library> {
        let key = libref.unwrap_or(WORK).to_ascii_uppercase();
        self.libraries
            .get(&key)
            .ok_or(Error::UndefinedLibref { libref: key })
    }

    fn library_mut(&mut self, libref: Option<&str>) -> Result<&mut Library> {
        let key = libref.unwrap_or(WORK).to_ascii_uppercase();
        self.libraries
            .get_mut(&key)
            .ok_or(Error::UndefinedLibref { libref: key })
    }

    /// Assigned librefs, sorted
    pub fn librefs(&self) -> Vec<String> {
        let mut names: Vec<_> = self.libraries.keys().cloned().collect();
        names.sort();
        names
    }

    // ------------------------------------------------------------------
    // Datasets
    // ------------------------------------------------------------------

    /// Reads a dataset, loading it from disk for permanent libraries
    pub fn dataset(&self, reference: &DatasetRef) -> Result<Dataset> {
        self.library(reference.libref.as_deref())?
            .load(&reference.name)?
            .ok_or_else(|| Error::DatasetNotFound {
                name: reference.to_string(),
            })
    }

    /// Whether a dataset exists in memory or on disk
    pub fn dataset_exists(&self, reference: &DatasetRef) -> bool {
        matches!(
            self.library(reference.libref.as_deref())
                .and_then(|lib| lib.load(&reference.name)),
            Ok(Some(_))
        )
    }

    /// Existing dataset, or a new empty one registered under the name
    pub fn get_or_create_dataset(
        &mut self,
        libref: Option<&str>,
        name: &str,
    ) -> Result<&mut Dataset> {
        let existing = self.library(libref)?.load(name)?;
        let library = self.library_mut(libref)?;
        let key = name.to_ascii_uppercase();
        Ok(library
            .datasets
            .entry(key)
            .or_insert_with(|| existing.unwrap_or_else(|| Dataset::new(name))))
    }

    /// Stores a dataset under `reference`, writing it to disk for permanent
    /// libraries. It becomes the most recently created dataset.
    pub fn store_dataset(&mut self, reference: &DatasetRef, mut dataset: Dataset) -> Result<()> {
        let library = self.library_mut(reference.libref.as_deref())?;
        if library.access == AccessMode::ReadOnly {
            return Err(Error::ReadOnlyLibrary {
                libref: library.name.clone(),
            });
        }
        dataset.name = reference.name.clone();

        if let Some(path) = library.dataset_path(&reference.name) {
            library.engine.store().save(&dataset, &path)?;
        }
        debug!(dataset = %reference, rows = dataset.len(), "stored dataset");
        library
            .datasets
            .insert(reference.name.to_ascii_uppercase(), dataset);
        self.last_dataset = Some(reference.clone());
        Ok(())
    }

    /// Most recently created dataset (`DATA=` default)
    pub fn last_dataset(&self) -> Option<&DatasetRef> {
        self.last_dataset.as_ref()
    }

    /// Names of the datasets held in memory for a library, sorted
    pub fn datasets(&self, libref: Option<&str>) -> Result<Vec<String>> {
        let library = self.library(libref)?;
        let mut names: Vec<_> = library.datasets.values().map(|d| d.name.clone()).collect();
        names.sort();
        Ok(names)
    }

    // ------------------------------------------------------------------
    // Options and title
    // ------------------------------------------------------------------

    /// Sets a system option (names are case-insensitive)
    pub fn set_option(&mut self, name: &str, value: &str) {
        self.options
            .insert(name.to_ascii_uppercase(), value.to_string());
    }

    /// Current value of a system option
    pub fn option(&self, name: &str) -> Option<&str> {
        self.options
            .get(&name.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// `OBS=` as a row cap; `MAX` or an unparsable value means no cap
    pub fn obs_limit(&self) -> Option<usize> {
        self.option("OBS").and_then(|v| v.trim().parse::<usize>().ok())
    }

    /// Sets or clears the listing title
    pub fn set_title(&mut self, title: Option<String>) {
        self.title = title;
    }

    /// Current listing title
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    // ------------------------------------------------------------------
    // Variables
    // ------------------------------------------------------------------

    /// Sets a global (open code) variable
    pub fn set_variable(&mut self, name: &str, value: Value) {
        self.variables.insert(name.to_ascii_uppercase(), value);
    }

    /// Global variable, numeric missing when undefined
    pub fn variable(&self, name: &str) -> Value {
        self.variables
            .get(&name.to_ascii_uppercase())
            .cloned()
            .unwrap_or_else(Value::missing)
    }

    /// Sets a macro variable (`%LET`)
    pub fn set_macro_variable(&mut self, name: &str, value: &str) {
        self.macro_variables
            .insert(name.to_ascii_uppercase(), value.to_string());
    }

    /// Macro variable text
    pub fn macro_variable(&self, name: &str) -> Option<&str> {
        self.macro_variables
            .get(&name.to_ascii_uppercase())
            .map(String::as_str)
    }

    /// All macro variables (uppercase names)
    pub fn macro_variables(&self) -> &HashMap<String, String> {
        &self.macro_variables
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

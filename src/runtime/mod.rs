//! Runtime: values, the PDV, datasets and libraries, and statement execution

pub mod data_step;
pub mod dataset;
pub mod environment;
pub mod evaluator;
pub mod interpreter;
pub mod listing;
pub mod pdv;
pub mod procs;
pub mod storage;
mod value;

pub use dataset::{Dataset, Row};
pub use environment::{AccessMode, Environment, Library};
pub use evaluator::Scope;
pub use interpreter::Interpreter;
pub use listing::Listing;
pub use pdv::{Pdv, PdvVar};
pub use storage::{CsvStore, DatasetStore, Engine, JsonStore};
pub use value::{compare_numbers, format_number, order_numbers, Value, NUMERIC_TOLERANCE};

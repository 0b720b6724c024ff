//! # saslite - an interpreter for a SAS-like data step language
//!
//! saslite reads programs written in a small subset of the SAS language
//! and runs them against in-memory and on-disk datasets.
//!
//! ## Quick Start
//!
//! ```rust
//! use saslite::{Interpreter, Value};
//! use saslite::parser::DatasetRef;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let code = r#"
//!     data totals;
//!         input region $ amount;
//!         retain running 0;
//!         running = running + amount;
//!         datalines;
//!     east 10
//!     west 25
//!     ;
//!     run;
//! "#;
//!
//! let mut interpreter = Interpreter::new();
//! let errors = interpreter.run(code)?;
//! assert!(errors.is_empty());
//!
//! let totals = interpreter.environment().dataset(&DatasetRef::work("totals"))?;
//! assert_eq!(totals.value(1, "running"), Value::Numeric(35.0));
//! # Ok(())
//! # }
//! ```
//!
//! ## Language Overview
//!
//! - **DATA step**: `SET`, `MERGE`/`BY`, `INPUT` with `DATALINES`,
//!   assignments, `IF`/`ELSE IF`/`ELSE`, subsetting `IF`, `DO` loops,
//!   `ARRAY`, `RETAIN`, `LENGTH`, `KEEP`, `DROP`, `OUTPUT`, `DELETE`, `STOP`
//! - **PROC steps**: `SORT`, `MEANS`, `PRINT`, `FREQ` (`SQL` is recognised
//!   but not executed)
//! - **Global statements**: `OPTIONS`, `LIBNAME`, `TITLE`, `%LET`
//! - **Values**: numbers and character strings, with the missing value `.`
//!
//! ## Architecture
//!
//! ```text
//! Source Code → Scanner → Tokens → Parser → AST → Interpreter → Datasets / Listing
//! ```
//!
//! - [`Scanner`] - Tokenizes source code
//! - [`Parser`] - Builds the AST, recovering from bad statements
//! - [`Interpreter`] - Runs DATA and PROC steps
//! - [`Environment`] - Libraries, datasets, options and macro variables
//! - [`ToolRegistry`] - Built-in functions
//!
//! ## Error Handling
//!
//! Lex errors stop the run. Parse errors skip one statement, execution
//! errors abandon one statement or one DATA-step observation; both are
//! returned from [`Interpreter::run`] and written to the log.
//!
//! ```rust
//! # use saslite::{Error, Interpreter};
//! let mut interpreter = Interpreter::new();
//! let errors = interpreter.run("data a; array v{2} v1 v2; v[5] = 1; run;").unwrap();
//! assert!(matches!(errors[0], Error::ArrayIndexOutOfBounds { .. }));
//! ```

#![allow(clippy::needless_range_loop)] // Index needed for error messages

/// Version of the saslite interpreter
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub mod config;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod tools;

// Re-export main types
pub use config::InterpreterConfig;
pub use error::{Error, Result};
pub use lexer::{Scanner, Token, TokenKind};
pub use parser::{BinaryOp, Expression, Parser, Program, Statement, UnaryOp};
pub use runtime::{Dataset, Environment, Interpreter, Value};
pub use tools::{Tool, ToolRegistry};

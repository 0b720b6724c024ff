//! Error types for the saslite interpreter

use thiserror::Error;

/// saslite interpreter errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Lex errors
    /// String literal without its closing quote
    ///
    /// **Triggered by:** `title 'Quarterly report;` (missing closing quote)
    #[error("Unterminated string starting at line {line}, column {col}")]
    UnterminatedString {
        /// Line where the literal starts
        line: usize,
        /// Column where the literal starts
        col: usize,
    },

    /// Block comment without its closing `*/`
    #[error("Unterminated comment starting at line {line}, column {col}")]
    UnterminatedComment {
        /// Line where the comment starts
        line: usize,
        /// Column where the comment starts
        col: usize,
    },

    /// Character that cannot start any token
    #[error("Unexpected character '{ch}' at line {line}, column {col}")]
    UnexpectedChar {
        /// Offending character
        ch: char,
        /// Line number
        line: usize,
        /// Column number
        col: usize,
    },

    /// `%word` that is not one of the recognised macro keywords
    #[error("Unknown macro keyword %{word} at line {line}, column {col}")]
    UnknownMacroKeyword {
        /// Word following the percent sign
        word: String,
        /// Line number
        line: usize,
        /// Column number
        col: usize,
    },

    // Parse errors
    /// Malformed statement
    ///
    /// **Triggered by:** invalid statement structure, e.g. `do i = 1 3;`
    /// **Recovery:** the parser skips to the next `;` and continues
    #[error("Syntax error at line {line}, column {col}: {message}")]
    SyntaxError {
        /// Line number where error occurred
        line: usize,
        /// Column number where error occurred
        col: usize,
        /// Error description
        message: String,
    },

    /// Unexpected token encountered during parsing
    #[error("Unexpected token at line {line}, column {col}: expected {expected}, got {got}")]
    UnexpectedToken {
        /// Expected token description
        expected: String,
        /// Actual token received
        got: String,
        /// Line number
        line: usize,
        /// Column number
        col: usize,
    },

    /// Unexpected end of input during parsing
    #[error("Unexpected end of input")]
    UnexpectedEof,

    /// ARRAY statement whose declared size differs from its element list
    ///
    /// **Triggered by:** `array nums{3} a b;`
    #[error("Array {name} declares {declared} elements but lists {actual} variables")]
    ArraySizeMismatch {
        /// Array name
        name: String,
        /// Size in braces
        declared: usize,
        /// Number of variables listed
        actual: usize,
    },

    /// Macro-language statement other than %LET
    #[error("Macro statement %{keyword} is not supported at line {line}")]
    UnsupportedMacro {
        /// Macro keyword
        keyword: String,
        /// Line number
        line: usize,
    },

    // Execution errors
    /// Two-level name whose libref was never assigned
    ///
    /// **Triggered by:** `set sales.q1;` without a prior `libname sales '...';`
    #[error("Libref {libref} is not assigned")]
    UndefinedLibref {
        /// Libref
        libref: String,
    },

    /// Input dataset that does not exist
    #[error("Dataset {name} does not exist")]
    DatasetNotFound {
        /// Two-level dataset name
        name: String,
    },

    /// Write to a library assigned with ACCESS=READONLY
    #[error("Library {libref} is read-only")]
    ReadOnlyLibrary {
        /// Libref
        libref: String,
    },

    /// LIBNAME pointing at a path that does not exist
    #[error("Library path {path} does not exist")]
    LibraryPathNotFound {
        /// Requested path
        path: String,
    },

    /// PROC variable list naming a column the dataset does not have
    #[error("Variable {name} not found in {dataset}")]
    VariableNotFound {
        /// Variable name
        name: String,
        /// Two-level dataset name
        dataset: String,
    },

    /// Reference to an array that was never declared in the DATA step
    #[error("Undefined array: {name}")]
    UndefinedArray {
        /// Array name
        name: String,
    },

    /// Array subscript outside `1..=size`
    ///
    /// **Triggered by:** `nums[4]` for `array nums{3} ...`
    /// **Prevention:** bound loops with `dim(nums)`
    #[error("Array subscript out of range: {name}[{index}] (size {size})")]
    ArrayIndexOutOfBounds {
        /// Array name
        name: String,
        /// Requested subscript
        index: i64,
        /// Declared size
        size: usize,
    },

    /// Statement that cannot run in the current context
    #[error("Unsupported statement: {0}")]
    UnsupportedStatement(String),

    /// PROC without an implementation
    #[error("Procedure {name} is not supported")]
    UnsupportedProcedure {
        /// Procedure name
        name: String,
    },

    /// Operator that cannot be applied to its operands
    #[error("Unsupported operator {op} for {operands}")]
    UnsupportedOperator {
        /// Operator symbol
        op: String,
        /// Operand description
        operands: String,
    },

    /// Call to a function missing from the registry
    #[error("Undefined function: {name}")]
    UndefinedFunction {
        /// Function name
        name: String,
    },

    /// Invalid arguments provided to a function
    #[error("Invalid arguments for function {function}: {reason}")]
    InvalidArguments {
        /// Function name
        function: String,
        /// Reason for invalidity
        reason: String,
    },

    /// DO loop whose BY increment evaluates to zero
    #[error("DO loop increment for {variable} is zero")]
    ZeroDoIncrement {
        /// Loop index variable
        variable: String,
    },

    /// DO loop whose start, end or increment is missing
    #[error("Invalid DO loop bounds for {variable}: {reason}")]
    InvalidDoLoop {
        /// Loop index variable
        variable: String,
        /// Which bound was invalid
        reason: String,
    },

    /// Too many loop iterations
    #[error("Too many iterations (limit: {limit})")]
    TooManyIterations {
        /// Maximum allowed iterations
        limit: usize,
    },

    /// Feature recognised by the parser but not executed
    #[error("Not implemented: {feature}")]
    NotImplemented {
        /// Feature name
        feature: String,
    },

    // Storage errors
    /// File system failure while loading or saving a dataset
    #[error("I/O error on {path}: {message}")]
    Io {
        /// File path
        path: String,
        /// Underlying error text
        message: String,
    },

    /// Encoding or decoding failure in a dataset engine
    #[error("Codec error in {engine} engine: {message}")]
    Codec {
        /// Engine name
        engine: String,
        /// Underlying error text
        message: String,
    },

    /// Invalid interpreter configuration
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Which stage of the pipeline produced an error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Tokenization
    Lex,
    /// Parsing
    Parse,
    /// Running statements
    Execution,
    /// Loading or saving datasets
    Storage,
    /// Configuration loading
    Config,
}

/// Error severity classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Stops the current input chunk
    Fatal,
    /// Abandons the current unit; execution continues with the next one
    Recoverable,
    /// Reported, does not stop anything
    Warning,
}

impl Error {
    /// Create a syntax error at a position
    pub fn syntax(line: usize, col: usize, message: impl Into<String>) -> Self {
        Error::SyntaxError {
            line,
            col,
            message: message.into(),
        }
    }

    /// Create an I/O error for a path
    pub fn io(path: impl AsRef<std::path::Path>, err: &std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().display().to_string(),
            message: err.to_string(),
        }
    }

    /// Create a codec error for an engine
    pub fn codec(engine: &str, message: impl ToString) -> Self {
        Error::Codec {
            engine: engine.to_string(),
            message: message.to_string(),
        }
    }

    /// Stage that produced this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnterminatedString { .. }
            | Error::UnterminatedComment { .. }
            | Error::UnexpectedChar { .. }
            | Error::UnknownMacroKeyword { .. } => ErrorKind::Lex,

            Error::SyntaxError { .. }
            | Error::UnexpectedToken { .. }
            | Error::UnexpectedEof
            | Error::ArraySizeMismatch { .. }
            | Error::UnsupportedMacro { .. } => ErrorKind::Parse,

            Error::Io { .. } | Error::Codec { .. } => ErrorKind::Storage,

            Error::ConfigError(_) => ErrorKind::Config,

            _ => ErrorKind::Execution,
        }
    }

    /// Classify error severity
    pub fn classify(&self) -> ErrorSeverity {
        match self.kind() {
            ErrorKind::Lex | ErrorKind::Config => ErrorSeverity::Fatal,
            ErrorKind::Parse | ErrorKind::Storage => ErrorSeverity::Recoverable,
            ErrorKind::Execution => match self {
                Error::NotImplemented { .. } => ErrorSeverity::Warning,
                _ => ErrorSeverity::Recoverable,
            },
        }
    }
}

/// Result type for saslite operations
pub type Result<T> = std::result::Result<T, Error>;

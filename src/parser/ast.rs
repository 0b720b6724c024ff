use serde::{Deserialize, Serialize};
use std::fmt;

/// Complete program: the top-level statements in source order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Program {
    /// Top-level statements in the program
    pub statements: Vec<Statement>,
}

/// Reference to a dataset, optionally qualified by a libref (`lib.name`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetRef {
    /// Library reference; `None` means WORK
    pub libref: Option<String>,
    /// Dataset name
    pub name: String,
}

impl DatasetRef {
    /// One-level name in the WORK library
    pub fn work(name: impl Into<String>) -> Self {
        DatasetRef {
            libref: None,
            name: name.into(),
        }
    }

    /// Two-level name
    pub fn qualified(libref: impl Into<String>, name: impl Into<String>) -> Self {
        DatasetRef {
            libref: Some(libref.into()),
            name: name.into(),
        }
    }

    /// `DATA _NULL_` writes no dataset
    pub fn is_null(&self) -> bool {
        self.libref.is_none() && self.name.eq_ignore_ascii_case("_null_")
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lib = self.libref.as_deref().unwrap_or("WORK");
        write!(
            f,
            "{}.{}",
            lib.to_ascii_uppercase(),
            self.name.to_ascii_uppercase()
        )
    }
}

/// One BY variable with its sort direction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ByVariable {
    /// Variable name
    pub name: String,
    /// DESCENDING modifier
    pub descending: bool,
}

/// Storage kind of a DATA-step variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarKind {
    /// Floating-point number
    Numeric,
    /// Text
    Character,
}

/// Declared size of an ARRAY
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArraySize {
    /// `{n}`
    Fixed(usize),
    /// `{*}`: size taken from the variable list
    Star,
}

/// Target of an assignment statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AssignTarget {
    /// `name = ...`
    Variable(String),
    /// `arr[i] = ...`
    ArrayElement {
        /// Array name
        name: String,
        /// Subscript expression (1-based)
        index: Box<Expression>,
    },
}

/// One `ELSE IF cond THEN stmt` branch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElseIfBranch {
    /// Branch condition
    pub condition: Expression,
    /// Branch body
    pub body: Statement,
}

/// Condition of a DO WHILE / DO UNTIL loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoopCondition {
    /// Tested before each pass
    While(Expression),
    /// Tested after each pass
    Until(Expression),
}

/// One variable in a RETAIN statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetainItem {
    /// Variable name
    pub name: String,
    /// Initial value literal
    pub initial: Option<Expression>,
}

/// One variable in a LENGTH statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LengthItem {
    /// Variable name
    pub name: String,
    /// Declared kind
    pub kind: VarKind,
    /// Storage length
    pub length: usize,
}

/// One field of a list-style INPUT statement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputField {
    /// Variable name
    pub name: String,
    /// Read as character (`$`)
    pub kind: VarKind,
}

/// Statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Statement {
    /// `DATA out...; body RUN;`
    DataStep {
        /// Output datasets
        outputs: Vec<DatasetRef>,
        /// Statements of the step, in order
        body: Vec<Statement>,
    },

    /// `SET ds...;`
    Set(Vec<DatasetRef>),

    /// `MERGE ds...;`
    Merge(Vec<DatasetRef>),

    /// `BY var...;`
    By(Vec<ByVariable>),

    /// Variable assignment: `x = expr;`
    Assignment {
        /// Variable or array element to assign to
        target: AssignTarget,
        /// Expression value to assign
        value: Expression,
    },

    /// IF / ELSE IF / ELSE chain
    If {
        /// Condition expression to evaluate
        condition: Expression,
        /// Statement to execute if condition is true
        then_branch: Box<Statement>,
        /// ELSE IF branches, tested in order
        else_ifs: Vec<ElseIfBranch>,
        /// Optional statement to execute if no condition held
        else_branch: Option<Box<Statement>>,
    },

    /// Subsetting IF: `IF expr;`
    SubsettingIf(Expression),

    /// Numeric range loop: `DO i = a TO b [BY c]; ... END;`
    Do {
        /// Loop index variable
        variable: String,
        /// Start value
        start: Expression,
        /// End value (inclusive)
        end: Expression,
        /// Increment, 1 when omitted
        increment: Option<Expression>,
        /// Loop body
        body: Vec<Statement>,
    },

    /// Conditional loop: `DO WHILE(c); ... END;` / `DO UNTIL(c); ... END;`
    DoLoop {
        /// Loop condition
        condition: LoopCondition,
        /// Loop body
        body: Vec<Statement>,
    },

    /// `DO; ... END;`
    Block(Vec<Statement>),

    /// `ARRAY name{size} [$] var...;`
    Array {
        /// Array name
        name: String,
        /// Declared size
        size: ArraySize,
        /// Element kind
        kind: VarKind,
        /// Element variable names
        variables: Vec<String>,
    },

    /// `DROP var...;`
    Drop(Vec<String>),

    /// `KEEP var...;`
    Keep(Vec<String>),

    /// `RETAIN var [init]...;`
    Retain(Vec<RetainItem>),

    /// `LENGTH var [$] n...;`
    Length(Vec<LengthItem>),

    /// `INPUT var [$]...;`
    Input(Vec<InputField>),

    /// Raw `DATALINES;` body
    Datalines(String),

    /// `OUTPUT [ds...];`
    Output(Vec<String>),

    /// `DELETE;`
    Delete,

    /// `STOP;`
    Stop,

    /// `OPTIONS name=value...;`
    Options(Vec<(String, String)>),

    /// `LIBNAME libref [engine] 'path' [ACCESS=READONLY];`
    Libname {
        /// Library reference
        libref: String,
        /// Engine name, e.g. `csv`
        engine: Option<String>,
        /// Directory path
        path: String,
        /// Assigned read-only
        readonly: bool,
    },

    /// `TITLE ['text'];` (no text clears the title)
    Title(Option<String>),

    /// `%LET name = text;`
    MacroLet {
        /// Macro variable name
        name: String,
        /// Unexpanded value text
        value: String,
    },

    /// `PROC SORT`
    ProcSort(ProcSort),

    /// `PROC MEANS`
    ProcMeans(ProcMeans),

    /// `PROC PRINT`
    ProcPrint(ProcPrint),

    /// `PROC FREQ`
    ProcFreq(ProcFreq),

    /// `PROC SQL; ... QUIT;` (recognised, not executed)
    ProcSql,

    /// Any other procedure
    ProcUnknown(String),

    /// `RUN;` outside a step
    Run,
}

impl Statement {
    /// Short name used in diagnostics
    pub fn keyword(&self) -> &'static str {
        match self {
            Statement::DataStep { .. } => "DATA",
            Statement::Set(_) => "SET",
            Statement::Merge(_) => "MERGE",
            Statement::By(_) => "BY",
            Statement::Assignment { .. } => "assignment",
            Statement::If { .. } => "IF-THEN",
            Statement::SubsettingIf(_) => "IF",
            Statement::Do { .. } | Statement::DoLoop { .. } | Statement::Block(_) => "DO",
            Statement::Array { .. } => "ARRAY",
            Statement::Drop(_) => "DROP",
            Statement::Keep(_) => "KEEP",
            Statement::Retain(_) => "RETAIN",
            Statement::Length(_) => "LENGTH",
            Statement::Input(_) => "INPUT",
            Statement::Datalines(_) => "DATALINES",
            Statement::Output(_) => "OUTPUT",
            Statement::Delete => "DELETE",
            Statement::Stop => "STOP",
            Statement::Options(_) => "OPTIONS",
            Statement::Libname { .. } => "LIBNAME",
            Statement::Title(_) => "TITLE",
            Statement::MacroLet { .. } => "%LET",
            Statement::ProcSort(_) => "PROC SORT",
            Statement::ProcMeans(_) => "PROC MEANS",
            Statement::ProcPrint(_) => "PROC PRINT",
            Statement::ProcFreq(_) => "PROC FREQ",
            Statement::ProcSql => "PROC SQL",
            Statement::ProcUnknown(_) => "PROC",
            Statement::Run => "RUN",
        }
    }
}

/// `PROC SORT` options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcSort {
    /// `DATA=` (defaults to the last dataset created)
    pub data: Option<DatasetRef>,
    /// `OUT=`; sorts in place when absent
    pub out: Option<DatasetRef>,
    /// BY variables
    pub by: Vec<ByVariable>,
    /// `WHERE` filter applied before sorting
    pub where_clause: Option<Expression>,
    /// Keep the first row of each BY group
    pub nodupkey: bool,
    /// Drop rows identical to their predecessor
    pub noduprecs: bool,
    /// `DUPLICATES` flag
    pub duplicates: bool,
}

/// Summary statistics of `PROC MEANS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Statistic {
    /// Count of non-missing values
    N,
    /// Count of missing values
    Nmiss,
    /// Sum
    Sum,
    /// Arithmetic mean
    Mean,
    /// Minimum
    Min,
    /// Maximum
    Max,
}

impl Statistic {
    /// Statistics printed when none are requested
    pub const DEFAULT: [Statistic; 4] = [
        Statistic::N,
        Statistic::Mean,
        Statistic::Min,
        Statistic::Max,
    ];

    /// Column heading
    pub fn label(&self) -> &'static str {
        match self {
            Statistic::N => "N",
            Statistic::Nmiss => "NMiss",
            Statistic::Sum => "Sum",
            Statistic::Mean => "Mean",
            Statistic::Min => "Minimum",
            Statistic::Max => "Maximum",
        }
    }
}

/// `OUTPUT OUT=ds stat=names...` of `PROC MEANS`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeansOutput {
    /// Summary dataset
    pub out: DatasetRef,
    /// Statistic with output column names, matched positionally to VAR
    pub columns: Vec<(Statistic, Vec<String>)>,
}

/// `PROC MEANS` options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcMeans {
    /// `DATA=`
    pub data: Option<DatasetRef>,
    /// Requested statistics (empty means the default set)
    pub statistics: Vec<Statistic>,
    /// Analysis variables
    pub vars: Vec<String>,
    /// Optional summary dataset
    pub output: Option<MeansOutput>,
}

/// `PROC PRINT` options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProcPrint {
    /// `DATA=`
    pub data: Option<DatasetRef>,
    /// Columns to show; all when empty
    pub vars: Vec<String>,
    /// `OBS=` row cap
    pub obs: Option<usize>,
    /// Hide the observation number column
    pub noobs: bool,
}

/// `PROC FREQ` options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProcFreq {
    /// `DATA=`
    pub data: Option<DatasetRef>,
    /// One-way tables to produce
    pub tables: Vec<String>,
}

/// Expressions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expression {
    /// Numeric literal
    Number(f64),
    /// String literal
    String(String),
    /// Numeric missing literal `.`
    Missing,
    /// Variable reference
    Variable(String),
    /// Macro variable reference `&name`
    MacroVariable(String),
    /// Binary operation
    Binary {
        /// Operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// Unary operation
    Unary {
        /// Operator
        op: UnaryOp,
        /// Operand
        operand: Box<Expression>,
    },
    /// Function call `name(args...)`
    FunctionCall {
        /// Function name
        name: String,
        /// Arguments
        args: Vec<Expression>,
    },
    /// Array element `name[index]`
    ArrayElement {
        /// Array name
        name: String,
        /// Subscript (1-based)
        index: Box<Expression>,
    },
}

impl Expression {
    /// Build a binary node
    pub fn binary(op: BinaryOp, left: Expression, right: Expression) -> Self {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    /// Addition
    Add,
    /// Subtraction
    Sub,
    /// Multiplication
    Mul,
    /// Division
    Div,
    /// Exponentiation
    Pow,
    /// Equality
    Eq,
    /// Inequality
    NotEq,
    /// Less than
    Lt,
    /// Greater than
    Gt,
    /// Less than or equal
    LtEq,
    /// Greater than or equal
    GtEq,
    /// Logical AND
    And,
    /// Logical OR
    Or,
    /// String concatenation
    Concat,
}

impl BinaryOp {
    /// Binding power; higher binds tighter
    pub fn precedence(&self) -> u8 {
        match self {
            BinaryOp::Or => 1,
            BinaryOp::And => 2,
            BinaryOp::Eq
            | BinaryOp::NotEq
            | BinaryOp::Lt
            | BinaryOp::Gt
            | BinaryOp::LtEq
            | BinaryOp::GtEq => 3,
            BinaryOp::Concat => 4,
            BinaryOp::Add | BinaryOp::Sub => 5,
            BinaryOp::Mul | BinaryOp::Div => 6,
            BinaryOp::Pow => 7,
        }
    }

    /// `a ** b ** c` groups as `a ** (b ** c)`
    pub fn is_right_associative(&self) -> bool {
        matches!(self, BinaryOp::Pow)
    }

    /// Comparison operators yield 1/0
    pub fn is_comparison(&self) -> bool {
        self.precedence() == 3
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Pow => "**",
            BinaryOp::Eq => "=",
            BinaryOp::NotEq => "^=",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::LtEq => "<=",
            BinaryOp::GtEq => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
            BinaryOp::Concat => "||",
        };
        write!(f, "{}", s)
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    /// Negation
    Neg,
    /// Unary plus
    Plus,
    /// Logical NOT
    Not,
}

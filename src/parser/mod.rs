//! Parser module
//!
//! Recursive-descent statement parser with a precedence-climbing expression
//! parser. Malformed statements are recorded and skipped up to the next `;`
//! so one bad line does not lose the rest of the program.

mod ast;
mod expressions;
mod procs;
mod statements;

pub use ast::{
    ArraySize, AssignTarget, BinaryOp, ByVariable, DatasetRef, ElseIfBranch, Expression,
    InputField, LengthItem, LoopCondition, MeansOutput, ProcFreq, ProcMeans, ProcPrint, ProcSort,
    Program, RetainItem, Statement, Statistic, UnaryOp, VarKind,
};
pub use statements::Parser;

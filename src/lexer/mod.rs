//! Lexical analysis
//!
//! Converts SAS-style program text into a stream of tokens.

mod scanner;
mod token;

pub use scanner::Scanner;
pub use token::{Token, TokenKind};

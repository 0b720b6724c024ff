use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single token from the source code
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    /// The type of token
    pub kind: TokenKind,
    /// Original text of the token
    pub lexeme: String,
    /// Line number where token appears (1-indexed)
    pub line: usize,
    /// Column number where token starts (1-indexed)
    pub column: usize,
}

impl Token {
    /// Creates a new token with the given properties
    pub fn new(kind: TokenKind, lexeme: String, line: usize, column: usize) -> Self {
        Token {
            kind,
            lexeme,
            line,
            column,
        }
    }

    /// Name carried by an identifier or a soft keyword, as written in the source
    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            TokenKind::Identifier(name) => Some(name),
            kind if kind.is_soft_keyword() => Some(&self.lexeme),
            _ => None,
        }
    }
}

/// All possible token types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TokenKind {
    // Literals
    /// Numeric literal
    Number(f64),
    /// String literal (quotes removed, doubled quotes collapsed)
    String(String),
    /// Identifier that is not a keyword
    Identifier(String),
    /// Macro variable reference `&name`
    MacroVariable(String),
    /// Raw lines following `DATALINES;`
    DatalinesBody(String),

    // Step and global statement keywords
    /// DATA keyword
    Data,
    /// SET keyword
    Set,
    /// MERGE keyword
    Merge,
    /// BY keyword
    By,
    /// IF keyword
    If,
    /// THEN keyword
    Then,
    /// ELSE keyword
    Else,
    /// ELSE IF compound keyword
    ElseIf,
    /// OUTPUT keyword
    Output,
    /// DELETE keyword
    Delete,
    /// STOP keyword
    Stop,
    /// RUN keyword
    Run,
    /// QUIT keyword
    Quit,
    /// OPTIONS keyword
    Options,
    /// LIBNAME keyword
    Libname,
    /// TITLE keyword
    Title,
    /// PROC keyword
    Proc,
    /// DROP keyword
    Drop,
    /// KEEP keyword
    Keep,
    /// RETAIN keyword
    Retain,
    /// ARRAY keyword
    Array,
    /// LENGTH keyword
    Length,
    /// INPUT keyword
    Input,
    /// DATALINES or CARDS keyword
    Datalines,
    /// DO keyword
    Do,
    /// END or ENDDO keyword
    End,
    /// TO keyword
    To,
    /// VAR keyword
    Var,
    /// WHILE keyword
    While,
    /// UNTIL keyword
    Until,
    /// Logical AND (`and`, `&` is a macro reference)
    And,
    /// Logical OR
    Or,
    /// Logical NOT (`not`, `!`, `^`, `~`)
    Not,

    // PROC keywords
    /// SORT procedure name
    Sort,
    /// MEANS procedure name
    Means,
    /// PRINT procedure name
    Print,
    /// FREQ procedure name
    Freq,
    /// SQL procedure name
    Sql,
    /// OUT option
    Out,
    /// WHERE clause
    Where,
    /// NODUPKEY option
    Nodupkey,
    /// NODUPRECS option
    Noduprecs,
    /// DUPLICATES option
    Duplicates,
    /// DESCENDING BY modifier
    Descending,
    /// TABLES statement
    Tables,
    /// OBS option
    Obs,
    /// NOOBS option
    Noobs,

    // Statistics keywords
    /// N statistic
    N,
    /// NMISS statistic
    Nmiss,
    /// SUM statistic
    Sum,
    /// MEAN statistic
    Mean,
    /// MIN statistic
    Min,
    /// MAX statistic
    Max,

    // SQL keywords
    /// SELECT keyword
    Select,
    /// FROM keyword
    From,
    /// CREATE keyword
    Create,
    /// TABLE keyword
    Table,

    // Macro keywords
    /// %LET
    MacroLet,
    /// %MACRO
    MacroDef,
    /// %MEND
    MacroEnd,
    /// %DO
    MacroDo,
    /// %IF
    MacroIf,
    /// %THEN
    MacroThen,
    /// %ELSE
    MacroElse,

    // Operators
    /// Plus operator (+)
    Plus,
    /// Minus operator (-)
    Minus,
    /// Star operator (*)
    Star,
    /// Power operator (**)
    StarStar,
    /// Slash operator (/)
    Slash,
    /// Single equals: assignment, or equality inside expressions
    Assign,
    /// Equality operator (==, EQ)
    Eq,
    /// Inequality operator (!=, ^=, ~=, NE)
    NotEq,
    /// Less than operator (<, LT)
    Lt,
    /// Greater than operator (>, GT)
    Gt,
    /// Less than or equal operator (<=, LE)
    LtEq,
    /// Greater than or equal operator (>=, GE)
    GtEq,
    /// Concatenation operator (||)
    Concat,

    // Delimiters
    /// Left parenthesis (
    LeftParen,
    /// Right parenthesis )
    RightParen,
    /// Left brace {
    LeftBrace,
    /// Right brace }
    RightBrace,
    /// Left bracket [
    LeftBracket,
    /// Right bracket ]
    RightBracket,
    /// Comma delimiter
    Comma,
    /// Semicolon statement terminator
    Semicolon,
    /// Dot: two-level names, or the missing-value literal
    Dot,
    /// Dollar sign marking character variables
    Dollar,

    // Special
    /// End of file marker
    Eof,
}

lazy_static! {
    static ref KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut m = HashMap::new();
        m.insert("DATA", TokenKind::Data);
        m.insert("SET", TokenKind::Set);
        m.insert("MERGE", TokenKind::Merge);
        m.insert("BY", TokenKind::By);
        m.insert("IF", TokenKind::If);
        m.insert("THEN", TokenKind::Then);
        m.insert("ELSE", TokenKind::Else);
        m.insert("OUTPUT", TokenKind::Output);
        m.insert("DELETE", TokenKind::Delete);
        m.insert("STOP", TokenKind::Stop);
        m.insert("RUN", TokenKind::Run);
        m.insert("QUIT", TokenKind::Quit);
        m.insert("OPTIONS", TokenKind::Options);
        m.insert("LIBNAME", TokenKind::Libname);
        m.insert("TITLE", TokenKind::Title);
        m.insert("PROC", TokenKind::Proc);
        m.insert("DROP", TokenKind::Drop);
        m.insert("KEEP", TokenKind::Keep);
        m.insert("RETAIN", TokenKind::Retain);
        m.insert("ARRAY", TokenKind::Array);
        m.insert("LENGTH", TokenKind::Length);
        m.insert("INPUT", TokenKind::Input);
        m.insert("DATALINES", TokenKind::Datalines);
        m.insert("CARDS", TokenKind::Datalines);
        m.insert("DO", TokenKind::Do);
        m.insert("END", TokenKind::End);
        m.insert("ENDDO", TokenKind::End);
        m.insert("TO", TokenKind::To);
        m.insert("VAR", TokenKind::Var);
        m.insert("WHILE", TokenKind::While);
        m.insert("UNTIL", TokenKind::Until);
        m.insert("AND", TokenKind::And);
        m.insert("OR", TokenKind::Or);
        m.insert("NOT", TokenKind::Not);
        m.insert("EQ", TokenKind::Eq);
        m.insert("NE", TokenKind::NotEq);
        m.insert("LT", TokenKind::Lt);
        m.insert("GT", TokenKind::Gt);
        m.insert("LE", TokenKind::LtEq);
        m.insert("GE", TokenKind::GtEq);
        m.insert("SORT", TokenKind::Sort);
        m.insert("MEANS", TokenKind::Means);
        m.insert("PRINT", TokenKind::Print);
        m.insert("FREQ", TokenKind::Freq);
        m.insert("SQL", TokenKind::Sql);
        m.insert("OUT", TokenKind::Out);
        m.insert("WHERE", TokenKind::Where);
        m.insert("NODUPKEY", TokenKind::Nodupkey);
        m.insert("NODUPRECS", TokenKind::Noduprecs);
        m.insert("NODUP", TokenKind::Noduprecs);
        m.insert("DUPLICATES", TokenKind::Duplicates);
        m.insert("DESCENDING", TokenKind::Descending);
        m.insert("TABLES", TokenKind::Tables);
        m.insert("OBS", TokenKind::Obs);
        m.insert("NOOBS", TokenKind::Noobs);
        m.insert("N", TokenKind::N);
        m.insert("NMISS", TokenKind::Nmiss);
        m.insert("SUM", TokenKind::Sum);
        m.insert("MEAN", TokenKind::Mean);
        m.insert("MIN", TokenKind::Min);
        m.insert("MAX", TokenKind::Max);
        m.insert("SELECT", TokenKind::Select);
        m.insert("FROM", TokenKind::From);
        m.insert("CREATE", TokenKind::Create);
        m.insert("TABLE", TokenKind::Table);
        m
    };
    static ref MACRO_KEYWORDS: HashMap<&'static str, TokenKind> = {
        let mut m = HashMap::new();
        m.insert("LET", TokenKind::MacroLet);
        m.insert("MACRO", TokenKind::MacroDef);
        m.insert("MEND", TokenKind::MacroEnd);
        m.insert("DO", TokenKind::MacroDo);
        m.insert("IF", TokenKind::MacroIf);
        m.insert("THEN", TokenKind::MacroThen);
        m.insert("ELSE", TokenKind::MacroElse);
        m
    };
}

impl TokenKind {
    /// Look up a keyword, case-insensitively
    pub fn keyword(s: &str) -> Option<TokenKind> {
        KEYWORDS.get(s.to_ascii_uppercase().as_str()).cloned()
    }

    /// Look up the word following `%`, case-insensitively
    pub fn macro_keyword(s: &str) -> Option<TokenKind> {
        MACRO_KEYWORDS.get(s.to_ascii_uppercase().as_str()).cloned()
    }

    /// Check if token is a keyword
    pub fn is_keyword(&self) -> bool {
        !matches!(
            self,
            TokenKind::Number(_)
                | TokenKind::String(_)
                | TokenKind::Identifier(_)
                | TokenKind::MacroVariable(_)
                | TokenKind::DatalinesBody(_)
                | TokenKind::Plus
                | TokenKind::Minus
                | TokenKind::Star
                | TokenKind::StarStar
                | TokenKind::Slash
                | TokenKind::Assign
                | TokenKind::Eq
                | TokenKind::NotEq
                | TokenKind::Lt
                | TokenKind::Gt
                | TokenKind::LtEq
                | TokenKind::GtEq
                | TokenKind::Concat
                | TokenKind::LeftParen
                | TokenKind::RightParen
                | TokenKind::LeftBrace
                | TokenKind::RightBrace
                | TokenKind::LeftBracket
                | TokenKind::RightBracket
                | TokenKind::Comma
                | TokenKind::Semicolon
                | TokenKind::Dot
                | TokenKind::Dollar
                | TokenKind::Eof
        )
    }

    /// Keywords that may also name a variable (`sum = sum + x;`)
    pub fn is_soft_keyword(&self) -> bool {
        self.is_keyword()
            && !matches!(
                self,
                TokenKind::If
                    | TokenKind::Then
                    | TokenKind::Else
                    | TokenKind::ElseIf
                    | TokenKind::Do
                    | TokenKind::End
                    | TokenKind::To
                    | TokenKind::And
                    | TokenKind::Or
                    | TokenKind::Not
                    | TokenKind::MacroLet
                    | TokenKind::MacroDef
                    | TokenKind::MacroEnd
                    | TokenKind::MacroDo
                    | TokenKind::MacroIf
                    | TokenKind::MacroThen
                    | TokenKind::MacroElse
            )
    }

    /// Tokens that begin a new DATA or PROC step
    pub fn starts_step(&self) -> bool {
        matches!(self, TokenKind::Data | TokenKind::Proc)
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            TokenKind::Number(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "'{}'", s),
            TokenKind::Identifier(id) => write!(f, "{}", id),
            TokenKind::MacroVariable(name) => write!(f, "&{}", name),
            TokenKind::DatalinesBody(_) => write!(f, "datalines"),
            TokenKind::ElseIf => write!(f, "ELSE IF"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::StarStar => write!(f, "**"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Assign => write!(f, "="),
            TokenKind::Eq => write!(f, "=="),
            TokenKind::NotEq => write!(f, "!="),
            TokenKind::Lt => write!(f, "<"),
            TokenKind::Gt => write!(f, ">"),
            TokenKind::LtEq => write!(f, "<="),
            TokenKind::GtEq => write!(f, ">="),
            TokenKind::Concat => write!(f, "||"),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::LeftBracket => write!(f, "["),
            TokenKind::RightBracket => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Dollar => write!(f, "$"),
            TokenKind::Eof => write!(f, "end of input"),
            other => write!(f, "{}", format!("{:?}", other).to_uppercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keyword_detection() {
        assert_eq!(TokenKind::keyword("data"), Some(TokenKind::Data));
        assert_eq!(TokenKind::keyword("Data"), Some(TokenKind::Data));
        assert_eq!(TokenKind::keyword("ENDDO"), Some(TokenKind::End));
        assert_eq!(TokenKind::keyword("cards"), Some(TokenKind::Datalines));
        assert_eq!(TokenKind::keyword("ge"), Some(TokenKind::GtEq));
        assert_eq!(TokenKind::keyword("revenue"), None);
    }

    #[test]
    fn test_soft_keywords() {
        assert!(TokenKind::Sum.is_soft_keyword());
        assert!(TokenKind::Out.is_soft_keyword());
        assert!(!TokenKind::If.is_soft_keyword());
        assert!(!TokenKind::And.is_soft_keyword());
        assert!(!TokenKind::Identifier("x".into()).is_soft_keyword());
    }

    #[test]
    fn test_token_name() {
        let tok = Token::new(TokenKind::Sum, "Sum".into(), 1, 1);
        assert_eq!(tok.name(), Some("Sum"));
        let tok = Token::new(TokenKind::Then, "then".into(), 1, 1);
        assert_eq!(tok.name(), None);
    }
}

use super::token::{Token, TokenKind};
use crate::error::{Error, Result};

/// Scanner for SAS-style program text
///
/// The scanner is stateful about statement boundaries: a `*` that appears
/// where a statement would begin starts a comment, anywhere else it is the
/// multiplication operator.
pub struct Scanner {
    /// Source code as character vector
    source: Vec<char>,
    /// Accumulated tokens
    tokens: Vec<Token>,
    /// Start position of current token
    start: usize,
    /// Line where the current token starts
    start_line: usize,
    /// Column where the current token starts
    start_column: usize,
    /// Current position in source
    current: usize,
    /// Current line number (1-indexed)
    line: usize,
    /// Current column number (1-indexed)
    column: usize,
    /// No token has been emitted since the last `;`
    at_statement_start: bool,
    /// A `DATALINES;` statement is waiting for its body
    pending_datalines: bool,
}

impl Scanner {
    /// Creates a new scanner from source code
    pub fn new(source: &str) -> Self {
        Scanner {
            source: source.chars().collect(),
            tokens: Vec::new(),
            start: 0,
            start_line: 1,
            start_column: 1,
            current: 0,
            line: 1,
            column: 1,
            at_statement_start: true,
            pending_datalines: false,
        }
    }

    /// Scans all tokens from source code and returns them as a vector
    pub fn scan_tokens(&mut self) -> Result<Vec<Token>> {
        while !self.is_at_end() {
            self.start = self.current;
            self.start_line = self.line;
            self.start_column = self.column;
            self.scan_token()?;
        }

        self.tokens.push(Token::new(
            TokenKind::Eof,
            String::new(),
            self.line,
            self.column,
        ));

        Ok(std::mem::take(&mut self.tokens))
    }

    fn scan_token(&mut self) -> Result<()> {
        let c = self.advance();

        match c {
            ' ' | '\r' | '\t' => {}
            '\n' => self.newline(),

            '*' if self.at_statement_start => self.skip_statement_comment(),
            '/' if self.peek() == '*' => self.skip_block_comment()?,

            '(' => self.add_token(TokenKind::LeftParen),
            ')' => self.add_token(TokenKind::RightParen),
            '{' => self.add_token(TokenKind::LeftBrace),
            '}' => self.add_token(TokenKind::RightBrace),
            '[' => self.add_token(TokenKind::LeftBracket),
            ']' => self.add_token(TokenKind::RightBracket),
            ',' => self.add_token(TokenKind::Comma),
            '$' => self.add_token(TokenKind::Dollar),
            ';' => {
                self.add_token(TokenKind::Semicolon);
                if self.pending_datalines {
                    self.pending_datalines = false;
                    self.scan_datalines();
                }
            }

            '+' => self.add_token(TokenKind::Plus),
            '-' => self.add_token(TokenKind::Minus),
            '*' => {
                if self.match_char('*') {
                    self.add_token(TokenKind::StarStar);
                } else {
                    self.add_token(TokenKind::Star);
                }
            }
            '/' => self.add_token(TokenKind::Slash),

            '=' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::Eq);
                } else {
                    self.add_token(TokenKind::Assign);
                }
            }
            '!' | '^' | '~' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::NotEq);
                } else {
                    self.add_token(TokenKind::Not);
                }
            }
            '<' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::LtEq);
                } else {
                    self.add_token(TokenKind::Lt);
                }
            }
            '>' => {
                if self.match_char('=') {
                    self.add_token(TokenKind::GtEq);
                } else {
                    self.add_token(TokenKind::Gt);
                }
            }
            '|' => {
                if self.match_char('|') {
                    self.add_token(TokenKind::Concat);
                } else {
                    self.add_token(TokenKind::Or);
                }
            }

            '&' => {
                if is_ident_start(self.peek()) {
                    self.scan_macro_variable();
                } else {
                    self.add_token(TokenKind::And);
                }
            }
            '%' => self.scan_macro_keyword()?,

            '\'' | '"' => self.scan_string(c)?,

            '.' => {
                if self.peek().is_ascii_digit() {
                    self.scan_number()?;
                } else {
                    self.add_token(TokenKind::Dot);
                }
            }
            c if c.is_ascii_digit() => self.scan_number()?,

            c if is_ident_start(c) => self.scan_identifier_or_keyword(),

            _ => {
                return Err(Error::UnexpectedChar {
                    ch: c,
                    line: self.start_line,
                    col: self.start_column,
                });
            }
        }

        Ok(())
    }

    /// `* text;` comment: runs to the first `;` or the end of the line
    fn skip_statement_comment(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            if self.advance() == ';' {
                break;
            }
        }
    }

    fn skip_block_comment(&mut self) -> Result<()> {
        self.advance(); // opening *
        loop {
            if self.is_at_end() {
                return Err(Error::UnterminatedComment {
                    line: self.start_line,
                    col: self.start_column,
                });
            }
            let c = self.advance();
            if c == '\n' {
                self.newline();
            } else if c == '*' && self.peek() == '/' {
                self.advance();
                return Ok(());
            }
        }
    }

    fn scan_string(&mut self, quote: char) -> Result<()> {
        let mut value = String::new();

        loop {
            if self.is_at_end() {
                return Err(Error::UnterminatedString {
                    line: self.start_line,
                    col: self.start_column,
                });
            }
            let c = self.advance();
            if c == quote {
                // A doubled delimiter stands for one literal delimiter
                if self.peek() == quote {
                    self.advance();
                    value.push(quote);
                    continue;
                }
                break;
            }
            if c == '\n' {
                self.newline();
            }
            value.push(c);
        }

        self.add_token(TokenKind::String(value));
        Ok(())
    }

    fn scan_number(&mut self) -> Result<()> {
        let mut seen_dot = self.source[self.start] == '.';
        loop {
            let c = self.peek();
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.' && !seen_dot {
                seen_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        let text: String = self.source[self.start..self.current].iter().collect();
        let value: f64 = text.parse().map_err(|_| {
            Error::syntax(
                self.start_line,
                self.start_column,
                format!("Invalid number: {}", text),
            )
        })?;
        self.add_token(TokenKind::Number(value));
        Ok(())
    }

    fn scan_identifier_or_keyword(&mut self) {
        while is_ident_char(self.peek()) {
            self.advance();
        }

        let text: String = self.source[self.start..self.current].iter().collect();

        match TokenKind::keyword(&text) {
            Some(TokenKind::Else) => {
                if self.match_following_if() {
                    self.add_token(TokenKind::ElseIf);
                } else {
                    self.add_token(TokenKind::Else);
                }
            }
            Some(TokenKind::Datalines) => {
                if self.at_statement_start && self.next_non_blank() == ';' {
                    self.pending_datalines = true;
                }
                self.add_token(TokenKind::Datalines);
            }
            Some(kind) => self.add_token(kind),
            None => self.add_token(TokenKind::Identifier(text)),
        }
    }

    /// Lookahead for `ELSE IF`. Consumes the IF on success, otherwise restores
    /// the position (including line/column accounting).
    fn match_following_if(&mut self) -> bool {
        let saved = (self.current, self.line, self.column);

        while matches!(self.peek(), ' ' | '\t' | '\r' | '\n') {
            if self.advance() == '\n' {
                self.newline();
            }
        }

        let is_if = self.peek().eq_ignore_ascii_case(&'i')
            && self.peek_next().eq_ignore_ascii_case(&'f')
            && !is_ident_char(self.peek_at(2));

        if is_if {
            self.advance();
            self.advance();
            true
        } else {
            (self.current, self.line, self.column) = saved;
            false
        }
    }

    fn scan_macro_variable(&mut self) {
        while is_ident_char(self.peek()) {
            self.advance();
        }
        let name: String = self.source[self.start + 1..self.current].iter().collect();
        // `&name.` - the dot only delimits the reference
        self.match_char('.');
        self.add_token(TokenKind::MacroVariable(name));
    }

    fn scan_macro_keyword(&mut self) -> Result<()> {
        if !is_ident_start(self.peek()) {
            return Err(Error::UnexpectedChar {
                ch: '%',
                line: self.start_line,
                col: self.start_column,
            });
        }
        while is_ident_char(self.peek()) {
            self.advance();
        }
        let word: String = self.source[self.start + 1..self.current].iter().collect();
        match TokenKind::macro_keyword(&word) {
            Some(kind) => {
                self.add_token(kind);
                Ok(())
            }
            None => Err(Error::UnknownMacroKeyword {
                word,
                line: self.start_line,
                col: self.start_column,
            }),
        }
    }

    /// Captures the raw lines after `DATALINES;` up to a line holding only `;`
    fn scan_datalines(&mut self) {
        // Rest of the DATALINES statement line is ignored
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
        if !self.is_at_end() {
            self.advance();
            self.newline();
        }

        let body_line = self.line;
        let mut body = String::new();
        let mut terminated = false;
        while !self.is_at_end() {
            let line_start = self.current;
            while !self.is_at_end() && self.peek() != '\n' {
                self.advance();
            }
            let line: String = self.source[line_start..self.current].iter().collect();
            if !self.is_at_end() {
                self.advance();
                self.newline();
            }
            let trimmed = line.trim();
            if !trimmed.is_empty() && trimmed.chars().all(|c| c == ';') {
                terminated = true;
                break;
            }
            body.push_str(line.trim_end_matches('\r'));
            body.push('\n');
        }

        self.tokens.push(Token::new(
            TokenKind::DatalinesBody(body),
            String::new(),
            body_line,
            1,
        ));
        self.tokens.push(Token::new(
            TokenKind::Semicolon,
            if terminated { ";" } else { "" }.to_string(),
            self.line,
            self.column,
        ));
        self.at_statement_start = true;
    }

    fn next_non_blank(&self) -> char {
        let mut i = self.current;
        while i < self.source.len() && self.source[i].is_whitespace() {
            i += 1;
        }
        self.source.get(i).copied().unwrap_or('\0')
    }

    fn newline(&mut self) {
        self.line += 1;
        self.column = 1;
    }

    fn is_at_end(&self) -> bool {
        self.current >= self.source.len()
    }

    fn advance(&mut self) -> char {
        let c = self.source[self.current];
        self.current += 1;
        self.column += 1;
        c
    }

    fn peek(&self) -> char {
        self.peek_at(0)
    }

    fn peek_next(&self) -> char {
        self.peek_at(1)
    }

    fn peek_at(&self, offset: usize) -> char {
        self.source
            .get(self.current + offset)
            .copied()
            .unwrap_or('\0')
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.source[self.current] != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn add_token(&mut self, kind: TokenKind) {
        let lexeme: String = match kind {
            TokenKind::ElseIf => "ELSE IF".to_string(),
            _ => self.source[self.start..self.current].iter().collect(),
        };
        self.at_statement_start = kind == TokenKind::Semicolon;
        self.tokens.push(Token::new(
            kind,
            lexeme,
            self.start_line,
            self.start_column,
        ));
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

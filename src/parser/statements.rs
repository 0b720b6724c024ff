use std::collections::HashSet;

use super::ast::{
    ArraySize, AssignTarget, ByVariable, DatasetRef, ElseIfBranch, Expression, InputField,
    LengthItem, LoopCondition, Program, RetainItem, Statement, VarKind,
};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

/// Statement parser for SAS-style programs
pub struct Parser {
    pub(super) tokens: Vec<Token>,
    pub(super) current: usize,
    /// Diagnostics from statements that were skipped
    errors: Vec<Error>,
    /// Arrays declared so far in the current DATA step (uppercase)
    pub(super) arrays: HashSet<String>,
}

impl Parser {
    /// Creates a new parser over a token stream ending in `Eof`
    pub fn new(tokens: Vec<Token>) -> Self {
        let mut tokens = tokens;
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let (line, column) = tokens.last().map(|t| (t.line, t.column)).unwrap_or((1, 1));
            tokens.push(Token::new(TokenKind::Eof, String::new(), line, column));
        }
        Parser {
            tokens,
            current: 0,
            errors: Vec::new(),
            arrays: HashSet::new(),
        }
    }

    /// Parses the whole token stream.
    ///
    /// Never fails: statements that do not parse are skipped and their
    /// errors are available from [`Parser::errors`].
    pub fn parse(&mut self) -> Program {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            match self.parse_global_statement() {
                Ok(stmts) => statements.extend(stmts),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }

        Program { statements }
    }

    /// Diagnostics collected while parsing
    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub(super) fn report(&mut self, err: Error) {
        self.errors.push(err);
    }

    /// Takes the collected diagnostics, leaving the list empty
    pub fn take_errors(&mut self) -> Vec<Error> {
        std::mem::take(&mut self.errors)
    }

    /// Whether the tokens hold at least one complete statement.
    ///
    /// DATA and PROC steps are complete once their `RUN;` (or `QUIT;`) has
    /// been seen; everything else needs a terminating `;`.
    pub fn is_complete_statement(tokens: &[Token]) -> bool {
        let mut significant = tokens
            .iter()
            .filter(|t| t.kind != TokenKind::Eof)
            .skip_while(|t| t.kind == TokenKind::Semicolon)
            .peekable();

        let first = match significant.peek() {
            Some(tok) => tok.kind.clone(),
            None => return false,
        };

        let rest: Vec<&Token> = significant.collect();
        if first.starts_step() {
            rest.windows(2).any(|w| {
                matches!(w[0].kind, TokenKind::Run | TokenKind::Quit)
                    && w[1].kind == TokenKind::Semicolon
            })
        } else {
            rest.iter().any(|t| t.kind == TokenKind::Semicolon)
        }
    }

    // ------------------------------------------------------------------
    // Global statements
    // ------------------------------------------------------------------

    fn parse_global_statement(&mut self) -> Result<Vec<Statement>> {
        match self.peek().kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(Vec::new())
            }
            TokenKind::Data if !self.next_is_assign() => self.parse_data_step(),
            TokenKind::Proc if !self.next_is_assign() => self.parse_proc(),
            TokenKind::Run | TokenKind::Quit if !self.next_is_assign() => {
                self.advance();
                self.expect_semicolon()?;
                Ok(vec![Statement::Run])
            }
            _ => {
                if let Some(stmt) = self.try_parse_hoisted()? {
                    return Ok(vec![stmt]);
                }
                Ok(vec![self.parse_step_statement()?])
            }
        }
    }

    /// Global statements that may also appear inside a step
    pub(super) fn try_parse_hoisted(&mut self) -> Result<Option<Statement>> {
        if self.next_is_assign() {
            return Ok(None);
        }
        let stmt = match self.peek().kind {
            TokenKind::Options => self.parse_options()?,
            TokenKind::Libname => self.parse_libname()?,
            TokenKind::Title => self.parse_title()?,
            TokenKind::MacroLet => self.parse_macro_let()?,
            TokenKind::MacroDef
            | TokenKind::MacroEnd
            | TokenKind::MacroDo
            | TokenKind::MacroIf
            | TokenKind::MacroThen
            | TokenKind::MacroElse => {
                let tok = self.peek().clone();
                return Err(Error::UnsupportedMacro {
                    keyword: tok.lexeme.trim_start_matches('%').to_ascii_uppercase(),
                    line: tok.line,
                });
            }
            _ => return Ok(None),
        };
        Ok(Some(stmt))
    }

    fn parse_data_step(&mut self) -> Result<Vec<Statement>> {
        self.advance(); // DATA

        let mut outputs = Vec::new();
        while !self.check(&TokenKind::Semicolon) {
            if self.is_at_end() {
                return Err(Error::UnexpectedEof);
            }
            outputs.push(self.parse_dataset_ref()?);
        }
        self.expect_semicolon()?;
        if outputs.is_empty() {
            outputs.push(DatasetRef::work("DATA1"));
        }

        self.arrays.clear();
        let mut hoisted = Vec::new();
        let mut body = Vec::new();

        while !self.is_at_end() && !self.at_step_boundary() {
            match self.try_parse_hoisted() {
                Ok(Some(stmt)) => {
                    hoisted.push(stmt);
                    continue;
                }
                Ok(None) => {}
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                    continue;
                }
            }
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            match self.parse_step_statement() {
                Ok(stmt) => body.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
        self.finish_step()?;

        hoisted.push(Statement::DataStep { outputs, body });
        Ok(hoisted)
    }

    /// Consumes `RUN;` / `QUIT;` if present; a following step or EOF also ends a step
    pub(super) fn finish_step(&mut self) -> Result<()> {
        if matches!(self.peek().kind, TokenKind::Run | TokenKind::Quit) {
            self.advance();
            self.expect_semicolon()?;
        }
        Ok(())
    }

    /// `RUN`, `QUIT`, `DATA` or `PROC` in statement position
    pub(super) fn at_step_boundary(&self) -> bool {
        let kind = &self.peek().kind;
        (matches!(kind, TokenKind::Run | TokenKind::Quit) || kind.starts_step())
            && !self.next_is_assign()
    }

    fn parse_options(&mut self) -> Result<Statement> {
        self.advance(); // OPTIONS
        let mut options = Vec::new();
        while !self.check(&TokenKind::Semicolon) {
            let name = self.expect_name("option name")?;
            let value = if self.match_kind(&TokenKind::Assign) {
                self.parse_option_value()?
            } else {
                String::new()
            };
            options.push((name.to_ascii_uppercase(), value));
        }
        self.expect_semicolon()?;
        Ok(Statement::Options(options))
    }

    fn parse_option_value(&mut self) -> Result<String> {
        let tok = self.advance();
        match tok.kind {
            TokenKind::String(s) => Ok(s),
            TokenKind::Number(_) => Ok(tok.lexeme),
            _ => match tok.name() {
                Some(name) => Ok(name.to_string()),
                None => Err(self.unexpected_token(&tok, "option value")),
            },
        }
    }

    fn parse_libname(&mut self) -> Result<Statement> {
        self.advance(); // LIBNAME
        let libref = self.expect_name("libref")?;

        let engine = match self.peek().name() {
            Some(name) => {
                let name = name.to_ascii_lowercase();
                self.advance();
                Some(name)
            }
            None => None,
        };

        let path = match self.advance() {
            Token {
                kind: TokenKind::String(path),
                ..
            } => path,
            tok => return Err(self.unexpected_token(&tok, "quoted library path")),
        };

        let mut readonly = false;
        while !self.check(&TokenKind::Semicolon) {
            let option = self.expect_name("LIBNAME option")?;
            self.consume(&TokenKind::Assign, "=")?;
            let value = self.parse_option_value()?;
            if option.eq_ignore_ascii_case("access") {
                readonly = value.eq_ignore_ascii_case("readonly");
            } else {
                let tok = self.previous().clone();
                return Err(Error::syntax(
                    tok.line,
                    tok.column,
                    format!("Unknown LIBNAME option {}", option),
                ));
            }
        }
        self.expect_semicolon()?;

        Ok(Statement::Libname {
            libref,
            engine,
            path,
            readonly,
        })
    }

    fn parse_title(&mut self) -> Result<Statement> {
        self.advance(); // TITLE
        let text = match self.peek().kind.clone() {
            TokenKind::String(s) => {
                self.advance();
                Some(s)
            }
            _ => None,
        };
        self.expect_semicolon()?;
        Ok(Statement::Title(text))
    }

    fn parse_macro_let(&mut self) -> Result<Statement> {
        self.advance(); // %LET
        let name = self.expect_name("macro variable name")?;
        self.consume(&TokenKind::Assign, "=")?;
        let mut parts = Vec::new();
        while !self.check(&TokenKind::Semicolon) {
            if self.is_at_end() {
                return Err(Error::UnexpectedEof);
            }
            let tok = self.advance();
            parts.push(match tok.kind {
                TokenKind::String(s) => s,
                _ => tok.lexeme,
            });
        }
        self.expect_semicolon()?;
        Ok(Statement::MacroLet {
            name,
            value: parts.join(" "),
        })
    }

    // ------------------------------------------------------------------
    // DATA step statements
    // ------------------------------------------------------------------

    /// One statement of a DATA step body (also used for IF/DO branches)
    pub(super) fn parse_step_statement(&mut self) -> Result<Statement> {
        if self.peek().name().is_some() {
            if self.next_is_assign() {
                return self.parse_assignment();
            }
            if self.next_is_subscript() {
                return self.parse_array_assignment();
            }
        }

        match self.peek().kind {
            TokenKind::Semicolon => {
                self.advance();
                Ok(Statement::Block(Vec::new()))
            }
            TokenKind::Set => {
                self.advance();
                Ok(Statement::Set(self.parse_dataset_list()?))
            }
            TokenKind::Merge => {
                self.advance();
                Ok(Statement::Merge(self.parse_dataset_list()?))
            }
            TokenKind::By => {
                self.advance();
                Ok(Statement::By(self.parse_by_list()?))
            }
            TokenKind::If => self.parse_if(),
            TokenKind::Do => self.parse_do(),
            TokenKind::Array => self.parse_array(),
            TokenKind::Drop => {
                self.advance();
                Ok(Statement::Drop(self.parse_name_list()?))
            }
            TokenKind::Keep => {
                self.advance();
                Ok(Statement::Keep(self.parse_name_list()?))
            }
            TokenKind::Retain => self.parse_retain(),
            TokenKind::Length => self.parse_length(),
            TokenKind::Input => self.parse_input(),
            TokenKind::Datalines => self.parse_datalines(),
            TokenKind::Output => {
                self.advance();
                Ok(Statement::Output(self.parse_name_list()?))
            }
            TokenKind::Delete => {
                self.advance();
                self.expect_semicolon()?;
                Ok(Statement::Delete)
            }
            TokenKind::Stop => {
                self.advance();
                self.expect_semicolon()?;
                Ok(Statement::Stop)
            }
            TokenKind::Eof => Err(Error::UnexpectedEof),
            _ => {
                let tok = self.peek().clone();
                Err(Error::syntax(
                    tok.line,
                    tok.column,
                    format!(
                        "Statement is not valid or it is used out of proper order: {}",
                        tok.lexeme
                    ),
                ))
            }
        }
    }

    fn parse_assignment(&mut self) -> Result<Statement> {
        let name = self.expect_name("variable name")?;
        self.consume(&TokenKind::Assign, "=")?;
        let value = self.parse_expression()?;
        self.expect_semicolon()?;
        Ok(Statement::Assignment {
            target: AssignTarget::Variable(name),
            value,
        })
    }

    fn parse_array_assignment(&mut self) -> Result<Statement> {
        let name = self.expect_name("array name")?;
        let index = self.parse_subscript()?;
        self.consume(&TokenKind::Assign, "=")?;
        let value = self.parse_expression()?;
        self.expect_semicolon()?;
        Ok(Statement::Assignment {
            target: AssignTarget::ArrayElement {
                name,
                index: Box::new(index),
            },
            value,
        })
    }

    fn parse_if(&mut self) -> Result<Statement> {
        self.advance(); // IF
        let condition = self.parse_expression()?;

        if self.match_kind(&TokenKind::Semicolon) {
            return Ok(Statement::SubsettingIf(condition));
        }

        self.consume(&TokenKind::Then, "THEN")?;
        let then_branch = Box::new(self.parse_step_statement()?);

        let mut else_ifs = Vec::new();
        while self.match_kind(&TokenKind::ElseIf) {
            let condition = self.parse_expression()?;
            self.consume(&TokenKind::Then, "THEN")?;
            let body = self.parse_step_statement()?;
            else_ifs.push(ElseIfBranch { condition, body });
        }

        let else_branch = if self.match_kind(&TokenKind::Else) {
            Some(Box::new(self.parse_step_statement()?))
        } else {
            None
        };

        Ok(Statement::If {
            condition,
            then_branch,
            else_ifs,
            else_branch,
        })
    }

    fn parse_do(&mut self) -> Result<Statement> {
        self.advance(); // DO

        if self.match_kind(&TokenKind::Semicolon) {
            let body = self.parse_do_body()?;
            return Ok(Statement::Block(body));
        }

        if matches!(self.peek().kind, TokenKind::While | TokenKind::Until) {
            let is_while = self.advance().kind == TokenKind::While;
            self.consume(&TokenKind::LeftParen, "(")?;
            let cond = self.parse_expression()?;
            self.consume(&TokenKind::RightParen, ")")?;
            self.expect_semicolon()?;
            let body = self.parse_do_body()?;
            let condition = if is_while {
                LoopCondition::While(cond)
            } else {
                LoopCondition::Until(cond)
            };
            return Ok(Statement::DoLoop { condition, body });
        }

        let variable = self.expect_name("DO loop variable")?;
        self.consume(&TokenKind::Assign, "=")?;
        let start = self.parse_expression()?;
        self.consume(&TokenKind::To, "TO")?;
        let end = self.parse_expression()?;
        let increment = if self.match_kind(&TokenKind::By) {
            Some(self.parse_expression()?)
        } else {
            None
        };
        self.expect_semicolon()?;
        let body = self.parse_do_body()?;

        Ok(Statement::Do {
            variable,
            start,
            end,
            increment,
            body,
        })
    }

    /// Statements up to and including `END;`
    fn parse_do_body(&mut self) -> Result<Vec<Statement>> {
        let mut body = Vec::new();
        loop {
            if self.match_kind(&TokenKind::End) {
                self.expect_semicolon()?;
                return Ok(body);
            }
            if self.is_at_end() || self.at_step_boundary() {
                let tok = self.peek().clone();
                return Err(self.unexpected_token(&tok, "END"));
            }
            if self.match_kind(&TokenKind::Semicolon) {
                continue;
            }
            match self.parse_step_statement() {
                Ok(stmt) => body.push(stmt),
                Err(err) => {
                    self.errors.push(err);
                    self.synchronize();
                }
            }
        }
    }

    fn parse_array(&mut self) -> Result<Statement> {
        let array_tok = self.advance(); // ARRAY
        let name = self.expect_name("array name")?;

        let close = match self.advance().kind {
            TokenKind::LeftBrace => TokenKind::RightBrace,
            TokenKind::LeftBracket => TokenKind::RightBracket,
            TokenKind::LeftParen => TokenKind::RightParen,
            _ => {
                let tok = self.previous().clone();
                return Err(self.unexpected_token(&tok, "{ after array name"));
            }
        };
        let size = if self.match_kind(&TokenKind::Star) {
            ArraySize::Star
        } else {
            match self.advance() {
                Token {
                    kind: TokenKind::Number(n),
                    ..
                } if n >= 1.0 && n.fract() == 0.0 => ArraySize::Fixed(n as usize),
                tok => return Err(self.unexpected_token(&tok, "array size")),
            }
        };
        self.consume(&close, "closing brace")?;

        let kind = if self.match_kind(&TokenKind::Dollar) {
            // optional element length
            if matches!(self.peek().kind, TokenKind::Number(_)) {
                self.advance();
            }
            VarKind::Character
        } else {
            VarKind::Numeric
        };

        let mut variables = self.parse_name_list()?;
        match size {
            ArraySize::Fixed(n) if variables.is_empty() => {
                variables = (1..=n).map(|i| format!("{}{}", name, i)).collect();
            }
            ArraySize::Fixed(n) if n != variables.len() => {
                return Err(Error::ArraySizeMismatch {
                    name,
                    declared: n,
                    actual: variables.len(),
                });
            }
            ArraySize::Star if variables.is_empty() => {
                return Err(Error::syntax(
                    array_tok.line,
                    array_tok.column,
                    format!("Array {} with size * needs a variable list", name),
                ));
            }
            _ => {}
        }

        self.arrays.insert(name.to_ascii_uppercase());
        Ok(Statement::Array {
            name,
            size,
            kind,
            variables,
        })
    }

    fn parse_retain(&mut self) -> Result<Statement> {
        self.advance(); // RETAIN
        let mut items: Vec<RetainItem> = Vec::new();
        let mut pending = 0usize;

        while !self.check(&TokenKind::Semicolon) {
            if let Some(initial) = self.try_parse_literal()? {
                // An initial value applies to every name listed since the previous one
                let start = items.len() - pending.min(items.len());
                for item in &mut items[start..] {
                    item.initial = Some(initial.clone());
                }
                pending = 0;
                continue;
            }
            for name in self.parse_name_or_range()? {
                items.push(RetainItem {
                    name,
                    initial: None,
                });
                pending += 1;
            }
        }
        self.expect_semicolon()?;
        Ok(Statement::Retain(items))
    }

    fn parse_length(&mut self) -> Result<Statement> {
        self.advance(); // LENGTH
        let mut items = Vec::new();
        let mut pending: Vec<String> = Vec::new();

        while !self.check(&TokenKind::Semicolon) {
            let is_char = self.match_kind(&TokenKind::Dollar);
            if let TokenKind::Number(n) = self.peek().kind {
                self.advance();
                if pending.is_empty() {
                    let tok = self.previous().clone();
                    return Err(Error::syntax(tok.line, tok.column, "LENGTH needs a variable"));
                }
                if n < 1.0 || n.fract() != 0.0 {
                    let tok = self.previous().clone();
                    return Err(Error::syntax(
                        tok.line,
                        tok.column,
                        format!("Invalid length {}", tok.lexeme),
                    ));
                }
                let kind = if is_char {
                    VarKind::Character
                } else {
                    VarKind::Numeric
                };
                for name in pending.drain(..) {
                    items.push(LengthItem {
                        name,
                        kind,
                        length: n as usize,
                    });
                }
                continue;
            }
            pending.extend(self.parse_name_or_range()?);
        }
        if !pending.is_empty() {
            let tok = self.peek().clone();
            return Err(self.unexpected_token(&tok, "length value"));
        }
        self.expect_semicolon()?;
        Ok(Statement::Length(items))
    }

    fn parse_input(&mut self) -> Result<Statement> {
        self.advance(); // INPUT
        let mut fields: Vec<InputField> = Vec::new();
        while !self.check(&TokenKind::Semicolon) {
            if self.match_kind(&TokenKind::Dollar) {
                match fields.last_mut() {
                    Some(field) => field.kind = VarKind::Character,
                    None => {
                        let tok = self.previous().clone();
                        return Err(self.unexpected_token(&tok, "variable name"));
                    }
                }
                continue;
            }
            let name = self.expect_name("INPUT variable")?;
            fields.push(InputField {
                name,
                kind: VarKind::Numeric,
            });
        }
        self.expect_semicolon()?;
        Ok(Statement::Input(fields))
    }

    fn parse_datalines(&mut self) -> Result<Statement> {
        self.advance(); // DATALINES
        self.expect_semicolon()?;
        let body = match self.advance() {
            Token {
                kind: TokenKind::DatalinesBody(body),
                ..
            } => body,
            tok => return Err(self.unexpected_token(&tok, "data lines")),
        };
        self.expect_semicolon()?;
        Ok(Statement::Datalines(body))
    }

    // ------------------------------------------------------------------
    // Shared pieces
    // ------------------------------------------------------------------

    /// `name` or `lib.name`
    pub(super) fn parse_dataset_ref(&mut self) -> Result<DatasetRef> {
        let first = self.expect_name("dataset name")?;
        if self.match_kind(&TokenKind::Dot) {
            let second = self.expect_name("dataset name")?;
            Ok(DatasetRef::qualified(first, second))
        } else {
            Ok(DatasetRef::work(first))
        }
    }

    fn parse_dataset_list(&mut self) -> Result<Vec<DatasetRef>> {
        let mut list = Vec::new();
        while !self.check(&TokenKind::Semicolon) {
            list.push(self.parse_dataset_ref()?);
        }
        self.expect_semicolon()?;
        if list.is_empty() {
            let tok = self.previous().clone();
            return Err(self.unexpected_token(&tok, "dataset name"));
        }
        Ok(list)
    }

    pub(super) fn parse_by_list(&mut self) -> Result<Vec<ByVariable>> {
        let mut list = Vec::new();
        let mut descending = false;
        while !self.check(&TokenKind::Semicolon) {
            if self.check(&TokenKind::Descending) && self.peek_at(1).name().is_some() {
                self.advance();
                descending = true;
                continue;
            }
            let name = self.expect_name("BY variable")?;
            list.push(ByVariable { name, descending });
            descending = false;
        }
        self.expect_semicolon()?;
        if list.is_empty() {
            let tok = self.previous().clone();
            return Err(self.unexpected_token(&tok, "BY variable"));
        }
        Ok(list)
    }

    /// Names up to `;` (consumed); `x1-x3` expands to `x1 x2 x3`
    pub(super) fn parse_name_list(&mut self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        while !self.check(&TokenKind::Semicolon) {
            if self.is_at_end() {
                return Err(Error::UnexpectedEof);
            }
            names.extend(self.parse_name_or_range()?);
        }
        self.expect_semicolon()?;
        Ok(names)
    }

    fn parse_name_or_range(&mut self) -> Result<Vec<String>> {
        let first = self.expect_name("variable name")?;
        if !(self.check(&TokenKind::Minus) && self.peek_at(1).name().is_some()) {
            return Ok(vec![first]);
        }
        self.advance(); // -
        let last_tok = self.peek().clone();
        let last = self.expect_name("variable name")?;

        match (split_numbered(&first), split_numbered(&last)) {
            (Some((prefix, from)), Some((prefix2, to)))
                if prefix.eq_ignore_ascii_case(prefix2) && from <= to =>
            {
                Ok((from..=to).map(|i| format!("{}{}", prefix, i)).collect())
            }
            _ => Err(Error::syntax(
                last_tok.line,
                last_tok.column,
                format!("Invalid variable range {}-{}", first, last),
            )),
        }
    }

    fn try_parse_literal(&mut self) -> Result<Option<Expression>> {
        let expr = match self.peek().kind.clone() {
            TokenKind::Number(n) => Expression::Number(n),
            TokenKind::String(s) => Expression::String(s),
            TokenKind::Dot => Expression::Missing,
            TokenKind::Minus => match self.peek_at(1).kind {
                TokenKind::Number(n) => {
                    self.advance();
                    Expression::Number(-n)
                }
                _ => {
                    let tok = self.peek_at(1).clone();
                    return Err(self.unexpected_token(&tok, "number"));
                }
            },
            _ => return Ok(None),
        };
        self.advance();
        Ok(Some(expr))
    }

    // ------------------------------------------------------------------
    // Token cursor
    // ------------------------------------------------------------------

    /// Skips to just past the next `;`
    pub(super) fn synchronize(&mut self) {
        while !self.is_at_end() {
            if self.advance().kind == TokenKind::Semicolon {
                return;
            }
        }
    }

    pub(super) fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    pub(super) fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    pub(super) fn peek_at(&self, offset: usize) -> &Token {
        let idx = (self.current + offset).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    pub(super) fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    pub(super) fn advance(&mut self) -> Token {
        let tok = self.peek().clone();
        if !self.is_at_end() {
            self.current += 1;
        }
        tok
    }

    pub(super) fn check(&self, kind: &TokenKind) -> bool {
        &self.peek().kind == kind
    }

    pub(super) fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(super) fn consume(&mut self, kind: &TokenKind, expected: &str) -> Result<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            let tok = self.peek().clone();
            Err(self.unexpected_token(&tok, expected))
        }
    }

    pub(super) fn expect_semicolon(&mut self) -> Result<()> {
        self.consume(&TokenKind::Semicolon, ";").map(|_| ())
    }

    pub(super) fn expect_name(&mut self, what: &str) -> Result<String> {
        match self.peek().name() {
            Some(name) => {
                let name = name.to_string();
                self.advance();
                Ok(name)
            }
            None => {
                let tok = self.peek().clone();
                Err(self.unexpected_token(&tok, what))
            }
        }
    }

    fn next_is_assign(&self) -> bool {
        self.peek_at(1).kind == TokenKind::Assign
    }

    /// `name[`, `name{` or `name(` for a declared array, in statement position
    fn next_is_subscript(&self) -> bool {
        match self.peek_at(1).kind {
            TokenKind::LeftBracket | TokenKind::LeftBrace => true,
            TokenKind::LeftParen => self.is_array(self.peek().name().unwrap_or_default()),
            _ => false,
        }
    }

    pub(super) fn is_array(&self, name: &str) -> bool {
        self.arrays.contains(&name.to_ascii_uppercase())
    }

    pub(super) fn unexpected_token(&self, tok: &Token, expected: &str) -> Error {
        if tok.kind == TokenKind::Eof {
            return Error::UnexpectedEof;
        }
        Error::UnexpectedToken {
            expected: expected.to_string(),
            got: tok.kind.to_string(),
            line: tok.line,
            col: tok.column,
        }
    }
}

/// `num12` -> (`num`, 12)
fn split_numbered(name: &str) -> Option<(&str, usize)> {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 || digits == name.len() {
        return None;
    }
    let (prefix, number) = name.split_at(name.len() - digits);
    number.parse().ok().map(|n| (prefix, n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;

    fn parse(source: &str) -> (Program, Vec<Error>) {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let mut parser = Parser::new(tokens);
        let program = parser.parse();
        (program, parser.take_errors())
    }

    fn data_body(source: &str) -> Vec<Statement> {
        let (program, errors) = parse(source);
        assert!(errors.is_empty(), "unexpected errors: {:?}", errors);
        match program.statements.into_iter().last() {
            Some(Statement::DataStep { body, .. }) => body,
            other => panic!("expected DATA step, got {:?}", other),
        }
    }

    #[test]
    fn test_data_step_shape() {
        let (program, errors) = parse("data out; set in; x = 1; run;");
        assert!(errors.is_empty());
        assert_eq!(program.statements.len(), 1);
        match &program.statements[0] {
            Statement::DataStep { outputs, body } => {
                assert_eq!(outputs, &vec![DatasetRef::work("out")]);
                assert_eq!(body.len(), 2);
                assert_eq!(body[0], Statement::Set(vec![DatasetRef::work("in")]));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_soft_keyword_assignment() {
        let body = data_body("data a; sum = sum + 1; run;");
        assert!(matches!(
            &body[0],
            Statement::Assignment { target: AssignTarget::Variable(n), .. } if n == "sum"
        ));
    }

    #[test]
    fn test_if_else_if_chain() {
        let body = data_body(
            "data a; if x > 10 then c = 'hi'; else if x > 5 then c = 'mid'; else if x > 1 then c = 'low'; else c = 'none'; run;",
        );
        match &body[0] {
            Statement::If {
                else_ifs,
                else_branch,
                ..
            } => {
                assert_eq!(else_ifs.len(), 2);
                assert!(else_branch.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_if_then_do_block() {
        let body = data_body("data a; if x then do; y = 1; z = 2; end; else y = 0; run;");
        match &body[0] {
            Statement::If { then_branch, .. } => {
                assert!(matches!(**then_branch, Statement::Block(ref b) if b.len() == 2));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_subsetting_if() {
        let body = data_body("data a; set b; if x > 1; run;");
        assert!(matches!(body[1], Statement::SubsettingIf(_)));
    }

    #[test]
    fn test_do_loops() {
        let body = data_body(
            "data a; do i = 1 to 10 by 2; x = i; end; do while(x < 5); x = x + 1; end; do until(x > 9); x = x + 1; enddo; run;",
        );
        assert!(matches!(body[0], Statement::Do { increment: Some(_), .. }));
        assert!(matches!(
            body[1],
            Statement::DoLoop {
                condition: LoopCondition::While(_),
                ..
            }
        ));
        assert!(matches!(
            body[2],
            Statement::DoLoop {
                condition: LoopCondition::Until(_),
                ..
            }
        ));
    }

    #[test]
    fn test_array_declaration_and_paren_subscript() {
        let body = data_body("data a; array nums{3} n1 n2 n3; nums(2) = 5; y = nums(1); run;");
        assert!(matches!(
            &body[1],
            Statement::Assignment {
                target: AssignTarget::ArrayElement { .. },
                ..
            }
        ));
        assert!(matches!(
            &body[2],
            Statement::Assignment {
                value: Expression::ArrayElement { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_array_size_mismatch_is_error() {
        let (_, errors) = parse("data a; array nums{3} n1 n2; run;");
        assert!(matches!(
            errors[0],
            Error::ArraySizeMismatch {
                declared: 3,
                actual: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_length_must_be_positive_integer() {
        for source in ["data a; length x $ 0; run;", "data a; length x 2.5; run;"] {
            let (_, errors) = parse(source);
            assert!(
                matches!(&errors[0], Error::SyntaxError { message, .. } if message.starts_with("Invalid length")),
                "{}: {:?}",
                source,
                errors
            );
        }

        let body = data_body("data a; length name $ 12 score 8; run;");
        match &body[0] {
            Statement::Length(items) => {
                assert_eq!(items[0].length, 12);
                assert_eq!(items[1].kind, VarKind::Numeric);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_array_without_names_generates_elements() {
        let body = data_body("data a; array q{3}; run;");
        match &body[0] {
            Statement::Array { variables, .. } => {
                assert_eq!(variables, &vec!["q1", "q2", "q3"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_variable_range_list() {
        let body = data_body("data a; keep id x1-x3; run;");
        assert_eq!(
            body[0],
            Statement::Keep(vec!["id".into(), "x1".into(), "x2".into(), "x3".into()])
        );
    }

    #[test]
    fn test_retain_initial_values() {
        let body = data_body("data a; retain total 0 label 'none' a b; run;");
        match &body[0] {
            Statement::Retain(items) => {
                assert_eq!(items.len(), 4);
                assert_eq!(items[0].initial, Some(Expression::Number(0.0)));
                assert_eq!(items[1].initial, Some(Expression::String("none".into())));
                assert_eq!(items[2].initial, None);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_error_recovery_continues() {
        let (program, errors) = parse("data a; x = ; y = 2; run; title 'ok';");
        assert_eq!(errors.len(), 1);
        match &program.statements[0] {
            Statement::DataStep { body, .. } => assert_eq!(body.len(), 1),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(program.statements[1], Statement::Title(Some("ok".into())));
    }

    #[test]
    fn test_global_statements() {
        let (program, errors) = parse(
            "options obs=10 nodate; libname sales csv '/tmp/sales' access=readonly; title; %let n = 5;",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(
            program.statements[0],
            Statement::Options(vec![
                ("OBS".into(), "10".into()),
                ("NODATE".into(), String::new())
            ])
        );
        assert_eq!(
            program.statements[1],
            Statement::Libname {
                libref: "sales".into(),
                engine: Some("csv".into()),
                path: "/tmp/sales".into(),
                readonly: true,
            }
        );
        assert_eq!(program.statements[2], Statement::Title(None));
        assert_eq!(
            program.statements[3],
            Statement::MacroLet {
                name: "n".into(),
                value: "5".into()
            }
        );
    }

    #[test]
    fn test_title_inside_step_is_hoisted() {
        let (program, _) = parse("data a; title 'x'; y = 1; run;");
        assert_eq!(program.statements[0], Statement::Title(Some("x".into())));
        assert!(matches!(program.statements[1], Statement::DataStep { .. }));
    }

    #[test]
    fn test_macro_definition_unsupported() {
        let (_, errors) = parse("%macro m; x = 1;");
        assert!(matches!(errors[0], Error::UnsupportedMacro { .. }));
    }

    #[test]
    fn test_implicit_step_end() {
        let (program, errors) = parse("data a; x = 1; proc print; run;");
        assert!(errors.is_empty());
        assert_eq!(program.statements.len(), 2);
    }

    #[test]
    fn test_input_and_datalines() {
        let body = data_body("data a; input name $ age; datalines;\nann 30\nbob 41\n;\nrun;");
        assert_eq!(
            body[0],
            Statement::Input(vec![
                InputField {
                    name: "name".into(),
                    kind: VarKind::Character
                },
                InputField {
                    name: "age".into(),
                    kind: VarKind::Numeric
                },
            ])
        );
        assert_eq!(body[1], Statement::Datalines("ann 30\nbob 41\n".into()));
    }

    #[test]
    fn test_is_complete_statement() {
        let toks = |s: &str| Scanner::new(s).scan_tokens().unwrap();
        assert!(!Parser::is_complete_statement(&toks("data a; x = 1;")));
        assert!(Parser::is_complete_statement(&toks("data a; x = 1; run;")));
        assert!(Parser::is_complete_statement(&toks("x = 1;")));
        assert!(!Parser::is_complete_statement(&toks("x = 1")));
        assert!(!Parser::is_complete_statement(&toks("")));
    }

    #[test]
    fn test_split_numbered() {
        assert_eq!(split_numbered("num12"), Some(("num", 12)));
        assert_eq!(split_numbered("num"), None);
        assert_eq!(split_numbered("12"), None);
    }
}

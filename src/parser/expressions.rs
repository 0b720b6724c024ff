use super::ast::{BinaryOp, Expression, UnaryOp};
use super::statements::Parser;
use crate::error::{Error, Result};
use crate::lexer::TokenKind;

impl Parser {
    /// Parses a full expression
    pub(super) fn parse_expression(&mut self) -> Result<Expression> {
        self.parse_binary(1)
    }

    /// Precedence climbing over [`BinaryOp::precedence`]
    fn parse_binary(&mut self, min_precedence: u8) -> Result<Expression> {
        let mut left = self.parse_unary()?;

        while let Some(op) = self.binary_op() {
            let precedence = op.precedence();
            if precedence < min_precedence {
                break;
            }
            self.advance();

            let next_min = if op.is_right_associative() {
                precedence
            } else {
                precedence + 1
            };
            let right = self.parse_binary(next_min)?;
            left = Expression::binary(op, left, right);
        }

        Ok(left)
    }

    fn binary_op(&self) -> Option<BinaryOp> {
        let op = match self.peek().kind {
            TokenKind::Or => BinaryOp::Or,
            TokenKind::And => BinaryOp::And,
            TokenKind::Assign | TokenKind::Eq => BinaryOp::Eq,
            TokenKind::NotEq => BinaryOp::NotEq,
            TokenKind::Lt => BinaryOp::Lt,
            TokenKind::Gt => BinaryOp::Gt,
            TokenKind::LtEq => BinaryOp::LtEq,
            TokenKind::GtEq => BinaryOp::GtEq,
            TokenKind::Concat => BinaryOp::Concat,
            TokenKind::Plus => BinaryOp::Add,
            TokenKind::Minus => BinaryOp::Sub,
            TokenKind::Star => BinaryOp::Mul,
            TokenKind::Slash => BinaryOp::Div,
            TokenKind::StarStar => BinaryOp::Pow,
            _ => return None,
        };
        Some(op)
    }

    fn parse_unary(&mut self) -> Result<Expression> {
        let op = match self.peek().kind {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Plus,
            TokenKind::Not => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;

        // Fold negative literals so `-1` stays a plain number
        if let (UnaryOp::Neg, Expression::Number(n)) = (op, &operand) {
            return Ok(Expression::Number(-n));
        }
        Ok(Expression::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expression> {
        let tok = self.peek().clone();

        match tok.kind {
            TokenKind::Number(n) => {
                self.advance();
                Ok(Expression::Number(n))
            }
            TokenKind::String(s) => {
                self.advance();
                Ok(Expression::String(s))
            }
            TokenKind::Dot => {
                self.advance();
                Ok(Expression::Missing)
            }
            TokenKind::MacroVariable(name) => {
                self.advance();
                Ok(Expression::MacroVariable(name))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.consume(&TokenKind::RightParen, ")")?;
                Ok(expr)
            }
            _ => match tok.name() {
                Some(name) => {
                    let name = name.to_string();
                    self.advance();
                    self.parse_name_suffix(name)
                }
                None => Err(self.unexpected_token(&tok, "expression")),
            },
        }
    }

    /// What follows a name: subscript, call arguments, or nothing
    fn parse_name_suffix(&mut self, name: String) -> Result<Expression> {
        match self.peek().kind {
            TokenKind::LeftBracket | TokenKind::LeftBrace => {
                let index = self.parse_subscript()?;
                Ok(Expression::ArrayElement {
                    name,
                    index: Box::new(index),
                })
            }
            TokenKind::LeftParen if self.is_array(&name) => {
                let index = self.parse_subscript()?;
                Ok(Expression::ArrayElement {
                    name,
                    index: Box::new(index),
                })
            }
            TokenKind::LeftParen => {
                self.advance();
                let args = self.parse_arguments()?;
                Ok(Expression::FunctionCall { name, args })
            }
            _ => Ok(Expression::Variable(name)),
        }
    }

    /// `[expr]`, `{expr}` or `(expr)` with matching close
    pub(super) fn parse_subscript(&mut self) -> Result<Expression> {
        let open = self.advance();
        let close = match open.kind {
            TokenKind::LeftBracket => TokenKind::RightBracket,
            TokenKind::LeftBrace => TokenKind::RightBrace,
            TokenKind::LeftParen => TokenKind::RightParen,
            _ => return Err(self.unexpected_token(&open, "subscript")),
        };
        let index = self.parse_expression()?;
        self.consume(&close, "closing subscript")?;
        Ok(index)
    }

    /// Comma-separated arguments after `(`, through `)`.
    /// `OF x1-x3` is accepted and expanded to a variable list.
    fn parse_arguments(&mut self) -> Result<Vec<Expression>> {
        let mut args = Vec::new();
        if self.match_kind(&TokenKind::RightParen) {
            return Ok(args);
        }

        if matches!(self.peek().kind, TokenKind::Identifier(ref w) if w.eq_ignore_ascii_case("of"))
            && self.peek_at(1).name().is_some()
        {
            self.advance();
            while !self.check(&TokenKind::RightParen) {
                if self.is_at_end() {
                    return Err(Error::UnexpectedEof);
                }
                let first = self.expect_name("variable name")?;
                if self.match_kind(&TokenKind::Minus) {
                    let last = self.expect_name("variable name")?;
                    args.extend(expand_range(&first, &last).into_iter().map(Expression::Variable));
                } else {
                    args.push(Expression::Variable(first));
                }
            }
            self.advance();
            return Ok(args);
        }

        loop {
            args.push(self.parse_expression()?);
            if self.match_kind(&TokenKind::Comma) {
                continue;
            }
            self.consume(&TokenKind::RightParen, ")")?;
            return Ok(args);
        }
    }
}

/// `x1`..`x3` -> `x1 x2 x3`; anything else yields the two names
fn expand_range(first: &str, last: &str) -> Vec<String> {
    let split = |s: &str| {
        let digits = s.len() - s.trim_end_matches(|c: char| c.is_ascii_digit()).len();
        let (prefix, number) = s.split_at(s.len() - digits);
        number.parse::<usize>().ok().map(|n| (prefix.to_string(), n))
    };
    match (split(first), split(last)) {
        (Some((p1, a)), Some((p2, b))) if p1.eq_ignore_ascii_case(&p2) && !p1.is_empty() && a <= b => {
            (a..=b).map(|i| format!("{}{}", p1, i)).collect()
        }
        _ => vec![first.to_string(), last.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::{AssignTarget, Statement};

    fn expr(source: &str) -> Expression {
        let tokens = Scanner::new(&format!("x = {};", source))
            .scan_tokens()
            .unwrap();
        let mut parser = Parser::new(tokens);
        let program = parser.parse();
        assert!(parser.errors().is_empty(), "{:?}", parser.errors());
        match program.statements.into_iter().next() {
            Some(Statement::Assignment {
                target: AssignTarget::Variable(_),
                value,
            }) => value,
            other => panic!("unexpected {:?}", other),
        }
    }

    fn num(n: f64) -> Expression {
        Expression::Number(n)
    }

    fn var(name: &str) -> Expression {
        Expression::Variable(name.into())
    }

    #[test]
    fn test_multiplicative_binds_tighter() {
        assert_eq!(
            expr("1 + 2 * 3"),
            Expression::binary(
                BinaryOp::Add,
                num(1.0),
                Expression::binary(BinaryOp::Mul, num(2.0), num(3.0))
            )
        );
    }

    #[test]
    fn test_left_associative_subtraction() {
        assert_eq!(
            expr("10 - 4 - 3"),
            Expression::binary(
                BinaryOp::Sub,
                Expression::binary(BinaryOp::Sub, num(10.0), num(4.0)),
                num(3.0)
            )
        );
    }

    #[test]
    fn test_power_right_associative() {
        assert_eq!(
            expr("2 ** 3 ** 2"),
            Expression::binary(
                BinaryOp::Pow,
                num(2.0),
                Expression::binary(BinaryOp::Pow, num(3.0), num(2.0))
            )
        );
    }

    #[test]
    fn test_logical_precedence() {
        // a or b and c > 1  ==  a or (b and (c > 1))
        assert_eq!(
            expr("a or b and c > 1"),
            Expression::binary(
                BinaryOp::Or,
                var("a"),
                Expression::binary(
                    BinaryOp::And,
                    var("b"),
                    Expression::binary(BinaryOp::Gt, var("c"), num(1.0))
                )
            )
        );
    }

    #[test]
    fn test_equals_inside_expression_is_comparison() {
        assert_eq!(
            expr("a = 1"),
            Expression::binary(BinaryOp::Eq, var("a"), num(1.0))
        );
        assert_eq!(
            expr("a eq 1"),
            Expression::binary(BinaryOp::Eq, var("a"), num(1.0))
        );
    }

    #[test]
    fn test_missing_literal_and_negative_number() {
        assert_eq!(
            expr("a ne ."),
            Expression::binary(BinaryOp::NotEq, var("a"), Expression::Missing)
        );
        assert_eq!(expr("-5"), num(-5.0));
    }

    #[test]
    fn test_function_call_and_soft_keyword_name() {
        assert_eq!(
            expr("sum(a, 2) + mean"),
            Expression::binary(
                BinaryOp::Add,
                Expression::FunctionCall {
                    name: "sum".into(),
                    args: vec![var("a"), num(2.0)]
                },
                var("mean")
            )
        );
    }

    #[test]
    fn test_of_variable_list() {
        assert_eq!(
            expr("sum(of q1-q3)"),
            Expression::FunctionCall {
                name: "sum".into(),
                args: vec![var("q1"), var("q2"), var("q3")]
            }
        );
    }

    #[test]
    fn test_array_subscripts() {
        assert_eq!(
            expr("arr[i + 1]"),
            Expression::ArrayElement {
                name: "arr".into(),
                index: Box::new(Expression::binary(BinaryOp::Add, var("i"), num(1.0)))
            }
        );
        assert!(matches!(expr("arr{2}"), Expression::ArrayElement { .. }));
    }

    #[test]
    fn test_concat_and_macro_variable() {
        assert_eq!(
            expr("name || &suffix"),
            Expression::binary(
                BinaryOp::Concat,
                var("name"),
                Expression::MacroVariable("suffix".into())
            )
        );
    }

    #[test]
    fn test_unexpected_token_reports_error() {
        let tokens = Scanner::new("x = * 2;").scan_tokens().unwrap();
        let mut parser = Parser::new(tokens);
        parser.parse();
        assert!(matches!(
            parser.errors()[0],
            Error::UnexpectedToken { .. }
        ));
    }
}

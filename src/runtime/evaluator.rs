//! Expression evaluation
//!
//! Expressions are evaluated against a [`Scope`], which supplies variable,
//! array and macro-variable values. The DATA step, the WHERE clause of
//! PROC SORT and open code each provide their own scope.

use tracing::warn;

use crate::error::{Error, Result};
use crate::parser::{BinaryOp, Expression, UnaryOp};
use crate::runtime::value::{compare_numbers, Value};
use crate::tools::ToolRegistry;

/// Name lookup for expression evaluation
pub trait Scope {
    /// Variable value; missing when undefined
    fn variable(&self, name: &str) -> Value;

    /// 1-based array element
    fn array_element(&self, name: &str, _index: i64) -> Result<Value> {
        Err(Error::UndefinedArray {
            name: name.to_string(),
        })
    }

    /// Declared size of an array
    fn array_len(&self, _name: &str) -> Option<usize> {
        None
    }

    /// Macro variable text
    fn macro_variable(&self, _name: &str) -> Option<String> {
        None
    }
}

/// Evaluates `expr` in `scope`, calling functions from `registry`
pub fn evaluate(expr: &Expression, scope: &dyn Scope, registry: &ToolRegistry) -> Result<Value> {
    match expr {
        Expression::Number(n) => Ok(Value::Numeric(*n)),
        Expression::String(s) => Ok(Value::Character(s.clone())),
        Expression::Missing => Ok(Value::missing()),
        Expression::Variable(name) => Ok(scope.variable(name)),
        Expression::MacroVariable(name) => Ok(match scope.macro_variable(name) {
            Some(text) => macro_value(text),
            None => {
                warn!("WARNING: Apparent symbolic reference {} not resolved.", name.to_ascii_uppercase());
                Value::Character(format!("&{}", name))
            }
        }),
        Expression::Binary { op, left, right } => {
            // AND/OR short-circuit
            match op {
                BinaryOp::And => {
                    let l = evaluate(left, scope, registry)?;
                    if !l.is_truthy() {
                        return Ok(Value::from_bool(false));
                    }
                    let r = evaluate(right, scope, registry)?;
                    Ok(Value::from_bool(r.is_truthy()))
                }
                BinaryOp::Or => {
                    let l = evaluate(left, scope, registry)?;
                    if l.is_truthy() {
                        return Ok(Value::from_bool(true));
                    }
                    let r = evaluate(right, scope, registry)?;
                    Ok(Value::from_bool(r.is_truthy()))
                }
                _ => {
                    let l = evaluate(left, scope, registry)?;
                    let r = evaluate(right, scope, registry)?;
                    binary_op(*op, &l, &r)
                }
            }
        }
        Expression::Unary { op, operand } => {
            let value = evaluate(operand, scope, registry)?;
            Ok(unary_op(*op, &value))
        }
        Expression::FunctionCall { name, args } => {
            if name.eq_ignore_ascii_case("dim") {
                return dim(args, scope);
            }
            let values = args
                .iter()
                .map(|a| evaluate(a, scope, registry))
                .collect::<Result<Vec<_>>>()?;
            registry.call(name, &values)
        }
        Expression::ArrayElement { name, index } => {
            let index = evaluate(index, scope, registry)?.as_number();
            if index.is_nan() {
                return Err(Error::ArrayIndexOutOfBounds {
                    name: name.clone(),
                    index: 0,
                    size: scope.array_len(name).unwrap_or(0),
                });
            }
            scope.array_element(name, index.trunc() as i64)
        }
    }
}

/// Applies a non-logical binary operator to two evaluated operands
pub fn binary_op(op: BinaryOp, left: &Value, right: &Value) -> Result<Value> {
    if op == BinaryOp::Concat {
        return Ok(Value::Character(format!(
            "{}{}",
            left.as_string(),
            right.as_string()
        )));
    }

    if op.is_comparison() {
        let ordering = match (left, right) {
            (Value::Character(a), Value::Character(b)) => a.trim_end().cmp(b.trim_end()),
            _ => compare_numbers(left.as_number(), right.as_number()),
        };
        let result = match op {
            BinaryOp::Eq => ordering.is_eq(),
            BinaryOp::NotEq => ordering.is_ne(),
            BinaryOp::Lt => ordering.is_lt(),
            BinaryOp::Gt => ordering.is_gt(),
            BinaryOp::LtEq => ordering.is_le(),
            _ => ordering.is_ge(),
        };
        return Ok(Value::from_bool(result));
    }

    let a = left.as_number();
    let b = right.as_number();
    if a.is_nan() || b.is_nan() {
        return Ok(Value::missing());
    }
    let result = match op {
        BinaryOp::Add => a + b,
        BinaryOp::Sub => a - b,
        BinaryOp::Mul => a * b,
        BinaryOp::Div => {
            if b == 0.0 {
                return Ok(Value::missing());
            }
            a / b
        }
        BinaryOp::Pow => a.powf(b),
        BinaryOp::And => (a != 0.0 && b != 0.0) as u8 as f64,
        BinaryOp::Or => (a != 0.0 || b != 0.0) as u8 as f64,
        other => {
            return Err(Error::UnsupportedOperator {
                op: other.to_string(),
                operands: format!("{} and {}", left.type_name(), right.type_name()),
            })
        }
    };
    Ok(if result.is_finite() {
        Value::Numeric(result)
    } else {
        Value::missing()
    })
}

/// Applies a unary operator
pub fn unary_op(op: UnaryOp, value: &Value) -> Value {
    match op {
        UnaryOp::Neg => Value::Numeric(-value.as_number()),
        UnaryOp::Plus => Value::Numeric(value.as_number()),
        UnaryOp::Not => Value::from_bool(!value.is_truthy()),
    }
}

/// `DIM(array)`: declared size of an array
fn dim(args: &[Expression], scope: &dyn Scope) -> Result<Value> {
    match args {
        [Expression::Variable(name)] => scope
            .array_len(name)
            .map(|n| Value::Numeric(n as f64))
            .ok_or_else(|| Error::UndefinedArray { name: name.clone() }),
        _ => Err(Error::InvalidArguments {
            function: "DIM".to_string(),
            reason: "expected an array name".to_string(),
        }),
    }
}

/// Macro text is substituted as a number when it reads as one
fn macro_value(text: String) -> Value {
    match text.trim().parse::<f64>() {
        Ok(n) => Value::Numeric(n),
        Err(_) => Value::Character(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapScope(HashMap<String, Value>);

    impl Scope for MapScope {
        fn variable(&self, name: &str) -> Value {
            self.0.get(name).cloned().unwrap_or_else(Value::missing)
        }

        fn macro_variable(&self, name: &str) -> Option<String> {
            (name == "year").then(|| "2024".to_string())
        }
    }

    fn eval(expr: &Expression) -> Value {
        let mut vars = HashMap::new();
        vars.insert("x".to_string(), Value::Numeric(4.0));
        vars.insert("s".to_string(), Value::from("abc"));
        evaluate(expr, &MapScope(vars), &ToolRegistry::new()).unwrap()
    }

    fn num(n: f64) -> Expression {
        Expression::Number(n)
    }

    fn bin(op: BinaryOp, l: Expression, r: Expression) -> Expression {
        Expression::binary(op, l, r)
    }

    #[test]
    fn test_division_by_zero_is_missing() {
        assert!(eval(&bin(BinaryOp::Div, num(1.0), num(0.0))).is_missing());
    }

    #[test]
    fn test_missing_propagates_through_arithmetic() {
        let missing_var = Expression::Variable("nope".into());
        assert!(eval(&bin(BinaryOp::Add, missing_var, num(1.0))).is_missing());
    }

    #[test]
    fn test_comparisons_yield_one_or_zero() {
        let x = Expression::Variable("x".into());
        assert_eq!(eval(&bin(BinaryOp::Gt, x.clone(), num(3.0))), Value::Numeric(1.0));
        assert_eq!(eval(&bin(BinaryOp::Eq, x, num(5.0))), Value::Numeric(0.0));
        // missing is lower than any number
        assert_eq!(
            eval(&bin(BinaryOp::Lt, Expression::Missing, num(-100.0))),
            Value::Numeric(1.0)
        );
    }

    #[test]
    fn test_string_comparison_ignores_trailing_blanks() {
        let s = Expression::Variable("s".into());
        assert_eq!(
            eval(&bin(BinaryOp::Eq, s, Expression::String("abc   ".into()))),
            Value::Numeric(1.0)
        );
    }

    #[test]
    fn test_permissive_string_arithmetic() {
        assert_eq!(
            eval(&bin(BinaryOp::Add, Expression::String("abc".into()), num(2.0))),
            Value::Numeric(2.0)
        );
        assert_eq!(
            eval(&bin(BinaryOp::Mul, Expression::String(" 3 ".into()), num(2.0))),
            Value::Numeric(6.0)
        );
    }

    #[test]
    fn test_logical_operators() {
        assert_eq!(
            eval(&bin(BinaryOp::And, num(1.0), Expression::Missing)),
            Value::Numeric(0.0)
        );
        assert_eq!(
            eval(&bin(BinaryOp::Or, num(0.0), num(2.0))),
            Value::Numeric(1.0)
        );
        assert_eq!(
            eval(&Expression::Unary {
                op: UnaryOp::Not,
                operand: Box::new(num(0.0))
            }),
            Value::Numeric(1.0)
        );
    }

    #[test]
    fn test_concat_and_power() {
        assert_eq!(
            eval(&bin(BinaryOp::Concat, Expression::String("a".into()), num(1.0))),
            Value::from("a1")
        );
        assert_eq!(eval(&bin(BinaryOp::Pow, num(2.0), num(10.0))), Value::Numeric(1024.0));
    }

    #[test]
    fn test_function_calls_and_macros() {
        let call = Expression::FunctionCall {
            name: "sqrt".into(),
            args: vec![num(-1.0)],
        };
        assert!(eval(&call).is_missing());
        assert_eq!(
            eval(&Expression::MacroVariable("year".into())),
            Value::Numeric(2024.0)
        );
    }

    #[test]
    fn test_array_without_declaration_fails() {
        let mut vars = HashMap::new();
        vars.insert("i".to_string(), Value::Numeric(1.0));
        let expr = Expression::ArrayElement {
            name: "a".into(),
            index: Box::new(Expression::Variable("i".into())),
        };
        let err = evaluate(&expr, &MapScope(vars), &ToolRegistry::new()).unwrap_err();
        assert!(matches!(err, Error::UndefinedArray { .. }));
    }
}

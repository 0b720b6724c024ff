//! Math functions
//!
//! Missing arguments give missing results, and so do arguments outside a
//! function's domain.

use crate::error::Result;
use crate::runtime::Value;
use crate::tools::{invalid_args, Tool, ToolRegistry};

/// Register math tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(AbsTool);
    registry.register(SqrtTool);
    registry.register(LogTool);
    registry.register(Log10Tool);
    registry.register(ExpTool);
    registry.register(CeilTool);
    registry.register(FloorTool);
    registry.register(RoundTool);
    registry.register(IntTool);
    registry.register(ModTool);
}

/// Applies `f` to a non-missing argument; `NaN`/infinite results become missing
fn map_number(value: &Value, f: impl Fn(f64) -> f64) -> Value {
    let n = value.as_number();
    if n.is_nan() {
        return Value::missing();
    }
    let result = f(n);
    if result.is_finite() {
        Value::Numeric(result)
    } else {
        Value::missing()
    }
}

/// Absolute value
///
/// Usage: `ABS(number) -> number`
/// Example: `ABS(-5)` returns `5`
pub struct AbsTool;

impl Tool for AbsTool {
    fn name(&self) -> &str {
        "ABS"
    }

    fn description(&self) -> &str {
        "Absolute value"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(map_number(&args[0], f64::abs))
    }
}

/// Square root; negative arguments give missing
///
/// Usage: `SQRT(number) -> number`
/// Example: `SQRT(16)` returns `4`
pub struct SqrtTool;

impl Tool for SqrtTool {
    fn name(&self) -> &str {
        "SQRT"
    }

    fn description(&self) -> &str {
        "Square root"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(map_number(&args[0], f64::sqrt))
    }
}

/// Natural logarithm; non-positive arguments give missing
pub struct LogTool;

impl Tool for LogTool {
    fn name(&self) -> &str {
        "LOG"
    }

    fn description(&self) -> &str {
        "Natural logarithm"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(map_number(&args[0], |n| if n > 0.0 { n.ln() } else { f64::NAN }))
    }
}

/// Base-10 logarithm; non-positive arguments give missing
pub struct Log10Tool;

impl Tool for Log10Tool {
    fn name(&self) -> &str {
        "LOG10"
    }

    fn description(&self) -> &str {
        "Base-10 logarithm"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(map_number(&args[0], |n| {
            if n > 0.0 {
                n.log10()
            } else {
                f64::NAN
            }
        }))
    }
}

/// Exponential
pub struct ExpTool;

impl Tool for ExpTool {
    fn name(&self) -> &str {
        "EXP"
    }

    fn description(&self) -> &str {
        "e raised to a power"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(map_number(&args[0], f64::exp))
    }
}

/// Smallest integer not below the argument
pub struct CeilTool;

impl Tool for CeilTool {
    fn name(&self) -> &str {
        "CEIL"
    }

    fn description(&self) -> &str {
        "Round up to integer"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(map_number(&args[0], f64::ceil))
    }
}

/// Largest integer not above the argument
pub struct FloorTool;

impl Tool for FloorTool {
    fn name(&self) -> &str {
        "FLOOR"
    }

    fn description(&self) -> &str {
        "Round down to integer"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(map_number(&args[0], f64::floor))
    }
}

/// Rounds to a number of decimal places (default 0)
///
/// Usage: `ROUND(number [, places]) -> number`
/// Example: `ROUND(3.14159, 2)` returns `3.14`
pub struct RoundTool;

impl Tool for RoundTool {
    fn name(&self) -> &str {
        "ROUND"
    }

    fn description(&self) -> &str {
        "Round to a number of decimal places"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        if args.len() > 2 {
            return Err(invalid_args("ROUND", "expected 1 or 2 arguments"));
        }
        let places = match args.get(1) {
            Some(p) if p.is_missing() => return Ok(Value::missing()),
            Some(p) => p.as_number().trunc() as i32,
            None => 0,
        };
        let factor = 10f64.powi(places);
        Ok(map_number(&args[0], |n| (n * factor).round() / factor))
    }
}

/// Integer part, truncating toward zero
pub struct IntTool;

impl Tool for IntTool {
    fn name(&self) -> &str {
        "INT"
    }

    fn description(&self) -> &str {
        "Integer part"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(map_number(&args[0], f64::trunc))
    }
}

/// Remainder with the sign of the dividend; zero divisor gives missing
pub struct ModTool;

impl Tool for ModTool {
    fn name(&self) -> &str {
        "MOD"
    }

    fn description(&self) -> &str {
        "Remainder of a division"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let divisor = args[1].as_number();
        if divisor.is_nan() || divisor == 0.0 {
            return Ok(Value::missing());
        }
        Ok(map_number(&args[0], |n| n % divisor))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Value {
        Value::Numeric(n)
    }

    #[test]
    fn test_out_of_domain_is_missing() {
        assert!(SqrtTool.execute(&[num(-4.0)]).unwrap().is_missing());
        assert!(LogTool.execute(&[num(0.0)]).unwrap().is_missing());
        assert!(Log10Tool.execute(&[num(-10.0)]).unwrap().is_missing());
        assert!(ModTool.execute(&[num(5.0), num(0.0)]).unwrap().is_missing());
    }

    #[test]
    fn test_missing_propagates() {
        assert!(AbsTool.execute(&[Value::missing()]).unwrap().is_missing());
        assert!(ExpTool.execute(&[Value::missing()]).unwrap().is_missing());
    }

    #[test]
    fn test_round_places() {
        assert_eq!(RoundTool.execute(&[num(3.14159), num(2.0)]).unwrap(), num(3.14));
        assert_eq!(RoundTool.execute(&[num(2.5)]).unwrap(), num(3.0));
        assert_eq!(RoundTool.execute(&[num(1234.0), num(-2.0)]).unwrap(), num(1200.0));
    }

    #[test]
    fn test_basic_values() {
        assert_eq!(SqrtTool.execute(&[num(16.0)]).unwrap(), num(4.0));
        assert_eq!(Log10Tool.execute(&[num(1000.0)]).unwrap(), num(3.0));
        assert_eq!(IntTool.execute(&[num(-2.7)]).unwrap(), num(-2.0));
        assert_eq!(ModTool.execute(&[num(-7.0), num(3.0)]).unwrap(), num(-1.0));
        assert_eq!(CeilTool.execute(&[Value::from("1.2")]).unwrap(), num(2.0));
    }
}

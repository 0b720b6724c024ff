//! Descriptive statistics across arguments
//!
//! Missing arguments are skipped; when every argument is missing the
//! result is missing.

use crate::error::Result;
use crate::runtime::Value;
use crate::tools::{Tool, ToolRegistry};

/// Register statistical tools
pub fn register(registry: &mut ToolRegistry) {
    registry.register(SumTool);
    registry.register(MeanTool);
    registry.register(MinTool);
    registry.register(MaxTool);
    registry.register(NTool);
    registry.register(NmissTool);
    registry.register(MissingTool);
}

fn present(args: &[Value]) -> impl Iterator<Item = f64> + '_ {
    args.iter()
        .filter(|v| !v.is_missing())
        .map(Value::as_number)
        .filter(|n| !n.is_nan())
}

fn or_missing(n: Option<f64>) -> Value {
    n.map(Value::Numeric).unwrap_or_else(Value::missing)
}

/// Sum of the non-missing arguments
///
/// Usage: `SUM(a, b, ...) -> number`
/// Example: `SUM(1, ., 3)` returns `4`
pub struct SumTool;

impl Tool for SumTool {
    fn name(&self) -> &str {
        "SUM"
    }

    fn description(&self) -> &str {
        "Sum of non-missing arguments"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(or_missing(present(args).fold(None, |acc, n| {
            Some(acc.unwrap_or(0.0) + n)
        })))
    }
}

/// Arithmetic mean of the non-missing arguments
pub struct MeanTool;

impl Tool for MeanTool {
    fn name(&self) -> &str {
        "MEAN"
    }

    fn description(&self) -> &str {
        "Mean of non-missing arguments"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let (sum, count) = present(args).fold((0.0, 0usize), |(s, c), n| (s + n, c + 1));
        Ok(if count == 0 {
            Value::missing()
        } else {
            Value::Numeric(sum / count as f64)
        })
    }
}

/// Smallest non-missing argument
pub struct MinTool;

impl Tool for MinTool {
    fn name(&self) -> &str {
        "MIN"
    }

    fn description(&self) -> &str {
        "Smallest non-missing argument"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(or_missing(present(args).reduce(f64::min)))
    }
}

/// Largest non-missing argument
pub struct MaxTool;

impl Tool for MaxTool {
    fn name(&self) -> &str {
        "MAX"
    }

    fn description(&self) -> &str {
        "Largest non-missing argument"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(or_missing(present(args).reduce(f64::max)))
    }
}

/// Count of non-missing arguments
pub struct NTool;

impl Tool for NTool {
    fn name(&self) -> &str {
        "N"
    }

    fn description(&self) -> &str {
        "Number of non-missing arguments"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::Numeric(present(args).count() as f64))
    }
}

/// Count of missing arguments
pub struct NmissTool;

impl Tool for NmissTool {
    fn name(&self) -> &str {
        "NMISS"
    }

    fn description(&self) -> &str {
        "Number of missing arguments"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let n = args.iter().filter(|v| v.is_missing()).count();
        Ok(Value::Numeric(n as f64))
    }
}

/// 1 when the argument is missing (numeric or character), else 0
pub struct MissingTool;

impl Tool for MissingTool {
    fn name(&self) -> &str {
        "MISSING"
    }

    fn description(&self) -> &str {
        "Test for a missing value"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::from_bool(args[0].is_missing()))
    }
}

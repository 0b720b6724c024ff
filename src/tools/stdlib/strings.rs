//! Character functions
//!
//! Positions are 1-based and counted in characters. Numeric arguments are
//! used in their listing form.

use crate::error::Result;
use crate::runtime::Value;
use crate::tools::{invalid_args, Tool, ToolRegistry};

/// Register all character functions
pub fn register(registry: &mut ToolRegistry) {
    registry.register(SubstrTool);
    registry.register(TrimTool);
    registry.register(LeftTool);
    registry.register(RightTool);
    registry.register(UpcaseTool);
    registry.register(LowcaseTool);
    registry.register(StripTool);
    registry.register(LengthTool);
    registry.register(IndexTool);
    registry.register(CompressTool);
    registry.register(CatTool);
    registry.register(CatsTool);
}

fn text(value: &Value) -> String {
    match value {
        Value::Character(s) => s.clone(),
        other => other.as_string(),
    }
}

/// Extracts part of a string
///
/// Usage: `SUBSTR(string, position [, length]) -> string`
/// Example: `SUBSTR('abcdef', 2, 3)` returns `'bcd'`
///
/// A position outside the string gives the empty string; the length is
/// clamped to what is available.
pub struct SubstrTool;

impl Tool for SubstrTool {
    fn name(&self) -> &str {
        "SUBSTR"
    }

    fn description(&self) -> &str {
        "Extract a substring"
    }

    fn min_args(&self) -> usize {
        2
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        if args.len() > 3 {
            return Err(invalid_args("SUBSTR", "expected 2 or 3 arguments"));
        }
        let chars: Vec<char> = text(&args[0]).chars().collect();
        let position = args[1].as_number();
        if position.is_nan() || position < 1.0 || position as usize > chars.len() {
            return Ok(Value::from(""));
        }
        let start = position as usize - 1;
        let available = chars.len() - start;
        let length = match args.get(2) {
            Some(len) => {
                let len = len.as_number();
                if len.is_nan() || len < 1.0 {
                    return Ok(Value::from(""));
                }
                (len as usize).min(available)
            }
            None => available,
        };
        Ok(Value::Character(chars[start..start + length].iter().collect()))
    }
}

/// Removes trailing blanks
pub struct TrimTool;

impl Tool for TrimTool {
    fn name(&self) -> &str {
        "TRIM"
    }

    fn description(&self) -> &str {
        "Remove trailing blanks"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::Character(text(&args[0]).trim_end().to_string()))
    }
}

/// Left-aligns: leading blanks move to the end, length unchanged
pub struct LeftTool;

impl Tool for LeftTool {
    fn name(&self) -> &str {
        "LEFT"
    }

    fn description(&self) -> &str {
        "Left-align a string"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let s = text(&args[0]);
        let body = s.trim_start();
        let pad = s.chars().count() - body.chars().count();
        Ok(Value::Character(format!("{}{}", body, " ".repeat(pad))))
    }
}

/// Right-aligns: trailing blanks move to the front, length unchanged
pub struct RightTool;

impl Tool for RightTool {
    fn name(&self) -> &str {
        "RIGHT"
    }

    fn description(&self) -> &str {
        "Right-align a string"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let s = text(&args[0]);
        let body = s.trim_end();
        let pad = s.chars().count() - body.chars().count();
        Ok(Value::Character(format!("{}{}", " ".repeat(pad), body)))
    }
}

/// Converts to uppercase
pub struct UpcaseTool;

impl Tool for UpcaseTool {
    fn name(&self) -> &str {
        "UPCASE"
    }

    fn description(&self) -> &str {
        "Convert to uppercase"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::Character(text(&args[0]).to_uppercase()))
    }
}

/// Converts to lowercase
pub struct LowcaseTool;

impl Tool for LowcaseTool {
    fn name(&self) -> &str {
        "LOWCASE"
    }

    fn description(&self) -> &str {
        "Convert to lowercase"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::Character(text(&args[0]).to_lowercase()))
    }
}

/// Removes leading and trailing blanks
pub struct StripTool;

impl Tool for StripTool {
    fn name(&self) -> &str {
        "STRIP"
    }

    fn description(&self) -> &str {
        "Remove leading and trailing blanks"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::Character(text(&args[0]).trim().to_string()))
    }
}

/// Length without trailing blanks; a blank string has length 1
pub struct LengthTool;

impl Tool for LengthTool {
    fn name(&self) -> &str {
        "LENGTH"
    }

    fn description(&self) -> &str {
        "Length excluding trailing blanks"
    }

    fn arity(&self) -> Option<usize> {
        Some(1)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let len = text(&args[0]).trim_end().chars().count().max(1);
        Ok(Value::Numeric(len as f64))
    }
}

/// Position of the first occurrence of an excerpt, 0 when absent
///
/// Usage: `INDEX(string, excerpt) -> number`
/// Example: `INDEX('hello world', 'wor')` returns `7`
pub struct IndexTool;

impl Tool for IndexTool {
    fn name(&self) -> &str {
        "INDEX"
    }

    fn description(&self) -> &str {
        "Find a substring"
    }

    fn arity(&self) -> Option<usize> {
        Some(2)
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        let haystack = text(&args[0]);
        let needle = text(&args[1]);
        if needle.is_empty() {
            return Ok(Value::Numeric(0.0));
        }
        let position = haystack
            .find(&needle)
            .map(|byte| haystack[..byte].chars().count() + 1)
            .unwrap_or(0);
        Ok(Value::Numeric(position as f64))
    }
}

/// Removes characters (blanks by default)
///
/// Usage: `COMPRESS(string [, chars]) -> string`
/// Example: `COMPRESS('(555) 123', '() ')` returns `'555123'`
pub struct CompressTool;

impl Tool for CompressTool {
    fn name(&self) -> &str {
        "COMPRESS"
    }

    fn description(&self) -> &str {
        "Remove characters from a string"
    }

    fn min_args(&self) -> usize {
        1
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        if args.len() > 2 {
            return Err(invalid_args("COMPRESS", "expected 1 or 2 arguments"));
        }
        let remove = args.get(1).map(text).unwrap_or_else(|| " ".to_string());
        let result: String = text(&args[0])
            .chars()
            .filter(|c| !remove.contains(*c))
            .collect();
        Ok(Value::Character(result))
    }
}

/// Concatenates arguments as they are
pub struct CatTool;

impl Tool for CatTool {
    fn name(&self) -> &str {
        "CAT"
    }

    fn description(&self) -> &str {
        "Concatenate without trimming"
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::Character(args.iter().map(text).collect()))
    }
}

/// Concatenates arguments after stripping each one
pub struct CatsTool;

impl Tool for CatsTool {
    fn name(&self) -> &str {
        "CATS"
    }

    fn description(&self) -> &str {
        "Concatenate after stripping blanks"
    }

    fn execute(&self, args: &[Value]) -> Result<Value> {
        Ok(Value::Character(
            args.iter().map(|a| text(a).trim().to_string()).collect(),
        ))
    }
}

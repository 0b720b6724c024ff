//! Function library
//!
//! Built-in DATA-step functions implement [`Tool`] and live in a
//! [`ToolRegistry`] keyed by uppercase name.

pub mod stdlib;

use crate::error::{Error, Result};
use crate::runtime::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Tool trait - every built-in function implements this
pub trait Tool: Send + Sync {
    /// Function name as called from programs
    fn name(&self) -> &str;

    /// Short description for `help`
    fn description(&self) -> &str;

    /// Execute the function
    fn execute(&self, args: &[Value]) -> Result<Value>;

    /// Exact argument count, `None` for variadic
    fn arity(&self) -> Option<usize> {
        None
    }

    /// Smallest accepted argument count
    fn min_args(&self) -> usize {
        self.arity().unwrap_or(0)
    }
}

/// Tool registry
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create new registry with the standard library
    pub fn new() -> Self {
        let mut registry = ToolRegistry::empty();
        stdlib::register_all(&mut registry);
        registry
    }

    /// Create empty registry (for testing)
    pub fn empty() -> Self {
        ToolRegistry {
            tools: HashMap::new(),
        }
    }

    /// Register a tool, replacing any tool of the same name
    pub fn register<T: Tool + 'static>(&mut self, tool: T) {
        let name = tool.name().to_ascii_uppercase();
        self.tools.insert(name, Arc::new(tool));
    }

    /// Get tool by name (case-insensitive)
    pub fn get(&self, name: &str) -> Result<Arc<dyn Tool>> {
        self.tools
            .get(&name.to_ascii_uppercase())
            .cloned()
            .ok_or_else(|| Error::UndefinedFunction {
                name: name.to_ascii_uppercase(),
            })
    }

    /// Looks up a function, checks its argument count and runs it
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let tool = self.get(name)?;
        if let Some(arity) = tool.arity() {
            if args.len() != arity {
                return Err(Error::InvalidArguments {
                    function: tool.name().to_string(),
                    reason: format!("expected {} argument(s), got {}", arity, args.len()),
                });
            }
        } else if args.len() < tool.min_args() {
            return Err(Error::InvalidArguments {
                function: tool.name().to_string(),
                reason: format!(
                    "expected at least {} argument(s), got {}",
                    tool.min_args(),
                    args.len()
                ),
            });
        }
        tool.execute(args)
    }

    /// Check if tool exists
    pub fn has(&self, name: &str) -> bool {
        self.tools.contains_key(&name.to_ascii_uppercase())
    }

    /// List all tool names
    pub fn list_tools(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Get tool count
    pub fn count(&self) -> usize {
        self.tools.len()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Argument error for `function`
pub(crate) fn invalid_args(function: &str, reason: impl Into<String>) -> Error {
    Error::InvalidArguments {
        function: function.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestTool;

    impl Tool for TestTool {
        fn name(&self) -> &str {
            "Test"
        }

        fn description(&self) -> &str {
            "A test tool"
        }

        fn execute(&self, args: &[Value]) -> Result<Value> {
            Ok(args[0].clone())
        }

        fn arity(&self) -> Option<usize> {
            Some(1)
        }
    }

    #[test]
    fn test_tool_registration() {
        let mut registry = ToolRegistry::empty();
        registry.register(TestTool);

        assert!(registry.has("TEST"));
        assert!(registry.has("test"));
        assert!(!registry.has("UNKNOWN"));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_call_checks_arity() {
        let mut registry = ToolRegistry::empty();
        registry.register(TestTool);

        let value = registry.call("test", &[Value::from("hello")]).unwrap();
        assert_eq!(value, Value::from("hello"));

        let err = registry.call("test", &[]).unwrap_err();
        assert!(matches!(err, Error::InvalidArguments { .. }));
    }

    #[test]
    fn test_undefined_function() {
        let registry = ToolRegistry::empty();
        assert_eq!(
            registry.call("nope", &[]).unwrap_err(),
            Error::UndefinedFunction {
                name: "NOPE".into()
            }
        );
    }

    #[test]
    fn test_list_tools_is_sorted() {
        let registry = ToolRegistry::new();
        let names = registry.list_tools();
        assert_eq!(names.len(), registry.count());
        assert!(names.windows(2).all(|w| w[0] < w[1]));
        assert!(names.contains(&"SUBSTR".to_string()));
    }

    #[test]
    fn test_standard_library_is_registered() {
        let registry = ToolRegistry::new();
        for name in ["substr", "ROUND", "Sum", "today", "cats"] {
            assert!(registry.has(name), "{} missing", name);
        }
    }
}

//! Program Data Vector
//!
//! The variable table of one DATA step together with the current row. The
//! value list is always index-aligned with the variable list.

use std::collections::HashMap;

use crate::parser::VarKind;
use crate::runtime::Value;

/// Metadata for one DATA-step variable
#[derive(Debug, Clone, PartialEq)]
pub struct PdvVar {
    /// Name as first registered; identity is case-insensitive
    pub name: String,
    /// Numeric or character
    pub kind: VarKind,
    /// Declared storage length (LENGTH statement)
    pub length: Option<usize>,
    /// Decimal places for display
    pub decimals: Option<usize>,
    /// Display format name
    pub format: Option<String>,
    /// Descriptive label
    pub label: Option<String>,
    /// Keeps its value across observations
    pub retained: bool,
}

impl PdvVar {
    /// New variable with no declared attributes
    pub fn new(name: impl Into<String>, kind: VarKind) -> Self {
        PdvVar {
            name: name.into(),
            kind,
            length: None,
            decimals: None,
            format: None,
            label: None,
            retained: false,
        }
    }

    /// Numeric variable
    pub fn numeric(name: impl Into<String>) -> Self {
        PdvVar::new(name, VarKind::Numeric)
    }

    /// Character variable
    pub fn character(name: impl Into<String>) -> Self {
        PdvVar::new(name, VarKind::Character)
    }

    /// Marks the variable as retained
    pub fn retained(mut self) -> Self {
        self.retained = true;
        self
    }
}

/// Program Data Vector
#[derive(Debug, Clone, Default)]
pub struct Pdv {
    vars: Vec<PdvVar>,
    values: Vec<Value>,
    /// Uppercase name -> position
    index: HashMap<String, usize>,
}

impl Pdv {
    /// Creates an empty PDV
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a variable and returns its position.
    ///
    /// Registering a name that already exists (in any case) returns the
    /// existing position and leaves its metadata untouched.
    pub fn add_variable(&mut self, def: PdvVar) -> usize {
        let key = def.name.to_ascii_uppercase();
        if let Some(&idx) = self.index.get(&key) {
            return idx;
        }
        let idx = self.vars.len();
        self.values.push(Value::missing_of(def.kind));
        self.vars.push(def);
        self.index.insert(key, idx);
        idx
    }

    /// Case-insensitive lookup
    pub fn find_var_index(&self, name: &str) -> Option<usize> {
        self.index.get(&name.to_ascii_uppercase()).copied()
    }

    /// Value at `index`; numeric missing when out of range
    pub fn get_value(&self, index: usize) -> Value {
        self.values
            .get(index)
            .cloned()
            .unwrap_or_else(Value::missing)
    }

    /// Stores `value` at `index`, converted to the variable's kind.
    ///
    /// Out-of-range positions are ignored. Character values are cut to the
    /// declared length when the variable has one.
    pub fn set_value(&mut self, index: usize, value: Value) {
        let Some(var) = self.vars.get(index) else {
            return;
        };
        let mut value = value.coerce(var.kind);
        if let (Value::Character(s), Some(length)) = (&mut value, var.length) {
            if s.chars().count() > length {
                *s = s.chars().take(length).collect();
            }
        }
        self.values[index] = value;
    }

    /// Value by name; numeric missing for unknown names
    pub fn get_by_name(&self, name: &str) -> Value {
        match self.find_var_index(name) {
            Some(idx) => self.get_value(idx),
            None => Value::missing(),
        }
    }

    /// Stores by name, registering the variable with the value's kind if needed
    pub fn set_by_name(&mut self, name: &str, value: Value) -> usize {
        let idx = match self.find_var_index(name) {
            Some(idx) => idx,
            None => self.add_variable(PdvVar::new(name, value.kind())),
        };
        self.set_value(idx, value);
        idx
    }

    /// Resets every non-retained variable to the missing value of its kind
    pub fn reset_non_retained(&mut self) {
        for (var, value) in self.vars.iter().zip(self.values.iter_mut()) {
            if !var.retained {
                *value = Value::missing_of(var.kind);
            }
        }
    }

    /// Sets the retained flag; returns false when the name is unknown
    pub fn set_retain_flag(&mut self, name: &str, retained: bool) -> bool {
        match self.find_var_index(name) {
            Some(idx) => {
                self.vars[idx].retained = retained;
                true
            }
            None => false,
        }
    }

    /// Applies a LENGTH declaration to an existing variable.
    ///
    /// The kind may still change here because LENGTH is processed before
    /// the variable receives any value.
    pub fn declare_length(&mut self, name: &str, kind: VarKind, length: usize) -> usize {
        let idx = self.add_variable(PdvVar::new(name, kind));
        let var = &mut self.vars[idx];
        if var.kind != kind {
            var.kind = kind;
            self.values[idx] = Value::missing_of(kind);
        }
        var.length = Some(length);
        idx
    }

    /// Variable metadata in position order
    pub fn variables(&self) -> &[PdvVar] {
        &self.vars
    }

    /// Current values in position order
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Metadata for one variable
    pub fn variable(&self, index: usize) -> Option<&PdvVar> {
        self.vars.get(index)
    }

    /// Number of variables
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// True when no variable is registered
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}

//! PROC steps
//!
//! Each procedure reads its `DATA=` dataset (the most recently created one
//! when omitted) from the [`Environment`] and writes either a listing, a
//! dataset, or both.

pub mod freq;
pub mod means;
pub mod print;
pub mod sort;

use crate::error::{Error, Result};
use crate::parser::DatasetRef;
use crate::runtime::dataset::row_value;
use crate::runtime::evaluator::Scope;
use crate::runtime::{Dataset, Environment, Row, Value};

/// Resolves `DATA=`, defaulting to the last dataset created
pub fn input_dataset(
    env: &Environment,
    data: Option<&DatasetRef>,
) -> Result<(DatasetRef, Dataset)> {
    let reference = match data {
        Some(reference) => reference.clone(),
        None => env
            .last_dataset()
            .cloned()
            .ok_or_else(|| Error::DatasetNotFound {
                name: "_LAST_".to_string(),
            })?,
    };
    let dataset = env.dataset(&reference)?;
    Ok((reference, dataset))
}

/// Fails on the first name that is not a column of `dataset`
pub fn check_columns(reference: &DatasetRef, dataset: &Dataset, names: &[String]) -> Result<()> {
    match names.iter().find(|n| dataset.column_index(n).is_none()) {
        Some(name) => Err(Error::VariableNotFound {
            name: name.to_ascii_uppercase(),
            dataset: reference.to_string(),
        }),
        None => Ok(()),
    }
}

/// Expression scope over one dataset row (PROC SORT `WHERE`)
pub struct RowScope<'a> {
    /// Current row
    pub row: &'a Row,
    /// Session, for macro variables
    pub env: &'a Environment,
}

impl<'a> Scope for RowScope<'a> {
    fn variable(&self, name: &str) -> Value {
        row_value(self.row, name)
            .cloned()
            .unwrap_or_else(Value::missing)
    }

    fn macro_variable(&self, name: &str) -> Option<String> {
        self.env.macro_variable(name).map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_defaults_to_last_dataset() {
        let mut env = Environment::new();
        assert!(matches!(
            input_dataset(&env, None),
            Err(Error::DatasetNotFound { .. })
        ));
        env.store_dataset(&DatasetRef::work("a"), Dataset::new("a"))
            .unwrap();
        let (reference, _) = input_dataset(&env, None).unwrap();
        assert_eq!(reference, DatasetRef::work("a"));
    }

    #[test]
    fn test_check_columns() {
        let ds = Dataset::with_columns("a", vec!["x".into()]);
        let reference = DatasetRef::work("a");
        assert!(check_columns(&reference, &ds, &["X".into()]).is_ok());
        assert!(matches!(
            check_columns(&reference, &ds, &["y".into()]),
            Err(Error::VariableNotFound { .. })
        ));
    }
}

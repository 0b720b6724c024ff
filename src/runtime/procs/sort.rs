//! PROC SORT

use std::cmp::Ordering;

use tracing::info;

use super::{check_columns, input_dataset, RowScope};
use crate::error::Result;
use crate::parser::{ByVariable, ProcSort};
use crate::runtime::dataset::row_value;
use crate::runtime::evaluator::evaluate;
use crate::runtime::{Environment, Row};
use crate::tools::ToolRegistry;

/// Orders two rows by the BY variables, exactly.
///
/// A key that is absent from either row, or whose values are of different
/// kinds, is skipped and the next key decides.
pub fn compare_rows(a: &Row, b: &Row, by: &[ByVariable]) -> Ordering {
    for key in by {
        let (Some(x), Some(y)) = (row_value(a, &key.name), row_value(b, &key.name)) else {
            continue;
        };
        let Some(ordering) = x.sort_order(y) else {
            continue;
        };
        let ordering = if key.descending {
            ordering.reverse()
        } else {
            ordering
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Whether two rows fall in the same BY group. Numeric keys match within
/// the comparison tolerance; skipped keys as in [`compare_rows`].
pub fn same_keys(a: &Row, b: &Row, by: &[ByVariable]) -> bool {
    by.iter().all(|key| {
        match (row_value(a, &key.name), row_value(b, &key.name)) {
            (Some(x), Some(y)) => x.compare(y).map_or(true, Ordering::is_eq),
            _ => true,
        }
    })
}

/// Filters, sorts and de-duplicates rows; the sort is stable
pub fn sort_rows(mut rows: Vec<Row>, by: &[ByVariable], nodupkey: bool, noduprecs: bool) -> Vec<Row> {
    rows.sort_by(|a, b| compare_rows(a, b, by));
    if nodupkey {
        rows.dedup_by(|later, earlier| same_keys(earlier, later, by));
    }
    if noduprecs {
        rows.dedup();
    }
    rows
}

/// Runs PROC SORT, replacing `DATA=` unless `OUT=` is given
pub fn run(proc: &ProcSort, env: &mut Environment, registry: &ToolRegistry) -> Result<()> {
    let (reference, mut dataset) = input_dataset(env, proc.data.as_ref())?;
    let names: Vec<String> = proc.by.iter().map(|b| b.name.clone()).collect();
    check_columns(&reference, &dataset, &names)?;

    let mut rows = Vec::with_capacity(dataset.len());
    for row in dataset.rows() {
        let keep = match &proc.where_clause {
            Some(condition) => evaluate(condition, &RowScope { row, env }, registry)?.is_truthy(),
            None => true,
        };
        if keep {
            rows.push(row.clone());
        }
    }
    let read = dataset.len();
    let selected = rows.len();
    if proc.duplicates {
        info!("NOTE: DUPLICATES is accepted and has no effect.");
    }

    let rows = sort_rows(rows, &proc.by, proc.nodupkey, proc.noduprecs);
    if rows.len() < selected {
        info!(
            "NOTE: {} observations with duplicate key values were deleted.",
            selected - rows.len()
        );
    }
    info!(
        "NOTE: There were {} observations read from the data set {}.",
        read, reference
    );

    dataset.set_rows(rows);
    let out = proc.out.as_ref().unwrap_or(&reference);
    info!(
        "NOTE: The data set {} has {} observations and {} variables.",
        out,
        dataset.len(),
        dataset.columns().len()
    );
    env.store_dataset(out, dataset)
}

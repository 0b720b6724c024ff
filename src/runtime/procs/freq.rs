//! PROC FREQ: one-way frequency tables

use std::cmp::Ordering;

use tracing::info;

use super::{check_columns, input_dataset};
use crate::error::Result;
use crate::parser::ProcFreq;
use crate::runtime::listing::{cell_text, Listing};
use crate::runtime::{Dataset, Environment, Value};

/// Distinct non-missing values of a column with their counts, in sorted
/// order, plus the number of missing cells
pub fn frequencies(dataset: &Dataset, column: &str) -> (Vec<(Value, usize)>, usize) {
    let mut counts: Vec<(Value, usize)> = Vec::new();
    let mut missing = 0;
    for i in 0..dataset.len() {
        let value = dataset.value(i, column);
        if value.is_missing() {
            missing += 1;
            continue;
        }
        match counts.iter_mut().find(|(v, _)| *v == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    // numbers before text when a column mixes kinds
    counts.sort_by(|(a, _), (b, _)| {
        a.sort_order(b).unwrap_or_else(|| match a {
            Value::Numeric(_) => Ordering::Less,
            Value::Character(_) => Ordering::Greater,
        })
    });
    (counts, missing)
}

/// Runs PROC FREQ; every TABLES variable gets its own table
pub fn run(proc: &ProcFreq, env: &Environment, listing: &mut Listing) -> Result<()> {
    let (reference, dataset) = input_dataset(env, proc.data.as_ref())?;
    let tables = if proc.tables.is_empty() {
        dataset.columns().to_vec()
    } else {
        proc.tables.clone()
    };
    check_columns(&reference, &dataset, &tables)?;

    for table in &tables {
        let column = dataset.column_name(table).unwrap_or(table).to_string();
        let (counts, missing) = frequencies(&dataset, &column);
        let total: usize = counts.iter().map(|(_, c)| c).sum();

        let header = [
            column.clone(),
            "Frequency".to_string(),
            "Percent".to_string(),
            "Cumulative Frequency".to_string(),
            "Cumulative Percent".to_string(),
        ];
        let mut cumulative = 0;
        let rows: Vec<Vec<String>> = counts
            .iter()
            .map(|(value, count)| {
                cumulative += count;
                vec![
                    cell_text(value),
                    count.to_string(),
                    percent(*count, total),
                    cumulative.to_string(),
                    percent(cumulative, total),
                ]
            })
            .collect();
        listing.push_table(env.title(), &header, &rows);
        if missing > 0 {
            info!("NOTE: Frequency Missing = {} for {}.", missing, column);
        }
    }
    Ok(())
}

fn percent(part: usize, total: usize) -> String {
    format!("{:.2}", part as f64 * 100.0 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DatasetRef;

    fn colors() -> Dataset {
        let mut ds = Dataset::new("c");
        for c in ["red", "blue", "red", "", "green", "red"] {
            ds.push_row(vec![("color".into(), Value::from(c))]);
        }
        ds
    }

    #[test]
    fn test_frequencies_sorted_without_missing() {
        let (counts, missing) = frequencies(&colors(), "color");
        assert_eq!(missing, 1);
        assert_eq!(
            counts,
            vec![
                (Value::from("blue"), 1),
                (Value::from("green"), 1),
                (Value::from("red"), 3)
            ]
        );
    }

    #[test]
    fn test_table_percentages() {
        let mut env = Environment::new();
        env.store_dataset(&DatasetRef::work("c"), colors()).unwrap();
        let proc = ProcFreq {
            data: None,
            tables: vec!["color".into()],
        };
        let mut listing = Listing::new();
        run(&proc, &env, &mut listing).unwrap();
        let lines: Vec<&str> = listing.as_str().lines().collect();
        assert_eq!(
            lines[0],
            "color\tFrequency\tPercent\tCumulative Frequency\tCumulative Percent"
        );
        assert_eq!(lines[1], "blue\t1\t20.00\t1\t20.00");
        assert_eq!(lines[3], "red\t3\t60.00\t5\t100.00");
    }
}

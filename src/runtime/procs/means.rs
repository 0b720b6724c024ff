//! PROC MEANS

use tracing::{info, warn};

use super::{check_columns, input_dataset};
use crate::error::Result;
use crate::parser::{ProcMeans, Statistic};
use crate::runtime::listing::{cell_text, Listing};
use crate::runtime::{Dataset, Environment, Value};

/// Summary of one analysis variable
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Summary {
    /// Non-missing numeric values
    pub n: usize,
    /// Missing values
    pub nmiss: usize,
    /// Sum of the values
    pub sum: f64,
    /// Smallest value
    pub min: Option<f64>,
    /// Largest value
    pub max: Option<f64>,
}

impl Summary {
    /// Accumulates one column of `dataset`. Character cells are not counted.
    pub fn of(dataset: &Dataset, column: &str) -> Summary {
        let mut summary = Summary::default();
        for i in 0..dataset.len() {
            match dataset.get(i, column) {
                Some(Value::Numeric(x)) if !x.is_nan() => summary.add(*x),
                Some(Value::Character(_)) => {}
                _ => summary.nmiss += 1,
            }
        }
        summary
    }

    fn add(&mut self, x: f64) {
        self.n += 1;
        self.sum += x;
        self.min = Some(self.min.map_or(x, |m| m.min(x)));
        self.max = Some(self.max.map_or(x, |m| m.max(x)));
    }

    /// Value of one statistic; missing when there were no values
    pub fn statistic(&self, stat: Statistic) -> Value {
        let number = match stat {
            Statistic::N => Some(self.n as f64),
            Statistic::Nmiss => Some(self.nmiss as f64),
            Statistic::Sum => (self.n > 0).then_some(self.sum),
            Statistic::Mean => (self.n > 0).then(|| self.sum / self.n as f64),
            Statistic::Min => self.min,
            Statistic::Max => self.max,
        };
        number.map_or_else(Value::missing, Value::Numeric)
    }
}

/// Runs PROC MEANS: a listing, and the OUT= dataset when requested
pub fn run(proc: &ProcMeans, env: &mut Environment, listing: &mut Listing) -> Result<()> {
    let (reference, dataset) = input_dataset(env, proc.data.as_ref())?;
    check_columns(&reference, &dataset, &proc.vars)?;

    let statistics: &[Statistic] = if proc.statistics.is_empty() {
        &Statistic::DEFAULT
    } else {
        &proc.statistics
    };
    let summaries: Vec<(String, Summary)> = proc
        .vars
        .iter()
        .map(|v| {
            let column = dataset.column_name(v).unwrap_or(v).to_string();
            let summary = Summary::of(&dataset, &column);
            (column, summary)
        })
        .collect();

    let mut header = vec!["Variable".to_string()];
    header.extend(statistics.iter().map(|s| s.label().to_string()));
    let rows: Vec<Vec<String>> = summaries
        .iter()
        .map(|(name, summary)| {
            let mut cells = vec![name.clone()];
            cells.extend(statistics.iter().map(|s| cell_text(&summary.statistic(*s))));
            cells
        })
        .collect();
    listing.push_table(env.title(), &header, &rows);
    info!(
        "NOTE: There were {} observations read from the data set {}.",
        dataset.len(),
        reference
    );

    if let Some(output) = &proc.output {
        let mut row = Vec::new();
        for (stat, names) in &output.columns {
            if names.len() > summaries.len() {
                warn!(
                    "WARNING: {} names were given for {} and only {} variables were analyzed.",
                    names.len(),
                    stat.label(),
                    summaries.len()
                );
            }
            for (name, (_, summary)) in names.iter().zip(&summaries) {
                row.push((name.clone(), summary.statistic(*stat)));
            }
        }
        let mut summary = Dataset::new(output.out.name.clone());
        summary.push_row(row);
        info!(
            "NOTE: The data set {} has 1 observations and {} variables.",
            output.out,
            summary.columns().len()
        );
        env.store_dataset(&output.out, summary)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{DatasetRef, MeansOutput};

    fn scores() -> Dataset {
        let mut ds = Dataset::new("scores");
        for v in [Value::Numeric(2.0), Value::missing(), Value::Numeric(4.0), Value::Numeric(9.0)] {
            ds.push_row(vec![("score".into(), v), ("empty".into(), Value::missing())]);
        }
        ds
    }

    #[test]
    fn test_summary_skips_missing() {
        let summary = Summary::of(&scores(), "score");
        assert_eq!(summary.n, 3);
        assert_eq!(summary.nmiss, 1);
        assert_eq!(summary.statistic(Statistic::Mean), Value::Numeric(5.0));
        assert_eq!(summary.statistic(Statistic::Min), Value::Numeric(2.0));
        assert_eq!(summary.statistic(Statistic::Max), Value::Numeric(9.0));
    }

    #[test]
    fn test_no_values_reports_missing() {
        let summary = Summary::of(&scores(), "empty");
        assert_eq!(summary.statistic(Statistic::N), Value::Numeric(0.0));
        assert!(summary.statistic(Statistic::Mean).is_missing());
        assert!(summary.statistic(Statistic::Sum).is_missing());
    }

    #[test]
    fn test_listing_and_output_dataset() {
        let mut env = Environment::new();
        env.store_dataset(&DatasetRef::work("scores"), scores()).unwrap();
        let proc = ProcMeans {
            data: None,
            statistics: vec![Statistic::N, Statistic::Sum],
            vars: vec!["score".into()],
            output: Some(MeansOutput {
                out: DatasetRef::work("stats"),
                columns: vec![(Statistic::Mean, vec!["avg".into()])],
            }),
        };
        let mut listing = Listing::new();
        run(&proc, &mut env, &mut listing).unwrap();

        assert_eq!(listing.as_str(), "Variable\tN\tSum\nscore\t3\t15\n");
        let stats = env.dataset(&DatasetRef::work("stats")).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats.value(0, "avg"), Value::Numeric(5.0));
    }
}

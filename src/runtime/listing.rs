//! Listing output
//!
//! Results are rendered as tab-separated tables: an optional title line,
//! a header row, then one line per row. Missing numeric values print as `.`.

use crate::runtime::{Dataset, Value};

/// Accumulated listing text of a session
#[derive(Debug, Clone, Default)]
pub struct Listing {
    text: String,
}

impl Listing {
    /// Empty listing
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one table, separated from the previous one by a blank line
    pub fn push_table(&mut self, title: Option<&str>, header: &[String], rows: &[Vec<String>]) {
        if !self.text.is_empty() {
            self.text.push('\n');
        }
        if let Some(title) = title {
            self.text.push_str(title);
            self.text.push('\n');
        }
        self.text.push_str(&header.join("\t"));
        self.text.push('\n');
        for row in rows {
            self.text.push_str(&row.join("\t"));
            self.text.push('\n');
        }
    }

    /// Appends a dataset listing
    pub fn push_dataset(&mut self, title: Option<&str>, dataset: &Dataset, options: &PrintOptions) {
        let (header, rows) = render_dataset(dataset, options);
        self.push_table(title, &header, &rows);
    }

    /// Listing text so far
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// True when nothing was written
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Takes the text, leaving the listing empty
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }
}

/// Column and row selection for a dataset listing
#[derive(Debug, Clone, Default)]
pub struct PrintOptions {
    /// Columns to show; all when empty
    pub vars: Vec<String>,
    /// Row cap
    pub obs: Option<usize>,
    /// Hide the `Obs` column
    pub noobs: bool,
}

/// Header and cell text of a dataset listing
pub fn render_dataset(dataset: &Dataset, options: &PrintOptions) -> (Vec<String>, Vec<Vec<String>>) {
    let columns: Vec<String> = if options.vars.is_empty() {
        dataset.columns().to_vec()
    } else {
        options
            .vars
            .iter()
            .map(|v| dataset.column_name(v).unwrap_or(v).to_string())
            .collect()
    };

    let mut header = Vec::with_capacity(columns.len() + 1);
    if !options.noobs {
        header.push("Obs".to_string());
    }
    header.extend(columns.iter().cloned());

    let limit = options.obs.unwrap_or(usize::MAX).min(dataset.len());
    let rows = (0..limit)
        .map(|i| {
            let mut cells = Vec::with_capacity(header.len());
            if !options.noobs {
                cells.push((i + 1).to_string());
            }
            cells.extend(columns.iter().map(|c| cell_text(&dataset.value(i, c))));
            cells
        })
        .collect();
    (header, rows)
}

/// Text of one cell
pub fn cell_text(value: &Value) -> String {
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        let mut ds = Dataset::new("people");
        ds.push_row(vec![
            ("name".into(), Value::from("Alice")),
            ("age".into(), Value::Numeric(30.0)),
        ]);
        ds.push_row(vec![
            ("name".into(), Value::from("Bob")),
            ("age".into(), Value::missing()),
        ]);
        ds
    }

    #[test]
    fn test_dataset_listing_format() {
        let mut listing = Listing::new();
        listing.push_dataset(Some("People"), &sample(), &PrintOptions::default());
        assert_eq!(
            listing.as_str(),
            "People\nObs\tname\tage\n1\tAlice\t30\n2\tBob\t.\n"
        );
    }

    #[test]
    fn test_noobs_var_and_obs_cap() {
        let options = PrintOptions {
            vars: vec!["AGE".into()],
            obs: Some(1),
            noobs: true,
        };
        let (header, rows) = render_dataset(&sample(), &options);
        assert_eq!(header, vec!["age".to_string()]);
        assert_eq!(rows, vec![vec!["30".to_string()]]);
    }

    #[test]
    fn test_tables_are_separated_and_take_clears() {
        let mut listing = Listing::new();
        listing.push_table(None, &["a".into()], &[vec!["1".into()]]);
        listing.push_table(None, &["b".into()], &[]);
        assert_eq!(listing.take(), "a\n1\n\nb\n");
        assert!(listing.is_empty());
    }
}

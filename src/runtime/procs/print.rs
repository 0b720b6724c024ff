//! PROC PRINT

use super::{check_columns, input_dataset};
use crate::error::Result;
use crate::parser::ProcPrint;
use crate::runtime::listing::{Listing, PrintOptions};
use crate::runtime::Environment;

/// Renders the dataset to the listing
pub fn run(proc: &ProcPrint, env: &Environment, listing: &mut Listing) -> Result<()> {
    let (reference, dataset) = input_dataset(env, proc.data.as_ref())?;
    check_columns(&reference, &dataset, &proc.vars)?;
    let options = PrintOptions {
        vars: proc.vars.clone(),
        obs: proc.obs,
        noobs: proc.noobs,
    };
    listing.push_dataset(env.title(), &dataset, &options);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::DatasetRef;
    use crate::runtime::{Dataset, Value};

    #[test]
    fn test_print_uses_title_and_options() {
        let mut env = Environment::new();
        let mut ds = Dataset::new("a");
        ds.push_row(vec![("x".into(), Value::Numeric(1.5)), ("y".into(), Value::from("k"))]);
        ds.push_row(vec![("x".into(), Value::missing()), ("y".into(), Value::from("m"))]);
        env.store_dataset(&DatasetRef::work("a"), ds).unwrap();
        env.set_title(Some("Report".into()));

        let mut listing = Listing::new();
        let proc = ProcPrint {
            data: Some(DatasetRef::work("a")),
            vars: vec!["x".into()],
            obs: None,
            noobs: false,
        };
        run(&proc, &env, &mut listing).unwrap();
        assert_eq!(listing.as_str(), "Report\nObs\tx\n1\t1.5\n2\t.\n");
    }

    #[test]
    fn test_unknown_var_is_an_error() {
        let mut env = Environment::new();
        env.store_dataset(&DatasetRef::work("a"), Dataset::with_columns("a", vec!["x".into()]))
            .unwrap();
        let proc = ProcPrint {
            vars: vec!["nope".into()],
            ..ProcPrint::default()
        };
        assert!(run(&proc, &env, &mut Listing::new()).is_err());
    }
}

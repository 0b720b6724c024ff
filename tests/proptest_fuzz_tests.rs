//! Property-based tests for the scanner, parser, interpreter and PROC SORT
//!
//! These check that:
//! 1. Scanning and parsing never panic on arbitrary input
//! 2. Execution of malformed programs ends in errors, not panics
//! 3. Sorting and RETAIN keep their ordering and carry-over guarantees

use proptest::prelude::*;
use saslite::config::InterpreterConfig;
use saslite::parser::{ByVariable, DatasetRef};
use saslite::runtime::procs::sort::{compare_rows, same_keys, sort_rows};
use saslite::runtime::{JsonStore, DatasetStore, Row};
use saslite::{Dataset, Interpreter, Parser, Scanner, Value};
use std::cmp::Ordering;

// =============================================================================
// STRATEGY GENERATORS
// =============================================================================

/// Random ASCII that might break the scanner
fn arbitrary_source_string() -> impl Strategy<Value = String> {
    prop::string::string_regex(r"[\x00-\x7F]{0,400}").unwrap()
}

/// Token soup made of the language's own words and symbols
fn statement_like_string() -> impl Strategy<Value = String> {
    prop::collection::vec(statement_token(), 0..60).prop_map(|tokens| tokens.join(" "))
}

fn statement_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(";".to_string()),
        Just("data".to_string()),
        Just("run".to_string()),
        Just("proc".to_string()),
        Just("sort".to_string()),
        Just("print".to_string()),
        Just("set".to_string()),
        Just("if".to_string()),
        Just("then".to_string()),
        Just("else".to_string()),
        Just("do".to_string()),
        Just("end".to_string()),
        Just("to".to_string()),
        Just("by".to_string()),
        Just("retain".to_string()),
        Just("array".to_string()),
        Just("output".to_string()),
        Just("(".to_string()),
        Just(")".to_string()),
        Just("{".to_string()),
        Just("}".to_string()),
        Just("=".to_string()),
        Just("+".to_string()),
        Just("**".to_string()),
        Just("||".to_string()),
        Just("<=".to_string()),
        Just("and".to_string()),
        Just("not".to_string()),
        Just(".".to_string()),
        (-1000i64..1000i64).prop_map(|n| n.to_string()),
        "'[a-z ]{0,8}'".prop_map(|s| s),
        "[a-z][a-z0-9_]{0,6}".prop_map(|s| s),
        "&[a-z]{1,4}".prop_map(|s| s),
    ]
}

/// Rows with a numeric key `k`, a character key `c` and a payload `p`
fn rows_strategy() -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(
        (
            prop_oneof![Just(f64::NAN), (-5i32..5).prop_map(f64::from)],
            "[a-c]{0,2}",
            0u32..1000,
        ),
        0..40,
    )
    .prop_map(|cells| {
        cells
            .into_iter()
            .map(|(k, c, p)| {
                let mut row = Row::new();
                row.insert("k".to_string(), Value::Numeric(k));
                row.insert("c".to_string(), Value::Character(c));
                row.insert("p".to_string(), Value::Numeric(f64::from(p)));
                row
            })
            .collect()
    })
}

fn by(names: &[(&str, bool)]) -> Vec<ByVariable> {
    names
        .iter()
        .map(|(name, descending)| ByVariable {
            name: name.to_string(),
            descending: *descending,
        })
        .collect()
}

fn small_interpreter() -> Interpreter {
    let config = InterpreterConfig {
        max_loop_iterations: 500,
        ..InterpreterConfig::default()
    };
    Interpreter::with_config(config).unwrap()
}

// =============================================================================
// SCANNER AND PARSER ROBUSTNESS
// =============================================================================

proptest! {
    /// The scanner returns a result for any input
    #[test]
    fn scanner_never_panics(source in arbitrary_source_string()) {
        let _ = Scanner::new(&source).scan_tokens();
    }

    /// The parser recovers from any token sequence
    #[test]
    fn parser_never_panics(source in statement_like_string()) {
        if let Ok(tokens) = Scanner::new(&source).scan_tokens() {
            let mut parser = Parser::new(tokens);
            let _ = parser.parse();
            let _ = parser.take_errors();
        }
    }

    /// Deeply parenthesized expressions parse
    #[test]
    fn parser_handles_deep_nesting(depth in 1usize..64) {
        let source = format!("x = {}1{};", "(".repeat(depth), ")".repeat(depth));
        let tokens = Scanner::new(&source).scan_tokens().unwrap();
        let mut parser = Parser::new(tokens);
        let program = parser.parse();
        prop_assert!(parser.take_errors().is_empty());
        prop_assert_eq!(program.statements.len(), 1);
    }

    /// Unbalanced parentheses are reported, never a panic
    #[test]
    fn parser_handles_unbalanced_parens(opens in 0usize..30, closes in 0usize..30) {
        let source = format!("x = {}1{};", "(".repeat(opens), ")".repeat(closes));
        let tokens = Scanner::new(&source).scan_tokens().unwrap();
        let mut parser = Parser::new(tokens);
        parser.parse();
        let errors = parser.take_errors();
        prop_assert_eq!(errors.is_empty(), opens == closes);
    }

    /// Whatever the program, execution ends with values and errors, never a panic
    #[test]
    fn interpreter_never_panics(source in statement_like_string()) {
        let mut interp = small_interpreter();
        let _ = interp.run(&source);
    }
}

// =============================================================================
// SORTING
// =============================================================================

proptest! {
    /// Sorted output is ordered by the key and is a permutation of the input
    #[test]
    fn sort_orders_rows(rows in rows_strategy(), descending in any::<bool>()) {
        let keys = by(&[("k", descending), ("c", false)]);
        let sorted = sort_rows(rows.clone(), &keys, false, false);

        prop_assert_eq!(sorted.len(), rows.len());
        for pair in sorted.windows(2) {
            prop_assert_ne!(compare_rows(&pair[0], &pair[1], &keys), Ordering::Greater);
        }
    }

    /// Sorting is stable: rows with equal keys keep their input order
    #[test]
    fn sort_is_stable(rows in rows_strategy()) {
        let keys = by(&[("c", false)]);
        let sorted = sort_rows(rows.clone(), &keys, false, false);

        for pair in sorted.windows(2) {
            if compare_rows(&pair[0], &pair[1], &keys) == Ordering::Equal {
                let first = rows.iter().position(|r| r == &pair[0]).unwrap();
                let second = rows.iter().rposition(|r| r == &pair[1]).unwrap();
                prop_assert!(first <= second);
            }
        }
    }

    /// NODUPKEY keeps exactly one row per distinct key
    #[test]
    fn nodupkey_keeps_one_row_per_key(rows in rows_strategy()) {
        let keys = by(&[("k", false)]);
        let deduped = sort_rows(rows.clone(), &keys, true, false);

        for pair in deduped.windows(2) {
            prop_assert_eq!(compare_rows(&pair[0], &pair[1], &keys), Ordering::Less);
        }
        for row in &rows {
            prop_assert!(deduped
                .iter()
                .any(|kept| same_keys(kept, row, &keys)));
        }
    }

    /// Keys closer together than the comparison tolerance still come out in
    /// exact non-decreasing order
    #[test]
    fn sort_orders_closely_spaced_keys(steps in prop::collection::vec(0u32..200, 0..80)) {
        let rows: Vec<Row> = steps
            .iter()
            .map(|&step| {
                let mut row = Row::new();
                row.insert("v".to_string(), Value::Numeric(f64::from(step) * 0.5e-7));
                row
            })
            .collect();
        let sorted = sort_rows(rows, &by(&[("v", false)]), false, false);

        let values: Vec<f64> = sorted.iter().map(|r| r["v"].as_number()).collect();
        for pair in values.windows(2) {
            prop_assert!(pair[0] <= pair[1], "{} before {}", pair[0], pair[1]);
        }
    }
}

// =============================================================================
// DATA STEP AND STORAGE PROPERTIES
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// A retained accumulator equals the running sum of the input column
    #[test]
    fn retain_accumulates_running_sum(values in prop::collection::vec(-1000i32..1000, 1..30)) {
        let lines: Vec<String> = values.iter().map(|v| v.to_string()).collect();
        let source = format!(
            "data a; input v; datalines;\n{}\n;\nrun;\n\
             data b; set a; retain total 0; total = total + v; run;",
            lines.join("\n")
        );
        let mut interp = Interpreter::new();
        let errors = interp.run(&source).unwrap();
        prop_assert!(errors.is_empty());

        let b = interp.environment().dataset(&DatasetRef::work("b")).unwrap();
        prop_assert_eq!(b.len(), values.len());
        let mut running = 0.0;
        for (i, v) in values.iter().enumerate() {
            running += f64::from(*v);
            prop_assert_eq!(b.value(i, "total"), Value::Numeric(running));
        }
    }

    /// Saving then loading through the JSON engine gives back the dataset
    #[test]
    fn json_store_preserves_dataset(rows in rows_strategy()) {
        let mut dataset = Dataset::with_columns("fuzz", vec!["k".into(), "c".into(), "p".into()]);
        for row in rows {
            dataset.add_row(row);
        }
        let dir = std::env::temp_dir().join(format!("saslite-fuzz-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("fuzz.json");

        JsonStore.save(&dataset, &path).unwrap();
        let loaded = JsonStore.load(&path).unwrap();
        prop_assert_eq!(loaded, dataset);
    }
}

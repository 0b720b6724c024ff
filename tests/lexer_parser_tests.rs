//! Scanner and parser behaviour on whole programs

use saslite::lexer::{Scanner, TokenKind};
use saslite::parser::{Parser, Statement};
use saslite::Error;

fn parse(source: &str) -> (Vec<Statement>, Vec<Error>) {
    let tokens = Scanner::new(source).scan_tokens().unwrap();
    let mut parser = Parser::new(tokens);
    let program = parser.parse();
    (program.statements, parser.take_errors())
}

#[test]
fn test_doubled_quotes_collapse() {
    let tokens = Scanner::new(r#"x = "She said, ""Yes.""";"#)
        .scan_tokens()
        .unwrap();
    let strings: Vec<_> = tokens
        .iter()
        .filter_map(|t| match &t.kind {
            TokenKind::String(s) => Some(s.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(strings, vec![r#"She said, "Yes.""#.to_string()]);
}

#[test]
fn test_comments_are_skipped() {
    let (statements, errors) = parse(
        "* a statement comment;\n/* block\ncomment */ data a; x = 2 * 3; run;",
    );
    assert!(errors.is_empty(), "{:?}", errors);
    assert_eq!(statements.len(), 1);
    assert!(matches!(statements[0], Statement::DataStep { .. }));
}

#[test]
fn test_else_if_chain() {
    let (statements, errors) = parse(
        "data a; if x > 1 then y = 1; else if x > 0 then y = 2; else if x = 0 then y = 3; else y = 4; run;",
    );
    assert!(errors.is_empty(), "{:?}", errors);
    let Statement::DataStep { body, .. } = &statements[0] else {
        panic!("expected a DATA step");
    };
    match &body[0] {
        Statement::If {
            else_ifs,
            else_branch,
            ..
        } => {
            assert_eq!(else_ifs.len(), 2);
            assert!(else_branch.is_some());
        }
        other => panic!("expected IF, got {:?}", other),
    }
}

#[test]
fn test_recovery_keeps_following_statements() {
    let (statements, errors) = parse("title 'ok'; x = ; options obs=3; y = 2;");
    assert_eq!(errors.len(), 1);
    assert_eq!(statements.len(), 3);
    assert!(matches!(statements[1], Statement::Options(_)));
}

#[test]
fn test_recovery_inside_data_step() {
    let (statements, errors) = parse("data a; x = 1; do i = 1 3; y = 2; run;");
    assert!(!errors.is_empty());
    assert!(statements
        .iter()
        .any(|s| matches!(s, Statement::DataStep { .. })));
}

#[test]
fn test_array_size_mismatch_is_a_parse_error() {
    let (_, errors) = parse("data a; array nums{3} a b; run;");
    assert!(errors
        .iter()
        .any(|e| matches!(e, Error::ArraySizeMismatch { declared: 3, actual: 2, .. })));
}

#[test]
fn test_proc_statements() {
    let (statements, errors) = parse(
        "proc sort data=a out=b nodupkey; by descending x y; run;\n\
         proc means data=b n mean; var x; output out=s mean=mx; run;\n\
         proc print data=s noobs; run;",
    );
    assert!(errors.is_empty(), "{:?}", errors);
    match &statements[0] {
        Statement::ProcSort(sort) => {
            assert!(sort.nodupkey);
            assert!(sort.by[0].descending);
            assert!(!sort.by[1].descending);
        }
        other => panic!("expected PROC SORT, got {:?}", other),
    }
    assert!(matches!(statements[1], Statement::ProcMeans(_)));
    assert!(matches!(&statements[2], Statement::ProcPrint(p) if p.noobs));
}

#[test]
fn test_sort_without_by_is_reported() {
    let (statements, errors) = parse("proc sort data=a; run; title 'after';");
    assert_eq!(errors.len(), 1);
    assert!(matches!(statements.last(), Some(Statement::Title(_))));
}

#[test]
fn test_macro_language_is_rejected() {
    let (_, errors) = parse("%macro m; %mend; x = 1;");
    assert!(errors
        .iter()
        .any(|e| matches!(e, Error::UnsupportedMacro { .. })));
}

#[test]
fn test_unterminated_string_reports_position() {
    match Scanner::new("x = 1;\ntitle 'oops;").scan_tokens() {
        Err(Error::UnterminatedString { line, col }) => {
            assert_eq!(line, 2);
            assert_eq!(col, 7);
        }
        other => panic!("expected an unterminated string, got {:?}", other),
    }
}

#[test]
fn test_statement_completeness() {
    let complete = |src: &str| Parser::is_complete_statement(&Scanner::new(src).scan_tokens().unwrap());
    assert!(!complete("data a; x = 1;"));
    assert!(complete("data a; x = 1; run;"));
    assert!(complete("title 'x';"));
    assert!(!complete("title 'x'"));
}

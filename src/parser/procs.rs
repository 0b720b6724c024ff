use super::ast::{
    DatasetRef, MeansOutput, ProcFreq, ProcMeans, ProcPrint, ProcSort, Statement, Statistic,
};
use super::statements::Parser;
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenKind};

impl Parser {
    /// `PROC name ...; ... RUN;`
    ///
    /// Global statements found inside the step come back ahead of the
    /// procedure so they take effect before it runs.
    pub(super) fn parse_proc(&mut self) -> Result<Vec<Statement>> {
        self.advance(); // PROC
        let name_tok = self.advance();

        match name_tok.kind {
            TokenKind::Sort => self.parse_proc_sort(),
            TokenKind::Means => self.parse_proc_means(),
            TokenKind::Print => self.parse_proc_print(),
            TokenKind::Freq => self.parse_proc_freq(),
            TokenKind::Sql => {
                self.skip_sql_body();
                Ok(vec![Statement::ProcSql])
            }
            _ => {
                let name = match name_tok.name() {
                    Some(name) => name.to_ascii_uppercase(),
                    None => return Err(self.unexpected_token(&name_tok, "procedure name")),
                };
                while !self.is_at_end() && !self.at_step_boundary() {
                    self.advance();
                }
                self.finish_step()?;
                Ok(vec![Statement::ProcUnknown(name)])
            }
        }
    }

    fn parse_proc_sort(&mut self) -> Result<Vec<Statement>> {
        let start = self.previous().clone();
        let mut sort = ProcSort {
            data: None,
            out: None,
            by: Vec::new(),
            where_clause: None,
            nodupkey: false,
            noduprecs: false,
            duplicates: false,
        };

        while !self.check(&TokenKind::Semicolon) {
            let option = self.advance();
            match option.kind {
                TokenKind::Data if self.check(&TokenKind::Assign) => {
                    sort.data = Some(self.parse_dataset_option()?)
                }
                TokenKind::Out if self.check(&TokenKind::Assign) => {
                    sort.out = Some(self.parse_dataset_option()?)
                }
                TokenKind::Nodupkey => sort.nodupkey = true,
                TokenKind::Noduprecs => sort.noduprecs = true,
                TokenKind::Duplicates => sort.duplicates = true,
                _ => return Err(self.invalid_option(&option, "SORT")),
            }
        }
        self.expect_semicolon()?;

        let hoisted = self.parse_proc_body(|parser| match parser.peek().kind {
            TokenKind::By => {
                parser.advance();
                sort.by = parser.parse_by_list()?;
                Ok(())
            }
            TokenKind::Where => {
                parser.advance();
                sort.where_clause = Some(parser.parse_expression()?);
                parser.expect_semicolon()
            }
            _ => Err(parser.invalid_statement("SORT")),
        })?;

        let mut statements = hoisted;
        if sort.by.is_empty() {
            self.report(Error::syntax(
                start.line,
                start.column,
                "PROC SORT requires a BY statement",
            ));
        } else {
            statements.push(Statement::ProcSort(sort));
        }
        Ok(statements)
    }

    fn parse_proc_means(&mut self) -> Result<Vec<Statement>> {
        let start = self.previous().clone();
        let mut means = ProcMeans {
            data: None,
            statistics: Vec::new(),
            vars: Vec::new(),
            output: None,
        };

        while !self.check(&TokenKind::Semicolon) {
            let option = self.advance();
            if option.kind == TokenKind::Data && self.check(&TokenKind::Assign) {
                means.data = Some(self.parse_dataset_option()?);
                continue;
            }
            match statistic(&option.kind) {
                Some(stat) if !means.statistics.contains(&stat) => means.statistics.push(stat),
                Some(_) => {}
                None => return Err(self.invalid_option(&option, "MEANS")),
            }
        }
        self.expect_semicolon()?;

        let hoisted = self.parse_proc_body(|parser| match parser.peek().kind {
            TokenKind::Var => {
                parser.advance();
                means.vars = parser.parse_name_list()?;
                Ok(())
            }
            TokenKind::Output => {
                parser.advance();
                means.output = Some(parser.parse_means_output()?);
                Ok(())
            }
            _ => Err(parser.invalid_statement("MEANS")),
        })?;

        let mut statements = hoisted;
        if means.vars.is_empty() {
            self.report(Error::syntax(
                start.line,
                start.column,
                "PROC MEANS requires a VAR statement",
            ));
        } else {
            statements.push(Statement::ProcMeans(means));
        }
        Ok(statements)
    }

    /// `OUT=ds stat=name... stat=name...;`
    fn parse_means_output(&mut self) -> Result<MeansOutput> {
        let mut out = None;
        let mut columns = Vec::new();

        while !self.check(&TokenKind::Semicolon) {
            let option = self.advance();
            if option.kind == TokenKind::Out && self.check(&TokenKind::Assign) {
                out = Some(self.parse_dataset_option()?);
                continue;
            }
            let stat = match statistic(&option.kind) {
                Some(stat) => stat,
                None => return Err(self.unexpected_token(&option, "OUT= or statistic")),
            };
            self.consume(&TokenKind::Assign, "=")?;

            let mut names = Vec::new();
            while self.peek().name().is_some() && self.peek_at(1).kind != TokenKind::Assign {
                names.push(self.expect_name("output column")?);
            }
            if names.is_empty() {
                let tok = self.peek().clone();
                return Err(self.unexpected_token(&tok, "output column name"));
            }
            columns.push((stat, names));
        }
        let end = self.peek().clone();
        self.expect_semicolon()?;

        match out {
            Some(out) => Ok(MeansOutput { out, columns }),
            None => Err(Error::syntax(end.line, end.column, "OUTPUT requires OUT=")),
        }
    }

    fn parse_proc_print(&mut self) -> Result<Vec<Statement>> {
        let mut print = ProcPrint::default();

        while !self.check(&TokenKind::Semicolon) {
            let option = self.advance();
            match option.kind {
                TokenKind::Data if self.check(&TokenKind::Assign) => {
                    print.data = Some(self.parse_dataset_option()?)
                }
                TokenKind::Obs if self.check(&TokenKind::Assign) => {
                    self.advance();
                    match self.advance() {
                        Token {
                            kind: TokenKind::Number(n),
                            ..
                        } if n >= 0.0 => print.obs = Some(n as usize),
                        tok => return Err(self.unexpected_token(&tok, "observation count")),
                    }
                }
                TokenKind::Noobs => print.noobs = true,
                _ => return Err(self.invalid_option(&option, "PRINT")),
            }
        }
        self.expect_semicolon()?;

        let mut statements = self.parse_proc_body(|parser| match parser.peek().kind {
            TokenKind::Var => {
                parser.advance();
                print.vars = parser.parse_name_list()?;
                Ok(())
            }
            _ => Err(parser.invalid_statement("PRINT")),
        })?;
        statements.push(Statement::ProcPrint(print));
        Ok(statements)
    }

    fn parse_proc_freq(&mut self) -> Result<Vec<Statement>> {
        let mut freq = ProcFreq::default();

        while !self.check(&TokenKind::Semicolon) {
            let option = self.advance();
            match option.kind {
                TokenKind::Data if self.check(&TokenKind::Assign) => {
                    freq.data = Some(self.parse_dataset_option()?)
                }
                _ => return Err(self.invalid_option(&option, "FREQ")),
            }
        }
        self.expect_semicolon()?;

        let mut statements = self.parse_proc_body(|parser| match parser.peek().kind {
            TokenKind::Tables => {
                parser.advance();
                let tables = parser.parse_name_list()?;
                freq.tables.extend(tables);
                Ok(())
            }
            _ => Err(parser.invalid_statement("FREQ")),
        })?;
        statements.push(Statement::ProcFreq(freq));
        Ok(statements)
    }

    /// Runs `statement` for each statement of a PROC body up to the end of
    /// the step. Hoisted global statements are returned.
    fn parse_proc_body<F>(&mut self, mut statement: F) -> Result<Vec<Statement>>
    where
        F: FnMut(&mut Parser) -> Result<()>,
    {
        let mut hoisted = Vec::new();

        while !self.is_at_end() && !self.at_step_boundary() {
            if self.match_kind(&TokenKind::Semicolon) {
                continue;
            }
            let result = match self.try_parse_hoisted() {
                Ok(Some(stmt)) => {
                    hoisted.push(stmt);
                    Ok(())
                }
                Ok(None) => statement(self),
                Err(err) => Err(err),
            };
            if let Err(err) = result {
                self.report(err);
                self.synchronize();
            }
        }
        self.finish_step()?;

        Ok(hoisted)
    }

    /// `PROC SQL;` is recognised; its body is skipped through `QUIT;`
    fn skip_sql_body(&mut self) {
        while !self.is_at_end() {
            let tok = self.advance();
            if tok.kind == TokenKind::Quit && self.check(&TokenKind::Semicolon) {
                self.advance();
                return;
            }
        }
    }

    /// `=ds` after an option keyword
    fn parse_dataset_option(&mut self) -> Result<DatasetRef> {
        self.consume(&TokenKind::Assign, "=")?;
        self.parse_dataset_ref()
    }

    fn invalid_option(&self, tok: &Token, proc_name: &str) -> Error {
        Error::syntax(
            tok.line,
            tok.column,
            format!("Option {} is not valid for PROC {}", tok.lexeme, proc_name),
        )
    }

    fn invalid_statement(&self, proc_name: &str) -> Error {
        let tok = self.peek();
        Error::syntax(
            tok.line,
            tok.column,
            format!(
                "Statement {} is not valid in PROC {}",
                tok.lexeme, proc_name
            ),
        )
    }
}

fn statistic(kind: &TokenKind) -> Option<Statistic> {
    match kind {
        TokenKind::N => Some(Statistic::N),
        TokenKind::Nmiss => Some(Statistic::Nmiss),
        TokenKind::Sum => Some(Statistic::Sum),
        TokenKind::Mean => Some(Statistic::Mean),
        TokenKind::Min => Some(Statistic::Min),
        TokenKind::Max => Some(Statistic::Max),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Scanner;
    use crate::parser::{ByVariable, Expression, Program};

    fn parse(source: &str) -> (Program, Vec<Error>) {
        let tokens = Scanner::new(source).scan_tokens().unwrap();
        let mut parser = Parser::new(tokens);
        let program = parser.parse();
        (program, parser.take_errors())
    }

    #[test]
    fn test_proc_sort_full() {
        let (program, errors) = parse(
            "proc sort data=mylib.sales out=sorted nodupkey; by region descending amount; where (amount > 0); run;",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        match &program.statements[0] {
            Statement::ProcSort(sort) => {
                assert_eq!(sort.data, Some(DatasetRef::qualified("mylib", "sales")));
                assert_eq!(sort.out, Some(DatasetRef::work("sorted")));
                assert!(sort.nodupkey);
                assert_eq!(
                    sort.by,
                    vec![
                        ByVariable {
                            name: "region".into(),
                            descending: false
                        },
                        ByVariable {
                            name: "amount".into(),
                            descending: true
                        },
                    ]
                );
                assert!(sort.where_clause.is_some());
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_proc_sort_without_by_is_reported() {
        let (program, errors) = parse("proc sort data=a; run; title 'next';");
        assert_eq!(errors.len(), 1);
        assert_eq!(program.statements, vec![Statement::Title(Some("next".into()))]);
    }

    #[test]
    fn test_proc_means_output() {
        let (program, errors) = parse(
            "proc means data=scores n mean max; var math reading; output out=summary mean=avg_math avg_reading max=top_math; run;",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        match &program.statements[0] {
            Statement::ProcMeans(means) => {
                assert_eq!(
                    means.statistics,
                    vec![Statistic::N, Statistic::Mean, Statistic::Max]
                );
                assert_eq!(means.vars, vec!["math", "reading"]);
                let output = means.output.as_ref().unwrap();
                assert_eq!(output.out, DatasetRef::work("summary"));
                assert_eq!(
                    output.columns,
                    vec![
                        (
                            Statistic::Mean,
                            vec!["avg_math".to_string(), "avg_reading".to_string()]
                        ),
                        (Statistic::Max, vec!["top_math".to_string()]),
                    ]
                );
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_proc_print_options() {
        let (program, errors) = parse("proc print data=a obs=5 noobs; var x y; title 'T'; run;");
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(program.statements[0], Statement::Title(Some("T".into())));
        assert_eq!(
            program.statements[1],
            Statement::ProcPrint(ProcPrint {
                data: Some(DatasetRef::work("a")),
                vars: vec!["x".into(), "y".into()],
                obs: Some(5),
                noobs: true,
            })
        );
    }

    #[test]
    fn test_proc_freq_tables() {
        let (program, errors) = parse("proc freq data=a; tables region product; run;");
        assert!(errors.is_empty());
        assert_eq!(
            program.statements[0],
            Statement::ProcFreq(ProcFreq {
                data: Some(DatasetRef::work("a")),
                tables: vec!["region".into(), "product".into()],
            })
        );
    }

    #[test]
    fn test_proc_sql_and_unknown_are_skipped() {
        let (program, errors) = parse(
            "proc sql; create table x as select * from y; quit; proc transpose data=a; by k; run; x = 1;",
        );
        assert!(errors.is_empty(), "{:?}", errors);
        assert_eq!(program.statements[0], Statement::ProcSql);
        assert_eq!(
            program.statements[1],
            Statement::ProcUnknown("TRANSPOSE".into())
        );
        assert!(matches!(program.statements[2], Statement::Assignment { .. }));
    }

    #[test]
    fn test_bad_statement_inside_proc_recovers() {
        let (program, errors) = parse("proc print data=a; bogus x; var x; run;");
        assert_eq!(errors.len(), 1);
        match &program.statements[0] {
            Statement::ProcPrint(print) => assert_eq!(print.vars, vec!["x"]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_where_without_parentheses() {
        let (program, _) = parse("proc sort data=a; by k; where k ne .; run;");
        match &program.statements[0] {
            Statement::ProcSort(sort) => assert!(matches!(
                sort.where_clause,
                Some(Expression::Binary { .. })
            )),
            other => panic!("unexpected {:?}", other),
        }
    }
}

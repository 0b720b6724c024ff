//! DATA step execution
//!
//! A step runs in two phases. The compile pass walks the statement list
//! once, building the PDV in order of appearance, collecting ARRAY, DROP,
//! KEEP and RETAIN declarations and reading the input datasets. The
//! execution pass then runs the statements once per input observation:
//!
//! 1. reset non-retained variables to missing
//! 2. load the input row
//! 3. run the statements in order
//! 4. append the row to each output that asked for it
//!
//! All of this state lives in a [`DataStepContext`] that is created for one
//! step and dropped at its end.

use std::collections::HashMap;

use tracing::{debug, error, info, warn};

use crate::error::{Error, Result};
use crate::parser::{
    AssignTarget, BinaryOp, ByVariable, DatasetRef, Expression, InputField, LoopCondition,
    Statement, VarKind,
};
use crate::runtime::evaluator::{evaluate, Scope};
use crate::runtime::pdv::{Pdv, PdvVar};
use crate::runtime::procs::sort::{compare_rows, same_keys};
use crate::runtime::{Dataset, Environment, Row, Value};
use crate::tools::ToolRegistry;

/// Functions whose result is character
const CHARACTER_FUNCTIONS: &[&str] = &[
    "SUBSTR", "TRIM", "LEFT", "RIGHT", "UPCASE", "LOWCASE", "STRIP", "COMPRESS", "CAT", "CATS",
];

/// Limits applied to one DATA step
#[derive(Debug, Clone, Copy)]
pub struct DataStepOptions {
    /// Iteration cap for each DO loop
    pub max_loop_iterations: usize,
    /// `OBS=`: maximum number of input observations
    pub obs_limit: Option<usize>,
}

/// Result of one DATA step
#[derive(Debug)]
pub struct DataStepOutcome {
    /// Datasets to store, in DATA statement order
    pub outputs: Vec<(DatasetRef, Dataset)>,
    /// Errors that abandoned individual observations
    pub errors: Vec<Error>,
    /// Number of iterations run
    pub iterations: usize,
}

/// How one observation's statements ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Delete,
    Stop,
}

/// An ARRAY declaration
#[derive(Debug, Clone)]
struct ArrayDef {
    variables: Vec<String>,
    kind: VarKind,
}

/// Where the observations of a step come from
#[derive(Debug, Default)]
struct InputPlan {
    set: Vec<DatasetRef>,
    merge: Vec<DatasetRef>,
    by: Vec<ByVariable>,
    fields: Vec<InputField>,
    datalines: Option<String>,
}

/// Mutable state of one DATA step
pub struct DataStepContext<'a> {
    pdv: Pdv,
    arrays: HashMap<String, ArrayDef>,
    keep: Vec<String>,
    drop: Vec<String>,
    outputs: Vec<DatasetRef>,
    requested: Vec<bool>,
    explicit_output: bool,
    n: usize,
    env: &'a Environment,
    registry: &'a ToolRegistry,
    options: DataStepOptions,
}

impl<'a> Scope for DataStepContext<'a> {
    fn variable(&self, name: &str) -> Value {
        if name.eq_ignore_ascii_case("_n_") {
            return Value::Numeric(self.n as f64);
        }
        self.pdv.get_by_name(name)
    }

    fn array_element(&self, name: &str, index: i64) -> Result<Value> {
        let variable = self.array_slot(name, index)?;
        Ok(match self.pdv.find_var_index(variable) {
            Some(idx) => self.pdv.get_value(idx),
            None => match self.arrays.get(&name.to_ascii_uppercase()).map(|a| a.kind) {
                Some(VarKind::Character) => Value::Character(String::new()),
                _ => Value::Numeric(0.0),
            },
        })
    }

    fn array_len(&self, name: &str) -> Option<usize> {
        self.arrays
            .get(&name.to_ascii_uppercase())
            .map(|a| a.variables.len())
    }

    fn macro_variable(&self, name: &str) -> Option<String> {
        self.env.macro_variable(name).map(str::to_string)
    }
}

/// Compiles and runs one DATA step.
///
/// Errors while reading the inputs abort the step and are returned as
/// `Err`; errors inside an observation are collected in the outcome.
pub fn run_data_step(
    outputs: &[DatasetRef],
    body: &[Statement],
    env: &Environment,
    registry: &ToolRegistry,
    options: DataStepOptions,
) -> Result<DataStepOutcome> {
    let mut ctx = DataStepContext::new(outputs, env, registry, options);
    let rows = ctx.compile(body)?;
    ctx.execute(body, rows)
}

impl<'a> DataStepContext<'a> {
    fn new(
        outputs: &[DatasetRef],
        env: &'a Environment,
        registry: &'a ToolRegistry,
        options: DataStepOptions,
    ) -> Self {
        DataStepContext {
            pdv: Pdv::new(),
            arrays: HashMap::new(),
            keep: Vec::new(),
            drop: Vec::new(),
            outputs: outputs.iter().filter(|o| !o.is_null()).cloned().collect(),
            requested: Vec::new(),
            explicit_output: false,
            n: 0,
            env,
            registry,
            options,
        }
    }

    // ------------------------------------------------------------------
    // Compile pass
    // ------------------------------------------------------------------

    /// Builds the PDV and reads the input. `None` means the step has no
    /// input statement and runs exactly once.
    fn compile(&mut self, body: &[Statement]) -> Result<Option<Vec<Row>>> {
        let mut plan = InputPlan::default();
        let mut input_datasets: Vec<(DatasetRef, Dataset)> = Vec::new();
        for stmt in body {
            self.declare(stmt, &mut plan, &mut input_datasets)?;
        }

        let mut referenced = Vec::new();
        for stmt in body {
            collect_references(stmt, &mut referenced);
        }
        for name in referenced {
            if name.eq_ignore_ascii_case("_n_") || self.arrays.contains_key(&name.to_ascii_uppercase()) {
                continue;
            }
            if self.pdv.find_var_index(&name).is_none() {
                warn!("NOTE: Variable {} is uninitialized.", name);
                self.pdv.add_variable(PdvVar::numeric(name));
            }
        }

        for name in &self.keep {
            if self.pdv.find_var_index(name).is_none() {
                warn!(
                    "WARNING: The variable {} in the KEEP list has never been referenced.",
                    name
                );
            }
        }

        let rows = self.build_input(plan, input_datasets)?;
        if let Some(rows) = &rows {
            debug!(rows = rows.len(), variables = self.pdv.len(), "compiled data step");
        }
        Ok(rows)
    }

    /// Registers the declarations of one statement, recursing into blocks
    fn declare(
        &mut self,
        stmt: &Statement,
        plan: &mut InputPlan,
        inputs: &mut Vec<(DatasetRef, Dataset)>,
    ) -> Result<()> {
        match stmt {
            Statement::Set(refs) | Statement::Merge(refs) => {
                for reference in refs {
                    let dataset = self.env.dataset(reference)?;
                    self.register_columns(&dataset);
                    inputs.push((reference.clone(), dataset));
                }
                if matches!(stmt, Statement::Set(_)) {
                    plan.set.extend(refs.iter().cloned());
                } else {
                    plan.merge.extend(refs.iter().cloned());
                }
            }
            Statement::By(vars) => plan.by = vars.clone(),
            Statement::Input(fields) => {
                for field in fields {
                    self.pdv.add_variable(PdvVar::new(&field.name, field.kind));
                }
                plan.fields.extend(fields.iter().cloned());
            }
            Statement::Datalines(text) => plan.datalines = Some(text.clone()),
            Statement::Array {
                name,
                kind,
                variables,
                ..
            } => {
                for variable in variables {
                    self.pdv.add_variable(PdvVar::new(variable, *kind));
                }
                self.arrays.insert(
                    name.to_ascii_uppercase(),
                    ArrayDef {
                        variables: variables.clone(),
                        kind: *kind,
                    },
                );
            }
            Statement::Retain(items) => {
                for item in items {
                    let initial = match &item.initial {
                        Some(expr) => Some(evaluate(expr, &*self, self.registry)?),
                        None => None,
                    };
                    let kind = initial.as_ref().map_or(VarKind::Numeric, Value::kind);
                    let idx = self.pdv.add_variable(PdvVar::new(&item.name, kind));
                    self.pdv.set_retain_flag(&item.name, true);
                    if let Some(value) = initial {
                        self.pdv.set_value(idx, value);
                    }
                }
            }
            Statement::Length(items) => {
                for item in items {
                    self.pdv.declare_length(&item.name, item.kind, item.length);
                }
            }
            Statement::Keep(names) => self.keep.extend(names.iter().cloned()),
            Statement::Drop(names) => self.drop.extend(names.iter().cloned()),
            Statement::Output(names) => {
                self.explicit_output = true;
                for name in names {
                    if self.output_index(name).is_none() {
                        return Err(Error::UnsupportedStatement(format!(
                            "OUTPUT {}: not named in the DATA statement",
                            name.to_ascii_uppercase()
                        )));
                    }
                }
            }
            Statement::Assignment {
                target: AssignTarget::Variable(name),
                value,
            } => {
                if !name.eq_ignore_ascii_case("_n_") {
                    let kind = self.infer_kind(value);
                    self.pdv.add_variable(PdvVar::new(name, kind));
                }
            }
            Statement::If {
                then_branch,
                else_ifs,
                else_branch,
                ..
            } => {
                self.declare(then_branch, plan, inputs)?;
                for branch in else_ifs {
                    self.declare(&branch.body, plan, inputs)?;
                }
                if let Some(stmt) = else_branch {
                    self.declare(stmt, plan, inputs)?;
                }
            }
            Statement::Do { variable, body, .. } => {
                self.pdv.add_variable(PdvVar::numeric(variable));
                for stmt in body {
                    self.declare(stmt, plan, inputs)?;
                }
            }
            Statement::DoLoop { body, .. } | Statement::Block(body) => {
                for stmt in body {
                    self.declare(stmt, plan, inputs)?;
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn register_columns(&mut self, dataset: &Dataset) {
        for column in dataset.columns() {
            let kind = dataset
                .rows()
                .iter()
                .filter_map(|row| row.get(column))
                .find(|v| !v.is_missing())
                .or_else(|| dataset.get(0, column))
                .map_or(VarKind::Numeric, Value::kind);
            self.pdv.add_variable(PdvVar::new(column, kind));
        }
    }

    /// Result kind of an assigned expression
    fn infer_kind(&self, expr: &Expression) -> VarKind {
        match expr {
            Expression::String(_) => VarKind::Character,
            Expression::Variable(name) => self
                .pdv
                .find_var_index(name)
                .and_then(|i| self.pdv.variable(i))
                .map_or(VarKind::Numeric, |v| v.kind),
            Expression::MacroVariable(name) => match self.env.macro_variable(name) {
                Some(text) if text.trim().parse::<f64>().is_err() => VarKind::Character,
                _ => VarKind::Numeric,
            },
            Expression::Binary {
                op: BinaryOp::Concat,
                ..
            } => VarKind::Character,
            Expression::FunctionCall { name, .. }
                if CHARACTER_FUNCTIONS.contains(&name.to_ascii_uppercase().as_str()) =>
            {
                VarKind::Character
            }
            Expression::ArrayElement { name, .. } => self
                .arrays
                .get(&name.to_ascii_uppercase())
                .map_or(VarKind::Numeric, |a| a.kind),
            _ => VarKind::Numeric,
        }
    }

    /// Input rows from SET, MERGE or DATALINES, capped by `OBS=`
    fn build_input(
        &self,
        plan: InputPlan,
        inputs: Vec<(DatasetRef, Dataset)>,
    ) -> Result<Option<Vec<Row>>> {
        let rows = if !plan.merge.is_empty() {
            if !plan.set.is_empty() {
                return Err(Error::UnsupportedStatement(
                    "SET and MERGE in the same DATA step".to_string(),
                ));
            }
            let datasets = inputs.into_iter().map(|(_, ds)| ds).collect::<Vec<_>>();
            merge(&datasets, &plan.by)
        } else if !plan.set.is_empty() {
            for (reference, dataset) in &inputs {
                info!(
                    "NOTE: There were {} observations read from the data set {}.",
                    dataset.len(),
                    reference
                );
            }
            let mut rows: Vec<Row> = inputs
                .into_iter()
                .flat_map(|(_, ds)| ds.into_rows())
                .collect();
            if !plan.by.is_empty() {
                // interleave: the concatenation ordered by the BY values
                rows.sort_by(|a, b| compare_rows(a, b, &plan.by));
            }
            rows
        } else if !plan.fields.is_empty() {
            match &plan.datalines {
                Some(text) => read_datalines(text, &plan.fields),
                None => {
                    return Err(Error::UnsupportedStatement(
                        "INPUT without DATALINES".to_string(),
                    ))
                }
            }
        } else {
            if plan.datalines.is_some() {
                warn!("WARNING: DATALINES without an INPUT statement are ignored.");
            }
            return Ok(None);
        };

        Ok(Some(match self.options.obs_limit {
            Some(limit) => rows.into_iter().take(limit).collect(),
            None => rows,
        }))
    }

    // ------------------------------------------------------------------
    // Execution pass
    // ------------------------------------------------------------------

    fn execute(mut self, body: &[Statement], rows: Option<Vec<Row>>) -> Result<DataStepOutcome> {
        let columns = self.output_columns();
        let mut datasets: Vec<Dataset> = self
            .outputs
            .iter()
            .map(|o| Dataset::with_columns(o.name.clone(), columns.clone()))
            .collect();
        let mut errors = Vec::new();

        let observations: Box<dyn Iterator<Item = Option<Row>>> = match rows {
            Some(rows) => Box::new(rows.into_iter().map(Some)),
            None => Box::new(std::iter::once(None)),
        };

        for row in observations {
            self.n += 1;
            self.pdv.reset_non_retained();
            if let Some(row) = row {
                for (name, value) in row {
                    self.pdv.set_by_name(&name, value);
                }
            }
            self.requested = vec![false; self.outputs.len()];

            let flow = match self.run_block(body) {
                Ok(flow) => flow,
                Err(err) => {
                    error!("ERROR: {} (_N_={})", err, self.n);
                    errors.push(err);
                    continue;
                }
            };

            let write_all = flow == Flow::Continue && !self.explicit_output;
            if flow != Flow::Delete {
                for (i, dataset) in datasets.iter_mut().enumerate() {
                    if write_all || self.requested[i] {
                        dataset.push_row(self.output_row(&columns));
                    }
                }
            }
            if flow == Flow::Stop {
                debug!(n = self.n, "STOP");
                break;
            }
        }

        Ok(DataStepOutcome {
            outputs: self.outputs.iter().cloned().zip(datasets).collect(),
            errors,
            iterations: self.n,
        })
    }

    fn run_block(&mut self, statements: &[Statement]) -> Result<Flow> {
        for stmt in statements {
            let flow = self.run_statement(stmt)?;
            if flow != Flow::Continue {
                return Ok(flow);
            }
        }
        Ok(Flow::Continue)
    }

    fn run_statement(&mut self, stmt: &Statement) -> Result<Flow> {
        match stmt {
            Statement::Assignment { target, value } => {
                let value = self.eval(value)?;
                match target {
                    AssignTarget::Variable(name) => {
                        self.pdv.set_by_name(name, value);
                    }
                    AssignTarget::ArrayElement { name, index } => {
                        let index = self.eval_index(name, index)?;
                        let variable = self.array_slot(name, index)?.to_string();
                        self.pdv.set_by_name(&variable, value);
                    }
                }
                Ok(Flow::Continue)
            }

            Statement::If {
                condition,
                then_branch,
                else_ifs,
                else_branch,
            } => {
                if self.eval(condition)?.is_truthy() {
                    return self.run_statement(then_branch);
                }
                for branch in else_ifs {
                    if self.eval(&branch.condition)?.is_truthy() {
                        return self.run_statement(&branch.body);
                    }
                }
                match else_branch {
                    Some(stmt) => self.run_statement(stmt),
                    None => Ok(Flow::Continue),
                }
            }

            Statement::SubsettingIf(condition) => Ok(if self.eval(condition)?.is_truthy() {
                Flow::Continue
            } else {
                Flow::Delete
            }),

            Statement::Do {
                variable,
                start,
                end,
                increment,
                body,
            } => self.run_do(variable, start, end, increment.as_ref(), body),

            Statement::DoLoop { condition, body } => self.run_do_loop(condition, body),

            Statement::Block(body) => self.run_block(body),

            Statement::Output(names) => {
                if names.is_empty() {
                    self.requested.iter_mut().for_each(|r| *r = true);
                } else {
                    for name in names {
                        if let Some(i) = self.output_index(name) {
                            self.requested[i] = true;
                        }
                    }
                }
                Ok(Flow::Continue)
            }

            Statement::Delete => Ok(Flow::Delete),
            Statement::Stop => Ok(Flow::Stop),

            // Declarations were handled by the compile pass
            Statement::Set(_)
            | Statement::Merge(_)
            | Statement::By(_)
            | Statement::Array { .. }
            | Statement::Drop(_)
            | Statement::Keep(_)
            | Statement::Retain(_)
            | Statement::Length(_)
            | Statement::Input(_)
            | Statement::Datalines(_) => Ok(Flow::Continue),

            other => Err(Error::UnsupportedStatement(format!(
                "{} inside a DATA step",
                other.keyword()
            ))),
        }
    }

    fn run_do(
        &mut self,
        variable: &str,
        start: &Expression,
        end: &Expression,
        increment: Option<&Expression>,
        body: &[Statement],
    ) -> Result<Flow> {
        let start = self.eval(start)?.as_number();
        let end = self.eval(end)?.as_number();
        let step = match increment {
            Some(expr) => self.eval(expr)?.as_number(),
            None => 1.0,
        };
        for (value, what) in [(start, "start"), (end, "end"), (step, "increment")] {
            if value.is_nan() {
                return Err(Error::InvalidDoLoop {
                    variable: variable.to_string(),
                    reason: format!("{} value is missing", what),
                });
            }
        }
        if step == 0.0 {
            return Err(Error::ZeroDoIncrement {
                variable: variable.to_string(),
            });
        }

        let limit = self.options.max_loop_iterations;
        let mut current = start;
        let mut iterations = 0usize;
        while (step > 0.0 && current <= end) || (step < 0.0 && current >= end) {
            iterations += 1;
            if iterations > limit {
                return Err(Error::TooManyIterations { limit });
            }
            self.pdv.set_by_name(variable, Value::Numeric(current));
            let flow = self.run_block(body)?;
            if flow != Flow::Continue {
                return Ok(flow);
            }
            // the body may have changed the index
            current = self.pdv.get_by_name(variable).as_number() + step;
        }
        self.pdv.set_by_name(variable, Value::Numeric(current));
        Ok(Flow::Continue)
    }

    fn run_do_loop(&mut self, condition: &LoopCondition, body: &[Statement]) -> Result<Flow> {
        let limit = self.options.max_loop_iterations;
        let mut iterations = 0usize;
        loop {
            iterations += 1;
            if iterations > limit {
                return Err(Error::TooManyIterations { limit });
            }
            if let LoopCondition::While(cond) = condition {
                if !self.eval(cond)?.is_truthy() {
                    return Ok(Flow::Continue);
                }
            }
            let flow = self.run_block(body)?;
            if flow != Flow::Continue {
                return Ok(flow);
            }
            if let LoopCondition::Until(cond) = condition {
                if self.eval(cond)?.is_truthy() {
                    return Ok(Flow::Continue);
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Helpers
    // ------------------------------------------------------------------

    fn eval(&self, expr: &Expression) -> Result<Value> {
        evaluate(expr, self, self.registry)
    }

    fn eval_index(&self, name: &str, index: &Expression) -> Result<i64> {
        let value = self.eval(index)?.as_number();
        if value.is_nan() {
            return Err(Error::ArrayIndexOutOfBounds {
                name: name.to_string(),
                index: 0,
                size: self.array_len(name).unwrap_or(0),
            });
        }
        Ok(value.trunc() as i64)
    }

    /// Variable behind `name[index]` (1-based)
    fn array_slot(&self, name: &str, index: i64) -> Result<&str> {
        let array = self
            .arrays
            .get(&name.to_ascii_uppercase())
            .ok_or_else(|| Error::UndefinedArray {
                name: name.to_string(),
            })?;
        let size = array.variables.len();
        if index < 1 || index as usize > size {
            return Err(Error::ArrayIndexOutOfBounds {
                name: name.to_string(),
                index,
                size,
            });
        }
        Ok(&array.variables[index as usize - 1])
    }

    fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs
            .iter()
            .position(|o| o.name.eq_ignore_ascii_case(name))
    }

    /// Output columns in PDV order; KEEP wins over DROP
    fn output_columns(&self) -> Vec<String> {
        let listed = |list: &[String], name: &str| list.iter().any(|n| n.eq_ignore_ascii_case(name));
        self.pdv
            .variables()
            .iter()
            .map(|v| &v.name)
            .filter(|name| {
                if !self.keep.is_empty() {
                    listed(&self.keep, name)
                } else {
                    !listed(&self.drop, name)
                }
            })
            .cloned()
            .collect()
    }

    fn output_row(&self, columns: &[String]) -> Vec<(String, Value)> {
        columns
            .iter()
            .map(|c| (c.clone(), self.pdv.get_by_name(c)))
            .collect()
    }
}

/// Names read by expressions, in order of appearance
fn collect_references(stmt: &Statement, out: &mut Vec<String>) {
    let mut exprs: Vec<&Expression> = Vec::new();
    match stmt {
        Statement::Assignment { target, value } => {
            if let AssignTarget::ArrayElement { index, .. } = target {
                exprs.push(index);
            }
            exprs.push(value);
        }
        Statement::If {
            condition,
            then_branch,
            else_ifs,
            else_branch,
        } => {
            expression_references(condition, out);
            collect_references(then_branch, out);
            for branch in else_ifs {
                expression_references(&branch.condition, out);
                collect_references(&branch.body, out);
            }
            if let Some(stmt) = else_branch {
                collect_references(stmt, out);
            }
        }
        Statement::SubsettingIf(condition) => exprs.push(condition),
        Statement::Do {
            start,
            end,
            increment,
            body,
            ..
        } => {
            exprs.push(start);
            exprs.push(end);
            exprs.extend(increment.iter());
            for expr in exprs.drain(..) {
                expression_references(expr, out);
            }
            for stmt in body {
                collect_references(stmt, out);
            }
        }
        Statement::DoLoop { condition, body } => {
            let (LoopCondition::While(cond) | LoopCondition::Until(cond)) = condition;
            exprs.push(cond);
            for stmt in body {
                collect_references(stmt, out);
            }
        }
        Statement::Block(body) => {
            for stmt in body {
                collect_references(stmt, out);
            }
        }
        _ => {}
    }
    for expr in exprs {
        expression_references(expr, out);
    }
}

fn expression_references(expr: &Expression, out: &mut Vec<String>) {
    match expr {
        Expression::Variable(name) => out.push(name.clone()),
        Expression::Binary { left, right, .. } => {
            expression_references(left, out);
            expression_references(right, out);
        }
        Expression::Unary { operand, .. } => expression_references(operand, out),
        Expression::FunctionCall { name, args } if !name.eq_ignore_ascii_case("dim") => {
            for arg in args {
                expression_references(arg, out);
            }
        }
        Expression::ArrayElement { index, .. } => expression_references(index, out),
        _ => {}
    }
}

/// List input: whitespace-separated fields, `.` for missing
fn read_datalines(text: &str, fields: &[InputField]) -> Vec<Row> {
    let mut rows = Vec::new();
    for (line_no, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let mut tokens = line.split_whitespace();
        let mut row = Row::with_capacity(fields.len());
        for field in fields {
            let value = match (tokens.next(), field.kind) {
                (None, kind) => Value::missing_of(kind),
                (Some("."), kind) => Value::missing_of(kind),
                (Some(text), VarKind::Character) => Value::Character(text.to_string()),
                (Some(text), VarKind::Numeric) => match text.parse::<f64>() {
                    Ok(n) => Value::Numeric(n),
                    Err(_) => {
                        warn!(
                            "NOTE: Invalid data for {} in line {}: {}",
                            field.name,
                            line_no + 1,
                            text
                        );
                        Value::missing()
                    }
                },
            };
            row.insert(field.name.clone(), value);
        }
        rows.push(row);
    }
    rows
}

/// Match-merge of datasets sorted by `by`; one-to-one when `by` is empty
fn merge(datasets: &[Dataset], by: &[ByVariable]) -> Vec<Row> {
    let mut rows = Vec::new();

    if by.is_empty() {
        let longest = datasets.iter().map(Dataset::len).max().unwrap_or(0);
        for i in 0..longest {
            let mut row = Row::new();
            for dataset in datasets {
                if let Some(source) = dataset.rows().get(i) {
                    row.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
            rows.push(row);
        }
        return rows;
    }

    let mut cursors = vec![0usize; datasets.len()];
    loop {
        // smallest pending BY group
        let key = datasets
            .iter()
            .zip(&cursors)
            .filter_map(|(ds, &c)| ds.rows().get(c))
            .min_by(|a, b| compare_rows(a, b, by));
        let Some(key) = key.cloned() else {
            break;
        };

        let groups: Vec<&[Row]> = datasets
            .iter()
            .zip(cursors.iter_mut())
            .map(|(ds, cursor)| {
                let start = *cursor;
                while ds
                    .rows()
                    .get(*cursor)
                    .is_some_and(|r| same_keys(r, &key, by))
                {
                    *cursor += 1;
                }
                &ds.rows()[start..*cursor]
            })
            .collect();

        let longest = groups.iter().map(|g| g.len()).max().unwrap_or(0);
        for i in 0..longest {
            let mut row = Row::new();
            for group in &groups {
                // a shorter group repeats its last row
                if let Some(source) = group.get(i).or_else(|| group.last()) {
                    row.extend(source.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
            }
            rows.push(row);
        }
    }
    rows
}

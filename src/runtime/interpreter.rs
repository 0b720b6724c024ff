//! Top-level statement execution
//!
//! The [`Interpreter`] owns the session: the [`Environment`], the function
//! registry and the listing. Each top-level statement is one unit of
//! recovery; a failing statement is logged and the next one still runs.

use tracing::{debug, error, info};

use crate::config::InterpreterConfig;
use crate::error::{Error, Result};
use crate::lexer::Scanner;
use crate::parser::{AssignTarget, DatasetRef, Parser, Program, Statement};
use crate::runtime::data_step::{run_data_step, DataStepOptions};
use crate::runtime::environment::AccessMode;
use crate::runtime::evaluator::{evaluate, Scope};
use crate::runtime::listing::{Listing, PrintOptions};
use crate::runtime::procs;
use crate::runtime::storage::Engine;
use crate::runtime::{Environment, Value};
use crate::tools::ToolRegistry;

/// Scope of open code: global variables and macro variables
struct GlobalScope<'a>(&'a Environment);

impl<'a> Scope for GlobalScope<'a> {
    fn variable(&self, name: &str) -> Value {
        self.0.variable(name)
    }

    fn macro_variable(&self, name: &str) -> Option<String> {
        self.0.macro_variable(name).map(str::to_string)
    }
}

/// Executes programs against one session
pub struct Interpreter {
    env: Environment,
    registry: ToolRegistry,
    config: InterpreterConfig,
    listing: Listing,
    /// Observation-level errors of the statement being executed
    step_errors: Vec<Error>,
}

impl Interpreter {
    /// Interpreter with the default configuration
    pub fn new() -> Self {
        Interpreter {
            env: Environment::new(),
            registry: ToolRegistry::new(),
            config: InterpreterConfig::default(),
            listing: Listing::new(),
            step_errors: Vec::new(),
        }
    }

    /// Interpreter with pre-assigned librefs and options from `config`
    pub fn with_config(config: InterpreterConfig) -> Result<Self> {
        let mut interpreter = Interpreter::new();
        for library in &config.libraries {
            let access = if library.readonly {
                AccessMode::ReadOnly
            } else {
                AccessMode::ReadWrite
            };
            interpreter.env.set_libref(
                &library.name,
                &library.path,
                library.engine.unwrap_or(config.default_engine),
                access,
            )?;
        }
        if let Some(obs) = config.obs_limit {
            interpreter.env.set_option("OBS", &obs.to_string());
        }
        interpreter.config = config;
        Ok(interpreter)
    }

    /// Tokenizes, parses and executes `source`.
    ///
    /// A lex error stops everything and is returned as `Err`. Parse and
    /// execution errors are recovered from and returned in the `Ok` list.
    pub fn run(&mut self, source: &str) -> Result<Vec<Error>> {
        let tokens = Scanner::new(source).scan_tokens()?;
        let mut parser = Parser::new(tokens);
        let program = parser.parse();
        let mut errors = parser.take_errors();
        for err in &errors {
            error!("ERROR: {}", err);
        }
        errors.extend(self.execute(&program));
        Ok(errors)
    }

    /// Executes every statement, returning the errors that were recovered from
    pub fn execute(&mut self, program: &Program) -> Vec<Error> {
        let mut errors = Vec::new();
        for statement in &program.statements {
            let result = self.execute_statement(statement);
            errors.append(&mut self.step_errors);
            if let Err(err) = result {
                error!("ERROR: {}", err);
                errors.push(err);
            }
        }
        errors
    }

    /// Executes one top-level statement
    pub fn execute_statement(&mut self, statement: &Statement) -> Result<()> {
        debug!(statement = statement.keyword(), "execute");
        match statement {
            Statement::DataStep { outputs, body } => self.run_data_step(outputs, body),

            Statement::Options(pairs) => {
                for (name, value) in pairs {
                    self.env.set_option(name, value);
                }
                Ok(())
            }

            Statement::Libname {
                libref,
                engine,
                path,
                readonly,
            } => {
                let engine = match engine {
                    Some(name) => Engine::from_name(name).ok_or_else(|| {
                        Error::UnsupportedStatement(format!("LIBNAME engine {}", name))
                    })?,
                    None => self.config.default_engine,
                };
                let access = if *readonly {
                    AccessMode::ReadOnly
                } else {
                    AccessMode::ReadWrite
                };
                self.env.set_libref(libref, path, engine, access)
            }

            Statement::Title(text) => {
                self.env.set_title(text.clone());
                Ok(())
            }

            Statement::MacroLet { name, value } => {
                self.env.set_macro_variable(name, value.trim());
                Ok(())
            }

            Statement::Assignment { target, value } => match target {
                AssignTarget::Variable(name) => {
                    let value = evaluate(value, &GlobalScope(&self.env), &self.registry)?;
                    self.env.set_variable(name, value);
                    Ok(())
                }
                AssignTarget::ArrayElement { name, .. } => {
                    Err(Error::UndefinedArray { name: name.clone() })
                }
            },

            Statement::ProcSort(proc) => procs::sort::run(proc, &mut self.env, &self.registry),
            Statement::ProcMeans(proc) => procs::means::run(proc, &mut self.env, &mut self.listing),
            Statement::ProcPrint(proc) => procs::print::run(proc, &self.env, &mut self.listing),
            Statement::ProcFreq(proc) => procs::freq::run(proc, &self.env, &mut self.listing),
            Statement::ProcSql => Err(Error::NotImplemented {
                feature: "PROC SQL".to_string(),
            }),
            Statement::ProcUnknown(name) => Err(Error::UnsupportedProcedure { name: name.clone() }),

            Statement::Run => Ok(()),

            other => Err(Error::UnsupportedStatement(format!(
                "{} is only valid inside a DATA step",
                other.keyword()
            ))),
        }
    }

    fn run_data_step(&mut self, outputs: &[DatasetRef], body: &[Statement]) -> Result<()> {
        let options = DataStepOptions {
            max_loop_iterations: self.config.max_loop_iterations,
            obs_limit: self.env.obs_limit(),
        };
        let outcome = run_data_step(outputs, body, &self.env, &self.registry, options)?;
        self.step_errors.extend(outcome.errors);

        for (reference, dataset) in outcome.outputs {
            info!(
                "NOTE: The data set {} has {} observations and {} variables.",
                reference,
                dataset.len(),
                dataset.columns().len()
            );
            if self.config.auto_print {
                self.listing
                    .push_dataset(self.env.title(), &dataset, &PrintOptions::default());
            }
            self.env.store_dataset(&reference, dataset)?;
        }
        debug!(iterations = outcome.iterations, "DATA step finished");
        Ok(())
    }

    /// Listing produced so far
    pub fn listing(&self) -> &str {
        self.listing.as_str()
    }

    /// Takes the listing produced so far
    pub fn take_listing(&mut self) -> String {
        self.listing.take()
    }

    /// Session state
    pub fn environment(&self) -> &Environment {
        &self.env
    }

    /// Mutable session state
    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Function registry
    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }

    /// Active configuration
    pub fn config(&self) -> &InterpreterConfig {
        &self.config
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

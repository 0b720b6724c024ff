//! saslite command line: runs a program file, or an interactive session
//! when no file is given.
//!
//! The listing goes to stdout and the log (NOTE/WARNING/ERROR lines) to
//! stderr.

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use saslite::config::InterpreterConfig;
use saslite::{Interpreter, Parser, Scanner};

const HELP: &str = "\
Enter DATA steps, PROC steps and global statements. Input is run as soon as
it forms a complete statement (steps run at RUN; or QUIT;).

  data out; set in; ...; run;      DATA step
  proc sort|means|print|freq ...   PROC step
  libname lib 'dir';               assign a library
  options obs=n;  title 'text';    global statements
  help, ?                          this text
  exit, quit                       leave";

/// saslite: an interpreter for a SAS-like data step language
#[derive(ClapParser)]
#[command(name = "saslite", version, about)]
struct Cli {
    /// Program file; starts an interactive session when omitted
    file: Option<PathBuf>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log debug detail to stderr
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let config = match &cli.config {
        Some(path) => InterpreterConfig::from_file(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => InterpreterConfig::default(),
    };
    let mut interpreter = Interpreter::with_config(config).context("assigning libraries")?;

    match cli.file {
        Some(path) => run_file(&mut interpreter, &path),
        None => {
            repl(&mut interpreter)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_file(interpreter: &mut Interpreter, path: &Path) -> Result<ExitCode> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    let errors = interpreter
        .run(&source)
        .with_context(|| format!("tokenizing {}", path.display()))?;

    print!("{}", interpreter.take_listing());
    io::stdout().flush()?;

    debug!(errors = errors.len(), "finished {}", path.display());
    Ok(if errors.is_empty() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_help(interpreter: &Interpreter) {
    println!("{}", HELP);
    println!("\nFunctions:");
    let registry = interpreter.registry();
    for name in registry.list_tools() {
        if let Ok(tool) = registry.get(&name) {
            println!("  {:<10}{}", name, tool.description());
        }
    }
}

fn repl(interpreter: &mut Interpreter) -> Result<()> {
    println!("saslite {} - type help for a summary, exit to leave", saslite::VERSION);
    let stdin = io::stdin();
    let mut buffer = String::new();

    loop {
        print!("{}", if buffer.is_empty() { "saslite> " } else { "     ...> " });
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        if buffer.is_empty() {
            match line.trim().to_ascii_lowercase().as_str() {
                "exit" | "quit" => break,
                "help" | "?" => {
                    print_help(interpreter);
                    continue;
                }
                "" => continue,
                _ => {}
            }
        }
        buffer.push_str(&line);

        let tokens = match Scanner::new(&buffer).scan_tokens() {
            Ok(tokens) => tokens,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                buffer.clear();
                continue;
            }
        };
        if !Parser::is_complete_statement(&tokens) {
            continue;
        }

        let mut parser = Parser::new(tokens);
        let program = parser.parse();
        for err in parser.take_errors() {
            eprintln!("ERROR: {}", err);
        }
        // execution errors are already on the log stream
        interpreter.execute(&program);
        print!("{}", interpreter.take_listing());
        buffer.clear();
    }
    Ok(())
}

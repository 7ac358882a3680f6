// File: src/main.rs
//
// Main entry point for the Kat programming language interpreter.
// Handles command-line argument parsing and dispatches to the appropriate
// subcommand (run, repl, ast, or test).

use clap::{Args, Parser as ClapParser, Subcommand};
use colored::Colorize;
use kat::errors::KatError;
use kat::interpreter::{Interpreter, InterpreterConfig, Value, DEFAULT_MAX_CALL_DEPTH};
use kat::repl::Repl;
use kat::{parser, snapshots};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const EXIT_RUNTIME_ERROR: i32 = 1;
const EXIT_PARSE_ERROR: i32 = 2;

#[derive(ClapParser)]
#[command(
    name = "kat",
    about = "Kat: a small dynamically-typed scripting language",
    version = env!("CARGO_PKG_VERSION"),
    long_about = None
)]
struct Cli {
    #[command(flatten)]
    options: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalOptions {
    /// Log interpreter activity at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Maximum depth of nested function calls
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_CALL_DEPTH)]
    max_depth: usize,

    /// Extra directory to search for `.kat` modules (repeatable)
    #[arg(short = 'I', long = "include", global = true)]
    include: Vec<PathBuf>,

    /// Colon-separated module directories
    #[arg(long, env = "KAT_PATH", value_delimiter = ':', global = true, hide = true)]
    kat_path: Vec<PathBuf>,
}

#[derive(Subcommand)]
#[command(arg_required_else_help = true)]
enum Commands {
    /// Run a Kat script file
    Run {
        /// Path to the .kat file
        file: PathBuf,
    },

    /// Launch interactive Kat REPL
    Repl,

    /// Print the syntax tree of a Kat script
    Ast {
        /// Path to the .kat file
        file: PathBuf,

        /// Emit the tree as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run every .kat script in a directory against its .out snapshot
    Test {
        /// Directory holding the scripts
        #[arg(default_value = "tests/scripts")]
        dir: PathBuf,

        /// Regenerate all .out files based on actual output
        #[arg(long)]
        update: bool,
    },
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env("KAT_LOG").unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_level(true).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

impl GlobalOptions {
    /// Search order: -I directories, KAT_PATH entries, then the defaults
    fn interpreter_config(&self) -> InterpreterConfig {
        let mut config = InterpreterConfig { max_call_depth: self.max_depth, ..Default::default() };
        let mut search_paths: Vec<PathBuf> =
            self.include.iter().chain(self.kat_path.iter()).cloned().collect();
        search_paths.append(&mut config.search_paths);
        config.search_paths = search_paths;
        config
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.options.verbose);

    let config = cli.options.interpreter_config();
    debug!(search_paths = ?config.search_paths, max_depth = config.max_call_depth, "configured");

    process::exit(dispatch(cli.command, config));
}

fn dispatch(command: Commands, config: InterpreterConfig) -> i32 {
    match command {
        Commands::Run { file } => run_file(&file, config),

        Commands::Repl => match Repl::new(config).and_then(|mut repl| repl.run()) {
            Ok(()) => 0,
            Err(e) => {
                eprintln!("{} {}", "REPL error:".red().bold(), e);
                EXIT_RUNTIME_ERROR
            }
        },

        Commands::Ast { file, json } => print_ast(&file, json),

        Commands::Test { dir, update } => match snapshots::run_all(&dir, update, &config) {
            Ok(report) if report.all_passed() => 0,
            Ok(_) => EXIT_RUNTIME_ERROR,
            Err(e) => {
                eprintln!("{} cannot read {}: {}", "Error:".red().bold(), dir.display(), e);
                EXIT_RUNTIME_ERROR
            }
        },
    }
}

fn read_source(file: &Path) -> Result<String, i32> {
    fs::read_to_string(file).map_err(|e| {
        eprintln!("{} cannot read {}: {}", "Error:".red().bold(), file.display(), e);
        EXIT_RUNTIME_ERROR
    })
}

fn run_file(file: &Path, mut config: InterpreterConfig) -> i32 {
    let source = match read_source(file) {
        Ok(source) => source,
        Err(code) => return code,
    };

    // Modules next to the script come first
    if let Some(dir) = file.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        config.search_paths.insert(0, dir.to_path_buf());
    }

    let file_name = file.display().to_string();
    info!(file = %file_name, "running script");

    let mut interpreter = Interpreter::with_config(config);
    interpreter.source_file = Some(file_name.clone());

    match interpreter.run(&source) {
        Ok(Value::Error(message)) => {
            eprint!("{}", interpreter.error_report(message, &source));
            EXIT_RUNTIME_ERROR
        }
        Ok(_) => 0,
        Err(parse_error) => {
            eprint!("{}", KatError::from(parse_error).with_file(file_name).with_source_from(&source));
            EXIT_PARSE_ERROR
        }
    }
}

fn print_ast(file: &Path, json: bool) -> i32 {
    let source = match read_source(file) {
        Ok(source) => source,
        Err(code) => return code,
    };

    let program = match parser::parse(&source) {
        Ok(program) => program,
        Err(parse_error) => {
            let file_name = file.display().to_string();
            eprint!("{}", KatError::from(parse_error).with_file(file_name).with_source_from(&source));
            return EXIT_PARSE_ERROR;
        }
    };

    if json {
        match serde_json::to_string_pretty(&program) {
            Ok(text) => println!("{}", text),
            Err(e) => {
                eprintln!("{} cannot serialize syntax tree: {}", "Error:".red().bold(), e);
                return EXIT_RUNTIME_ERROR;
            }
        }
    } else {
        print!("{}", program.tree());
    }
    0
}

// File: src/snapshots.rs
//
// Snapshot test runner behind `kat test`.
// Every `*.kat` script in a directory is run with its output captured and
// compared to the sibling `*.out` file. A run that ends in an error appends
// the error line to the captured output, so failing programs can be pinned
// too. Missing `.out` files are created from the actual output.

use crate::interpreter::{Interpreter, InterpreterConfig, Value};
use colored::Colorize;
use std::cell::RefCell;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Instant;

/// A script whose output differed from its snapshot
#[derive(Debug, Clone)]
pub struct SnapshotFailure {
    pub path: PathBuf,
    pub expected: String,
    pub actual: String,
}

#[derive(Debug, Default)]
pub struct SnapshotReport {
    pub total: usize,
    pub passed: usize,
    pub failures: Vec<SnapshotFailure>,
}

impl SnapshotReport {
    pub fn all_passed(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Runs one script and returns its transcript: captured output followed by
/// a final error line when the run failed
pub fn run_script(source: &str, config: &InterpreterConfig) -> String {
    let mut interp = Interpreter::with_config(config.clone());
    let buffer = Rc::new(RefCell::new(Vec::new()));
    interp.set_output(Rc::clone(&buffer));

    let result = interp.run(source);

    let mut transcript = String::from_utf8_lossy(&buffer.borrow()).into_owned();
    match result {
        Ok(Value::Error(message)) => {
            transcript.push_str(&format!("Error: {}\n", message));
        }
        Ok(_) => {}
        Err(err) => transcript.push_str(&format!("Parse Error: {}\n", err)),
    }
    transcript
}

/// Runs every script in `test_dir`, in file name order. With `update`, the
/// `.out` files are rewritten from the actual output.
pub fn run_all(
    test_dir: &Path,
    update: bool,
    config: &InterpreterConfig,
) -> io::Result<SnapshotReport> {
    let mut scripts: Vec<PathBuf> = fs::read_dir(test_dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "kat"))
        .collect();
    scripts.sort();

    let mut report = SnapshotReport::default();

    for path in scripts {
        report.total += 1;
        let source = fs::read_to_string(&path)?;
        let expected_path = path.with_extension("out");

        // Imports inside a script resolve next to the script first
        let mut script_config = config.clone();
        script_config.search_paths.insert(0, test_dir.to_path_buf());

        let start = Instant::now();
        let actual = run_script(&source, &script_config).trim().to_string();

        let expected = if expected_path.exists() && !update {
            fs::read_to_string(&expected_path)?.trim().to_string()
        } else {
            fs::write(&expected_path, format!("{}\n", actual))?;
            actual.clone()
        };

        if actual == expected {
            println!("{} {} ({:.2?})", "[✓]".green(), path.display(), start.elapsed());
            report.passed += 1;
        } else {
            println!("{} {}", "[✗]".red(), path.display());
            println!("Expected:\n{}\nGot:\n{}\n", expected, actual);
            report.failures.push(SnapshotFailure { path, expected, actual });
        }
    }

    println!("\nPassed {}/{} tests", report.passed, report.total);
    Ok(report)
}

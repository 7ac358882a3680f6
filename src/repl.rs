// File: src/repl.rs
//
// Interactive REPL (Read-Eval-Print Loop) for the Kat programming language.
// Provides an interactive shell for executing Kat code with features like:
// - Multi-line input while braces, brackets or parentheses are open
// - Command history with up/down arrow navigation
// - Special commands (:help, :clear, :quit, :vars, :reset)
// - Persistent state across inputs (one global environment)

use crate::errors::KatError;
use crate::interpreter::{Interpreter, InterpreterConfig, Value};
use colored::Colorize;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

/// What the REPL loop should do after a `:` command
#[derive(Debug, PartialEq, Eq)]
enum CommandOutcome {
    Continue,
    Quit,
}

/// REPL session that maintains interpreter state and handles user interaction
pub struct Repl {
    interpreter: Interpreter,
    editor: DefaultEditor,
}

impl Repl {
    /// Creates a new REPL session with a fresh interpreter
    pub fn new(config: InterpreterConfig) -> Result<Self, ReadlineError> {
        let editor = DefaultEditor::new()?;
        Ok(Repl { interpreter: Interpreter::with_config(config), editor })
    }

    /// Displays the welcome banner with version and help information
    fn show_banner(&self) {
        println!(
            "{} {}",
            "Kat REPL".bright_cyan().bold(),
            format!("v{}", env!("CARGO_PKG_VERSION")).bright_cyan()
        );
        println!(
            "  Type {} for commands or {} to exit",
            ":help".bright_yellow(),
            ":quit".bright_yellow()
        );
        println!();
    }

    /// Starts the REPL loop
    pub fn run(&mut self) -> Result<(), ReadlineError> {
        self.show_banner();

        let mut buffer = String::new();

        loop {
            let prompt = if buffer.is_empty() { "kat> " } else { "...> " };

            match self.editor.readline(prompt) {
                Ok(line) => {
                    let _ = self.editor.add_history_entry(line.as_str());

                    // Commands are only recognised outside multi-line input
                    if buffer.is_empty() && line.trim().starts_with(':') {
                        if self.handle_command(line.trim()) == CommandOutcome::Quit {
                            break;
                        }
                        continue;
                    }

                    buffer.push_str(&line);
                    buffer.push('\n');

                    if is_input_complete(&buffer) {
                        self.eval_input(&buffer);
                        buffer.clear();
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("{}", "^C (:quit to exit)".bright_yellow());
                    buffer.clear();
                }
                Err(ReadlineError::Eof) => {
                    println!("{}", "Goodbye!".bright_cyan());
                    break;
                }
                Err(err) => return Err(err),
            }
        }

        Ok(())
    }

    /// Handles special REPL commands starting with ':'
    fn handle_command(&mut self, cmd: &str) -> CommandOutcome {
        match cmd {
            ":help" | ":h" => self.show_help(),
            ":quit" | ":q" | ":exit" => {
                println!("{}", "Goodbye!".bright_cyan());
                return CommandOutcome::Quit;
            }
            ":clear" | ":c" => {
                print!("\x1B[2J\x1B[1;1H");
                self.show_banner();
            }
            ":vars" | ":v" => self.show_variables(),
            ":reset" | ":r" => {
                self.interpreter.reset();
                println!("{}", "Environment reset".bright_green());
            }
            _ => println!(
                "{} Unknown command: {}. Type {} for available commands.",
                "Error:".bright_red(),
                cmd.bright_yellow(),
                ":help".bright_yellow()
            ),
        }
        CommandOutcome::Continue
    }

    /// Displays help information about available commands
    fn show_help(&self) {
        println!();
        println!("{}", "REPL Commands:".bright_cyan().bold());
        println!("  {}  Display this help message", ":help  :h".bright_yellow());
        println!("  {}  Exit the REPL", ":quit  :q".bright_yellow());
        println!("  {}  Clear the screen", ":clear :c".bright_yellow());
        println!("  {}  Show global bindings", ":vars  :v".bright_yellow());
        println!("  {}  Reset the environment", ":reset :r".bright_yellow());
        println!();
        println!("{}", "Multi-line Input:".bright_cyan().bold());
        println!("  Leave braces, brackets, or parentheses unclosed to continue");
        println!("  on the next line. Close them to execute the input.");
        println!();
        println!("{}", "Example:".bright_cyan().bold());
        println!("  {}", "kat> fn add(a, b) {".dimmed());
        println!("  {}", "...>   return a + b".dimmed());
        println!("  {}", "...> }".dimmed());
        println!("  {}", "kat> add(2, 3)".dimmed());
        println!();
    }

    /// Displays every global binding with its value
    fn show_variables(&self) {
        let names = self.interpreter.env.local_names();
        if names.is_empty() {
            println!("  {}", "(no bindings)".dimmed());
            return;
        }
        for name in names {
            if let Some(value) = self.interpreter.env.get(&name) {
                println!("  {} = {}", name.bright_yellow(), format_value(&value));
            }
        }
    }

    /// Evaluates the input code and displays the result
    fn eval_input(&mut self, input: &str) {
        if input.trim().is_empty() {
            return;
        }

        match self.interpreter.run(input) {
            Ok(Value::Error(message)) => print!("{}", self.interpreter.error_report(message, input)),
            Ok(Value::Null) => {}
            Ok(value) => println!("{} {}", "=>".bright_blue(), format_value(&value)),
            Err(parse_error) => print!("{}", KatError::from(parse_error).with_source_from(input)),
        }
    }
}

/// Formats a value for display, quoting strings so they stand out
fn format_value(value: &Value) -> String {
    match value {
        Value::Str(s) => format!("{:?}", s.as_str()).bright_green().to_string(),
        Value::Int(_) | Value::Float(_) => value.to_string().bright_white().to_string(),
        Value::Bool(_) => value.to_string().bright_magenta().to_string(),
        Value::Function(_)
        | Value::WrapperFunction(_)
        | Value::Module(_)
        | Value::StructType(_) => {
            value.to_string().bright_cyan().to_string()
        }
        _ => value.to_string(),
    }
}

/// Checks if the input is syntactically complete
/// Returns true if all brackets/braces/parentheses are balanced outside strings
pub fn is_input_complete(input: &str) -> bool {
    let mut depth: i64 = 0;
    let mut in_string = false;
    let mut escape_next = false;

    for ch in input.chars() {
        if escape_next {
            escape_next = false;
            continue;
        }
        match ch {
            '\\' if in_string => escape_next = true,
            '"' => in_string = !in_string,
            '{' | '[' | '(' if !in_string => depth += 1,
            '}' | ']' | ')' if !in_string => depth -= 1,
            _ => {}
        }
    }

    // Over-closed input is complete so the parser can report it
    !in_string && depth <= 0
}

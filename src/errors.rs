// File: src/errors.rs
//
// Error types for the Kat programming language.
// Parse errors are fatal and travel through `Result`; runtime failures are
// ordinary `Value::Error` values and only become a `KatError` when the CLI
// or REPL renders them with source context.

use colored::Colorize;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Source location information for tracking where code appears in a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }

    pub fn unknown() -> Self {
        Self { line: 0, column: 0 }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Fatal syntax errors raised while building the AST.
///
/// The parser stops at the first one; there is no recovery or
/// multi-error collection.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found} at line {}, column {}", .location.line, .location.column)]
    UnexpectedToken { expected: String, found: String, location: SourceLocation },

    #[error("could not parse token `{lexeme}` at line {}, column {}", .location.line, .location.column)]
    NoPrefixParselet { lexeme: String, location: SourceLocation },

    #[error("`{lexeme}` cannot follow an expression at line {}, column {}", .location.line, .location.column)]
    NoInfixParselet { lexeme: String, location: SourceLocation },

    #[error("invalid number literal `{lexeme}` at line {}, column {}", .location.line, .location.column)]
    InvalidNumber { lexeme: String, location: SourceLocation },

    #[error("invalid character `{lexeme}` at line {}, column {}", .location.line, .location.column)]
    InvalidCharacter { lexeme: String, location: SourceLocation },

    #[error("{message} at line {}, column {}", .location.line, .location.column)]
    InvalidSyntax { message: String, location: SourceLocation },
}

impl ParseError {
    pub fn location(&self) -> SourceLocation {
        match self {
            ParseError::UnexpectedToken { location, .. }
            | ParseError::NoPrefixParselet { location, .. }
            | ParseError::NoInfixParselet { location, .. }
            | ParseError::InvalidNumber { location, .. }
            | ParseError::InvalidCharacter { location, .. }
            | ParseError::InvalidSyntax { location, .. } => *location,
        }
    }
}

/// Types of errors that can be reported to the user
#[derive(Debug, Clone, PartialEq)]
pub enum ErrorKind {
    ParseError,
    RuntimeError,
    ModuleError,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ErrorKind::ParseError => write!(f, "Parse Error"),
            ErrorKind::RuntimeError => write!(f, "Runtime Error"),
            ErrorKind::ModuleError => write!(f, "Module Error"),
        }
    }
}

/// A renderable error with location information
#[derive(Debug, Clone)]
pub struct KatError {
    pub kind: ErrorKind,
    pub message: String,
    pub location: Option<SourceLocation>,
    pub file: Option<String>,
    pub source_line: Option<String>,
    pub help: Option<String>,
}

impl KatError {
    pub fn new(kind: ErrorKind, message: String, location: Option<SourceLocation>) -> Self {
        Self { kind, message, location, file: None, source_line: None, help: None }
    }

    pub fn with_file(mut self, file: String) -> Self {
        self.file = Some(file);
        self
    }

    pub fn with_source(mut self, source_line: String) -> Self {
        self.source_line = Some(source_line);
        self
    }

    pub fn with_help(mut self, help: String) -> Self {
        self.help = Some(help);
        self
    }

    /// Attach the offending line of `source`, if the location points into it
    pub fn with_source_from(self, source: &str) -> Self {
        let line = match self.location {
            Some(location) if location.line > 0 => location.line,
            _ => return self,
        };
        match source.lines().nth(line - 1) {
            Some(text) => self.with_source(text.to_string()),
            None => self,
        }
    }
}

impl From<ParseError> for KatError {
    fn from(err: ParseError) -> Self {
        let location = err.location();
        KatError::new(ErrorKind::ParseError, err.to_string(), Some(location))
    }
}

impl fmt::Display for KatError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let kind_str = format!("{}", self.kind);
        writeln!(f, "{}: {}", kind_str.red().bold(), self.message.bold())?;

        if let Some(location) = self.location {
            let location_str = match self.file {
                Some(ref file) => format!("  --> {}:{}", file, location),
                None => format!("  --> {}", location),
            };
            writeln!(f, "{}", location_str.bright_blue())?;

            if let Some(ref source) = self.source_line {
                writeln!(f, "   {}", "|".bright_blue())?;
                writeln!(
                    f,
                    "{} {} {}",
                    format!("{:3}", location.line).bright_blue(),
                    "|".bright_blue(),
                    source
                )?;
                writeln!(
                    f,
                    "   {} {}{}",
                    "|".bright_blue(),
                    " ".repeat(location.column.saturating_sub(1)),
                    "^".red().bold()
                )?;
                writeln!(f, "   {}", "|".bright_blue())?;
            }
        }

        if let Some(ref help) = self.help {
            writeln!(
                f,
                "   {} {}",
                "=".bright_yellow(),
                format!("help: {}", help).bright_yellow()
            )?;
        }

        Ok(())
    }
}

impl std::error::Error for KatError {}

/// Computes the Levenshtein distance between two strings
/// Used for "Did you mean?" suggestions
pub fn levenshtein_distance(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();

    if a.is_empty() {
        return b.len();
    }
    if b.is_empty() {
        return a.len();
    }

    // Single rolling row instead of the full matrix
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        current[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            current[j] = (previous[j] + 1).min(current[j - 1] + 1).min(previous[j - 1] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[b.len()]
}

/// Find the closest match from a list of candidates using Levenshtein distance
/// Returns None if no good match is found (distance > 2)
pub fn find_closest_match<'a>(target: &str, candidates: &'a [String]) -> Option<&'a str> {
    let mut best_match = None;
    let mut best_distance = usize::MAX;

    for candidate in candidates {
        if candidate == target {
            continue;
        }
        let distance = levenshtein_distance(target, candidate);
        if distance <= 2 && distance < best_distance {
            best_distance = distance;
            best_match = Some(candidate.as_str());
        }
    }

    best_match
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein_distance("count", "count"), 0);
        assert_eq!(levenshtein_distance("count", "cout"), 1);
        assert_eq!(levenshtein_distance("", "abc"), 3);
        assert_eq!(levenshtein_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_find_closest_match_ignores_distant_names() {
        let names = vec!["counter".to_string(), "total".to_string()];
        assert_eq!(find_closest_match("countr", &names), Some("counter"));
        assert_eq!(find_closest_match("zzz", &names), None);
    }

    #[test]
    fn test_parse_error_converts_with_location() {
        let err = ParseError::NoPrefixParselet {
            lexeme: ")".to_string(),
            location: SourceLocation::new(2, 7),
        };
        let kat_error = KatError::from(err).with_source_from("let a = 1\nlet b = )\n");
        assert_eq!(kat_error.kind, ErrorKind::ParseError);
        assert_eq!(kat_error.location, Some(SourceLocation::new(2, 7)));
        assert_eq!(kat_error.source_line.as_deref(), Some("let b = )"));
        assert!(kat_error.message.contains("line 2, column 7"));
    }
}

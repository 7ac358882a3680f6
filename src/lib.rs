// File: src/lib.rs
//
// Library interface for the Kat interpreter.
// Exposes modules for integration testing and external use.

pub mod ast;
pub mod errors;
pub mod interpreter;
pub mod lexer;
pub mod module;
pub mod parser;
pub mod printer;
pub mod repl;
pub mod snapshots;

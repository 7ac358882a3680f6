// File: src/interpreter/native_functions/io.rs
//
// Line input and file output functions of the `io` package.

use super::expect_arity;
use crate::interpreter::value::NativePackage;
use crate::interpreter::{Interpreter, Value};
use std::fs::{self, OpenOptions};
use std::io::Write;

pub fn package() -> NativePackage {
    let mut package = NativePackage::new("io");
    package.register("read_line", read_line);
    package.register("write_to_file", write_to_file);
    package.register("append_to_file", append_to_file);
    package
}

/// Reads one line without its terminator; `null` at end of input
fn read_line(interp: &mut Interpreter, arg_values: &[Value]) -> Value {
    if let Some(err) = expect_arity("read_line", arg_values, 0) {
        return err;
    }
    match interp.read_line() {
        Ok(Some(line)) => Value::str(line),
        Ok(None) => Value::Null,
        Err(e) => Value::Error(format!("read_line: {}", e)),
    }
}

/// Validates `(path, content)`; content may be any value and is written in
/// its display form
fn path_and_content(name: &str, arg_values: &[Value]) -> Result<(String, String), Value> {
    if let Some(err) = expect_arity(name, arg_values, 2) {
        return Err(err);
    }
    match &arg_values[0] {
        Value::Str(path) => Ok((path.to_string(), arg_values[1].to_string())),
        other => Err(Value::Error(format!(
            "{} expects a string path, got {}",
            name,
            other.type_name()
        ))),
    }
}

fn write_to_file(_interp: &mut Interpreter, arg_values: &[Value]) -> Value {
    let (path, content) = match path_and_content("write_to_file", arg_values) {
        Ok(args) => args,
        Err(err) => return err,
    };
    match fs::write(&path, content) {
        Ok(()) => Value::Null,
        Err(e) => Value::Error(format!("write_to_file: cannot write {}: {}", path, e)),
    }
}

fn append_to_file(_interp: &mut Interpreter, arg_values: &[Value]) -> Value {
    let (path, content) = match path_and_content("append_to_file", arg_values) {
        Ok(args) => args,
        Err(err) => return err,
    };
    let result = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .and_then(|mut file| file.write_all(content.as_bytes()));
    match result {
        Ok(()) => Value::Null,
        Err(e) => Value::Error(format!("append_to_file: cannot write {}: {}", path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

    fn scratch_file() -> PathBuf {
        let id = NEXT_FILE.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!("kat_io_tests_{}_{}.txt", std::process::id(), id))
    }

    #[test]
    fn test_read_line_strips_terminator_and_reports_eof() {
        let mut interp = Interpreter::new();
        interp.set_input(Box::new(Cursor::new("first\r\nsecond")));
        assert!(matches!(read_line(&mut interp, &[]), Value::Str(ref s) if s.as_str() == "first"));
        assert!(matches!(read_line(&mut interp, &[]), Value::Str(ref s) if s.as_str() == "second"));
        assert!(matches!(read_line(&mut interp, &[]), Value::Null));
    }

    #[test]
    fn test_write_then_append() {
        let mut interp = Interpreter::new();
        let path = scratch_file();
        let path_value = Value::str(path.to_string_lossy().into_owned());

        let written = write_to_file(&mut interp, &[path_value.clone(), Value::str_ref("a\n")]);
        assert!(matches!(written, Value::Null));
        let appended = append_to_file(&mut interp, &[path_value, Value::Int(42)]);
        assert!(matches!(appended, Value::Null));

        assert_eq!(fs::read_to_string(&path).unwrap(), "a\n42");
        fs::remove_file(path).ok();
    }

    #[test]
    fn test_bad_arguments_are_errors() {
        let mut interp = Interpreter::new();
        assert!(matches!(write_to_file(&mut interp, &[Value::str_ref("x")]), Value::Error(_)));
        assert!(matches!(
            append_to_file(&mut interp, &[Value::Int(1), Value::Int(2)]),
            Value::Error(ref m) if m == "append_to_file expects a string path, got int"
        ));
    }
}

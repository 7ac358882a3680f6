// File: src/interpreter/native_functions/fmt.rs
//
// Formatting and printing functions of the `fmt` package
// (print, println, printf, sprintf).

use crate::interpreter::value::NativePackage;
use crate::interpreter::{Interpreter, Value};

pub fn package() -> NativePackage {
    let mut package = NativePackage::new("fmt");
    package.register("print", print);
    package.register("println", println);
    package.register("printf", printf);
    package.register("sprintf", sprintf);
    package
}

/// Writes the display form of every argument, concatenated
fn print(interp: &mut Interpreter, arg_values: &[Value]) -> Value {
    let text: String = arg_values.iter().map(Value::to_string).collect();
    interp.write_output(&text);
    Value::Null
}

/// Writes the arguments separated by spaces, followed by a newline
fn println(interp: &mut Interpreter, arg_values: &[Value]) -> Value {
    let parts: Vec<String> = arg_values.iter().map(Value::to_string).collect();
    interp.write_output(&format!("{}\n", parts.join(" ")));
    Value::Null
}

fn printf(interp: &mut Interpreter, arg_values: &[Value]) -> Value {
    match format_arguments("printf", arg_values) {
        Ok(text) => {
            interp.write_output(&text);
            Value::Null
        }
        Err(err) => err,
    }
}

fn sprintf(_interp: &mut Interpreter, arg_values: &[Value]) -> Value {
    match format_arguments("sprintf", arg_values) {
        Ok(text) => Value::str(text),
        Err(err) => err,
    }
}

fn format_arguments(name: &str, arg_values: &[Value]) -> Result<String, Value> {
    match arg_values.split_first() {
        Some((Value::Str(format), rest)) => Ok(format_directives(format, rest)),
        _ => Err(Value::Error(format!("{} expects a format string as its first argument", name))),
    }
}

/// Expands `%v %s %d %f` with the next argument and `%%` to a percent sign.
///
/// A directive without a matching argument renders as `%!<verb>(MISSING)`;
/// surplus arguments are ignored and unknown verbs are copied through.
pub fn format_directives(format: &str, arg_values: &[Value]) -> String {
    let mut out = String::with_capacity(format.len());
    let mut args = arg_values.iter();
    let mut chars = format.chars();

    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('%') => out.push('%'),
            Some(verb @ ('v' | 's' | 'd' | 'f')) => match args.next() {
                Some(arg) => out.push_str(&render(verb, arg)),
                None => {
                    out.push_str("%!");
                    out.push(verb);
                    out.push_str("(MISSING)");
                }
            },
            Some(other) => {
                out.push('%');
                out.push(other);
            }
            None => out.push('%'),
        }
    }

    out
}

fn render(verb: char, arg: &Value) -> String {
    match (verb, arg) {
        ('f', Value::Float(n)) => format!("{:.6}", n),
        ('f', Value::Int(n)) => format!("{:.6}", *n as f64),
        _ => arg.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directives_substitute_in_order() {
        let args = [Value::str_ref("kat"), Value::Int(3)];
        assert_eq!(format_directives("%s has %d lives", &args), "kat has 3 lives");
    }

    #[test]
    fn test_float_directive_uses_six_decimals() {
        assert_eq!(format_directives("%f", &[Value::Float(1.5)]), "1.500000");
        assert_eq!(format_directives("%v", &[Value::Float(1.5)]), "1.5");
    }

    #[test]
    fn test_percent_escape_and_missing_argument() {
        assert_eq!(format_directives("100%% %v", &[]), "100% %!v(MISSING)");
        assert_eq!(format_directives("%q %", &[]), "%q %");
    }

    #[test]
    fn test_sprintf_requires_format_string() {
        let mut interp = Interpreter::new();
        assert!(matches!(sprintf(&mut interp, &[Value::Int(1)]), Value::Error(_)));
        assert!(matches!(
            sprintf(&mut interp, &[Value::str_ref("%v-%v"), Value::Int(1), Value::Bool(true)]),
            Value::Str(ref s) if s.as_str() == "1-true"
        ));
    }
}

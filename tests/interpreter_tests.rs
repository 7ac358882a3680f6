// Integration tests for the Kat interpreter
//
// These tests verify the interpreter's behavior by running complete Kat programs
// and checking the results. Tests cover:
// - Operator precedence and the ternary operator
// - Variable declaration, assignment and scoping
// - Control flow (if/else chains, classic and condition-only loops)
// - Functions, methods and reference-shared struct instances
// - Error propagation and error messages
// - Module imports (native packages and .kat files)

use kat::interpreter::{Interpreter, InterpreterConfig, Value};
use kat::parser::parse;
use kat::snapshots;
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Runs `code` and returns the interpreter, the program's value and
/// everything it printed
fn run_with_config(code: &str, config: InterpreterConfig) -> (Interpreter, Value, String) {
    let mut interp = Interpreter::with_config(config);
    let output = Rc::new(RefCell::new(Vec::new()));
    interp.set_output(Rc::clone(&output));
    let value = match interp.run(code) {
        Ok(value) => value,
        Err(err) => panic!("parse failed: {}", err),
    };
    let printed = String::from_utf8(output.borrow().clone()).unwrap();
    (interp, value, printed)
}

fn run_code(code: &str) -> (Interpreter, Value, String) {
    run_with_config(code, InterpreterConfig::default())
}

fn output_of(code: &str) -> String {
    let (_, value, printed) = run_code(code);
    assert!(!value.is_error(), "unexpected error: {:?}", value);
    printed
}

fn error_of(code: &str) -> String {
    match run_code(code).1 {
        Value::Error(message) => message,
        other => panic!("expected an error, got {:?}", other),
    }
}

fn scratch_dir() -> PathBuf {
    static NEXT_DIR: AtomicU64 = AtomicU64::new(1);
    let dir = std::env::temp_dir().join(format!(
        "kat_integration_{}_{}",
        std::process::id(),
        NEXT_DIR.fetch_add(1, Ordering::Relaxed)
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn config_with_path(dir: &PathBuf) -> InterpreterConfig {
    InterpreterConfig { search_paths: vec![dir.clone()], ..Default::default() }
}

#[test]
fn test_operator_precedence() {
    let printed = output_of(
        "let fmt = import(\"fmt\")\n\
         fmt.println(2 + 3 * 4)\n\
         fmt.println((2 + 3) * 4)\n\
         fmt.println(1 < 2 ? 1 : 0)\n\
         fmt.println(-2 * 3, !true, 10 - 4 - 3)",
    );
    assert_eq!(printed, "14\n20\n1\n-6 false 3\n");
}

#[test]
fn test_assignment_is_right_associative() {
    let (interp, value, _) = run_code("let a = 0\nlet b = 0\na = b = 7");
    assert!(matches!(value, Value::Int(7)));
    assert!(matches!(interp.env.get("a"), Some(Value::Int(7))));
    assert!(matches!(interp.env.get("b"), Some(Value::Int(7))));
}

#[test]
fn test_nested_ternary_groups_to_the_right() {
    let (_, value, _) = run_code("let x = 5\nx < 3 ? 1 : x < 10 ? 2 : 3");
    assert!(matches!(value, Value::Int(2)));
}

#[test]
fn test_inner_assignment_updates_owning_frame() {
    let printed = output_of(
        "let fmt = import(\"fmt\")\n\
         let count = 1\n\
         {\n  count = count + 1\n}\n\
         fmt.println(count)",
    );
    assert_eq!(printed, "2\n");
}

#[test]
fn test_shadowing_in_block_leaves_outer_binding() {
    let printed = output_of(
        "let fmt = import(\"fmt\")\n\
         let x = 1\n\
         {\n  let x = 2\n  fmt.println(x)\n}\n\
         fmt.println(x)",
    );
    assert_eq!(printed, "2\n1\n");
}

#[test]
fn test_assignment_to_undeclared_variable_is_an_error() {
    assert_eq!(error_of("y = 3"), "Variable y is not found");
}

#[test]
fn test_redeclaration_in_same_frame_is_rejected() {
    assert_eq!(error_of("let a = 1\nlet a = 2"), "Variable a already exists");
    assert_eq!(error_of("let a = 1\nconst a = 2"), "Constant a already exists");
    assert_eq!(error_of("struct S { a }\nfn S() {}"), "Symbol S already exists");
}

#[test]
fn test_constants_can_be_reassigned() {
    let (_, value, _) = run_code("const limit = 1\nlimit = 2\nlimit");
    assert!(matches!(value, Value::Int(2)));
}

#[test]
fn test_struct_instances_are_shared_by_reference() {
    let printed = output_of(
        "let fmt = import(\"fmt\")\n\
         struct Point { x, y }\n\
         fn Point.setX(self, v) {\n  self.x = v\n}\n\
         let p = Point { x: 1, y: 2 }\n\
         let q = p\n\
         q.setX(10)\n\
         fmt.println(p.x, p == q)\n\
         fmt.println(p)",
    );
    assert_eq!(printed, "10 true\nPoint { x: 10, y: 2 }\n");
}

#[test]
fn test_struct_literal_may_supply_a_subset_of_fields() {
    let printed = output_of(
        "let fmt = import(\"fmt\")\n\
         struct Point { x, y }\n\
         let p = Point { y: 5 }\n\
         fmt.println(p)\n\
         p.x = 1\n\
         fmt.println(p)",
    );
    assert_eq!(printed, "Point { y: 5 }\nPoint { x: 1, y: 5 }\n");
}

#[test]
fn test_struct_field_errors() {
    assert_eq!(
        error_of("struct Point { x }\nPoint { z: 1 }"),
        "Unknown field z on Point"
    );
    assert_eq!(error_of("struct Point { x, y }\nlet p = Point { x: 1 }\np.y"), "Field y is not set on Point");
    assert_eq!(error_of("Missing { a: 1 }"), "Struct Missing is not found");
}

#[test]
fn test_method_reads_fields_through_self() {
    let (_, value, _) = run_code(
        "struct Counter { n }\n\
         fn Counter.next(self) {\n  self.n = self.n + 1\n  return self.n\n}\n\
         let c = Counter { n: 0 }\n\
         c.next()\n\
         c.next()",
    );
    assert!(matches!(value, Value::Int(2)));
}

#[test]
fn test_missing_arguments_are_an_error_and_extra_ones_ignored() {
    let (_, value, _) = run_code("fn add(a, b) { return a + b }\nadd(1, 2, 3)");
    assert!(matches!(value, Value::Int(3)));
    assert_eq!(
        error_of("fn add(a, b) { return a + b }\nadd(1)"),
        "Function add expects 2 arguments, got 1"
    );
}

#[test]
fn test_function_sees_call_site_frame() {
    let (_, value, _) = run_code(
        "fn read() { return secret }\n\
         fn outer() {\n  let secret = 42\n  return read()\n}\n\
         outer()",
    );
    assert!(matches!(value, Value::Int(42)));
}

#[test]
fn test_first_error_stops_the_program() {
    let (interp, value, printed) = run_code(
        "let fmt = import(\"fmt\")\n\
         fmt.println(\"start\")\n\
         let x = [1, 2][5]\n\
         fmt.println(\"unreachable\")",
    );
    assert!(value.is_error());
    assert_eq!(printed, "start\n");
    assert!(interp.env.get("x").is_none());
}

#[test]
fn test_errors_inside_calls_propagate_unchanged() {
    assert_eq!(
        error_of("fn inner() { return 1 / 0 }\nfn outer() { return inner() + 1 }\nouter()"),
        "Division by zero"
    );
}

#[test]
fn test_classic_for_counts_and_keeps_counter_local() {
    let (interp, value, printed) = run_code(
        "let fmt = import(\"fmt\")\n\
         let total = 0\n\
         for let i = 0; i < 3; i++ {\n  total = total + i\n  fmt.print(i)\n}\n\
         total",
    );
    assert!(matches!(value, Value::Int(3)));
    assert_eq!(printed, "012");
    assert!(interp.env.get("i").is_none());
}

#[test]
fn test_modern_for_uses_outer_counter() {
    let (interp, _, _) = run_code("let i = 0\nfor i < 3 {\n  let j = i\n  i++\n}");
    assert!(matches!(interp.env.get("i"), Some(Value::Int(3))));
    assert!(interp.env.get("j").is_none());
}

#[test]
fn test_return_inside_loop_leaves_function() {
    let (_, value, _) = run_code(
        "fn first_over(limit) {\n\
           for let i = 0; i < 100; i++ {\n\
             if i * i > limit {\n      return i\n    }\n\
           }\n\
           return -1\n\
         }\n\
         first_over(50)",
    );
    assert!(matches!(value, Value::Int(8)));
}

#[test]
fn test_else_if_chain() {
    let printed = output_of(
        "let fmt = import(\"fmt\")\n\
         fn sign(n) {\n\
           if n < 0 {\n    return \"negative\"\n  } else if n == 0 {\n    return \"zero\"\n  } else {\n    return \"positive\"\n  }\n\
         }\n\
         fmt.println(sign(-4), sign(0), sign(9))",
    );
    assert_eq!(printed, "negative zero positive\n");
}

#[test]
fn test_member_access_on_null_yields_null() {
    let (_, value, _) = run_code("fn nothing() { }\nlet n = nothing()\nn.field");
    assert!(matches!(value, Value::Null));
}

#[test]
fn test_arrays_maps_and_strings_index() {
    let printed = output_of(
        "let fmt = import(\"fmt\")\n\
         let xs = [1, \"two\", [3]]\n\
         let m = {name: \"kat\", \"age\": 3}\n\
         fmt.println(xs[1], xs[2][0], m[\"name\"], \"abc\"[2])\n\
         fmt.println(m)",
    );
    assert_eq!(printed, "two 3 kat c\n{age: 3, name: kat}\n");
}

#[test]
fn test_fmt_package_functions() {
    let printed = output_of(
        "let fmt = import(\"fmt\")\n\
         fmt.print(\"a\", 1)\n\
         fmt.printf(\"|%s=%d|\", \"n\", 4)\n\
         let s = fmt.sprintf(\"%f%%\", 2.5)\n\
         fmt.println(s)",
    );
    assert_eq!(printed, "a1|n=4|2.500000%\n");
}

#[test]
fn test_unknown_module_member_is_an_error() {
    assert_eq!(error_of("let fmt = import(\"fmt\")\nfmt.shout(1)"), "Symbol fmt.shout is not found");
    assert_eq!(error_of("import(\"no_such_module\")"), "Module not found: no_such_module");
}

#[test]
fn test_source_module_import() {
    let dir = scratch_dir();
    fs::write(
        dir.join("geometry.kat"),
        "struct Square { side }\nfn area(s) { return s.side * s.side }\nlet unit = 1\n",
    )
    .unwrap();

    // Struct literals need a bare type name, so the type is rebound first
    let (_, value, _) = run_with_config(
        "let geometry = import(\"geometry\")\n\
         let Square = geometry.Square\n\
         let sq = Square { side: 3 }\n\
         geometry.area(sq) + geometry.unit",
        config_with_path(&dir),
    );
    assert!(matches!(value, Value::Int(10)), "got {:?}", value);
    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_repeated_import_returns_cached_module() {
    let dir = scratch_dir();
    fs::write(dir.join("counter.kat"), "let fmt = import(\"fmt\")\nfmt.println(\"loaded\")\n").unwrap();

    let (_, value, printed) = run_with_config(
        "let a = import(\"counter\")\nlet b = import(\"counter\")\na == b",
        config_with_path(&dir),
    );
    assert!(matches!(value, Value::Bool(true)));
    assert_eq!(printed, "loaded\n");

    let (_, value, _) = run_code("import(\"fmt\") == import(\"fmt\")");
    assert!(matches!(value, Value::Bool(true)));
    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_circular_import_is_reported() {
    let dir = scratch_dir();
    fs::write(dir.join("ping.kat"), "let pong = import(\"pong\")\n").unwrap();
    fs::write(dir.join("pong.kat"), "let ping = import(\"ping\")\n").unwrap();

    let (_, value, _) = run_with_config("import(\"ping\")", config_with_path(&dir));
    match value {
        Value::Error(message) => {
            assert!(message.starts_with("Error in module ping"), "got {}", message);
            assert!(message.contains("Circular import detected: ping -> pong -> ping"), "got {}", message);
        }
        other => panic!("expected an error, got {:?}", other),
    }
    fs::remove_dir_all(dir).ok();
}

#[test]
fn test_call_depth_limit() {
    let config = InterpreterConfig { max_call_depth: 50, ..Default::default() };
    let (_, value, _) =
        run_with_config("fn down(n) { return down(n + 1) }\ndown(0)", config.clone());
    match value {
        Value::Error(message) => assert_eq!(message, "Maximum call depth of 50 exceeded"),
        other => panic!("expected an error, got {:?}", other),
    }

    let (_, value, _) = run_with_config(
        "fn fact(n) { return n < 2 ? 1 : n * fact(n - 1) }\nfact(10)",
        config,
    );
    assert!(matches!(value, Value::Int(3628800)));
}

#[test]
fn test_closures_as_values() {
    let (_, value, _) = run_code(
        "let twice = fn(f, x) { return f(f(x)) }\n\
         let inc = fn(n) { return n + 1 }\n\
         twice(inc, 5)",
    );
    assert!(matches!(value, Value::Int(7)));
}

#[test]
fn test_printed_program_reparses_to_same_text() {
    let source = "struct P { a, b }\n\
                  fn P.sum(self) { return self.a + self.b }\n\
                  let p = P { a: 1, b: 2 }\n\
                  for let i = 0; i < 2; i++ { p.a = p.a * 2 }\n\
                  if p.sum() > 3 { p.b-- } else { p.b = -1 }";
    let printed = parse(source).unwrap().to_string();
    let reprinted = parse(&printed).unwrap().to_string();
    assert_eq!(printed, reprinted);
}

#[test]
fn test_snapshot_scripts_match() {
    let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("scripts");
    let report = snapshots::run_all(&dir, false, &InterpreterConfig::default()).unwrap();
    assert!(report.total > 0);
    assert!(report.all_passed(), "failing scripts: {:?}", report.failures);
}

#[test]
fn test_default_depth_limit_holds_on_a_regular_thread() {
    let source = "fn down(n) {\n  if n == 0 {\n    return 0\n  }\n  return down(n - 1) + 1\n}\n";

    let (_, value, _) = run_code(&format!("{}down(999)", source));
    assert!(matches!(value, Value::Int(999)), "got {:?}", value);

    assert_eq!(
        error_of(&format!("{}down(1000)", source)),
        "Maximum call depth of 1000 exceeded"
    );
}

#[test]
fn test_methods_resolve_through_the_instance_type() {
    let (_, value, _) = run_code(
        "struct P { x }\n\
         fn P.get(self) { return self.x }\n\
         let p = P { x: 4 }\n\
         fn use(q) {\n  let P = 0\n  return q.get()\n}\n\
         use(p)",
    );
    assert!(matches!(value, Value::Int(4)), "got {:?}", value);
}

#[test]
fn test_struct_type_is_not_an_instance() {
    let declared = "struct Point { x }\nfn Point.setX(self, v) { self.x = v }\n";
    assert_eq!(
        error_of(&format!("{}Point.x", declared)),
        "Cannot access member x on struct type"
    );
    assert_eq!(
        error_of(&format!("{}Point.x = 1", declared)),
        "Cannot assign field x on struct type"
    );
    assert_eq!(
        error_of(&format!("{}Point.setX(1)", declared)),
        "Cannot access member setX on struct type"
    );
    assert_eq!(output_of("let fmt = import(\"fmt\")\nstruct Point { x }\nfmt.println(Point)"), "<struct Point>\n");
}

#[test]
fn test_call_and_member_errors() {
    assert_eq!(error_of("let x = 1\nx(2)"), "Cannot call x of type int");
    assert_eq!(error_of("let n = 1\nn.f = 2"), "Cannot assign field f on int");
    assert_eq!(
        error_of("struct P { x }\nlet p = P { x: 1 }\np.z = 1"),
        "Unknown field z on P"
    );
    assert_eq!(error_of("undefined_var + 1"), "Variable undefined_var is not found");
}

#[test]
fn test_method_declaration_errors() {
    assert_eq!(
        error_of("struct P { x }\nfn P.m(self) { }\nfn P.m(self) { }"),
        "Symbol P.m already exists"
    );
    assert_eq!(error_of("struct P { x }\nfn P.x(self) { }"), "Symbol P.x already exists");
    assert_eq!(error_of("fn Q.m(self) { }"), "Struct Q is not found");
    assert_eq!(
        error_of("struct P { x }\nfn P.get(self) { return self.x }\nlet p = P { x: 1 }\nlet g = p.get\ng()"),
        "Method g called without a receiver"
    );
}

#[test]
fn test_integer_division_overflow_is_an_error() {
    assert_eq!(
        error_of("let m = -9223372036854775807 - 1\nm / -1"),
        "Integer overflow in division"
    );
}

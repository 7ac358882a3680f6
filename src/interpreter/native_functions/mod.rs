// File: src/interpreter/native_functions/mod.rs
//
// Native (bridge) packages reachable through `import`.
// Each package module builds a name -> callable table; the tables are
// registered once per process and never change afterwards.

pub mod fmt;
pub mod io;

use super::value::{NativeFunction, NativePackage};
use super::{Interpreter, Value};
use ahash::AHashMap;
use once_cell::sync::Lazy;

static PACKAGES: Lazy<AHashMap<&'static str, NativePackage>> = Lazy::new(|| {
    [fmt::package(), io::package()].into_iter().map(|package| (package.name, package)).collect()
});

/// Looks up a native package by import name
pub fn package(name: &str) -> Option<&'static NativePackage> {
    PACKAGES.get(name)
}

/// Names of every registered package, sorted
pub fn package_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = PACKAGES.keys().copied().collect();
    names.sort_unstable();
    names
}

/// Invokes a native function with already-evaluated arguments
pub fn call_native_function(
    interp: &mut Interpreter,
    native: &NativeFunction,
    arg_values: &[Value],
) -> Value {
    (native.func)(interp, arg_values)
}

/// Shared argument check: exactly `expected` arguments
pub(crate) fn expect_arity(name: &str, arg_values: &[Value], expected: usize) -> Option<Value> {
    if arg_values.len() == expected {
        return None;
    }
    Some(Value::Error(format!(
        "{} expects {} arguments, got {}",
        name,
        expected,
        arg_values.len()
    )))
}

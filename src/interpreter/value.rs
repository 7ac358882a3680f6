// File: src/interpreter/value.rs
//
// Runtime value types for the Kat programming language.
// Defines all value types that can be represented and manipulated at runtime.

use crate::ast::Block;
use ahash::AHashMap;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use super::environment::Environment;
use super::Interpreter;

/// Signature shared by every native (bridge) function
pub type NativeFn = fn(&mut Interpreter, &[Value]) -> Value;

/// A named native callable registered by a native package
#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub func: NativeFn,
}

/// A native package: a fixed name -> callable table
pub struct NativePackage {
    pub name: &'static str,
    pub functions: AHashMap<&'static str, NativeFunction>,
}

impl NativePackage {
    pub fn new(name: &'static str) -> Self {
        NativePackage { name, functions: AHashMap::new() }
    }

    pub fn register(&mut self, name: &'static str, func: NativeFn) {
        self.functions.insert(name, NativeFunction { name, func });
    }

    /// Registered function names, sorted
    pub fn function_names(&self) -> Vec<&'static str> {
        let mut names: Vec<&'static str> = self.functions.keys().copied().collect();
        names.sort_unstable();
        names
    }

    pub fn get(&self, name: &str) -> Option<NativeFunction> {
        self.functions.get(name).copied()
    }
}

/// A user-defined function.
///
/// Functions carry no environment. The body runs in a fresh frame whose
/// parent is the environment at the call site.
pub struct FunctionValue {
    /// Positional parameters, with a leading `self` already stripped
    pub params: Vec<String>,
    /// The declaration's first parameter was `self`
    pub has_self: bool,
    pub body: Rc<Block>,
}

/// A declared struct type: its ordered field list and its method table.
///
/// Methods are attached after the declaration, so the table is mutable.
pub struct StructType {
    pub name: String,
    pub field_names: Vec<String>,
    pub methods: RefCell<AHashMap<String, Value>>,
}

impl StructType {
    pub fn new(name: String, field_names: Vec<String>) -> Self {
        StructType { name, field_names, methods: RefCell::new(AHashMap::new()) }
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_names.iter().any(|field| field == name)
    }

    pub fn method(&self, name: &str) -> Option<Value> {
        self.methods.borrow().get(name).cloned()
    }
}

/// A struct instance. It holds only the fields its literal supplied and
/// keeps its type for field checks and method lookup.
pub struct StructValue {
    pub ty: Rc<StructType>,
    pub fields: AHashMap<String, Value>,
}

impl StructValue {
    pub fn name(&self) -> &str {
        &self.ty.name
    }
}

/// What an `import` produced
pub enum Module {
    Native(&'static NativePackage),
    Source { name: String, env: Environment },
}

impl Module {
    pub fn name(&self) -> &str {
        match self {
            Module::Native(package) => package.name,
            Module::Source { name, .. } => name,
        }
    }
}

#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point number
    Float(f64),
    /// String value (reference-counted for cheap cloning)
    Str(Rc<String>),
    Array(Rc<Vec<Value>>),
    /// String-keyed map; iteration order is unspecified
    Map(Rc<AHashMap<String, Value>>),
    /// A `struct` declaration
    StructType(Rc<StructType>),
    /// Struct instance; every holder observes field mutations
    Struct(Rc<RefCell<StructValue>>),
    Function(Rc<FunctionValue>),
    WrapperFunction(NativeFunction),
    /// Names the binding a receiver currently lives under inside a method
    SelfRef(String),
    Module(Rc<Module>),
    /// Control signal; consumed at the nearest function boundary
    Return(Box<Value>),
    Error(String),
}

impl Value {
    /// Helper to create a Str value from a String
    pub fn str(s: String) -> Self {
        Value::Str(Rc::new(s))
    }

    /// Helper to create a Str value from a &str
    pub fn str_ref(s: &str) -> Self {
        Value::Str(Rc::new(s.to_string()))
    }

    /// Helper to create an Array value from a Vec<Value>
    pub fn array(vec: Vec<Value>) -> Self {
        Value::Array(Rc::new(vec))
    }

    /// Helper to create a Map value
    pub fn map(map: AHashMap<String, Value>) -> Self {
        Value::Map(Rc::new(map))
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Value::Error(_))
    }

    /// `Int` and `Float` are truthy when non-zero, `Bool` is itself and
    /// every other tag is false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Float(n) => *n != 0.0,
            Value::Bool(b) => *b,
            _ => false,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "string",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::StructType(_) => "struct type",
            Value::Struct(_) => "struct",
            Value::Function(_) => "function",
            Value::WrapperFunction(_) => "native function",
            Value::SelfRef(_) => "self",
            Value::Module(_) => "module",
            Value::Return(_) => "return",
            Value::Error(_) => "error",
        }
    }

    /// Equality as seen by `==` and `!=`.
    ///
    /// Primitives, arrays and maps compare structurally within the same tag;
    /// structs, functions and modules compare by identity. Different tags
    /// are never equal.
    pub fn equals(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.equals(y))
            }
            (Value::Map(a), Value::Map(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(key, x)| b.get(key).map_or(false, |y| x.equals(y)))
            }
            (Value::StructType(a), Value::StructType(b)) => Rc::ptr_eq(a, b),
            (Value::Struct(a), Value::Struct(b)) => Rc::ptr_eq(a, b),
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::WrapperFunction(a), Value::WrapperFunction(b)) => a.name == b.name,
            (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
            (Value::SelfRef(a), Value::SelfRef(b)) => a == b,
            _ => false,
        }
    }
}

// Display renders the user-facing form used by `fmt` and the REPL.
// Struct instances may reference themselves, so visited structs are tracked.
fn write_value(
    value: &Value,
    f: &mut fmt::Formatter<'_>,
    seen: &mut Vec<*const RefCell<StructValue>>,
) -> fmt::Result {
    match value {
        Value::Null => f.write_str("null"),
        Value::Bool(b) => write!(f, "{}", b),
        Value::Int(n) => write!(f, "{}", n),
        Value::Float(n) => write!(f, "{}", n),
        Value::Str(s) => f.write_str(s),
        Value::Array(elements) => {
            f.write_str("[")?;
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_value(element, f, seen)?;
            }
            f.write_str("]")
        }
        Value::Map(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            f.write_str("{")?;
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{}: ", key)?;
                if let Some(value) = map.get(key) {
                    write_value(value, f, seen)?;
                }
            }
            f.write_str("}")
        }
        Value::Struct(instance) => {
            let ptr = Rc::as_ptr(instance);
            if seen.contains(&ptr) {
                return f.write_str("<cycle>");
            }
            seen.push(ptr);
            let instance = instance.borrow();
            write!(f, "{} {{", instance.name())?;
            let mut first = true;
            for name in &instance.ty.field_names {
                if let Some(value) = instance.fields.get(name) {
                    f.write_str(if first { " " } else { ", " })?;
                    first = false;
                    write!(f, "{}: ", name)?;
                    write_value(value, f, seen)?;
                }
            }
            f.write_str(if first { "}" } else { " }" })?;
            seen.pop();
            Ok(())
        }
        Value::StructType(ty) => write!(f, "<struct {}>", ty.name),
        Value::Function(function) => {
            let mut params = Vec::with_capacity(function.params.len() + 1);
            if function.has_self {
                params.push("self");
            }
            params.extend(function.params.iter().map(String::as_str));
            write!(f, "<fn({})>", params.join(", "))
        }
        Value::WrapperFunction(native) => write!(f, "<native fn {}>", native.name),
        Value::SelfRef(name) => f.write_str(name),
        Value::Module(module) => write!(f, "<module {}>", module.name()),
        Value::Return(inner) => write_value(inner, f, seen),
        Value::Error(message) => write!(f, "Error: {}", message),
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_value(self, f, &mut Vec::new())
    }
}

// Manual Debug implementation for Value; never recurses into struct fields
impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({})", b),
            Value::Int(n) => write!(f, "Int({})", n),
            Value::Float(n) => write!(f, "Float({})", n),
            Value::Str(s) => write!(f, "Str({:?})", s.as_str()),
            Value::Array(elements) => f.debug_list().entries(elements.iter()).finish(),
            Value::Map(map) => write!(f, "Map{{{} keys}}", map.len()),
            Value::StructType(ty) => write!(f, "StructType({})", ty.name),
            Value::Struct(instance) => match instance.try_borrow() {
                Ok(instance) => write!(
                    f,
                    "Struct({}, {} fields)",
                    instance.name(),
                    instance.fields.len()
                ),
                Err(_) => write!(f, "Struct(<borrowed>)"),
            },
            Value::Function(function) => {
                write!(f, "Function({:?}, {} stmts)", function.params, function.body.body.len())
            }
            Value::WrapperFunction(native) => write!(f, "WrapperFunction({})", native.name),
            Value::SelfRef(name) => write!(f, "SelfRef({})", name),
            Value::Module(module) => write!(f, "Module({})", module.name()),
            Value::Return(v) => write!(f, "Return({:?})", v),
            Value::Error(e) => write!(f, "Error({})", e),
        }
    }
}

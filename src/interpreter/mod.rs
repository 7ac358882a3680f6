// File: src/interpreter/mod.rs
//
// Tree-walking interpreter for the Kat programming language.
// Executes Kat programs by traversing the Abstract Syntax Tree (AST).
//
// The interpreter threads an explicit environment (scope frame) through every
// evaluation step, evaluates expressions to produce values, and executes
// statements to perform actions. It supports:
// - let/const bindings, assignment and increment/decrement
// - Functions called against a fresh frame parented at the call site
// - Struct types, reference-shared instances and methods with a `self` receiver
// - Arrays, maps and index access
// - Control flow (if/else chains, classic and condition-only for loops, return)
// - Module imports (native packages and `.kat` source modules)
//
// Failures are ordinary `Value::Error` values. Every rule that evaluates a
// sub-expression checks for an error immediately and hands it back unchanged,
// so the first error ends evaluation. `Value::Return` travels the same way
// until a function boundary unwraps it.

pub mod environment;
pub mod native_functions;
pub mod stack;
pub mod value;

pub use environment::Environment;
pub use value::{FunctionValue, Module, NativeFunction, StructType, StructValue, Value};

use crate::ast::{BinaryOp, Block, Expr, FunctionTarget, PostfixOp, PrefixOp, Program, Stmt};
use crate::errors::{find_closest_match, ErrorKind, KatError, ParseError, SourceLocation};
use crate::lexer::Token;
use crate::module::ModuleLoader;
use crate::parser;
use ahash::AHashMap;
use stack::ensure_sufficient_stack;
use std::cell::RefCell;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::rc::Rc;
use tracing::{debug, trace};

pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/// Interpreter settings supplied by the embedding program
#[derive(Debug, Clone)]
pub struct InterpreterConfig {
    /// Deepest allowed chain of active user function calls
    pub max_call_depth: usize,
    /// Directories searched, in order, for `<name>.kat` source modules
    pub search_paths: Vec<PathBuf>,
}

impl Default for InterpreterConfig {
    fn default() -> Self {
        InterpreterConfig {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            search_paths: vec![PathBuf::from("."), PathBuf::from("./stdlib")],
        }
    }
}

/// Where the first error of a run was produced, plus an optional hint
#[derive(Debug, Clone)]
pub struct ErrorContext {
    pub location: SourceLocation,
    pub help: Option<String>,
}

/// Main interpreter that executes Kat programs
pub struct Interpreter {
    /// The global environment; lives as long as the interpreter
    pub env: Environment,
    config: InterpreterConfig,
    output: Option<Rc<RefCell<Vec<u8>>>>,
    input: Option<Box<dyn BufRead>>,
    pub source_file: Option<String>,
    pub module_loader: ModuleLoader,
    call_stack: Vec<String>, // Track function calls for stack traces
    last_error: Option<ErrorContext>,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    /// Creates a new interpreter with an empty global environment
    pub fn new() -> Self {
        Self::with_config(InterpreterConfig::default())
    }

    pub fn with_config(config: InterpreterConfig) -> Self {
        Interpreter {
            env: Environment::new(),
            module_loader: ModuleLoader::new(config.search_paths.clone()),
            config,
            output: None,
            input: None,
            source_file: None,
            call_stack: Vec::new(),
            last_error: None,
        }
    }

    /// Drops every global binding and cached module
    pub fn reset(&mut self) {
        self.env = Environment::new();
        self.module_loader.clear();
        self.call_stack.clear();
        self.last_error = None;
    }

    /// Sets the output sink for native print functions (used for testing)
    pub fn set_output(&mut self, output: Rc<RefCell<Vec<u8>>>) {
        self.output = Some(output);
    }

    /// Replaces stdin as the source for `io.read_line`
    pub fn set_input(&mut self, input: Box<dyn BufRead>) {
        self.input = Some(input);
    }

    /// Helper to write output to either the output buffer or stdout
    pub fn write_output(&mut self, text: &str) {
        match &self.output {
            Some(out) => out.borrow_mut().extend_from_slice(text.as_bytes()),
            None => {
                let mut stdout = io::stdout().lock();
                let _ = stdout.write_all(text.as_bytes());
                let _ = stdout.flush();
            }
        }
    }

    /// Reads one line from the configured input; `None` at end of input
    pub fn read_line(&mut self) -> io::Result<Option<String>> {
        let mut line = String::new();
        let read = match self.input.as_mut() {
            Some(input) => input.read_line(&mut line)?,
            None => io::stdin().lock().read_line(&mut line)?,
        };
        if read == 0 {
            return Ok(None);
        }
        while line.ends_with('\n') || line.ends_with('\r') {
            line.pop();
        }
        Ok(Some(line))
    }

    /// Source location of the first error produced by the last run
    pub fn last_error_location(&self) -> Option<SourceLocation> {
        self.last_error.as_ref().map(|context| context.location)
    }

    /// "Did you mean" hint attached to the first error of the last run
    pub fn last_error_help(&self) -> Option<&str> {
        self.last_error.as_ref().and_then(|context| context.help.as_deref())
    }

    /// Builds the diagnostic for an `Error` that ended a run of `source`:
    /// file name, first-error location, offending line and hint
    pub fn error_report(&self, message: String, source: &str) -> KatError {
        let kind = if is_module_failure(&message) {
            ErrorKind::ModuleError
        } else {
            ErrorKind::RuntimeError
        };
        let mut report = KatError::new(kind, message, self.last_error_location());
        if let Some(file) = &self.source_file {
            report = report.with_file(file.clone());
        }
        if let Some(help) = self.last_error_help() {
            report = report.with_help(help.to_string());
        }
        report.with_source_from(source)
    }

    /// Parses and evaluates `source` against the global environment
    pub fn run(&mut self, source: &str) -> Result<Value, ParseError> {
        let program = parser::parse(source)?;
        Ok(self.eval_program(&program))
    }

    /// Evaluates a whole program; a top-level `return` ends it early
    pub fn eval_program(&mut self, program: &Program) -> Value {
        self.last_error = None;
        self.call_stack.clear();
        let env = self.env.clone();
        match self.eval_statements(&program.body, &env) {
            Value::Return(value) => *value,
            other => other,
        }
    }

    fn record_error(&mut self, location: SourceLocation, help: Option<String>) {
        if self.last_error.is_none() {
            self.last_error = Some(ErrorContext { location, help });
        }
    }

    fn undefined_variable(&mut self, name: &str, token: &Token, env: &Environment) -> Value {
        let names = env.names();
        let help = find_closest_match(name, &names).map(|m| format!("did you mean `{}`?", m));
        self.record_error(token.location(), help);
        Value::Error(format!("Variable {} is not found", name))
    }

    // --- STATEMENTS ---

    /// Runs statements in order in `env`, stopping at the first `Return`
    /// or `Error`. Yields the last statement's value.
    pub fn eval_statements(&mut self, stmts: &[Stmt], env: &Environment) -> Value {
        let mut result = Value::Null;
        for stmt in stmts {
            result = self.eval_stmt(stmt, env);
            if matches!(result, Value::Return(_) | Value::Error(_)) {
                return result;
            }
        }
        result
    }

    /// Runs a block in a fresh child frame of `env`
    fn eval_scoped_block(&mut self, block: &Block, env: &Environment) -> Value {
        let scope = Environment::new_with_parent(env);
        self.eval_statements(&block.body, &scope)
    }

    /// Evaluates a single statement
    pub fn eval_stmt(&mut self, stmt: &Stmt, env: &Environment) -> Value {
        let value = ensure_sufficient_stack(|| self.eval_stmt_inner(stmt, env));
        if value.is_error() {
            self.record_error(stmt.token().location(), None);
        }
        value
    }

    fn eval_stmt_inner(&mut self, stmt: &Stmt, env: &Environment) -> Value {
        match stmt {
            Stmt::Expression { expr } => self.eval_expr(expr, env),

            Stmt::Let { target, value, .. } => self.eval_declaration("Variable", target, value, env),

            Stmt::Const { target, value, .. } => {
                self.eval_declaration("Constant", target, value, env)
            }

            Stmt::Struct { name, fields, .. } => {
                if env.contains_local(name) {
                    return Value::Error(format!("Symbol {} already exists", name));
                }
                let declared = StructType::new(name.clone(), fields.clone());
                env.set(name.clone(), Value::StructType(Rc::new(declared)));
                Value::Null
            }

            Stmt::Function { target, params, body, .. } => {
                let function = Self::make_function(params, body);
                match target {
                    FunctionTarget::Name(name) => {
                        if env.contains_local(name) {
                            return Value::Error(format!("Symbol {} already exists", name));
                        }
                        env.set(name.clone(), function);
                        Value::Null
                    }
                    FunctionTarget::Method { receiver, method } => {
                        self.declare_method(receiver, method, function, env)
                    }
                }
            }

            Stmt::Block(block) => self.eval_scoped_block(block, env),

            Stmt::If { condition, then_branch, else_branch, .. } => {
                let condition = self.eval_expr(condition, env);
                if condition.is_error() {
                    return condition;
                }
                if condition.is_truthy() {
                    self.eval_scoped_block(then_branch, env)
                } else if let Some(branch) = else_branch {
                    self.eval_stmt(branch, env)
                } else {
                    Value::Null
                }
            }

            Stmt::ClassicFor { init, condition, post, body, .. } => {
                // One frame for the whole loop; the body gets its own per iteration
                let loop_env = Environment::new_with_parent(env);
                let init = self.eval_stmt(init, &loop_env);
                if init.is_error() {
                    return init;
                }
                loop {
                    let check = self.eval_expr(condition, &loop_env);
                    if check.is_error() {
                        return check;
                    }
                    if !check.is_truthy() {
                        break;
                    }
                    let result = self.eval_scoped_block(body, &loop_env);
                    if matches!(result, Value::Return(_) | Value::Error(_)) {
                        return result;
                    }
                    let step = self.eval_expr(post, &loop_env);
                    if step.is_error() {
                        return step;
                    }
                }
                Value::Null
            }

            Stmt::ModernFor { condition, body, .. } => {
                loop {
                    let check = self.eval_expr(condition, env);
                    if check.is_error() {
                        return check;
                    }
                    if !check.is_truthy() {
                        break;
                    }
                    let result = self.eval_scoped_block(body, env);
                    if matches!(result, Value::Return(_) | Value::Error(_)) {
                        return result;
                    }
                }
                Value::Null
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.eval_expr(expr, env),
                    None => Value::Null,
                };
                if value.is_error() {
                    return value;
                }
                Value::Return(Box::new(value))
            }
        }
    }

    /// `let`/`const`: evaluate, reject a same-frame collision, bind locally
    fn eval_declaration(
        &mut self,
        kind: &str,
        target: &Expr,
        value: &Expr,
        env: &Environment,
    ) -> Value {
        let name = match target.as_identifier() {
            Some(name) => name,
            None => return Value::Error(format!("Invalid identifier: {}", target)),
        };
        let value = self.eval_expr(value, env);
        if value.is_error() {
            return value;
        }
        if env.contains_local(name) {
            return Value::Error(format!("{} {} already exists", kind, name));
        }
        env.set(name, value);
        Value::Null
    }

    fn make_function(params: &[String], body: &Rc<Block>) -> Value {
        let has_self = params.first().map_or(false, |first| first == "self");
        let params = if has_self { params[1..].to_vec() } else { params.to_vec() };
        Value::Function(Rc::new(FunctionValue { params, has_self, body: Rc::clone(body) }))
    }

    /// Attaches a method to an already-declared struct type
    fn declare_method(
        &mut self,
        receiver: &str,
        method: &str,
        function: Value,
        env: &Environment,
    ) -> Value {
        let declared = match env.get(receiver) {
            Some(Value::StructType(declared)) => declared,
            Some(other) => {
                return Value::Error(format!(
                    "Cannot declare method {} on {} of type {}",
                    method,
                    receiver,
                    other.type_name()
                ))
            }
            None => return Value::Error(format!("Struct {} is not found", receiver)),
        };
        let mut methods = declared.methods.borrow_mut();
        if methods.contains_key(method) || declared.has_field(method) {
            return Value::Error(format!("Symbol {}.{} already exists", receiver, method));
        }
        methods.insert(method.to_string(), function);
        Value::Null
    }

    // --- EXPRESSIONS ---

    /// Evaluates an expression and returns its value
    pub fn eval_expr(&mut self, expr: &Expr, env: &Environment) -> Value {
        let value = ensure_sufficient_stack(|| self.eval_expr_inner(expr, env));
        if value.is_error() {
            self.record_error(expr.token().location(), None);
        }
        value
    }

    fn eval_expr_inner(&mut self, expr: &Expr, env: &Environment) -> Value {
        match expr {
            Expr::Integer { value, .. } => Value::Int(*value),
            Expr::Float { value, .. } => Value::Float(*value),
            Expr::Boolean { value, .. } => Value::Bool(*value),
            Expr::Str { value, .. } => Value::str_ref(value),

            Expr::Identifier { token, name } => match env.get(name) {
                Some(value) => value,
                None => self.undefined_variable(name, token, env),
            },

            Expr::SelfRef { .. } => match env.get("self") {
                Some(value) => value,
                None => Value::Error("self is only available inside a method".to_string()),
            },

            Expr::Prefix { op, right, .. } => match op {
                PrefixOp::Negate => match self.eval_expr(right, env) {
                    Value::Int(n) => Value::Int(n.wrapping_neg()),
                    Value::Float(n) => Value::Float(-n),
                    Value::Error(e) => Value::Error(e),
                    other => Value::Error(format!(
                        "Unsupported operator: - for type {}",
                        other.type_name()
                    )),
                },
                PrefixOp::Not => match self.eval_expr(right, env) {
                    Value::Error(e) => Value::Error(e),
                    other => Value::Bool(!other.is_truthy()),
                },
                PrefixOp::Increment => self.step_variable(right, 1, true, op.symbol(), env),
                PrefixOp::Decrement => self.step_variable(right, -1, true, op.symbol(), env),
            },

            Expr::Postfix { op, left, .. } => match op {
                PostfixOp::Increment => self.step_variable(left, 1, false, op.symbol(), env),
                PostfixOp::Decrement => self.step_variable(left, -1, false, op.symbol(), env),
            },

            Expr::Binary { op: BinaryOp::Assign, left, right, .. } => {
                self.eval_assign(left, right, env)
            }

            Expr::Binary { op: BinaryOp::Member, left, right, .. } => {
                let member = match right.as_identifier() {
                    Some(member) => member,
                    None => return Value::Error(format!("Invalid member name: {}", right)),
                };
                let receiver = self.eval_receiver(left, env);
                match receiver {
                    Value::Error(_) => receiver,
                    // Member access on null propagates null
                    Value::Null => Value::Null,
                    receiver => self.member_of(&receiver, member, env),
                }
            }

            Expr::Binary { op, left, right, .. } => {
                let left = self.eval_expr(left, env);
                if left.is_error() {
                    return left;
                }
                let right = self.eval_expr(right, env);
                if right.is_error() {
                    return right;
                }
                Self::binary_op(*op, &left, &right)
            }

            Expr::Ternary { condition, then_arm, else_arm, .. } => {
                let condition = self.eval_expr(condition, env);
                if condition.is_error() {
                    return condition;
                }
                if condition.is_truthy() {
                    self.eval_expr(then_arm, env)
                } else {
                    self.eval_expr(else_arm, env)
                }
            }

            Expr::Array { elements, .. } => {
                let mut values = Vec::with_capacity(elements.len());
                for element in elements {
                    let value = self.eval_expr(element, env);
                    if value.is_error() {
                        return value;
                    }
                    values.push(value);
                }
                Value::array(values)
            }

            Expr::Map { entries, .. } => {
                let mut map = AHashMap::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = match key {
                        Expr::Identifier { name, .. } => name.clone(),
                        other => match self.eval_expr(other, env) {
                            Value::Str(s) => s.to_string(),
                            Value::Error(e) => return Value::Error(e),
                            other => {
                                return Value::Error(format!(
                                    "Map keys must be strings, got {}",
                                    other.type_name()
                                ))
                            }
                        },
                    };
                    let value = self.eval_expr(value, env);
                    if value.is_error() {
                        return value;
                    }
                    map.insert(key, value);
                }
                Value::map(map)
            }

            Expr::Index { left, index, .. } => {
                let left = self.eval_expr(left, env);
                if left.is_error() {
                    return left;
                }
                let index = self.eval_expr(index, env);
                if index.is_error() {
                    return index;
                }
                Self::index_value(&left, &index)
            }

            Expr::Call { callee, args, .. } => self.eval_call(callee, args, env),

            Expr::StructLiteral { name, fields, .. } => {
                self.eval_struct_literal(name, fields, env)
            }

            Expr::Function { params, body, .. } => Self::make_function(params, body),

            Expr::Import { path, .. } => match self.eval_expr(path, env) {
                Value::Str(name) => self.import_module(&name),
                Value::Error(e) => Value::Error(e),
                other => Value::Error(format!(
                    "import expects a string module name, got {}",
                    other.type_name()
                )),
            },
        }
    }

    /// `++`/`--` on a variable; writes through `assign` so the owning frame
    /// is updated. Prefix forms yield the new value, postfix the old one.
    fn step_variable(
        &mut self,
        target: &Expr,
        delta: i64,
        prefix: bool,
        symbol: &str,
        env: &Environment,
    ) -> Value {
        let (token, name) = match target {
            Expr::Identifier { token, name } => (token, name),
            other => return Value::Error(format!("Invalid identifier: {}", other)),
        };
        let current = match env.get(name) {
            Some(value) => value,
            None => return self.undefined_variable(name, token, env),
        };
        match current {
            Value::Int(n) => {
                let updated = n.wrapping_add(delta);
                env.assign(name, Value::Int(updated));
                Value::Int(if prefix { updated } else { n })
            }
            other => Value::Error(format!(
                "Unsupported operator: {} for type {}",
                symbol,
                other.type_name()
            )),
        }
    }

    fn eval_assign(&mut self, left: &Expr, right: &Expr, env: &Environment) -> Value {
        match left {
            Expr::Identifier { token, name } => {
                let value = self.eval_expr(right, env);
                if value.is_error() {
                    return value;
                }
                if !env.assign(name, value.clone()) {
                    return self.undefined_variable(name, token, env);
                }
                value
            }
            Expr::Binary { op: BinaryOp::Member, left: receiver, right: field, .. } => {
                let field = match field.as_identifier() {
                    Some(field) => field,
                    None => return Value::Error(format!("Invalid member name: {}", field)),
                };
                let receiver = match self.eval_receiver(receiver, env) {
                    Value::SelfRef(name) => match env.get(&name) {
                        Some(value) => value,
                        None => {
                            return Value::Error(
                                "self is only available inside a method".to_string(),
                            )
                        }
                    },
                    other => other,
                };
                let instance = match receiver {
                    Value::Struct(instance) => instance,
                    Value::Error(e) => return Value::Error(e),
                    other => {
                        return Value::Error(format!(
                            "Cannot assign field {} on {}",
                            field,
                            other.type_name()
                        ))
                    }
                };
                let value = self.eval_expr(right, env);
                if value.is_error() {
                    return value;
                }
                let mut instance = instance.borrow_mut();
                if !instance.ty.has_field(field) {
                    return Value::Error(format!("Unknown field {} on {}", field, instance.name()));
                }
                instance.fields.insert(field.to_string(), value.clone());
                value
            }
            other => Value::Error(format!("Invalid assignment target: {}", other)),
        }
    }

    /// The left side of `.`: the `self` keyword stays symbolic so member
    /// resolution can look the receiver up in the active frame
    fn eval_receiver(&mut self, expr: &Expr, env: &Environment) -> Value {
        match expr {
            Expr::SelfRef { .. } => Value::SelfRef("self".to_string()),
            other => self.eval_expr(other, env),
        }
    }

    /// Resolves `receiver.member`
    fn member_of(&self, receiver: &Value, member: &str, env: &Environment) -> Value {
        match receiver {
            Value::SelfRef(name) => match env.get(name) {
                Some(Value::Null) => Value::Null,
                Some(bound) => self.member_of(&bound, member, env),
                None => Value::Error("self is only available inside a method".to_string()),
            },
            Value::Struct(instance) => {
                let instance = instance.borrow();
                if let Some(value) = instance.fields.get(member) {
                    return value.clone();
                }
                if let Some(method) = instance.ty.method(member) {
                    return method;
                }
                if instance.ty.has_field(member) {
                    Value::Error(format!("Field {} is not set on {}", member, instance.name()))
                } else {
                    Value::Error(format!("Unknown field {} on {}", member, instance.name()))
                }
            }
            Value::Module(module) => {
                let found = match module.as_ref() {
                    Module::Native(package) => package.get(member).map(Value::WrapperFunction),
                    Module::Source { env: module_env, .. } => module_env.get(member),
                };
                found.unwrap_or_else(|| {
                    Value::Error(format!("Symbol {}.{} is not found", module.name(), member))
                })
            }
            Value::Null => Value::Null,
            other => Value::Error(format!(
                "Cannot access member {} on {}",
                member,
                other.type_name()
            )),
        }
    }

    fn eval_call(&mut self, callee: &Expr, args: &[Expr], env: &Environment) -> Value {
        // Receiver-qualified calls pass the receiver along for `self`
        let (function, receiver) = match callee {
            Expr::Binary { op: BinaryOp::Member, left, right, .. } => {
                let member = match right.as_identifier() {
                    Some(member) => member,
                    None => return Value::Error(format!("Invalid member name: {}", right)),
                };
                let receiver = match self.eval_receiver(left, env) {
                    Value::SelfRef(name) => match env.get(&name) {
                        Some(value) => value,
                        None => {
                            return Value::Error(
                                "self is only available inside a method".to_string(),
                            )
                        }
                    },
                    Value::Error(e) => return Value::Error(e),
                    other => other,
                };
                let function = self.member_of(&receiver, member, env);
                (function, Some(receiver))
            }
            other => (self.eval_expr(other, env), None),
        };
        if function.is_error() {
            return function;
        }

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            let value = self.eval_expr(arg, env);
            if value.is_error() {
                return value;
            }
            values.push(value);
        }

        let name = callee.to_string();
        self.call_function(&name, &function, values, receiver, env)
    }

    /// Invokes a callable value with already-evaluated arguments
    pub fn call_function(
        &mut self,
        name: &str,
        function: &Value,
        args: Vec<Value>,
        receiver: Option<Value>,
        env: &Environment,
    ) -> Value {
        match function {
            Value::WrapperFunction(native) => {
                trace!(function = native.name, args = args.len(), "native call");
                native_functions::call_native_function(self, native, &args)
            }
            Value::Function(function) => {
                if function.params.len() > args.len() {
                    return Value::Error(format!(
                        "Function {} expects {} arguments, got {}",
                        name,
                        function.params.len(),
                        args.len()
                    ));
                }
                if self.call_stack.len() >= self.config.max_call_depth {
                    return Value::Error(format!(
                        "Maximum call depth of {} exceeded",
                        self.config.max_call_depth
                    ));
                }

                let call_env = Environment::new_with_parent(env);
                if function.has_self {
                    match receiver {
                        Some(receiver) => call_env.set("self", receiver),
                        None => {
                            return Value::Error(format!("Method {} called without a receiver", name))
                        }
                    }
                }
                // Extra arguments are ignored
                for (param, value) in function.params.iter().zip(args) {
                    call_env.set(param.clone(), value);
                }

                trace!(function = name, depth = self.call_stack.len(), "call");
                self.call_stack.push(name.to_string());
                let result = self.eval_statements(&function.body.body, &call_env);
                self.call_stack.pop();

                match result {
                    Value::Return(value) => *value,
                    other => other,
                }
            }
            other => Value::Error(format!("Cannot call {} of type {}", name, other.type_name())),
        }
    }

    fn eval_struct_literal(
        &mut self,
        name: &str,
        fields: &[(String, Expr)],
        env: &Environment,
    ) -> Value {
        let ty = match env.get(name) {
            Some(Value::StructType(ty)) => ty,
            _ => return Value::Error(format!("Struct {} is not found", name)),
        };
        let mut values = AHashMap::with_capacity(fields.len());
        for (field, expr) in fields {
            if !ty.has_field(field) {
                return Value::Error(format!("Unknown field {} on {}", field, name));
            }
            let value = self.eval_expr(expr, env);
            if value.is_error() {
                return value;
            }
            values.insert(field.clone(), value);
        }
        // The instance holds exactly the supplied fields
        Value::Struct(Rc::new(RefCell::new(StructValue { ty, fields: values })))
    }

    fn index_value(left: &Value, index: &Value) -> Value {
        match (left, index) {
            (Value::Array(elements), Value::Int(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| elements.get(i).cloned())
                .unwrap_or_else(|| {
                    Value::Error(format!(
                        "Index {} out of bounds for array of length {}",
                        i,
                        elements.len()
                    ))
                }),
            (Value::Map(map), Value::Str(key)) => map
                .get(key.as_str())
                .cloned()
                .unwrap_or_else(|| Value::Error(format!("Key \"{}\" not found", key))),
            (Value::Str(s), Value::Int(i)) => usize::try_from(*i)
                .ok()
                .and_then(|i| s.chars().nth(i))
                .map(|ch| Value::str(ch.to_string()))
                .unwrap_or_else(|| {
                    Value::Error(format!(
                        "Index {} out of bounds for string of length {}",
                        i,
                        s.chars().count()
                    ))
                }),
            (left, index) => Value::Error(format!(
                "Cannot index {} with {}",
                left.type_name(),
                index.type_name()
            )),
        }
    }

    /// Arithmetic, comparison and equality on two evaluated operands
    fn binary_op(op: BinaryOp, left: &Value, right: &Value) -> Value {
        match op {
            BinaryOp::Equal => return Value::Bool(left.equals(right)),
            BinaryOp::NotEqual => return Value::Bool(!left.equals(right)),
            _ => {}
        }

        match (left, right) {
            (Value::Int(a), Value::Int(b)) => {
                let (a, b) = (*a, *b);
                match op {
                    BinaryOp::Add => Value::Int(a.wrapping_add(b)),
                    BinaryOp::Sub => Value::Int(a.wrapping_sub(b)),
                    BinaryOp::Mul => Value::Int(a.wrapping_mul(b)),
                    BinaryOp::Div if b == 0 => Value::Error("Division by zero".to_string()),
                    BinaryOp::Div => match a.checked_div(b) {
                        Some(n) => Value::Int(n),
                        None => Value::Error("Integer overflow in division".to_string()),
                    },
                    BinaryOp::Mod if b == 0 => Value::Error("Modulo by zero".to_string()),
                    BinaryOp::Mod => Value::Int(a.wrapping_rem(b)),
                    BinaryOp::Less => Value::Bool(a < b),
                    BinaryOp::Greater => Value::Bool(a > b),
                    BinaryOp::LessEqual => Value::Bool(a <= b),
                    BinaryOp::GreaterEqual => Value::Bool(a >= b),
                    _ => Self::invalid_operation(op, left, right),
                }
            }
            (Value::Float(a), Value::Float(b)) => {
                let (a, b) = (*a, *b);
                match op {
                    BinaryOp::Add => Value::Float(a + b),
                    BinaryOp::Sub => Value::Float(a - b),
                    BinaryOp::Mul => Value::Float(a * b),
                    BinaryOp::Div if b == 0.0 => Value::Error("Division by zero".to_string()),
                    BinaryOp::Div => Value::Float(a / b),
                    BinaryOp::Mod if b == 0.0 => Value::Error("Modulo by zero".to_string()),
                    BinaryOp::Mod => Value::Float(a % b),
                    BinaryOp::Less => Value::Bool(a < b),
                    BinaryOp::Greater => Value::Bool(a > b),
                    BinaryOp::LessEqual => Value::Bool(a <= b),
                    BinaryOp::GreaterEqual => Value::Bool(a >= b),
                    _ => Self::invalid_operation(op, left, right),
                }
            }
            (Value::Str(a), Value::Str(b)) if op == BinaryOp::Add => {
                let mut joined = String::with_capacity(a.len() + b.len());
                joined.push_str(a);
                joined.push_str(b);
                Value::str(joined)
            }
            _ => Self::invalid_operation(op, left, right),
        }
    }

    fn invalid_operation(op: BinaryOp, left: &Value, right: &Value) -> Value {
        Value::Error(format!(
            "Invalid operation: {} {} {}",
            left.type_name(),
            op.symbol(),
            right.type_name()
        ))
    }

    // --- MODULES ---

    /// Resolves `import(name)`: native packages first, then `.kat` files.
    /// Both kinds are cached, so repeated imports yield the same module.
    fn import_module(&mut self, name: &str) -> Value {
        if let Some(module) = self.module_loader.cached(name) {
            return Value::Module(module);
        }

        if let Some(package) = native_functions::package(name) {
            debug!(module = name, "importing native package");
            let module = Rc::new(Module::Native(package));
            self.module_loader.cache(name, Rc::clone(&module));
            return Value::Module(module);
        }

        let program = match self.module_loader.begin_loading(name) {
            Ok(program) => program,
            Err(err) => return Value::Error(err.to_string()),
        };

        // Modules run in their own global frame
        let module_env = Environment::new();
        let result = self.eval_statements(&program.body, &module_env);

        if let Value::Error(message) = result {
            self.module_loader.finish_loading(name, None);
            // Report the failure at the import site rather than inside the module
            self.last_error = None;
            return Value::Error(format!("Error in module {}: {}", name, message));
        }

        let module = Rc::new(Module::Source { name: name.to_string(), env: module_env });
        self.module_loader.finish_loading(name, Some(Rc::clone(&module)));
        Value::Module(module)
    }
}

fn is_module_failure(message: &str) -> bool {
    ["Module not found", "Circular import", "Error in module", "Failed to parse module"]
        .iter()
        .any(|prefix| message.starts_with(prefix))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> Value {
        let mut interp = Interpreter::new();
        interp.run(source).unwrap()
    }

    fn assert_error(value: Value, expected: &str) {
        match value {
            Value::Error(message) => assert_eq!(message, expected),
            other => panic!("expected error {:?}, got {:?}", expected, other),
        }
    }

    #[test]
    fn test_program_yields_last_statement_value() {
        assert!(matches!(eval("let a = 2\na * 21"), Value::Int(42)));
        assert!(matches!(eval(""), Value::Null));
    }

    #[test]
    fn test_integer_division_truncates() {
        assert!(matches!(eval("7 / 2"), Value::Int(3)));
        assert!(matches!(eval("-7 / 2"), Value::Int(-3)));
        assert!(matches!(eval("7 % 3"), Value::Int(1)));
    }

    #[test]
    fn test_division_by_zero_is_an_error() {
        assert_error(eval("1 / 0"), "Division by zero");
        assert_error(eval("1 % 0"), "Modulo by zero");
        assert_error(eval("1.0 / 0.0"), "Division by zero");
    }

    #[test]
    fn test_arithmetic_wraps_on_overflow() {
        assert!(matches!(eval("9223372036854775807 + 1"), Value::Int(i64::MIN)));
    }

    #[test]
    fn test_mixed_numeric_tags_are_rejected() {
        assert_error(eval("1 + 1.5"), "Invalid operation: int + float");
        assert_error(eval("\"a\" < \"b\""), "Invalid operation: string < string");
    }

    #[test]
    fn test_error_location_points_at_failing_expression() {
        let mut interp = Interpreter::new();
        let result = interp.run("let a = 1\nlet b = a + missing").unwrap();
        assert_error(result, "Variable missing is not found");
        assert_eq!(interp.last_error_location(), Some(SourceLocation::new(2, 13)));
    }

    #[test]
    fn test_undefined_variable_suggests_close_name() {
        let mut interp = Interpreter::new();
        let result = interp.run("let counter = 1\ncountr + 1").unwrap();
        assert!(result.is_error());
        assert_eq!(interp.last_error_help(), Some("did you mean `counter`?"));
    }

    #[test]
    fn test_error_report_carries_file_line_and_hint() {
        let mut interp = Interpreter::new();
        interp.source_file = Some("main.kat".to_string());
        let source = "let total = 1\ntotl + 1";
        let message = match interp.run(source).unwrap() {
            Value::Error(message) => message,
            other => panic!("expected an error, got {:?}", other),
        };
        let report = interp.error_report(message, source);
        assert_eq!(report.kind, ErrorKind::RuntimeError);
        assert_eq!(report.file.as_deref(), Some("main.kat"));
        assert_eq!(report.location, Some(SourceLocation::new(2, 1)));
        assert_eq!(report.source_line.as_deref(), Some("totl + 1"));
        assert_eq!(report.help.as_deref(), Some("did you mean `total`?"));
    }

    #[test]
    fn test_import_failures_are_module_errors() {
        let mut interp = Interpreter::new();
        let source = "import(\"nowhere\")";
        let message = match interp.run(source).unwrap() {
            Value::Error(message) => message,
            other => panic!("expected an error, got {:?}", other),
        };
        assert_eq!(interp.error_report(message, source).kind, ErrorKind::ModuleError);
    }

    #[test]
    fn test_reset_forgets_globals() {
        let mut interp = Interpreter::new();
        interp.run("let a = 1").unwrap();
        interp.reset();
        assert!(interp.run("a").unwrap().is_error());
    }
}

// File: src/interpreter/environment.rs
//
// Lexical scoping environment for variable management in the Kat interpreter.
// Implements a chain of scope frames where inner frames shadow outer frames.

use super::value::Value;
use ahash::AHashMap;
use std::cell::RefCell;
use std::rc::Rc;

/// One frame of bindings plus a link to the enclosing frame
#[derive(Debug, Default)]
pub struct Scope {
    bindings: AHashMap<String, Value>,
    parent: Option<Environment>,
}

/// Variable storage using lexical scoping
///
/// An Environment is a shared handle to a scope frame. Frames are created
/// for the global scope, for every function call, every block and every
/// loop; each child keeps its parent alive through the handle. Looking a
/// name up searches the innermost frame first and then walks the parent
/// chain, which implements shadowing.
///
/// Two write primitives exist and are deliberately different:
/// `set` always binds in this frame (declarations, shadowing allowed), while
/// `assign` finds the frame that already owns the name and mutates it there.
///
/// # Examples
///
/// ```
/// use kat::interpreter::environment::Environment;
/// use kat::interpreter::value::Value;
///
/// let global = Environment::new();
/// global.set("x", Value::Int(10));
///
/// let call = Environment::new_with_parent(&global);
/// call.set("x", Value::Int(20));                  // Shadows outer x
/// assert!(matches!(call.get("x"), Some(Value::Int(20))));
/// assert!(matches!(global.get("x"), Some(Value::Int(10))));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Environment(Rc<RefCell<Scope>>);

impl Environment {
    /// Create a new root environment with no parent
    pub fn new() -> Self {
        Environment(Rc::new(RefCell::new(Scope::default())))
    }

    /// Create a child frame that delegates lookups to `parent`
    pub fn new_with_parent(parent: &Environment) -> Self {
        Environment(Rc::new(RefCell::new(Scope {
            bindings: AHashMap::new(),
            parent: Some(parent.clone()),
        })))
    }

    /// Get a variable, searching this frame and then the parent chain.
    /// Returns a cloned value if found.
    pub fn get(&self, name: &str) -> Option<Value> {
        let scope = self.0.borrow();
        match scope.bindings.get(name) {
            Some(value) => Some(value.clone()),
            None => scope.parent.as_ref().and_then(|parent| parent.get(name)),
        }
    }

    /// Bind a variable in this frame, overwriting any local binding
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.0.borrow_mut().bindings.insert(name.into(), value);
    }

    /// Rebind an existing variable in the nearest frame that owns it.
    /// Returns false when no frame in the chain defines `name`.
    pub fn assign(&self, name: &str, value: Value) -> bool {
        let mut scope = self.0.borrow_mut();
        if let Some(slot) = scope.bindings.get_mut(name) {
            *slot = value;
            return true;
        }
        match scope.parent.as_ref() {
            Some(parent) => parent.assign(name, value),
            None => false,
        }
    }

    /// True when this frame itself (not a parent) binds `name`
    pub fn contains_local(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// Every name visible from this frame, innermost first, without duplicates
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = Vec::new();
        let mut current = Some(self.clone());
        while let Some(env) = current {
            let scope = env.0.borrow();
            let mut local: Vec<&String> = scope.bindings.keys().collect();
            local.sort();
            for name in local {
                if !names.contains(name) {
                    names.push(name.clone());
                }
            }
            current = scope.parent.clone();
        }
        names
    }

    /// Names bound directly in this frame, sorted
    pub fn local_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.0.borrow().bindings.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_walks_parent_chain() {
        let global = Environment::new();
        global.set("a", Value::Int(1));
        let child = Environment::new_with_parent(&global);
        let grandchild = Environment::new_with_parent(&child);
        assert!(matches!(grandchild.get("a"), Some(Value::Int(1))));
        assert!(grandchild.get("missing").is_none());
    }

    #[test]
    fn test_set_shadows_without_touching_parent() {
        let global = Environment::new();
        global.set("x", Value::Int(1));
        let child = Environment::new_with_parent(&global);
        child.set("x", Value::Int(2));
        assert!(matches!(child.get("x"), Some(Value::Int(2))));
        assert!(matches!(global.get("x"), Some(Value::Int(1))));
        assert!(child.contains_local("x"));
    }

    #[test]
    fn test_assign_mutates_owning_frame() {
        let global = Environment::new();
        global.set("count", Value::Int(0));
        let child = Environment::new_with_parent(&global);
        assert!(child.assign("count", Value::Int(5)));
        assert!(!child.contains_local("count"));
        assert!(matches!(global.get("count"), Some(Value::Int(5))));
    }

    #[test]
    fn test_assign_to_unknown_name_fails() {
        let env = Environment::new();
        assert!(!env.assign("ghost", Value::Int(1)));
        assert!(env.get("ghost").is_none());
    }

    #[test]
    fn test_names_lists_inner_first_without_duplicates() {
        let global = Environment::new();
        global.set("b", Value::Null);
        global.set("a", Value::Null);
        let child = Environment::new_with_parent(&global);
        child.set("a", Value::Null);
        child.set("c", Value::Null);
        assert_eq!(child.names(), vec!["a", "c", "b"]);
        assert_eq!(global.local_names(), vec!["a", "b"]);
    }
}

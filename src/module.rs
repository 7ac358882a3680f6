// File: src/module.rs
//
// Module system for the Kat programming language.
// Resolves `import("name")` to a source file on the search paths, reads and
// parses it, and caches every loaded module (native packages included) so a
// second import yields the very same module value.

use crate::ast::Program;
use crate::errors::ParseError;
use crate::interpreter::value::Module;
use crate::parser;
use ahash::AHashMap;
use std::fs;
use std::path::PathBuf;
use std::rc::Rc;
use thiserror::Error;
use tracing::{debug, trace};

/// File extension of Kat source modules
pub const MODULE_EXTENSION: &str = "kat";

#[derive(Debug, Error)]
pub enum ModuleError {
    #[error("Module not found: {0}")]
    NotFound(String),

    #[error("Circular import detected: {0}")]
    Circular(String),

    #[error("Failed to read module {name}: {source}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse module {name}: {source}")]
    Parse {
        name: String,
        #[source]
        source: ParseError,
    },
}

/// Manages module loading, caching, and resolution
pub struct ModuleLoader {
    /// Cache of loaded modules to avoid re-evaluating
    loaded_modules: AHashMap<String, Rc<Module>>,
    /// Stack of modules currently being loaded (for circular import detection)
    loading_stack: Vec<String>,
    /// Search paths for module resolution, in priority order
    search_paths: Vec<PathBuf>,
}

impl ModuleLoader {
    pub fn new(search_paths: Vec<PathBuf>) -> Self {
        ModuleLoader { loaded_modules: AHashMap::new(), loading_stack: Vec::new(), search_paths }
    }

    /// Resolves a module name to a file path (e.g. "math" -> "./math.kat")
    pub fn resolve_module_path(&self, module_name: &str) -> Option<PathBuf> {
        let filename = format!("{}.{}", module_name, MODULE_EXTENSION);
        self.search_paths.iter().map(|dir| dir.join(&filename)).find(|path| path.is_file())
    }

    pub fn cached(&self, module_name: &str) -> Option<Rc<Module>> {
        let module = self.loaded_modules.get(module_name).cloned();
        if module.is_some() {
            trace!(module = module_name, "module cache hit");
        }
        module
    }

    pub fn cache(&mut self, module_name: &str, module: Rc<Module>) {
        self.loaded_modules.insert(module_name.to_string(), module);
    }

    /// Starts loading a source module: detects cycles, then resolves, reads
    /// and parses the file. On success the module stays on the loading stack
    /// until `finish_loading` is called.
    pub fn begin_loading(&mut self, module_name: &str) -> Result<Program, ModuleError> {
        if self.loading_stack.iter().any(|name| name == module_name) {
            let mut chain = self.loading_stack.clone();
            chain.push(module_name.to_string());
            return Err(ModuleError::Circular(chain.join(" -> ")));
        }

        let module_path = self
            .resolve_module_path(module_name)
            .ok_or_else(|| ModuleError::NotFound(module_name.to_string()))?;

        debug!(module = module_name, path = %module_path.display(), "loading module");

        let source = fs::read_to_string(&module_path)
            .map_err(|source| ModuleError::Io { name: module_name.to_string(), source })?;

        let program = parser::parse(&source)
            .map_err(|source| ModuleError::Parse { name: module_name.to_string(), source })?;

        self.loading_stack.push(module_name.to_string());
        Ok(program)
    }

    /// Pops the module off the loading stack and caches it when evaluation
    /// succeeded
    pub fn finish_loading(&mut self, module_name: &str, module: Option<Rc<Module>>) {
        if let Some(pos) = self.loading_stack.iter().rposition(|name| name == module_name) {
            self.loading_stack.remove(pos);
        }
        if let Some(module) = module {
            self.cache(module_name, module);
        }
    }

    /// Forgets every cached module
    pub fn clear(&mut self) {
        self.loaded_modules.clear();
        self.loading_stack.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

    fn scratch_dir() -> PathBuf {
        let id = NEXT_DIR.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir()
            .join(format!("kat_module_tests_{}_{}", std::process::id(), id));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_resolves_first_matching_search_path() {
        let first = scratch_dir();
        let second = scratch_dir();
        fs::write(second.join("util.kat"), "let x = 1\n").unwrap();

        let loader = ModuleLoader::new(vec![first.clone(), second.clone()]);
        assert_eq!(loader.resolve_module_path("util"), Some(second.join("util.kat")));
        assert_eq!(loader.resolve_module_path("missing"), None);

        fs::remove_dir_all(first).ok();
        fs::remove_dir_all(second).ok();
    }

    #[test]
    fn test_missing_module_is_not_found() {
        let mut loader = ModuleLoader::new(vec![scratch_dir()]);
        let err = loader.begin_loading("nowhere").unwrap_err();
        assert_eq!(err.to_string(), "Module not found: nowhere");
    }

    #[test]
    fn test_parse_failure_is_reported_with_module_name() {
        let dir = scratch_dir();
        fs::write(dir.join("broken.kat"), "let = 1\n").unwrap();
        let mut loader = ModuleLoader::new(vec![dir.clone()]);
        let err = loader.begin_loading("broken").unwrap_err();
        assert!(matches!(err, ModuleError::Parse { .. }));
        assert!(err.to_string().starts_with("Failed to parse module broken:"));
        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn test_reentrant_load_is_circular() {
        let dir = scratch_dir();
        fs::write(dir.join("a.kat"), "let a = 1\n").unwrap();
        let mut loader = ModuleLoader::new(vec![dir.clone()]);

        assert!(loader.begin_loading("a").is_ok());
        let err = loader.begin_loading("a").unwrap_err();
        assert_eq!(err.to_string(), "Circular import detected: a -> a");

        loader.finish_loading("a", None);
        assert!(loader.begin_loading("a").is_ok());
        fs::remove_dir_all(dir).ok();
    }
}

//! Lexical scope chain shared by the semantic analyzer and the IR generator.
//!
//! The semantic analyzer uses it to resolve names and reject redefinitions;
//! the IR generator walks the *same* structure afterward to map each name to
//! its WASM local index (spec.md §3: "the IR generator uses the same
//! structure to map names to local indices").

use rustc_hash::FxHashMap;

/// What a name is bound to within a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Binding {
    pub local_index: u32,
}

#[derive(Debug, Default)]
struct Scope {
    bindings: FxHashMap<String, Binding>,
}

/// A stack of scopes, innermost last. Push on entering a compound statement
/// or function body, pop on leaving it.
#[derive(Debug, Default)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
}

impl SymbolTable {
    pub fn new() -> Self {
        SymbolTable { scopes: Vec::new() }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }

    /// Declare `name` in the innermost scope. Returns `false` if `name` is
    /// already bound *in that same scope* (a redefinition); the caller is
    /// responsible for turning that into a diagnostic.
    pub fn declare(&mut self, name: &str, binding: Binding) -> bool {
        let scope = self.scopes.last_mut().expect("declare outside any scope");
        if scope.bindings.contains_key(name) {
            return false;
        }
        scope.bindings.insert(name.to_string(), binding);
        true
    }

    /// Resolve `name` by searching from the innermost scope outward.
    pub fn resolve(&self, name: &str) -> Option<Binding> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(name))
            .copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inner_scope_shadows_without_mutating_outer() {
        let mut table = SymbolTable::new();
        table.push_scope();
        assert!(table.declare("x", Binding { local_index: 0 }));

        table.push_scope();
        assert!(table.declare("x", Binding { local_index: 1 }));
        assert_eq!(table.resolve("x"), Some(Binding { local_index: 1 }));
        table.pop_scope();

        assert_eq!(table.resolve("x"), Some(Binding { local_index: 0 }));
    }

    #[test]
    fn name_declared_in_child_scope_is_unresolvable_outside_it() {
        let mut table = SymbolTable::new();
        table.push_scope();
        table.push_scope();
        table.declare("y", Binding { local_index: 0 });
        table.pop_scope();
        assert_eq!(table.resolve("y"), None);
    }

    #[test]
    fn redefinition_in_same_scope_is_rejected() {
        let mut table = SymbolTable::new();
        table.push_scope();
        assert!(table.declare("a", Binding { local_index: 0 }));
        assert!(!table.declare("a", Binding { local_index: 1 }));
    }

    #[test]
    fn undeclared_name_does_not_resolve() {
        let table = SymbolTable::new();
        assert_eq!(table.resolve("missing"), None);
    }
}

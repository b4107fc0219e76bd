//! Named scope chain and variable records.
//!
//! One scope exists per function, named after the function's identifier and
//! parented to the scope that was current at its lexical position; locals of
//! a function all share that scope. Lookup walks the parent chain up to the
//! single root scope `global`. Uniform/attribute/varying declarations are
//! additionally mirrored into flat registries independent of lexical scope.

use std::collections::HashMap;

use crate::types::TypeTag;

pub const GLOBAL_SCOPE: &str = "global";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingKind {
    Plain,
    Uniform,
    Attribute,
    Varying,
}

impl BindingKind {
    pub fn from_qualifier(qualifier: Option<&str>) -> BindingKind {
        match qualifier {
            Some("uniform") => BindingKind::Uniform,
            Some("attribute") => BindingKind::Attribute,
            Some("varying") => BindingKind::Varying,
            _ => BindingKind::Plain,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Variable {
    pub name: String,
    pub ty: Option<TypeTag>,
    pub binding: BindingKind,
    /// Name of the scope that owns the declaration.
    pub scope: String,
}

#[derive(Debug, Clone)]
struct Scope {
    parent: Option<String>,
    vars: HashMap<String, Variable>,
}

/// Chained symbol tables addressed by scope name, with exactly one current
/// scope during the tree walk.
#[derive(Debug)]
pub struct ScopeTable {
    scopes: HashMap<String, Scope>,
    current: String,
    pub uniforms: HashMap<String, Variable>,
    pub attributes: HashMap<String, Variable>,
    pub varyings: HashMap<String, Variable>,
}

impl ScopeTable {
    pub fn new() -> Self {
        let mut scopes = HashMap::new();
        scopes.insert(
            GLOBAL_SCOPE.to_string(),
            Scope {
                parent: None,
                vars: HashMap::new(),
            },
        );
        ScopeTable {
            scopes,
            current: GLOBAL_SCOPE.to_string(),
            uniforms: HashMap::new(),
            attributes: HashMap::new(),
            varyings: HashMap::new(),
        }
    }

    pub fn current(&self) -> &str {
        &self.current
    }

    /// Enter the scope named `name`, creating it (parented to the current
    /// scope) if it does not exist yet.
    pub fn enter(&mut self, name: &str) {
        if !self.scopes.contains_key(name) {
            self.scopes.insert(
                name.to_string(),
                Scope {
                    parent: Some(self.current.clone()),
                    vars: HashMap::new(),
                },
            );
        }
        self.current = name.to_string();
    }

    /// Leave the current scope, restoring its parent as current.
    pub fn leave(&mut self) {
        let parent = self
            .scopes
            .get(&self.current)
            .and_then(|s| s.parent.clone())
            .unwrap_or_else(|| GLOBAL_SCOPE.to_string());
        self.current = parent;
    }

    /// Declare a variable in the current scope, mirroring qualified bindings
    /// into the flat registries.
    pub fn declare(&mut self, name: &str, ty: Option<TypeTag>, binding: BindingKind) {
        let var = Variable {
            name: name.to_string(),
            ty,
            binding,
            scope: self.current.clone(),
        };
        match binding {
            BindingKind::Uniform => {
                self.uniforms.insert(name.to_string(), var.clone());
            }
            BindingKind::Attribute => {
                self.attributes.insert(name.to_string(), var.clone());
            }
            BindingKind::Varying => {
                self.varyings.insert(name.to_string(), var.clone());
            }
            BindingKind::Plain => {}
        }
        if let Some(scope) = self.scopes.get_mut(&self.current) {
            scope.vars.insert(name.to_string(), var);
        }
    }

    /// Look up a name, walking the parent chain from the current scope.
    pub fn lookup(&self, name: &str) -> Option<&Variable> {
        let mut scope_name = Some(self.current.as_str());
        while let Some(sn) = scope_name {
            let scope = self.scopes.get(sn)?;
            if let Some(var) = scope.vars.get(name) {
                return Some(var);
            }
            scope_name = scope.parent.as_deref();
        }
        None
    }

    /// Re-type an existing variable (assignment forces the left operand's
    /// type to the right operand's). No-op when the name is not in scope.
    pub fn assign_type(&mut self, name: &str, ty: Option<TypeTag>) {
        let mut scope_name = Some(self.current.clone());
        while let Some(sn) = scope_name {
            let Some(scope) = self.scopes.get_mut(&sn) else {
                return;
            };
            if let Some(var) = scope.vars.get_mut(name) {
                var.ty = ty;
                return;
            }
            scope_name = scope.parent.clone();
        }
    }
}

impl Default for ScopeTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_walks_the_parent_chain() {
        let mut scopes = ScopeTable::new();
        scopes.declare("g", Some(TypeTag::Float), BindingKind::Plain);

        scopes.enter("main");
        scopes.declare("x", Some(TypeTag::Int), BindingKind::Plain);

        assert_eq!(scopes.lookup("x").unwrap().ty, Some(TypeTag::Int));
        assert_eq!(scopes.lookup("g").unwrap().ty, Some(TypeTag::Float));
        assert!(scopes.lookup("missing").is_none());

        scopes.leave();
        assert!(scopes.lookup("x").is_none());
        assert_eq!(scopes.current(), GLOBAL_SCOPE);
    }

    #[test]
    fn test_function_scope_is_reused_on_reentry() {
        let mut scopes = ScopeTable::new();
        scopes.enter("f");
        scopes.declare("a", Some(TypeTag::Float), BindingKind::Plain);
        scopes.leave();

        scopes.enter("f");
        assert!(scopes.lookup("a").is_some());
    }

    #[test]
    fn test_qualified_bindings_mirror_into_registries() {
        let mut scopes = ScopeTable::new();
        scopes.enter("main");
        scopes.declare("u_time", Some(TypeTag::Float), BindingKind::Uniform);
        scopes.declare("a_pos", Some(TypeTag::Vec(2)), BindingKind::Attribute);
        scopes.declare("v_uv", Some(TypeTag::Vec(2)), BindingKind::Varying);
        scopes.leave();

        // Registries are flat and independent of the declaring scope.
        assert!(scopes.uniforms.contains_key("u_time"));
        assert!(scopes.attributes.contains_key("a_pos"));
        assert!(scopes.varyings.contains_key("v_uv"));
        assert!(scopes.lookup("u_time").is_none());
    }

    #[test]
    fn test_assign_type_retypes_outer_variable() {
        let mut scopes = ScopeTable::new();
        scopes.declare("x", None, BindingKind::Plain);
        scopes.enter("f");
        scopes.assign_type("x", Some(TypeTag::Vec(3)));
        scopes.leave();
        assert_eq!(scopes.lookup("x").unwrap().ty, Some(TypeTag::Vec(3)));
    }
}

//! User-defined aggregate types, registered as constructor-like callables
//! that coexist with the built-in type constructors.

use std::collections::HashMap;
use std::rc::Rc;

use crate::descriptor::{Descriptor, OPAQUE};
use crate::types::TypeTag;

#[derive(Debug, Clone)]
pub struct StructDef {
    pub name: String,
    /// Field names, in declaration order.
    pub fields: Vec<String>,
    /// Field types, parallel to `fields`.
    pub field_types: Vec<Option<TypeTag>>,
}

#[derive(Debug, Default)]
pub struct StructRegistry {
    defs: HashMap<String, StructDef>,
}

impl StructRegistry {
    pub fn new() -> Self {
        StructRegistry {
            defs: HashMap::new(),
        }
    }

    pub fn register(&mut self, def: StructDef) {
        self.defs.insert(def.name.clone(), def);
    }

    pub fn get(&self, name: &str) -> Option<&StructDef> {
        self.defs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.defs.contains_key(name)
    }

    pub fn field_type(&self, struct_name: &str, field: &str) -> Option<TypeTag> {
        let def = self.defs.get(struct_name)?;
        let index = def.fields.iter().position(|f| f == field)?;
        def.field_types[index].clone()
    }
}

/// Invoke a struct constructor: positional arguments map onto fields in
/// order, missing fields synthesize their declared type's default value.
/// The result is a JavaScript object literal, never a candidate for the
/// compact/expanded rewrite.
pub fn construct(def: &StructDef, args: &[Rc<Descriptor>], registry: &StructRegistry) -> Descriptor {
    let mut components = Vec::with_capacity(def.fields.len());
    for (i, field) in def.fields.iter().enumerate() {
        let value: Rc<Descriptor> = match args.get(i) {
            Some(arg) => arg.clone(),
            None => Rc::new(match &def.field_types[i] {
                Some(ty) => default_value(ty, registry),
                None => Descriptor::literal("null", None),
            }),
        };
        components.push(Rc::new(
            Descriptor::new(
                format!("{}: {}", field, value.text),
                value.ty.clone(),
                value.complexity,
            ),
        ));
    }

    let parts: Vec<&str> = components.iter().map(|c| c.text.as_str()).collect();
    Descriptor::new(
        format!("{{{}}}", parts.join(", ")),
        Some(TypeTag::Struct(def.name.clone())),
        OPAQUE,
    )
    .with_components(components)
    .no_optimize()
}

/// Default value for a declared type, as produced by the type's own default
/// constructor: scalar zeroes, zero-filled vectors and matrices, recursive
/// struct defaults.
pub fn default_value(ty: &TypeTag, registry: &StructRegistry) -> Descriptor {
    match ty {
        TypeTag::Bool => Descriptor::literal("false", Some(TypeTag::Bool)),
        TypeTag::Int => Descriptor::literal("0", Some(TypeTag::Int)),
        TypeTag::Float => Descriptor::literal("0.0", Some(TypeTag::Float)),
        TypeTag::Vec(n) => {
            let components: Vec<Rc<Descriptor>> = (0..*n)
                .map(|_| Rc::new(Descriptor::literal("0.0", Some(TypeTag::Float))))
                .collect();
            let zeros = vec!["0.0"; *n as usize].join(", ");
            Descriptor::literal(format!("[{}]", zeros), Some(ty.clone())).with_components(components)
        }
        TypeTag::Mat(n) => {
            let size = *n as usize;
            let components: Vec<Rc<Descriptor>> = (0..size * size)
                .map(|_| Rc::new(Descriptor::literal("0.0", Some(TypeTag::Float))))
                .collect();
            let row = format!("[{}]", vec!["0.0"; size].join(", "));
            let rows = vec![row; size].join(", ");
            Descriptor::literal(format!("[{}]", rows), Some(ty.clone())).with_components(components)
        }
        TypeTag::Struct(name) => match registry.get(name) {
            Some(def) => {
                // Clone breaks the borrow so the recursion can consult the
                // registry for nested struct fields.
                let def = def.clone();
                construct(&def, &[], registry)
            }
            None => Descriptor::literal("{}", Some(ty.clone())),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn light() -> StructDef {
        StructDef {
            name: "Light".to_string(),
            fields: vec!["intensity".to_string(), "color".to_string()],
            field_types: vec![Some(TypeTag::Float), Some(TypeTag::Vec(3))],
        }
    }

    #[test]
    fn test_constructor_tags_fields_in_order() {
        let mut registry = StructRegistry::new();
        registry.register(light());
        let def = registry.get("Light").unwrap().clone();

        let args = vec![Rc::new(Descriptor::literal("1.0", Some(TypeTag::Float)))];
        let desc = construct(&def, &args, &registry);

        assert_eq!(desc.text, "{intensity: 1.0, color: [0.0, 0.0, 0.0]}");
        assert_eq!(desc.ty, Some(TypeTag::Struct("Light".to_string())));
        assert!(!desc.optimize);
    }

    #[test]
    fn test_missing_fields_use_declared_type_defaults() {
        let mut registry = StructRegistry::new();
        registry.register(light());
        let def = registry.get("Light").unwrap().clone();

        let desc = construct(&def, &[], &registry);
        assert_eq!(desc.text, "{intensity: 0.0, color: [0.0, 0.0, 0.0]}");
    }

    #[test]
    fn test_nested_struct_defaults_recurse() {
        let mut registry = StructRegistry::new();
        registry.register(light());
        registry.register(StructDef {
            name: "Scene".to_string(),
            fields: vec!["sun".to_string()],
            field_types: vec![Some(TypeTag::Struct("Light".to_string()))],
        });

        let desc = default_value(&TypeTag::Struct("Scene".to_string()), &registry);
        assert_eq!(desc.text, "{sun: {intensity: 0.0, color: [0.0, 0.0, 0.0]}}");
    }

    #[test]
    fn test_matrix_default_is_zero_filled_rows() {
        let registry = StructRegistry::new();
        let desc = default_value(&TypeTag::Mat(2), &registry);
        assert_eq!(desc.text, "[[0.0, 0.0], [0.0, 0.0]]");
    }
}

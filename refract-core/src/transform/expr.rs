//! Operator and call resolution: expression handlers for the transform
//! engine.
//!
//! The four arithmetic operators never render as native infix — they route
//! through named helper routines so component-wise vector and matrix
//! arithmetic works uniformly regardless of operand shape. Every other
//! operator's scalar semantics match the target and stays infix. Calls
//! resolve, in order, against the struct registry, the built-in type
//! constructors, the library catalog, and the user function registry,
//! falling back to the first argument's type when nothing declares one.

use std::rc::Rc;

use crate::bail_tree;
use crate::descriptor::{Descriptor, Include, OPAQUE};
use crate::error::Result;
use crate::library::ReturnType;
use crate::structs;
use crate::swizzle;
use crate::transform::{Transpiler, WarningKind};
use crate::tree::{NodeId, SyntaxTree, Tag};
use crate::types::{self, TypeTag};

/// Helper routine bound to an arithmetic operator. Comparison, logical,
/// and bitwise operators are deliberately absent: they render infix.
fn operator_function(op: &str) -> Option<&'static str> {
    match op {
        "*" => Some("multiply"),
        "+" => Some("add"),
        "-" => Some("subtract"),
        "/" => Some("divide"),
        _ => None,
    }
}

impl Transpiler<'_> {
    // ---- leaves -----------------------------------------------------------

    pub(super) fn identifier(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(name) = tree.text(id).map(str::to_string) else {
            bail_tree!("identifier node without a name");
        };
        match self.state.scopes.lookup(&name) {
            Some(var) => {
                let ty = var.ty.clone();
                Ok(variable_descriptor(&name, ty))
            }
            None => {
                self.warn(
                    WarningKind::UndefinedIdentifier,
                    format!("'{}' is not defined", name),
                );
                Ok(Descriptor::literal(name, None))
            }
        }
    }

    pub(super) fn int_constant(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(text) = tree.text(id) else {
            bail_tree!("integer constant without a value");
        };
        Ok(Descriptor::literal(text, Some(TypeTag::Int)))
    }

    pub(super) fn float_constant(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(text) = tree.text(id) else {
            bail_tree!("float constant without a value");
        };
        Ok(Descriptor::literal(types::normalize_float(text), Some(TypeTag::Float)))
    }

    pub(super) fn bool_constant(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(text) = tree.text(id) else {
            bail_tree!("boolean constant without a value");
        };
        Ok(Descriptor::literal(text, Some(TypeTag::Bool)))
    }

    // ---- operators --------------------------------------------------------

    pub(super) fn binary_expr(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(op) = tree.text(id).map(str::to_string) else {
            bail_tree!("binary expression without an operator");
        };
        let (Some(left_node), Some(right_node)) = (tree.child(id, 0), tree.child(id, 1)) else {
            bail_tree!("binary expression missing an operand");
        };
        let left = self.process(tree, left_node)?;
        let right = self.process(tree, right_node)?;
        let cost = left.complexity + right.complexity + 1;

        if let Some(helper) = operator_function(&op) {
            let ty = types::wider(left.ty.as_ref(), right.ty.as_ref());
            return Ok(Descriptor::new(
                format!("{}({}, {})", helper, left.text, right.text),
                ty,
                cost,
            )
            .with_include(Include::routine(helper)));
        }

        let ty = match op.as_str() {
            "==" | "!=" | "<" | ">" | "<=" | ">=" | "&&" | "||" | "^^" => Some(TypeTag::Bool),
            _ => types::wider(left.ty.as_ref(), right.ty.as_ref()),
        };
        Ok(Descriptor::new(
            format!("{} {} {}", left.text, op, right.text),
            ty,
            cost,
        ))
    }

    pub(super) fn assignment_expr(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(op) = tree.text(id).map(str::to_string) else {
            bail_tree!("assignment without an operator");
        };
        let (Some(left_node), Some(right_node)) = (tree.child(id, 0), tree.child(id, 1)) else {
            bail_tree!("assignment missing an operand");
        };
        let left = self.process(tree, left_node)?;
        let right = self.process(tree, right_node)?;

        // Assignment forces the left operand's type to the right's.
        if tree.tag(left_node) == Some(Tag::Identifier) {
            if let Some(name) = tree.text(left_node) {
                self.state.scopes.assign_type(name, right.ty.clone());
            }
        }
        Ok(Descriptor::new(
            format!("{} {} {}", left.text, op, right.text),
            right.ty.clone(),
            left.complexity + right.complexity + 1,
        ))
    }

    pub(super) fn unary_expr(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(op) = tree.text(id).map(str::to_string) else {
            bail_tree!("unary expression without an operator");
        };
        let Some(operand_node) = tree.child(id, 0) else {
            bail_tree!("unary expression without an operand");
        };
        let operand = self.process(tree, operand_node)?;

        if op == "+" {
            // Unary plus is elided unless it prefixes another unary
            // expression (increment/decrement chains).
            let keeps = matches!(
                tree.tag(operand_node),
                Some(Tag::UnaryExpr | Tag::PostfixExpr)
            );
            if !keeps {
                return Ok((*operand).clone());
            }
        }
        Ok(Descriptor::new(
            format!("{}{}", op, operand.text),
            operand.ty.clone(),
            operand.complexity + 1,
        ))
    }

    pub(super) fn postfix_expr(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(op) = tree.text(id).map(str::to_string) else {
            bail_tree!("postfix expression without an operator");
        };
        let Some(operand_node) = tree.child(id, 0) else {
            bail_tree!("postfix expression without an operand");
        };
        let operand = self.process(tree, operand_node)?;
        Ok(Descriptor::new(
            format!("{}{}", operand.text, op),
            operand.ty.clone(),
            operand.complexity + 1,
        ))
    }

    pub(super) fn conditional_expr(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let (Some(cond_node), Some(then_node), Some(else_node)) =
            (tree.child(id, 0), tree.child(id, 1), tree.child(id, 2))
        else {
            bail_tree!("conditional expression missing an operand");
        };
        let cond = self.process(tree, cond_node)?;
        let then = self.process(tree, then_node)?;
        let alt = self.process(tree, else_node)?;
        Ok(Descriptor::new(
            format!("{} ? {} : {}", cond.text, then.text, alt.text),
            types::wider(then.ty.as_ref(), alt.ty.as_ref()),
            cond.complexity + then.complexity + alt.complexity + 1,
        ))
    }

    pub(super) fn grouping(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(inner_node) = tree.child(id, 0) else {
            bail_tree!("parenthesized expression without an inner expression");
        };
        let inner = self.process(tree, inner_node)?;
        let mut desc = Descriptor::new(
            format!("({})", inner.text),
            inner.ty.clone(),
            inner.complexity,
        );
        desc.components = inner.components.clone();
        desc.optimize = inner.optimize;
        Ok(desc)
    }

    // ---- access -----------------------------------------------------------

    pub(super) fn index_access(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let (Some(base_node), Some(index_node)) = (tree.child(id, 0), tree.child(id, 1)) else {
            bail_tree!("index access missing its base or index");
        };
        let base = self.process(tree, base_node)?;
        let index = self.process(tree, index_node)?;
        let ty = base.ty.as_ref().and_then(|t| t.element_type());
        Ok(Descriptor::new(
            format!("{}[{}]", base.text, index.text),
            ty,
            base.complexity + index.complexity + 1,
        ))
    }

    pub(super) fn field_selection(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(property) = tree.text(id).map(str::to_string) else {
            bail_tree!("field access without a property name");
        };
        let Some(base_node) = tree.child(id, 0) else {
            bail_tree!("field access without a base expression");
        };
        let base = self.process(tree, base_node)?;

        if let Some(TypeTag::Struct(struct_name)) = &base.ty {
            let field_ty = self.state.structs.field_type(struct_name, &property);
            return Ok(Descriptor::new(
                format!("{}.{}", base.text, property),
                field_ty,
                base.complexity + 1,
            ));
        }

        let swizzlable =
            base.components.is_some() || base.ty.as_ref().is_some_and(|t| t.is_composite());
        if swizzle::is_swizzle(&property) && swizzlable {
            let expansion = swizzle::expand(&base, &property);
            for letter in expansion.out_of_range {
                self.warn(
                    WarningKind::SwizzleOutOfRange,
                    format!(
                        "swizzle letter '{}' is out of range for '{}'",
                        letter, base.text
                    ),
                );
            }
            return Ok(expansion.descriptor);
        }

        Ok(Descriptor::new(
            format!("{}.{}", base.text, property),
            None,
            base.complexity + 1,
        ))
    }

    // ---- calls ------------------------------------------------------------

    pub(super) fn call_expr(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(callee_node) = tree.child(id, 0) else {
            bail_tree!("call expression without a callee");
        };
        let mut args = Vec::new();
        for &arg in &tree.children(id)[1..] {
            args.push(self.process(tree, arg)?);
        }

        // A property-access callee is a method-style call.
        if tree.tag(callee_node) == Some(Tag::FieldSelection) {
            return self.method_call(tree, callee_node, &args);
        }

        let name = if tree.tag(callee_node) == Some(Tag::Identifier) {
            match tree.text(callee_node) {
                Some(text) => text.to_string(),
                None => bail_tree!("call callee identifier without a name"),
            }
        } else {
            // Indexed type-constructor calls and other computed callees
            // render directly.
            self.process(tree, callee_node)?.text.clone()
        };

        if self.state.structs.contains(&name) {
            let def = self.state.structs.get(&name).cloned().expect("checked above");
            return Ok(structs::construct(&def, &args, &self.state.structs));
        }

        if let Some(ty) = TypeTag::from_name(&name) {
            return Ok(self.constructor_call(&name, ty, &args));
        }

        Ok(self.plain_call(tree, id, &name, &args))
    }

    /// `holder.method(args)`: typed by the method name's resolved type, cost
    /// summed from holder and method. Sub-method usage of a library routine
    /// mirrors into the include set.
    fn method_call(
        &mut self,
        tree: &SyntaxTree,
        callee_node: NodeId,
        args: &[Rc<Descriptor>],
    ) -> Result<Descriptor> {
        let Some(method) = tree.text(callee_node).map(str::to_string) else {
            bail_tree!("method call without a method name");
        };
        let Some(holder_node) = tree.child(callee_node, 0) else {
            bail_tree!("method call without a holder expression");
        };
        let holder = self.process(tree, holder_node)?;
        let method_ty = self.state.scopes.lookup(&method).and_then(|v| v.ty.clone());

        let mut desc = Descriptor::new(
            format!("{}.{}({})", holder.text, method, join_args(args)),
            method_ty,
            holder.complexity,
        );
        if let Some(entry) = self.catalog.get(&holder.text) {
            if entry.methods.contains_key(&method) {
                desc.includes.push(Include::method(holder.text.clone(), method));
            }
        }
        Ok(desc)
    }

    /// Built-in type constructor: the argument descriptors become the
    /// result's components, so the optimizer can replace the construction
    /// call with a plain list literal when that is cheaper.
    fn constructor_call(&mut self, name: &str, ty: TypeTag, args: &[Rc<Descriptor>]) -> Descriptor {
        let emitted = self
            .names
            .types
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.to_string());
        let components = constructor_components(&ty, args);
        let mut desc = Descriptor::new(
            format!("{}({})", emitted, join_args(args)),
            Some(ty),
            OPAQUE,
        );
        // A construction that is about to expand needs no runtime helper.
        // This mirrors the optimizer's own decision exactly.
        let will_expand = self.options.optimize
            && components
                .as_ref()
                .map_or(false, |c| {
                    c.len() > 1 && c.iter().map(|d| d.complexity).sum::<u32>() < OPAQUE
                });
        if !will_expand && self.catalog.contains(name) {
            desc.includes.push(Include::routine(name));
        }
        if let Some(components) = components {
            desc = desc.with_components(components);
        }
        desc
    }

    fn plain_call(
        &mut self,
        tree: &SyntaxTree,
        id: NodeId,
        name: &str,
        args: &[Rc<Descriptor>],
    ) -> Descriptor {
        let mut emitted = name.to_string();
        let mut ty = None;
        let mut includes = Vec::new();

        if let Some(entry) = self.catalog.get(name) {
            includes.push(Include::routine(name));
            if let Some(rename) = &entry.rename {
                emitted = rename.clone();
            }
            ty = match &entry.return_type {
                ReturnType::Fixed(t) => Some(t.clone()),
                ReturnType::Computed(f) => f(tree, id, args),
                ReturnType::Unknown => None,
            };
        } else if let Some((rendered, fn_ty)) = self.resolve_overload(name, args) {
            emitted = rendered;
            ty = fn_ty;
        } else if let Some(rename) = self.names.calls.get(name) {
            emitted = rename.clone();
        }

        let text = format!("{}({})", emitted, join_args(args));
        let mut desc = match ty {
            Some(ty) => Descriptor::new(text, Some(ty), OPAQUE),
            None => {
                // No declared return type anywhere: adopt the first
                // argument's type and treat the result as opaque.
                let fallback = args.first().and_then(|a| a.ty.clone());
                Descriptor::new(text, fallback, OPAQUE).no_optimize()
            }
        };
        desc.includes = includes;
        desc
    }

    /// Resolve a user-function call against the overload registry: exact
    /// argument-type signature first, the base (first-declared) form
    /// otherwise.
    fn resolve_overload(
        &self,
        base: &str,
        args: &[Rc<Descriptor>],
    ) -> Option<(String, Option<TypeTag>)> {
        let entry = self.state.overloads.get(base)?;
        let signature = args
            .iter()
            .map(|a| {
                a.ty.as_ref()
                    .map(|t| t.to_string())
                    .unwrap_or_else(|| "unknown".to_string())
            })
            .collect::<Vec<_>>()
            .join("_");
        let rendered = entry
            .iter()
            .find(|(sig, _)| *sig == signature)
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| entry[0].1.clone());
        let ty = self.state.functions.get(&rendered).and_then(|d| d.ty.clone());
        Some((rendered, ty))
    }
}

/// A variable reference, with indexable components materialized for
/// composite types so swizzles and expansions can reach into it.
fn variable_descriptor(name: &str, ty: Option<TypeTag>) -> Descriptor {
    let components = match &ty {
        Some(TypeTag::Vec(n)) => Some(
            (0..*n)
                .map(|i| Rc::new(Descriptor::literal(format!("{}[{}]", name, i), Some(TypeTag::Float))))
                .collect(),
        ),
        Some(TypeTag::Mat(n)) => {
            let size = *n;
            let mut components = Vec::with_capacity((size as usize) * (size as usize));
            for row in 0..size {
                for col in 0..size {
                    components.push(Rc::new(Descriptor::literal(
                        format!("{}[{}][{}]", name, row, col),
                        Some(TypeTag::Float),
                    )));
                }
            }
            Some(components)
        }
        _ => None,
    };
    let mut desc = Descriptor::literal(name, ty);
    desc.components = components;
    desc
}

fn join_args(args: &[Rc<Descriptor>]) -> String {
    args.iter()
        .map(|a| a.text.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Components for a constructor call: exact arity, single-scalar splat, or
/// a flattening of composite arguments. `None` keeps the call compact.
fn constructor_components(ty: &TypeTag, args: &[Rc<Descriptor>]) -> Option<Vec<Rc<Descriptor>>> {
    let count = ty.component_count()?;
    if args.is_empty() {
        return None;
    }

    if args.len() == 1
        && matches!(ty, TypeTag::Vec(_))
        && args[0].components.is_none()
        && args[0].ty.as_ref().is_some_and(|t| t.is_scalar())
    {
        return Some(vec![args[0].clone(); count]);
    }

    let mut flat = Vec::new();
    for arg in args {
        if let Some(components) = &arg.components {
            flat.extend(components.iter().cloned());
        } else if arg.ty.as_ref().map_or(true, |t| t.is_scalar()) {
            flat.push(arg.clone());
        } else {
            // Composite argument without materialized components (a call
            // result): expanding would re-evaluate it per element.
            return None;
        }
    }
    if flat.len() >= count {
        flat.truncate(count);
        Some(flat)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_table_covers_exactly_the_arithmetic_four() {
        assert_eq!(operator_function("*"), Some("multiply"));
        assert_eq!(operator_function("+"), Some("add"));
        assert_eq!(operator_function("-"), Some("subtract"));
        assert_eq!(operator_function("/"), Some("divide"));
        assert_eq!(operator_function("=="), None);
        assert_eq!(operator_function("&&"), None);
        assert_eq!(operator_function("<"), None);
    }

    #[test]
    fn test_variable_descriptor_materializes_vector_components() {
        let desc = variable_descriptor("v", Some(TypeTag::Vec(3)));
        let components = desc.components.unwrap();
        assert_eq!(components.len(), 3);
        assert_eq!(components[2].text, "v[2]");
    }

    #[test]
    fn test_variable_descriptor_materializes_matrix_rows() {
        let desc = variable_descriptor("m", Some(TypeTag::Mat(2)));
        let components = desc.components.unwrap();
        assert_eq!(components.len(), 4);
        assert_eq!(components[3].text, "m[1][1]");
    }

    #[test]
    fn test_constructor_components_splat_single_scalar() {
        let x = Rc::new(Descriptor::literal("x", Some(TypeTag::Float)));
        let components = constructor_components(&TypeTag::Vec(3), &[x]).unwrap();
        assert_eq!(components.len(), 3);
        assert!(components.iter().all(|c| c.text == "x"));
    }

    #[test]
    fn test_constructor_components_flatten_and_truncate() {
        let v = Rc::new(variable_descriptor("v", Some(TypeTag::Vec(4))));
        let components = constructor_components(&TypeTag::Vec(3), &[v]).unwrap();
        assert_eq!(components.len(), 3);
        assert_eq!(components[0].text, "v[0]");
    }

    #[test]
    fn test_constructor_keeps_compact_for_unmaterialized_composite() {
        let call = Rc::new(Descriptor::new("normalize(v)", Some(TypeTag::Vec(3)), OPAQUE));
        let one = Rc::new(Descriptor::literal("1.0", Some(TypeTag::Float)));
        assert!(constructor_components(&TypeTag::Vec(4), &[call, one]).is_none());
    }
}

//! Transform engine: the memoized dispatch loop that walks the syntax tree
//! once and assembles the JavaScript output.
//!
//! Each node is processed exactly once per compile (the descriptor cache is
//! keyed by node id, i.e. node identity); children are fully processed
//! before their parent combines them, and library includes register in
//! first-use order during the same walk.

mod expr;

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use log::{debug, warn};

use crate::bail_tree;
use crate::descriptor::{Descriptor, Include, OPAQUE};
use crate::error::Result;
use crate::library::{LibraryCatalog, NameTables};
use crate::optimize;
use crate::scope::{BindingKind, ScopeTable};
use crate::structs::{StructDef, StructRegistry};
use crate::tree::{NodeId, SyntaxTree, Tag};
use crate::types::TypeTag;
use crate::Options;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningKind {
    UnknownNodeKind,
    UndefinedIdentifier,
    SwizzleOutOfRange,
    MissingLibraryEntry,
}

#[derive(Debug, Clone)]
pub struct Warning {
    pub kind: WarningKind,
    pub message: String,
}

/// Per-compile mutable state. Created fresh for every compile invocation,
/// fully populated during the single tree walk, read-only afterwards while
/// the output is serialized.
struct CompilationState {
    scopes: ScopeTable,
    cache: HashMap<NodeId, Rc<Descriptor>>,
    structs: StructRegistry,
    /// Rendered function name -> descriptor, for collision detection.
    functions: HashMap<String, Rc<Descriptor>>,
    /// Base function name -> (signature, rendered name) in declaration order.
    overloads: HashMap<String, Vec<(String, String)>>,
    /// Pending library includes, first-use ordered.
    includes: Vec<Include>,
    include_set: HashSet<Include>,
    warnings: Vec<Warning>,
}

impl CompilationState {
    fn new() -> Self {
        CompilationState {
            scopes: ScopeTable::new(),
            cache: HashMap::new(),
            structs: StructRegistry::new(),
            functions: HashMap::new(),
            overloads: HashMap::new(),
            includes: Vec::new(),
            include_set: HashSet::new(),
            warnings: Vec::new(),
        }
    }
}

/// The driver that turns one syntax tree into JavaScript text.
pub struct Transpiler<'a> {
    options: &'a Options,
    catalog: &'a LibraryCatalog,
    names: &'a NameTables,
    state: CompilationState,
}

impl<'a> Transpiler<'a> {
    pub fn new(
        options: &'a Options,
        catalog: &'a LibraryCatalog,
        builtins: &'a HashMap<String, TypeTag>,
        names: &'a NameTables,
    ) -> Self {
        let mut state = CompilationState::new();
        for (name, ty) in builtins {
            state.scopes.declare(name, Some(ty.clone()), BindingKind::Plain);
        }
        Transpiler {
            options,
            catalog,
            names,
            state,
        }
    }

    /// Process the whole tree and assemble `<library preamble>\n<body>`.
    pub fn run(&mut self, tree: &SyntaxTree) -> Result<String> {
        let Some(root) = tree.root() else {
            bail_tree!("syntax tree has no root node");
        };
        let body = self.process(tree, root)?;
        let preamble = self.serialize_preamble();
        if preamble.is_empty() {
            Ok(body.text.clone())
        } else {
            Ok(format!("{}\n{}", preamble, body.text))
        }
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.state.warnings
    }

    pub fn take_warnings(&mut self) -> Vec<Warning> {
        std::mem::take(&mut self.state.warnings)
    }

    /// Compute (or fetch) the descriptor for a node. Nodes without an own
    /// kind tag produce the empty descriptor.
    pub fn process(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Rc<Descriptor>> {
        if let Some(cached) = self.state.cache.get(&id) {
            return Ok(cached.clone());
        }
        let Some(tag) = tree.tag(id) else {
            let desc = Rc::new(Descriptor::empty());
            self.state.cache.insert(id, desc.clone());
            return Ok(desc);
        };

        let desc = self.dispatch(tree, id, tag)?;
        let desc = if self.options.optimize {
            optimize::pass(desc)
        } else {
            desc
        };
        self.merge_includes(&desc);
        let desc = Rc::new(desc);
        self.state.cache.insert(id, desc.clone());
        Ok(desc)
    }

    fn dispatch(&mut self, tree: &SyntaxTree, id: NodeId, tag: Tag) -> Result<Descriptor> {
        match tag {
            Tag::Root => self.root(tree, id),
            Tag::Precision => Ok(Descriptor::empty()),
            Tag::StructDefinition => self.struct_definition(tree, id),
            Tag::FunctionDefinition => self.function_definition(tree, id),
            Tag::Body => self.body(tree, id),
            Tag::Declaration => self.declaration(tree, id),
            Tag::ExpressionStatement => self.expression_statement(tree, id),
            Tag::IfStatement => self.if_statement(tree, id),
            Tag::ForStatement => self.for_statement(tree, id),
            Tag::WhileStatement => self.while_statement(tree, id),
            Tag::ReturnStatement => self.return_statement(tree, id),
            Tag::BreakStatement => Ok(Descriptor::new("break;", None, 0).no_optimize()),
            Tag::ContinueStatement => Ok(Descriptor::new("continue;", None, 0).no_optimize()),
            Tag::DiscardStatement => Ok(Descriptor::new("discard();", None, 0)
                .no_optimize()
                .with_include(Include::routine("discard"))),
            Tag::Identifier => self.identifier(tree, id),
            Tag::IntConstant => self.int_constant(tree, id),
            Tag::FloatConstant => self.float_constant(tree, id),
            Tag::BoolConstant => self.bool_constant(tree, id),
            Tag::BinaryExpr => self.binary_expr(tree, id),
            Tag::AssignmentExpr => self.assignment_expr(tree, id),
            Tag::UnaryExpr => self.unary_expr(tree, id),
            Tag::PostfixExpr => self.postfix_expr(tree, id),
            Tag::ConditionalExpr => self.conditional_expr(tree, id),
            Tag::CallExpr => self.call_expr(tree, id),
            Tag::FieldSelection => self.field_selection(tree, id),
            Tag::IndexAccess => self.index_access(tree, id),
            Tag::Grouping => self.grouping(tree, id),
            // Structural tags are consumed by their parent construct; one
            // arriving here on its own degrades to a no-op.
            Tag::FieldDeclaration
            | Tag::ParameterList
            | Tag::Parameter
            | Tag::TypeSpecifier
            | Tag::Declarator => {
                self.warn(
                    WarningKind::UnknownNodeKind,
                    format!("no handler for {:?} outside its parent construct", tag),
                );
                Ok(Descriptor::empty())
            }
        }
    }

    fn warn(&mut self, kind: WarningKind, message: String) {
        match kind {
            // Suppressed by default to avoid noise; the record still lands
            // in the warning list.
            WarningKind::UndefinedIdentifier => debug!("{}", message),
            _ => warn!("{}", message),
        }
        self.state.warnings.push(Warning { kind, message });
    }

    // ---- include tracking -------------------------------------------------

    fn merge_includes(&mut self, desc: &Descriptor) {
        for include in desc.includes.clone() {
            self.add_include(include);
        }
    }

    fn add_include(&mut self, include: Include) {
        if include.method.is_some() {
            // The routine itself precedes any of its sub-methods.
            self.add_include(Include::routine(include.name.clone()));
        }
        if !self.state.include_set.insert(include.clone()) {
            return;
        }
        self.state.includes.push(include.clone());
        if include.method.is_none() {
            if let Some(entry) = self.catalog.get(&include.name) {
                for dep in entry.includes.clone() {
                    self.add_include(Include::routine(dep));
                }
            }
        }
    }

    fn serialize_preamble(&mut self) -> String {
        let (preamble, missing) = self.catalog.serialize(&self.state.includes);
        for name in missing {
            self.warn(
                WarningKind::MissingLibraryEntry,
                format!("library routine '{}' has no catalog entry; skipped", name),
            );
        }
        preamble
    }

    // ---- program structure ------------------------------------------------

    fn root(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let mut parts = Vec::new();
        for &child in tree.children(id) {
            let desc = self.process(tree, child)?;
            if desc.visible {
                parts.push(desc.text.clone());
            }
        }
        Ok(Descriptor::new(parts.join("\n"), None, 0).no_optimize())
    }

    fn body(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let mut lines = Vec::new();
        for &child in tree.children(id) {
            let desc = self.process(tree, child)?;
            if desc.visible {
                lines.push(indent(&desc.text));
            }
        }
        let visible = !lines.is_empty();
        let mut desc = Descriptor::new(lines.join("\n"), None, OPAQUE).no_optimize();
        desc.visible = visible;
        Ok(desc)
    }

    fn function_definition(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let ident = match tree.child(id, 0) {
            Some(c) if tree.tag(c) == Some(Tag::Identifier) => c,
            _ => bail_tree!("function definition missing its identifier"),
        };
        let params_node = match tree.child(id, 1) {
            Some(c) if tree.tag(c) == Some(Tag::ParameterList) => c,
            _ => bail_tree!("function definition missing its argument list"),
        };
        let body_node = match tree.child(id, 2) {
            Some(c) if tree.tag(c) == Some(Tag::Body) => c,
            _ => bail_tree!("function definition missing its body"),
        };
        let Some(base) = tree.text(ident).map(str::to_string) else {
            bail_tree!("function identifier without a name");
        };

        let mut param_names = Vec::new();
        let mut params = Vec::new();
        for &p in tree.children(params_node) {
            if tree.tag(p) != Some(Tag::Parameter) {
                bail_tree!("argument list entry is not a parameter");
            }
            let Some(type_name) = tree.text(p).map(str::to_string) else {
                bail_tree!("parameter without a declared type");
            };
            let name_node = match tree.child(p, 0) {
                Some(c) if tree.tag(c) == Some(Tag::Identifier) => c,
                _ => bail_tree!("parameter without an identifier"),
            };
            let Some(name) = tree.text(name_node).map(str::to_string) else {
                bail_tree!("parameter identifier without a name");
            };
            let ty = self.resolve_type_name(&type_name);
            param_names.push(name.clone());
            params.push((name, type_name, ty));
        }

        let signature = params
            .iter()
            .map(|(_, raw, ty)| ty.as_ref().map(|t| t.to_string()).unwrap_or_else(|| raw.clone()))
            .collect::<Vec<_>>()
            .join("_");
        let rendered = self.render_function_name(&base, &signature);

        // One scope per function, named after its identifier; locals and
        // parameters share it.
        self.state.scopes.enter(&base);
        for (name, _, ty) in &params {
            self.state.scopes.declare(name, ty.clone(), BindingKind::Plain);
        }
        let body = self.process(tree, body_node)?;
        self.state.scopes.leave();

        let block = if body.visible {
            format!("{{\n{}\n}}", body.text)
        } else {
            "{}".to_string()
        };
        let ret_ty = tree.text(id).and_then(|name| self.resolve_type_name(name));
        let desc = Descriptor::new(
            format!("function {}({}) {}", rendered, param_names.join(", "), block),
            ret_ty,
            OPAQUE,
        )
        .no_optimize();
        self.state.functions.insert(rendered, Rc::new(desc.clone()));
        Ok(desc)
    }

    /// First registration of a base name emits unqualified; later
    /// registrations with a different signature get the underscore-joined
    /// parameter type list appended.
    fn render_function_name(&mut self, base: &str, signature: &str) -> String {
        let entry = self.state.overloads.entry(base.to_string()).or_default();
        if let Some((_, rendered)) = entry.iter().find(|(sig, _)| sig == signature) {
            return rendered.clone();
        }
        let rendered = if entry.is_empty() {
            base.to_string()
        } else if signature.is_empty() {
            format!("{}_void", base)
        } else {
            format!("{}_{}", base, signature)
        };
        entry.push((signature.to_string(), rendered.clone()));
        rendered
    }

    fn struct_definition(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(name) = tree.text(id).map(str::to_string) else {
            bail_tree!("struct definition without a name");
        };
        let mut fields = Vec::new();
        let mut field_types = Vec::new();
        for &member in tree.children(id) {
            if tree.tag(member) != Some(Tag::FieldDeclaration) {
                bail_tree!("struct member is not a declaration");
            }
            let type_node = match tree.child(member, 0) {
                Some(c) if tree.tag(c) == Some(Tag::TypeSpecifier) => c,
                _ => bail_tree!("struct field without a type specifier"),
            };
            let Some(type_name) = tree.text(type_node).map(str::to_string) else {
                bail_tree!("struct field type specifier without a name");
            };
            let ty = self.resolve_type_name(&type_name);
            for &decl in &tree.children(member)[1..] {
                if tree.tag(decl) != Some(Tag::Declarator) {
                    bail_tree!("struct field member is not a declarator");
                }
                let name_node = match tree.child(decl, 0) {
                    Some(c) if tree.tag(c) == Some(Tag::Identifier) => c,
                    _ => bail_tree!("struct field declarator without an identifier"),
                };
                let Some(field) = tree.text(name_node).map(str::to_string) else {
                    bail_tree!("struct field identifier without a name");
                };
                fields.push(field);
                field_types.push(ty.clone());
            }
        }
        self.state.structs.register(StructDef {
            name,
            fields,
            field_types,
        });
        Ok(Descriptor::empty())
    }

    fn resolve_type_name(&self, name: &str) -> Option<TypeTag> {
        TypeTag::from_name(name).or_else(|| {
            self.state
                .structs
                .contains(name)
                .then(|| TypeTag::Struct(name.to_string()))
        })
    }

    // ---- statements -------------------------------------------------------

    fn declaration(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let qualifier = tree.text(id).map(str::to_string);
        let type_node = match tree.child(id, 0) {
            Some(c) if tree.tag(c) == Some(Tag::TypeSpecifier) => c,
            _ => bail_tree!("declaration without a type specifier"),
        };
        let Some(type_name) = tree.text(type_node).map(str::to_string) else {
            bail_tree!("type specifier without a name");
        };
        let ty = self.resolve_type_name(&type_name);
        let binding = BindingKind::from_qualifier(qualifier.as_deref());

        let mut parts = Vec::new();
        let mut cost = 0;
        for &decl in &tree.children(id)[1..] {
            if tree.tag(decl) != Some(Tag::Declarator) {
                bail_tree!("declaration member is not a declarator");
            }
            let name_node = match tree.child(decl, 0) {
                Some(c) if tree.tag(c) == Some(Tag::Identifier) => c,
                _ => bail_tree!("declarator without an identifier"),
            };
            let Some(name) = tree.text(name_node).map(str::to_string) else {
                bail_tree!("declarator identifier without a name");
            };
            self.state.scopes.declare(&name, ty.clone(), binding);

            let init = match tree.child(decl, 1) {
                Some(init_node) => Some(self.process(tree, init_node)?),
                None => None,
            };
            match init {
                Some(init) if init.visible => {
                    cost += init.complexity;
                    parts.push(format!("{} = {}", name, init.text));
                }
                _ => parts.push(name),
            }
        }

        if binding != BindingKind::Plain {
            // The host environment binds qualified globals at run time.
            return Ok(Descriptor::empty());
        }
        Ok(Descriptor::new(format!("var {};", parts.join(", ")), None, cost).no_optimize())
    }

    fn expression_statement(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(child) = tree.child(id, 0) else {
            bail_tree!("expression statement without an expression");
        };
        let inner = self.process(tree, child)?;
        let mut desc = Descriptor::new(format!("{};", inner.text), None, inner.complexity).no_optimize();
        desc.visible = inner.visible;
        Ok(desc)
    }

    fn if_statement(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let Some(cond_node) = tree.child(id, 0) else {
            bail_tree!("if statement without a condition");
        };
        let Some(then_node) = tree.child(id, 1) else {
            bail_tree!("if statement without a body");
        };
        let cond = self.process(tree, cond_node)?;
        let then = self.process(tree, then_node)?;
        let mut cost = cond.complexity + then.complexity;
        let mut text = format!("if ({}) {}", cond.text, block(&then));
        if let Some(else_node) = tree.child(id, 2) {
            let alt = self.process(tree, else_node)?;
            // An empty else branch is suppressed entirely.
            if alt.visible {
                cost += alt.complexity;
                text.push_str(&format!(" else {}", block(&alt)));
            }
        }
        Ok(Descriptor::new(text, None, cost).no_optimize())
    }

    fn for_statement(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let (Some(init_node), Some(cond_node), Some(iter_node), Some(body_node)) = (
            tree.child(id, 0),
            tree.child(id, 1),
            tree.child(id, 2),
            tree.child(id, 3),
        ) else {
            bail_tree!("for statement missing one of init/condition/iteration/body");
        };
        let init = self.process(tree, init_node)?;
        let cond = self.process(tree, cond_node)?;
        let iter = self.process(tree, iter_node)?;
        let body = self.process(tree, body_node)?;
        // The init clause carries its own terminating semicolon.
        let init_text = if init.visible { init.text.clone() } else { ";".to_string() };
        let text = format!(
            "for ({} {}; {}) {}",
            init_text,
            cond.text,
            iter.text,
            block(&body)
        );
        let cost = init.complexity + cond.complexity + iter.complexity + body.complexity;
        Ok(Descriptor::new(text, None, cost).no_optimize())
    }

    fn while_statement(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        let (Some(cond_node), Some(body_node)) = (tree.child(id, 0), tree.child(id, 1)) else {
            bail_tree!("while statement missing its condition or body");
        };
        let cond = self.process(tree, cond_node)?;
        let body = self.process(tree, body_node)?;
        Ok(Descriptor::new(
            format!("while ({}) {}", cond.text, block(&body)),
            None,
            cond.complexity + body.complexity,
        )
        .no_optimize())
    }

    fn return_statement(&mut self, tree: &SyntaxTree, id: NodeId) -> Result<Descriptor> {
        match tree.child(id, 0) {
            Some(value_node) => {
                let value = self.process(tree, value_node)?;
                if value.visible {
                    Ok(Descriptor::new(
                        format!("return {};", value.text),
                        value.ty.clone(),
                        value.complexity,
                    )
                    .no_optimize())
                } else {
                    Ok(Descriptor::new("return;", None, 0).no_optimize())
                }
            }
            None => Ok(Descriptor::new("return;", None, 0).no_optimize()),
        }
    }
}

/// Brace-wrap a body descriptor, collapsing invisible bodies to `{}`.
fn block(body: &Descriptor) -> String {
    if body.visible {
        format!("{{\n{}\n}}", body.text)
    } else {
        "{}".to_string()
    }
}

/// Indent every non-empty line by one level.
fn indent(text: &str) -> String {
    text.lines()
        .map(|line| {
            if line.is_empty() {
                line.to_string()
            } else {
                format!("  {}", line)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::default_builtins;

    fn transpile(tree: &SyntaxTree) -> (String, Vec<Warning>) {
        let options = Options::default();
        let catalog = LibraryCatalog::new();
        let builtins = default_builtins();
        let names = NameTables::default();
        let mut transpiler = Transpiler::new(&options, &catalog, &builtins, &names);
        let out = transpiler.run(tree).expect("transpile failed");
        (out, transpiler.take_warnings())
    }

    #[test]
    fn test_untagged_node_produces_the_empty_descriptor() {
        let mut tree = SyntaxTree::new();
        let root = tree.add(Tag::Root, None);
        let ghost = tree.add_untagged();
        tree.attach(root, ghost);
        tree.set_root(root);

        let (out, warnings) = transpile(&tree);
        assert_eq!(out, "");
        assert!(warnings.is_empty());
    }

    #[test]
    fn test_structural_tag_out_of_context_warns_and_degrades() {
        let mut tree = SyntaxTree::new();
        let root = tree.add(Tag::Root, None);
        let stray = tree.add(Tag::Declarator, None);
        tree.attach(root, stray);
        tree.set_root(root);

        let (out, warnings) = transpile(&tree);
        assert_eq!(out, "");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].kind, WarningKind::UnknownNodeKind);
    }

    #[test]
    fn test_descriptors_are_memoized_by_node_identity() {
        let mut tree = SyntaxTree::new();
        let root = tree.add(Tag::Root, None);
        let lit = tree.add(Tag::IntConstant, Some("7".to_string()));
        tree.attach(root, lit);
        tree.set_root(root);

        let options = Options::default();
        let catalog = LibraryCatalog::new();
        let builtins = default_builtins();
        let names = NameTables::default();
        let mut transpiler = Transpiler::new(&options, &catalog, &builtins, &names);
        let first = transpiler.process(&tree, lit).unwrap();
        let second = transpiler.process(&tree, lit).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_two_structurally_equal_nodes_cache_independently() {
        let mut tree = SyntaxTree::new();
        let a = tree.add(Tag::IntConstant, Some("7".to_string()));
        let b = tree.add(Tag::IntConstant, Some("7".to_string()));

        let options = Options::default();
        let catalog = LibraryCatalog::new();
        let builtins = default_builtins();
        let names = NameTables::default();
        let mut transpiler = Transpiler::new(&options, &catalog, &builtins, &names);
        let da = transpiler.process(&tree, a).unwrap();
        let db = transpiler.process(&tree, b).unwrap();
        assert!(!Rc::ptr_eq(&da, &db));
        assert_eq!(da.text, db.text);
    }
}

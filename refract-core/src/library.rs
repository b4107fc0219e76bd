//! Support-library catalog, emission-time naming tables, and the built-in
//! identifier table.
//!
//! Routine bodies are opaque JavaScript strings keyed by name. An entry may
//! carry sub-method sources, a rename target for the emitted callee, nested
//! includes pulled in alongside it, and a return type that is either fixed
//! or computed from the call node.

use std::collections::HashMap;
use std::rc::Rc;

use crate::descriptor::{Descriptor, Include};
use crate::tree::{NodeId, SyntaxTree};
use crate::types::TypeTag;

/// Computes a call's return type from the call node and its processed
/// arguments, for routines whose type depends on what they are applied to.
pub type ReturnTypeFn = fn(&SyntaxTree, NodeId, &[Rc<Descriptor>]) -> Option<TypeTag>;

#[derive(Clone)]
pub enum ReturnType {
    Unknown,
    Fixed(TypeTag),
    Computed(ReturnTypeFn),
}

#[derive(Clone)]
pub struct LibraryEntry {
    pub source: String,
    pub methods: HashMap<String, String>,
    pub rename: Option<String>,
    pub includes: Vec<String>,
    pub return_type: ReturnType,
}

impl LibraryEntry {
    pub fn new(source: impl Into<String>) -> Self {
        LibraryEntry {
            source: source.into(),
            methods: HashMap::new(),
            rename: None,
            includes: Vec::new(),
            return_type: ReturnType::Unknown,
        }
    }

    pub fn returns(mut self, ty: TypeTag) -> Self {
        self.return_type = ReturnType::Fixed(ty);
        self
    }

    pub fn computed(mut self, f: ReturnTypeFn) -> Self {
        self.return_type = ReturnType::Computed(f);
        self
    }

    pub fn renamed(mut self, name: impl Into<String>) -> Self {
        self.rename = Some(name.into());
        self
    }

    pub fn requires(mut self, dep: impl Into<String>) -> Self {
        self.includes.push(dep.into());
        self
    }

    pub fn method(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.methods.insert(name.into(), source.into());
        self
    }
}

/// Named runtime-support routines, included in the output on demand.
pub struct LibraryCatalog {
    entries: HashMap<String, LibraryEntry>,
}

impl LibraryCatalog {
    /// Catalog seeded with the default JavaScript runtime routines.
    pub fn new() -> Self {
        let mut catalog = LibraryCatalog::empty();
        catalog.register_arithmetic();
        catalog.register_constructors();
        catalog.register_math();
        catalog.register_geometry();
        catalog.register_texture();
        catalog
    }

    pub fn empty() -> Self {
        LibraryCatalog {
            entries: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, entry: LibraryEntry) {
        self.entries.insert(name.into(), entry);
    }

    pub fn get(&self, name: &str) -> Option<&LibraryEntry> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Serialize the referenced subset: one routine source per line, in
    /// first-use order, each followed by its referenced sub-methods as
    /// `routine.method = <source>`. Returns the preamble and the names that
    /// had no catalog entry.
    pub fn serialize(&self, includes: &[Include]) -> (String, Vec<String>) {
        let mut order: Vec<&str> = Vec::new();
        let mut methods: HashMap<&str, Vec<&str>> = HashMap::new();
        for include in includes {
            if !order.contains(&include.name.as_str()) {
                order.push(&include.name);
            }
            if let Some(method) = &include.method {
                let seen = methods.entry(&include.name).or_default();
                if !seen.contains(&method.as_str()) {
                    seen.push(method);
                }
            }
        }

        let mut lines = Vec::new();
        let mut missing = Vec::new();
        for name in order {
            let Some(entry) = self.entries.get(name) else {
                missing.push(name.to_string());
                continue;
            };
            lines.push(entry.source.clone());
            for method in methods.get(name).map(|v| v.as_slice()).unwrap_or(&[]) {
                match entry.methods.get(*method) {
                    Some(source) => lines.push(format!("{}.{} = {}", name, method, source)),
                    None => missing.push(format!("{}.{}", name, method)),
                }
            }
        }
        (lines.join("\n"), missing)
    }

    fn register_arithmetic(&mut self) {
        // The four arithmetic helpers give vectors and matrices uniform
        // component-wise semantics regardless of operand shape.
        self.insert("add", LibraryEntry::new(
            "function add(a, b) { if (a.length === undefined && b.length === undefined) return a + b; var n = (a.length === undefined ? b : a).length, r = []; for (var i = 0; i < n; i++) r.push((a.length === undefined ? a : a[i]) + (b.length === undefined ? b : b[i])); return r; }",
        ));
        self.insert("subtract", LibraryEntry::new(
            "function subtract(a, b) { if (a.length === undefined && b.length === undefined) return a - b; var n = (a.length === undefined ? b : a).length, r = []; for (var i = 0; i < n; i++) r.push((a.length === undefined ? a : a[i]) - (b.length === undefined ? b : b[i])); return r; }",
        ));
        self.insert("multiply", LibraryEntry::new(
            "function multiply(a, b) { if (a.length === undefined && b.length === undefined) return a * b; var n = (a.length === undefined ? b : a).length, r = []; for (var i = 0; i < n; i++) r.push((a.length === undefined ? a : a[i]) * (b.length === undefined ? b : b[i])); return r; }",
        ));
        self.insert("divide", LibraryEntry::new(
            "function divide(a, b) { if (a.length === undefined && b.length === undefined) return a / b; var n = (a.length === undefined ? b : a).length, r = []; for (var i = 0; i < n; i++) r.push((a.length === undefined ? a : a[i]) / (b.length === undefined ? b : b[i])); return r; }",
        ));
    }

    fn register_constructors(&mut self) {
        self.insert("float", LibraryEntry::new(
            "function float(v) { return Number(v); }",
        ).returns(TypeTag::Float));
        self.insert("int", LibraryEntry::new(
            "function int(v) { return v | 0; }",
        ).returns(TypeTag::Int));
        self.insert("bool", LibraryEntry::new(
            "function bool(v) { return !!v; }",
        ).returns(TypeTag::Bool));
        self.insert("vec2", LibraryEntry::new(
            "function vec2(x, y) { if (x === undefined) x = 0; if (x.length !== undefined) return x.slice(0, 2); return [x, y === undefined ? x : y]; }",
        ).returns(TypeTag::Vec(2)));
        self.insert("vec3", LibraryEntry::new(
            "function vec3(x, y, z) { if (x === undefined) x = 0; if (x.length !== undefined) return [].concat.apply([], [x, y, z].filter(function (a) { return a !== undefined; })).slice(0, 3); return y === undefined ? [x, x, x] : [x, y, z]; }",
        ).returns(TypeTag::Vec(3)));
        self.insert("vec4", LibraryEntry::new(
            "function vec4(x, y, z, w) { if (x === undefined) x = 0; if (x.length !== undefined) return [].concat.apply([], [x, y, z, w].filter(function (a) { return a !== undefined; })).slice(0, 4); return y === undefined ? [x, x, x, x] : [x, y, z, w]; }",
        ).returns(TypeTag::Vec(4)));
        self.insert("mat2", LibraryEntry::new(
            "function mat2(a, b, c, d) { if (a === undefined) return [[0, 0], [0, 0]]; if (b === undefined) return [[a, 0], [0, a]]; if (a.length !== undefined) return [a, b]; return [[a, b], [c, d]]; }",
        ).returns(TypeTag::Mat(2)));
        self.insert("mat3", LibraryEntry::new(
            "function mat3(a) { var v = Array.prototype.slice.call(arguments); if (a === undefined) return mat3(0); if (v.length === 1) return [[a, 0, 0], [0, a, 0], [0, 0, a]]; if (a.length !== undefined) return v; return [v.slice(0, 3), v.slice(3, 6), v.slice(6, 9)]; }",
        ).returns(TypeTag::Mat(3)));
        self.insert("mat4", LibraryEntry::new(
            "function mat4(a) { var v = Array.prototype.slice.call(arguments); if (a === undefined) return mat4(0); if (v.length === 1) return [[a, 0, 0, 0], [0, a, 0, 0], [0, 0, a, 0], [0, 0, 0, a]]; if (a.length !== undefined) return v; return [v.slice(0, 4), v.slice(4, 8), v.slice(8, 12), v.slice(12, 16)]; }",
        ).returns(TypeTag::Mat(4)));
    }

    fn register_math(&mut self) {
        self.insert("mod", LibraryEntry::new(
            "function mod(a, b) { return a - b * Math.floor(a / b); }",
        ).computed(first_argument_type));
        self.insert("fract", LibraryEntry::new(
            "function fract(x) { return x - Math.floor(x); }",
        ).computed(first_argument_type));
        self.insert("clamp", LibraryEntry::new(
            "function clamp(x, lo, hi) { return Math.min(Math.max(x, lo), hi); }",
        ).computed(first_argument_type));
        self.insert("mix", LibraryEntry::new(
            "function mix(a, b, t) { return a + (b - a) * t; }",
        ).computed(first_argument_type));
        self.insert("step", LibraryEntry::new(
            "function step(edge, x) { return x < edge ? 0.0 : 1.0; }",
        ).computed(second_argument_type));
        self.insert("smoothstep", LibraryEntry::new(
            "function smoothstep(e0, e1, x) { var t = clamp((x - e0) / (e1 - e0), 0.0, 1.0); return t * t * (3.0 - 2.0 * t); }",
        ).requires("clamp").computed(third_argument_type));
        self.insert("discard", LibraryEntry::new(
            "function discard() { throw { discard: true }; }",
        ));
    }

    fn register_geometry(&mut self) {
        self.insert("dot", LibraryEntry::new(
            "function dot(a, b) { var s = 0; for (var i = 0; i < a.length; i++) s += a[i] * b[i]; return s; }",
        ).returns(TypeTag::Float));
        self.insert("length", LibraryEntry::new(
            "function length(v) { return Math.sqrt(dot(v, v)); }",
        ).requires("dot").returns(TypeTag::Float));
        self.insert("distance", LibraryEntry::new(
            "function distance(a, b) { return length(subtract(a, b)); }",
        ).requires("length").requires("subtract").returns(TypeTag::Float));
        self.insert("normalize", LibraryEntry::new(
            "function normalize(v) { var n = length(v), r = []; for (var i = 0; i < v.length; i++) r.push(v[i] / n); return r; }",
        ).requires("length").computed(first_argument_type));
        self.insert("cross", LibraryEntry::new(
            "function cross(a, b) { return [a[1] * b[2] - a[2] * b[1], a[2] * b[0] - a[0] * b[2], a[0] * b[1] - a[1] * b[0]]; }",
        ).returns(TypeTag::Vec(3)));
        self.insert("reflect", LibraryEntry::new(
            "function reflect(i, n) { return subtract(i, multiply(multiply(n, dot(n, i)), 2.0)); }",
        ).requires("subtract").requires("multiply").requires("dot").computed(first_argument_type));
    }

    fn register_texture(&mut self) {
        self.insert("texture2D", LibraryEntry::new(
            "function texture2D(sampler, uv) { return sampler.sample ? sampler.sample(uv) : [0, 0, 0, 0]; }",
        ).returns(TypeTag::Vec(4))
            .method("lod", "function (sampler, uv, level) { return texture2D(sampler, uv); }")
            .method("bias", "function (sampler, uv, bias) { return texture2D(sampler, uv); }"));
    }
}

impl Default for LibraryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn first_argument_type(_: &SyntaxTree, _: NodeId, args: &[Rc<Descriptor>]) -> Option<TypeTag> {
    args.first().and_then(|a| a.ty.clone())
}

fn second_argument_type(_: &SyntaxTree, _: NodeId, args: &[Rc<Descriptor>]) -> Option<TypeTag> {
    args.get(1).and_then(|a| a.ty.clone())
}

fn third_argument_type(_: &SyntaxTree, _: NodeId, args: &[Rc<Descriptor>]) -> Option<TypeTag> {
    args.get(2).and_then(|a| a.ty.clone())
}

/// Flat rename tables consulted during emission: declared-type names and
/// resolved call names to alternate emitted spellings.
#[derive(Debug, Clone)]
pub struct NameTables {
    pub types: HashMap<String, String>,
    pub calls: HashMap<String, String>,
}

impl Default for NameTables {
    fn default() -> Self {
        let mut calls = HashMap::new();
        for name in [
            "sin", "cos", "tan", "asin", "acos", "atan", "pow", "exp", "log", "sqrt", "abs",
            "sign", "floor", "ceil", "min", "max",
        ] {
            calls.insert(name.to_string(), format!("Math.{}", name));
        }
        NameTables {
            types: HashMap::new(),
            calls,
        }
    }
}

/// Environment-provided identifiers and their types, seeded into the global
/// scope at the start of every compile.
pub fn default_builtins() -> HashMap<String, TypeTag> {
    let mut table = HashMap::new();
    table.insert("gl_Position".to_string(), TypeTag::Vec(4));
    table.insert("gl_FragColor".to_string(), TypeTag::Vec(4));
    table.insert("gl_FragCoord".to_string(), TypeTag::Vec(4));
    table.insert("gl_PointCoord".to_string(), TypeTag::Vec(2));
    table.insert("gl_PointSize".to_string(), TypeTag::Float);
    table.insert("gl_FragDepth".to_string(), TypeTag::Float);
    table.insert("gl_FrontFacing".to_string(), TypeTag::Bool);
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_dedupes_and_keeps_first_use_order() {
        let mut catalog = LibraryCatalog::empty();
        catalog.insert("a", LibraryEntry::new("function a() {}"));
        catalog.insert("b", LibraryEntry::new("function b() {}"));

        let includes = vec![
            Include::routine("b"),
            Include::routine("a"),
            Include::routine("b"),
        ];
        let (preamble, missing) = catalog.serialize(&includes);
        assert_eq!(preamble, "function b() {}\nfunction a() {}");
        assert!(missing.is_empty());
    }

    #[test]
    fn test_serialize_renders_sub_methods_after_their_routine() {
        let mut catalog = LibraryCatalog::empty();
        catalog.insert(
            "tex",
            LibraryEntry::new("function tex() {}").method("lod", "function () {}"),
        );
        let includes = vec![Include::method("tex", "lod")];
        let (preamble, missing) = catalog.serialize(&includes);
        assert_eq!(preamble, "function tex() {}\ntex.lod = function () {}");
        assert!(missing.is_empty());
    }

    #[test]
    fn test_serialize_reports_missing_entries() {
        let catalog = LibraryCatalog::empty();
        let (preamble, missing) = catalog.serialize(&[Include::routine("nope")]);
        assert_eq!(preamble, "");
        assert_eq!(missing, vec!["nope".to_string()]);
    }

    #[test]
    fn test_default_catalog_covers_the_arithmetic_helpers() {
        let catalog = LibraryCatalog::new();
        for name in ["add", "subtract", "multiply", "divide"] {
            assert!(catalog.contains(name), "missing {}", name);
        }
    }
}

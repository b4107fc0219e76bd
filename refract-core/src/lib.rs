//! refract-core: translate GLSL shader source into JavaScript that
//! preserves the numeric and vector/matrix semantics JavaScript does not
//! natively express (component-wise arithmetic, swizzled field access,
//! fixed-size vector/matrix types, implicit integer/float coercions).
//!
//! The pipeline is preprocess -> tokenize -> parse -> transform: a single
//! memoized walk over the syntax tree that renders each node, infers its
//! type and cost, expands composite values when that is cheaper, and
//! collects the support-library routines the output depends on.

pub mod descriptor;
pub mod error;
pub mod lexer;
pub mod library;
pub mod optimize;
pub mod parser;
pub mod preprocess;
pub mod scope;
pub mod structs;
pub mod swizzle;
pub mod transform;
pub mod tree;
pub mod types;


use std::collections::HashMap;
use std::fmt;

use error::{CompileError, Result};
use library::{LibraryCatalog, NameTables};
use transform::Transpiler;
use tree::SyntaxTree;
use types::TypeTag;

pub use transform::{Warning, WarningKind};

/// How source text is preprocessed before parsing.
pub enum Preprocess {
    /// Hand the source to the parser untouched.
    Off,
    /// Run the built-in macro/conditional preprocessor.
    Standard,
    /// Caller-supplied replacement.
    Custom(Box<dyn Fn(&str) -> String>),
}

impl Default for Preprocess {
    fn default() -> Self {
        Preprocess::Standard
    }
}

impl fmt::Debug for Preprocess {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Preprocess::Off => write!(f, "Off"),
            Preprocess::Standard => write!(f, "Standard"),
            Preprocess::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

#[derive(Debug)]
pub struct Options {
    /// Whether the compact/expanded rewrite runs (default on).
    pub optimize: bool,
    pub preprocess: Preprocess,
    /// Reserved.
    pub debug: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options {
            optimize: true,
            preprocess: Preprocess::default(),
            debug: false,
        }
    }
}

/// The compiler facade. One instance holds the configuration and the
/// collaborator tables; per-compile state is created fresh inside every
/// `compile`/`compile_tree` call, so independent compilations never leak
/// into one another.
pub struct Compiler {
    options: Options,
    catalog: LibraryCatalog,
    builtins: HashMap<String, TypeTag>,
    names: NameTables,
    warnings: Vec<Warning>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new()
    }
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            options: Options::default(),
            catalog: LibraryCatalog::new(),
            builtins: library::default_builtins(),
            names: NameTables::default(),
            warnings: Vec::new(),
        }
    }

    pub fn with_options(options: Options) -> Self {
        let mut compiler = Self::new();
        compiler.options = options;
        compiler
    }

    /// Replace the support-library catalog.
    pub fn with_catalog(mut self, catalog: LibraryCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    /// Replace the built-in identifier table.
    pub fn with_builtins(mut self, builtins: HashMap<String, TypeTag>) -> Self {
        self.builtins = builtins;
        self
    }

    /// Replace the declared-type/call rename tables.
    pub fn with_names(mut self, names: NameTables) -> Self {
        self.names = names;
        self
    }

    /// Compile GLSL source text to JavaScript.
    pub fn compile(&mut self, source: &str) -> Result<String> {
        let source = match &self.options.preprocess {
            Preprocess::Off => source.to_string(),
            Preprocess::Standard => preprocess::run(source)?,
            Preprocess::Custom(f) => f(source),
        };
        let tokens = lexer::tokenize(&source).map_err(CompileError::ParseError)?;
        let mut parser = parser::Parser::new(tokens);
        let tree = parser.parse()?;
        self.compile_tree(&tree)
    }

    /// Compile a tree produced by an external parser.
    pub fn compile_tree(&mut self, tree: &SyntaxTree) -> Result<String> {
        let mut transpiler = Transpiler::new(&self.options, &self.catalog, &self.builtins, &self.names);
        let output = transpiler.run(tree);
        self.warnings = transpiler.take_warnings();
        output
    }

    /// Warnings collected by the most recent compile.
    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }
}

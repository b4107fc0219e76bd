//! Semantic type tags for the GLSL subset.
//!
//! The type domain is closed: three scalars, vectors and square matrices of
//! arity 2 to 4, and registered struct names. Inference is local per node,
//! so a full unification engine is unnecessary.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeTag {
    Bool,
    Int,
    Float,
    /// vecN, N in 2..=4
    Vec(u8),
    /// matN (square), N in 2..=4
    Mat(u8),
    /// User-defined aggregate registered through the struct registry.
    Struct(String),
}

impl TypeTag {
    /// Parse a declared type name. Struct names are resolved by the caller
    /// against the struct registry, not here.
    pub fn from_name(name: &str) -> Option<TypeTag> {
        match name {
            "bool" => Some(TypeTag::Bool),
            "int" => Some(TypeTag::Int),
            "float" => Some(TypeTag::Float),
            "vec2" => Some(TypeTag::Vec(2)),
            "vec3" => Some(TypeTag::Vec(3)),
            "vec4" => Some(TypeTag::Vec(4)),
            "mat2" => Some(TypeTag::Mat(2)),
            "mat3" => Some(TypeTag::Mat(3)),
            "mat4" => Some(TypeTag::Mat(4)),
            _ => None,
        }
    }

    /// Number of addressable elements, for composite types.
    pub fn component_count(&self) -> Option<usize> {
        match self {
            TypeTag::Vec(n) => Some(*n as usize),
            TypeTag::Mat(n) => Some((*n as usize) * (*n as usize)),
            _ => None,
        }
    }

    /// Type of a single indexed element.
    pub fn element_type(&self) -> Option<TypeTag> {
        match self {
            TypeTag::Vec(_) => Some(TypeTag::Float),
            TypeTag::Mat(n) => Some(TypeTag::Vec(*n)),
            _ => None,
        }
    }

    /// First dimension digit; row group size for the matrix expansion.
    pub fn dimension(&self) -> Option<u8> {
        match self {
            TypeTag::Vec(n) | TypeTag::Mat(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_composite(&self) -> bool {
        matches!(self, TypeTag::Vec(_) | TypeTag::Mat(_))
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self, TypeTag::Bool | TypeTag::Int | TypeTag::Float)
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            TypeTag::Bool => write!(f, "bool"),
            TypeTag::Int => write!(f, "int"),
            TypeTag::Float => write!(f, "float"),
            TypeTag::Vec(n) => write!(f, "vec{}", n),
            TypeTag::Mat(n) => write!(f, "mat{}", n),
            TypeTag::Struct(name) => write!(f, "{}", name),
        }
    }
}

/// Result type of a binary arithmetic operation.
///
/// Composite operands win over scalars (component-wise semantics), and float
/// wins over int (implicit coercion). Ties go to the left operand.
pub fn wider(left: Option<&TypeTag>, right: Option<&TypeTag>) -> Option<TypeTag> {
    match (left, right) {
        (Some(l), _) if l.is_composite() => Some(l.clone()),
        (_, Some(r)) if r.is_composite() => Some(r.clone()),
        (Some(TypeTag::Float), _) | (_, Some(TypeTag::Float)) => Some(TypeTag::Float),
        (Some(l), _) => Some(l.clone()),
        (None, Some(r)) => Some(r.clone()),
        (None, None) => None,
    }
}

/// Normalize a float literal's spelling for emission: drop the `f`/`F`
/// suffix, guarantee a digit on both sides of the point. The remaining
/// digits are preserved verbatim.
pub fn normalize_float(text: &str) -> String {
    let trimmed = text.trim_end_matches(['f', 'F']);
    let mut out = String::with_capacity(trimmed.len() + 2);
    if trimmed.starts_with('.') {
        out.push('0');
    }
    out.push_str(trimmed);
    if out.ends_with('.') {
        out.push('0');
    }
    if !out.contains(['.', 'e', 'E']) {
        out.push_str(".0");
    }
    out
}

//! Swizzle expansion: field-access syntax selecting and reordering the
//! positional components of a vector.
//!
//! Three letter alphabets are accepted (positional `xyzw`, texture
//! coordinate `stpq`, color `rgba`), all mapping onto the same positions
//! 0-3. Each letter of the property selects one component of the base
//! expression; multi-letter properties build a new vector in the requested
//! order, which makes swizzle-of-swizzle and reordering work for free.

use std::rc::Rc;

use crate::descriptor::Descriptor;
use crate::types::TypeTag;

/// Position index for a single swizzle letter.
pub fn position(letter: char) -> Option<usize> {
    match letter {
        'x' | 's' | 'r' => Some(0),
        'y' | 't' | 'g' => Some(1),
        'z' | 'p' | 'b' => Some(2),
        'w' | 'q' | 'a' => Some(3),
        _ => None,
    }
}

/// Whether a property name is swizzle-shaped: 1-4 letters, all from the
/// accepted alphabets.
pub fn is_swizzle(property: &str) -> bool {
    !property.is_empty() && property.len() <= 4 && property.chars().all(|c| position(c).is_some())
}

/// Result of expanding a swizzle access.
pub struct Expansion {
    pub descriptor: Descriptor,
    /// Letters whose position fell outside the base value's arity.
    pub out_of_range: Vec<char>,
}

/// Expand `base.property` into index-based component selection.
///
/// The caller guarantees `is_swizzle(property)`. Out-of-range positions
/// produce a numeric `0.0` placeholder and are reported back for warning.
pub fn expand(base: &Rc<Descriptor>, property: &str) -> Expansion {
    let arity = base
        .components
        .as_ref()
        .map(|c| c.len())
        .or_else(|| base.ty.as_ref().and_then(|t| t.component_count()))
        .unwrap_or(0);

    let mut out_of_range = Vec::new();
    let mut selected = Vec::with_capacity(property.len());
    for letter in property.chars() {
        let pos = position(letter).expect("caller checked is_swizzle");
        if pos >= arity {
            out_of_range.push(letter);
            selected.push(Rc::new(Descriptor::literal("0.0", Some(TypeTag::Float))));
            continue;
        }
        selected.push(component(base, pos));
    }

    let descriptor = if selected.len() == 1 {
        Descriptor::new(selected[0].text.clone(), Some(TypeTag::Float), 1)
    } else {
        let texts: Vec<&str> = selected.iter().map(|c| c.text.as_str()).collect();
        let n = selected.len() as u8;
        Descriptor::new(format!("[{}]", texts.join(", ")), Some(TypeTag::Vec(n)), 2 * n as u32)
            .with_components(selected)
    };

    Expansion {
        descriptor,
        out_of_range,
    }
}

/// Component at `pos`, synthesized as an index expression when the base has
/// a composite type but no materialized component list (call results).
fn component(base: &Rc<Descriptor>, pos: usize) -> Rc<Descriptor> {
    if let Some(components) = &base.components {
        return components[pos].clone();
    }
    Rc::new(Descriptor::literal(
        format!("{}[{}]", base.text, pos),
        Some(TypeTag::Float),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vec_base(name: &str, n: u8) -> Rc<Descriptor> {
        let components = (0..n)
            .map(|i| Rc::new(Descriptor::literal(format!("{}[{}]", name, i), Some(TypeTag::Float))))
            .collect();
        Rc::new(
            Descriptor::literal(name, Some(TypeTag::Vec(n))).with_components(components),
        )
    }

    #[test]
    fn test_all_three_alphabets_map_to_the_same_positions() {
        for (a, b, c) in [('x', 's', 'r'), ('y', 't', 'g'), ('z', 'p', 'b'), ('w', 'q', 'a')] {
            assert_eq!(position(a), position(b));
            assert_eq!(position(b), position(c));
        }
        assert_eq!(position('m'), None);
    }

    #[test]
    fn test_single_letter_yields_float_of_cost_one() {
        let base = vec_base("v", 4);
        let e = expand(&base, "z");
        assert_eq!(e.descriptor.ty, Some(TypeTag::Float));
        assert_eq!(e.descriptor.complexity, 1);
        assert_eq!(e.descriptor.text, "v[2]");
        assert!(e.out_of_range.is_empty());
    }

    #[test]
    fn test_multi_letter_selects_in_requested_order() {
        let base = vec_base("v", 2);
        let xy = expand(&base, "xy");
        let yx = expand(&base, "yx");
        assert_eq!(xy.descriptor.ty, Some(TypeTag::Vec(2)));
        assert_eq!(xy.descriptor.complexity, 4);
        assert_eq!(xy.descriptor.text, "[v[0], v[1]]");
        assert_eq!(yx.descriptor.text, "[v[1], v[0]]");
    }

    #[test]
    fn test_swizzle_of_swizzle_composes() {
        let base = vec_base("v", 4);
        let zw = Rc::new(expand(&base, "zw").descriptor);
        let back = expand(&zw, "yx");
        assert_eq!(back.descriptor.text, "[v[3], v[2]]");
    }

    #[test]
    fn test_out_of_range_letter_reports_and_emits_placeholder() {
        let base = vec_base("v", 2);
        let e = expand(&base, "xyz");
        assert_eq!(e.out_of_range, vec!['z']);
        assert_eq!(e.descriptor.text, "[v[0], v[1], 0.0]");
    }

    #[test]
    fn test_components_synthesized_for_unmaterialized_base() {
        let base = Rc::new(Descriptor::literal("normalize(v)", Some(TypeTag::Vec(3))));
        let e = expand(&base, "x");
        assert_eq!(e.descriptor.text, "normalize(v)[0]");
    }
}

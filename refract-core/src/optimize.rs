//! Compact-vs-expanded rendering of composite values.
//!
//! Many composite expressions are cheaper to express as an explicit array
//! literal than as a runtime construction call. When the summed cost of a
//! descriptor's components undercuts the descriptor's own cost, the text is
//! rewritten to the expanded list form. The decision is purely local: one
//! descriptor and its immediate components, nothing else.

use crate::descriptor::Descriptor;
use crate::types::TypeTag;

/// Apply the expansion heuristic to a freshly computed descriptor.
pub fn pass(desc: Descriptor) -> Descriptor {
    if !desc.optimize {
        return desc;
    }
    let dimension = match &desc.ty {
        Some(ty @ (TypeTag::Vec(_) | TypeTag::Mat(_))) => ty.dimension().unwrap(),
        _ => return desc,
    };
    let Some(components) = &desc.components else {
        return desc;
    };
    if components.len() < 2 {
        return desc;
    }

    let expanded_cost: u32 = components.iter().map(|c| c.complexity).sum();
    if expanded_cost >= desc.complexity {
        return desc;
    }

    let text = match desc.ty {
        Some(TypeTag::Mat(_)) => {
            // Partition the flat component list into row groups of the first
            // dimension digit, coercing each element to numeric form.
            let rows: Vec<String> = components
                .chunks(dimension as usize)
                .map(|row| {
                    let elems: Vec<String> = row.iter().map(|c| numeric(&c.text)).collect();
                    format!("[{}]", elems.join(", "))
                })
                .collect();
            format!("[{}]", rows.join(", "))
        }
        _ => {
            let elems: Vec<&str> = components.iter().map(|c| c.text.as_str()).collect();
            format!("[{}]", elems.join(", "))
        }
    };

    let mut expanded = desc;
    expanded.text = text;
    expanded.complexity = expanded_cost;
    expanded
}

/// Numeric coercion for matrix elements: literal spellings pass through,
/// anything else is wrapped in a runtime conversion.
fn numeric(text: &str) -> String {
    if text.parse::<f64>().is_ok() {
        text.to_string()
    } else {
        format!("Number({})", text)
    }
}

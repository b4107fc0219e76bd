//! Default preprocessor: object-like `#define` substitution and
//! `#ifdef`-family conditional inclusion.
//!
//! This is the `Preprocess::Standard` collaborator; callers can disable it
//! or supply their own function through `Options::preprocess`. Directives
//! that only concern a real GPU driver (`#version`, `#extension`,
//! `#pragma`, `#line`) are dropped from the output.

use std::collections::HashMap;

use crate::bail_preprocess;
use crate::error::Result;

struct Conditional {
    /// Whether the enclosing context was emitting at `#ifdef` time.
    parent: bool,
    /// Whether any branch of this conditional has been taken.
    taken: bool,
    /// Whether the current branch is emitting.
    active: bool,
    has_else: bool,
}

pub fn run(source: &str) -> Result<String> {
    let mut defines: HashMap<String, String> = HashMap::new();
    let mut stack: Vec<Conditional> = Vec::new();
    let mut out = String::new();

    for (index, line) in source.lines().enumerate() {
        let lineno = index + 1;
        let trimmed = line.trim_start();
        let Some(directive) = trimmed.strip_prefix('#') else {
            if emitting(&stack) {
                out.push_str(&substitute(line, &defines));
                out.push('\n');
            }
            continue;
        };

        let mut parts = directive.trim().split_whitespace();
        match parts.next().unwrap_or("") {
            "define" => {
                if emitting(&stack) {
                    let Some(name) = parts.next() else {
                        bail_preprocess!("#define without a macro name on line {}", lineno);
                    };
                    if name.contains('(') {
                        bail_preprocess!(
                            "function-like macro '{}' is not supported (line {})",
                            name,
                            lineno
                        );
                    }
                    let replacement = parts.collect::<Vec<_>>().join(" ");
                    defines.insert(name.to_string(), replacement);
                }
            }
            "undef" => {
                if emitting(&stack) {
                    let Some(name) = parts.next() else {
                        bail_preprocess!("#undef without a macro name on line {}", lineno);
                    };
                    defines.remove(name);
                }
            }
            "ifdef" | "ifndef" => {
                let negate = directive.trim().starts_with("ifndef");
                let Some(name) = parts.next() else {
                    bail_preprocess!("conditional without a macro name on line {}", lineno);
                };
                let parent = emitting(&stack);
                let cond = defines.contains_key(name) != negate;
                stack.push(Conditional {
                    parent,
                    taken: parent && cond,
                    active: parent && cond,
                    has_else: false,
                });
            }
            "else" => {
                let Some(top) = stack.last_mut() else {
                    bail_preprocess!("#else without a matching #ifdef on line {}", lineno);
                };
                if top.has_else {
                    bail_preprocess!("duplicate #else on line {}", lineno);
                }
                top.has_else = true;
                top.active = top.parent && !top.taken;
                top.taken = top.taken || top.active;
            }
            "endif" => {
                if stack.pop().is_none() {
                    bail_preprocess!("#endif without a matching #ifdef on line {}", lineno);
                }
            }
            "if" | "elif" => {
                bail_preprocess!("#if/#elif expressions are not supported (line {})", lineno);
            }
            // Driver-level directives have no meaning for the JS target.
            _ => {}
        }
    }

    if !stack.is_empty() {
        bail_preprocess!("unterminated conditional block");
    }
    Ok(out)
}

fn emitting(stack: &[Conditional]) -> bool {
    stack.last().map(|c| c.active).unwrap_or(true)
}

/// Replace defined macro names with their expansions. One pass, identifier
/// boundaries only.
fn substitute(line: &str, defines: &HashMap<String, String>) -> String {
    if defines.is_empty() {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len());
    let mut chars = line.char_indices().peekable();
    while let Some(&(start, c)) = chars.peek() {
        if c.is_ascii_alphabetic() || c == '_' {
            let mut end = start;
            while let Some(&(i, c)) = chars.peek() {
                if c.is_ascii_alphanumeric() || c == '_' {
                    end = i + c.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            let word = &line[start..end];
            match defines.get(word) {
                Some(replacement) => out.push_str(replacement),
                None => out.push_str(word),
            }
        } else {
            out.push(c);
            chars.next();
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_define_substitutes_at_identifier_boundaries() {
        let out = run("#define PI 3.14159\nfloat x = PI;\nfloat y = PIE;").unwrap();
        assert_eq!(out, "float x = 3.14159;\nfloat y = PIE;\n");
    }

    #[test]
    fn test_ifdef_controls_inclusion() {
        let source = "#define A\n#ifdef A\nyes;\n#else\nno;\n#endif";
        assert_eq!(run(source).unwrap(), "yes;\n");

        let source = "#ifdef A\nyes;\n#else\nno;\n#endif";
        assert_eq!(run(source).unwrap(), "no;\n");
    }

    #[test]
    fn test_ifndef_inverts() {
        let source = "#ifndef A\nyes;\n#endif";
        assert_eq!(run(source).unwrap(), "yes;\n");
    }

    #[test]
    fn test_nested_conditionals_respect_the_parent() {
        let source = "#ifdef A\n#ifdef B\ninner;\n#endif\nouter;\n#endif\ndone;";
        assert_eq!(run(source).unwrap(), "done;\n");
    }

    #[test]
    fn test_undef_removes_a_macro() {
        let source = "#define A\n#undef A\n#ifdef A\nyes;\n#endif\ndone;";
        assert_eq!(run(source).unwrap(), "done;\n");
    }

    #[test]
    fn test_version_and_extension_lines_are_dropped() {
        let out = run("#version 100\n#extension GL_OES_standard_derivatives : enable\nx;").unwrap();
        assert_eq!(out, "x;\n");
    }

    #[test]
    fn test_unbalanced_endif_errors() {
        assert!(run("#endif").is_err());
        assert!(run("#ifdef A\nx;").is_err());
    }

    #[test]
    fn test_function_like_macros_are_rejected() {
        assert!(run("#define F(x) x").is_err());
    }
}

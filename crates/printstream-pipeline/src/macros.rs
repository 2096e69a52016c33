//! Macro expansion for configured G-code blocks
//!
//! Tool-change blocks may reference live values with `[name]` placeholders,
//! e.g. `M104 S[temperature]` or `G1 X[park_x] F6000`. Names the lookup does
//! not know are left in place verbatim so a typo is visible in the output
//! instead of silently vanishing.

/// Replace `[name]` placeholders using the lookup
pub fn expand_macros(template: &str, lookup: &dyn Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('[') {
        out.push_str(&rest[..open]);
        let after_open = &rest[open + 1..];
        match after_open.find(']') {
            Some(close) => {
                let name = &after_open[..close];
                match lookup(name) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('[');
                        out.push_str(name);
                        out.push(']');
                    }
                }
                rest = &after_open[close + 1..];
            }
            None => {
                // unterminated placeholder, keep the remainder as-is
                out.push_str(&rest[open..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "temperature" => Some("210".to_string()),
            "tool" => Some("1".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_expands_known_names() {
        assert_eq!(
            expand_macros("M104 T[tool] S[temperature]", &lookup),
            "M104 T1 S210"
        );
    }

    #[test]
    fn test_unknown_names_left_verbatim() {
        assert_eq!(
            expand_macros("G1 X[park_x] F6000", &lookup),
            "G1 X[park_x] F6000"
        );
    }

    #[test]
    fn test_unterminated_placeholder_kept() {
        assert_eq!(expand_macros("G1 X[park", &lookup), "G1 X[park");
    }

    #[test]
    fn test_no_placeholders() {
        assert_eq!(expand_macros("G28 ; home", &lookup), "G28 ; home");
    }
}

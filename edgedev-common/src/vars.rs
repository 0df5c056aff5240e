//! `$VAR` / `${VAR}` expansion.
//!
//! Unknown variables, and `${...}` forms whose body is not a plain variable
//! name (such as `${MODULES.filtermodule.amd64}`), are left untouched.

use std::collections::BTreeMap;

/// Expand every known variable reference in `input`.
pub fn expand_vars(input: &str, vars: &BTreeMap<String, String>) -> String {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        let (name, consumed) = match after.strip_prefix('{') {
            Some(braced) => match braced.find('}') {
                Some(end) if is_var_name(&braced[..end]) => (&braced[..end], end + 2),
                _ => ("", 0),
            },
            None => {
                let len = after
                    .find(|c: char| !is_var_char(c))
                    .unwrap_or(after.len());
                (&after[..len], len)
            }
        };

        if let Some(value) = (!name.is_empty()).then(|| vars.get(name)).flatten() {
            out.push_str(value);
            rest = &after[consumed..];
        } else {
            out.push('$');
            rest = after;
        }
    }

    out.push_str(rest);
    out
}

fn is_var_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_var_name(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_var_char)
}

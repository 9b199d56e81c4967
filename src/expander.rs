/// Rewrite `$NAME` references in every token using the process environment.
pub fn expand(tokens: Vec<String>) -> Vec<String> {
    tokens.into_iter().map(|token| expand_token(&token)).collect()
}

/// Expand a single token.
///
/// A token that is exactly `$` plus a name (no quote characters anywhere)
/// is replaced wholesale by that variable. Otherwise every `$` followed by
/// a run of letters, digits or `_` is substituted in place, and a `$` with
/// no name after it stays literal. Unset variables expand to nothing.
fn expand_token(token: &str) -> String {
    if let Some(name) = token.strip_prefix('$') {
        if !name.is_empty() && !token.contains(['"', '\'']) {
            return lookup(name);
        }
    }

    if !token.contains('$') {
        return token.to_string();
    }

    let mut result = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '$' {
            result.push(ch);
            continue;
        }

        let mut name = String::new();
        while let Some(&c) = chars.peek() {
            if !is_name_char(c) {
                break;
            }
            name.push(c);
            chars.next();
        }

        if name.is_empty() {
            result.push('$');
        } else {
            result.push_str(&lookup(&name));
        }
    }

    result
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Value of an environment variable, or the empty string.
///
/// Names the OS cannot represent (`=`, NUL) are treated as unset.
fn lookup(name: &str) -> String {
    if name.contains(['=', '\0']) {
        return String::new();
    }
    std::env::var_os(name)
        .map(|value| value.to_string_lossy().into_owned())
        .unwrap_or_default()
}

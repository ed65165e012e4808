//! `:identifier` placeholder substitution
//!
//! Fetch targets (`uri`, `repo`, `filePath`, `prometheusQuery`) may carry
//! tokens like `:name`. Every token is replaced wholesale by the single value
//! threaded through the current fetch. A token is a `:` followed by one or
//! more ASCII letters or underscores, so `https://` and `:8080` are left alone.

/// Replace every `:identifier` token in `target` with `value`
pub fn replace(target: &str, value: &str) -> String {
    let bytes = target.as_bytes();
    let mut out = String::with_capacity(target.len());
    let mut last = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b':' {
            let end = bytes[i + 1..]
                .iter()
                .position(|b| !is_ident(*b))
                .map_or(bytes.len(), |p| i + 1 + p);
            if end > i + 1 {
                out.push_str(&target[last..i]);
                out.push_str(value);
                last = end;
                i = end;
                continue;
            }
        }
        i += 1;
    }

    out.push_str(&target[last..]);
    out
}

fn is_ident(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_'
}

/// Strip one level of string-literal quoting, leaving anything else untouched
///
/// `"abc"` → `abc` (escapes decoded), `` `abc` `` → `abc`, `abc` → `abc`.
pub fn unquote(value: &str) -> String {
    if value.len() >= 2 && value.starts_with('"') && value.ends_with('"') {
        if let Ok(decoded) = serde_json::from_str::<String>(value) {
            return decoded;
        }
    }
    if value.len() >= 2 && value.starts_with('`') && value.ends_with('`') {
        return value[1..value.len() - 1].to_string();
    }
    value.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replaces_single_token() {
        assert_eq!(
            replace("https://api.example.com/services/:name/health", "payments"),
            "https://api.example.com/services/payments/health"
        );
    }

    #[test]
    fn replaces_every_token_with_same_value() {
        assert_eq!(replace(":a/:b_c", "x"), "x/x");
    }

    #[test]
    fn leaves_scheme_and_ports_alone() {
        assert_eq!(
            replace("http://localhost:8080/x", "v"),
            "http://localhost:8080/x"
        );
    }

    #[test]
    fn empty_value_removes_token() {
        assert_eq!(replace("apps/:app/Chart.yaml", ""), "apps//Chart.yaml");
    }

    #[test]
    fn unquote_variants() {
        assert_eq!(unquote("\"payments\""), "payments");
        assert_eq!(unquote("\"a\\tb\""), "a\tb");
        assert_eq!(unquote("`raw`"), "raw");
        assert_eq!(unquote("plain"), "plain");
        assert_eq!(unquote("\""), "\"");
    }
}

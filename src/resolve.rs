use regex::Regex;

/// Collapse runs of `/` and drop a single trailing `/`.
///
/// Inputs shorter than 2 chars (`""`, `"/"`) are returned unchanged, so the
/// root path never normalizes to an empty string. Idempotent.
pub fn sanitize_path(path: &str) -> String {
    if path.len() < 2 {
        return path.to_string();
    }
    let mut out = String::with_capacity(path.len());
    let mut prev_slash = false;
    for c in path.chars() {
        if c == '/' {
            if prev_slash {
                continue;
            }
            prev_slash = true;
        } else {
            prev_slash = false;
        }
        out.push(c);
    }
    if out.len() > 1 && out.ends_with('/') {
        out.pop();
    }
    out
}

/// Replace the first match of `rule` anywhere in `uri` with `/`.
///
/// No implicit anchoring; a rule like `/en-us/?` turns `/en-us/products`
/// into `/products`. A non-matching rule leaves `uri` untouched.
pub fn strip_path(rule: &Regex, uri: &str) -> String {
    rule.replace(uri, "/").into_owned()
}

pub fn redirect_location(scheme: &str, host: &str, path: &str) -> String {
    format!("{scheme}://{host}{path}")
}

pub fn status_description(code: u16) -> String {
    match code {
        301 => "Moved Permanently".to_string(),
        302 => "Found".to_string(),
        other => format!("{other} Unknown"),
    }
}

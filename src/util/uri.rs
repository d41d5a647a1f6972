use std::borrow::Cow;

/// Returns everything before the last `/` of `href`.
///
/// The root (`/`) is retained when the last separator is the first character.
pub(crate) fn parent(href: &str) -> &str {
    href.rfind('/')
        .map_or("", |index| if index == 0 { "/" } else { &href[..index] })
}

/// Returns everything up to and including the last `/` of `href`.
pub(crate) fn directory(href: &str) -> &str {
    href.rfind('/').map_or("", |index| &href[..=index])
}

/// Percent-decodes `encoded`, leaving invalid escape sequences such as `%qu` as-is.
pub(crate) fn decode(encoded: &str) -> Cow<'_, str> {
    percent_encoding::percent_decode_str(encoded).decode_utf8_lossy()
}

/// Splits `href` at the first `?` or `#`, returning the path and the suffix.
pub(crate) fn split_suffix(href: &str) -> (&str, &str) {
    href.find(['?', '#'])
        .map_or((href, ""), |position| href.split_at(position))
}

/// Returns `true` if `href` starts with a URI scheme (`[a-zA-Z][a-zA-Z0-9+.-]*:`).
pub(crate) fn has_scheme(href: &str) -> bool {
    let Some(colon) = href.find(':') else {
        return false;
    };
    let scheme = &href[..colon];
    let mut chars = scheme.chars();

    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

/// Removes `.` and `..` segments as well as duplicate separators.
///
/// - A root is never popped; `/../a` becomes `/a`.
/// - Leading `..` segments of a relative path are kept; `a/../../b` becomes `../b`.
/// - A trailing slash is preserved.
pub(crate) fn normalize(path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    let is_absolute = path.starts_with('/');
    let has_trailing_slash = path.ends_with('/')
        || path.ends_with("/.")
        || path.ends_with("/..")
        || path == "."
        || path == "..";
    let mut stack: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => match stack.last() {
                Some(&"..") | None if !is_absolute => stack.push(".."),
                Some(&"..") | None => {}
                Some(_) => {
                    stack.pop();
                }
            },
            _ => stack.push(segment),
        }
    }

    let mut normalized = String::with_capacity(path.len());
    if is_absolute {
        normalized.push('/');
    }
    normalized.push_str(&stack.join("/"));

    if has_trailing_slash && !stack.is_empty() {
        normalized.push('/');
    }
    normalized
}

/// Resolves a relative `path` against the path `base` per RFC 3986, then normalizes it.
///
/// Neither argument carries a query or fragment; `?` and `#` are plain characters here.
/// When `base` has no trailing slash, `path` resolves alongside the last segment of `base`.
pub(crate) fn resolve(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_owned();
    }
    if path.starts_with('/') {
        return normalize(path);
    }

    let mut joined = directory(base).to_owned();
    joined.push_str(path);
    normalize(&joined)
}

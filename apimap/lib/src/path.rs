//! Path template parsing and substitution.
//!
//! Templates name their parameters with `:identifier` placeholders, where an
//! identifier is an ASCII letter followed by ASCII letters or digits
//! (`/users/:id/posts/:postId`).

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde_json::Value;

use crate::error::{ConfigError, DispatchError};
use crate::params::ParamSet;

/// Characters escaped in a substituted path segment.
///
/// Everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// A piece of a parsed template.
enum Piece<'a> {
    Literal(&'a str),
    Placeholder(&'a str),
}

/// Splits a template into literal text and placeholders.
///
/// A `:` not followed by a letter stays literal.
fn pieces(template: &str) -> Vec<Piece<'_>> {
    let bytes = template.as_bytes();
    let mut pieces = Vec::new();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b':' && bytes.get(i + 1).is_some_and(u8::is_ascii_alphabetic) {
            let name_start = i + 1;
            let mut end = name_start + 1;
            while end < bytes.len() && bytes[end].is_ascii_alphanumeric() {
                end += 1;
            }
            if literal_start < i {
                pieces.push(Piece::Literal(&template[literal_start..i]));
            }
            pieces.push(Piece::Placeholder(&template[name_start..end]));
            literal_start = end;
            i = end;
        } else {
            i += 1;
        }
    }

    if literal_start < template.len() {
        pieces.push(Piece::Literal(&template[literal_start..]));
    }
    pieces
}

/// Returns the placeholder names of a template, in template order.
///
/// ## Examples
///
/// ```rust
/// use apimap_lib::path::placeholders;
///
/// assert_eq!(placeholders("/users/:id/posts/:postId"), vec!["id", "postId"]);
/// assert!(placeholders("/users").is_empty());
/// ```
pub fn placeholders(template: &str) -> Vec<&str> {
    pieces(template)
        .into_iter()
        .filter_map(|piece| match piece {
            Piece::Placeholder(name) => Some(name),
            Piece::Literal(_) => None,
        })
        .collect()
}

/// Checks template syntax at registration time.
///
/// A `:` that does not start a placeholder is literal text (`/time/12:30`),
/// but a `:` ending a segment is an unnamed placeholder and is rejected.
pub(crate) fn check_template(template: &str) -> Result<(), ConfigError> {
    let bytes = template.as_bytes();
    for (i, byte) in bytes.iter().enumerate() {
        if *byte == b':' && bytes.get(i + 1).is_none_or(|next| *next == b'/') {
            return Err(ConfigError::invalid_path(format!(
                "':' at offset {i} in '{template}' has no placeholder name"
            )));
        }
    }
    Ok(())
}

/// Renders a parameter value as path text.
///
/// Returns `None` for values that cannot fill a placeholder: null and the
/// empty string.
pub(crate) fn param_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => Some(
            items
                .iter()
                .map(|item| param_text(item).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(","),
        ),
        // Numbers, booleans and objects use their canonical JSON text.
        other => Some(other.to_string()),
    }
}

/// Percent-encodes a single path segment.
pub(crate) fn encode_segment(text: &str) -> String {
    utf8_percent_encode(text, SEGMENT).to_string()
}

/// Substitutes path parameters into a template.
///
/// Each `:name` is replaced with the percent-encoded text of `params[name]`.
///
/// ## Errors
///
/// Returns [`DispatchError::MissingPathParam`] naming the leftmost placeholder
/// whose value is absent, null, or an empty string.
///
/// ## Examples
///
/// ```rust
/// use apimap_lib::path::resolve;
/// use serde_json::json;
///
/// let params = json!({"id": 1, "slug": "a b"}).as_object().cloned().unwrap();
/// assert_eq!(resolve("/users/:id/:slug", &params).unwrap(), "/users/1/a%20b");
/// ```
pub fn resolve(template: &str, params: &ParamSet) -> Result<String, DispatchError> {
    let mut path = String::with_capacity(template.len());

    for piece in pieces(template) {
        match piece {
            Piece::Literal(text) => path.push_str(text),
            Piece::Placeholder(name) => {
                let text = params
                    .get(name)
                    .and_then(param_text)
                    .ok_or_else(|| DispatchError::missing_path_param(name))?;
                path.push_str(&encode_segment(&text));
            }
        }
    }

    Ok(path)
}

/// Substitutes whichever placeholders `params` can fill, leaving the rest
/// as written.
pub(crate) fn fill(template: &str, params: &ParamSet) -> String {
    let mut path = String::with_capacity(template.len());

    for piece in pieces(template) {
        match piece {
            Piece::Literal(text) => path.push_str(text),
            Piece::Placeholder(name) => match params.get(name).and_then(param_text) {
                Some(text) => path.push_str(&encode_segment(&text)),
                None => {
                    path.push(':');
                    path.push_str(name);
                }
            },
        }
    }

    path
}

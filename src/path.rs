//! Href template resolution.
//!
//! Placeholders are `{field}` or `{field+N}` / `{field-N}`. They are found
//! left to right without overlap and substituted in a single pass: text that
//! was substituted in is never scanned again.

use crate::payload::{Payload, PropertyBag};

/// Substituted for a placeholder whose field exists but has no canonical
/// string form (null, bytes, nested records or collections).
pub const INVALID_VALUE: &str = "<invalid>";

/// Resolves href templates against property bags and prefixes the result.
///
/// # Examples
///
/// ```
/// use hypermedia_decorator::{PathResolver, Payload, PropertyBag};
///
/// let mut bag = PropertyBag::new();
/// bag.insert("id", Payload::from(10u64));
///
/// let resolver = PathResolver::new("/api");
/// assert_eq!(resolver.resolve("/widgets/{id}", &bag), "/api/widgets/10");
/// assert_eq!(resolver.resolve("/widgets/{id+5}", &bag), "/api/widgets/15");
/// assert_eq!(resolver.resolve("/widgets/{missing}", &bag), "/api/widgets/{missing}");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathResolver {
    prefix: String,
}

impl PathResolver {
    /// Creates a resolver that prepends `prefix` to every resolved href.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Returns the configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Substitutes placeholders in `template` from `bag` and prepends the prefix.
    pub fn resolve(&self, template: &str, bag: &PropertyBag) -> String {
        let mut out = self.prefix.clone();
        substitute_into(&mut out, template, bag);
        out
    }
}

/// One-shot form of [`PathResolver::resolve`].
pub fn resolve(template: &str, prefix: &str, bag: &PropertyBag) -> String {
    let mut out = prefix.to_owned();
    substitute_into(&mut out, template, bag);
    out
}

/// Substitutes placeholders without adding any prefix.
pub fn substitute(template: &str, bag: &PropertyBag) -> String {
    let mut out = String::with_capacity(template.len());
    substitute_into(&mut out, template, bag);
    out
}

fn substitute_into(out: &mut String, template: &str, bag: &PropertyBag) {
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            // `{}` is not a placeholder
            Some(0) => {
                out.push('{');
                rest = after;
            }
            Some(close) => {
                let body = &after[..close];
                match resolve_placeholder(body, bag) {
                    Some(value) => out.push_str(&value),
                    None => {
                        out.push('{');
                        out.push_str(body);
                        out.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                out.push_str(&rest[open..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
}

/// Returns the replacement text, or `None` to leave the placeholder literal.
fn resolve_placeholder(body: &str, bag: &PropertyBag) -> Option<String> {
    if let Some((field, offset)) = split_offset(body) {
        let base = bag.get(field)?.as_scalar()?.as_integer()?;
        return base.checked_add(offset).map(|v| v.to_string());
    }

    let value = bag.get(body)?;
    Some(canonical_string(value))
}

/// Splits `field+N` / `field-N`. A body whose tail is not a decimal integer
/// (`first-name`) is a plain field name.
fn split_offset(body: &str) -> Option<(&str, i128)> {
    let (pos, _) = body
        .char_indices()
        .skip(1)
        .find(|(_, c)| *c == '+' || *c == '-')?;
    let offset = body[pos..].parse::<i128>().ok()?;
    Some((&body[..pos], offset))
}

fn canonical_string(value: &Payload) -> String {
    value
        .as_scalar()
        .and_then(|s| s.canonical_string())
        .unwrap_or_else(|| INVALID_VALUE.to_owned())
}

//! Template interpolation: `${index}`, `${item}` and `${item.<path>}`
//!
//! Substitution is a single left-to-right pass; text produced by a
//! substitution is never scanned again.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::{Captures, Regex};
use serde_json::Value;

use crate::path;
use crate::value::to_display;

static TOKEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{(?:(index)|item(?:\.([^}]+))?)\}").unwrap());

/// Interpolate `template` for one list element
pub fn interpolate<'t>(template: &'t str, item: &Value, index: usize) -> Cow<'t, str> {
    interpolate_with(template, item, index, |_| {})
}

/// Like [`interpolate`], calling `on_missing` with each path that did not
/// resolve (those substitute the empty string)
pub fn interpolate_with<'t>(
    template: &'t str,
    item: &Value,
    index: usize,
    mut on_missing: impl FnMut(&str),
) -> Cow<'t, str> {
    if !template.contains("${") {
        return Cow::Borrowed(template);
    }
    TOKEN.replace_all(template, |caps: &Captures<'_>| {
        if caps.get(1).is_some() {
            return index.to_string();
        }
        match caps.get(2) {
            Some(path) => path::resolve(item, path.as_str()).unwrap_or_else(|| {
                on_missing(path.as_str());
                String::new()
            }),
            None => to_display(item),
        }
    })
}

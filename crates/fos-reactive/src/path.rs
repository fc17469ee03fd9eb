//! Dotted property paths into item values (`item.user.name`, `item.tags.0`)

use serde_json::Value;

use crate::value::to_display;

/// Walk `path` segment by segment. Objects are indexed by key and arrays by
/// position; any other value ends the walk with `None`.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, segment| match current {
        Value::Object(map) => map.get(segment),
        Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
        _ => None,
    })
}

/// Text substituted for `${item.path}`: missing and `null` values become ""
pub fn resolve(value: &Value, path: &str) -> Option<String> {
    match lookup(value, path)? {
        Value::Null => Some(String::new()),
        found => Some(to_display(found)),
    }
}

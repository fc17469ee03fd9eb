//! Binding engine configuration

use serde::Deserialize;

use crate::ReactiveError;

/// Binding engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Opt-in attribute for explicit activation (matched ignoring case)
    pub opt_in_attribute: String,
    /// Attribute tagging rendered list instances with their list's marker
    pub marker_attribute: String,
    /// Prefix of event-handler attributes inside list templates
    pub event_prefix: String,
    /// Also rebuild lists when an in-place update changed their content
    pub deep_list_compare: bool,
    /// Tags whose `value` property writes back on `input`
    pub input_like_tags: Vec<String>,
    /// Keep reported binding issues for [`crate::ReactiveDom::diagnostics`]
    pub collect_diagnostics: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            opt_in_attribute: "reactivedom".into(),
            marker_attribute: "data-foreach".into(),
            event_prefix: "on".into(),
            deep_list_compare: false,
            input_like_tags: vec!["input".into(), "textarea".into(), "select".into()],
            collect_diagnostics: false,
        }
    }
}

impl Config {
    /// Load from JSON; missing fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, ReactiveError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Whether `tag` writes its `value` back on input
    pub fn is_input_like(&self, tag: &str) -> bool {
        self.input_like_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

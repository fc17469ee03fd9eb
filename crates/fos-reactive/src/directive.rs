//! Directive classification
//!
//! Each attribute is parsed once into a [`Directive`] or ignored. Event
//! handler attributes are not directives; they are only meaningful inside
//! list templates and are handled by the reconciler.

/// Attribute that marks a list template
pub const FOREACH_ATTR: &str = "foreach";

/// Target of a `bind:<prop>` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Property {
    /// `bind:text` - plain text content
    Text,
    /// `bind:html` - markup content
    Html,
    /// Any other property, by name
    Named(String),
}

impl Property {
    fn from_name(name: &str) -> Self {
        match name {
            "text" => Property::Text,
            "html" => Property::Html,
            other => Property::Named(other.to_string()),
        }
    }
}

/// A recognized binding attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// `this="name"`
    Capture { name: String },
    /// `bind:group="signal"`
    Group { signal: String },
    /// `bind:<prop>="signal"`
    Property { property: Property, signal: String },
    /// `class:<name>="signal"`
    Class { class: String, signal: String },
    /// `if="signal"`
    If { signal: String },
    /// `foreach="signal"`
    Foreach { signal: String },
}

impl Directive {
    /// Classify one attribute. Unknown attributes yield `None`.
    pub fn parse(name: &str, value: &str) -> Option<Self> {
        let value = value.to_string();
        if let Some(prop) = name.strip_prefix("bind:") {
            return match prop {
                "" => None,
                "group" => Some(Directive::Group { signal: value }),
                prop => Some(Directive::Property {
                    property: Property::from_name(prop),
                    signal: value,
                }),
            };
        }
        if let Some(class) = name.strip_prefix("class:") {
            if class.is_empty() {
                return None;
            }
            return Some(Directive::Class {
                class: class.to_string(),
                signal: value,
            });
        }
        match name {
            "this" => Some(Directive::Capture { name: value }),
            "if" => Some(Directive::If { signal: value }),
            FOREACH_ATTR => Some(Directive::Foreach { signal: value }),
            _ => None,
        }
    }

    /// Name of the signal this directive reads; `None` for `this`
    pub fn signal_name(&self) -> Option<&str> {
        match self {
            Directive::Capture { .. } => None,
            Directive::Group { signal }
            | Directive::Property { signal, .. }
            | Directive::Class { signal, .. }
            | Directive::If { signal }
            | Directive::Foreach { signal } => Some(signal),
        }
    }

    pub fn is_capture(&self) -> bool {
        matches!(self, Directive::Capture { .. })
    }
}

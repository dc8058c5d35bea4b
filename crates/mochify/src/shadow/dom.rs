//! Synthetic DOM nodes.
//!
//! These carry no live references. They render as HTML-like strings and
//! provide a pretty-print hook for the inspector. All of them report the same
//! toStringTag so reporters fall back to their string form when diffing.

use super::Shadow;
use crate::encoding::NodeListKind;
use crate::inspect::StyleKind;
use serde_json::Value;
use std::fmt;

/// Callbacks the inspector hands to a synthetic node while pretty-printing
pub trait InspectHook {
    /// Apply the inspector's style for `kind` to `text`
    fn stylize(&self, text: &str, kind: StyleKind) -> String;

    /// Inspect a nested value with the current options
    fn inspect(&mut self, value: &Shadow) -> String;
}

/// Attribute name/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    /// Attribute name
    pub name: String,
    /// Attribute value, possibly empty
    pub value: String,
}

impl Attr {
    /// Create an attribute
    #[must_use]
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    fn pretty(&self, hook: &dyn InspectHook) -> String {
        let mut out = hook.stylize(&self.name, StyleKind::Special);
        if !self.value.is_empty() {
            out.push_str(&hook.stylize(&format!("=\"{}\"", self.value), StyleKind::String));
        }
        out
    }
}

impl fmt::Display for Attr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.is_empty() {
            f.write_str(&self.name)
        } else {
            write!(f, "{}=\"{}\"", self.name, self.value)
        }
    }
}

/// Host-side stand-in for a DOM node or collection
#[derive(Debug, Clone, PartialEq)]
pub enum Synthetic {
    /// Attribute node
    Attr(Attr),
    /// Comment node
    Comment(String),
    /// Text node
    Text(String),
    /// Element with attributes and children
    Element {
        /// Lowercased tag name
        tag: String,
        /// Attributes in document order
        attrs: Vec<Attr>,
        /// Child nodes
        children: Vec<Shadow>,
    },
    /// Shadow root, fragment, node list or HTML collection
    NodeList {
        /// Container kind
        kind: NodeListKind,
        /// Child nodes
        children: Vec<Shadow>,
    },
    /// Attribute collection
    NamedNodeMap(Vec<Attr>),
}

impl Synthetic {
    /// Tag reported by `Object.prototype.toString` for every synthetic node
    pub const TO_STRING_TAG: &'static str = "Syntetic";

    /// JSON form, which is the string rendering
    #[must_use]
    pub fn to_json(&self) -> Value {
        Value::String(self.to_string())
    }

    /// Pretty-print through the inspector's hook
    pub fn pretty(&self, hook: &mut dyn InspectHook) -> String {
        match self {
            Self::Attr(attr) => attr.pretty(hook),
            Self::Comment(_) => hook.stylize(&self.to_string(), StyleKind::Undefined),
            Self::Text(text) => text.clone(),
            Self::Element {
                tag,
                attrs,
                children,
            } => {
                let mut out = hook.stylize(&format!("<{tag}"), StyleKind::RegExp);
                if !attrs.is_empty() {
                    out.push(' ');
                    let rendered: Vec<String> = attrs.iter().map(|a| a.pretty(&*hook)).collect();
                    out.push_str(&rendered.join(" "));
                }
                out.push_str(&hook.stylize(">", StyleKind::RegExp));
                for child in children {
                    out.push_str(&hook.inspect(child));
                }
                out.push_str(&hook.stylize(&format!("</{tag}>"), StyleKind::RegExp));
                out
            }
            Self::NodeList { kind, children } => {
                let mut out = hook.stylize(&format!("{} [", kind.name()), StyleKind::Date);
                for child in children {
                    out.push_str(&hook.inspect(child));
                }
                out.push_str(&hook.stylize("]", StyleKind::Date));
                out
            }
            Self::NamedNodeMap(attrs) => {
                let rendered: Vec<String> = attrs.iter().map(|a| a.pretty(&*hook)).collect();
                format!(
                    "{}{}{}",
                    hook.stylize("NamedNodeMap [", StyleKind::Date),
                    rendered.join(" "),
                    hook.stylize("]", StyleKind::Date)
                )
            }
        }
    }
}

fn join_nodes(children: &[Shadow]) -> String {
    children.iter().map(Shadow::to_js_string).collect()
}

impl fmt::Display for Synthetic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attr(attr) => write!(f, "{attr}"),
            Self::Comment(text) => write!(f, "<!--{text}-->"),
            Self::Text(text) => f.write_str(text),
            Self::Element {
                tag,
                attrs,
                children,
            } => {
                let attrs: Vec<String> = attrs.iter().map(ToString::to_string).collect();
                let separator = if attrs.is_empty() { "" } else { " " };
                write!(
                    f,
                    "<{tag}{separator}{}>{}</{tag}>",
                    attrs.join(" "),
                    join_nodes(children)
                )
            }
            Self::NodeList { kind, children } => {
                write!(f, "{} [{}]", kind.name(), join_nodes(children))
            }
            Self::NamedNodeMap(attrs) => {
                let attrs: Vec<String> = attrs.iter().map(ToString::to_string).collect();
                write!(f, "NamedNodeMap [{}]", attrs.join(" "))
            }
        }
    }
}

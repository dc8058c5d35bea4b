//! Host-side shadow values.
//!
//! A [`Shadow`] is what the reconstructor produces from a tagged encoding.
//! It carries enough structure for the inspector, the console formatter and
//! the reporters to treat it like the in-page original.

pub mod dom;

pub use dom::{Attr, InspectHook, Synthetic};

use crate::encoding::{ErrorKind, FunctionFlavor, TypedArrayKind};
use chrono::{DateTime, SecondsFormat, Utc};
use num_bigint::BigInt;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_SYMBOL: AtomicU64 = AtomicU64::new(1);

/// A symbol with its own identity
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Symbol {
    id: u64,
    description: Option<String>,
}

impl Symbol {
    /// Mint a symbol distinct from every other
    #[must_use]
    pub fn fresh(description: Option<String>) -> Self {
        Self {
            id: NEXT_SYMBOL.fetch_add(1, Ordering::Relaxed),
            description,
        }
    }

    /// Description given at creation
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or(""))
    }
}

/// Own enumerable properties in insertion order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties {
    /// String-keyed entries
    pub keys: Vec<(String, Shadow)>,
    /// Symbol-keyed entries
    pub symbols: Vec<(Symbol, Shadow)>,
}

impl Properties {
    /// Whether there are no properties at all
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty() && self.symbols.is_empty()
    }

    /// Look up a string-keyed property
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Shadow> {
        self.keys.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Assign a string-keyed property, replacing an existing one
    pub fn insert(&mut self, key: impl Into<String>, value: Shadow) {
        let key = key.into();
        if let Some(slot) = self.keys.iter_mut().find(|(k, _)| *k == key) {
            slot.1 = value;
        } else {
            self.keys.push((key, value));
        }
    }
}

/// Longest array `to_js_string` and `to_json` will expand hole by hole
pub const MAX_EXPANDED_LENGTH: u32 = 1 << 24;

/// Sparse array with extra named properties
///
/// Only assigned indices are stored; holes are the gaps between keys and
/// the tail up to `length`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArrayShadow {
    /// Assigned elements by index
    pub elements: BTreeMap<u32, Shadow>,
    /// `length`, one past the highest assigned index
    pub length: u32,
    /// Non-index properties, in insertion order
    pub extra: Properties,
}

impl ArrayShadow {
    /// Dense array from items
    #[must_use]
    pub fn dense(items: Vec<Shadow>) -> Self {
        let mut array = Self::default();
        for (index, item) in (0..u32::MAX).zip(items) {
            array.set(index, item);
        }
        array
    }

    /// `length`
    #[must_use]
    pub fn len(&self) -> usize {
        self.length as usize
    }

    /// Whether `length` is zero
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Whether every index below `length` is assigned
    #[must_use]
    pub fn is_dense(&self) -> bool {
        self.elements.len() == self.len()
    }

    /// Element at `index`, `None` for holes and out-of-range indices
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&Shadow> {
        u32::try_from(index)
            .ok()
            .and_then(|index| self.elements.get(&index))
    }

    /// Assign an index, extending `length` past it
    pub fn set(&mut self, index: u32, value: Shadow) {
        self.length = self.length.max(index.saturating_add(1));
        self.elements.insert(index, value);
    }

    /// Every slot below `length`, `None` for holes; `None` overall when the
    /// array is too long to expand
    fn slots(&self) -> Option<impl Iterator<Item = Option<&Shadow>> + '_> {
        (self.length <= MAX_EXPANDED_LENGTH)
            .then(|| (0..self.length).map(move |index| self.elements.get(&index)))
    }
}

/// Reconstructed error
#[derive(Debug, Clone, PartialEq)]
pub struct ErrorShadow {
    /// Concrete error type
    pub kind: ErrorKind,
    /// `message`
    pub message: String,
    /// `stack`, possibly rewritten through a source map
    pub stack: Option<String>,
    /// Captured own properties
    pub props: Properties,
}

impl ErrorShadow {
    /// Error with no stack or properties
    #[must_use]
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            stack: None,
            props: Properties::default(),
        }
    }

    /// `name`, honouring an own `name` property
    #[must_use]
    pub fn name(&self) -> String {
        match self.props.get("name") {
            Some(Shadow::String(name)) => name.clone(),
            _ => self.kind.name().to_string(),
        }
    }

    /// `Error.prototype.toString()`
    #[must_use]
    pub fn summary(&self) -> String {
        let name = self.name();
        if self.message.is_empty() {
            name
        } else if name.is_empty() {
            self.message.clone()
        } else {
            format!("{name}: {}", self.message)
        }
    }
}

/// Settled state of a reconstructed promise
#[derive(Debug, Clone, PartialEq)]
pub enum PromiseShadow {
    /// Never settles
    Pending,
    /// Resolved with a value
    Fulfilled(Box<Shadow>),
    /// Rejected with a reason
    Rejected(Box<Shadow>),
}

/// Structurally equivalent stand-in for a page value
#[derive(Debug, Clone, PartialEq)]
pub enum Shadow {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Boolean
    Bool(bool),
    /// Number, including NaN, infinities and negative zero
    Number(f64),
    /// Arbitrary-precision integer
    BigInt(BigInt),
    /// String
    String(String),
    /// Freshly minted symbol
    Symbol(Symbol),
    /// Date as epoch milliseconds; NaN for an invalid date
    Date(f64),
    /// Regular expression
    RegExp {
        /// Pattern source
        source: String,
        /// Flags
        flags: String,
    },
    /// Empty function of the captured variety
    Function {
        /// Function variety
        flavor: FunctionFlavor,
        /// Redefined `name`
        name: String,
        /// Captured own properties
        props: Properties,
    },
    /// Empty class, optionally extending a synthetic base
    Class {
        /// Class name
        name: String,
        /// Immediate base class name
        base: Option<String>,
    },
    /// Error instance
    Error(Box<ErrorShadow>),
    /// Sparse array
    Array(ArrayShadow),
    /// Plain record
    Object(Properties),
    /// Set in insertion order
    Set(Vec<Shadow>),
    /// Map in insertion order
    Map(Vec<(Shadow, Shadow)>),
    /// `WeakRef` to an empty object
    WeakRef,
    /// Empty `WeakSet`
    WeakSet,
    /// Empty `WeakMap`
    WeakMap,
    /// Promise with its settled state
    Promise(PromiseShadow),
    /// Typed array
    TypedArray {
        /// Element type
        kind: TypedArrayKind,
        /// Elements
        values: Vec<f64>,
    },
    /// DOM stand-in
    Synthetic(Synthetic),
    /// Untagged JSON passed through as-is
    Raw(Value),
}

/// JavaScript `Number.prototype.toString()` for `n`
#[must_use]
pub fn js_number(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if n == 0.0 {
        return "0".to_string();
    }
    let abs = n.abs();
    if (1e-6..1e21).contains(&abs) {
        format!("{n}")
    } else {
        let exponential = format!("{n:e}");
        match exponential.split_once('e') {
            Some((mantissa, exponent)) if !exponent.starts_with('-') => {
                format!("{mantissa}e+{exponent}")
            }
            _ => exponential,
        }
    }
}

/// ISO-8601 rendering of epoch milliseconds, `None` for invalid dates
#[must_use]
pub fn iso_date(millis: f64) -> Option<String> {
    if !millis.is_finite() {
        return None;
    }
    DateTime::<Utc>::from_timestamp_millis(millis as i64)
        .map(|date| date.to_rfc3339_opts(SecondsFormat::Millis, true))
}

impl Shadow {
    /// String shadow
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Plain record from entries
    #[must_use]
    pub fn object<K: Into<String>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        let mut props = Properties::default();
        for (key, value) in entries {
            props.insert(key, value);
        }
        Self::Object(props)
    }

    /// Dense array
    #[must_use]
    pub fn array(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Array(ArrayShadow::dense(items.into_iter().collect()))
    }

    /// JavaScript `typeof`
    #[must_use]
    pub const fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::BigInt(_) => "bigint",
            Self::String(_) => "string",
            Self::Symbol(_) => "symbol",
            Self::Function { .. } | Self::Class { .. } => "function",
            Self::Raw(Value::Bool(_)) => "boolean",
            Self::Raw(Value::Number(_)) => "number",
            Self::Raw(Value::String(_)) => "string",
            _ => "object",
        }
    }

    /// `Object.prototype.toString` tag
    #[must_use]
    pub fn to_string_tag(&self) -> &'static str {
        match self {
            Self::Synthetic(_) => Synthetic::TO_STRING_TAG,
            Self::Array(_) => "Array",
            Self::Function { .. } | Self::Class { .. } => "Function",
            Self::Error(_) => "Error",
            Self::Date(_) => "Date",
            Self::RegExp { .. } => "RegExp",
            Self::Set(_) => "Set",
            Self::Map(_) => "Map",
            Self::WeakRef => "WeakRef",
            Self::WeakSet => "WeakSet",
            Self::WeakMap => "WeakMap",
            Self::Promise(_) => "Promise",
            Self::TypedArray { kind, .. } => kind.name(),
            Self::Undefined => "Undefined",
            Self::Null | Self::Raw(Value::Null) => "Null",
            Self::Bool(_) | Self::Raw(Value::Bool(_)) => "Boolean",
            Self::Number(_) | Self::Raw(Value::Number(_)) => "Number",
            Self::BigInt(_) => "BigInt",
            Self::String(_) | Self::Raw(Value::String(_)) => "String",
            Self::Symbol(_) => "Symbol",
            Self::Raw(Value::Array(_)) => "Array",
            _ => "Object",
        }
    }

    /// String-keyed property lookup on records, arrays, functions and errors
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Self> {
        match self {
            Self::Object(props) | Self::Function { props, .. } => props.get(key),
            Self::Error(error) => error.props.get(key),
            Self::Array(array) => match crate::value::array_index(key) {
                Some(index) => array.elements.get(&index),
                None => array.extra.get(key),
            },
            _ => None,
        }
    }

    /// JavaScript `String(value)`
    #[must_use]
    pub fn to_js_string(&self) -> String {
        match self {
            Self::Undefined => "undefined".to_string(),
            Self::Null => "null".to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => js_number(*n),
            Self::BigInt(n) => n.to_string(),
            Self::String(s) => s.clone(),
            Self::Symbol(symbol) => symbol.to_string(),
            Self::Date(millis) => {
                if millis.is_finite() {
                    DateTime::<Utc>::from_timestamp_millis(*millis as i64).map_or_else(
                        || "Invalid Date".to_string(),
                        |date| {
                            date.format("%a %b %d %Y %H:%M:%S GMT+0000 (Coordinated Universal Time)")
                                .to_string()
                        },
                    )
                } else {
                    "Invalid Date".to_string()
                }
            }
            Self::RegExp { source, flags } => format!("/{source}/{flags}"),
            Self::Function { flavor, .. } => flavor.empty_source().to_string(),
            Self::Class { base: None, .. } => "class {}".to_string(),
            Self::Class {
                base: Some(base), ..
            } => format!("class extends {base} {{}}"),
            Self::Error(error) => error.summary(),
            Self::Array(array) => array.slots().map_or_else(
                || format!("[object Array({})]", array.length),
                |slots| {
                    slots
                        .map(|item| match item {
                            None | Some(Self::Undefined | Self::Null) => String::new(),
                            Some(value) => value.to_js_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(",")
                },
            ),
            Self::TypedArray { values, .. } => values
                .iter()
                .map(|n| js_number(*n))
                .collect::<Vec<_>>()
                .join(","),
            Self::Synthetic(node) => node.to_string(),
            Self::Raw(Value::String(s)) => s.clone(),
            Self::Raw(Value::Array(items)) => items
                .iter()
                .map(|item| match item {
                    Value::Null => String::new(),
                    other => Self::from_json(other).to_js_string(),
                })
                .collect::<Vec<_>>()
                .join(","),
            Self::Raw(Value::Object(_)) | Self::Object(_) => "[object Object]".to_string(),
            Self::Raw(other) => other.to_string(),
            other => format!("[object {}]", other.to_string_tag()),
        }
    }

    /// `JSON.stringify` semantics; `None` where JSON has no representation
    #[must_use]
    pub fn to_json(&self) -> Option<Value> {
        match self {
            Self::Undefined | Self::Symbol(_) | Self::Function { .. } | Self::Class { .. } => {
                None
            }
            Self::Null => Some(Value::Null),
            Self::Bool(b) => Some(Value::Bool(*b)),
            Self::Number(n) => Some(if n.is_finite() {
                crate::serializer::number(*n)
            } else {
                Value::Null
            }),
            Self::BigInt(n) => Some(Value::String(n.to_string())),
            Self::String(s) => Some(Value::String(s.clone())),
            Self::Date(millis) => Some(iso_date(*millis).map_or(Value::Null, Value::String)),
            Self::Array(array) => array.slots().map(|slots| {
                Value::Array(
                    slots
                        .map(|item| item.and_then(Self::to_json).unwrap_or(Value::Null))
                        .collect(),
                )
            }),
            Self::Object(props) => Some(props_json(props)),
            Self::Error(error) => Some(props_json(&error.props)),
            Self::TypedArray { values, .. } => Some(Value::Object(
                values
                    .iter()
                    .enumerate()
                    .map(|(i, n)| (i.to_string(), Self::Number(*n).to_json().unwrap_or(Value::Null)))
                    .collect(),
            )),
            Self::Synthetic(node) => Some(node.to_json()),
            Self::Raw(value) => Some(value.clone()),
            _ => Some(Value::Object(Map::new())),
        }
    }

    /// Reinterpret untagged JSON as a page value
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => Self::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::array(items.iter().map(Self::from_json)),
            Value::Object(map) => Self::object(map.iter().map(|(k, v)| (k.clone(), Self::from_json(v)))),
        }
    }
}

fn props_json(props: &Properties) -> Value {
    Value::Object(
        props
            .keys
            .iter()
            .filter_map(|(key, value)| value.to_json().map(|json| (key.clone(), json)))
            .collect(),
    )
}

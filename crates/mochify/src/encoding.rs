//! Tagged encoding shared by the in-page agent and the host.
//!
//! Every value that has no plain JSON form travels as `[tag, ...payload]`.
//! Strings, finite numbers, booleans and `null` may also appear raw.
//!
//! ```text
//! ['Number', 42]                      finite number
//! ['Array', [['1', ['Number', 42]]], []]   sparse array, no symbols
//! ['Circular', ['a', 'back']]         back-reference to an ancestor
//! ```

use serde_json::Value;
use std::fmt;

/// Maximum depth for own-key and own-symbol descent
pub const MAX_DEPTH: usize = 5;

/// Expression the host evaluates to drain the page's event queue
pub const POLL_EXPRESSION: &str = "window.mocha.mochify_pollEvents()";

/// Error constructors that survive the round trip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// `Error`
    Error,
    /// `TypeError`
    TypeError,
    /// `RangeError`
    RangeError,
    /// `ReferenceError`
    ReferenceError,
    /// `SyntaxError`
    SyntaxError,
    /// `URIError`
    UriError,
    /// `EvalError`
    EvalError,
    /// `AggregateError`
    AggregateError,
}

impl ErrorKind {
    /// All error kinds in tag order
    pub const ALL: [Self; 8] = [
        Self::Error,
        Self::TypeError,
        Self::RangeError,
        Self::ReferenceError,
        Self::SyntaxError,
        Self::UriError,
        Self::EvalError,
        Self::AggregateError,
    ];

    /// Constructor name, which is also the wire tag
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Error => "Error",
            Self::TypeError => "TypeError",
            Self::RangeError => "RangeError",
            Self::ReferenceError => "ReferenceError",
            Self::SyntaxError => "SyntaxError",
            Self::UriError => "URIError",
            Self::EvalError => "EvalError",
            Self::AggregateError => "AggregateError",
        }
    }

    /// Resolve a constructor name, falling back to the generic `Error`
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|kind| kind.name() == name)
            .unwrap_or(Self::Error)
    }
}

/// Typed array constructors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypedArrayKind {
    /// `Int8Array`
    Int8,
    /// `Uint8Array`
    Uint8,
    /// `Uint8ClampedArray`
    Uint8Clamped,
    /// `Int16Array`
    Int16,
    /// `Uint16Array`
    Uint16,
    /// `Int32Array`
    Int32,
    /// `Uint32Array`
    Uint32,
    /// `Float32Array`
    Float32,
    /// `Float64Array`
    Float64,
}

impl TypedArrayKind {
    /// All typed array kinds in tag order
    pub const ALL: [Self; 9] = [
        Self::Int8,
        Self::Uint8,
        Self::Uint8Clamped,
        Self::Int16,
        Self::Uint16,
        Self::Int32,
        Self::Uint32,
        Self::Float32,
        Self::Float64,
    ];

    /// Constructor name, which is also the wire tag
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "Int8Array",
            Self::Uint8 => "Uint8Array",
            Self::Uint8Clamped => "Uint8ClampedArray",
            Self::Int16 => "Int16Array",
            Self::Uint16 => "Uint16Array",
            Self::Int32 => "Int32Array",
            Self::Uint32 => "Uint32Array",
            Self::Float32 => "Float32Array",
            Self::Float64 => "Float64Array",
        }
    }

    /// Whether elements are floating point
    #[must_use]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::Float32 | Self::Float64)
    }
}

/// DOM containers that transport a child sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeListKind {
    /// `ShadowRoot`
    ShadowRoot,
    /// `DocumentFragment`
    DocumentFragment,
    /// `NodeList`
    NodeList,
    /// `HTMLCollection`
    HtmlCollection,
}

impl NodeListKind {
    /// Constructor name, which is also the wire tag
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::ShadowRoot => "ShadowRoot",
            Self::DocumentFragment => "DocumentFragment",
            Self::NodeList => "NodeList",
            Self::HtmlCollection => "HTMLCollection",
        }
    }
}

/// Callable variants, distinguished by constructor name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FunctionFlavor {
    /// `function () {}`
    #[default]
    Plain,
    /// `async function () {}`
    Async,
    /// `function* () {}`
    Generator,
    /// `async function* () {}`
    AsyncGenerator,
}

impl FunctionFlavor {
    /// Constructor name, which is also the wire tag
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Plain => "Function",
            Self::Async => "AsyncFunction",
            Self::Generator => "GeneratorFunction",
            Self::AsyncGenerator => "AsyncGeneratorFunction",
        }
    }

    /// Resolve a constructor name, defaulting to a plain function
    #[must_use]
    pub fn from_constructor(name: &str) -> Self {
        match name {
            "AsyncFunction" => Self::Async,
            "GeneratorFunction" => Self::Generator,
            "AsyncGeneratorFunction" => Self::AsyncGenerator,
            _ => Self::Plain,
        }
    }

    /// Source text of the empty stand-in function
    #[must_use]
    pub const fn empty_source(self) -> &'static str {
        match self {
            Self::Plain => "function () {}",
            Self::Async => "async function () {}",
            Self::Generator => "function* () {}",
            Self::AsyncGenerator => "async function* () {}",
        }
    }
}

/// Closed tag vocabulary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// Absent value
    Undefined,
    /// Explicit null
    Null,
    /// Boolean
    Boolean,
    /// Finite number
    Number,
    /// Not a number
    NaN,
    /// Positive infinity
    Infinity,
    /// Negative infinity
    NegInfinity,
    /// Arbitrary-precision integer as decimal string
    BigInt,
    /// String
    String,
    /// Symbol with description
    Symbol,
    /// Point in time
    Date,
    /// Regular expression
    RegExp,
    /// Callable of the given flavor
    Function(FunctionFlavor),
    /// Class object
    Class,
    /// Thrown value
    Error(ErrorKind),
    /// Array with extra properties
    Array,
    /// Plain record
    Object,
    /// Set
    Set,
    /// Map
    Map,
    /// Identity-only weak reference
    WeakRef,
    /// Identity-only weak set
    WeakSet,
    /// Identity-only weak map
    WeakMap,
    /// Promise with settled state
    Promise,
    /// Typed buffer
    TypedArray(TypedArrayKind),
    /// DOM attribute
    Attr,
    /// DOM comment
    Comment,
    /// DOM text node
    Text,
    /// DOM element
    Element,
    /// DOM container with child sequence
    NodeList(NodeListKind),
    /// Attribute collection
    NamedNodeMap,
    /// Back-reference to an ancestor
    Circular,
    /// Escape hatch
    Unknown,
}

impl Tag {
    /// Parse a wire tag
    #[must_use]
    pub fn parse(tag: &str) -> Option<Self> {
        let parsed = match tag {
            "undefined" => Self::Undefined,
            "null" => Self::Null,
            "Boolean" => Self::Boolean,
            "Number" => Self::Number,
            "NaN" => Self::NaN,
            "Infinity" => Self::Infinity,
            "-Infinity" => Self::NegInfinity,
            "BigInt" => Self::BigInt,
            "String" => Self::String,
            "Symbol" => Self::Symbol,
            "Date" => Self::Date,
            "RegExp" => Self::RegExp,
            "Function" => Self::Function(FunctionFlavor::Plain),
            "AsyncFunction" => Self::Function(FunctionFlavor::Async),
            "GeneratorFunction" => Self::Function(FunctionFlavor::Generator),
            "AsyncGeneratorFunction" => Self::Function(FunctionFlavor::AsyncGenerator),
            "Class" => Self::Class,
            "Array" => Self::Array,
            "Object" => Self::Object,
            "Set" => Self::Set,
            "Map" => Self::Map,
            "WeakRef" => Self::WeakRef,
            "WeakSet" => Self::WeakSet,
            "WeakMap" => Self::WeakMap,
            "Promise" => Self::Promise,
            "Attr" => Self::Attr,
            "Comment" => Self::Comment,
            "Text" => Self::Text,
            "Element" => Self::Element,
            "ShadowRoot" => Self::NodeList(NodeListKind::ShadowRoot),
            "DocumentFragment" => Self::NodeList(NodeListKind::DocumentFragment),
            "NodeList" => Self::NodeList(NodeListKind::NodeList),
            "HTMLCollection" => Self::NodeList(NodeListKind::HtmlCollection),
            "NamedNodeMap" => Self::NamedNodeMap,
            "Circular" => Self::Circular,
            "Unknown" => Self::Unknown,
            other => {
                if let Some(kind) = ErrorKind::ALL.into_iter().find(|k| k.name() == other) {
                    Self::Error(kind)
                } else {
                    Self::TypedArray(TypedArrayKind::ALL.into_iter().find(|k| k.name() == other)?)
                }
            }
        };
        Some(parsed)
    }

    /// Wire representation
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Boolean => "Boolean",
            Self::Number => "Number",
            Self::NaN => "NaN",
            Self::Infinity => "Infinity",
            Self::NegInfinity => "-Infinity",
            Self::BigInt => "BigInt",
            Self::String => "String",
            Self::Symbol => "Symbol",
            Self::Date => "Date",
            Self::RegExp => "RegExp",
            Self::Function(flavor) => flavor.name(),
            Self::Class => "Class",
            Self::Error(kind) => kind.name(),
            Self::Array => "Array",
            Self::Object => "Object",
            Self::Set => "Set",
            Self::Map => "Map",
            Self::WeakRef => "WeakRef",
            Self::WeakSet => "WeakSet",
            Self::WeakMap => "WeakMap",
            Self::Promise => "Promise",
            Self::TypedArray(kind) => kind.name(),
            Self::Attr => "Attr",
            Self::Comment => "Comment",
            Self::Text => "Text",
            Self::Element => "Element",
            Self::NodeList(kind) => kind.name(),
            Self::NamedNodeMap => "NamedNodeMap",
            Self::Circular => "Circular",
            Self::Unknown => "Unknown",
        }
    }

    /// Split a wire value into its tag and payload, if it is tagged
    #[must_use]
    pub fn split(value: &Value) -> Option<(Self, &[Value])> {
        let items = value.as_array()?;
        let (head, payload) = items.split_first()?;
        let tag = Self::parse(head.as_str()?)?;
        Some((tag, payload))
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build a tagged wire value
#[must_use]
pub fn tagged(tag: Tag, payload: impl IntoIterator<Item = Value>) -> Value {
    let mut items = vec![Value::String(tag.as_str().to_string())];
    items.extend(payload);
    Value::Array(items)
}

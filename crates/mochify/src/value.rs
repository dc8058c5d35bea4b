//! Page-side value graph used by the in-process agent.
//!
//! Reference values are shared through [`HostRef`] so the same object can be
//! reachable from several places, including from itself.

use crate::encoding::{ErrorKind, NodeListKind, TypedArrayKind};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

/// A value as the page sees it
#[derive(Debug, Clone)]
pub enum HostValue {
    /// `undefined`
    Undefined,
    /// `null`
    Null,
    /// Boolean primitive
    Bool(bool),
    /// Number primitive (including NaN and infinities)
    Number(f64),
    /// BigInt primitive as decimal digits
    BigInt(String),
    /// String primitive
    String(String),
    /// Symbol primitive with optional description
    Symbol(Option<String>),
    /// Any reference value
    Object(HostRef),
}

/// Shared handle to a reference value
#[derive(Clone)]
pub struct HostRef(Arc<HostObject>);

/// Reference value: a kind plus own properties
#[derive(Debug)]
pub struct HostObject {
    kind: ObjectKind,
    properties: Mutex<Vec<Property>>,
}

/// Own property of a reference value
#[derive(Debug, Clone)]
pub struct Property {
    /// Property key
    pub key: PropertyKey,
    /// Property value
    pub value: HostValue,
    /// Whether enumeration reports it
    pub enumerable: bool,
}

/// Property key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyKey {
    /// String key (array indices included)
    Name(String),
    /// Symbol key with optional description
    Symbol(Option<String>),
}

/// Function metadata visible to the agent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionInfo {
    /// Constructor name (`Function`, `AsyncFunction`, ...)
    pub constructor: String,
    /// The `name` property
    pub name: String,
    /// `Function.prototype.toString()` output
    pub source: String,
    /// Name of the parent in the prototype chain, if non-default
    pub parent: Option<String>,
    /// Whether the engine reports this as a class; `None` when unknown
    pub is_class: Option<bool>,
}

/// Settled state of a promise
#[derive(Debug, Clone)]
pub enum PromiseState {
    /// Not settled yet
    Pending,
    /// Fulfilled with a value
    Fulfilled(HostValue),
    /// Rejected with a reason
    Rejected(HostValue),
}

/// DOM node shapes the agent understands
#[derive(Debug, Clone)]
pub enum DomNode {
    /// Element with attributes and children
    Element {
        /// Tag name as reported by the DOM
        tag: String,
        /// Attribute name/value pairs
        attributes: Vec<(String, String)>,
        /// Child nodes
        children: Vec<HostValue>,
    },
    /// Text node
    Text(String),
    /// Comment node
    Comment(String),
    /// Attribute node
    Attr {
        /// Attribute name
        name: String,
        /// Attribute value
        value: String,
    },
    /// Shadow root, fragment, node list or HTML collection
    Container {
        /// Container kind
        kind: NodeListKind,
        /// Child nodes
        children: Vec<HostValue>,
    },
    /// Attribute collection
    NamedNodeMap(Vec<(String, String)>),
}

/// Dynamic kind of a reference value
#[derive(Debug)]
pub enum ObjectKind {
    /// Plain record
    Plain,
    /// Array (elements are index-named properties)
    Array,
    /// Callable
    Function(FunctionInfo),
    /// Error instance
    Error {
        /// Constructor
        kind: ErrorKind,
        /// `message`
        message: String,
        /// `stack`, when the engine provides one
        stack: Option<String>,
    },
    /// Date with epoch milliseconds (NaN for invalid dates)
    Date(f64),
    /// Regular expression
    RegExp {
        /// Pattern source
        source: String,
        /// Flags
        flags: String,
    },
    /// Set in insertion order
    Set(Vec<HostValue>),
    /// Map in insertion order
    Map(Vec<(HostValue, HostValue)>),
    /// `WeakRef`
    WeakRef,
    /// `WeakSet`
    WeakSet,
    /// `WeakMap`
    WeakMap,
    /// Promise whose state can still change
    Promise(Mutex<PromiseState>),
    /// Typed array
    TypedArray {
        /// Element type
        kind: TypedArrayKind,
        /// Element values
        values: Vec<f64>,
    },
    /// DOM node or collection
    Dom(DomNode),
    /// The global window
    Window,
}

pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl HostRef {
    /// Wrap a new reference value
    #[must_use]
    pub fn new(kind: ObjectKind) -> Self {
        Self(Arc::new(HostObject {
            kind,
            properties: Mutex::new(Vec::new()),
        }))
    }

    /// Identity of the underlying object
    #[must_use]
    pub fn id(&self) -> usize {
        Arc::as_ptr(&self.0) as usize
    }

    /// Dynamic kind
    #[must_use]
    pub fn kind(&self) -> &ObjectKind {
        &self.0.kind
    }

    /// Define or replace an enumerable string-keyed property
    pub fn set(&self, key: impl Into<String>, value: HostValue) {
        self.define(PropertyKey::Name(key.into()), value, true);
    }

    /// Add an enumerable symbol-keyed property
    pub fn set_symbol(&self, description: impl Into<String>, value: HostValue) {
        let mut properties = lock(&self.0.properties);
        properties.push(Property {
            key: PropertyKey::Symbol(Some(description.into())),
            value,
            enumerable: true,
        });
    }

    /// Define or replace a property with explicit enumerability
    pub fn define(&self, key: PropertyKey, value: HostValue, enumerable: bool) {
        let mut properties = lock(&self.0.properties);
        let existing = match &key {
            PropertyKey::Name(_) => properties.iter_mut().find(|p| p.key == key),
            PropertyKey::Symbol(_) => None,
        };
        if let Some(property) = existing {
            property.value = value;
            property.enumerable = enumerable;
        } else {
            properties.push(Property {
                key,
                value,
                enumerable,
            });
        }
    }

    /// Look up a string-keyed property
    #[must_use]
    pub fn get(&self, key: &str) -> Option<HostValue> {
        lock(&self.0.properties)
            .iter()
            .find(|p| matches!(&p.key, PropertyKey::Name(name) if name == key))
            .map(|p| p.value.clone())
    }

    /// Own enumerable string-keyed entries, array indices first in ascending order
    #[must_use]
    pub fn own_keys(&self) -> Vec<(String, HostValue)> {
        let properties = lock(&self.0.properties);
        let mut indexed = Vec::new();
        let mut named = Vec::new();
        for property in properties.iter().filter(|p| p.enumerable) {
            if let PropertyKey::Name(name) = &property.key {
                match array_index(name) {
                    Some(index) => indexed.push((index, name.clone(), property.value.clone())),
                    None => named.push((name.clone(), property.value.clone())),
                }
            }
        }
        indexed.sort_by_key(|(index, _, _)| *index);
        indexed
            .into_iter()
            .map(|(_, name, value)| (name, value))
            .chain(named)
            .collect()
    }

    /// Own enumerable symbol-keyed entries as (description, value)
    #[must_use]
    pub fn own_symbols(&self) -> Vec<(String, HostValue)> {
        lock(&self.0.properties)
            .iter()
            .filter(|p| p.enumerable)
            .filter_map(|p| match &p.key {
                PropertyKey::Symbol(description) => {
                    Some((description.clone().unwrap_or_default(), p.value.clone()))
                }
                PropertyKey::Name(_) => None,
            })
            .collect()
    }

    /// Current state of a promise, `None` for other kinds
    #[must_use]
    pub fn promise_state(&self) -> Option<PromiseState> {
        match &self.0.kind {
            ObjectKind::Promise(state) => Some(lock(state).clone()),
            _ => None,
        }
    }

    /// Settle a pending promise; settled promises are left untouched
    pub fn settle(&self, outcome: PromiseState) {
        if let ObjectKind::Promise(state) = &self.0.kind {
            let mut state = lock(state);
            if matches!(*state, PromiseState::Pending) {
                *state = outcome;
            }
        }
    }
}

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Properties may point back at this object.
        f.debug_struct("HostRef")
            .field("id", &self.id())
            .field("kind", &self.0.kind)
            .finish_non_exhaustive()
    }
}

/// Canonical array index (`"0"`, `"17"`, never `"01"`)
#[must_use]
pub fn array_index(key: &str) -> Option<u32> {
    if key.len() > 1 && key.starts_with('0') {
        return None;
    }
    key.parse::<u32>().ok().filter(|index| *index < u32::MAX)
}

impl HostValue {
    /// String primitive
    #[must_use]
    pub fn string(value: impl Into<String>) -> Self {
        Self::String(value.into())
    }

    /// Symbol primitive with a description
    #[must_use]
    pub fn symbol(description: impl Into<String>) -> Self {
        Self::Symbol(Some(description.into()))
    }

    /// Empty plain record
    #[must_use]
    pub fn object() -> Self {
        Self::Object(HostRef::new(ObjectKind::Plain))
    }

    /// Plain record from entries
    #[must_use]
    pub fn object_from<K: Into<String>>(entries: impl IntoIterator<Item = (K, Self)>) -> Self {
        let object = HostRef::new(ObjectKind::Plain);
        for (key, value) in entries {
            object.set(key, value);
        }
        Self::Object(object)
    }

    /// Dense array
    #[must_use]
    pub fn array(items: impl IntoIterator<Item = Self>) -> Self {
        let array = HostRef::new(ObjectKind::Array);
        for (index, item) in items.into_iter().enumerate() {
            array.set(index.to_string(), item);
        }
        Self::Object(array)
    }

    /// Function with the given constructor name, name and source text
    #[must_use]
    pub fn function(constructor: &str, name: &str, source: &str) -> Self {
        Self::Object(HostRef::new(ObjectKind::Function(FunctionInfo {
            constructor: constructor.to_string(),
            name: name.to_string(),
            source: source.to_string(),
            parent: None,
            is_class: None,
        })))
    }

    /// Class object, optionally extending a named base
    #[must_use]
    pub fn class(name: &str, base: Option<&str>) -> Self {
        let source = match base {
            Some(base) => format!("class {name} extends {base} {{}}"),
            None => format!("class {name} {{}}"),
        };
        Self::Object(HostRef::new(ObjectKind::Function(FunctionInfo {
            constructor: "Function".to_string(),
            name: name.to_string(),
            source,
            parent: base.map(str::to_string),
            is_class: Some(true),
        })))
    }

    /// Error instance
    #[must_use]
    pub fn error(kind: ErrorKind, message: &str, stack: Option<&str>) -> Self {
        Self::Object(HostRef::new(ObjectKind::Error {
            kind,
            message: message.to_string(),
            stack: stack.map(str::to_string),
        }))
    }

    /// Date from epoch milliseconds
    #[must_use]
    pub fn date(millis: f64) -> Self {
        Self::Object(HostRef::new(ObjectKind::Date(millis)))
    }

    /// Regular expression
    #[must_use]
    pub fn regexp(source: &str, flags: &str) -> Self {
        Self::Object(HostRef::new(ObjectKind::RegExp {
            source: source.to_string(),
            flags: flags.to_string(),
        }))
    }

    /// Set with the given members
    #[must_use]
    pub fn set(items: impl IntoIterator<Item = Self>) -> Self {
        Self::Object(HostRef::new(ObjectKind::Set(items.into_iter().collect())))
    }

    /// Map with the given entries
    #[must_use]
    pub fn map(entries: impl IntoIterator<Item = (Self, Self)>) -> Self {
        Self::Object(HostRef::new(ObjectKind::Map(entries.into_iter().collect())))
    }

    /// Promise in the given state
    #[must_use]
    pub fn promise(state: PromiseState) -> Self {
        Self::Object(HostRef::new(ObjectKind::Promise(Mutex::new(state))))
    }

    /// Typed array
    #[must_use]
    pub fn typed_array(kind: TypedArrayKind, values: Vec<f64>) -> Self {
        Self::Object(HostRef::new(ObjectKind::TypedArray { kind, values }))
    }

    /// DOM node
    #[must_use]
    pub fn dom(node: DomNode) -> Self {
        Self::Object(HostRef::new(ObjectKind::Dom(node)))
    }

    /// Reference handle, if this is a reference value
    #[must_use]
    pub const fn as_ref(&self) -> Option<&HostRef> {
        match self {
            Self::Object(object) => Some(object),
            _ => None,
        }
    }
}

impl From<&str> for HostValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<f64> for HostValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<bool> for HostValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_array_index_canonical() {
        assert_eq!(array_index("0"), Some(0));
        assert_eq!(array_index("42"), Some(42));
        assert_eq!(array_index("01"), None);
        assert_eq!(array_index("-1"), None);
        assert_eq!(array_index("test"), None);
        assert_eq!(array_index("4294967295"), None);
    }

    #[test]
    fn test_own_keys_order_indices_first() {
        let object = HostRef::new(ObjectKind::Plain);
        object.set("b", HostValue::Number(1.0));
        object.set("2", HostValue::Number(2.0));
        object.set("a", HostValue::Number(3.0));
        object.set("0", HostValue::Number(4.0));
        let keys: Vec<String> = object.own_keys().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["0", "2", "b", "a"]);
    }

    #[test]
    fn test_set_replaces_existing() {
        let object = HostRef::new(ObjectKind::Plain);
        object.set("a", HostValue::Number(1.0));
        object.set("a", HostValue::Number(2.0));
        assert_eq!(object.own_keys().len(), 1);
        assert!(matches!(object.get("a"), Some(HostValue::Number(n)) if n == 2.0));
    }

    #[test]
    fn test_hidden_properties_not_enumerated() {
        let object = HostRef::new(ObjectKind::Plain);
        object.define(PropertyKey::Name("hidden".into()), HostValue::Null, false);
        object.define(PropertyKey::Symbol(Some("s".into())), HostValue::Null, false);
        assert!(object.own_keys().is_empty());
        assert!(object.own_symbols().is_empty());
    }

    #[test]
    fn test_symbols_are_distinct_entries() {
        let object = HostRef::new(ObjectKind::Plain);
        object.set_symbol("s", HostValue::Number(1.0));
        object.set_symbol("s", HostValue::Number(2.0));
        assert_eq!(object.own_symbols().len(), 2);
    }

    #[test]
    fn test_promise_settles_once() {
        let promise = HostValue::promise(PromiseState::Pending);
        let handle = promise.as_ref().unwrap();
        handle.settle(PromiseState::Fulfilled(HostValue::string("yes")));
        handle.settle(PromiseState::Rejected(HostValue::string("no")));
        assert!(matches!(
            handle.promise_state(),
            Some(PromiseState::Fulfilled(HostValue::String(s))) if s == "yes"
        ));
    }

    #[test]
    fn test_identity_shared_by_clones() {
        let object = HostValue::object();
        let a = object.as_ref().unwrap().clone();
        let b = object.as_ref().unwrap().clone();
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), HostValue::object().as_ref().unwrap().id());
    }
}

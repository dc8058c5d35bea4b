//! Tagged encoder for page-side values.
//!
//! Encoding is asynchronous because a promise's settled state is only
//! observable after giving it a chance to settle. Every reference value is
//! recorded with its path while its subtree is being encoded, so cycles come
//! out as `['Circular', path]` and encoding always terminates.

use crate::encoding::{tagged, FunctionFlavor, Tag, MAX_DEPTH};
use crate::value::{DomNode, FunctionInfo, HostRef, HostValue, ObjectKind, PromiseState};
use futures::future::BoxFuture;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Encode a value into its tagged wire form
pub async fn serialize(value: &HostValue) -> Value {
    Serializer::default().encode(value, Vec::new()).await
}

/// Encode every element of an argument list independently
pub async fn serialize_all(values: &[HostValue]) -> Value {
    let mut encoded = Vec::with_capacity(values.len());
    for value in values {
        encoded.push(serialize(value).await);
    }
    Value::Array(encoded)
}

/// Encode a finite number, keeping integers in integer form
#[must_use]
pub fn number(n: f64) -> Value {
    const SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;
    if n.fract() == 0.0 && n.abs() <= SAFE_INTEGER && !(n == 0.0 && n.is_sign_negative()) {
        Value::from(n as i64)
    } else {
        serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
    }
}

/// Whether a function's source text reads as a class declaration
#[must_use]
pub fn looks_like_class(source: &str) -> bool {
    let trimmed = source.trim();
    trimmed
        .strip_prefix("class")
        .is_some_and(|rest| rest.starts_with(|c: char| c.is_whitespace() || c == '{'))
        && trimmed.ends_with('}')
}

fn is_class(info: &FunctionInfo) -> bool {
    info.is_class.unwrap_or_else(|| looks_like_class(&info.source))
}

/// Stateful encoder holding the seen-map for one top-level value
#[derive(Debug, Default)]
pub struct Serializer {
    seen: HashMap<usize, Vec<String>>,
}

impl Serializer {
    /// Encode `value` found at `path`
    pub fn encode<'a>(&'a mut self, value: &'a HostValue, path: Vec<String>) -> BoxFuture<'a, Value> {
        Box::pin(async move {
            match value {
                HostValue::Undefined => tagged(Tag::Undefined, []),
                HostValue::Null => tagged(Tag::Null, []),
                HostValue::Bool(b) => tagged(Tag::Boolean, [Value::Bool(*b)]),
                HostValue::Number(n) => encode_number(*n),
                HostValue::BigInt(digits) => tagged(Tag::BigInt, [Value::String(digits.clone())]),
                HostValue::String(s) => tagged(Tag::String, [Value::String(s.clone())]),
                HostValue::Symbol(description) => tagged(
                    Tag::Symbol,
                    [description.clone().map_or(Value::Null, Value::String)],
                ),
                HostValue::Object(object) => {
                    if let Some(first) = self.seen.get(&object.id()) {
                        let path = first.iter().cloned().map(Value::String).collect();
                        return tagged(Tag::Circular, [Value::Array(path)]);
                    }
                    self.seen.insert(object.id(), path.clone());
                    let encoded = self.encode_object(object, &path).await;
                    self.seen.remove(&object.id());
                    encoded
                }
            }
        })
    }

    async fn encode_object(&mut self, object: &HostRef, path: &[String]) -> Value {
        match object.kind() {
            ObjectKind::Plain => {
                let (keys, symbols) = self.entries(object, path).await;
                tagged(Tag::Object, [keys, symbols])
            }
            ObjectKind::Array => {
                let (keys, symbols) = self.entries(object, path).await;
                tagged(Tag::Array, [keys, symbols])
            }
            ObjectKind::Function(info) => {
                if is_class(info) {
                    let mut payload = vec![Value::String(info.name.clone())];
                    if let Some(parent) = &info.parent {
                        payload.push(Value::String(parent.clone()));
                    }
                    return tagged(Tag::Class, payload);
                }
                let flavor = FunctionFlavor::from_constructor(&info.constructor);
                let (keys, symbols) = self.entries(object, path).await;
                tagged(
                    Tag::Function(flavor),
                    [Value::String(info.name.clone()), keys, symbols],
                )
            }
            ObjectKind::Error {
                kind,
                message,
                stack,
            } => {
                let (keys, symbols) = self.entries(object, path).await;
                tagged(
                    Tag::Error(*kind),
                    [
                        Value::String(message.clone()),
                        stack.clone().map_or(Value::Null, Value::String),
                        keys,
                        symbols,
                    ],
                )
            }
            ObjectKind::Date(millis) => {
                if millis.is_nan() {
                    tagged(Tag::Date, [Value::String("NaN".to_string())])
                } else {
                    tagged(Tag::Date, [number(*millis)])
                }
            }
            ObjectKind::RegExp { source, flags } => tagged(
                Tag::RegExp,
                [Value::String(source.clone()), Value::String(flags.clone())],
            ),
            ObjectKind::Set(items) => {
                let mut encoded = Vec::with_capacity(items.len());
                for (index, item) in items.iter().enumerate() {
                    encoded.push(self.encode(item, child(path, &index.to_string())).await);
                }
                tagged(Tag::Set, [Value::Array(encoded)])
            }
            ObjectKind::Map(entries) => {
                let mut encoded = Vec::with_capacity(entries.len());
                for (index, (key, value)) in entries.iter().enumerate() {
                    let at = child(path, &index.to_string());
                    let key = self.encode(key, at.clone()).await;
                    let value = self.encode(value, at).await;
                    encoded.push(Value::Array(vec![key, value]));
                }
                tagged(Tag::Map, [Value::Array(encoded)])
            }
            ObjectKind::WeakRef => tagged(Tag::WeakRef, []),
            ObjectKind::WeakSet => tagged(Tag::WeakSet, []),
            ObjectKind::WeakMap => tagged(Tag::WeakMap, []),
            ObjectKind::Promise(_) => self.encode_promise(object, path).await,
            ObjectKind::TypedArray { kind, values } => tagged(
                Tag::TypedArray(*kind),
                [Value::Array(values.iter().map(|n| number(*n)).collect())],
            ),
            ObjectKind::Dom(node) => self.encode_dom(node, path).await,
            ObjectKind::Window => tagged(Tag::Unknown, [Value::from("[object Window]")]),
        }
    }

    async fn encode_promise(&mut self, object: &HostRef, path: &[String]) -> Value {
        // Lose the race against anything that settles within one turn.
        tokio::task::yield_now().await;
        match object.promise_state() {
            Some(PromiseState::Fulfilled(value)) => {
                let encoded = self.encode(&value, path.to_vec()).await;
                tagged(Tag::Promise, [Value::from("fulfilled"), encoded])
            }
            Some(PromiseState::Rejected(reason)) => {
                let encoded = self.encode(&reason, path.to_vec()).await;
                tagged(Tag::Promise, [Value::from("rejected"), encoded])
            }
            Some(PromiseState::Pending) | None => tagged(Tag::Promise, [Value::from("pending")]),
        }
    }

    async fn encode_dom(&mut self, node: &DomNode, path: &[String]) -> Value {
        match node {
            DomNode::Element {
                tag,
                attributes,
                children,
            } => {
                let children = self.encode_children(children, path).await;
                tagged(
                    Tag::Element,
                    [
                        Value::String(tag.to_lowercase()),
                        attribute_map(attributes),
                        children,
                    ],
                )
            }
            DomNode::Text(text) => tagged(Tag::Text, [Value::String(text.clone())]),
            DomNode::Comment(text) => tagged(Tag::Comment, [Value::String(text.clone())]),
            DomNode::Attr { name, value } => tagged(
                Tag::Attr,
                [Value::String(name.clone()), Value::String(value.clone())],
            ),
            DomNode::Container { kind, children } => {
                let children = self.encode_children(children, path).await;
                tagged(Tag::NodeList(*kind), [children])
            }
            DomNode::NamedNodeMap(attributes) => {
                tagged(Tag::NamedNodeMap, [attribute_map(attributes)])
            }
        }
    }

    async fn encode_children(&mut self, children: &[HostValue], path: &[String]) -> Value {
        let mut encoded = Vec::with_capacity(children.len());
        for (index, node) in children.iter().enumerate() {
            encoded.push(self.encode(node, child(path, &index.to_string())).await);
        }
        Value::Array(encoded)
    }

    /// Own enumerable key and symbol entries, empty beyond the depth cap
    async fn entries(&mut self, object: &HostRef, path: &[String]) -> (Value, Value) {
        if path.len() > MAX_DEPTH {
            return (Value::Array(Vec::new()), Value::Array(Vec::new()));
        }
        let mut keys = Vec::new();
        for (name, value) in object.own_keys() {
            let encoded = self.encode(&value, child(path, &name)).await;
            keys.push(Value::Array(vec![Value::String(name), encoded]));
        }
        let mut symbols = Vec::new();
        for (description, value) in object.own_symbols() {
            let encoded = self.encode(&value, child(path, &description)).await;
            symbols.push(Value::Array(vec![Value::String(description), encoded]));
        }
        (Value::Array(keys), Value::Array(symbols))
    }
}

fn encode_number(n: f64) -> Value {
    if n.is_nan() {
        tagged(Tag::NaN, [])
    } else if n == f64::INFINITY {
        tagged(Tag::Infinity, [])
    } else if n == f64::NEG_INFINITY {
        tagged(Tag::NegInfinity, [])
    } else {
        tagged(Tag::Number, [number(n)])
    }
}

fn attribute_map(attributes: &[(String, String)]) -> Value {
    let map: Map<String, Value> = attributes
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();
    Value::Object(map)
}

fn child(path: &[String], segment: &str) -> Vec<String> {
    let mut next = path.to_vec();
    next.push(segment.to_string());
    next
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::encoding::{ErrorKind, NodeListKind, TypedArrayKind};
    use crate::value::PropertyKey;
    use serde_json::json;

    mod primitive_tests {
        use super::*;

        #[tokio::test]
        async fn test_primitives() {
            let values = [
                HostValue::Undefined,
                HostValue::Null,
                HostValue::Bool(true),
                HostValue::Number(42.0),
                HostValue::Number(1.5),
                HostValue::Number(f64::NAN),
                HostValue::Number(f64::INFINITY),
                HostValue::Number(f64::NEG_INFINITY),
                HostValue::BigInt("1".into()),
                HostValue::string("test"),
                HostValue::symbol("x"),
            ];
            let encoded = serialize_all(&values).await;
            assert_eq!(
                encoded,
                json!([
                    ["undefined"],
                    ["null"],
                    ["Boolean", true],
                    ["Number", 42],
                    ["Number", 1.5],
                    ["NaN"],
                    ["Infinity"],
                    ["-Infinity"],
                    ["BigInt", "1"],
                    ["String", "test"],
                    ["Symbol", "x"]
                ])
            );
        }

        #[test]
        fn test_number_keeps_negative_zero() {
            assert_eq!(number(-0.0).as_f64(), Some(-0.0));
            assert!(number(-0.0).as_f64().unwrap().is_sign_negative());
            assert_eq!(number(7.0), json!(7));
        }

        #[tokio::test]
        async fn test_dates() {
            assert_eq!(serialize(&HostValue::date(0.0)).await, json!(["Date", 0]));
            assert_eq!(
                serialize(&HostValue::date(f64::NAN)).await,
                json!(["Date", "NaN"])
            );
        }
    }

    mod container_tests {
        use super::*;

        #[tokio::test]
        async fn test_sparse_array_with_extra_property() {
            let array = HostRef::new(ObjectKind::Array);
            array.set("1", HostValue::Number(42.0));
            array.set("test", HostValue::Number(7.0));
            let encoded = serialize(&HostValue::Object(array)).await;
            assert_eq!(
                encoded,
                json!(["Array", [["1", ["Number", 42]], ["test", ["Number", 7]]], []])
            );
        }

        #[tokio::test]
        async fn test_only_enumerable_symbols() {
            let object = HostRef::new(ObjectKind::Plain);
            object.set_symbol("shown", HostValue::Number(1.0));
            object.define(
                PropertyKey::Symbol(Some("hidden".into())),
                HostValue::Number(2.0),
                false,
            );
            let encoded = serialize(&HostValue::Object(object)).await;
            assert_eq!(encoded, json!(["Object", [], [["shown", ["Number", 1]]]]));
        }

        #[tokio::test]
        async fn test_set_and_map() {
            let set = HostValue::set([HostValue::Number(1.0), HostValue::string("a")]);
            assert_eq!(
                serialize(&set).await,
                json!(["Set", [["Number", 1], ["String", "a"]]])
            );
            let map = HostValue::map([(HostValue::Number(1.0), HostValue::Number(2.0))]);
            assert_eq!(
                serialize(&map).await,
                json!(["Map", [[["Number", 1], ["Number", 2]]]])
            );
        }

        #[tokio::test]
        async fn test_typed_array() {
            let value = HostValue::typed_array(TypedArrayKind::Int8, vec![1.0, 2.0, 3.0]);
            assert_eq!(serialize(&value).await, json!(["Int8Array", [1, 2, 3]]));
        }

        #[tokio::test]
        async fn test_window_is_unknown() {
            let window = HostValue::Object(HostRef::new(ObjectKind::Window));
            assert_eq!(
                serialize(&window).await,
                json!(["Unknown", "[object Window]"])
            );
        }
    }

    mod cycle_tests {
        use super::*;

        #[tokio::test]
        async fn test_self_cycle_at_root() {
            let root = HostRef::new(ObjectKind::Plain);
            let inner = HostRef::new(ObjectKind::Plain);
            inner.set("back", HostValue::Object(root.clone()));
            root.set("a", HostValue::Object(inner));
            let encoded = serialize(&HostValue::Object(root)).await;
            assert_eq!(
                encoded,
                json!(["Object", [["a", ["Object", [["back", ["Circular", []]]], []]]], []])
            );
        }

        #[tokio::test]
        async fn test_cycle_path_points_at_first_sight() {
            let root = HostRef::new(ObjectKind::Plain);
            let a = HostRef::new(ObjectKind::Plain);
            let b = HostRef::new(ObjectKind::Plain);
            b.set("up", HostValue::Object(a.clone()));
            a.set("b", HostValue::Object(b));
            root.set("a", HostValue::Object(a));
            let encoded = serialize(&HostValue::Object(root)).await;
            let up = &encoded[1][0][1][1][0][1][1][0][1];
            assert_eq!(up, &json!(["Circular", ["a"]]));
        }

        #[tokio::test]
        async fn test_siblings_are_encoded_fully() {
            let shared = HostValue::object_from([("x", HostValue::Number(1.0))]);
            let root = HostValue::object_from([("a", shared.clone()), ("b", shared)]);
            let encoded = serialize(&root).await;
            assert_eq!(encoded[1][0][1], encoded[1][1][1]);
            assert_eq!(encoded[1][1][1][0], json!("Object"));
        }

        #[tokio::test]
        async fn test_array_containing_itself() {
            let array = HostRef::new(ObjectKind::Array);
            array.set("0", HostValue::Object(array.clone()));
            let encoded = serialize(&HostValue::Object(array)).await;
            assert_eq!(encoded, json!(["Array", [["0", ["Circular", []]]], []]));
        }
    }

    mod depth_tests {
        use super::*;

        fn chain(length: usize) -> HostValue {
            let mut value = HostValue::object_from([("leaf", HostValue::Number(1.0))]);
            for _ in 0..length {
                value = HostValue::object_from([("next", value)]);
            }
            value
        }

        #[tokio::test]
        async fn test_deep_chain_collapses_to_empty_entries() {
            let encoded = serialize(&chain(10)).await;
            let mut cursor = &encoded;
            let mut depth = 0;
            while let Some(next) = cursor[1].get(0) {
                cursor = &next[1];
                depth += 1;
            }
            assert_eq!(depth, MAX_DEPTH + 1);
            assert_eq!(cursor, &json!(["Object", [], []]));
        }

        #[tokio::test]
        async fn test_shallow_chain_is_complete() {
            let encoded = serialize(&chain(2)).await;
            assert_eq!(
                encoded,
                json!(["Object", [["next", ["Object", [["next", ["Object", [["leaf", ["Number", 1]]], []]]], []]]], []])
            );
        }
    }

    mod function_tests {
        use super::*;

        #[tokio::test]
        async fn test_function_flavors() {
            let plain = HostValue::function("Function", "a", "function a() {}");
            let asynchronous = HostValue::function("AsyncFunction", "b", "async function b() {}");
            assert_eq!(serialize(&plain).await, json!(["Function", "a", [], []]));
            assert_eq!(
                serialize(&asynchronous).await,
                json!(["AsyncFunction", "b", [], []])
            );
        }

        #[tokio::test]
        async fn test_function_own_keys() {
            let function = HostValue::function("Function", "f", "function f() {}");
            function.as_ref().unwrap().set("test", HostValue::Number(1.0));
            assert_eq!(
                serialize(&function).await,
                json!(["Function", "f", [["test", ["Number", 1]]], []])
            );
        }

        #[tokio::test]
        async fn test_classes() {
            assert_eq!(
                serialize(&HostValue::class("A", None)).await,
                json!(["Class", "A"])
            );
            assert_eq!(
                serialize(&HostValue::class("A", Some("B"))).await,
                json!(["Class", "A", "B"])
            );
            let textual = HostValue::function("Function", "C", "class C {}");
            assert_eq!(serialize(&textual).await, json!(["Class", "C"]));
        }

        #[test]
        fn test_class_heuristic() {
            assert!(looks_like_class("class A {}"));
            assert!(looks_like_class("class{}"));
            assert!(looks_like_class("class A extends B { constructor() {} }"));
            assert!(!looks_like_class("classy => {}"));
            assert!(!looks_like_class("function classA() {}"));
            assert!(!looks_like_class("class A {} // trailing"));
        }
    }

    mod error_tests {
        use super::*;

        #[tokio::test]
        async fn test_error_with_properties() {
            let error = HostValue::error(ErrorKind::TypeError, "Oh noes!", Some("TypeError: Oh noes!\n    at x"));
            error.as_ref().unwrap().set("code", HostValue::string("E_X"));
            assert_eq!(
                serialize(&error).await,
                json!([
                    "TypeError",
                    "Oh noes!",
                    "TypeError: Oh noes!\n    at x",
                    [["code", ["String", "E_X"]]],
                    []
                ])
            );
        }

        #[tokio::test]
        async fn test_error_without_stack() {
            let error = HostValue::error(ErrorKind::Error, "x", None);
            assert_eq!(serialize(&error).await, json!(["Error", "x", null, [], []]));
        }
    }

    mod promise_tests {
        use super::*;

        #[tokio::test]
        async fn test_promise_states() {
            let pending = HostValue::promise(PromiseState::Pending);
            let fulfilled = HostValue::promise(PromiseState::Fulfilled(HostValue::string("yes")));
            let rejected = HostValue::promise(PromiseState::Rejected(HostValue::string("no")));
            assert_eq!(serialize(&pending).await, json!(["Promise", "pending"]));
            assert_eq!(
                serialize(&fulfilled).await,
                json!(["Promise", "fulfilled", ["String", "yes"]])
            );
            assert_eq!(
                serialize(&rejected).await,
                json!(["Promise", "rejected", ["String", "no"]])
            );
        }
    }

    mod dom_tests {
        use super::*;

        #[tokio::test]
        async fn test_element_lowercases_tag() {
            let element = HostValue::dom(DomNode::Element {
                tag: "DIV".into(),
                attributes: vec![("class".into(), "x".into())],
                children: vec![HostValue::dom(DomNode::Text("hi".into()))],
            });
            assert_eq!(
                serialize(&element).await,
                json!(["Element", "div", {"class": "x"}, [["Text", "hi"]]])
            );
        }

        #[tokio::test]
        async fn test_containers() {
            let list = HostValue::dom(DomNode::Container {
                kind: NodeListKind::NodeList,
                children: vec![HostValue::dom(DomNode::Comment("c".into()))],
            });
            assert_eq!(
                serialize(&list).await,
                json!(["NodeList", [["Comment", "c"]]])
            );
            let attrs = HostValue::dom(DomNode::NamedNodeMap(vec![("id".into(), "a".into())]));
            assert_eq!(
                serialize(&attrs).await,
                json!(["NamedNodeMap", {"id": "a"}])
            );
        }
    }
}

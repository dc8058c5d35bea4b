//! Host-side decoding of the tagged wire encoding into [`Shadow`] values.
//!
//! Decoding never fails: an unknown tag or an untagged array/object passes
//! through as [`Shadow::Raw`], and a known tag with a malformed payload is
//! logged and passed through the same way.

use crate::encoding::{ErrorKind, Tag};
use crate::shadow::{
    ArrayShadow, Attr, ErrorShadow, PromiseShadow, Properties, Shadow, Symbol, Synthetic,
};
use crate::stack::StackMapper;
use crate::value::array_index;
use num_bigint::BigInt;
use serde_json::Value;

/// Decodes wire values, rewriting error stacks when a mapper is installed
#[derive(Debug, Clone, Default)]
pub struct Reconstructor {
    mapper: Option<StackMapper>,
}

impl Reconstructor {
    /// Create a reconstructor, optionally with a stack mapper
    #[must_use]
    pub fn new(mapper: Option<StackMapper>) -> Self {
        Self { mapper }
    }

    /// Installed stack mapper
    #[must_use]
    pub fn mapper(&self) -> Option<&StackMapper> {
        self.mapper.as_ref()
    }

    /// Rewrite a raw stack string, or return it unchanged without a mapper
    #[must_use]
    pub fn map_stack(&self, stack: &str) -> String {
        self.mapper
            .as_ref()
            .map_or_else(|| stack.to_string(), |mapper| mapper.map_stack(stack))
    }

    /// Decode a single wire value
    #[must_use]
    pub fn reconstruct(&self, value: &Value) -> Shadow {
        match value {
            Value::Null => Shadow::Null,
            Value::Bool(b) => Shadow::Bool(*b),
            Value::Number(n) => Shadow::Number(n.as_f64().unwrap_or(f64::NAN)),
            Value::String(s) => Shadow::String(s.clone()),
            Value::Array(_) => match Tag::split(value) {
                Some((tag, payload)) => self.decode(tag, payload).unwrap_or_else(|| {
                    tracing::warn!(tag = %tag, "malformed payload, passing through");
                    Shadow::Raw(value.clone())
                }),
                None => Shadow::Raw(value.clone()),
            },
            Value::Object(_) => Shadow::Raw(value.clone()),
        }
    }

    /// Decode each element of an argument list, as carried by `console.*`
    #[must_use]
    pub fn reconstruct_args(&self, args: &Value) -> Vec<Shadow> {
        match args {
            Value::Array(items) => items.iter().map(|item| self.reconstruct(item)).collect(),
            other => vec![self.reconstruct(other)],
        }
    }

    fn decode(&self, tag: Tag, payload: &[Value]) -> Option<Shadow> {
        let shadow = match tag {
            Tag::Undefined => Shadow::Undefined,
            Tag::Null => Shadow::Null,
            Tag::Boolean => Shadow::Bool(payload.first()?.as_bool()?),
            Tag::Number => Shadow::Number(payload.first()?.as_f64()?),
            Tag::NaN => Shadow::Number(f64::NAN),
            Tag::Infinity => Shadow::Number(f64::INFINITY),
            Tag::NegInfinity => Shadow::Number(f64::NEG_INFINITY),
            Tag::BigInt => Shadow::BigInt(payload.first()?.as_str()?.parse::<BigInt>().ok()?),
            Tag::String => Shadow::String(payload.first()?.as_str()?.to_string()),
            Tag::Symbol => Shadow::Symbol(Symbol::fresh(
                payload.first().and_then(Value::as_str).map(str::to_string),
            )),
            Tag::Date => match payload.first()? {
                Value::Number(n) => Shadow::Date(n.as_f64()?),
                _ => Shadow::Date(f64::NAN),
            },
            Tag::RegExp => Shadow::RegExp {
                source: string_at(payload, 0)?,
                flags: string_at(payload, 1).unwrap_or_default(),
            },
            Tag::Function(flavor) => Shadow::Function {
                flavor,
                name: string_at(payload, 0).unwrap_or_default(),
                props: self.properties(payload.get(1), payload.get(2)),
            },
            Tag::Class => Shadow::Class {
                name: string_at(payload, 0).unwrap_or_default(),
                base: string_at(payload, 1),
            },
            Tag::Error(kind) => Shadow::Error(Box::new(self.error(kind, payload))),
            Tag::Array => Shadow::Array(self.array(payload.first(), payload.get(1))),
            Tag::Object => Shadow::Object(self.properties(payload.first(), payload.get(1))),
            Tag::Set => Shadow::Set(
                payload
                    .first()?
                    .as_array()?
                    .iter()
                    .map(|item| self.reconstruct(item))
                    .collect(),
            ),
            Tag::Map => Shadow::Map(
                payload
                    .first()?
                    .as_array()?
                    .iter()
                    .filter_map(|pair| {
                        let pair = pair.as_array()?;
                        Some((self.reconstruct(pair.first()?), self.reconstruct(pair.get(1)?)))
                    })
                    .collect(),
            ),
            Tag::WeakRef => Shadow::WeakRef,
            Tag::WeakSet => Shadow::WeakSet,
            Tag::WeakMap => Shadow::WeakMap,
            Tag::Promise => Shadow::Promise(match payload.first()?.as_str()? {
                "fulfilled" => PromiseShadow::Fulfilled(Box::new(self.settled(payload))),
                "rejected" => PromiseShadow::Rejected(Box::new(self.settled(payload))),
                _ => PromiseShadow::Pending,
            }),
            Tag::TypedArray(kind) => Shadow::TypedArray {
                kind,
                values: payload
                    .first()?
                    .as_array()?
                    .iter()
                    .map(|n| n.as_f64().unwrap_or(f64::NAN))
                    .collect(),
            },
            Tag::Attr => Shadow::Synthetic(Synthetic::Attr(Attr::new(
                string_at(payload, 0)?,
                string_at(payload, 1).unwrap_or_default(),
            ))),
            Tag::Comment => Shadow::Synthetic(Synthetic::Comment(string_at(payload, 0)?)),
            Tag::Text => Shadow::Synthetic(Synthetic::Text(string_at(payload, 0)?)),
            Tag::Element => Shadow::Synthetic(Synthetic::Element {
                tag: string_at(payload, 0)?,
                attrs: attributes(payload.get(1)),
                children: self.children(payload.get(2)),
            }),
            Tag::NodeList(kind) => Shadow::Synthetic(Synthetic::NodeList {
                kind,
                children: self.children(payload.first()),
            }),
            Tag::NamedNodeMap => {
                Shadow::Synthetic(Synthetic::NamedNodeMap(attributes(payload.first())))
            }
            Tag::Circular => Shadow::String(circular(payload.first())),
            Tag::Unknown => Shadow::Raw(payload.first().cloned().unwrap_or(Value::Null)),
        };
        Some(shadow)
    }

    fn settled(&self, payload: &[Value]) -> Shadow {
        payload
            .get(1)
            .map_or(Shadow::Undefined, |value| self.reconstruct(value))
    }

    fn error(&self, kind: ErrorKind, payload: &[Value]) -> ErrorShadow {
        let mut error = ErrorShadow::new(kind, string_at(payload, 0).unwrap_or_default());
        error.props = self.properties(payload.get(2), payload.get(3));
        error.stack = string_at(payload, 1).map(|stack| match &self.mapper {
            Some(mapper) => {
                let head = format!("{}: {}", error.name(), error.message);
                let frames = mapper.map_stack(&stack);
                if frames.is_empty() {
                    head
                } else {
                    format!("{head}\n{frames}")
                }
            }
            None => stack,
        });
        error
    }

    fn array(&self, keys: Option<&Value>, symbols: Option<&Value>) -> ArrayShadow {
        let mut array = ArrayShadow::default();
        for (key, value) in entries(keys) {
            let value = self.reconstruct(value);
            match array_index(key) {
                Some(index) => array.set(index, value),
                None => array.extra.insert(key, value),
            }
        }
        array.extra.symbols = self.symbols(symbols);
        array
    }

    fn properties(&self, keys: Option<&Value>, symbols: Option<&Value>) -> Properties {
        let mut props = Properties::default();
        for (key, value) in entries(keys) {
            props.insert(key, self.reconstruct(value));
        }
        props.symbols = self.symbols(symbols);
        props
    }

    fn symbols(&self, symbols: Option<&Value>) -> Vec<(Symbol, Shadow)> {
        entries(symbols)
            .map(|(description, value)| {
                (
                    Symbol::fresh(Some(description.to_string())),
                    self.reconstruct(value),
                )
            })
            .collect()
    }

    fn children(&self, children: Option<&Value>) -> Vec<Shadow> {
        children
            .and_then(Value::as_array)
            .map(|items| items.iter().map(|item| self.reconstruct(item)).collect())
            .unwrap_or_default()
    }
}

fn string_at(payload: &[Value], index: usize) -> Option<String> {
    payload.get(index)?.as_str().map(str::to_string)
}

/// `[name, encoded]` pairs; malformed entries are skipped
fn entries(list: Option<&Value>) -> impl Iterator<Item = (&str, &Value)> {
    list.and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(|entry| {
            let pair = entry.as_array()?;
            Some((pair.first()?.as_str()?, pair.get(1)?))
        })
}

fn attributes(map: Option<&Value>) -> Vec<Attr> {
    map.and_then(Value::as_object)
        .map(|map| {
            map.iter()
                .map(|(name, value)| Attr::new(name.clone(), value.as_str().unwrap_or_default()))
                .collect()
        })
        .unwrap_or_default()
}

fn circular(path: Option<&Value>) -> String {
    let path: Vec<&str> = path
        .and_then(Value::as_array)
        .map(|segments| segments.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default();
    format!("[Circular *{}]", path.join("."))
}

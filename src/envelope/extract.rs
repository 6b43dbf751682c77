//! Object-value extraction policy.
//!
//! Turns opaque [`Object`]s into JSON by trying an ordered list of
//! capabilities; the first one the object supports wins. Objects nothing
//! matches stay opaque and are reported by the codec as an unsupported type.

use serde::ser::{Error as _, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use super::{Datum, Object};
use crate::codec::{DEFAULT_DEPTH, UNSUPPORTED_TYPE_PREFIX};

/// Caller-supplied extraction step.
pub type ExtractFn = Rc<dyn Fn(&dyn Object) -> Option<Value>>;

/// One extraction step.
#[derive(Clone)]
pub enum Capability {
    /// [`Object::to_json_value`].
    SelfSerialize,
    /// [`Object::items`], each item extracted recursively.
    ListLike,
    /// [`Object::as_mapping`].
    RecordLike,
    /// [`Object::to_display_string`].
    Stringify,
    Custom(ExtractFn),
}

impl Capability {
    pub fn custom<F>(extract: F) -> Self
    where
        F: Fn(&dyn Object) -> Option<Value> + 'static,
    {
        Capability::Custom(Rc::new(extract))
    }
}

impl fmt::Debug for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::SelfSerialize => f.write_str("SelfSerialize"),
            Capability::ListLike => f.write_str("ListLike"),
            Capability::RecordLike => f.write_str("RecordLike"),
            Capability::Stringify => f.write_str("Stringify"),
            Capability::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Render-ready value: JSON, a list of extracted items, or an object no
/// capability could handle.
#[derive(Clone, Debug)]
pub enum Rendered {
    Json(Value),
    List(Vec<Rendered>),
    Opaque(Rc<dyn Object>),
}

impl Rendered {
    /// Unfiltered form of a datum: objects stay opaque.
    pub fn raw(datum: &Datum) -> Self {
        match datum {
            Datum::Json(value) => Rendered::Json(value.clone()),
            Datum::Object(object) => Rendered::Opaque(Rc::clone(object)),
        }
    }
}

impl Serialize for Rendered {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Rendered::Json(value) => value.serialize(serializer),
            Rendered::List(items) => serializer.collect_seq(items),
            Rendered::Opaque(object) => Err(S::Error::custom(format_args!(
                "{}: {}",
                UNSUPPORTED_TYPE_PREFIX,
                object.type_name()
            ))),
        }
    }
}

/// Ordered extraction steps.
#[derive(Clone, Debug)]
pub struct ExtractionPolicy {
    steps: Vec<Capability>,
}

impl ExtractionPolicy {
    /// Self-serialize, list-like, record-like, stringify.
    pub fn standard() -> Self {
        Self {
            steps: vec![
                Capability::SelfSerialize,
                Capability::ListLike,
                Capability::RecordLike,
                Capability::Stringify,
            ],
        }
    }

    /// No steps: every object stays opaque.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Try `step` after the existing ones.
    pub fn with(mut self, step: Capability) -> Self {
        self.steps.push(step);
        self
    }

    /// Try `step` before the existing ones.
    pub fn with_first(mut self, step: Capability) -> Self {
        self.steps.insert(0, step);
        self
    }

    pub fn steps(&self) -> &[Capability] {
        &self.steps
    }

    /// Default rendering of a datum: JSON passes through, objects are extracted.
    pub fn resolve(&self, datum: &Datum) -> Rendered {
        self.resolve_within(datum, &mut Vec::new())
    }

    pub fn extract(&self, object: &Rc<dyn Object>) -> Rendered {
        self.extract_within(object, &mut Vec::new())
    }

    fn resolve_within(&self, datum: &Datum, ancestors: &mut Vec<*const ()>) -> Rendered {
        match datum {
            Datum::Json(value) => Rendered::Json(value.clone()),
            Datum::Object(object) => self.extract_within(object, ancestors),
        }
    }

    /// `ancestors` holds the objects currently being extracted. An object that
    /// contains itself, or a chain deeper than [`DEFAULT_DEPTH`], stays opaque.
    fn extract_within(
        &self,
        object: &Rc<dyn Object>,
        ancestors: &mut Vec<*const ()>,
    ) -> Rendered {
        let address = Rc::as_ptr(object).cast::<()>();
        if ancestors.contains(&address) || ancestors.len() >= DEFAULT_DEPTH {
            tracing::trace!(type_name = object.type_name(), "object_nesting_rejected");
            return Rendered::Opaque(Rc::clone(object));
        }

        ancestors.push(address);
        let rendered = self
            .steps
            .iter()
            .find_map(|step| self.apply(step, object.as_ref(), ancestors));
        ancestors.pop();

        rendered.unwrap_or_else(|| {
            tracing::trace!(type_name = object.type_name(), "object_left_opaque");
            Rendered::Opaque(Rc::clone(object))
        })
    }

    fn apply(
        &self,
        step: &Capability,
        object: &dyn Object,
        ancestors: &mut Vec<*const ()>,
    ) -> Option<Rendered> {
        match step {
            Capability::SelfSerialize => object.to_json_value().map(Rendered::Json),
            Capability::ListLike => object.items().map(|items| {
                Rendered::List(
                    items
                        .iter()
                        .map(|item| self.resolve_within(item, ancestors))
                        .collect(),
                )
            }),
            Capability::RecordLike => object
                .as_mapping()
                .map(|fields| Rendered::Json(Value::Object(fields))),
            Capability::Stringify => object
                .to_display_string()
                .map(|text| Rendered::Json(Value::String(text))),
            Capability::Custom(extract) => extract(object).map(Rendered::Json),
        }
    }
}

impl Default for ExtractionPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

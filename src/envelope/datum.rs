//! Values stored in an envelope's data map.
//!
//! A [`Datum`] is either plain JSON or an opaque [`Object`] whose JSON form is
//! decided at render time. A [`Bound`] slot shares its storage with the caller.

use serde_json::{Map, Value};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

/// Capabilities an opaque value may expose to the extraction policy.
///
/// Every capability defaults to "not supported"; implement only the ones the
/// type actually has. The policy tries them in order and takes the first hit.
pub trait Object: fmt::Debug {
    /// Name used in diagnostics.
    fn type_name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    /// Self-serialization.
    fn to_json_value(&self) -> Option<Value> {
        None
    }

    /// Indexable collection of items, each extracted with the same policy.
    fn items(&self) -> Option<Vec<Datum>> {
        None
    }

    /// Record-like model exposing its fields.
    fn as_mapping(&self) -> Option<Map<String, Value>> {
        None
    }

    /// String form.
    fn to_display_string(&self) -> Option<String> {
        None
    }
}

/// Last path segment of a Rust type name, without generics.
pub(crate) fn short_type_name(full: &str) -> &str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// A data value: plain JSON or an opaque object.
#[derive(Clone, Debug)]
pub enum Datum {
    Json(Value),
    Object(Rc<dyn Object>),
}

impl Datum {
    pub fn object<O: Object + 'static>(object: O) -> Self {
        Datum::Object(Rc::new(object))
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Datum::Json(value) => Some(value),
            Datum::Object(_) => None,
        }
    }

    pub fn as_object(&self) -> Option<&Rc<dyn Object>> {
        match self {
            Datum::Object(object) => Some(object),
            Datum::Json(_) => None,
        }
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Datum::Object(_))
    }

    pub fn into_json(self) -> Option<Value> {
        match self {
            Datum::Json(value) => Some(value),
            Datum::Object(_) => None,
        }
    }
}

impl Default for Datum {
    fn default() -> Self {
        Datum::Json(Value::Null)
    }
}

/// Objects compare by identity.
impl PartialEq for Datum {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Datum::Json(a), Datum::Json(b)) => a == b,
            (Datum::Object(a), Datum::Object(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl PartialEq<Value> for Datum {
    fn eq(&self, other: &Value) -> bool {
        self.as_json() == Some(other)
    }
}

impl From<Rc<dyn Object>> for Datum {
    fn from(object: Rc<dyn Object>) -> Self {
        Datum::Object(object)
    }
}

/// `From` impls for everything `serde_json::Value` already converts from.
macro_rules! impl_datum_from_json {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Datum {
                fn from(value: $ty) -> Self {
                    Datum::Json(Value::from(value))
                }
            }
        )*
    };
}

impl_datum_from_json!(
    Value,
    bool,
    i32,
    i64,
    u32,
    u64,
    f64,
    String,
    &str,
    Map<String, Value>,
    Vec<Value>,
);

/// Shared storage bound into an envelope.
///
/// Clones of a `Bound` refer to the same cell: a write through any handle is
/// what the envelope sees on its next render. Handles are `!Send`, so sharing
/// stays on one thread.
#[derive(Clone, Debug, Default)]
pub struct Bound(Rc<RefCell<Datum>>);

impl Bound {
    pub fn new(value: impl Into<Datum>) -> Self {
        Self(Rc::new(RefCell::new(value.into())))
    }

    /// Replace the shared value.
    pub fn set(&self, value: impl Into<Datum>) {
        *self.0.borrow_mut() = value.into();
    }

    /// Current value (cloned).
    pub fn get(&self) -> Datum {
        self.0.borrow().clone()
    }

    /// Mutate the shared value in place.
    pub fn update(&self, f: impl FnOnce(&mut Datum)) {
        f(&mut self.0.borrow_mut());
    }

    pub fn ptr_eq(&self, other: &Bound) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

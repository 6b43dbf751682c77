//! Per-key render filters.

use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use super::Datum;

/// Transform applied to a data value at render time.
pub type Transform = Rc<dyn Fn(&Datum) -> Value>;

/// Explicit filter rule for one data key.
///
/// A key with no rule at all falls back to the extraction policy; `Raw`
/// switches filtering off so the stored value is encoded as-is, objects
/// included.
#[derive(Clone)]
pub enum Filter {
    Transform(Transform),
    Raw,
}

impl Filter {
    pub fn new<F>(transform: F) -> Self
    where
        F: Fn(&Datum) -> Value + 'static,
    {
        Filter::Transform(Rc::new(transform))
    }

    pub fn is_raw(&self) -> bool {
        matches!(self, Filter::Raw)
    }

    /// Run the transform; `None` for `Raw`.
    pub fn apply(&self, datum: &Datum) -> Option<Value> {
        match self {
            Filter::Transform(transform) => Some(transform(datum)),
            Filter::Raw => None,
        }
    }

    /// Whether both rules are the same rule (same transform instance or both raw).
    pub fn same_as(&self, other: &Filter) -> bool {
        match (self, other) {
            (Filter::Transform(a), Filter::Transform(b)) => Rc::ptr_eq(a, b),
            (Filter::Raw, Filter::Raw) => true,
            _ => false,
        }
    }
}

impl fmt::Debug for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Filter::Transform(_) => f.write_str("Filter::Transform(..)"),
            Filter::Raw => f.write_str("Filter::Raw"),
        }
    }
}

//! Envelope - the JSend response builder.
//!
//! An Envelope carries a status, an ordered data map, per-key render filters
//! and, for error responses, a message and optional code. Nothing is resolved
//! until [`Envelope::render`]: filters run, opaque objects go through the
//! [`ExtractionPolicy`], and the document is encoded by the codec.
//!
//! Status transitions:
//! ```text
//!   success ──set_status──▶ fail ──set_status──▶ success
//!      │                      │
//!      └──── set_message / set_error (always) ────▶ error
//! ```
//! Nothing ever leaves `error` on its own; only an explicit `set_status` does.
//!
//! Example:
//! ```
//! use jsend::{Envelope, Status};
//!
//! let mut envelope = Envelope::new();
//! envelope.set("posts", vec![serde_json::json!({"id": 1})]);
//! envelope.set_status(Status::Success).unwrap();
//! assert_eq!(
//!     envelope.render().unwrap(),
//!     r#"{"status":"success","data":{"posts":[{"id":1}]}}"#
//! );
//! ```

use indexmap::IndexMap;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

use crate::codec::{EncodeOptions, DEFAULT_DEPTH};
use crate::types::{Config, Error, Result};

pub mod datum;
pub mod enums;
pub mod export;
pub mod extract;
pub mod filter;
pub mod message;
pub mod response;

pub use datum::{Bound, Datum, Object};
pub use enums::*;
pub use extract::{Capability, ExtractFn, ExtractionPolicy, Rendered};
pub use filter::{Filter, Transform};
pub use message::{interpolate, ErrorLike, Failure, Interpolate, Translate};
pub use response::{Response, ResponseSink};

use message::compose;
use response::{CONTENT_TYPE, FORMAT_HEADER, FORMAT_NAME, JSON_MEDIA_TYPE};

/// Code given to the error envelope that replaces an unencodable one.
pub const FALLBACK_CODE: i64 = 500;

/// Separator for nested reads in [`Envelope::get`].
pub const PATH_DELIMITER: char = '.';

/// Anything the code setter coerces to an integer.
pub trait IntoCode {
    fn into_code(self) -> i64;
}

macro_rules! impl_into_code {
    ($($ty:ty),* $(,)?) => {
        $(
            impl IntoCode for $ty {
                fn into_code(self) -> i64 {
                    i64::from(self)
                }
            }
        )*
    };
}

impl_into_code!(i64, i32, i16, i8, u32, u16, u8, bool);

impl IntoCode for u64 {
    fn into_code(self) -> i64 {
        i64::try_from(self).unwrap_or(i64::MAX)
    }
}

impl IntoCode for usize {
    fn into_code(self) -> i64 {
        i64::try_from(self).unwrap_or(i64::MAX)
    }
}

/// Leading integer of the string (`"500"`, `" 42px"`, `"-7"`); 0 when there is none.
impl IntoCode for &str {
    fn into_code(self) -> i64 {
        leading_integer(self)
    }
}

impl IntoCode for String {
    fn into_code(self) -> i64 {
        leading_integer(&self)
    }
}

fn leading_integer(text: &str) -> i64 {
    let trimmed = text.trim_start();
    let (negative, unsigned) = match trimmed.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    let magnitude = unsigned
        .bytes()
        .take_while(u8::is_ascii_digit)
        .fold(0i64, |acc, digit| {
            acc.saturating_mul(10).saturating_add(i64::from(digit - b'0'))
        });
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

/// Storage behind one data key.
#[derive(Clone, Debug)]
enum Slot {
    Value(Datum),
    Bound(Bound),
}

impl Slot {
    /// Current value. Bound cells are released before the clone is returned,
    /// so callbacks that run on it may write to the same cell.
    fn resolve(&self) -> Datum {
        match self {
            Slot::Value(datum) => datum.clone(),
            Slot::Bound(bound) => bound.get(),
        }
    }
}

/// JSend response envelope.
#[derive(Clone)]
pub struct Envelope {
    status: Status,
    data: IndexMap<String, Slot>,
    filters: IndexMap<String, Filter>,
    code: Option<i64>,
    message: Option<String>,
    policy: ExtractionPolicy,
    translator: Rc<dyn Translate>,
    encode_options: EncodeOptions,
}

impl Envelope {
    /// Empty success envelope.
    pub fn new() -> Self {
        Self {
            status: Status::Success,
            data: IndexMap::new(),
            filters: IndexMap::new(),
            code: None,
            message: None,
            policy: ExtractionPolicy::standard(),
            translator: Rc::new(Interpolate),
            encode_options: EncodeOptions::default(),
        }
    }

    /// Envelope seeded with initial data.
    pub fn from_data<I, K, V>(data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Datum>,
    {
        let mut envelope = Self::new();
        envelope.replace_data(data);
        envelope
    }

    /// Success envelope carrying `data`.
    pub fn success<I, K, V>(data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Datum>,
    {
        Self::from_data(data)
    }

    /// Fail envelope carrying `data`, typically per-field validation messages.
    pub fn fail<I, K, V>(data: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Datum>,
    {
        Self::from_data(data).with_status(Status::Fail)
    }

    /// Error envelope with `message` run through the default translator.
    pub fn error(message: &str) -> Self {
        Self::new().with_message(message)
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// Take encoder defaults from configuration.
    pub fn with_config(mut self, config: &Config) -> Self {
        self.encode_options = config.codec.encode_options();
        self
    }

    /// Replace the extraction policy used for unfiltered objects.
    pub fn with_policy(mut self, policy: ExtractionPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Replace the translator used by [`Envelope::set_message`].
    pub fn with_translator<T: Translate + 'static>(mut self, translator: T) -> Self {
        self.translator = Rc::new(translator);
        self
    }

    /// Encoder options used by [`Envelope::render`].
    pub fn with_encode_options(mut self, options: EncodeOptions) -> Self {
        self.encode_options = options;
        self
    }

    /// Builder form of [`Envelope::set`].
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Datum>) -> Self {
        self.set(key, value);
        self
    }

    /// Builder form of [`Envelope::set_filter`].
    pub fn with_filter(mut self, key: impl Into<String>, filter: Filter) -> Self {
        self.set_filter(key, filter);
        self
    }

    /// Set the status directly; a typed `Status` cannot be invalid.
    pub fn with_status(mut self, status: Status) -> Self {
        self.status = status;
        self
    }

    /// Builder form of [`Envelope::set_code`].
    pub fn with_code(mut self, code: impl IntoCode) -> Self {
        self.set_code(code);
        self
    }

    /// Builder form of [`Envelope::set_message`] with no substitutions.
    pub fn with_message(mut self, template: &str) -> Self {
        self.set_message(template, &[]);
        self
    }

    // =========================================================================
    // Data
    // =========================================================================

    /// Store a value under `key`, replacing any bound slot. The key's filter
    /// rule is left as it was.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Datum>) -> &mut Self {
        self.data.insert(key.into(), Slot::Value(value.into()));
        self
    }

    /// Store a value and overwrite the key's filter rule.
    pub fn set_filtered(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Datum>,
        filter: Filter,
    ) -> &mut Self {
        let key = key.into();
        self.filters.insert(key.clone(), filter);
        self.data.insert(key, Slot::Value(value.into()));
        self
    }

    /// Replace the whole data map. Every filter rule is dropped with it, even
    /// for keys present in the new data.
    pub fn replace_data<I, K, V>(&mut self, data: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Datum>,
    {
        self.data = data
            .into_iter()
            .map(|(key, value)| (key.into(), Slot::Value(value.into())))
            .collect();
        self.filters.clear();
        self
    }

    /// Bind shared storage under `key`.
    ///
    /// The envelope's data slot and the caller's `Bound` handle refer to the
    /// same storage: whatever the handle holds at render time is rendered.
    /// Only use this when that sharing is intended.
    pub fn bind(&mut self, key: impl Into<String>, slot: &Bound) -> &mut Self {
        self.data.insert(key.into(), Slot::Bound(slot.clone()));
        self
    }

    /// Raw nested read with dotted paths (`"post.author.name"`).
    ///
    /// A top-level key that literally contains the delimiter is matched first.
    /// Numeric segments index JSON arrays. Filters are not applied and objects
    /// are not traversed.
    pub fn get(&self, path: &str) -> Option<Datum> {
        if let Some(slot) = self.data.get(path) {
            return Some(slot.resolve());
        }

        let mut segments = path.split(PATH_DELIMITER);
        let root = self.data.get(segments.next()?)?.resolve();
        let mut current = root.as_json()?;
        for segment in segments {
            current = match current {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(Datum::Json(current.clone()))
    }

    pub fn get_or(&self, path: &str, default: impl Into<Datum>) -> Datum {
        self.get(path).unwrap_or_else(|| default.into())
    }

    /// Strict read of a top-level key.
    pub fn fetch(&self, key: &str) -> Result<Datum> {
        self.data
            .get(key)
            .map(Slot::resolve)
            .ok_or_else(|| Error::missing_key(key))
    }

    /// Snapshot of the data map with bound slots resolved.
    pub fn data(&self) -> IndexMap<String, Datum> {
        self.data
            .iter()
            .map(|(key, slot)| (key.clone(), slot.resolve()))
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Remove a data key. Its filter rule, if any, stays registered.
    pub fn remove(&mut self, key: &str) -> Option<Datum> {
        self.data.shift_remove(key).map(|slot| slot.resolve())
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    // =========================================================================
    // Filters
    // =========================================================================

    pub fn filter(&self, key: &str) -> Option<&Filter> {
        self.filters.get(key)
    }

    pub fn set_filter(&mut self, key: impl Into<String>, filter: Filter) -> &mut Self {
        let key = key.into();
        tracing::debug!(key = %key, raw = filter.is_raw(), "filter_registered");
        self.filters.insert(key, filter);
        self
    }

    /// Drop a key's rule so the extraction policy applies again.
    pub fn unset_filter(&mut self, key: &str) -> &mut Self {
        self.filters.shift_remove(key);
        self
    }

    pub fn filters(&self) -> &IndexMap<String, Filter> {
        &self.filters
    }

    pub fn set_filters<I, K>(&mut self, filters: I) -> &mut Self
    where
        I: IntoIterator<Item = (K, Filter)>,
        K: Into<String>,
    {
        self.filters = filters
            .into_iter()
            .map(|(key, filter)| (key.into(), filter))
            .collect();
        self
    }

    // =========================================================================
    // Status, code, message
    // =========================================================================

    pub fn code(&self) -> Option<i64> {
        self.code
    }

    pub fn set_code(&mut self, code: impl IntoCode) -> &mut Self {
        self.code = Some(code.into_code());
        self
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// Set the status; an unknown name fails and leaves the status unchanged.
    pub fn set_status(&mut self, status: impl IntoStatus) -> Result<&mut Self> {
        match status.into_status() {
            Ok(status) => {
                self.status = status;
                Ok(self)
            }
            Err(err) => {
                tracing::debug!(current = %self.status, error = %err, "status_rejected");
                Err(err)
            }
        }
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Translate `template` and make this an error response.
    pub fn set_message(&mut self, template: &str, substitutions: &[(&str, &str)]) -> &mut Self {
        self.message = Some(self.translator.translate(template, substitutions));
        self.status = Status::Error;
        self
    }

    /// Describe `err` as `"<TypeName>: <message>"` and make this an error
    /// response. The error's nonzero code is adopted when no code is set yet.
    pub fn set_error<E: ErrorLike + ?Sized>(&mut self, err: &E) -> &mut Self {
        if self.code.is_none() {
            self.code = err.error_code().filter(|code| *code != 0);
        }
        self.message = Some(compose(err));
        self.status = Status::Error;
        self
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    pub fn policy(&self) -> &ExtractionPolicy {
        &self.policy
    }

    pub fn set_policy(&mut self, policy: ExtractionPolicy) -> &mut Self {
        self.policy = policy;
        self
    }

    pub fn encode_options(&self) -> &EncodeOptions {
        &self.encode_options
    }

    /// Render with this envelope's encode options.
    pub fn render(&self) -> Result<String> {
        self.render_with(&self.encode_options)
    }

    /// Render the JSend document.
    ///
    /// An encoding failure does not escape: a fresh error envelope describing
    /// it is rendered instead. Only a failure of that fallback is returned.
    pub fn render_with(&self, options: &EncodeOptions) -> Result<String> {
        match export::to_json(self, options) {
            Ok(json) => Ok(json),
            Err(err) => {
                tracing::warn!(code = ?err.json_code(), detail = %err, "envelope_encode_failed");
                let mut fallback = Envelope::new();
                fallback.set_code(FALLBACK_CODE).set_error(&err);
                let options = EncodeOptions {
                    depth: DEFAULT_DEPTH,
                    ..*options
                };
                export::to_json(&fallback, &options)
            }
        }
    }

    /// Write the rendered body and JSend headers into `sink`.
    pub fn render_into<S: ResponseSink>(&self, sink: &mut S) -> Result<()> {
        self.render_into_with(sink, &self.encode_options)
    }

    pub fn render_into_with<S: ResponseSink>(
        &self,
        sink: &mut S,
        options: &EncodeOptions,
    ) -> Result<()> {
        let body = self.render_with(options)?;
        sink.set_body(body)
            .set_header(CONTENT_TYPE, JSON_MEDIA_TYPE)
            .set_header(FORMAT_HEADER, FORMAT_NAME);
        Ok(())
    }
}

impl Default for Envelope {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Envelope")
            .field("status", &self.status)
            .field("data", &self.data)
            .field("filters", &self.filters)
            .field("code", &self.code)
            .field("message", &self.message)
            .field("policy", &self.policy)
            .field("encode_options", &self.encode_options)
            .finish_non_exhaustive()
    }
}

/// Renders the document; if even the fallback fails, the error text is written.
impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Ok(json) => f.write_str(&json),
            Err(err) => write!(f, "{err}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Map};

    #[derive(Debug)]
    struct Opaque;

    impl Object for Opaque {}

    #[derive(Debug)]
    struct Model;

    impl Object for Model {
        fn as_mapping(&self) -> Option<Map<String, Value>> {
            let mut fields = Map::new();
            fields.insert("id".into(), json!(7));
            Some(fields)
        }
    }

    fn rendered(envelope: &Envelope) -> Value {
        serde_json::from_str(&envelope.render().unwrap()).unwrap()
    }

    // ── 1. defaults ─────────────────────────────────────────────────────

    #[test]
    fn test_new_envelope_defaults() {
        let env = Envelope::new();
        assert_eq!(env.status(), Status::Success);
        assert!(env.is_empty());
        assert!(env.filters().is_empty());
        assert_eq!(env.code(), None);
        assert_eq!(env.message(), None);
        assert_eq!(env.encode_options(), &EncodeOptions::default());
        assert_eq!(env.policy().steps().len(), 4);
    }

    #[test]
    fn test_from_data_keeps_insertion_order() {
        let env = Envelope::from_data([("b", 1i64), ("a", 2i64)]);
        let keys: Vec<_> = env.data().keys().cloned().collect();
        assert_eq!(keys, vec!["b", "a"]);
    }

    // ── 2. status ───────────────────────────────────────────────────────

    #[test]
    fn test_set_status_valid() {
        let mut env = Envelope::new();
        for status in Status::ALL {
            env.set_status(status).unwrap();
            assert_eq!(env.status(), status);
        }
        env.set_status("fail").unwrap();
        assert_eq!(env.status(), Status::Fail);
    }

    #[test]
    fn test_set_status_invalid_leaves_prior() {
        let mut env = Envelope::new();
        env.set_status(Status::Fail).unwrap();

        let err = env.set_status("invalid").unwrap_err();
        assert_eq!(err, Error::invalid_status("invalid"));
        assert_eq!(env.status(), Status::Fail);
    }

    // ── 3. code coercion ────────────────────────────────────────────────

    #[test]
    fn test_code_coercion() {
        let cases: Vec<(Envelope, i64)> = vec![
            (Envelope::new().with_code(500), 500),
            (Envelope::new().with_code("500"), 500),
            (Envelope::new().with_code(false), 0),
            (Envelope::new().with_code(" 42px"), 42),
            (Envelope::new().with_code("-7"), -7),
            (Envelope::new().with_code("abc"), 0),
            (Envelope::new().with_code(u64::MAX), i64::MAX),
        ];
        for (env, expected) in cases {
            assert_eq!(env.code(), Some(expected));
        }
    }

    // ── 4. message ──────────────────────────────────────────────────────

    #[test]
    fn test_message_translates_and_forces_error() {
        let mut env = Envelope::new();
        env.set_message(":foo is bar", &[(":foo", "bar")]);
        assert_eq!(env.message(), Some("bar is bar"));
        assert_eq!(env.code(), None);
        assert_eq!(env.status(), Status::Error);
    }

    #[test]
    fn test_message_from_error_adopts_code() {
        let mut env = Envelope::new();
        env.set_error(&Failure::new("Exception", "Bar is bar").with_code(500));
        assert_eq!(env.message(), Some("Exception: Bar is bar"));
        assert_eq!(env.code(), Some(500));
        assert_eq!(env.status(), Status::Error);
    }

    #[test]
    fn test_message_from_error_keeps_existing_code() {
        let mut env = Envelope::new().with_code(404);
        env.set_error(&Failure::new("Exception", "gone").with_code(500));
        assert_eq!(env.code(), Some(404));
    }

    #[test]
    fn test_message_from_error_ignores_zero_code() {
        let mut env = Envelope::new();
        env.set_error(&Failure::new("Exception", "zero").with_code(0));
        assert_eq!(env.code(), None);
    }

    #[test]
    fn test_message_overrides_any_status() {
        for status in Status::ALL {
            let mut env = Envelope::new().with_status(status);
            env.set_message("whatever", &[]);
            assert_eq!(env.status(), Status::Error);
        }
    }

    #[test]
    fn test_custom_translator() {
        let env = Envelope::new()
            .with_translator(|template: &str, _: &[(&str, &str)]| format!("[{template}]"))
            .with_message("hello");
        assert_eq!(env.message(), Some("[hello]"));
    }

    // ── 5. data access ──────────────────────────────────────────────────

    #[test]
    fn test_get_paths() {
        let env = Envelope::from_data([
            ("foo", json!({"bar": "fubar", "list": [10, 20]})),
            ("a.b", json!("literal")),
        ]);
        assert_eq!(env.get("foo.bar"), Some(Datum::from("fubar")));
        assert_eq!(env.get("foo.list.1"), Some(Datum::from(20i64)));
        assert_eq!(env.get("a.b"), Some(Datum::from("literal")));
        assert_eq!(env.get("foo.bar.baz"), None);
        assert_eq!(env.get("foo.list.x"), None);
        assert_eq!(env.get("missing"), None);
        assert_eq!(env.get_or("missing", "d"), json!("d"));
    }

    #[test]
    fn test_get_does_not_traverse_objects() {
        let env = Envelope::new().with("model", Datum::object(Model));
        assert!(env.get("model").unwrap().is_object());
        assert_eq!(env.get("model.id"), None);
    }

    #[test]
    fn test_fetch_missing_key() {
        let env = Envelope::from_data([("foo", "bar")]);
        assert_eq!(env.fetch("foo").unwrap(), json!("bar"));
        assert_eq!(env.fetch("nope").unwrap_err(), Error::missing_key("nope"));
    }

    #[test]
    fn test_remove_keeps_filter() {
        let mut env = Envelope::new();
        env.set_filtered("k", 1i64, Filter::Raw);
        assert_eq!(env.remove("k"), Some(Datum::from(1i64)));
        assert!(!env.contains("k"));
        assert!(env.filter("k").is_some());
    }

    // ── 6. bind ─────────────────────────────────────────────────────────

    #[test]
    fn test_bind_sees_later_mutation() {
        let counter = Bound::new(1i64);
        let mut env = Envelope::new();
        env.bind("count", &counter);
        assert_eq!(rendered(&env)["data"]["count"], json!(1));

        counter.set(2i64);
        assert_eq!(rendered(&env)["data"]["count"], json!(2));
        assert_eq!(env.get("count"), Some(Datum::from(2i64)));
    }

    #[test]
    fn test_set_replaces_binding() {
        let shared = Bound::new("shared");
        let mut env = Envelope::new();
        env.bind("k", &shared).set("k", "own");
        shared.set("changed");
        assert_eq!(env.get("k"), Some(Datum::from("own")));
    }

    #[test]
    fn test_filter_may_write_its_bound_slot() {
        let slot = Bound::new(1i64);
        let writer = slot.clone();
        let mut env = Envelope::new();
        env.bind("k", &slot).set_filter(
            "k",
            Filter::new(move |datum| {
                writer.set(2i64);
                datum.as_json().cloned().unwrap_or_default()
            }),
        );

        assert_eq!(rendered(&env)["data"]["k"], json!(1));
        assert_eq!(slot.get(), Datum::from(2i64));
        assert_eq!(rendered(&env)["data"]["k"], json!(2));
    }

    #[test]
    fn test_policy_may_write_its_bound_slot() {
        let slot = Bound::new(Datum::object(Model));
        let writer = slot.clone();
        let policy = ExtractionPolicy::empty().with(Capability::custom(move |_| {
            writer.set("replaced");
            Some(json!("extracted"))
        }));
        let mut env = Envelope::new().with_policy(policy);
        env.bind("m", &slot);

        assert_eq!(rendered(&env)["data"]["m"], json!("extracted"));
        assert_eq!(slot.get(), Datum::from("replaced"));
    }

    // ── 7. filters ──────────────────────────────────────────────────────

    #[test]
    fn test_filter_survives_set() {
        let doubler = Filter::new(|datum| {
            json!(datum.as_json().and_then(Value::as_i64).unwrap_or_default() * 2)
        });
        let mut env = Envelope::new();
        env.set_filter("n", doubler.clone());
        env.set("n", 21i64).set("other", "x");
        assert!(env.filter("n").unwrap().same_as(&doubler));
        assert_eq!(rendered(&env)["data"]["n"], json!(42));
    }

    #[test]
    fn test_set_filtered_overwrites_filter() {
        let mut env = Envelope::new();
        env.set_filter("k", Filter::Raw);
        env.set_filtered("k", "v", Filter::new(|_| json!("filtered")));
        assert!(!env.filter("k").unwrap().is_raw());
        assert_eq!(rendered(&env)["data"]["k"], json!("filtered"));
    }

    #[test]
    fn test_unset_filter_restores_policy() {
        let mut env = Envelope::new().with("m", Datum::object(Model));
        env.set_filter("m", Filter::new(|_| json!("custom")));
        assert_eq!(rendered(&env)["data"]["m"], json!("custom"));

        env.unset_filter("m");
        assert!(env.filter("m").is_none());
        assert_eq!(rendered(&env)["data"]["m"], json!({"id": 7}));
    }

    #[test]
    fn test_replace_data_drops_all_filters() {
        let mut env = Envelope::new();
        env.set_filtered("kept", 1i64, Filter::Raw);
        env.set_filtered("gone", 2i64, Filter::Raw);
        env.replace_data([("kept", 3i64)]);
        assert!(env.filters().is_empty());
        assert_eq!(env.data().len(), 1);
    }

    #[test]
    fn test_set_filters_replaces_mapping() {
        let mut env = Envelope::new().with_filter("a", Filter::Raw);
        env.set_filters([("b", Filter::Raw)]);
        assert!(env.filter("a").is_none());
        assert!(env.filter("b").is_some());
    }

    #[test]
    fn test_transform_sees_objects() {
        let env = Envelope::new()
            .with("m", Datum::object(Opaque))
            .with_filter("m", Filter::new(|datum| json!(datum.is_object())));
        assert_eq!(rendered(&env)["data"]["m"], json!(true));
    }

    // ── 8. rendering ────────────────────────────────────────────────────

    #[test]
    fn test_render_success() {
        let env = Envelope::from_data([("foo", "bar")]);
        assert_eq!(env.render().unwrap(), r#"{"status":"success","data":{"foo":"bar"}}"#);
        assert_eq!(env.to_string(), env.render().unwrap());
    }

    #[test]
    fn test_render_empty_success_keeps_data() {
        assert_eq!(
            Envelope::new().render().unwrap(),
            r#"{"status":"success","data":{}}"#
        );
        assert_eq!(
            Envelope::fail(Vec::<(String, Value)>::new()).render().unwrap(),
            r#"{"status":"fail","data":{}}"#
        );
    }

    #[test]
    fn test_render_error_without_data() {
        let env = Envelope::error("boom").with_code(503);
        assert_eq!(
            env.render().unwrap(),
            r#"{"status":"error","message":"boom","code":503}"#
        );
    }

    #[test]
    fn test_render_error_with_data_and_no_code() {
        let env = Envelope::from_data([("field", "name")]).with_message("invalid");
        assert_eq!(
            env.render().unwrap(),
            r#"{"status":"error","data":{"field":"name"},"message":"invalid"}"#
        );
    }

    #[test]
    fn test_render_error_status_without_message() {
        let env = Envelope::new().with_status(Status::Error);
        assert_eq!(env.render().unwrap(), r#"{"status":"error","message":null}"#);
    }

    #[test]
    fn test_render_is_repeatable() {
        let env = Envelope::from_data([("m", Datum::object(Model))]);
        assert_eq!(env.render().unwrap(), env.render().unwrap());
    }

    #[test]
    fn test_raw_filter_on_object_falls_back_to_error_document() {
        let env = Envelope::new()
            .with("m", Datum::object(Model))
            .with_filter("m", Filter::Raw);
        assert_eq!(
            rendered(&env),
            json!({
                "status": "error",
                "message": "EncodingError: Type is not supported",
                "code": 500
            })
        );
        // the rendered envelope itself is untouched
        assert_eq!(env.status(), Status::Success);
    }

    #[tracing_test::traced_test]
    #[test]
    fn test_fallback_is_logged() {
        let env = Envelope::new().with("o", Datum::object(Opaque));
        let doc = rendered(&env);
        assert_eq!(doc["status"], json!("error"));
        assert!(logs_contain("envelope_encode_failed"));
        assert!(logs_contain("Type is not supported"));
    }

    #[test]
    fn test_raw_filter_on_json_passes_through() {
        let env = Envelope::new()
            .with("v", json!([1, 2]))
            .with_filter("v", Filter::Raw);
        assert_eq!(rendered(&env)["data"]["v"], json!([1, 2]));
    }

    #[test]
    fn test_depth_failure_renders_error_document() {
        let env = Envelope::from_data([("deep", json!([[[1]]]))]).with_encode_options(
            EncodeOptions {
                depth: 3,
                ..EncodeOptions::default()
            },
        );
        assert_eq!(
            rendered(&env),
            json!({
                "status": "error",
                "message": "EncodingError: Maximum stack depth exceeded",
                "code": 500
            })
        );
    }

    #[test]
    fn test_pretty_render() {
        let env = Envelope::from_data([("a", 1i64)]).with_encode_options(EncodeOptions {
            pretty: true,
            ..EncodeOptions::default()
        });
        assert!(env.render().unwrap().contains("\n  \"status\": \"success\""));
    }

    #[test]
    fn test_render_into_sets_headers() {
        let mut response = Response::new();
        let env = Envelope::from_data([("foo", "bar")]);
        env.render_into(&mut response).unwrap();

        let decoded: Value = serde_json::from_str(response.body()).unwrap();
        assert_eq!(decoded["data"], json!({"foo": "bar"}));
        assert_eq!(response.header("content-type"), Some("application/json"));
        assert_eq!(response.header("x-response-format"), Some("jsend"));
    }

    #[test]
    fn test_with_config_applies_codec_options() {
        let mut config = Config::default();
        config.codec.pretty = true;
        let env = Envelope::new().with_config(&config);
        assert!(env.encode_options().pretty);
    }
}

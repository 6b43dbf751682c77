//! JSON codec with typed failure reporting.
//!
//! Wraps `serde_json` so that every encode/decode failure surfaces as an
//! [`Error::Encoding`] / [`Error::Decoding`] carrying a numeric reason code and
//! a stable reason string:
//! ```text
//! code │ class            │ detail
//! ─────┼──────────────────┼──────────────────────────────────────────
//!   1  │ depth            │ Maximum stack depth exceeded
//!   2  │ state mismatch   │ Underflow or the modes mismatch
//!   3  │ control char     │ Unexpected control character found
//!   4  │ syntax           │ Syntax error, malformed JSON
//!   5  │ utf-8            │ Malformed UTF-8 characters, possibly incorrectly encoded
//!   8  │ unsupported type │ Type is not supported
//! ```

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::error::Category;
use serde_json::Value;
use std::borrow::Cow;

use crate::types::{Error, Result};

/// Default nesting limit for both directions.
pub const DEFAULT_DEPTH: usize = 512;

/// Reason code meaning "no error".
pub const JSON_ERROR_NONE: i32 = 0;

/// Prefix used by serializers that meet a value with no JSON form.
pub(crate) const UNSUPPORTED_TYPE_PREFIX: &str = "unsupported type";

/// Failure classes reported by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonErrorKind {
    Depth,
    StateMismatch,
    CtrlChar,
    Syntax,
    Utf8,
    UnsupportedType,
}

impl JsonErrorKind {
    pub const ALL: [JsonErrorKind; 6] = [
        JsonErrorKind::Depth,
        JsonErrorKind::StateMismatch,
        JsonErrorKind::CtrlChar,
        JsonErrorKind::Syntax,
        JsonErrorKind::Utf8,
        JsonErrorKind::UnsupportedType,
    ];

    pub fn code(self) -> i32 {
        match self {
            JsonErrorKind::Depth => 1,
            JsonErrorKind::StateMismatch => 2,
            JsonErrorKind::CtrlChar => 3,
            JsonErrorKind::Syntax => 4,
            JsonErrorKind::Utf8 => 5,
            JsonErrorKind::UnsupportedType => 8,
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.code() == code)
    }

    pub fn message(self) -> &'static str {
        match self {
            JsonErrorKind::Depth => "Maximum stack depth exceeded",
            JsonErrorKind::StateMismatch => "Underflow or the modes mismatch",
            JsonErrorKind::CtrlChar => "Unexpected control character found",
            JsonErrorKind::Syntax => "Syntax error, malformed JSON",
            JsonErrorKind::Utf8 => "Malformed UTF-8 characters, possibly incorrectly encoded",
            JsonErrorKind::UnsupportedType => "Type is not supported",
        }
    }
}

/// Human-readable reason for a raw code, `None` when the code means success.
pub fn reason(code: i32) -> Option<Cow<'static, str>> {
    if code == JSON_ERROR_NONE {
        return None;
    }
    Some(match JsonErrorKind::from_code(code) {
        Some(kind) => Cow::Borrowed(kind.message()),
        None => Cow::Owned(format!("Unknown JSON error code: {code}")),
    })
}

/// Map a `serde_json` failure onto the reason table.
pub fn classify(err: &serde_json::Error) -> JsonErrorKind {
    let text = err.to_string();
    if text.starts_with("recursion limit exceeded") {
        return JsonErrorKind::Depth;
    }
    if text.contains("control character") {
        return JsonErrorKind::CtrlChar;
    }
    if text.contains("unicode code point") || text.contains("surrogate") {
        return JsonErrorKind::Utf8;
    }
    // Serializer-side failures carry no position; the parser reports the same
    // "key must be a string" wording for unquoted keys, with a line number.
    let serializing = err.line() == 0;
    if text.starts_with(UNSUPPORTED_TYPE_PREFIX)
        || (serializing && text.starts_with("key must be"))
    {
        return JsonErrorKind::UnsupportedType;
    }
    match err.classify() {
        Category::Data => JsonErrorKind::StateMismatch,
        Category::Syntax | Category::Eof | Category::Io => JsonErrorKind::Syntax,
    }
}

/// Encoder settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncodeOptions {
    /// Maximum container nesting.
    pub depth: usize,

    /// Emit indented output.
    pub pretty: bool,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
            pretty: false,
        }
    }
}

/// Decoder settings. Documents always decode to structured maps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Maximum container nesting.
    pub depth: usize,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            depth: DEFAULT_DEPTH,
        }
    }
}

/// Encode any serializable value to a JSON string.
pub fn encode<T: Serialize + ?Sized>(value: &T, options: &EncodeOptions) -> Result<String> {
    let tree = serde_json::to_value(value).map_err(|e| Error::encoding(classify(&e)))?;
    if depth_of(&tree) > options.depth {
        return Err(Error::encoding(JsonErrorKind::Depth));
    }

    let encoded = if options.pretty {
        serde_json::to_string_pretty(&tree)
    } else {
        serde_json::to_string(&tree)
    };
    encoded.map_err(|e| Error::encoding(classify(&e)))
}

/// Decode a JSON document into a structured value.
///
/// `options.depth` is the only nesting limit: input past it is rejected
/// before parsing, and the parser's own recursion guard is switched off.
pub fn decode(json: &str, options: &DecodeOptions) -> Result<Value> {
    if nesting_exceeds(json.as_bytes(), options.depth) {
        return Err(Error::decoding(JsonErrorKind::Depth));
    }

    let mut deserializer = serde_json::Deserializer::from_str(json);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(&mut deserializer).map_err(|e| Error::decoding(classify(&e)))?;
    deserializer
        .end()
        .map_err(|e| Error::decoding(classify(&e)))?;
    Ok(value)
}

/// Decode raw bytes, rejecting invalid UTF-8 before parsing.
pub fn decode_slice(bytes: &[u8], options: &DecodeOptions) -> Result<Value> {
    let json = std::str::from_utf8(bytes).map_err(|_| Error::decoding(JsonErrorKind::Utf8))?;
    decode(json, options)
}

/// Decode into a typed structure. A well-formed document of the wrong shape
/// is reported as a state mismatch.
pub fn decode_as<T: DeserializeOwned>(json: &str, options: &DecodeOptions) -> Result<T> {
    let value = decode(json, options)?;
    serde_json::from_value(value).map_err(|_| Error::decoding(JsonErrorKind::StateMismatch))
}

/// Whether bracket nesting in raw JSON text goes past `limit`. Brackets
/// inside string literals are skipped.
fn nesting_exceeds(json: &[u8], limit: usize) -> bool {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for &byte in json {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'[' | b'{' => {
                depth += 1;
                if depth > limit {
                    return true;
                }
            }
            b']' | b'}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    false
}

/// Container nesting depth; scalars are 0, `[1]` is 1.
pub fn depth_of(value: &Value) -> usize {
    let mut deepest = 0;
    let mut pending = vec![(value, 0usize)];
    while let Some((current, depth)) = pending.pop() {
        match current {
            Value::Array(items) => {
                let depth = depth + 1;
                deepest = deepest.max(depth);
                pending.extend(items.iter().map(|item| (item, depth)));
            }
            Value::Object(map) => {
                let depth = depth + 1;
                deepest = deepest.max(depth);
                pending.extend(map.values().map(|item| (item, depth)));
            }
            _ => {}
        }
    }
    deepest
}

//! Envelope export to JSON.
//!
//! Builds the JSend document from an envelope and encodes it. Field order and
//! presence:
//! ```text
//! success / fail : status, data
//! error          : status, [data if non-empty], message, [code if set]
//! ```

use indexmap::IndexMap;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use super::{Envelope, Rendered, Status};
use crate::codec::{self, EncodeOptions};
use crate::types::Result;

/// Render-ready JSend document.
#[derive(Debug)]
pub(crate) struct Document<'a> {
    status: Status,
    data: IndexMap<String, Rendered>,
    message: Option<&'a str>,
    code: Option<i64>,
}

impl<'a> Document<'a> {
    pub(crate) fn from_envelope(envelope: &'a Envelope) -> Self {
        Self {
            status: envelope.status,
            data: filtered_data(envelope),
            message: envelope.message.as_deref(),
            code: envelope.code,
        }
    }
}

impl Serialize for Document<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let error = self.status.is_error();
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("status", &self.status)?;
        if !(error && self.data.is_empty()) {
            map.serialize_entry("data", &self.data)?;
        }
        if error {
            map.serialize_entry("message", &self.message)?;
            if let Some(code) = self.code {
                map.serialize_entry("code", &code)?;
            }
        }
        map.end()
    }
}

/// Resolve every data value through its filter rule or the extraction policy.
fn filtered_data(envelope: &Envelope) -> IndexMap<String, Rendered> {
    envelope
        .data
        .iter()
        .map(|(key, slot)| {
            let datum = slot.resolve();
            let rendered = match envelope.filters.get(key) {
                Some(filter) => filter
                    .apply(&datum)
                    .map_or_else(|| Rendered::raw(&datum), Rendered::Json),
                None => envelope.policy.resolve(&datum),
            };
            (key.clone(), rendered)
        })
        .collect()
}

/// Encode an envelope as-is; failures are returned, not converted.
pub fn to_json(envelope: &Envelope, options: &EncodeOptions) -> Result<String> {
    codec::encode(&Document::from_envelope(envelope), options)
}

//! HTTP response sink.

use indexmap::IndexMap;

/// Header carrying the body media type.
pub const CONTENT_TYPE: &str = "content-type";

/// Media type of every rendered envelope.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Custom header for format recognition.
pub const FORMAT_HEADER: &str = "x-response-format";

pub const FORMAT_NAME: &str = "jsend";

/// Destination for a rendered envelope. The body is taken as a finished
/// string; later envelope changes are not reflected.
pub trait ResponseSink {
    fn set_body(&mut self, body: String) -> &mut Self;

    fn set_header(&mut self, name: &str, value: &str) -> &mut Self;
}

/// In-memory response with case-insensitive headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Response {
    body: String,
    headers: IndexMap<String, String>,
}

impl Response {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn headers(&self) -> &IndexMap<String, String> {
        &self.headers
    }
}

impl ResponseSink for Response {
    fn set_body(&mut self, body: String) -> &mut Self {
        self.body = body;
        self
    }

    fn set_header(&mut self, name: &str, value: &str) -> &mut Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }
}

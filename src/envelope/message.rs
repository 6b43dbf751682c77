//! Message composition: translation of templates and error-like values.

use std::fmt;

use super::datum::short_type_name;
use crate::codec;

/// Localization hook for message templates.
pub trait Translate {
    fn translate(&self, template: &str, substitutions: &[(&str, &str)]) -> String;
}

impl<F> Translate for F
where
    F: Fn(&str, &[(&str, &str)]) -> String,
{
    fn translate(&self, template: &str, substitutions: &[(&str, &str)]) -> String {
        self(template, substitutions)
    }
}

/// Translator that only substitutes placeholders.
#[derive(Debug, Clone, Copy, Default)]
pub struct Interpolate;

impl Translate for Interpolate {
    fn translate(&self, template: &str, substitutions: &[(&str, &str)]) -> String {
        interpolate(template, substitutions)
    }
}

/// Replace placeholders in one left-to-right pass.
///
/// At each position the longest matching key wins and replaced text is never
/// scanned again, so `[(":a", ":b"), (":b", "x")]` turns `":a"` into `":b"`.
pub fn interpolate(template: &str, substitutions: &[(&str, &str)]) -> String {
    let mut keys: Vec<(&str, &str)> = substitutions
        .iter()
        .copied()
        .filter(|(key, _)| !key.is_empty())
        .collect();
    if keys.is_empty() {
        return template.to_string();
    }
    keys.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    'scan: while !rest.is_empty() {
        for &(key, value) in &keys {
            if let Some(tail) = rest.strip_prefix(key) {
                out.push_str(value);
                rest = tail;
                continue 'scan;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            out.push(c);
        }
        rest = chars.as_str();
    }
    out
}

/// An error value that can become an envelope message.
///
/// The message reads `"<type_name>: <Display>"`; a nonzero `error_code` is
/// adopted as the envelope code when none was set.
pub trait ErrorLike: fmt::Display {
    fn type_name(&self) -> &str {
        short_type_name(std::any::type_name::<Self>())
    }

    fn error_code(&self) -> Option<i64> {
        None
    }
}

impl ErrorLike for std::io::Error {
    fn error_code(&self) -> Option<i64> {
        self.raw_os_error().map(i64::from)
    }
}

impl ErrorLike for serde_json::Error {
    fn type_name(&self) -> &str {
        "JsonError"
    }

    fn error_code(&self) -> Option<i64> {
        Some(i64::from(codec::classify(self).code()))
    }
}

impl ErrorLike for std::num::ParseIntError {}

impl ErrorLike for std::fmt::Error {}

/// Ad-hoc error with an explicit type name and optional code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    kind: String,
    message: String,
    code: Option<i64>,
}

impl Failure {
    pub fn new(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            message: message.into(),
            code: None,
        }
    }

    pub fn with_code(mut self, code: i64) -> Self {
        self.code = Some(code);
        self
    }

    /// Capture any standard error under its short type name.
    pub fn from_error<E: std::error::Error + ?Sized>(err: &E) -> Self {
        Self::new(short_type_name(std::any::type_name::<E>()), err.to_string())
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

impl ErrorLike for Failure {
    fn type_name(&self) -> &str {
        &self.kind
    }

    fn error_code(&self) -> Option<i64> {
        self.code
    }
}

/// `"<type_name>: <message>"`.
pub(crate) fn compose<E: ErrorLike + ?Sized>(err: &E) -> String {
    format!("{}: {}", err.type_name(), err)
}

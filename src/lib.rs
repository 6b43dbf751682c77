//! # JSend - response envelopes for JSON APIs
//!
//! Builds success/fail/error documents following the JSend convention:
//! - Envelope builder with a strict status state machine
//! - Render-time filters per data key
//! - Pluggable extraction of JSON from opaque objects
//! - JSON codec that reports failures as typed errors
//!
//! ## Architecture
//!
//! ```text
//!   caller ──set/bind/filter──▶ Envelope ──render──▶ Document ──encode──▶ JSON
//!                                  │                    ▲          │
//!                                  │   ExtractionPolicy ┘          │ failure
//!                                  │                               ▼
//!                                  └────────── fallback error Envelope
//! ```
//!
//! Envelopes are single-threaded: bound slots share `Rc<RefCell<_>>` storage
//! with the caller, so an `Envelope` is neither `Send` nor `Sync`.

// Enforce strict safety at compile time
#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]
#![warn(rust_2018_idioms)]

pub mod codec;
pub mod envelope;
pub mod types;

// Internal utilities
pub mod observability;

pub use codec::{DecodeOptions, EncodeOptions, JsonErrorKind};
pub use envelope::{
    Bound, Capability, Datum, Envelope, ErrorLike, ExtractionPolicy, Failure, Filter, IntoCode,
    IntoStatus, Object, Response, ResponseSink, Status, Translate,
};
pub use types::{Config, Error, Result};

//! Core enumerations for envelopes.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::types::{Error, Result};

/// JSend response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    /// Execution errors: exceptions, encoder failures.
    Error,
    /// Application-level rejection such as failed validation.
    Fail,
    /// Everything went fine.
    #[default]
    Success,
}

impl Status {
    pub const ALL: [Status; 3] = [Status::Error, Status::Fail, Status::Success];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Error => "error",
            Status::Fail => "fail",
            Status::Success => "success",
        }
    }

    pub fn is_error(self) -> bool {
        matches!(self, Status::Error)
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-sensitive: only the exact lowercase names are accepted.
impl FromStr for Status {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Status::ALL
            .into_iter()
            .find(|status| status.as_str() == s)
            .ok_or_else(|| Error::invalid_status(s))
    }
}

/// Anything the status setter accepts.
pub trait IntoStatus {
    fn into_status(self) -> Result<Status>;
}

impl IntoStatus for Status {
    fn into_status(self) -> Result<Status> {
        Ok(self)
    }
}

impl IntoStatus for &str {
    fn into_status(self) -> Result<Status> {
        self.parse()
    }
}

impl IntoStatus for String {
    fn into_status(self) -> Result<Status> {
        self.parse()
    }
}

impl IntoStatus for &String {
    fn into_status(self) -> Result<Status> {
        self.parse()
    }
}

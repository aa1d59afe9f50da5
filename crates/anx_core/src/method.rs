//! HTTP methods and the rate limit class they belong to.

use serde::{Deserialize, Serialize};

/// HTTP method of a request.
///
/// # Examples
///
/// ```
/// use anx_core::{Method, RateClass};
///
/// let method: Method = "post".parse().unwrap();
/// assert_eq!(method, Method::Post);
/// assert_eq!(method.to_string(), "POST");
/// assert_eq!(method.rate_class(), RateClass::Write);
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Method {
    /// GET
    #[default]
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
    /// HEAD
    Head,
    /// OPTIONS
    Options,
}

impl Method {
    /// Rate limit class this method is admitted under.
    ///
    /// Only `GET` counts against the read budget; everything else is a write.
    pub fn rate_class(self) -> RateClass {
        match self {
            Method::Get => RateClass::Read,
            _ => RateClass::Write,
        }
    }

    /// True for methods that send a body by default.
    pub fn has_body(self) -> bool {
        matches!(self, Method::Post | Method::Put)
    }
}

/// Independent admission budget a request is counted against.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumIter,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RateClass {
    /// Read-class traffic (`GET`)
    Read,
    /// Write-class traffic (every other method)
    Write,
}

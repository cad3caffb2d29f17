//! Field validators

use crate::error::{ComposeError, Result};
use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;

/// Longest value a string field may hold
pub const MAX_FIELD_LENGTH: usize = 255;

/// Subnets and IP ranges such as `10.226.126.0/24` or `192.168.127.12/27`
pub static IP_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3}\.\d{1,3}\.\d{1,3}\.\d{1,3}|10\.\d{1,3}\.\d{1,3}\.\d{1,2})/\d{2}$")
        .expect("IP range pattern is valid")
});

/// One or more digits and nothing else
pub static INTEGER_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d+$").expect("integer pattern is valid"));

/// Three octal digits
pub static OCTAL_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-7]{3}$").expect("octal pattern is valid"));

/// Field-level validation for a record
pub trait Validate {
    /// Check every field, failing on the first invalid one
    fn validate(&self) -> Result<()>;
}

impl<T: Validate> Validate for [T] {
    fn validate(&self) -> Result<()> {
        self.iter().try_for_each(Validate::validate)
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<()> {
        match self {
            Some(inner) => inner.validate(),
            None => Ok(()),
        }
    }
}

/// Require a non-empty value
pub fn required(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(ComposeError::validation(field, "This field cannot be blank"));
    }
    Ok(())
}

/// Limit the number of characters in a value
pub fn max_length(field: &str, value: &str, max: usize) -> Result<()> {
    let length = value.chars().count();
    if length > max {
        return Err(ComposeError::validation(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {})",
                max, length
            ),
        ));
    }
    Ok(())
}

/// Apply the default length limit to an optional value
pub fn optional_length(field: &str, value: Option<&str>) -> Result<()> {
    match value {
        Some(v) => max_length(field, v, MAX_FIELD_LENGTH),
        None => Ok(()),
    }
}

/// Require a value to match a pattern
pub fn matches(field: &str, value: &str, pattern: &Regex, message: &str) -> Result<()> {
    if !pattern.is_match(value) {
        return Err(ComposeError::validation(field, message));
    }
    Ok(())
}

/// Require a value to be an IPv4 or IPv6 address
pub fn ip_address(field: &str, value: &str) -> Result<()> {
    value
        .parse::<IpAddr>()
        .map(|_| ())
        .map_err(|_| ComposeError::validation(field, "Enter a valid IPv4 or IPv6 address"))
}

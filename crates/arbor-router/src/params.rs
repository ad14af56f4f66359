//! Captured path parameters.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A single captured parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Param<'k, 'v> {
    pub key: &'k str,
    pub value: &'v str,
}

/// Parameters captured by a lookup, in the order they are declared in the
/// matched pattern.
///
/// Keys borrow from the tree and values from the request path, so a match
/// copies nothing. The buffer is meant to be owned by the caller and reused:
/// every lookup clears it first and keeps its capacity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params<'k, 'v> {
    items: Vec<Param<'k, 'v>>,
}

impl<'k, 'v> Params<'k, 'v> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a buffer that holds `capacity` parameters without reallocating.
    /// [`Router::max_params`](crate::Router::max_params) gives the bound.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    /// Value of the first parameter named `key`.
    pub fn get(&self, key: &str) -> Option<&'v str> {
        self.items
            .iter()
            .find(|param| param.key == key)
            .map(|param| param.value)
    }

    pub fn iter(&self) -> impl Iterator<Item = Param<'k, 'v>> + '_ {
        self.items.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.items.capacity()
    }

    /// Drop all captures, keeping the allocation.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn to_owned_params(&self) -> OwnedParams {
        OwnedParams(
            self.items
                .iter()
                .map(|param| (param.key.to_string(), param.value.to_string()))
                .collect(),
        )
    }

    pub(crate) fn push(&mut self, key: &'k str, value: &'v str) {
        self.items.push(Param { key, value });
    }
}

impl fmt::Display for Params<'_, '_> {
    /// Formats as `key1=value1,key2=value2`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pairs(f, self.items.iter().map(|param| (param.key, param.value)))
    }
}

/// Owned copy of captured parameters, detached from the tree and the request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OwnedParams(Vec<(String, String)>);

impl OwnedParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Params<'_, '_>> for OwnedParams {
    fn from(params: Params<'_, '_>) -> Self {
        params.to_owned_params()
    }
}

impl fmt::Display for OwnedParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pairs(f, self.iter())
    }
}

/// Error parsing the `key1=value1,key2=value2` form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamsParseError {
    #[error("parameter `{0}` is missing `=`")]
    MissingEquals(String),
}

impl FromStr for OwnedParams {
    type Err = ParamsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default());
        }

        s.split(',')
            .map(|pair| {
                pair.split_once('=')
                    .map(|(k, v)| (k.to_string(), v.to_string()))
                    .ok_or_else(|| ParamsParseError::MissingEquals(pair.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }
}

fn write_pairs<'a>(
    f: &mut fmt::Formatter<'_>,
    pairs: impl Iterator<Item = (&'a str, &'a str)>,
) -> fmt::Result {
    for (i, (key, value)) in pairs.enumerate() {
        if i > 0 {
            f.write_str(",")?;
        }
        write!(f, "{}={}", key, value)?;
    }
    Ok(())
}

//! Provenance of a store answer.

use serde::Serialize;

/// Which backing store produced a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    Supabase,
    Local,
    /// Nothing stored yet; the record is the built-in default.
    SeedDefault,
}

impl Source {
    /// Wire value of the `_source` field. The seed default carries none, so
    /// callers treat an untagged record as non-authoritative.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            Source::Supabase => Some("supabase"),
            Source::Local => Some("local"),
            Source::SeedDefault => None,
        }
    }
}

/// A value together with the store that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: Source,
}

impl<T> Resolved<T> {
    pub fn new(value: T, source: Source) -> Self {
        Self { value, source }
    }
}

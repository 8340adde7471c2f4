//! Composite import keys.
//!
//! Some objects can only be located with several identifiers, e.g. a
//! connector needs its environment, cluster and name. Import ids for such
//! kinds join those parts with `/`.

use crate::error::ProviderError;

/// Separator between import key parts.
pub const SEPARATOR: char = '/';

/// The ordered field names an import key must contain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportKeyShape {
    kind: &'static str,
    fields: &'static [&'static str],
}

impl ImportKeyShape {
    /// Define a shape for `kind` with the given positional fields.
    pub const fn new(kind: &'static str, fields: &'static [&'static str]) -> Self {
        Self { kind, fields }
    }

    /// Human-readable shape, e.g. `<environment_id>/<cluster_id>/<name>`.
    pub fn expected(&self) -> String {
        self.fields
            .iter()
            .map(|f| format!("<{}>", f))
            .collect::<Vec<_>>()
            .join(&SEPARATOR.to_string())
    }

    /// Split `key` into exactly as many non-empty parts as the shape has fields.
    pub fn parse<'a>(&self, key: &'a str) -> Result<ImportKey<'a>, ProviderError> {
        let parts: Vec<&'a str> = key.split(SEPARATOR).collect();
        if parts.len() != self.fields.len() || parts.iter().any(|p| p.is_empty()) {
            return Err(ProviderError::ImportFormat(format!(
                "invalid format for {} import '{}': expected '{}'",
                self.kind,
                key,
                self.expected()
            )));
        }
        Ok(ImportKey {
            fields: self.fields,
            parts,
        })
    }
}

/// A parsed import key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportKey<'a> {
    fields: &'static [&'static str],
    parts: Vec<&'a str>,
}

impl<'a> ImportKey<'a> {
    /// `(field, value)` pairs in positional order.
    pub fn fields(&self) -> impl Iterator<Item = (&'static str, &'a str)> + '_ {
        self.fields.iter().copied().zip(self.parts.iter().copied())
    }

    /// Value of a named field.
    pub fn get(&self, field: &str) -> Option<&'a str> {
        self.fields().find(|(f, _)| *f == field).map(|(_, v)| v)
    }

    /// The last part, which becomes the object's identifier.
    pub fn last(&self) -> &'a str {
        self.parts.last().copied().unwrap_or_default()
    }
}

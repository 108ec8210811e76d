//! Field-level cleanup applied to every record before it is written

use crate::text::strip_diacritics;

/// The two bracket-like markers the upstream export leaves in fields
pub const BRACKET_MARKERS: [char; 2] = ['<', '>'];

/// Removes forbidden characters and diacritics from record fields.
///
/// Forbidden characters are the destination delimiter and the two
/// [`BRACKET_MARKERS`]. They are stripped before diacritic removal, and once
/// more afterwards: canonical decomposition turns U+037E into `;` and
/// U+226E/U+226F into `<`/`>` followed by a combining mark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCleaner {
    forbidden: [char; 3],
}

impl RowCleaner {
    /// Create a cleaner for output written with `destination_delimiter`
    pub fn new(destination_delimiter: char) -> Self {
        Self {
            forbidden: [destination_delimiter, BRACKET_MARKERS[0], BRACKET_MARKERS[1]],
        }
    }

    /// Characters removed from every field
    pub fn forbidden(&self) -> &[char] {
        &self.forbidden
    }

    /// Clean a single field
    pub fn clean_field(&self, field: &str) -> String {
        let stripped = self.strip(field);
        let normalized = strip_diacritics(&stripped);
        if normalized.contains(self.forbidden.as_slice()) {
            self.strip(&normalized)
        } else {
            normalized
        }
    }

    /// Clean every field of a record, keeping field order and count
    pub fn clean_record<'a, I>(&self, fields: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a str>,
    {
        fields.into_iter().map(|field| self.clean_field(field)).collect()
    }

    fn strip(&self, field: &str) -> String {
        field.chars().filter(|c| !self.forbidden.contains(c)).collect()
    }
}

impl Default for RowCleaner {
    fn default() -> Self {
        Self::new(';')
    }
}

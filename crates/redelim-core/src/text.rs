//! Diacritic removal

use unicode_general_category::{get_general_category, GeneralCategory};
use unicode_normalization::UnicodeNormalization;

/// Remove combining diacritical marks from `input`.
///
/// The string is put into canonical decomposition (NFD) and every
/// Nonspacing_Mark (Mn) is dropped, so "José" becomes "Jose" and "Ñandú"
/// becomes "Nandu". Characters without a decomposition pass through unchanged.
///
/// ```
/// use redelim_core::text::strip_diacritics;
///
/// assert_eq!(strip_diacritics("Crème brûlée"), "Creme brulee");
/// ```
pub fn strip_diacritics(input: &str) -> String {
    if input.is_ascii() {
        return input.to_string();
    }

    // Dropping a mark with combining class 0 can leave two reorderable marks
    // adjacent; the second NFD pass restores canonical order so the result is
    // a fixed point.
    input
        .nfd()
        .filter(|c| !is_nonspacing_mark(*c))
        .nfd()
        .collect()
}

fn is_nonspacing_mark(c: char) -> bool {
    get_general_category(c) == GeneralCategory::NonspacingMark
}

//! Locale comparison rules.
//!
//! Locale codes (e.g. `es-mx`) and node type aliases are compared
//! case-insensitively without regard to any particular culture: both sides
//! are folded with Unicode lowercase mapping and compared char by char.

/// Case-insensitive, culture-invariant string equality.
pub fn invariant_eq(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// True when the value is empty or whitespace only.
pub fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

/// Returns the value only when it is present and not blank.
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !is_blank(v))
}

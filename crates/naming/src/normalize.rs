/// Trims a name and collapses every internal run of whitespace into a
/// single space.
pub fn normalize(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Key used for case-insensitive comparisons.
pub(crate) fn fold(name: &str) -> String {
    normalize(name).to_lowercase()
}

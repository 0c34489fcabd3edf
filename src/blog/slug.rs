//! URL slug derivation.

/// Derive a URL-safe slug from a title.
///
/// Lowercases, maps runs of non-alphanumeric characters to single hyphens,
/// and trims leading/trailing hyphens. Deterministic: the same title always
/// yields the same slug.
#[must_use]
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut last_was_hyphen = true; // suppress leading hyphen

    for c in title.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_was_hyphen = false;
        } else if !last_was_hyphen {
            slug.push('-');
            last_was_hyphen = true;
        }
    }

    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

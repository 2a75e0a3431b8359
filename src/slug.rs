//! Turns post titles into URL-safe identifiers.

use deunicode::deunicode;

/// Converts a title into a slug suitable for a URL path segment. Accented
/// characters are folded to ASCII, the result is lowercased, and every
/// maximal run of non-alphanumeric characters becomes a single `-`. The
/// output always matches `[a-z0-9-]+` with no doubled dashes.
///
/// A title with no alphanumeric characters at all slugs to a bare `"-"`.
/// That's almost certainly not a useful slug, but it's the established
/// behavior for such titles and downstream URLs depend on slugs being
/// non-empty, so it is kept.
pub fn slugify(title: &str) -> String {
    let mut slug = String::with_capacity(title.len());
    let mut prev_dash = true; // suppress a leading dash
    for c in deunicode(title).chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            prev_dash = false;
        } else if !prev_dash {
            slug.push('-');
            prev_dash = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push('-');
    }
    slug
}

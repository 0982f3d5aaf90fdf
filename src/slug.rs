//! Slug derivation for categories and posts.
//!
//! A slug is a pure function of the source name: lowercase it, fold accented
//! latin letters to their ASCII base, turn every other non-alphanumeric run
//! into a single hyphen, and trim hyphens from both ends. Running the result
//! through again yields the same string.

/// Folds the accented latin characters that show up in editorial names
/// (Portuguese and Spanish content in practice) to their ASCII base letter.
fn fold_accent(c: char) -> Option<char> {
    let folded = match c {
        'á' | 'à' | 'â' | 'ã' | 'ä' | 'å' => 'a',
        'é' | 'è' | 'ê' | 'ë' => 'e',
        'í' | 'ì' | 'î' | 'ï' => 'i',
        'ó' | 'ò' | 'ô' | 'õ' | 'ö' => 'o',
        'ú' | 'ù' | 'û' | 'ü' => 'u',
        'ç' => 'c',
        'ñ' => 'n',
        'ý' | 'ÿ' => 'y',
        _ => return None,
    };
    Some(folded)
}

/// Derives a URL slug from a display name.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_hyphen = false;

    for c in name.chars().flat_map(char::to_lowercase) {
        let c = fold_accent(c).unwrap_or(c);

        if c.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(c);
        } else {
            // Whitespace, hyphens, punctuation and anything non-ASCII all
            // collapse into a single separator.
            pending_hyphen = true;
        }
    }

    slug
}

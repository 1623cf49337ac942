//! String helpers shared by indexing and querying.

/// Turn a label into a lowercase, dash separated, ASCII slug.
///
/// Tags are indexed and queried in this form, so both sides must use the same function.
///
/// # Example
///
/// ```
/// use asset_search_shared::urlize;
///
/// assert_eq!(urlize("Über uns & Team"), "ueber-uns-team");
/// ```
pub fn urlize(label: &str) -> String {
    let mut slug = String::with_capacity(label.len());
    let mut pending_dash = false;

    for c in label.chars().flat_map(char::to_lowercase) {
        let replacement: Option<&str> = match c {
            'ä' | 'æ' => Some("ae"),
            'ö' | 'ø' | 'œ' => Some("oe"),
            'ü' => Some("ue"),
            'ß' => Some("ss"),
            'à' | 'á' | 'â' | 'ã' | 'å' => Some("a"),
            'ç' => Some("c"),
            'è' | 'é' | 'ê' | 'ë' => Some("e"),
            'ì' | 'í' | 'î' | 'ï' => Some("i"),
            'ñ' => Some("n"),
            'ò' | 'ó' | 'ô' | 'õ' => Some("o"),
            'ù' | 'ú' | 'û' => Some("u"),
            'ý' | 'ÿ' => Some("y"),
            _ => None,
        };

        if let Some(ascii) = replacement {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push_str(ascii);
        } else if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c);
        } else {
            pending_dash = true;
        }
    }

    slug
}

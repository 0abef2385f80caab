// src/utils/html.rs

use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Applied to every text field of AI-generated questions before they reach
/// quiz progress. Safe inline tags (like <b>, <code>) survive, while scripts,
/// iframes and event-handler attributes are removed.
///
/// Note: `<` and `&` in plain text come back entity-escaped, so the client
/// must render these fields as HTML rather than as raw text.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

// ============================================
// escape.rs - Plain text escaping
// ============================================
// Make arbitrary text safe to embed in Markdown or HTML input
// before handing it to the parsers.

/// Characters with a meaning in the Markdown dialect.
const MARKDOWN_RESERVED: &[char] = &[
    '_', '*', '~', '`', '#', '+', '-', '=', '.', '!', '[', ']', '(', ')', '{', '}', '>', '|',
    '\\',
];

/// Insert a backslash in front of every Markdown reserved character.
///
/// Escaping twice escapes the backslashes too, so only escape raw text.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 32);
    for c in text.chars() {
        if MARKDOWN_RESERVED.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Escape special HTML characters in a string.
///
/// `&` goes first so the ampersands of `&lt;`/`&gt;` are not escaped again.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

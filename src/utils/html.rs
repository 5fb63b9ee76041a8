// src/utils/html.rs

/// Strips dangerous markup from user-submitted text.
///
/// Comment bodies and blog descriptions are rendered back into other
/// readers' browsers, so anything like <script> or onclick attributes
/// is removed before storage. Safe inline tags (<b>, <i>, links)
/// survive untouched, and plain text passes through unchanged.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}

//! Trigger matching for lookup requests.

/// Prefix that marks a message as a lookup request, compared case-insensitively.
pub const TRIGGER_PREFIX: &str = "?wiki ";

/// Returns the search query if `body` starts with [`TRIGGER_PREFIX`].
///
/// The query is everything after the prefix, passed on verbatim: no trimming,
/// no normalization and no length limit. Absent or non-matching bodies yield
/// `None`.
pub fn extract_query(body: Option<&str>) -> Option<&str> {
    let body = body?;
    let prefix = body.get(..TRIGGER_PREFIX.len())?;
    if prefix.eq_ignore_ascii_case(TRIGGER_PREFIX) {
        Some(&body[TRIGGER_PREFIX.len()..])
    } else {
        None
    }
}

//! File name sanitization.

/// Longest name [`sanitize_filename`] returns.
pub const MAX_FILENAME_LEN: usize = 80;

/// Name used when nothing survives sanitization.
pub const FALLBACK_FILENAME: &str = "track";

/// Maps arbitrary text onto `[A-Za-z0-9-_.]`.
///
/// Other characters become `_`, runs of `_` collapse to one, and the result
/// never starts or ends with `_`. Empty results become [`FALLBACK_FILENAME`].
pub fn sanitize_filename(input: &str) -> String {
    let mut out = String::with_capacity(input.len().min(MAX_FILENAME_LEN));
    for c in input.chars() {
        let c = if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
            c
        } else {
            '_'
        };
        if c == '_' && (out.is_empty() || out.ends_with('_')) {
            continue;
        }
        out.push(c);
        if out.len() >= MAX_FILENAME_LEN {
            break;
        }
    }

    let trimmed = out.trim_end_matches('_');
    if trimmed.is_empty() {
        FALLBACK_FILENAME.to_string()
    } else {
        trimmed.to_string()
    }
}

//! Object key generation
//!
//! Keys are `{upload_time_millis}_{filename}` with every run of whitespace in
//! the filename collapsed to one underscore. Two uploads of the same filename
//! within the same millisecond produce the same key.

/// Replace each run of whitespace with a single `_`
pub fn sanitize_filename(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_whitespace = false;
    for c in name.chars() {
        if c.is_whitespace() {
            if !in_whitespace {
                out.push('_');
            }
            in_whitespace = true;
        } else {
            out.push(c);
            in_whitespace = false;
        }
    }
    out
}

/// Build the storage key for a file uploaded at `upload_time_millis`
pub fn generate(upload_time_millis: i64, original_filename: &str) -> String {
    format!("{}_{}", upload_time_millis, sanitize_filename(original_filename))
}

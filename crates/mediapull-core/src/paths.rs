//! Destination paths for downloaded images.
//!
//! `<output_dir>/<identifier>.<format>`, where `/` in the identifier becomes
//! a sub-directory. Only characters that cannot appear in a file name are
//! replaced. Empty, `.` and `..` segments are dropped, so a hostile
//! identifier cannot escape the output directory.

use std::path::{Path, PathBuf};

use crate::record::ResourceRecord;

/// Linux NAME_MAX.
const NAME_MAX: usize = 255;

/// Name used when an identifier sanitizes to nothing.
const FALLBACK_NAME: &str = "unnamed";

/// Makes one path segment safe for use on Linux.
///
/// NUL, `/`, `\` and control characters each become `_`. Everything else,
/// including repeated underscores and edge spaces, is kept as is so distinct
/// identifiers keep distinct names. Limited to 255 bytes.
pub fn sanitize_segment(name: &str) -> String {
    let out: String = name
        .chars()
        .map(|c| {
            if c == '\0' || c == '/' || c == '\\' || c.is_control() {
                '_'
            } else {
                c
            }
        })
        .collect();
    truncate_to_boundary(&out, NAME_MAX).to_string()
}

fn truncate_to_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut take = max;
    while take > 0 && !s.is_char_boundary(take) {
        take -= 1;
    }
    &s[..take]
}

/// Where `record` lands under `output_dir`.
pub fn destination_path(output_dir: &Path, record: &ResourceRecord) -> PathBuf {
    let mut segments: Vec<String> = record
        .identifier
        .split(['/', '\\'])
        .map(sanitize_segment)
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .collect();

    let stem = segments.pop().unwrap_or_else(|| FALLBACK_NAME.to_string());
    let format = sanitize_segment(&record.format).replace('.', "");
    let file_name = if format.is_empty() {
        stem
    } else {
        // Leave room for ".<format>" (and ".part" while downloading).
        let budget =
            NAME_MAX.saturating_sub(format.len() + 1 + crate::storage::TEMP_SUFFIX.len());
        format!("{}.{}", truncate_to_boundary(&stem, budget), format)
    };

    let mut path = output_dir.to_path_buf();
    for dir in segments {
        path.push(dir);
    }
    path.push(file_name);
    path
}

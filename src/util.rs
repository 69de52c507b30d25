// ABOUTME: Utility functions for code-point slicing and file naming
// ABOUTME: Offsets from the platform count chars, never bytes

use chrono::{DateTime, Local, NaiveDate};

/// Number of Unicode scalar values in `text`.
pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Byte index of the `char_idx`-th code point, or `None` past the end.
fn byte_index(text: &str, char_idx: usize) -> Option<usize> {
    if char_idx == 0 {
        return Some(0);
    }
    let mut indices = text.char_indices().map(|(i, _)| i).chain(Some(text.len()));
    indices.nth(char_idx)
}

/// Slice `text` by code-point range `[start, end)`.
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let from = byte_index(text, start)?;
    let to = byte_index(text, end)?;
    Some(&text[from..to])
}


/// Date prefix for a post file. Falls back to today when the platform has
/// no usable timestamp (freshly created posts).
pub fn file_date(updated_at: &str) -> NaiveDate {
    DateTime::parse_from_rfc3339(updated_at)
        .map(|dt| dt.date_naive())
        .unwrap_or_else(|_| Local::now().date_naive())
}

/// `YYYY-MM-DD-{id}.md`
pub fn post_filename(id: &str, updated_at: &str) -> String {
    format!("{}-{}.md", file_date(updated_at).format("%Y-%m-%d"), id)
}

#[cfg(test)]
mod filename_tests {
    use super::*;

    #[test]
    fn test_post_filename() {
        assert_eq!(
            post_filename("1000000", "2024-05-01T10:00:00+09:00"),
            "2024-05-01-1000000.md"
        );
    }

    #[test]
    fn test_file_date_fallback() {
        assert_eq!(file_date("not a date"), Local::now().date_naive());
    }
}

//! Filename utilities for converted outputs.

use std::path::Path;

use crate::formats::FormatId;

/// Filename helpers.
pub struct FsUtils;

impl FsUtils {
    /// Longest stem kept in a suggested filename.
    const MAX_STEM_CHARS: usize = 200;

    /// Sanitize a filename stem for use in a `Content-Disposition` header.
    ///
    /// Directory components are dropped, whitespace becomes `_`, and
    /// anything other than ASCII alphanumerics, `-`, `_` and `.` is removed.
    pub fn sanitize_stem(filename: &str) -> String {
        let base = filename.rsplit(['/', '\\']).next().unwrap_or(filename);
        let stem = Path::new(base)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(base);

        let sanitized: String = stem
            .chars()
            .filter_map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    Some(c)
                } else if c.is_whitespace() {
                    Some('_')
                } else {
                    None
                }
            })
            .take(Self::MAX_STEM_CHARS)
            .collect();

        let trimmed = sanitized.trim_start_matches('.');
        if trimmed.is_empty() {
            "converted".to_string()
        } else {
            trimmed.to_string()
        }
    }

    /// Suggested download name: `<sanitized stem>.<target extension>`.
    pub fn output_filename(original: Option<&str>, target: FormatId) -> String {
        let stem = original
            .map(Self::sanitize_stem)
            .unwrap_or_else(|| "converted".to_string());
        format!("{stem}.{}", target.extension())
    }
}

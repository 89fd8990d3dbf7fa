use indexmap::IndexMap;

use crate::model::columns;

/// Trim every value. Headers are trimmed too so `" TITLE"` still reads as
/// `TITLE`.
pub fn trim_fields(fields: &IndexMap<String, String>) -> IndexMap<String, String> {
    fields
        .iter()
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect()
}

/// Filename extension heuristic.
///
/// The source spreadsheets are known to drop the extension of one file
/// type. A value longer than four characters whose fourth-from-last
/// character is not `.` gets `.<ext>` appended. Anything of four characters
/// or fewer is left alone. This is a guess about the data, not a content
/// sniff: `archive.tiff` would be rewritten to `archive.tiff.jpg`.
pub fn apply_assumed_extension(filename: &str, ext: &str) -> Option<String> {
    let chars: Vec<char> = filename.chars().collect();
    if chars.len() <= 4 || chars[chars.len() - 4] == '.' {
        return None;
    }
    Some(format!("{filename}.{ext}"))
}

/// Normalize a raw row: trim, then rewrite FILENAME if present.
pub fn normalize_fields(fields: &IndexMap<String, String>, ext: &str) -> IndexMap<String, String> {
    let mut out = trim_fields(fields);
    if let Some(filename) = out.get_mut(columns::FILENAME) {
        if let Some(fixed) = apply_assumed_extension(filename, ext) {
            *filename = fixed;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_names_unchanged() {
        assert_eq!(apply_assumed_extension("img1", "jpg"), None);
        assert_eq!(apply_assumed_extension("", "jpg"), None);
    }

    #[test]
    fn missing_extension_appended() {
        assert_eq!(apply_assumed_extension("image1", "jpg").as_deref(), Some("image1.jpg"));
    }

    #[test]
    fn existing_extension_kept() {
        assert_eq!(apply_assumed_extension("image1.png", "jpg"), None);
        assert_eq!(apply_assumed_extension("x.tif", "jpg"), None);
    }

    #[test]
    fn four_letter_extension_is_not_recognised() {
        assert_eq!(
            apply_assumed_extension("scan.tiff", "jpg").as_deref(),
            Some("scan.tiff.jpg")
        );
    }

    #[test]
    fn counts_characters_not_bytes() {
        assert_eq!(apply_assumed_extension("café.png", "jpg"), None);
    }

    #[test]
    fn normalize_trims_and_fixes_filename() {
        let raw: IndexMap<String, String> = [
            (" TITLE ".to_string(), "  A letter ".to_string()),
            ("FILENAME".to_string(), " scan_0001 ".to_string()),
        ]
        .into_iter()
        .collect();
        let out = normalize_fields(&raw, "jpg");
        assert_eq!(out["TITLE"], "A letter");
        assert_eq!(out["FILENAME"], "scan_0001.jpg");
    }

    #[test]
    fn empty_filename_stays_empty() {
        let raw: IndexMap<String, String> =
            [("FILENAME".to_string(), "   ".to_string())].into_iter().collect();
        assert_eq!(normalize_fields(&raw, "jpg")["FILENAME"], "");
    }
}

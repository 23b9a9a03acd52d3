//! Download name derivation for converted artifacts.

use shared::domain::{SelectedFile, TargetFormat};

/// Extracts the `filename` parameter from a `Content-Disposition` value.
/// Both `filename="name"` and `filename=name` are accepted; the RFC 5987
/// `filename*=` form is ignored.
pub fn filename_from_content_disposition(header: &str) -> Option<String> {
    header_params(header).into_iter().find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case("filename") {
            return None;
        }

        let value = value.trim();
        let name = match value.strip_prefix('"') {
            Some(quoted) => quoted.split('"').next().unwrap_or_default(),
            None => value,
        };
        (!name.is_empty()).then(|| name.to_string())
    })
}

/// Splits on `;` outside double quotes, so quoted values keep their `;`.
fn header_params(header: &str) -> Vec<&str> {
    let mut params = Vec::new();
    let mut start = 0;
    let mut in_quotes = false;
    for (i, ch) in header.char_indices() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ';' if !in_quotes => {
                params.push(&header[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    params.push(&header[start..]);
    params
}

/// `<originalBaseName>.<targetFormat>`, where the base name is everything
/// before the first `.` of the original name.
pub fn fallback_file_name(file: &SelectedFile, format: &TargetFormat) -> String {
    format!("{}.{}", file.base_name(), format.as_str())
}

pub fn resolve_download_name(
    content_disposition: Option<&str>,
    file: &SelectedFile,
    format: &TargetFormat,
) -> String {
    content_disposition
        .and_then(filename_from_content_disposition)
        .unwrap_or_else(|| fallback_file_name(file, format))
}

/// Final path component of a suggested name, so a hostile header cannot
/// direct a save outside the chosen directory.
pub fn sanitize_for_disk(name: &str) -> Option<&str> {
    let last = name.rsplit(['/', '\\']).next()?.trim();
    (!last.is_empty() && last != "." && last != "..").then_some(last)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disk_names_drop_directory_components() {
        assert_eq!(sanitize_for_disk("../../etc/passwd"), Some("passwd"));
        assert_eq!(sanitize_for_disk("C:\\temp\\bear.pes"), Some("bear.pes"));
        assert_eq!(sanitize_for_disk("bear.pes"), Some("bear.pes"));
        assert_eq!(sanitize_for_disk("dir/"), None);
        assert_eq!(sanitize_for_disk(".."), None);
    }

    fn file(name: &str) -> SelectedFile {
        SelectedFile::new(name, b"payload".to_vec())
    }

    #[test]
    fn quoted_filename_is_used_verbatim() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=\"bear.pes\"").as_deref(),
            Some("bear.pes")
        );
    }

    #[test]
    fn semicolons_inside_quoted_filename_are_kept() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=\"bear;v2.pes\"").as_deref(),
            Some("bear;v2.pes")
        );
        assert_eq!(
            filename_from_content_disposition("attachment; filename=\"a;b.dst\"; size=12")
                .as_deref(),
            Some("a;b.dst")
        );
    }

    #[test]
    fn unquoted_filename_is_used_verbatim() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename=bear.pes").as_deref(),
            Some("bear.pes")
        );
    }

    #[test]
    fn extended_filename_parameter_is_ignored() {
        assert_eq!(
            filename_from_content_disposition("attachment; filename*=UTF-8''b%C3%A4r.pes"),
            None
        );
        assert_eq!(
            filename_from_content_disposition(
                "attachment; filename*=UTF-8''b%C3%A4r.pes; filename=\"bar.pes\""
            )
            .as_deref(),
            Some("bar.pes")
        );
    }

    #[test]
    fn fallback_uses_text_before_first_dot() {
        let format = TargetFormat::new("dst");
        assert_eq!(fallback_file_name(&file("flower.png"), &format), "flower.dst");
        assert_eq!(fallback_file_name(&file("rose.v2.pes"), &format), "rose.dst");
        assert_eq!(fallback_file_name(&file("noext"), &format), "noext.dst");
    }

    #[test]
    fn header_without_filename_falls_back() {
        let name = resolve_download_name(
            Some("attachment"),
            &file("flower.png"),
            &TargetFormat::new("dst"),
        );
        assert_eq!(name, "flower.dst");
    }
}

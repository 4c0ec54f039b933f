//! Artifact storage layout helpers.
//!
//! Each article gets one folder under the storage root, named from its
//! publication date and sanitized title, holding the PDF, an `images/`
//! subfolder, and a JSON metadata sidecar.

use chrono::NaiveDate;

/// Maximum length of the sanitized title used in folder names.
const MAX_TITLE_LEN: usize = 80;

/// Strip filesystem-unsafe characters from a title and bound its length.
pub fn sanitize_title(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '\\' | '/' | '*' | '?' | ':' | '"' | '<' | '>' | '|'))
        .collect();

    // Truncate on a char boundary
    match cleaned.char_indices().nth(MAX_TITLE_LEN) {
        Some((idx, _)) => cleaned[..idx].to_string(),
        None => cleaned,
    }
}

/// Folder name for an article's artifacts: `{date}-{sanitized-title}`.
pub fn article_dir_name(published: NaiveDate, title: &str) -> String {
    format!("{}-{}", published.format("%Y-%m-%d"), sanitize_title(title))
}

/// File extensions treated as extractable images in source bundles.
pub fn is_image_file(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    [".png", ".jpg", ".jpeg", ".gif", ".svg", ".bmp"]
        .iter()
        .any(|ext| lower.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_removes_unsafe_chars() {
        assert_eq!(sanitize_title(r#"a:b/c*d?e"f<g>h|i\j"#), "abcdefghij");
    }

    #[test]
    fn test_sanitize_keeps_safe_text() {
        assert_eq!(
            sanitize_title("Attention Is All You Need"),
            "Attention Is All You Need"
        );
    }

    #[test]
    fn test_sanitize_bounds_length() {
        let long = "x".repeat(200);
        assert_eq!(sanitize_title(&long).chars().count(), 80);
    }

    #[test]
    fn test_sanitize_truncates_on_char_boundary() {
        let long = "é".repeat(100);
        let out = sanitize_title(&long);
        assert_eq!(out.chars().count(), 80);
        assert!(long.starts_with(&out));
    }

    #[test]
    fn test_article_dir_name() {
        let date = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
        assert_eq!(
            article_dir_name(date, "QUBO: A Survey?"),
            "2024-01-15-QUBO A Survey"
        );
    }

    #[test]
    fn test_is_image_file() {
        assert!(is_image_file("figures/fig1.PNG"));
        assert!(is_image_file("plot.jpeg"));
        assert!(!is_image_file("main.tex"));
        assert!(!is_image_file("data.pngx"));
    }
}

const SEPARATORS: &[char] = &['/', '\\'];

/// Last path component of a client-supplied filename.
///
/// Both `/` and `\` count as separators since browsers on Windows may send
/// full paths. An empty name yields `"."`.
pub fn base_name(name: &str) -> &str {
    let trimmed = name.trim_end_matches(SEPARATORS);
    if trimmed.is_empty() {
        return if name.is_empty() { "." } else { "/" };
    }
    match trimmed.rfind(SEPARATORS) {
        Some(idx) => &trimmed[idx + 1..],
        None => trimmed,
    }
}

/// Lowercase extension including the leading dot, or `""` when there is none.
pub fn extension(name: &str) -> String {
    let base = base_name(name);
    match base.rfind('.') {
        Some(idx) => base[idx..].to_ascii_lowercase(),
        None => String::new(),
    }
}

/// Filename safe for URLs and `Content-Disposition`: the base name with every
/// character outside `[A-Za-z0-9._-]` replaced by `_`.
pub fn sanitize(name: &str) -> String {
    base_name(name)
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Extensions a browser can render in place.
pub fn is_inline_image(ext: &str) -> bool {
    matches!(ext, ".png" | ".jpg" | ".jpeg")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_is_lowercased_with_dot() {
        assert_eq!(extension("Report.PDF"), ".pdf");
        assert_eq!(extension("archive.tar.gz"), ".gz");
        assert_eq!(extension("README"), "");
        assert_eq!(extension("dir.d/file"), "");
        assert_eq!(extension(".bashrc"), ".bashrc");
    }

    #[test]
    fn sanitize_keeps_safe_characters() {
        assert_eq!(sanitize("report.pdf"), "report.pdf");
        assert_eq!(sanitize("my photo (1).JPG"), "my_photo__1_.JPG");
        assert_eq!(sanitize("../../etc/passwd"), "passwd");
        assert_eq!(sanitize("C:\\Users\\me\\notes.txt"), "notes.txt");
        assert_eq!(sanitize("résumé.txt"), "r_sum_.txt");
        assert_eq!(sanitize("a\"b.txt"), "a_b.txt");
    }

    #[test]
    fn base_name_edge_cases() {
        assert_eq!(base_name(""), ".");
        assert_eq!(base_name("///"), "/");
        assert_eq!(base_name("dir/"), "dir");
    }

    #[test]
    fn inline_images() {
        assert!(is_inline_image(".png"));
        assert!(is_inline_image(".jpeg"));
        assert!(!is_inline_image(".pdf"));
        assert!(!is_inline_image(".gif"));
    }
}

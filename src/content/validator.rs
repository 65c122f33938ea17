use std::fmt;

use super::sniff::sniff;

/// The sniffed type did not belong to the claimed extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentMismatch {
    pub sniffed: &'static str,
    pub claimed: String,
}

impl fmt::Display for ContentMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "content-type mismatch: {}", self.sniffed)
    }
}

impl std::error::Error for ContentMismatch {}

/// Media type prefix -> extensions whose content it may be.
const EXPECTED: &[(&str, &[&str])] = &[
    ("image/jpeg", &[".jpg", ".jpeg"]),
    ("image/png", &[".png"]),
    ("application/pdf", &[".pdf"]),
    ("application/zip", &[".zip"]),
    ("text/plain", &[".txt"]),
];

/// Checks that the head of an upload really is what its extension claims.
pub fn validate(head: &[u8], claimed_ext: &str) -> Result<(), ContentMismatch> {
    let sniffed = sniff(head);
    let ok = EXPECTED.iter().any(|(prefix, exts)| {
        sniffed.starts_with(prefix) && exts.contains(&claimed_ext)
    });
    if ok {
        Ok(())
    } else {
        Err(ContentMismatch {
            sniffed,
            claimed: claimed_ext.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JPEG: &[u8] = b"\xFF\xD8\xFF\xDB\x00\x43\x00";
    const PNG: &[u8] = b"\x89PNG\x0D\x0A\x1A\x0A\x00\x00\x00\x0DIHDR";

    #[test]
    fn matching_pairs_pass() {
        assert!(validate(JPEG, ".jpg").is_ok());
        assert!(validate(JPEG, ".jpeg").is_ok());
        assert!(validate(PNG, ".png").is_ok());
        assert!(validate(b"%PDF-1.4", ".pdf").is_ok());
        assert!(validate(b"PK\x03\x04rest", ".zip").is_ok());
        assert!(validate(b"plain notes", ".txt").is_ok());
        assert!(validate(b"", ".txt").is_ok());
    }

    #[test]
    fn jpeg_bytes_under_png_name_are_rejected() {
        let err = validate(JPEG, ".png").unwrap_err();
        assert_eq!(err.sniffed, "image/jpeg");
        assert_eq!(err.claimed, ".png");
        assert_eq!(err.to_string(), "content-type mismatch: image/jpeg");
    }

    #[test]
    fn every_mismatched_pair_is_rejected() {
        let samples: &[(&[u8], &str)] = &[
            (JPEG, ".jpg"),
            (PNG, ".png"),
            (&b"%PDF-1.4"[..], ".pdf"),
            (&b"PK\x03\x04rest"[..], ".zip"),
            (&b"plain notes"[..], ".txt"),
        ];
        let exts = [".jpg", ".png", ".pdf", ".zip", ".txt"];
        for (data, own) in samples {
            for ext in exts.iter().filter(|e| *e != own) {
                assert!(validate(data, ext).is_err(), "{} accepted as {}", own, ext);
            }
        }
    }

    #[test]
    fn html_is_never_text() {
        let err = validate(b"<html><body>x</body></html>", ".txt").unwrap_err();
        assert_eq!(err.sniffed, "text/html; charset=utf-8");
    }

    #[test]
    fn unknown_binary_is_rejected_for_text() {
        let err = validate(b"\x00\x01\x02", ".txt").unwrap_err();
        assert_eq!(err.sniffed, "application/octet-stream");
    }
}

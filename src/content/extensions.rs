use std::collections::BTreeSet;

/// Extensions accepted for upload, lowercase with a leading dot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedExtensions(BTreeSet<String>);

impl AllowedExtensions {
    pub fn new<I, S>(exts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = exts
            .into_iter()
            .map(|e| normalize(e.as_ref()))
            .filter(|e| e.len() > 1)
            .collect();
        Self(set)
    }

    pub fn contains(&self, ext: &str) -> bool {
        self.0.contains(ext)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

fn normalize(ext: &str) -> String {
    let ext = ext.trim().to_ascii_lowercase();
    if ext.starts_with('.') {
        ext
    } else {
        format!(".{}", ext)
    }
}

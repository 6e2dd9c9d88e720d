//! Storage names derived from an article's unique address

use regex_lite::Regex;
use serde::Serialize;
use std::path::Path;
use std::sync::OnceLock;

/// Extension of converted documents
pub const HTML_EXTENSION: &str = ".htm";

fn word_extension_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^\.docx?$").expect("static regex"))
}

/// Extension of an uploaded file name including the leading dot, e.g. `.docx`
pub fn file_extension(file_name: &str) -> Option<String> {
    Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .filter(|ext| !ext.is_empty())
        .map(|ext| format!(".{}", ext))
}

/// `.doc` or `.docx`, any letter case
pub fn is_word_extension(extension: &str) -> bool {
    word_extension_regex().is_match(extension)
}

/// File names of an article's stored artifacts, all prefixed by its unique address
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DocumentPaths {
    pub html_file: String,
    pub original_file: Option<String>,
}

impl DocumentPaths {
    /// Uploaded document plus its HTML rendition
    pub fn for_upload(unique_address: &str, extension: &str) -> Self {
        Self {
            html_file: format!("{}{}", unique_address, HTML_EXTENSION),
            original_file: Some(format!("{}{}", unique_address, extension)),
        }
    }

    /// HTML written directly by the author
    pub fn for_inline(unique_address: &str) -> Self {
        Self {
            html_file: format!("{}{}", unique_address, HTML_EXTENSION),
            original_file: None,
        }
    }

    /// Every stored file name
    pub fn files(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.html_file.as_str()).chain(self.original_file.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_word_extensions() {
        for ext in [".doc", ".docx", ".DOC", ".Docx", ".DOCX"] {
            assert!(is_word_extension(ext), "{ext} should pass");
        }
        for ext in [".pdf", ".docxx", ".dotx", "docx", ".doc.exe", "", ".txt", ".odt"] {
            assert!(!is_word_extension(ext), "{ext} should fail");
        }
    }

    #[test]
    fn test_file_extension() {
        assert_eq!(file_extension("paper.docx").as_deref(), Some(".docx"));
        assert_eq!(file_extension("my.thesis.DOC").as_deref(), Some(".DOC"));
        assert_eq!(file_extension("README"), None);
        assert_eq!(file_extension(""), None);
    }

    #[test]
    fn test_paths_share_address_prefix() {
        let paths = DocumentPaths::for_upload("k3j9x0aa1b2c3d4e", ".docx");
        assert_eq!(paths.html_file, "k3j9x0aa1b2c3d4e.htm");
        assert_eq!(paths.original_file.as_deref(), Some("k3j9x0aa1b2c3d4e.docx"));
        assert!(paths.files().all(|f| f.starts_with("k3j9x0aa1b2c3d4e")));

        let inline = DocumentPaths::for_inline("abc");
        assert_eq!(inline.files().collect::<Vec<_>>(), vec!["abc.htm"]);
    }
}

use std::collections::BTreeSet;

/// Content types tracked out of the box.
pub const DEFAULT_LANGUAGES: &[&str] = &[
    "html",
    "php",
    "vue",
    "javascript",
    "typescript",
    "python",
    "java",
    "csharp",
    "cpp",
    "css",
    "scss",
    "ruby",
    "go",
    "rust",
    "json",
    "yaml",
    "markdown",
];

/// Smaller web-only preset.
pub const NARROW_LANGUAGES: &[&str] = &["html", "css", "javascript"];

/// The set of content-type tags whose documents are tracked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Eligibility {
    languages: BTreeSet<String>,
}

impl Default for Eligibility {
    fn default() -> Self {
        Self::from_languages(DEFAULT_LANGUAGES.iter().copied())
    }
}

impl Eligibility {
    pub fn from_languages<I, S>(languages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            languages: languages.into_iter().map(Into::into).collect(),
        }
    }

    pub fn narrow() -> Self {
        Self::from_languages(NARROW_LANGUAGES.iter().copied())
    }

    pub fn contains(&self, content_type: &str) -> bool {
        self.languages.contains(content_type)
    }

    pub fn insert(&mut self, content_type: impl Into<String>) {
        self.languages.insert(content_type.into());
    }

    pub fn remove(&mut self, content_type: &str) -> bool {
        self.languages.remove(content_type)
    }

    pub fn languages(&self) -> impl Iterator<Item = &str> {
        self.languages.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.languages.is_empty()
    }
}

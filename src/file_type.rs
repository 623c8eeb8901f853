//! # File Type Hints
//!
//! A [`FileType`] describes what kind of content a canonical artifact holds.
//! Storage keys take their extension from it.
//!
//! The extension hint is three-state: "infer from the MIME type", "no
//! extension at all", and "this exact extension". Collapsing the first two
//! into a single `None` would lose the difference between an unspecified
//! hint and a deliberate extension-less artifact.

/// How a [`FileType`] picks the extension of its storage key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum ExtensionHint {
    /// Look the extension up from the MIME type.
    #[default]
    Infer,
    /// The artifact has no extension, whatever the MIME type says.
    NoExtension,
    /// Use this extension verbatim (including the leading dot, if wanted).
    Explicit(String),
}

/// Semantic descriptor of a canonical artifact's content kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileType {
    mime: String,
    extension: ExtensionHint,
}

impl FileType {
    /// A file type whose extension is inferred from `mime`.
    pub fn new(mime: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            extension: ExtensionHint::Infer,
        }
    }

    /// A file type with an explicit extension override.
    pub fn with_extension(mime: impl Into<String>, extension: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            extension: ExtensionHint::Explicit(extension.into()),
        }
    }

    /// A file type whose artifacts never carry an extension.
    pub fn without_extension(mime: impl Into<String>) -> Self {
        Self {
            mime: mime.into(),
            extension: ExtensionHint::NoExtension,
        }
    }

    pub fn json() -> Self {
        Self::new("application/json")
    }

    pub fn yaml() -> Self {
        Self::new("application/x-yaml")
    }

    pub fn text() -> Self {
        Self::new("text/plain")
    }

    pub fn bytes() -> Self {
        Self::new("application/octet-stream")
    }

    pub fn mime(&self) -> &str {
        &self.mime
    }

    pub fn extension_hint(&self) -> &ExtensionHint {
        &self.extension
    }

    /// Derives the filesystem extension for this file type.
    ///
    /// An explicit override wins; [`ExtensionHint::NoExtension`] yields
    /// `None`; otherwise the MIME type is looked up non-strictly and an
    /// unknown type yields `None`.
    pub fn extension(&self) -> Option<String> {
        match &self.extension {
            ExtensionHint::Explicit(ext) => Some(ext.clone()),
            ExtensionHint::NoExtension => None,
            ExtensionHint::Infer => guess_extension(&self.mime).map(str::to_string),
        }
    }
}

/// Best-effort MIME type to extension lookup.
///
/// Parameters (`; charset=utf-8`) are ignored and the match is
/// case-insensitive.
pub fn guess_extension(mime: &str) -> Option<&'static str> {
    let essence = mime.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
    let ext = match essence.as_str() {
        "application/json" => ".json",
        "application/x-yaml" | "application/yaml" | "text/yaml" | "text/x-yaml" => ".yaml",
        "text/plain" => ".txt",
        "text/csv" => ".csv",
        "text/html" => ".html",
        "text/markdown" | "text/x-markdown" => ".md",
        "application/xml" | "text/xml" => ".xml",
        "application/toml" => ".toml",
        "application/octet-stream" => ".bin",
        "image/png" => ".png",
        "image/jpeg" => ".jpg",
        "image/svg+xml" => ".svg",
        "application/pdf" => ".pdf",
        "application/gzip" => ".gz",
        "application/zip" => ".zip",
        "text/x-rust" => ".rs",
        _ => return None,
    };
    Some(ext)
}

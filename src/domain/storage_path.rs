use std::fmt;

use uuid::Uuid;

/// File name under which an upload is stored, flattened to a single safe path segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath(String);

impl StoragePath {
    /// Keeps the client's base name so re-uploading a file replaces it.
    pub fn from_filename(filename: &str) -> Option<Self> {
        sanitize_file_name(filename).map(Self)
    }

    /// Like [`Self::from_filename`], but guarantees the `.pdf` extension the corpus scan looks for.
    pub fn pdf_from_filename(filename: &str) -> Option<Self> {
        sanitize_file_name(filename).map(|name| {
            if name.to_ascii_lowercase().ends_with(".pdf") {
                Self(name)
            } else {
                Self(format!("{name}.pdf"))
            }
        })
    }

    /// Prefixes the base name with a random id so uploads never collide.
    pub fn unique(filename: &str) -> Option<Self> {
        sanitize_file_name(filename).map(|name| Self(format!("{}_{}", Uuid::new_v4(), name)))
    }

    pub fn from_raw(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn sanitize_file_name(filename: &str) -> Option<String> {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        None
    } else {
        Some(cleaned.to_string())
    }
}

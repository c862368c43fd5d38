use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum KnowledgeError {
    #[error("could not read business summary `{path}`: {source}")]
    Summary { path: PathBuf, source: std::io::Error },
    #[error("could not extract text from business document `{path}`: {source}")]
    Document { path: PathBuf, source: pdf_extract::OutputError },
}

/// Static business knowledge injected into every conversation as trusted
/// context. Loaded once at bootstrap; never mutated afterwards.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnowledgeBase {
    pub summary: String,
    pub document: String,
}

impl KnowledgeBase {
    /// Load the summary text file and extract text from the PDF document.
    /// A missing file yields an empty section so the assistant still runs
    /// with partial context; an unreadable or corrupt file is an error.
    pub fn load(
        summary_path: impl AsRef<Path>,
        document_path: impl AsRef<Path>,
    ) -> Result<Self, KnowledgeError> {
        let summary_path = summary_path.as_ref();
        let document_path = document_path.as_ref();

        let summary = if summary_path.exists() {
            std::fs::read_to_string(summary_path).map_err(|source| KnowledgeError::Summary {
                path: summary_path.to_path_buf(),
                source,
            })?
        } else {
            String::new()
        };

        let document = if document_path.exists() {
            pdf_extract::extract_text(document_path).map_err(|source| {
                KnowledgeError::Document { path: document_path.to_path_buf(), source }
            })?
        } else {
            String::new()
        };

        Ok(Self { summary, document })
    }

    pub fn is_empty(&self) -> bool {
        self.summary.trim().is_empty() && self.document.trim().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::KnowledgeBase;

    #[test]
    fn missing_files_yield_empty_sections() {
        let dir = TempDir::new().expect("temp dir");

        let knowledge =
            KnowledgeBase::load(dir.path().join("summary.txt"), dir.path().join("about.pdf"))
                .expect("missing files should not be an error");

        assert!(knowledge.summary.is_empty());
        assert!(knowledge.document.is_empty());
        assert!(knowledge.is_empty());
    }

    #[test]
    fn summary_text_is_loaded_verbatim() {
        let dir = TempDir::new().expect("temp dir");
        let summary_path = dir.path().join("summary.txt");
        fs::write(&summary_path, "We plan low-impact journeys.\n").expect("write summary");

        let knowledge = KnowledgeBase::load(&summary_path, dir.path().join("about.pdf"))
            .expect("load should succeed");

        assert_eq!(knowledge.summary, "We plan low-impact journeys.\n");
        assert!(!knowledge.is_empty());
    }
}

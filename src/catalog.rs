//! Step catalogs: the fixed, ordered list of steps a sequencer plays.
//!
//! A catalog is validated once, at construction, and is immutable from then
//! on. The sequencer relies on that: because a catalog is never empty,
//! `current_step()` and `progress_fraction()` can be total.
//!
//! Catalogs come from one of three places:
//!
//! 1. [`StepCatalog::pdf_translation_workflow`]: the built-in six-stage
//!    workflow of the PDF translation tool the diagram documents
//! 2. [`StepCatalog::from_json_str`] / [`StepCatalog::from_json_file`]: a
//!    JSON array of `{ "title", "description", "details" }` objects
//! 3. [`StepCatalog::new`]: steps assembled in code

use crate::error::SequencerError;
use crate::step::Step;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// A step as written in a catalog file, before it is given an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepEntry {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub details: String,
}

impl StepEntry {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        details: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            details: details.into(),
        }
    }
}

/// Validated, non-empty, ordered list of [`Step`]s.
///
/// Cloning is cheap: the steps are shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepCatalog {
    steps: Arc<[Step]>,
}

impl StepCatalog {
    /// Build a catalog, assigning each step its position as index.
    ///
    /// # Errors
    /// - [`SequencerError::EmptyCatalog`] when `entries` is empty
    /// - [`SequencerError::InvalidCatalog`] when a step has a blank title
    pub fn new(entries: Vec<StepEntry>) -> Result<Self, SequencerError> {
        if entries.is_empty() {
            return Err(SequencerError::EmptyCatalog);
        }

        let steps = entries
            .into_iter()
            .enumerate()
            .map(|(index, entry)| {
                if entry.title.trim().is_empty() {
                    return Err(SequencerError::InvalidCatalog(format!(
                        "step {} has an empty title",
                        index + 1
                    )));
                }
                Ok(Step {
                    index,
                    title: entry.title,
                    description: entry.description,
                    details: entry.details,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            steps: steps.into(),
        })
    }

    /// Parse a catalog from a JSON array of step objects.
    pub fn from_json_str(json: &str) -> Result<Self, SequencerError> {
        let entries: Vec<StepEntry> =
            serde_json::from_str(json).map_err(|source| SequencerError::CatalogParse { source })?;
        Self::new(entries)
    }

    /// Read and parse a JSON catalog file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SequencerError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| SequencerError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// The built-in workflow of the PDF translation tool.
    pub fn pdf_translation_workflow() -> Self {
        PDF_TRANSLATION_WORKFLOW.clone()
    }

    /// Number of steps; always at least 1.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn get(&self, index: usize) -> Option<&Step> {
        self.steps.get(index)
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Step> {
        self.steps.iter()
    }
}

impl<'a> IntoIterator for &'a StepCatalog {
    type Item = &'a Step;
    type IntoIter = std::slice::Iter<'a, Step>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

static PDF_TRANSLATION_WORKFLOW: Lazy<StepCatalog> = Lazy::new(|| StepCatalog {
    steps: vec![
        Step {
            index: 0,
            title: "PDF Input".into(),
            description: "User selects PDF file and translation settings".into(),
            details: "The user interface allows selection of PDF file, target language, \
                      and quality settings (DPI)."
                .into(),
        },
        Step {
            index: 1,
            title: "Page Conversion".into(),
            description: "Convert PDF pages to high-resolution images".into(),
            details: "Each PDF page is converted to a pixmap using PyMuPDF with the selected \
                      DPI setting."
                .into(),
        },
        Step {
            index: 2,
            title: "OCR Processing".into(),
            description: "Extract text and bounding boxes using Tesseract".into(),
            details: "Pytesseract performs OCR to detect text regions and extract content \
                      with coordinate information."
                .into(),
        },
        Step {
            index: 3,
            title: "Translation".into(),
            description: "Translate extracted text using Google Translate".into(),
            details: "Text blocks are translated using Google Translate API with caching to \
                      avoid duplicate translations."
                .into(),
        },
        Step {
            index: 4,
            title: "Image Reconstruction".into(),
            description: "Replace original text with translated text".into(),
            details: "Original text areas are cleared and replaced with translated text \
                      using PIL drawing functions."
                .into(),
        },
        Step {
            index: 5,
            title: "PDF Output".into(),
            description: "Save all translated pages as new PDF".into(),
            details: "All processed images are combined into a new PDF file with translated \
                      content."
                .into(),
        },
    ]
    .into(),
});

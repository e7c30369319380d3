use log::{info, warn};
use std::path::Path;

use crate::config::*;

/// An engine that turns a document into text: a PDF text layer reader or an OCR tool.
///
/// Implementations live outside of this crate. The availability probe is checked
/// before any extraction, so that a missing engine is reported as such and not as
/// an empty document.
pub trait TextSource {
    /// A short name for error messages, for instance "pdftotext".
    fn capability(&self) -> String;

    fn is_available(&self) -> bool;

    fn extract_text(&self, path: &Path) -> TextExtraction;
}

/// Splits the output of an engine into lines. Only whitespace means an empty document.
pub fn split_text_lines(text: &str) -> TextExtraction {
    if text.trim().is_empty() {
        return TextExtraction::Empty;
    }
    TextExtraction::Lines(text.lines().map(|l| l.to_string()).collect())
}

/// Runs a text source on a document and wraps the result as the input of a conversion.
pub fn read_text_input<S: TextSource + ?Sized>(
    source: &S,
    path: &Path,
    kind: SourceKind,
) -> RegisterInput {
    let extraction = if source.is_available() {
        info!(
            "read_text_input: extracting {:?} with {}",
            path,
            source.capability()
        );
        source.extract_text(path)
    } else {
        warn!("read_text_input: {} is not available", source.capability());
        TextExtraction::Unavailable {
            capability: source.capability(),
        }
    };
    match kind {
        SourceKind::Ocr => RegisterInput::Ocr(extraction),
        _ => RegisterInput::DocumentText(extraction),
    }
}

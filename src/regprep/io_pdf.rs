use std::path::Path;
use std::process::Command;

use register_normalizer::{TextExtraction, TextSource};

use crate::regprep::io_common::{probe_command, run_extractor};

pub const DEFAULT_PDFTOTEXT: &str = "pdftotext";

/// Reads the text layer of a PDF document with poppler's `pdftotext`.
///
/// The layout mode keeps the gaps between the columns of the register.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct PdfToText {
    pub binary: String,
}

impl PdfToText {
    pub fn new(binary_o: Option<&str>) -> PdfToText {
        PdfToText {
            binary: binary_o.unwrap_or(DEFAULT_PDFTOTEXT).to_string(),
        }
    }
}

impl TextSource for PdfToText {
    fn capability(&self) -> String {
        self.binary.clone()
    }

    fn is_available(&self) -> bool {
        probe_command(&self.binary, "-v")
    }

    fn extract_text(&self, path: &Path) -> TextExtraction {
        run_extractor(Command::new(&self.binary).arg("-layout").arg(path).arg("-"))
    }
}

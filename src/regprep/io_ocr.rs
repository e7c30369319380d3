use std::path::Path;
use std::process::Command;

use register_normalizer::{TextExtraction, TextSource};

use crate::regprep::io_common::{probe_command, run_extractor};

pub const DEFAULT_TESSERACT: &str = "tesseract";

/// Reads a scanned register page with the `tesseract` OCR engine.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Tesseract {
    pub binary: String,
}

impl Tesseract {
    pub fn new(binary_o: Option<&str>) -> Tesseract {
        Tesseract {
            binary: binary_o.unwrap_or(DEFAULT_TESSERACT).to_string(),
        }
    }
}

impl TextSource for Tesseract {
    fn capability(&self) -> String {
        self.binary.clone()
    }

    fn is_available(&self) -> bool {
        probe_command(&self.binary, "--version")
    }

    // Page segmentation mode 6: a single uniform block of text, one entry per line.
    fn extract_text(&self, path: &Path) -> TextExtraction {
        run_extractor(
            Command::new(&self.binary)
                .arg(path)
                .arg("stdout")
                .args(["--psm", "6"]),
        )
    }
}

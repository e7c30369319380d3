use log::debug;
use std::path::Path;
use std::process::Command;

use register_normalizer::{split_text_lines, SourceKind, TextExtraction};

/// The readers that the command line tool knows about.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum InputType {
    Csv,
    Excel,
    Pdf,
    Image,
    Text,
    Paste,
}

impl InputType {
    /// The type given on the command line. None for `auto` or an unknown name.
    pub fn from_name(name: &str) -> Option<InputType> {
        match name {
            "csv" => Some(InputType::Csv),
            "excel" => Some(InputType::Excel),
            "pdf" => Some(InputType::Pdf),
            "image" => Some(InputType::Image),
            "text" => Some(InputType::Text),
            "paste" => Some(InputType::Paste),
            _ => None,
        }
    }

    pub fn from_extension(path: &str) -> Option<InputType> {
        let ext = Path::new(path)
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())?;
        match ext.as_str() {
            "csv" => Some(InputType::Csv),
            "xlsx" | "xlsm" | "xls" => Some(InputType::Excel),
            "pdf" => Some(InputType::Pdf),
            "png" | "jpg" | "jpeg" | "tif" | "tiff" | "bmp" => Some(InputType::Image),
            "txt" => Some(InputType::Text),
            _ => None,
        }
    }

    /// The kind of source the input will be normalized as.
    pub fn source_kind(&self) -> SourceKind {
        match self {
            InputType::Csv | InputType::Excel | InputType::Paste => SourceKind::Table,
            InputType::Pdf | InputType::Text => SourceKind::DocumentText,
            InputType::Image => SourceKind::Ocr,
        }
    }
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// Checks that an external program can be started.
pub fn probe_command(binary: &str, version_flag: &str) -> bool {
    match Command::new(binary).arg(version_flag).output() {
        Ok(_) => true,
        Err(e) => {
            debug!("probe_command: {} cannot be started: {}", binary, e);
            false
        }
    }
}

/// Runs an external text extractor and collects its standard output.
pub fn run_extractor(command: &mut Command) -> TextExtraction {
    debug!("run_extractor: {:?}", command);
    match command.output() {
        Ok(output) if output.status.success() => {
            split_text_lines(&String::from_utf8_lossy(&output.stdout))
        }
        Ok(output) => TextExtraction::Failed {
            reason: format!(
                "{} ({})",
                String::from_utf8_lossy(&output.stderr).trim(),
                output.status
            ),
        },
        Err(e) => TextExtraction::Failed {
            reason: e.to_string(),
        },
    }
}

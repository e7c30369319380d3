use log::{debug, info};
use snafu::prelude::*;
use std::fs;
use std::io::Read;

use register_normalizer::{split_text_lines, RegisterInput, TextExtraction};

use crate::regprep::*;

fn read_lossy(path: &str) -> BRegResult<String> {
    let bytes = fs::read(path).context(OpeningInputSnafu { path })?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Reads text that was already extracted from a register document.
pub fn read_text_file(path: &str) -> BRegResult<RegisterInput> {
    let text = read_lossy(path)?;
    let extraction = split_text_lines(&text);
    if let TextExtraction::Lines(lines) = &extraction {
        info!("read_text_file: {} line(s) read from {}", lines.len(), path);
    }
    Ok(RegisterInput::DocumentText(extraction))
}

/// The text of a pasted table: from a file, or from the standard input.
pub fn read_pasted_text(path_o: Option<&str>) -> BRegResult<String> {
    match path_o {
        Some(path) => read_lossy(path),
        None => {
            debug!("read_pasted_text: reading the standard input");
            let mut bytes: Vec<u8> = Vec::new();
            std::io::stdin()
                .read_to_end(&mut bytes)
                .context(OpeningInputSnafu { path: "stdin" })?;
            Ok(String::from_utf8_lossy(&bytes).into_owned())
        }
    }
}

pub mod builder;
mod columns;
mod config;
mod elector_number;
mod line_parser;
pub mod manual;
mod markers;
mod source;

use log::{debug, info, warn};

pub use crate::columns::{normalize_header, resolve_columns};
pub use crate::config::*;
pub use crate::elector_number::{
    assemble_elector_number, join_parts, leading_district, missing_elector_number_roles,
    ElectorNumber,
};
pub use crate::line_parser::{
    parse_heuristic, parse_lines, parse_strict, ExtractedRecord, ExtractionResult,
};
pub use crate::markers::{
    decode_marker, is_date_marker, is_marker_code, marker_code_description,
    DEFAULT_MARKER_DESCRIPTION,
};
pub use crate::source::{read_text_input, split_text_lines, TextSource};

// The roles that every table must provide, besides the elector number.
const MANDATORY_ROLES: [FieldRole; 4] = [
    FieldRole::Marker,
    FieldRole::Name,
    FieldRole::Postcode,
    FieldRole::Address1,
];

/// One conversion of one register.
///
/// A conversion goes through the following states:
/// `AwaitingInput` -> `SchemaResolved` (tables) or `LinesParsed` (text) -> `Normalized`
/// -> `Exported`. Any failure leads to `Rejected`. A conversion only runs once.
#[derive(Debug, Clone)]
pub struct Conversion {
    settings: NormalizeSettings,
    state: ConversionState,
}

impl Conversion {
    pub fn new(settings: &NormalizeSettings) -> Conversion {
        Conversion {
            settings: settings.clone(),
            state: ConversionState::AwaitingInput,
        }
    }

    pub fn state(&self) -> ConversionState {
        self.state
    }

    fn transition(&mut self, next: ConversionState) {
        debug!("Conversion: {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Normalizes the input. Failures are returned, never raised, and leave the
    /// conversion in the `Rejected` state.
    pub fn run(&mut self, input: RegisterInput) -> Result<NormalizedTable, NormalizeError> {
        if self.state != ConversionState::AwaitingInput {
            return Err(NormalizeError::AlreadyRun { state: self.state });
        }
        info!("Conversion: processing {} input", input.kind());
        let res = match input {
            RegisterInput::Table(table) => self.run_table(&table),
            RegisterInput::DocumentText(extraction) => {
                self.run_text(extraction, SourceKind::DocumentText)
            }
            RegisterInput::Ocr(extraction) => self.run_text(extraction, SourceKind::Ocr),
        };
        match &res {
            Ok(table) => {
                info!(
                    "Conversion: {} record(s), {} skipped",
                    table.records.len(),
                    table.skipped_rows
                );
                self.transition(ConversionState::Normalized);
            }
            Err(e) => {
                warn!("Conversion: rejected: {}", e);
                self.transition(ConversionState::Rejected);
            }
        }
        res
    }

    /// Records that the normalized table was written out.
    pub fn mark_exported(&mut self) {
        if self.state == ConversionState::Normalized {
            self.transition(ConversionState::Exported);
        } else {
            warn!(
                "Conversion: cannot mark as exported from state {:?}",
                self.state
            );
        }
    }

    fn run_table(&mut self, table: &RawTable) -> Result<NormalizedTable, NormalizeError> {
        let role_map = resolve_columns(&table.schema, &self.settings);
        self.transition(ConversionState::SchemaResolved);

        let missing = self.missing_roles(&role_map);
        if !missing.is_empty() {
            return Err(NormalizeError::MissingFields { roles: missing });
        }

        let text = |record: &RawRecord, role: FieldRole| -> Option<String> {
            role_map
                .get(role)
                .and_then(|f| record.get(f))
                .map(|s| s.trim())
                .filter(|s| !s.is_empty())
                .map(|s| s.to_string())
        };

        let mut records: Vec<NormalizedRecord> = Vec::new();
        let mut skipped_rows = 0;
        for (idx, record) in table.records().enumerate() {
            if record.is_blank() {
                debug!("run_table: row {}: blank, skipped", idx + 1);
                skipped_rows += 1;
                continue;
            }
            let en =
                assemble_elector_number(&role_map, &record, self.settings.elector_number_format)?;
            let polling_district =
                text(&record, FieldRole::PollingDistrict).unwrap_or(en.polling_district);
            let elector_marker_type = text(&record, FieldRole::MarkerDescription)
                .unwrap_or_else(|| {
                    let raw = role_map.get(FieldRole::Marker).and_then(|f| record.get(f));
                    decode_marker(raw)
                });
            let address1 = text(&record, FieldRole::Address1);
            records.push(NormalizedRecord {
                elector_number: en.number,
                polling_district,
                name: text(&record, FieldRole::Name),
                postcode: text(&record, FieldRole::Postcode),
                street: self.street(&address1),
                address1,
                address2: text(&record, FieldRole::Address2),
                elector_marker_type,
            });
        }

        if records.is_empty() {
            return Err(NormalizeError::NoRecordsExtracted {
                sample: vec![],
                skipped: skipped_rows,
            });
        }
        Ok(NormalizedTable {
            records,
            skipped_rows,
            skipped_lines: vec![],
            source: SourceKind::Table,
            grammar: None,
            include_street: self.settings.derive_street,
        })
    }

    fn missing_roles(&self, role_map: &FieldRoleMap) -> Vec<FieldRole> {
        let mut missing: Vec<FieldRole> = role_map
            .missing(&MANDATORY_ROLES)
            .into_iter()
            .filter(|r| match r {
                // An already decoded marker column is as good as the raw one.
                FieldRole::Marker => {
                    self.settings.require_marker_column
                        && !role_map.is_bound(FieldRole::MarkerDescription)
                }
                _ => true,
            })
            .collect();
        missing.extend(missing_elector_number_roles(role_map));
        missing.sort();
        missing
    }

    fn run_text(
        &mut self,
        extraction: TextExtraction,
        source: SourceKind,
    ) -> Result<NormalizedTable, NormalizeError> {
        let lines = match extraction {
            TextExtraction::Lines(lines) => lines,
            TextExtraction::Empty => {
                return Err(NormalizeError::NoRecordsExtracted {
                    sample: vec![],
                    skipped: 0,
                })
            }
            TextExtraction::Failed { reason } => {
                return Err(NormalizeError::ExtractionUnavailable {
                    capability: source.to_string(),
                    reason,
                })
            }
            TextExtraction::Unavailable { capability } => {
                return Err(NormalizeError::ExtractionUnavailable {
                    capability,
                    reason: "no engine available on this host".to_string(),
                })
            }
        };

        let extracted = parse_lines(&lines, self.settings.line_strategy);
        self.transition(ConversionState::LinesParsed);

        if extracted.records.is_empty() {
            let sample: Vec<String> = lines
                .iter()
                .map(|l| l.trim())
                .filter(|l| !l.is_empty())
                .take(self.settings.diagnostic_sample_lines)
                .map(|l| l.to_string())
                .collect();
            return Err(NormalizeError::NoRecordsExtracted {
                sample,
                skipped: extracted.unparsed(),
            });
        }

        let skipped_rows = extracted.unparsed();
        let records: Vec<NormalizedRecord> = extracted
            .records
            .into_iter()
            .map(|r| {
                let elector_marker_type = r
                    .elector_marker_type
                    .unwrap_or_else(|| decode_marker(r.marker.as_deref()));
                let address1 = Some(r.address).filter(|s| !s.is_empty());
                NormalizedRecord {
                    polling_district: leading_district(&r.elector_number),
                    elector_number: r.elector_number,
                    name: Some(r.name).filter(|s| !s.is_empty()),
                    postcode: r.postcode,
                    street: self.street(&address1),
                    address1,
                    address2: r.address2,
                    elector_marker_type,
                }
            })
            .collect();

        Ok(NormalizedTable {
            records,
            skipped_rows,
            skipped_lines: extracted.skipped,
            source,
            grammar: extracted.grammar,
            include_street: self.settings.derive_street,
        })
    }

    fn street(&self, address1: &Option<String>) -> Option<String> {
        if self.settings.derive_street {
            Some(extract_street(address1.as_deref()))
        } else {
            None
        }
    }
}

/// The street of an address: its last comma-separated part when there are several.
pub fn extract_street(address: Option<&str>) -> String {
    match address {
        None => String::new(),
        Some(a) => {
            let parts: Vec<&str> = a.split(',').collect();
            match parts.as_slice() {
                [_, .., last] => last.trim().to_string(),
                _ => a.trim().to_string(),
            }
        }
    }
}

/// Runs a single conversion with the given settings.
///
/// Arguments:
/// * `input` the register, as a table or as extracted text
/// * `settings` the matching, assembly and parsing strategies to use
pub fn run_normalization(
    input: RegisterInput,
    settings: &NormalizeSettings,
) -> Result<NormalizedTable, NormalizeError> {
    Conversion::new(settings).run(input)
}

// ********* Input data structures ***********

use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::Display;

/// A table as read from a register file: the header row and the data rows.
///
/// Cells are optional: a missing cell is different from an empty string.
/// Rows may be shorter or longer than the schema.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub schema: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl RawTable {
    pub fn records(&self) -> impl Iterator<Item = RawRecord<'_>> {
        self.rows.iter().map(|cells| RawRecord::new(cells))
    }
}

/// One row of a [RawTable].
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RawRecord<'a> {
    cells: &'a [Option<String>],
}

impl<'a> RawRecord<'a> {
    pub fn new(cells: &'a [Option<String>]) -> RawRecord<'a> {
        RawRecord { cells }
    }

    /// The value of a bound field. Cells past the end of a short row read as missing.
    pub fn get(&self, field: &BoundField) -> Option<&'a str> {
        self.cells.get(field.index).and_then(|c| c.as_deref())
    }

    pub fn is_blank(&self) -> bool {
        self.cells
            .iter()
            .all(|c| c.as_deref().map(|s| s.trim().is_empty()).unwrap_or(true))
    }
}

/// The result of a text extraction collaborator (PDF text layer or OCR).
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TextExtraction {
    /// The raw lines, as returned by the engine.
    Lines(Vec<String>),
    /// The engine ran but the document holds no text.
    Empty,
    /// The engine ran and failed on this document.
    Failed { reason: String },
    /// No engine for this capability is reachable on this host.
    Unavailable { capability: String },
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SourceKind {
    Table,
    DocumentText,
    Ocr,
}

impl Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SourceKind::Table => "table",
            SourceKind::DocumentText => "document text",
            SourceKind::Ocr => "OCR",
        };
        write!(f, "{}", s)
    }
}

/// The input of one conversion. The kind of input is decided once, by the caller.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum RegisterInput {
    Table(RawTable),
    DocumentText(TextExtraction),
    Ocr(TextExtraction),
}

impl RegisterInput {
    pub fn kind(&self) -> SourceKind {
        match self {
            RegisterInput::Table(_) => SourceKind::Table,
            RegisterInput::DocumentText(_) => SourceKind::DocumentText,
            RegisterInput::Ocr(_) => SourceKind::Ocr,
        }
    }
}

// ******** Field roles *********

/// The semantic roles that a column of a register may play.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum FieldRole {
    FullElectorNumber,
    PrefixPart,
    NumberPart,
    SuffixPart,
    Marker,
    /// A marker column that is already decoded (for instance a previous output).
    MarkerDescription,
    /// A polling district column that is already present.
    PollingDistrict,
    Name,
    Postcode,
    Address1,
    Address2,
}

impl FieldRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldRole::FullElectorNumber => "FullElectorNumber",
            FieldRole::PrefixPart => "PrefixPart",
            FieldRole::NumberPart => "NumberPart",
            FieldRole::SuffixPart => "SuffixPart",
            FieldRole::Marker => "Marker",
            FieldRole::MarkerDescription => "MarkerDescription",
            FieldRole::PollingDistrict => "PollingDistrict",
            FieldRole::Name => "Name",
            FieldRole::Postcode => "Postcode",
            FieldRole::Address1 => "Address1",
            FieldRole::Address2 => "Address2",
        }
    }
}

impl Display for FieldRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A column of the input schema bound to a role.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct BoundField {
    pub name: String,
    /// Position in the schema. Duplicated header names are told apart by it.
    pub index: usize,
}

/// The mapping from roles to columns. Roles that are not present are unresolved.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct FieldRoleMap {
    bindings: BTreeMap<FieldRole, BoundField>,
}

impl FieldRoleMap {
    pub fn get(&self, role: FieldRole) -> Option<&BoundField> {
        self.bindings.get(&role)
    }

    pub fn field_name(&self, role: FieldRole) -> Option<&str> {
        self.get(role).map(|b| b.name.as_str())
    }

    pub fn is_bound(&self, role: FieldRole) -> bool {
        self.bindings.contains_key(&role)
    }

    pub fn is_index_bound(&self, index: usize) -> bool {
        self.bindings.values().any(|b| b.index == index)
    }

    pub(crate) fn bind(&mut self, role: FieldRole, field: BoundField) {
        self.bindings.insert(role, field);
    }

    pub(crate) fn unbind(&mut self, role: FieldRole) -> Option<BoundField> {
        self.bindings.remove(&role)
    }

    /// The roles among `roles` that are not bound, in the given order.
    pub fn missing(&self, roles: &[FieldRole]) -> Vec<FieldRole> {
        roles
            .iter()
            .filter(|r| !self.is_bound(**r))
            .cloned()
            .collect()
    }
}

// ******** Output data structures *********

pub const DEFAULT_OUTPUT_FILE_NAME: &str = "Clean_Electoral_Register.csv";

pub const OUTPUT_HEADER: [&str; 7] = [
    "ElectorNumber",
    "PollingDistrict",
    "Name",
    "Postcode",
    "Address1",
    "Address2",
    "ElectorMarkerType",
];

pub const STREET_HEADER: &str = "Street";

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NormalizedRecord {
    /// Dotted `prefix.number.suffix`, a verbatim combined value, or empty.
    pub elector_number: String,
    pub polling_district: String,
    pub name: Option<String>,
    pub postcode: Option<String>,
    pub address1: Option<String>,
    pub address2: Option<String>,
    pub elector_marker_type: String,
    /// Only filled when street derivation is requested.
    pub street: Option<String>,
}

impl NormalizedRecord {
    pub fn to_row(&self, with_street: bool) -> Vec<String> {
        let opt = |o: &Option<String>| o.clone().unwrap_or_default();
        let mut row = vec![
            self.elector_number.clone(),
            self.polling_district.clone(),
            opt(&self.name),
            opt(&self.postcode),
            opt(&self.address1),
            opt(&self.address2),
            self.elector_marker_type.clone(),
        ];
        if with_street {
            row.push(opt(&self.street));
        }
        row
    }
}

/// Why a line of unstructured text did not produce a record.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum SkipReason {
    /// The strict grammar did not match the line.
    NoGrammarMatch,
    /// Fewer than three column groups were found.
    TooFewFields { found: usize },
    /// The first column does not look like an elector number.
    NoElectorNumber,
    MissingAddress,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NoGrammarMatch => write!(f, "line does not match the register grammar"),
            SkipReason::TooFewFields { found } => {
                write!(f, "only {} column(s) found, at least 3 expected", found)
            }
            SkipReason::NoElectorNumber => write!(f, "first column is not an elector number"),
            SkipReason::MissingAddress => write!(f, "no address column after the name"),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SkippedLine {
    /// 1-based position in the extracted text.
    pub line_number: usize,
    pub reason: SkipReason,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum LineGrammar {
    Strict,
    Heuristic,
}

impl Display for LineGrammar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LineGrammar::Strict => write!(f, "strict"),
            LineGrammar::Heuristic => write!(f, "heuristic"),
        }
    }
}

/// The normalized register, ready for serialization.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NormalizedTable {
    pub records: Vec<NormalizedRecord>,
    /// Blank table rows that were dropped, or text lines that could not be parsed.
    pub skipped_rows: usize,
    /// Details of the skipped text lines. Empty for tabular inputs.
    pub skipped_lines: Vec<SkippedLine>,
    pub source: SourceKind,
    /// The line grammar that produced the records, for text inputs.
    pub grammar: Option<LineGrammar>,
    pub include_street: bool,
}

impl NormalizedTable {
    pub fn header(&self) -> Vec<String> {
        let mut h: Vec<String> = OUTPUT_HEADER.iter().map(|s| s.to_string()).collect();
        if self.include_street {
            h.push(STREET_HEADER.to_string());
        }
        h
    }

    pub fn rows(&self) -> Vec<Vec<String>> {
        self.records
            .iter()
            .map(|r| r.to_row(self.include_street))
            .collect()
    }
}

/// The steps of a conversion.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ConversionState {
    AwaitingInput,
    SchemaResolved,
    LinesParsed,
    Normalized,
    Exported,
    Rejected,
}

/// Errors that prevent a conversion from producing a table.
///
/// None of them is fatal: the caller can always start a new conversion.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum NormalizeError {
    /// Some mandatory roles could not be found in the header of the table.
    MissingFields { roles: Vec<FieldRole> },
    /// The pasted input could not be read as a table.
    UnparsableInput { reason: String },
    /// The text was read but no line could be turned into a record.
    /// The first lines are kept to help diagnose the layout.
    NoRecordsExtracted { sample: Vec<String>, skipped: usize },
    /// The text or OCR engine did not produce any text.
    ExtractionUnavailable { capability: String, reason: String },
    /// A conversion only processes one input.
    AlreadyRun { state: ConversionState },
}

impl Error for NormalizeError {}

impl Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NormalizeError::MissingFields { roles } => {
                let names: Vec<&str> = roles.iter().map(|r| r.as_str()).collect();
                write!(f, "Missing expected columns: {}", names.join(", "))
            }
            NormalizeError::UnparsableInput { reason } => write!(
                f,
                "Could not parse pasted table. Make sure it's comma-separated. ({})",
                reason
            ),
            NormalizeError::NoRecordsExtracted { sample, skipped } => write!(
                f,
                "No structured records extracted ({} line(s) skipped, {} sample line(s) available)",
                skipped,
                sample.len()
            ),
            NormalizeError::ExtractionUnavailable { capability, reason } => {
                write!(f, "{} could not produce any text: {}", capability, reason)
            }
            NormalizeError::AlreadyRun { state } => {
                write!(f, "This conversion already ran (state {:?})", state)
            }
        }
    }
}

// ********* Configuration **********

/// How a candidate name is compared with a column name.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MatchMode {
    /// The candidate appears anywhere in the column name.
    Substring,
    /// The candidate is the whole column name. To use when the headers are
    /// known to be precise ("Elector Number" vs "Elector Number Suffix").
    Exact,
}

/// The nesting of the search loops when several columns could fit a role.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum MatchOrder {
    /// The first column (in schema order) that fits any candidate.
    FieldsFirst,
    /// The first candidate (in priority order) that fits any column.
    CandidatesFirst,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ElectorNumberFormat {
    /// Always `prefix.number.suffix`.
    ThreePart,
    /// `prefix.suffix` when the prefix and the number are the same text,
    /// as some older register exports do.
    CollapseRepeatedPrefix,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum LineStrategy {
    /// The strict grammar, then the column heuristic if nothing was found.
    StrictThenHeuristic,
    StrictOnly,
    HeuristicOnly,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct NormalizeSettings {
    pub match_mode: MatchMode,
    pub match_order: MatchOrder,
    pub elector_number_format: ElectorNumberFormat,
    pub line_strategy: LineStrategy,
    /// If false, a table without a marker column gets the default description.
    pub require_marker_column: bool,
    /// Adds a `Street` column derived from `Address1`.
    pub derive_street: bool,
    /// Number of raw lines returned when no record could be extracted.
    pub diagnostic_sample_lines: usize,
}

impl NormalizeSettings {
    pub const DEFAULT_SETTINGS: NormalizeSettings = NormalizeSettings {
        match_mode: MatchMode::Substring,
        match_order: MatchOrder::FieldsFirst,
        elector_number_format: ElectorNumberFormat::ThreePart,
        line_strategy: LineStrategy::StrictThenHeuristic,
        require_marker_column: true,
        derive_street: false,
        diagnostic_sample_lines: 10,
    };
}

impl Default for NormalizeSettings {
    fn default() -> Self {
        NormalizeSettings::DEFAULT_SETTINGS
    }
}

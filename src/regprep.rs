use log::{debug, info, warn};

use register_normalizer::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::Path;

use serde::Serialize;
use text_diff::print_diff;

use crate::args::Args;
use crate::regprep::io_common::{simplify_file_name, InputType};

mod io_common;
mod io_csv;
mod io_excel;
mod io_ocr;
mod io_pdf;
mod io_text;

#[derive(Debug, Snafu)]
pub enum RegprepError {
    #[snafu(display("Error opening file {path}"))]
    OpeningInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("The input {path} is empty"))]
    EmptyInput { path: String },
    #[snafu(display("Error parsing line {lineno} of the CSV input"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Error opening Excel file {path}"))]
    OpeningExcel {
        source: calamine::Error,
        path: String,
    },
    #[snafu(display("No worksheet named {name} in {path}"))]
    MissingWorksheet { path: String, name: String },
    #[snafu(display("The Excel file {path} has no worksheet"))]
    EmptyExcel { path: String },
    #[snafu(display("Unexpected cell on row {lineno}: {content}"))]
    ExcelWrongCellType { lineno: u64, content: String },
    #[snafu(display(
        "Cannot guess the type of {input}: use --input-type with csv, excel, pdf, image, text or paste"
    ))]
    UnknownInputType { input: String },
    #[snafu(display("An input file is required to read {input_type} registers"))]
    MissingInputPath { input_type: String },
    #[snafu(display("Error writing the CSV output"))]
    EncodingCsv { source: csv::Error },
    #[snafu(display("Error writing to {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing the report"))]
    WritingReport { source: serde_json::Error },
    #[snafu(display("{source}"))]
    Normalize { source: NormalizeError },
    #[snafu(display("Difference detected between the output and the reference {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type RegResult<T> = Result<T, RegprepError>;
// Boxed, as the readers return large errors through long call chains.
pub type BRegResult<T> = Result<T, Box<RegprepError>>;

const STDOUT: &str = "stdout";

/// The summary of one run, written with `--report`.
#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub input: String,
    pub source: String,
    pub grammar: Option<String>,
    #[serde(rename = "recordCount")]
    pub record_count: usize,
    #[serde(rename = "skippedRows")]
    pub skipped_rows: usize,
    #[serde(rename = "skippedLines")]
    pub skipped_lines: Vec<SkippedLineReport>,
    pub state: String,
    pub error: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize)]
pub struct SkippedLineReport {
    #[serde(rename = "lineNumber")]
    pub line_number: usize,
    pub reason: String,
}

impl ConversionReport {
    fn new(input: &str, kind: SourceKind) -> ConversionReport {
        ConversionReport {
            input: input.to_string(),
            source: kind.to_string(),
            grammar: None,
            record_count: 0,
            skipped_rows: 0,
            skipped_lines: vec![],
            state: format!("{:?}", ConversionState::AwaitingInput),
            error: None,
        }
    }

    fn with_table(self, table: &NormalizedTable, state: ConversionState) -> ConversionReport {
        ConversionReport {
            grammar: table.grammar.map(|g| g.to_string()),
            record_count: table.records.len(),
            skipped_rows: table.skipped_rows,
            skipped_lines: table
                .skipped_lines
                .iter()
                .map(|sl| SkippedLineReport {
                    line_number: sl.line_number,
                    reason: sl.reason.to_string(),
                })
                .collect(),
            state: format!("{:?}", state),
            ..self
        }
    }

    fn unreadable(self, e: &RegprepError) -> ConversionReport {
        ConversionReport {
            state: format!("{:?}", ConversionState::Rejected),
            error: Some(e.to_string()),
            ..self
        }
    }

    fn with_error(self, e: &NormalizeError, state: ConversionState) -> ConversionReport {
        let skipped_rows = match e {
            NormalizeError::NoRecordsExtracted { skipped, .. } => *skipped,
            _ => 0,
        };
        ConversionReport {
            skipped_rows,
            state: format!("{:?}", state),
            error: Some(e.to_string()),
            ..self
        }
    }
}

fn read_settings(args: &Args) -> RegResult<NormalizeSettings> {
    let d = NormalizeSettings::DEFAULT_SETTINGS;
    Ok(NormalizeSettings {
        match_mode: if args.exact_headers {
            MatchMode::Exact
        } else {
            MatchMode::Substring
        },
        match_order: match args.match_order.as_deref() {
            None => d.match_order,
            Some("fields") => MatchOrder::FieldsFirst,
            Some("candidates") => MatchOrder::CandidatesFirst,
            Some(x) => {
                whatever!(
                    "Cannot use match order {:?}: expected 'fields' or 'candidates'",
                    x
                )
            }
        },
        elector_number_format: match args.elector_number_format.as_deref() {
            None => d.elector_number_format,
            Some("three-part") => ElectorNumberFormat::ThreePart,
            Some("collapse-repeated-prefix") => ElectorNumberFormat::CollapseRepeatedPrefix,
            Some(x) => {
                whatever!(
                    "Cannot use elector number format {:?}: expected 'three-part' or 'collapse-repeated-prefix'",
                    x
                )
            }
        },
        line_strategy: match args.line_strategy.as_deref() {
            None => d.line_strategy,
            Some("fallback") => LineStrategy::StrictThenHeuristic,
            Some("strict") => LineStrategy::StrictOnly,
            Some("heuristic") => LineStrategy::HeuristicOnly,
            Some(x) => {
                whatever!(
                    "Cannot use line strategy {:?}: expected 'fallback', 'strict' or 'heuristic'",
                    x
                )
            }
        },
        require_marker_column: !args.allow_missing_marker,
        derive_street: args.street,
        ..d
    })
}

fn read_input_type(args: &Args) -> RegResult<InputType> {
    match (args.input_type.as_deref(), args.input.as_deref()) {
        (None | Some("auto"), None) => Ok(InputType::Paste),
        (None | Some("auto"), Some(path)) => {
            InputType::from_extension(path).context(UnknownInputTypeSnafu { input: path })
        }
        (Some(name), _) => {
            InputType::from_name(name).context(UnknownInputTypeSnafu { input: name })
        }
    }
}

fn input_path(path_o: Option<&str>, input_type: InputType) -> RegResult<&str> {
    path_o.context(MissingInputPathSnafu {
        input_type: format!("{:?}", input_type),
    })
}

fn read_input(args: &Args, input_type: InputType) -> BRegResult<RegisterInput> {
    let path_o = args.input.as_deref();
    let path = || input_path(path_o, input_type);
    info!("read_input: reading {:?} as {:?}", path_o, input_type);
    let input = match input_type {
        InputType::Csv => RegisterInput::Table(io_csv::read_csv_table(path()?)?),
        InputType::Excel => RegisterInput::Table(io_excel::read_excel_table(
            path()?,
            args.excel_worksheet_name.as_deref(),
        )?),
        InputType::Pdf => read_text_input(
            &io_pdf::PdfToText::new(args.pdftotext.as_deref()),
            Path::new(path()?),
            SourceKind::DocumentText,
        ),
        InputType::Image => read_text_input(
            &io_ocr::Tesseract::new(args.tesseract.as_deref()),
            Path::new(path()?),
            SourceKind::Ocr,
        ),
        InputType::Text => io_text::read_text_file(path()?)?,
        InputType::Paste => {
            let text = io_text::read_pasted_text(path_o)?;
            RegisterInput::Table(io_csv::read_pasted_table(&text).context(NormalizeSnafu {})?)
        }
    };
    Ok(input)
}

/// The normalized register in CSV format.
pub fn render_csv(table: &NormalizedTable) -> BRegResult<String> {
    let mut bytes: Vec<u8> = Vec::new();
    {
        let mut wtr = csv::Writer::from_writer(&mut bytes);
        wtr.write_record(table.header())
            .context(EncodingCsvSnafu {})?;
        for row in table.rows() {
            wtr.write_record(&row).context(EncodingCsvSnafu {})?;
        }
        wtr.flush().context(WritingOutputSnafu { path: "memory" })?;
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

fn write_text(path: &str, text: &str) -> BRegResult<()> {
    if path == STDOUT {
        print!("{}", text);
    } else {
        fs::write(path, text).context(WritingOutputSnafu { path })?;
    }
    Ok(())
}

fn write_report(path_o: Option<&str>, report: &ConversionReport) -> BRegResult<()> {
    if let Some(path) = path_o {
        let pretty_js = serde_json::to_string_pretty(report).context(WritingReportSnafu {})?;
        debug!("write_report: {}", pretty_js);
        write_text(path, &format!("{}\n", pretty_js))?;
    }
    Ok(())
}

fn check_reference(reference_path: &str, output: &str) -> BRegResult<()> {
    let reference = fs::read_to_string(reference_path).context(OpeningInputSnafu {
        path: reference_path,
    })?;
    let reference = reference.replace("\r\n", "\n");
    let output = output.replace("\r\n", "\n");
    if reference != output {
        warn!("Found differences with the reference file {}", reference_path);
        print_diff(reference.as_str(), output.as_str(), "\n");
        return Err(Box::new(RegprepError::ReferenceMismatch {
            path: reference_path.to_string(),
        }));
    }
    info!("check_reference: output matches {}", reference_path);
    Ok(())
}

/// Runs a complete conversion as described by the command line arguments.
pub fn run_conversion(args: &Args) -> BRegResult<ConversionReport> {
    let settings = read_settings(args)?;
    let input_type = read_input_type(args)?;
    debug!("run_conversion: settings: {:?}", settings);

    let input_name = args
        .input
        .as_deref()
        .map(simplify_file_name)
        .unwrap_or_else(|| "stdin".to_string());
    let report = ConversionReport::new(&input_name, input_type.source_kind());

    let input = match read_input(args, input_type) {
        Ok(input) => input,
        Err(e) => {
            write_report(args.report.as_deref(), &report.unreadable(&e))?;
            return Err(e);
        }
    };

    let mut conversion = Conversion::new(&settings);
    let table = match conversion.run(input) {
        Ok(table) => table,
        Err(e) => {
            write_report(
                args.report.as_deref(),
                &report.with_error(&e, conversion.state()),
            )?;
            return Err(Box::new(RegprepError::Normalize { source: e }));
        }
    };
    info!(
        "run_conversion: {} record(s) normalized, {} skipped",
        table.records.len(),
        table.skipped_rows
    );

    let output = render_csv(&table)?;
    let out_path = args.out.as_deref().unwrap_or(DEFAULT_OUTPUT_FILE_NAME);
    write_text(out_path, &output)?;
    conversion.mark_exported();
    if out_path != STDOUT {
        eprintln!("Cleaned file saved as: {}", out_path);
    }

    let report = report.with_table(&table, conversion.state());
    write_report(args.report.as_deref(), &report)?;

    if let Some(reference_path) = args.reference.as_deref() {
        check_reference(reference_path, &output)?;
    }
    Ok(report)
}

/// Prints what may help the user to fix a rejected input.
pub fn print_diagnostics(e: &RegprepError) {
    match e {
        RegprepError::Normalize {
            source: NormalizeError::NoRecordsExtracted { sample, .. },
        } => {
            if sample.is_empty() {
                eprintln!("The document does not contain any text.");
            } else {
                eprintln!("First lines of the extracted text:");
                for line in sample {
                    eprintln!("  {}", line);
                }
            }
        }
        RegprepError::Normalize {
            source: NormalizeError::MissingFields { .. },
        } => {
            eprintln!("Column names are matched loosely: check the header row of the input.");
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_dir() -> String {
        format!("{}/tests/register_data", env!("CARGO_MANIFEST_DIR"))
    }

    fn test_args(file_name: &str, out_dir: &tempfile::TempDir) -> Args {
        Args {
            input: Some(format!("{}/{}", test_dir(), file_name)),
            out: Some(
                out_dir
                    .path()
                    .join("out.csv")
                    .to_string_lossy()
                    .to_string(),
            ),
            ..Args::default()
        }
    }

    fn run_expecting_failure(args: &Args) -> RegprepError {
        match run_conversion(args) {
            Ok(report) => panic!("the conversion should have failed: {:?}", report),
            Err(e) => *e,
        }
    }

    #[test]
    fn csv_register() {
        let out_dir = tempfile::tempdir().unwrap();
        let args = Args {
            reference: Some(format!("{}/sample_register_expected.csv", test_dir())),
            ..test_args("sample_register.csv", &out_dir)
        };
        let report = run_conversion(&args).unwrap();
        assert_eq!(report.record_count, 4);
        assert_eq!(report.skipped_rows, 1);
        assert_eq!(report.source, "table");
        assert_eq!(report.state, "Exported");
    }

    #[test]
    fn output_reads_back_unchanged() {
        let out_dir = tempfile::tempdir().unwrap();
        let args = test_args("sample_register.csv", &out_dir);
        run_conversion(&args).unwrap();
        let first = fs::read_to_string(args.out.clone().unwrap()).unwrap();

        let second_dir = tempfile::tempdir().unwrap();
        let args2 = Args {
            input: args.out.clone(),
            ..test_args("", &second_dir)
        };
        run_conversion(&args2).unwrap();
        let second = fs::read_to_string(args2.out.unwrap()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn reference_mismatch() {
        let out_dir = tempfile::tempdir().unwrap();
        let args = Args {
            reference: Some(format!("{}/pasted_register.csv", test_dir())),
            ..test_args("sample_register.csv", &out_dir)
        };
        assert!(matches!(
            run_expecting_failure(&args),
            RegprepError::ReferenceMismatch { .. }
        ));
    }

    #[test]
    fn street_column() {
        let out_dir = tempfile::tempdir().unwrap();
        let args = Args {
            street: true,
            ..test_args("sample_register.csv", &out_dir)
        };
        run_conversion(&args).unwrap();
        let output = fs::read_to_string(args.out.unwrap()).unwrap();
        let mut lines = output.lines();
        assert_eq!(
            lines.next(),
            Some("ElectorNumber,PollingDistrict,Name,Postcode,Address1,Address2,ElectorMarkerType,Street")
        );
        assert!(lines.next().unwrap_or("").ends_with(",Springfield"));
    }

    #[test]
    fn layout_text() {
        let out_dir = tempfile::tempdir().unwrap();
        let report_path = out_dir.path().join("report.json");
        let args = Args {
            report: Some(report_path.to_string_lossy().to_string()),
            ..test_args("layout_register.txt", &out_dir)
        };
        let report = run_conversion(&args).unwrap();
        assert_eq!(report.grammar, Some("heuristic".to_string()));
        assert_eq!(report.record_count, 3);
        assert_eq!(report.skipped_rows, 4);

        let js: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(js["recordCount"], 3);
        assert_eq!(js["state"], "Exported");
        assert_eq!(js["skippedLines"][0]["lineNumber"], 1);

        let output = fs::read_to_string(args.out.unwrap()).unwrap();
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines[1],
            "BA1001,BA1001,\"DOE, JANE\",AB1 2CD,4 HIGH STREET,,Overseas voter – Parliamentary only"
        );
        assert_eq!(
            lines[3],
            "BA1003,BA1003,\"SMITH, ANNA\",AB1 3EF,FLAT 2,ROSE COURT,Will become eligible to vote on 01/06/2026"
        );
    }

    #[test]
    fn strict_text() {
        let out_dir = tempfile::tempdir().unwrap();
        let args = Args {
            line_strategy: Some("strict".to_string()),
            ..test_args("strict_register.txt", &out_dir)
        };
        let report = run_conversion(&args).unwrap();
        assert_eq!(report.grammar, Some("strict".to_string()));
        assert_eq!(report.record_count, 2);
        let output = fs::read_to_string(args.out.unwrap()).unwrap();
        assert!(output.contains("BA.12.1,BA,\"SMITH, JOHN PAUL\",FY1 2AB,4 HIGH STREET,,"));
    }

    #[test]
    fn unreadable_text() {
        let out_dir = tempfile::tempdir().unwrap();
        let report_path = out_dir.path().join("report.json");
        let args = Args {
            report: Some(report_path.to_string_lossy().to_string()),
            ..test_args("unreadable_register.txt", &out_dir)
        };
        match run_expecting_failure(&args) {
            RegprepError::Normalize {
                source: NormalizeError::NoRecordsExtracted { sample, skipped },
            } => {
                assert_eq!(sample[0], "Minutes of the residents meeting");
                assert_eq!(skipped, 3);
            }
            e => panic!("unexpected error: {:?}", e),
        }
        assert!(!Path::new(&args.out.unwrap()).exists());
        let js: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(js["state"], "Rejected");
        assert_eq!(js["recordCount"], 0);
    }

    #[test]
    fn missing_columns() {
        let out_dir = tempfile::tempdir().unwrap();
        let args = test_args("missing_columns.csv", &out_dir);
        match run_expecting_failure(&args) {
            RegprepError::Normalize {
                source: NormalizeError::MissingFields { roles },
            } => {
                assert!(roles.contains(&FieldRole::Name));
                assert!(roles.contains(&FieldRole::Marker));
                assert!(!roles.contains(&FieldRole::Postcode));
            }
            e => panic!("unexpected error: {:?}", e),
        }
    }

    #[test]
    fn pasted_register() {
        let out_dir = tempfile::tempdir().unwrap();
        let args = Args {
            input_type: Some("paste".to_string()),
            ..test_args("pasted_register.csv", &out_dir)
        };
        run_conversion(&args).unwrap();
        let output = fs::read_to_string(args.out.unwrap()).unwrap();
        assert!(output
            .lines()
            .any(|l| l == "KA2-0042/1,KA2,Jane Doe,AB1 2CD,1 High St,,EU citizen – local elections only"));
    }

    #[test]
    fn bad_paste() {
        let out_dir = tempfile::tempdir().unwrap();
        let args = Args {
            input_type: Some("paste".to_string()),
            ..test_args("ragged_paste.csv", &out_dir)
        };
        assert!(matches!(
            run_expecting_failure(&args),
            RegprepError::Normalize {
                source: NormalizeError::UnparsableInput { .. }
            }
        ));
    }

    #[test]
    fn bad_paste_report() {
        let out_dir = tempfile::tempdir().unwrap();
        let report_path = out_dir.path().join("report.json");
        let args = Args {
            input_type: Some("paste".to_string()),
            report: Some(report_path.to_string_lossy().to_string()),
            ..test_args("ragged_paste.csv", &out_dir)
        };
        run_expecting_failure(&args);
        let js: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(js["input"], "ragged_paste.csv");
        assert_eq!(js["source"], "table");
        assert_eq!(js["state"], "Rejected");
        assert_eq!(js["recordCount"], 0);
        assert!(js["error"].is_string());
    }

    #[test]
    fn bad_options() {
        let out_dir = tempfile::tempdir().unwrap();
        let args = Args {
            line_strategy: Some("sideways".to_string()),
            ..test_args("sample_register.csv", &out_dir)
        };
        assert!(matches!(
            run_expecting_failure(&args),
            RegprepError::Whatever { .. }
        ));

        let args = Args {
            input_type: Some("docx".to_string()),
            ..test_args("sample_register.csv", &out_dir)
        };
        assert!(matches!(
            run_expecting_failure(&args),
            RegprepError::UnknownInputType { .. }
        ));

        let args = test_args("register.odt", &out_dir);
        assert!(matches!(
            run_expecting_failure(&args),
            RegprepError::UnknownInputType { .. }
        ));
    }

    #[test]
    fn missing_pdf_engine() {
        let out_dir = tempfile::tempdir().unwrap();
        let args = Args {
            input_type: Some("pdf".to_string()),
            pdftotext: Some("regprep-no-such-pdftotext".to_string()),
            ..test_args("sample_register.csv", &out_dir)
        };
        assert!(matches!(
            run_expecting_failure(&args),
            RegprepError::Normalize {
                source: NormalizeError::ExtractionUnavailable { .. }
            }
        ));
    }

    #[test]
    fn settings() {
        let s = read_settings(&Args {
            exact_headers: true,
            match_order: Some("candidates".to_string()),
            elector_number_format: Some("collapse-repeated-prefix".to_string()),
            line_strategy: Some("heuristic".to_string()),
            allow_missing_marker: true,
            ..Args::default()
        })
        .unwrap();
        assert_eq!(s.match_mode, MatchMode::Exact);
        assert_eq!(s.match_order, MatchOrder::CandidatesFirst);
        assert_eq!(
            s.elector_number_format,
            ElectorNumberFormat::CollapseRepeatedPrefix
        );
        assert_eq!(s.line_strategy, LineStrategy::HeuristicOnly);
        assert!(!s.require_marker_column);
        assert!(!s.derive_street);
        assert_eq!(
            read_settings(&Args::default()).unwrap(),
            NormalizeSettings::DEFAULT_SETTINGS
        );
    }
}

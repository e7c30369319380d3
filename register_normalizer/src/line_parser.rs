use log::{debug, info};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::*;
use crate::elector_number::join_parts;
use crate::markers::{decode_marker, is_date_marker, is_marker_code};

// One register line, as printed by most electoral registration software:
//   BA 12 1 F SMITH, JOHN PAUL 4 HIGH STREET FY1 2AB
// The address is separated from the forenames by a wide gap or starts with a digit.
static STRICT_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(concat!(
        r"^(?P<prefix>[A-Z]{1,4}[0-9]{0,2})[\s./-]+(?P<number>[0-9]{1,6})[\s./-]+(?P<suffix>[0-9]{1,3})\s+",
        r"(?:(?P<marker>[A-Z])\s+)?",
        r"(?P<surname>[A-Z][A-Za-z'-]+),\s*(?P<forename>[A-Za-z'-]+(?: [A-Za-z'-]+)*?)",
        r"(?:\s{2,}(?P<address>\S.*?)|\s(?P<numbered_address>[0-9].*?))",
        r"\s+(?P<postcode>[A-Z]{1,2}[0-9][A-Z0-9]? ?[0-9][A-Z]{2})$"
    ))
    .expect("valid strict line regex")
});

static COLUMN_GAP: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s{2,}").expect("valid gap regex"));

static POSTCODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Z]{1,2}[0-9][A-Z0-9]? ?[0-9][A-Z]{2}$").expect("valid postcode regex")
});

static TRAILING_POSTCODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?P<address>.*\S)\s+(?P<postcode>[A-Z]{1,2}[0-9][A-Z0-9]? ?[0-9][A-Z]{2})$")
        .expect("valid trailing postcode regex")
});

/// The fields found on one line of unstructured text.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ExtractedRecord {
    pub elector_number: String,
    pub marker: Option<String>,
    /// Set when the marker was already decoded while parsing (attainer dates).
    pub elector_marker_type: Option<String>,
    pub name: String,
    pub address: String,
    pub address2: Option<String>,
    pub postcode: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ExtractionResult {
    pub records: Vec<ExtractedRecord>,
    pub skipped: Vec<SkippedLine>,
    /// The grammar that produced the records. None when nothing was found.
    pub grammar: Option<LineGrammar>,
}

impl ExtractionResult {
    pub fn unparsed(&self) -> usize {
        self.skipped.len()
    }
}

// Trimmed, non-blank lines with their 1-based position.
fn numbered_lines(lines: &[String]) -> Vec<(usize, &str)> {
    lines
        .iter()
        .enumerate()
        .map(|(idx, l)| (idx + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty())
        .collect()
}

fn run_grammar<F>(lines: &[String], grammar: LineGrammar, parse_line: F) -> ExtractionResult
where
    F: Fn(&str) -> Result<ExtractedRecord, SkipReason>,
{
    let mut res = ExtractionResult::default();
    for (line_number, line) in numbered_lines(lines) {
        match parse_line(line) {
            Ok(record) => res.records.push(record),
            Err(reason) => {
                debug!(
                    "run_grammar: {} grammar: line {}: {} ({:?})",
                    grammar, line_number, reason, line
                );
                res.skipped.push(SkippedLine {
                    line_number,
                    reason,
                })
            }
        }
    }
    if !res.records.is_empty() {
        res.grammar = Some(grammar);
    }
    res
}

fn parse_strict_line(line: &str) -> Result<ExtractedRecord, SkipReason> {
    let caps = STRICT_LINE
        .captures(line)
        .ok_or(SkipReason::NoGrammarMatch)?;
    let group = |name: &str| caps.name(name).map(|m| m.as_str().trim().to_string());
    let address = group("address")
        .or_else(|| group("numbered_address"))
        .unwrap_or_default();
    Ok(ExtractedRecord {
        elector_number: join_parts(
            &caps["prefix"],
            &caps["number"],
            &caps["suffix"],
            ElectorNumberFormat::ThreePart,
        ),
        marker: group("marker"),
        elector_marker_type: None,
        name: format!("{}, {}", &caps["surname"], caps["forename"].trim()),
        address,
        address2: None,
        postcode: group("postcode"),
    })
}

/// Reads every line with the strict register grammar.
pub fn parse_strict(lines: &[String]) -> ExtractionResult {
    run_grammar(lines, LineGrammar::Strict, parse_strict_line)
}

// "4 HIGH ST AB1 2CD" -> ("4 HIGH ST", "AB1 2CD"). Some address text must remain.
fn split_trailing_postcode(address: &str) -> Option<(String, String)> {
    TRAILING_POSTCODE
        .captures(address)
        .map(|caps| (caps["address"].to_string(), caps["postcode"].to_string()))
}

fn parse_heuristic_line(line: &str) -> Result<ExtractedRecord, SkipReason> {
    let fields: Vec<&str> = COLUMN_GAP
        .split(line)
        .map(|f| f.trim())
        .filter(|f| !f.is_empty())
        .collect();
    if fields.len() < 3 {
        return Err(SkipReason::TooFewFields {
            found: fields.len(),
        });
    }

    let elector_number = fields[0];
    if !elector_number.chars().any(|c| c.is_ascii_digit()) {
        return Err(SkipReason::NoElectorNumber);
    }

    // The second column is a marker only if it looks like one; otherwise it is the name.
    let second = fields[1];
    let (marker, elector_marker_type, name_idx) = if is_date_marker(second) {
        (Some(second.to_string()), Some(decode_marker(Some(second))), 2)
    } else if is_marker_code(second) {
        (Some(second.to_string()), None, 2)
    } else {
        (None, None, 1)
    };

    // At least three fields, and name_idx is at most 2.
    let name = fields[name_idx];
    let mut address = fields
        .get(name_idx + 1)
        .ok_or(SkipReason::MissingAddress)?
        .to_string();
    let mut rest: Vec<&str> = fields[name_idx + 2..].to_vec();

    let mut postcode: Option<String> = None;
    if rest.last().map(|l| POSTCODE.is_match(l)).unwrap_or(false) {
        postcode = rest.pop().map(|s| s.to_string());
    } else if rest.is_empty() {
        if let Some((head, pc)) = split_trailing_postcode(&address) {
            address = head;
            postcode = Some(pc);
        }
    }

    let address2 = if rest.is_empty() {
        None
    } else {
        Some(rest.join(", "))
    };

    Ok(ExtractedRecord {
        elector_number: elector_number.to_string(),
        marker,
        elector_marker_type,
        name: name.to_string(),
        address,
        address2,
        postcode,
    })
}

/// Reads every line by splitting it on wide gaps (two or more whitespaces).
///
/// The first column is the elector number. The second one is either a marker
/// (a date or one to three capital letters) or the start of the name. The name
/// and the address follow.
pub fn parse_heuristic(lines: &[String]) -> ExtractionResult {
    run_grammar(lines, LineGrammar::Heuristic, parse_heuristic_line)
}

/// Extracts the register records from lines of text.
///
/// Lines that cannot be read are skipped and reported in the result, they never
/// make the extraction fail. With the fallback strategy, the column heuristic is
/// only tried when the strict grammar finds nothing.
pub fn parse_lines(lines: &[String], strategy: LineStrategy) -> ExtractionResult {
    let res = match strategy {
        LineStrategy::StrictOnly => parse_strict(lines),
        LineStrategy::HeuristicOnly => parse_heuristic(lines),
        LineStrategy::StrictThenHeuristic => {
            let strict = parse_strict(lines);
            if strict.records.is_empty() {
                debug!("parse_lines: strict grammar found no record, trying the column heuristic");
                parse_heuristic(lines)
            } else {
                strict
            }
        }
    };
    info!(
        "parse_lines: {} record(s), {} skipped line(s), grammar: {:?}",
        res.records.len(),
        res.unparsed(),
        res.grammar
    );
    res
}

use once_cell::sync::Lazy;
use regex::Regex;

pub const DEFAULT_MARKER_DESCRIPTION: &str = "Eligible for all local elections";

// An attainer marker carries the date at which the elector becomes eligible.
static DATE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\d{2}/\d{2}/\d{4})").expect("valid date marker regex"));

static MARKER_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Z]{1,3}$").expect("valid marker code regex"));

/// The description of a single franchise code, if it is a known one.
pub fn marker_code_description(code: char) -> Option<&'static str> {
    match code {
        'F' => Some("Overseas voter – Parliamentary only"),
        'G' => Some("EU citizen – local elections only"),
        'B' => Some("EU citizen (retained rights/qualifying)"),
        'L' => Some("Peer – local elections only"),
        'M' => Some("Qualifying foreign citizen – local elections only"),
        'N' => Some("Attainer (not yet voting age)"),
        _ => None,
    }
}

/// True if the value starts with a `DD/MM/YYYY` date.
pub fn is_date_marker(value: &str) -> bool {
    DATE_MARKER.is_match(value.trim())
}

/// True if the value is a compact marker code: one to three uppercase letters.
pub fn is_marker_code(value: &str) -> bool {
    MARKER_CODE.is_match(value)
}

/// Turns a raw franchise marker into a human-readable description.
///
/// - no marker: the elector can vote in all local elections
/// - a leading `DD/MM/YYYY` date: an attainer, eligible from that date
/// - otherwise every character is a separate code, described in order
///
/// Whitespace is ignored and the codes are read case-insensitively.
/// This function never fails: unknown codes are reported as `Unknown (X)`.
pub fn decode_marker(marker_raw: Option<&str>) -> String {
    let cleaned: String = marker_raw
        .unwrap_or("")
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if cleaned.is_empty() {
        return DEFAULT_MARKER_DESCRIPTION.to_string();
    }

    if let Some(caps) = DATE_MARKER.captures(&cleaned) {
        return format!("Will become eligible to vote on {}", &caps[1]);
    }

    let descriptions: Vec<String> = cleaned
        .chars()
        .map(|c| match marker_code_description(c) {
            Some(d) => d.to_string(),
            None => format!("Unknown ({})", c),
        })
        .collect();
    descriptions.join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_codes() {
        let expected = [
            ('F', "Overseas voter – Parliamentary only"),
            ('G', "EU citizen – local elections only"),
            ('B', "EU citizen (retained rights/qualifying)"),
            ('L', "Peer – local elections only"),
            ('M', "Qualifying foreign citizen – local elections only"),
            ('N', "Attainer (not yet voting age)"),
        ];
        for (code, description) in expected {
            assert_eq!(decode_marker(Some(&code.to_string())), description);
        }
    }

    #[test]
    fn unknown_code() {
        assert_eq!(decode_marker(Some("X")), "Unknown (X)");
        assert_eq!(
            decode_marker(Some("FX")),
            "Overseas voter – Parliamentary only, Unknown (X)"
        );
    }

    #[test]
    fn missing_marker_is_eligible_for_all() {
        assert_eq!(decode_marker(None), DEFAULT_MARKER_DESCRIPTION);
        assert_eq!(decode_marker(Some("")), DEFAULT_MARKER_DESCRIPTION);
        assert_eq!(decode_marker(Some("   ")), DEFAULT_MARKER_DESCRIPTION);
    }

    #[test]
    fn spaces_and_case_are_ignored() {
        let expected = "Overseas voter – Parliamentary only, EU citizen – local elections only";
        assert_eq!(decode_marker(Some("F G")), expected);
        assert_eq!(decode_marker(Some(" fg ")), expected);
    }

    #[test]
    fn repeated_codes_are_kept() {
        assert_eq!(
            decode_marker(Some("NN")),
            "Attainer (not yet voting age), Attainer (not yet voting age)"
        );
    }

    #[test]
    fn attainer_date() {
        assert_eq!(
            decode_marker(Some("01/06/2026")),
            "Will become eligible to vote on 01/06/2026"
        );
        // Not checked against the calendar.
        assert_eq!(
            decode_marker(Some("31/02/2026")),
            "Will become eligible to vote on 31/02/2026"
        );
    }

    #[test]
    fn classifiers() {
        assert!(is_date_marker("01/06/2026"));
        assert!(is_date_marker("01/06/2026 N"));
        assert!(!is_date_marker("1/6/2026"));
        assert!(is_marker_code("F"));
        assert!(is_marker_code("ABC"));
        assert!(!is_marker_code("ABCD"));
        assert!(!is_marker_code("fg"));
        assert!(!is_marker_code("DOE, JANE"));
    }
}

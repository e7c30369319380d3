use once_cell::sync::Lazy;
use regex::Regex;

use crate::config::*;

static LEADING_TOKEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\w+").expect("valid leading token regex"));

/// An assembled elector number and the polling district it belongs to.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ElectorNumber {
    pub number: String,
    pub polling_district: String,
}

/// The polling district embedded in a combined elector number: its leading word.
pub fn leading_district(elector_number: &str) -> String {
    LEADING_TOKEN
        .find(elector_number)
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Joins the three parts of an elector number. All parts are expected to be non-empty.
pub fn join_parts(
    prefix: &str,
    number: &str,
    suffix: &str,
    format: ElectorNumberFormat,
) -> String {
    match format {
        ElectorNumberFormat::CollapseRepeatedPrefix if prefix == number => {
            format!("{}.{}", prefix, suffix)
        }
        _ => format!("{}.{}.{}", prefix, number, suffix),
    }
}

/// The roles that prevent an elector number from being assembled.
///
/// Empty when either the combined column or all three parts are bound.
pub fn missing_elector_number_roles(role_map: &FieldRoleMap) -> Vec<FieldRole> {
    let parts = [
        FieldRole::PrefixPart,
        FieldRole::NumberPart,
        FieldRole::SuffixPart,
    ];
    if role_map.is_bound(FieldRole::FullElectorNumber) || role_map.missing(&parts).is_empty() {
        return vec![];
    }
    let mut missing = vec![FieldRole::FullElectorNumber];
    missing.extend(role_map.missing(&parts));
    missing
}

fn trimmed<'a>(
    role_map: &FieldRoleMap,
    record: &RawRecord<'a>,
    role: FieldRole,
) -> Option<&'a str> {
    role_map
        .get(role)
        .and_then(|f| record.get(f))
        .map(|s| s.trim())
}

/// Builds the elector number of a record.
///
/// A non-empty combined number is taken as is. Otherwise the prefix, number and
/// suffix are joined with dots; if one of them is empty the number is left empty,
/// but the prefix still gives the polling district.
pub fn assemble_elector_number(
    role_map: &FieldRoleMap,
    record: &RawRecord,
    format: ElectorNumberFormat,
) -> Result<ElectorNumber, NormalizeError> {
    if let Some(full) = trimmed(role_map, record, FieldRole::FullElectorNumber) {
        if !full.is_empty() {
            return Ok(ElectorNumber {
                number: full.to_string(),
                polling_district: leading_district(full),
            });
        }
    }

    let missing = missing_elector_number_roles(role_map);
    let all_parts_bound = role_map.is_bound(FieldRole::PrefixPart)
        && role_map.is_bound(FieldRole::NumberPart)
        && role_map.is_bound(FieldRole::SuffixPart);

    if all_parts_bound {
        let prefix = trimmed(role_map, record, FieldRole::PrefixPart).unwrap_or("");
        let number = trimmed(role_map, record, FieldRole::NumberPart).unwrap_or("");
        let suffix = trimmed(role_map, record, FieldRole::SuffixPart).unwrap_or("");
        let assembled = if prefix.is_empty() || number.is_empty() || suffix.is_empty() {
            String::new()
        } else {
            join_parts(prefix, number, suffix, format)
        };
        Ok(ElectorNumber {
            number: assembled,
            polling_district: prefix.to_string(),
        })
    } else if missing.is_empty() {
        // The combined column exists but is empty for this record.
        Ok(ElectorNumber::default())
    } else {
        Err(NormalizeError::MissingFields { roles: missing })
    }
}

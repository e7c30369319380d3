use log::debug;

use crate::config::*;

struct RoleRule {
    role: FieldRole,
    // Normalized names, by decreasing priority.
    candidates: &'static [&'static str],
}

// The order of resolution matters: a column bound to a role is not considered
// for the following roles, and a role bound by an earlier rule is not resolved
// again. Headers that can only be a combined number go first. The parts of the
// elector number come next, so that "Elector Number Prefix" is never taken for
// the number itself.
const RESOLUTION_RULES: [RoleRule; 12] = [
    RoleRule {
        role: FieldRole::FullElectorNumber,
        candidates: &["full elector number", "fullelectornumber", "elector id"],
    },
    RoleRule {
        role: FieldRole::PrefixPart,
        candidates: &["elector number prefix", "electornumberprefix", "prefix"],
    },
    RoleRule {
        role: FieldRole::SuffixPart,
        candidates: &["elector number suffix", "electornumbersuffix", "suffix"],
    },
    RoleRule {
        role: FieldRole::NumberPart,
        candidates: &["elector number", "electornumber", "elector no", "number"],
    },
    RoleRule {
        role: FieldRole::FullElectorNumber,
        candidates: &[
            "full elector number",
            "elector number",
            "electornumber",
            "elector id",
            "elector no",
        ],
    },
    RoleRule {
        role: FieldRole::MarkerDescription,
        candidates: &[
            "elector marker type",
            "electormarkertype",
            "marker type",
            "marker description",
            "franchise description",
        ],
    },
    RoleRule {
        role: FieldRole::Marker,
        candidates: &[
            "elector markers",
            "elector marker",
            "markers",
            "marker",
            "franchise",
        ],
    },
    RoleRule {
        role: FieldRole::PollingDistrict,
        candidates: &["polling district", "pollingdistrict"],
    },
    RoleRule {
        role: FieldRole::Name,
        candidates: &["name", "elector name", "full name", "names"],
    },
    RoleRule {
        role: FieldRole::Postcode,
        candidates: &["postcode", "post code", "postal code", "zip"],
    },
    RoleRule {
        role: FieldRole::Address2,
        candidates: &["address 2", "address2", "address line 2", "addressline2"],
    },
    RoleRule {
        role: FieldRole::Address1,
        candidates: &[
            "address 1",
            "address1",
            "address line 1",
            "addressline1",
            "address",
        ],
    },
];

/// Lowercase, `_` and `-` read as spaces, single spaces, no byte-order mark.
pub fn normalize_header(name: &str) -> String {
    name.trim_start_matches('\u{feff}')
        .to_lowercase()
        .replace(['_', '-'], " ")
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
}

fn fits(field: &str, candidate: &str, mode: MatchMode) -> bool {
    match mode {
        MatchMode::Substring => field.contains(candidate),
        MatchMode::Exact => field == candidate,
    }
}

fn find_field(
    fields: &[String],
    candidates: &[&str],
    taken: &FieldRoleMap,
    mode: MatchMode,
    order: MatchOrder,
) -> Option<usize> {
    let free = |idx: &usize| !taken.is_index_bound(*idx);
    match order {
        MatchOrder::FieldsFirst => fields
            .iter()
            .enumerate()
            .filter(|(idx, _)| free(idx))
            .find(|(_, f)| candidates.iter().any(|c| fits(f, c, mode)))
            .map(|(idx, _)| idx),
        MatchOrder::CandidatesFirst => candidates.iter().find_map(|c| {
            fields
                .iter()
                .enumerate()
                .filter(|(idx, _)| free(idx))
                .find(|(_, f)| fits(f, c, mode))
                .map(|(idx, _)| idx)
        }),
    }
}

/// Finds, for each role, the column of the schema that plays it.
///
/// The result only depends on the schema and on the matching mode and order
/// in the settings. A column is bound to at most one role.
pub fn resolve_columns(schema: &[String], settings: &NormalizeSettings) -> FieldRoleMap {
    let fields: Vec<String> = schema.iter().map(|s| normalize_header(s)).collect();
    let mut map = FieldRoleMap::default();
    for rule in RESOLUTION_RULES.iter() {
        if map.is_bound(rule.role) {
            continue;
        }
        if let Some(index) = find_field(
            &fields,
            rule.candidates,
            &map,
            settings.match_mode,
            settings.match_order,
        ) {
            map.bind(
                rule.role,
                BoundField {
                    name: schema[index].clone(),
                    index,
                },
            );
        }
    }

    // A single "Elector Number" column without prefix or suffix holds the whole number.
    if !map.is_bound(FieldRole::FullElectorNumber)
        && !map.is_bound(FieldRole::PrefixPart)
        && !map.is_bound(FieldRole::SuffixPart)
    {
        if let Some(field) = map.unbind(FieldRole::NumberPart) {
            map.bind(FieldRole::FullElectorNumber, field);
        }
    }

    debug!("resolve_columns: schema: {:?} roles: {:?}", schema, map);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn register_schema() -> Vec<String> {
        schema(&[
            "Elector Number Prefix",
            "Elector Number",
            "Elector Number Suffix",
            "Elector Markers",
            "Name",
            "Postcode",
            "Address 1",
        ])
    }

    #[test]
    fn split_elector_number_columns() {
        let map = resolve_columns(&register_schema(), &NormalizeSettings::DEFAULT_SETTINGS);
        assert_eq!(
            map.field_name(FieldRole::PrefixPart),
            Some("Elector Number Prefix")
        );
        assert_eq!(map.field_name(FieldRole::NumberPart), Some("Elector Number"));
        assert_eq!(
            map.field_name(FieldRole::SuffixPart),
            Some("Elector Number Suffix")
        );
        assert_eq!(map.field_name(FieldRole::FullElectorNumber), None);
        assert_eq!(map.field_name(FieldRole::Marker), Some("Elector Markers"));
        assert_eq!(map.field_name(FieldRole::Name), Some("Name"));
        assert_eq!(map.field_name(FieldRole::Postcode), Some("Postcode"));
        assert_eq!(map.field_name(FieldRole::Address1), Some("Address 1"));
        assert_eq!(map.field_name(FieldRole::Address2), None);
    }

    #[test]
    fn prefix_listed_after_number() {
        let s = schema(&[
            "Elector Number",
            "Elector Number Prefix",
            "Elector Number Suffix",
        ]);
        let map = resolve_columns(&s, &NormalizeSettings::DEFAULT_SETTINGS);
        assert_eq!(
            map.field_name(FieldRole::PrefixPart),
            Some("Elector Number Prefix")
        );
        assert_eq!(map.field_name(FieldRole::NumberPart), Some("Elector Number"));
    }

    #[test]
    fn full_and_split_number_columns() {
        let s = schema(&[
            "Full Elector Number",
            "Elector Number Prefix",
            "Elector Number",
            "Elector Number Suffix",
        ]);
        let map = resolve_columns(&s, &NormalizeSettings::DEFAULT_SETTINGS);
        assert_eq!(
            map.field_name(FieldRole::FullElectorNumber),
            Some("Full Elector Number")
        );
        assert_eq!(map.field_name(FieldRole::NumberPart), Some("Elector Number"));
        assert_eq!(
            map.field_name(FieldRole::PrefixPart),
            Some("Elector Number Prefix")
        );

        let s = schema(&["Elector Number", "Elector ID"]);
        let map = resolve_columns(&s, &NormalizeSettings::DEFAULT_SETTINGS);
        assert_eq!(map.field_name(FieldRole::FullElectorNumber), Some("Elector ID"));
        assert_eq!(map.field_name(FieldRole::NumberPart), Some("Elector Number"));
    }

    #[test]
    fn resolution_is_idempotent() {
        let s = register_schema();
        let first = resolve_columns(&s, &NormalizeSettings::DEFAULT_SETTINGS);
        let second = resolve_columns(&s, &NormalizeSettings::DEFAULT_SETTINGS);
        assert_eq!(first, second);
    }

    #[test]
    fn exact_mode() {
        let settings = NormalizeSettings {
            match_mode: MatchMode::Exact,
            ..NormalizeSettings::DEFAULT_SETTINGS
        };
        let map = resolve_columns(&register_schema(), &settings);
        assert_eq!(map.field_name(FieldRole::NumberPart), Some("Elector Number"));
        assert_eq!(map.field_name(FieldRole::Marker), Some("Elector Markers"));
        assert_eq!(map.field_name(FieldRole::Address1), Some("Address 1"));

        // "Home Address" is only found by substring.
        let s = schema(&["Home Address"]);
        assert_eq!(resolve_columns(&s, &settings).field_name(FieldRole::Address1), None);
        assert_eq!(
            resolve_columns(&s, &NormalizeSettings::DEFAULT_SETTINGS)
                .field_name(FieldRole::Address1),
            Some("Home Address")
        );
    }

    #[test]
    fn match_orders_can_disagree() {
        // "Franchise" comes first in the schema, "Marker" first in the candidates.
        let s = schema(&["Franchise", "Marker"]);
        let fields_first = resolve_columns(&s, &NormalizeSettings::DEFAULT_SETTINGS);
        assert_eq!(fields_first.field_name(FieldRole::Marker), Some("Franchise"));

        let settings = NormalizeSettings {
            match_order: MatchOrder::CandidatesFirst,
            ..NormalizeSettings::DEFAULT_SETTINGS
        };
        let candidates_first = resolve_columns(&s, &settings);
        assert_eq!(candidates_first.field_name(FieldRole::Marker), Some("Marker"));
    }

    #[test]
    fn single_number_column_is_the_full_number() {
        let s = schema(&["Elector No", "Markers", "Full Name", "Post Code", "Address"]);
        let map = resolve_columns(&s, &NormalizeSettings::DEFAULT_SETTINGS);
        assert_eq!(
            map.field_name(FieldRole::FullElectorNumber),
            Some("Elector No")
        );
        assert!(!map.is_bound(FieldRole::NumberPart));
        assert_eq!(map.field_name(FieldRole::Name), Some("Full Name"));
        assert_eq!(map.field_name(FieldRole::Postcode), Some("Post Code"));
        assert_eq!(map.field_name(FieldRole::Address1), Some("Address"));
    }

    #[test]
    fn address_lines_do_not_collide() {
        let s = schema(&["Address 2", "Address 1"]);
        let map = resolve_columns(&s, &NormalizeSettings::DEFAULT_SETTINGS);
        assert_eq!(map.field_name(FieldRole::Address1), Some("Address 1"));
        assert_eq!(map.field_name(FieldRole::Address2), Some("Address 2"));
    }

    #[test]
    fn normalized_output_schema() {
        let s: Vec<String> = OUTPUT_HEADER.iter().map(|s| s.to_string()).collect();
        let map = resolve_columns(&s, &NormalizeSettings::DEFAULT_SETTINGS);
        assert_eq!(
            map.field_name(FieldRole::FullElectorNumber),
            Some("ElectorNumber")
        );
        assert_eq!(
            map.field_name(FieldRole::MarkerDescription),
            Some("ElectorMarkerType")
        );
        assert_eq!(map.field_name(FieldRole::Marker), None);
        assert_eq!(
            map.field_name(FieldRole::PollingDistrict),
            Some("PollingDistrict")
        );
        assert_eq!(map.field_name(FieldRole::Address1), Some("Address1"));
        assert_eq!(map.field_name(FieldRole::Address2), Some("Address2"));
    }

    #[test]
    fn header_normalization() {
        assert_eq!(normalize_header("\u{feff}Elector_Number-Prefix "), "elector number prefix");
        assert_eq!(normalize_header("  Address   1"), "address 1");
    }

    #[test]
    fn empty_schema() {
        let map = resolve_columns(&[], &NormalizeSettings::DEFAULT_SETTINGS);
        assert_eq!(map, FieldRoleMap::default());
    }
}

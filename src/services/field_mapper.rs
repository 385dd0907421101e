//! Heuristic header-to-field matching for voter file imports
//!
//! Matches cleaned CSV headers against fixed keyword sets, one set per voter
//! field, in a fixed priority order; first match wins. This is a
//! convenience, not a validator: every automatic assignment can be
//! overridden by the user before submission.

use std::collections::BTreeMap;

use crate::types::{HeaderMapping, VoterField};

// Keyword sets, keyed on the uppercase-alphanumeric form of the header.
// Sourced from the column vocabularies of common state voter-file exports.
const EXTERNAL_ID_KEYWORDS: &[&str] = &[
    "REGNUMBER", "VOTERID", "STATEID", "VANID", "EXTERNALID", "ID", "LALISTID",
];
const FIRST_NAME_KEYWORDS: &[&str] = &["FIRSTNAME", "NAMEFIRST", "FNAME", "FIRST"];
const LAST_NAME_KEYWORDS: &[&str] = &["LASTNAME", "NAMELAST", "LNAME", "LAST"];
const MIDDLE_NAME_KEYWORDS: &[&str] = &["MIDDLENAME", "NAMEMID", "MNAME", "MID", "MI"];
const SUFFIX_KEYWORDS: &[&str] = &["SUFFIX", "NAMESUFFIX", "SFX"];
const AGE_KEYWORDS: &[&str] = &["AGE", "BIRTHYEAR", "DOB"];
const GENDER_KEYWORDS: &[&str] = &["GENDER", "SEX"];
const RACE_KEYWORDS: &[&str] = &["RACE", "ETHNICITY"];
const ADDRESS_KEYWORDS: &[&str] = &[
    "ADDRESS", "RESADDRESS1", "STREETADDRESS", "ADDR1", "RESIDENCEADDRESS", "STREET", "ADDRESS1",
];
const UNIT_KEYWORDS: &[&str] = &[
    "UNIT", "APT", "APARTMENT", "SUITE", "ADDRESS2", "RESADDRESS2", "ADDR2", "RESADDRESSLINE2",
];
const CITY_KEYWORDS: &[&str] = &["CITY", "RESCITY", "RESIDENCECITY"];
const STATE_KEYWORDS: &[&str] = &["STATE", "RESSTATE", "ST"];
const ZIP_KEYWORDS: &[&str] = &["ZIP", "ZIPCODE", "RESZIP", "POSTALCODE", "ZIP5"];
const PARTY_KEYWORDS: &[&str] = &["PARTY", "PARTYID", "POLITICALPARTY", "PARTYAFFILIATION"];

/// Result of a smart-mapping pass over a header row.
#[derive(Debug, Clone, PartialEq)]
pub struct SmartMapping {
    /// Cleaned header → assigned field. Unmatched headers are absent.
    pub mapping: HeaderMapping,
    /// Number of headers that resolved to a field.
    pub matched: usize,
}

/// Reduce a header to the uppercase-alphanumeric form used for keyword tests.
pub fn normalize_key(header: &str) -> String {
    header
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Match a single cleaned header against the keyword sets.
///
/// Checks run in priority order; a header matching several categories
/// resolves to the earliest-checked one. Phone is the one substring rule —
/// any header containing PHONE, MOBILE or CELL.
pub fn match_header(header: &str) -> Option<VoterField> {
    let key = normalize_key(header);
    if key.is_empty() {
        return None;
    }

    if EXTERNAL_ID_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::ExternalId)
    } else if FIRST_NAME_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::FirstName)
    } else if LAST_NAME_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::LastName)
    } else if MIDDLE_NAME_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::MiddleName)
    } else if SUFFIX_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::Suffix)
    } else if AGE_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::Age)
    } else if GENDER_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::Gender)
    } else if RACE_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::Race)
    } else if key.contains("PHONE") || key.contains("MOBILE") || key.contains("CELL") {
        Some(VoterField::Phone)
    } else if ADDRESS_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::Address)
    } else if UNIT_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::Unit)
    } else if CITY_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::City)
    } else if STATE_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::State)
    } else if ZIP_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::Zip)
    } else if PARTY_KEYWORDS.contains(&key.as_str()) {
        Some(VoterField::Party)
    } else {
        None
    }
}

/// Propose a mapping for a full ordered header row.
pub fn smart_map(headers: &[String]) -> SmartMapping {
    let mut mapping: HeaderMapping = BTreeMap::new();
    let mut matched = 0;

    for header in headers {
        if let Some(field) = match_header(header) {
            mapping.insert(header.clone(), field);
            matched += 1;
        }
    }

    SmartMapping { mapping, matched }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_normalize_key_strips_punctuation_and_uppercases() {
        assert_eq!(normalize_key("First Name"), "FIRSTNAME");
        assert_eq!(normalize_key("reg_number"), "REGNUMBER");
        assert_eq!(normalize_key("Zip-5"), "ZIP5");
    }

    #[test]
    fn test_external_id_keyword_set() {
        for h in ["Reg Number", "Voter ID", "VANID", "LA List ID", "id"] {
            assert_eq!(match_header(h), Some(VoterField::ExternalId), "{h}");
        }
    }

    #[test]
    fn test_phone_matches_by_substring() {
        assert_eq!(match_header("Home Phone"), Some(VoterField::Phone));
        assert_eq!(match_header("CellNumber"), Some(VoterField::Phone));
        assert_eq!(match_header("mobile_2"), Some(VoterField::Phone));
    }

    #[test]
    fn test_unmatched_header_is_none() {
        assert_eq!(match_header("Precinct Notes"), None);
        assert_eq!(match_header(""), None);
        assert_eq!(match_header("---"), None);
    }

    #[test]
    fn test_smart_map_counts_matches_and_omits_unmapped() {
        let result = smart_map(&headers(&[
            "First Name",
            "Last Name",
            "Voter ID",
            "Unmapped Column",
        ]));

        assert_eq!(result.matched, 3);
        assert_eq!(result.mapping.get("First Name"), Some(&VoterField::FirstName));
        assert_eq!(result.mapping.get("Last Name"), Some(&VoterField::LastName));
        assert_eq!(result.mapping.get("Voter ID"), Some(&VoterField::ExternalId));
        assert!(!result.mapping.contains_key("Unmapped Column"));
    }

    #[test]
    fn test_matched_count_equals_mapping_size() {
        let result = smart_map(&headers(&["AGE", "SEX", "RACE", "Precinct", "PARTY"]));
        assert_eq!(result.matched, result.mapping.len());
        assert_eq!(result.matched, 4);
    }

    #[test]
    fn test_priority_order_earliest_category_wins() {
        // "ID" sits in the external-id set and also contains no phone
        // substring; a crafted header matching both external id and phone
        // rules must resolve to the earlier category.
        assert_eq!(match_header("id"), Some(VoterField::ExternalId));
        // "STATE" is both a state keyword and a prefix of STATEID; exact
        // membership picks the right sets.
        assert_eq!(match_header("State"), Some(VoterField::State));
        assert_eq!(match_header("State ID"), Some(VoterField::ExternalId));
    }

    #[test]
    fn test_full_louisiana_style_header_row() {
        let result = smart_map(&headers(&[
            "Reg Number",
            "Name First",
            "Name Last",
            "Name Mid",
            "Res Address1",
            "Res City",
            "Res Zip",
            "Party",
            "Home Phone",
        ]));
        assert_eq!(result.matched, 9);
    }
}

//! Voter record types for CSV import functionality

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Target fields a CSV column can be mapped onto.
///
/// The wire names (camelCase) match the voter schema of the Canvass REST
/// backend, so a `HeaderMapping` can be serialized for preview output as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoterField {
    ExternalId,
    FirstName,
    LastName,
    MiddleName,
    Suffix,
    Age,
    Gender,
    Race,
    Phone,
    Address,
    Unit,
    City,
    State,
    Zip,
    Party,
}

impl VoterField {
    /// All fields in mapper priority order (earliest wins on multi-match).
    pub const ALL: [VoterField; 15] = [
        VoterField::ExternalId,
        VoterField::FirstName,
        VoterField::LastName,
        VoterField::MiddleName,
        VoterField::Suffix,
        VoterField::Age,
        VoterField::Gender,
        VoterField::Race,
        VoterField::Phone,
        VoterField::Address,
        VoterField::Unit,
        VoterField::City,
        VoterField::State,
        VoterField::Zip,
        VoterField::Party,
    ];

    /// Wire name, e.g. `externalId`.
    pub fn as_str(&self) -> &'static str {
        match self {
            VoterField::ExternalId => "externalId",
            VoterField::FirstName => "firstName",
            VoterField::LastName => "lastName",
            VoterField::MiddleName => "middleName",
            VoterField::Suffix => "suffix",
            VoterField::Age => "age",
            VoterField::Gender => "gender",
            VoterField::Race => "race",
            VoterField::Phone => "phone",
            VoterField::Address => "address",
            VoterField::Unit => "unit",
            VoterField::City => "city",
            VoterField::State => "state",
            VoterField::Zip => "zip",
            VoterField::Party => "party",
        }
    }

    /// Parse a wire name back into a field (used for CLI mapping overrides).
    pub fn parse(s: &str) -> Option<VoterField> {
        VoterField::ALL.iter().copied().find(|f| f.as_str() == s)
    }

    /// Human-readable label for mapping previews.
    pub fn label(&self) -> &'static str {
        match self {
            VoterField::ExternalId => "Voter ID (External)",
            VoterField::FirstName => "First Name",
            VoterField::LastName => "Last Name",
            VoterField::MiddleName => "Middle Name",
            VoterField::Suffix => "Suffix",
            VoterField::Age => "Age",
            VoterField::Gender => "Gender",
            VoterField::Race => "Race",
            VoterField::Phone => "Phone Number",
            VoterField::Address => "Street Address",
            VoterField::Unit => "Unit / Apt",
            VoterField::City => "City",
            VoterField::State => "State",
            VoterField::Zip => "Zip Code",
            VoterField::Party => "Party",
        }
    }
}

/// Mapping from a cleaned CSV header to its target field.
/// Headers absent from the map are ignored during row conversion.
pub type HeaderMapping = BTreeMap<String, VoterField>;

/// A partial voter record assembled from one CSV row.
///
/// Only mapped cells populate fields; everything else stays `None` and is
/// omitted from the submitted JSON. A draft with no populated field is
/// dropped before submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoterDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub middle_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suffix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub race: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub party: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
}

impl VoterDraft {
    /// Assign a raw cell value to `field`. Values are trimmed; empty values
    /// are dropped rather than stored as empty strings. Age must parse as an
    /// integer or the cell is dropped.
    pub fn set(&mut self, field: VoterField, raw: &str) {
        let value = raw.trim();
        if value.is_empty() {
            return;
        }
        match field {
            VoterField::Age => self.age = value.parse::<u32>().ok(),
            VoterField::ExternalId => self.external_id = Some(value.to_string()),
            VoterField::FirstName => self.first_name = Some(value.to_string()),
            VoterField::LastName => self.last_name = Some(value.to_string()),
            VoterField::MiddleName => self.middle_name = Some(value.to_string()),
            VoterField::Suffix => self.suffix = Some(value.to_string()),
            VoterField::Gender => self.gender = Some(value.to_string()),
            VoterField::Race => self.race = Some(value.to_string()),
            VoterField::Party => self.party = Some(value.to_string()),
            VoterField::Phone => self.phone = Some(value.to_string()),
            VoterField::Address => self.address = Some(value.to_string()),
            VoterField::Unit => self.unit = Some(value.to_string()),
            VoterField::City => self.city = Some(value.to_string()),
            VoterField::State => self.state = Some(value.to_string()),
            VoterField::Zip => self.zip = Some(value.to_string()),
        }
    }

    /// True when no field has been populated.
    pub fn is_empty(&self) -> bool {
        self.external_id.is_none()
            && self.first_name.is_none()
            && self.middle_name.is_none()
            && self.last_name.is_none()
            && self.suffix.is_none()
            && self.age.is_none()
            && self.gender.is_none()
            && self.race.is_none()
            && self.party.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.unit.is_none()
            && self.city.is_none()
            && self.state.is_none()
            && self.zip.is_none()
    }
}

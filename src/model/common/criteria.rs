use serde::{Deserialize, Serialize};

use super::profile::{Classification, Engagement};

/// The eligibility thresholds an admin can set when configuring an
/// election. Every field is optional; an absent field constrains nothing.
///
/// Field names stay camelCase on the wire for the existing admin UI.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EligibilityCriteria {
    /// Candidate must be a recurring tither.
    pub must_be_tither: Option<bool>,
    /// Candidate must be a recurring donor.
    pub must_be_donor: Option<bool>,
    /// Minimum attendance percentage.
    pub min_attendance: Option<u32>,
    /// Minimum whole months since joining the church.
    pub min_months_in_church: Option<u32>,
    /// Minimum engagement level.
    pub min_engagement: Option<Engagement>,
    /// Minimum attendance classification.
    pub min_classification: Option<Classification>,
    /// Minimum whole years since baptism.
    pub min_baptism_years: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_as_unconstrained() {
        let criteria: EligibilityCriteria = serde_json::from_str("{}").unwrap();
        assert_eq!(criteria, EligibilityCriteria::default());

        let criteria: EligibilityCriteria =
            serde_json::from_str(r#"{"mustBeTither": true, "minAttendance": 70}"#).unwrap();
        assert_eq!(criteria.must_be_tither, Some(true));
        assert_eq!(criteria.min_attendance, Some(70));
        assert_eq!(criteria.min_engagement, None);
    }
}

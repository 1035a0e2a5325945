//! Turns the raw roster plus the config's criteria into the frozen
//! candidate pool of an election instance.
//!
//! Evaluation happens exactly once, at election start; the resulting
//! snapshot is immutable for the lifetime of the instance.

use chrono::{DateTime, Utc};

use crate::model::{
    common::{AuxiliaryProfile, EligibilityCriteria, Regularity},
    db::{candidate::NewCandidate, member::Member},
    mongodb::Id,
};

/// Does this profile satisfy every *active* criterion?
///
/// Inactive (absent) criteria constrain nothing. Missing profile data
/// fails closed: it only disqualifies when the matching criterion is set.
pub fn is_eligible(profile: &AuxiliaryProfile, criteria: &EligibilityCriteria) -> bool {
    if criteria.must_be_tither == Some(true) && profile.tithing != Some(Regularity::Recurring) {
        return false;
    }
    if criteria.must_be_donor == Some(true) && profile.offering != Some(Regularity::Recurring) {
        return false;
    }
    if let Some(min) = criteria.min_attendance {
        if profile.attendance_percent < min {
            return false;
        }
    }
    if let Some(min) = criteria.min_months_in_church {
        if profile.months_in_church < min {
            return false;
        }
    }
    if let Some(min) = criteria.min_engagement {
        if !profile.engagement.is_some_and(|level| level >= min) {
            return false;
        }
    }
    if let Some(min) = criteria.min_classification {
        if !profile.classification.is_some_and(|class| class >= min) {
            return false;
        }
    }
    if let Some(min) = criteria.min_baptism_years {
        if !profile.baptism_years.is_some_and(|years| years >= min) {
            return false;
        }
    }
    true
}

/// Build the frozen candidate snapshot for a new election instance.
///
/// The same criteria apply to every position, so eligibility is evaluated
/// once per member and the survivors are replicated across positions. An
/// empty result is valid; the ballot for such a position is simply empty.
pub fn snapshot_candidates(
    election_id: Id,
    positions: &[String],
    members: &[Member],
    criteria: &EligibilityCriteria,
    now: DateTime<Utc>,
) -> Vec<NewCandidate> {
    let eligible: Vec<(&Member, AuxiliaryProfile)> = members
        .iter()
        .map(|member| {
            (
                member,
                AuxiliaryProfile::derive(&member.profile, member.joined_at, now),
            )
        })
        .filter(|(_, profile)| is_eligible(profile, criteria))
        .collect();

    debug!(
        "{} of {} roster members eligible",
        eligible.len(),
        members.len()
    );

    positions
        .iter()
        .flat_map(|position| {
            eligible.iter().map(|(member, profile)| NewCandidate {
                election_id,
                position: position.clone(),
                member_id: member.id,
                name: member.name.clone(),
                tithing_recurring: profile.tithing == Some(Regularity::Recurring),
                offering_recurring: profile.offering == Some(Regularity::Recurring),
                attendance_percent: profile.attendance_percent,
                months_in_church: profile.months_in_church,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use mongodb::bson::doc;

    use crate::model::common::{Classification, Engagement};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn profile(raw: mongodb::bson::Document) -> AuxiliaryProfile {
        AuxiliaryProfile::derive(&raw, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap(), now())
    }

    #[test]
    fn no_criteria_admits_everyone() {
        let criteria = EligibilityCriteria::default();
        assert!(is_eligible(&profile(doc! {}), &criteria));
    }

    #[test]
    fn tither_criterion_requires_recurring() {
        let criteria = EligibilityCriteria {
            must_be_tither: Some(true),
            ..Default::default()
        };
        assert!(is_eligible(
            &profile(doc! { "dizimistaType": "Recorrente (8-12)" }),
            &criteria
        ));
        assert!(!is_eligible(
            &profile(doc! { "dizimistaType": "Pontual (1-3)" }),
            &criteria
        ));
        // Missing data fails closed while the criterion is active.
        assert!(!is_eligible(&profile(doc! {}), &criteria));
    }

    #[test]
    fn inactive_criterion_ignores_missing_data() {
        let criteria = EligibilityCriteria {
            must_be_tither: Some(false),
            ..Default::default()
        };
        assert!(is_eligible(&profile(doc! {}), &criteria));
    }

    #[test]
    fn threshold_criteria_compare_inclusively() {
        let criteria = EligibilityCriteria {
            min_attendance: Some(70),
            min_months_in_church: Some(12),
            min_baptism_years: Some(5),
            ..Default::default()
        };
        let exact = profile(doc! { "totalPresenca": 70, "tempoBatismoAnos": 5 });
        assert!(is_eligible(&exact, &criteria));

        let short = profile(doc! { "totalPresenca": 69, "tempoBatismoAnos": 5 });
        assert!(!is_eligible(&short, &criteria));
    }

    #[test]
    fn ordered_level_criteria() {
        let criteria = EligibilityCriteria {
            min_engagement: Some(Engagement::Medium),
            min_classification: Some(Classification::Frequent),
            ..Default::default()
        };
        assert!(is_eligible(
            &profile(doc! { "engajamento": "Alto", "classificacao": "Frequente" }),
            &criteria
        ));
        assert!(!is_eligible(
            &profile(doc! { "engajamento": "Baixo", "classificacao": "Frequente" }),
            &criteria
        ));
        assert!(!is_eligible(
            &profile(doc! { "engajamento": "Alto", "classificacao": "Não Frequente" }),
            &criteria
        ));
        // Unparseable engagement fails closed.
        assert!(!is_eligible(
            &profile(doc! { "classificacao": "Frequente" }),
            &criteria
        ));
    }

    #[test]
    fn snapshot_replicates_survivors_across_positions() {
        let members = vec![
            Member::example("Ana", doc! { "dizimistaType": "recorrente" }),
            Member::example("Bruno", doc! {}),
        ];
        let criteria = EligibilityCriteria {
            must_be_tither: Some(true),
            ..Default::default()
        };
        let positions = vec!["Elder".to_string(), "Deacon".to_string()];

        let snapshot = snapshot_candidates(Id::new(), &positions, &members, &criteria, now());

        // Only Ana survives, once per position.
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.iter().all(|c| c.name == "Ana"));
        assert_eq!(snapshot[0].position, "Elder");
        assert_eq!(snapshot[1].position, "Deacon");
        assert!(snapshot.iter().all(|c| c.tithing_recurring));
    }

    #[test]
    fn empty_pool_is_valid() {
        let members = vec![Member::example("Bruno", doc! {})];
        let criteria = EligibilityCriteria {
            must_be_donor: Some(true),
            ..Default::default()
        };
        let positions = vec!["Elder".to_string()];

        let snapshot = snapshot_candidates(Id::new(), &positions, &members, &criteria, now());
        assert!(snapshot.is_empty());
    }
}

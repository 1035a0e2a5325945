//! Typed view of the free-form member profile.
//!
//! The wider app stores management data about each member as loosely-typed
//! strings ("Recorrente (8-12)", "não frequente", ...). Everything that
//! pattern-matches on those strings lives in this module; the rest of the
//! election engine only ever sees the typed [`AuxiliaryProfile`].

use chrono::{DateTime, Utc};
use mongodb::bson::{Bson, Document};
use serde::{Deserialize, Serialize};

/// How regularly a member gives (tithes or offerings).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Regularity {
    Punctual,
    Seasonal,
    Recurring,
}

/// Engagement level, ordered low to high.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engagement {
    Low,
    Medium,
    High,
}

/// Attendance classification, ordered.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Classification {
    NonFrequent,
    Frequent,
}

/// The derived, typed profile attributes the eligibility rules run on.
///
/// `None` means the underlying data was missing or unrecognisable; an
/// active criterion treats that as not meeting the criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuxiliaryProfile {
    pub tithing: Option<Regularity>,
    pub offering: Option<Regularity>,
    pub engagement: Option<Engagement>,
    pub classification: Option<Classification>,
    pub baptism_years: Option<u32>,
    pub attendance_percent: u32,
    pub months_in_church: u32,
}

impl AuxiliaryProfile {
    /// Derive a typed profile from the raw profile document and join date.
    pub fn derive(raw: &Document, joined_at: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        Self {
            tithing: raw.get("dizimistaType").and_then(parse_regularity),
            offering: raw.get("ofertanteType").and_then(parse_regularity),
            engagement: raw.get("engajamento").and_then(parse_engagement),
            classification: raw.get("classificacao").and_then(parse_classification),
            baptism_years: raw.get("tempoBatismoAnos").and_then(numeric),
            attendance_percent: raw.get("totalPresenca").and_then(numeric).unwrap_or(0),
            months_in_church: months_between(joined_at, now),
        }
    }
}

/// Whole months between two instants, using the app's 30-day month.
fn months_between(from: DateTime<Utc>, to: DateTime<Utc>) -> u32 {
    let days = (to - from).num_days();
    if days <= 0 {
        0
    } else {
        (days / 30) as u32
    }
}

fn parse_regularity(value: &Bson) -> Option<Regularity> {
    let value = lowercase_str(value)?;
    if value.contains("recorrente") {
        Some(Regularity::Recurring)
    } else if value.contains("sazonal") {
        Some(Regularity::Seasonal)
    } else if value.contains("pontual") {
        Some(Regularity::Punctual)
    } else {
        None
    }
}

fn parse_engagement(value: &Bson) -> Option<Engagement> {
    let value = lowercase_str(value)?;
    if value.contains("alto") {
        Some(Engagement::High)
    } else if value.contains("médio") || value.contains("medio") {
        Some(Engagement::Medium)
    } else if value.contains("baixo") {
        Some(Engagement::Low)
    } else {
        None
    }
}

fn parse_classification(value: &Bson) -> Option<Classification> {
    let value = lowercase_str(value)?;
    // "não frequente" contains "frequente", so check it first.
    if value.contains("não frequente") || value.contains("nao frequente") {
        Some(Classification::NonFrequent)
    } else if value.contains("frequente") {
        Some(Classification::Frequent)
    } else {
        None
    }
}

fn lowercase_str(value: &Bson) -> Option<String> {
    value.as_str().map(str::to_lowercase)
}

/// Numeric profile values arrive as ints, doubles, or digit strings
/// depending on which import produced them.
fn numeric(value: &Bson) -> Option<u32> {
    match value {
        Bson::Int32(n) if *n >= 0 => Some(*n as u32),
        Bson::Int64(n) if *n >= 0 => Some(*n as u32),
        Bson::Double(n) if *n >= 0.0 => Some(*n as u32),
        Bson::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use mongodb::bson::doc;

    fn date(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn regularity_matches_recorrente_variants() {
        let raw = doc! { "dizimistaType": "Recorrente (8-12)" };
        let profile = AuxiliaryProfile::derive(&raw, date(2020, 1, 1), date(2024, 1, 1));
        assert_eq!(profile.tithing, Some(Regularity::Recurring));

        let raw = doc! { "dizimistaType": "recorrente" };
        let profile = AuxiliaryProfile::derive(&raw, date(2020, 1, 1), date(2024, 1, 1));
        assert_eq!(profile.tithing, Some(Regularity::Recurring));
    }

    #[test]
    fn unknown_strings_derive_to_none() {
        let raw = doc! {
            "dizimistaType": "whenever",
            "engajamento": "unknown",
            "classificacao": 42,
        };
        let profile = AuxiliaryProfile::derive(&raw, date(2020, 1, 1), date(2024, 1, 1));
        assert_eq!(profile.tithing, None);
        assert_eq!(profile.engagement, None);
        assert_eq!(profile.classification, None);
    }

    #[test]
    fn non_frequente_is_not_mistaken_for_frequente() {
        let raw = doc! { "classificacao": "Não Frequente" };
        let profile = AuxiliaryProfile::derive(&raw, date(2020, 1, 1), date(2024, 1, 1));
        assert_eq!(profile.classification, Some(Classification::NonFrequent));

        let raw = doc! { "classificacao": "Frequente" };
        let profile = AuxiliaryProfile::derive(&raw, date(2020, 1, 1), date(2024, 1, 1));
        assert_eq!(profile.classification, Some(Classification::Frequent));
    }

    #[test]
    fn numeric_fields_accept_all_import_formats() {
        let raw = doc! {
            "tempoBatismoAnos": 7_i32,
            "totalPresenca": "85",
        };
        let profile = AuxiliaryProfile::derive(&raw, date(2020, 1, 1), date(2024, 1, 1));
        assert_eq!(profile.baptism_years, Some(7));
        assert_eq!(profile.attendance_percent, 85);

        let raw = doc! { "tempoBatismoAnos": 7.9_f64 };
        let profile = AuxiliaryProfile::derive(&raw, date(2020, 1, 1), date(2024, 1, 1));
        assert_eq!(profile.baptism_years, Some(7));
    }

    #[test]
    fn months_in_church_uses_thirty_day_months() {
        let profile =
            AuxiliaryProfile::derive(&doc! {}, date(2023, 1, 1), date(2023, 4, 1));
        assert_eq!(profile.months_in_church, 3);

        // A join date in the future counts as zero, not a panic.
        let profile =
            AuxiliaryProfile::derive(&doc! {}, date(2024, 1, 1), date(2023, 1, 1));
        assert_eq!(profile.months_in_church, 0);
    }

    #[test]
    fn ordering_of_levels() {
        assert!(Engagement::Low < Engagement::Medium);
        assert!(Engagement::Medium < Engagement::High);
        assert!(Classification::NonFrequent < Classification::Frequent);
    }
}

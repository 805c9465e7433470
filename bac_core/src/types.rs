//! Core domain types for the BAC tracker.
//!
//! This module defines the fundamental types used throughout the system:
//! - The user's physical profile (gender, weight)
//! - Logged beverages
//! - Measurement units and their lossy string parsing
//! - BAC severity levels

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ============================================================================
// Units and Gender
// ============================================================================

/// Biological gender, used to select the Widmark distribution ratio.
#[derive(Clone, Copy, Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    /// Lossy parse from a user- or wire-supplied string.
    ///
    /// Case-insensitive. Empty/whitespace means "not set". Any other
    /// unrecognized value maps to `Male` — the documented default ratio,
    /// never an error.
    pub fn parse(s: &str) -> Option<Gender> {
        let s = s.trim();
        if s.is_empty() {
            return None;
        }
        match s.to_lowercase().as_str() {
            "female" => Some(Gender::Female),
            _ => Some(Gender::Male),
        }
    }
}

impl<'de> Deserialize<'de> for Gender {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Gender::parse(&s).unwrap_or(Gender::Male))
    }
}

/// Body weight units. `Grams` is the explicit home of the original
/// "unrecognized unit means the value is already grams" fallthrough.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WeightUnit {
    Lb,
    Kg,
    Stone,
    Grams,
}

impl WeightUnit {
    /// Lossy parse: exact matches for the known units, anything else is
    /// taken as already-grams (no conversion).
    pub fn parse(s: &str) -> WeightUnit {
        match s {
            "lb" => WeightUnit::Lb,
            "kg" => WeightUnit::Kg,
            "stone" => WeightUnit::Stone,
            _ => WeightUnit::Grams,
        }
    }

    /// Canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            WeightUnit::Lb => "lb",
            WeightUnit::Kg => "kg",
            WeightUnit::Stone => "stone",
            WeightUnit::Grams => "g",
        }
    }
}

impl Default for WeightUnit {
    fn default() -> Self {
        WeightUnit::Lb
    }
}

impl Serialize for WeightUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for WeightUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(WeightUnit::parse(&s))
    }
}

/// Beverage volume units. `Ml` doubles as the no-conversion fallback for
/// unrecognized unit strings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VolumeUnit {
    Oz,
    Ml,
}

impl VolumeUnit {
    /// Lossy parse: `"oz"` exactly, anything else is taken as milliliters.
    pub fn parse(s: &str) -> VolumeUnit {
        match s {
            "oz" => VolumeUnit::Oz,
            _ => VolumeUnit::Ml,
        }
    }

    /// Canonical wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            VolumeUnit::Oz => "oz",
            VolumeUnit::Ml => "ml",
        }
    }
}

impl Default for VolumeUnit {
    fn default() -> Self {
        VolumeUnit::Oz
    }
}

impl Serialize for VolumeUnit {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for VolumeUnit {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(VolumeUnit::parse(&s))
    }
}

// ============================================================================
// Profile and Beverage
// ============================================================================

/// The user's physical profile.
///
/// A profile with no gender or a non-positive weight is "incomplete" and
/// yields BAC = 0 from the estimator rather than an error.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct UserProfile {
    #[serde(deserialize_with = "de_opt_gender")]
    pub gender: Option<Gender>,
    pub weight: f64,
    pub weight_unit: WeightUnit,
}

/// Treats an empty string the same as a missing field.
fn de_opt_gender<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<Option<Gender>, D::Error> {
    let s: Option<String> = Option::deserialize(deserializer)?;
    Ok(s.as_deref().and_then(Gender::parse))
}

impl UserProfile {
    /// True when the profile has everything the estimator needs.
    pub fn is_complete(&self) -> bool {
        self.gender.is_some() && self.weight > 0.0
    }

    /// Reject profiles that should never enter the store.
    ///
    /// The estimator itself tolerates anything; this is the caller-side
    /// numeric gate (finite, positive weight).
    pub fn validate(&self) -> Result<()> {
        if self.gender.is_none() {
            return Err(Error::InvalidInput("gender is required".into()));
        }
        if !self.weight.is_finite() || self.weight <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "weight must be a positive number, got {}",
                self.weight
            )));
        }
        Ok(())
    }
}

/// A single logged drink.
///
/// Immutable once created except for deletion. `consumed_time` may lie in
/// the past or the future; it is never validated against "now".
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Beverage {
    /// Unique, assigned at creation from a millisecond timestamp with a
    /// persisted high-water mark. Never reused.
    pub id: i64,
    pub amount: f64,
    #[serde(default)]
    pub volume_unit: VolumeUnit,
    pub abv: f64,
    pub consumed_time: DateTime<Utc>,
}

impl Beverage {
    /// Reject drinks that should never enter the store: non-finite or
    /// non-positive amount, ABV outside (0, 100].
    pub fn validate(&self) -> Result<()> {
        if !self.amount.is_finite() || self.amount <= 0.0 {
            return Err(Error::InvalidInput(format!(
                "amount must be a positive number, got {}",
                self.amount
            )));
        }
        if !self.abv.is_finite() || self.abv <= 0.0 || self.abv > 100.0 {
            return Err(Error::InvalidInput(format!(
                "abv must be between 0 and 100, got {}",
                self.abv
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Severity
// ============================================================================

/// Severity band for a BAC value.
///
/// The thresholds are fixed domain policy (the 0.08% legal intoxication
/// convention), deliberately not part of the configurable constants.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BacLevel {
    Safe,
    Caution,
    Danger,
}

impl BacLevel {
    pub fn from_bac(bac: f64) -> BacLevel {
        if bac >= 0.08 {
            BacLevel::Danger
        } else if bac >= 0.04 {
            BacLevel::Caution
        } else {
            BacLevel::Safe
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BacLevel::Safe => "safe",
            BacLevel::Caution => "caution",
            BacLevel::Danger => "danger",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_gender_parse_fallbacks() {
        assert_eq!(Gender::parse("female"), Some(Gender::Female));
        assert_eq!(Gender::parse("FEMALE"), Some(Gender::Female));
        assert_eq!(Gender::parse("male"), Some(Gender::Male));
        assert_eq!(Gender::parse("nonbinary"), Some(Gender::Male));
        assert_eq!(Gender::parse(""), None);
        assert_eq!(Gender::parse("   "), None);
    }

    #[test]
    fn test_weight_unit_parse_fallbacks() {
        assert_eq!(WeightUnit::parse("lb"), WeightUnit::Lb);
        assert_eq!(WeightUnit::parse("kg"), WeightUnit::Kg);
        assert_eq!(WeightUnit::parse("stone"), WeightUnit::Stone);
        // Unknown and wrong-case strings mean the value is already grams
        assert_eq!(WeightUnit::parse("LB"), WeightUnit::Grams);
        assert_eq!(WeightUnit::parse("pounds"), WeightUnit::Grams);
        assert_eq!(WeightUnit::parse(""), WeightUnit::Grams);
    }

    #[test]
    fn test_volume_unit_parse_fallbacks() {
        assert_eq!(VolumeUnit::parse("oz"), VolumeUnit::Oz);
        assert_eq!(VolumeUnit::parse("ml"), VolumeUnit::Ml);
        assert_eq!(VolumeUnit::parse("liters"), VolumeUnit::Ml);
    }

    #[test]
    fn test_profile_completeness() {
        let profile = UserProfile {
            gender: Some(Gender::Male),
            weight: 180.0,
            weight_unit: WeightUnit::Lb,
        };
        assert!(profile.is_complete());
        assert!(profile.validate().is_ok());

        let no_gender = UserProfile {
            gender: None,
            ..profile.clone()
        };
        assert!(!no_gender.is_complete());
        assert!(no_gender.validate().is_err());

        let zero_weight = UserProfile {
            weight: 0.0,
            ..profile.clone()
        };
        assert!(!zero_weight.is_complete());
        assert!(zero_weight.validate().is_err());

        let nan_weight = UserProfile {
            weight: f64::NAN,
            ..profile
        };
        assert!(nan_weight.validate().is_err());
    }

    #[test]
    fn test_beverage_validate() {
        let drink = Beverage {
            id: 1,
            amount: 12.0,
            volume_unit: VolumeUnit::Oz,
            abv: 5.0,
            consumed_time: Utc::now(),
        };
        assert!(drink.validate().is_ok());

        let mut bad = drink.clone();
        bad.amount = -1.0;
        assert!(bad.validate().is_err());

        let mut bad = drink.clone();
        bad.abv = 0.0;
        assert!(bad.validate().is_err());

        let mut bad = drink.clone();
        bad.abv = 120.0;
        assert!(bad.validate().is_err());

        let mut bad = drink;
        bad.amount = f64::INFINITY;
        assert!(bad.validate().is_err());
    }

    #[test]
    fn test_deserializes_original_wire_shape() {
        // camelCase keys, RFC 3339 time, uppercase gender, unknown unit
        let json = r#"{
            "gender": "Female",
            "weight": 150.0,
            "weightUnit": "pounds"
        }"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.gender, Some(Gender::Female));
        assert_eq!(profile.weight_unit, WeightUnit::Grams);

        let json = r#"{
            "id": 1736553600000,
            "amount": 12.0,
            "volumeUnit": "oz",
            "abv": 5.0,
            "consumedTime": "2025-01-11T00:00:00Z"
        }"#;
        let drink: Beverage = serde_json::from_str(json).unwrap();
        assert_eq!(drink.id, 1736553600000);
        assert_eq!(drink.volume_unit, VolumeUnit::Oz);
        assert_eq!(
            drink.consumed_time,
            Utc.with_ymd_and_hms(2025, 1, 11, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_empty_gender_deserializes_as_none() {
        let json = r#"{"gender": "", "weight": 70.0, "weightUnit": "kg"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.gender, None);

        let json = r#"{"weight": 70.0, "weightUnit": "kg"}"#;
        let profile: UserProfile = serde_json::from_str(json).unwrap();
        assert_eq!(profile.gender, None);
    }

    #[test]
    fn test_bac_level_boundaries() {
        assert_eq!(BacLevel::from_bac(0.0), BacLevel::Safe);
        assert_eq!(BacLevel::from_bac(0.039999), BacLevel::Safe);
        assert_eq!(BacLevel::from_bac(0.04), BacLevel::Caution);
        assert_eq!(BacLevel::from_bac(0.079999), BacLevel::Caution);
        assert_eq!(BacLevel::from_bac(0.08), BacLevel::Danger);
        assert_eq!(BacLevel::from_bac(0.3), BacLevel::Danger);
    }

    #[test]
    fn test_bac_level_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&BacLevel::Caution).unwrap(),
            "\"caution\""
        );
    }
}

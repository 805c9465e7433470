//! BAC estimation engine.
//!
//! The estimator is a pure, synchronous computation over a caller-supplied
//! profile and drink log. It never fails on malformed domain input: an
//! incomplete profile or an empty log yields 0, unknown units and genders
//! take their documented fallbacks at the parse boundary (see `types`).
//!
//! Every numeric policy constant lives in [`BacConstants`] so tests and
//! configuration can substitute alternates without touching the logic.
//! Severity thresholds are the one exception: they are fixed domain policy
//! and live on [`BacLevel`].

use crate::{BacLevel, Beverage, Gender, UserProfile, VolumeUnit, WeightUnit};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Numeric constants for the Widmark BAC formula.
///
/// Deserializable with per-field defaults, so a partial `[estimator]` table
/// in the config file overrides only what it names.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BacConstants {
    /// Assumed constant metabolization rate, in BAC percent per hour.
    pub elimination_rate: f64,
    /// Density of ethanol, g/ml.
    pub alcohol_density: f64,
    /// Widmark body-water distribution ratio for males.
    pub male_distribution_ratio: f64,
    /// Widmark body-water distribution ratio for females.
    pub female_distribution_ratio: f64,
    pub ml_per_fluid_ounce: f64,
    pub grams_per_pound: f64,
    pub grams_per_kilogram: f64,
    pub grams_per_stone: f64,
    /// Lag between consumption and metabolism starting, in hours.
    ///
    /// The canonical formula has no delay; setting this to 0.75 reproduces
    /// the absorption-delay variant.
    pub absorption_delay_hours: f64,
}

impl Default for BacConstants {
    fn default() -> Self {
        Self {
            elimination_rate: 0.016,
            alcohol_density: 0.789,
            male_distribution_ratio: 0.68,
            female_distribution_ratio: 0.55,
            ml_per_fluid_ounce: 29.5735,
            grams_per_pound: 453.592,
            grams_per_kilogram: 1000.0,
            grams_per_stone: 6350.29,
            absorption_delay_hours: 0.0,
        }
    }
}

/// The BAC estimator. Holds the injected constants; all methods are pure.
#[derive(Clone, Debug, Default)]
pub struct Estimator {
    constants: BacConstants,
}

/// Everything a front end needs to render the current status.
///
/// Serialized shape is the JSON contract: `bac` (3-decimal string),
/// `timeToZero`, `bacLevel`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BacReport {
    pub bac: String,
    pub time_to_zero: String,
    pub bac_level: BacLevel,
}

impl Estimator {
    pub fn new(constants: BacConstants) -> Self {
        Self { constants }
    }

    pub fn constants(&self) -> &BacConstants {
        &self.constants
    }

    /// Estimate the combined BAC percentage at this moment.
    pub fn calculate_bac(&self, profile: Option<&UserProfile>, beverages: &[Beverage]) -> f64 {
        self.calculate_bac_at(profile, beverages, Utc::now())
    }

    /// Estimate the combined BAC percentage at a pinned evaluation time.
    ///
    /// Each drink contributes independently and its contribution never goes
    /// negative, so a long-metabolized drink cannot cancel a fresh one.
    /// A drink with a future `consumed_time` contributes its full initial
    /// BAC undiminished (elapsed time is clamped to zero).
    pub fn calculate_bac_at(
        &self,
        profile: Option<&UserProfile>,
        beverages: &[Beverage],
        now: DateTime<Utc>,
    ) -> f64 {
        let profile = match profile {
            Some(p) if p.is_complete() => p,
            _ => return 0.0,
        };
        if beverages.is_empty() {
            return 0.0;
        }

        let c = &self.constants;

        let weight_grams = match profile.weight_unit {
            WeightUnit::Lb => profile.weight * c.grams_per_pound,
            WeightUnit::Kg => profile.weight * c.grams_per_kilogram,
            WeightUnit::Stone => profile.weight * c.grams_per_stone,
            WeightUnit::Grams => profile.weight,
        };

        let r = match profile.gender {
            Some(Gender::Female) => c.female_distribution_ratio,
            _ => c.male_distribution_ratio,
        };

        let mut total_bac = 0.0;
        for beverage in beverages {
            let volume_ml = match beverage.volume_unit {
                VolumeUnit::Oz => beverage.amount * c.ml_per_fluid_ounce,
                VolumeUnit::Ml => beverage.amount,
            };

            let alcohol_grams = volume_ml * (beverage.abv / 100.0) * c.alcohol_density;
            let initial_bac = alcohol_grams / (weight_grams * r) * 100.0;

            let elapsed_hours =
                (now - beverage.consumed_time).num_milliseconds() as f64 / 3_600_000.0;
            let effective_hours = (elapsed_hours - c.absorption_delay_hours).max(0.0);

            let net = (initial_bac - c.elimination_rate * effective_hours).max(0.0);
            tracing::debug!(
                beverage_id = beverage.id,
                initial_bac,
                effective_hours,
                net,
                "drink contribution"
            );
            total_bac += net;
        }

        // Round to 3 decimals, floor at 0. NaN from invalid caller input
        // degrades to 0 through the max rather than poisoning the result.
        ((total_bac * 1000.0).round() / 1000.0).max(0.0)
    }

    /// Human-readable time until the given BAC metabolizes to zero.
    ///
    /// Zero, negative, or NaN input returns the `"N/A"` sentinel. Rounding
    /// policy is ceiling-minutes: a positive BAC always yields at least one
    /// minute.
    pub fn estimate_time_to_zero(&self, current_bac: f64) -> String {
        if current_bac.is_nan() || current_bac <= 0.0 {
            return "N/A".to_string();
        }

        let hours_to_zero = current_bac / self.constants.elimination_rate;
        let total_minutes = (hours_to_zero * 60.0).ceil() as i64;

        let hours = total_minutes / 60;
        let minutes = total_minutes % 60;

        let mut segments = Vec::with_capacity(2);
        if hours > 0 {
            segments.push(format!("{} hour{}", hours, if hours == 1 { "" } else { "s" }));
        }
        if minutes > 0 {
            segments.push(format!(
                "{} minute{}",
                minutes,
                if minutes == 1 { "" } else { "s" }
            ));
        }
        segments.join(" ")
    }

    /// Bundle BAC, time-to-zero, and severity for the current moment.
    pub fn report(&self, profile: Option<&UserProfile>, beverages: &[Beverage]) -> BacReport {
        self.report_at(profile, beverages, Utc::now())
    }

    /// As [`Estimator::report`], with a pinned evaluation time.
    pub fn report_at(
        &self,
        profile: Option<&UserProfile>,
        beverages: &[Beverage],
        now: DateTime<Utc>,
    ) -> BacReport {
        let bac = self.calculate_bac_at(profile, beverages, now);
        BacReport {
            bac: format_bac(bac),
            time_to_zero: self.estimate_time_to_zero(bac),
            bac_level: BacLevel::from_bac(bac),
        }
    }
}

/// Three-decimal display form of a BAC value.
pub fn format_bac(bac: f64) -> String {
    format!("{:.3}", bac)
}

//! Alert classification.
//!
//! Maps a person count onto a crowd status, a severity tier and a fixed
//! advisory. The mapping is a pure function of the count: no state is kept
//! between calls and the same count always yields the same record.
//!
//! Two policies exist:
//! - `ClassificationMode::Tiered` (default): four tiers, NONE through CRITICAL.
//! - `ClassificationMode::Legacy`: the older two-way CROWDED/NORMAL split at
//!   `> 5`. It has its own result type and is never folded into the tiered
//!   record.

use anyhow::{anyhow, Result};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Counts strictly above this are VERY CROWDED.
pub const CRITICAL_ABOVE: u64 = 10;
/// Counts strictly above this are at least CROWDED.
pub const HIGH_ABOVE: u64 = 5;
/// Counts strictly above this are at least NORMAL.
pub const LOW_ABOVE: u64 = 2;

// ----------------------------------------------------------------------------
// PersonCount: validated boundary type
// ----------------------------------------------------------------------------

/// Number of "person" detections in a scene.
///
/// Non-negative by construction. Signed input from the outside world goes
/// through `TryFrom<i64>`, which rejects negative values instead of
/// reclassifying them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PersonCount(u64);

impl PersonCount {
    pub const fn new(count: u64) -> Self {
        Self(count)
    }

    pub const fn get(self) -> u64 {
        self.0
    }
}

impl From<u32> for PersonCount {
    fn from(count: u32) -> Self {
        Self(u64::from(count))
    }
}

impl From<u64> for PersonCount {
    fn from(count: u64) -> Self {
        Self(count)
    }
}

impl TryFrom<i64> for PersonCount {
    type Error = anyhow::Error;

    fn try_from(value: i64) -> Result<Self> {
        let count = u64::try_from(value)
            .map_err(|_| anyhow!("person count must be non-negative, got {}", value))?;
        Ok(Self(count))
    }
}

impl TryFrom<usize> for PersonCount {
    type Error = anyhow::Error;

    fn try_from(value: usize) -> Result<Self> {
        let count = u64::try_from(value)
            .map_err(|_| anyhow!("person count {} is out of range", value))?;
        Ok(Self(count))
    }
}

impl FromStr for PersonCount {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if let Ok(count) = s.parse::<u64>() {
            return Ok(Self(count));
        }
        match s.parse::<i64>() {
            Ok(raw) => Self::try_from(raw),
            Err(_) => Err(anyhow!("person count must be a non-negative integer, got '{}'", s)),
        }
    }
}

impl fmt::Display for PersonCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ----------------------------------------------------------------------------
// Tiers
// ----------------------------------------------------------------------------

/// Severity tier. Ordered by severity: `None < Low < High < Critical`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlertLevel {
    None,
    Low,
    High,
    Critical,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::None => "NONE",
            AlertLevel::Low => "LOW",
            AlertLevel::High => "HIGH",
            AlertLevel::Critical => "CRITICAL",
        }
    }

    /// Fixed advisory text for this tier.
    pub fn recommended_action(self) -> &'static str {
        match self {
            AlertLevel::None => "Area is clear",
            AlertLevel::Low => "Everything is fine",
            AlertLevel::High => "Monitor area carefully",
            AlertLevel::Critical => "Evacuate area immediately",
        }
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for AlertLevel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Human-readable crowd status.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CrowdStatus {
    Empty,
    Normal,
    Crowded,
    VeryCrowded,
}

impl CrowdStatus {
    pub fn label(self) -> &'static str {
        match self {
            CrowdStatus::Empty => "EMPTY",
            CrowdStatus::Normal => "NORMAL",
            CrowdStatus::Crowded => "CROWDED",
            CrowdStatus::VeryCrowded => "VERY CROWDED",
        }
    }
}

impl fmt::Display for CrowdStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for CrowdStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

// ----------------------------------------------------------------------------
// Tiered classification
// ----------------------------------------------------------------------------

/// Result of the four-tier policy.
///
/// Fields are read-only outside this module; the only constructor is
/// `classify`, so status, level and action always agree with the count.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AlertClassification {
    person_count: PersonCount,
    #[serde(rename = "status_label")]
    status: CrowdStatus,
    alert_level: AlertLevel,
    recommended_action: &'static str,
}

impl AlertClassification {
    pub fn person_count(&self) -> PersonCount {
        self.person_count
    }

    pub fn status(&self) -> CrowdStatus {
        self.status
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }

    pub fn alert_level(&self) -> AlertLevel {
        self.alert_level
    }

    pub fn recommended_action(&self) -> &'static str {
        self.recommended_action
    }
}

/// Classify a person count with the four-tier policy.
///
/// Thresholds are checked highest first; the first match wins.
pub fn classify(person_count: PersonCount) -> AlertClassification {
    let n = person_count.get();
    let (status, alert_level) = if n > CRITICAL_ABOVE {
        (CrowdStatus::VeryCrowded, AlertLevel::Critical)
    } else if n > HIGH_ABOVE {
        (CrowdStatus::Crowded, AlertLevel::High)
    } else if n > LOW_ABOVE {
        (CrowdStatus::Normal, AlertLevel::Low)
    } else {
        (CrowdStatus::Empty, AlertLevel::None)
    };
    AlertClassification {
        person_count,
        status,
        alert_level,
        recommended_action: alert_level.recommended_action(),
    }
}

// ----------------------------------------------------------------------------
// Legacy two-way classification
// ----------------------------------------------------------------------------

/// Result of the legacy CROWDED/NORMAL split.
///
/// Carries no alert level or advisory; those only exist in the tiered policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LegacyClassification {
    person_count: PersonCount,
    #[serde(rename = "status_label")]
    status: CrowdStatus,
}

impl LegacyClassification {
    pub fn person_count(&self) -> PersonCount {
        self.person_count
    }

    pub fn status(&self) -> CrowdStatus {
        self.status
    }

    pub fn status_label(&self) -> &'static str {
        self.status.label()
    }
}

pub fn classify_legacy(person_count: PersonCount) -> LegacyClassification {
    let status = if person_count.get() > HIGH_ABOVE {
        CrowdStatus::Crowded
    } else {
        CrowdStatus::Normal
    };
    LegacyClassification {
        person_count,
        status,
    }
}

// ----------------------------------------------------------------------------
// Mode selection
// ----------------------------------------------------------------------------

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ClassificationMode {
    #[default]
    Tiered,
    Legacy,
}

impl ClassificationMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ClassificationMode::Tiered => "tiered",
            ClassificationMode::Legacy => "legacy",
        }
    }

    pub fn classify(self, person_count: PersonCount) -> Classification {
        match self {
            ClassificationMode::Tiered => Classification::Tiered(classify(person_count)),
            ClassificationMode::Legacy => Classification::Legacy(classify_legacy(person_count)),
        }
    }
}

impl FromStr for ClassificationMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "tiered" => Ok(ClassificationMode::Tiered),
            "legacy" => Ok(ClassificationMode::Legacy),
            other => Err(anyhow!(
                "unknown classification mode '{}'; expected tiered or legacy",
                other
            )),
        }
    }
}

/// Outcome of either policy.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum Classification {
    Tiered(AlertClassification),
    Legacy(LegacyClassification),
}

impl Classification {
    pub fn person_count(&self) -> PersonCount {
        match self {
            Classification::Tiered(c) => c.person_count(),
            Classification::Legacy(c) => c.person_count(),
        }
    }

    pub fn status(&self) -> CrowdStatus {
        match self {
            Classification::Tiered(c) => c.status(),
            Classification::Legacy(c) => c.status(),
        }
    }

    pub fn alert_level(&self) -> Option<AlertLevel> {
        match self {
            Classification::Tiered(c) => Some(c.alert_level()),
            Classification::Legacy(_) => None,
        }
    }

    pub fn recommended_action(&self) -> Option<&'static str> {
        match self {
            Classification::Tiered(c) => Some(c.recommended_action()),
            Classification::Legacy(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tier(n: u64) -> (AlertLevel, &'static str) {
        let c = classify(PersonCount::new(n));
        (c.alert_level(), c.status_label())
    }

    #[test]
    fn ranges_map_to_expected_tiers() {
        for n in 0..=2 {
            assert_eq!(tier(n), (AlertLevel::None, "EMPTY"), "count {n}");
        }
        for n in 3..=5 {
            assert_eq!(tier(n), (AlertLevel::Low, "NORMAL"), "count {n}");
        }
        for n in 6..=10 {
            assert_eq!(tier(n), (AlertLevel::High, "CROWDED"), "count {n}");
        }
        for n in [11, 12, 50, 1_000, 5_000_000_000, u64::MAX] {
            assert_eq!(tier(n), (AlertLevel::Critical, "VERY CROWDED"), "count {n}");
        }
    }

    #[test]
    fn boundaries_are_exact() {
        assert_eq!(tier(2), (AlertLevel::None, "EMPTY"));
        assert_eq!(tier(3), (AlertLevel::Low, "NORMAL"));
        assert_eq!(tier(5), (AlertLevel::Low, "NORMAL"));
        assert_eq!(tier(6), (AlertLevel::High, "CROWDED"));
        assert_eq!(tier(10), (AlertLevel::High, "CROWDED"));
        assert_eq!(tier(11), (AlertLevel::Critical, "VERY CROWDED"));
    }

    #[test]
    fn actions_follow_level() {
        assert_eq!(classify(PersonCount::new(0)).recommended_action(), "Area is clear");
        assert_eq!(classify(PersonCount::new(4)).recommended_action(), "Everything is fine");
        assert_eq!(classify(PersonCount::new(8)).recommended_action(), "Monitor area carefully");
        assert_eq!(
            classify(PersonCount::new(20)).recommended_action(),
            "Evacuate area immediately"
        );
    }

    #[test]
    fn classification_is_deterministic() {
        for n in 0..40 {
            assert_eq!(classify(PersonCount::new(n)), classify(PersonCount::new(n)));
        }
    }

    #[test]
    fn level_never_decreases_as_count_rises() {
        let mut previous = AlertLevel::None;
        for n in 0..=64 {
            let level = classify(PersonCount::new(n)).alert_level();
            assert!(level >= previous, "level dropped at count {n}");
            previous = level;
        }
    }

    #[test]
    fn negative_counts_are_rejected() {
        assert!(PersonCount::try_from(-1i64).is_err());
        assert!("-3".parse::<PersonCount>().is_err());
        assert_eq!(PersonCount::try_from(7i64).unwrap().get(), 7);
        assert_eq!(" 12 ".parse::<PersonCount>().unwrap().get(), 12);
        assert!("many".parse::<PersonCount>().is_err());
    }

    #[test]
    fn counts_beyond_u32_are_accepted() {
        let count: PersonCount = "5000000000".parse().unwrap();
        assert_eq!(count.get(), 5_000_000_000);
        assert_eq!(classify(count).alert_level(), AlertLevel::Critical);
        assert_eq!(classify(count).status_label(), "VERY CROWDED");

        let largest = PersonCount::try_from(i64::MAX).unwrap();
        assert_eq!(classify(largest).alert_level(), AlertLevel::Critical);
        assert_eq!(
            "18446744073709551615".parse::<PersonCount>().unwrap().get(),
            u64::MAX
        );
    }

    #[test]
    fn legacy_mode_splits_at_five() {
        assert_eq!(classify_legacy(PersonCount::new(0)).status(), CrowdStatus::Normal);
        assert_eq!(classify_legacy(PersonCount::new(5)).status(), CrowdStatus::Normal);
        assert_eq!(classify_legacy(PersonCount::new(6)).status(), CrowdStatus::Crowded);
        assert_eq!(classify_legacy(PersonCount::new(30)).status(), CrowdStatus::Crowded);

        let outcome = ClassificationMode::Legacy.classify(PersonCount::new(30));
        assert_eq!(outcome.alert_level(), None);
        assert_eq!(outcome.recommended_action(), None);
    }

    #[test]
    fn serializes_with_labels() {
        let json = serde_json::to_value(classify(PersonCount::new(11))).unwrap();
        assert_eq!(json["person_count"], 11);
        assert_eq!(json["status_label"], "VERY CROWDED");
        assert_eq!(json["alert_level"], "CRITICAL");
        assert_eq!(json["recommended_action"], "Evacuate area immediately");

        let tagged =
            serde_json::to_value(ClassificationMode::Legacy.classify(PersonCount::new(2))).unwrap();
        assert_eq!(tagged["mode"], "legacy");
        assert_eq!(tagged["status_label"], "NORMAL");
    }

    #[test]
    fn mode_parses_case_insensitively() {
        assert_eq!("Tiered".parse::<ClassificationMode>().unwrap(), ClassificationMode::Tiered);
        assert_eq!("LEGACY".parse::<ClassificationMode>().unwrap(), ClassificationMode::Legacy);
        assert!("three-tier".parse::<ClassificationMode>().is_err());
    }
}

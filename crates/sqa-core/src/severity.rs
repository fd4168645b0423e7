//! Severity scales and normalization
//!
//! Passes report either a qualitative level or a 1-5 impact score. Both
//! normalize onto [`Severity`] through one fixed mapping:
//!
//! | Impact | Severity |
//! |--------|----------|
//! | 5, 4   | HIGH     |
//! | 3      | MEDIUM   |
//! | 2, 1   | LOW      |

use crate::error::SeverityError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Qualitative severity, ordered `Low < Medium < High`
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Informational
    #[serde(alias = "low", alias = "Low")]
    Low,
    /// Should be fixed
    #[default]
    #[serde(alias = "medium", alias = "Medium")]
    Medium,
    /// Must be fixed
    #[serde(alias = "high", alias = "High")]
    High,
}

impl Severity {
    /// Uppercase name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = SeverityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "LOW" => Ok(Self::Low),
            "MEDIUM" => Ok(Self::Medium),
            "HIGH" => Ok(Self::High),
            _ => Err(SeverityError::UnknownLevel(s.to_string())),
        }
    }
}

/// Impact score in `1..=5`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct ImpactScore(u8);

impl ImpactScore {
    /// Create a score, rejecting values outside `1..=5`
    ///
    /// # Errors
    ///
    /// Returns [`SeverityError::ImpactOutOfRange`] for 0 or anything above 5.
    pub fn new(score: u8) -> Result<Self, SeverityError> {
        if (1..=5).contains(&score) {
            Ok(Self(score))
        } else {
            Err(SeverityError::ImpactOutOfRange(score))
        }
    }

    /// Raw score
    #[inline]
    #[must_use]
    pub fn get(self) -> u8 {
        self.0
    }

    /// Normalized severity
    #[must_use]
    pub fn severity(self) -> Severity {
        match self.0 {
            4 | 5 => Severity::High,
            3 => Severity::Medium,
            _ => Severity::Low,
        }
    }
}

impl TryFrom<u8> for ImpactScore {
    type Error = SeverityError;

    fn try_from(score: u8) -> Result<Self, Self::Error> {
        Self::new(score)
    }
}

impl From<ImpactScore> for u8 {
    fn from(score: ImpactScore) -> Self {
        score.0
    }
}

/// Severity as a pass reported it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportedSeverity {
    /// Qualitative level, passed through unchanged
    Level(Severity),
    /// Impact score, mapped through the fixed table
    Impact(ImpactScore),
}

impl ReportedSeverity {
    /// Normalized severity
    #[must_use]
    pub fn normalize(self) -> Severity {
        match self {
            Self::Level(level) => level,
            Self::Impact(score) => score.severity(),
        }
    }
}

impl Default for ReportedSeverity {
    fn default() -> Self {
        Self::Level(Severity::Medium)
    }
}

impl From<Severity> for ReportedSeverity {
    fn from(level: Severity) -> Self {
        Self::Level(level)
    }
}

impl From<ImpactScore> for ReportedSeverity {
    fn from(score: ImpactScore) -> Self {
        Self::Impact(score)
    }
}

impl fmt::Display for ReportedSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Level(level) => write!(f, "{level}"),
            Self::Impact(score) => write!(f, "{} (impact {})", score.severity(), score.get()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn impact_mapping_is_fixed() {
        let mapped: Vec<_> = (1..=5)
            .map(|s| ImpactScore::new(s).unwrap().severity())
            .collect();
        assert_eq!(
            mapped,
            vec![
                Severity::Low,
                Severity::Low,
                Severity::Medium,
                Severity::High,
                Severity::High
            ]
        );
    }

    #[test]
    fn impact_out_of_range_rejected() {
        assert_eq!(ImpactScore::new(0), Err(SeverityError::ImpactOutOfRange(0)));
        assert_eq!(ImpactScore::new(6), Err(SeverityError::ImpactOutOfRange(6)));
    }

    #[test]
    fn levels_parse_case_insensitively() {
        assert_eq!("high".parse::<Severity>(), Ok(Severity::High));
        assert_eq!(" Medium ".parse::<Severity>(), Ok(Severity::Medium));
        assert!("urgent".parse::<Severity>().is_err());
        assert!(Severity::High > Severity::Medium && Severity::Medium > Severity::Low);
    }

    #[test]
    fn reported_severity_display() {
        let impact = ReportedSeverity::from(ImpactScore::new(4).unwrap());
        assert_eq!(impact.to_string(), "HIGH (impact 4)");
        assert_eq!(ReportedSeverity::from(Severity::Low).normalize(), Severity::Low);
    }

    #[test]
    fn impact_serializes_as_number() {
        let json = serde_json::to_string(&ReportedSeverity::Impact(ImpactScore::new(3).unwrap()))
            .unwrap();
        assert_eq!(json, r#"{"impact":3}"#);
        assert!(serde_json::from_str::<ImpactScore>("9").is_err());
    }
}

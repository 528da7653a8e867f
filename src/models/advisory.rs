//! Activity advisory records

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AirwatchError;

/// Activities the advisory engine has a status vocabulary for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityType {
    Sport,
    Commute,
    Ventilation,
}

impl ActivityType {
    pub const ALL: [ActivityType; 3] = [
        ActivityType::Sport,
        ActivityType::Commute,
        ActivityType::Ventilation,
    ];

    #[must_use]
    pub fn key(self) -> &'static str {
        match self {
            ActivityType::Sport => "sport",
            ActivityType::Commute => "commute",
            ActivityType::Ventilation => "ventilation",
        }
    }

    #[must_use]
    pub fn display_name(self) -> &'static str {
        match self {
            ActivityType::Sport => "Outdoor Sport",
            ActivityType::Commute => "Commute",
            ActivityType::Ventilation => "Home Ventilation",
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ActivityType {
    type Err = AirwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sport" => Ok(ActivityType::Sport),
            "commute" => Ok(ActivityType::Commute),
            "ventilation" => Ok(ActivityType::Ventilation),
            _ => Err(AirwatchError::unsupported_activity(s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AdvisoryStatus {
    Go,
    Caution,
    Stop,
    Mask,
    Avoid,
    Open,
    Close,
}

impl AdvisoryStatus {
    /// Escalation level shared across activities: 0 proceed, 1 precaution, 2 refrain
    #[must_use]
    pub fn level(self) -> u8 {
        match self {
            AdvisoryStatus::Go | AdvisoryStatus::Open => 0,
            AdvisoryStatus::Caution | AdvisoryStatus::Mask => 1,
            AdvisoryStatus::Stop | AdvisoryStatus::Avoid | AdvisoryStatus::Close => 2,
        }
    }

    #[must_use]
    pub fn color(self) -> &'static str {
        match self.level() {
            0 => "#10b981",
            1 => "#f59e0b",
            _ => "#ef4444",
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AdvisoryStatus::Go => "GO",
            AdvisoryStatus::Caution => "CAUTION",
            AdvisoryStatus::Stop => "STOP",
            AdvisoryStatus::Mask => "MASK",
            AdvisoryStatus::Avoid => "AVOID",
            AdvisoryStatus::Open => "OPEN",
            AdvisoryStatus::Close => "CLOSE",
        }
    }
}

impl fmt::Display for AdvisoryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One activity recommendation, serialized verbatim for the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityAdvisory {
    #[serde(rename = "type")]
    pub activity: ActivityType,
    pub name: String,
    pub status: AdvisoryStatus,
    pub color: String,
    pub message: String,
}

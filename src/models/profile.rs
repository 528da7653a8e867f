//! User health profile and the explicit update operation that produces a new one

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::AirwatchError;

/// Upper bound accepted for a user supplied sensitivity coefficient
pub const MAX_SENSITIVITY: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgeGroup {
    Child,
    #[default]
    Adult,
    Elderly,
}

impl AgeGroup {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            AgeGroup::Child => "child",
            AgeGroup::Adult => "adult",
            AgeGroup::Elderly => "elderly",
        }
    }

    /// Children and the elderly get an exposure surcharge
    #[must_use]
    pub fn is_vulnerable(self) -> bool {
        matches!(self, AgeGroup::Child | AgeGroup::Elderly)
    }
}

impl fmt::Display for AgeGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AgeGroup {
    type Err = AirwatchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "child" | "children" => Ok(AgeGroup::Child),
            "adult" => Ok(AgeGroup::Adult),
            "elderly" | "senior" => Ok(AgeGroup::Elderly),
            other => Err(AirwatchError::validation(format!(
                "Unknown age group '{other}'. Must be one of: child, adult, elderly"
            ))),
        }
    }
}

/// Read-only snapshot of a user's health factors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserHealthProfile {
    pub user_id: String,
    pub display_name: Option<String>,
    pub age_group: AgeGroup,
    pub has_asthma: bool,
    pub is_pregnant: bool,
    /// Multiplier applied to the raw exposure score (1.0 = typical)
    pub sensitivity: f64,
}

impl UserHealthProfile {
    /// Profile used for users the store has never seen
    #[must_use]
    pub fn new<S: Into<String>>(user_id: S) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: None,
            age_group: AgeGroup::Adult,
            has_asthma: false,
            is_pregnant: false,
            sensitivity: 1.0,
        }
    }

    #[must_use]
    pub fn with_asthma(mut self, has_asthma: bool) -> Self {
        self.has_asthma = has_asthma;
        self
    }

    #[must_use]
    pub fn with_pregnancy(mut self, is_pregnant: bool) -> Self {
        self.is_pregnant = is_pregnant;
        self
    }

    #[must_use]
    pub fn with_age_group(mut self, age_group: AgeGroup) -> Self {
        self.age_group = age_group;
        self
    }

    #[must_use]
    pub fn with_sensitivity(mut self, sensitivity: f64) -> Self {
        self.sensitivity = sensitivity;
        self
    }

    #[must_use]
    pub fn with_display_name<S: Into<String>>(mut self, name: S) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Asthma or pregnancy tightens advisory boundaries
    #[must_use]
    pub fn is_sensitive(&self) -> bool {
        self.has_asthma || self.is_pregnant
    }

    /// Sensitivity as used by the scorer: non-finite → 1.0, negative → 0.0
    #[must_use]
    pub fn effective_sensitivity(&self) -> f64 {
        if self.sensitivity.is_finite() {
            self.sensitivity.max(0.0)
        } else {
            1.0
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.user_id)
    }

    /// Produce the profile that results from applying `update`.
    ///
    /// The receiver is left untouched; an omitted sensitivity keeps the
    /// current value.
    pub fn apply(&self, update: &ProfileUpdate) -> crate::Result<Self> {
        let validated = update.validate()?;
        Ok(Self {
            user_id: self.user_id.clone(),
            display_name: self.display_name.clone(),
            age_group: validated.age_group,
            has_asthma: update.has_asthma,
            is_pregnant: update.is_pregnant,
            sensitivity: validated.sensitivity.unwrap_or(self.sensitivity),
        })
    }
}

/// Profile update request as sent by the presentation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileUpdate {
    pub user_id: String,
    #[serde(default)]
    pub has_asthma: bool,
    #[serde(default)]
    pub is_pregnant: bool,
    #[serde(default = "default_age_group")]
    pub age_group: String,
    #[serde(default)]
    pub sensitivity_score: Option<f64>,
}

fn default_age_group() -> String {
    AgeGroup::Adult.as_str().to_string()
}

struct ValidatedUpdate {
    age_group: AgeGroup,
    sensitivity: Option<f64>,
}

impl ProfileUpdate {
    fn validate(&self) -> crate::Result<ValidatedUpdate> {
        if self.user_id.trim().is_empty() {
            return Err(AirwatchError::validation("user_id cannot be empty"));
        }
        let age_group = self.age_group.parse::<AgeGroup>()?;
        if let Some(sensitivity) = self.sensitivity_score {
            if !sensitivity.is_finite() || !(0.0..=MAX_SENSITIVITY).contains(&sensitivity) {
                return Err(AirwatchError::validation(format!(
                    "sensitivity_score must be between 0 and {MAX_SENSITIVITY}, got {sensitivity}"
                )));
            }
        }
        Ok(ValidatedUpdate {
            age_group,
            sensitivity: self.sensitivity_score,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(age_group: &str, sensitivity: Option<f64>) -> ProfileUpdate {
        ProfileUpdate {
            user_id: "u-1".to_string(),
            has_asthma: true,
            is_pregnant: false,
            age_group: age_group.to_string(),
            sensitivity_score: sensitivity,
        }
    }

    #[test]
    fn test_new_profile_defaults() {
        let profile = UserHealthProfile::new("u-1");
        assert_eq!(profile.age_group, AgeGroup::Adult);
        assert_eq!(profile.sensitivity, 1.0);
        assert!(!profile.is_sensitive());
        assert_eq!(profile.name(), "u-1");
    }

    #[test]
    fn test_apply_returns_new_snapshot() {
        let original = UserHealthProfile::new("u-1").with_sensitivity(1.4);
        let updated = original.apply(&update("Elderly", None)).unwrap();

        assert!(!original.has_asthma);
        assert!(updated.has_asthma);
        assert_eq!(updated.age_group, AgeGroup::Elderly);
        assert_eq!(updated.sensitivity, 1.4);
    }

    #[test]
    fn test_apply_overrides_sensitivity_when_given() {
        let updated = UserHealthProfile::new("u-1")
            .apply(&update("child", Some(2.0)))
            .unwrap();
        assert_eq!(updated.sensitivity, 2.0);
    }

    #[test]
    fn test_apply_rejects_invalid_input() {
        let profile = UserHealthProfile::new("u-1");
        assert!(profile.apply(&update("toddler", None)).is_err());
        assert!(profile.apply(&update("adult", Some(-1.0))).is_err());
        assert!(profile.apply(&update("adult", Some(f64::NAN))).is_err());
    }

    #[test]
    fn test_effective_sensitivity() {
        let p = UserHealthProfile::new("u");
        assert_eq!(p.clone().with_sensitivity(f64::NAN).effective_sensitivity(), 1.0);
        assert_eq!(p.clone().with_sensitivity(-3.0).effective_sensitivity(), 0.0);
        assert_eq!(p.with_sensitivity(2.5).effective_sensitivity(), 2.5);
    }
}

//! Advisory engine
//!
//! Each activity owns a closed table of score bands. A band applies when the
//! score is at or below its ceiling; the final band has no ceiling.
//!
//! Users with asthma or a pregnancy are held to a stricter table: the proceed
//! band ends one point earlier, and above it every status is escalated one
//! level. For sport this means GO up to 2, CAUTION up to 3 and STOP beyond.

use tracing::debug;

use crate::models::{ActivityAdvisory, ActivityType, AdvisoryStatus, UserHealthProfile};

/// Proceed ceiling reduction for sensitive users
const SENSITIVE_SHIFT: f64 = 1.0;

struct Band {
    ceiling: Option<f64>,
    status: AdvisoryStatus,
    message: &'static str,
}

const SPORT_BANDS: [Band; 3] = [
    Band {
        ceiling: Some(3.0),
        status: AdvisoryStatus::Go,
        message: "Conditions are fine for outdoor exercise.",
    },
    Band {
        ceiling: Some(6.0),
        status: AdvisoryStatus::Caution,
        message: "Keep workouts light and take breaks indoors.",
    },
    Band {
        ceiling: None,
        status: AdvisoryStatus::Stop,
        message: "Skip outdoor exercise today. Train indoors instead.",
    },
];

const COMMUTE_BANDS: [Band; 3] = [
    Band {
        ceiling: Some(3.0),
        status: AdvisoryStatus::Go,
        message: "No precautions needed for your commute.",
    },
    Band {
        ceiling: Some(7.0),
        status: AdvisoryStatus::Mask,
        message: "Wear an N95 mask and keep vehicle windows closed.",
    },
    Band {
        ceiling: None,
        status: AdvisoryStatus::Avoid,
        message: "Avoid travelling if you can. Work from home or delay the trip.",
    },
];

const VENTILATION_BANDS: [Band; 2] = [
    Band {
        ceiling: Some(4.0),
        status: AdvisoryStatus::Open,
        message: "Open windows to air out your home.",
    },
    Band {
        ceiling: None,
        status: AdvisoryStatus::Close,
        message: "Keep windows shut and run an air purifier if you have one.",
    },
];

fn bands(activity: ActivityType) -> &'static [Band] {
    match activity {
        ActivityType::Sport => &SPORT_BANDS,
        ActivityType::Commute => &COMMUTE_BANDS,
        ActivityType::Ventilation => &VENTILATION_BANDS,
    }
}

/// Recommend a status for one activity at the given personal score.
///
/// A score that is not a number falls through to the most restrictive band.
#[must_use]
pub fn advise(activity: ActivityType, score: f64, profile: &UserHealthProfile) -> ActivityAdvisory {
    let table = bands(activity);
    let last = table.len() - 1;
    let mut index = table
        .iter()
        .position(|band| band.ceiling.is_none_or(|ceiling| score <= ceiling))
        .unwrap_or(last);

    let sensitive = profile.is_sensitive();
    if sensitive {
        let proceed_ceiling = table
            .first()
            .and_then(|band| band.ceiling)
            .map_or(f64::INFINITY, |ceiling| ceiling - SENSITIVE_SHIFT);
        let within_proceed = score <= proceed_ceiling;
        if !within_proceed {
            index = (index + 1).min(last);
        }
    }
    let band = &table[index];

    debug!(%activity, score, sensitive, status = %band.status, "Selected advisory");

    ActivityAdvisory {
        activity,
        name: activity.display_name().to_string(),
        status: band.status,
        color: band.status.color().to_string(),
        message: band.message.to_string(),
    }
}

/// One advisory per supported activity, in declaration order
#[must_use]
pub fn advise_all(score: f64, profile: &UserHealthProfile) -> Vec<ActivityAdvisory> {
    ActivityType::ALL
        .iter()
        .map(|activity| advise(*activity, score, profile))
        .collect()
}

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::step::StepId;

const MAX_DISPLAY_NAME_CHARS: usize = 64;
const MAX_INTERVAL_DAYS: u32 = 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Adherence {
    Always,
    Mostly,
    Sometimes,
    Rarely,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DoseUnit {
    Mg,
    Mcg,
    Ml,
    Units,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReminderTime {
    pub hour: u8,
    pub minute: u8,
}

impl ReminderTime {
    pub const fn new(hour: u8, minute: u8) -> Self {
        Self { hour, minute }
    }

    pub const fn is_valid(self) -> bool {
        self.hour < 24 && self.minute < 60
    }
}

/// Answer collected on one onboarding screen.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnswerPayload {
    Welcome {
        #[serde(default)]
        display_name: Option<String>,
    },
    Compliance {
        adherence: Adherence,
        #[serde(default)]
        tracks_site_rotation: bool,
    },
    MedicationDose {
        medication: String,
        dose: f64,
        unit: DoseUnit,
    },
    Schedule {
        interval_days: u32,
        #[serde(default)]
        reminder: Option<ReminderTime>,
    },
    Permissions {
        notifications: bool,
    },
    FeatureHook {
        start_tracking: bool,
    },
    /// Recorded in place of an answer when an optional step is skipped.
    Skipped,
}

impl AnswerPayload {
    /// The step this payload shape belongs to; `None` for the skip sentinel.
    pub const fn step_id(&self) -> Option<StepId> {
        match self {
            Self::Welcome { .. } => Some(StepId::Welcome),
            Self::Compliance { .. } => Some(StepId::Compliance),
            Self::MedicationDose { .. } => Some(StepId::MedicationDose),
            Self::Schedule { .. } => Some(StepId::Schedule),
            Self::Permissions { .. } => Some(StepId::Permissions),
            Self::FeatureHook { .. } => Some(StepId::FeatureHook),
            Self::Skipped => None,
        }
    }

    pub const fn is_skip(&self) -> bool {
        matches!(self, Self::Skipped)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("payload for step {found} submitted to step {expected}")]
    PayloadMismatch { expected: StepId, found: StepId },
    #[error("step {0} cannot be skipped")]
    NotSkippable(StepId),
    #[error("display name must not be blank")]
    BlankDisplayName,
    #[error("display name exceeds {max} characters")]
    DisplayNameTooLong { max: usize },
    #[error("medication name must not be blank")]
    BlankMedication,
    #[error("dose must be a positive number, got {0}")]
    NonPositiveDose(f64),
    #[error("interval must be between 1 and {max} days, got {days}")]
    IntervalOutOfRange { days: u32, max: u32 },
    #[error("invalid reminder time {hour:02}:{minute:02}")]
    InvalidReminderTime { hour: u8, minute: u8 },
}

pub type Validator = fn(&AnswerPayload) -> Result<(), ValidationError>;

pub fn validator_for(step: StepId) -> Validator {
    match step {
        StepId::Welcome => validate_welcome,
        StepId::Compliance => accept_shape,
        StepId::MedicationDose => validate_medication_dose,
        StepId::Schedule => validate_schedule,
        StepId::Permissions => accept_shape,
        StepId::FeatureHook => accept_shape,
    }
}

/// Check `payload` against `step`: shape first, then the step's own predicate.
pub fn validate_answer(step: StepId, payload: &AnswerPayload) -> Result<(), ValidationError> {
    match payload.step_id() {
        None if step.step().required => Err(ValidationError::NotSkippable(step)),
        None => Ok(()),
        Some(found) if found != step => Err(ValidationError::PayloadMismatch {
            expected: step,
            found,
        }),
        Some(_) => validator_for(step)(payload),
    }
}

fn accept_shape(_: &AnswerPayload) -> Result<(), ValidationError> {
    Ok(())
}

fn validate_welcome(payload: &AnswerPayload) -> Result<(), ValidationError> {
    let AnswerPayload::Welcome {
        display_name: Some(name),
    } = payload
    else {
        return Ok(());
    };
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankDisplayName);
    }
    if trimmed.chars().count() > MAX_DISPLAY_NAME_CHARS {
        return Err(ValidationError::DisplayNameTooLong {
            max: MAX_DISPLAY_NAME_CHARS,
        });
    }
    Ok(())
}

fn validate_medication_dose(payload: &AnswerPayload) -> Result<(), ValidationError> {
    let AnswerPayload::MedicationDose {
        medication, dose, ..
    } = payload
    else {
        return Ok(());
    };
    if medication.trim().is_empty() {
        return Err(ValidationError::BlankMedication);
    }
    if !dose.is_finite() || *dose <= 0.0 {
        return Err(ValidationError::NonPositiveDose(*dose));
    }
    Ok(())
}

fn validate_schedule(payload: &AnswerPayload) -> Result<(), ValidationError> {
    let AnswerPayload::Schedule {
        interval_days,
        reminder,
    } = payload
    else {
        return Ok(());
    };
    if !(1..=MAX_INTERVAL_DAYS).contains(interval_days) {
        return Err(ValidationError::IntervalOutOfRange {
            days: *interval_days,
            max: MAX_INTERVAL_DAYS,
        });
    }
    if let Some(time) = reminder.filter(|time| !time.is_valid()) {
        return Err(ValidationError::InvalidReminderTime {
            hour: time.hour,
            minute: time.minute,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dose(medication: &str, dose: f64) -> AnswerPayload {
        AnswerPayload::MedicationDose {
            medication: medication.to_string(),
            dose,
            unit: DoseUnit::Mg,
        }
    }

    fn schedule(interval_days: u32, reminder: Option<ReminderTime>) -> AnswerPayload {
        AnswerPayload::Schedule {
            interval_days,
            reminder,
        }
    }

    #[test]
    fn medication_dose_requires_positive_finite_dose() {
        assert!(validate_answer(StepId::MedicationDose, &dose("Semaglutide", 0.25)).is_ok());
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            assert!(matches!(
                validate_answer(StepId::MedicationDose, &dose("Semaglutide", bad)),
                Err(ValidationError::NonPositiveDose(_))
            ));
        }
        assert_eq!(
            validate_answer(StepId::MedicationDose, &dose("   ", 1.0)),
            Err(ValidationError::BlankMedication)
        );
    }

    #[test]
    fn schedule_requires_interval_of_at_least_one_day() {
        assert!(validate_answer(StepId::Schedule, &schedule(1, None)).is_ok());
        assert!(validate_answer(StepId::Schedule, &schedule(7, Some(ReminderTime::new(8, 30)))).is_ok());
        assert_eq!(
            validate_answer(StepId::Schedule, &schedule(0, None)),
            Err(ValidationError::IntervalOutOfRange { days: 0, max: 365 })
        );
        assert!(validate_answer(StepId::Schedule, &schedule(366, None)).is_err());
        assert_eq!(
            validate_answer(StepId::Schedule, &schedule(7, Some(ReminderTime::new(24, 0)))),
            Err(ValidationError::InvalidReminderTime { hour: 24, minute: 0 })
        );
    }

    #[test]
    fn welcome_name_is_optional_but_not_blank() {
        let anonymous = AnswerPayload::Welcome { display_name: None };
        assert!(validate_answer(StepId::Welcome, &anonymous).is_ok());

        let blank = AnswerPayload::Welcome {
            display_name: Some("  ".into()),
        };
        assert_eq!(
            validate_answer(StepId::Welcome, &blank),
            Err(ValidationError::BlankDisplayName)
        );

        let long = AnswerPayload::Welcome {
            display_name: Some("x".repeat(65)),
        };
        assert_eq!(
            validate_answer(StepId::Welcome, &long),
            Err(ValidationError::DisplayNameTooLong { max: 64 })
        );
    }

    #[test]
    fn skip_is_only_accepted_on_optional_steps() {
        assert!(validate_answer(StepId::Permissions, &AnswerPayload::Skipped).is_ok());
        for id in StepId::ALL.into_iter().filter(|id| *id != StepId::Permissions) {
            assert_eq!(
                validate_answer(id, &AnswerPayload::Skipped),
                Err(ValidationError::NotSkippable(id))
            );
        }
    }

    #[test]
    fn payload_for_another_step_is_rejected() {
        let err = validate_answer(StepId::Schedule, &dose("Insulin", 10.0))
            .expect_err("dose payload must not satisfy schedule");
        assert_eq!(
            err,
            ValidationError::PayloadMismatch {
                expected: StepId::Schedule,
                found: StepId::MedicationDose,
            }
        );
    }

    #[test]
    fn payload_json_uses_kind_tag() {
        let json = serde_json::to_value(dose("Insulin", 12.5)).unwrap();
        assert_eq!(json["kind"], "medication-dose");
        assert_eq!(json["unit"], "mg");

        let skipped: AnswerPayload = serde_json::from_str(r#"{"kind":"skipped"}"#).unwrap();
        assert!(skipped.is_skip());
    }
}

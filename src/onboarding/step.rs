use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Identifier of one onboarding screen, in flow order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    Welcome,
    Compliance,
    MedicationDose,
    Schedule,
    Permissions,
    FeatureHook,
}

impl StepId {
    pub const ALL: [StepId; 6] = [
        StepId::Welcome,
        StepId::Compliance,
        StepId::MedicationDose,
        StepId::Schedule,
        StepId::Permissions,
        StepId::FeatureHook,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Compliance => "compliance",
            Self::MedicationDose => "medication-dose",
            Self::Schedule => "schedule",
            Self::Permissions => "permissions",
            Self::FeatureHook => "feature-hook",
        }
    }

    /// Route name the calling screen navigates to for this step.
    pub fn screen_name(self) -> String {
        format!("onboarding/{}", self.as_str())
    }

    pub const fn step(self) -> OnboardingStep {
        STEPS[self as usize]
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown onboarding step: {0}")]
pub struct UnknownStepId(pub String);

impl FromStr for StepId {
    type Err = UnknownStepId;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase();
        StepId::ALL
            .into_iter()
            .find(|id| id.as_str() == normalized)
            .ok_or_else(|| UnknownStepId(value.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OnboardingStep {
    pub id: StepId,
    pub index: usize,
    pub required: bool,
}

const fn step(id: StepId, required: bool) -> OnboardingStep {
    OnboardingStep {
        id,
        index: id as usize,
        required,
    }
}

pub const STEPS: [OnboardingStep; 6] = [
    step(StepId::Welcome, true),
    step(StepId::Compliance, true),
    step(StepId::MedicationDose, true),
    step(StepId::Schedule, true),
    step(StepId::Permissions, false),
    step(StepId::FeatureHook, true),
];

pub const STEP_COUNT: usize = STEPS.len();

pub fn step_at(index: usize) -> Option<OnboardingStep> {
    STEPS.get(index).copied()
}

use thiserror::Error;

use super::answer::ValidationError;
use super::step::StepId;

pub type OnboardingResult<T> = std::result::Result<T, OnboardingError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OnboardingError {
    #[error("invalid answer for step {step}: {source}")]
    Validation {
        step: StepId,
        #[source]
        source: ValidationError,
    },
    #[error("answer submitted for step {submitted} while current step is {expected}")]
    StepMismatch { expected: StepId, submitted: StepId },
    #[error("already at the first onboarding step")]
    NoPreviousStep,
    #[error("step index {index} is out of range for {step_count} steps")]
    OutOfRange { index: usize, step_count: usize },
}

impl OnboardingError {
    /// Errors a user can fix by editing the answer and resubmitting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

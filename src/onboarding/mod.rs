//! First-launch onboarding flow.
//!
//! A fixed, forward-only sequence of screens. Each screen submits one answer,
//! the controller validates it against the step's predicate, advances, and
//! writes the whole progress record so a relaunch resumes on the same screen.
//! The controller never navigates; callers route to `StepId::screen_name`.

pub mod answer;
pub mod controller;
pub mod error;
pub mod state;
pub mod step;

pub use answer::{
    validate_answer, validator_for, Adherence, AnswerPayload, DoseUnit, ReminderTime,
    ValidationError,
};
pub use controller::{OnboardingController, OnboardingEvent, Progress, StepTransition};
pub use error::{OnboardingError, OnboardingResult};
pub use state::OnboardingState;
pub use step::{step_at, OnboardingStep, StepId, UnknownStepId, STEPS, STEP_COUNT};

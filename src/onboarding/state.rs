use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::answer::AnswerPayload;
use super::step::{StepId, STEP_COUNT};

pub const STATE_VERSION: u32 = 1;

/// Persisted onboarding progress.
///
/// Stored under `storage::keys::ONBOARDING_STATE`. Answers for steps at or
/// after `current_index` survive a `go_back` so the screen can prefill them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnboardingState {
    #[serde(default = "state_version")]
    pub version: u32,
    pub current_index: usize,
    #[serde(default)]
    pub answers: BTreeMap<StepId, AnswerPayload>,
    #[serde(default)]
    pub completed: bool,
}

fn state_version() -> u32 {
    STATE_VERSION
}

impl Default for OnboardingState {
    fn default() -> Self {
        Self {
            version: STATE_VERSION,
            current_index: 0,
            answers: BTreeMap::new(),
            completed: false,
        }
    }
}

impl OnboardingState {
    pub fn is_consistent(&self) -> bool {
        self.version == STATE_VERSION
            && self.current_index <= STEP_COUNT
            && self.completed == (self.current_index == STEP_COUNT)
    }

    /// Repair a loaded record so that `completed` and `current_index` agree.
    ///
    /// A set `completed` flag wins and pins the index to the end; an index at
    /// or past the end marks the flow completed. The record is restamped with
    /// the current `version`.
    pub fn normalized(mut self) -> Self {
        if self.completed || self.current_index >= STEP_COUNT {
            self.current_index = STEP_COUNT;
            self.completed = true;
        }
        self.version = STATE_VERSION;
        self
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}

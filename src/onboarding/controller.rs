use crate::storage::{keys, KeyValueStore, StorageError, StorageResult};

use super::answer::{validate_answer, AnswerPayload};
use super::error::{OnboardingError, OnboardingResult};
use super::state::OnboardingState;
use super::step::{step_at, OnboardingStep, StepId, STEP_COUNT};

/// Where the flow stands after a successful submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Next(OnboardingStep),
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnboardingEvent {
    Submit(StepId),
    Back,
    Reset,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepTransition {
    pub from: usize,
    pub event: OnboardingEvent,
    pub to: usize,
}

/// Drives the fixed onboarding sequence and persists progress on every change.
#[derive(Debug)]
pub struct OnboardingController<S> {
    store: S,
    state: OnboardingState,
    unsaved: bool,
    transition_history: Vec<StepTransition>,
}

impl<S: KeyValueStore> OnboardingController<S> {
    /// Resume from the persisted record, or start fresh when there is none.
    pub fn load(store: S) -> Self {
        let state = read_state(&store);
        tracing::info!(
            current_index = state.current_index,
            completed = state.completed,
            "loaded onboarding state"
        );
        Self {
            store,
            state,
            unsaved: false,
            transition_history: Vec::new(),
        }
    }

    pub fn state(&self) -> &OnboardingState {
        &self.state
    }

    pub fn is_completed(&self) -> bool {
        self.state.completed
    }

    pub fn current_step(&self) -> OnboardingResult<OnboardingStep> {
        step_at(self.state.current_index).ok_or_else(|| self.out_of_range())
    }

    /// Previously recorded answer for `step`, kept across `go_back` for prefill.
    pub fn answer(&self, step: StepId) -> Option<&AnswerPayload> {
        self.state.answers.get(&step)
    }

    pub fn submit_answer(
        &mut self,
        step: StepId,
        payload: AnswerPayload,
    ) -> OnboardingResult<Progress> {
        let current = self.current_step().inspect_err(|err| {
            tracing::warn!(%step, %err, "answer submitted after onboarding finished");
        })?;
        if current.id != step {
            tracing::warn!(expected = %current.id, submitted = %step, "out-of-order onboarding answer");
            return Err(OnboardingError::StepMismatch {
                expected: current.id,
                submitted: step,
            });
        }
        validate_answer(step, &payload).map_err(|source| {
            tracing::debug!(%step, %source, "onboarding answer rejected");
            OnboardingError::Validation { step, source }
        })?;

        self.state.answers.insert(step, payload);
        let from = self.state.current_index;
        self.state.current_index += 1;
        self.state.completed = self.state.current_index == STEP_COUNT;
        self.record(from, OnboardingEvent::Submit(step));
        self.persist();

        Ok(match step_at(self.state.current_index) {
            Some(next) => Progress::Next(next),
            None => {
                tracing::info!("onboarding completed");
                Progress::Completed
            }
        })
    }

    pub fn go_back(&mut self) -> OnboardingResult<OnboardingStep> {
        if self.state.completed {
            let err = self.out_of_range();
            tracing::warn!(%err, "go back requested after onboarding finished");
            return Err(err);
        }
        if self.state.current_index == 0 {
            tracing::warn!("go back requested on the first onboarding step");
            return Err(OnboardingError::NoPreviousStep);
        }

        let from = self.state.current_index;
        self.state.current_index -= 1;
        self.record(from, OnboardingEvent::Back);
        self.persist();
        self.current_step()
    }

    /// Clear all progress. Only an explicit "restart onboarding" action calls this.
    pub fn reset(&mut self) {
        let from = self.state.current_index;
        self.state = OnboardingState::default();
        self.record(from, OnboardingEvent::Reset);
        match self.store.delete(keys::ONBOARDING_STATE) {
            Ok(()) => self.unsaved = false,
            Err(err) => {
                tracing::warn!(?err, "failed to clear persisted onboarding state");
                self.unsaved = true;
            }
        }
    }

    /// True while the last write failed and memory is ahead of storage.
    pub fn has_unsaved_changes(&self) -> bool {
        self.unsaved
    }

    /// Write the full in-memory state now.
    pub fn flush(&mut self) -> StorageResult<()> {
        let result = write_state(&self.store, &self.state);
        self.unsaved = result.is_err();
        result
    }

    fn persist(&mut self) {
        if let Err(err) = self.flush() {
            tracing::warn!(
                ?err,
                current_index = self.state.current_index,
                "failed to persist onboarding state; keeping in-memory progress"
            );
        }
    }

    fn record(&mut self, from: usize, event: OnboardingEvent) {
        let to = self.state.current_index;
        tracing::debug!(from, to, ?event, "onboarding transition");
        self.transition_history
            .push(StepTransition { from, event, to });
    }

    fn out_of_range(&self) -> OnboardingError {
        OnboardingError::OutOfRange {
            index: self.state.current_index,
            step_count: STEP_COUNT,
        }
    }
}

#[cfg(test)]
impl<S> OnboardingController<S> {
    fn history(&self) -> &[StepTransition] {
        &self.transition_history
    }
}

fn read_state(store: &impl KeyValueStore) -> OnboardingState {
    let bytes = match store.get(keys::ONBOARDING_STATE) {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return OnboardingState::default(),
        Err(err) => {
            tracing::warn!(?err, "failed to read onboarding state; starting fresh");
            return OnboardingState::default();
        }
    };
    match OnboardingState::from_bytes(&bytes) {
        Ok(state) if state.is_consistent() => state,
        Ok(state) => {
            tracing::warn!(
                version = state.version,
                current_index = state.current_index,
                completed = state.completed,
                "inconsistent onboarding state; normalizing"
            );
            state.normalized()
        }
        Err(err) => {
            tracing::warn!(?err, "failed to parse onboarding state; starting fresh");
            OnboardingState::default()
        }
    }
}

fn write_state(store: &impl KeyValueStore, state: &OnboardingState) -> StorageResult<()> {
    let bytes = state.to_bytes().map_err(|source| StorageError::Encode {
        key: keys::ONBOARDING_STATE.to_string(),
        source,
    })?;
    store.set(keys::ONBOARDING_STATE, &bytes)
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::onboarding::answer::{Adherence, DoseUnit, ReminderTime, ValidationError};
    use crate::onboarding::state::STATE_VERSION;
    use crate::storage::MemoryStore;

    fn valid_answer(step: StepId) -> AnswerPayload {
        match step {
            StepId::Welcome => AnswerPayload::Welcome {
                display_name: Some("Sam".into()),
            },
            StepId::Compliance => AnswerPayload::Compliance {
                adherence: Adherence::Always,
                tracks_site_rotation: false,
            },
            StepId::MedicationDose => AnswerPayload::MedicationDose {
                medication: "Semaglutide".into(),
                dose: 0.5,
                unit: DoseUnit::Mg,
            },
            StepId::Schedule => AnswerPayload::Schedule {
                interval_days: 7,
                reminder: Some(ReminderTime::new(9, 0)),
            },
            StepId::Permissions => AnswerPayload::Permissions {
                notifications: true,
            },
            StepId::FeatureHook => AnswerPayload::FeatureHook {
                start_tracking: true,
            },
        }
    }

    fn persisted(store: &MemoryStore) -> Option<OnboardingState> {
        store
            .get(keys::ONBOARDING_STATE)
            .unwrap()
            .map(|bytes| OnboardingState::from_bytes(&bytes).unwrap())
    }

    #[test]
    fn submitting_in_order_walks_every_step_once() {
        let store = MemoryStore::new();
        let mut controller = OnboardingController::load(&store);

        for (position, id) in StepId::ALL.into_iter().enumerate() {
            assert!(!controller.is_completed());
            assert_eq!(controller.current_step().unwrap().id, id);
            let progress = controller
                .submit_answer(id, valid_answer(id))
                .expect("valid answer should advance");
            assert_eq!(controller.state().current_index, position + 1);
            match step_at(position + 1) {
                Some(next) => assert_eq!(progress, Progress::Next(next)),
                None => assert_eq!(progress, Progress::Completed),
            }
        }

        assert!(controller.is_completed());
        assert_eq!(controller.history().len(), STEP_COUNT);
        assert_eq!(persisted(&store).as_ref(), Some(controller.state()));
    }

    #[test]
    fn mismatched_step_is_rejected_without_mutation() {
        let store = MemoryStore::new();
        let mut controller = OnboardingController::load(&store);
        controller
            .submit_answer(StepId::Welcome, valid_answer(StepId::Welcome))
            .unwrap();
        let before_state = controller.state().clone();
        let before_store = persisted(&store);

        let err = controller
            .submit_answer(StepId::Schedule, valid_answer(StepId::Schedule))
            .expect_err("schedule is not current");
        assert_eq!(
            err,
            OnboardingError::StepMismatch {
                expected: StepId::Compliance,
                submitted: StepId::Schedule,
            }
        );
        assert!(!err.is_recoverable());
        assert_eq!(controller.state(), &before_state);
        assert_eq!(persisted(&store), before_store);
        assert_eq!(controller.history().len(), 1);
    }

    #[test]
    fn failed_validation_keeps_the_same_step() {
        let store = MemoryStore::new();
        let mut controller = OnboardingController::load(&store);
        for id in [StepId::Welcome, StepId::Compliance] {
            controller.submit_answer(id, valid_answer(id)).unwrap();
        }
        let before_store = persisted(&store);

        let err = controller
            .submit_answer(
                StepId::MedicationDose,
                AnswerPayload::MedicationDose {
                    medication: "Insulin".into(),
                    dose: 0.0,
                    unit: DoseUnit::Units,
                },
            )
            .expect_err("zero dose is invalid");
        assert_eq!(
            err,
            OnboardingError::Validation {
                step: StepId::MedicationDose,
                source: ValidationError::NonPositiveDose(0.0),
            }
        );
        assert!(err.is_recoverable());
        assert_eq!(controller.current_step().unwrap().id, StepId::MedicationDose);
        assert!(controller.answer(StepId::MedicationDose).is_none());
        assert_eq!(persisted(&store), before_store);
    }

    #[test]
    fn go_back_on_first_step_fails_without_mutation() {
        let store = MemoryStore::new();
        let mut controller = OnboardingController::load(&store);

        assert_eq!(controller.go_back(), Err(OnboardingError::NoPreviousStep));
        assert_eq!(controller.state(), &OnboardingState::default());
        assert!(store.is_empty());
        assert!(controller.history().is_empty());
    }

    #[test]
    fn go_back_keeps_answer_for_prefill() {
        let store = MemoryStore::new();
        let mut controller = OnboardingController::load(&store);
        controller
            .submit_answer(StepId::Welcome, valid_answer(StepId::Welcome))
            .unwrap();

        let step = controller.go_back().expect("second step can go back");
        assert_eq!(step.id, StepId::Welcome);
        assert_eq!(
            controller.answer(StepId::Welcome),
            Some(&valid_answer(StepId::Welcome))
        );
        assert_eq!(persisted(&store).unwrap().current_index, 0);
        assert_eq!(
            controller.history()[1],
            StepTransition {
                from: 1,
                event: OnboardingEvent::Back,
                to: 0,
            }
        );
    }

    #[test]
    fn completed_flow_rejects_step_operations() {
        let store = MemoryStore::new();
        let mut controller = OnboardingController::load(&store);
        for id in StepId::ALL {
            controller.submit_answer(id, valid_answer(id)).unwrap();
        }

        let out_of_range = OnboardingError::OutOfRange {
            index: STEP_COUNT,
            step_count: STEP_COUNT,
        };
        assert_eq!(controller.current_step(), Err(out_of_range.clone()));
        assert_eq!(controller.go_back(), Err(out_of_range.clone()));
        assert_eq!(
            controller.submit_answer(StepId::FeatureHook, valid_answer(StepId::FeatureHook)),
            Err(out_of_range)
        );
        assert!(controller.is_completed());
    }

    #[test]
    fn skip_on_permissions_records_sentinel() {
        let store = MemoryStore::new();
        let mut controller = OnboardingController::load(&store);
        for id in [
            StepId::Welcome,
            StepId::Compliance,
            StepId::MedicationDose,
            StepId::Schedule,
        ] {
            controller.submit_answer(id, valid_answer(id)).unwrap();
        }

        let progress = controller
            .submit_answer(StepId::Permissions, AnswerPayload::Skipped)
            .expect("permissions is skippable");
        assert_eq!(progress, Progress::Next(StepId::FeatureHook.step()));
        assert_eq!(
            controller.answer(StepId::Permissions),
            Some(&AnswerPayload::Skipped)
        );
    }

    #[test]
    fn restart_resumes_from_last_committed_state() {
        let store = MemoryStore::new();
        let committed = {
            let mut controller = OnboardingController::load(&store);
            for id in [StepId::Welcome, StepId::Compliance, StepId::MedicationDose] {
                controller.submit_answer(id, valid_answer(id)).unwrap();
            }
            controller.state().clone()
        };

        let resumed = OnboardingController::load(&store);
        assert_eq!(resumed.state(), &committed);
        assert_eq!(resumed.current_step().unwrap().id, StepId::Schedule);
    }

    #[test]
    fn write_failure_keeps_memory_and_reconciles_on_next_mutation() {
        let store = Rc::new(MemoryStore::new());
        let mut controller = OnboardingController::load(Rc::clone(&store));

        store.fail_writes(true);
        controller
            .submit_answer(StepId::Welcome, valid_answer(StepId::Welcome))
            .expect("storage failure must not fail the submission");
        assert_eq!(controller.current_step().unwrap().id, StepId::Compliance);
        assert!(controller.has_unsaved_changes());
        assert!(!store.contains(keys::ONBOARDING_STATE));

        store.fail_writes(false);
        controller
            .submit_answer(StepId::Compliance, valid_answer(StepId::Compliance))
            .unwrap();
        assert!(!controller.has_unsaved_changes());
        assert_eq!(persisted(&store).as_ref(), Some(controller.state()));
    }

    #[test]
    fn flush_retries_a_failed_write() {
        let store = Rc::new(MemoryStore::new());
        let mut controller = OnboardingController::load(Rc::clone(&store));
        store.fail_writes(true);
        controller
            .submit_answer(StepId::Welcome, valid_answer(StepId::Welcome))
            .unwrap();
        assert!(controller.flush().is_err());

        store.fail_writes(false);
        controller.flush().expect("flush should succeed once storage recovers");
        assert!(!controller.has_unsaved_changes());
        assert_eq!(persisted(&store).unwrap().current_index, 1);
    }

    #[test]
    fn reset_clears_memory_and_storage() {
        let store = MemoryStore::new();
        let mut controller = OnboardingController::load(&store);
        for id in StepId::ALL {
            controller.submit_answer(id, valid_answer(id)).unwrap();
        }

        controller.reset();
        assert!(!controller.is_completed());
        assert_eq!(controller.current_step().unwrap().id, StepId::Welcome);
        assert!(controller.answer(StepId::Welcome).is_none());
        assert!(!store.contains(keys::ONBOARDING_STATE));
        assert_eq!(
            controller.history().last().map(|t| t.event),
            Some(OnboardingEvent::Reset)
        );
    }

    #[test]
    fn failed_reset_is_recovered_by_flush() {
        let store = MemoryStore::new();
        let mut controller = OnboardingController::load(&store);
        controller
            .submit_answer(StepId::Welcome, valid_answer(StepId::Welcome))
            .unwrap();
        store.fail_writes(true);

        controller.reset();
        assert_eq!(controller.state(), &OnboardingState::default());
        assert!(controller.has_unsaved_changes());
        assert_eq!(persisted(&store).unwrap().current_index, 1);

        store.fail_writes(false);
        controller.flush().unwrap();
        assert!(!controller.has_unsaved_changes());
        assert_eq!(persisted(&store), Some(OnboardingState::default()));

        let resumed = OnboardingController::load(&store);
        assert_eq!(resumed.current_step().unwrap().id, StepId::Welcome);
        assert!(resumed.answer(StepId::Welcome).is_none());
    }

    #[test]
    fn record_from_another_version_is_restamped_on_load() {
        let store = MemoryStore::new();
        store
            .set(
                keys::ONBOARDING_STATE,
                br#"{"version":7,"current_index":2,"answers":{},"completed":false}"#,
            )
            .unwrap();
        let controller = OnboardingController::load(&store);
        assert_eq!(controller.state().version, STATE_VERSION);
        assert_eq!(controller.current_step().unwrap().id, StepId::MedicationDose);
    }

    #[test]
    fn corrupt_record_starts_fresh() {
        let store = MemoryStore::new();
        store.set(keys::ONBOARDING_STATE, b"{ not json").unwrap();
        let controller = OnboardingController::load(&store);
        assert_eq!(controller.state(), &OnboardingState::default());
    }

    #[test]
    fn inconsistent_record_is_normalized_on_load() {
        let store = MemoryStore::new();
        store
            .set(
                keys::ONBOARDING_STATE,
                br#"{"version":1,"current_index":2,"answers":{},"completed":true}"#,
            )
            .unwrap();
        let controller = OnboardingController::load(&store);
        assert!(controller.is_completed());
        assert_eq!(controller.state().current_index, STEP_COUNT);
    }
}

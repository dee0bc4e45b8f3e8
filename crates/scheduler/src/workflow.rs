use api::SchoolApi;
use log::{debug, error, info};
use model::{
    cancel_reason::CancelReason,
    errors::ScheduleError,
    ids::{parse_guid, same_id},
    session::Session,
    slot::{BlankSlot, LessonSlot, NewSlot},
};

/// Where the cancel-and-replace dialog currently is.
#[derive(Debug, Clone, PartialEq)]
pub enum CancelReplaceState {
    Idle,
    AwaitingSelection,
    CreatingReplacement,
    Cancelling { replacement: LessonSlot },
    Succeeded { replacement: LessonSlot },
    /// The replacement exists but the original slot was not cancelled.
    /// Both are active until someone fixes it by hand or the cancel is retried.
    PartiallyFailed { replacement: LessonSlot, error: String },
    Failed { error: String },
}

/// Outcome of a successful run: the original marked cancelled locally and the new slot.
#[derive(Debug, Clone, PartialEq)]
pub struct Replacement {
    pub original: LessonSlot,
    pub replacement: LessonSlot,
}

/// Replaces a lesson with one in a free slot, then cancels the original.
///
/// The replacement is always created first. There is no compensation: if the
/// cancel call fails the workflow stops in [`CancelReplaceState::PartiallyFailed`].
/// Such replacements are remembered per original slot across `close`/`open`, so a
/// later submit for the same slot only repeats the cancel.
#[derive(Debug)]
pub struct CancelReplace {
    state: CancelReplaceState,
    target: Option<LessonSlot>,
    blank_slots: Vec<BlankSlot>,
    selected: Option<usize>,
    reason: Option<CancelReason>,
    /// (original slot id, replacement) pairs whose cancel has not succeeded yet.
    pending: Vec<(String, LessonSlot)>,
}

impl Default for CancelReplace {
    fn default() -> Self {
        CancelReplace {
            state: CancelReplaceState::Idle,
            target: None,
            blank_slots: Vec::new(),
            selected: None,
            reason: None,
            pending: Vec::new(),
        }
    }
}

/// Settles an in-flight state if the submit future is dropped before completion.
struct InFlight<'a>(&'a mut CancelReplace);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.interrupt();
    }
}

impl CancelReplace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &CancelReplaceState {
        &self.state
    }

    pub fn target(&self) -> Option<&LessonSlot> {
        self.target.as_ref()
    }

    pub fn blank_slots(&self) -> &[BlankSlot] {
        &self.blank_slots
    }

    pub fn selected_blank(&self) -> Option<&BlankSlot> {
        self.selected.and_then(|i| self.blank_slots.get(i))
    }

    pub fn is_open(&self) -> bool {
        !matches!(self.state, CancelReplaceState::Idle)
    }

    /// True while a backend call is in flight; every dialog control is disabled.
    pub fn is_busy(&self) -> bool {
        matches!(
            self.state,
            CancelReplaceState::CreatingReplacement | CancelReplaceState::Cancelling { .. }
        )
    }

    pub fn open(&mut self, target: LessonSlot, blank_slots: Vec<BlankSlot>) -> Result<(), ScheduleError> {
        if self.is_busy() {
            return Err(ScheduleError::SubmitInProgress);
        }
        if !target.status.can_be_cancelled() {
            return Err(ScheduleError::SlotNotCancellable {
                slot_id: target.id.clone(),
                status: target.status,
            });
        }
        debug!("cancel dialog for slot {} with {} free slots", target.id, blank_slots.len());
        *self = CancelReplace {
            state: CancelReplaceState::AwaitingSelection,
            target: Some(target),
            blank_slots,
            selected: None,
            reason: None,
            pending: std::mem::take(&mut self.pending),
        };
        Ok(())
    }

    pub fn select_blank(&mut self, index: usize) -> Result<(), ScheduleError> {
        self.ensure_editable()?;
        if index >= self.blank_slots.len() {
            return Err(ScheduleError::BlankSlotOutOfRange(index));
        }
        self.selected = Some(index);
        Ok(())
    }

    pub fn set_reason(&mut self, reason: CancelReason) -> Result<(), ScheduleError> {
        self.ensure_editable()?;
        self.reason = Some(reason);
        Ok(())
    }

    /// Closes the dialog. Not possible while a call is in flight.
    pub fn close(&mut self) -> bool {
        if self.is_busy() {
            return false;
        }
        *self = CancelReplace {
            pending: std::mem::take(&mut self.pending),
            ..CancelReplace::default()
        };
        true
    }

    /// Replacement already created for the current target whose original is not cancelled yet.
    pub fn pending_replacement(&self) -> Option<&LessonSlot> {
        let target = self.target.as_ref()?;
        self.pending
            .iter()
            .find(|(original, _)| same_id(original, &target.id))
            .map(|(_, replacement)| replacement)
    }

    pub fn can_submit(&self) -> bool {
        if self.is_busy() {
            return false;
        }
        if self.pending_replacement().is_some() {
            return self.retry_reason().is_ok();
        }
        self.validate().is_ok()
    }

    /// Everything that can be checked without contacting the backend.
    pub fn validate(&self) -> Result<(&LessonSlot, &BlankSlot, &str), ScheduleError> {
        let target = self.target.as_ref().ok_or(ScheduleError::WorkflowNotOpen)?;
        if self.blank_slots.is_empty() {
            return Err(ScheduleError::NoBlankSlots);
        }
        let reason = self
            .reason
            .as_ref()
            .ok_or(ScheduleError::EmptyCancelReason)?
            .text()?;
        let blank = self.selected_blank().ok_or(ScheduleError::NoBlankSlotSelected)?;
        if blank.shift().is_none() {
            return Err(ScheduleError::UnknownShift(blank.shift));
        }
        parse_guid("room", &target.room.id)?;
        parse_guid("class", &target.class.id)?;
        Ok((target, blank, reason))
    }

    /// Runs the create-then-cancel sequence.
    ///
    /// If a replacement already exists for the target only the cancel call is
    /// repeated, and no free slot has to be selected. Dropping the returned future
    /// mid-call leaves the dialog in `Failed` (create interrupted, outcome unknown)
    /// or `PartiallyFailed` (cancel interrupted).
    pub async fn submit(
        &mut self,
        api: &dyn SchoolApi,
        session: &Session,
    ) -> Result<Replacement, ScheduleError> {
        let mut guard = InFlight(self);
        let result = guard.0.run(api, session).await;
        result
    }

    async fn run(&mut self, api: &dyn SchoolApi, session: &Session) -> Result<Replacement, ScheduleError> {
        if self.is_busy() {
            return Err(ScheduleError::SubmitInProgress);
        }
        if !self.is_open() {
            return Err(ScheduleError::WorkflowNotOpen);
        }
        if let CancelReplaceState::Succeeded { .. } = self.state {
            return Err(ScheduleError::WorkflowNotOpen);
        }

        let (target, replacement, reason) = match self.pending_replacement().cloned() {
            Some(replacement) => {
                let reason = self.retry_reason()?.to_string();
                let target = self.target.clone().ok_or(ScheduleError::WorkflowNotOpen)?;
                debug!("retrying cancel of slot {} replaced by {}", target.id, replacement.id);
                (target, replacement, reason)
            }
            None => {
                let (target, blank, reason) = self.validate()?;
                let target = target.clone();
                let new_slot = NewSlot::replacing(blank, &target.class.id);
                let reason = reason.to_string();
                self.state = CancelReplaceState::CreatingReplacement;
                info!(
                    "creating replacement for slot {} at {} shift {}",
                    target.id, new_slot.date, new_slot.shift
                );
                match api.create_replacement_slot(session, &new_slot).await {
                    Ok(replacement) => (target, replacement, reason),
                    Err(err) => {
                        error!("failed to create replacement for slot {}: {:#}", target.id, err);
                        self.state = CancelReplaceState::Failed {
                            error: format!("{:#}", err),
                        };
                        return Err(ScheduleError::mutation(err));
                    }
                }
            }
        };

        self.state = CancelReplaceState::Cancelling {
            replacement: replacement.clone(),
        };
        if let Err(err) = api.cancel_slot(session, &target.id, &reason).await {
            error!(
                "replacement slot {} created but slot {} was not cancelled: {:#}",
                replacement.id, target.id, err
            );
            self.mark_partial(&target.id, replacement, format!("{:#}", err));
            return Err(ScheduleError::mutation(err));
        }

        self.pending.retain(|(original, _)| !same_id(original, &target.id));
        let mut original = target;
        original.cancel(&reason)?;
        info!("slot {} replaced by {}", original.id, replacement.id);
        self.state = CancelReplaceState::Succeeded {
            replacement: replacement.clone(),
        };
        Ok(Replacement {
            original,
            replacement,
        })
    }

    fn retry_reason(&self) -> Result<&str, ScheduleError> {
        self.reason
            .as_ref()
            .ok_or(ScheduleError::EmptyCancelReason)?
            .text()
    }

    fn mark_partial(&mut self, original_id: &str, replacement: LessonSlot, error: String) {
        if self.pending.iter().all(|(original, _)| !same_id(original, original_id)) {
            self.pending.push((original_id.to_string(), replacement.clone()));
        }
        self.state = CancelReplaceState::PartiallyFailed { replacement, error };
    }

    fn interrupt(&mut self) {
        match std::mem::replace(&mut self.state, CancelReplaceState::Idle) {
            CancelReplaceState::CreatingReplacement => {
                error!("replacement request was interrupted, its outcome is unknown");
                self.state = CancelReplaceState::Failed {
                    error: "request was interrupted".to_string(),
                };
            }
            CancelReplaceState::Cancelling { replacement } => {
                let original_id = self.target.as_ref().map(|t| t.id.clone()).unwrap_or_default();
                error!(
                    "cancel of slot {} was interrupted, replacement {} stays active",
                    original_id, replacement.id
                );
                self.mark_partial(&original_id, replacement, "request was interrupted".to_string());
            }
            state => self.state = state,
        }
    }

    fn ensure_editable(&self) -> Result<(), ScheduleError> {
        if self.is_busy() {
            return Err(ScheduleError::SubmitInProgress);
        }
        if self.target.is_none() {
            return Err(ScheduleError::WorkflowNotOpen);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use futures_util::FutureExt;
    use model::slot::SlotStatus;

    use super::*;
    use crate::mock::{blank, date, session, slot, MockApi};

    fn open_dialog(api: &MockApi) -> CancelReplace {
        let target = slot("s1", date(5), 2, SlotStatus::NotStarted);
        api.slots.lock().push(target.clone());
        let mut dialog = CancelReplace::new();
        dialog
            .open(target, vec![blank(date(7), 4), blank(date(8), 1)])
            .unwrap();
        dialog
    }

    fn ready(api: &MockApi) -> CancelReplace {
        let mut dialog = open_dialog(api);
        dialog.select_blank(0).unwrap();
        dialog
            .set_reason(CancelReason::Preset("Teacher is sick".to_string()))
            .unwrap();
        dialog
    }

    #[tokio::test]
    async fn test_creates_before_cancelling() {
        let api = MockApi::default();
        let mut dialog = ready(&api);
        assert!(dialog.can_submit());

        let result = dialog.submit(&api, &session()).await.unwrap();
        assert_eq!(api.calls(), vec!["create_replacement_slot", "cancel_slot"]);
        assert_eq!(result.original.status, SlotStatus::Cancelled);
        assert_eq!(result.original.cancel_note.as_deref(), Some("Teacher is sick"));
        assert_eq!(result.replacement.date, date(7));
        assert_eq!(result.replacement.shift, 4);
        assert!(matches!(dialog.state(), CancelReplaceState::Succeeded { .. }));
    }

    #[tokio::test]
    async fn test_create_failure_never_cancels() {
        let api = MockApi::default();
        api.fail_on("create_replacement_slot");
        let mut dialog = ready(&api);

        let err = dialog.submit(&api, &session()).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Mutation(_)));
        assert_eq!(api.count("cancel_slot"), 0);
        assert!(matches!(dialog.state(), CancelReplaceState::Failed { .. }));
        assert_eq!(dialog.target().unwrap().status, SlotStatus::NotStarted);
        assert!(dialog.can_submit());
    }

    #[tokio::test]
    async fn test_cancel_failure_leaves_both_slots_visible() {
        let api = MockApi::default();
        api.fail_on("cancel_slot");
        let mut dialog = ready(&api);

        let err = dialog.submit(&api, &session()).await.unwrap_err();
        assert!(matches!(err, ScheduleError::Mutation(_)));
        match dialog.state() {
            CancelReplaceState::PartiallyFailed { replacement, error } => {
                assert_eq!(replacement.date, date(7));
                assert!(error.contains("cancel_slot failed"));
            }
            other => panic!("unexpected state {:?}", other),
        }
        assert_eq!(dialog.target().unwrap().status, SlotStatus::NotStarted);
        let active = api
            .slots
            .lock()
            .iter()
            .filter(|s| !s.is_cancelled())
            .count();
        assert_eq!(active, 2);
    }

    #[tokio::test]
    async fn test_retry_after_partial_failure_only_cancels() {
        let api = MockApi::default();
        api.fail_on("cancel_slot");
        let mut dialog = ready(&api);
        dialog.submit(&api, &session()).await.unwrap_err();

        api.recover("cancel_slot");
        let result = dialog.submit(&api, &session()).await.unwrap();
        assert_eq!(api.count("create_replacement_slot"), 1);
        assert_eq!(api.count("cancel_slot"), 2);
        assert_eq!(result.original.status, SlotStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_reopen_after_partial_failure_only_cancels() {
        let api = MockApi::default();
        api.fail_on("cancel_slot");
        let mut dialog = ready(&api);
        dialog.submit(&api, &session()).await.unwrap_err();
        let created = dialog.pending_replacement().cloned().unwrap();

        assert!(dialog.close());
        assert!(dialog.pending_replacement().is_none());

        api.recover("cancel_slot");
        let target = slot("S1", date(5), 2, SlotStatus::NotStarted);
        dialog.open(target, vec![]).unwrap();
        assert_eq!(dialog.pending_replacement(), Some(&created));
        assert!(!dialog.can_submit());
        dialog
            .set_reason(CancelReason::Preset("Teacher is sick".to_string()))
            .unwrap();
        assert!(dialog.can_submit());

        let result = dialog.submit(&api, &session()).await.unwrap();
        assert_eq!(result.replacement, created);
        assert_eq!(api.count("create_replacement_slot"), 1);
        assert_eq!(api.count("cancel_slot"), 2);
        assert!(dialog.pending_replacement().is_none());
    }

    #[tokio::test]
    async fn test_other_slot_still_creates() {
        let api = MockApi::default();
        api.fail_on("cancel_slot");
        let mut dialog = ready(&api);
        dialog.submit(&api, &session()).await.unwrap_err();
        dialog.close();
        api.recover("cancel_slot");

        let other = slot("s2", date(6), 3, SlotStatus::NotStarted);
        api.slots.lock().push(other.clone());
        dialog.open(other, vec![blank(date(8), 1)]).unwrap();
        assert!(dialog.pending_replacement().is_none());
        dialog.select_blank(0).unwrap();
        dialog
            .set_reason(CancelReason::Preset("Holiday".to_string()))
            .unwrap();
        dialog.submit(&api, &session()).await.unwrap();
        assert_eq!(api.count("create_replacement_slot"), 2);
    }

    #[test]
    fn test_dropped_create_settles_to_failed() {
        let api = MockApi::default();
        api.stall_on("create_replacement_slot");
        let mut dialog = ready(&api);

        assert!(dialog.submit(&api, &session()).now_or_never().is_none());
        assert!(!dialog.is_busy());
        assert!(matches!(dialog.state(), CancelReplaceState::Failed { .. }));
        assert!(dialog.set_reason(CancelReason::Preset("Holiday".to_string())).is_ok());
        assert!(dialog.close());
    }

    #[test]
    fn test_dropped_cancel_keeps_replacement() {
        let api = MockApi::default();
        api.stall_on("cancel_slot");
        let mut dialog = ready(&api);

        assert!(dialog.submit(&api, &session()).now_or_never().is_none());
        assert!(!dialog.is_busy());
        assert!(matches!(dialog.state(), CancelReplaceState::PartiallyFailed { .. }));
        assert!(dialog.pending_replacement().is_some());

        api.stall.lock().clear();
        let result = dialog.submit(&api, &session()).now_or_never().unwrap().unwrap();
        assert_eq!(result.original.status, SlotStatus::Cancelled);
        assert_eq!(api.count("create_replacement_slot"), 1);
    }

    #[tokio::test]
    async fn test_no_blank_slots_rejects_submit() {
        let api = MockApi::default();
        let mut dialog = CancelReplace::new();
        dialog
            .open(slot("s1", date(5), 2, SlotStatus::NotStarted), vec![])
            .unwrap();
        dialog
            .set_reason(CancelReason::Preset("Holiday".to_string()))
            .unwrap();
        assert!(!dialog.can_submit());

        let err = dialog.submit(&api, &session()).await.unwrap_err();
        assert!(matches!(err, ScheduleError::NoBlankSlots));
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_reason_or_selection() {
        let api = MockApi::default();
        let mut dialog = open_dialog(&api);
        assert!(matches!(
            dialog.submit(&api, &session()).await,
            Err(ScheduleError::EmptyCancelReason)
        ));
        dialog
            .set_reason(CancelReason::pick("Other", "  "))
            .unwrap();
        assert!(matches!(dialog.validate(), Err(ScheduleError::EmptyCancelReason)));
        dialog
            .set_reason(CancelReason::pick("Other", "piano is being tuned"))
            .unwrap();
        assert!(matches!(dialog.validate(), Err(ScheduleError::NoBlankSlotSelected)));
        assert!(dialog.select_blank(5).is_err());
        assert!(api.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_ids_are_rejected_locally() {
        let api = MockApi::default();
        let mut target = slot("s1", date(5), 2, SlotStatus::NotStarted);
        target.room.id = "room-7".to_string();
        let mut dialog = CancelReplace::new();
        dialog.open(target, vec![blank(date(7), 4)]).unwrap();
        dialog.select_blank(0).unwrap();
        dialog
            .set_reason(CancelReason::Preset("Holiday".to_string()))
            .unwrap();

        let err = dialog.submit(&api, &session()).await.unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidIdentifier { field: "room", .. }));
        assert!(err.is_validation());
        assert!(api.calls().is_empty());
        assert_eq!(dialog.state(), &CancelReplaceState::AwaitingSelection);
    }

    #[test]
    fn test_only_cancellable_slots_open() {
        let mut dialog = CancelReplace::new();
        for status in [SlotStatus::Ongoing, SlotStatus::Cancelled] {
            let err = dialog
                .open(slot("s1", date(5), 2, status), vec![blank(date(7), 4)])
                .unwrap_err();
            assert!(matches!(err, ScheduleError::SlotNotCancellable { .. }));
        }
        assert!(!dialog.is_open());
    }

    #[tokio::test]
    async fn test_close_resets() {
        let api = MockApi::default();
        let mut dialog = ready(&api);
        assert!(dialog.close());
        assert!(!dialog.is_open());
        assert!(dialog.target().is_none());
        assert!(matches!(
            dialog.submit(&api, &session()).await,
            Err(ScheduleError::WorkflowNotOpen)
        ));
    }
}

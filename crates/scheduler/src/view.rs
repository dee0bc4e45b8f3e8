use api::PushHub;
use log::{debug, error};
use model::{
    errors::ScheduleError,
    filter::{FilterCriteria, FilterOptions},
    ids::{same_id, WeekId},
    notification::PushMessage,
    session::Session,
    slot::LessonSlot,
};

use crate::{
    attendance::{self, AttendanceSync, SyncMode},
    grid::WeekGrid,
    workflow::{CancelReplace, CancelReplaceState, Replacement},
    Scheduler,
};

/// Applied filter plus the draft being edited in the filter panel.
#[derive(Debug, Clone, Default)]
pub struct FilterPanel {
    applied: FilterCriteria,
    draft: FilterCriteria,
    open: bool,
}

impl FilterPanel {
    pub fn new(applied: FilterCriteria) -> Self {
        FilterPanel {
            draft: applied.clone(),
            applied,
            open: false,
        }
    }

    pub fn applied(&self) -> &FilterCriteria {
        &self.applied
    }

    pub fn draft(&self) -> &FilterCriteria {
        &self.draft
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn open(&mut self) {
        self.draft = self.applied.clone();
        self.open = true;
    }

    pub fn draft_mut(&mut self) -> &mut FilterCriteria {
        if !self.open {
            self.open();
        }
        &mut self.draft
    }

    /// Makes the draft the active filter. Returns true if it differs from the previous one.
    pub fn commit(&mut self) -> bool {
        self.open = false;
        if self.draft == self.applied {
            return false;
        }
        self.applied = self.draft.clone();
        true
    }

    pub fn discard(&mut self) {
        self.draft = self.applied.clone();
        self.open = false;
    }
}

/// Identifies the request a response belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    week: WeekId,
}

impl LoadTicket {
    pub fn week(&self) -> WeekId {
        self.week
    }
}

/// State of the weekly schedule screen.
pub struct ScheduleView {
    week: WeekId,
    slots: Vec<LessonSlot>,
    grid: WeekGrid,
    filter: FilterPanel,
    loading: bool,
    notice: Option<String>,
    cancel_dialog: CancelReplace,
    sync: AttendanceSync,
    generation: u64,
}

impl ScheduleView {
    pub fn new(week: WeekId, session: &Session, mode: SyncMode) -> Self {
        let filter = FilterCriteria {
            student_id: session.student_id().map(str::to_string),
            ..FilterCriteria::default()
        };
        ScheduleView {
            week,
            slots: Vec::new(),
            grid: WeekGrid::empty(week),
            filter: FilterPanel::new(filter),
            loading: false,
            notice: None,
            cancel_dialog: CancelReplace::new(),
            sync: AttendanceSync::new(mode),
            generation: 0,
        }
    }

    pub fn week(&self) -> WeekId {
        self.week
    }

    pub fn slots(&self) -> &[LessonSlot] {
        &self.slots
    }

    pub fn grid(&self) -> &WeekGrid {
        &self.grid
    }

    pub fn filter(&self) -> &FilterPanel {
        &self.filter
    }

    pub fn filter_mut(&mut self) -> &mut FilterPanel {
        &mut self.filter
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn take_notice(&mut self) -> Option<String> {
        self.notice.take()
    }

    pub fn cancel_dialog(&self) -> &CancelReplace {
        &self.cancel_dialog
    }

    pub fn cancel_dialog_mut(&mut self) -> &mut CancelReplace {
        &mut self.cancel_dialog
    }

    /// The whole screen is blocked while the cancel dialog talks to the backend.
    pub fn is_blocked(&self) -> bool {
        self.cancel_dialog.is_busy()
    }

    /// Loaded slots passing the applied filter.
    pub fn visible_slots(&self) -> Vec<&LessonSlot> {
        self.slots
            .iter()
            .filter(|slot| self.filter.applied().matches(slot))
            .collect()
    }

    /// Filter choices present in the loaded week.
    pub fn options(&self) -> FilterOptions {
        FilterOptions::from_slots(&self.slots)
    }

    pub fn can_go_next(&self) -> bool {
        self.week.has_next()
    }

    pub fn can_go_prev(&self) -> bool {
        self.week.has_prev()
    }

    pub fn begin_load(&mut self, week: WeekId) -> LoadTicket {
        self.generation += 1;
        self.loading = true;
        LoadTicket {
            generation: self.generation,
            week,
        }
    }

    /// Applies a load result unless a newer load was started meanwhile. A failed
    /// load keeps the previously displayed week.
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<Vec<LessonSlot>, ScheduleError>,
    ) -> Result<(), ScheduleError> {
        if ticket.generation != self.generation {
            debug!(
                "dropping stale response for week {}/{}",
                ticket.week.week(),
                ticket.week.year()
            );
            return Ok(());
        }
        self.loading = false;
        match result {
            Ok(slots) => {
                self.week = ticket.week;
                self.slots = slots;
                self.rebuild_grid();
                Ok(())
            }
            Err(err) => {
                self.notice = Some(err.to_string());
                Err(err)
            }
        }
    }

    pub async fn load(
        &mut self,
        scheduler: &Scheduler,
        session: &Session,
        week: WeekId,
    ) -> Result<(), ScheduleError> {
        let ticket = self.begin_load(week);
        let result = scheduler.get_week(session, week, self.filter.applied()).await;
        self.finish_load(ticket, result)
    }

    pub async fn reload(&mut self, scheduler: &Scheduler, session: &Session) -> Result<(), ScheduleError> {
        self.load(scheduler, session, self.week).await
    }

    pub async fn next_week(&mut self, scheduler: &Scheduler, session: &Session) -> Result<(), ScheduleError> {
        let next = self.week.next().ok_or(ScheduleError::WeekOutOfRange {
            year: self.week.year(),
            week: self.week.week() + 1,
        })?;
        self.load(scheduler, session, next).await
    }

    pub async fn prev_week(&mut self, scheduler: &Scheduler, session: &Session) -> Result<(), ScheduleError> {
        let prev = self.week.prev().ok_or(ScheduleError::WeekOutOfRange {
            year: self.week.year(),
            week: self.week.week().saturating_sub(1),
        })?;
        self.load(scheduler, session, prev).await
    }

    /// Commits the filter draft and re-fetches if the filter changed.
    pub async fn apply_filter(
        &mut self,
        scheduler: &Scheduler,
        session: &Session,
    ) -> Result<bool, ScheduleError> {
        if !self.filter.commit() {
            return Ok(false);
        }
        self.rebuild_grid();
        self.reload(scheduler, session).await?;
        Ok(true)
    }

    pub fn discard_filter(&mut self) {
        self.filter.discard();
    }

    /// Opens the cancel dialog for a displayed slot and returns the reason options.
    pub async fn open_cancel_dialog(
        &mut self,
        scheduler: &Scheduler,
        session: &Session,
        slot_id: &str,
    ) -> Result<Vec<String>, ScheduleError> {
        if self.cancel_dialog.is_busy() {
            return Err(ScheduleError::SubmitInProgress);
        }
        let slot = self
            .slots
            .iter()
            .find(|s| same_id(&s.id, slot_id))
            .cloned()
            .ok_or_else(|| ScheduleError::SlotNotFound(slot_id.to_string()))?;
        if !slot.status.can_be_cancelled() {
            return Err(ScheduleError::SlotNotCancellable {
                slot_id: slot.id,
                status: slot.status,
            });
        }

        let loaded = match scheduler.blank_slots(session, self.week).await {
            Ok(blank_slots) => scheduler
                .cancel_reasons(session)
                .await
                .map(|reasons| (blank_slots, reasons)),
            Err(err) => Err(err),
        };
        let (blank_slots, reasons) = loaded.map_err(|err| {
            self.notice = Some(err.to_string());
            err
        })?;
        self.cancel_dialog.open(slot, blank_slots)?;
        Ok(reasons)
    }

    /// Submits the cancel dialog. On success the result is merged locally and the
    /// week is reloaded; on failure the dialog stays open.
    pub async fn submit_cancel(
        &mut self,
        scheduler: &Scheduler,
        session: &Session,
    ) -> Result<Replacement, ScheduleError> {
        match self.cancel_dialog.submit(scheduler.api(), session).await {
            Ok(replacement) => {
                self.apply_replacement(&replacement);
                self.cancel_dialog.close();
                if let Err(err) = self.reload(scheduler, session).await {
                    debug!("reload after replacement failed: {}", err);
                }
                Ok(replacement)
            }
            Err(err) => {
                let partial = match (self.cancel_dialog.state(), self.cancel_dialog.target()) {
                    (CancelReplaceState::PartiallyFailed { replacement, error }, Some(target)) => {
                        Some((replacement.clone(), target.id.clone(), error.clone()))
                    }
                    _ => None,
                };
                match partial {
                    Some((replacement, target_id, error)) => {
                        self.notice = Some(format!(
                            "Replacement slot {} was created but slot {} was not cancelled: {}",
                            replacement.id, target_id, error
                        ));
                        self.merge_slot(replacement);
                        self.rebuild_grid();
                    }
                    None => self.notice = Some(err.to_string()),
                }
                Err(err)
            }
        }
    }

    pub fn close_cancel_dialog(&mut self) -> bool {
        self.cancel_dialog.close()
    }

    /// Marks the original cancelled and adds the replacement to the loaded slots.
    pub fn apply_replacement(&mut self, replacement: &Replacement) {
        let note = replacement.original.cancel_note.as_deref().unwrap_or_default();
        if let Some(original) = self
            .slots
            .iter_mut()
            .find(|s| same_id(&s.id, &replacement.original.id))
        {
            if !original.is_cancelled() {
                if let Err(err) = original.cancel(note) {
                    error!("failed to cancel slot {} locally: {}", original.id, err);
                }
            }
        }
        self.merge_slot(replacement.replacement.clone());
        self.rebuild_grid();
    }

    fn merge_slot(&mut self, slot: LessonSlot) {
        if !self.slots.iter().any(|s| same_id(&s.id, &slot.id)) {
            self.slots.push(slot);
        }
    }

    /// Replaces a loaded slot with a newer copy. A cancelled slot is never revived.
    pub fn apply_slot_update(&mut self, updated: LessonSlot) -> bool {
        let Some(slot) = self.slots.iter_mut().find(|s| same_id(&s.id, &updated.id)) else {
            return false;
        };
        if slot.is_cancelled() && !updated.is_cancelled() {
            debug!("ignoring update that would revive cancelled slot {}", slot.id);
            return false;
        }
        *slot = updated;
        self.rebuild_grid();
        true
    }

    pub fn mount(&mut self, hub: &PushHub, topic_filter: &str) {
        self.sync.mount(hub, topic_filter);
    }

    pub fn unmount(&mut self) {
        self.sync.unmount();
    }

    pub fn is_mounted(&self) -> bool {
        self.sync.is_mounted()
    }

    pub async fn on_push(
        &mut self,
        scheduler: &Scheduler,
        session: &Session,
        message: &PushMessage,
    ) -> Result<usize, ScheduleError> {
        if !message.is_attendance_change() {
            return Ok(0);
        }
        self.refresh_attendance(scheduler, session).await
    }

    /// Handles the notifications queued since the last call.
    pub async fn sync_pending(
        &mut self,
        scheduler: &Scheduler,
        session: &Session,
    ) -> Result<usize, ScheduleError> {
        if !self.sync.take_pending() {
            return Ok(0);
        }
        self.refresh_attendance(scheduler, session).await
    }

    /// Re-reads attendance for the displayed slots, or the whole week, per the sync mode.
    pub async fn refresh_attendance(
        &mut self,
        scheduler: &Scheduler,
        session: &Session,
    ) -> Result<usize, ScheduleError> {
        match self.sync.mode() {
            SyncMode::WholeWeek => {
                self.reload(scheduler, session).await?;
                Ok(self.slots.len())
            }
            SyncMode::PerSlot => {
                let Some(student_id) = session.student_id() else {
                    return Ok(0);
                };
                let displayed = self.visible_slots().into_iter().cloned().collect::<Vec<_>>();
                let fetched = attendance::refetch(scheduler.api(), session, &displayed).await;
                let updated = attendance::reconcile(&mut self.slots, fetched, student_id);
                if updated > 0 {
                    self.rebuild_grid();
                }
                Ok(updated)
            }
        }
    }

    fn rebuild_grid(&mut self) {
        let filter = self.filter.applied();
        self.grid = WeekGrid::build(self.week, self.slots.iter().filter(|s| filter.matches(s)));
    }
}

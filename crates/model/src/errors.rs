use thiserror::Error;

use crate::slot::SlotStatus;

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("Common error: {0}")]
    Eyre(#[from] eyre::Error),
    #[error("Failed to load data: {0:#}")]
    Fetch(eyre::Error),
    #[error("Failed to save changes: {0:#}")]
    Mutation(eyre::Error),
    #[error("Invalid {field} identifier: {value:?}")]
    InvalidIdentifier { field: &'static str, value: String },
    #[error("Unknown shift: {0}")]
    UnknownShift(i32),
    #[error("Week {week} of {year} is out of range")]
    WeekOutOfRange { year: i32, week: u32 },
    #[error("Invalid date: {0:?}")]
    InvalidDate(String),
    #[error("Cancellation reason is required")]
    EmptyCancelReason,
    #[error("There are no free slots in this week")]
    NoBlankSlots,
    #[error("Select a free slot for the replacement lesson")]
    NoBlankSlotSelected,
    #[error("Free slot {0} does not exist")]
    BlankSlotOutOfRange(usize),
    #[error("Slot {slot_id} can not be cancelled in status {status:?}")]
    SlotNotCancellable { slot_id: String, status: SlotStatus },
    #[error("Slot {0} is already cancelled")]
    SlotAlreadyCancelled(String),
    #[error("Slot {0} not found")]
    SlotNotFound(String),
    #[error("Request is already in progress")]
    SubmitInProgress,
    #[error("Dialog is not open")]
    WorkflowNotOpen,
    #[error("Select a teacher")]
    TeacherNotSelected,
    #[error("Teacher {0} is not available for this slot")]
    TeacherNotAvailable(String),
    #[error("Reassignment reason is required")]
    EmptyReassignReason,
}

impl ScheduleError {
    /// Errors caught before any backend call was made.
    pub fn is_validation(&self) -> bool {
        !matches!(
            self,
            ScheduleError::Eyre(_) | ScheduleError::Fetch(_) | ScheduleError::Mutation(_)
        )
    }

    pub fn fetch(err: impl Into<eyre::Error>) -> Self {
        ScheduleError::Fetch(err.into())
    }

    pub fn mutation(err: impl Into<eyre::Error>) -> Self {
        ScheduleError::Mutation(err.into())
    }
}

pub mod http;
pub mod push;
pub mod query;

use async_trait::async_trait;
use eyre::Result;
use model::{
    attendance::AttendanceRecord,
    filter::FilterCriteria,
    session::Session,
    slot::{BlankSlot, LessonSlot, NewSlot, Teacher},
};
use time::range::DateRange;

pub use http::HttpApi;
pub use push::{PushHub, Subscription};

/// Backend operations used by the scheduling screens.
#[async_trait]
pub trait SchoolApi: Send + Sync {
    async fn list_slots(
        &self,
        session: &Session,
        range: DateRange,
        filter: &FilterCriteria,
    ) -> Result<Vec<LessonSlot>>;

    async fn get_slot(&self, session: &Session, id: &str) -> Result<LessonSlot>;

    async fn list_blank_slots(&self, session: &Session, range: DateRange)
        -> Result<Vec<BlankSlot>>;

    async fn cancel_slot(&self, session: &Session, id: &str, reason: &str) -> Result<()>;

    async fn create_replacement_slot(&self, session: &Session, slot: &NewSlot)
        -> Result<LessonSlot>;

    async fn get_attendance_status(
        &self,
        session: &Session,
        slot_id: &str,
    ) -> Result<Vec<AttendanceRecord>>;

    async fn update_attendance(
        &self,
        session: &Session,
        slot_id: &str,
        records: &[AttendanceRecord],
    ) -> Result<()>;

    async fn list_available_teachers(&self, session: &Session, slot_id: &str)
        -> Result<Vec<Teacher>>;

    async fn reassign_teacher(
        &self,
        session: &Session,
        slot_id: &str,
        teacher_id: &str,
        reason: &str,
    ) -> Result<()>;

    async fn get_cancel_reason_options(&self, session: &Session) -> Result<Vec<String>>;
}

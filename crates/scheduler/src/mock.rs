use std::collections::HashMap;

use api::SchoolApi;
use async_trait::async_trait;
use chrono::NaiveDate;
use eyre::{eyre, Result};
use model::{
    attendance::AttendanceRecord,
    filter::FilterCriteria,
    ids::same_id,
    session::Session,
    slot::{BlankSlot, ClassRef, LessonSlot, NewSlot, RoomRef, SlotStatus, Teacher},
};
use parking_lot::Mutex;
use time::range::DateRange;

pub const ROOM_ID: &str = "a1b2c3d4-0000-0000-0000-000000000001";
pub const CLASS_ID: &str = "c1a55000-0000-0000-0000-000000000001";

pub fn session() -> Session {
    Session::new("token", Some("ST-1".to_string()))
}

pub fn date(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
}

pub fn slot(id: &str, date: NaiveDate, shift: i32, status: SlotStatus) -> LessonSlot {
    LessonSlot {
        id: id.to_string(),
        date,
        shift,
        status,
        room: RoomRef {
            id: ROOM_ID.to_string(),
            name: "Room A".to_string(),
        },
        class: ClassRef {
            id: CLASS_ID.to_string(),
            name: "Piano Basics".to_string(),
            instructor_id: "teacher-1".to_string(),
            instructor_name: "Ms. Lan".to_string(),
        },
        cancel_note: None,
        attendance: None,
        slot_no: 1,
        total_slots: 24,
    }
}

pub fn blank(date: NaiveDate, shift: i32) -> BlankSlot {
    BlankSlot {
        room: RoomRef {
            id: "b1b2c3d4-0000-0000-0000-000000000002".to_string(),
            name: "Room B".to_string(),
        },
        date,
        shift,
    }
}

/// In-memory backend recording the calls it receives.
#[derive(Default)]
pub struct MockApi {
    pub calls: Mutex<Vec<String>>,
    pub slots: Mutex<Vec<LessonSlot>>,
    pub blank_slots: Mutex<Vec<BlankSlot>>,
    pub attendance: Mutex<HashMap<String, Vec<AttendanceRecord>>>,
    pub teachers: Mutex<Vec<Teacher>>,
    pub reasons: Mutex<Vec<String>>,
    pub fail: Mutex<Vec<&'static str>>,
    pub stall: Mutex<Vec<&'static str>>,
}

impl MockApi {
    pub fn with_slots(slots: Vec<LessonSlot>) -> Self {
        let api = MockApi::default();
        *api.slots.lock() = slots;
        api
    }

    pub fn fail_on(&self, call: &'static str) {
        self.fail.lock().push(call);
    }

    pub fn recover(&self, call: &'static str) {
        self.fail.lock().retain(|c| *c != call);
    }

    /// The call is recorded and then never resolves.
    pub fn stall_on(&self, call: &'static str) {
        self.stall.lock().push(call);
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().iter().filter(|c| c.as_str() == call).count()
    }

    fn record(&self, call: &'static str) -> Result<()> {
        self.calls.lock().push(call.to_string());
        if self.fail.lock().contains(&call) {
            return Err(eyre!("{} failed", call));
        }
        Ok(())
    }

    async fn gate(&self, call: &'static str) {
        let stalled = self.stall.lock().contains(&call);
        if stalled {
            std::future::pending::<()>().await;
        }
    }
}

#[async_trait]
impl SchoolApi for MockApi {
    async fn list_slots(
        &self,
        _: &Session,
        range: DateRange,
        filter: &FilterCriteria,
    ) -> Result<Vec<LessonSlot>> {
        self.record("list_slots")?;
        Ok(self
            .slots
            .lock()
            .iter()
            .filter(|s| range.contains(s.date) && filter.matches(s))
            .cloned()
            .collect())
    }

    async fn get_slot(&self, _: &Session, id: &str) -> Result<LessonSlot> {
        self.record("get_slot")?;
        self.slots
            .lock()
            .iter()
            .find(|s| same_id(&s.id, id))
            .cloned()
            .ok_or_else(|| eyre!("slot {} not found", id))
    }

    async fn list_blank_slots(&self, _: &Session, range: DateRange) -> Result<Vec<BlankSlot>> {
        self.record("list_blank_slots")?;
        Ok(self
            .blank_slots
            .lock()
            .iter()
            .filter(|b| range.contains(b.date))
            .cloned()
            .collect())
    }

    async fn cancel_slot(&self, _: &Session, id: &str, reason: &str) -> Result<()> {
        self.record("cancel_slot")?;
        self.gate("cancel_slot").await;
        let mut slots = self.slots.lock();
        let slot = slots
            .iter_mut()
            .find(|s| same_id(&s.id, id))
            .ok_or_else(|| eyre!("slot {} not found", id))?;
        slot.cancel(reason).map_err(|e| eyre!("{}", e))
    }

    async fn create_replacement_slot(&self, _: &Session, new: &NewSlot) -> Result<LessonSlot> {
        self.record("create_replacement_slot")?;
        self.gate("create_replacement_slot").await;
        let mut slots = self.slots.lock();
        let mut created = slot(
            &format!("replacement-{}", slots.len()),
            new.date,
            new.shift,
            SlotStatus::NotStarted,
        );
        created.room.id = new.room_id.clone();
        created.class.id = new.class_id.clone();
        slots.push(created.clone());
        Ok(created)
    }

    async fn get_attendance_status(
        &self,
        _: &Session,
        slot_id: &str,
    ) -> Result<Vec<AttendanceRecord>> {
        self.record("get_attendance_status")?;
        Ok(self
            .attendance
            .lock()
            .get(slot_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn update_attendance(
        &self,
        _: &Session,
        slot_id: &str,
        records: &[AttendanceRecord],
    ) -> Result<()> {
        self.record("update_attendance")?;
        self.attendance
            .lock()
            .insert(slot_id.to_string(), records.to_vec());
        Ok(())
    }

    async fn list_available_teachers(&self, _: &Session, _: &str) -> Result<Vec<Teacher>> {
        self.record("list_available_teachers")?;
        Ok(self.teachers.lock().clone())
    }

    async fn reassign_teacher(
        &self,
        _: &Session,
        slot_id: &str,
        teacher_id: &str,
        _: &str,
    ) -> Result<()> {
        self.record("reassign_teacher")?;
        let teacher = self
            .teachers
            .lock()
            .iter()
            .find(|t| same_id(&t.id, teacher_id))
            .cloned()
            .ok_or_else(|| eyre!("teacher {} not found", teacher_id))?;
        if let Some(slot) = self.slots.lock().iter_mut().find(|s| same_id(&s.id, slot_id)) {
            slot.class.instructor_id = teacher.id;
            slot.class.instructor_name = teacher.name;
        }
        Ok(())
    }

    async fn get_cancel_reason_options(&self, _: &Session) -> Result<Vec<String>> {
        self.record("get_cancel_reason_options")?;
        Ok(self.reasons.lock().clone())
    }
}

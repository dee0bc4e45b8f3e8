use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::{
    attendance::AttendanceRecord,
    errors::ScheduleError,
    ids::same_id,
    shift::Shift,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SlotStatus {
    NotStarted,
    Ongoing,
    Finished,
    Cancelled,
}

impl SlotStatus {
    pub fn can_be_cancelled(&self) -> bool {
        matches!(self, SlotStatus::NotStarted | SlotStatus::Finished)
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, SlotStatus::Cancelled)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RoomRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ClassRef {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub instructor_id: String,
    #[serde(default)]
    pub instructor_name: String,
}

/// One scheduled (or cancelled) lesson.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonSlot {
    pub id: String,
    #[serde(deserialize_with = "api_date")]
    pub date: NaiveDate,
    /// Raw shift number as sent by the backend; see [`LessonSlot::shift`].
    pub shift: i32,
    pub status: SlotStatus,
    pub room: RoomRef,
    pub class: ClassRef,
    #[serde(default)]
    pub cancel_note: Option<String>,
    #[serde(default)]
    pub attendance: Option<Vec<AttendanceRecord>>,
    #[serde(default)]
    pub slot_no: u32,
    #[serde(default)]
    pub total_slots: u32,
}

impl LessonSlot {
    pub fn shift(&self) -> Option<Shift> {
        Shift::from_number(self.shift)
    }

    pub fn is_cancelled(&self) -> bool {
        self.status.is_cancelled()
    }

    pub fn instructor_id(&self) -> &str {
        &self.class.instructor_id
    }

    /// Moves the slot to a new status. A cancelled slot stays cancelled.
    pub fn set_status(&mut self, status: SlotStatus) -> Result<(), ScheduleError> {
        if self.is_cancelled() && status != SlotStatus::Cancelled {
            return Err(ScheduleError::SlotAlreadyCancelled(self.id.clone()));
        }
        self.status = status;
        Ok(())
    }

    pub fn cancel(&mut self, reason: &str) -> Result<(), ScheduleError> {
        if self.is_cancelled() {
            return Err(ScheduleError::SlotAlreadyCancelled(self.id.clone()));
        }
        self.status = SlotStatus::Cancelled;
        self.cancel_note = Some(reason.to_string());
        Ok(())
    }

    pub fn attendance_of(&self, student_id: &str) -> Option<&AttendanceRecord> {
        self.attendance
            .as_ref()?
            .iter()
            .find(|record| same_id(&record.student_id, student_id))
    }

    /// "3/24" style progress label.
    pub fn progress(&self) -> String {
        format!("{}/{}", self.slot_no, self.total_slots)
    }
}

/// A (room, date, shift) without a class, usable as a replacement target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlankSlot {
    pub room: RoomRef,
    #[serde(deserialize_with = "api_date")]
    pub date: NaiveDate,
    pub shift: i32,
}

impl BlankSlot {
    pub fn shift(&self) -> Option<Shift> {
        Shift::from_number(self.shift)
    }
}

/// Payload for issuing a new slot of an existing class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSlot {
    pub room_id: String,
    pub date: NaiveDate,
    pub shift: i32,
    pub class_id: String,
}

impl NewSlot {
    pub fn replacing(blank: &BlankSlot, class_id: &str) -> NewSlot {
        NewSlot {
            room_id: blank.room.id.clone(),
            date: blank.date,
            shift: blank.shift,
            class_id: class_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

/// Accepts both `2024-03-04` and `2024-03-04T00:00:00` style dates.
fn api_date<'de, D>(deserializer: D) -> Result<NaiveDate, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    let date_part = raw.get(..10).unwrap_or(&raw);
    time::parse_query(date_part)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {}", raw)))
}

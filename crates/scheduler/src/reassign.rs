use api::SchoolApi;
use log::{error, info};
use model::{
    errors::ScheduleError,
    ids::same_id,
    session::Session,
    slot::{LessonSlot, Teacher},
};

/// Hands a slot over to another available teacher.
#[derive(Debug, Clone)]
pub struct Reassignment {
    slot: LessonSlot,
    teachers: Vec<Teacher>,
    selected: Option<usize>,
    reason: String,
}

impl Reassignment {
    pub async fn open(
        api: &dyn SchoolApi,
        session: &Session,
        slot: LessonSlot,
    ) -> Result<Self, ScheduleError> {
        if slot.is_cancelled() {
            return Err(ScheduleError::SlotAlreadyCancelled(slot.id));
        }
        let teachers = api
            .list_available_teachers(session, &slot.id)
            .await
            .map_err(ScheduleError::fetch)?
            .into_iter()
            .filter(|t| !same_id(&t.id, slot.instructor_id()))
            .collect();
        Ok(Reassignment {
            slot,
            teachers,
            selected: None,
            reason: String::new(),
        })
    }

    pub fn slot(&self) -> &LessonSlot {
        &self.slot
    }

    pub fn teachers(&self) -> &[Teacher] {
        &self.teachers
    }

    pub fn selected(&self) -> Option<&Teacher> {
        self.selected.and_then(|i| self.teachers.get(i))
    }

    pub fn select(&mut self, teacher_id: &str) -> Result<(), ScheduleError> {
        let index = self
            .teachers
            .iter()
            .position(|t| same_id(&t.id, teacher_id))
            .ok_or_else(|| ScheduleError::TeacherNotAvailable(teacher_id.to_string()))?;
        self.selected = Some(index);
        Ok(())
    }

    pub fn set_reason(&mut self, reason: &str) {
        self.reason = reason.to_string();
    }

    /// Reassigns the teacher and returns the slot with its new instructor.
    pub async fn submit(
        &self,
        api: &dyn SchoolApi,
        session: &Session,
    ) -> Result<LessonSlot, ScheduleError> {
        let teacher = self.selected().ok_or(ScheduleError::TeacherNotSelected)?;
        let reason = self.reason.trim();
        if reason.is_empty() {
            return Err(ScheduleError::EmptyReassignReason);
        }
        api.reassign_teacher(session, &self.slot.id, &teacher.id, reason)
            .await
            .map_err(|err| {
                error!("failed to reassign slot {}: {:#}", self.slot.id, err);
                ScheduleError::mutation(err)
            })?;
        info!("slot {} reassigned to teacher {}", self.slot.id, teacher.id);

        let mut slot = self.slot.clone();
        slot.class.instructor_id = teacher.id.clone();
        slot.class.instructor_name = teacher.name.clone();
        Ok(slot)
    }
}

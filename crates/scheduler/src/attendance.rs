use api::{PushHub, SchoolApi, Subscription};
use futures_util::future::join_all;
use log::{debug, error, info, warn};
use model::{
    attendance::AttendanceRecord,
    errors::ScheduleError,
    ids::same_id,
    notification::PushMessage,
    session::Session,
    slot::LessonSlot,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SyncMode {
    /// Re-fetch the attendance of every displayed slot.
    #[default]
    PerSlot,
    /// Reload the whole week instead.
    WholeWeek,
}

/// Attendance-change feed of a mounted schedule view.
#[derive(Default)]
pub struct AttendanceSync {
    mode: SyncMode,
    subscription: Option<Subscription>,
}

impl AttendanceSync {
    pub fn new(mode: SyncMode) -> Self {
        AttendanceSync {
            mode,
            subscription: None,
        }
    }

    pub fn mode(&self) -> SyncMode {
        self.mode
    }

    pub fn is_mounted(&self) -> bool {
        self.subscription.is_some()
    }

    pub fn mount(&mut self, hub: &PushHub, topic_filter: &str) {
        self.subscription = Some(hub.subscribe(topic_filter));
    }

    /// Drops the subscription; nothing published afterwards is seen.
    pub fn unmount(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            debug!("unmounting attendance feed {}", subscription.id());
            subscription.unsubscribe();
        }
    }

    /// Drains queued messages; true if any of them was an attendance change.
    pub fn take_pending(&mut self) -> bool {
        let Some(subscription) = self.subscription.as_mut() else {
            return false;
        };
        let mut changed = false;
        while let Some(message) = subscription.try_recv() {
            changed |= message.is_attendance_change();
        }
        changed
    }

    /// Waits for the next attendance change. `None` once unmounted or the hub is gone.
    pub async fn next_change(&mut self) -> Option<PushMessage> {
        let subscription = self.subscription.as_mut()?;
        while let Some(message) = subscription.recv().await {
            if message.is_attendance_change() {
                return Some(message);
            }
        }
        None
    }
}

/// Fetches the attendance roster of each slot. Failures are logged and skipped.
pub async fn refetch(
    api: &dyn SchoolApi,
    session: &Session,
    slots: &[LessonSlot],
) -> Vec<(String, Vec<AttendanceRecord>)> {
    let requests = slots.iter().map(|slot| async move {
        match api.get_attendance_status(session, &slot.id).await {
            Ok(records) => Some((slot.id.clone(), records)),
            Err(err) => {
                warn!("failed to refresh attendance of slot {}: {:#}", slot.id, err);
                None
            }
        }
    });
    join_all(requests).await.into_iter().flatten().collect()
}

/// Replaces the current student's entry in each slot roster with the fetched one.
/// Other students' entries are left as they are. Returns the number of updated slots.
pub fn reconcile(
    slots: &mut [LessonSlot],
    fetched: Vec<(String, Vec<AttendanceRecord>)>,
    student_id: &str,
) -> usize {
    let mut updated = 0;
    for (slot_id, records) in fetched {
        let Some(slot) = slots.iter_mut().find(|s| same_id(&s.id, &slot_id)) else {
            continue;
        };
        let Some(mine) = records
            .into_iter()
            .find(|r| same_id(&r.student_id, student_id))
        else {
            continue;
        };
        let roster = slot.attendance.get_or_insert_with(Vec::new);
        match roster.iter_mut().find(|r| same_id(&r.student_id, student_id)) {
            Some(entry) if *entry == mine => continue,
            Some(entry) => *entry = mine,
            None => roster.push(mine),
        }
        updated += 1;
    }
    updated
}

/// Saves the instructor's attendance capture for one slot.
pub async fn update_attendance(
    api: &dyn SchoolApi,
    session: &Session,
    slot: &mut LessonSlot,
    records: Vec<AttendanceRecord>,
) -> Result<(), ScheduleError> {
    if slot.is_cancelled() {
        return Err(ScheduleError::SlotAlreadyCancelled(slot.id.clone()));
    }
    api.update_attendance(session, &slot.id, &records)
        .await
        .map_err(|err| {
            error!("failed to save attendance of slot {}: {:#}", slot.id, err);
            ScheduleError::mutation(err)
        })?;
    info!("attendance of slot {} saved ({} students)", slot.id, records.len());
    slot.attendance = Some(records);
    Ok(())
}

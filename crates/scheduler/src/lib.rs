pub mod attendance;
pub mod grid;
pub mod reassign;
pub mod view;
pub mod workflow;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use api::SchoolApi;
use log::{debug, warn};
use model::{
    cancel_reason::with_other,
    errors::ScheduleError,
    filter::FilterCriteria,
    ids::WeekId,
    session::Session,
    slot::{BlankSlot, LessonSlot},
};

/// Entry point of the scheduling screens: read access to the backend.
#[derive(Clone)]
pub struct Scheduler {
    api: Arc<dyn SchoolApi>,
}

impl Scheduler {
    pub fn new(api: Arc<dyn SchoolApi>) -> Self {
        Scheduler { api }
    }

    pub fn api(&self) -> &dyn SchoolApi {
        self.api.as_ref()
    }

    pub async fn get_week(
        &self,
        session: &Session,
        week: WeekId,
        filter: &FilterCriteria,
    ) -> Result<Vec<LessonSlot>, ScheduleError> {
        debug!("loading week {}/{}", week.week(), week.year());
        self.api
            .list_slots(session, week.range(), filter)
            .await
            .map_err(|err| {
                warn!("failed to load week {}/{}: {:#}", week.week(), week.year(), err);
                ScheduleError::fetch(err)
            })
    }

    pub async fn get_slot(&self, session: &Session, id: &str) -> Result<LessonSlot, ScheduleError> {
        self.api.get_slot(session, id).await.map_err(|err| {
            warn!("failed to load slot {}: {:#}", id, err);
            ScheduleError::fetch(err)
        })
    }

    pub async fn blank_slots(
        &self,
        session: &Session,
        week: WeekId,
    ) -> Result<Vec<BlankSlot>, ScheduleError> {
        self.api
            .list_blank_slots(session, week.range())
            .await
            .map_err(|err| {
                warn!("failed to load free slots: {:#}", err);
                ScheduleError::fetch(err)
            })
    }

    /// Configured cancellation reasons followed by "Other".
    pub async fn cancel_reasons(&self, session: &Session) -> Result<Vec<String>, ScheduleError> {
        let options = self
            .api
            .get_cancel_reason_options(session)
            .await
            .map_err(|err| {
                warn!("failed to load cancellation reasons: {:#}", err);
                ScheduleError::fetch(err)
            })?;
        Ok(with_other(options))
    }
}

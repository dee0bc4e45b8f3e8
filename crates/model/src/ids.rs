use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use time::range::DateRange;
use uuid::Uuid;

use crate::errors::ScheduleError;

pub const MIN_WEEK: u32 = 1;
pub const MAX_WEEK: u32 = 52;

const GUID_GROUPS: [usize; 5] = [8, 4, 4, 4, 12];

/// Parses a strictly GUID-shaped identifier (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
pub fn parse_guid(field: &'static str, raw: &str) -> Result<Uuid, ScheduleError> {
    let invalid = || ScheduleError::InvalidIdentifier {
        field,
        value: raw.to_string(),
    };

    let groups = raw.split('-').collect::<Vec<_>>();
    if groups.len() != GUID_GROUPS.len() {
        return Err(invalid());
    }
    for (group, len) in groups.iter().zip(GUID_GROUPS) {
        if group.len() != len || !group.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
    }
    Uuid::parse_str(raw).map_err(|_| invalid())
}

/// Identifiers coming from the backend are compared ignoring ASCII case.
pub fn same_id(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// A navigable (year, week) pair. Weeks outside `[1, 52]` are not reachable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawWeekId")]
pub struct WeekId {
    year: i32,
    week: u32,
}

#[derive(Deserialize)]
struct RawWeekId {
    year: i32,
    week: u32,
}

impl TryFrom<RawWeekId> for WeekId {
    type Error = ScheduleError;

    fn try_from(raw: RawWeekId) -> Result<Self, Self::Error> {
        WeekId::new(raw.year, raw.week)
    }
}

impl WeekId {
    pub fn new(year: i32, week: u32) -> Result<Self, ScheduleError> {
        if !(MIN_WEEK..=MAX_WEEK).contains(&week) || time::week_days(year, week).is_none() {
            return Err(ScheduleError::WeekOutOfRange { year, week });
        }
        Ok(WeekId { year, week })
    }

    /// Navigable week closest to `date`: its ISO week, except that ISO week 53
    /// is clamped to week 52 of the same year, which then does not contain `date`.
    pub fn nearest(date: NaiveDate) -> Self {
        let (year, week) = time::iso_week_of(date);
        WeekId {
            year,
            week: week.clamp(MIN_WEEK, MAX_WEEK),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn week(&self) -> u32 {
        self.week
    }

    pub fn days(&self) -> [NaiveDate; 7] {
        // The constructor guarantees a valid week; fall back to the year's first week otherwise.
        time::week_days(self.year, self.week)
            .or_else(|| time::week_days(self.year, MIN_WEEK))
            .unwrap_or([NaiveDate::MIN; 7])
    }

    pub fn range(&self) -> DateRange {
        let days = self.days();
        DateRange::new(days[0], days[6])
    }

    pub fn has_next(&self) -> bool {
        self.week < MAX_WEEK
    }

    pub fn has_prev(&self) -> bool {
        self.week > MIN_WEEK
    }

    pub fn next(&self) -> Option<Self> {
        self.has_next().then(|| WeekId {
            year: self.year,
            week: self.week + 1,
        })
    }

    pub fn prev(&self) -> Option<Self> {
        self.has_prev().then(|| WeekId {
            year: self.year,
            week: self.week - 1,
        })
    }
}

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{fmt_query, week_days};

/// Inclusive date range used for slot queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            DateRange { from, to }
        } else {
            DateRange { from: to, to: from }
        }
    }

    pub fn week(year: i32, week: u32) -> Option<Self> {
        let days = week_days(year, week)?;
        Some(DateRange {
            from: days[0],
            to: days[6],
        })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }

    pub fn query(&self) -> (String, String) {
        (fmt_query(&self.from), fmt_query(&self.to))
    }
}

use std::fmt::{self, Display, Formatter};

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use strum::{EnumIter, IntoEnumIterator as _};

use crate::errors::ScheduleError;

/// One of the eight fixed daily lesson windows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, EnumIter, Serialize, Deserialize,
)]
#[serde(try_from = "i32", into = "i32")]
pub enum Shift {
    First,
    Second,
    Third,
    Fourth,
    Fifth,
    Sixth,
    Seventh,
    Eighth,
}

impl Shift {
    pub const COUNT: usize = 8;

    pub fn all() -> impl Iterator<Item = Shift> {
        Shift::iter()
    }

    pub fn from_number(number: i32) -> Option<Shift> {
        Shift::iter().find(|shift| shift.number() == number)
    }

    pub fn number(&self) -> i32 {
        self.index() as i32 + 1
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn label(&self) -> &'static str {
        match self {
            Shift::First => "Shift 1 (07:00 - 08:30)",
            Shift::Second => "Shift 2 (08:45 - 10:15)",
            Shift::Third => "Shift 3 (10:30 - 12:00)",
            Shift::Fourth => "Shift 4 (12:30 - 14:00)",
            Shift::Fifth => "Shift 5 (14:15 - 15:45)",
            Shift::Sixth => "Shift 6 (16:00 - 17:30)",
            Shift::Seventh => "Shift 7 (17:45 - 19:15)",
            Shift::Eighth => "Shift 8 (19:30 - 21:00)",
        }
    }

    pub fn bounds(&self) -> (NaiveTime, NaiveTime) {
        let (start, end) = match self {
            Shift::First => ((7, 0), (8, 30)),
            Shift::Second => ((8, 45), (10, 15)),
            Shift::Third => ((10, 30), (12, 0)),
            Shift::Fourth => ((12, 30), (14, 0)),
            Shift::Fifth => ((14, 15), (15, 45)),
            Shift::Sixth => ((16, 0), (17, 30)),
            Shift::Seventh => ((17, 45), (19, 15)),
            Shift::Eighth => ((19, 30), (21, 0)),
        };
        (hm(start), hm(end))
    }
}

fn hm((hour, min): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, min, 0).unwrap_or(NaiveTime::MIN)
}

impl TryFrom<i32> for Shift {
    type Error = ScheduleError;

    fn try_from(value: i32) -> Result<Self, Self::Error> {
        Shift::from_number(value).ok_or(ScheduleError::UnknownShift(value))
    }
}

impl From<Shift> for i32 {
    fn from(shift: Shift) -> Self {
        shift.number()
    }
}

impl Display for Shift {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

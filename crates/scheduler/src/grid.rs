use chrono::{Datelike as _, NaiveDate, Weekday};
use model::{ids::WeekId, shift::Shift, slot::LessonSlot};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayColumn {
    pub date: NaiveDate,
    pub weekday: Weekday,
    /// `DD/MM/YYYY`
    pub display: String,
    /// `YYYY-MM-DD`
    pub query: String,
}

impl DayColumn {
    fn new(date: NaiveDate) -> Self {
        DayColumn {
            date,
            weekday: date.weekday(),
            display: time::fmt_display(&date),
            query: time::fmt_query(&date),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ShiftRow {
    pub shift: Shift,
    pub label: &'static str,
    /// One cell per day, Monday first. A cell may hold several slots.
    pub cells: [Vec<LessonSlot>; 7],
}

/// Slots of one week laid out as shift rows by day columns.
#[derive(Debug, Clone)]
pub struct WeekGrid {
    week: WeekId,
    days: [DayColumn; 7],
    rows: Vec<ShiftRow>,
    excluded: usize,
}

impl WeekGrid {
    pub fn empty(week: WeekId) -> Self {
        WeekGrid {
            week,
            days: week.days().map(DayColumn::new),
            rows: Shift::all()
                .map(|shift| ShiftRow {
                    shift,
                    label: shift.label(),
                    cells: Default::default(),
                })
                .collect(),
            excluded: 0,
        }
    }

    /// Places every slot of the week into its (shift, day) cell. Slots outside the
    /// week or with an unknown shift are counted in [`WeekGrid::excluded`].
    pub fn build<'a>(week: WeekId, slots: impl IntoIterator<Item = &'a LessonSlot>) -> Self {
        let mut grid = WeekGrid::empty(week);
        let first_day = grid.days[0].date;
        for slot in slots {
            let day = (slot.date - first_day).num_days();
            match (slot.shift(), usize::try_from(day)) {
                (Some(shift), Ok(day)) if day < 7 => {
                    grid.rows[shift.index()].cells[day].push(slot.clone());
                }
                _ => grid.excluded += 1,
            }
        }
        grid
    }

    pub fn week(&self) -> WeekId {
        self.week
    }

    pub fn days(&self) -> &[DayColumn; 7] {
        &self.days
    }

    pub fn rows(&self) -> &[ShiftRow] {
        &self.rows
    }

    pub fn cell(&self, shift: Shift, weekday: Weekday) -> &[LessonSlot] {
        &self.rows[shift.index()].cells[weekday.num_days_from_monday() as usize]
    }

    pub fn excluded(&self) -> usize {
        self.excluded
    }

    /// Number of placed slots.
    pub fn len(&self) -> usize {
        self.rows
            .iter()
            .flat_map(|row| row.cells.iter())
            .map(Vec::len)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{
    ids::same_id,
    shift::Shift,
    slot::{LessonSlot, SlotStatus},
};

/// Constraints on a slot query. An empty set means "no constraint".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterCriteria {
    #[serde(default)]
    pub shifts: BTreeSet<Shift>,
    #[serde(default)]
    pub slot_statuses: BTreeSet<SlotStatus>,
    #[serde(default)]
    pub instructor_ids: BTreeSet<String>,
    #[serde(default)]
    pub class_ids: BTreeSet<String>,
    #[serde(default)]
    pub student_id: Option<String>,
}

impl FilterCriteria {
    pub fn is_empty(&self) -> bool {
        self.shifts.is_empty()
            && self.slot_statuses.is_empty()
            && self.instructor_ids.is_empty()
            && self.class_ids.is_empty()
            && self.student_id.is_none()
    }

    pub fn matches(&self, slot: &LessonSlot) -> bool {
        let shift_ok = self.shifts.is_empty()
            || slot.shift().map_or(false, |shift| self.shifts.contains(&shift));
        let status_ok = self.slot_statuses.is_empty() || self.slot_statuses.contains(&slot.status);
        let instructor_ok = contains_id(&self.instructor_ids, slot.instructor_id());
        let class_ok = contains_id(&self.class_ids, &slot.class.id);
        shift_ok && status_ok && instructor_ok && class_ok
    }

    pub fn apply<'a>(&self, slots: impl IntoIterator<Item = &'a LessonSlot>) -> Vec<LessonSlot> {
        slots
            .into_iter()
            .filter(|slot| self.matches(slot))
            .cloned()
            .collect()
    }

    pub fn toggle_shift(&mut self, shift: Shift) {
        toggle(&mut self.shifts, shift);
    }

    pub fn toggle_status(&mut self, status: SlotStatus) {
        toggle(&mut self.slot_statuses, status);
    }

    pub fn toggle_instructor(&mut self, id: &str) {
        toggle(&mut self.instructor_ids, id.to_string());
    }

    pub fn toggle_class(&mut self, id: &str) {
        toggle(&mut self.class_ids, id.to_string());
    }

    pub fn clear(&mut self) {
        *self = FilterCriteria {
            student_id: self.student_id.take(),
            ..FilterCriteria::default()
        };
    }
}

fn contains_id(set: &BTreeSet<String>, id: &str) -> bool {
    set.is_empty() || set.iter().any(|candidate| same_id(candidate, id))
}

fn toggle<T: Ord>(set: &mut BTreeSet<T>, value: T) {
    if !set.remove(&value) {
        set.insert(value);
    }
}

/// Choices that exist in the loaded slots, offered by the filter panel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOptions {
    pub shifts: Vec<Shift>,
    pub statuses: Vec<SlotStatus>,
    /// (id, name) pairs sorted by id.
    pub instructors: Vec<(String, String)>,
    pub classes: Vec<(String, String)>,
}

impl FilterOptions {
    pub fn from_slots<'a>(slots: impl IntoIterator<Item = &'a LessonSlot>) -> Self {
        let mut shifts = BTreeSet::new();
        let mut statuses = BTreeSet::new();
        let mut instructors = BTreeMap::new();
        let mut classes = BTreeMap::new();
        for slot in slots {
            if let Some(shift) = slot.shift() {
                shifts.insert(shift);
            }
            statuses.insert(slot.status);
            if !slot.class.instructor_id.is_empty() {
                instructors
                    .entry(slot.class.instructor_id.clone())
                    .or_insert_with(|| slot.class.instructor_name.clone());
            }
            if !slot.class.id.is_empty() {
                classes
                    .entry(slot.class.id.clone())
                    .or_insert_with(|| slot.class.name.clone());
            }
        }
        FilterOptions {
            shifts: shifts.into_iter().collect(),
            statuses: statuses.into_iter().collect(),
            instructors: instructors.into_iter().collect(),
            classes: classes.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::slot::tests::slot;

    fn fixture() -> Vec<LessonSlot> {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let mut slots = Vec::new();
        for (i, shift) in [1, 2, 3].into_iter().enumerate() {
            for status in [SlotStatus::Finished, SlotStatus::Cancelled] {
                let mut s = slot(&format!("s{}-{:?}", shift, status), date, shift, status);
                s.class.instructor_id = format!("teacher-{}", i % 2);
                s.class.id = format!("class-{}", i);
                slots.push(s);
            }
        }
        slots
    }

    #[test]
    fn test_empty_criteria_keeps_everything() {
        let slots = fixture();
        let criteria = FilterCriteria::default();
        assert!(criteria.is_empty());
        assert_eq!(criteria.apply(&slots), slots);
    }

    #[test]
    fn test_shift_and_status() {
        let slots = fixture();
        let criteria = FilterCriteria {
            shifts: [Shift::First].into(),
            slot_statuses: [SlotStatus::Finished].into(),
            ..Default::default()
        };
        let filtered = criteria.apply(&slots);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].shift(), Some(Shift::First));
        assert_eq!(filtered[0].status, SlotStatus::Finished);
    }

    #[test]
    fn test_instructor_match_ignores_case() {
        let slots = fixture();
        let mut criteria = FilterCriteria::default();
        criteria.toggle_instructor("TEACHER-1");
        let filtered = criteria.apply(&slots);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|s| s.instructor_id() == "teacher-1"));
    }

    #[test]
    fn test_unknown_shift_never_matches_shift_constraint() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let odd = slot("odd", date, 42, SlotStatus::NotStarted);
        let mut criteria = FilterCriteria::default();
        assert!(criteria.matches(&odd));
        criteria.toggle_shift(Shift::First);
        assert!(!criteria.matches(&odd));
    }

    #[test]
    fn test_widening_criteria_never_drops_slots() {
        let slots = fixture();
        let narrow = FilterCriteria {
            shifts: [Shift::Second].into(),
            slot_statuses: [SlotStatus::Cancelled].into(),
            class_ids: ["class-1".to_string()].into(),
            ..Default::default()
        };
        let mut wider = narrow.clone();
        wider.shifts.insert(Shift::Third);
        wider.slot_statuses.insert(SlotStatus::Finished);
        let mut widest = wider.clone();
        widest.class_ids.clear();

        let a = narrow.apply(&slots);
        let b = wider.apply(&slots);
        let c = widest.apply(&slots);
        assert!(a.iter().all(|s| b.contains(s)));
        assert!(b.iter().all(|s| c.contains(s)));
        assert!(a.len() <= b.len() && b.len() <= c.len());
    }

    #[test]
    fn test_toggle_and_clear() {
        let mut criteria = FilterCriteria {
            student_id: Some("ST-1".to_string()),
            ..Default::default()
        };
        criteria.toggle_shift(Shift::Fourth);
        criteria.toggle_status(SlotStatus::Ongoing);
        criteria.toggle_class("class-9");
        assert!(criteria.shifts.contains(&Shift::Fourth));
        criteria.toggle_shift(Shift::Fourth);
        assert!(criteria.shifts.is_empty());
        criteria.clear();
        assert!(criteria.slot_statuses.is_empty());
        assert!(criteria.class_ids.is_empty());
        assert_eq!(criteria.student_id.as_deref(), Some("ST-1"));
    }

    #[test]
    fn test_options_from_slots() {
        let options = FilterOptions::from_slots(&fixture());
        assert_eq!(options.shifts, vec![Shift::First, Shift::Second, Shift::Third]);
        assert_eq!(options.statuses, vec![SlotStatus::Finished, SlotStatus::Cancelled]);
        assert_eq!(options.instructors.len(), 2);
        assert_eq!(options.classes.len(), 3);
        assert_eq!(options.classes[0].0, "class-0");
    }
}

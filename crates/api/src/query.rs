use model::filter::FilterCriteria;
use time::range::DateRange;

pub type Query = Vec<(&'static str, String)>;

pub fn range_query(range: DateRange) -> Query {
    let (from, to) = range.query();
    vec![("startDate", from), ("endDate", to)]
}

/// Slot list query: the date range narrowed by the active filter.
pub fn slots_query(range: DateRange, filter: &FilterCriteria) -> Query {
    let mut query = range_query(range);
    query.extend(filter.shifts.iter().map(|s| ("shifts", s.number().to_string())));
    query.extend(
        filter
            .slot_statuses
            .iter()
            .map(|s| ("slotStatuses", format!("{:?}", s))),
    );
    query.extend(filter.instructor_ids.iter().map(|id| ("instructorIds", id.clone())));
    query.extend(filter.class_ids.iter().map(|id| ("classIds", id.clone())));
    if let Some(student_id) = &filter.student_id {
        query.push(("studentId", student_id.clone()));
    }
    query
}

//! Daily attendance summaries for the rep dashboard and exports.

use chrono::NaiveDate;
use serde::Serialize;

use crate::ledger::AttendanceRecord;

/// All records for one course on the summary day.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub course_code: String,
    pub records: Vec<AttendanceRecord>,
}

impl CourseSummary {
    pub fn student_count(&self) -> usize {
        self.records.len()
    }
}

/// One day's attendance grouped by course, in first-seen record order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: NaiveDate,
    pub course_filter: Option<String>,
    pub courses: Vec<CourseSummary>,
}

impl DailySummary {
    pub fn is_empty(&self) -> bool {
        self.courses.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.courses.iter().map(CourseSummary::student_count).sum()
    }
}

/// Build the summary for one local calendar day, optionally restricted to a
/// single course code. Records whose timestamps do not parse are skipped.
pub fn daily_summary(
    records: &[AttendanceRecord],
    date: NaiveDate,
    course_filter: Option<&str>,
) -> DailySummary {
    let mut courses: Vec<CourseSummary> = Vec::new();

    for record in records {
        if record.local_day() != Some(date) {
            continue;
        }
        if let Some(filter) = course_filter {
            if record.course_code != filter {
                continue;
            }
        }
        match courses.iter_mut().find(|c| c.course_code == record.course_code) {
            Some(group) => group.records.push(record.clone()),
            None => courses.push(CourseSummary {
                course_code: record.course_code.clone(),
                records: vec![record.clone()],
            }),
        }
    }

    DailySummary {
        date,
        course_filter: course_filter.map(str::to_string),
        courses,
    }
}

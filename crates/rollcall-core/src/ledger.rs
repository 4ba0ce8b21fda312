//! Append-only attendance ledger.
//!
//! Records keep their timestamp as the original RFC 3339 string rather
//! than a parsed value: merged-in remote records may carry timestamps this
//! build cannot parse, and they must survive a round trip unchanged.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::geo::GeoPoint;
use crate::storage::{keys, LocalStore};
use crate::sync::SyncSink;

/// Status tag on records captured without a location fix.
pub const MANUAL_OFFLINE: &str = "manual-offline";

/// One attendance mark. Course details are denormalized at capture time so
/// the record stays meaningful after the timetable entry changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceRecord {
    pub student_name: String,
    pub matriculation: String,
    pub course_code: String,
    pub course_name: String,
    pub venue: String,
    pub faculty: String,
    pub department: String,
    pub level: String,
    /// RFC 3339 capture instant, stored verbatim.
    pub timestamp: String,
    pub gps_location: Option<GeoPoint>,
    /// Rounded meters from the session's registered point; absent for
    /// manual captures.
    pub distance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl AttendanceRecord {
    /// The record's capture day in the given record's own timezone offset,
    /// converted to the local calendar. `None` when the timestamp does not
    /// parse.
    pub fn local_day(&self) -> Option<chrono::NaiveDate> {
        DateTime::parse_from_rfc3339(&self.timestamp)
            .ok()
            .map(|t| t.with_timezone(&Local).date_naive())
    }
}

/// A check-in attempt that was refused. Every variant is a policy outcome,
/// not a fault.
#[derive(Debug, Error, PartialEq)]
pub enum CheckinError {
    #[error("please fill in all fields")]
    MissingFields,

    #[error("matric number must look like U2021/5570123")]
    InvalidMatricFormat,

    #[error("this device already marked attendance today for {0}")]
    DeviceBound(String),

    #[error("course not found in timetable")]
    CourseNotFound,

    #[error("attendance is closed for this course right now")]
    WindowClosed,

    #[error("you are {distance:.0}m away; move within {radius:.0}m of the class")]
    OutOfRange { distance: f64, radius: f64 },

    #[error("attendance already marked for this course today")]
    Duplicate,

    #[error("no location fix available")]
    NoLocationFix,
}

/// Owner of the attendance record collection.
pub struct AttendanceLedger {
    records: Vec<AttendanceRecord>,
    store: LocalStore,
    sink: Option<Arc<dyn SyncSink>>,
}

impl AttendanceLedger {
    pub fn load(store: LocalStore) -> Self {
        let records = store.get(keys::ATTENDANCE).unwrap_or_default();
        Self {
            records,
            store,
            sink: None,
        }
    }

    pub fn attach_sink(&mut self, sink: Arc<dyn SyncSink>) {
        self.sink = Some(sink);
    }

    pub fn records(&self) -> &[AttendanceRecord] {
        &self.records
    }

    /// True if this matric already has a record for this course on the
    /// current local calendar day. Records whose timestamps do not parse
    /// never count as today's.
    pub fn is_duplicate(&self, matriculation: &str, course_code: &str, now: DateTime<Local>) -> bool {
        let today = now.date_naive();
        self.records.iter().any(|r| {
            r.matriculation == matriculation
                && r.course_code == course_code
                && r.local_day() == Some(today)
        })
    }

    /// Append one record, persist, and notify the sync sink.
    pub fn append(&mut self, record: AttendanceRecord) {
        self.records.push(record);
        self.persist();
        if let Some(sink) = &self.sink {
            sink.attendance_changed(&self.records);
        }
    }

    /// Destructive wipe of all records (explicit administrative action).
    pub fn clear_all(&mut self) {
        self.records.clear();
        self.persist();
        if let Some(sink) = &self.sink {
            sink.attendance_changed(&self.records);
        }
    }

    /// Install a merged collection produced by sync reconciliation.
    /// Persists locally without pushing back out.
    pub fn replace_all(&mut self, records: Vec<AttendanceRecord>) {
        self.records = records;
        self.persist();
    }

    fn persist(&self) {
        if let Err(e) = self.store.put(keys::ATTENDANCE, &self.records) {
            tracing::warn!(error = %e, "failed to persist attendance records");
        }
    }
}

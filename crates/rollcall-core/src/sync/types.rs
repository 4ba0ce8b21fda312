//! Core types for the cloud reconciliation layer.

use chrono::{DateTime, Utc};

use crate::ledger::AttendanceRecord;

/// The three shared documents under the remote `attendanceApp` collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncTopic {
    Timetable,
    Attendance,
    RepPins,
}

impl SyncTopic {
    /// Document id within the remote collection.
    pub fn doc_id(&self) -> &'static str {
        match self {
            SyncTopic::Timetable => "timetable",
            SyncTopic::Attendance => "attendance",
            SyncTopic::RepPins => "repPins",
        }
    }
}

/// Sync error types.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("sync is disabled in configuration")]
    Disabled,

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("remote returned status {0}")]
    RemoteStatus(u16),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Receiver of local mutations that should reach the remote documents.
/// Stores call this after each persisted change; implementations push
/// best-effort and never fail the local write.
pub trait SyncSink: Send + Sync {
    fn timetable_changed(&self, items: &[crate::timetable::CourseSession]);
    fn attendance_changed(&self, records: &[AttendanceRecord]);
}

/// Merge identity of an attendance record: matric, course, and the UTC day
/// of its timestamp. An unparseable timestamp degrades to an empty day so
/// such records still merge deterministically instead of being dropped.
pub fn attendance_key(record: &AttendanceRecord) -> String {
    let day = DateTime::parse_from_rfc3339(&record.timestamp)
        .map(|t| t.with_timezone(&Utc).format("%Y-%m-%d").to_string())
        .unwrap_or_default();
    format!(
        "{}|{}|{}",
        record.matriculation, record.course_code, day
    )
}

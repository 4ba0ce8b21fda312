//! # Rollcall Core Library
//!
//! Core business logic for GPS-verified class attendance. All operations
//! are available through this library; the CLI binary is a thin layer over
//! the same types, and a GUI front end can reuse them unchanged.
//!
//! ## Architecture
//!
//! - **Check-in pipeline**: identity, schedule, and location gates applied
//!   in a fixed order over student-entered fields and a GPS fix
//! - **Storage**: JSON file-per-key local store plus TOML configuration
//! - **Sync**: best-effort reconciliation against three shared remote
//!   documents (timetable, attendance, rep pins)
//!
//! ## Key Components
//!
//! - [`check_in_gps`] / [`check_in_manual`]: the check-in entry points
//! - [`TimetableStore`]: rep-scoped course session CRUD
//! - [`AttendanceLedger`]: append-only attendance records
//! - [`IdentityGuard`]: daily device-to-student binding
//! - [`SyncReconciler`]: remote document push/pull

pub mod checkin;
pub mod error;
pub mod geo;
pub mod identity;
pub mod ledger;
pub mod rep;
pub mod schedule;
pub mod storage;
pub mod summary;
pub mod sync;
pub mod timetable;

pub use checkin::{check_in_gps, check_in_manual, CheckinOutcome, CheckinRequest};
pub use error::{ConfigError, CoreError, Result, StorageError};
pub use geo::{distance_meters, AccuracyQuality, GeoFix, GeoPoint};
pub use identity::{DeviceBinding, IdentityGuard};
pub use ledger::{AttendanceLedger, AttendanceRecord, CheckinError};
pub use rep::{normalize_rep_pins, verify_rep_access, RepAccessError, RepScope, RepSession};
pub use schedule::Day;
pub use storage::{Config, LocalStore};
pub use summary::{daily_summary, DailySummary};
pub use sync::{SyncError, SyncReconciler, SyncSink, SyncTopic};
pub use timetable::{CourseSession, SessionDraft, SessionPatch, TimetableError, TimetableStore};
